//! QP assembly, per `spec.md` §4.6: decision variables are the control
//! points of the new trajectory, the objective penalizes jerk and snap
//! (plus deviation from the warm start), and constraints encode the
//! initial condition, `C^2` continuity, terminal rest, dynamic limits, and
//! every LSC/SFC.

use geometry::Point;
use itertools::Itertools;
use linalg::{Matrix, Vector};
use planner_config::{PlanningSection, QpSection};
use trajectory::Trajectory;

use crate::{lsc::Lsc, sfc::Sfc, solver::QpProblem};

/// Maps `(segment, control_point, axis)` triples onto a flat variable
/// index, and back.
#[derive(Debug, Clone, Copy)]
pub struct VariableLayout {
    pub segment_count: usize,
    pub points_per_segment: usize,
    pub num_dims: usize,
}

impl VariableLayout {
    #[must_use]
    pub fn new(segment_count: usize, degree: usize, num_dims: usize) -> Self {
        Self {
            segment_count,
            points_per_segment: degree + 1,
            num_dims,
        }
    }

    #[must_use]
    pub fn num_variables(&self) -> usize {
        self.segment_count * self.points_per_segment * self.num_dims
    }

    #[must_use]
    pub fn index(&self, segment: usize, point: usize, axis: usize) -> usize {
        (segment * self.points_per_segment + point) * self.num_dims + axis
    }

    /// Flatten a trajectory's control points (dropping the `z` component
    /// when `num_dims == 2`) into a variable vector.
    #[must_use]
    pub fn flatten(&self, trajectory: &Trajectory) -> Vector<f64> {
        let mut x = Vector::zeros(self.num_variables());
        for (s, segment) in trajectory.segments().iter().enumerate() {
            for (p, point) in segment.control_points().iter().enumerate() {
                let coords = [point.x, point.y, point.z];
                for axis in 0..self.num_dims {
                    x[self.index(s, p, axis)] = coords[axis];
                }
            }
        }
        x
    }

    /// Rebuild per-segment control points from a solved variable vector,
    /// holding `z_2d` fixed for axes not represented in the QP.
    #[must_use]
    pub fn unflatten(&self, x: &Vector<f64>, z_2d: f64) -> Vec<Vec<Point>> {
        (0..self.segment_count)
            .map(|s| {
                (0..self.points_per_segment)
                    .map(|p| {
                        let px = x[self.index(s, p, 0)];
                        let py = x[self.index(s, p, 1)];
                        let pz = if self.num_dims == 3 { x[self.index(s, p, 2)] } else { z_2d };
                        Point::new(px, py, pz)
                    })
                    .collect()
            })
            .collect()
    }
}

/// Jerk/snap/warm-start-deviation objective, as a dense quadratic form over
/// the flattened control points.
///
/// Jerk and snap are approximated by the sum of squared third- and
/// fourth-order finite differences of each segment's control points, the
/// standard discrete roughness proxy for a Bezier curve's higher
/// derivatives.
#[must_use]
pub fn build_objective(layout: &VariableLayout, warm_start: &Vector<f64>, qp: &QpSection) -> (Matrix<f64>, Vector<f64>) {
    let n = layout.num_variables();
    let mut hessian = Matrix::zeros((n, n));

    for s in 0..layout.segment_count {
        let degree = layout.points_per_segment - 1;
        for axis in 0..layout.num_dims {
            let points = (0..layout.points_per_segment).map(|p| layout.index(s, p, axis));
            if degree >= 3 {
                for (a, b, c, d) in points.clone().tuple_windows::<(_, _, _, _)>() {
                    add_weighted_outer_product(&mut hessian, &[a, b, c, d], &[-1.0, 3.0, -3.0, 1.0], 2.0 * qp.jerk_weight);
                }
            }
            if degree >= 4 {
                for (a, b, c, d, e) in points.tuple_windows::<(_, _, _, _, _)>() {
                    add_weighted_outer_product(&mut hessian, &[a, b, c, d, e], &[1.0, -4.0, 6.0, -4.0, 1.0], 2.0 * qp.snap_weight);
                }
            }
        }
    }

    for i in 0..n {
        hessian[[i, i]] += 2.0 * qp.warm_start_weight;
    }

    let gradient = warm_start.mapv(|v| -2.0 * qp.warm_start_weight * v);
    (hessian, gradient)
}

fn add_weighted_outer_product(hessian: &mut Matrix<f64>, idx: &[usize], coeffs: &[f64], weight: f64) {
    for (a, &ia) in idx.iter().enumerate() {
        for (b, &ib) in idx.iter().enumerate() {
            hessian[[ia, ib]] += weight * coeffs[a] * coeffs[b];
        }
    }
}

/// Equality constraints: initial position/velocity/acceleration, `C^2`
/// continuity at every segment boundary, and terminal velocity/acceleration
/// zero.
#[must_use]
pub fn build_equality_constraints(
    layout: &VariableLayout,
    initial: (Point, geometry::Vec3, geometry::Vec3),
    delta: f64,
) -> (Matrix<f64>, Vector<f64>) {
    let degree = layout.points_per_segment - 1;
    #[allow(clippy::cast_precision_loss)]
    let n_f = degree as f64;
    let n = layout.num_variables();

    let mut rows: Vec<Vec<f64>> = Vec::new();
    let mut rhs: Vec<f64> = Vec::new();

    let (p0, v0, a0) = initial;
    let init_values = [[p0.x, p0.y, p0.z], [v0.x, v0.y, v0.z], [a0.x, a0.y, a0.z]];

    for axis in 0..layout.num_dims {
        // position(0) = p0: P_0 = p0
        let mut row = vec![0.0; n];
        row[layout.index(0, 0, axis)] = 1.0;
        rows.push(row);
        rhs.push(init_values[0][axis]);

        // velocity(0) = v0: (n/delta)(P_1 - P_0) = v0
        let mut row = vec![0.0; n];
        row[layout.index(0, 1, axis)] = n_f / delta;
        row[layout.index(0, 0, axis)] = -n_f / delta;
        rows.push(row);
        rhs.push(init_values[1][axis]);

        // acceleration(0) = a0: (n(n-1)/delta^2)(P_2 - 2P_1 + P_0) = a0
        let scale = n_f * (n_f - 1.0) / (delta * delta);
        let mut row = vec![0.0; n];
        row[layout.index(0, 2, axis)] = scale;
        row[layout.index(0, 1, axis)] = -2.0 * scale;
        row[layout.index(0, 0, axis)] = scale;
        rows.push(row);
        rhs.push(init_values[2][axis]);

        for s in 1..layout.segment_count {
            // position continuity: P^s_0 = P^{s-1}_n
            let mut row = vec![0.0; n];
            row[layout.index(s, 0, axis)] = 1.0;
            row[layout.index(s - 1, degree, axis)] = -1.0;
            rows.push(row);
            rhs.push(0.0);

            // velocity continuity: (P^s_1 - P^s_0) = (P^{s-1}_n - P^{s-1}_{n-1})
            let mut row = vec![0.0; n];
            row[layout.index(s, 1, axis)] = 1.0;
            row[layout.index(s, 0, axis)] = -1.0;
            row[layout.index(s - 1, degree, axis)] = -1.0;
            row[layout.index(s - 1, degree - 1, axis)] = 1.0;
            rows.push(row);
            rhs.push(0.0);

            // acceleration continuity: (P^s_2 - 2P^s_1 + P^s_0) = (P^{s-1}_n - 2P^{s-1}_{n-1} + P^{s-1}_{n-2})
            let mut row = vec![0.0; n];
            row[layout.index(s, 2, axis)] = 1.0;
            row[layout.index(s, 1, axis)] = -2.0;
            row[layout.index(s, 0, axis)] = 1.0;
            row[layout.index(s - 1, degree, axis)] = -1.0;
            row[layout.index(s - 1, degree - 1, axis)] = 2.0;
            row[layout.index(s - 1, degree - 2, axis)] = -1.0;
            rows.push(row);
            rhs.push(0.0);
        }

        // terminal velocity = 0: P^{M-1}_n = P^{M-1}_{n-1}
        let last = layout.segment_count - 1;
        let mut row = vec![0.0; n];
        row[layout.index(last, degree, axis)] = 1.0;
        row[layout.index(last, degree - 1, axis)] = -1.0;
        rows.push(row);
        rhs.push(0.0);

        // terminal acceleration = 0: P^{M-1}_n - 2P^{M-1}_{n-1} + P^{M-1}_{n-2} = 0
        let mut row = vec![0.0; n];
        row[layout.index(last, degree, axis)] = 1.0;
        row[layout.index(last, degree - 1, axis)] = -2.0;
        row[layout.index(last, degree - 2, axis)] = 1.0;
        rows.push(row);
        rhs.push(0.0);
    }

    (rows_to_matrix(rows, n), Vector::from_vec(rhs))
}

/// Per-axis control-point bounds translated from `v_max`/`a_max` via the
/// Bernstein derivative formulas, plus every LSC half-space and SFC box,
/// all in `normal . x >= rhs` form.
pub fn build_inequality_constraints(
    layout: &VariableLayout,
    v_max: f64,
    a_max: f64,
    delta: f64,
    lscs: &[(usize, Lsc)],
    sfcs: &[Sfc],
) -> (Matrix<f64>, Vector<f64>) {
    let n = layout.num_variables();
    let mut rows: Vec<Vec<f64>> = Vec::new();
    let mut rhs: Vec<f64> = Vec::new();

    for s in 0..layout.segment_count {
        // Per-axis control-point box derived from |v| <= v_max, |a| <= a_max
        // applied to the hodograph control points: a sufficient (if
        // slightly conservative) condition is bounding every control point
        // displacement within the segment to v_max * delta / degree and the
        // box itself to the SFC/goal region; the dynamic-limit bound here
        // constrains consecutive control points directly.
        let degree = layout.points_per_segment - 1;
        #[allow(clippy::cast_precision_loss)]
        let n_f = degree as f64;
        let max_step = v_max * delta / n_f;
        for p in 0..degree {
            for axis in 0..layout.num_dims {
                // (P_{p+1} - P_p) <= max_step
                let mut row = vec![0.0; n];
                row[layout.index(s, p, axis)] = 1.0;
                row[layout.index(s, p + 1, axis)] = -1.0;
                rows.push(row);
                rhs.push(-max_step);

                // (P_p - P_{p+1}) <= max_step  <=>  -(P_{p+1}-P_p) >= -max_step
                let mut row = vec![0.0; n];
                row[layout.index(s, p, axis)] = -1.0;
                row[layout.index(s, p + 1, axis)] = 1.0;
                rows.push(row);
                rhs.push(-max_step);
            }
        }

        let max_curvature_step = a_max * delta * delta / (n_f * (n_f - 1.0).max(1.0));
        for p in 0..degree.saturating_sub(1) {
            for axis in 0..layout.num_dims {
                let mut row = vec![0.0; n];
                row[layout.index(s, p, axis)] = -1.0;
                row[layout.index(s, p + 1, axis)] = 2.0;
                row[layout.index(s, p + 2, axis)] = -1.0;
                rows.push(row.clone());
                rhs.push(-max_curvature_step);
                rows.push(row.iter().map(|v| -v).collect());
                rhs.push(-max_curvature_step);
            }
        }

        if let Some(sfc) = sfcs.get(s) {
            for p in 0..layout.points_per_segment {
                for axis in 0..layout.num_dims {
                    let (lo, hi) = match axis {
                        0 => (sfc.min.x, sfc.max.x),
                        1 => (sfc.min.y, sfc.max.y),
                        _ => (sfc.min.z, sfc.max.z),
                    };
                    let mut row = vec![0.0; n];
                    row[layout.index(s, p, axis)] = 1.0;
                    rows.push(row.clone());
                    rhs.push(lo);
                    rows.push(row.into_iter().map(|v| -v).collect());
                    rhs.push(-hi);
                }
            }
        }
    }

    for (segment, lsc) in lscs {
        let (normal, constraint_rhs) = lsc.as_inequality();
        let normal_components = [normal.x, normal.y, normal.z];
        for p in 0..layout.points_per_segment {
            let mut row = vec![0.0; n];
            for axis in 0..layout.num_dims {
                row[layout.index(*segment, p, axis)] = normal_components[axis];
            }
            rows.push(row);
            rhs.push(constraint_rhs);
        }
    }

    (rows_to_matrix(rows, n), Vector::from_vec(rhs))
}

fn rows_to_matrix(rows: Vec<Vec<f64>>, cols: usize) -> Matrix<f64> {
    let nrows = rows.len();
    let mut matrix = Matrix::zeros((nrows, cols));
    for (r, row) in rows.into_iter().enumerate() {
        for (c, value) in row.into_iter().enumerate() {
            matrix[[r, c]] = value;
        }
    }
    matrix
}

/// Assemble a full [`QpProblem`] for one replanning tick.
#[allow(clippy::too_many_arguments)]
#[must_use]
pub fn assemble(
    warm_start: &Trajectory,
    initial: (Point, geometry::Vec3, geometry::Vec3),
    v_max: f64,
    a_max: f64,
    num_dims: usize,
    planning: &PlanningSection,
    qp_section: &QpSection,
    lscs: &[(usize, Lsc)],
    sfcs: &[Sfc],
) -> (QpProblem, VariableLayout) {
    let layout = VariableLayout::new(planning.segment_count.get(), planning.basis_degree.get(), num_dims);
    let delta = planning.segment_duration();

    let warm = layout.flatten(warm_start);
    let (hessian, gradient) = build_objective(&layout, &warm, qp_section);
    let (equality_matrix, equality_rhs) = build_equality_constraints(&layout, initial, delta);
    let (inequality_matrix, inequality_rhs) = build_inequality_constraints(&layout, v_max, a_max, delta, lscs, sfcs);

    (
        QpProblem {
            hessian,
            gradient,
            equality_matrix,
            equality_rhs,
            inequality_matrix,
            inequality_rhs,
            warm_start: warm,
        },
        layout,
    )
}
