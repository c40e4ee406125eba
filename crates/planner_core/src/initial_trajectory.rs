//! Builds a feasible warm-start trajectory from the current state toward
//! the current goal, per `spec.md` §4.3.
//!
//! The construction keeps three invariants exactly, by direct formula
//! rather than optimization: the trajectory starts at the current state
//! with matching velocity and acceleration, it finishes at rest (zero
//! velocity and acceleration), and no segment advances the agent by more
//! than `v_max * segment_duration`. These are the same invariants the QP
//! stage must keep, which is why an INFEASIBLE solve can return this
//! warm start unchanged.

use geometry::{Point, Vec3};
use planner_config::PlanningSection;
use trajectory::{Segment, Trajectory};

/// Clamp `delta` to at most `max_norm` in length, preserving direction.
fn clamp_to_max_norm(delta: Vec3, max_norm: f64) -> Vec3 {
    let norm = delta.norm();
    if norm <= max_norm || norm == 0.0 {
        delta
    } else {
        delta * (max_norm / norm)
    }
}

/// Build the first three control points of a degree-`n` segment so that it
/// starts at `p0` with velocity `v0` and acceleration `a0`.
fn fixed_start_points(p0: Point, v0: Vec3, a0: Vec3, delta: f64, n: usize) -> [Point; 3] {
    #[allow(clippy::cast_precision_loss)]
    let n_f = n as f64;
    let p1 = p0 + v0 * (delta / n_f);
    let p2 = p1 + (p1 - p0) + a0 * (delta * delta / (n_f * (n_f - 1.0)));
    [p0, p1, p2]
}

/// Build one segment's control points given its start boundary condition
/// and a target end position, optionally forcing the segment to end at
/// rest (zero velocity and acceleration).
#[allow(clippy::too_many_arguments)]
fn build_segment_with_delta(
    p0: Point,
    v0: Vec3,
    a0: Vec3,
    end: Point,
    terminal_zero: bool,
    degree: usize,
    delta: f64,
) -> Segment {
    debug_assert!(degree >= 5, "boundary-condition construction needs at least 6 control points per segment");
    let mut points = vec![Point::origin(); degree + 1];
    let [q0, q1, q2] = fixed_start_points(p0, v0, a0, delta, degree);
    points[0] = q0;
    points[1] = q1;
    points[2] = q2;

    if terminal_zero && degree >= 4 {
        points[degree] = end;
        points[degree - 1] = end;
        points[degree - 2] = end;
        for i in 3..=(degree.saturating_sub(3)) {
            #[allow(clippy::cast_precision_loss)]
            let frac = (i - 2) as f64 / (degree - 4) as f64;
            points[i] = points[2] + (end - points[2]) * frac;
        }
    } else if terminal_zero {
        // Degenerate low-degree case: collapse everything after the fixed
        // start onto the rest point.
        for p in points.iter_mut().skip(3) {
            *p = end;
        }
    } else {
        for i in 3..=degree {
            #[allow(clippy::cast_precision_loss)]
            let frac = (i - 2) as f64 / (degree - 2) as f64;
            points[i] = points[2] + (end - points[2]) * frac;
        }
    }
    Segment::new(points)
}

/// Target positions `end_1..end_M`, each at most `step_max` further from
/// the previous one, walking from `start` toward `goal`.
fn walk_targets(start: Point, goal: Point, step_max: f64, steps: usize) -> Vec<Point> {
    let mut current = start;
    let mut targets = Vec::with_capacity(steps);
    for _ in 0..steps {
        let step = clamp_to_max_norm(goal - current, step_max);
        current += step;
        targets.push(current);
    }
    targets
}

/// Generate a stay-in-place warm start: the agent does not move, but the
/// boundary derivative conditions are still honored exactly.
#[must_use]
pub fn stay_in_place(current: crate::state::State, planning: &PlanningSection, degree: usize) -> Trajectory {
    let m = planning.segment_count.get();
    let delta = planning.segment_duration();
    let mut segments = Vec::with_capacity(m);
    let mut boundary = (current.position, current.velocity, current.acceleration);
    for k in 0..m {
        let terminal = k == m - 1;
        let segment = build_segment_with_delta(boundary.0, boundary.1, boundary.2, current.position, terminal, degree, delta);
        boundary = (
            *segment.control_points().last().expect("non-empty segment"),
            Vec3::zeros(),
            Vec3::zeros(),
        );
        // Non-terminal segments' outgoing derivative is recomputed below
        // from the actual control points, since build_segment_with_delta
        // does not force zero derivatives except on the terminal segment.
        if !terminal {
            let cps = segment.control_points();
            let n = cps.len() - 1;
            #[allow(clippy::cast_precision_loss)]
            let n_f = n as f64;
            let out_v = (cps[n] - cps[n - 1]) * (n_f / delta);
            let out_a = ((cps[n] - cps[n - 1]) - (cps[n - 1] - cps[n - 2])) * (n_f * (n_f - 1.0) / (delta * delta));
            boundary = (cps[n], out_v, out_a);
        }
        segments.push(segment);
    }
    Trajectory::new(0.0, delta, segments).expect("generator produces a valid trajectory")
}

/// Generate a warm start by walking straight-line targets from `current`
/// toward `goal`, clamped to `v_max * delta` per segment, honoring the
/// same boundary conditions as [`stay_in_place`].
#[must_use]
pub fn toward_goal(current: crate::state::State, goal: Point, v_max: f64, planning: &PlanningSection, degree: usize) -> Trajectory {
    let m = planning.segment_count.get();
    let delta = planning.segment_duration();
    let targets = walk_targets(current.position, goal, v_max * delta, m);
    let mut segments = Vec::with_capacity(m);
    let mut boundary = (current.position, current.velocity, current.acceleration);
    for (k, target) in targets.into_iter().enumerate() {
        let terminal = k == m - 1;
        let segment = build_segment_with_delta(boundary.0, boundary.1, boundary.2, target, terminal, degree, delta);
        let cps = segment.control_points();
        let n = cps.len() - 1;
        boundary = if terminal {
            (cps[n], Vec3::zeros(), Vec3::zeros())
        } else {
            #[allow(clippy::cast_precision_loss)]
            let n_f = n as f64;
            let out_v = (cps[n] - cps[n - 1]) * (n_f / delta);
            let out_a = ((cps[n] - cps[n - 1]) - (cps[n - 1] - cps[n - 2])) * (n_f * (n_f - 1.0) / (delta * delta));
            (cps[n], out_v, out_a)
        };
        segments.push(segment);
    }
    Trajectory::new(0.0, delta, segments).expect("generator produces a valid trajectory")
}

/// Shift a previous trajectory by one segment and extrapolate a new final
/// segment toward `goal`, re-rooted at the agent's actual current state.
#[must_use]
pub fn shift_and_extrapolate(
    current: crate::state::State,
    previous: &Trajectory,
    goal: Point,
    v_max: f64,
    planning: &PlanningSection,
) -> Trajectory {
    let degree = previous.basis_degree();
    let delta = planning.segment_duration();
    let m = planning.segment_count.get();

    if previous.segment_count() <= 1 {
        return toward_goal(current, goal, v_max, planning, degree);
    }

    let mut shifted: Vec<Segment> = previous.segments()[1..].to_vec();
    // Re-root the new first segment at the actual current state: the
    // previous plan assumed an idealized propagation, this tick's sensed
    // state is authoritative.
    if let Some(first) = shifted.first_mut() {
        let cps = first.control_points_mut();
        let [q0, q1, q2] = fixed_start_points(current.position, current.velocity, current.acceleration, delta, degree);
        cps[0] = q0;
        cps[1] = q1;
        cps[2] = q2;
    }

    while shifted.len() < m {
        let last = shifted.last().expect("at least one segment remains");
        let cps = last.control_points();
        let n = cps.len() - 1;
        #[allow(clippy::cast_precision_loss)]
        let n_f = n as f64;
        let out_p = cps[n];
        let out_v = (cps[n] - cps[n - 1]) * (n_f / delta);
        let out_a = ((cps[n] - cps[n - 1]) - (cps[n - 1] - cps[n - 2])) * (n_f * (n_f - 1.0) / (delta * delta));
        let target = out_p + clamp_to_max_norm(goal - out_p, v_max * delta);
        let terminal = shifted.len() + 1 == m;
        let next = build_segment_with_delta(out_p, out_v, out_a, target, terminal, degree, delta);
        shifted.push(next);
    }

    Trajectory::new(0.0, delta, shifted).expect("shifted trajectory is valid")
}

#[cfg(test)]
mod tests {
    use std::num::NonZeroUsize;

    use approx::assert_relative_eq;
    use typed_floats::StrictlyPositiveFinite;

    use super::*;
    use crate::state::State;

    fn planning() -> PlanningSection {
        PlanningSection {
            horizon: StrictlyPositiveFinite::<f64>::new(1.0).unwrap(),
            segment_count: NonZeroUsize::new(5).unwrap(),
            basis_degree: NonZeroUsize::new(5).unwrap(),
            goal_threshold: StrictlyPositiveFinite::<f64>::new(0.2).unwrap(),
            reset_threshold: StrictlyPositiveFinite::<f64>::new(0.3).unwrap(),
        }
    }

    #[test]
    fn stay_in_place_reproduces_initial_state() {
        let state = State {
            position: Point::new(1.0, 2.0, 1.0),
            velocity: Vec3::new(0.5, 0.0, 0.0),
            acceleration: Vec3::new(0.1, 0.0, 0.0),
        };
        let plan = planning();
        let traj = stay_in_place(state, &plan, plan.basis_degree.get());
        assert_relative_eq!(traj.position(0.0), state.position, epsilon = 1e-9);
        assert_relative_eq!(traj.velocity(0.0), state.velocity, epsilon = 1e-9);
        assert_relative_eq!(traj.acceleration(0.0), state.acceleration, epsilon = 1e-6);
    }

    #[test]
    fn stay_in_place_ends_at_rest() {
        let state = State::at_rest(Point::new(0.0, 0.0, 1.0));
        let plan = planning();
        let traj = stay_in_place(state, &plan, plan.basis_degree.get());
        let t_end = traj.horizon();
        assert_relative_eq!(traj.velocity(t_end), Vec3::zeros(), epsilon = 1e-6);
        assert_relative_eq!(traj.acceleration(t_end), Vec3::zeros(), epsilon = 1e-6);
    }

    #[test]
    fn toward_goal_respects_per_segment_displacement_cap() {
        let state = State::at_rest(Point::new(0.0, 0.0, 1.0));
        let plan = planning();
        let v_max = 2.0;
        let traj = toward_goal(state, Point::new(100.0, 0.0, 1.0), v_max, &plan, plan.basis_degree.get());
        let delta = plan.segment_duration();
        let mut prev_end = state.position;
        for segment in traj.segments() {
            let end = *segment.control_points().last().unwrap();
            assert!((end - prev_end).norm() <= v_max * delta + 1e-9);
            prev_end = end;
        }
    }

    #[test]
    fn toward_goal_is_c2_continuous() {
        let state = State::at_rest(Point::new(0.0, 0.0, 1.0));
        let plan = planning();
        let traj = toward_goal(state, Point::new(3.0, 0.0, 1.0), 2.0, &plan, plan.basis_degree.get());
        assert!(traj.is_c2_continuous(1e-6));
    }

    #[test]
    fn shift_and_extrapolate_reroots_at_new_state() {
        let plan = planning();
        let initial = State::at_rest(Point::new(0.0, 0.0, 1.0));
        let warm = toward_goal(initial, Point::new(5.0, 0.0, 1.0), 2.0, &plan, plan.basis_degree.get());
        let moved = State {
            position: Point::new(0.4, 0.0, 1.0),
            velocity: Vec3::new(0.3, 0.0, 0.0),
            acceleration: Vec3::zeros(),
        };
        let shifted = shift_and_extrapolate(moved, &warm, Point::new(5.0, 0.0, 1.0), 2.0, &plan);
        assert_relative_eq!(shifted.position(0.0), moved.position, epsilon = 1e-9);
        assert_relative_eq!(shifted.velocity(0.0), moved.velocity, epsilon = 1e-9);
        assert_eq!(shifted.segment_count(), plan.segment_count.get());
    }
}
