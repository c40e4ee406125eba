//! Linear Safe Corridor construction, per `spec.md` §4.4.
//!
//! An LSC is a half-space on one segment's control points that guarantees
//! pairwise non-collision with one neighbor over that segment's time
//! window, relying on the convex-hull property of the Bernstein basis: the
//! curve satisfies the half-space over the whole segment iff every control
//! point does.

use geometry::{downwash_scale, Point, Vec3};

use crate::{errors::ConstraintError, ids::Priority};

/// Hard collision threshold below which a witness pair at the start of a
/// segment is treated as an active collision rather than a near-miss to be
/// resolved by the next tick's plan.
pub const EPSILON_YIELD: f64 = 0.02;

/// An oriented half-space `{x : normal . (x - point) >= margin}` that a
/// segment's control points must satisfy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lsc {
    pub normal: Vec3,
    pub point: Point,
    pub margin: f64,
}

impl Lsc {
    #[must_use]
    pub fn is_satisfied(&self, x: Point, tol: f64) -> bool {
        self.normal.dot(&(x - self.point)) >= self.margin - tol
    }

    /// The inequality in `normal . x >= rhs` form, the shape the QP
    /// assembler wants.
    #[must_use]
    pub fn as_inequality(&self) -> (Vec3, f64) {
        (self.normal, self.normal.dot(&self.point.coords) + self.margin)
    }
}

/// Two line-segment paths (start, end positions) over the same time
/// window, the input LSC construction closes over.
#[derive(Debug, Clone, Copy)]
pub struct SegmentPath {
    pub start: Point,
    pub end: Point,
}

#[allow(clippy::too_many_arguments)]
pub fn build_lsc(
    self_path: SegmentPath,
    self_radius: f64,
    self_downwash_ratio: f64,
    self_priority: Priority,
    neighbor_path: SegmentPath,
    neighbor_radius: f64,
    neighbor_is_agent: bool,
    neighbor_priority: Priority,
) -> Result<(Lsc, bool), ConstraintError> {
    let ratio = if neighbor_is_agent { self_downwash_ratio } else { 1.0 };
    let scaled_self_start = Point::from(downwash_scale(self_path.start.coords, ratio));
    let scaled_self_end = Point::from(downwash_scale(self_path.end.coords, ratio));
    let scaled_neighbor_start = Point::from(downwash_scale(neighbor_path.start.coords, ratio));
    let scaled_neighbor_end = Point::from(downwash_scale(neighbor_path.end.coords, ratio));

    let scaled_closest = geometry::closest_points_segment_segment(
        scaled_self_start,
        scaled_self_end,
        scaled_neighbor_start,
        scaled_neighbor_end,
    );

    let p_i: Point = unscale(scaled_closest.point_a, ratio);
    let p_j: Point = unscale(scaled_closest.point_b, ratio);

    let separation = p_i - p_j;
    if separation.norm() < geometry::EPSILON {
        return Err(ConstraintError::DegenerateWitness);
    }
    let normal = separation.normalize();
    let point = Point::from((p_i.coords + p_j.coords) * 0.5);
    let combined_radius = self_radius + neighbor_radius;
    let half_radius = combined_radius * 0.5;

    let tight = (p_i - p_j).norm() < combined_radius;
    let self_yields = tight && self_priority > neighbor_priority;
    let margin = half_radius + if self_yields { EPSILON_YIELD } else { 0.0 };

    let collision_alert = (self_path.start - neighbor_path.start).norm() < combined_radius;

    if collision_alert {
        // Relax to the tightest feasible half-space through the current
        // position: the boundary passes exactly through the midpoint at
        // t=0, margin 0, so the QP stage can still find a solution.
        let relaxed = Lsc {
            normal,
            point,
            margin: 0.0,
        };
        return Ok((relaxed, true));
    }

    Ok((Lsc { normal, point, margin }, false))
}

fn unscale(p: Point, ratio: f64) -> Point {
    Point::new(p.x, p.y, p.z * ratio)
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::ids::AgentId;

    fn path(start: Point, end: Point) -> SegmentPath {
        SegmentPath { start, end }
    }

    #[test]
    fn separated_agents_get_a_midpoint_hyperplane() {
        let self_path = path(Point::new(0.0, 0.0, 1.0), Point::new(1.0, 0.0, 1.0));
        let neighbor_path = path(Point::new(5.0, 0.0, 1.0), Point::new(4.0, 0.0, 1.0));
        let self_priority = Priority::new(1.0, AgentId(0));
        let neighbor_priority = Priority::new(1.0, AgentId(1));
        let (lsc, alert) = build_lsc(self_path, 0.15, 2.0, self_priority, neighbor_path, 0.15, true, neighbor_priority).unwrap();
        assert!(!alert);
        assert_relative_eq!(lsc.normal.x, -1.0, epsilon = 1e-6);
        assert_relative_eq!(lsc.margin, 0.15, epsilon = 1e-9);
    }

    #[test]
    fn lower_priority_agent_yields_extra_margin_when_tight() {
        let self_path = path(Point::new(0.0, 0.0, 1.0), Point::new(0.05, 0.0, 1.0));
        let neighbor_path = path(Point::new(0.5, 0.0, 1.0), Point::new(0.15, 0.0, 1.0));
        let higher = Priority::new(1.0, AgentId(0));
        let lower = Priority::new(5.0, AgentId(1));

        let (lsc_lower_self, _) = build_lsc(self_path, 0.15, 2.0, lower, neighbor_path, 0.15, true, higher).unwrap();
        let (lsc_higher_self, _) = build_lsc(self_path, 0.15, 2.0, higher, neighbor_path, 0.15, true, lower).unwrap();

        assert!(lsc_lower_self.margin > lsc_higher_self.margin);
    }

    #[test]
    fn witnesses_already_in_collision_raise_alert_and_relax_margin() {
        let self_path = path(Point::new(0.0, 0.0, 1.0), Point::new(1.0, 0.0, 1.0));
        let neighbor_path = path(Point::new(0.05, 0.0, 1.0), Point::new(1.0, 0.0, 1.0));
        let self_priority = Priority::new(1.0, AgentId(0));
        let neighbor_priority = Priority::new(1.0, AgentId(1));
        let (lsc, alert) = build_lsc(self_path, 0.15, 2.0, self_priority, neighbor_path, 0.15, true, neighbor_priority).unwrap();
        assert!(alert);
        assert_relative_eq!(lsc.margin, 0.0);
    }

    #[test]
    fn coincident_paths_are_rejected_as_degenerate() {
        let self_path = path(Point::new(0.0, 0.0, 1.0), Point::new(1.0, 0.0, 1.0));
        let self_priority = Priority::new(1.0, AgentId(0));
        let neighbor_priority = Priority::new(1.0, AgentId(1));
        let err = build_lsc(self_path, 0.15, 2.0, self_priority, self_path, 0.15, true, neighbor_priority).unwrap_err();
        assert_eq!(err, ConstraintError::DegenerateWitness);
    }
}
