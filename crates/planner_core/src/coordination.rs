//! Coordination protocol (`spec.md` §4.8): neighbor trajectory exchange is
//! owned by [`crate::obstacle::NeighborCache`] and the pub/sub boundary in
//! `src/bin/planner-sim.rs`; this module owns deadlock avoidance, the one
//! piece of cross-tick state the protocol keeps.

use geometry::Point;

/// Ticks of consecutive INFEASIBLE/QPFAIL outcomes before an agent enters
/// yielding mode (`spec.md` §4.8, N=3).
pub const INFEASIBLE_TICKS_BEFORE_YIELD: u32 = 3;

/// Update the consecutive-infeasible counter: incremented on failure, reset
/// to zero on any success.
#[must_use]
pub fn update_infeasible_streak(current: u32, tick_succeeded: bool) -> u32 {
    if tick_succeeded {
        0
    } else {
        current + 1
    }
}

#[must_use]
pub fn should_yield(consecutive_infeasible_ticks: u32, threshold: u32) -> bool {
    consecutive_infeasible_ticks >= threshold
}

/// The temporary goal an agent in yielding mode advertises: the point
/// inside an axis-aligned safety box around its current position closest to
/// its true desired goal. Its remaining-goal-distance collapses toward
/// zero, which raises its [`crate::ids::Priority`] and biases LSC
/// construction in its favor (`spec.md` §4.8) without actually abandoning
/// its intended direction of travel.
#[must_use]
pub fn yielding_goal(position: Point, desired_goal: Point, half_extent: f64) -> Point {
    let clamp_axis = |value: f64, center: f64| value.clamp(center - half_extent, center + half_extent);
    Point::new(
        clamp_axis(desired_goal.x, position.x),
        clamp_axis(desired_goal.y, position.y),
        clamp_axis(desired_goal.z, position.z),
    )
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn streak_resets_on_success() {
        assert_eq!(update_infeasible_streak(2, true), 0);
    }

    #[test]
    fn streak_grows_on_failure() {
        assert_eq!(update_infeasible_streak(2, false), 3);
    }

    #[test]
    fn yielding_kicks_in_at_the_configured_threshold() {
        assert!(!should_yield(2, INFEASIBLE_TICKS_BEFORE_YIELD));
        assert!(should_yield(3, INFEASIBLE_TICKS_BEFORE_YIELD));
    }

    #[test]
    fn yielding_goal_stays_within_the_safety_box() {
        let position = Point::new(0.0, 0.0, 1.0);
        let desired_goal = Point::new(10.0, 10.0, 1.0);
        let goal = yielding_goal(position, desired_goal, 0.2);
        assert_eq!(goal, Point::new(0.2, 0.2, 1.0));
    }

    #[test]
    fn yielding_goal_is_reached_directly_when_already_inside_the_box() {
        let position = Point::new(0.0, 0.0, 1.0);
        let desired_goal = Point::new(0.05, -0.05, 1.0);
        let goal = yielding_goal(position, desired_goal, 0.2);
        assert_eq!(goal, desired_goal);
    }
}
