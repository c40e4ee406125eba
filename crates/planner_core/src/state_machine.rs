//! Per-agent planner state machine (`spec.md` §4.7) and goal-selection
//! policy (`spec.md` §6 configuration, §9 Open Question (b)).
//!
//! Modeled as a tagged enum with an explicit transition function rather
//! than a trait hierarchy, per `spec.md` §9 ("state machine... no
//! inheritance").

use geometry::Point;

use crate::ids::Priority;

/// `spec.md` §3 "Planner state".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlannerState {
    Wait,
    Goto,
    Patrol,
    Goback,
    Land,
}

/// An external command, the only way a planner state changes other than
/// the automatic `Patrol` swap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateCommand {
    SetState(PlannerState),
}

/// Advance the planner state in response to an external command. Ignored
/// entirely while landing is in progress (`spec.md` §4.7): `setPlannerState`
/// has no effect until `landing_complete` is signaled.
#[must_use]
pub fn transition(current: PlannerState, command: Option<StateCommand>, landing_complete: bool) -> PlannerState {
    if current == PlannerState::Land && !landing_complete {
        return current;
    }
    match command {
        Some(StateCommand::SetState(next)) => next,
        None => current,
    }
}

/// Per-tick goal arbitration, given the current `PlannerState`. Returns the
/// updated `(current_goal, start_point)` pair: `Patrol` swaps the two once
/// the agent is within `goal_threshold` of its current goal.
#[must_use]
pub fn arbitrate_goal(state: PlannerState, position: Point, current_goal: Point, start_point: Point, desired_goal: Point, goal_threshold: f64) -> (Point, Point) {
    match state {
        PlannerState::Wait | PlannerState::Land => (current_goal, start_point),
        PlannerState::Goto => (desired_goal, start_point),
        PlannerState::Goback => (start_point, start_point),
        PlannerState::Patrol => {
            if (position - current_goal).norm() < goal_threshold {
                (start_point, current_goal)
            } else {
                (current_goal, start_point)
            }
        }
    }
}

/// A pluggable "select the goal this tick" policy, one implementation per
/// `goal_mode` configuration literal.
pub trait GoalSelector {
    fn select(&self, position: Point, priority: Priority, neighbors: &[(Point, Priority)], next_waypoint: Option<Point>, fallback_goal: Point) -> Point;
}

/// Always targets the mission-assigned goal; ties among conflicting agents
/// are broken purely by [`Priority`] during LSC construction rather than by
/// perturbing the goal itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct PriorBased;

impl GoalSelector for PriorBased {
    fn select(&self, _position: Point, _priority: Priority, _neighbors: &[(Point, Priority)], _next_waypoint: Option<Point>, fallback_goal: Point) -> Point {
        fallback_goal
    }
}

/// Biases the goal sideways (to the agent's right, in the horizontal plane)
/// when a higher-priority neighbor is close and roughly head-on, the
/// classic convention for breaking symmetric face-to-face deadlocks without
/// explicit communication.
#[derive(Debug, Clone, Copy)]
pub struct RightHandRule {
    pub trigger_radius: f64,
    pub lateral_bias: f64,
}

impl GoalSelector for RightHandRule {
    fn select(&self, position: Point, priority: Priority, neighbors: &[(Point, Priority)], _next_waypoint: Option<Point>, fallback_goal: Point) -> Point {
        let heading = fallback_goal - position;
        if heading.norm() < geometry::EPSILON {
            return fallback_goal;
        }
        let heading_dir = heading.normalize();
        // Right-hand perpendicular in the horizontal plane: rotate the
        // heading by -90 degrees about +z.
        let right = geometry::Vec3::new(heading_dir.y, -heading_dir.x, 0.0);

        let blocked = neighbors.iter().any(|(neighbor_pos, neighbor_priority)| {
            *neighbor_priority < priority
                && (neighbor_pos - position).norm() < self.trigger_radius
                && heading_dir.dot(&(neighbor_pos - position).normalize()) > 0.5
        });

        if blocked {
            fallback_goal + right * self.lateral_bias
        } else {
            fallback_goal
        }
    }
}

/// Forwards the externally supplied next waypoint unchanged: the grid
/// planner itself is out of scope (`spec.md` §1), this crate only consumes
/// its output.
#[derive(Debug, Clone, Copy, Default)]
pub struct GridBasedPlanner;

impl GoalSelector for GridBasedPlanner {
    fn select(&self, _position: Point, _priority: Priority, _neighbors: &[(Point, Priority)], next_waypoint: Option<Point>, fallback_goal: Point) -> Point {
        next_waypoint.unwrap_or(fallback_goal)
    }
}
