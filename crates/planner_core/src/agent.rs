//! The agent: identity, physical parameters, and the mutable state a
//! planner instance owns between ticks.

use geometry::Point;
use trajectory::Trajectory;

use crate::{ids::AgentId, state::State, state_machine::PlannerState};

/// Everything a planner instance owns about the agent it plans for.
#[derive(Debug, Clone)]
pub struct Agent {
    pub id: AgentId,
    pub radius: f64,
    pub downwash_ratio: f64,
    pub v_max: f64,
    pub a_max: f64,
    pub state: State,
    pub start_point: Point,
    pub desired_goal: Point,
    pub current_goal: Point,
    pub next_waypoint: Option<Point>,
    pub previous_trajectory: Option<Trajectory>,
    pub planner_state: PlannerState,
    /// Number of consecutive ticks this agent has returned INFEASIBLE,
    /// reset to zero on any SUCCESS. Drives deadlock-avoidance yielding.
    pub consecutive_infeasible_ticks: u32,
}

impl Agent {
    #[must_use]
    pub fn new(id: AgentId, start_point: Point, desired_goal: Point, radius: f64, downwash_ratio: f64, v_max: f64, a_max: f64) -> Self {
        Self {
            id,
            radius,
            downwash_ratio,
            v_max,
            a_max,
            state: State::at_rest(start_point),
            start_point,
            desired_goal,
            current_goal: desired_goal,
            next_waypoint: None,
            previous_trajectory: None,
            planner_state: PlannerState::Wait,
            consecutive_infeasible_ticks: 0,
        }
    }

    #[must_use]
    pub fn remaining_goal_distance(&self) -> f64 {
        (self.desired_goal - self.state.position).norm()
    }
}
