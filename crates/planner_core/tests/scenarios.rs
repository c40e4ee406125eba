//! End-to-end planner scenarios, reduced in scale from the full simulation
//! runs they are grounded on, exercised against the deterministic mock
//! solvers so the expected outcome does not depend on a real QP solve.

use std::time::Duration;

use geometry::Point;
use planner_config::Config;
use planner_core::{
    agent::Agent,
    ids::{AgentId, ObstacleId},
    obstacle::{NeighborCache, Obstacle, ObstacleKind},
    solver::mock::{AlwaysInfeasible, EchoWarmStart},
    state::State,
    state_machine::{PlannerState, PriorBased, StateCommand},
    testing::{FixedClock, SphereField},
    Planner, TickInputs, TickOutcome,
};

fn clear_field() -> SphereField {
    SphereField::empty()
}

fn ready_tick(field: &dyn planner_core::sfc::DistanceField) -> TickInputs<'_> {
    TickInputs {
        inputs_ready: true,
        observed_state: None,
        is_disturbed: false,
        neighbors: NeighborCache::default(),
        next_waypoint: None,
        state_command: None,
        landing_complete: false,
        distance_field: field,
    }
}

#[test]
fn head_on_two_agents_builds_one_lsc_per_segment_against_the_visible_neighbor() {
    let agent = Agent::new(AgentId(0), Point::new(0.0, 0.0, 1.0), Point::new(10.0, 0.0, 1.0), 0.15, 2.0, 2.0, 4.0);
    let mut planner = Planner::new(agent, Config::default(), EchoWarmStart, FixedClock(Duration::ZERO), PriorBased);

    let neighbor = Obstacle {
        id: ObstacleId(1),
        kind: ObstacleKind::Agent { prev_trajectory: None },
        pose: Point::new(10.0, 0.0, 1.0),
        velocity: geometry::Vec3::new(-2.0, 0.0, 0.0),
        radius: 0.15,
        downwash_ratio: 2.0,
        collision_alert: false,
        goal: Some(Point::new(0.0, 0.0, 1.0)),
    };

    let field = clear_field();
    let mut tick = ready_tick(&field);
    tick.neighbors = NeighborCache::new(vec![neighbor]);

    match planner.plan(tick) {
        TickOutcome::Success { statistics, collision_alert, .. } => {
            assert!(!collision_alert, "agents start 10m apart, no alert expected");
            assert_eq!(statistics.lsc_count, planner.config.planning.segment_count.get());
        }
        other => panic!("expected Success, got {other:?}"),
    }
}

#[test]
fn passing_a_static_obstacle_builds_one_sfc_per_segment() {
    let agent = Agent::new(AgentId(0), Point::new(0.0, 0.0, 1.0), Point::new(5.0, 0.0, 1.0), 0.15, 2.0, 2.0, 4.0);
    let mut planner = Planner::new(agent, Config::default(), EchoWarmStart, FixedClock(Duration::ZERO), PriorBased);

    let field = SphereField::empty().with_sphere(Point::new(2.5, 0.0, 1.0), 0.6);
    let outcome = planner.plan(ready_tick(&field));

    match outcome {
        TickOutcome::Success { statistics, .. } => {
            assert_eq!(statistics.sfc_count, planner.config.planning.segment_count.get());
        }
        other => panic!("expected Success, got {other:?}"),
    }
}

#[test]
fn an_infeasible_solve_falls_back_to_the_warm_start_with_collision_alert() {
    let agent = Agent::new(AgentId(0), Point::new(0.0, 0.0, 1.0), Point::new(1.0, 0.0, 1.0), 0.15, 2.0, 2.0, 4.0);
    let mut planner = Planner::new(agent, Config::default(), AlwaysInfeasible, FixedClock(Duration::ZERO), PriorBased);

    let field = clear_field();
    let outcome = planner.plan(ready_tick(&field));

    match outcome {
        TickOutcome::QpFail { trajectory, collision_alert, .. } => {
            assert!(collision_alert);
            assert_eq!(trajectory.position(0.0), Point::new(0.0, 0.0, 1.0));
        }
        other => panic!("expected QpFail, got {other:?}"),
    }
    assert!(planner.agent.previous_trajectory.is_some());
    assert_eq!(planner.agent.consecutive_infeasible_ticks, 1);
}

#[test]
fn a_disturbance_past_the_reset_threshold_zeros_velocity_for_the_next_trajectory() {
    let agent = Agent::new(AgentId(0), Point::new(0.0, 0.0, 1.0), Point::new(5.0, 0.0, 1.0), 0.15, 2.0, 2.0, 4.0);
    let mut planner = Planner::new(agent, Config::default(), EchoWarmStart, FixedClock(Duration::ZERO), PriorBased);

    let field = clear_field();
    planner.plan(ready_tick(&field)).as_planner_error(); // first tick establishes a previous trajectory

    let observed = State {
        position: Point::new(2.0, 0.0, 1.0),
        velocity: geometry::Vec3::new(2.0, 0.0, 0.0),
        acceleration: geometry::Vec3::zeros(),
    };
    let mut tick = ready_tick(&field);
    tick.observed_state = Some(observed);

    match planner.plan(tick) {
        TickOutcome::Success { trajectory, .. } => {
            assert_eq!(trajectory.position(0.0), observed.position);
            assert_eq!(trajectory.velocity(0.0), geometry::Vec3::zeros());
        }
        other => panic!("expected Success, got {other:?}"),
    }
}

#[test]
fn patrol_swaps_start_and_goal_once_the_agent_arrives() {
    let mut agent = Agent::new(AgentId(0), Point::new(0.0, 0.0, 1.0), Point::new(5.0, 0.0, 1.0), 0.15, 2.0, 2.0, 4.0);
    agent.planner_state = PlannerState::Patrol;
    agent.state = State::at_rest(Point::new(4.9, 0.0, 1.0));
    agent.current_goal = Point::new(5.0, 0.0, 1.0);

    let mut planner = Planner::new(agent, Config::default(), EchoWarmStart, FixedClock(Duration::ZERO), PriorBased);
    let field = clear_field();
    planner.plan(ready_tick(&field));

    assert_eq!(planner.agent.current_goal, Point::new(0.0, 0.0, 1.0));
    assert_eq!(planner.agent.start_point, Point::new(5.0, 0.0, 1.0));
}

#[test]
fn landing_ignores_further_state_commands_until_completion_is_signaled() {
    let mut agent = Agent::new(AgentId(0), Point::new(0.0, 0.0, 1.0), Point::new(5.0, 0.0, 1.0), 0.15, 2.0, 2.0, 4.0);
    agent.planner_state = PlannerState::Land;

    let mut planner = Planner::new(agent, Config::default(), EchoWarmStart, FixedClock(Duration::ZERO), PriorBased);
    let field = clear_field();

    let mut tick = ready_tick(&field);
    tick.state_command = Some(StateCommand::SetState(PlannerState::Goto));
    tick.landing_complete = false;
    assert!(matches!(planner.plan(tick), TickOutcome::WaitForRosMsg));
    assert_eq!(planner.agent.planner_state, PlannerState::Land);
    assert!(planner.agent.previous_trajectory.is_none());

    let mut tick = ready_tick(&field);
    tick.state_command = Some(StateCommand::SetState(PlannerState::Goto));
    tick.landing_complete = true;
    planner.plan(tick);
    assert_eq!(planner.agent.planner_state, PlannerState::Goto);
}
