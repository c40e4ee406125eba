//! Decentralized multi-agent trajectory planning core: per-tick
//! orchestration of the initial-trajectory generator, LSC/SFC constructors,
//! and QP solver adapter behind a single [`Planner::plan`] entry point.

pub mod agent;
pub mod cli;
pub mod coordination;
pub mod errors;
pub mod ids;
pub mod initial_trajectory;
pub mod lsc;
pub mod obstacle;
pub mod qp;
pub mod sfc;
pub mod solver;
pub mod state;
pub mod state_machine;
pub mod statistics;
pub mod testing;

use std::time::{Duration, Instant};

use geometry::Point;
use planner_config::Config;
use trajectory::Trajectory;

use crate::{
    agent::Agent,
    coordination::{should_yield, update_infeasible_streak, yielding_goal},
    errors::{PlannerError, SolveError},
    ids::{AgentId, Priority},
    lsc::{build_lsc, Lsc, SegmentPath},
    obstacle::{NeighborCache, ObstacleKind},
    sfc::{construct_sfc, reconcile_adjacent, DistanceField, Sfc},
    solver::{solve_with_retry, Clock, QpSolver, SolveOutcome},
    state::State,
    state_machine::{arbitrate_goal, transition, GoalSelector, PlannerState, StateCommand},
    statistics::{PlanningStatistics, QpStatus},
};

/// Step size and iteration budget for SFC face expansion. Not exposed as
/// configuration: `spec.md` §6 does not list it among the enumerated
/// options, and a fixed fine-grained step is adequate at the corridor
/// scales this planner operates at.
const SFC_EXPANSION_STEP: f64 = 0.05;
const SFC_EXPANSION_MAX_STEPS: usize = 200;

/// Everything a caller supplies for one replanning tick (`spec.md` §6,
/// "Inputs per tick").
pub struct TickInputs<'a> {
    /// False when a required upstream input has not arrived yet; `plan`
    /// then returns [`TickOutcome::WaitForRosMsg`] without touching any
    /// state.
    pub inputs_ready: bool,
    /// Externally observed state, mutually exclusive in authority with the
    /// planner's own integrated "ideal state": when present, it is compared
    /// against the ideal state and may force a reset.
    pub observed_state: Option<State>,
    /// Asserted by the command executor to force an immediate reset
    /// regardless of measured drift.
    pub is_disturbed: bool,
    pub neighbors: NeighborCache,
    pub next_waypoint: Option<Point>,
    pub state_command: Option<StateCommand>,
    pub landing_complete: bool,
    pub distance_field: &'a dyn DistanceField,
}

/// `spec.md` §6, "Exit semantics", with the trajectory/statistics payload
/// each outcome actually carries: a failed solve still emits the warm
/// start so neighbors have something to plan against next tick.
#[derive(Debug, Clone)]
pub enum TickOutcome {
    WaitForRosMsg,
    Success {
        trajectory: Trajectory,
        statistics: PlanningStatistics,
        collision_alert: bool,
    },
    InitTrajGenerationFail {
        statistics: PlanningStatistics,
    },
    ConstraintGenerationFail {
        trajectory: Trajectory,
        statistics: PlanningStatistics,
    },
    QpFail {
        trajectory: Trajectory,
        statistics: PlanningStatistics,
        collision_alert: bool,
    },
}

impl TickOutcome {
    /// The [`PlannerError`] this outcome corresponds to, or `None` for
    /// `WaitForRosMsg`/`Success` (non-fatal and nominal, respectively).
    #[must_use]
    pub fn as_planner_error(&self) -> Option<PlannerError> {
        match self {
            Self::WaitForRosMsg => None,
            Self::Success { .. } => None,
            Self::InitTrajGenerationFail { .. } => Some(PlannerError::InitTrajGenerationFail),
            Self::ConstraintGenerationFail { .. } => Some(PlannerError::ConstraintGenerationFail),
            Self::QpFail { .. } => Some(PlannerError::QpFail(SolveError::Infeasible)),
        }
    }
}

/// One planner instance, owning a single agent's state and its external
/// collaborators (`spec.md` §9, "Cyclic ownership": neighbor data enters as
/// value snapshots, never as shared references).
pub struct Planner<S, C, G> {
    pub agent: Agent,
    pub config: Config,
    solver: S,
    clock: C,
    goal_selector: G,
}

impl<S, C, G> Planner<S, C, G>
where
    S: QpSolver,
    C: Clock,
    G: GoalSelector,
{
    pub fn new(agent: Agent, config: Config, solver: S, clock: C, goal_selector: G) -> Self {
        Self {
            agent,
            config,
            solver,
            clock,
            goal_selector,
        }
    }

    #[must_use]
    fn priority(&self) -> Priority {
        Priority::new(self.agent.remaining_goal_distance(), self.agent.id)
    }

    /// The single entry point a host application calls once per replanning
    /// tick (`spec.md` §6).
    pub fn plan(&mut self, tick: TickInputs<'_>) -> TickOutcome {
        let tick_start = Instant::now();

        if !tick.inputs_ready {
            return TickOutcome::WaitForRosMsg;
        }

        self.agent.planner_state = transition(self.agent.planner_state, tick.state_command, tick.landing_complete);
        if self.agent.planner_state == PlannerState::Land {
            return TickOutcome::WaitForRosMsg;
        }

        let delta = self.config.planning.segment_duration();
        let ideal = self
            .agent
            .previous_trajectory
            .as_ref()
            .map(|t| State {
                position: t.position(delta),
                velocity: t.velocity(delta),
                acceleration: t.acceleration(delta),
            })
            .unwrap_or(self.agent.state);

        self.agent.state = match tick.observed_state {
            Some(observed) => {
                let drift = (observed.position - ideal.position).norm();
                if tick.is_disturbed || drift > self.config.planning.reset_threshold.get() {
                    let mut reset = ideal;
                    reset.disturb_to(observed.position);
                    reset
                } else {
                    ideal
                }
            }
            None => ideal,
        };

        let (arbitrated_goal, arbitrated_start) = arbitrate_goal(
            self.agent.planner_state,
            self.agent.state.position,
            self.agent.current_goal,
            self.agent.start_point,
            self.agent.desired_goal,
            self.config.planning.goal_threshold.get(),
        );
        self.agent.current_goal = arbitrated_goal;
        self.agent.start_point = arbitrated_start;

        let communication_radius = self.config.coordination.communication_radius.get();
        let neighbor_positions_and_priority: Vec<(Point, Priority)> = tick
            .neighbors
            .within_range(self.agent.state.position, communication_radius)
            .map(|neighbor| (neighbor.pose, neighbor_priority(neighbor)))
            .collect();

        let mut effective_goal = self.goal_selector.select(
            self.agent.state.position,
            self.priority(),
            &neighbor_positions_and_priority,
            tick.next_waypoint,
            self.agent.current_goal,
        );
        let yield_threshold = u32::try_from(self.config.coordination.infeasible_ticks_before_yield.get()).unwrap_or(u32::MAX);
        if should_yield(self.agent.consecutive_infeasible_ticks, yield_threshold) {
            effective_goal = yielding_goal(self.agent.state.position, effective_goal, self.agent.radius * 2.0);
        }

        let t0 = Instant::now();
        let warm_start = match &self.agent.previous_trajectory {
            Some(prev) => initial_trajectory::shift_and_extrapolate(self.agent.state, prev, effective_goal, self.agent.v_max, &self.config.planning),
            None => initial_trajectory::stay_in_place(self.agent.state, &self.config.planning, self.config.planning.basis_degree.get()),
        };
        let initial_trajectory_time = t0.elapsed();

        let t1 = Instant::now();
        let self_priority = self.priority();
        let mut lscs: Vec<(usize, Lsc)> = Vec::new();
        let mut collision_alert = false;
        let mut attempted_pairs = 0usize;
        let mut failed_pairs = 0usize;

        for neighbor in tick.neighbors.within_range(self.agent.state.position, communication_radius) {
            if matches!(neighbor.kind, ObstacleKind::Static) {
                continue;
            }
            let neighbor_is_agent = matches!(neighbor.kind, ObstacleKind::Agent { .. });
            let neighbor_prev_trajectory = match &neighbor.kind {
                ObstacleKind::Agent { prev_trajectory } => prev_trajectory.as_ref(),
                ObstacleKind::Dynamic | ObstacleKind::Static => None,
            };
            let np = neighbor_priority(neighbor);

            for (k, segment) in warm_start.segments().iter().enumerate() {
                attempted_pairs += 1;
                let self_path = SegmentPath {
                    start: segment.position(0.0),
                    end: segment.position(1.0),
                };
                #[allow(clippy::cast_precision_loss)]
                let (t_start, t_end) = (k as f64 * delta, (k + 1) as f64 * delta);
                let neighbor_path = match neighbor_prev_trajectory {
                    Some(traj) => SegmentPath {
                        start: traj.position(t_start),
                        end: traj.position(t_end),
                    },
                    None => SegmentPath {
                        start: neighbor.predict(t_start),
                        end: neighbor.predict(t_end),
                    },
                };

                match build_lsc(self_path, self.agent.radius, self.agent.downwash_ratio, self_priority, neighbor_path, neighbor.radius, neighbor_is_agent, np) {
                    Ok((lsc, alert)) => {
                        collision_alert |= alert;
                        lscs.push((k, lsc));
                    }
                    Err(_) => {
                        failed_pairs += 1;
                        let combined_radius = self.agent.radius + neighbor.radius;
                        if (self_path.start - neighbor_path.start).norm() < combined_radius {
                            collision_alert = true;
                        }
                    }
                }
            }
        }
        let lsc_construction_time = t1.elapsed();

        if attempted_pairs > 0 && failed_pairs == attempted_pairs {
            let statistics = PlanningStatistics {
                initial_trajectory_time,
                lsc_construction_time,
                sfc_construction_time: Duration::ZERO,
                qp_assembly_time: Duration::ZERO,
                solve_time: Duration::ZERO,
                total_time: tick_start.elapsed(),
                lsc_count: 0,
                sfc_count: 0,
                qp_status: QpStatus::NotAttempted,
            };
            self.agent.previous_trajectory = Some(warm_start.clone());
            return TickOutcome::ConstraintGenerationFail { trajectory: warm_start, statistics };
        }

        let t2 = Instant::now();
        let mut sfcs: Vec<Sfc> = warm_start
            .segments()
            .iter()
            .map(|segment| construct_sfc(segment, tick.distance_field, self.agent.radius, SFC_EXPANSION_STEP, SFC_EXPANSION_MAX_STEPS))
            .collect();
        let shared_points: Vec<Point> = warm_start.segments()[..warm_start.segment_count().saturating_sub(1)]
            .iter()
            .map(|segment| *segment.control_points().last().expect("non-empty segment"))
            .collect();
        reconcile_adjacent(&mut sfcs, &shared_points);
        let sfc_construction_time = t2.elapsed();

        let t3 = Instant::now();
        let (problem, layout) = qp::assemble(
            &warm_start,
            (self.agent.state.position, self.agent.state.velocity, self.agent.state.acceleration),
            self.agent.v_max,
            self.agent.a_max,
            self.config.world.dimension.count(),
            &self.config.planning,
            &self.config.qp,
            &lscs,
            &sfcs,
        );
        let qp_assembly_time = t3.elapsed();

        let deadline = Duration::from_secs_f64(self.config.qp.deadline_ms.get() / 1000.0);
        let t4 = Instant::now();
        let outcome = solve_with_retry(&self.solver, &problem, deadline, self.config.qp.regularization_epsilon.get());
        let solve_time = t4.elapsed();
        let _ = self.clock.now();

        let statistics = PlanningStatistics {
            initial_trajectory_time,
            lsc_construction_time,
            sfc_construction_time,
            qp_assembly_time,
            solve_time,
            total_time: tick_start.elapsed(),
            lsc_count: lscs.len(),
            sfc_count: sfcs.len(),
            qp_status: QpStatus::from(&outcome),
        };

        match outcome {
            SolveOutcome::Success { solution } => {
                let control_points = layout.unflatten(&solution, self.config.world.z_2d);
                match Trajectory::from_control_points(0.0, delta, control_points) {
                    Ok(trajectory) => {
                        self.agent.previous_trajectory = Some(trajectory.clone());
                        self.agent.consecutive_infeasible_ticks = update_infeasible_streak(self.agent.consecutive_infeasible_ticks, true);
                        TickOutcome::Success {
                            trajectory,
                            statistics,
                            collision_alert,
                        }
                    }
                    Err(_) => {
                        self.agent.previous_trajectory = Some(warm_start.clone());
                        self.agent.consecutive_infeasible_ticks = update_infeasible_streak(self.agent.consecutive_infeasible_ticks, false);
                        TickOutcome::QpFail {
                            trajectory: warm_start,
                            statistics,
                            collision_alert: true,
                        }
                    }
                }
            }
            SolveOutcome::Infeasible | SolveOutcome::NumericalFail { .. } => {
                self.agent.previous_trajectory = Some(warm_start.clone());
                self.agent.consecutive_infeasible_ticks = update_infeasible_streak(self.agent.consecutive_infeasible_ticks, false);
                TickOutcome::QpFail {
                    trajectory: warm_start,
                    statistics,
                    collision_alert: true,
                }
            }
        }
    }
}

fn neighbor_priority(neighbor: &crate::obstacle::Obstacle) -> Priority {
    match (&neighbor.kind, neighbor.goal) {
        (ObstacleKind::Agent { .. }, Some(goal)) => Priority::new((goal - neighbor.pose).norm(), AgentId(neighbor.id.0)),
        // Non-cooperative obstacles never yield; treat them as maximal
        // priority so `self` always takes on the extra tie-break margin
        // when a pass against one of them is tight.
        _ => Priority::new(f64::NEG_INFINITY, AgentId(neighbor.id.0)),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{
        obstacle::Obstacle,
        solver::mock::EchoWarmStart,
        state_machine::PriorBased,
        testing::{FixedClock, SphereField},
    };

    fn planner() -> Planner<EchoWarmStart, FixedClock, PriorBased> {
        let agent = Agent::new(AgentId(0), Point::new(0.0, 0.0, 1.0), Point::new(3.0, 0.0, 1.0), 0.15, 2.0, 2.0, 4.0);
        Planner::new(agent, Config::default(), EchoWarmStart, FixedClock(Duration::ZERO), PriorBased)
    }

    fn ready_tick(field: &dyn DistanceField) -> TickInputs<'_> {
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
    fn not_ready_returns_wait_for_ros_msg_without_mutating_state() {
        let mut planner = planner();
        let field = SphereField::empty();
        let mut tick = ready_tick(&field);
        tick.inputs_ready = false;
        let outcome = planner.plan(tick);
        assert!(matches!(outcome, TickOutcome::WaitForRosMsg));
        assert!(planner.agent.previous_trajectory.is_none());
    }

    #[test]
    fn a_clear_tick_with_echo_solver_succeeds_and_stores_a_trajectory() {
        let mut planner = planner();
        let field = SphereField::empty();
        let outcome = planner.plan(ready_tick(&field));
        match outcome {
            TickOutcome::Success { collision_alert, .. } => assert!(!collision_alert),
            other => panic!("expected Success, got {other:?}"),
        }
        assert!(planner.agent.previous_trajectory.is_some());
    }

    #[test]
    fn landing_state_skips_planning_entirely() {
        let mut planner = planner();
        planner.agent.planner_state = PlannerState::Land;
        let field = SphereField::empty();
        let mut tick = ready_tick(&field);
        tick.landing_complete = false;
        let outcome = planner.plan(tick);
        assert!(matches!(outcome, TickOutcome::WaitForRosMsg));
        assert!(planner.agent.previous_trajectory.is_none());
    }

    #[test]
    fn a_nearby_head_on_agent_neighbor_raises_no_alert_when_well_separated() {
        let mut planner = planner();
        let field = SphereField::empty();
        let neighbor = Obstacle {
            id: crate::ids::ObstacleId(1),
            kind: ObstacleKind::Agent { prev_trajectory: None },
            pose: Point::new(3.0, 0.0, 1.0),
            velocity: geometry::Vec3::new(-1.0, 0.0, 0.0),
            radius: 0.15,
            downwash_ratio: 2.0,
            collision_alert: false,
            goal: Some(Point::new(0.0, 0.0, 1.0)),
        };
        let mut tick = ready_tick(&field);
        tick.neighbors = NeighborCache::new(vec![neighbor]);
        let outcome = planner.plan(tick);
        match outcome {
            TickOutcome::Success { collision_alert, .. } => assert!(!collision_alert),
            other => panic!("expected Success, got {other:?}"),
        }
    }
}
