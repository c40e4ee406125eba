//! Headless multi-agent demo: one OS thread per agent, `std::sync::mpsc`
//! channels standing in for the pub/sub trajectory-exchange bus, per
//! `spec.md` §5. Runs the "head-on 2 agents" scenario from `spec.md` §8 by
//! default.

use std::{sync::mpsc, thread, time::Duration};

use geometry::Point;
use planner_config::Config;
use planner_core::{
    agent::Agent,
    cli,
    ids::{AgentId, ObstacleId},
    obstacle::{NeighborCache, Obstacle, ObstacleKind},
    solver::clarabel_adapter::ClarabelSolver,
    state_machine::PriorBased,
    testing::{FixedClock, SphereField},
    Planner, TickInputs, TickOutcome,
};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone)]
struct NeighborUpdate {
    from: AgentId,
    obstacle: Obstacle,
}

fn load_config(cli: &cli::Cli) -> Config {
    if cli.default {
        return Config::default();
    }
    match planner_config::read_config(cli.config.as_ref()) {
        Ok(config) => config,
        Err(error) => {
            tracing::warn!(%error, "falling back to the default configuration");
            Config::default()
        }
    }
}

fn main() {
    let cli = cli::parse_arguments();
    tracing_subscriber::fmt().with_env_filter(EnvFilter::new(cli.log_level.clone())).init();

    let config = load_config(&cli);
    let z = config.world.z_2d;

    let starts = [Point::new(0.0, 0.0, z), Point::new(10.0, 0.0, z)];
    let goals = [Point::new(10.0, 0.0, z), Point::new(0.0, 0.0, z)];
    let agent_count = starts.len();

    let (senders, receivers): (Vec<_>, Vec<_>) = (0..agent_count).map(|_| mpsc::channel::<NeighborUpdate>()).unzip();

    let handles: Vec<_> = receivers
        .into_iter()
        .enumerate()
        .map(|(i, receiver)| {
            let agent = Agent::new(
                AgentId(u32::try_from(i).expect("agent count fits in u32")),
                starts[i],
                goals[i],
                config.robot.radius.get(),
                config.robot.downwash_ratio.get(),
                config.robot.v_max.get(),
                config.robot.a_max.get(),
            );
            let mut planner = Planner::new(agent, config, ClarabelSolver, FixedClock(Duration::ZERO), PriorBased);
            let peers: Vec<_> = senders.iter().enumerate().filter(|(j, _)| *j != i).map(|(_, s)| s.clone()).collect();
            let ticks = cli.ticks;
            let dump_trajectory = cli.dump_trajectory;

            thread::spawn(move || {
                let field = SphereField::empty();
                for tick_index in 0..ticks {
                    let mut neighbor_obstacles = Vec::new();
                    while let Ok(update) = receiver.try_recv() {
                        tracing::trace!(from = %update.from, "received neighbor update");
                        neighbor_obstacles.push(update.obstacle);
                    }

                    let tick_inputs = TickInputs {
                        inputs_ready: true,
                        observed_state: None,
                        is_disturbed: false,
                        neighbors: NeighborCache::new(neighbor_obstacles),
                        next_waypoint: None,
                        state_command: None,
                        landing_complete: false,
                        distance_field: &field,
                    };

                    let outcome = planner.plan(tick_inputs);
                    match outcome {
                        TickOutcome::Success { trajectory, collision_alert, .. } => {
                            if dump_trajectory {
                                println!("tick {tick_index} agent {}\n{}", planner.agent.id, trajectory.dump());
                            }
                            let obstacle = Obstacle {
                                id: ObstacleId::from(planner.agent.id),
                                kind: ObstacleKind::Agent { prev_trajectory: Some(trajectory) },
                                pose: planner.agent.state.position,
                                velocity: planner.agent.state.velocity,
                                radius: planner.agent.radius,
                                downwash_ratio: planner.agent.downwash_ratio,
                                collision_alert,
                                goal: Some(planner.agent.current_goal),
                            };
                            for sender in &peers {
                                let _ = sender.send(NeighborUpdate {
                                    from: planner.agent.id,
                                    obstacle: obstacle.clone(),
                                });
                            }
                        }
                        other => {
                            tracing::warn!(tick = tick_index, outcome = ?other.as_planner_error(), "tick did not produce a fresh trajectory");
                        }
                    }

                    thread::sleep(Duration::from_millis(1));
                }
                planner.agent
            })
        })
        .collect();

    for handle in handles {
        let agent = handle.join().expect("agent worker thread panicked");
        tracing::info!(id = %agent.id, position = ?agent.state.position, "agent finished");
    }
}
