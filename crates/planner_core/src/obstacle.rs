//! Obstacle representation and the per-tick neighbor snapshot.

use geometry::{Point, Vec3};
use trajectory::Trajectory;

use crate::ids::ObstacleId;

/// What kind of body an obstacle is, and the data this planner is entitled
/// to know about it.
#[derive(Debug, Clone)]
pub enum ObstacleKind {
    /// Another planner instance. Its most recently published trajectory is
    /// known, if any.
    Agent { prev_trajectory: Option<Trajectory> },
    /// Non-cooperative: only instantaneous position/velocity are known, so
    /// LSCs against it use a constant-velocity prediction.
    Dynamic,
    /// Static occupancy, consumed exclusively through the distance map /
    /// SFC path, never through LSC construction.
    Static,
}

/// A snapshot of one obstacle as observed at the start of a replanning
/// tick.
#[derive(Debug, Clone)]
pub struct Obstacle {
    pub id: ObstacleId,
    pub kind: ObstacleKind,
    pub pose: Point,
    pub velocity: Vec3,
    pub radius: f64,
    pub downwash_ratio: f64,
    pub collision_alert: bool,
    /// The neighbor's own goal, carried on the agent-as-obstacle message so
    /// its [`crate::ids::Priority`] can be reconstructed for LSC tie-break.
    /// `None` for non-agent obstacles, which have no goal.
    pub goal: Option<Point>,
}

impl Obstacle {
    /// Constant-velocity prediction of this obstacle's position at `dt`
    /// seconds past the snapshot time. Used for `DYNAMIC` obstacles and as
    /// the fallback for agents with no known trajectory (§5, "Ordering").
    #[must_use]
    pub fn predict(&self, dt: f64) -> Point {
        self.pose + self.velocity * dt
    }
}

/// The obstacle and neighbor data visible to a replanning tick, captured
/// once at tick start and discarded at tick end.
#[derive(Debug, Clone, Default)]
pub struct NeighborCache {
    obstacles: Vec<Obstacle>,
}

impl NeighborCache {
    #[must_use]
    pub fn new(obstacles: Vec<Obstacle>) -> Self {
        Self { obstacles }
    }

    #[must_use]
    pub fn all(&self) -> &[Obstacle] {
        &self.obstacles
    }

    /// Neighbors within `radius` of `position`, the set an agent actually
    /// builds LSCs against per the communication-range configuration.
    pub fn within_range(&self, position: Point, radius: f64) -> impl Iterator<Item = &Obstacle> {
        self.obstacles
            .iter()
            .filter(move |o| (o.pose - position).norm() <= radius)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obstacle(id: u32, pose: Point, velocity: Vec3) -> Obstacle {
        Obstacle {
            id: ObstacleId(id),
            kind: ObstacleKind::Dynamic,
            pose,
            velocity,
            radius: 0.2,
            downwash_ratio: 1.0,
            collision_alert: false,
            goal: None,
        }
    }

    #[test]
    fn predict_advances_along_constant_velocity() {
        let o = obstacle(1, Point::new(0.0, 0.0, 0.0), Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(o.predict(2.0), Point::new(2.0, 0.0, 0.0));
    }

    #[test]
    fn within_range_filters_by_distance() {
        let cache = NeighborCache::new(vec![
            obstacle(1, Point::new(1.0, 0.0, 0.0), Vec3::zeros()),
            obstacle(2, Point::new(100.0, 0.0, 0.0), Vec3::zeros()),
        ]);
        let nearby: Vec<_> = cache.within_range(Point::new(0.0, 0.0, 0.0), 10.0).collect();
        assert_eq!(nearby.len(), 1);
        assert_eq!(nearby[0].id, ObstacleId(1));
    }
}
