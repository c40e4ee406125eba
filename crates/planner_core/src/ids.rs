//! Stable identifiers and the priority ordering used to break ties during
//! LSC construction.

/// Identifier of a planner instance, stable for the lifetime of the agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, derive_more::Display)]
pub struct AgentId(pub u32);

/// Identifier of an obstacle (which may itself be another agent).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, derive_more::Display)]
pub struct ObstacleId(pub u32);

impl From<AgentId> for ObstacleId {
    fn from(id: AgentId) -> Self {
        Self(id.0)
    }
}

/// Total order used to break ties during LSC construction: ascending
/// remaining distance to the desired goal, then ascending id. An agent that
/// compares greater than another is the lower-priority one and yields
/// additional margin when the two would otherwise compute antipodal
/// hyperplanes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Priority {
    pub remaining_goal_distance: f64,
    pub id: AgentId,
}

impl Priority {
    #[must_use]
    pub fn new(remaining_goal_distance: f64, id: AgentId) -> Self {
        Self {
            remaining_goal_distance,
            id,
        }
    }
}

impl Eq for Priority {}

impl PartialOrd for Priority {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Priority {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.remaining_goal_distance
            .total_cmp(&other.remaining_goal_distance)
            .then_with(|| self.id.cmp(&other.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closer_to_goal_is_higher_priority() {
        let near = Priority::new(1.0, AgentId(5));
        let far = Priority::new(10.0, AgentId(0));
        assert!(near < far);
    }

    #[test]
    fn equal_distance_breaks_tie_by_id() {
        let a = Priority::new(3.0, AgentId(1));
        let b = Priority::new(3.0, AgentId(2));
        assert!(a < b);
    }

    #[test]
    fn priority_never_ties() {
        let a = Priority::new(3.0, AgentId(1));
        let b = Priority::new(3.0, AgentId(1));
        assert_eq!(a.cmp(&b), std::cmp::Ordering::Equal);
    }
}
