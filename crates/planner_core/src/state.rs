//! The kinematic state carried by agents and obstacles.

use geometry::{Point, Vec3};

/// Position, velocity, and acceleration at a single instant.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct State {
    pub position: Point,
    pub velocity: Vec3,
    pub acceleration: Vec3,
}

impl State {
    #[must_use]
    pub fn at_rest(position: Point) -> Self {
        Self {
            position,
            velocity: Vec3::zeros(),
            acceleration: Vec3::zeros(),
        }
    }

    /// Override this state with an externally observed position, zeroing
    /// velocity and acceleration, per the disturbance-handling rule in the
    /// planner state machine.
    pub fn disturb_to(&mut self, observed_position: Point) {
        self.position = observed_position;
        self.velocity = Vec3::zeros();
        self.acceleration = Vec3::zeros();
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn disturb_to_zeros_derivatives() {
        let mut state = State {
            position: Point::new(0.0, 0.0, 0.0),
            velocity: Vec3::new(1.0, 2.0, 3.0),
            acceleration: Vec3::new(1.0, 0.0, 0.0),
        };
        state.disturb_to(Point::new(5.0, 5.0, 1.0));
        assert_relative_eq!(state.position, Point::new(5.0, 5.0, 1.0));
        assert_relative_eq!(state.velocity, Vec3::zeros());
        assert_relative_eq!(state.acceleration, Vec3::zeros());
    }
}
