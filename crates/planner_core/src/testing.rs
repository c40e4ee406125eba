//! Deterministic stand-ins for the three trait seams a host must supply
//! (`DistanceField`, `QpSolver`, `Clock`), for use in this crate's own
//! integration tests and by downstream consumers exercising the planner
//! without a real map service or solver.

use std::time::Duration;

use geometry::Point;

use crate::{sfc::DistanceField, solver::Clock};

/// Distance to the nearest of a fixed set of spheres, the simplest
/// analytic stand-in for an occupancy/distance-transform service.
#[derive(Debug, Clone)]
pub struct SphereField {
    pub spheres: Vec<(Point, f64)>,
}

impl SphereField {
    #[must_use]
    pub fn empty() -> Self {
        Self { spheres: Vec::new() }
    }

    #[must_use]
    pub fn with_sphere(mut self, center: Point, radius: f64) -> Self {
        self.spheres.push((center, radius));
        self
    }
}

impl DistanceField for SphereField {
    fn value(&self, p: Point) -> f64 {
        self.spheres
            .iter()
            .map(|(center, radius)| (p - center).norm() - radius)
            .fold(f64::INFINITY, f64::min)
    }
}

/// A clock that reports a fixed elapsed time regardless of wall time,
/// keeping deadline-dependent tests deterministic.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub Duration);

impl Clock for FixedClock {
    fn now(&self) -> Duration {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sphere_field_with_no_spheres_is_unbounded_free_space() {
        let field = SphereField::empty();
        assert_eq!(field.value(Point::new(0.0, 0.0, 0.0)), f64::INFINITY);
    }

    #[test]
    fn sphere_field_reports_distance_to_the_nearest_sphere() {
        let field = SphereField::empty().with_sphere(Point::new(0.0, 0.0, 0.0), 1.0);
        assert_eq!(field.value(Point::new(3.0, 0.0, 0.0)), 2.0);
    }

    #[test]
    fn fixed_clock_reports_what_it_was_built_with() {
        let clock = FixedClock(Duration::from_millis(42));
        assert_eq!(clock.now(), Duration::from_millis(42));
    }
}
