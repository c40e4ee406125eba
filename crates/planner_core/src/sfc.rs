//! Safe Flight Corridor construction, per `spec.md` §4.5: a per-segment
//! axis-aligned box, inflated from the warm start and pruned against the
//! static-environment distance map.

use geometry::Point;
use trajectory::Segment;

/// Distance to the nearest static obstacle at a point in space. The real
/// implementation is owned by an external occupancy/distance-transform
/// service; this crate only consumes it.
pub trait DistanceField {
    fn value(&self, p: Point) -> f64;
}

/// An axis-aligned box that a segment's control points must stay inside.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sfc {
    pub min: Point,
    pub max: Point,
}

impl Sfc {
    #[must_use]
    pub fn contains(&self, p: Point) -> bool {
        (self.min.x..=self.max.x).contains(&p.x)
            && (self.min.y..=self.max.y).contains(&p.y)
            && (self.min.z..=self.max.z).contains(&p.z)
    }

    #[must_use]
    pub fn intersects(&self, other: &Self) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
            && self.min.z <= other.max.z
            && self.max.z >= other.min.z
    }
}

/// Expand a segment's control-point bounding box one face at a time while
/// the distance map still clears `robot_radius` at the candidate boundary.
pub fn construct_sfc(segment: &Segment, field: &dyn DistanceField, robot_radius: f64, step: f64, max_steps: usize) -> Sfc {
    let (min0, max0) = segment.control_point_aabb();
    let mut bounds = [min0.x, max0.x, min0.y, max0.y, min0.z, max0.z];
    let mut growing = [true; 6];
    let directions = [-step, step, -step, step, -step, step];

    for _ in 0..max_steps {
        if growing.iter().all(|g| !g) {
            break;
        }
        for face in 0..6 {
            if !growing[face] {
                continue;
            }
            let mut candidate = bounds;
            candidate[face] += directions[face];
            if face_samples(&candidate, face).iter().all(|&sample| field.value(sample) >= robot_radius) {
                bounds = candidate;
            } else {
                growing[face] = false;
            }
        }
    }

    Sfc {
        min: Point::new(bounds[0], bounds[2], bounds[4]),
        max: Point::new(bounds[1], bounds[3], bounds[5]),
    }
}

/// Sample points covering the candidate boundary face being tested for
/// clearance: its four corners plus its centroid, all pinned to the
/// just-expanded coordinate along `face`'s axis. Sampling only the box
/// center (as opposed to the face itself) lets a face that has already
/// grown far along one axis expand straight through an obstacle before the
/// center catches up.
fn face_samples(bounds: &[f64; 6], face: usize) -> [Point; 5] {
    let axis = face / 2;
    let coord = bounds[face];
    let other_axes = [0, 1, 2].into_iter().filter(|&a| a != axis);
    let [other_a, other_b] = {
        let mut it = other_axes;
        [it.next().expect("exactly two other axes"), it.next().expect("exactly two other axes")]
    };

    let at = |a: usize, v: f64| -> [f64; 3] {
        let mut coords = [0.0; 3];
        coords[axis] = coord;
        coords[a] = v;
        coords
    };
    let corner = |a_val: f64, b_val: f64| -> Point {
        let mut coords = at(other_a, a_val);
        coords[other_b] = b_val;
        Point::new(coords[0], coords[1], coords[2])
    };

    let (a_min, a_max) = (bounds[other_a * 2], bounds[other_a * 2 + 1]);
    let (b_min, b_max) = (bounds[other_b * 2], bounds[other_b * 2 + 1]);
    let centroid = corner((a_min + a_max) * 0.5, (b_min + b_max) * 0.5);

    [corner(a_min, b_min), corner(a_min, b_max), corner(a_max, b_min), corner(a_max, b_max), centroid]
}

/// Ensure adjacent SFCs overlap at the shared control point between
/// segments `k` and `k+1`, shrinking the larger box's boundary face if an
/// independent expansion left them disjoint.
pub fn reconcile_adjacent(sfcs: &mut [Sfc], shared_points: &[Point]) {
    for k in 0..sfcs.len().saturating_sub(1) {
        let shared = shared_points[k];
        if sfcs[k].intersects(&sfcs[k + 1]) && sfcs[k].contains(shared) && sfcs[k + 1].contains(shared) {
            continue;
        }
        // Degenerate fallback: collapse both boxes onto a box that is
        // exactly the shared point, which is always feasible because the
        // trajectory passes through it by construction.
        let pinned = Sfc {
            min: shared,
            max: shared,
        };
        sfcs[k] = pinned;
        sfcs[k + 1] = pinned;
    }
}
