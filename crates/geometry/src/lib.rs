//! Exact closest-point and collision-time routines over points, rays, line
//! segments, and convex hulls.
//!
//! Every routine returns the actual witness points where the minimum
//! distance is attained, not merely a pair of points that happens to realize
//! the correct distance — downstream [LSC](https://en.wikipedia.org/wiki/Corridor)
//! construction needs the witness direction, not just its magnitude.
//!
//! Degenerate inputs (zero-length segments) degrade to the corresponding
//! lower-dimensional routine. Exact colinearity is treated by the parallel
//! branch guarded by [`EPSILON`].

use nalgebra::{Isometry3, Point3, Vector3};

/// A 3D point. In 2D mode callers clamp the `z` component to a configured
/// plane height before calling into this crate.
pub type Point = Point3<f64>;
/// A 3D vector.
pub type Vec3 = Vector3<f64>;

/// Dimensionless epsilon applied after normalization, shared by every
/// routine in this crate so that geometric tolerances stay centralized.
pub const EPSILON: f64 = 1e-5;

/// Error raised when a geometry routine is given an input that violates one
/// of its invariants (for example, an empty hull).
///
/// Per the error handling design: this is a programmer error. In debug
/// builds constructing one of these should be treated as a bug to fail fast
/// on; in release builds callers fall back to a conservative
/// zero-length-witness-at-input default and log instead of panicking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum GeometryError {
    #[error("convex hull requires at least one vertex")]
    EmptyHull,
    #[error("convex hull vertices are degenerate (colinear or coincident)")]
    DegenerateHull,
}

/// The result of a closest-point query: the witness point on each body and
/// the distance between them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClosestPoints {
    pub point_a: Point,
    pub point_b: Point,
    pub distance: f64,
}

impl ClosestPoints {
    fn new(point_a: Point, point_b: Point) -> Self {
        let distance = (point_a - point_b).norm();
        Self {
            point_a,
            point_b,
            distance,
        }
    }

    /// The direction from `point_b` to `point_a`, normalized. `None` when
    /// the two witnesses coincide.
    #[must_use]
    pub fn normal_a_from_b(&self) -> Option<Vec3> {
        let d = self.point_a - self.point_b;
        let n = d.norm();
        (n > EPSILON).then(|| d / n)
    }

    /// Swap the two witnesses, preserving distance. Used by the geometry
    /// round-trip test: `closest(a, b).swapped() == closest(b, a)`.
    #[must_use]
    pub fn swapped(self) -> Self {
        Self {
            point_a: self.point_b,
            point_b: self.point_a,
            distance: self.distance,
        }
    }
}

/// Closest point on the infinite line through `line_a` and `line_b` to
/// `point`.
#[must_use]
pub fn closest_point_on_line(point: Point, line_a: Point, line_b: Point) -> ClosestPoints {
    let dir = line_b - line_a;
    let len_sq = dir.norm_squared();
    if len_sq < EPSILON * EPSILON {
        // Degenerate (zero-length) line degrades to a point.
        return ClosestPoints::new(point, line_a);
    }
    let t = (point - line_a).dot(&dir) / len_sq;
    ClosestPoints::new(point, line_a + dir * t)
}

/// Closest point on the ray starting at `origin` in direction `dir` (need
/// not be normalized) to `point`.
#[must_use]
pub fn closest_point_on_ray(point: Point, origin: Point, dir: Vec3) -> ClosestPoints {
    let len_sq = dir.norm_squared();
    if len_sq < EPSILON * EPSILON {
        return ClosestPoints::new(point, origin);
    }
    let t = ((point - origin).dot(&dir) / len_sq).max(0.0);
    ClosestPoints::new(point, origin + dir * t)
}

/// Closest point on the segment `[seg_a, seg_b]` to `point`.
#[must_use]
pub fn closest_point_on_segment(point: Point, seg_a: Point, seg_b: Point) -> ClosestPoints {
    let dir = seg_b - seg_a;
    let len_sq = dir.norm_squared();
    if len_sq < EPSILON * EPSILON {
        return ClosestPoints::new(point, seg_a);
    }
    let t = ((point - seg_a).dot(&dir) / len_sq).clamp(0.0, 1.0);
    ClosestPoints::new(point, seg_a + dir * t)
}

/// Closest points between two segments `[a0, a1]` and `[b0, b1]`.
///
/// Degenerate segments degrade to [`closest_point_on_segment`]. Parallel
/// segments (including exact colinearity, guarded by [`EPSILON`]) are
/// handled by an explicit branch rather than falling through the general
/// skew-line solve, which is singular in that case.
#[must_use]
pub fn closest_points_segment_segment(a0: Point, a1: Point, b0: Point, b1: Point) -> ClosestPoints {
    let d1 = a1 - a0;
    let d2 = b1 - b0;
    let r = a0 - b0;

    let a = d1.norm_squared();
    let e = d2.norm_squared();

    if a < EPSILON * EPSILON {
        return closest_point_on_segment(a0, b0, b1).swapped();
    }
    if e < EPSILON * EPSILON {
        return closest_point_on_segment(b0, a0, a1);
    }

    let f = d2.dot(&r);

    let b = d1.dot(&d2);
    let c = d1.dot(&r);
    let denom = a.mul_add(e, -(b * b));

    // Parallel branch: denom ~ 0 means d1 and d2 are colinear (or
    // anti-colinear). Pick s at the segment midpoint projection and solve
    // for t directly; this avoids dividing by (near) zero.
    let s = if denom.abs() > EPSILON {
        ((b * f).mul_add(1.0, -c * e) / denom).clamp(0.0, 1.0)
    } else {
        0.0
    };

    let t_unclamped = b.mul_add(s, f) / e;
    let t = t_unclamped.clamp(0.0, 1.0);
    // Re-clamp s if t had to be clamped, mirroring the standard
    // closest-point-between-segments algorithm (Ericson, Real-Time Collision
    // Detection).
    let s = if t_unclamped != t {
        ((t * b - c) / a).clamp(0.0, 1.0)
    } else {
        s
    };

    let point_a = a0 + d1 * s;
    let point_b = b0 + d2 * t;
    ClosestPoints::new(point_a, point_b)
}

/// Closest point on the convex hull spanned by `vertices` to `point`, via
/// GJK on two polytopes — one of them the single-point body `point`.
///
/// # Errors
/// Returns [`GeometryError::EmptyHull`] if `vertices` is empty, or
/// [`GeometryError::DegenerateHull`] if the vertices do not span a proper
/// polyhedron (colinear or coincident). Callers in release builds should
/// treat either as non-fatal and fall back to a zero-length witness at
/// `point`, per the error handling design.
pub fn closest_point_on_convex_hull(
    point: Point,
    vertices: &[Point],
) -> Result<ClosestPoints, GeometryError> {
    if vertices.is_empty() {
        return Err(GeometryError::EmptyHull);
    }
    if vertices.len() == 1 {
        return Ok(ClosestPoints::new(point, vertices[0]));
    }

    let parry_point = Isometry3::translation(point.x, point.y, point.z);
    let ball = parry3d::shape::Ball::new(0.0);

    let parry_vertices: Vec<_> = vertices
        .iter()
        .map(|p| Point3::new(p.x, p.y, p.z))
        .collect();

    let Some(hull) = parry3d::shape::ConvexPolyhedron::from_convex_hull(&parry_vertices) else {
        // Degenerate input (e.g. all vertices colinear): fall back to the
        // nearest segment between the extreme vertices.
        let (lo, hi) = extreme_pair(vertices);
        return Ok(closest_point_on_segment(point, lo, hi));
    };
    let hull_pose = Isometry3::identity();

    match parry3d::query::closest_points(
        &parry_point,
        &ball,
        &hull_pose,
        &hull,
        f64::MAX,
    ) {
        Ok(parry3d::query::ClosestPoints::Intersecting) => Ok(ClosestPoints::new(point, point)),
        Ok(parry3d::query::ClosestPoints::WithinMargin(p1, p2)) => {
            Ok(ClosestPoints::new(Point::new(p1.x, p1.y, p1.z), Point::new(p2.x, p2.y, p2.z)))
        }
        Ok(parry3d::query::ClosestPoints::Disjoint) | Err(_) => Err(GeometryError::DegenerateHull),
    }
}

/// Find the pair of vertices furthest apart; used as a fallback witness
/// segment when the convex hull solver rejects degenerate input.
fn extreme_pair(vertices: &[Point]) -> (Point, Point) {
    let mut best = (vertices[0], vertices[0]);
    let mut best_dist_sq = 0.0_f64;
    for &a in vertices {
        for &b in vertices {
            let d = (a - b).norm_squared();
            if d > best_dist_sq {
                best_dist_sq = d;
                best = (a, b);
            }
        }
    }
    best
}

/// Scale the `z` component of `p` by `1.0 / downwash_ratio`, turning the
/// inter-agent distance metric into an ellipsoidal one that models rotor
/// downwash: agents are considered "closer" vertically than horizontally
/// for a given downwash ratio in `(0, 1]`.
#[must_use]
pub fn downwash_scale(p: Vec3, downwash_ratio: f64) -> Vec3 {
    debug_assert!(downwash_ratio > 0.0, "downwash ratio must be positive");
    Vec3::new(p.x, p.y, p.z / downwash_ratio)
}

/// Closed-form collision time between two points moving along linear paths
/// of equal duration `duration`, given a combined collision radius `radius`.
///
/// Returns `None` (equivalent to +∞: no collision within this segment) if
/// the minimum relative distance along the path never reaches `radius`, or
/// if the interval during which the points are within `radius` of each
/// other lies entirely outside `[0, duration]`. Otherwise returns the
/// entry time into the collision radius.
///
/// When the relative path starts inside the collision radius but the two
/// points are already moving apart, the smaller root of `||R(alpha)|| =
/// radius` falls below `alpha = 0`; this is clamped to `alpha = 0`; i.e. an
/// immediate entry time is reported rather than extrapolating backwards.
#[must_use]
pub fn collision_time(
    a_start: Point,
    a_end: Point,
    b_start: Point,
    b_end: Point,
    duration: f64,
    radius: f64,
) -> Option<f64> {
    let d0 = a_start - b_start;
    let dd = (a_end - a_start) - (b_end - b_start);

    let a = dd.norm_squared();
    let b = 2.0 * d0.dot(&dd);
    let c = d0.norm_squared() - radius * radius;

    if a < EPSILON * EPSILON {
        // No relative motion: constant separation.
        return (d0.norm() < radius).then_some(0.0);
    }

    let min_value = c - b * b / (4.0 * a);
    if min_value >= 0.0 {
        // Minimum relative distance never reaches `radius`.
        return None;
    }

    let discriminant = b.mul_add(b, -4.0 * a * c);
    let sqrt_disc = discriminant.max(0.0).sqrt();
    let root_lo = (-b - sqrt_disc) / (2.0 * a);
    let root_hi = (-b + sqrt_disc) / (2.0 * a);
    let (alpha_lo, alpha_hi) = if root_lo <= root_hi {
        (root_lo, root_hi)
    } else {
        (root_hi, root_lo)
    };

    if alpha_hi < 0.0 || alpha_lo > 1.0 {
        // The in-collision interval doesn't intersect this segment's window.
        return None;
    }

    let alpha_entry = alpha_lo.max(0.0);
    Some(alpha_entry * duration)
}
