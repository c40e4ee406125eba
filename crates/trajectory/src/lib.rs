//! Bernstein-basis piecewise polynomial trajectory representation.
//!
//! A trajectory is `segment_count` segments of duration `segment_duration`,
//! each a degree-`basis_degree` Bezier curve in Bernstein form. The convex
//! hull property of the Bernstein basis — the curve never leaves the
//! convex hull of its control points — is what lets the planner turn
//! corridor constraints on a continuous curve into linear constraints on a
//! finite set of control points.

use geometry::{Point, Vec3};

/// Errors raised constructing or evaluating a [`Trajectory`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TrajectoryError {
    #[error("a trajectory must have at least one segment")]
    EmptySegments,
    #[error("segment {index} has {actual} control points, expected {expected}")]
    WrongControlPointCount {
        index: usize,
        expected: usize,
        actual: usize,
    },
    #[error("segment duration must be strictly positive")]
    NonPositiveDuration,
}

/// One segment of a trajectory: `basis_degree + 1` control points in
/// Bernstein form over the local parameter `s in [0, 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    control_points: Vec<Point>,
}

impl Segment {
    /// Construct a segment from its control points. The degree is
    /// `control_points.len() - 1`.
    #[must_use]
    pub fn new(control_points: Vec<Point>) -> Self {
        Self { control_points }
    }

    #[must_use]
    pub fn degree(&self) -> usize {
        self.control_points.len() - 1
    }

    #[must_use]
    pub fn control_points(&self) -> &[Point] {
        &self.control_points
    }

    pub fn control_points_mut(&mut self) -> &mut [Point] {
        &mut self.control_points
    }

    /// Position at local parameter `s in [0, 1]`, via de Casteljau's
    /// algorithm.
    #[must_use]
    pub fn position(&self, s: f64) -> Point {
        de_casteljau_point(&self.control_points, s)
    }

    /// Control points of the hodograph (derivative curve), scaled for an
    /// absolute-time derivative given this segment spans duration `delta`.
    #[must_use]
    pub fn velocity_control_points(&self, delta: f64) -> Vec<Vec3> {
        derivative_control_points_of_points(&self.control_points, delta)
    }

    #[must_use]
    pub fn acceleration_control_points(&self, delta: f64) -> Vec<Vec3> {
        let velocity_cp = self.velocity_control_points(delta);
        derivative_control_points_of_vectors(&velocity_cp, delta)
    }

    #[must_use]
    pub fn velocity(&self, s: f64, delta: f64) -> Vec3 {
        de_casteljau_vector(&self.velocity_control_points(delta), s)
    }

    #[must_use]
    pub fn acceleration(&self, s: f64, delta: f64) -> Vec3 {
        de_casteljau_vector(&self.acceleration_control_points(delta), s)
    }

    /// Axis-aligned bounding box of this segment's control points, the
    /// starting point for SFC construction.
    #[must_use]
    pub fn control_point_aabb(&self) -> (Point, Point) {
        let mut min = self.control_points[0];
        let mut max = self.control_points[0];
        for p in &self.control_points[1..] {
            min = Point::new(min.x.min(p.x), min.y.min(p.y), min.z.min(p.z));
            max = Point::new(max.x.max(p.x), max.y.max(p.y), max.z.max(p.z));
        }
        (min, max)
    }
}

/// A sequence of `segments.len()` segments, each spanning
/// `segment_duration`, starting at absolute time `t0`.
#[derive(Debug, Clone, PartialEq)]
pub struct Trajectory {
    t0: f64,
    segment_duration: f64,
    segments: Vec<Segment>,
}

impl Trajectory {
    /// # Errors
    /// [`TrajectoryError::EmptySegments`] if `segments` is empty, or
    /// [`TrajectoryError::NonPositiveDuration`] if `segment_duration <= 0`.
    pub fn new(t0: f64, segment_duration: f64, segments: Vec<Segment>) -> Result<Self, TrajectoryError> {
        if segments.is_empty() {
            return Err(TrajectoryError::EmptySegments);
        }
        if segment_duration <= 0.0 {
            return Err(TrajectoryError::NonPositiveDuration);
        }
        Ok(Self {
            t0,
            segment_duration,
            segments,
        })
    }

    /// Build directly from per-segment control point arrays, validating
    /// that every segment has the same number of control points as the
    /// first.
    pub fn from_control_points(
        t0: f64,
        segment_duration: f64,
        control_points: Vec<Vec<Point>>,
    ) -> Result<Self, TrajectoryError> {
        if control_points.is_empty() {
            return Err(TrajectoryError::EmptySegments);
        }
        let expected = control_points[0].len();
        for (index, cps) in control_points.iter().enumerate() {
            if cps.len() != expected {
                return Err(TrajectoryError::WrongControlPointCount {
                    index,
                    expected,
                    actual: cps.len(),
                });
            }
        }
        let segments = control_points.into_iter().map(Segment::new).collect();
        Self::new(t0, segment_duration, segments)
    }

    #[must_use]
    pub fn t0(&self) -> f64 {
        self.t0
    }

    #[must_use]
    pub fn segment_duration(&self) -> f64 {
        self.segment_duration
    }

    #[must_use]
    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    #[must_use]
    pub fn basis_degree(&self) -> usize {
        self.segments[0].degree()
    }

    #[must_use]
    pub fn horizon(&self) -> f64 {
        self.segment_duration * self.segment_count() as f64
    }

    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn segments_mut(&mut self) -> &mut [Segment] {
        &mut self.segments
    }

    #[must_use]
    pub fn segment(&self, index: usize) -> &Segment {
        &self.segments[index]
    }

    /// Map an absolute time to `(segment_index, local_s)`, clamping the
    /// segment index to `[0, segment_count - 1]` and `local_s` to `[0, 1]`.
    #[must_use]
    pub fn segment_index_and_local_s(&self, t: f64) -> (usize, f64) {
        let elapsed = (t - self.t0).max(0.0);
        let raw_index = (elapsed / self.segment_duration).floor();
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let index = (raw_index as usize).min(self.segment_count() - 1);
        #[allow(clippy::cast_precision_loss)]
        let local_s = ((elapsed - index as f64 * self.segment_duration) / self.segment_duration)
            .clamp(0.0, 1.0);
        (index, local_s)
    }

    #[must_use]
    pub fn position(&self, t: f64) -> Point {
        let (index, s) = self.segment_index_and_local_s(t);
        self.segments[index].position(s)
    }

    #[must_use]
    pub fn velocity(&self, t: f64) -> Vec3 {
        let (index, s) = self.segment_index_and_local_s(t);
        self.segments[index].velocity(s, self.segment_duration)
    }

    #[must_use]
    pub fn acceleration(&self, t: f64) -> Vec3 {
        let (index, s) = self.segment_index_and_local_s(t);
        self.segments[index].acceleration(s, self.segment_duration)
    }

    /// All control points across all segments, in order. Useful for the QP
    /// assembler, which treats every control point as a decision variable.
    pub fn control_points(&self) -> impl Iterator<Item = &Point> {
        self.segments.iter().flat_map(|s| s.control_points())
    }

    /// Whether consecutive segments agree on position, velocity, and
    /// acceleration at their shared boundary, to within `tol`.
    #[must_use]
    pub fn is_c2_continuous(&self, tol: f64) -> bool {
        for window in self.segments.windows(2) {
            let (prev, next) = (&window[0], &window[1]);
            let delta = self.segment_duration;
            let pos_ok = (prev.position(1.0) - next.position(0.0)).norm() <= tol;
            let vel_ok = (prev.velocity(1.0, delta) - next.velocity(0.0, delta)).norm() <= tol;
            let acc_ok =
                (prev.acceleration(1.0, delta) - next.acceleration(0.0, delta)).norm() <= tol;
            if !(pos_ok && vel_ok && acc_ok) {
                return false;
            }
        }
        true
    }

    /// Render the trajectory's control points as a small table, in the
    /// style of `linalg::pretty_print`. Intended for debug logging, not
    /// performance-sensitive code paths.
    #[must_use]
    pub fn dump(&self) -> String {
        let mut out = String::new();
        for (k, segment) in self.segments.iter().enumerate() {
            out.push_str(&format!("╭── segment {k} ──\n"));
            for p in segment.control_points() {
                out.push_str(&format!("│ ({:.3}, {:.3}, {:.3})\n", p.x, p.y, p.z));
            }
            out.push_str("╰──\n");
        }
        out
    }
}

fn de_casteljau_point(points: &[Point], s: f64) -> Point {
    let mut pts: Vec<Point> = points.to_vec();
    let len = pts.len();
    for k in 1..len {
        for i in 0..(len - k) {
            pts[i] = pts[i] + (pts[i + 1] - pts[i]) * s;
        }
    }
    pts[0]
}

fn de_casteljau_vector(points: &[Vec3], s: f64) -> Vec3 {
    if points.is_empty() {
        return Vec3::zeros();
    }
    let mut pts: Vec<Vec3> = points.to_vec();
    let len = pts.len();
    for k in 1..len {
        for i in 0..(len - k) {
            pts[i] = pts[i] + (pts[i + 1] - pts[i]) * s;
        }
    }
    pts[0]
}

/// Control points of the derivative of a degree-`n` Bezier curve (given as
/// `Point`s) with respect to absolute time, given the segment spans
/// duration `delta`. The derivative of a Bernstein curve of degree `n` is a
/// degree `n - 1` curve with control points `n * (P[i+1] - P[i])`; dividing
/// by `delta` converts the derivative from the local parameter `s` to
/// absolute time.
fn derivative_control_points_of_points(points: &[Point], delta: f64) -> Vec<Vec3> {
    let n = points.len() - 1;
    #[allow(clippy::cast_precision_loss)]
    let scale = n as f64 / delta;
    (0..n).map(|i| (points[i + 1] - points[i]) * scale).collect()
}

/// As [`derivative_control_points_of_points`], for a control-point sequence
/// that is itself already a vector-valued (not point-valued) curve.
fn derivative_control_points_of_vectors(points: &[Vec3], delta: f64) -> Vec<Vec3> {
    if points.len() <= 1 {
        return Vec::new();
    }
    let n = points.len() - 1;
    #[allow(clippy::cast_precision_loss)]
    let scale = n as f64 / delta;
    (0..n).map(|i| (points[i + 1] - points[i]) * scale).collect()
}

/// Binomial coefficient `C(n, i)`, used only by tests to cross-check
/// [`de_casteljau_point`] against the direct Bernstein sum.
#[must_use]
#[cfg(test)]
fn binomial(n: usize, i: usize) -> f64 {
    if i > n {
        return 0.0;
    }
    let mut result = 1.0_f64;
    for k in 0..i {
        result *= (n - k) as f64 / (i - k) as f64;
    }
    result
}

/// The `i`-th Bernstein basis polynomial of degree `n`, evaluated at `s`.
#[must_use]
#[cfg(test)]
fn bernstein_basis(n: usize, i: usize, s: f64) -> f64 {
    binomial(n, i) * s.powi(i as i32) * (1.0 - s).powi((n - i) as i32)
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use pretty_assertions::assert_eq;

    use super::*;

    fn straight_line_segment(start: Point, end: Point, degree: usize) -> Segment {
        let cps = (0..=degree)
            .map(|i| {
                #[allow(clippy::cast_precision_loss)]
                let t = i as f64 / degree as f64;
                start + (end - start) * t
            })
            .collect();
        Segment::new(cps)
    }

    #[test]
    fn de_casteljau_matches_direct_bernstein_sum() {
        let cps = vec![
            Point::new(0.0, 0.0, 0.0),
            Point::new(1.0, 2.0, 0.0),
            Point::new(2.0, -1.0, 0.0),
            Point::new(3.0, 0.0, 1.0),
        ];
        let segment = Segment::new(cps.clone());
        for i in 0..=10 {
            let s = f64::from(i) / 10.0;
            let fast = segment.position(s);
            let n = cps.len() - 1;
            let direct = cps
                .iter()
                .enumerate()
                .fold(Vec3::zeros(), |acc, (i, p)| acc + p.coords * bernstein_basis(n, i, s));
            assert_relative_eq!(fast.coords, direct, epsilon = 1e-9);
        }
    }

    #[test]
    fn position_at_s_zero_and_one_are_the_endpoints() {
        let segment = straight_line_segment(Point::new(0.0, 0.0, 0.0), Point::new(4.0, 0.0, 0.0), 5);
        assert_relative_eq!(segment.position(0.0), Point::new(0.0, 0.0, 0.0));
        assert_relative_eq!(segment.position(1.0), Point::new(4.0, 0.0, 0.0));
    }

    #[test]
    fn velocity_of_straight_line_is_constant() {
        let segment = straight_line_segment(Point::new(0.0, 0.0, 0.0), Point::new(4.0, 0.0, 0.0), 5);
        let delta = 0.2;
        let v0 = segment.velocity(0.0, delta);
        let v1 = segment.velocity(1.0, delta);
        assert_relative_eq!(v0, v1, epsilon = 1e-9);
        assert_relative_eq!(v0, Vec3::new(4.0 / delta, 0.0, 0.0), epsilon = 1e-9);
    }

    #[test]
    fn trajectory_evaluates_to_input_state_at_t0() {
        let segment = straight_line_segment(Point::new(1.0, 1.0, 1.0), Point::new(2.0, 1.0, 1.0), 5);
        let traj = Trajectory::new(0.0, 0.2, vec![segment.clone(), segment]).unwrap();
        assert_relative_eq!(traj.position(0.0), Point::new(1.0, 1.0, 1.0), epsilon = 1e-9);
    }

    #[test]
    fn segment_index_clamps_to_last_segment_past_horizon() {
        let segment = straight_line_segment(Point::new(0.0, 0.0, 0.0), Point::new(1.0, 0.0, 0.0), 5);
        let traj = Trajectory::new(0.0, 0.2, vec![segment.clone(), segment]).unwrap();
        let (index, s) = traj.segment_index_and_local_s(1000.0);
        assert_eq!(index, 1);
        assert_relative_eq!(s, 1.0);
    }

    #[test]
    fn two_identical_adjacent_segments_are_c2_continuous() {
        let segment = straight_line_segment(Point::new(0.0, 0.0, 0.0), Point::new(1.0, 0.0, 0.0), 5);
        let traj = Trajectory::new(0.0, 0.2, vec![segment.clone(), segment]).unwrap();
        assert!(traj.is_c2_continuous(1e-9));
    }

    #[test]
    fn mismatched_control_point_counts_are_rejected() {
        let a = Segment::new(vec![Point::new(0.0, 0.0, 0.0); 6]);
        let b = Segment::new(vec![Point::new(0.0, 0.0, 0.0); 5]);
        let err = Trajectory::from_control_points(
            0.0,
            0.2,
            vec![a.control_points().to_vec(), b.control_points().to_vec()],
        )
        .unwrap_err();
        assert_eq!(
            err,
            TrajectoryError::WrongControlPointCount {
                index: 1,
                expected: 6,
                actual: 5
            }
        );
    }
}
