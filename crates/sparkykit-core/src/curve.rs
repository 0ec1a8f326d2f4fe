//! Cubic Hermite splines through a sequence of control points.
//!
//! Tangents are estimated locally from neighbouring points and scaled by the
//! spline's `tension`. End tangents mirror the missing neighbour across the
//! end point. Evaluation never fails: empty sequences evaluate to zero and a
//! single point evaluates to itself.

use glam::Vec3;
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::error::CurveError;
use crate::random::UniformSampler;

/// Tension used for every spline built by [`Spline::generate_path`].
pub const GENERATED_PATH_TENSION: f32 = 0.5;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Spline {
    points: Vec<Vec3>,
    pub tension: f32,
}

impl Spline {
    pub fn new(points: Vec<Vec3>) -> Self {
        Self {
            points,
            tension: 0.0,
        }
    }

    pub fn with_tension(points: Vec<Vec3>, tension: f32) -> Self {
        Self { points, tension }
    }

    pub fn points(&self) -> &[Vec3] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Tangent at control point `index`, or an error if the index is outside the sequence.
    pub fn try_tangent_at(&self, index: isize) -> Result<Vec3, CurveError> {
        let len = self.points.len();
        if index < 0 || index as usize >= len {
            return Err(CurveError::TangentIndexOutOfRange { index, len });
        }
        if len < 2 {
            return Ok(Vec3::ZERO);
        }

        let i = index as usize;
        let p = &self.points;
        let previous = if i == 0 { p[0] + (p[0] - p[1]) } else { p[i - 1] };
        let next = if i == len - 1 {
            p[i] + (p[i] - p[i - 1])
        } else {
            p[i + 1]
        };
        Ok((next - previous) * self.tension)
    }

    /// Like [`Self::try_tangent_at`] but reports range errors and falls back to zero.
    pub fn tangent_at(&self, index: isize) -> Vec3 {
        self.try_tangent_at(index).unwrap_or_else(|err| {
            error!(%err, "spline tangent lookup");
            Vec3::ZERO
        })
    }

    /// Point on segment `segment` at local parameter `local_t`.
    ///
    /// Segments past the end clamp to the last point, negative segments to the first.
    pub fn evaluate_segment(&self, segment: isize, local_t: f32) -> Vec3 {
        let Some(&last) = self.points.last() else {
            return Vec3::ZERO;
        };
        if segment >= self.points.len() as isize - 1 {
            return last;
        }
        if segment < 0 {
            return self.points[0];
        }

        let i = segment as usize;
        let pk1 = self.points[i];
        let pk2 = self.points[i + 1];
        let dp1 = self.tangent_at(segment);
        let dp2 = self.tangent_at(segment + 1);
        Vec3::new(
            hermite_blend(local_t, pk1.x, pk2.x, dp1.x, dp2.x),
            hermite_blend(local_t, pk1.y, pk2.y, dp1.y, dp2.y),
            hermite_blend(local_t, pk1.z, pk2.z, dp1.z, dp2.z),
        )
    }

    /// Point at normalized parameter `t`, clamped to `[0, 1]` over the whole sequence.
    pub fn evaluate(&self, t: f32) -> Vec3 {
        if self.points.is_empty() {
            return Vec3::ZERO;
        }
        let t = t.clamp(0.0, 1.0);
        let last_index = self.points.len() as isize - 1;
        let expanded = t * last_index as f32;
        let floor = expanded.floor();
        let local_t = expanded - floor;
        let segment = (floor as isize).clamp(0, last_index);
        self.evaluate_segment(segment, local_t)
    }

    /// `count` points sampled at uniform parameter steps from 0 to 1 inclusive.
    pub fn sample_uniform(&self, count: usize) -> Vec<Vec3> {
        match count {
            0 => Vec::new(),
            1 => vec![self.evaluate(0.0)],
            _ => (0..count)
                .map(|i| self.evaluate(i as f32 / (count - 1) as f32))
                .collect(),
        }
    }

    /// Builds a jittered path from `start` to `finish`.
    ///
    /// Each pass doubles the interior point count (1, 3, 7, ...), placing new
    /// points along the previous pass's curve and offsetting them across the
    /// path. The offset shrinks with the segment length of the current pass.
    pub fn generate_path(
        start: Vec3,
        finish: Vec3,
        passes: usize,
        spread_x: f32,
        spread_y: f32,
        sampler: &mut impl UniformSampler,
    ) -> Spline {
        let mut curve = Spline::new(vec![start, finish]);

        let length = start.distance(finish);
        if length == 0.0 {
            return curve;
        }

        let direction = (finish - start) / length;
        let right_dot = direction.dot(Vec3::X).abs();
        let up_dot = direction.dot(Vec3::Y).abs();
        let side = if right_dot < up_dot { Vec3::X } else { Vec3::Y };
        let normal = direction.cross(side);

        let mut mid_points = 0usize;
        for _ in 0..passes {
            mid_points += mid_points + 1;
            let total = mid_points + 2;
            let segment_size = length / (mid_points + 1) as f32;
            let spread_side = segment_size * spread_x;
            let spread_normal = segment_size * spread_y;

            let mut points = Vec::with_capacity(total);
            points.push(start);
            for j in 1..total - 1 {
                let pct = j as f32 / (total - 1) as f32;
                let mut point = curve.evaluate(pct);
                point += side * sampler.uniform(-spread_side, spread_side);
                point += normal * sampler.uniform(-spread_normal, spread_normal);
                points.push(point);
            }
            points.push(finish);

            curve = Spline::with_tension(points, GENERATED_PATH_TENSION);
        }
        curve
    }
}

/// Cubic Hermite basis applied to one coordinate.
pub fn hermite_blend(u: f32, pk1: f32, pk2: f32, dp1: f32, dp2: f32) -> f32 {
    let u2 = u * u;
    let u3 = u2 * u;
    (2.0 * u3 - 3.0 * u2 + 1.0) * pk1
        + (-2.0 * u3 + 3.0 * u2) * pk2
        + (u3 - 2.0 * u2 + u) * dp1
        + (u3 - u2) * dp2
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::{MidpointSampler, RngSampler};

    const EPS: f32 = 1e-5;

    fn zigzag() -> Vec<Vec3> {
        vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 2.0, 0.0),
            Vec3::new(2.0, -1.0, 1.0),
            Vec3::new(4.0, 0.5, 0.0),
        ]
    }

    #[test]
    fn hermite_basis_hits_end_points() {
        assert_eq!(hermite_blend(0.0, 3.0, 7.0, 10.0, -10.0), 3.0);
        assert!((hermite_blend(1.0, 3.0, 7.0, 10.0, -10.0) - 7.0).abs() < EPS);
    }

    #[test]
    fn interior_tangent_uses_neighbours() {
        let spline = Spline::with_tension(zigzag(), 0.5);
        let tangent = spline.tangent_at(1);
        assert!(tangent.abs_diff_eq((zigzag()[2] - zigzag()[0]) * 0.5, EPS));
    }

    #[test]
    fn end_tangents_mirror_missing_neighbour() {
        let points = zigzag();
        let spline = Spline::with_tension(points.clone(), 1.0);
        // prev = p0 + (p0 - p1), so next - prev = 2 (p1 - p0)
        assert!(spline.tangent_at(0).abs_diff_eq((points[1] - points[0]) * 2.0, EPS));
        assert!(spline.tangent_at(3).abs_diff_eq((points[3] - points[2]) * 2.0, EPS));
    }

    #[test]
    fn out_of_range_tangent_is_zero_and_reported() {
        let spline = Spline::with_tension(zigzag(), 0.5);
        assert_eq!(spline.tangent_at(4), Vec3::ZERO);
        assert_eq!(spline.tangent_at(-1), Vec3::ZERO);
        assert_eq!(
            spline.try_tangent_at(4),
            Err(CurveError::TangentIndexOutOfRange { index: 4, len: 4 })
        );
    }

    #[test]
    fn evaluate_hits_first_and_last_point() {
        for tension in [0.0, 0.25, 0.5, 2.0] {
            let spline = Spline::with_tension(zigzag(), tension);
            assert!(spline.evaluate(0.0).abs_diff_eq(zigzag()[0], EPS));
            assert!(spline.evaluate(1.0).abs_diff_eq(zigzag()[3], EPS));
        }
    }

    #[test]
    fn evaluate_passes_through_interior_control_points() {
        let spline = Spline::with_tension(zigzag(), 0.5);
        assert!(spline.evaluate(1.0 / 3.0).abs_diff_eq(zigzag()[1], 1e-4));
        assert!(spline.evaluate(2.0 / 3.0).abs_diff_eq(zigzag()[2], 1e-4));
    }

    #[test]
    fn evaluate_clamps_parameter() {
        let spline = Spline::with_tension(zigzag(), 0.5);
        assert_eq!(spline.evaluate(-3.0), spline.evaluate(0.0));
        assert_eq!(spline.evaluate(9.0), spline.evaluate(1.0));
    }

    #[test]
    fn degenerate_sequences_have_defined_values() {
        assert_eq!(Spline::default().evaluate(0.3), Vec3::ZERO);
        let single = Spline::with_tension(vec![Vec3::new(1.0, 2.0, 3.0)], 0.5);
        for t in [0.0, 0.25, 0.5, 1.0] {
            assert_eq!(single.evaluate(t), Vec3::new(1.0, 2.0, 3.0));
        }
        assert_eq!(single.tangent_at(0), Vec3::ZERO);
    }

    #[test]
    fn zero_tension_two_points_is_linear() {
        let a = Vec3::new(-1.0, 0.0, 2.0);
        let b = Vec3::new(3.0, 4.0, 0.0);
        let spline = Spline::new(vec![a, b]);
        for t in [0.1, 0.3, 0.5, 0.9] {
            let u = t;
            let s = 3.0 * u * u - 2.0 * u * u * u;
            // zero tangents leave the smoothstep blend of the end points
            assert!(spline.evaluate(t).abs_diff_eq(a.lerp(b, s), 1e-4));
        }
    }

    #[test]
    fn segment_index_clamps() {
        let spline = Spline::with_tension(zigzag(), 0.5);
        assert_eq!(spline.evaluate_segment(10, 0.5), zigzag()[3]);
        assert_eq!(spline.evaluate_segment(-2, 0.5), zigzag()[0]);
    }

    #[test]
    fn generate_path_with_coincident_ends_is_constant() {
        let p = Vec3::new(2.0, 2.0, 2.0);
        let mut sampler = RngSampler::seeded(3);
        let path = Spline::generate_path(p, p, 4, 0.5, 0.5, &mut sampler);
        assert_eq!(path.len(), 2);
        for t in [0.0, 0.33, 0.8, 1.0] {
            assert!(path.evaluate(t).abs_diff_eq(p, EPS));
        }
    }

    #[test]
    fn generate_path_doubles_interior_points() {
        let mut sampler = RngSampler::seeded(11);
        let start = Vec3::ZERO;
        let finish = Vec3::new(10.0, 0.0, 0.0);
        for (passes, expected) in [(0, 2), (1, 3), (2, 5), (3, 9), (4, 17)] {
            let path = Spline::generate_path(start, finish, passes, 0.5, 0.5, &mut sampler);
            assert_eq!(path.len(), expected);
            assert_eq!(path.points()[0], start);
            assert_eq!(path.points()[expected - 1], finish);
        }
    }

    #[test]
    fn generate_path_jitter_is_bounded_by_segment_length() {
        let mut sampler = RngSampler::seeded(5);
        let finish = Vec3::new(8.0, 0.0, 0.0);
        let path = Spline::generate_path(Vec3::ZERO, finish, 1, 0.5, 0.5, &mut sampler);
        assert_eq!(path.tension, GENERATED_PATH_TENSION);
        let mid = path.points()[1];
        // one pass: segment = 4, spread = 2 along each offset axis
        assert!((mid.x - 4.0).abs() < EPS);
        assert!(mid.y.abs() <= 2.0 + EPS);
        assert!(mid.z.abs() <= 2.0 + EPS);
    }

    #[test]
    fn generate_path_without_jitter_stays_on_the_line() {
        let finish = Vec3::new(0.0, 6.0, 0.0);
        let path = Spline::generate_path(Vec3::ZERO, finish, 3, 0.5, 0.5, &mut MidpointSampler);
        for point in path.points() {
            assert!(point.x.abs() < EPS && point.z.abs() < EPS);
        }
    }
}
