//! Catmull-Clark refinement rules.
//!
//! The rules are written once over the [`Blend`] trait. Evaluated on
//! [`Vec3`]s they produce child positions. Evaluated on [`Weights`] they
//! produce the stencil that maps parent points to a child point, which is
//! what makes re-evaluating a level with moved points cheap.
//!
//! No boundary special-casing happens in [`edge_point()`] and
//! [`vertex_point()`]: a boundary edge simply has one incident face and a
//! boundary vertex a smaller valence. The crease rules are separate functions
//! selected by [`BoundaryMode`](super::BoundaryMode).
use std::ops::{Add, Div, Mul};

use ultraviolet::Vec3;

use crate::{Error, Result};

/// A quantity the refinement rules can take affine combinations of.
pub trait Blend:
    Sized + Clone + Add<Output = Self> + Mul<f32, Output = Self> + Div<f32, Output = Self>
{
    fn zero() -> Self;
}

impl Blend for Vec3 {
    #[inline]
    fn zero() -> Self {
        Vec3::zero()
    }
}

/// Returns the arithmetic mean of `values`; zero for an empty input.
pub fn average<T: Blend>(values: impl IntoIterator<Item = T>) -> T {
    let (sum, count) = values
        .into_iter()
        .fold((T::zero(), 0usize), |(sum, count), value| (sum + value, count + 1));

    if count == 0 {
        sum
    } else {
        sum / count as f32
    }
}

/// Face point: the centroid of the face's points.
#[inline]
pub fn face_point<T: Blend>(points: impl IntoIterator<Item = T>) -> T {
    average(points)
}

/// Edge point: `(2·midpoint + Σ face_points) / (2 + face_count)`.
///
/// For an interior edge this is `(2·mid + f1 + f2) / 4`, for a boundary
/// edge `(2·mid + f1) / 3`. Edges with more than two faces divide by the
/// larger valence.
pub fn edge_point<T: Blend>(midpoint: T, face_points: impl IntoIterator<Item = T>) -> T {
    let (sum, count) = face_points
        .into_iter()
        .fold((T::zero(), 0usize), |(sum, count), face| (sum + face, count + 1));

    (midpoint * 2.0 + sum) / (2 + count) as f32
}

/// Vertex point: `p·(n−3)/n + Σ face_points/n² + 2·Σ edge_midpoints/n²`,
/// with `n` the number of incident faces.
///
/// # Errors
///
/// Returns [`Error::DegenerateVertex`] if `face_points` is empty.
pub fn vertex_point<T: Blend>(
    vertex: u32,
    point: T,
    face_points: impl IntoIterator<Item = T>,
    edge_midpoints: impl IntoIterator<Item = T>,
) -> Result<T> {
    let (face_sum, valence) = face_points
        .into_iter()
        .fold((T::zero(), 0usize), |(sum, count), face| (sum + face, count + 1));

    if valence == 0 {
        return Err(Error::DegenerateVertex { vertex });
    }

    let n = valence as f32;
    let edge_sum = edge_midpoints
        .into_iter()
        .fold(T::zero(), |sum, midpoint| sum + midpoint);

    Ok(point * ((n - 3.0) / n) + face_sum / (n * n) + edge_sum * (2.0 / (n * n)))
}

/// Crease edge point: the edge midpoint.
#[inline]
pub fn crease_edge_point<T: Blend>(v0: T, v1: T) -> T {
    (v0 + v1) / 2.0
}

/// Crease vertex point: `(a + 6·p + b) / 8` for a point `p` with the crease
/// neighbors `a` and `b`.
#[inline]
pub fn crease_vertex_point<T: Blend>(point: T, a: T, b: T) -> T {
    (a + point * 6.0 + b) / 8.0
}

/// A sparse weighted combination of parent points, kept sorted by index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Weights(Vec<(u32, f32)>);

impl Weights {
    /// A single point with weight one.
    #[inline]
    pub fn point(index: u32) -> Self {
        Self(vec![(index, 1.0)])
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the `(index, weight)` pairs ordered by index.
    #[inline]
    pub fn as_slice(&self) -> &[(u32, f32)] {
        &self.0
    }

    /// Returns the sum of all weights.
    pub fn total(&self) -> f32 {
        self.0.iter().map(|&(_, weight)| weight).sum()
    }

    /// Evaluates the combination against `points`.
    pub fn evaluate(&self, points: &[[f32; 3]]) -> Vec3 {
        self.0
            .iter()
            .fold(Vec3::zero(), |sum, &(index, weight)| {
                let p = points[index as usize];
                sum + Vec3::new(p[0], p[1], p[2]) * weight
            })
    }
}

impl Add for Weights {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        let mut merged = Vec::with_capacity(self.0.len() + other.0.len());
        let mut lhs = self.0.into_iter().peekable();
        let mut rhs = other.0.into_iter().peekable();

        loop {
            let next = match (lhs.peek(), rhs.peek()) {
                (Some(&(i, _)), Some(&(j, _))) if i == j => {
                    let (_, a) = lhs.next().unwrap_or_default();
                    let (_, b) = rhs.next().unwrap_or_default();
                    (i, a + b)
                }
                (Some(&(i, _)), Some(&(j, _))) if i < j => lhs.next().unwrap_or_default(),
                (Some(_), None) => lhs.next().unwrap_or_default(),
                (_, Some(_)) => rhs.next().unwrap_or_default(),
                (None, None) => break,
            };
            merged.push(next);
        }

        Self(merged)
    }
}

impl Mul<f32> for Weights {
    type Output = Self;

    fn mul(mut self, scale: f32) -> Self {
        self.0.iter_mut().for_each(|(_, weight)| *weight *= scale);
        self
    }
}

impl Div<f32> for Weights {
    type Output = Self;

    fn div(mut self, divisor: f32) -> Self {
        self.0.iter_mut().for_each(|(_, weight)| *weight /= divisor);
        self
    }
}

impl Blend for Weights {
    #[inline]
    fn zero() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn assert_vec3_eq(a: Vec3, b: Vec3) {
        assert_relative_eq!(a.x, b.x, epsilon = 1e-6);
        assert_relative_eq!(a.y, b.y, epsilon = 1e-6);
        assert_relative_eq!(a.z, b.z, epsilon = 1e-6);
    }

    #[test]
    fn boundary_edge_rule() {
        let mid = Vec3::new(1., 0., 0.);
        let face = Vec3::new(1., 1., 0.);
        assert_vec3_eq(edge_point(mid, [face]), (mid * 2.0 + face) / 3.0);
    }

    #[test]
    fn interior_edge_rule() {
        let mid = Vec3::new(0.5, 0.5, 0.);
        let f1 = Vec3::new(1. / 3., 1. / 3., 0.);
        let f2 = Vec3::new(2. / 3., 2. / 3., 0.);
        assert_vec3_eq(edge_point(mid, [f1, f2]), (mid * 2.0 + f1 + f2) / 4.0);
    }

    #[test]
    fn vertex_rule_valence_four() {
        // A regular interior vertex of a flat grid stays put.
        let p = Vec3::zero();
        let faces = [
            Vec3::new(0.5, 0.5, 0.),
            Vec3::new(-0.5, 0.5, 0.),
            Vec3::new(-0.5, -0.5, 0.),
            Vec3::new(0.5, -0.5, 0.),
        ];
        let mids = [
            Vec3::new(0.5, 0., 0.),
            Vec3::new(0., 0.5, 0.),
            Vec3::new(-0.5, 0., 0.),
            Vec3::new(0., -0.5, 0.),
        ];
        assert_vec3_eq(vertex_point(0, p, faces, mids).unwrap(), p);
    }

    #[test]
    fn vertex_rule_valence_one() {
        let p = Vec3::new(0., 0., 0.);
        let face = Vec3::new(1., 1., 0.);
        let mid = Vec3::new(0., 1., 0.);
        // p·(-2) + f + 2·m
        assert_vec3_eq(
            vertex_point(0, p, [face], [mid]).unwrap(),
            Vec3::new(1., 3., 0.),
        );
    }

    #[test]
    fn isolated_vertex_is_an_error() {
        let result = vertex_point(5, Vec3::zero(), [], []);
        assert_eq!(result, Err(Error::DegenerateVertex { vertex: 5 }));
    }

    #[test]
    fn crease_rules() {
        let a = Vec3::new(-1., 0., 0.);
        let b = Vec3::new(1., 0., 0.);
        let p = Vec3::new(0., 1., 0.);
        assert_vec3_eq(crease_edge_point(a, b), Vec3::zero());
        assert_vec3_eq(crease_vertex_point(p, a, b), Vec3::new(0., 0.75, 0.));
    }

    #[test]
    fn weights_merge_sorted() {
        let w = Weights::point(3) * 0.5 + Weights::point(1) + Weights::point(3) * 0.25;
        assert_eq!(w.as_slice(), &[(1, 1.0), (3, 0.75)]);
        assert_relative_eq!(w.total(), 1.75);
    }

    #[test]
    fn weights_match_values() {
        let points = [[0., 0., 0.], [2., 0., 0.], [2., 2., 0.], [0., 2., 0.]];
        let as_vec = |i: usize| Vec3::new(points[i][0], points[i][1], points[i][2]);

        let face_w = face_point((0..4).map(Weights::point));
        let face_v = face_point((0..4).map(as_vec));
        assert_vec3_eq(face_w.evaluate(&points), face_v);

        let mid_w = crease_edge_point(Weights::point(0), Weights::point(1));
        let edge_w = edge_point(mid_w.clone(), [face_w.clone()]);
        let edge_v = edge_point(crease_edge_point(as_vec(0), as_vec(1)), [face_v]);
        assert_vec3_eq(edge_w.evaluate(&points), edge_v);

        let vertex_w = vertex_point(0, Weights::point(0), [face_w], [mid_w]).unwrap();
        assert_relative_eq!(vertex_w.total(), 1.0, epsilon = 1e-6);
    }
}
