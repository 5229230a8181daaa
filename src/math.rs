//! 2D Math for the Software Renderer
//!
//! Vectors, axis-aligned boxes, affine frames and the 2x2 linear solver that
//! the ray tests in `geometry` are built on. Everything here is a pure value
//! type: no allocation, no global state.

use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};

use serde::{Deserialize, Serialize};

/// 2D Vector (world metres or framebuffer pixels, depending on the caller)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct V2 {
    pub x: f32,
    pub y: f32,
}

impl V2 {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    #[inline]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    #[inline]
    pub fn dot(self, other: Self) -> f32 {
        self.x * other.x + self.y * other.y
    }

    /// Z component of the 3D cross product, i.e. the signed parallelogram area
    #[inline]
    pub fn cross(self, other: Self) -> f32 {
        self.x * other.y - self.y * other.x
    }

    #[inline]
    pub fn length_sq(self) -> f32 {
        self.dot(self)
    }

    #[inline]
    pub fn length(self) -> f32 {
        self.length_sq().sqrt()
    }

    /// Counter-clockwise perpendicular (+90°)
    #[inline]
    pub fn perp(self) -> Self {
        Self::new(-self.y, self.x)
    }

    /// Clockwise perpendicular (-90°)
    #[inline]
    pub fn perp_cw(self) -> Self {
        Self::new(self.y, -self.x)
    }

    /// Unit vector in the same direction, or `None` for the zero vector
    #[inline]
    pub fn try_normalize(self) -> Option<Self> {
        let len = self.length();
        if len > 0.0 && len.is_finite() {
            Some(self * (1.0 / len))
        } else {
            None
        }
    }

    #[inline]
    pub fn normalize_or_zero(self) -> Self {
        self.try_normalize().unwrap_or(Self::ZERO)
    }

    /// Angle from the +x axis in radians, in (-π, π]
    #[inline]
    pub fn angle(self) -> f32 {
        self.y.atan2(self.x)
    }

    /// Component-wise product
    #[inline]
    pub fn hadamard(self, other: Self) -> Self {
        Self::new(self.x * other.x, self.y * other.y)
    }

    #[inline]
    pub fn min(self, other: Self) -> Self {
        Self::new(self.x.min(other.x), self.y.min(other.y))
    }

    #[inline]
    pub fn max(self, other: Self) -> Self {
        Self::new(self.x.max(other.x), self.y.max(other.y))
    }

    /// Approximate equality check for floating point comparison
    #[inline]
    pub fn approx_eq(self, other: Self, epsilon: f32) -> bool {
        (self.x - other.x).abs() < epsilon && (self.y - other.y).abs() < epsilon
    }
}

impl Add for V2 {
    type Output = Self;
    #[inline]
    fn add(self, other: Self) -> Self {
        Self {
            x: self.x + other.x,
            y: self.y + other.y,
        }
    }
}

impl AddAssign for V2 {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        *self = *self + other;
    }
}

impl Sub for V2 {
    type Output = Self;
    #[inline]
    fn sub(self, other: Self) -> Self {
        Self {
            x: self.x - other.x,
            y: self.y - other.y,
        }
    }
}

impl SubAssign for V2 {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        *self = *self - other;
    }
}

impl Neg for V2 {
    type Output = Self;
    #[inline]
    fn neg(self) -> Self {
        Self {
            x: -self.x,
            y: -self.y,
        }
    }
}

impl Mul<f32> for V2 {
    type Output = Self;
    #[inline]
    fn mul(self, scalar: f32) -> Self {
        Self {
            x: self.x * scalar,
            y: self.y * scalar,
        }
    }
}

impl Mul<V2> for f32 {
    type Output = V2;
    #[inline]
    fn mul(self, v: V2) -> V2 {
        v * self
    }
}

// ============================================================================
// Linear System
// ============================================================================

/// Solution of `[a b] [x; y] = c`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearSystem2Solution {
    pub x: f32,
    pub y: f32,
}

/// Solve the 2x2 system whose columns are `a` and `b` by Cramer's rule.
///
/// Returns `None` only when the determinant is exactly zero. There is no
/// epsilon: nearly parallel columns still produce (large) solutions.
#[inline]
pub fn solve_linear_system2(a: V2, b: V2, c: V2) -> Option<LinearSystem2Solution> {
    let d = a.cross(b);
    if d == 0.0 {
        return None;
    }

    Some(LinearSystem2Solution {
        x: c.cross(b) / d,
        y: a.cross(c) / d,
    })
}

// ============================================================================
// Bounding Box
// ============================================================================

/// Axis-aligned box in whatever frame the caller works in
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BBox2 {
    pub min: V2,
    pub max: V2,
}

impl BBox2 {
    #[inline]
    pub const fn new(min: V2, max: V2) -> Self {
        Self { min, max }
    }

    #[inline]
    pub fn from_min_size(min: V2, size: V2) -> Self {
        Self {
            min,
            max: min + size,
        }
    }

    #[inline]
    pub fn from_center_size(center: V2, size: V2) -> Self {
        let half = size * 0.5;
        Self {
            min: center - half,
            max: center + half,
        }
    }

    #[inline]
    pub fn center(&self) -> V2 {
        self.min + (self.max - self.min) * 0.5
    }

    #[inline]
    pub fn size(&self) -> V2 {
        self.max - self.min
    }

    /// Half-open containment: `min <= p < max` on both axes
    #[inline]
    pub fn contains(&self, p: V2) -> bool {
        p.x >= self.min.x && p.x < self.max.x && p.y >= self.min.y && p.y < self.max.y
    }

    /// Corners in counter-clockwise order: bottom-left, bottom-right,
    /// top-right, top-left
    #[inline]
    pub fn corners(&self) -> [V2; 4] {
        [
            self.min,
            V2::new(self.max.x, self.min.y),
            self.max,
            V2::new(self.min.x, self.max.y),
        ]
    }

    /// Move the box so its minimum corner sits at `min`, keeping its size
    #[inline]
    pub fn with_min(&self, min: V2) -> Self {
        Self::from_min_size(min, self.size())
    }
}

// ============================================================================
// Transform
// ============================================================================

/// Affine 2D frame: a 2x2 linear part given by its column axes plus a
/// translation. `apply(p) = origin + p.x * xaxis + p.y * yaxis`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform2 {
    pub xaxis: V2,
    pub yaxis: V2,
    pub origin: V2,
}

impl Default for Transform2 {
    fn default() -> Self {
        Self::identity()
    }
}

impl Transform2 {
    #[inline]
    pub const fn identity() -> Self {
        Self {
            xaxis: V2::new(1.0, 0.0),
            yaxis: V2::new(0.0, 1.0),
            origin: V2::ZERO,
        }
    }

    /// Counter-clockwise rotation by `radians`; `xaxis = (cos θ, sin θ)`
    #[inline]
    pub fn rotation(radians: f32) -> Self {
        let (sin, cos) = radians.sin_cos();
        let xaxis = V2::new(cos, sin);
        Self {
            xaxis,
            yaxis: xaxis.perp(),
            origin: V2::ZERO,
        }
    }

    #[inline]
    pub fn scaling(sx: f32, sy: f32) -> Self {
        Self {
            xaxis: V2::new(sx, 0.0),
            yaxis: V2::new(0.0, sy),
            origin: V2::ZERO,
        }
    }

    #[inline]
    pub fn translation(x: f32, y: f32) -> Self {
        Self {
            origin: V2::new(x, y),
            ..Self::identity()
        }
    }

    /// Apply only the linear part (directions, not points)
    #[inline]
    pub fn apply_vector(&self, v: V2) -> V2 {
        self.xaxis * v.x + self.yaxis * v.y
    }

    #[inline]
    pub fn apply(&self, p: V2) -> V2 {
        self.origin + self.apply_vector(p)
    }

    /// `self ∘ inner`: the result maps `p` to `self.apply(inner.apply(p))`
    #[inline]
    pub fn compose(&self, inner: &Self) -> Self {
        Self {
            xaxis: self.apply_vector(inner.xaxis),
            yaxis: self.apply_vector(inner.yaxis),
            origin: self.apply(inner.origin),
        }
    }

    /// Left-multiply a translation: the offset is applied after `self`
    #[inline]
    pub fn translate_by(&self, dx: f32, dy: f32) -> Self {
        Self {
            origin: self.origin + V2::new(dx, dy),
            ..*self
        }
    }

    /// Determinant of the linear part. Negative for mirroring frames.
    #[inline]
    pub fn determinant(&self) -> f32 {
        self.xaxis.cross(self.yaxis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const EPS: f32 = 1e-4;

    #[test]
    fn test_perp_is_orthogonal() {
        let v = V2::new(3.0, -2.0);
        assert_eq!(v.dot(v.perp()), 0.0);
        assert_eq!(v.perp(), V2::new(2.0, 3.0));
        assert_eq!(v.perp_cw(), -v.perp());
    }

    #[test]
    fn test_normalize_zero_is_guarded() {
        assert_eq!(V2::ZERO.try_normalize(), None);
        assert_eq!(V2::ZERO.normalize_or_zero(), V2::ZERO);
        let n = V2::new(3.0, 4.0).try_normalize().unwrap();
        assert!(n.approx_eq(V2::new(0.6, 0.8), EPS));
    }

    #[test]
    fn test_angle() {
        assert!((V2::new(0.0, 2.0).angle() - std::f32::consts::FRAC_PI_2).abs() < EPS);
        assert!((V2::new(-1.0, 0.0).angle() - std::f32::consts::PI).abs() < EPS);
    }

    #[test]
    fn test_solve_linear_system() {
        // x * (1, 0) + y * (0, 2) = (3, 4)
        let s = solve_linear_system2(V2::new(1.0, 0.0), V2::new(0.0, 2.0), V2::new(3.0, 4.0))
            .unwrap();
        assert!((s.x - 3.0).abs() < EPS);
        assert!((s.y - 2.0).abs() < EPS);
    }

    #[test]
    fn test_solve_parallel_columns_has_no_solution() {
        let a = V2::new(1.0, 2.0);
        assert!(solve_linear_system2(a, a * 3.0, V2::new(1.0, 1.0)).is_none());
        assert!(solve_linear_system2(V2::ZERO, V2::new(0.0, 1.0), V2::ZERO).is_none());
    }

    #[test]
    fn test_bbox_center_and_size() {
        let b = BBox2::from_min_size(V2::new(-10.0, 0.0), V2::new(60.0, 1.0));
        assert_eq!(b.center(), V2::new(20.0, 0.5));
        assert_eq!(b.size(), V2::new(60.0, 1.0));
        assert_eq!(BBox2::from_center_size(b.center(), b.size()), b);
    }

    #[test]
    fn test_bbox_corners_are_ccw() {
        let c = BBox2::new(V2::ZERO, V2::new(2.0, 1.0)).corners();
        let area: f32 = (0..4).map(|i| c[i].cross(c[(i + 1) % 4])).sum::<f32>() * 0.5;
        assert!((area - 2.0).abs() < EPS);
    }

    #[test]
    fn test_rotation_quarter_turn() {
        let t = Transform2::rotation(std::f32::consts::FRAC_PI_2);
        assert!(t.apply(V2::new(1.0, 0.0)).approx_eq(V2::new(0.0, 1.0), EPS));
        assert!(t.apply(V2::new(0.0, 1.0)).approx_eq(V2::new(-1.0, 0.0), EPS));
        assert!((t.determinant() - 1.0).abs() < EPS);
    }

    #[test]
    fn test_translate_by_applies_after_rotation() {
        let t = Transform2::rotation(std::f32::consts::FRAC_PI_2).translate_by(10.0, 20.0);
        assert!(t.apply(V2::new(1.0, 0.0)).approx_eq(V2::new(10.0, 21.0), EPS));
        assert!(t.compose(&Transform2::identity()).apply(V2::ZERO).approx_eq(t.origin, EPS));
    }

    #[test]
    fn test_composition_is_not_commutative() {
        let r = Transform2::rotation(std::f32::consts::FRAC_PI_2);
        let s = Transform2::translation(5.0, 0.0);
        let p = V2::new(1.0, 0.0);
        let rs = r.compose(&s).apply(p);
        let sr = s.compose(&r).apply(p);
        assert!(rs.approx_eq(V2::new(0.0, 6.0), EPS));
        assert!(sr.approx_eq(V2::new(5.0, 1.0), EPS));
    }

    fn coord() -> impl Strategy<Value = f32> {
        -1000.0f32..1000.0
    }

    proptest! {
        #[test]
        fn prop_bbox_contains_min_not_max(
            x in coord(), y in coord(), w in 0.01f32..500.0, h in 0.01f32..500.0
        ) {
            let b = BBox2::from_min_size(V2::new(x, y), V2::new(w, h));
            prop_assert!(b.contains(b.min));
            prop_assert!(!b.contains(b.max));
        }

        #[test]
        fn prop_min_plus_size_is_max(x in coord(), y in coord(), w in 0.0f32..500.0, h in 0.0f32..500.0) {
            let b = BBox2::from_min_size(V2::new(x, y), V2::new(w, h));
            prop_assert_eq!(b.min + b.size(), b.max);
        }

        #[test]
        fn prop_compose_matches_sequential_apply(
            a1 in -6.3f32..6.3, a2 in -6.3f32..6.3,
            tx in coord(), ty in coord(), px in coord(), py in coord(),
            s in 0.1f32..4.0
        ) {
            let t1 = Transform2::rotation(a1).translate_by(tx, ty);
            let t2 = Transform2::scaling(s, s).compose(&Transform2::rotation(a2));
            let p = V2::new(px, py);
            let composed = t2.compose(&t1).apply(p);
            let sequential = t2.apply(t1.apply(p));
            prop_assert!(composed.approx_eq(sequential, 0.05));
        }
    }
}
