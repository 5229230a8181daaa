//! Ray casts for swept collision
//!
//! A ray whose direction is one frame's displacement models bounded motion:
//! a hit with `t` in `[0, 1]` happens during the frame. These tests are
//! discrete: one cast per frame, so very fast movers can still tunnel through
//! thin obstacles.

use crate::math::{solve_linear_system2, BBox2, V2};

/// Ray with origin `o` and (not necessarily unit) direction `d`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray2 {
    pub origin: V2,
    pub direction: V2,
}

impl Ray2 {
    #[inline]
    pub const fn new(origin: V2, direction: V2) -> Self {
        Self { origin, direction }
    }

    #[inline]
    pub fn at(&self, t: f32) -> V2 {
        self.origin + self.direction * t
    }
}

/// Line segment from `a` to `b`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Line2 {
    pub a: V2,
    pub b: V2,
}

impl Line2 {
    #[inline]
    pub const fn new(a: V2, b: V2) -> Self {
        Self { a, b }
    }
}

/// First contact of a ray query
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Intersection2 {
    /// Ray parameter at contact, in units of `direction`
    pub t: f32,
    /// Unit normal of the hit surface, facing against the ray
    pub normal: V2,
}

/// Intersect a ray with a segment.
///
/// Solves `o + t·d = a + s·(b - a)`; accepted when `s ∈ [0, 1]` and `t >= 0`.
pub fn ray_vs_line(ray: &Ray2, line: &Line2) -> Option<Intersection2> {
    let solution = solve_linear_system2(ray.direction, line.a - line.b, line.a - ray.origin)?;
    let (t, s) = (solution.x, solution.y);

    if !(0.0..=1.0).contains(&s) || t < 0.0 {
        return None;
    }

    let mut normal = (line.b - line.a).perp().normalize_or_zero();
    if normal.dot(ray.direction) > 0.0 {
        normal = -normal;
    }

    Some(Intersection2 { t, normal })
}

/// Edges of a box as (segment, outward normal), tested in this order:
/// top, right, left, bottom
fn box_edges(bbox: &BBox2) -> [(Line2, V2); 4] {
    let [bl, br, tr, tl] = bbox.corners();
    [
        (Line2::new(tl, tr), V2::new(0.0, 1.0)),
        (Line2::new(br, tr), V2::new(1.0, 0.0)),
        (Line2::new(bl, tl), V2::new(-1.0, 0.0)),
        (Line2::new(bl, br), V2::new(0.0, -1.0)),
    ]
}

/// Earliest hit of a ray against the outside of a box.
///
/// Only edges facing the ray (outward normal · direction < 0) are tested, so
/// a ray starting inside the box never hits it, and a zero direction tests no
/// edge at all. Equal `t` values keep the edge tested first.
pub fn ray_vs_box(ray: &Ray2, bbox: &BBox2) -> Option<Intersection2> {
    let mut best: Option<Intersection2> = None;

    for (edge, outward) in box_edges(bbox) {
        if outward.dot(ray.direction) >= 0.0 {
            continue;
        }

        if let Some(hit) = ray_vs_line(ray, &edge) {
            if best.map_or(true, |b| hit.t < b.t) {
                best = Some(hit);
            }
        }
    }

    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const EPS: f32 = 1e-5;

    fn unit_box() -> BBox2 {
        BBox2::new(V2::new(0.0, 0.0), V2::new(10.0, 10.0))
    }

    #[test]
    fn test_ray_hits_left_face() {
        let ray = Ray2::new(V2::new(-5.0, 5.0), V2::new(10.0, 0.0));
        let hit = ray_vs_box(&ray, &unit_box()).unwrap();
        assert!((hit.t - 0.5).abs() < EPS);
        assert_eq!(hit.normal, V2::new(-1.0, 0.0));
    }

    #[test]
    fn test_unit_direction_reports_distance_in_direction_units() {
        let ray = Ray2::new(V2::new(-5.0, 5.0), V2::new(1.0, 0.0));
        let hit = ray_vs_box(&ray, &unit_box()).unwrap();
        assert!((hit.t - 5.0).abs() < EPS);
        assert!(ray.at(hit.t).approx_eq(V2::new(0.0, 5.0), EPS));
    }

    #[test]
    fn test_ray_hits_top_face_from_above() {
        let ray = Ray2::new(V2::new(3.0, 14.0), V2::new(0.0, -8.0));
        let hit = ray_vs_box(&ray, &unit_box()).unwrap();
        assert!((hit.t - 0.5).abs() < EPS);
        assert_eq!(hit.normal, V2::new(0.0, 1.0));
    }

    #[test]
    fn test_diagonal_ray_picks_nearest_face() {
        // Enters through the bottom face before it could reach the left one
        let ray = Ray2::new(V2::new(-1.0, -4.0), V2::new(4.0, 8.0));
        let hit = ray_vs_box(&ray, &unit_box()).unwrap();
        assert!((hit.t - 0.5).abs() < EPS);
        assert_eq!(hit.normal, V2::new(0.0, -1.0));
    }

    #[test]
    fn test_zero_direction_never_hits() {
        let ray = Ray2::new(V2::new(-0.0, 5.0), V2::ZERO);
        assert!(ray_vs_box(&ray, &unit_box()).is_none());
        let inside = Ray2::new(V2::new(5.0, 5.0), V2::ZERO);
        assert!(ray_vs_box(&inside, &unit_box()).is_none());
    }

    #[test]
    fn test_ray_pointing_away_misses() {
        let ray = Ray2::new(V2::new(-5.0, 5.0), V2::new(-1.0, 0.0));
        assert!(ray_vs_box(&ray, &unit_box()).is_none());
    }

    #[test]
    fn test_ray_from_inside_does_not_hit() {
        let ray = Ray2::new(V2::new(5.0, 5.0), V2::new(20.0, 3.0));
        assert!(ray_vs_box(&ray, &unit_box()).is_none());
    }

    #[test]
    fn test_ray_passing_beside_box_misses() {
        let ray = Ray2::new(V2::new(-5.0, 12.0), V2::new(30.0, 0.0));
        assert!(ray_vs_box(&ray, &unit_box()).is_none());
    }

    #[test]
    fn test_line_normal_faces_the_ray() {
        let line = Line2::new(V2::new(0.0, -1.0), V2::new(0.0, 1.0));
        let from_left = ray_vs_line(&Ray2::new(V2::new(-2.0, 0.0), V2::new(1.0, 0.0)), &line).unwrap();
        let from_right = ray_vs_line(&Ray2::new(V2::new(2.0, 0.0), V2::new(-1.0, 0.0)), &line).unwrap();
        assert_eq!(from_left.normal, V2::new(-1.0, 0.0));
        assert_eq!(from_right.normal, V2::new(1.0, 0.0));
        assert!((from_left.t - 2.0).abs() < EPS);
    }

    #[test]
    fn test_line_behind_ray_is_rejected() {
        let line = Line2::new(V2::new(0.0, -1.0), V2::new(0.0, 1.0));
        assert!(ray_vs_line(&Ray2::new(V2::new(2.0, 0.0), V2::new(1.0, 0.0)), &line).is_none());
    }

    #[test]
    fn test_parallel_ray_misses_line() {
        let line = Line2::new(V2::new(0.0, 0.0), V2::new(10.0, 0.0));
        assert!(ray_vs_line(&Ray2::new(V2::new(-1.0, 0.0), V2::new(1.0, 0.0)), &line).is_none());
    }

    proptest! {
        #[test]
        fn prop_straight_shot_at_left_face(
            start in 0.5f32..50.0, y in 0.01f32..9.99, speed in 0.5f32..100.0
        ) {
            let ray = Ray2::new(V2::new(-start, y), V2::new(speed, 0.0));
            let hit = ray_vs_box(&ray, &unit_box()).unwrap();
            prop_assert!((hit.t - start / speed).abs() < 1e-3);
            prop_assert_eq!(hit.normal, V2::new(-1.0, 0.0));
        }

        #[test]
        fn prop_hit_normal_opposes_direction(
            ox in -40.0f32..-1.0, oy in -30.0f32..40.0, dx in 0.1f32..60.0, dy in -60.0f32..60.0
        ) {
            let ray = Ray2::new(V2::new(ox, oy), V2::new(dx, dy));
            if let Some(hit) = ray_vs_box(&ray, &unit_box()) {
                prop_assert!(hit.normal.dot(ray.direction) < 0.0);
                prop_assert!(hit.t >= 0.0);
            }
        }
    }
}
