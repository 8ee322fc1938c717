//! Vector and matrix math for the transform engine.
//!
//! Everything here is a pure function over [`Point`]s. The canvas convention
//! applies throughout: x grows to the right, y grows downward, and a positive
//! angle is a clockwise rotation on screen.
//!
//! Shear ("lean") is always a Y shear about a center column:
//! `y' = y + tan(lean) * (x - center.x)`. Vertical lines stay vertical, which
//! is what lets the element model recover rotation from a box's vertical edge.

#[cfg(test)]
#[path = "math_test.rs"]
mod math_test;

use std::ops::{Add, Mul, Neg, Sub};

use serde::{Deserialize, Serialize};

use crate::consts::{EPSILON, LEAN_LIMIT_DEG};

/// A point in model or stage space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const ORIGIN: Self = Self { x: 0.0, y: 0.0 };

    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    #[must_use]
    pub fn length(self) -> f64 {
        self.x.hypot(self.y)
    }

    #[must_use]
    pub fn distance(self, other: Self) -> f64 {
        (other - self).length()
    }

    #[must_use]
    pub fn dot(self, other: Self) -> f64 {
        self.x * other.x + self.y * other.y
    }

    /// Z component of the 3D cross product. Positive when `other` is clockwise
    /// from `self` on screen.
    #[must_use]
    pub fn cross(self, other: Self) -> f64 {
        self.x * other.y - self.y * other.x
    }

    #[must_use]
    pub fn midpoint(self, other: Self) -> Self {
        Self::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }

    #[must_use]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    /// Component-wise comparison within `eps`.
    #[must_use]
    pub fn approx_eq(self, other: Self, eps: f64) -> bool {
        (self.x - other.x).abs() <= eps && (self.y - other.y).abs() <= eps
    }
}

impl Add for Point {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Neg for Point {
    type Output = Self;

    fn neg(self) -> Self {
        Self::new(-self.x, -self.y)
    }
}

impl Mul<f64> for Point {
    type Output = Self;

    fn mul(self, rhs: f64) -> Self {
        Self::new(self.x * rhs, self.y * rhs)
    }
}

// =============================================================================
// ANGLES
// =============================================================================

/// Wrap any angle in degrees into `(-180, 180]`. Non-finite input maps to `0`.
#[must_use]
pub fn constraint_angle(deg: f64) -> f64 {
    if !deg.is_finite() {
        return 0.0;
    }
    let wrapped = deg.rem_euclid(360.0);
    if wrapped > 180.0 { wrapped - 360.0 } else { wrapped }
}

/// Clamp a lean angle into `[-LEAN_LIMIT_DEG, LEAN_LIMIT_DEG]`.
#[must_use]
pub fn clamp_lean(deg: f64) -> f64 {
    if !deg.is_finite() {
        return 0.0;
    }
    deg.clamp(-LEAN_LIMIT_DEG, LEAN_LIMIT_DEG)
}

/// Direction of the vector `from -> to` in degrees, measured clockwise from +x.
/// A zero-length vector yields `0`.
#[must_use]
pub fn direction_deg(from: Point, to: Point) -> f64 {
    let d = to - from;
    if d.length() < EPSILON {
        return 0.0;
    }
    d.y.atan2(d.x).to_degrees()
}

/// Smallest absolute difference between two angles, in `[0, 180]`.
#[must_use]
pub fn angle_distance(a: f64, b: f64) -> f64 {
    constraint_angle(a - b).abs()
}

// =============================================================================
// POINT TRANSFORMS
// =============================================================================

/// Rotate `p` clockwise by `angle_deg` about `center`.
#[must_use]
pub fn rotate_with_center(p: Point, angle_deg: f64, center: Point) -> Point {
    if angle_deg == 0.0 {
        return p;
    }
    let (sin, cos) = angle_deg.to_radians().sin_cos();
    let dx = p.x - center.x;
    let dy = p.y - center.y;
    Point::new(center.x + dx * cos - dy * sin, center.y + dx * sin + dy * cos)
}

#[must_use]
pub fn rotate_points(points: &[Point], angle_deg: f64, center: Point) -> Vec<Point> {
    points
        .iter()
        .map(|p| rotate_with_center(*p, angle_deg, center))
        .collect()
}

#[must_use]
pub fn translate(p: Point, offset: Point) -> Point {
    p + offset
}

#[must_use]
pub fn translate_points(points: &[Point], offset: Point) -> Vec<Point> {
    points.iter().map(|p| *p + offset).collect()
}

/// Apply a Y shear of `lean_deg` about the column through `center`.
#[must_use]
pub fn shear_point(p: Point, lean_deg: f64, center: Point) -> Point {
    let t = clamp_lean(lean_deg).to_radians().tan();
    Point::new(p.x, p.y + t * (p.x - center.x))
}

/// Inverse of [`shear_point`].
#[must_use]
pub fn unshear_point(p: Point, lean_deg: f64, center: Point) -> Point {
    let t = clamp_lean(lean_deg).to_radians().tan();
    Point::new(p.x, p.y - t * (p.x - center.x))
}

#[must_use]
pub fn shear_points(points: &[Point], lean_deg: f64, center: Point) -> Vec<Point> {
    points
        .iter()
        .map(|p| shear_point(*p, lean_deg, center))
        .collect()
}

#[must_use]
pub fn unshear_points(points: &[Point], lean_deg: f64, center: Point) -> Vec<Point> {
    points
        .iter()
        .map(|p| unshear_point(*p, lean_deg, center))
        .collect()
}

// =============================================================================
// SCALE MATRIX
// =============================================================================

/// A 2×2 diagonal matrix `[[sx, 0], [0, sy]]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleMatrix {
    pub sx: f64,
    pub sy: f64,
}

impl ScaleMatrix {
    pub const IDENTITY: Self = Self { sx: 1.0, sy: 1.0 };

    #[must_use]
    pub fn new(sx: f64, sy: f64) -> Self {
        Self { sx: finite_or_one(sx), sy: finite_or_one(sy) }
    }

    /// Scale `p` relative to `origin`.
    #[must_use]
    pub fn apply(self, p: Point, origin: Point) -> Point {
        Point::new(origin.x + (p.x - origin.x) * self.sx, origin.y + (p.y - origin.y) * self.sy)
    }

    /// Force both magnitudes to the larger one while each axis keeps its sign.
    #[must_use]
    pub fn proportional(self) -> Self {
        let magnitude = self.sx.abs().max(self.sy.abs());
        Self { sx: magnitude.copysign(self.sx), sy: magnitude.copysign(self.sy) }
    }

    #[must_use]
    pub fn is_identity(self) -> bool {
        (self.sx - 1.0).abs() < EPSILON && (self.sy - 1.0).abs() < EPSILON
    }
}

fn finite_or_one(v: f64) -> f64 {
    if v.is_finite() { v } else { 1.0 }
}

/// Scale that maps `original` onto `current` relative to `lock`.
///
/// All three points must already be in the same angle-normalized, unsheared
/// frame. An axis where `original` sits on the lock yields a factor of `1`.
#[must_use]
pub fn calc_transform_matrix(lock: Point, current: Point, original: Point) -> ScaleMatrix {
    let axis = |cur: f64, orig: f64, lock: f64| {
        let span = orig - lock;
        if span.abs() < EPSILON { 1.0 } else { (cur - lock) / span }
    };
    ScaleMatrix::new(axis(current.x, original.x, lock.x), axis(current.y, original.y, lock.y))
}

// =============================================================================
// FRAME TRANSFORM
// =============================================================================

/// A scale or lean change expressed in a rotated, sheared frame.
///
/// World points are taken into the frame (un-rotated about `origin`, then
/// unsheared by `lean_from`), scaled about `origin`, and brought back out
/// (sheared by `lean_to`, rotated). Resizes keep `lean_from == lean_to`;
/// lean changes keep an identity scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameTransform {
    pub origin: Point,
    pub angle: f64,
    pub lean_from: f64,
    pub lean_to: f64,
    pub scale: ScaleMatrix,
}

impl FrameTransform {
    #[must_use]
    pub fn scaling(origin: Point, angle: f64, lean: f64, scale: ScaleMatrix) -> Self {
        Self { origin, angle, lean_from: lean, lean_to: lean, scale }
    }

    #[must_use]
    pub fn leaning(origin: Point, angle: f64, lean_from: f64, lean_to: f64) -> Self {
        Self { origin, angle, lean_from, lean_to, scale: ScaleMatrix::IDENTITY }
    }

    /// Take a world point into the frame's unsheared local space.
    #[must_use]
    pub fn to_local(&self, p: Point) -> Point {
        unshear_point(rotate_with_center(p, -self.angle, self.origin), self.lean_from, self.origin)
    }

    #[must_use]
    pub fn apply(&self, p: Point) -> Point {
        let scaled = self.scale.apply(self.to_local(p), self.origin);
        rotate_with_center(shear_point(scaled, self.lean_to, self.origin), self.angle, self.origin)
    }

    #[must_use]
    pub fn apply_all(&self, points: &[Point]) -> Vec<Point> {
        points.iter().map(|p| self.apply(*p)).collect()
    }
}

// =============================================================================
// MIRROR LINE
// =============================================================================

/// An infinite line through `point` with direction `angle_deg`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MirrorLine {
    pub point: Point,
    pub angle_deg: f64,
}

impl MirrorLine {
    /// World-vertical line through `p` (mirrors x).
    #[must_use]
    pub fn vertical_through(p: Point) -> Self {
        Self { point: p, angle_deg: 90.0 }
    }

    /// World-horizontal line through `p` (mirrors y).
    #[must_use]
    pub fn horizontal_through(p: Point) -> Self {
        Self { point: p, angle_deg: 0.0 }
    }
}

/// Reflect `p` across `line`.
#[must_use]
pub fn reflect_point(p: Point, line: MirrorLine) -> Point {
    let (sin, cos) = line.angle_deg.to_radians().sin_cos();
    let dir = Point::new(cos, sin);
    let v = p - line.point;
    let along = dir * v.dot(dir);
    line.point + along * 2.0 - v
}

#[must_use]
pub fn reflect_points(points: &[Point], line: MirrorLine) -> Vec<Point> {
    points.iter().map(|p| reflect_point(*p, line)).collect()
}

// =============================================================================
// POINT SETS
// =============================================================================

/// Axis-aligned box of a point set as `[top-left, top-right, bottom-right, bottom-left]`.
/// Returns `None` for an empty set.
#[must_use]
pub fn get_box_by_points(points: &[Point]) -> Option<[Point; 4]> {
    let first = points.first()?;
    let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
    for p in &points[1..] {
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
    }
    Some([
        Point::new(min_x, min_y),
        Point::new(max_x, min_y),
        Point::new(max_x, max_y),
        Point::new(min_x, max_y),
    ])
}

/// Arithmetic mean of a point set, `None` when empty.
#[must_use]
pub fn centroid(points: &[Point]) -> Option<Point> {
    if points.is_empty() {
        return None;
    }
    let sum = points.iter().fold(Point::ORIGIN, |acc, p| acc + *p);
    #[allow(clippy::cast_precision_loss)]
    let n = points.len() as f64;
    Some(Point::new(sum.x / n, sum.y / n))
}

/// Signed shoelace area. Positive for clockwise-on-screen (y-down) winding.
#[must_use]
pub fn signed_area(points: &[Point]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let mut acc = 0.0;
    for (i, p) in points.iter().enumerate() {
        let q = points[(i + 1) % points.len()];
        acc += p.cross(q);
    }
    acc / 2.0
}

/// `1` for clockwise-on-screen winding, `-1` for counter-clockwise, `0` for a
/// degenerate (zero-area) polygon.
#[must_use]
pub fn winding_sign(points: &[Point]) -> f64 {
    let area = signed_area(points);
    if area.abs() < EPSILON {
        0.0
    } else {
        area.signum()
    }
}

// =============================================================================
// HIT TESTING
// =============================================================================

/// Even-odd ray casting containment test.
#[must_use]
pub fn is_point_in_polygon_by_ray_casting(p: Point, polygon: &[Point]) -> bool {
    if polygon.len() < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = polygon.len() - 1;
    for i in 0..polygon.len() {
        let (a, b) = (polygon[i], polygon[j]);
        if (a.y > p.y) != (b.y > p.y) {
            let x_cross = (b.x - a.x) * (p.y - a.y) / (b.y - a.y) + a.x;
            if p.x < x_cross {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// Separating-axis overlap test for two convex polygons. Touching counts as overlap.
#[must_use]
pub fn is_polygons_overlap(a: &[Point], b: &[Point]) -> bool {
    if a.is_empty() || b.is_empty() {
        return false;
    }
    !has_separating_axis(a, b) && !has_separating_axis(b, a)
}

fn has_separating_axis(edges_of: &[Point], other: &[Point]) -> bool {
    let n = edges_of.len();
    for i in 0..n {
        let edge = edges_of[(i + 1) % n] - edges_of[i];
        if edge.length() < EPSILON {
            continue;
        }
        let axis = Point::new(-edge.y, edge.x);
        let (a_min, a_max) = project(edges_of, axis);
        let (b_min, b_max) = project(other, axis);
        if a_max < b_min || b_max < a_min {
            return true;
        }
    }
    false
}

fn project(points: &[Point], axis: Point) -> (f64, f64) {
    points.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| {
        let d = p.dot(axis);
        (lo.min(d), hi.max(d))
    })
}

/// Distance from `p` to the closed segment `a..b`.
#[must_use]
pub fn point_segment_distance(p: Point, a: Point, b: Point) -> f64 {
    let ab = b - a;
    let len_sq = ab.dot(ab);
    if len_sq < EPSILON * EPSILON {
        return p.distance(a);
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    p.distance(a + ab * t)
}

/// Distance from `p` to the nearest segment of an open polyline. A single
/// point is its own polyline; an empty one is infinitely far away.
#[must_use]
pub fn point_polyline_distance(p: Point, polyline: &[Point]) -> f64 {
    match polyline {
        [] => f64::INFINITY,
        [only] => p.distance(*only),
        _ => polyline
            .windows(2)
            .map(|w| point_segment_distance(p, w[0], w[1]))
            .fold(f64::INFINITY, f64::min),
    }
}
