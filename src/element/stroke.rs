//! Stroke and fill styles, and the outline bands derived from strokes.
//!
//! A band is the region a stroke covers. Closed paths get an inner and an
//! outer ring offset from the path according to the stroke type; open paths
//! get a single outline polygon around the centerline, plus miter join
//! regions at sharp interior vertices when requested.

#[cfg(test)]
#[path = "stroke_test.rs"]
mod stroke_test;

use serde::{Deserialize, Serialize};

use crate::consts::EPSILON;
use crate::math::{Point, signed_area, translate_points};

/// Where a stroke sits relative to the path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrokeKind {
    /// Entirely inside the path.
    Inside,
    /// Centered on the path.
    #[default]
    Middle,
    /// Entirely outside the path.
    Outside,
}

/// A stroke as stored on the element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrokeStyle {
    pub width: f64,
    #[serde(default)]
    pub kind: StrokeKind,
    /// CSS color string. Not interpreted by the engine.
    #[serde(default = "default_stroke_color")]
    pub color: String,
}

fn default_stroke_color() -> String {
    "#1F1A17".to_string()
}

impl StrokeStyle {
    #[must_use]
    pub fn new(width: f64, kind: StrokeKind) -> Self {
        Self { width, kind, color: default_stroke_color() }
    }

    /// Offsets of the band's two sides from the path: `(inner, outer)`, where
    /// positive is outward.
    #[must_use]
    pub fn offsets(&self) -> (f64, f64) {
        let w = self.width.max(0.0);
        match self.kind {
            StrokeKind::Inside => (-w, 0.0),
            StrokeKind::Middle => (-w / 2.0, w / 2.0),
            StrokeKind::Outside => (0.0, w),
        }
    }
}

/// A fill as stored on the element. Rides along unchanged through transforms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FillStyle {
    pub color: String,
    #[serde(default = "default_opacity")]
    pub opacity: f64,
}

fn default_opacity() -> f64 {
    1.0
}

/// World-space region covered by one stroke.
#[derive(Debug, Clone, PartialEq)]
pub struct StrokeBand {
    pub kind: StrokeKind,
    pub width: f64,
    /// Closed paths: the inner ring. Empty for open paths.
    pub inner: Vec<Point>,
    /// Closed paths: the outer ring. Open paths: the outline polygon around the centerline.
    pub outer: Vec<Point>,
    /// Miter regions `[vertex, side_a, tip, side_b]` at sharp interior vertices.
    pub joins: Vec<[Point; 4]>,
}

impl StrokeBand {
    #[must_use]
    pub fn translated(&self, offset: Point) -> Self {
        Self {
            kind: self.kind,
            width: self.width,
            inner: translate_points(&self.inner, offset),
            outer: translate_points(&self.outer, offset),
            joins: self.joins.iter().map(|j| j.map(|p| p + offset)).collect(),
        }
    }
}

/// Band for a stroke around a closed path.
#[must_use]
pub fn closed_band(path: &[Point], stroke: &StrokeStyle) -> StrokeBand {
    let (inner_offset, outer_offset) = stroke.offsets();
    StrokeBand {
        kind: stroke.kind,
        width: stroke.width,
        inner: offset_closed(path, inner_offset),
        outer: offset_closed(path, outer_offset),
        joins: Vec::new(),
    }
}

/// Band for a stroke along an open path. Open paths have no inside, so every
/// stroke kind is centered. With `miter_max_deg`, interior vertices whose
/// angle is at or below the threshold get a join region on the outer side of
/// the turn.
#[must_use]
pub fn open_band(path: &[Point], stroke: &StrokeStyle, miter_max_deg: Option<f64>) -> StrokeBand {
    let points = dedup(path);
    let half = stroke.width.max(0.0) / 2.0;
    let mut outer = Vec::new();
    let mut joins = Vec::new();

    if points.len() >= 2 {
        let left: Vec<Point> = (0..points.len())
            .map(|i| open_vertex_offset(&points, i, half))
            .collect();
        let right: Vec<Point> = (0..points.len())
            .map(|i| open_vertex_offset(&points, i, -half))
            .rev()
            .collect();
        outer.extend(left);
        outer.extend(right);

        if let Some(limit) = miter_max_deg {
            for i in 1..points.len() - 1 {
                if let Some(join) = miter_join(points[i - 1], points[i], points[i + 1], half, limit) {
                    joins.push(join);
                }
            }
        }
    }

    StrokeBand { kind: stroke.kind, width: stroke.width, inner: Vec::new(), outer, joins }
}

/// Offset a closed polygon by `distance` (positive outward) with miter joins.
#[must_use]
pub fn offset_closed(path: &[Point], distance: f64) -> Vec<Point> {
    let points = dedup_closed(path);
    let n = points.len();
    if n < 3 || distance.abs() < EPSILON {
        return points;
    }
    // Outward normal side depends on winding.
    let outward = if signed_area(&points) >= 0.0 { 1.0 } else { -1.0 };
    (0..n)
        .map(|i| {
            let prev = points[(i + n - 1) % n];
            let cur = points[i];
            let next = points[(i + 1) % n];
            let n1 = left_normal(cur - prev) * outward;
            let n2 = left_normal(next - cur) * outward;
            cur + miter_offset(n1, n2, distance)
        })
        .collect()
}

/// Unit normal to the left of `dir` as seen on a y-down screen.
fn left_normal(dir: Point) -> Point {
    let len = dir.length();
    if len < EPSILON {
        return Point::ORIGIN;
    }
    Point::new(dir.y / len, -dir.x / len)
}

/// Offset from a vertex for two adjacent edge normals. Near-reversals fall
/// back to a bevel along the first normal.
fn miter_offset(n1: Point, n2: Point, distance: f64) -> Point {
    let denom = 1.0 + n1.dot(n2);
    if denom < 0.02 {
        return n1 * distance;
    }
    (n1 + n2) * (distance / denom)
}

fn open_vertex_offset(points: &[Point], i: usize, distance: f64) -> Point {
    let last = points.len() - 1;
    let cur = points[i];
    if i == 0 {
        return cur + left_normal(points[1] - cur) * distance;
    }
    if i == last {
        return cur + left_normal(cur - points[i - 1]) * distance;
    }
    let n1 = left_normal(cur - points[i - 1]);
    let n2 = left_normal(points[i + 1] - cur);
    cur + miter_offset(n1, n2, distance)
}

/// Interior angle at `vertex` in degrees, in `[0, 180]`.
#[must_use]
pub fn interior_angle(prev: Point, vertex: Point, next: Point) -> f64 {
    let a = prev - vertex;
    let b = next - vertex;
    let la = a.length();
    let lb = b.length();
    if la < EPSILON || lb < EPSILON {
        return 180.0;
    }
    (a.dot(b) / (la * lb)).clamp(-1.0, 1.0).acos().to_degrees()
}

fn miter_join(prev: Point, vertex: Point, next: Point, half: f64, limit_deg: f64) -> Option<[Point; 4]> {
    if half < EPSILON || interior_angle(prev, vertex, next) > limit_deg {
        return None;
    }
    // The outer side of a right turn (positive cross on screen) is the left.
    let turn = (vertex - prev).cross(next - vertex);
    let side = if turn >= 0.0 { 1.0 } else { -1.0 };
    let n1 = left_normal(vertex - prev) * side;
    let n2 = left_normal(next - vertex) * side;
    let tip = vertex + miter_offset(n1, n2, half);
    Some([vertex, vertex + n1 * half, tip, vertex + n2 * half])
}

fn dedup(path: &[Point]) -> Vec<Point> {
    let mut out: Vec<Point> = Vec::with_capacity(path.len());
    for p in path {
        if out.last().is_none_or(|last| last.distance(*p) >= EPSILON) {
            out.push(*p);
        }
    }
    out
}

fn dedup_closed(path: &[Point]) -> Vec<Point> {
    let mut out = dedup(path);
    while out.len() > 1 && out[0].distance(out[out.len() - 1]) < EPSILON {
        out.pop();
    }
    out
}
