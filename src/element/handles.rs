#[cfg(test)]
#[path = "handles_test.rs"]
mod handles_test;

use crate::element::variant::TransformMode;
use crate::math::{Point, rotate_with_center};

/// A control handle on a selected element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlHandle {
    /// Box corner, line endpoint, or path vertex, by index.
    Vertex(usize),
    /// Edge midpoint: 0 top, 1 right, 2 bottom, 3 left.
    Border(usize),
    Rotation,
}

/// Positions of the vertex handles in world space.
#[must_use]
pub fn vertex_handles(mode: TransformMode, rotated_coords: &[Point], rotated_box: &[Point; 4]) -> Vec<Point> {
    match mode {
        TransformMode::BoxVertices => rotated_box.to_vec(),
        TransformMode::PerVertex | TransformMode::Endpoints => rotated_coords.to_vec(),
    }
}

/// Midpoints of the rotated box edges, top edge first, clockwise.
#[must_use]
pub fn border_handles(rotated_box: &[Point; 4]) -> [Point; 4] {
    [0, 1, 2, 3].map(|i| rotated_box[i].midpoint(rotated_box[(i + 1) % 4]))
}

/// The rotation handle sits `offset` beyond the top edge midpoint, along the
/// element's local up direction.
#[must_use]
pub fn rotation_handle(rotated_box: &[Point; 4], angle: f64, offset: f64) -> Point {
    let top = rotated_box[0].midpoint(rotated_box[1]);
    let up = rotate_with_center(Point::new(0.0, -1.0), angle, Point::ORIGIN);
    top + up * offset
}

/// Nearest-first lookup: vertices, then the rotation handle, then borders.
/// Each candidate must lie within `radius` of `p`.
#[must_use]
pub fn hit_handle(
    p: Point,
    vertices: &[Point],
    rotation: Option<Point>,
    borders: &[Point],
    radius: f64,
) -> Option<ControlHandle> {
    if let Some(i) = nearest_within(p, vertices, radius) {
        return Some(ControlHandle::Vertex(i));
    }
    if let Some(r) = rotation {
        if p.distance(r) <= radius {
            return Some(ControlHandle::Rotation);
        }
    }
    nearest_within(p, borders, radius).map(ControlHandle::Border)
}

fn nearest_within(p: Point, candidates: &[Point], radius: f64) -> Option<usize> {
    candidates
        .iter()
        .enumerate()
        .map(|(i, c)| (i, p.distance(*c)))
        .filter(|(_, d)| *d <= radius)
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(i, _)| i)
}
