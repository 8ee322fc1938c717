//! Derived per-element geometry and the option set that controls its refresh.
//!
//! Nothing here is persisted. Containment, overlap and handle placement read
//! only this cache, so any mutation of model coordinates or angles has to be
//! followed by a refresh before the element is observed again.

use crate::element::stroke::StrokeBand;
use crate::math::{Point, translate_points};

/// World-space geometry derived from an element's model fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DerivedCache {
    /// Rotation center (the box centroid).
    pub center: Point,
    /// Path coordinates rotated into world space.
    pub rotated_coords: Vec<Point>,
    /// Box corners rotated into world space.
    pub rotated_box_coords: [Point; 4],
    /// Model coordinates with the lean removed.
    pub unleaned_coords: Vec<Point>,
    /// Model box with the lean removed; always an axis-aligned rectangle.
    pub unleaned_box_coords: [Point; 4],
    /// World path used for hit-testing and as the base of stroke bands.
    pub outline_path: Vec<Point>,
    /// One band per stroke, in stroke order.
    pub stroke_bands: Vec<StrokeBand>,
    /// Axis-aligned world box enclosing the shape and all stroke bands.
    pub max_outline_box: [Point; 4],
    /// Box winding is reversed, i.e. the shape is mirrored along its local x axis.
    pub flip_x: bool,
}

impl DerivedCache {
    /// A copy of this cache moved by `offset`. Translation commutes with every
    /// derivation, so this is exact rather than a recomputation.
    #[must_use]
    pub fn translated(&self, offset: Point) -> Self {
        Self {
            center: self.center + offset,
            rotated_coords: translate_points(&self.rotated_coords, offset),
            rotated_box_coords: self.rotated_box_coords.map(|p| p + offset),
            unleaned_coords: translate_points(&self.unleaned_coords, offset),
            unleaned_box_coords: self.unleaned_box_coords.map(|p| p + offset),
            outline_path: translate_points(&self.outline_path, offset),
            stroke_bands: self
                .stroke_bands
                .iter()
                .map(|band| band.translated(offset))
                .collect(),
            max_outline_box: self.max_outline_box.map(|p| p + offset),
            flip_x: self.flip_x,
        }
    }
}

/// Which parts of an element to recompute.
///
/// Parts left `false` keep their previous values. Refresh runs the parts in a
/// fixed order: lean, points, size, position, view, actual, rotation,
/// internal, corners, strokes, outline, originals.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RefreshOptions {
    /// `lean_y_angle` measured from the model box's top edge.
    pub lean_y_angle: bool,
    /// Unleaned coordinates and box.
    pub points: bool,
    /// `width` / `height` from the unleaned box.
    pub size: bool,
    /// Center and the model's `x` / `y`.
    pub position: bool,
    /// `view_angle = angle + lean`.
    pub view_angle: bool,
    /// `actual_angle = view_angle - lean`.
    pub actual_angle: bool,
    /// `internal_angle` from the rotated box's vertical edge.
    pub internal_angle: bool,
    /// Rotated coordinates, rotated box, outline path and flip flag.
    pub rotation: bool,
    /// Corner radii clamp.
    pub corners: bool,
    /// Per-stroke bands.
    pub strokes: bool,
    /// Maximum outline box.
    pub outline: bool,
    /// Re-snapshot the transform originals when a drag session is open.
    pub originals: bool,
}

impl RefreshOptions {
    /// Everything.
    #[must_use]
    pub fn all() -> Self {
        Self {
            lean_y_angle: true,
            points: true,
            size: true,
            position: true,
            view_angle: true,
            actual_angle: true,
            internal_angle: true,
            rotation: true,
            corners: true,
            strokes: true,
            outline: true,
            originals: true,
        }
    }

    /// Everything except the originals snapshot. Used mid-drag, where the
    /// originals must stay put.
    #[must_use]
    pub fn geometry() -> Self {
        Self { originals: false, ..Self::all() }
    }

    /// Per-frame refresh while rotating: size, lean and the originals are
    /// unchanged by a pure rotation.
    #[must_use]
    pub fn live_rotation() -> Self {
        Self {
            points: true,
            position: true,
            view_angle: true,
            actual_angle: true,
            internal_angle: true,
            rotation: true,
            corners: true,
            strokes: true,
            outline: true,
            ..Self::default()
        }
    }
}
