//! Drag snapshots and every geometry-changing operation on an element.
//!
//! Resizes, lean changes and group cascades are all expressed as a
//! [`FrameTransform`] applied to the snapshot's world geometry. The element's
//! model is then re-derived from the transformed world box: rotation from
//! the box's vertical edge, lean from its top edge, mirroring from its winding.

#[cfg(test)]
#[path = "transform_test.rs"]
mod transform_test;

use crate::consts::{EPSILON, LEAN_LIMIT_DEG};
use crate::element::cache::{DerivedCache, RefreshOptions};
use crate::element::handles::{self, ControlHandle};
use crate::element::variant::{self, ShapeKind, TransformMode};
use crate::element::{Changed, Element, raw_lean};
use crate::math::{
    FrameTransform, MirrorLine, Point, ScaleMatrix, calc_transform_matrix, centroid, clamp_lean, constraint_angle,
    direction_deg, get_box_by_points, reflect_point, reflect_points, rotate_points, rotate_with_center, shear_point,
    shear_points, translate_points, unshear_point, unshear_points,
};

/// Geometry captured when a drag begins. Every frame of the drag is computed
/// from this snapshot plus the live pointer value.
#[derive(Debug, Clone)]
pub(crate) struct TransformOrigin {
    pub coords: Vec<Point>,
    pub box_coords: [Point; 4],
    pub center: Point,
    pub angle: f64,
    pub lean: f64,
    pub width: f64,
    pub height: f64,
    pub corners: [f64; 4],
    pub cache: DerivedCache,
    pub vertex_handles: Vec<Point>,
    pub border_handles: [Point; 4],
    /// Scale signs last reported; a change against these is a flip.
    pub reference_scale: ScaleMatrix,
}

impl TransformOrigin {
    pub(crate) fn capture(element: &Element) -> Self {
        Self {
            coords: element.model.coords.clone(),
            box_coords: element.model.box_coords,
            center: element.cache.center,
            angle: element.model.angles.actual_angle,
            lean: element.model.angles.lean_y_angle,
            width: element.model.width,
            height: element.model.height,
            corners: element.model.corners,
            cache: element.cache.clone(),
            vertex_handles: element.vertex_handles(),
            border_handles: handles::border_handles(&element.cache.rotated_box_coords),
            reference_scale: ScaleMatrix::IDENTITY,
        }
    }
}

impl Element {
    // =========================================================================
    // SESSION
    // =========================================================================

    /// Snapshot the current geometry. Until [`Element::end_transform`], every
    /// drag-style operation computes from this snapshot. Without a session each
    /// operation is one-shot and starts from the current geometry.
    pub fn begin_transform(&mut self) {
        self.origin = Some(TransformOrigin::capture(self));
    }

    pub fn end_transform(&mut self) {
        self.origin = None;
        self.active_handle = None;
    }

    #[must_use]
    pub fn is_transforming(&self) -> bool {
        self.origin.is_some()
    }

    /// Angle the open drag started from, or the current angle outside a drag.
    #[must_use]
    pub fn base_angle(&self) -> f64 {
        self.origin
            .as_ref()
            .map_or(self.model.angles.actual_angle, |o| o.angle)
    }

    /// Center the open drag started from, or the current center outside a drag.
    #[must_use]
    pub fn base_center(&self) -> Point {
        self.origin.as_ref().map_or(self.cache.center, |o| o.center)
    }

    fn take_origin(&mut self) -> (TransformOrigin, bool) {
        match self.origin.take() {
            Some(origin) => (origin, true),
            None => (TransformOrigin::capture(self), false),
        }
    }

    fn put_origin(&mut self, origin: TransformOrigin, persistent: bool) {
        if persistent {
            self.origin = Some(origin);
        }
    }

    /// After a one-shot change inside an open session, later drag frames
    /// start from the changed geometry.
    fn recapture_origin(&mut self) {
        if self.origin.is_some() {
            self.origin = Some(TransformOrigin::capture(self));
        }
    }

    fn accepts_transform(&self) -> bool {
        if self.model.status.is_transformable() {
            return true;
        }
        tracing::debug!(id = %self.model.id, status = ?self.model.status, "transform ignored");
        false
    }

    // =========================================================================
    // TRANSLATE
    // =========================================================================

    /// Move by `offset`. Every original coordinate array and cached band is
    /// shifted by plain vector addition.
    pub fn translate_by(&mut self, offset: Point) -> Changed {
        if !self.accepts_transform() || !offset.is_finite() {
            return Changed::NONE;
        }
        let (origin, persistent) = self.take_origin();
        self.model.coords = translate_points(&origin.coords, offset);
        self.model.box_coords = origin.box_coords.map(|p| p + offset);
        self.cache = origin.cache.translated(offset);
        self.model.x = self.cache.center.x;
        self.model.y = self.cache.center.y;
        self.put_origin(origin, persistent);
        Changed { position: true, ..Changed::NONE }
    }

    // =========================================================================
    // RESIZE
    // =========================================================================

    /// Drag the active vertex handle by `offset` from where the drag began.
    ///
    /// Box shapes scale about the opposite corner, lines about the other
    /// endpoint, and free-form paths move just the dragged vertex.
    pub fn transform_by_vertices(&mut self, offset: Point) -> Changed {
        if !self.accepts_transform() || !offset.is_finite() {
            return Changed::NONE;
        }
        let Some(ControlHandle::Vertex(index)) = self.active_handle else {
            tracing::debug!(id = %self.model.id, "no active vertex handle");
            return Changed::NONE;
        };
        let (mut origin, persistent) = self.take_origin();
        let changed = match self.model.kind.transform_mode() {
            TransformMode::BoxVertices => match vertex_plan(&origin, index, offset, self.model.ratio_locked) {
                Some(ft) => self.apply_frame_from(&mut origin, ft),
                None => Changed::NONE,
            },
            TransformMode::Endpoints => self.move_endpoint(&origin, index, offset),
            TransformMode::PerVertex => self.move_vertex(&origin, index, offset),
        };
        self.put_origin(origin, persistent);
        changed
    }

    /// Drag the active border handle by `offset`. The opposite edge stays put
    /// and only the axis across the dragged edge scales, unless ratio-locked.
    pub fn transform_by_border(&mut self, offset: Point) -> Changed {
        if !self.accepts_transform() || !offset.is_finite() || !self.capabilities().border_transform {
            return Changed::NONE;
        }
        let Some(ControlHandle::Border(index)) = self.active_handle else {
            tracing::debug!(id = %self.model.id, "no active border handle");
            return Changed::NONE;
        };
        let (mut origin, persistent) = self.take_origin();
        let changed = match border_plan(&origin, index, offset, self.model.ratio_locked) {
            Some(ft) => self.apply_frame_from(&mut origin, ft),
            None => Changed::NONE,
        };
        self.put_origin(origin, persistent);
        changed
    }

    /// The frame transform a handle drag would apply, for cascading a group's
    /// resize to its descendants. `None` for handles that do not resize.
    #[must_use]
    pub fn resize_plan(&self, handle: ControlHandle, offset: Point) -> Option<FrameTransform> {
        if !offset.is_finite() {
            return None;
        }
        let captured;
        let origin = match &self.origin {
            Some(origin) => origin,
            None => {
                captured = TransformOrigin::capture(self);
                &captured
            }
        };
        match handle {
            ControlHandle::Vertex(index) if self.model.kind.transform_mode() == TransformMode::BoxVertices => {
                vertex_plan(origin, index, offset, self.model.ratio_locked)
            }
            ControlHandle::Border(index) if self.capabilities().border_transform => {
                border_plan(origin, index, offset, self.model.ratio_locked)
            }
            _ => None,
        }
    }

    /// Scale about the original center so the width becomes `value`.
    pub fn set_width(&mut self, value: f64) -> Changed {
        match self.width_plan(value) {
            Some(ft) => self.apply_frame_transform(ft),
            None => Changed::NONE,
        }
    }

    /// Scale about the original center so the height becomes `value`.
    pub fn set_height(&mut self, value: f64) -> Changed {
        match self.height_plan(value) {
            Some(ft) => self.apply_frame_transform(ft),
            None => Changed::NONE,
        }
    }

    /// Frame transform for [`Element::set_width`]. `None` for a non-positive
    /// target or a collapsed width.
    #[must_use]
    pub fn width_plan(&self, value: f64) -> Option<FrameTransform> {
        self.size_plan(value, true)
    }

    /// Frame transform for [`Element::set_height`].
    #[must_use]
    pub fn height_plan(&self, value: f64) -> Option<FrameTransform> {
        self.size_plan(value, false)
    }

    fn size_plan(&self, value: f64, horizontal: bool) -> Option<FrameTransform> {
        if !value.is_finite() || value <= 0.0 {
            return None;
        }
        let (center, angle, lean, width, height) = match &self.origin {
            Some(o) => (o.center, o.angle, o.lean, o.width, o.height),
            None => (
                self.cache.center,
                self.model.angles.actual_angle,
                self.model.angles.lean_y_angle,
                self.model.width,
                self.model.height,
            ),
        };
        let current = if horizontal { width } else { height };
        if current < EPSILON {
            return None;
        }
        let factor = value / current;
        let scale = match (self.model.ratio_locked, horizontal) {
            (true, _) => ScaleMatrix::new(factor, factor),
            (false, true) => ScaleMatrix::new(factor, 1.0),
            (false, false) => ScaleMatrix::new(1.0, factor),
        };
        Some(FrameTransform::scaling(center, angle, lean, scale))
    }

    /// Apply a world-space frame transform to the snapshot geometry and
    /// re-derive the model. Capabilities are not consulted, so ancestors can
    /// cascade onto any kind.
    pub fn apply_frame_transform(&mut self, ft: FrameTransform) -> Changed {
        if !self.accepts_transform() {
            return Changed::NONE;
        }
        let (mut origin, persistent) = self.take_origin();
        let changed = self.apply_frame_from(&mut origin, ft);
        self.put_origin(origin, persistent);
        changed
    }

    fn apply_frame_from(&mut self, origin: &mut TransformOrigin, ft: FrameTransform) -> Changed {
        let rotated_box = origin.cache.rotated_box_coords.map(|p| ft.apply(p));
        let rotated_coords = ft.apply_all(&origin.cache.rotated_coords);
        self.model.corners = origin.corners;
        if !self.apply_world_geometry(rotated_box, rotated_coords, origin.angle) {
            return Changed::NONE;
        }
        let flipped = signs_differ(origin.reference_scale, ft.scale);
        if flipped {
            origin.reference_scale = ScaleMatrix::new(sign(ft.scale.sx), sign(ft.scale.sy));
            tracing::debug!(id = %self.model.id, sx = ft.scale.sx, sy = ft.scale.sy, "resize crossed lock point");
        }
        Changed { flipped, ..Changed::GEOMETRY }
    }

    fn move_endpoint(&mut self, origin: &TransformOrigin, index: usize, offset: Point) -> Changed {
        let [start, end] = match origin.cache.rotated_coords.as_slice() {
            [a, b] => [*a, *b],
            _ => return Changed::NONE,
        };
        let endpoints = match index {
            0 => [start + offset, end],
            1 => [start, end + offset],
            _ => return Changed::NONE,
        };
        if self.apply_line_geometry(endpoints, origin.angle) {
            Changed::GEOMETRY
        } else {
            Changed::NONE
        }
    }

    fn move_vertex(&mut self, origin: &TransformOrigin, index: usize, offset: Point) -> Changed {
        let mut world = origin.cache.rotated_coords.clone();
        let Some(vertex) = world.get_mut(index) else {
            return Changed::NONE;
        };
        *vertex = *vertex + offset;
        let Some((coords, box_coords)) = fit_frame(&world, origin.angle, origin.lean, origin.center, origin.cache.flip_x)
        else {
            return Changed::NONE;
        };
        self.model.coords = coords;
        self.model.box_coords = box_coords;
        self.refresh(RefreshOptions::geometry());
        Changed { position: true, size: true, corners: true, ..Changed::NONE }
    }

    // =========================================================================
    // ROTATE
    // =========================================================================

    /// Set the rotation directly. A live update skips the parts a pure
    /// rotation cannot change; the final one refreshes everything.
    pub fn set_angle(&mut self, value: f64, live: bool) -> Changed {
        if !self.accepts_transform() || !value.is_finite() || !self.capabilities().rotate {
            return Changed::NONE;
        }
        self.model.angles.angle = constraint_angle(value);
        self.refresh(if live { RefreshOptions::live_rotation() } else { RefreshOptions::all() });
        Changed { angle: true, ..Changed::NONE }
    }

    /// Rotate by `delta` about `lock`, relative to the drag snapshot.
    pub fn rotate_by(&mut self, delta: f64, lock: Point, live: bool) -> Changed {
        if !self.capabilities().rotate {
            return Changed::NONE;
        }
        self.rotate_about(delta, lock, live)
    }

    /// [`Element::rotate_by`] without the capability check, for group cascades.
    ///
    /// The center orbits the lock; the shape's own orientation lives entirely
    /// in `angle`, so the model coordinates only translate.
    pub(crate) fn rotate_about(&mut self, delta: f64, lock: Point, live: bool) -> Changed {
        if !self.accepts_transform() || !delta.is_finite() || !lock.is_finite() {
            return Changed::NONE;
        }
        let (origin, persistent) = self.take_origin();
        let offset = rotate_with_center(origin.center, delta, lock) - origin.center;
        self.model.coords = translate_points(&origin.coords, offset);
        self.model.box_coords = origin.box_coords.map(|p| p + offset);
        self.model.angles.angle = constraint_angle(origin.angle + delta);
        self.refresh(if live { RefreshOptions::live_rotation() } else { RefreshOptions::geometry() });
        self.put_origin(origin, persistent);
        Changed { position: true, angle: true, ..Changed::NONE }
    }

    // =========================================================================
    // LEAN
    // =========================================================================

    /// Set the Y shear, clamped to ±89°. The shape is unsheared with the old
    /// lean and resheared with the new one about its center.
    pub fn set_lean_y_angle(&mut self, value: f64) -> Changed {
        if !self.accepts_transform() || !value.is_finite() || !self.capabilities().lean {
            return Changed::NONE;
        }
        let lean = clamp_lean(value);
        let old = self.model.angles.lean_y_angle;
        let center = self.cache.center;
        self.model.coords = shear_points(&unshear_points(&self.model.coords, old, center), lean, center);
        self.model.box_coords = self
            .model
            .box_coords
            .map(|p| shear_point(unshear_point(p, old, center), lean, center));
        self.model.angles.lean_y_angle = lean;
        self.refresh(RefreshOptions::all());
        Changed { lean: true, corners: true, ..Changed::NONE }
    }

    /// Frame transform that takes this element's lean to `value`, for
    /// cascading a group's lean to its descendants.
    #[must_use]
    pub fn lean_plan(&self, value: f64) -> Option<FrameTransform> {
        if !value.is_finite() || !self.capabilities().lean {
            return None;
        }
        let (center, angle, lean) = match &self.origin {
            Some(o) => (o.center, o.angle, o.lean),
            None => (self.cache.center, self.model.angles.actual_angle, self.model.angles.lean_y_angle),
        };
        Some(FrameTransform::leaning(center, angle, lean, clamp_lean(value)))
    }

    /// Whether `ft` keeps this element's re-derived lean within ±89°. A shear
    /// from an ancestor adds to the element's own rotation and can exceed it.
    #[must_use]
    pub(crate) fn keeps_lean_under(&self, ft: FrameTransform) -> bool {
        if matches!(self.model.kind, ShapeKind::Line) {
            return true;
        }
        let basis = self.origin.as_ref().map_or(&self.cache, |o| &o.cache);
        let world = basis.rotated_box_coords.map(|p| ft.apply(p));
        let Some(center) = centroid(&world) else {
            return true;
        };
        let angle = box_angle(&world, self.model.angles.actual_angle);
        let model_box = world.map(|p| rotate_with_center(p, -angle, center));
        raw_lean(&model_box).is_none_or(|lean| lean.abs() <= LEAN_LIMIT_DEG + 1e-6)
    }

    // =========================================================================
    // FLIP
    // =========================================================================

    /// Mirror across `line`. Expected to be a world-vertical line.
    pub fn flip_x_by(&mut self, line: MirrorLine) -> Changed {
        if !self.capabilities().flip {
            return Changed::NONE;
        }
        self.reflect_across(line)
    }

    /// Mirror across `line`. Expected to be a world-horizontal line; the
    /// result is expressed as an x mirror plus a half turn.
    pub fn flip_y_by(&mut self, line: MirrorLine) -> Changed {
        if !self.capabilities().flip {
            return Changed::NONE;
        }
        self.reflect_across(line)
    }

    /// Mirror across the vertical line through the center.
    pub fn flip_x(&mut self) -> Changed {
        self.flip_x_by(MirrorLine::vertical_through(self.cache.center))
    }

    /// Mirror across the horizontal line through the center.
    pub fn flip_y(&mut self) -> Changed {
        self.flip_y_by(MirrorLine::horizontal_through(self.cache.center))
    }

    /// Reflect the world geometry across any line. Reflection across a line
    /// at `phi` takes `angle` to `2 * phi - angle + 180` and negates the lean.
    pub(crate) fn reflect_across(&mut self, line: MirrorLine) -> Changed {
        if !self.accepts_transform() || !line.point.is_finite() || !line.angle_deg.is_finite() {
            return Changed::NONE;
        }
        let rotated_box = self.cache.rotated_box_coords.map(|p| reflect_point(p, line));
        let rotated_coords = reflect_points(&self.cache.rotated_coords, line);
        let fallback = constraint_angle(2.0 * line.angle_deg - self.model.angles.actual_angle + 180.0);
        if !self.apply_world_geometry(rotated_box, rotated_coords, fallback) {
            return Changed::NONE;
        }
        self.recapture_origin();
        Changed { position: true, angle: true, lean: true, flipped: true, ..Changed::NONE }
    }

    // =========================================================================
    // CORNERS
    // =========================================================================

    /// Set the four corner radii, each clamped to half the smaller usable side.
    pub fn set_corners(&mut self, corners: [f64; 4]) -> Changed {
        if !self.accepts_transform() || !self.capabilities().corners {
            return Changed::NONE;
        }
        self.model.corners = corners;
        self.refresh(RefreshOptions { corners: true, ..RefreshOptions::default() });
        self.recapture_origin();
        Changed { corners: true, ..Changed::NONE }
    }

    // =========================================================================
    // RE-DERIVATION
    // =========================================================================

    /// Rebuild the model from world geometry: the vertical box edge gives the
    /// rotation, the box centroid the center, and model coordinates are the
    /// world ones turned back by that rotation. Returns `false`, leaving the
    /// element untouched, for non-finite input.
    pub(crate) fn apply_world_geometry(
        &mut self,
        rotated_box: [Point; 4],
        rotated_coords: Vec<Point>,
        fallback_angle: f64,
    ) -> bool {
        if !rotated_box.iter().chain(rotated_coords.iter()).all(|p| p.is_finite()) {
            return false;
        }
        if matches!(self.model.kind, ShapeKind::Line) {
            return match rotated_coords.as_slice() {
                [start, end] => self.apply_line_geometry([*start, *end], fallback_angle),
                _ => false,
            };
        }
        let Some(center) = centroid(&rotated_box) else {
            return false;
        };
        let angle = box_angle(&rotated_box, fallback_angle);
        self.model.box_coords = rotated_box.map(|p| rotate_with_center(p, -angle, center));
        self.model.coords = rotate_points(&rotated_coords, -angle, center);
        self.model.angles.angle = angle;
        self.refresh(RefreshOptions::geometry());
        true
    }

    /// Lines keep a vertical model segment about the midpoint; the angle comes
    /// from the endpoints.
    pub(crate) fn apply_line_geometry(&mut self, endpoints: [Point; 2], fallback_angle: f64) -> bool {
        let [start, end] = endpoints;
        if !start.is_finite() || !end.is_finite() {
            return false;
        }
        let center = start.midpoint(end);
        let angle = if start.distance(end) < EPSILON {
            constraint_angle(fallback_angle)
        } else {
            variant::line_angle(start, end)
        };
        let coords = rotate_points(&endpoints, -angle, center);
        self.model.box_coords = get_box_by_points(&coords).unwrap_or([center; 4]);
        self.model.coords = coords;
        self.model.angles.angle = angle;
        self.model.angles.lean_y_angle = 0.0;
        self.refresh(RefreshOptions::geometry());
        true
    }

    /// Refit the box around world points while keeping the element's
    /// rotation, lean and mirroring. Groups use this to track their children.
    pub(crate) fn fit_box_to_world(&mut self, world: &[Point]) -> bool {
        let Some((coords, box_coords)) = fit_frame(
            world,
            self.model.angles.actual_angle,
            self.model.angles.lean_y_angle,
            self.cache.center,
            self.cache.flip_x,
        ) else {
            return false;
        };
        self.model.coords = if self.model.kind.is_group() { box_coords.to_vec() } else { coords };
        self.model.box_coords = box_coords;
        self.refresh(RefreshOptions::all());
        true
    }
}

/// Rotation of a world box, read off its left edge.
fn box_angle(rotated_box: &[Point; 4], fallback: f64) -> f64 {
    if rotated_box[0].distance(rotated_box[3]) < EPSILON {
        constraint_angle(fallback)
    } else {
        constraint_angle(direction_deg(rotated_box[0], rotated_box[3]) - 90.0)
    }
}

// =============================================================================
// PLANS
// =============================================================================

fn vertex_plan(origin: &TransformOrigin, index: usize, offset: Point, ratio_locked: bool) -> Option<FrameTransform> {
    let handle = *origin.vertex_handles.get(index)?;
    let lock = *origin.cache.rotated_box_coords.get((index + 2) % 4)?;
    let mut scale = frame_scale(origin, lock, handle, handle + offset);
    if ratio_locked {
        scale = scale.proportional();
    }
    Some(FrameTransform::scaling(lock, origin.angle, origin.lean, scale))
}

fn border_plan(origin: &TransformOrigin, index: usize, offset: Point, ratio_locked: bool) -> Option<FrameTransform> {
    let handle = *origin.border_handles.get(index)?;
    let rb = &origin.cache.rotated_box_coords;
    let lock = rb[(index + 2) % 4].midpoint(rb[(index + 3) % 4]);
    let raw = frame_scale(origin, lock, handle, handle + offset);
    // Top and bottom edges resize y; left and right resize x.
    let scale = if index % 2 == 0 {
        ScaleMatrix::new(if ratio_locked { raw.sy.abs() } else { 1.0 }, raw.sy)
    } else {
        ScaleMatrix::new(raw.sx, if ratio_locked { raw.sx.abs() } else { 1.0 })
    };
    Some(FrameTransform::scaling(lock, origin.angle, origin.lean, scale))
}

/// Scale taking `from` to `to` about `lock`, measured in the snapshot's
/// rotated, unsheared frame.
fn frame_scale(origin: &TransformOrigin, lock: Point, from: Point, to: Point) -> ScaleMatrix {
    let frame = FrameTransform::scaling(lock, origin.angle, origin.lean, ScaleMatrix::IDENTITY);
    calc_transform_matrix(lock, frame.to_local(to), frame.to_local(from))
}

fn sign(v: f64) -> f64 {
    if v < 0.0 { -1.0 } else { 1.0 }
}

fn signs_differ(a: ScaleMatrix, b: ScaleMatrix) -> bool {
    (a.sx < 0.0) != (b.sx < 0.0) || (a.sy < 0.0) != (b.sy < 0.0)
}

/// Model coordinates and box for world points in a frame of fixed rotation
/// and lean, recentered on the new box. `pivot` is the current center.
fn fit_frame(
    world: &[Point],
    angle: f64,
    lean: f64,
    pivot: Point,
    mirrored: bool,
) -> Option<(Vec<Point>, [Point; 4])> {
    if !world.iter().all(|p| p.is_finite()) {
        return None;
    }
    let local = rotate_points(world, -angle, pivot);
    let bounds = get_box_by_points(&unshear_points(&local, lean, pivot))?;
    let bounds = if mirrored { [bounds[1], bounds[0], bounds[3], bounds[2]] } else { bounds };
    let sheared = bounds.map(|p| shear_point(p, lean, pivot));
    let box_center = centroid(&sheared)?;
    // Moving the pivot onto the box center changes where the rotation is
    // anchored; shift the model so world positions stay put.
    let shift = rotate_with_center(box_center, angle, pivot) - box_center;
    Some((translate_points(&local, shift), sheared.map(|p| p + shift)))
}
