//! Per-shape geometry model.
//!
//! An [`Element`] pairs the persisted [`ElementModel`] with a [`DerivedCache`]
//! of world-space geometry. Model coordinates are sheared by the lean but not
//! rotated; the cache holds them rotated by `actual_angle` about the box
//! centroid, plus everything hit-testing and handle placement need.
//!
//! Every public mutator refreshes the cache before returning. Drag-style
//! operations compute each frame from a snapshot taken when the drag began
//! (see [`Element::begin_transform`]), so a drag released without moving
//! reproduces the original geometry exactly.


pub mod cache;
mod create;
pub mod handles;
pub mod stroke;
mod transform;
pub mod variant;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::EditorConfig;
use crate::consts::EPSILON;
use crate::error::SceneError;
use crate::math::{
    Point, centroid, clamp_lean, constraint_angle, direction_deg, get_box_by_points, is_point_in_polygon_by_ray_casting,
    is_polygons_overlap, point_polyline_distance, rotate_points, rotate_with_center, unshear_point, unshear_points,
    winding_sign,
};

pub use cache::{DerivedCache, RefreshOptions};
pub use handles::ControlHandle;
pub use stroke::{FillStyle, StrokeBand, StrokeKind, StrokeStyle};
pub use variant::{Capabilities, ShapeKind, TransformMode};

use transform::TransformOrigin;

pub type ElementId = Uuid;

// =============================================================================
// MODEL
// =============================================================================

/// Lifecycle of a shape: `Initialed -> StartCreating -> Creating -> Finished <-> Editing`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementStatus {
    Initialed,
    StartCreating,
    Creating,
    #[default]
    Finished,
    Editing,
}

impl ElementStatus {
    /// Transforms only apply to settled shapes.
    #[must_use]
    pub fn is_transformable(self) -> bool {
        matches!(self, Self::Finished | Self::Editing)
    }

    #[must_use]
    pub fn is_creating(self) -> bool {
        matches!(self, Self::StartCreating | Self::Creating)
    }
}

/// The angle facets of an element, in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AngleModel {
    /// User-facing rotation about the center.
    pub angle: f64,
    /// Y shear, bounded to ±89°.
    pub lean_y_angle: f64,
    /// Direction of the rotated box's vertical edge minus 90°.
    pub internal_angle: f64,
    /// Observed rotation of the top edge: `angle + lean_y_angle`.
    pub view_angle: f64,
    /// `view_angle - lean_y_angle`; the angle fed to rotation math.
    pub actual_angle: f64,
}

/// Persisted element fields. Everything else is derived.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementModel {
    pub id: ElementId,
    pub kind: ShapeKind,
    #[serde(default)]
    pub status: ElementStatus,
    /// Path coordinates, sheared by the lean, not rotated.
    pub coords: Vec<Point>,
    /// Sheared, unrotated box: top-left, top-right, bottom-right, bottom-left.
    /// The first two swap sides when the shape is mirrored.
    pub box_coords: [Point; 4],
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default)]
    pub width: f64,
    #[serde(default)]
    pub height: f64,
    #[serde(default)]
    pub corners: [f64; 4],
    #[serde(default)]
    pub angles: AngleModel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<ElementId>,
    #[serde(default)]
    pub ratio_locked: bool,
    #[serde(default = "default_visible")]
    pub visible: bool,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub strokes: Vec<StrokeStyle>,
    #[serde(default)]
    pub fills: Vec<FillStyle>,
}

fn default_visible() -> bool {
    true
}

impl ElementModel {
    fn blank(kind: ShapeKind, coords: Vec<Point>, box_coords: [Point; 4]) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            status: ElementStatus::Finished,
            coords,
            box_coords,
            x: 0.0,
            y: 0.0,
            width: 0.0,
            height: 0.0,
            corners: [0.0; 4],
            angles: AngleModel::default(),
            group_id: None,
            ratio_locked: false,
            visible: true,
            name: String::new(),
            strokes: Vec::new(),
            fills: Vec::new(),
        }
    }

    /// Structural checks applied at the snapshot boundary.
    ///
    /// # Errors
    ///
    /// Returns `SceneError::InvalidModel` naming the first violated rule.
    pub fn validate(&self) -> Result<(), SceneError> {
        let invalid = |reason: String| SceneError::InvalidModel { id: self.id, reason };

        let count = self.coords.len();
        let expected = self.kind.min_coords();
        let count_ok = match self.kind {
            ShapeKind::Arbitrary { .. } => count >= expected,
            _ => count == expected,
        };
        if !count_ok {
            return Err(invalid(format!("{} expects {expected} coords, got {count}", self.kind.name())));
        }
        if let ShapeKind::Arbitrary { tail_index, .. } = self.kind {
            if tail_index >= count {
                return Err(invalid(format!("tail_index {tail_index} out of range for {count} coords")));
            }
        }

        let points_finite = self.coords.iter().chain(self.box_coords.iter()).all(|p| p.is_finite());
        let a = &self.angles;
        let scalars = [
            self.x,
            self.y,
            self.width,
            self.height,
            a.angle,
            a.lean_y_angle,
            a.internal_angle,
            a.view_angle,
            a.actual_angle,
        ];
        let scalars_finite = scalars.iter().chain(self.corners.iter()).all(|v| v.is_finite());
        if !points_finite || !scalars_finite {
            return Err(invalid("non-finite number".to_string()));
        }

        if self.strokes.iter().any(|s| !s.width.is_finite() || s.width < 0.0) {
            return Err(invalid("stroke width must be finite and non-negative".to_string()));
        }
        if self.group_id == Some(self.id) {
            return Err(invalid("element is its own group".to_string()));
        }
        if self.kind.sub_ids().is_some_and(|subs| subs.contains(&self.id)) {
            return Err(invalid("group contains itself".to_string()));
        }
        Ok(())
    }
}

/// What a mutation changed. Empty means the call was a no-op.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Changed {
    pub position: bool,
    pub size: bool,
    pub angle: bool,
    pub lean: bool,
    pub corners: bool,
    /// A resize crossed the lock point on some axis since the last report.
    pub flipped: bool,
}

impl Changed {
    pub const NONE: Self = Self {
        position: false,
        size: false,
        angle: false,
        lean: false,
        corners: false,
        flipped: false,
    };

    /// Everything a geometry re-derivation can touch.
    pub const GEOMETRY: Self = Self {
        position: true,
        size: true,
        angle: true,
        lean: true,
        corners: true,
        flipped: false,
    };

    #[must_use]
    pub fn any(self) -> bool {
        self != Self::NONE
    }

    #[must_use]
    pub fn merge(self, other: Self) -> Self {
        Self {
            position: self.position || other.position,
            size: self.size || other.size,
            angle: self.angle || other.angle,
            lean: self.lean || other.lean,
            corners: self.corners || other.corners,
            flipped: self.flipped || other.flipped,
        }
    }
}

// =============================================================================
// ELEMENT
// =============================================================================

#[derive(Debug, Clone)]
pub struct Element {
    model: ElementModel,
    cache: DerivedCache,
    /// Drag snapshot; present only between `begin_transform` and `end_transform`.
    origin: Option<TransformOrigin>,
    active_handle: Option<ControlHandle>,
    /// First pointer position of a drag-to-create gesture.
    create_anchor: Option<Point>,
}

impl PartialEq for Element {
    fn eq(&self, other: &Self) -> bool {
        self.model == other.model
    }
}

impl Element {
    fn with_model(model: ElementModel) -> Self {
        let mut element = Self {
            model,
            cache: DerivedCache::default(),
            origin: None,
            active_handle: None,
            create_anchor: None,
        };
        element.refresh(RefreshOptions::all());
        element
    }

    #[must_use]
    pub fn rect(center: Point, width: f64, height: f64) -> Self {
        Self::boxed(ShapeKind::Rect, center, width, height)
    }

    #[must_use]
    pub fn ellipse(center: Point, width: f64, height: f64) -> Self {
        Self::boxed(ShapeKind::Ellipse, center, width, height)
    }

    #[must_use]
    pub fn text(center: Point, width: f64, height: f64, content: impl Into<String>) -> Self {
        Self::boxed(ShapeKind::Text { content: content.into() }, center, width, height)
    }

    #[must_use]
    pub fn image(center: Point, width: f64, height: f64, src: impl Into<String>) -> Self {
        Self::boxed(ShapeKind::Image { src: src.into() }, center, width, height)
    }

    fn boxed(kind: ShapeKind, center: Point, width: f64, height: f64) -> Self {
        let box_coords = axis_box(center, width, height);
        Self::with_model(ElementModel::blank(kind, box_coords.to_vec(), box_coords))
    }

    /// A straight line between two world points.
    #[must_use]
    pub fn line(start: Point, end: Point) -> Self {
        let box_coords = get_box_by_points(&[start, end]).unwrap_or([start; 4]);
        let mut element = Self::with_model(ElementModel::blank(ShapeKind::Line, vec![start, end], box_coords));
        element.apply_line_geometry([start, end], 0.0);
        element
    }

    /// A finished free-form path through world points. An empty list yields a
    /// single point at the origin.
    #[must_use]
    pub fn arbitrary(points: &[Point], closed: bool) -> Self {
        let coords = if points.is_empty() { vec![Point::ORIGIN] } else { points.to_vec() };
        let box_coords = get_box_by_points(&coords).unwrap_or([Point::ORIGIN; 4]);
        let kind = ShapeKind::Arbitrary { tail_index: coords.len() - 1, closed };
        Self::with_model(ElementModel::blank(kind, coords, box_coords))
    }

    /// A group whose box is the axis-aligned union of `child_points`.
    pub(crate) fn group(sub_ids: std::collections::BTreeSet<ElementId>, child_points: &[Point]) -> Self {
        let box_coords = get_box_by_points(child_points).unwrap_or([Point::ORIGIN; 4]);
        Self::with_model(ElementModel::blank(ShapeKind::Group { sub_ids }, box_coords.to_vec(), box_coords))
    }

    #[must_use]
    pub fn with_strokes(mut self, strokes: Vec<StrokeStyle>) -> Self {
        self.model.strokes = strokes;
        self.refresh(RefreshOptions::all());
        self
    }

    #[must_use]
    pub fn with_fills(mut self, fills: Vec<FillStyle>) -> Self {
        self.model.fills = fills;
        self
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.model.name = name.into();
        self
    }

    #[must_use]
    pub fn with_ratio_locked(mut self, locked: bool) -> Self {
        self.model.ratio_locked = locked;
        self
    }

    // =========================================================================
    // SNAPSHOT
    // =========================================================================

    #[must_use]
    pub fn to_model(&self) -> ElementModel {
        self.model.clone()
    }

    /// Rebuild an element from persisted fields, recomputing every derived value.
    ///
    /// # Errors
    ///
    /// Returns `SceneError::InvalidModel` when the model fails [`ElementModel::validate`].
    pub fn from_model(model: ElementModel) -> Result<Self, SceneError> {
        model.validate()?;
        Ok(Self::with_model(model))
    }

    /// # Errors
    ///
    /// Returns `SceneError::Json` if serialization fails.
    pub fn to_json(&self) -> Result<String, SceneError> {
        Ok(serde_json::to_string(&self.model)?)
    }

    /// # Errors
    ///
    /// Returns `SceneError::Json` for malformed JSON and
    /// `SceneError::InvalidModel` for a structurally invalid model.
    pub fn from_json(json: &str) -> Result<Self, SceneError> {
        let model: ElementModel = serde_json::from_str(json)?;
        Self::from_model(model)
    }

    // =========================================================================
    // REFRESH
    // =========================================================================

    /// Recompute the parts named by `opts`. The new model facets and cache are
    /// computed in full before either is assigned.
    pub fn refresh(&mut self, opts: RefreshOptions) {
        let (model, cache) = self.derive(opts);
        self.model = model;
        self.cache = cache;
        if opts.originals && self.origin.is_some() {
            self.origin = Some(TransformOrigin::capture(self));
        }
    }

    fn derive(&self, opts: RefreshOptions) -> (ElementModel, DerivedCache) {
        let mut m = self.model.clone();
        let mut c = self.cache.clone();
        let center = centroid(&m.box_coords).unwrap_or(c.center);

        if opts.lean_y_angle {
            m.angles.lean_y_angle = measure_lean(&m.box_coords, m.angles.lean_y_angle);
        }
        let lean = m.angles.lean_y_angle;

        if opts.points {
            c.unleaned_coords = unshear_points(&m.coords, lean, center);
            c.unleaned_box_coords = m.box_coords.map(|p| unshear_point(p, lean, center));
        }
        if opts.size {
            let ub = &c.unleaned_box_coords;
            m.width = ub[0].distance(ub[1]);
            m.height = ub[1].distance(ub[2]);
        }
        if opts.position {
            c.center = center;
            m.x = center.x;
            m.y = center.y;
        }
        if opts.view_angle {
            m.angles.view_angle = constraint_angle(m.angles.angle + lean);
        }
        if opts.actual_angle {
            m.angles.actual_angle = constraint_angle(m.angles.view_angle - lean);
        }
        if opts.rotation {
            let actual = m.angles.actual_angle;
            c.rotated_coords = rotate_points(&m.coords, actual, center);
            c.rotated_box_coords = m.box_coords.map(|p| rotate_with_center(p, actual, center));
            c.outline_path = variant::outline_path(&m.kind, &c.rotated_coords, &c.rotated_box_coords);
            c.flip_x = is_mirrored(&m.box_coords);
        }
        if opts.internal_angle {
            let rb = &c.rotated_box_coords;
            m.angles.internal_angle = if rb[0].distance(rb[3]) < EPSILON {
                m.angles.actual_angle
            } else {
                constraint_angle(direction_deg(rb[0], rb[3]) - 90.0)
            };
        }
        if opts.corners {
            m.corners = clamp_corners(&m.kind, m.corners, m.width, m.height, lean);
        }
        if opts.strokes {
            c.stroke_bands = variant::stroke_bands(&m.kind, &c.outline_path, &m.strokes);
        }
        if opts.outline {
            c.max_outline_box = max_outline_box(&c);
        }
        (m, c)
    }

    // =========================================================================
    // ACCESSORS
    // =========================================================================

    #[must_use]
    pub fn id(&self) -> ElementId {
        self.model.id
    }

    #[must_use]
    pub fn kind(&self) -> &ShapeKind {
        &self.model.kind
    }

    #[must_use]
    pub fn model(&self) -> &ElementModel {
        &self.model
    }

    #[must_use]
    pub fn cache(&self) -> &DerivedCache {
        &self.cache
    }

    #[must_use]
    pub fn status(&self) -> ElementStatus {
        self.model.status
    }

    #[must_use]
    pub fn capabilities(&self) -> Capabilities {
        self.model.kind.capabilities()
    }

    #[must_use]
    pub fn center(&self) -> Point {
        self.cache.center
    }

    #[must_use]
    pub fn width(&self) -> f64 {
        self.model.width
    }

    #[must_use]
    pub fn height(&self) -> f64 {
        self.model.height
    }

    #[must_use]
    pub fn coords(&self) -> &[Point] {
        &self.model.coords
    }

    #[must_use]
    pub fn box_coords(&self) -> &[Point; 4] {
        &self.model.box_coords
    }

    #[must_use]
    pub fn angles(&self) -> &AngleModel {
        &self.model.angles
    }

    #[must_use]
    pub fn angle(&self) -> f64 {
        self.model.angles.angle
    }

    #[must_use]
    pub fn lean_y_angle(&self) -> f64 {
        self.model.angles.lean_y_angle
    }

    #[must_use]
    pub fn actual_angle(&self) -> f64 {
        self.model.angles.actual_angle
    }

    #[must_use]
    pub fn corners(&self) -> [f64; 4] {
        self.model.corners
    }

    #[must_use]
    pub fn is_flipped_x(&self) -> bool {
        self.cache.flip_x
    }

    /// Y mirroring is folded into `angle` and the x flip; no separate state is kept.
    #[must_use]
    pub fn is_flipped_y(&self) -> bool {
        false
    }

    #[must_use]
    pub fn rotated_coords(&self) -> &[Point] {
        &self.cache.rotated_coords
    }

    #[must_use]
    pub fn rotated_box_coords(&self) -> &[Point; 4] {
        &self.cache.rotated_box_coords
    }

    #[must_use]
    pub fn outline_path(&self) -> &[Point] {
        &self.cache.outline_path
    }

    #[must_use]
    pub fn stroke_bands(&self) -> &[StrokeBand] {
        &self.cache.stroke_bands
    }

    #[must_use]
    pub fn max_outline_box(&self) -> &[Point; 4] {
        &self.cache.max_outline_box
    }

    #[must_use]
    pub fn group_id(&self) -> Option<ElementId> {
        self.model.group_id
    }

    pub(crate) fn set_group_id(&mut self, group_id: Option<ElementId>) {
        self.model.group_id = group_id;
    }

    /// Direct children, for groups.
    #[must_use]
    pub fn sub_ids(&self) -> Option<&std::collections::BTreeSet<ElementId>> {
        self.model.kind.sub_ids()
    }

    pub(crate) fn sub_ids_mut(&mut self) -> Option<&mut std::collections::BTreeSet<ElementId>> {
        match &mut self.model.kind {
            ShapeKind::Group { sub_ids } => Some(sub_ids),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_group(&self) -> bool {
        self.model.kind.is_group()
    }

    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.model.visible
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.model.visible = visible;
    }

    #[must_use]
    pub fn ratio_locked(&self) -> bool {
        self.model.ratio_locked
    }

    pub fn set_ratio_locked(&mut self, locked: bool) {
        self.model.ratio_locked = locked;
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.model.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.model.name = name.into();
    }

    /// Replace the strokes and rebuild the bands.
    pub fn set_strokes(&mut self, strokes: Vec<StrokeStyle>) {
        self.model.strokes = strokes;
        self.refresh(RefreshOptions {
            strokes: true,
            outline: true,
            ..RefreshOptions::default()
        });
    }

    // =========================================================================
    // HANDLES
    // =========================================================================

    #[must_use]
    pub fn vertex_handles(&self) -> Vec<Point> {
        handles::vertex_handles(
            self.model.kind.transform_mode(),
            &self.cache.rotated_coords,
            &self.cache.rotated_box_coords,
        )
    }

    /// Edge midpoints, or nothing for kinds without border transforms.
    #[must_use]
    pub fn border_handles(&self) -> Vec<Point> {
        if self.capabilities().border_transform {
            handles::border_handles(&self.cache.rotated_box_coords).to_vec()
        } else {
            Vec::new()
        }
    }

    #[must_use]
    pub fn rotation_handle(&self, offset: f64) -> Option<Point> {
        self.capabilities().rotate.then(|| {
            handles::rotation_handle(&self.cache.rotated_box_coords, self.model.angles.actual_angle, offset)
        })
    }

    #[must_use]
    pub fn hit_handle(&self, p: Point, config: &EditorConfig) -> Option<ControlHandle> {
        handles::hit_handle(
            p,
            &self.vertex_handles(),
            self.rotation_handle(config.rotate_handle_offset),
            &self.border_handles(),
            config.handle_radius,
        )
    }

    #[must_use]
    pub fn active_handle(&self) -> Option<ControlHandle> {
        self.active_handle
    }

    /// Select the handle that vertex and border drags act on. A handle this
    /// element does not have leaves the current one in place and returns `false`.
    pub fn set_active_handle(&mut self, handle: Option<ControlHandle>) -> bool {
        let valid = match handle {
            None => true,
            Some(ControlHandle::Vertex(i)) => i < self.vertex_handles().len(),
            Some(ControlHandle::Border(i)) => i < 4 && self.capabilities().border_transform,
            Some(ControlHandle::Rotation) => self.capabilities().rotate,
        };
        if valid {
            self.active_handle = handle;
        } else {
            tracing::debug!(id = %self.model.id, ?handle, "handle rejected");
        }
        valid
    }

    // =========================================================================
    // HIT TESTING
    // =========================================================================

    /// Whether `p` lies on the shape. Closed shapes count their interior and
    /// stroke bands; open paths count their bands or anything within `slop` of
    /// the centerline.
    #[must_use]
    pub fn contains_point(&self, p: Point, slop: f64) -> bool {
        let closed = self.model.kind.is_closed();
        if closed && is_point_in_polygon_by_ray_casting(p, &self.cache.outline_path) {
            return true;
        }
        let in_band = self.cache.stroke_bands.iter().any(|band| {
            is_point_in_polygon_by_ray_casting(p, &band.outer)
                || band.joins.iter().any(|j| is_point_in_polygon_by_ray_casting(p, j))
        });
        in_band || (!closed && point_polyline_distance(p, &self.cache.outline_path) <= slop)
    }

    /// Whether the shape's outline box overlaps a convex polygon.
    #[must_use]
    pub fn overlaps(&self, polygon: &[Point]) -> bool {
        is_polygons_overlap(&self.cache.max_outline_box, polygon)
    }
}

// =============================================================================
// HELPERS
// =============================================================================

/// Axis-aligned box around `center`. Negative sizes are treated as zero.
fn axis_box(center: Point, width: f64, height: f64) -> [Point; 4] {
    let hw = width.max(0.0) / 2.0;
    let hh = height.max(0.0) / 2.0;
    [
        Point::new(center.x - hw, center.y - hh),
        Point::new(center.x + hw, center.y - hh),
        Point::new(center.x + hw, center.y + hh),
        Point::new(center.x - hw, center.y + hh),
    ]
}

/// A model box with reversed winding is mirrored along its local x axis.
fn is_mirrored(box_coords: &[Point; 4]) -> bool {
    winding_sign(box_coords) < 0.0
}

/// Lean read off the model box's top edge, which runs right from the first
/// corner, or left when mirrored. A collapsed edge keeps `fallback`.
fn measure_lean(box_coords: &[Point; 4], fallback: f64) -> f64 {
    raw_lean(box_coords).map_or(fallback, clamp_lean)
}

/// Unclamped top-edge lean, `None` for a collapsed edge.
fn raw_lean(box_coords: &[Point; 4]) -> Option<f64> {
    let (from, to) = if is_mirrored(box_coords) {
        (box_coords[1], box_coords[0])
    } else {
        (box_coords[0], box_coords[1])
    };
    if from.distance(to) < EPSILON {
        return None;
    }
    Some(constraint_angle(direction_deg(from, to)))
}

/// Corner radii clamp to half of the smaller usable side of the sheared box.
fn clamp_corners(kind: &ShapeKind, corners: [f64; 4], width: f64, height: f64, lean: f64) -> [f64; 4] {
    if !kind.capabilities().corners {
        return [0.0; 4];
    }
    let vertical = height * lean.to_radians().cos();
    let limit = (width.min(vertical) / 2.0).max(0.0);
    corners.map(|r| if r.is_finite() { r.clamp(0.0, limit) } else { 0.0 })
}

fn max_outline_box(cache: &DerivedCache) -> [Point; 4] {
    let mut points: Vec<Point> = cache.rotated_box_coords.to_vec();
    points.extend_from_slice(&cache.outline_path);
    for band in &cache.stroke_bands {
        points.extend_from_slice(&band.inner);
        points.extend_from_slice(&band.outer);
        points.extend(band.joins.iter().flatten());
    }
    get_box_by_points(&points).unwrap_or(cache.rotated_box_coords)
}
