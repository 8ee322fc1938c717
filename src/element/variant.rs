//! Per-kind behavior table.
//!
//! Almost all element logic is shared. What differs by kind is collected here:
//! the transform mode, which direct operations are enabled, and how the world
//! outline and stroke bands are built.

#[cfg(test)]
#[path = "variant_test.rs"]
mod variant_test;

use std::collections::BTreeSet;
use std::f64::consts::TAU;

use serde::{Deserialize, Serialize};

use crate::consts::{ELLIPSE_OUTLINE_SEGMENTS, MITER_JOIN_MAX_DEG};
use crate::element::ElementId;
use crate::element::stroke::{StrokeBand, StrokeStyle, closed_band, open_band};
use crate::math::{Point, centroid, constraint_angle, direction_deg};

/// Shape kind, carrying the data only some kinds have.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ShapeKind {
    Rect,
    Ellipse,
    Image {
        src: String,
    },
    Text {
        content: String,
    },
    Line,
    /// Free-form path. `tail_index` is the vertex following the pointer while
    /// the path is being drawn.
    Arbitrary {
        #[serde(default)]
        tail_index: usize,
        #[serde(default)]
        closed: bool,
    },
    Group {
        #[serde(default)]
        sub_ids: BTreeSet<ElementId>,
    },
}

/// How vertex handles map onto the geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransformMode {
    /// Four box corners; dragging one scales the whole shape about the opposite corner.
    BoxVertices,
    /// One handle per path vertex; dragging moves just that vertex.
    PerVertex,
    /// Two endpoint handles; dragging one scales about the other.
    Endpoints,
}

/// Direct operations a kind accepts. Group cascades ignore these.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    pub rotate: bool,
    pub flip: bool,
    pub border_transform: bool,
    pub lean: bool,
    pub corners: bool,
    pub strokes: bool,
}

impl ShapeKind {
    #[must_use]
    pub fn capabilities(&self) -> Capabilities {
        match self {
            Self::Line => Capabilities {
                rotate: false,
                flip: false,
                border_transform: false,
                lean: false,
                corners: false,
                strokes: true,
            },
            Self::Rect | Self::Image { .. } => Capabilities {
                rotate: true,
                flip: true,
                border_transform: true,
                lean: true,
                corners: true,
                strokes: true,
            },
            Self::Group { .. } => Capabilities {
                rotate: true,
                flip: true,
                border_transform: true,
                lean: true,
                corners: false,
                strokes: false,
            },
            Self::Ellipse | Self::Text { .. } | Self::Arbitrary { .. } => Capabilities {
                rotate: true,
                flip: true,
                border_transform: true,
                lean: true,
                corners: false,
                strokes: true,
            },
        }
    }

    #[must_use]
    pub fn transform_mode(&self) -> TransformMode {
        match self {
            Self::Line => TransformMode::Endpoints,
            Self::Arbitrary { .. } => TransformMode::PerVertex,
            _ => TransformMode::BoxVertices,
        }
    }

    /// Whether the path encloses an area.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        match self {
            Self::Line => false,
            Self::Arbitrary { closed, .. } => *closed,
            _ => true,
        }
    }

    #[must_use]
    pub fn is_group(&self) -> bool {
        matches!(self, Self::Group { .. })
    }

    #[must_use]
    pub fn sub_ids(&self) -> Option<&BTreeSet<ElementId>> {
        match self {
            Self::Group { sub_ids } => Some(sub_ids),
            _ => None,
        }
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Rect => "rect",
            Self::Ellipse => "ellipse",
            Self::Image { .. } => "image",
            Self::Text { .. } => "text",
            Self::Line => "line",
            Self::Arbitrary { .. } => "arbitrary",
            Self::Group { .. } => "group",
        }
    }

    /// Minimum number of model coordinates a well-formed element of this kind has.
    #[must_use]
    pub fn min_coords(&self) -> usize {
        match self {
            Self::Line => 2,
            Self::Arbitrary { .. } => 1,
            _ => 4,
        }
    }
}

/// Angle of a line element: the direction from the first to the second
/// endpoint, turned so a segment running up the screen reads as `0`.
#[must_use]
pub fn line_angle(start: Point, end: Point) -> f64 {
    constraint_angle(direction_deg(start, end) + 90.0)
}

/// World outline used for hit-testing and as the base of stroke bands.
#[must_use]
pub fn outline_path(kind: &ShapeKind, rotated_coords: &[Point], rotated_box: &[Point; 4]) -> Vec<Point> {
    match kind {
        ShapeKind::Ellipse => ellipse_outline(rotated_box),
        ShapeKind::Group { .. } => rotated_box.to_vec(),
        _ => rotated_coords.to_vec(),
    }
}

/// Sample the ellipse inscribed in a (possibly sheared, rotated) box.
///
/// The box's edge midpoints give the two conjugate semi-axes, so the sample
/// follows the box exactly under any affine transform.
#[must_use]
pub fn ellipse_outline(rotated_box: &[Point; 4]) -> Vec<Point> {
    let Some(center) = centroid(rotated_box) else {
        return Vec::new();
    };
    let a = rotated_box[1].midpoint(rotated_box[2]) - center;
    let b = rotated_box[2].midpoint(rotated_box[3]) - center;
    #[allow(clippy::cast_precision_loss)]
    let step = TAU / ELLIPSE_OUTLINE_SEGMENTS as f64;
    (0..ELLIPSE_OUTLINE_SEGMENTS)
        .map(|i| {
            #[allow(clippy::cast_precision_loss)]
            let (sin, cos) = (step * i as f64).sin_cos();
            center + a * cos + b * sin
        })
        .collect()
}

/// One band per stroke. Groups draw no strokes.
#[must_use]
pub fn stroke_bands(kind: &ShapeKind, outline: &[Point], strokes: &[StrokeStyle]) -> Vec<StrokeBand> {
    match kind {
        ShapeKind::Group { .. } => Vec::new(),
        ShapeKind::Line => strokes.iter().map(|s| open_band(outline, s, None)).collect(),
        ShapeKind::Arbitrary { closed: false, .. } => strokes
            .iter()
            .map(|s| open_band(outline, s, Some(MITER_JOIN_MAX_DEG)))
            .collect(),
        _ => strokes.iter().map(|s| closed_band(outline, s)).collect(),
    }
}
