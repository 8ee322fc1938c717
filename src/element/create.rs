//! Drag-to-create and point-by-point path creation.

#[cfg(test)]
#[path = "create_test.rs"]
mod create_test;

use crate::element::cache::RefreshOptions;
use crate::element::variant::ShapeKind;
use crate::element::{Element, ElementModel, ElementStatus};
use crate::math::{Point, get_box_by_points};

impl Element {
    /// A shape about to be drawn. Groups are never drawn, so they yield `None`.
    #[must_use]
    pub fn initial(kind: ShapeKind) -> Option<Self> {
        let coords = match kind {
            ShapeKind::Group { .. } => return None,
            ShapeKind::Line | ShapeKind::Arbitrary { .. } => vec![Point::ORIGIN; 2],
            _ => vec![Point::ORIGIN; 4],
        };
        let kind = match kind {
            ShapeKind::Arbitrary { .. } => ShapeKind::Arbitrary { tail_index: 1, closed: false },
            other => other,
        };
        let mut model = ElementModel::blank(kind, coords, [Point::ORIGIN; 4]);
        model.status = ElementStatus::Initialed;
        Some(Self::with_model(model))
    }

    /// Pin the first corner (or endpoint, or path vertex) at `anchor`.
    pub fn start_create(&mut self, anchor: Point) -> bool {
        if self.model.status != ElementStatus::Initialed || !anchor.is_finite() {
            return false;
        }
        self.create_anchor = Some(anchor);
        self.model.status = ElementStatus::StartCreating;
        self.set_creation_points(anchor, anchor);
        true
    }

    /// Follow the pointer. Box shapes span the anchor and `point`, lines run
    /// from the anchor to `point`, and paths move their tail vertex.
    pub fn update_create(&mut self, point: Point) -> bool {
        if !self.model.status.is_creating() || !point.is_finite() {
            return false;
        }
        let Some(anchor) = self.create_anchor else {
            return false;
        };
        self.model.status = ElementStatus::Creating;
        self.set_creation_points(anchor, point);
        true
    }

    /// Commit the tail vertex of a free-form path at `point` and start a new
    /// tail. Clicking within `close_distance` of the first vertex once the
    /// path has two segments closes it instead. Returns `true` when the path
    /// closed.
    pub fn append_point(&mut self, point: Point, close_distance: f64) -> bool {
        if !self.model.status.is_creating() || !point.is_finite() {
            return false;
        }
        let ShapeKind::Arbitrary { tail_index, .. } = self.model.kind else {
            return false;
        };
        let mut path = self.model.coords.clone();
        let closes = tail_index >= 3 && path.first().is_some_and(|first| first.distance(point) <= close_distance);
        let (next_tail, closed) = if closes {
            path.truncate(tail_index);
            (path.len() - 1, true)
        } else {
            if let Some(tail) = path.get_mut(tail_index) {
                *tail = point;
            }
            path.push(point);
            (path.len() - 1, false)
        };
        self.model.kind = ShapeKind::Arbitrary { tail_index: next_tail, closed };
        self.model.status = ElementStatus::Creating;
        self.set_path(path);
        closed
    }

    /// End creation. Returns `false` when the result is smaller than
    /// `min_size` and should be discarded by the caller.
    pub fn finish_create(&mut self, min_size: f64) -> bool {
        if !self.model.status.is_creating() && self.model.status != ElementStatus::Initialed {
            return false;
        }
        if let ShapeKind::Arbitrary { closed: false, .. } = self.model.kind {
            // The pointer-following tail duplicates the last committed vertex.
            let mut path = self.model.coords.clone();
            if path.len() > 1 && path[path.len() - 1] == path[path.len() - 2] {
                path.pop();
            }
            self.model.kind = ShapeKind::Arbitrary { tail_index: path.len() - 1, closed: false };
            self.set_path(path);
        }
        self.model.status = ElementStatus::Finished;
        self.create_anchor = None;
        self.refresh(RefreshOptions::all());

        let keep = match self.model.kind {
            ShapeKind::Line => self.model.height >= min_size,
            ShapeKind::Arbitrary { .. } => {
                self.model.coords.len() >= 2 && self.model.width.max(self.model.height) >= min_size
            }
            _ => self.model.width >= min_size && self.model.height >= min_size,
        };
        if !keep {
            tracing::debug!(id = %self.model.id, kind = self.model.kind.name(), "created shape below minimum size");
        }
        keep
    }

    /// `Finished -> Editing`.
    pub fn begin_edit(&mut self) -> bool {
        if self.model.status != ElementStatus::Finished {
            return false;
        }
        self.model.status = ElementStatus::Editing;
        true
    }

    /// `Editing -> Finished`.
    pub fn end_edit(&mut self) -> bool {
        if self.model.status != ElementStatus::Editing {
            return false;
        }
        self.model.status = ElementStatus::Finished;
        true
    }

    fn set_creation_points(&mut self, anchor: Point, point: Point) {
        match self.model.kind {
            ShapeKind::Line => {
                self.apply_line_geometry([anchor, point], 0.0);
            }
            ShapeKind::Arbitrary { tail_index, .. } => {
                let mut path = self.model.coords.clone();
                if self.model.status == ElementStatus::StartCreating {
                    path = vec![anchor, point];
                } else if let Some(tail) = path.get_mut(tail_index) {
                    *tail = point;
                }
                self.set_path(path);
            }
            _ => {
                let box_coords = get_box_by_points(&[anchor, point]).unwrap_or([anchor; 4]);
                self.model.coords = box_coords.to_vec();
                self.model.box_coords = box_coords;
                self.refresh(RefreshOptions::all());
            }
        }
    }

    /// Paths under creation are unrotated and unsheared, so world points are
    /// model points.
    fn set_path(&mut self, path: Vec<Point>) {
        self.model.box_coords = get_box_by_points(&path).unwrap_or(self.model.box_coords);
        self.model.coords = path;
        self.refresh(RefreshOptions::all());
    }
}
