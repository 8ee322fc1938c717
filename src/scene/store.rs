//! Scene store: owns every element and the draw order.
//!
//! Mutations return the ids they changed, and the store folds those into its
//! derived sets (visible, on-stage) before returning. Group transforms cascade
//! to every descendant using the group's own lock point, frame, rotation
//! center or mirror line; a descendant's own frame is never used.

#[cfg(test)]
#[path = "store_test.rs"]
mod store_test;

use std::collections::{BTreeSet, HashMap, HashSet};

use tracing::{debug, warn};

use crate::config::EditorConfig;
use crate::element::{Changed, ControlHandle, Element, ElementId, ElementModel, ShapeKind};
use crate::error::SceneError;
use crate::math::{FrameTransform, MirrorLine, Point, constraint_angle};
use crate::scene::list::ElementList;

// =============================================================================
// STAGE
// =============================================================================

/// The visible viewport. `origin` is the model-space point shown at the
/// stage's top-left corner; one model unit spans `zoom` stage pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stage {
    pub origin: Point,
    pub zoom: f64,
    pub width: f64,
    pub height: f64,
}

impl Default for Stage {
    fn default() -> Self {
        Self { origin: Point::ORIGIN, zoom: 1.0, width: 0.0, height: 0.0 }
    }
}

impl Stage {
    fn zoom(&self) -> f64 {
        if self.zoom.is_finite() && self.zoom > 0.0 { self.zoom } else { 1.0 }
    }

    #[must_use]
    pub fn to_model(&self, stage_point: Point) -> Point {
        self.origin + stage_point * (1.0 / self.zoom())
    }

    #[must_use]
    pub fn to_stage(&self, model_point: Point) -> Point {
        (model_point - self.origin) * self.zoom()
    }

    /// The viewport rectangle in model space.
    #[must_use]
    pub fn viewport(&self) -> [Point; 4] {
        let br = self.to_model(Point::new(self.width.max(0.0), self.height.max(0.0)));
        [self.origin, Point::new(br.x, self.origin.y), br, Point::new(self.origin.x, br.y)]
    }
}

// =============================================================================
// STORE
// =============================================================================

#[derive(Debug, Clone, Default)]
pub struct SceneStore {
    elements: HashMap<ElementId, Element>,
    list: ElementList,
    selected: HashSet<ElementId>,
    visible: HashSet<ElementId>,
    on_stage: HashSet<ElementId>,
    stage: Stage,
    config: EditorConfig,
}

impl SceneStore {
    #[must_use]
    pub fn new(config: EditorConfig) -> Self {
        Self { config, ..Self::default() }
    }

    #[must_use]
    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    #[must_use]
    pub fn stage(&self) -> &Stage {
        &self.stage
    }

    pub fn set_stage(&mut self, stage: Stage) {
        self.stage = stage;
        let all = self.list.to_vec();
        self.sync_derived(&all);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.list.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    // =========================================================================
    // INSERT / REMOVE
    // =========================================================================

    /// Add an element at the top of the draw order. A child is also listed in
    /// its group's `sub_ids`.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateId` if the id is taken, and `DanglingReference` if the
    /// element names a group or children that are not in the store.
    pub fn add_element(&mut self, element: Element) -> Result<ElementId, SceneError> {
        let id = element.id();
        if self.elements.contains_key(&id) {
            return Err(SceneError::DuplicateId(id));
        }
        if let Some(parent) = element.group_id() {
            if !self.elements.get(&parent).is_some_and(Element::is_group) {
                return Err(SceneError::DanglingReference { id, missing: parent });
            }
        }
        if let Some(subs) = element.sub_ids() {
            if let Some(missing) = subs.iter().find(|s| !self.elements.contains_key(s)) {
                return Err(SceneError::DanglingReference { id, missing: *missing });
            }
        }
        if let Some(parent) = element.group_id() {
            if let Some(subs) = self.elements.get_mut(&parent).and_then(Element::sub_ids_mut) {
                subs.insert(id);
            }
        }
        self.list.push_back(id);
        self.elements.insert(id, element);
        self.sync_derived(&[id]);
        Ok(id)
    }

    /// Remove an element together with all its descendants, unbinding it from
    /// its group. Returns the removed ids in draw order.
    pub fn remove_element(&mut self, id: ElementId) -> Vec<ElementId> {
        if !self.elements.contains_key(&id) {
            return Vec::new();
        }
        let parent = self.parent_of(id);
        let removed = self.unit(id);
        for rid in &removed {
            self.list.remove(*rid);
            self.elements.remove(rid);
        }
        self.sync_derived(&removed);
        if let Some(parent) = parent {
            if let Some(subs) = self.elements.get_mut(&parent).and_then(Element::sub_ids_mut) {
                subs.remove(&id);
            }
            let refitted = self.refit_from(parent);
            self.sync_derived(&refitted);
        }
        removed
    }

    // =========================================================================
    // QUERIES
    // =========================================================================

    #[must_use]
    pub fn get_element_by_id(&self, id: ElementId) -> Option<&Element> {
        self.elements.get(&id)
    }

    /// Mutate one element in place and fold the result into the derived sets.
    pub fn update_element<R>(&mut self, id: ElementId, f: impl FnOnce(&mut Element) -> R) -> Option<R> {
        let result = f(self.elements.get_mut(&id)?);
        self.sync_derived(&[id]);
        Some(result)
    }

    /// Elements in draw order, bottom first.
    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.list.iter().filter_map(|id| self.elements.get(&id))
    }

    /// The given elements, ordered by draw position. Unknown ids are skipped.
    #[must_use]
    pub fn get_ordered_elements_by_ids(&self, ids: &[ElementId]) -> Vec<&Element> {
        self.ordered(ids)
            .into_iter()
            .filter_map(|id| self.elements.get(&id))
            .collect()
    }

    /// Whether the given elements sit next to each other in draw order.
    #[must_use]
    pub fn is_consecutive(&self, ids: &[ElementId]) -> bool {
        let ordered = self.ordered(ids);
        ordered.len() == ids.len() && self.list.is_consecutive(&ordered)
    }

    #[must_use]
    pub fn index_of(&self, id: ElementId) -> Option<usize> {
        self.list.index_of(id)
    }

    /// Draw order as ids.
    #[must_use]
    pub fn order(&self) -> Vec<ElementId> {
        self.list.to_vec()
    }

    /// Every descendant of a group, in draw order.
    #[must_use]
    pub fn deep_subs(&self, id: ElementId) -> Vec<ElementId> {
        let mut found = HashSet::new();
        let mut stack = self.direct_subs(id);
        while let Some(sub) = stack.pop() {
            if sub == id || !found.insert(sub) {
                continue;
            }
            stack.extend(self.direct_subs(sub));
        }
        self.list.iter().filter(|i| found.contains(i)).collect()
    }

    fn direct_subs(&self, id: ElementId) -> Vec<ElementId> {
        self.elements
            .get(&id)
            .and_then(Element::sub_ids)
            .map(|subs| subs.iter().copied().collect())
            .unwrap_or_default()
    }

    fn parent_of(&self, id: ElementId) -> Option<ElementId> {
        self.elements.get(&id).and_then(Element::group_id)
    }

    /// Group chain above `id`, nearest first.
    fn ancestors(&self, id: ElementId) -> Vec<ElementId> {
        let mut out = Vec::new();
        let mut cursor = self.parent_of(id);
        while let Some(parent) = cursor {
            if parent == id || out.contains(&parent) || !self.elements.contains_key(&parent) {
                break;
            }
            out.push(parent);
            cursor = self.parent_of(parent);
        }
        out
    }

    /// An element with all its descendants: the contiguous run it occupies
    /// in draw order, the element itself last.
    fn unit(&self, id: ElementId) -> Vec<ElementId> {
        let mut unit = self.deep_subs(id);
        unit.push(id);
        unit
    }

    /// Known ids, deduplicated, in draw order.
    fn ordered(&self, ids: &[ElementId]) -> Vec<ElementId> {
        let wanted: HashSet<ElementId> = ids.iter().copied().filter(|id| self.elements.contains_key(id)).collect();
        self.list.iter().filter(|id| wanted.contains(id)).collect()
    }

    /// Known ids with no ancestor in the same set, in draw order.
    fn roots(&self, ids: &[ElementId]) -> Vec<ElementId> {
        let ordered = self.ordered(ids);
        let set: HashSet<ElementId> = ordered.iter().copied().collect();
        ordered
            .into_iter()
            .filter(|id| !self.ancestors(*id).iter().any(|a| set.contains(a)))
            .collect()
    }

    /// Roots of `ids`, logging ids the store does not know.
    fn targets(&self, ids: &[ElementId]) -> Vec<ElementId> {
        for id in ids {
            if !self.elements.contains_key(id) {
                warn!(%id, "unknown element id");
            }
        }
        self.roots(ids)
    }

    // =========================================================================
    // SELECTION & DERIVED SETS
    // =========================================================================

    pub fn select(&mut self, ids: &[ElementId]) {
        for id in ids {
            if self.elements.contains_key(id) {
                self.selected.insert(*id);
            }
        }
    }

    pub fn deselect(&mut self, ids: &[ElementId]) {
        for id in ids {
            self.selected.remove(id);
        }
    }

    pub fn clear_selection(&mut self) {
        self.selected.clear();
    }

    /// Selected ids in draw order.
    #[must_use]
    pub fn selected_ids(&self) -> Vec<ElementId> {
        self.list.iter().filter(|id| self.selected.contains(id)).collect()
    }

    /// Selected ids that transforms act on directly: those without a selected
    /// ancestor, in draw order.
    #[must_use]
    pub fn target_ids(&self) -> Vec<ElementId> {
        let selected: Vec<ElementId> = self.selected.iter().copied().collect();
        self.roots(&selected)
    }

    #[must_use]
    pub fn visible_ids(&self) -> Vec<ElementId> {
        self.list.iter().filter(|id| self.visible.contains(id)).collect()
    }

    /// Visible elements whose outline box overlaps the stage viewport.
    #[must_use]
    pub fn on_stage_ids(&self) -> Vec<ElementId> {
        self.list.iter().filter(|id| self.on_stage.contains(id)).collect()
    }

    fn sync_derived(&mut self, ids: &[ElementId]) {
        let viewport = self.stage.viewport();
        for id in ids {
            match self.elements.get(id) {
                Some(element) => {
                    let visible = element.is_visible();
                    let on_stage = visible && element.overlaps(&viewport);
                    toggle(&mut self.visible, *id, visible);
                    toggle(&mut self.on_stage, *id, on_stage);
                }
                None => {
                    self.selected.remove(id);
                    self.visible.remove(id);
                    self.on_stage.remove(id);
                }
            }
        }
    }

    // =========================================================================
    // HIT TESTING
    // =========================================================================

    /// Topmost visible element under `p`, resolved to its outermost group.
    #[must_use]
    pub fn element_at(&self, p: Point) -> Option<ElementId> {
        let slop = self.config.handle_radius / 2.0;
        self.list
            .iter_rev()
            .filter_map(|id| self.elements.get(&id))
            .filter(|e| e.is_visible() && !e.is_group())
            .find(|e| e.contains_point(p, slop))
            .map(|e| self.ancestors(e.id()).last().copied().unwrap_or(e.id()))
    }

    #[must_use]
    pub fn hit_handle(&self, id: ElementId, p: Point) -> Option<ControlHandle> {
        self.elements.get(&id)?.hit_handle(p, &self.config)
    }

    // =========================================================================
    // LAYERING
    // =========================================================================

    /// Move the elements up one step as a single block. Non-contiguous input
    /// is first collapsed under its topmost member. Returns the moved ids, or
    /// nothing when the input spans different parents.
    pub fn shift_move(&mut self, ids: &[ElementId]) -> Vec<ElementId> {
        let Some(roots) = self.sibling_roots(ids) else {
            return Vec::new();
        };
        let parent = roots.first().and_then(|id| self.parent_of(*id));
        let block = self.collapse(&roots, true);
        let Some(top) = block.last().copied() else {
            return Vec::new();
        };
        if let Some(neighbor) = self.list.next(top).and_then(|n| self.sibling_of(n, parent)) {
            let mut anchor = neighbor;
            for id in &block {
                self.list.remove(*id);
                self.list.insert_after(*id, anchor);
                anchor = *id;
            }
        }
        debug!(count = roots.len(), "moved up");
        block
    }

    /// Move the elements down one step as a single block. Non-contiguous
    /// input is first collapsed above its bottom member.
    pub fn go_down(&mut self, ids: &[ElementId]) -> Vec<ElementId> {
        let Some(roots) = self.sibling_roots(ids) else {
            return Vec::new();
        };
        let parent = roots.first().and_then(|id| self.parent_of(*id));
        let block = self.collapse(&roots, false);
        let Some(bottom) = block.first().copied() else {
            return Vec::new();
        };
        if let Some(neighbor) = self.list.prev(bottom).and_then(|p| self.sibling_of(p, parent)) {
            let anchor = self.unit(neighbor).first().copied().unwrap_or(neighbor);
            for id in &block {
                self.list.remove(*id);
                self.list.insert_before(*id, anchor);
            }
        }
        debug!(count = roots.len(), "moved down");
        block
    }

    /// Move the elements above every sibling, keeping their relative order.
    pub fn bring_to_front(&mut self, ids: &[ElementId]) -> Vec<ElementId> {
        let Some(roots) = self.sibling_roots(ids) else {
            return Vec::new();
        };
        let parent = roots.first().and_then(|id| self.parent_of(*id));
        let block: Vec<ElementId> = roots.iter().flat_map(|id| self.unit(*id)).collect();
        for id in &block {
            self.list.remove(*id);
            match parent {
                Some(group) => self.list.insert_before(*id, group),
                None => self.list.push_back(*id),
            };
        }
        block
    }

    /// Move the elements below every sibling, keeping their relative order.
    pub fn send_to_back(&mut self, ids: &[ElementId]) -> Vec<ElementId> {
        let Some(roots) = self.sibling_roots(ids) else {
            return Vec::new();
        };
        let parent = roots.first().and_then(|id| self.parent_of(*id));
        let block: Vec<ElementId> = roots.iter().flat_map(|id| self.unit(*id)).collect();
        for id in &block {
            self.list.remove(*id);
        }
        match parent.and_then(|group| self.unit(group).first().copied()) {
            Some(anchor) => {
                for id in &block {
                    self.list.insert_before(*id, anchor);
                }
            }
            None => {
                for id in block.iter().rev() {
                    self.list.push_front(*id);
                }
            }
        }
        block
    }

    /// Roots of `ids` when they all share one parent.
    fn sibling_roots(&self, ids: &[ElementId]) -> Option<Vec<ElementId>> {
        let roots = self.roots(ids);
        let parent = self.parent_of(*roots.first()?);
        if roots.iter().any(|id| self.parent_of(*id) != parent) {
            debug!("layer move spans different groups");
            return None;
        }
        Some(roots)
    }

    /// The sibling (child of `parent`) whose unit contains `id`.
    fn sibling_of(&self, id: ElementId, parent: Option<ElementId>) -> Option<ElementId> {
        if Some(id) == parent {
            return None;
        }
        if self.parent_of(id) == parent {
            return Some(id);
        }
        self.ancestors(id)
            .into_iter()
            .find(|a| self.parent_of(*a) == parent && Some(*a) != parent)
    }

    /// Gather sibling units into one contiguous block against the topmost
    /// (`up`) or bottom-most member. Returns the block in draw order.
    fn collapse(&mut self, roots: &[ElementId], up: bool) -> Vec<ElementId> {
        let (extreme, others) = if up {
            match roots.split_last() {
                Some((last, rest)) => (*last, rest),
                None => return Vec::new(),
            }
        } else {
            match roots.split_first() {
                Some((first, rest)) => (*first, rest),
                None => return Vec::new(),
            }
        };
        let extreme_unit = self.unit(extreme);
        let moving: HashSet<ElementId> = others.iter().flat_map(|id| self.unit(*id)).collect();
        let moved = self.list.remove_by(|id| moving.contains(&id));
        if up {
            let anchor = extreme_unit.first().copied().unwrap_or(extreme);
            for id in &moved {
                self.list.insert_before(*id, anchor);
            }
            moved.into_iter().chain(extreme_unit).collect()
        } else {
            let mut anchor = extreme;
            for id in &moved {
                self.list.insert_after(*id, anchor);
                anchor = *id;
            }
            extreme_unit.into_iter().chain(moved).collect()
        }
    }

    // =========================================================================
    // GROUPING
    // =========================================================================

    /// Group at least two top-level elements. Elements already inside a group
    /// are ignored. The members are gathered under the topmost one and the
    /// group is placed right after them, then selected.
    pub fn create_element_group(&mut self, ids: &[ElementId]) -> Option<ElementId> {
        let top_level: Vec<ElementId> = self
            .ordered(ids)
            .into_iter()
            .filter(|id| self.parent_of(*id).is_none())
            .collect();
        if top_level.len() < 2 {
            debug!(count = top_level.len(), "group rejected: fewer than two top-level elements");
            return None;
        }
        let block = self.collapse(&top_level, true);
        let last = *block.last()?;

        let points: Vec<Point> = top_level
            .iter()
            .filter_map(|id| self.elements.get(id))
            .flat_map(|e| e.rotated_box_coords().iter().copied())
            .collect();
        let sub_ids: BTreeSet<ElementId> = top_level.iter().copied().collect();
        let group = Element::group(sub_ids, &points);
        let gid = group.id();

        for id in &top_level {
            if let Some(child) = self.elements.get_mut(id) {
                child.set_group_id(Some(gid));
            }
        }
        self.list.insert_after(gid, last);
        self.elements.insert(gid, group);
        self.selected.clear();
        self.selected.insert(gid);
        self.sync_derived(&[gid]);
        debug!(%gid, count = top_level.len(), "group created");
        Some(gid)
    }

    /// Dissolve a group. Children keep their positions and draw order and
    /// move up to the group's own parent. Returns the freed children.
    pub fn remove_element_group(&mut self, id: ElementId) -> Option<Vec<ElementId>> {
        let group = self.elements.get(&id)?;
        let children: Vec<ElementId> = group.sub_ids()?.iter().copied().collect();
        let parent = group.group_id();

        for child in &children {
            if let Some(element) = self.elements.get_mut(child) {
                element.set_group_id(parent);
            }
        }
        if let Some(parent) = parent {
            if let Some(subs) = self.elements.get_mut(&parent).and_then(Element::sub_ids_mut) {
                subs.remove(&id);
                subs.extend(children.iter().copied());
            }
        }
        let was_selected = self.selected.contains(&id);
        self.list.remove(id);
        self.elements.remove(&id);
        self.sync_derived(&[id]);
        if let Some(parent) = parent {
            let refitted = self.refit_from(parent);
            self.sync_derived(&refitted);
        }
        if was_selected {
            self.select(&children);
        }
        debug!(%id, count = children.len(), "group removed");
        Some(self.ordered(&children))
    }

    /// Refit the group boxes from `id` upward. Returns the refitted ids.
    fn refit_from(&mut self, id: ElementId) -> Vec<ElementId> {
        let mut chain = vec![id];
        chain.extend(self.ancestors(id));
        let mut refitted = Vec::new();
        for gid in chain {
            let points: Vec<Point> = self
                .direct_subs(gid)
                .iter()
                .filter_map(|sub| self.elements.get(sub))
                .flat_map(|e| e.rotated_box_coords().iter().copied())
                .collect();
            if points.is_empty() {
                continue;
            }
            if let Some(group) = self.elements.get_mut(&gid) {
                if group.fit_box_to_world(&points) {
                    refitted.push(gid);
                }
            }
        }
        refitted
    }

    // =========================================================================
    // TRANSFORMS
    // =========================================================================

    /// Open a drag session on the elements and all their descendants.
    pub fn begin_transform(&mut self, ids: &[ElementId]) {
        for root in self.targets(ids) {
            for id in self.unit(root) {
                if let Some(element) = self.elements.get_mut(&id) {
                    element.begin_transform();
                }
            }
        }
    }

    pub fn end_transform(&mut self, ids: &[ElementId]) {
        for root in self.roots(ids) {
            for id in self.unit(root) {
                if let Some(element) = self.elements.get_mut(&id) {
                    element.end_transform();
                }
            }
        }
    }

    /// Move elements and their descendants by the same offset.
    pub fn translate(&mut self, ids: &[ElementId], offset: Point) -> Vec<ElementId> {
        let mut changed = Vec::new();
        for root in self.targets(ids) {
            changed.extend(self.cascade(root, |e| e.translate_by(offset)));
            changed.extend(self.refit_parent(root));
        }
        self.finish(changed)
    }

    /// Drag a control handle. A group computes one frame transform from its
    /// own lock point and applies it to itself and every descendant.
    pub fn resize(&mut self, id: ElementId, handle: ControlHandle, offset: Point) -> Vec<ElementId> {
        let Some(element) = self.elements.get_mut(&id) else {
            return Vec::new();
        };
        let changed = if element.is_group() {
            match element.resize_plan(handle, offset) {
                Some(ft) => self.cascade(id, |e| e.apply_frame_transform(ft)),
                None => Vec::new(),
            }
        } else {
            if !element.set_active_handle(Some(handle)) {
                return Vec::new();
            }
            let result = match handle {
                ControlHandle::Vertex(_) => element.transform_by_vertices(offset),
                ControlHandle::Border(_) => element.transform_by_border(offset),
                ControlHandle::Rotation => Changed::NONE,
            };
            if result.any() { vec![id] } else { Vec::new() }
        };
        self.finish_with_parent(id, changed)
    }

    pub fn set_width(&mut self, id: ElementId, value: f64) -> Vec<ElementId> {
        let Some(element) = self.elements.get_mut(&id) else {
            return Vec::new();
        };
        let changed = if element.is_group() {
            match element.width_plan(value) {
                Some(ft) => self.cascade(id, |e| e.apply_frame_transform(ft)),
                None => Vec::new(),
            }
        } else if element.set_width(value).any() {
            vec![id]
        } else {
            Vec::new()
        };
        self.finish_with_parent(id, changed)
    }

    pub fn set_height(&mut self, id: ElementId, value: f64) -> Vec<ElementId> {
        let Some(element) = self.elements.get_mut(&id) else {
            return Vec::new();
        };
        let changed = if element.is_group() {
            match element.height_plan(value) {
                Some(ft) => self.cascade(id, |e| e.apply_frame_transform(ft)),
                None => Vec::new(),
            }
        } else if element.set_height(value).any() {
            vec![id]
        } else {
            Vec::new()
        };
        self.finish_with_parent(id, changed)
    }

    /// Set an element's rotation. For a group this is a rotation of the group
    /// and every descendant about the group's center.
    pub fn set_angle(&mut self, id: ElementId, value: f64, live: bool) -> Vec<ElementId> {
        let Some(element) = self.elements.get_mut(&id) else {
            return Vec::new();
        };
        let changed = if element.is_group() {
            let delta = constraint_angle(value - element.base_angle());
            let center = element.base_center();
            self.cascade(id, |e| e.rotate_about(delta, center, live))
        } else if element.set_angle(value, live).any() {
            vec![id]
        } else {
            Vec::new()
        };
        self.finish_with_parent(id, changed)
    }

    /// Rotate elements by `delta` about `lock`. Groups carry their descendants.
    pub fn rotate_by(&mut self, ids: &[ElementId], delta: f64, lock: Point, live: bool) -> Vec<ElementId> {
        let mut changed = Vec::new();
        for root in self.targets(ids) {
            let Some(element) = self.elements.get_mut(&root) else {
                continue;
            };
            if element.is_group() {
                changed.extend(self.cascade(root, |e| e.rotate_about(delta, lock, live)));
            } else if element.rotate_by(delta, lock, live).any() {
                changed.push(root);
            }
            changed.extend(self.refit_parent(root));
        }
        self.finish(changed)
    }

    /// Set the lean. A group shears itself and its descendants in its own frame.
    pub fn set_lean(&mut self, id: ElementId, value: f64) -> Vec<ElementId> {
        let Some(element) = self.elements.get_mut(&id) else {
            return Vec::new();
        };
        let changed = if element.is_group() {
            match element.lean_plan(value) {
                Some(ft) if self.unit_keeps_lean(id, ft) => self.cascade(id, |e| e.apply_frame_transform(ft)),
                Some(_) => {
                    debug!(%id, value, "group lean rejected: a descendant would pass the lean limit");
                    Vec::new()
                }
                None => Vec::new(),
            }
        } else if element.set_lean_y_angle(value).any() {
            vec![id]
        } else {
            Vec::new()
        };
        self.finish_with_parent(id, changed)
    }

    fn unit_keeps_lean(&self, root: ElementId, ft: FrameTransform) -> bool {
        self.unit(root)
            .iter()
            .filter_map(|id| self.elements.get(id))
            .all(|e| e.keeps_lean_under(ft))
    }

    /// Mirror each element across the vertical line through its center. A
    /// group's descendants share the group's line.
    pub fn flip_x(&mut self, ids: &[ElementId]) -> Vec<ElementId> {
        self.flip(ids, MirrorLine::vertical_through)
    }

    /// Mirror each element across the horizontal line through its center.
    pub fn flip_y(&mut self, ids: &[ElementId]) -> Vec<ElementId> {
        self.flip(ids, MirrorLine::horizontal_through)
    }

    fn flip(&mut self, ids: &[ElementId], line_through: fn(Point) -> MirrorLine) -> Vec<ElementId> {
        let mut changed = Vec::new();
        for root in self.targets(ids) {
            let Some(element) = self.elements.get_mut(&root) else {
                continue;
            };
            let line = line_through(element.center());
            if element.is_group() {
                changed.extend(self.cascade(root, |e| e.reflect_across(line)));
            } else if element.capabilities().flip && element.reflect_across(line).any() {
                changed.push(root);
            }
            changed.extend(self.refit_parent(root));
        }
        self.finish(changed)
    }

    pub fn set_corners(&mut self, id: ElementId, corners: [f64; 4]) -> Vec<ElementId> {
        let Some(element) = self.elements.get_mut(&id) else {
            return Vec::new();
        };
        let changed = if element.set_corners(corners).any() { vec![id] } else { Vec::new() };
        self.finish(changed)
    }

    /// Apply `op` to every descendant of `root` and then to `root` itself.
    fn cascade(&mut self, root: ElementId, mut op: impl FnMut(&mut Element) -> Changed) -> Vec<ElementId> {
        let mut changed = Vec::new();
        for id in self.unit(root) {
            if let Some(element) = self.elements.get_mut(&id) {
                if op(element).any() {
                    changed.push(id);
                }
            }
        }
        changed
    }

    fn refit_parent(&mut self, id: ElementId) -> Vec<ElementId> {
        match self.parent_of(id) {
            Some(parent) => self.refit_from(parent),
            None => Vec::new(),
        }
    }

    fn finish_with_parent(&mut self, id: ElementId, mut changed: Vec<ElementId>) -> Vec<ElementId> {
        if !changed.is_empty() {
            changed.extend(self.refit_parent(id));
        }
        self.finish(changed)
    }

    fn finish(&mut self, changed: Vec<ElementId>) -> Vec<ElementId> {
        self.sync_derived(&changed);
        changed
    }

    // =========================================================================
    // CREATION
    // =========================================================================

    /// Start drawing a new shape at `anchor`. The shape joins the top of the
    /// draw order immediately.
    pub fn begin_create(&mut self, kind: ShapeKind, anchor: Point) -> Option<ElementId> {
        let mut element = Element::initial(kind)?;
        if !element.start_create(anchor) {
            return None;
        }
        let id = element.id();
        self.list.push_back(id);
        self.elements.insert(id, element);
        self.sync_derived(&[id]);
        Some(id)
    }

    pub fn update_create(&mut self, id: ElementId, point: Point) -> bool {
        self.update_element(id, |e| e.update_create(point)).unwrap_or(false)
    }

    /// Commit a vertex of a free-form path. Returns `true` once the path closes.
    pub fn append_point(&mut self, id: ElementId, point: Point) -> bool {
        let close = self.config.close_path_distance;
        self.update_element(id, |e| e.append_point(point, close)).unwrap_or(false)
    }

    /// Finish drawing. Shapes below the minimum size are removed; a kept
    /// shape becomes the selection.
    pub fn finish_create(&mut self, id: ElementId) -> bool {
        let min = self.config.min_create_size;
        let Some(kept) = self.update_element(id, |e| e.finish_create(min)) else {
            return false;
        };
        if kept {
            self.selected.clear();
            self.selected.insert(id);
        } else {
            self.remove_element(id);
        }
        kept
    }

    // =========================================================================
    // SNAPSHOT
    // =========================================================================

    /// Every element model in draw order.
    #[must_use]
    pub fn snapshot(&self) -> Vec<ElementModel> {
        self.elements().map(Element::to_model).collect()
    }

    /// Rebuild a store from models in draw order.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateId` for a repeated id, `DanglingReference` for a
    /// group or child that is missing, and `InvalidModel` for a model that
    /// fails validation or a group link that is not mirrored on both sides.
    pub fn from_snapshot(models: Vec<ElementModel>, config: EditorConfig) -> Result<Self, SceneError> {
        let mut store = Self::new(config);
        for model in models {
            let id = model.id;
            if store.elements.contains_key(&id) {
                return Err(SceneError::DuplicateId(id));
            }
            let element = Element::from_model(model)?;
            store.list.push_back(id);
            store.elements.insert(id, element);
        }
        for element in store.elements.values() {
            let id = element.id();
            if let Some(parent) = element.group_id() {
                let Some(group) = store.elements.get(&parent) else {
                    return Err(SceneError::DanglingReference { id, missing: parent });
                };
                if !group.sub_ids().is_some_and(|subs| subs.contains(&id)) {
                    return Err(SceneError::InvalidModel {
                        id,
                        reason: format!("group {parent} does not list this element"),
                    });
                }
            }
            for sub in element.sub_ids().into_iter().flatten() {
                let Some(child) = store.elements.get(sub) else {
                    return Err(SceneError::DanglingReference { id, missing: *sub });
                };
                if child.group_id() != Some(id) {
                    return Err(SceneError::InvalidModel {
                        id: *sub,
                        reason: format!("listed by group {id} but not bound to it"),
                    });
                }
            }
        }
        let all = store.list.to_vec();
        store.sync_derived(&all);
        Ok(store)
    }

    /// Replace one element with a stored model, keeping its draw position.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no element has the model's id, or the model's
    /// validation error.
    pub fn restore_element(&mut self, model: ElementModel) -> Result<(), SceneError> {
        let id = model.id;
        if !self.elements.contains_key(&id) {
            return Err(SceneError::NotFound(id));
        }
        let element = Element::from_model(model)?;
        self.elements.insert(id, element);
        self.sync_derived(&[id]);
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `SceneError::Json` if serialization fails.
    pub fn to_json(&self) -> Result<String, SceneError> {
        Ok(serde_json::to_string_pretty(&self.snapshot())?)
    }

    /// # Errors
    ///
    /// Returns `SceneError::Json` for malformed input, otherwise the errors of
    /// [`SceneStore::from_snapshot`].
    pub fn from_json(json: &str, config: EditorConfig) -> Result<Self, SceneError> {
        let models: Vec<ElementModel> = serde_json::from_str(json)?;
        Self::from_snapshot(models, config)
    }
}

fn toggle(set: &mut HashSet<ElementId>, id: ElementId, present: bool) {
    if present {
        set.insert(id);
    } else {
        set.remove(&id);
    }
}
