//! Draw-order list of element ids.
//!
//! A doubly linked list whose links are ids in an id-keyed table, so every
//! relink is O(1) and nothing holds a reference into another node. The first
//! element is drawn first (bottom-most).

#[cfg(test)]
#[path = "list_test.rs"]
mod list_test;

use std::collections::HashMap;

use crate::element::ElementId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Node {
    prev: Option<ElementId>,
    next: Option<ElementId>,
}

#[derive(Debug, Clone, Default)]
pub struct ElementList {
    nodes: HashMap<ElementId, Node>,
    head: Option<ElementId>,
    tail: Option<ElementId>,
}

impl ElementList {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[must_use]
    pub fn contains(&self, id: ElementId) -> bool {
        self.nodes.contains_key(&id)
    }

    #[must_use]
    pub fn first(&self) -> Option<ElementId> {
        self.head
    }

    #[must_use]
    pub fn last(&self) -> Option<ElementId> {
        self.tail
    }

    #[must_use]
    pub fn prev(&self, id: ElementId) -> Option<ElementId> {
        self.nodes.get(&id).and_then(|n| n.prev)
    }

    #[must_use]
    pub fn next(&self, id: ElementId) -> Option<ElementId> {
        self.nodes.get(&id).and_then(|n| n.next)
    }

    // =========================================================================
    // INSERT
    // =========================================================================

    /// Append at the top of the draw order. `false` if `id` is already listed.
    pub fn push_back(&mut self, id: ElementId) -> bool {
        if self.contains(id) {
            return false;
        }
        self.link(id, self.tail, None);
        true
    }

    /// Insert at the bottom of the draw order.
    pub fn push_front(&mut self, id: ElementId) -> bool {
        if self.contains(id) {
            return false;
        }
        self.link(id, None, self.head);
        true
    }

    /// Insert `id` directly before `target`. `false` if `id` is already
    /// listed or `target` is not.
    pub fn insert_before(&mut self, id: ElementId, target: ElementId) -> bool {
        if self.contains(id) {
            return false;
        }
        let Some(node) = self.nodes.get(&target).copied() else {
            return false;
        };
        self.link(id, node.prev, Some(target));
        true
    }

    /// Insert `id` directly after `target`.
    pub fn insert_after(&mut self, id: ElementId, target: ElementId) -> bool {
        if self.contains(id) {
            return false;
        }
        let Some(node) = self.nodes.get(&target).copied() else {
            return false;
        };
        self.link(id, Some(target), node.next);
        true
    }

    fn link(&mut self, id: ElementId, prev: Option<ElementId>, next: Option<ElementId>) {
        match prev {
            Some(p) => {
                if let Some(node) = self.nodes.get_mut(&p) {
                    node.next = Some(id);
                }
            }
            None => self.head = Some(id),
        }
        match next {
            Some(n) => {
                if let Some(node) = self.nodes.get_mut(&n) {
                    node.prev = Some(id);
                }
            }
            None => self.tail = Some(id),
        }
        self.nodes.insert(id, Node { prev, next });
    }

    // =========================================================================
    // REMOVE
    // =========================================================================

    pub fn remove(&mut self, id: ElementId) -> bool {
        let Some(node) = self.nodes.remove(&id) else {
            return false;
        };
        match node.prev {
            Some(p) => {
                if let Some(prev) = self.nodes.get_mut(&p) {
                    prev.next = node.next;
                }
            }
            None => self.head = node.next,
        }
        match node.next {
            Some(n) => {
                if let Some(next) = self.nodes.get_mut(&n) {
                    next.prev = node.prev;
                }
            }
            None => self.tail = node.prev,
        }
        true
    }

    /// Unlink every id matching `pred`, returning them in draw order so the
    /// caller can splice them back elsewhere.
    pub fn remove_by(&mut self, mut pred: impl FnMut(ElementId) -> bool) -> Vec<ElementId> {
        let matched: Vec<ElementId> = self.iter().filter(|id| pred(*id)).collect();
        for id in &matched {
            self.remove(*id);
        }
        matched
    }

    // =========================================================================
    // QUERIES
    // =========================================================================

    /// Whether `ids`, in the given order, form an unbroken forward run.
    #[must_use]
    pub fn is_consecutive(&self, ids: &[ElementId]) -> bool {
        let Some(first) = ids.first() else {
            return false;
        };
        if !self.contains(*first) {
            return false;
        }
        ids.windows(2).all(|w| self.next(w[0]) == Some(w[1]))
    }

    #[must_use]
    pub fn index_of(&self, id: ElementId) -> Option<usize> {
        self.find_index(|candidate| candidate == id)
    }

    #[must_use]
    pub fn find_index(&self, pred: impl FnMut(ElementId) -> bool) -> Option<usize> {
        self.iter().position(pred)
    }

    /// Ids in draw order, bottom first.
    #[must_use]
    pub fn iter(&self) -> Iter<'_> {
        Iter { list: self, cursor: self.head, forward: true }
    }

    /// Ids top first.
    #[must_use]
    pub fn iter_rev(&self) -> Iter<'_> {
        Iter { list: self, cursor: self.tail, forward: false }
    }

    #[must_use]
    pub fn to_vec(&self) -> Vec<ElementId> {
        self.iter().collect()
    }
}

pub struct Iter<'a> {
    list: &'a ElementList,
    cursor: Option<ElementId>,
    forward: bool,
}

impl Iterator for Iter<'_> {
    type Item = ElementId;

    fn next(&mut self) -> Option<ElementId> {
        let id = self.cursor?;
        let node = self.list.nodes.get(&id)?;
        self.cursor = if self.forward { node.next } else { node.prev };
        Some(id)
    }
}
