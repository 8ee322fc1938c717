use uuid::Uuid;

use super::*;

fn ids(n: usize) -> Vec<ElementId> {
    (0..n).map(|_| Uuid::new_v4()).collect()
}

fn list_of(ids: &[ElementId]) -> ElementList {
    let mut list = ElementList::new();
    for id in ids {
        assert!(list.push_back(*id));
    }
    list
}

// =============================================================
// Insertion
// =============================================================

#[test]
fn empty_list() {
    let list = ElementList::new();
    assert!(list.is_empty());
    assert_eq!(list.len(), 0);
    assert_eq!(list.first(), None);
    assert_eq!(list.last(), None);
    assert!(list.to_vec().is_empty());
}

#[test]
fn push_back_keeps_order() {
    let ids = ids(3);
    let list = list_of(&ids);
    assert_eq!(list.to_vec(), ids);
    assert_eq!(list.first(), Some(ids[0]));
    assert_eq!(list.last(), Some(ids[2]));
}

#[test]
fn push_front_prepends() {
    let ids = ids(2);
    let mut list = list_of(&ids[..1]);
    assert!(list.push_front(ids[1]));
    assert_eq!(list.to_vec(), vec![ids[1], ids[0]]);
}

#[test]
fn duplicate_push_is_rejected() {
    let ids = ids(1);
    let mut list = list_of(&ids);
    assert!(!list.push_back(ids[0]));
    assert!(!list.push_front(ids[0]));
    assert_eq!(list.len(), 1);
}

#[test]
fn insert_before_and_after() {
    let ids = ids(4);
    let mut list = list_of(&ids[..2]);
    assert!(list.insert_before(ids[2], ids[1]));
    assert!(list.insert_after(ids[3], ids[1]));
    assert_eq!(list.to_vec(), vec![ids[0], ids[2], ids[1], ids[3]]);
    assert_eq!(list.last(), Some(ids[3]));
}

#[test]
fn insert_before_head_moves_head() {
    let ids = ids(2);
    let mut list = list_of(&ids[..1]);
    assert!(list.insert_before(ids[1], ids[0]));
    assert_eq!(list.first(), Some(ids[1]));
    assert_eq!(list.prev(ids[0]), Some(ids[1]));
}

#[test]
fn insert_against_missing_target_fails() {
    let ids = ids(3);
    let mut list = list_of(&ids[..1]);
    assert!(!list.insert_before(ids[1], ids[2]));
    assert!(!list.insert_after(ids[1], ids[2]));
    assert_eq!(list.len(), 1);
}

// =============================================================
// Removal
// =============================================================

#[test]
fn remove_middle_relinks_neighbors() {
    let ids = ids(3);
    let mut list = list_of(&ids);
    assert!(list.remove(ids[1]));
    assert_eq!(list.next(ids[0]), Some(ids[2]));
    assert_eq!(list.prev(ids[2]), Some(ids[0]));
    assert!(!list.contains(ids[1]));
}

#[test]
fn remove_ends_updates_head_and_tail() {
    let ids = ids(3);
    let mut list = list_of(&ids);
    list.remove(ids[0]);
    list.remove(ids[2]);
    assert_eq!(list.first(), Some(ids[1]));
    assert_eq!(list.last(), Some(ids[1]));
    list.remove(ids[1]);
    assert!(list.is_empty());
    assert_eq!(list.first(), None);
}

#[test]
fn remove_missing_is_noop() {
    let ids = ids(2);
    let mut list = list_of(&ids[..1]);
    assert!(!list.remove(ids[1]));
    assert_eq!(list.len(), 1);
}

#[test]
fn remove_by_returns_draw_order() {
    let ids = ids(5);
    let mut list = list_of(&ids);
    let picked = [ids[3], ids[1]];
    let removed = list.remove_by(|id| picked.contains(&id));
    assert_eq!(removed, vec![ids[1], ids[3]]);
    assert_eq!(list.to_vec(), vec![ids[0], ids[2], ids[4]]);
}

// =============================================================
// Queries
// =============================================================

#[test]
fn is_consecutive_requires_forward_run() {
    let ids = ids(4);
    let list = list_of(&ids);
    assert!(list.is_consecutive(&ids[1..3]));
    assert!(list.is_consecutive(&[ids[2]]));
    assert!(!list.is_consecutive(&[ids[0], ids[2]]));
    assert!(!list.is_consecutive(&[ids[2], ids[1]]));
    assert!(!list.is_consecutive(&[]));
}

#[test]
fn is_consecutive_rejects_unknown_single() {
    let list = list_of(&ids(2));
    assert!(!list.is_consecutive(&[Uuid::new_v4()]));
}

#[test]
fn index_and_find() {
    let ids = ids(3);
    let list = list_of(&ids);
    assert_eq!(list.index_of(ids[2]), Some(2));
    assert_eq!(list.index_of(Uuid::new_v4()), None);
    assert_eq!(list.find_index(|id| id == ids[1]), Some(1));
}

#[test]
fn iter_rev_is_top_first() {
    let ids = ids(3);
    let list = list_of(&ids);
    let rev: Vec<ElementId> = list.iter_rev().collect();
    assert_eq!(rev, vec![ids[2], ids[1], ids[0]]);
}
