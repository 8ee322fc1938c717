#![allow(clippy::float_cmp)]

use uuid::Uuid;

use super::*;

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-6
}

fn near(a: Point, b: Point) -> bool {
    a.approx_eq(b, 1e-6)
}

/// Store with `n` 50x50 rects centered at `(i * 100, 0)`, bottom first.
fn store_with(n: usize) -> (SceneStore, Vec<ElementId>) {
    let mut store = SceneStore::new(EditorConfig::default());
    let mut ids = Vec::new();
    for i in 0..n {
        #[allow(clippy::cast_precision_loss)]
        let x = i as f64 * 100.0;
        let id = store.add_element(Element::rect(Point::new(x, 0.0), 50.0, 50.0)).unwrap();
        ids.push(id);
    }
    (store, ids)
}

fn center(store: &SceneStore, id: ElementId) -> Point {
    store.get_element_by_id(id).unwrap().center()
}

fn el(store: &SceneStore, id: ElementId) -> &Element {
    store.get_element_by_id(id).unwrap()
}

// =============================================================
// Stage
// =============================================================

#[test]
fn stage_converts_between_spaces() {
    let stage = Stage { origin: Point::new(10.0, 10.0), zoom: 2.0, width: 100.0, height: 50.0 };
    assert_eq!(stage.to_model(Point::new(100.0, 0.0)), Point::new(60.0, 10.0));
    assert_eq!(stage.to_stage(Point::new(60.0, 10.0)), Point::new(100.0, 0.0));
    assert_eq!(stage.viewport()[2], Point::new(60.0, 35.0));
}

#[test]
fn stage_bad_zoom_reads_as_one() {
    let stage = Stage { origin: Point::ORIGIN, zoom: 0.0, width: 10.0, height: 10.0 };
    assert_eq!(stage.to_model(Point::new(5.0, 5.0)), Point::new(5.0, 5.0));
}

#[test]
fn on_stage_tracks_viewport() {
    let (mut store, ids) = store_with(1);
    let far = store.add_element(Element::rect(Point::new(1000.0, 1000.0), 10.0, 10.0)).unwrap();
    store.set_stage(Stage { origin: Point::new(-100.0, -100.0), zoom: 1.0, width: 300.0, height: 300.0 });
    assert_eq!(store.on_stage_ids(), vec![ids[0]]);
    store.translate(&[far], Point::new(-1000.0, -1000.0));
    assert_eq!(store.on_stage_ids(), vec![ids[0], far]);
}

// =============================================================
// Insert / remove
// =============================================================

#[test]
fn add_rejects_duplicate_id() {
    let (mut store, ids) = store_with(1);
    let copy = Element::from_model(el(&store, ids[0]).to_model()).unwrap();
    assert!(matches!(store.add_element(copy), Err(SceneError::DuplicateId(_))));
    assert_eq!(store.len(), 1);
}

#[test]
fn add_rejects_unknown_group() {
    let (mut store, _) = store_with(0);
    let mut model = Element::rect(Point::ORIGIN, 10.0, 10.0).to_model();
    model.group_id = Some(Uuid::new_v4());
    let element = Element::from_model(model).unwrap();
    assert!(matches!(store.add_element(element), Err(SceneError::DanglingReference { .. })));
    assert!(store.is_empty());
}

#[test]
fn visibility_feeds_visible_set() {
    let (mut store, ids) = store_with(2);
    assert_eq!(store.visible_ids(), ids);
    store.update_element(ids[0], |e| e.set_visible(false));
    assert_eq!(store.visible_ids(), vec![ids[1]]);
}

#[test]
fn remove_drops_selection() {
    let (mut store, ids) = store_with(2);
    store.select(&ids);
    assert_eq!(store.remove_element(ids[0]), vec![ids[0]]);
    assert_eq!(store.selected_ids(), vec![ids[1]]);
    assert!(store.remove_element(ids[0]).is_empty());
}

#[test]
fn remove_group_takes_descendants() {
    let (mut store, ids) = store_with(3);
    let gid = store.create_element_group(&ids[..2]).unwrap();
    let removed = store.remove_element(gid);
    assert_eq!(removed, vec![ids[0], ids[1], gid]);
    assert_eq!(store.order(), vec![ids[2]]);
}

#[test]
fn remove_child_refits_group() {
    let (mut store, ids) = store_with(3);
    let gid = store.create_element_group(&ids).unwrap();
    assert!(approx(el(&store, gid).width(), 250.0));
    store.remove_element(ids[2]);
    assert!(approx(el(&store, gid).width(), 150.0));
    assert_eq!(el(&store, gid).sub_ids().map(BTreeSet::len), Some(2));
}

// =============================================================
// Queries
// =============================================================

#[test]
fn ordered_lookup_and_consecutive() {
    let (store, ids) = store_with(4);
    let picked = store.get_ordered_elements_by_ids(&[ids[2], ids[0], Uuid::new_v4()]);
    let picked_ids: Vec<ElementId> = picked.iter().map(|e| e.id()).collect();
    assert_eq!(picked_ids, vec![ids[0], ids[2]]);
    assert!(store.is_consecutive(&[ids[2], ids[1]]));
    assert!(!store.is_consecutive(&[ids[0], ids[2]]));
    assert!(!store.is_consecutive(&[ids[0], Uuid::new_v4()]));
    assert_eq!(store.index_of(ids[3]), Some(3));
}

#[test]
fn deep_subs_of_nested_groups() {
    let (mut store, ids) = store_with(3);
    let inner = store.create_element_group(&ids[..2]).unwrap();
    let outer = store.create_element_group(&[inner, ids[2]]).unwrap();
    assert_eq!(store.deep_subs(outer), vec![ids[0], ids[1], inner, ids[2]]);
    assert_eq!(store.order(), vec![ids[0], ids[1], inner, ids[2], outer]);
    assert!(store.deep_subs(ids[0]).is_empty());
}

// =============================================================
// Layering
// =============================================================

#[test]
fn shift_move_collapses_then_advances() {
    let (mut store, e) = store_with(5);
    store.shift_move(&[e[1], e[3]]);
    assert_eq!(store.order(), vec![e[0], e[2], e[4], e[1], e[3]]);
    assert!(store.is_consecutive(&[e[1], e[3]]));
}

#[test]
fn go_down_collapses_then_retreats() {
    let (mut store, e) = store_with(5);
    store.go_down(&[e[1], e[3]]);
    assert_eq!(store.order(), vec![e[1], e[3], e[0], e[2], e[4]]);
}

#[test]
fn shift_move_at_top_only_collapses() {
    let (mut store, e) = store_with(3);
    store.shift_move(&[e[0], e[2]]);
    assert_eq!(store.order(), vec![e[1], e[0], e[2]]);
}

#[test]
fn front_and_back() {
    let (mut store, e) = store_with(5);
    store.bring_to_front(&[e[2], e[0]]);
    assert_eq!(store.order(), vec![e[1], e[3], e[4], e[0], e[2]]);
    store.send_to_back(&[e[4], e[3]]);
    assert_eq!(store.order(), vec![e[3], e[4], e[1], e[0], e[2]]);
}

#[test]
fn group_moves_as_a_unit() {
    let (mut store, e) = store_with(4);
    let gid = store.create_element_group(&[e[1], e[2]]).unwrap();
    assert_eq!(store.order(), vec![e[0], e[1], e[2], gid, e[3]]);
    store.shift_move(&[gid]);
    assert_eq!(store.order(), vec![e[0], e[3], e[1], e[2], gid]);
    store.go_down(&[gid]);
    store.go_down(&[gid]);
    assert_eq!(store.order(), vec![e[1], e[2], gid, e[0], e[3]]);
}

#[test]
fn moving_past_a_group_skips_its_children() {
    let (mut store, e) = store_with(4);
    let gid = store.create_element_group(&[e[1], e[2]]).unwrap();
    store.shift_move(&[e[0]]);
    assert_eq!(store.order(), vec![e[1], e[2], gid, e[0], e[3]]);
}

#[test]
fn layering_within_a_group_stays_inside() {
    let (mut store, e) = store_with(4);
    let gid = store.create_element_group(&[e[0], e[1], e[2]]).unwrap();
    store.shift_move(&[e[0]]);
    assert_eq!(store.order(), vec![e[1], e[0], e[2], gid, e[3]]);
    store.shift_move(&[e[2]]);
    assert_eq!(store.order(), vec![e[1], e[0], e[2], gid, e[3]]);
    store.bring_to_front(&[e[1]]);
    assert_eq!(store.order(), vec![e[0], e[2], e[1], gid, e[3]]);
    store.send_to_back(&[e[1]]);
    assert_eq!(store.order(), vec![e[1], e[0], e[2], gid, e[3]]);
}

#[test]
fn layering_across_parents_is_rejected() {
    let (mut store, e) = store_with(4);
    store.create_element_group(&[e[1], e[2]]).unwrap();
    let before = store.order();
    assert!(store.shift_move(&[e[1], e[3]]).is_empty());
    assert!(store.bring_to_front(&[e[1], e[0]]).is_empty());
    assert_eq!(store.order(), before);
}

// =============================================================
// Grouping
// =============================================================

#[test]
fn group_box_is_union_of_children() {
    let mut store = SceneStore::new(EditorConfig::default());
    let a = store.add_element(Element::rect(Point::new(0.0, 0.0), 50.0, 50.0)).unwrap();
    let b = store.add_element(Element::rect(Point::new(200.0, 0.0), 50.0, 50.0)).unwrap();
    let gid = store.create_element_group(&[a, b]).unwrap();
    let group = el(&store, gid);
    assert!(group.is_group());
    assert_eq!(group.width(), 250.0);
    assert_eq!(group.height(), 50.0);
    assert_eq!(group.center(), Point::new(100.0, 0.0));
    assert_eq!(el(&store, a).group_id(), Some(gid));
    assert_eq!(store.selected_ids(), vec![gid]);
}

#[test]
fn group_gathers_under_topmost_member() {
    let (mut store, e) = store_with(4);
    let gid = store.create_element_group(&[e[2], e[0]]).unwrap();
    assert_eq!(store.order(), vec![e[1], e[0], e[2], gid, e[3]]);
}

#[test]
fn group_needs_two_top_level_elements() {
    let (mut store, e) = store_with(3);
    assert!(store.create_element_group(&[e[0]]).is_none());
    let gid = store.create_element_group(&[e[0], e[1]]).unwrap();
    // e[0] already belongs to a group and is ignored.
    assert!(store.create_element_group(&[e[0], e[2]]).is_none());
    assert_eq!(el(&store, e[0]).group_id(), Some(gid));
}

#[test]
fn ungroup_restores_children() {
    let (mut store, e) = store_with(4);
    let gid = store.create_element_group(&[e[0], e[2]]).unwrap();
    let freed = store.remove_element_group(gid).unwrap();
    assert_eq!(freed, vec![e[0], e[2]]);
    assert!(store.get_element_by_id(gid).is_none());
    assert_eq!(store.order(), vec![e[1], e[0], e[2], e[3]]);
    assert_eq!(el(&store, e[0]).group_id(), None);
    assert_eq!(store.selected_ids(), vec![e[0], e[2]]);
    assert_eq!(center(&store, e[2]), Point::new(200.0, 0.0));
}

#[test]
fn ungroup_nested_moves_children_up_one_level() {
    let (mut store, e) = store_with(3);
    let inner = store.create_element_group(&[e[0], e[1]]).unwrap();
    let outer = store.create_element_group(&[inner, e[2]]).unwrap();
    store.remove_element_group(inner).unwrap();
    assert_eq!(el(&store, e[0]).group_id(), Some(outer));
    let subs = el(&store, outer).sub_ids().unwrap();
    assert!(subs.contains(&e[0]) && subs.contains(&e[1]) && subs.contains(&e[2]));
    assert!(!subs.contains(&inner));
}

#[test]
fn ungroup_nested_refits_parent_to_new_children() {
    let mut store = SceneStore::new(EditorConfig::default());
    let a = store.add_element(Element::rect(Point::ORIGIN, 50.0, 50.0)).unwrap();
    let b = store.add_element(Element::rect(Point::new(100.0, 0.0), 50.0, 10.0)).unwrap();
    let c = store.add_element(Element::rect(Point::new(-200.0, 0.0), 50.0, 50.0)).unwrap();
    let inner = store.create_element_group(&[a, b]).unwrap();
    store.set_angle(inner, 45.0, false);
    let outer = store.create_element_group(&[inner, c]).unwrap();
    let before = el(&store, outer).width();

    store.remove_element_group(inner).unwrap();
    let xs: Vec<f64> = [a, b, c]
        .iter()
        .flat_map(|id| el(&store, *id).rotated_box_coords().map(|p| p.x))
        .collect();
    let min = xs.iter().copied().fold(f64::INFINITY, f64::min);
    let max = xs.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let group = el(&store, outer);
    assert!(approx(group.width(), max - min));
    assert!(group.width() < before - 1.0);
}

#[test]
fn ungroup_non_group_is_none() {
    let (mut store, e) = store_with(1);
    assert!(store.remove_element_group(e[0]).is_none());
}

// =============================================================
// Transforms
// =============================================================

#[test]
fn set_width_through_store() {
    let mut store = SceneStore::new(EditorConfig::default());
    let id = store.add_element(Element::rect(Point::ORIGIN, 100.0, 100.0)).unwrap();
    assert_eq!(store.set_width(id, 200.0), vec![id]);
    let rect = el(&store, id);
    assert!(approx(rect.width(), 200.0));
    assert!(approx(rect.height(), 100.0));
    assert!(near(rect.center(), Point::ORIGIN));
    assert!(approx(rect.box_coords()[0].x, -100.0));
    assert!(approx(rect.box_coords()[1].x, 100.0));
}

#[test]
fn rotate_quarter_about_center() {
    let mut store = SceneStore::new(EditorConfig::default());
    let id = store.add_element(Element::rect(Point::ORIGIN, 100.0, 100.0)).unwrap();
    let before = *el(&store, id).rotated_box_coords();
    store.rotate_by(&[id], 90.0, Point::ORIGIN, false);
    let rect = el(&store, id);
    assert!(approx(rect.angle(), 90.0));
    for (p, q) in rect.rotated_box_coords().iter().zip(before.iter()) {
        assert!(near(*p, crate::math::rotate_with_center(*q, 90.0, Point::ORIGIN)));
    }
}

#[test]
fn group_rotation_orbits_group_center() {
    let mut store = SceneStore::new(EditorConfig::default());
    let a = store.add_element(Element::rect(Point::new(0.0, 0.0), 50.0, 50.0)).unwrap();
    let b = store.add_element(Element::rect(Point::new(200.0, 0.0), 50.0, 50.0)).unwrap();
    let gid = store.create_element_group(&[a, b]).unwrap();
    let changed = store.set_angle(gid, 90.0, false);
    assert_eq!(changed.len(), 3);
    assert!(near(center(&store, a), Point::new(100.0, -100.0)));
    assert!(near(center(&store, b), Point::new(100.0, 100.0)));
    assert!(approx(el(&store, a).angle(), 90.0));
    assert!(approx(el(&store, gid).angle(), 90.0));
    assert!(approx(el(&store, gid).width(), 250.0));
    assert!(near(center(&store, gid), Point::new(100.0, 0.0)));
}

#[test]
fn live_group_rotation_is_relative_to_drag_start() {
    let (mut store, e) = store_with(2);
    let gid = store.create_element_group(&e).unwrap();
    store.begin_transform(&[gid]);
    store.set_angle(gid, 30.0, true);
    store.set_angle(gid, 60.0, true);
    store.end_transform(&[gid]);
    assert!(approx(el(&store, e[0]).angle(), 60.0));
    assert!(approx(el(&store, gid).angle(), 60.0));
    let expected = crate::math::rotate_with_center(Point::ORIGIN, 60.0, Point::new(50.0, 0.0));
    assert!(near(center(&store, e[0]), expected));
}

#[test]
fn translate_group_moves_descendants_once() {
    let (mut store, e) = store_with(3);
    let gid = store.create_element_group(&e[..2]).unwrap();
    let changed = store.translate(&[gid, e[0]], Point::new(10.0, 5.0));
    assert_eq!(changed.len(), 3);
    assert_eq!(center(&store, e[0]), Point::new(10.0, 5.0));
    assert_eq!(center(&store, e[1]), Point::new(110.0, 5.0));
    assert_eq!(center(&store, gid), Point::new(60.0, 5.0));
    assert_eq!(center(&store, e[2]), Point::new(200.0, 0.0));
}

#[test]
fn translating_child_refits_group() {
    let mut store = SceneStore::new(EditorConfig::default());
    let a = store.add_element(Element::rect(Point::new(0.0, 0.0), 50.0, 50.0)).unwrap();
    let b = store.add_element(Element::rect(Point::new(200.0, 0.0), 50.0, 50.0)).unwrap();
    let gid = store.create_element_group(&[a, b]).unwrap();
    let changed = store.translate(&[b], Point::new(100.0, 0.0));
    assert!(changed.contains(&gid));
    assert!(approx(el(&store, gid).width(), 350.0));
    assert!(near(center(&store, gid), Point::new(150.0, 0.0)));
}

#[test]
fn group_handle_resize_scales_children_from_group_lock() {
    let mut store = SceneStore::new(EditorConfig::default());
    let a = store.add_element(Element::rect(Point::new(0.0, 0.0), 50.0, 50.0)).unwrap();
    let b = store.add_element(Element::rect(Point::new(200.0, 0.0), 50.0, 50.0)).unwrap();
    let gid = store.create_element_group(&[a, b]).unwrap();
    store.begin_transform(&[gid]);
    store.resize(gid, ControlHandle::Vertex(2), Point::new(250.0, 50.0));
    store.end_transform(&[gid]);
    assert!(approx(el(&store, gid).width(), 500.0));
    assert!(approx(el(&store, gid).height(), 100.0));
    assert!(approx(el(&store, a).width(), 100.0));
    assert!(near(center(&store, a), Point::new(25.0, 25.0)));
    assert!(near(center(&store, b), Point::new(425.0, 25.0)));
}

#[test]
fn element_handle_resize() {
    let mut store = SceneStore::new(EditorConfig::default());
    let id = store.add_element(Element::rect(Point::ORIGIN, 100.0, 100.0)).unwrap();
    assert_eq!(store.resize(id, ControlHandle::Border(1), Point::new(50.0, 0.0)), vec![id]);
    assert!(approx(el(&store, id).width(), 150.0));
    assert!(store.resize(id, ControlHandle::Rotation, Point::new(50.0, 0.0)).is_empty());
}

#[test]
fn group_set_width_scales_children() {
    let (mut store, e) = store_with(2);
    let gid = store.create_element_group(&e).unwrap();
    store.set_width(gid, 300.0);
    assert!(approx(el(&store, gid).width(), 300.0));
    assert!(approx(el(&store, e[0]).width(), 100.0));
    assert!(approx(el(&store, e[0]).height(), 50.0));
    assert!(near(center(&store, e[0]), Point::new(-50.0, 0.0)));
}

#[test]
fn group_lean_shears_children() {
    let (mut store, e) = store_with(2);
    let gid = store.create_element_group(&e).unwrap();
    store.set_lean(gid, 20.0);
    assert!(approx(el(&store, gid).lean_y_angle(), 20.0));
    assert!(approx(el(&store, e[0]).lean_y_angle(), 20.0));
    assert!(approx(el(&store, e[0]).angle(), 0.0));
    let t = 20.0_f64.to_radians().tan();
    assert!(near(center(&store, e[0]), Point::new(0.0, -50.0 * t)));
}

#[test]
fn group_lean_past_a_child_limit_is_rejected() {
    let mut store = SceneStore::new(EditorConfig::default());
    let a = store.add_element(Element::rect(Point::ORIGIN, 60.0, 30.0)).unwrap();
    store.set_angle(a, 30.0, false);
    let b = store.add_element(Element::rect(Point::new(200.0, 0.0), 50.0, 50.0)).unwrap();
    let gid = store.create_element_group(&[a, b]).unwrap();
    // The shear adds to a's own rotation and would take it past 89 degrees.
    assert!(store.set_lean(gid, 89.0).is_empty());
    assert!(approx(el(&store, a).angle(), 30.0));
    assert!(approx(el(&store, a).lean_y_angle(), 0.0));
    assert!(approx(el(&store, a).width(), 60.0));
    assert!(approx(el(&store, gid).lean_y_angle(), 0.0));

    assert!(!store.set_lean(gid, 45.0).is_empty());
    assert!(approx(el(&store, gid).lean_y_angle(), 45.0));
    assert!(el(&store, a).lean_y_angle().abs() < 89.0);
}

#[test]
fn group_flip_mirrors_children_across_group_center() {
    let (mut store, e) = store_with(2);
    let gid = store.create_element_group(&e).unwrap();
    store.flip_x(&[gid]);
    assert!(near(center(&store, e[0]), Point::new(100.0, 0.0)));
    assert!(near(center(&store, e[1]), Point::new(0.0, 0.0)));
    assert!(el(&store, e[0]).is_flipped_x());
    assert!(el(&store, gid).is_flipped_x());
}

#[test]
fn flip_skips_lines() {
    let mut store = SceneStore::new(EditorConfig::default());
    let line = store.add_element(Element::line(Point::ORIGIN, Point::new(0.0, 10.0))).unwrap();
    assert!(store.flip_x(&[line]).is_empty());
    assert!(store.flip_y(&[line]).is_empty());
}

#[test]
fn corners_through_store() {
    let (mut store, e) = store_with(1);
    assert_eq!(store.set_corners(e[0], [5.0; 4]), vec![e[0]]);
    assert_eq!(el(&store, e[0]).corners(), [5.0; 4]);
}

#[test]
fn unknown_ids_are_skipped() {
    let (mut store, _) = store_with(1);
    assert!(store.translate(&[Uuid::new_v4()], Point::new(1.0, 1.0)).is_empty());
    assert!(store.set_angle(Uuid::new_v4(), 10.0, false).is_empty());
}

// =============================================================
// Selection & hit testing
// =============================================================

#[test]
fn target_ids_drop_selected_descendants() {
    let (mut store, e) = store_with(3);
    let gid = store.create_element_group(&e[..2]).unwrap();
    store.select(&[e[0], e[2]]);
    assert_eq!(store.selected_ids(), vec![e[0], gid, e[2]]);
    assert_eq!(store.target_ids(), vec![gid, e[2]]);
    store.deselect(&[gid]);
    assert_eq!(store.target_ids(), vec![e[0], e[2]]);
    store.clear_selection();
    assert!(store.selected_ids().is_empty());
}

#[test]
fn element_at_prefers_topmost() {
    let mut store = SceneStore::new(EditorConfig::default());
    let below = store.add_element(Element::rect(Point::new(0.0, 0.0), 50.0, 50.0)).unwrap();
    let above = store.add_element(Element::rect(Point::new(20.0, 0.0), 50.0, 50.0)).unwrap();
    assert_eq!(store.element_at(Point::new(10.0, 0.0)), Some(above));
    assert_eq!(store.element_at(Point::new(-20.0, 0.0)), Some(below));
    assert_eq!(store.element_at(Point::new(300.0, 0.0)), None);
    store.update_element(above, |e| e.set_visible(false));
    assert_eq!(store.element_at(Point::new(10.0, 0.0)), Some(below));
}

#[test]
fn element_at_resolves_to_outer_group() {
    let (mut store, e) = store_with(3);
    let inner = store.create_element_group(&e[..2]).unwrap();
    let outer = store.create_element_group(&[inner, e[2]]).unwrap();
    assert_eq!(store.element_at(Point::new(100.0, 0.0)), Some(outer));
    // The group box alone is not a hit target.
    assert_eq!(store.element_at(Point::new(50.0, 0.0)), None);
}

#[test]
fn hit_handle_through_store() {
    let (store, e) = store_with(1);
    assert_eq!(store.hit_handle(e[0], Point::new(25.0, 25.0)), Some(ControlHandle::Vertex(2)));
    assert_eq!(store.hit_handle(Uuid::new_v4(), Point::ORIGIN), None);
}

// =============================================================
// Creation
// =============================================================

#[test]
fn create_through_store_selects_result() {
    let (mut store, _) = store_with(0);
    let id = store.begin_create(ShapeKind::Rect, Point::ORIGIN).unwrap();
    assert_eq!(store.order(), vec![id]);
    assert!(store.update_create(id, Point::new(100.0, 50.0)));
    assert!(store.finish_create(id));
    assert_eq!(store.selected_ids(), vec![id]);
    assert_eq!(el(&store, id).width(), 100.0);
}

#[test]
fn tiny_creation_is_removed() {
    let (mut store, _) = store_with(0);
    let id = store.begin_create(ShapeKind::Ellipse, Point::ORIGIN).unwrap();
    store.update_create(id, Point::new(0.2, 0.2));
    assert!(!store.finish_create(id));
    assert!(store.is_empty());
}

#[test]
fn path_closes_with_config_distance() {
    let (mut store, _) = store_with(0);
    let id = store.begin_create(ShapeKind::Arbitrary { tail_index: 0, closed: false }, Point::ORIGIN).unwrap();
    for p in [Point::new(50.0, 0.0), Point::new(50.0, 50.0)] {
        store.update_create(id, p);
        assert!(!store.append_point(id, p));
    }
    store.update_create(id, Point::new(3.0, 3.0));
    assert!(store.append_point(id, Point::new(3.0, 3.0)));
    assert!(store.finish_create(id));
    assert!(el(&store, id).kind().is_closed());
}

#[test]
fn groups_cannot_be_drawn() {
    let (mut store, _) = store_with(0);
    let kind = ShapeKind::Group { sub_ids: BTreeSet::new() };
    assert!(store.begin_create(kind, Point::ORIGIN).is_none());
}

// =============================================================
// Snapshot
// =============================================================

#[test]
fn snapshot_round_trip_keeps_order_and_groups() {
    let (mut store, e) = store_with(4);
    let gid = store.create_element_group(&[e[3], e[1]]).unwrap();
    store.translate(&[e[0]], Point::new(7.0, 3.0));
    let json = store.to_json().unwrap();
    let back = SceneStore::from_json(&json, EditorConfig::default()).unwrap();
    assert_eq!(back.order(), store.order());
    assert_eq!(back.snapshot(), store.snapshot());
    assert_eq!(back.deep_subs(gid), vec![e[1], e[3]]);
}

#[test]
fn snapshot_rejects_duplicates() {
    let (store, _) = store_with(1);
    let mut models = store.snapshot();
    models.push(models[0].clone());
    let err = SceneStore::from_snapshot(models, EditorConfig::default()).unwrap_err();
    assert!(matches!(err, SceneError::DuplicateId(_)));
}

#[test]
fn snapshot_rejects_missing_child() {
    let (mut store, e) = store_with(2);
    store.create_element_group(&e).unwrap();
    let models: Vec<ElementModel> = store.snapshot().into_iter().filter(|m| m.id != e[0]).collect();
    let err = SceneStore::from_snapshot(models, EditorConfig::default()).unwrap_err();
    assert!(matches!(err, SceneError::DanglingReference { .. }));
}

#[test]
fn snapshot_rejects_unlisted_child() {
    let (store, e) = store_with(2);
    let mut models = store.snapshot();
    models[0].group_id = Some(e[1]);
    assert!(SceneStore::from_snapshot(models, EditorConfig::default()).is_err());
}

#[test]
fn snapshot_rejects_unbound_child() {
    let (mut store, e) = store_with(2);
    store.create_element_group(&e).unwrap();
    let mut models = store.snapshot();
    for model in &mut models {
        if model.id == e[0] {
            model.group_id = None;
        }
    }
    let err = SceneStore::from_snapshot(models, EditorConfig::default()).unwrap_err();
    assert!(matches!(err, SceneError::InvalidModel { id, .. } if id == e[0]));
}

#[test]
fn snapshot_rejects_child_listed_by_two_groups() {
    let (mut store, e) = store_with(4);
    store.create_element_group(&e[..2]).unwrap();
    let second = store.create_element_group(&e[2..]).unwrap();
    let mut models = store.snapshot();
    for model in &mut models {
        if model.id == second {
            if let ShapeKind::Group { sub_ids } = &mut model.kind {
                sub_ids.insert(e[0]);
            }
        }
    }
    let err = SceneStore::from_snapshot(models, EditorConfig::default()).unwrap_err();
    assert!(matches!(err, SceneError::InvalidModel { id, .. } if id == e[0]));
}

#[test]
fn snapshot_rejects_bad_json() {
    assert!(matches!(
        SceneStore::from_json("[{]", EditorConfig::default()),
        Err(SceneError::Json(_))
    ));
}

#[test]
fn restore_element_replaces_in_place() {
    let (mut store, e) = store_with(3);
    let saved = el(&store, e[1]).to_model();
    store.translate(&[e[1]], Point::new(50.0, 50.0));
    store.restore_element(saved).unwrap();
    assert_eq!(center(&store, e[1]), Point::new(100.0, 0.0));
    assert_eq!(store.index_of(e[1]), Some(1));

    let stranger = Element::rect(Point::ORIGIN, 1.0, 1.0).to_model();
    assert!(matches!(store.restore_element(stranger), Err(SceneError::NotFound(_))));
}
