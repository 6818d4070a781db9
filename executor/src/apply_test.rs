use super::*;
use crate::config::ExecutorConfig;
use mesh::{PartKind, Scene, factory};
use serde_json::{Value, json};

fn peer(user: &str) -> Executor {
    let mut scene = Scene::new("s1", "Scene");
    scene.insert(factory::cube("5", 0.5, 0.5, 0.5).expect("cube"));
    Executor::new(ExecutorConfig::new(user), scene)
}

fn edit(user: &str, tool: &str, fields: Value) -> String {
    let mut value = json!({"type": "edit", "tool": tool, "userId": user});
    if let (Some(target), Value::Object(extra)) = (value.as_object_mut(), fields) {
        target.extend(extra);
    }
    value.to_string()
}

fn snapshot(ex: &Executor) -> Value {
    ex.scene().to_json().expect("snapshot")
}

fn position(ex: &Executor, id: &str) -> DVec3 {
    ex.scene().object(id).expect("object").position()
}

fn approx(a: DVec3, b: DVec3) -> bool {
    a.abs_diff_eq(b, 1e-9)
}

// =============================================================
// own-edit suppression
// =============================================================

#[test]
fn remote_translate_moves_object() {
    let mut ex = peer("me");
    let text = r#"{"type":"edit","tool":"translate","ids":[5],"dx":1,"dy":0,"dz":0,"objMode":true,"userId":"other"}"#;
    assert_eq!(ex.handle_text(text), Outcome::Applied);
    assert_eq!(position(&ex, "5"), DVec3::X);
}

#[test]
fn own_translate_echo_is_suppressed() {
    let mut ex = peer("me");
    let text = r#"{"type":"edit","tool":"translate","ids":[5],"dx":1,"dy":0,"dz":0,"objMode":true,"userId":"me"}"#;
    assert_eq!(ex.handle_text(text), Outcome::Suppressed);
    assert_eq!(position(&ex, "5"), DVec3::ZERO);
}

#[test]
fn own_echoes_leave_scene_unchanged_for_every_tool() {
    let mut ex = peer("me");
    let before = snapshot(&ex);
    let echoes = [
        edit("me", "translate", json!({"dx": 1, "dy": 2, "dz": 3, "objMode": true, "ids": ["5"]})),
        edit(
            "me",
            "rotate",
            json!({"x": 0, "y": 0, "z": 1, "w": 0, "mx": 1, "my": 0, "mz": 0, "objMode": true, "ids": ["5"]}),
        ),
        edit("me", "scale", json!({"sx": 2, "sy": 2, "sz": 2, "mx": 0, "my": 0, "mz": 0, "objMode": true, "ids": ["5"]})),
        edit("me", "delete", json!({"objMode": false, "ids": [["5", 1, "vertex"]]})),
        edit("me", "delete", json!({"objMode": true, "ids": ["5"]})),
        edit("me", "extrude", json!({"objId": "5", "faceIds": [1]})),
        edit("me", "merge", json!({"objId": "5", "vertIds": [1, 2]})),
    ];
    for text in &echoes {
        assert_eq!(ex.handle_text(text), Outcome::Suppressed, "{text}");
    }
    assert_eq!(snapshot(&ex), before);
}

// =============================================================
// transforms
// =============================================================

#[test]
fn remote_vertex_translate_moves_only_named_vertices() {
    let mut ex = peer("me");
    let v1 = ex.scene().object("5").and_then(|o| o.vertex(1)).expect("v1").position;
    let v2 = ex.scene().object("5").and_then(|o| o.vertex(2)).expect("v2").position;
    let text = edit("other", "translate", json!({"dx": 0, "dy": 1, "dz": 0, "objMode": false, "ids": [["5", 1]]}));
    assert_eq!(ex.handle_text(&text), Outcome::Applied);
    let obj = ex.scene().object("5").expect("object");
    assert!(approx(obj.vertex(1).expect("v1").position, v1 + DVec3::Y));
    assert_eq!(obj.vertex(2).expect("v2").position, v2);
    assert_eq!(obj.position(), DVec3::ZERO);
}

#[test]
fn remote_rotate_orbits_pivot_and_spins() {
    let mut ex = peer("me");
    ex.scene_mut().translate_objects(&["5".to_owned()], DVec3::new(2.0, 0.0, 0.0));
    let h = std::f64::consts::FRAC_1_SQRT_2;
    let text = edit(
        "other",
        "rotate",
        json!({"x": 0, "y": 0, "z": h, "w": h, "mx": 0, "my": 0, "mz": 0, "objMode": true, "ids": ["5"]}),
    );
    assert_eq!(ex.handle_text(&text), Outcome::Applied);
    assert!(approx(position(&ex, "5"), DVec3::new(0.0, 2.0, 0.0)));
    let rotation = ex.scene().object("5").expect("object").rotation();
    assert!(rotation.abs_diff_eq(DQuat::from_rotation_z(std::f64::consts::FRAC_PI_2), 1e-9));
}

#[test]
fn remote_rotate_matches_local_group_rotate() {
    let mut local = peer("me");
    local.scene_mut().insert(factory::cube("6", 0.5, 0.5, 0.5).expect("cube"));
    local.scene_mut().translate_objects(&["6".to_owned()], DVec3::new(2.0, 1.0, 0.0));
    let mut remote = peer("other");
    remote.scene_mut().insert(factory::cube("6", 0.5, 0.5, 0.5).expect("cube"));
    remote.scene_mut().translate_objects(&["6".to_owned()], DVec3::new(2.0, 1.0, 0.0));

    let group = Editable::ObjectGroup(mesh::EditableGroup::from_members([
        Editable::Object("5".into()),
        Editable::Object("6".into()),
    ]));
    let q = DQuat::from_rotation_y(0.7);
    group.rotate(local.scene_mut(), q);
    local.on_open();
    let crate::SendOutcome::Sent(env) = local.emit_rotate(&group, q) else { panic!("expected send") };

    assert_eq!(remote.handle_text(&protocol::encode(&env).expect("encode")), Outcome::Applied);
    for id in ["5", "6"] {
        assert!(approx(position(&local, id), position(&remote, id)), "{id}");
    }
}

#[test]
fn remote_scale_moves_origin_away_from_pivot() {
    let mut ex = peer("me");
    ex.scene_mut().translate_objects(&["5".to_owned()], DVec3::new(1.0, 1.0, 0.0));
    let text =
        edit("other", "scale", json!({"sx": 2, "sy": 1, "sz": 1, "mx": 0, "my": 1, "mz": 0, "objMode": true, "ids": ["5"]}));
    assert_eq!(ex.handle_text(&text), Outcome::Applied);
    assert!(approx(position(&ex, "5"), DVec3::new(2.0, 1.0, 0.0)));
    assert_eq!(ex.scene().object("5").expect("object").scale_factors(), DVec3::new(2.0, 1.0, 1.0));
}

#[test]
fn remote_vertex_scale_uses_pivot() {
    let mut ex = peer("me");
    let text =
        edit("other", "scale", json!({"sx": 0, "sy": 0, "sz": 0, "mx": 0, "my": 0, "mz": 0, "objMode": false, "ids": [["5", 1], ["5", 2]]}));
    assert_eq!(ex.handle_text(&text), Outcome::Applied);
    let obj = ex.scene().object("5").expect("object");
    assert!(approx(obj.vertex(1).expect("v1").position, DVec3::ZERO));
    assert!(approx(obj.vertex(2).expect("v2").position, DVec3::ZERO));
}

#[test]
fn missing_targets_are_skipped_not_fatal() {
    let mut ex = peer("me");
    let text = edit("other", "translate", json!({"dx": 1, "dy": 0, "dz": 0, "objMode": true, "ids": ["gone", "5"]}));
    assert_eq!(ex.handle_text(&text), Outcome::Applied);
    assert_eq!(position(&ex, "5"), DVec3::X);
}

#[test]
fn obj_mode_mismatch_is_ignored() {
    let mut ex = peer("me");
    let before = snapshot(&ex);
    let text = edit("other", "translate", json!({"dx": 1, "dy": 0, "dz": 0, "objMode": true, "ids": [["5", 1]]}));
    assert_eq!(ex.handle_text(&text), Outcome::Ignored);
    assert_eq!(snapshot(&ex), before);
}

#[test]
fn degenerate_rotation_is_ignored() {
    let mut ex = peer("me");
    let text =
        edit("other", "rotate", json!({"x": 0, "y": 0, "z": 0, "w": 0, "mx": 0, "my": 0, "mz": 0, "objMode": true, "ids": ["5"]}));
    assert_eq!(ex.handle_text(&text), Outcome::Ignored);
}

#[test]
fn rotate_without_ids_is_a_no_op() {
    let mut ex = peer("me");
    let before = snapshot(&ex);
    let text = edit("other", "rotate", json!({"x": 0, "y": 0, "z": 0, "w": 1, "mx": 0, "my": 0, "mz": 0, "objMode": false}));
    assert_eq!(ex.handle_text(&text), Outcome::Applied);
    assert_eq!(snapshot(&ex), before);
}

// =============================================================
// delete and topology
// =============================================================

#[test]
fn remote_object_delete_removes_object() {
    let mut ex = peer("me");
    let text = edit("other", "delete", json!({"objMode": true, "ids": ["5"]}));
    assert_eq!(ex.handle_text(&text), Outcome::Applied);
    assert!(!ex.scene().contains("5"));
}

#[test]
fn remote_part_delete_cascades() {
    let mut ex = peer("me");
    let text = edit("other", "delete", json!({"objMode": false, "ids": [["5", 1, "vertex"], ["5", 1, "edge"]]}));
    assert_eq!(ex.handle_text(&text), Outcome::Applied);
    let obj = ex.scene().object("5").expect("object");
    assert_eq!(obj.vertex_count(), 7);
    assert!(!obj.has_part(PartKind::Edge, 1));
}

#[test]
fn remote_extrude_adds_ring() {
    let mut ex = peer("me");
    let text = edit("other", "extrude", json!({"objId": "5", "faceIds": [1]}));
    assert_eq!(ex.handle_text(&text), Outcome::Applied);
    assert_eq!(ex.scene().object("5").expect("object").vertex_count(), 11);
}

#[test]
fn remote_extrude_on_unknown_object_is_ignored() {
    let mut ex = peer("me");
    let text = edit("other", "extrude", json!({"objId": "nope", "faceIds": [1]}));
    assert_eq!(ex.handle_text(&text), Outcome::Ignored);
}

#[test]
fn remote_connect_and_merge() {
    let mut ex = peer("me");
    let edges = ex.scene().object("5").expect("object").edge_count();
    let text = edit("other", "connect", json!({"objId": "5", "vertIds": [1, 8]}));
    assert_eq!(ex.handle_text(&text), Outcome::Applied);
    assert_eq!(ex.scene().object("5").expect("object").edge_count(), edges + 1);

    let text = edit("other", "merge", json!({"objId": "5", "vertIds": [1, 2]}));
    assert_eq!(ex.handle_text(&text), Outcome::Applied);
    assert_eq!(ex.scene().object("5").expect("object").vertex_count(), 7);
}

#[test]
fn remote_paint_and_texture() {
    let mut ex = peer("me");
    let text = edit(
        "other",
        "paint",
        json!({"textureId": "t1", "u": 0.5, "v": 0.25, "bcr": 1, "bcg": 0.5, "bcb": 0, "br": 0.05}),
    );
    assert_eq!(ex.handle_text(&text), Outcome::Applied);
    let strokes = &ex.scene().texture("t1").expect("texture").strokes;
    assert_eq!(strokes, &[PaintStroke { u: 0.5, v: 0.25, colour: [1.0, 0.5, 0.0], radius: 0.05 }]);

    let text = edit("other", "texture", json!({"textureId": "t1", "objId": "5"}));
    assert_eq!(ex.handle_text(&text), Outcome::Applied);
    assert_eq!(ex.scene().object("5").expect("object").texture.as_deref(), Some("t1"));
}

// =============================================================
// create, locks, presence
// =============================================================

#[test]
fn create_uses_stamped_seq_for_ids() {
    let mut ex = peer("me");
    ex.mode_mut().toggle_object();
    assert_eq!(ex.handle_text(r#"{"type":"create","object":"sphere","seq":4}"#), Outcome::Applied);
    assert!(ex.scene().contains("obj_4_0"));
    assert!(ex.mode().object);
}

#[test]
fn unstamped_create_falls_back_to_seq_base() {
    let mut ex = Executor::new(ExecutorConfig::new("me").with_seq_base(9), Scene::new("s1", "Scene"));
    ex.handle_text(r#"{"type":"create","object":"quad"}"#);
    ex.handle_text(r#"{"type":"create","object":"pyramid"}"#);
    assert!(ex.scene().contains("obj_9_0"));
    assert!(ex.scene().contains("obj_9_1"));
}

#[test]
fn own_lock_selects_and_unlock_deselects() {
    let mut ex = peer("me");
    assert_eq!(ex.handle_text(r#"{"type":"lock","user":"me","objects":["5"]}"#), Outcome::Applied);
    assert!(ex.selection().contains(&Editable::Object("5".into())));
    assert!(ex.scene().object("5").expect("object").selected);
    assert_eq!(ex.scene().lock_holder("5"), Some("me"));

    ex.handle_text(r#"{"type":"unlock","user":"me","objects":["5"]}"#);
    assert!(ex.selection().is_empty());
    assert!(!ex.scene().object("5").expect("object").selected);
    assert_eq!(ex.scene().lock_holder("5"), None);
}

#[test]
fn unsequenced_lock_keeps_existing_holder() {
    let mut ex = peer("me");
    ex.handle_text(r#"{"type":"lock","user":"ann","objects":["5","missing"]}"#);
    assert_eq!(ex.scene().lock_holder("5"), Some("ann"));
    assert!(ex.selection().is_empty());

    ex.handle_text(r#"{"type":"lock","user":"me","objects":["5"]}"#);
    assert_eq!(ex.scene().lock_holder("5"), Some("ann"));
    assert!(ex.selection().is_empty());
}

#[test]
fn relayed_lock_hands_over_an_expired_lock() {
    let mut ex = peer("me");
    ex.handle_text(r#"{"type":"lock","user":"other","objects":["5"],"seq":2}"#);
    assert_eq!(ex.scene().lock_holder("5"), Some("other"));

    assert_eq!(ex.handle_text(r#"{"type":"lock","user":"me","objects":["5"],"seq":3}"#), Outcome::Applied);
    assert_eq!(ex.scene().lock_holder("5"), Some("me"));
    assert_eq!(ex.selection().len(), 1);
    assert!(ex.scene().object("5").expect("object").selected);
}

#[test]
fn relayed_lock_by_another_user_drops_own_selection() {
    let mut ex = peer("me");
    ex.handle_text(r#"{"type":"lock","user":"me","objects":["5"],"seq":2}"#);
    assert_eq!(ex.selection().len(), 1);

    ex.handle_text(r#"{"type":"lock","user":"other","objects":["5"],"seq":3}"#);
    assert_eq!(ex.scene().lock_holder("5"), Some("other"));
    assert!(ex.selection().is_empty());
    assert!(!ex.scene().object("5").expect("object").selected);
}

#[test]
fn leave_releases_locks_of_that_user() {
    let mut ex = peer("me");
    ex.handle_text(r#"{"type":"meta","name":"S","users":["me","ann"]}"#);
    ex.handle_text(r#"{"type":"lock","user":"ann","objects":["5"]}"#);
    assert_eq!(ex.handle_text(r#"{"type":"leave","user":"ann"}"#), Outcome::Applied);
    assert_eq!(ex.scene().lock_holder("5"), None);
    assert_eq!(ex.scene().users(), ["me".to_owned()]);
}

#[test]
fn own_leave_is_suppressed() {
    let mut ex = peer("me");
    ex.handle_text(r#"{"type":"join","user":"me"}"#);
    assert_eq!(ex.handle_text(r#"{"type":"leave","user":"me"}"#), Outcome::Suppressed);
    assert_eq!(ex.scene().users(), ["me".to_owned()]);
}

#[test]
fn remote_delete_drops_own_selection() {
    let mut ex = peer("me");
    ex.handle_text(r#"{"type":"lock","user":"me","objects":["5"]}"#);
    ex.handle_text(&edit("other", "delete", json!({"objMode": true, "ids": ["5"]})));
    assert!(ex.selection().is_empty());
}
