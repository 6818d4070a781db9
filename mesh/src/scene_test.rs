use super::*;

fn scene_with_cubes(n: u64) -> Scene {
    let mut scene = Scene::new("scene-1", "Untitled");
    for seq in 0..n {
        scene.create(Primitive::Cube, seq).expect("cube");
    }
    scene
}

// =============================================================
// ids and creation
// =============================================================

#[test]
fn create_cube_uses_seq_in_id() {
    let mut scene = Scene::new("s", "n");
    let id = scene.create_cube(0.5, 0.5, 0.5, 0).expect("cube");
    assert_eq!(id, "obj_0_0");
    let obj = scene.object(&id).expect("object");
    assert_eq!(obj.vertex_count(), 8);
    assert_eq!(obj.edge_count(), 18);
    assert_eq!(obj.face_count(), 12);
}

#[test]
fn next_id_counter_is_per_scene() {
    let mut scene = Scene::new("s", "n");
    assert_eq!(scene.next_id(7), "obj_7_0");
    assert_eq!(scene.next_id(7), "obj_7_1");
    assert_eq!(scene.next_id(9), "obj_9_2");
}

#[test]
fn create_default_primitives() {
    let mut scene = Scene::new("s", "n");
    let sphere = scene.create(Primitive::Sphere, 1).expect("sphere");
    let pyramid = scene.create(Primitive::Pyramid, 2).expect("pyramid");
    let quad = scene.create(Primitive::Quad, 3).expect("quad");
    assert_eq!(scene.object(&sphere).map(Object::vertex_count), Some(242));
    assert_eq!(scene.object(&pyramid).map(Object::face_count), Some(6));
    assert_eq!(scene.object(&quad).map(Object::face_count), Some(2));
    assert_eq!(scene.object_count(), 3);
}

#[test]
fn primitive_parses_lowercase_names() {
    assert_eq!("pyramid".parse::<Primitive>(), Ok(Primitive::Pyramid));
    assert_eq!(Primitive::Quad.to_string(), "quad");
    assert_eq!("torus".parse::<Primitive>(), Err(MeshError::UnknownPrimitive("torus".into())));
}

#[test]
fn remove_drops_object_and_lock() {
    let mut scene = scene_with_cubes(1);
    scene.lock("alice", &["obj_0_0".to_owned()]);
    scene.remove("obj_0_0").expect("remove");
    assert!(!scene.contains("obj_0_0"));
    assert_eq!(scene.lock_holder("obj_0_0"), None);
    assert!(matches!(scene.remove("obj_0_0"), Err(MeshError::UnknownObject(_))));
}

// =============================================================
// presence and locks
// =============================================================

#[test]
fn add_user_deduplicates() {
    let mut scene = Scene::new("s", "n");
    assert!(scene.add_user("alice"));
    assert!(!scene.add_user("alice"));
    assert!(scene.add_user("bob"));
    assert_eq!(scene.users(), ["alice", "bob"]);
}

#[test]
fn lock_grants_free_objects_only() {
    let mut scene = scene_with_cubes(2);
    let ids = vec!["obj_0_0".to_owned(), "obj_1_1".to_owned()];
    assert_eq!(scene.lock("alice", &ids[..1]), vec!["obj_0_0".to_owned()]);
    assert_eq!(scene.lock("bob", &ids), vec!["obj_1_1".to_owned()]);
    assert_eq!(scene.lock_holder("obj_0_0"), Some("alice"));
    assert_eq!(scene.lock_holder("obj_1_1"), Some("bob"));
}

#[test]
fn grant_locks_replaces_previous_holder() {
    let mut scene = scene_with_cubes(2);
    let ids = ["obj_0_0".to_owned(), "obj_1_1".to_owned(), "nope".to_owned()];
    scene.lock("alice", &ids[..1]);
    let granted = scene.grant_locks("bob", &ids);
    assert_eq!(granted, vec![("obj_0_0".to_owned(), Some("alice".to_owned())), ("obj_1_1".to_owned(), None)]);
    assert_eq!(scene.lock_holder("obj_0_0"), Some("bob"));
    assert!(scene.locked_by("alice").is_empty());
}

#[test]
fn lock_ignores_unknown_objects() {
    let mut scene = scene_with_cubes(1);
    assert!(scene.lock("alice", &["nope".to_owned()]).is_empty());
}

#[test]
fn unlock_only_releases_own_locks() {
    let mut scene = scene_with_cubes(1);
    let ids = vec!["obj_0_0".to_owned()];
    scene.lock("alice", &ids);
    assert!(scene.unlock("bob", &ids).is_empty());
    assert_eq!(scene.unlock("alice", &ids), ids);
    assert_eq!(scene.lock_holder("obj_0_0"), None);
}

#[test]
fn leave_releases_every_lock() {
    let mut scene = scene_with_cubes(3);
    scene.add_user("alice");
    scene.add_user("bob");
    scene.lock("alice", &["obj_0_0".to_owned(), "obj_2_2".to_owned()]);
    scene.lock("bob", &["obj_1_1".to_owned()]);
    assert_eq!(scene.leave("alice"), vec!["obj_0_0".to_owned(), "obj_2_2".to_owned()]);
    assert_eq!(scene.users(), ["bob"]);
    assert_eq!(scene.locked_by("bob"), vec!["obj_1_1".to_owned()]);
}

// =============================================================
// textures
// =============================================================

#[test]
fn paint_appends_strokes() {
    let mut scene = Scene::new("s", "n");
    let stroke = PaintStroke { u: 0.5, v: 0.25, colour: [1.0, 0.0, 0.0], radius: 3.0 };
    scene.paint("tex", stroke);
    scene.paint("tex", stroke);
    assert_eq!(scene.texture("tex").map(|t| t.strokes.len()), Some(2));
    assert!(scene.texture("other").is_none());
}

#[test]
fn set_texture_requires_object() {
    let mut scene = scene_with_cubes(1);
    scene.set_texture("obj_0_0", "tex").expect("texture");
    assert_eq!(scene.object("obj_0_0").and_then(|o| o.texture.clone()), Some("tex".to_owned()));
    assert!(scene.set_texture("missing", "tex").is_err());
}

// =============================================================
// snapshots
// =============================================================

#[test]
fn snapshot_round_trip_restores_objects_and_counter() {
    let mut scene = scene_with_cubes(2);
    scene.create(Primitive::Sphere, 5).expect("sphere");
    scene.object_mut("obj_1_1").expect("cube").translate(DVec3::new(1.0, 2.0, 3.0));
    let json = scene.to_json().expect("json");

    let mut other = Scene::new("scene-1", "");
    other.load(&json).expect("load");
    assert_eq!(other.name, "Untitled");
    assert_eq!(other.to_data(), scene.to_data());
    assert_eq!(other.next_id(9), "obj_9_3");
}

#[test]
fn load_failure_leaves_scene_untouched() {
    let mut scene = scene_with_cubes(1);
    let bad = serde_json::json!({
        "objects": { "x": { "id": "x", "edges": { "1": { "v0": 1, "v1": 2 } } } }
    });
    assert!(scene.load(&bad).is_err());
    assert!(scene.contains("obj_0_0"));
}

// =============================================================
// edits
// =============================================================

fn two_cubes_apart() -> Scene {
    let mut scene = scene_with_cubes(2);
    scene.translate_objects(&["obj_0_0".to_owned()], DVec3::new(-1.0, 0.0, 0.0));
    scene.translate_objects(&["obj_1_1".to_owned()], DVec3::new(1.0, 0.0, 0.0));
    scene
}

#[test]
fn translate_objects_skips_unknown_ids() {
    let mut scene = scene_with_cubes(1);
    let applied = scene.translate_objects(&["obj_0_0".to_owned(), "gone".to_owned()], DVec3::X);
    assert_eq!(applied, 1);
    assert_eq!(scene.object("obj_0_0").map(Object::position), Some(DVec3::X));
}

#[test]
fn rotate_objects_orbits_pivot() {
    let mut scene = two_cubes_apart();
    let ids = vec!["obj_0_0".to_owned(), "obj_1_1".to_owned()];
    let q = DQuat::from_rotation_y(std::f64::consts::FRAC_PI_2);
    scene.rotate_objects(&ids, q, DVec3::ZERO);
    let a = scene.object("obj_0_0").expect("a");
    let b = scene.object("obj_1_1").expect("b");
    assert!(a.position().abs_diff_eq(DVec3::new(0.0, 0.0, 1.0), 1e-12));
    assert!(b.position().abs_diff_eq(DVec3::new(0.0, 0.0, -1.0), 1e-12));
    assert!(a.rotation().abs_diff_eq(q, 1e-12));
}

#[test]
fn scale_objects_pushes_origins_from_pivot() {
    let mut scene = two_cubes_apart();
    let ids = vec!["obj_0_0".to_owned(), "obj_1_1".to_owned()];
    scene.scale_objects(&ids, DVec3::splat(2.0), DVec3::ZERO);
    assert_eq!(scene.object("obj_0_0").map(Object::position), Some(DVec3::new(-2.0, 0.0, 0.0)));
    assert_eq!(scene.object("obj_1_1").map(Object::scale_factors), Some(DVec3::splat(2.0)));
}

#[test]
fn vertex_edits_work_in_world_space() {
    let mut scene = scene_with_cubes(1);
    let verts = vec![("obj_0_0".to_owned(), 1), ("obj_0_0".to_owned(), 2)];
    scene.object_mut("obj_0_0").expect("cube").scale(DVec3::splat(3.0));
    scene.translate_vertices(&verts, DVec3::Y);
    let obj = scene.object("obj_0_0").expect("cube");
    assert!(obj.vertex_world(1).expect("v1").abs_diff_eq(DVec3::new(-1.5, 2.5, 1.5), 1e-12));

    scene.scale_vertices(&verts, DVec3::new(2.0, 1.0, 1.0), DVec3::new(0.0, 2.5, 1.5));
    let obj = scene.object("obj_0_0").expect("cube");
    assert!(obj.vertex_world(2).expect("v2").abs_diff_eq(DVec3::new(3.0, 2.5, 1.5), 1e-12));
}

#[test]
fn rotate_vertices_about_pivot() {
    let mut scene = scene_with_cubes(1);
    let verts = vec![("obj_0_0".to_owned(), 2)];
    let q = DQuat::from_rotation_z(std::f64::consts::PI);
    scene.rotate_vertices(&verts, q, DVec3::new(0.0, 0.0, 0.5));
    let p = scene.object("obj_0_0").and_then(|o| o.vertex_world(2)).expect("v2");
    assert!(p.abs_diff_eq(DVec3::new(-0.5, -0.5, 0.5), 1e-12));
}

#[test]
fn delete_parts_tolerates_cascaded_parts() {
    let mut scene = scene_with_cubes(1);
    let obj = "obj_0_0".to_owned();
    let parts = vec![(obj.clone(), 1, PartKind::Vertex), (obj.clone(), 1, PartKind::Edge), (obj.clone(), 2, PartKind::Face)];
    assert_eq!(scene.delete_parts(&parts), 2);
    let cube = scene.object(&obj).expect("cube");
    assert_eq!(cube.vertex_count(), 7);
    assert_eq!(cube.face_count(), 6);
}

#[test]
fn delete_objects_counts_removed() {
    let mut scene = scene_with_cubes(2);
    assert_eq!(scene.delete_objects(&["obj_0_0".to_owned(), "nope".to_owned()]), 1);
    assert_eq!(scene.object_count(), 1);
}
