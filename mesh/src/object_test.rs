use super::*;
use std::f64::consts::FRAC_PI_2;

use crate::factory;

fn unit_cube() -> Object {
    factory::cube("obj_0_0", 0.5, 0.5, 0.5).expect("cube")
}

// =============================================================
// EdgeRef
// =============================================================

#[test]
fn edge_ref_serializes_as_signed_integer() {
    assert_eq!(serde_json::to_string(&EdgeRef::forward(4)).expect("json"), "4");
    assert_eq!(serde_json::to_string(&EdgeRef::reversed(4)).expect("json"), "-4");
}

#[test]
fn edge_ref_parses_sign_as_direction() {
    let r: EdgeRef = serde_json::from_str("-12").expect("json");
    assert_eq!(r, EdgeRef { id: 12, forward: false });
    assert_eq!(r.flipped(), EdgeRef::forward(12));
}

#[test]
fn edge_ref_rejects_zero() {
    assert_eq!(EdgeRef::try_from(0), Err(MeshError::InvalidEdgeRef(0)));
    assert!(serde_json::from_str::<EdgeRef>("0").is_err());
}

#[test]
fn edge_ref_rejects_overflow() {
    let big = i64::from(u32::MAX) + 1;
    assert_eq!(EdgeRef::try_from(big), Err(MeshError::InvalidEdgeRef(big)));
}

// =============================================================
// construction
// =============================================================

#[test]
fn add_edge_requires_endpoints() {
    let mut obj = Object::new("o");
    let a = obj.add_vertex(DVec3::ZERO);
    let err = obj.add_edge(a, 99).expect_err("missing endpoint");
    assert!(matches!(err, MeshError::UnknownPart { kind: PartKind::Vertex, id: 99, .. }));
}

#[test]
fn add_face_requires_edges() {
    let mut obj = Object::new("o");
    let err = obj.add_face([EdgeRef::forward(1), EdgeRef::forward(2), EdgeRef::forward(3)]).expect_err("no edges");
    assert!(matches!(err, MeshError::UnknownPart { kind: PartKind::Edge, id: 1, .. }));
}

#[test]
fn add_triangle_shares_edges_in_reverse() {
    let mut obj = Object::new("o");
    let a = obj.add_vertex(DVec3::ZERO);
    let b = obj.add_vertex(DVec3::X);
    let c = obj.add_vertex(DVec3::Y);
    let d = obj.add_vertex(DVec3::ONE);
    let f1 = obj.add_triangle(a, b, c).expect("first");
    let f2 = obj.add_triangle(c, b, d).expect("second");
    assert_eq!(obj.edge_count(), 5);
    let shared = obj.face(f1).expect("f1").edges[1];
    assert_eq!(obj.face(f2).expect("f2").edges[0], shared.flipped());
}

#[test]
fn add_triangle_rejects_repeated_corner() {
    let mut obj = Object::new("o");
    let a = obj.add_vertex(DVec3::ZERO);
    let b = obj.add_vertex(DVec3::X);
    assert!(matches!(obj.add_triangle(a, b, a), Err(MeshError::Degenerate(_))));
}

#[test]
fn ids_are_not_reused_after_delete() {
    let mut obj = Object::new("o");
    let a = obj.add_vertex(DVec3::ZERO);
    obj.delete_vertex(a).expect("delete");
    let b = obj.add_vertex(DVec3::ZERO);
    assert!(b > a);
}

// =============================================================
// transform
// =============================================================

#[test]
fn translate_is_additive() {
    let mut obj = unit_cube();
    obj.translate(DVec3::new(1.0, 0.0, 0.0));
    obj.translate(DVec3::new(0.0, 2.0, 0.0));
    assert_eq!(obj.position(), DVec3::new(1.0, 2.0, 0.0));
}

#[test]
fn scale_multiplies_componentwise() {
    let mut obj = unit_cube();
    obj.scale(DVec3::new(2.0, 1.0, 1.0));
    obj.scale(DVec3::new(1.5, 3.0, 1.0));
    assert_eq!(obj.scale_factors(), DVec3::new(3.0, 3.0, 1.0));
}

#[test]
fn model_applies_rotation_then_scale_then_translation() {
    let mut obj = Object::new("o");
    let v = obj.add_vertex(DVec3::X);
    obj.rotate(DQuat::from_rotation_z(FRAC_PI_2));
    obj.scale(DVec3::new(1.0, 2.0, 1.0));
    obj.translate(DVec3::new(10.0, 0.0, 0.0));
    let world = obj.vertex_world(v).expect("vertex");
    assert!(world.abs_diff_eq(DVec3::new(10.0, 2.0, 0.0), 1e-12));
}

#[test]
fn model_cache_tracks_transform_changes() {
    let mut obj = Object::new("o");
    assert_eq!(obj.model(), DMat4::IDENTITY);
    obj.translate(DVec3::Z);
    assert!(obj.model().abs_diff_eq(DMat4::from_translation(DVec3::Z), 1e-12));
    assert!(obj.inverse_model().abs_diff_eq(DMat4::from_translation(-DVec3::Z), 1e-12));
}

#[test]
fn to_local_inverts_to_world() {
    let mut obj = unit_cube();
    obj.set_transform(DVec3::new(1.0, 2.0, 3.0), DVec3::new(2.0, 0.5, 1.0), DQuat::from_rotation_y(0.7));
    let p = DVec3::new(0.3, -0.2, 0.9);
    assert!(obj.to_local(obj.to_world(p)).abs_diff_eq(p, 1e-12));
}

// =============================================================
// vertex translate
// =============================================================

#[test]
fn translate_vertex_moves_in_world_units() {
    let mut obj = unit_cube();
    obj.set_transform(DVec3::new(5.0, 0.0, 0.0), DVec3::new(2.0, 3.0, 4.0), DQuat::from_rotation_x(1.1));
    let before = obj.vertex_world(1).expect("vertex");
    obj.translate_vertex(1, DVec3::new(1.0, 0.0, 0.0)).expect("translate");
    let after = obj.vertex_world(1).expect("vertex");
    assert!((after - before).abs_diff_eq(DVec3::X, 1e-9));
}

#[test]
fn translate_vertex_marks_mesh_dirty() {
    let mut obj = unit_cube();
    assert!(obj.take_dirty_mesh());
    assert!(!obj.is_dirty_mesh());
    obj.translate_vertex(2, DVec3::Y).expect("translate");
    assert!(obj.take_dirty_mesh());
}

#[test]
fn translate_missing_vertex_fails() {
    let mut obj = unit_cube();
    assert!(matches!(obj.translate_vertex(42, DVec3::X), Err(MeshError::UnknownPart { id: 42, .. })));
}

// =============================================================
// derived geometry
// =============================================================

#[test]
fn part_position_for_each_kind() {
    let mut obj = unit_cube();
    obj.translate(DVec3::new(0.0, 0.0, 1.0));
    assert_eq!(obj.part_position(PartKind::Vertex, 1), Some(DVec3::new(-0.5, 0.5, 1.5)));
    // edge 1 joins vertices 1 and 2
    assert_eq!(obj.part_position(PartKind::Edge, 1), Some(DVec3::new(0.0, 0.5, 1.5)));
    let face = obj.part_position(PartKind::Face, 1).expect("face");
    assert!(face.abs_diff_eq(DVec3::new(-1.0 / 6.0, 1.0 / 6.0, 1.5), 1e-12));
    assert_eq!(obj.part_position(PartKind::Face, 99), None);
}

#[test]
fn part_vertex_ids_resolve_faces_in_order() {
    let obj = unit_cube();
    assert_eq!(obj.part_vertex_ids(PartKind::Face, 5), vec![2, 1, 5]);
    assert_eq!(obj.part_vertex_ids(PartKind::Edge, 12), vec![2, 5]);
    assert_eq!(obj.part_vertex_ids(PartKind::Vertex, 3), vec![3]);
    assert!(obj.part_vertex_ids(PartKind::Vertex, 30).is_empty());
}

#[test]
fn face_world_normal_follows_rotation() {
    let mut obj = unit_cube();
    obj.rotate(DQuat::from_rotation_y(FRAC_PI_2));
    let n = obj.face_world_normal(1).expect("normal");
    assert!(n.abs_diff_eq(DVec3::X, 1e-12));
}

#[test]
fn open_faces_reports_broken_loops() {
    let mut obj = Object::new("o");
    let a = obj.add_vertex(DVec3::ZERO);
    let b = obj.add_vertex(DVec3::X);
    let c = obj.add_vertex(DVec3::Y);
    let e1 = obj.add_edge(a, b).expect("e1");
    let e2 = obj.add_edge(b, c).expect("e2");
    let e3 = obj.add_edge(a, c).expect("e3");
    let closed = obj.add_face([EdgeRef::forward(e1), EdgeRef::forward(e2), EdgeRef::reversed(e3)]).expect("closed");
    let open = obj.add_face([EdgeRef::forward(e1), EdgeRef::forward(e2), EdgeRef::forward(e3)]).expect("open");
    assert_eq!(obj.open_faces(), vec![open]);
    assert!(!obj.open_faces().contains(&closed));
}

// =============================================================
// delete cascade
// =============================================================

#[test]
fn delete_vertex_cascades_edges_then_faces() {
    let mut obj = unit_cube();
    let cascade = obj.delete_vertex(1).expect("delete");
    assert_eq!(cascade.vertices, vec![1]);
    assert_eq!(cascade.edges, vec![1, 3, 11, 12, 14]);
    assert_eq!(cascade.faces, vec![1, 5, 6, 11, 12]);
    assert_eq!(obj.vertex_count(), 7);
    assert_eq!(obj.edge_count(), 13);
    assert_eq!(obj.face_count(), 7);
    assert_eq!(obj.faces().map(|f| f.id).collect::<Vec<_>>(), vec![2, 3, 4, 7, 8, 9, 10]);
}

#[test]
fn delete_vertex_keeps_faces_whose_edges_survive() {
    for vertex in 1..=8 {
        let mut obj = unit_cube();
        obj.delete_vertex(vertex).expect("delete");
        assert!(obj.edges().all(|e| !e.touches(vertex)));
        let survivors = obj.faces().filter(|f| f.edges.iter().all(|r| obj.edge(r.id).is_some())).count();
        assert_eq!(obj.face_count(), survivors);
    }
}

#[test]
fn delete_edge_removes_faces_by_absolute_id() {
    let mut obj = unit_cube();
    // edge 2 is used forward by face 1 and reversed by face 2
    let cascade = obj.delete_edge(2).expect("delete");
    assert_eq!(cascade.faces, vec![1, 2]);
    assert_eq!(obj.face_count(), 10);
    assert_eq!(obj.vertex_count(), 8);
}

#[test]
fn delete_face_leaves_edges() {
    let mut obj = unit_cube();
    obj.delete_face(3).expect("delete");
    assert_eq!(obj.face_count(), 11);
    assert_eq!(obj.edge_count(), 18);
}

#[test]
fn delete_missing_part_fails() {
    let mut obj = unit_cube();
    assert!(obj.delete_vertex(100).is_err());
    assert!(obj.delete_edge(100).is_err());
    assert!(obj.delete_face(100).is_err());
}

// =============================================================
// serialization
// =============================================================

#[test]
fn json_round_trip_is_id_for_id() {
    for mut obj in [
        unit_cube(),
        factory::sphere("s", 0.5, 6, 4).expect("sphere"),
        factory::pyramid("p", 0.5, 0.5, 0.5).expect("pyramid"),
        factory::quad("q", 1.0, 1.0).expect("quad"),
    ] {
        obj.set_transform(DVec3::new(1.0, -2.0, 0.5), DVec3::new(1.0, 2.0, 3.0), DQuat::from_rotation_z(0.4));
        obj.delete_vertex(1).expect("delete");
        let json = obj.to_json().expect("json");
        let back = Object::from_json(&json).expect("load");
        let (a, b) = (back.to_data(), obj.to_data());
        assert_eq!(a.verts, b.verts);
        assert_eq!(a.edges, b.edges);
        assert_eq!(a.faces, b.faces);
        assert_eq!(a.uvs, b.uvs);
        assert!(back.position().abs_diff_eq(obj.position(), 1e-12));
        assert!(back.scale_factors().abs_diff_eq(obj.scale_factors(), 1e-12));
        assert!(back.rotation().abs_diff_eq(obj.rotation(), 1e-12));
    }
}

#[test]
fn json_uses_flat_field_names() {
    let json = unit_cube().to_json().expect("json");
    for key in ["id", "tx", "ty", "tz", "sx", "sy", "sz", "rx", "ry", "rz", "rw", "verts", "uvs", "edges", "faces"] {
        assert!(json.get(key).is_some(), "missing {key}");
    }
    assert_eq!(json["faces"]["5"]["e0"], serde_json::json!(-1));
    assert_eq!(json["edges"]["12"]["v1"], serde_json::json!(5));
}

#[test]
fn loaded_object_continues_id_sequence() {
    let json = unit_cube().to_json().expect("json");
    let mut back = Object::from_json(&json).expect("load");
    assert_eq!(back.add_vertex(DVec3::ZERO), 9);
    assert_eq!(back.add_edge(1, 9).expect("edge"), 19);
}

#[test]
fn load_rejects_edge_with_missing_vertex() {
    let json = serde_json::json!({
        "id": "bad",
        "verts": { "1": { "x": 0.0, "y": 0.0, "z": 0.0 } },
        "edges": { "1": { "v0": 1, "v1": 2 } },
    });
    let err = Object::from_json(&json).expect_err("dangling");
    assert_eq!(
        err,
        MeshError::DanglingReference { kind: PartKind::Edge, id: 1, missing: PartKind::Vertex, missing_id: 2 }
    );
}

#[test]
fn load_rejects_face_with_missing_edge() {
    let json = serde_json::json!({
        "id": "bad",
        "verts": { "1": { "x": 0.0, "y": 0.0, "z": 0.0 }, "2": { "x": 1.0, "y": 0.0, "z": 0.0 } },
        "edges": { "1": { "v0": 1, "v1": 2 } },
        "faces": { "1": { "e0": 1, "e1": -4, "e2": 1 } },
    });
    assert!(matches!(
        Object::from_json(&json),
        Err(MeshError::DanglingReference { kind: PartKind::Face, missing_id: 4, .. })
    ));
}

#[test]
fn load_defaults_identity_transform() {
    let json = serde_json::json!({ "id": "empty" });
    let obj = Object::from_json(&json).expect("load");
    assert_eq!(obj.scale_factors(), DVec3::ONE);
    assert_eq!(obj.rotation(), DQuat::IDENTITY);
}

#[test]
fn load_drops_unknown_uv_reference() {
    let json = serde_json::json!({
        "id": "uv",
        "verts": { "1": { "x": 0.0, "y": 0.0, "z": 0.0 }, "2": { "x": 1.0, "y": 0.0, "z": 0.0 } },
        "edges": { "1": { "v0": 1, "v1": 2, "uv0": 7 } },
    });
    let obj = Object::from_json(&json).expect("load");
    assert_eq!(obj.edge(1).expect("edge").uv0, None);
}

#[test]
fn load_rejects_malformed_json() {
    let json = serde_json::json!({ "id": 5 });
    assert!(matches!(Object::from_json(&json), Err(MeshError::Snapshot(_))));
}
