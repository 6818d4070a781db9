//! Primitive factories.
//!
//! Every primitive is built with small positive part ids starting at 1 and
//! with face windings chosen so `(c - a) x (b - a)` points outward. The cube
//! uses a fixed edge and face table; the other primitives are assembled
//! triangle by triangle and share edges through `Object::add_triangle`.

#[cfg(test)]
#[path = "factory_test.rs"]
mod factory_test;

use std::collections::BTreeMap;
use std::f64::consts::PI;

use glam::DVec3;

use crate::error::MeshError;
use crate::object::{EdgeRef, Object, ObjectId, PartId};

/// Cube edge table, as vertex id pairs.
const CUBE_EDGES: [(PartId, PartId); 18] = [
    (1, 2),
    (2, 3),
    (3, 1),
    (2, 4),
    (4, 3),
    (6, 8),
    (8, 7),
    (7, 5),
    (5, 8),
    (6, 5),
    (1, 5),
    (1, 6),
    (6, 2),
    (1, 7),
    (3, 7),
    (4, 6),
    (4, 8),
    (3, 8),
];

/// Cube faces, as signed edge ids. Two per side: +Z, -Z, +Y, -Y, +X, -X.
const CUBE_FACES: [[i64; 3]; 12] = [
    [1, 2, 3],
    [4, 5, -2],
    [10, 9, -6],
    [-9, -8, -7],
    [12, 13, -1],
    [11, -10, -12],
    [18, 7, -15],
    [-18, -5, 17],
    [-16, -4, -13],
    [16, 6, -17],
    [14, 8, -11],
    [-3, 15, -14],
];

/// Axis-aligned box spanning `±w, ±h, ±d`.
///
/// ```text
///   5-----6
///  /     /|
/// 1-----2 |
/// | 7   | 8
/// |     |/
/// 3-----4
/// ```
///
/// # Errors
///
/// Never fails in practice; the tables are internally consistent.
pub fn cube(id: impl Into<ObjectId>, w: f64, h: f64, d: f64) -> Result<Object, MeshError> {
    let mut obj = Object::new(id);
    for (x, y, z) in [
        (-w, h, d),
        (w, h, d),
        (-w, -h, d),
        (w, -h, d),
        (-w, h, -d),
        (w, h, -d),
        (-w, -h, -d),
        (w, -h, -d),
    ] {
        obj.add_vertex(DVec3::new(x, y, z));
    }
    for (a, b) in CUBE_EDGES {
        obj.add_edge(a, b)?;
    }
    for [e0, e1, e2] in CUBE_FACES {
        obj.add_face([EdgeRef::try_from(e0)?, EdgeRef::try_from(e1)?, EdgeRef::try_from(e2)?])?;
    }
    Ok(obj)
}

/// UV sphere: a pole, `stacks - 1` rings of `slices` vertices, and the opposite pole.
///
/// # Errors
///
/// Returns [`MeshError::Degenerate`] for fewer than 3 slices or 2 stacks.
pub fn sphere(id: impl Into<ObjectId>, r: f64, slices: u32, stacks: u32) -> Result<Object, MeshError> {
    if slices < 3 || stacks < 2 {
        return Err(MeshError::Degenerate("sphere needs at least 3 slices and 2 stacks"));
    }
    let mut obj = Object::new(id);
    let d_phi = PI / f64::from(stacks);
    let d_theta = 2.0 * PI / f64::from(slices);

    let top = obj.add_vertex(DVec3::new(0.0, r, 0.0));
    let mut rings: Vec<Vec<PartId>> = Vec::new();
    for i in 1..stacks {
        let phi = PI / 2.0 - d_phi * f64::from(i);
        let ring = (0..slices)
            .map(|j| {
                let theta = d_theta * f64::from(j);
                obj.add_vertex(DVec3::new(r * phi.cos() * theta.sin(), r * phi.sin(), r * phi.cos() * theta.cos()))
            })
            .collect();
        rings.push(ring);
    }
    let bottom = obj.add_vertex(DVec3::new(0.0, -r, 0.0));

    let n = slices as usize;
    if let Some(first) = rings.first() {
        for j in 0..n {
            obj.add_triangle(top, first[(j + 1) % n], first[j])?;
        }
    }
    for pair in rings.windows(2) {
        let (upper, lower) = (&pair[0], &pair[1]);
        for j in 0..n {
            let next = (j + 1) % n;
            obj.add_triangle(upper[j], upper[next], lower[j])?;
            obj.add_triangle(upper[next], lower[next], lower[j])?;
        }
    }
    if let Some(last) = rings.last() {
        for j in 0..n {
            obj.add_triangle(last[j], last[(j + 1) % n], bottom)?;
        }
    }
    Ok(obj)
}

/// Square-based pyramid: base at `y = -h` spanning `±w, ±d`, apex at `(0, h, 0)`.
///
/// # Errors
///
/// Never fails in practice.
pub fn pyramid(id: impl Into<ObjectId>, w: f64, h: f64, d: f64) -> Result<Object, MeshError> {
    let mut obj = Object::new(id);
    let base = [
        obj.add_vertex(DVec3::new(-w, -h, d)),
        obj.add_vertex(DVec3::new(w, -h, d)),
        obj.add_vertex(DVec3::new(w, -h, -d)),
        obj.add_vertex(DVec3::new(-w, -h, -d)),
    ];
    let apex = obj.add_vertex(DVec3::new(0.0, h, 0.0));

    for j in 0..4 {
        obj.add_triangle(apex, base[(j + 1) % 4], base[j])?;
    }
    obj.add_triangle(base[0], base[1], base[2])?;
    obj.add_triangle(base[0], base[2], base[3])?;

    let mut uv_of = BTreeMap::new();
    for (v, (u, t)) in base.iter().zip([(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)]) {
        uv_of.insert(*v, obj.add_uv(u, t));
    }
    uv_of.insert(apex, obj.add_uv(0.5, 0.5));
    obj.assign_vertex_uvs(&uv_of);
    Ok(obj)
}

/// Flat `2w x 2h` quad in the XY plane facing +Z.
///
/// # Errors
///
/// Never fails in practice.
pub fn quad(id: impl Into<ObjectId>, w: f64, h: f64) -> Result<Object, MeshError> {
    let mut obj = Object::new(id);
    let corners = [
        (obj.add_vertex(DVec3::new(-w, h, 0.0)), (0.0, 1.0)),
        (obj.add_vertex(DVec3::new(w, h, 0.0)), (1.0, 1.0)),
        (obj.add_vertex(DVec3::new(-w, -h, 0.0)), (0.0, 0.0)),
        (obj.add_vertex(DVec3::new(w, -h, 0.0)), (1.0, 0.0)),
    ];
    let [tl, tr, bl, br] = corners.map(|(v, _)| v);
    obj.add_triangle(tl, tr, bl)?;
    obj.add_triangle(tr, br, bl)?;

    let mut uv_of = BTreeMap::new();
    for (v, (u, t)) in corners {
        uv_of.insert(v, obj.add_uv(u, t));
    }
    obj.assign_vertex_uvs(&uv_of);
    Ok(obj)
}
