//! Ray and frustum picking.
//!
//! DESIGN
//! ======
//! Every object reports its own hits in world space: vertices are spheres,
//! edges are thin segments, faces are triangles, and the object itself is hit
//! wherever its nearest face is. The scene flattens the per-object hits,
//! filters them against the current [`Mode`] and keeps the nearest one.
//!
//! Hits are collected in object id order, then vertex, edge, face and object
//! within an object, each by ascending id. The nearest-hit search keeps the
//! first of equally distant hits, so exact ties resolve in that order.

#[cfg(test)]
#[path = "pick_test.rs"]
mod pick_test;

use glam::DVec3;

use crate::consts::{EDGE_PICK_RADIUS, VERTEX_PICK_RADIUS};
use crate::editable::{Editable, EditableGroup};
use crate::geom::{self, Ray};
use crate::mode::Mode;
use crate::object::{Object, PartId, PartKind, UvPoint};
use crate::scene::Scene;

/// One ray hit: what was hit, where, and how far from the ray origin.
#[derive(Debug, Clone, PartialEq)]
pub struct Hit {
    pub item: Editable,
    pub point: DVec3,
    pub distance: f64,
}

/// Plane `normal · p + d = 0`; the positive side is inside.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    pub normal: DVec3,
    pub d: f64,
}

impl Plane {
    #[must_use]
    pub fn from_point_normal(point: DVec3, normal: DVec3) -> Self {
        Self { normal, d: -normal.dot(point) }
    }

    #[must_use]
    pub fn signed_distance(&self, p: DVec3) -> f64 {
        self.normal.dot(p) + self.d
    }
}

/// Convex volume bounded by inward-facing planes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Frustum {
    pub planes: Vec<Plane>,
}

impl Frustum {
    #[must_use]
    pub fn new(planes: Vec<Plane>) -> Self {
        Self { planes }
    }

    /// Side planes of the volume swept by four corner rays, given in order
    /// around the selection rectangle. Works for perspective rays sharing an
    /// origin and for parallel orthographic rays.
    #[must_use]
    pub fn from_corner_rays(corners: &[Ray; 4]) -> Self {
        let center = corners.iter().map(|r| r.origin + r.dir).sum::<DVec3>() / 4.0;
        let planes = (0..4)
            .map(|i| {
                let a = &corners[i];
                let b = &corners[(i + 1) % 4];
                let mut normal = a.dir.cross(b.origin + b.dir - a.origin).normalize_or_zero();
                if normal.dot(center - a.origin) < 0.0 {
                    normal = -normal;
                }
                Plane::from_point_normal(a.origin, normal)
            })
            .collect();
        Self { planes }
    }

    #[must_use]
    pub fn contains(&self, p: DVec3) -> bool {
        self.planes.iter().all(|plane| plane.signed_distance(p) >= 0.0)
    }
}

// =============================================================================
// OBJECT
// =============================================================================

impl Object {
    /// Every vertex, edge, face and object hit along `ray`, unsorted.
    #[must_use]
    pub fn pick_ray(&self, ray: &Ray) -> Vec<Hit> {
        let mut hits = Vec::new();
        let part = |kind, id, point: DVec3| Hit {
            item: Editable::part(self.id.clone(), kind, id),
            point,
            distance: point.distance(ray.origin),
        };

        for v in self.verts.values() {
            let p = self.to_world(v.position);
            if (p - ray.origin).dot(ray.dir) >= 0.0 && geom::intersect_sphere(ray, p, VERTEX_PICK_RADIUS) {
                hits.push(part(PartKind::Vertex, v.id, p));
            }
        }

        for e in self.edges.values() {
            let (Some(a), Some(b)) = (self.vertex_world(e.v0), self.vertex_world(e.v1)) else {
                continue;
            };
            if let Some((p, off)) = geom::closest_on_segment(ray, a, b) {
                if off <= EDGE_PICK_RADIUS {
                    hits.push(part(PartKind::Edge, e.id, p));
                }
            }
        }

        let mut nearest: Option<Hit> = None;
        for &f in self.faces.keys() {
            let Ok([a, b, c]) = self.face_world_positions(f) else {
                continue;
            };
            if let Some(tri) = geom::intersect_triangle(ray, a, b, c) {
                let hit = part(PartKind::Face, f, tri.point);
                if nearest.as_ref().is_none_or(|n| hit.distance < n.distance) {
                    nearest = Some(hit.clone());
                }
                hits.push(hit);
            }
        }

        if let Some(n) = nearest {
            hits.push(Hit { item: Editable::Object(self.id.clone()), ..n });
        }
        hits
    }

    /// Parts and the object itself that lie inside `frustum`.
    ///
    /// Edges need both endpoints inside, faces all three corners, and the
    /// object any one vertex.
    #[must_use]
    pub fn pick_frustum(&self, frustum: &Frustum) -> Vec<Editable> {
        let inside: std::collections::BTreeSet<PartId> = self
            .verts
            .values()
            .filter(|v| frustum.contains(self.to_world(v.position)))
            .map(|v| v.id)
            .collect();

        let mut out: Vec<Editable> = inside
            .iter()
            .map(|&v| Editable::part(self.id.clone(), PartKind::Vertex, v))
            .collect();
        out.extend(
            self.edges
                .values()
                .filter(|e| inside.contains(&e.v0) && inside.contains(&e.v1))
                .map(|e| Editable::part(self.id.clone(), PartKind::Edge, e.id)),
        );
        out.extend(
            self.faces
                .keys()
                .filter(|&&f| self.corners(f).is_some_and(|vs| vs.iter().all(|v| inside.contains(v))))
                .map(|&f| Editable::part(self.id.clone(), PartKind::Face, f)),
        );
        if !inside.is_empty() {
            out.push(Editable::Object(self.id.clone()));
        }
        out
    }

    /// Texture coordinate under `ray` on `face`, interpolated from the
    /// face's UV points. `(0, 0)` when the face has no UVs or the ray is
    /// parallel to it.
    #[must_use]
    pub fn pick_uv(&self, face: PartId, ray: &Ray) -> UvPoint {
        let origin = UvPoint { u: 0.0, v: 0.0 };
        let Some(f) = self.faces.get(&face) else {
            return origin;
        };
        let Some([uv0, uv1, uv2]) = uv_triple(self, f.uvs) else {
            return origin;
        };
        let Ok([a, b, c]) = self.face_world_positions(face) else {
            return origin;
        };
        match geom::intersect_triangle_bary(ray, a, b, c) {
            Some(w) => UvPoint {
                u: w.alpha * uv0.u + w.beta * uv1.u + w.gamma * uv2.u,
                v: w.alpha * uv0.v + w.beta * uv1.v + w.gamma * uv2.v,
            },
            None => origin,
        }
    }
}

fn uv_triple(obj: &Object, ids: [Option<PartId>; 3]) -> Option<[UvPoint; 3]> {
    let get = |slot: Option<PartId>| slot.and_then(|id| obj.uv(id)).copied();
    Some([get(ids[0])?, get(ids[1])?, get(ids[2])?])
}

// =============================================================================
// SCENE
// =============================================================================

fn admits(mode: &Mode, item: &Editable) -> bool {
    match item {
        Editable::Object(_) => mode.object,
        Editable::Part { kind, .. } => mode.allows(*kind),
        Editable::ObjectGroup(_) | Editable::PartsGroup(_) => false,
    }
}

impl Scene {
    /// Nearest hit along `ray` that `mode` admits.
    #[must_use]
    pub fn pick_ray(&self, ray: &Ray, mode: &Mode) -> Option<Editable> {
        self.objects()
            .flat_map(|o| o.pick_ray(ray))
            .filter(|h| admits(mode, &h.item))
            .min_by(|a, b| a.distance.total_cmp(&b.distance))
            .map(|h| h.item)
    }

    /// Everything inside `frustum` that `mode` admits, grouped.
    ///
    /// In part mode with a selection owned by one object, only that object's
    /// parts are considered.
    #[must_use]
    pub fn pick_frustum(&self, frustum: &Frustum, selected: Option<&Editable>, mode: &Mode) -> Option<Editable> {
        let parts = !mode.object;
        let owner = if parts { selected.and_then(Editable::get_object) } else { None };

        let members: Vec<Editable> = self
            .objects()
            .filter(|o| owner.is_none_or(|id| *id == o.id))
            .flat_map(|o| o.pick_frustum(frustum))
            .filter(|item| admits(mode, item))
            .collect();
        if members.is_empty() {
            return None;
        }

        let group = EditableGroup::from_members(members);
        Some(if parts { Editable::PartsGroup(group) } else { Editable::ObjectGroup(group) })
    }
}
