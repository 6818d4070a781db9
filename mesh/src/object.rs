//! Winged mesh objects: vertices, edges and faces stored by id.
//!
//! DESIGN
//! ======
//! An `Object` owns four id-keyed maps (vertices, edges, faces, UV points)
//! and a transform. Edges name their endpoint vertices; faces name three
//! edges through signed references whose sign picks the traversal direction,
//! so a face's vertex triple is derived rather than stored. Nothing points
//! back at its owner: callers reach parts through the object, and objects
//! through the `Scene` arena.
//!
//! The model matrix `T · S · R` is cached together with its inverse and is
//! recomputed lazily after any transform change.
//!
//! Deletion cascades in two phases: edges that lost an endpoint go first,
//! then faces are re-checked against the surviving edges.

#[cfg(test)]
#[path = "object_test.rs"]
mod object_test;

use std::cell::Cell;
use std::collections::BTreeMap;

use glam::{DMat4, DQuat, DVec3};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::MeshError;
use crate::geom;
use crate::ids::IdAllocator;

/// Id of a vertex, edge, face or UV point, unique within its map.
pub type PartId = u32;

/// Scene-wide object id, `obj_{seq}_{n}`.
pub type ObjectId = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PartKind {
    Vertex,
    Edge,
    Face,
}

// =============================================================================
// PARTS
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct Vertex {
    pub id: PartId,
    /// Position in object-local space.
    pub position: DVec3,
    pub hover: bool,
    pub selected: bool,
}

/// Undirected edge between two vertices, with optional UV endpoints.
#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    pub id: PartId,
    pub v0: PartId,
    pub v1: PartId,
    pub uv0: Option<PartId>,
    pub uv1: Option<PartId>,
    pub hover: bool,
    pub selected: bool,
}

impl Edge {
    /// Vertex an edge reference starts from.
    #[must_use]
    pub fn start(&self, forward: bool) -> PartId {
        if forward { self.v0 } else { self.v1 }
    }

    /// Vertex an edge reference ends at.
    #[must_use]
    pub fn end(&self, forward: bool) -> PartId {
        if forward { self.v1 } else { self.v0 }
    }

    #[must_use]
    pub fn touches(&self, vertex: PartId) -> bool {
        self.v0 == vertex || self.v1 == vertex
    }
}

/// Signed reference from a face to an edge. On the wire `+id` walks the
/// edge `v0 -> v1` and `-id` walks it `v1 -> v0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct EdgeRef {
    pub id: PartId,
    pub forward: bool,
}

impl EdgeRef {
    #[must_use]
    pub fn forward(id: PartId) -> Self {
        Self { id, forward: true }
    }

    #[must_use]
    pub fn reversed(id: PartId) -> Self {
        Self { id, forward: false }
    }

    #[must_use]
    pub fn flipped(self) -> Self {
        Self { id: self.id, forward: !self.forward }
    }

    #[must_use]
    pub fn signed(self) -> i64 {
        let id = i64::from(self.id);
        if self.forward { id } else { -id }
    }
}

impl TryFrom<i64> for EdgeRef {
    type Error = MeshError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        let id = PartId::try_from(value.unsigned_abs()).map_err(|_| MeshError::InvalidEdgeRef(value))?;
        if id == 0 {
            return Err(MeshError::InvalidEdgeRef(value));
        }
        Ok(Self { id, forward: value > 0 })
    }
}

impl From<EdgeRef> for i64 {
    fn from(r: EdgeRef) -> Self {
        r.signed()
    }
}

/// Triangle made of three signed edge references.
#[derive(Debug, Clone, PartialEq)]
pub struct Face {
    pub id: PartId,
    pub edges: [EdgeRef; 3],
    pub uvs: [Option<PartId>; 3],
    pub hover: bool,
    pub selected: bool,
}

impl Face {
    #[must_use]
    pub fn uses_edge(&self, edge: PartId) -> bool {
        self.edges.iter().any(|r| r.id == edge)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UvPoint {
    pub u: f64,
    pub v: f64,
}

/// Parts removed by a delete, in the order they were removed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cascade {
    pub vertices: Vec<PartId>,
    pub edges: Vec<PartId>,
    pub faces: Vec<PartId>,
}

// =============================================================================
// OBJECT
// =============================================================================

#[derive(Debug, Clone, Copy)]
struct ModelCache {
    model: DMat4,
    inverse: DMat4,
}

#[derive(Debug, Clone)]
pub struct Object {
    pub id: ObjectId,
    pub(crate) verts: BTreeMap<PartId, Vertex>,
    pub(crate) edges: BTreeMap<PartId, Edge>,
    pub(crate) faces: BTreeMap<PartId, Face>,
    pub(crate) uvs: BTreeMap<PartId, UvPoint>,

    translate: DVec3,
    scale: DVec3,
    rotation: DQuat,

    /// Texture painted onto this object, if any.
    pub texture: Option<String>,
    pub hover: bool,
    pub selected: bool,

    vert_ids: IdAllocator,
    edge_ids: IdAllocator,
    face_ids: IdAllocator,
    uv_ids: IdAllocator,

    model: Cell<Option<ModelCache>>,
    dirty_mesh: bool,
}

impl Object {
    #[must_use]
    pub fn new(id: impl Into<ObjectId>) -> Self {
        Self {
            id: id.into(),
            verts: BTreeMap::new(),
            edges: BTreeMap::new(),
            faces: BTreeMap::new(),
            uvs: BTreeMap::new(),
            translate: DVec3::ZERO,
            scale: DVec3::ONE,
            rotation: DQuat::IDENTITY,
            texture: None,
            hover: false,
            selected: false,
            vert_ids: IdAllocator::starting_at(1),
            edge_ids: IdAllocator::starting_at(1),
            face_ids: IdAllocator::starting_at(1),
            uv_ids: IdAllocator::starting_at(1),
            model: Cell::new(None),
            dirty_mesh: true,
        }
    }

    // -------------------------------------------------------------------------
    // Lookup
    // -------------------------------------------------------------------------

    #[must_use]
    pub fn vertex(&self, id: PartId) -> Option<&Vertex> {
        self.verts.get(&id)
    }

    #[must_use]
    pub fn edge(&self, id: PartId) -> Option<&Edge> {
        self.edges.get(&id)
    }

    #[must_use]
    pub fn face(&self, id: PartId) -> Option<&Face> {
        self.faces.get(&id)
    }

    #[must_use]
    pub fn uv(&self, id: PartId) -> Option<&UvPoint> {
        self.uvs.get(&id)
    }

    pub fn vertices(&self) -> impl Iterator<Item = &Vertex> {
        self.verts.values()
    }

    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.values()
    }

    pub fn faces(&self) -> impl Iterator<Item = &Face> {
        self.faces.values()
    }

    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.verts.len()
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    #[must_use]
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    #[must_use]
    pub fn has_part(&self, kind: PartKind, id: PartId) -> bool {
        match kind {
            PartKind::Vertex => self.verts.contains_key(&id),
            PartKind::Edge => self.edges.contains_key(&id),
            PartKind::Face => self.faces.contains_key(&id),
        }
    }

    pub(crate) fn unknown(&self, kind: PartKind, id: PartId) -> MeshError {
        MeshError::UnknownPart { object: self.id.clone(), kind, id }
    }

    // -------------------------------------------------------------------------
    // Transform
    // -------------------------------------------------------------------------

    /// World-space position of the object origin.
    #[must_use]
    pub fn position(&self) -> DVec3 {
        self.translate
    }

    #[must_use]
    pub fn scale_factors(&self) -> DVec3 {
        self.scale
    }

    #[must_use]
    pub fn rotation(&self) -> DQuat {
        self.rotation
    }

    pub fn translate(&mut self, delta: DVec3) {
        self.translate += delta;
        self.model.set(None);
    }

    pub fn scale(&mut self, factors: DVec3) {
        self.scale *= factors;
        self.model.set(None);
    }

    pub fn rotate(&mut self, q: DQuat) {
        self.rotation = (q * self.rotation).normalize();
        self.model.set(None);
    }

    pub fn set_transform(&mut self, translate: DVec3, scale: DVec3, rotation: DQuat) {
        self.translate = translate;
        self.scale = scale;
        self.rotation = rotation;
        self.model.set(None);
    }

    fn model_cache(&self) -> ModelCache {
        if let Some(cache) = self.model.get() {
            return cache;
        }
        let model = DMat4::from_translation(self.translate)
            * DMat4::from_scale(self.scale)
            * DMat4::from_quat(self.rotation);
        let cache = ModelCache { model, inverse: model.inverse() };
        self.model.set(Some(cache));
        cache
    }

    #[must_use]
    pub fn model(&self) -> DMat4 {
        self.model_cache().model
    }

    #[must_use]
    pub fn inverse_model(&self) -> DMat4 {
        self.model_cache().inverse
    }

    #[must_use]
    pub fn to_world(&self, local: DVec3) -> DVec3 {
        self.model().transform_point3(local)
    }

    #[must_use]
    pub fn to_local(&self, world: DVec3) -> DVec3 {
        self.inverse_model().transform_point3(world)
    }

    /// Whether the geometry changed since the last call; clears the flag.
    pub fn take_dirty_mesh(&mut self) -> bool {
        std::mem::replace(&mut self.dirty_mesh, false)
    }

    #[must_use]
    pub fn is_dirty_mesh(&self) -> bool {
        self.dirty_mesh
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty_mesh = true;
    }

    // -------------------------------------------------------------------------
    // Construction
    // -------------------------------------------------------------------------

    pub fn add_vertex(&mut self, position: DVec3) -> PartId {
        let id = self.vert_ids.allocate();
        self.verts.insert(id, Vertex { id, position, hover: false, selected: false });
        self.dirty_mesh = true;
        id
    }

    pub fn add_uv(&mut self, u: f64, v: f64) -> PartId {
        let id = self.uv_ids.allocate();
        self.uvs.insert(id, UvPoint { u, v });
        id
    }

    /// # Errors
    ///
    /// Returns [`MeshError::UnknownPart`] if either endpoint is missing.
    pub fn add_edge(&mut self, v0: PartId, v1: PartId) -> Result<PartId, MeshError> {
        for v in [v0, v1] {
            if !self.verts.contains_key(&v) {
                return Err(self.unknown(PartKind::Vertex, v));
            }
        }
        let id = self.edge_ids.allocate();
        self.edges.insert(id, Edge { id, v0, v1, uv0: None, uv1: None, hover: false, selected: false });
        self.dirty_mesh = true;
        Ok(id)
    }

    /// # Errors
    ///
    /// Returns [`MeshError::UnknownPart`] if any referenced edge is missing.
    pub fn add_face(&mut self, edges: [EdgeRef; 3]) -> Result<PartId, MeshError> {
        for r in edges {
            if !self.edges.contains_key(&r.id) {
                return Err(self.unknown(PartKind::Edge, r.id));
            }
        }
        let id = self.face_ids.allocate();
        self.faces.insert(id, Face { id, edges, uvs: [None; 3], hover: false, selected: false });
        self.dirty_mesh = true;
        Ok(id)
    }

    /// Existing edge between `a` and `b`, oriented to walk `a -> b`.
    #[must_use]
    pub fn find_edge(&self, a: PartId, b: PartId) -> Option<EdgeRef> {
        self.edges.values().find_map(|e| {
            if e.v0 == a && e.v1 == b {
                Some(EdgeRef::forward(e.id))
            } else if e.v0 == b && e.v1 == a {
                Some(EdgeRef::reversed(e.id))
            } else {
                None
            }
        })
    }

    /// Edge walking `a -> b`, created if the vertices are not yet connected.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::UnknownPart`] if either vertex is missing.
    pub fn link(&mut self, a: PartId, b: PartId) -> Result<EdgeRef, MeshError> {
        if let Some(r) = self.find_edge(a, b) {
            return Ok(r);
        }
        Ok(EdgeRef::forward(self.add_edge(a, b)?))
    }

    /// Add the triangle `a -> b -> c`, reusing existing edges.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::Degenerate`] if two corners coincide and
    /// [`MeshError::UnknownPart`] if a vertex is missing.
    pub fn add_triangle(&mut self, a: PartId, b: PartId, c: PartId) -> Result<PartId, MeshError> {
        if a == b || b == c || c == a {
            return Err(MeshError::Degenerate("triangle repeats a vertex"));
        }
        let edges = [self.link(a, b)?, self.link(b, c)?, self.link(c, a)?];
        self.add_face(edges)
    }

    /// Attach UV points to faces and edges from a per-vertex mapping.
    pub fn assign_vertex_uvs(&mut self, uv_of: &BTreeMap<PartId, PartId>) {
        let corners: Vec<(PartId, [PartId; 3])> = self
            .faces
            .keys()
            .filter_map(|&f| self.corners(f).map(|vs| (f, vs)))
            .collect();
        for (f, vs) in corners {
            if let Some(face) = self.faces.get_mut(&f) {
                face.uvs = vs.map(|v| uv_of.get(&v).copied());
            }
        }
        for edge in self.edges.values_mut() {
            edge.uv0 = uv_of.get(&edge.v0).copied();
            edge.uv1 = uv_of.get(&edge.v1).copied();
        }
    }

    // -------------------------------------------------------------------------
    // Derived geometry
    // -------------------------------------------------------------------------

    /// Vertex ids of a face in traversal order.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::UnknownPart`] for a missing face and
    /// [`MeshError::DanglingReference`] if an edge it names is gone.
    pub fn face_vertex_ids(&self, face: PartId) -> Result<[PartId; 3], MeshError> {
        let f = self.faces.get(&face).ok_or_else(|| self.unknown(PartKind::Face, face))?;
        let mut out = [0; 3];
        for (slot, r) in out.iter_mut().zip(f.edges) {
            let edge = self.edges.get(&r.id).ok_or(MeshError::DanglingReference {
                kind: PartKind::Face,
                id: face,
                missing: PartKind::Edge,
                missing_id: r.id,
            })?;
            *slot = edge.start(r.forward);
        }
        Ok(out)
    }

    /// Vertex ids of a face, or `None` if the face or one of its edges is missing.
    pub(crate) fn corners(&self, face: PartId) -> Option<[PartId; 3]> {
        let f = self.faces.get(&face)?;
        let mut out = [0; 3];
        for (slot, r) in out.iter_mut().zip(f.edges) {
            *slot = self.edges.get(&r.id)?.start(r.forward);
        }
        Some(out)
    }

    fn local_position(&self, vertex: PartId) -> Result<DVec3, MeshError> {
        self.verts
            .get(&vertex)
            .map(|v| v.position)
            .ok_or_else(|| self.unknown(PartKind::Vertex, vertex))
    }

    /// # Errors
    ///
    /// Propagates [`Object::face_vertex_ids`] failures.
    pub fn face_local_positions(&self, face: PartId) -> Result<[DVec3; 3], MeshError> {
        let [a, b, c] = self.face_vertex_ids(face)?;
        Ok([self.local_position(a)?, self.local_position(b)?, self.local_position(c)?])
    }

    /// # Errors
    ///
    /// Propagates [`Object::face_vertex_ids`] failures.
    pub fn face_world_positions(&self, face: PartId) -> Result<[DVec3; 3], MeshError> {
        let model = self.model();
        Ok(self.face_local_positions(face)?.map(|p| model.transform_point3(p)))
    }

    /// Outward unit normal in object space, `(c - a) x (b - a)`.
    ///
    /// # Errors
    ///
    /// Propagates [`Object::face_vertex_ids`] failures.
    pub fn face_normal(&self, face: PartId) -> Result<DVec3, MeshError> {
        let [a, b, c] = self.face_local_positions(face)?;
        Ok((c - a).cross(b - a).normalize_or_zero())
    }

    /// Outward unit normal in world space.
    ///
    /// # Errors
    ///
    /// Propagates [`Object::face_vertex_ids`] failures.
    pub fn face_world_normal(&self, face: PartId) -> Result<DVec3, MeshError> {
        let [a, b, c] = self.face_world_positions(face)?;
        Ok((c - a).cross(b - a).normalize_or_zero())
    }

    #[must_use]
    pub fn vertex_world(&self, vertex: PartId) -> Option<DVec3> {
        self.verts.get(&vertex).map(|v| self.to_world(v.position))
    }

    /// World-space position of a part: vertex position, edge midpoint or face centroid.
    #[must_use]
    pub fn part_position(&self, kind: PartKind, id: PartId) -> Option<DVec3> {
        match kind {
            PartKind::Vertex => self.vertex_world(id),
            PartKind::Edge => {
                let e = self.edges.get(&id)?;
                let a = self.verts.get(&e.v0)?.position;
                let b = self.verts.get(&e.v1)?.position;
                Some(self.to_world((a + b) * 0.5))
            }
            PartKind::Face => {
                let [a, b, c] = self.corners(id)?;
                let p = |v: PartId| self.verts.get(&v).map(|v| v.position);
                Some(self.to_world(geom::get_centroid(p(a)?, p(b)?, p(c)?)))
            }
        }
    }

    /// Vertex ids a part is made of.
    #[must_use]
    pub fn part_vertex_ids(&self, kind: PartKind, id: PartId) -> Vec<PartId> {
        match kind {
            PartKind::Vertex if self.verts.contains_key(&id) => vec![id],
            PartKind::Edge => self.edges.get(&id).map(|e| vec![e.v0, e.v1]).unwrap_or_default(),
            PartKind::Face => self.corners(id).map(|vs| vs.to_vec()).unwrap_or_default(),
            PartKind::Vertex => Vec::new(),
        }
    }

    /// Faces whose edges do not chain into a closed loop.
    #[must_use]
    pub fn open_faces(&self) -> Vec<PartId> {
        self.faces
            .values()
            .filter(|f| {
                let ends: Option<Vec<(PartId, PartId)>> = f
                    .edges
                    .iter()
                    .map(|r| self.edges.get(&r.id).map(|e| (e.start(r.forward), e.end(r.forward))))
                    .collect();
                let Some(ends) = ends else {
                    return true;
                };
                (0..3).any(|i| ends[i].1 != ends[(i + 1) % 3].0)
            })
            .map(|f| f.id)
            .collect()
    }

    // -------------------------------------------------------------------------
    // Part mutation
    // -------------------------------------------------------------------------

    /// Move a vertex by a world-space delta, independent of the object's rotation and scale.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::UnknownPart`] if the vertex is missing.
    pub fn translate_vertex(&mut self, vertex: PartId, delta: DVec3) -> Result<(), MeshError> {
        let world = self.vertex_world(vertex).ok_or_else(|| self.unknown(PartKind::Vertex, vertex))?;
        self.set_vertex_world(vertex, world + delta)
    }

    /// # Errors
    ///
    /// Returns [`MeshError::UnknownPart`] if the vertex is missing.
    pub fn set_vertex_world(&mut self, vertex: PartId, world: DVec3) -> Result<(), MeshError> {
        let local = self.to_local(world);
        let v = self.verts.get_mut(&vertex).ok_or_else(|| MeshError::UnknownPart {
            object: self.id.clone(),
            kind: PartKind::Vertex,
            id: vertex,
        })?;
        v.position = local;
        self.dirty_mesh = true;
        Ok(())
    }

    /// Set hover on a part; returns whether the part exists.
    pub fn set_part_hover(&mut self, kind: PartKind, id: PartId, hover: bool) -> bool {
        match kind {
            PartKind::Vertex => self.verts.get_mut(&id).map(|v| v.hover = hover).is_some(),
            PartKind::Edge => self.edges.get_mut(&id).map(|e| e.hover = hover).is_some(),
            PartKind::Face => self.faces.get_mut(&id).map(|f| f.hover = hover).is_some(),
        }
    }

    /// Set selected on a part; returns whether the part exists.
    pub fn set_part_selected(&mut self, kind: PartKind, id: PartId, selected: bool) -> bool {
        match kind {
            PartKind::Vertex => self.verts.get_mut(&id).map(|v| v.selected = selected).is_some(),
            PartKind::Edge => self.edges.get_mut(&id).map(|e| e.selected = selected).is_some(),
            PartKind::Face => self.faces.get_mut(&id).map(|f| f.selected = selected).is_some(),
        }
    }

    // -------------------------------------------------------------------------
    // Delete
    // -------------------------------------------------------------------------

    /// Delete a vertex, then every edge that lost an endpoint, then every
    /// face that lost an edge.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::UnknownPart`] if the vertex is missing.
    pub fn delete_vertex(&mut self, vertex: PartId) -> Result<Cascade, MeshError> {
        if self.verts.remove(&vertex).is_none() {
            return Err(self.unknown(PartKind::Vertex, vertex));
        }
        let mut cascade = Cascade { vertices: vec![vertex], ..Cascade::default() };
        let verts = &self.verts;
        self.edges.retain(|&id, e| {
            let keep = verts.contains_key(&e.v0) && verts.contains_key(&e.v1);
            if !keep {
                cascade.edges.push(id);
            }
            keep
        });
        cascade.faces = self.drop_orphan_faces();
        self.dirty_mesh = true;
        Ok(cascade)
    }

    /// Delete an edge and every face that used it.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::UnknownPart`] if the edge is missing.
    pub fn delete_edge(&mut self, edge: PartId) -> Result<Cascade, MeshError> {
        if self.edges.remove(&edge).is_none() {
            return Err(self.unknown(PartKind::Edge, edge));
        }
        let faces = self.drop_orphan_faces();
        self.dirty_mesh = true;
        Ok(Cascade { vertices: Vec::new(), edges: vec![edge], faces })
    }

    /// # Errors
    ///
    /// Returns [`MeshError::UnknownPart`] if the face is missing.
    pub fn delete_face(&mut self, face: PartId) -> Result<Cascade, MeshError> {
        if self.faces.remove(&face).is_none() {
            return Err(self.unknown(PartKind::Face, face));
        }
        self.dirty_mesh = true;
        Ok(Cascade { faces: vec![face], ..Cascade::default() })
    }

    /// Remove faces naming an edge that no longer exists; returns their ids.
    pub(crate) fn drop_orphan_faces(&mut self) -> Vec<PartId> {
        let edges = &self.edges;
        let mut dropped = Vec::new();
        self.faces.retain(|&id, f| {
            let keep = f.edges.iter().all(|r| edges.contains_key(&r.id));
            if !keep {
                dropped.push(id);
            }
            keep
        });
        dropped
    }

    // -------------------------------------------------------------------------
    // Serialization
    // -------------------------------------------------------------------------

    #[must_use]
    pub fn to_data(&self) -> ObjectData {
        ObjectData {
            id: self.id.clone(),
            tx: self.translate.x,
            ty: self.translate.y,
            tz: self.translate.z,
            sx: self.scale.x,
            sy: self.scale.y,
            sz: self.scale.z,
            rx: self.rotation.x,
            ry: self.rotation.y,
            rz: self.rotation.z,
            rw: self.rotation.w,
            texture: self.texture.clone(),
            verts: self
                .verts
                .values()
                .map(|v| (v.id, VertexData { x: v.position.x, y: v.position.y, z: v.position.z }))
                .collect(),
            uvs: self.uvs.clone(),
            edges: self
                .edges
                .values()
                .map(|e| (e.id, EdgeData { v0: e.v0, v1: e.v1, uv0: e.uv0, uv1: e.uv1 }))
                .collect(),
            faces: self
                .faces
                .values()
                .map(|f| {
                    let [e0, e1, e2] = f.edges;
                    let [uv0, uv1, uv2] = f.uvs;
                    (f.id, FaceData { e0, e1, e2, uv0, uv1, uv2 })
                })
                .collect(),
        }
    }

    /// Rebuild an object from a snapshot. Vertices load before the edges that
    /// name them, and edges before faces.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::DanglingReference`] when an edge names a missing
    /// vertex or a face names a missing edge.
    pub fn from_data(data: &ObjectData) -> Result<Self, MeshError> {
        let mut obj = Self::new(data.id.clone());
        obj.set_transform(
            DVec3::new(data.tx, data.ty, data.tz),
            DVec3::new(data.sx, data.sy, data.sz),
            DQuat::from_xyzw(data.rx, data.ry, data.rz, data.rw).normalize(),
        );
        obj.texture.clone_from(&data.texture);

        for (&id, v) in &data.verts {
            obj.vert_ids.observe(id);
            obj.verts.insert(id, Vertex { id, position: DVec3::new(v.x, v.y, v.z), hover: false, selected: false });
        }
        for (&id, uv) in &data.uvs {
            obj.uv_ids.observe(id);
            obj.uvs.insert(id, *uv);
        }
        for (&id, e) in &data.edges {
            for v in [e.v0, e.v1] {
                if !obj.verts.contains_key(&v) {
                    return Err(MeshError::DanglingReference {
                        kind: PartKind::Edge,
                        id,
                        missing: PartKind::Vertex,
                        missing_id: v,
                    });
                }
            }
            obj.edge_ids.observe(id);
            let edge = Edge {
                id,
                v0: e.v0,
                v1: e.v1,
                uv0: obj.known_uv(e.uv0),
                uv1: obj.known_uv(e.uv1),
                hover: false,
                selected: false,
            };
            obj.edges.insert(id, edge);
        }
        for (&id, f) in &data.faces {
            let edges = [f.e0, f.e1, f.e2];
            if let Some(missing) = edges.iter().find(|r| !obj.edges.contains_key(&r.id)) {
                return Err(MeshError::DanglingReference {
                    kind: PartKind::Face,
                    id,
                    missing: PartKind::Edge,
                    missing_id: missing.id,
                });
            }
            obj.face_ids.observe(id);
            let uvs = [obj.known_uv(f.uv0), obj.known_uv(f.uv1), obj.known_uv(f.uv2)];
            obj.faces.insert(id, Face { id, edges, uvs, hover: false, selected: false });
        }
        Ok(obj)
    }

    fn known_uv(&self, uv: Option<PartId>) -> Option<PartId> {
        let id = uv?;
        if self.uvs.contains_key(&id) {
            Some(id)
        } else {
            warn!(object = %self.id, uv = id, "mesh: dropping reference to unknown uv point");
            None
        }
    }

    /// # Errors
    ///
    /// Never fails for well-formed objects; serialization errors are surfaced as [`MeshError::Snapshot`].
    pub fn to_json(&self) -> Result<serde_json::Value, MeshError> {
        Ok(serde_json::to_value(self.to_data())?)
    }

    /// # Errors
    ///
    /// Returns [`MeshError::Snapshot`] for malformed JSON and
    /// [`MeshError::DanglingReference`] for inconsistent topology.
    pub fn from_json(value: &serde_json::Value) -> Result<Self, MeshError> {
        let data: ObjectData = serde_json::from_value(value.clone())?;
        Self::from_data(&data)
    }
}

// =============================================================================
// SNAPSHOT TYPES
// =============================================================================

fn one() -> f64 {
    1.0
}

/// Persisted form of an object: transform components plus part maps keyed by id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectData {
    pub id: ObjectId,
    #[serde(default)]
    pub tx: f64,
    #[serde(default)]
    pub ty: f64,
    #[serde(default)]
    pub tz: f64,
    #[serde(default = "one")]
    pub sx: f64,
    #[serde(default = "one")]
    pub sy: f64,
    #[serde(default = "one")]
    pub sz: f64,
    #[serde(default)]
    pub rx: f64,
    #[serde(default)]
    pub ry: f64,
    #[serde(default)]
    pub rz: f64,
    #[serde(default = "one")]
    pub rw: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub texture: Option<String>,
    #[serde(default)]
    pub verts: BTreeMap<PartId, VertexData>,
    #[serde(default)]
    pub uvs: BTreeMap<PartId, UvPoint>,
    #[serde(default)]
    pub edges: BTreeMap<PartId, EdgeData>,
    #[serde(default)]
    pub faces: BTreeMap<PartId, FaceData>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VertexData {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeData {
    pub v0: PartId,
    pub v1: PartId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uv0: Option<PartId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uv1: Option<PartId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaceData {
    pub e0: EdgeRef,
    pub e1: EdgeRef,
    pub e2: EdgeRef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uv0: Option<PartId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uv1: Option<PartId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uv2: Option<PartId>,
}
