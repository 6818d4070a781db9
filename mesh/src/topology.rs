//! Topology edits: extrude, connect and merge.
//!
//! All three operate on one object and allocate fresh part ids in a fixed
//! order, so two peers running the same edit on the same starting mesh end
//! up with identical ids.

#[cfg(test)]
#[path = "topology_test.rs"]
mod topology_test;

use std::collections::{BTreeMap, BTreeSet, HashSet};

use glam::DVec3;

use crate::error::MeshError;
use crate::object::{EdgeRef, Object, PartId, PartKind};

/// New vertex ring produced by [`Object::extrude`].
#[derive(Debug, Clone, PartialEq)]
pub struct ExtrudeResult {
    /// Averaged world-space normal of the extruded faces.
    pub normal: DVec3,
    /// Copies of the original ring, in the order the originals were met.
    pub vertices: Vec<PartId>,
}

impl Object {
    /// Extrude a region of faces by `distance` along its averaged normal.
    ///
    /// The vertex ring of the region is duplicated and the selected faces are
    /// rebuilt on the copies. Every boundary edge of the region is stitched to
    /// its copy with two side triangles. Old edges left without faces are
    /// removed.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::UnknownPart`] if a face is missing and
    /// [`MeshError::Degenerate`] for an empty selection.
    pub fn extrude(&mut self, face_ids: &[PartId], distance: f64) -> Result<ExtrudeResult, MeshError> {
        let mut seen = BTreeSet::new();
        let faces: Vec<PartId> = face_ids.iter().copied().filter(|f| seen.insert(*f)).collect();
        if faces.is_empty() {
            return Err(MeshError::Degenerate("extrude needs at least one face"));
        }

        let mut corners = Vec::with_capacity(faces.len());
        let mut normal = DVec3::ZERO;
        for &f in &faces {
            corners.push((f, self.face_vertex_ids(f)?));
            normal += self.face_world_normal(f)?;
        }
        let normal = normal.normalize_or_zero();
        let offset = normal * distance;

        // Directed half-edges of the region; a half-edge whose twin is absent is on the boundary.
        let half_edges: HashSet<(PartId, PartId)> =
            corners.iter().flat_map(|(_, [a, b, c])| [(*a, *b), (*b, *c), (*c, *a)]).collect();

        let mut copy_of: BTreeMap<PartId, PartId> = BTreeMap::new();
        let mut ring = Vec::new();
        for (_, vs) in &corners {
            for &v in vs {
                if copy_of.contains_key(&v) {
                    continue;
                }
                let world = self.vertex_world(v).ok_or_else(|| self.unknown(PartKind::Vertex, v))?;
                let copy = self.add_vertex(self.to_local(world + offset));
                copy_of.insert(v, copy);
                ring.push(copy);
            }
        }

        let old_edges: BTreeSet<PartId> = faces
            .iter()
            .filter_map(|f| self.faces.get(f))
            .flat_map(|f| f.edges.iter().map(|r| r.id))
            .collect();

        let new_of = |v: &PartId| copy_of.get(v).copied().unwrap_or(*v);
        for (f, [a, b, c]) in &corners {
            let uvs = self.faces.remove(f).map(|face| face.uvs).unwrap_or_default();
            let cap = self.add_triangle(new_of(a), new_of(b), new_of(c))?;
            if let Some(face) = self.faces.get_mut(&cap) {
                face.uvs = uvs;
            }
        }

        for (_, [a, b, c]) in &corners {
            for (from, to) in [(*a, *b), (*b, *c), (*c, *a)] {
                if half_edges.contains(&(to, from)) {
                    continue;
                }
                let (from_copy, to_copy) = (new_of(&from), new_of(&to));
                self.add_triangle(from, to, to_copy)?;
                self.add_triangle(from, to_copy, from_copy)?;
            }
        }

        let in_use: HashSet<PartId> = self.faces.values().flat_map(|f| f.edges.iter().map(|r| r.id)).collect();
        self.edges.retain(|id, _| !old_edges.contains(id) || in_use.contains(id));

        // Vertices inside the region lose every edge once the interior edges go.
        let on_edge: HashSet<PartId> = self.edges.values().flat_map(|e| [e.v0, e.v1]).collect();
        self.verts.retain(|id, _| !copy_of.contains_key(id) || on_edge.contains(id));
        self.mark_dirty();

        Ok(ExtrudeResult { normal, vertices: ring })
    }

    /// Insert an edge between each consecutive pair of vertices that is not
    /// already connected. Returns the ids of the edges created.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::UnknownPart`] if any vertex is missing; nothing is
    /// created in that case.
    pub fn connect(&mut self, vertex_ids: &[PartId]) -> Result<Vec<PartId>, MeshError> {
        if let Some(&missing) = vertex_ids.iter().find(|v| !self.verts.contains_key(v)) {
            return Err(self.unknown(PartKind::Vertex, missing));
        }
        let mut created = Vec::new();
        for pair in vertex_ids.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            if a == b || self.find_edge(a, b).is_some() {
                continue;
            }
            created.push(self.add_edge(a, b)?);
        }
        Ok(created)
    }

    /// Collapse vertices onto their centroid, keeping the lowest id.
    ///
    /// Edges are re-pointed at the survivor. Edges that collapse to a point
    /// are dropped together with their faces. Edges that end up parallel to
    /// an older edge are folded into it and faces are re-pointed, flipping
    /// the reference when the two run in opposite directions. Faces that
    /// reference the same edge twice have collapsed and are dropped.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::Degenerate`] for an empty list and
    /// [`MeshError::UnknownPart`] if any vertex is missing.
    pub fn merge_vertices(&mut self, vertex_ids: &[PartId]) -> Result<PartId, MeshError> {
        let group: BTreeSet<PartId> = vertex_ids.iter().copied().collect();
        let Some(&keep) = group.first() else {
            return Err(MeshError::Degenerate("merge needs at least one vertex"));
        };
        let mut centroid = DVec3::ZERO;
        for &v in &group {
            let vertex = self.verts.get(&v).ok_or_else(|| self.unknown(PartKind::Vertex, v))?;
            centroid += vertex.position;
        }
        #[allow(clippy::cast_precision_loss)]
        let centroid = centroid / group.len() as f64;

        if let Some(v) = self.verts.get_mut(&keep) {
            v.position = centroid;
        }
        self.verts.retain(|id, _| *id == keep || !group.contains(id));

        for e in self.edges.values_mut() {
            if group.contains(&e.v0) {
                e.v0 = keep;
            }
            if group.contains(&e.v1) {
                e.v1 = keep;
            }
        }
        self.edges.retain(|_, e| e.v0 != e.v1);

        // Fold parallel edges into the lowest id joining the same pair.
        let mut owner: BTreeMap<(PartId, PartId), (PartId, PartId)> = BTreeMap::new();
        let mut folded: BTreeMap<PartId, EdgeRef> = BTreeMap::new();
        for e in self.edges.values() {
            let key = (e.v0.min(e.v1), e.v0.max(e.v1));
            match owner.get(&key) {
                Some(&(survivor, survivor_v0)) => {
                    let same_way = survivor_v0 == e.v0;
                    folded.insert(e.id, EdgeRef { id: survivor, forward: same_way });
                }
                None => {
                    owner.insert(key, (e.id, e.v0));
                }
            }
        }
        self.edges.retain(|id, _| !folded.contains_key(id));

        for face in self.faces.values_mut() {
            for r in &mut face.edges {
                if let Some(target) = folded.get(&r.id) {
                    *r = EdgeRef { id: target.id, forward: r.forward == target.forward };
                }
            }
        }
        self.drop_orphan_faces();
        self.faces.retain(|_, f| {
            let [a, b, c] = f.edges.map(|r| r.id);
            a != b && b != c && c != a
        });

        self.mark_dirty();
        Ok(keep)
    }
}
