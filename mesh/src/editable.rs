//! Editables: the things picking returns and rigs transform.
//!
//! DESIGN
//! ======
//! An `Editable` names what it refers to by id (object id, plus part kind
//! and id for parts) and resolves everything through the `Scene` passed in.
//! Groups hold leaf editables only; adding a group to a group merges its
//! members. Transform operations delegate to the scene's shared edit kernels
//! so local edits and remote application run the same arithmetic.
//!
//! ERROR HANDLING
//! ==============
//! A member whose object or part has disappeared (for example deleted by a
//! remote peer) is skipped. Positions average over the members that still
//! resolve.

#[cfg(test)]
#[path = "editable_test.rs"]
mod editable_test;

use std::collections::BTreeSet;

use glam::{DQuat, DVec3};

use crate::object::{Object, ObjectId, PartId, PartKind};
use crate::scene::Scene;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EditableKind {
    Vertex,
    Edge,
    Face,
    Object,
    ObjectGroup,
    PartsGroup,
}

impl From<PartKind> for EditableKind {
    fn from(kind: PartKind) -> Self {
        match kind {
            PartKind::Vertex => Self::Vertex,
            PartKind::Edge => Self::Edge,
            PartKind::Face => Self::Face,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Editable {
    Part { object: ObjectId, kind: PartKind, id: PartId },
    Object(ObjectId),
    ObjectGroup(EditableGroup),
    PartsGroup(EditableGroup),
}

/// Unordered set of leaf editables.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditableGroup {
    members: Vec<Editable>,
}

impl EditableGroup {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Group of the given editables; nested groups are flattened and duplicates dropped.
    #[must_use]
    pub fn from_members(editables: impl IntoIterator<Item = Editable>) -> Self {
        let mut group = Self::new();
        for e in editables {
            for leaf in e.into_leaves() {
                if !group.members.contains(&leaf) {
                    group.members.push(leaf);
                }
            }
        }
        group
    }

    /// Toggle membership: remove the editable if present, else append it.
    /// Groups toggle each of their members. Returns whether the group is
    /// still non-empty.
    pub fn add(&mut self, editable: Editable) -> bool {
        for leaf in editable.into_leaves() {
            if let Some(pos) = self.members.iter().position(|m| *m == leaf) {
                self.members.remove(pos);
            } else {
                self.members.push(leaf);
            }
        }
        !self.members.is_empty()
    }

    #[must_use]
    pub fn contains(&self, editable: &Editable) -> bool {
        self.members.contains(editable)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Editable> {
        self.members.iter()
    }

    pub fn clear(&mut self) {
        self.members.clear();
    }
}

impl Editable {
    #[must_use]
    pub fn part(object: impl Into<ObjectId>, kind: PartKind, id: PartId) -> Self {
        Self::Part { object: object.into(), kind, id }
    }

    #[must_use]
    pub fn kind(&self) -> EditableKind {
        match self {
            Self::Part { kind, .. } => (*kind).into(),
            Self::Object(_) => EditableKind::Object,
            Self::ObjectGroup(_) => EditableKind::ObjectGroup,
            Self::PartsGroup(_) => EditableKind::PartsGroup,
        }
    }

    fn into_leaves(self) -> Vec<Editable> {
        match self {
            Self::ObjectGroup(g) | Self::PartsGroup(g) => g.members,
            leaf => vec![leaf],
        }
    }

    fn leaves(&self) -> &[Editable] {
        match self {
            Self::ObjectGroup(g) | Self::PartsGroup(g) => &g.members,
            leaf => std::slice::from_ref(leaf),
        }
    }

    /// Object a leaf belongs to. For a group, the single object all members
    /// belong to, or `None` when empty or mixed.
    #[must_use]
    pub fn get_object(&self) -> Option<&ObjectId> {
        match self {
            Self::Part { object, .. } | Self::Object(object) => Some(object),
            Self::ObjectGroup(g) | Self::PartsGroup(g) => {
                let mut owners = g.members.iter().map(Editable::get_object);
                let first = owners.next()??;
                owners.all(|o| o == Some(first)).then_some(first)
            }
        }
    }

    // -------------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------------

    /// World-space position: part position, object origin, or the mean over a group.
    #[must_use]
    pub fn position(&self, scene: &Scene) -> DVec3 {
        match self {
            Self::Part { object, kind, id } => {
                scene.object(object).and_then(|o| o.part_position(*kind, *id)).unwrap_or(DVec3::ZERO)
            }
            Self::Object(object) => scene.object(object).map(|o| o.position()).unwrap_or(DVec3::ZERO),
            Self::ObjectGroup(g) | Self::PartsGroup(g) => {
                let mut sum = DVec3::ZERO;
                let mut count = 0u32;
                for m in &g.members {
                    if m.resolves(scene) {
                        sum += m.position(scene);
                        count += 1;
                    }
                }
                if count == 0 { DVec3::ZERO } else { sum / f64::from(count) }
            }
        }
    }

    /// Whether the object or part this leaf names still exists.
    #[must_use]
    pub fn resolves(&self, scene: &Scene) -> bool {
        match self {
            Self::Part { object, kind, id } => scene.object(object).is_some_and(|o| o.has_part(*kind, *id)),
            Self::Object(object) => scene.contains(object),
            Self::ObjectGroup(g) | Self::PartsGroup(g) => g.members.iter().any(|m| m.resolves(scene)),
        }
    }

    /// Distinct `(object, vertex)` pairs this editable is made of.
    #[must_use]
    pub fn vertices(&self, scene: &Scene) -> Vec<(ObjectId, PartId)> {
        let mut seen = BTreeSet::new();
        let mut out = Vec::new();
        for leaf in self.leaves() {
            let (object, ids) = match leaf {
                Self::Part { object, kind, id } => {
                    (object, scene.object(object).map(|o| o.part_vertex_ids(*kind, *id)).unwrap_or_default())
                }
                Self::Object(object) => {
                    (object, scene.object(object).map(|o| o.vertices().map(|v| v.id).collect()).unwrap_or_default())
                }
                Self::ObjectGroup(_) | Self::PartsGroup(_) => continue,
            };
            for v in ids {
                if seen.insert((object.clone(), v)) {
                    out.push((object.clone(), v));
                }
            }
        }
        out
    }

    /// Ids of the whole objects in this editable.
    #[must_use]
    pub fn obj_ids(&self) -> Vec<ObjectId> {
        self.leaves()
            .iter()
            .filter_map(|leaf| match leaf {
                Self::Object(id) => Some(id.clone()),
                _ => None,
            })
            .collect()
    }

    /// `(object, vertex)` pairs, the part-mode target list of translate/rotate/scale.
    #[must_use]
    pub fn obj_vert_ids(&self, scene: &Scene) -> Vec<(ObjectId, PartId)> {
        self.vertices(scene)
    }

    /// `(object, part, kind)` triples, the part-mode target list of delete.
    #[must_use]
    pub fn obj_part_ids(&self) -> Vec<(ObjectId, PartId, PartKind)> {
        self.leaves()
            .iter()
            .filter_map(|leaf| match leaf {
                Self::Part { object, kind, id } => Some((object.clone(), *id, *kind)),
                _ => None,
            })
            .collect()
    }

    fn is_object_level(&self) -> bool {
        matches!(self, Self::Object(_) | Self::ObjectGroup(_))
    }

    // -------------------------------------------------------------------------
    // Edits
    // -------------------------------------------------------------------------

    /// Move by a world-space delta.
    pub fn translate(&self, scene: &mut Scene, delta: DVec3) {
        if self.is_object_level() {
            scene.translate_objects(&self.obj_ids(), delta);
        } else {
            let verts = self.vertices(scene);
            scene.translate_vertices(&verts, delta);
        }
    }

    /// Rotate by `q` about this editable's position.
    pub fn rotate(&self, scene: &mut Scene, q: DQuat) {
        let pivot = self.position(scene);
        self.rotate_about(scene, q, pivot);
    }

    pub fn rotate_about(&self, scene: &mut Scene, q: DQuat, pivot: DVec3) {
        if self.is_object_level() {
            scene.rotate_objects(&self.obj_ids(), q, pivot);
        } else {
            let verts = self.vertices(scene);
            scene.rotate_vertices(&verts, q, pivot);
        }
    }

    /// Scale by `factors` about this editable's position.
    pub fn scale(&self, scene: &mut Scene, factors: DVec3) {
        let pivot = self.position(scene);
        self.scale_about(scene, factors, pivot);
    }

    pub fn scale_about(&self, scene: &mut Scene, factors: DVec3, pivot: DVec3) {
        if self.is_object_level() {
            scene.scale_objects(&self.obj_ids(), factors, pivot);
        } else {
            let verts = self.vertices(scene);
            scene.scale_vertices(&verts, factors, pivot);
        }
    }

    /// Delete the referenced objects or parts. Returns how many were removed.
    pub fn delete(&self, scene: &mut Scene) -> usize {
        if self.is_object_level() {
            scene.delete_objects(&self.obj_ids())
        } else {
            scene.delete_parts(&self.obj_part_ids())
        }
    }

    // -------------------------------------------------------------------------
    // Hover and selection
    // -------------------------------------------------------------------------

    pub fn set_hover(&self, scene: &mut Scene, hover: bool) {
        for leaf in self.leaves() {
            leaf.set_flag(scene, |obj, kind_id| match kind_id {
                Some((kind, id)) => obj.set_part_hover(kind, id, hover),
                None => {
                    obj.hover = hover;
                    true
                }
            });
        }
    }

    pub fn set_selected(&self, scene: &mut Scene, selected: bool) {
        for leaf in self.leaves() {
            leaf.set_flag(scene, |obj, kind_id| match kind_id {
                Some((kind, id)) => obj.set_part_selected(kind, id, selected),
                None => {
                    obj.selected = selected;
                    true
                }
            });
        }
    }

    fn set_flag(&self, scene: &mut Scene, f: impl FnOnce(&mut Object, Option<(PartKind, PartId)>) -> bool) {
        let (object, target) = match self {
            Self::Part { object, kind, id } => (object, Some((*kind, *id))),
            Self::Object(object) => (object, None),
            Self::ObjectGroup(_) | Self::PartsGroup(_) => return,
        };
        if let Some(obj) = scene.object_mut(object) {
            if f(obj, target) {
                obj.mark_dirty();
            }
        }
    }

    /// Whether any leaf is selected.
    #[must_use]
    pub fn is_selected(&self, scene: &Scene) -> bool {
        self.leaves().iter().any(|leaf| match leaf {
            Self::Part { object, kind, id } => scene.object(object).is_some_and(|o| match kind {
                PartKind::Vertex => o.vertex(*id).is_some_and(|v| v.selected),
                PartKind::Edge => o.edge(*id).is_some_and(|e| e.selected),
                PartKind::Face => o.face(*id).is_some_and(|f| f.selected),
            }),
            Self::Object(object) => scene.object(object).is_some_and(|o| o.selected),
            Self::ObjectGroup(_) | Self::PartsGroup(_) => false,
        })
    }
}
