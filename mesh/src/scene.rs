//! Scene arena: the objects of one collaborative scene plus its presence,
//! lock and texture state.
//!
//! DESIGN
//! ======
//! The scene owns every `Object` by id in a `BTreeMap`, so iteration order
//! is stable and tie-breaks in picking are deterministic. Object ids are
//! `obj_{seq}_{n}` where `seq` is the relay-assigned sequence number of the
//! `create` message and `n` comes from the scene's own allocator. Every peer
//! creates objects on the relayed echo, so all peers agree on both parts.
//!
//! Locks map object ids to the user holding them. The scene records what
//! the relay granted; arbitration happens on the relay. `lock` arbitrates
//! against the local table for unsequenced use, `grant_locks` records a
//! relay decision as is.

#[cfg(test)]
#[path = "scene_test.rs"]
mod scene_test;

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::fmt;
use std::str::FromStr;

use glam::{DQuat, DVec3};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::consts::{
    DEFAULT_CUBE_HALF, DEFAULT_PYRAMID_HALF, DEFAULT_QUAD_HALF, DEFAULT_SPHERE_RADIUS, DEFAULT_SPHERE_SEGMENTS,
};
use crate::error::MeshError;
use crate::factory;
use crate::ids::IdAllocator;
use crate::object::{Object, ObjectData, ObjectId, PartId, PartKind};

/// Shapes a `create` command can ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Primitive {
    Cube,
    Sphere,
    Pyramid,
    Quad,
}

impl Primitive {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cube => "cube",
            Self::Sphere => "sphere",
            Self::Pyramid => "pyramid",
            Self::Quad => "quad",
        }
    }
}

impl fmt::Display for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Primitive {
    type Err = MeshError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cube" => Ok(Self::Cube),
            "sphere" => Ok(Self::Sphere),
            "pyramid" => Ok(Self::Pyramid),
            "quad" => Ok(Self::Quad),
            other => Err(MeshError::UnknownPrimitive(other.to_owned())),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permissions {
    pub owner: bool,
    pub write: bool,
    pub public: bool,
}

/// One brush dab on a texture, in UV space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PaintStroke {
    pub u: f64,
    pub v: f64,
    pub colour: [f64; 3],
    pub radius: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextureState {
    pub strokes: Vec<PaintStroke>,
}

#[derive(Debug, Clone)]
pub struct Scene {
    pub id: String,
    pub name: String,
    pub permissions: Permissions,
    users: Vec<String>,
    objects: BTreeMap<ObjectId, Object>,
    ids: IdAllocator,
    locks: BTreeMap<ObjectId, String>,
    textures: BTreeMap<String, TextureState>,
}

impl Scene {
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            permissions: Permissions::default(),
            users: Vec::new(),
            objects: BTreeMap::new(),
            ids: IdAllocator::starting_at(0),
            locks: BTreeMap::new(),
            textures: BTreeMap::new(),
        }
    }

    // =========================================================================
    // OBJECTS
    // =========================================================================

    #[must_use]
    pub fn object(&self, id: &str) -> Option<&Object> {
        self.objects.get(id)
    }

    pub fn object_mut(&mut self, id: &str) -> Option<&mut Object> {
        self.objects.get_mut(id)
    }

    /// # Errors
    ///
    /// Returns [`MeshError::UnknownObject`] if no object has this id.
    pub fn try_object_mut(&mut self, id: &str) -> Result<&mut Object, MeshError> {
        self.objects.get_mut(id).ok_or_else(|| MeshError::UnknownObject(id.to_owned()))
    }

    pub fn objects(&self) -> impl Iterator<Item = &Object> {
        self.objects.values()
    }

    pub fn objects_mut(&mut self) -> impl Iterator<Item = &mut Object> {
        self.objects.values_mut()
    }

    #[must_use]
    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.objects.contains_key(id)
    }

    /// Next object id for a create stamped with `seq`.
    pub fn next_id(&mut self, seq: u64) -> ObjectId {
        format!("obj_{seq}_{}", self.ids.allocate())
    }

    /// Insert an object, replacing any object with the same id.
    pub fn insert(&mut self, object: Object) -> &mut Object {
        match self.objects.entry(object.id.clone()) {
            Entry::Occupied(mut slot) => {
                slot.insert(object);
                slot.into_mut()
            }
            Entry::Vacant(slot) => slot.insert(object),
        }
    }

    /// # Errors
    ///
    /// Returns [`MeshError::UnknownObject`] if no object has this id.
    pub fn remove(&mut self, id: &str) -> Result<Object, MeshError> {
        self.locks.remove(id);
        self.objects.remove(id).ok_or_else(|| MeshError::UnknownObject(id.to_owned()))
    }

    /// Create a primitive with default dimensions.
    ///
    /// # Errors
    ///
    /// Propagates factory failures.
    pub fn create(&mut self, primitive: Primitive, seq: u64) -> Result<ObjectId, MeshError> {
        match primitive {
            Primitive::Cube => self.create_cube(DEFAULT_CUBE_HALF, DEFAULT_CUBE_HALF, DEFAULT_CUBE_HALF, seq),
            Primitive::Sphere => {
                self.create_sphere(DEFAULT_SPHERE_RADIUS, DEFAULT_SPHERE_SEGMENTS, DEFAULT_SPHERE_SEGMENTS, seq)
            }
            Primitive::Pyramid => {
                self.create_pyramid(DEFAULT_PYRAMID_HALF, DEFAULT_PYRAMID_HALF, DEFAULT_PYRAMID_HALF, seq)
            }
            Primitive::Quad => self.create_quad(DEFAULT_QUAD_HALF, DEFAULT_QUAD_HALF, seq),
        }
    }

    /// # Errors
    ///
    /// Propagates factory failures.
    pub fn create_cube(&mut self, w: f64, h: f64, d: f64, seq: u64) -> Result<ObjectId, MeshError> {
        let id = self.next_id(seq);
        Ok(self.insert(factory::cube(id, w, h, d)?).id.clone())
    }

    /// # Errors
    ///
    /// Returns [`MeshError::Degenerate`] for too few slices or stacks.
    pub fn create_sphere(&mut self, r: f64, slices: u32, stacks: u32, seq: u64) -> Result<ObjectId, MeshError> {
        let id = self.next_id(seq);
        Ok(self.insert(factory::sphere(id, r, slices, stacks)?).id.clone())
    }

    /// # Errors
    ///
    /// Propagates factory failures.
    pub fn create_pyramid(&mut self, w: f64, h: f64, d: f64, seq: u64) -> Result<ObjectId, MeshError> {
        let id = self.next_id(seq);
        Ok(self.insert(factory::pyramid(id, w, h, d)?).id.clone())
    }

    /// # Errors
    ///
    /// Propagates factory failures.
    pub fn create_quad(&mut self, w: f64, h: f64, seq: u64) -> Result<ObjectId, MeshError> {
        let id = self.next_id(seq);
        Ok(self.insert(factory::quad(id, w, h)?).id.clone())
    }

    // =========================================================================
    // PRESENCE
    // =========================================================================

    #[must_use]
    pub fn users(&self) -> &[String] {
        &self.users
    }

    /// Add a user to the presence list; returns false if already present.
    pub fn add_user(&mut self, user: &str) -> bool {
        if self.users.iter().any(|u| u == user) {
            return false;
        }
        self.users.push(user.to_owned());
        true
    }

    pub fn set_users(&mut self, users: Vec<String>) {
        self.users.clear();
        for u in users {
            if !self.users.contains(&u) {
                self.users.push(u);
            }
        }
    }

    /// Remove a user and release every lock they hold. Returns the released object ids.
    pub fn leave(&mut self, user: &str) -> Vec<ObjectId> {
        self.users.retain(|u| u != user);
        let released: Vec<ObjectId> =
            self.locks.iter().filter(|(_, holder)| *holder == user).map(|(id, _)| id.clone()).collect();
        for id in &released {
            self.locks.remove(id);
        }
        released
    }

    // =========================================================================
    // LOCKS
    // =========================================================================

    /// Record `user` as holder of each known object that is free or already
    /// theirs. Returns the ids actually granted.
    pub fn lock(&mut self, user: &str, ids: &[ObjectId]) -> Vec<ObjectId> {
        let mut granted = Vec::new();
        for id in ids {
            if !self.objects.contains_key(id) {
                warn!(scene = %self.id, object = %id, "scene: lock on unknown object");
                continue;
            }
            match self.locks.get(id) {
                Some(holder) if holder != user => {
                    debug!(scene = %self.id, object = %id, %holder, "scene: object already locked");
                }
                _ => {
                    self.locks.insert(id.clone(), user.to_owned());
                    granted.push(id.clone());
                }
            }
        }
        granted
    }

    /// Record `user` as holder of each known object, replacing any previous
    /// holder. Returns the granted ids with the holder each one replaced.
    pub fn grant_locks(&mut self, user: &str, ids: &[ObjectId]) -> Vec<(ObjectId, Option<String>)> {
        let mut granted = Vec::new();
        for id in ids {
            if !self.objects.contains_key(id) {
                warn!(scene = %self.id, object = %id, "scene: lock on unknown object");
                continue;
            }
            let previous = self.locks.insert(id.clone(), user.to_owned());
            if let Some(holder) = previous.as_deref().filter(|h| *h != user) {
                debug!(scene = %self.id, object = %id, %holder, %user, "scene: lock handed over");
            }
            granted.push((id.clone(), previous));
        }
        granted
    }

    /// Release the locks `user` holds on `ids`. Returns the ids released.
    pub fn unlock(&mut self, user: &str, ids: &[ObjectId]) -> Vec<ObjectId> {
        let mut released = Vec::new();
        for id in ids {
            if self.locks.get(id).is_some_and(|holder| holder == user) {
                self.locks.remove(id);
                released.push(id.clone());
            }
        }
        released
    }

    #[must_use]
    pub fn lock_holder(&self, id: &str) -> Option<&str> {
        self.locks.get(id).map(String::as_str)
    }

    /// Objects currently locked by `user`.
    #[must_use]
    pub fn locked_by(&self, user: &str) -> Vec<ObjectId> {
        self.locks.iter().filter(|(_, holder)| *holder == user).map(|(id, _)| id.clone()).collect()
    }

    // =========================================================================
    // TEXTURES
    // =========================================================================

    pub fn paint(&mut self, texture: &str, stroke: PaintStroke) {
        self.textures.entry(texture.to_owned()).or_default().strokes.push(stroke);
    }

    #[must_use]
    pub fn texture(&self, texture: &str) -> Option<&TextureState> {
        self.textures.get(texture)
    }

    /// # Errors
    ///
    /// Returns [`MeshError::UnknownObject`] if the object is missing.
    pub fn set_texture(&mut self, object: &str, texture: &str) -> Result<(), MeshError> {
        self.try_object_mut(object)?.texture = Some(texture.to_owned());
        Ok(())
    }

    // =========================================================================
    // EDITS
    // =========================================================================
    //
    // Shared by local editables and remote application so both sides run the
    // same arithmetic. Missing ids are logged and skipped; the return value
    // counts the items actually changed.

    pub fn translate_objects(&mut self, ids: &[ObjectId], delta: DVec3) -> usize {
        let mut applied = 0;
        for id in ids {
            match self.objects.get_mut(id) {
                Some(obj) => {
                    obj.translate(delta);
                    applied += 1;
                }
                None => warn!(scene = %self.id, object = %id, "scene: translate of unknown object"),
            }
        }
        applied
    }

    /// Rotate objects about `pivot`: each origin orbits the pivot and each object spins by `q`.
    pub fn rotate_objects(&mut self, ids: &[ObjectId], q: DQuat, pivot: DVec3) -> usize {
        let mut applied = 0;
        for id in ids {
            match self.objects.get_mut(id) {
                Some(obj) => {
                    let d = obj.position() - pivot;
                    obj.translate(q * d - d);
                    obj.rotate(q);
                    applied += 1;
                }
                None => warn!(scene = %self.id, object = %id, "scene: rotate of unknown object"),
            }
        }
        applied
    }

    /// Scale objects about `pivot`: origins move away from the pivot by `factors`.
    pub fn scale_objects(&mut self, ids: &[ObjectId], factors: DVec3, pivot: DVec3) -> usize {
        let mut applied = 0;
        for id in ids {
            match self.objects.get_mut(id) {
                Some(obj) => {
                    let d = obj.position() - pivot;
                    obj.translate(d * factors - d);
                    obj.scale(factors);
                    applied += 1;
                }
                None => warn!(scene = %self.id, object = %id, "scene: scale of unknown object"),
            }
        }
        applied
    }

    /// Move vertices by a world-space delta.
    pub fn translate_vertices(&mut self, verts: &[(ObjectId, PartId)], delta: DVec3) -> usize {
        self.map_vertices(verts, "translate", |world| world + delta)
    }

    /// Rotate vertices' world positions by `q` about `pivot`.
    pub fn rotate_vertices(&mut self, verts: &[(ObjectId, PartId)], q: DQuat, pivot: DVec3) -> usize {
        self.map_vertices(verts, "rotate", |world| pivot + q * (world - pivot))
    }

    /// Scale vertices' world positions by `factors` about `pivot`.
    pub fn scale_vertices(&mut self, verts: &[(ObjectId, PartId)], factors: DVec3, pivot: DVec3) -> usize {
        self.map_vertices(verts, "scale", |world| pivot + (world - pivot) * factors)
    }

    fn map_vertices(&mut self, verts: &[(ObjectId, PartId)], op: &str, f: impl Fn(DVec3) -> DVec3) -> usize {
        let mut applied = 0;
        for (object, vertex) in verts {
            let Some(obj) = self.objects.get_mut(object) else {
                warn!(scene = %self.id, %object, op, "scene: vertex edit on unknown object");
                continue;
            };
            let Some(world) = obj.vertex_world(*vertex) else {
                warn!(scene = %self.id, %object, vertex, op, "scene: vertex edit on unknown vertex");
                continue;
            };
            if let Err(e) = obj.set_vertex_world(*vertex, f(world)) {
                warn!(scene = %self.id, error = %e, op, "scene: vertex edit failed");
                continue;
            }
            applied += 1;
        }
        applied
    }

    pub fn delete_objects(&mut self, ids: &[ObjectId]) -> usize {
        let mut applied = 0;
        for id in ids {
            match self.remove(id) {
                Ok(_) => applied += 1,
                Err(e) => warn!(scene = %self.id, error = %e, "scene: delete skipped"),
            }
        }
        applied
    }

    /// Delete parts in order. Parts already removed by an earlier cascade are skipped quietly.
    pub fn delete_parts(&mut self, parts: &[(ObjectId, PartId, PartKind)]) -> usize {
        let mut applied = 0;
        for (object, id, kind) in parts {
            let Some(obj) = self.objects.get_mut(object) else {
                warn!(scene = %self.id, %object, "scene: part delete on unknown object");
                continue;
            };
            if !obj.has_part(*kind, *id) {
                debug!(scene = %self.id, %object, ?kind, id, "scene: part already gone");
                continue;
            }
            let result = match kind {
                PartKind::Vertex => obj.delete_vertex(*id),
                PartKind::Edge => obj.delete_edge(*id),
                PartKind::Face => obj.delete_face(*id),
            };
            match result {
                Ok(_) => applied += 1,
                Err(e) => warn!(scene = %self.id, error = %e, "scene: part delete failed"),
            }
        }
        applied
    }

    // =========================================================================
    // SNAPSHOTS
    // =========================================================================

    #[must_use]
    pub fn to_data(&self) -> SceneData {
        SceneData {
            id: self.id.clone(),
            name: self.name.clone(),
            next_id: self.ids.peek(),
            objects: self.objects.iter().map(|(id, o)| (id.clone(), o.to_data())).collect(),
        }
    }

    /// # Errors
    ///
    /// Returns [`MeshError::Snapshot`] if serialization fails.
    pub fn to_json(&self) -> Result<serde_json::Value, MeshError> {
        Ok(serde_json::to_value(self.to_data())?)
    }

    /// Replace the scene's objects with a snapshot. Presence and locks are kept.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::Snapshot`] for malformed JSON and
    /// [`MeshError::DanglingReference`] if any object is inconsistent; the
    /// scene is left untouched in both cases.
    pub fn load(&mut self, value: &serde_json::Value) -> Result<(), MeshError> {
        let data: SceneData = serde_json::from_value(value.clone())?;
        let mut objects = BTreeMap::new();
        for (id, od) in &data.objects {
            let mut obj = Object::from_data(od)?;
            obj.id.clone_from(id);
            objects.insert(id.clone(), obj);
        }
        if !data.name.is_empty() {
            self.name = data.name;
        }
        self.objects = objects;
        self.ids = IdAllocator::starting_at(data.next_id);
        self.locks.retain(|id, _| self.objects.contains_key(id));
        Ok(())
    }
}

/// Persisted form of a scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneData {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "nextId")]
    pub next_id: u32,
    #[serde(default)]
    pub objects: BTreeMap<ObjectId, ObjectData>,
}
