//! Remote application of relay messages to the local scene.
//!
//! Transform handlers rebuild the same pivot-relative arithmetic the local
//! rigs use by going through the scene's shared edit kernels. Targets that
//! vanished locally (a delete raced an in-flight edit) are logged and skipped
//! by those kernels; the rest of the command still applies.

#[cfg(test)]
#[path = "apply_test.rs"]
mod apply_test;

use mesh::{DQuat, DVec3, Editable, ObjectId, PaintStroke, PartId, Primitive};
use protocol::{Edit, EditTool, Targets};
use tracing::{debug, info};

use crate::error::ExecutorError;
use crate::executor::{Executor, Outcome};

/// Where a transform edit lands.
enum TransformTargets {
    Objects(Vec<ObjectId>),
    Vertices(Vec<(ObjectId, PartId)>),
    Nothing,
}

fn transform_targets(tool: &'static str, obj_mode: bool, ids: Targets) -> Result<TransformTargets, ExecutorError> {
    match (obj_mode, ids) {
        (_, ids) if ids.is_empty() => Ok(TransformTargets::Nothing),
        (true, Targets::Objects(ids)) => Ok(TransformTargets::Objects(ids)),
        (false, Targets::Vertices(verts)) => Ok(TransformTargets::Vertices(verts)),
        (obj_mode, _) => Err(ExecutorError::TargetMismatch { tool, obj_mode }),
    }
}

fn finite(tool: &'static str, v: DVec3) -> Result<DVec3, ExecutorError> {
    if v.is_finite() { Ok(v) } else { Err(ExecutorError::BadPayload(tool)) }
}

impl Executor {
    pub(crate) fn apply_create(&mut self, object: Primitive, seq: Option<u64>) -> Result<Outcome, ExecutorError> {
        let seq = seq.unwrap_or_else(|| {
            debug!(seq_base = self.config.seq_base, "executor: unstamped create");
            self.config.seq_base
        });
        let id = self.scene.create(object, seq)?;
        self.mode.set_object();
        info!(%id, %object, seq, "executor: object created");
        Ok(Outcome::Applied)
    }

    /// Locks are applied for every user; the local user's granted locks
    /// also become the local selection. A sequenced lock is the relay's
    /// decision and replaces whatever this peer had recorded, so a lock the
    /// local user lost is deselected here.
    pub(crate) fn apply_lock(&mut self, user: &str, objects: &[ObjectId], seq: Option<u64>) -> Outcome {
        let granted: Vec<(ObjectId, Option<String>)> = if seq.is_some() {
            self.scene.grant_locks(user, objects)
        } else {
            self.scene.lock(user, objects).into_iter().map(|id| (id, None)).collect()
        };
        let own = self.is_own(user);
        for (id, previous) in granted {
            let editable = Editable::Object(id);
            if own {
                if !self.selection.contains(&editable) {
                    editable.set_selected(&mut self.scene, true);
                    self.selection.add(editable);
                }
            } else if previous.as_deref().is_some_and(|holder| self.is_own(holder)) {
                self.deselect(editable);
            }
        }
        Outcome::Applied
    }

    pub(crate) fn apply_unlock(&mut self, user: &str, objects: &[ObjectId]) -> Outcome {
        let released = self.scene.unlock(user, objects);
        if self.is_own(user) {
            for id in released {
                self.deselect(Editable::Object(id));
            }
        }
        Outcome::Applied
    }

    pub(crate) fn apply_leave(&mut self, user: &str) -> Outcome {
        if self.is_own(user) {
            return Outcome::Suppressed;
        }
        let released = self.scene.leave(user);
        debug!(%user, released = released.len(), "executor: user left");
        Outcome::Applied
    }

    fn deselect(&mut self, editable: Editable) {
        if self.selection.contains(&editable) {
            editable.set_selected(&mut self.scene, false);
            self.selection.add(editable);
        }
    }

    // =========================================================================
    // EDITS
    // =========================================================================

    pub(crate) fn apply_edit(&mut self, edit: Edit) -> Result<Outcome, ExecutorError> {
        let tool = edit.tool.name();
        if self.is_own(&edit.user_id) {
            debug!(tool, "executor: own edit suppressed");
            return Ok(Outcome::Suppressed);
        }

        match edit.tool {
            EditTool::Translate { dx, dy, dz, obj_mode, ids } => {
                let delta = finite(tool, DVec3::new(dx, dy, dz))?;
                let applied = match transform_targets(tool, obj_mode, ids)? {
                    TransformTargets::Objects(ids) => self.scene.translate_objects(&ids, delta),
                    TransformTargets::Vertices(verts) => self.scene.translate_vertices(&verts, delta),
                    TransformTargets::Nothing => 0,
                };
                debug!(tool, applied, "executor: transform applied");
            }
            EditTool::Rotate { x, y, z, w, mx, my, mz, obj_mode, ids } => {
                let q = DQuat::from_xyzw(x, y, z, w);
                if !q.is_finite() || q.length_squared() <= f64::EPSILON {
                    return Err(ExecutorError::BadPayload(tool));
                }
                let q = q.normalize();
                let pivot = finite(tool, DVec3::new(mx, my, mz))?;
                let applied = match transform_targets(tool, obj_mode, ids)? {
                    TransformTargets::Objects(ids) => self.scene.rotate_objects(&ids, q, pivot),
                    TransformTargets::Vertices(verts) => self.scene.rotate_vertices(&verts, q, pivot),
                    TransformTargets::Nothing => 0,
                };
                debug!(tool, applied, "executor: transform applied");
            }
            EditTool::Scale { sx, sy, sz, mx, my, mz, obj_mode, ids } => {
                let factors = finite(tool, DVec3::new(sx, sy, sz))?;
                let pivot = finite(tool, DVec3::new(mx, my, mz))?;
                let applied = match transform_targets(tool, obj_mode, ids)? {
                    TransformTargets::Objects(ids) => self.scene.scale_objects(&ids, factors, pivot),
                    TransformTargets::Vertices(verts) => self.scene.scale_vertices(&verts, factors, pivot),
                    TransformTargets::Nothing => 0,
                };
                debug!(tool, applied, "executor: transform applied");
            }
            EditTool::Delete { obj_mode, ids } => match (obj_mode, ids) {
                (_, ids) if ids.is_empty() => {}
                (true, Targets::Objects(ids)) => {
                    self.scene.delete_objects(&ids);
                    for id in ids {
                        self.deselect(Editable::Object(id));
                    }
                }
                (false, Targets::Parts(parts)) => {
                    self.scene.delete_parts(&parts);
                }
                (obj_mode, _) => return Err(ExecutorError::TargetMismatch { tool, obj_mode }),
            },
            EditTool::Extrude { obj_id, face_ids } => {
                let result = self.scene.try_object_mut(&obj_id)?.extrude(&face_ids, 0.0)?;
                debug!(object = %obj_id, added = result.vertices.len(), "executor: extruded");
            }
            EditTool::Connect { obj_id, vert_ids } => {
                let edges = self.scene.try_object_mut(&obj_id)?.connect(&vert_ids)?;
                debug!(object = %obj_id, added = edges.len(), "executor: connected");
            }
            EditTool::Merge { obj_id, vert_ids } => {
                let kept = self.scene.try_object_mut(&obj_id)?.merge_vertices(&vert_ids)?;
                debug!(object = %obj_id, kept, "executor: merged");
            }
            EditTool::Paint { texture_id, u, v, bcr, bcg, bcb, br } => {
                let stroke = PaintStroke { u, v, colour: [bcr, bcg, bcb], radius: br };
                self.scene.paint(&texture_id, stroke);
            }
            EditTool::Texture { texture_id, obj_id } => {
                self.scene.set_texture(&obj_id, &texture_id)?;
            }
        }

        Ok(Outcome::Applied)
    }
}
