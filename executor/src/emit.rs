//! Outbound commands built from local edits.
//!
//! Every helper assumes the edit has already been applied to the local
//! scene. Transform and delete commands address whole objects in object
//! mode and parts otherwise, following the executor's current [`Mode`].
//!
//! [`Mode`]: mesh::Mode

#[cfg(test)]
#[path = "emit_test.rs"]
mod emit_test;

use mesh::{DQuat, DVec3, Editable, ObjectId, PaintStroke, PartId, Primitive, RigCompletion};
use protocol::{Edit, EditTool, Message, Targets};

use crate::executor::{Executor, SendOutcome};

impl Executor {
    fn emit_edit(&mut self, tool: EditTool) -> SendOutcome {
        let edit = Edit::new(self.config.user_id.clone(), tool);
        self.send_command(Message::Edit(edit))
    }

    /// `(objMode, ids)` for a transform of `target` in the current mode.
    fn transform_ids(&self, target: &Editable) -> (bool, Targets) {
        if self.mode.object {
            (true, Targets::Objects(target.obj_ids()))
        } else {
            (false, Targets::Vertices(target.obj_vert_ids(&self.scene)))
        }
    }

    /// Ask every peer, this one included, to build a primitive. Nothing is
    /// created locally until the relay echoes the command with its `seq`.
    pub fn emit_create(&mut self, object: Primitive) -> SendOutcome {
        self.send_command(Message::Create { object })
    }

    /// Request locks on `to_lock` and release `to_unlock`. Empty lists send nothing.
    pub fn emit_select(&mut self, to_lock: &[ObjectId], to_unlock: &[ObjectId]) -> Vec<SendOutcome> {
        let user = self.config.user_id.clone();
        let mut sent = Vec::new();
        if !to_lock.is_empty() {
            sent.push(self.send_command(Message::Lock { user: user.clone(), objects: to_lock.to_vec() }));
        }
        if !to_unlock.is_empty() {
            sent.push(self.send_command(Message::Unlock { user, objects: to_unlock.to_vec() }));
        }
        sent
    }

    pub fn emit_translate(&mut self, target: &Editable, delta: DVec3) -> SendOutcome {
        let (obj_mode, ids) = self.transform_ids(target);
        self.emit_edit(EditTool::Translate { dx: delta.x, dy: delta.y, dz: delta.z, obj_mode, ids })
    }

    /// Rotation about the target's current position. Rotating about the
    /// centroid leaves the centroid in place, so reading it after the local
    /// edit gives the pivot the edit used.
    pub fn emit_rotate(&mut self, target: &Editable, rotation: DQuat) -> SendOutcome {
        let mid = target.position(&self.scene);
        let (obj_mode, ids) = self.transform_ids(target);
        self.emit_edit(EditTool::Rotate {
            x: rotation.x,
            y: rotation.y,
            z: rotation.z,
            w: rotation.w,
            mx: mid.x,
            my: mid.y,
            mz: mid.z,
            obj_mode,
            ids,
        })
    }

    pub fn emit_scale(&mut self, target: &Editable, factors: DVec3, pivot: DVec3) -> SendOutcome {
        let (obj_mode, ids) = self.transform_ids(target);
        self.emit_edit(EditTool::Scale {
            sx: factors.x,
            sy: factors.y,
            sz: factors.z,
            mx: pivot.x,
            my: pivot.y,
            mz: pivot.z,
            obj_mode,
            ids,
        })
    }

    pub fn emit_delete(&mut self, target: &Editable) -> SendOutcome {
        let (obj_mode, ids) = if self.mode.object {
            (true, Targets::Objects(target.obj_ids()))
        } else {
            (false, Targets::Parts(target.obj_part_ids()))
        };
        self.emit_edit(EditTool::Delete { obj_mode, ids })
    }

    pub fn emit_extrude(&mut self, object: &str, face_ids: &[PartId]) -> SendOutcome {
        self.emit_edit(EditTool::Extrude { obj_id: object.to_owned(), face_ids: face_ids.to_vec() })
    }

    pub fn emit_connect(&mut self, object: &str, vert_ids: &[PartId]) -> SendOutcome {
        self.emit_edit(EditTool::Connect { obj_id: object.to_owned(), vert_ids: vert_ids.to_vec() })
    }

    pub fn emit_merge(&mut self, object: &str, vert_ids: &[PartId]) -> SendOutcome {
        self.emit_edit(EditTool::Merge { obj_id: object.to_owned(), vert_ids: vert_ids.to_vec() })
    }

    pub fn emit_paint(&mut self, texture_id: &str, stroke: &PaintStroke) -> SendOutcome {
        let [bcr, bcg, bcb] = stroke.colour;
        self.emit_edit(EditTool::Paint {
            texture_id: texture_id.to_owned(),
            u: stroke.u,
            v: stroke.v,
            bcr,
            bcg,
            bcb,
            br: stroke.radius,
        })
    }

    pub fn emit_texture(&mut self, texture_id: &str, object: &str) -> SendOutcome {
        self.emit_edit(EditTool::Texture { texture_id: texture_id.to_owned(), obj_id: object.to_owned() })
    }

    pub fn emit_name(&mut self, value: &str) -> SendOutcome {
        self.send_command(Message::Name { value: value.to_owned() })
    }

    pub fn emit_message(&mut self, text: &str) -> SendOutcome {
        let user = self.config.user_id.clone();
        self.send_command(Message::Chat { user, text: text.to_owned() })
    }

    /// Emit the command for a finished rig gesture on `target`. An extrude
    /// drag travels as a translate of the new ring.
    pub fn emit_completion(&mut self, target: &Editable, completion: &RigCompletion) -> SendOutcome {
        match *completion {
            RigCompletion::Translate { delta } | RigCompletion::Extrude { delta } => self.emit_translate(target, delta),
            RigCompletion::Rotate { rotation } => self.emit_rotate(target, rotation),
            RigCompletion::Scale { factor, pivot } => self.emit_scale(target, factor, pivot),
        }
    }
}
