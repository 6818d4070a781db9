use glam::DVec3;

use super::{Handles, RigCompletion};
use crate::editable::Editable;
use crate::geom::Ray;
use crate::scene::Scene;

/// Drags a freshly extruded ring along its face normal. The rig starts out
/// dragging and ends on the first mouse-up or leave.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtrudeRig {
    pub(super) handles: Handles,
    pub(super) completion: Option<RigCompletion>,
    normal: DVec3,
    start: DVec3,
    extruding: bool,
}

impl ExtrudeRig {
    #[must_use]
    pub fn new(normal: DVec3, start: DVec3) -> Self {
        Self {
            handles: Handles::default(),
            completion: None,
            normal: normal.normalize_or_zero(),
            start,
            extruding: normal.length_squared() > 0.0,
        }
    }

    #[must_use]
    pub fn normal(&self) -> DVec3 {
        self.normal
    }

    #[must_use]
    pub fn is_extruding(&self) -> bool {
        self.extruding
    }

    pub(super) fn mouse_move(&mut self, ray: &Ray, scene: &mut Scene, target: &Editable) -> bool {
        if !self.extruding {
            return false;
        }
        let anchor = target.position(scene);
        if let Some(p) = Handles::closest_on_axis(anchor, self.normal, ray) {
            target.translate(scene, p - anchor);
        }
        true
    }

    pub(super) fn finish(&mut self, scene: &Scene, target: &Editable) -> bool {
        let captured = self.extruding;
        if captured {
            self.completion = Some(RigCompletion::Extrude { delta: target.position(scene) - self.start });
        }
        self.extruding = false;
        captured
    }
}
