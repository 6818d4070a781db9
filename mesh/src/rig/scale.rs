use glam::DVec3;

use super::{Axis, Handles, RigCompletion};
use crate::consts::{LINE_EPSILON, SCALE_HANDLE_EDGE};
use crate::editable::Editable;
use crate::geom::{self, Ray};
use crate::scene::Scene;

/// Three cube handles at the axis tips. Dragging one stretches the editable
/// along that axis about its position.
///
/// The gesture accumulates a per-axis scale from a mouse-down baseline of
/// one; each frame applies the ratio of the new accumulated scale to the
/// previous one, and the completion reports the accumulated total together
/// with the pivot captured at mouse-down.
#[derive(Debug, Clone, PartialEq)]
pub struct ScaleRig {
    pub(super) handles: Handles,
    pub(super) completion: Option<RigCompletion>,
    last: DVec3,
    current: DVec3,
    accumulated: DVec3,
    pivot: DVec3,
}

impl Default for ScaleRig {
    fn default() -> Self {
        Self {
            handles: Handles::default(),
            completion: None,
            last: DVec3::ZERO,
            current: DVec3::ZERO,
            accumulated: DVec3::ONE,
            pivot: DVec3::ZERO,
        }
    }
}

impl ScaleRig {
    /// Centre of the cube handle for `axis`; it rides out with the scale being dragged.
    #[must_use]
    pub fn handle_centre(&self, anchor: DVec3, axis: Axis) -> DVec3 {
        anchor + axis.unit() * self.accumulated[axis.index()] * self.handles.size
    }

    fn grab(&self, anchor: DVec3, ray: &Ray) -> Option<DVec3> {
        let axis = self.handles.active()?;
        Handles::closest_on_axis(anchor, axis.unit(), ray)
    }

    pub(super) fn mouse_move(&mut self, ray: &Ray, scene: &mut Scene, target: &Editable) -> bool {
        let anchor = target.position(scene);
        if self.handles.dragging() {
            if let Some(p) = self.grab(anchor, ray) {
                self.current = p;
                let d = (self.current - self.last) / self.handles.size;
                self.last = self.current;
                let next = self.accumulated + d;
                if next.abs().min_element() > LINE_EPSILON {
                    target.scale_about(scene, next / self.accumulated, anchor);
                    self.accumulated = next;
                }
            }
            return true;
        }

        let edge = SCALE_HANDLE_EDGE * self.handles.size;
        for axis in Axis::ALL {
            self.handles.hover[axis.index()] = geom::intersect_cube(ray, self.handle_centre(anchor, axis), edge);
        }
        self.handles.hovering()
    }

    pub(super) fn mouse_down(&mut self, ray: &Ray, scene: &mut Scene, target: &Editable) -> bool {
        if !self.handles.hovering() {
            return false;
        }
        self.handles.select_hovered();
        let anchor = target.position(scene);
        self.current = self.grab(anchor, ray).unwrap_or(anchor);
        self.last = self.current;
        self.pivot = anchor;
        true
    }

    pub(super) fn finish(&mut self) -> bool {
        let captured = self.handles.dragging();
        if captured {
            self.completion = Some(RigCompletion::Scale { factor: self.accumulated, pivot: self.pivot });
        }
        self.handles.release();
        self.accumulated = DVec3::ONE;
        captured
    }
}
