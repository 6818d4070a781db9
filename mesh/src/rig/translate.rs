use glam::DVec3;

use super::{Axis, Handles, RigCompletion};
use crate::consts::{ARROW_RADIUS, AXIS_LENGTH};
use crate::editable::Editable;
use crate::geom::{self, Ray};
use crate::scene::Scene;

/// Three arrows; dragging one moves the editable along that axis.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TranslateRig {
    pub(super) handles: Handles,
    pub(super) completion: Option<RigCompletion>,
    start: DVec3,
    last: DVec3,
    current: DVec3,
}

impl TranslateRig {
    /// Centre of the arrow-head handle for `axis`.
    #[must_use]
    pub fn handle_centre(&self, anchor: DVec3, axis: Axis) -> DVec3 {
        anchor + axis.unit() * (AXIS_LENGTH + ARROW_RADIUS * 2.0) * self.handles.size
    }

    fn handle_radius(&self) -> f64 {
        ARROW_RADIUS * 2.0 * self.handles.size
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
                let delta = self.current - self.last;
                self.last = self.current;
                target.translate(scene, delta);
            }
            return true;
        }

        let radius = self.handle_radius();
        for axis in Axis::ALL {
            self.handles.hover[axis.index()] = geom::intersect_sphere(ray, self.handle_centre(anchor, axis), radius);
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
        self.start = self.current;
        true
    }

    pub(super) fn finish(&mut self) -> bool {
        let captured = self.handles.dragging();
        if captured {
            self.completion = Some(RigCompletion::Translate { delta: self.current - self.start });
        }
        self.handles.release();
        captured
    }
}
