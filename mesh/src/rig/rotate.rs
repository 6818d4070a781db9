use glam::{DQuat, DVec3};

use super::{Axis, Handles, RigCompletion};
use crate::consts::{LINE_EPSILON, RING_TOLERANCE};
use crate::editable::Editable;
use crate::geom::{self, Ray};
use crate::scene::Scene;

/// Three rings of radius one around the coordinate axes. Dragging a ring
/// rotates the editable about that axis, through its position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RotateRig {
    pub(super) handles: Handles,
    pub(super) completion: Option<RigCompletion>,
    start_angle: f64,
    last_angle: f64,
    current_angle: f64,
}

impl RotateRig {
    /// Ring under the ray. Among rings whose band the ray crosses, the one
    /// crossed nearest the ray origin wins.
    fn ring_hit(&self, anchor: DVec3, ray: &Ray) -> Option<Axis> {
        let size = self.handles.size;
        Axis::ALL
            .into_iter()
            .filter_map(|axis| {
                let p = geom::intersect_plane(ray, axis.unit(), anchor);
                let radius = p.distance(anchor) / size;
                let along = p.distance(ray.origin) / size;
                ((radius - 1.0).abs() < RING_TOLERANCE).then_some((axis, along))
            })
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(axis, _)| axis)
    }

    /// Where the ray meets the plane of `axis`, pulled out to the ring's
    /// inner edge when it falls inside the ring.
    fn cursor(&self, anchor: DVec3, axis: Axis, ray: &Ray) -> DVec3 {
        let size = self.handles.size;
        let offset = geom::intersect_plane(ray, axis.unit(), anchor) - anchor;
        let d = offset.length();
        if d < size && d > LINE_EPSILON {
            anchor + offset * ((1.0 - RING_TOLERANCE) / d * size)
        } else {
            anchor + offset
        }
    }

    /// Angle of `cursor` around `axis`, measured so a positive change is a
    /// positive rotation about the axis.
    fn angle(anchor: DVec3, axis: Axis, cursor: DVec3) -> f64 {
        let d = cursor - anchor;
        match axis {
            Axis::X => d.z.atan2(d.y),
            Axis::Y => d.x.atan2(d.z),
            Axis::Z => d.y.atan2(d.x),
        }
    }

    pub(super) fn mouse_move(&mut self, ray: &Ray, scene: &mut Scene, target: &Editable) -> bool {
        let anchor = target.position(scene);
        if let Some(axis) = self.handles.active() {
            let angle = Self::angle(anchor, axis, self.cursor(anchor, axis, ray));
            // a ray parallel to the ring plane has no cursor
            if angle.is_finite() {
                self.last_angle = self.current_angle;
                self.current_angle = angle;
                let step = self.current_angle - self.last_angle;
                target.rotate_about(scene, DQuat::from_axis_angle(axis.unit(), step), anchor);
            }
            return true;
        }

        let hit = self.ring_hit(anchor, ray);
        self.handles.hover = Axis::ALL.map(|a| Some(a) == hit);
        hit.is_some()
    }

    pub(super) fn mouse_down(&mut self, ray: &Ray, scene: &mut Scene, target: &Editable) -> bool {
        let anchor = target.position(scene);
        let Some(axis) = self.ring_hit(anchor, ray) else {
            return false;
        };
        self.handles.hover = Axis::ALL.map(|a| a == axis);
        self.handles.select_hovered();
        let cursor = self.cursor(anchor, axis, ray);
        self.current_angle = Self::angle(anchor, axis, cursor);
        self.start_angle = self.current_angle;
        self.last_angle = self.current_angle;
        true
    }

    pub(super) fn finish(&mut self) -> bool {
        let Some(axis) = self.handles.active() else {
            return false;
        };
        let rotation = DQuat::from_axis_angle(axis.unit(), self.current_angle - self.start_angle);
        self.completion = Some(RigCompletion::Rotate { rotation });
        self.handles.release();
        true
    }
}
