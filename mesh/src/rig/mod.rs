//! Interactive rigs: on-screen handles that turn pointer rays into edits.
//!
//! DESIGN
//! ======
//! A rig is driven by the host with one call per pointer event. Each call
//! gets the ray under the pointer, the scene and the editable being
//! manipulated. Rigs edit the scene directly while dragging (the optimistic
//! local edit) and, when a drag ends, leave a [`RigCompletion`] describing
//! the whole gesture for the host to turn into a network command.
//!
//! All rig kinds share the same states: idle, hovering an axis handle, and
//! dragging a selected axis. `mouse_down` only captures when a handle is
//! hovered, and `mouse_up` reports whether a drag was in progress, so
//! uncaptured events fall through to scene picking.
//!
//! Handle geometry is expressed in rig units and multiplied by the rig size,
//! which tracks the eye distance so the rig keeps a constant on-screen size.

mod extrude;
mod rotate;
mod scale;
mod translate;


use glam::{DQuat, DVec3};

use crate::consts::{MIN_RIG_SIZE, RIG_SIZE_DIVISOR};
use crate::editable::Editable;
use crate::geom::{self, Ray};
use crate::scene::Scene;

pub use extrude::ExtrudeRig;
pub use rotate::RotateRig;
pub use scale::ScaleRig;
pub use translate::TranslateRig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    #[must_use]
    pub fn unit(self) -> DVec3 {
        match self {
            Self::X => DVec3::X,
            Self::Y => DVec3::Y,
            Self::Z => DVec3::Z,
        }
    }

    #[must_use]
    pub fn index(self) -> usize {
        match self {
            Self::X => 0,
            Self::Y => 1,
            Self::Z => 2,
        }
    }
}

/// How a handle should be drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RigColour {
    Idle(Axis),
    Hover(Axis),
    Selected,
}

impl RigColour {
    /// Dark axis colour when idle, bright when hovered, yellow when selected.
    #[must_use]
    pub fn rgb(self) -> [f32; 3] {
        match self {
            Self::Idle(Axis::X) => [0.6, 0.0, 0.0],
            Self::Idle(Axis::Y) => [0.0, 0.6, 0.0],
            Self::Idle(Axis::Z) => [0.0, 0.0, 0.6],
            Self::Hover(Axis::X) => [1.0, 0.0, 0.0],
            Self::Hover(Axis::Y) => [0.0, 1.0, 0.0],
            Self::Hover(Axis::Z) => [0.0, 0.0, 1.0],
            Self::Selected => [1.0, 1.0, 0.0],
        }
    }
}

/// Summary of a finished drag, in world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RigCompletion {
    /// Total displacement since mouse-down.
    Translate { delta: DVec3 },
    /// Total rotation since mouse-down, about the editable's position.
    Rotate { rotation: DQuat },
    /// Total per-axis factor since mouse-down and the pivot it was applied around.
    Scale { factor: DVec3, pivot: DVec3 },
    /// Displacement of the extruded ring along its normal.
    Extrude { delta: DVec3 },
}

// =============================================================================
// SHARED STATE
// =============================================================================

/// Per-axis hover and selection flags plus rig size, shared by every rig kind.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Handles {
    pub(crate) size: f64,
    pub(crate) hover: [bool; 3],
    pub(crate) selected: [bool; 3],
}

impl Default for Handles {
    fn default() -> Self {
        Self { size: 1.0, hover: [false; 3], selected: [false; 3] }
    }
}

impl Handles {
    pub(crate) fn hovering(&self) -> bool {
        self.hover.iter().any(|h| *h)
    }

    pub(crate) fn dragging(&self) -> bool {
        self.selected.iter().any(|s| *s)
    }

    /// The axis being dragged. X wins over Y over Z if several are selected.
    pub(crate) fn active(&self) -> Option<Axis> {
        Axis::ALL.into_iter().find(|a| self.selected[a.index()])
    }

    pub(crate) fn select_hovered(&mut self) {
        self.selected = self.hover;
    }

    pub(crate) fn release(&mut self) {
        self.selected = [false; 3];
    }

    pub(crate) fn colour(&self, axis: Axis) -> RigColour {
        if self.selected[axis.index()] {
            RigColour::Selected
        } else if self.hover[axis.index()] {
            RigColour::Hover(axis)
        } else {
            RigColour::Idle(axis)
        }
    }

    /// Point on the line through `anchor` along `axis` closest to `ray`.
    pub(crate) fn closest_on_axis(anchor: DVec3, axis: DVec3, ray: &Ray) -> Option<DVec3> {
        geom::get_closest(&Ray::new(anchor, axis), ray).map(|c| c.p0)
    }
}

// =============================================================================
// RIG
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum Rig {
    Translate(TranslateRig),
    Rotate(RotateRig),
    Scale(ScaleRig),
    Extrude(ExtrudeRig),
}

impl Rig {
    #[must_use]
    pub fn translate() -> Self {
        Self::Translate(TranslateRig::default())
    }

    #[must_use]
    pub fn rotate() -> Self {
        Self::Rotate(RotateRig::default())
    }

    #[must_use]
    pub fn scale() -> Self {
        Self::Scale(ScaleRig::default())
    }

    /// Extrude rig already dragging along `normal`, anchored where the
    /// extruded editable currently sits.
    #[must_use]
    pub fn extrude(normal: DVec3, scene: &Scene, target: &Editable) -> Self {
        Self::Extrude(ExtrudeRig::new(normal, target.position(scene)))
    }

    fn handles(&self) -> &Handles {
        match self {
            Self::Translate(r) => &r.handles,
            Self::Rotate(r) => &r.handles,
            Self::Scale(r) => &r.handles,
            Self::Extrude(r) => &r.handles,
        }
    }

    fn handles_mut(&mut self) -> &mut Handles {
        match self {
            Self::Translate(r) => &mut r.handles,
            Self::Rotate(r) => &mut r.handles,
            Self::Scale(r) => &mut r.handles,
            Self::Extrude(r) => &mut r.handles,
        }
    }

    /// Rescale the handles for an eye at `eye` looking at `anchor`.
    pub fn set_eye(&mut self, eye: DVec3, anchor: DVec3) {
        self.handles_mut().size = (eye.distance(anchor) / RIG_SIZE_DIVISOR).max(MIN_RIG_SIZE);
    }

    #[must_use]
    pub fn size(&self) -> f64 {
        self.handles().size
    }

    #[must_use]
    pub fn colour(&self, axis: Axis) -> RigColour {
        self.handles().colour(axis)
    }

    /// Whether a drag is in progress.
    #[must_use]
    pub fn is_dragging(&self) -> bool {
        match self {
            Self::Extrude(r) => r.is_extruding(),
            other => other.handles().dragging(),
        }
    }

    pub fn mouse_enter(&mut self, _ray: &Ray) {}

    /// Update hover, or apply the incremental edit while dragging.
    /// Returns whether the event was captured.
    pub fn mouse_move(&mut self, ray: &Ray, scene: &mut Scene, target: &Editable) -> bool {
        match self {
            Self::Translate(r) => r.mouse_move(ray, scene, target),
            Self::Rotate(r) => r.mouse_move(ray, scene, target),
            Self::Scale(r) => r.mouse_move(ray, scene, target),
            Self::Extrude(r) => r.mouse_move(ray, scene, target),
        }
    }

    /// Start dragging the hovered handle. Returns whether the event was captured.
    pub fn mouse_down(&mut self, ray: &Ray, scene: &mut Scene, target: &Editable) -> bool {
        match self {
            Self::Translate(r) => r.mouse_down(ray, scene, target),
            Self::Rotate(r) => r.mouse_down(ray, scene, target),
            Self::Scale(r) => r.mouse_down(ray, scene, target),
            Self::Extrude(_) => false,
        }
    }

    /// End the drag and record its completion. Returns whether a drag was in progress.
    pub fn mouse_up(&mut self, _ray: &Ray, scene: &mut Scene, target: &Editable) -> bool {
        self.finish(scene, target)
    }

    /// Same completion path as `mouse_up`, then clear hover.
    pub fn mouse_leave(&mut self, scene: &mut Scene, target: &Editable) {
        self.finish(scene, target);
        self.handles_mut().hover = [false; 3];
    }

    fn finish(&mut self, scene: &Scene, target: &Editable) -> bool {
        match self {
            Self::Translate(r) => r.finish(),
            Self::Rotate(r) => r.finish(),
            Self::Scale(r) => r.finish(),
            Self::Extrude(r) => r.finish(scene, target),
        }
    }

    /// The completion of the last finished drag, if not yet taken.
    pub fn take_completion(&mut self) -> Option<RigCompletion> {
        match self {
            Self::Translate(r) => r.completion.take(),
            Self::Rotate(r) => r.completion.take(),
            Self::Scale(r) => r.completion.take(),
            Self::Extrude(r) => r.completion.take(),
        }
    }
}
