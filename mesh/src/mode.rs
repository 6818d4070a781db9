//! Selection posture: what a click or a drag-box is allowed to pick.
//!
//! Two families are mutually exclusive. The object family (`object`,
//! `object_group`) picks whole objects; the parts family (`vertex`, `edge`,
//! `face`, `parts_group`) picks parts. `paint` is a face-picking posture of
//! its own. Toggling a single part kind flips the family as a side effect.

#[cfg(test)]
#[path = "mode_test.rs"]
mod mode_test;

use crate::object::PartKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Flags {
    object: bool,
    paint: bool,
    vertex: bool,
    edge: bool,
    face: bool,
    parts_group: bool,
    object_group: bool,
}

impl Flags {
    const ALL_PARTS: Self = Self {
        object: false,
        paint: false,
        vertex: true,
        edge: true,
        face: true,
        parts_group: true,
        object_group: false,
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mode {
    pub object: bool,
    pub paint: bool,
    pub vertex: bool,
    pub edge: bool,
    pub face: bool,
    pub parts_group: bool,
    pub object_group: bool,
    /// Posture to return to when leaving object mode, when it was not the
    /// everything-selectable default.
    stash: Option<Flags>,
}

impl Default for Mode {
    fn default() -> Self {
        Self {
            object: true,
            paint: false,
            vertex: false,
            edge: false,
            face: false,
            parts_group: false,
            object_group: true,
            stash: None,
        }
    }
}

impl Mode {
    fn flags(&self) -> Flags {
        Flags {
            object: self.object,
            paint: self.paint,
            vertex: self.vertex,
            edge: self.edge,
            face: self.face,
            parts_group: self.parts_group,
            object_group: self.object_group,
        }
    }

    fn set_flags(&mut self, f: Flags) {
        self.object = f.object;
        self.paint = f.paint;
        self.vertex = f.vertex;
        self.edge = f.edge;
        self.face = f.face;
        self.parts_group = f.parts_group;
        self.object_group = f.object_group;
    }

    /// Flip between the object family and the parts family.
    ///
    /// Leaving object mode selects every part kind, unless object mode was
    /// entered from some other parts posture, which is then restored.
    pub fn toggle_object(&mut self) {
        if self.object {
            let back = self.stash.take().unwrap_or(Flags::ALL_PARTS);
            self.set_flags(back);
        } else {
            let current = self.flags();
            self.stash = (current != Flags::ALL_PARTS).then_some(current);
            self.object = true;
            self.object_group = true;
            self.vertex = false;
            self.edge = false;
            self.face = false;
            self.parts_group = false;
            self.paint = false;
        }
    }

    /// Enter or leave paint posture. Leaving returns to object mode.
    pub fn toggle_paint(&mut self) {
        self.stash = None;
        if self.paint {
            self.set_flags(Self::default().flags());
        } else {
            self.set_flags(Flags {
                object: false,
                paint: true,
                vertex: false,
                edge: false,
                face: false,
                parts_group: true,
                object_group: false,
            });
        }
    }

    /// Go to object mode if not already there.
    pub fn set_object(&mut self) {
        if !self.object {
            self.toggle_object();
        }
    }

    pub fn toggle_vertex(&mut self) {
        self.vertex = !self.vertex;
        self.refresh_family();
    }

    pub fn toggle_edge(&mut self) {
        self.edge = !self.edge;
        self.refresh_family();
    }

    pub fn toggle_face(&mut self) {
        self.face = !self.face;
        self.refresh_family();
    }

    fn refresh_family(&mut self) {
        self.stash = None;
        self.parts_group = self.vertex || self.edge || self.face;
        self.object = !self.parts_group;
        self.object_group = !self.parts_group;
        self.paint = false;
    }

    /// Whether hits on parts of `kind` survive filtering.
    #[must_use]
    pub fn allows(&self, kind: PartKind) -> bool {
        match kind {
            PartKind::Vertex => self.vertex,
            PartKind::Edge => self.edge,
            PartKind::Face => self.face || self.paint,
        }
    }

    /// Whether any part kind is pickable.
    #[must_use]
    pub fn is_parts(&self) -> bool {
        self.vertex || self.edge || self.face || self.paint
    }
}
