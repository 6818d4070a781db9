//! Shared numeric constants for the mesh crate.

// ── Geometry ────────────────────────────────────────────────────

/// Rays whose direction is this close to parallel with a triangle plane are rejected.
pub const PARALLEL_EPSILON: f64 = 1e-4;

/// Below this determinant two lines are treated as parallel.
pub const LINE_EPSILON: f64 = 1e-12;

// ── Picking ─────────────────────────────────────────────────────

/// World-space radius of the sphere a vertex is picked with.
pub const VERTEX_PICK_RADIUS: f64 = 0.05;

/// World-space distance from the ray within which an edge counts as hit.
pub const EDGE_PICK_RADIUS: f64 = 0.03;

// ── Rigs ────────────────────────────────────────────────────────

/// Length of a rig axis before the handle, in rig units.
pub const AXIS_LENGTH: f64 = 1.0;

/// Radius of the translate rig's arrow head, in rig units.
pub const ARROW_RADIUS: f64 = 0.05;

/// Half-width of the rotate rig's ring band, relative to the ring radius.
pub const RING_TOLERANCE: f64 = 0.03;

/// Edge length of the scale rig's cube handles, in rig units.
pub const SCALE_HANDLE_EDGE: f64 = 0.1;

/// Rig size is the eye distance divided by this.
pub const RIG_SIZE_DIVISOR: f64 = 8.0;

/// Smallest rig size, for an eye sitting on the anchor.
pub const MIN_RIG_SIZE: f64 = 1e-6;

// ── Primitives ──────────────────────────────────────────────────

/// Half extents of the cube created by a `create` command.
pub const DEFAULT_CUBE_HALF: f64 = 0.5;

/// Radius of the sphere created by a `create` command.
pub const DEFAULT_SPHERE_RADIUS: f64 = 0.5;

/// Slices and stacks of the sphere created by a `create` command.
pub const DEFAULT_SPHERE_SEGMENTS: u32 = 16;

/// Half extents of the pyramid created by a `create` command.
pub const DEFAULT_PYRAMID_HALF: f64 = 0.5;

/// Half extents of the quad created by a `create` command.
pub const DEFAULT_QUAD_HALF: f64 = 0.5;
