//! Editable mesh model and manipulation engine for the collaborative editor.
//!
//! This crate owns everything a peer needs to hold and edit a scene locally:
//! the winged vertex/edge/face representation, the scene arena that owns
//! objects, ray and frustum picking, the selection/mode posture, and the
//! interactive rigs that turn pointer rays into geometric edits. It performs
//! no I/O. The `executor` crate applies network messages against a [`Scene`]
//! and emits commands for the edits made here.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`geom`] | Stateless ray/plane/sphere/cube/triangle queries |
//! | [`ids`] | Monotonic id allocators owned by scenes and objects |
//! | [`object`] | Vertex/Edge/Face/Object entities, transforms, delete cascade, serialization |
//! | [`topology`] | Extrude, connect and merge |
//! | [`factory`] | Cube, sphere, pyramid and quad primitives |
//! | [`scene`] | Scene arena, presence, locks, textures, snapshots |
//! | [`editable`] | Selectable things and groups of them |
//! | [`mode`] | Object/part selection posture |
//! | [`pick`] | Ray and frustum picking |
//! | [`rig`] | Translate/rotate/scale/extrude interaction state machines |
//! | [`consts`] | Shared numeric constants (pick radii, rig geometry, defaults) |
//! | [`error`] | `MeshError` and the `ErrorCode` trait |

pub mod consts;
pub mod editable;
pub mod error;
pub mod factory;
pub mod geom;
pub mod ids;
pub mod mode;
pub mod object;
pub mod pick;
pub mod rig;
pub mod scene;
pub mod topology;

pub use editable::{Editable, EditableGroup, EditableKind};
pub use error::{ErrorCode, MeshError};
pub use geom::Ray;
pub use mode::Mode;
pub use object::{Edge, EdgeRef, Face, Object, ObjectId, PartId, PartKind, UvPoint, Vertex};
pub use pick::{Frustum, Hit, Plane};
pub use rig::{Axis, Rig, RigColour, RigCompletion};
pub use scene::{PaintStroke, Permissions, Primitive, Scene, SceneData, TextureState};
pub use topology::ExtrudeResult;

pub use glam::{DMat4, DQuat, DVec3};
