//! Shared numeric constants for the scene engine.

// ── Geometry ────────────────────────────────────────────────────

/// Below this magnitude a length or axis extent is treated as zero.
pub const EPSILON: f64 = 1e-9;

/// Maximum absolute lean (Y shear) in degrees. At 90° the box collapses to a line.
pub const LEAN_LIMIT_DEG: f64 = 89.0;

/// Interior angles at or below this (degrees) get a miter join region on arbitrary paths.
pub const MITER_JOIN_MAX_DEG: f64 = 150.0;

/// Number of segments used to approximate an ellipse outline.
pub const ELLIPSE_OUTLINE_SEGMENTS: usize = 32;

// ── Interaction defaults ────────────────────────────────────────

/// Hit slop in model units for vertex, border and rotation handles.
pub const HANDLE_RADIUS: f64 = 8.0;

/// Distance from the top edge midpoint to the rotation handle.
pub const ROTATE_HANDLE_OFFSET: f64 = 24.0;

/// A click this close to the first point of an arbitrary path closes it.
pub const CLOSE_PATH_DISTANCE: f64 = 8.0;

/// Drag-created shapes narrower or shorter than this are discarded on finish.
pub const MIN_CREATE_SIZE: f64 = 1.0;
