//! Geometry core for a vector-graphics scene editor.
//!
//! Shapes carry a persisted model (sheared, unrotated coordinates plus angles)
//! and a derived cache of world geometry. The scene store owns the shapes,
//! keeps their draw order, and cascades group transforms to descendants.
//! Rendering and input wiring belong to the host.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`scene`] | Scene store, draw-order list, grouping, layering, stage |
//! | [`element`] | Element model, derived cache, transforms and creation |
//! | [`math`] | Points, angles, shear, frame transforms, hit-test primitives |
//! | [`config`] | Editor tolerances read from the environment |
//! | [`error`] | Scene and config error types |
//! | [`consts`] | Shared numeric constants (epsilon, lean limit, handle sizes, etc.) |

pub mod config;
pub mod consts;
pub mod element;
pub mod error;
pub mod math;
pub mod scene;

pub use config::EditorConfig;
pub use element::{Changed, ControlHandle, Element, ElementId, ElementModel, ElementStatus, ShapeKind};
pub use error::{ConfigError, SceneError};
pub use math::Point;
pub use scene::{SceneStore, Stage};
