//! The scene: every element, their draw order, selection and stage.

pub mod list;
pub mod store;

pub use list::ElementList;
pub use store::{SceneStore, Stage};
