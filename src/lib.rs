//! Screenshot annotation engine: the document model, tools, undo history
//! and a deterministic compositor, independent of any windowing toolkit.

pub mod annotation;
pub mod canvas;
pub mod compositor;
pub mod config;
pub mod dispatch;
pub mod document;
pub mod error;
pub mod geometry;
pub mod history;
pub mod imaging;
pub mod render;
pub mod style;
pub mod tools;
pub mod view;

pub use canvas::{Canvas, Status};
pub use config::{AppConfig, EditorContext};
pub use document::{Document, EditorEvent};
pub use error::{EditorError, Result};
pub use tools::ToolKind;
