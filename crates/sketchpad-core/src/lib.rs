//! Sketchpad Core Library
//!
//! Shape model, pointer interaction and persistence for the Sketchpad
//! drawing engine. Rendering lives in `sketchpad-render`.

pub mod config;
pub mod controller;
pub mod geometry;
pub mod shapes;
pub mod storage;
pub mod surface;
pub mod tools;

pub use config::EngineConfig;
pub use controller::{Effect, InteractionState, PointerEvent, Transition};
pub use shapes::{Color, Shape, ShapeId, ShapeKind, ShapeStyle};
pub use storage::{IdentityToken, SketchStore, StorageError, StorageResult};
pub use surface::{DrawingSurface, PointerOutcome, Viewport};
pub use tools::{InProgressShape, ToolKind, ToolSettings};
