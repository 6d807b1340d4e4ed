//! InkCalc Core Library
//!
//! Sketch capture, solver orchestration and result placement for the InkCalc
//! handwritten-math canvas. Platform-agnostic: hosts feed pointer events in,
//! supply a solver and a typesetter, and read labels back out.

pub mod bindings;
pub mod bounds;
pub mod color;
pub mod config;
pub mod input;
pub mod overlay;
pub mod session;
pub mod solver;
pub mod surface;

pub use bindings::VariableBindings;
pub use bounds::{BoundingBox, find_bounds};
pub use color::InkColor;
pub use config::{ConfigError, SessionConfig};
pub use input::{DrawMode, DrawState, InputRouter, PointerEvent, PointerSource};
pub use overlay::{DisplayLabel, MathTypesetter, NullTypesetter, OverlayError, OverlayPlacer};
pub use session::{SessionEvent, SessionUpdate, SketchSession, SolveStatus};
pub use solver::{HttpSolver, ResultItem, SolveError, SolveRequest, Solver};
pub use surface::{RasterSnapshot, Surface, SurfaceError};
