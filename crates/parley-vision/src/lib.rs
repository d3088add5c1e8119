//! Parley vision crate - image analysis and image chat on top of a backend.
//!
//! `interpret` pulls the labeled fields out of free-text model output;
//! `SceneAnalyzer` runs the two vision flows end to end.

pub mod analyzer;
pub mod interpreter;

pub use analyzer::SceneAnalyzer;
pub use interpreter::interpret;
