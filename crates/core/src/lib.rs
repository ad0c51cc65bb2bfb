//! Pure domain logic for the Fabula generation platform.
//!
//! Everything in this crate is synchronous and free of I/O: image
//! composition geometry and blending, prompt scaffolding, scene
//! keyword extraction, and the step-record state machine used by the
//! pipeline's audit ledger. Remote services and persistence live in
//! the `fabula-providers` and `fabula-pipeline` crates.

pub mod audio;
pub mod collage;
pub mod compose;
pub mod enhance;
pub mod error;
pub mod prompt;
pub mod scene_context;
pub mod steps;
pub mod story;
pub mod types;
