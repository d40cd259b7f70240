//! Orchestrates parse -> check -> emit for one compilation run; the thin
//! shell around `language/checker`'s core that makes the CLI's `compile`
//! verb runnable end-to-end.

pub mod emitter;
pub mod runner;

pub use emitter::{Emitter, RustEmitter};
pub use runner::{run, CompileError};
