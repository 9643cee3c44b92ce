//! Implicit suffix-rule resolution for make-style build graphs.
//!
//! Declared suffixes and transformation rules form a suffix graph. For a
//! target with no explicit recipe the engine searches that graph
//! breadth-first for an existing source, then binds the chain of
//! intermediate targets, commands and local variables into the build graph.

mod archive;
mod binder;
mod dump;
mod resolve;

pub mod candidate;
pub mod config;
pub mod diagnostics;
pub mod errors;
pub mod graph;
pub mod hooks;
pub mod plan;
pub mod search_path;
pub mod session;
pub mod suffix;
pub mod transform;

pub use candidate::*;
pub use config::*;
pub use diagnostics::*;
pub use errors::*;
pub use graph::*;
pub use hooks::*;
pub use plan::*;
pub use search_path::*;
pub use session::*;
pub use suffix::*;
pub use transform::*;
