//! A streaming, plugin-driven CSS parser, AST library, and writer.
//!
//! Processing happens in three stages, each independently usable:
//!
//! 1. **Raw parsing** (`raw`) splits source text into a [`ast::Stylesheet`]
//!    of units with their text intact but ungrammared.
//! 2. **Refinement** (`refine`) validates a unit's grammar on demand,
//!    producing structured children (selector parts, property name/value).
//! 3. **Plugin scheduling** (`plugin`) broadcasts every unit over a [`bus`]
//!    so registered plugins can observe, rework, and validate the tree.
//!
//! [`writer`] renders a stylesheet back to text in one of three modes.
//! [`api::process`] wires all of this together for the common case.

pub mod api;
pub mod ast;
pub mod bus;
pub mod cursor;
pub mod error;
pub mod plugin;
pub mod prefix;
pub mod raw;
pub mod refine;
pub mod writer;

pub use api::{process, ProcessArgs, ProcessOutput};
pub use ast::Stylesheet;
pub use error::{Error, ErrorKind, ErrorManager};
pub use writer::WriteMode;
