//! Turn handlers
//!
//! Application handlers are grouped into [`HandlerSet`]s, or named in a
//! [`HandlerLibrary`] so routing configuration can refer to them. The
//! built-in response action handlers live in [`response_handlers`].

pub mod registry;
pub mod response_handlers;

pub use registry::{HandlerLibrary, HandlerSet, Listener};
pub use response_handlers::built_in_handlers;
