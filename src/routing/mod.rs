//! Turn routing: event-name derivation and listener dispatch

pub mod dispatcher;
pub mod strategies;

pub use dispatcher::{CallContext, Dispatcher};
pub use strategies::EventNaming;
