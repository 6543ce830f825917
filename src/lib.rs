//! Lex turn dispatch
//!
//! Mediates one turn of a slot-filling dialog service. A turn request names
//! the intent the platform resolved, its slot values and the session
//! attributes. The dispatcher:
//! - normalizes the request into a [`TurnContext`]
//! - fires the application handler registered for the intent
//! - turns the handler's chosen action (tell, confirm, elicit, delegate) into
//!   one of the four response documents
//! - hands that document to the completion callback
//!
//! Execution is synchronous and single-threaded. Slots and session
//! attributes are shared mappings, so edits made by a handler show up in the
//! delivered document.
//!
//! ```
//! use lex_turn_dispatch::{Dispatcher, HandlerSet};
//! use serde_json::json;
//!
//! let request = json!({
//!     "invocationSource": "FulfillmentCodeHook",
//!     "currentIntent": { "name": "OrderFlowers", "slots": { "FlowerType": "roses" } }
//! });
//! let lex = Dispatcher::new(request, json!({}), |response| {
//!     assert_eq!(response.dialog_action.kind(), "Close");
//! })
//! .unwrap();
//! lex.register_handlers([HandlerSet::new().on("OrderFlowers", |ctx, _| {
//!     ctx.tell("Your roses are on the way")
//! })])
//! .unwrap();
//! lex.execute().unwrap();
//! ```

pub mod config;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod response;
pub mod routing;
pub mod turn;
pub mod value_objects;

// Re-export main types
pub use config::DispatchConfig;
pub use errors::{ConfigError, DispatchError, DispatchResult, RegistrationError};
pub use handlers::{HandlerLibrary, HandlerSet, Listener};
pub use response::{DialogAction, FulfillmentState, ResponseDocument, SpeechPayload};
pub use routing::{CallContext, Dispatcher, EventNaming};
pub use turn::{CompletionCallback, TurnContext};
pub use value_objects::{
    CurrentIntent, InvocationStage, MessageSpec, ResponseAction, SharedMap, TurnRequest,
};
