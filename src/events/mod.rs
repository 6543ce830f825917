//! Built-in event names
//!
//! Application handlers are registered under intent names. The names below
//! are reserved for the response actions and the completion signal; the
//! leading colon keeps them out of the intent namespace.

/// Close the intent with a fulfilled state
pub const TELL: &str = ":tell";

/// Ask the user to confirm an intent
pub const CONFIRM: &str = ":confirm";

/// Ask the user for a slot value
pub const ELICIT: &str = ":elicit";

/// Hand the next step back to the platform
pub const DELEGATE: &str = ":delegate";

/// Completion signal; delivers the pending response
pub const RESPONSE_READY: &str = ":responseReady";

/// Every event the dispatcher registers a built-in listener for
pub const BUILT_IN_EVENTS: [&str; 5] = [TELL, CONFIRM, ELICIT, DELEGATE, RESPONSE_READY];

/// True for names reserved by the built-in response actions
pub fn is_built_in(name: &str) -> bool {
    BUILT_IN_EVENTS.contains(&name)
}
