//! Handler sets and the named handler library

use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::rc::Rc;

use crate::errors::{DispatchResult, RegistrationError};
use crate::routing::CallContext;
use crate::value_objects::ResponseAction;

/// A registered event listener.
///
/// Receives its binding's call context and, for action events, the action
/// that was emitted.
pub type Listener = Rc<dyn Fn(&CallContext, Option<&ResponseAction>) -> DispatchResult<()>>;

/// Ordered mapping from event name to listener
#[derive(Clone, Default)]
pub struct HandlerSet {
    entries: Vec<(String, Listener)>,
}

impl HandlerSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `listener` to `event`
    pub fn on<F>(mut self, event: impl Into<String>, listener: F) -> Self
    where
        F: Fn(&CallContext, Option<&ResponseAction>) -> DispatchResult<()> + 'static,
    {
        let listener: Listener = Rc::new(listener);
        self.entries.push((event.into(), listener));
        self
    }

    /// Bind an already shared listener
    pub fn on_listener(mut self, event: impl Into<String>, listener: Listener) -> Self {
        self.entries.push((event.into(), listener));
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn event_names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    /// A set is a mapping: names must be non-empty and unique
    pub(crate) fn validate(&self, index: usize) -> Result<(), RegistrationError> {
        let mut seen = HashSet::new();
        for (name, _) in &self.entries {
            if name.is_empty() {
                return Err(RegistrationError::InvalidHandlerSet {
                    index,
                    reason: "empty event name".to_string(),
                });
            }
            if !seen.insert(name.as_str()) {
                return Err(RegistrationError::InvalidHandlerSet {
                    index,
                    reason: format!("event '{name}' is bound more than once"),
                });
            }
        }
        Ok(())
    }

    pub(crate) fn into_entries(self) -> Vec<(String, Listener)> {
        self.entries
    }
}

impl fmt::Debug for HandlerSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.event_names()).finish()
    }
}

/// Named handler functions that routing configuration can refer to
#[derive(Clone, Default)]
pub struct HandlerLibrary {
    functions: HashMap<String, Listener>,
}

impl HandlerLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a function under `name`, replacing any previous one
    pub fn register<F>(&mut self, name: impl Into<String>, function: F) -> &mut Self
    where
        F: Fn(&CallContext, Option<&ResponseAction>) -> DispatchResult<()> + 'static,
    {
        let function: Listener = Rc::new(function);
        self.functions.insert(name.into(), function);
        self
    }

    pub fn get(&self, name: &str) -> Option<Listener> {
        self.functions.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    /// Resolve a routing table such as `{"OrderFlowers": "order_flowers"}`.
    ///
    /// The value must be an object and every entry must name a library
    /// function.
    pub fn resolve_set(&self, index: usize, set: &Value) -> Result<HandlerSet, RegistrationError> {
        let Value::Object(routes) = set else {
            return Err(RegistrationError::InvalidHandlerSet {
                index,
                reason: "expected an object of event name to handler".to_string(),
            });
        };

        let mut handlers = HandlerSet::new();
        for (event, target) in routes {
            let listener = target
                .as_str()
                .and_then(|name| self.get(name))
                .ok_or_else(|| RegistrationError::NotCallable {
                    event: event.clone(),
                })?;
            handlers = handlers.on_listener(event.clone(), listener);
        }
        Ok(handlers)
    }
}

impl fmt::Debug for HandlerLibrary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.functions.keys()).finish()
    }
}
