//! Turn dispatcher
//!
//! Holds an ordered listener table keyed by event name. `execute()` derives
//! the turn's event name and fires every listener registered for it;
//! listeners may emit further events in-line, which run to completion before
//! the emitting call returns.

use serde_json::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};
use tracing::{debug, info_span, warn};

use super::strategies::EventNaming;
use crate::config::DispatchConfig;
use crate::errors::{DispatchError, DispatchResult, RegistrationError};
use crate::events::is_built_in;
use crate::handlers::{HandlerLibrary, HandlerSet, Listener, built_in_handlers};
use crate::response::ResponseDocument;
use crate::turn::TurnContext;
use crate::value_objects::{MessageSpec, ResponseAction, SharedMap, TurnRequest};

/// Data a listener sees when it fires.
///
/// Bound once per registration. The dispatcher reference is weak: a call
/// context never keeps its dispatcher alive.
pub struct CallContext {
    name: String,
    event: Rc<TurnRequest>,
    context: Rc<Value>,
    attributes: SharedMap,
    slots: SharedMap,
    handler: Weak<DispatchCore>,
}

impl CallContext {
    /// Event name this listener is bound to
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The turn request
    pub fn event(&self) -> &TurnRequest {
        &self.event
    }

    /// The opaque execution environment
    pub fn context(&self) -> &Value {
        &self.context
    }

    pub fn attributes(&self) -> &SharedMap {
        &self.attributes
    }

    pub fn slots(&self) -> &SharedMap {
        &self.slots
    }

    /// The dispatcher this listener is registered on
    pub fn handler(&self) -> DispatchResult<Dispatcher> {
        self.handler
            .upgrade()
            .map(|core| Dispatcher { core })
            .ok_or_else(|| DispatchError::DispatcherReleased {
                event: self.name.clone(),
            })
    }

    /// Fire `name` synchronously on the owning dispatcher
    pub fn emit(&self, name: &str, action: Option<ResponseAction>) -> DispatchResult<()> {
        self.handler()?.emit(name, action)
    }

    /// True when more than one listener is registered for this name
    pub fn is_overridden(&self) -> bool {
        self.handler
            .upgrade()
            .map(|core| core.listener_count(&self.name) > 1)
            .unwrap_or(false)
    }

    /// Emit `action` under its own event name
    pub fn act(&self, action: ResponseAction) -> DispatchResult<()> {
        self.emit(action.event_name(), Some(action))
    }

    /// Close the intent with a message
    pub fn tell(&self, message: impl Into<MessageSpec>) -> DispatchResult<()> {
        self.act(ResponseAction::Tell {
            message: Some(message.into()),
        })
    }

    pub fn confirm(
        &self,
        intent_name: impl Into<String>,
        message: Option<MessageSpec>,
    ) -> DispatchResult<()> {
        self.act(ResponseAction::Confirm {
            intent_name: intent_name.into(),
            message,
        })
    }

    pub fn elicit(
        &self,
        slot_name: impl Into<String>,
        message: Option<MessageSpec>,
    ) -> DispatchResult<()> {
        self.act(ResponseAction::Elicit {
            slot_name: slot_name.into(),
            message,
        })
    }

    pub fn delegate(&self) -> DispatchResult<()> {
        self.act(ResponseAction::Delegate)
    }
}

impl fmt::Debug for CallContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallContext")
            .field("name", &self.name)
            .field("attributes", &self.attributes)
            .field("slots", &self.slots)
            .finish()
    }
}

struct Binding {
    context: CallContext,
    listener: Listener,
}

struct DispatchCore {
    turn: TurnContext,
    naming: EventNaming,
    listeners: RefCell<HashMap<String, Vec<Rc<Binding>>>>,
}

impl DispatchCore {
    fn listener_count(&self, name: &str) -> usize {
        self.listeners.borrow().get(name).map_or(0, Vec::len)
    }
}

/// Dispatches one dialog turn to its handlers.
///
/// Cloning yields another handle to the same dispatcher.
#[derive(Clone)]
pub struct Dispatcher {
    core: Rc<DispatchCore>,
}

impl Dispatcher {
    /// Create a dispatcher for a raw JSON turn request
    pub fn new<F>(request: Value, environment: Value, callback: F) -> DispatchResult<Self>
    where
        F: FnOnce(ResponseDocument) + 'static,
    {
        let turn = TurnContext::new(request, environment, callback)?;
        Self::from_turn(turn, EventNaming::default())
    }

    /// Create a dispatcher using the naming policy from `config`
    pub fn with_config<F>(
        request: Value,
        environment: Value,
        callback: F,
        config: &DispatchConfig,
    ) -> DispatchResult<Self>
    where
        F: FnOnce(ResponseDocument) + 'static,
    {
        let turn = TurnContext::new(request, environment, callback)?;
        Self::from_turn(turn, config.event_naming)
    }

    /// Wrap an existing turn context and register the built-in handlers
    pub fn from_turn(turn: TurnContext, naming: EventNaming) -> DispatchResult<Self> {
        let dispatcher = Self {
            core: Rc::new(DispatchCore {
                turn,
                naming,
                listeners: RefCell::new(HashMap::new()),
            }),
        };
        dispatcher.register_handlers([built_in_handlers()])?;
        Ok(dispatcher)
    }

    pub fn turn(&self) -> &TurnContext {
        &self.core.turn
    }

    pub fn event_naming(&self) -> EventNaming {
        self.core.naming
    }

    /// The pending response, if an action has produced one
    pub fn response(&self) -> Option<ResponseDocument> {
        self.core.turn.pending_response()
    }

    /// Replace the pending response; fails once the turn is delivered
    pub fn set_response(&self, response: ResponseDocument) -> DispatchResult<()> {
        self.core.turn.set_pending_response(response)
    }

    pub fn listener_count(&self, name: &str) -> usize {
        self.core.listener_count(name)
    }

    /// Add listeners from each handler set.
    ///
    /// Listeners are appended, never replaced. A set is validated in full
    /// before any of its listeners is added, so a failing set leaves earlier
    /// sets registered and itself unregistered.
    pub fn register_handlers<I>(&self, sets: I) -> Result<(), RegistrationError>
    where
        I: IntoIterator<Item = HandlerSet>,
    {
        for (index, set) in sets.into_iter().enumerate() {
            self.register_set(index, set)?;
        }
        Ok(())
    }

    /// Add listeners from routing tables that name `library` functions
    pub fn register_routes(
        &self,
        library: &HandlerLibrary,
        routes: &[Value],
    ) -> Result<(), RegistrationError> {
        for (index, route) in routes.iter().enumerate() {
            let set = library.resolve_set(index, route)?;
            self.register_set(index, set)?;
        }
        Ok(())
    }

    fn register_set(&self, index: usize, set: HandlerSet) -> Result<(), RegistrationError> {
        set.validate(index)?;
        for (name, listener) in set.into_entries() {
            self.bind(name, listener);
        }
        Ok(())
    }

    fn bind(&self, name: String, listener: Listener) {
        let turn = &self.core.turn;
        let context = CallContext {
            name: name.clone(),
            event: Rc::clone(turn.raw_request()),
            context: Rc::clone(turn.environment()),
            attributes: turn.session_attributes().clone(),
            slots: turn.slots().clone(),
            handler: Rc::downgrade(&self.core),
        };

        let mut listeners = self.core.listeners.borrow_mut();
        let bound = listeners.entry(name.clone()).or_default();
        if is_built_in(&name) && !bound.is_empty() {
            debug!(event = %name, "application handler overrides built-in");
        }
        bound.push(Rc::new(Binding { context, listener }));
        debug!(event = %name, listeners = bound.len(), "registered handler");
    }

    /// Fire every listener registered for `name`, in registration order.
    ///
    /// Emitting a name nobody listens to does nothing.
    pub fn emit(&self, name: &str, action: Option<ResponseAction>) -> DispatchResult<()> {
        let bindings = self
            .core
            .listeners
            .borrow()
            .get(name)
            .cloned()
            .unwrap_or_default();

        debug!(event = name, listeners = bindings.len(), "emitting event");
        for binding in &bindings {
            (binding.listener)(&binding.context, action.as_ref())?;
        }
        Ok(())
    }

    /// Dispatch the turn to its intent handler.
    ///
    /// Fails with `NoHandler` when no candidate event name has a listener.
    /// The outcome of a successful dispatch is only observable through the
    /// completion callback.
    pub fn execute(&self) -> DispatchResult<()> {
        let turn = &self.core.turn;
        let span = info_span!(
            "turn",
            turn_id = %turn.turn_id(),
            intent = turn.current_intent_name(),
            stage = ?turn.invocation_stage()
        );
        let _guard = span.enter();

        let candidates = self
            .core
            .naming
            .event_names(turn.current_intent_name(), turn.invocation_stage());
        let reported = candidates.last().cloned().unwrap_or_default();
        let targets: Vec<String> = candidates
            .into_iter()
            .filter(|name| self.listener_count(name) > 0)
            .collect();

        if targets.is_empty() {
            warn!(event = %reported, "no handler registered");
            return Err(DispatchError::NoHandler { event: reported });
        }

        for name in &targets {
            self.emit(name, None).inspect_err(|e| {
                warn!(event = %name, error = %e, "turn dispatch failed");
            })?;
        }
        Ok(())
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let listeners = self.core.listeners.borrow();
        let mut names: Vec<_> = listeners.keys().collect();
        names.sort();
        f.debug_struct("Dispatcher")
            .field("turn", &self.core.turn)
            .field("naming", &self.core.naming)
            .field("events", &names)
            .finish()
    }
}
