//! Turn context - the state of one request/response cycle
//!
//! A `TurnContext` is created once per turn from the platform's raw turn
//! description. It guarantees that session attributes exist, exposes the
//! request's identities through getters only, and holds the one mutable
//! piece of dispatcher state: the pending response.
//!
//! Slots and session attributes are the request's own mappings. A handler
//! that edits them edits the request, and any response document built from
//! them observes the edit.

use chrono::{DateTime, Utc};
use serde_json::Value;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::{DispatchError, DispatchResult};
use crate::response::ResponseDocument;
use crate::value_objects::{InvocationStage, SharedMap, TurnRequest};

/// Sink that receives the finished response document
pub type CompletionCallback = Box<dyn FnOnce(ResponseDocument)>;

/// State of a single dialog turn
pub struct TurnContext {
    turn_id: Uuid,
    received_at: DateTime<Utc>,
    raw_request: Rc<TurnRequest>,
    environment: Rc<Value>,
    invocation_stage: Option<InvocationStage>,
    current_intent_name: String,
    slots: SharedMap,
    session_attributes: SharedMap,
    pending_response: RefCell<Option<ResponseDocument>>,
    completion_callback: RefCell<Option<CompletionCallback>>,
}

impl TurnContext {
    /// Normalize a raw JSON turn description.
    ///
    /// The request must be a JSON object. A missing or `null`
    /// `sessionAttributes` becomes an empty mapping on the request itself.
    pub fn new<F>(request: Value, environment: Value, callback: F) -> DispatchResult<Self>
    where
        F: FnOnce(ResponseDocument) + 'static,
    {
        if !request.is_object() {
            return Err(DispatchError::InvalidRequest(format!(
                "expected a JSON object, got {}",
                json_kind(&request)
            )));
        }

        let request: TurnRequest = serde_json::from_value(request)
            .map_err(|e| DispatchError::InvalidRequest(e.to_string()))?;

        Ok(Self::from_request(request, environment, callback))
    }

    /// Build a context from an already parsed request
    pub fn from_request<F>(request: TurnRequest, environment: Value, callback: F) -> Self
    where
        F: FnOnce(ResponseDocument) + 'static,
    {
        let invocation_stage = request
            .invocation_source
            .as_deref()
            .and_then(InvocationStage::from_source);

        let (current_intent_name, slots) = match &request.current_intent {
            Some(intent) => (intent.name.clone(), intent.slots.clone()),
            None => (String::new(), SharedMap::new()),
        };

        let session_attributes = request.session_attributes.clone();

        Self {
            turn_id: Uuid::new_v4(),
            received_at: Utc::now(),
            raw_request: Rc::new(request),
            environment: Rc::new(environment),
            invocation_stage,
            current_intent_name,
            slots,
            session_attributes,
            pending_response: RefCell::new(None),
            completion_callback: RefCell::new(Some(Box::new(callback))),
        }
    }

    pub fn turn_id(&self) -> Uuid {
        self.turn_id
    }

    pub fn received_at(&self) -> DateTime<Utc> {
        self.received_at
    }

    pub fn raw_request(&self) -> &Rc<TurnRequest> {
        &self.raw_request
    }

    /// Opaque execution environment supplied by the transport
    pub fn environment(&self) -> &Rc<Value> {
        &self.environment
    }

    pub fn invocation_stage(&self) -> Option<InvocationStage> {
        self.invocation_stage
    }

    pub fn current_intent_name(&self) -> &str {
        &self.current_intent_name
    }

    pub fn slots(&self) -> &SharedMap {
        &self.slots
    }

    pub fn session_attributes(&self) -> &SharedMap {
        &self.session_attributes
    }

    /// Current pending response, if any action has produced one
    pub fn pending_response(&self) -> Option<ResponseDocument> {
        self.pending_response.borrow().clone()
    }

    /// Replace the pending response.
    ///
    /// Once the turn has been delivered the pending response is frozen and
    /// this fails with `AlreadyDelivered`.
    pub fn set_pending_response(&self, response: ResponseDocument) -> DispatchResult<()> {
        if self.is_delivered() {
            warn!(
                turn_id = %self.turn_id,
                action = response.dialog_action.kind(),
                "response built after delivery, discarded"
            );
            return Err(DispatchError::AlreadyDelivered);
        }
        *self.pending_response.borrow_mut() = Some(response);
        Ok(())
    }

    pub fn is_delivered(&self) -> bool {
        self.completion_callback.borrow().is_none()
    }

    /// Hand the pending response to the completion callback.
    ///
    /// The callback is consumed; a second delivery fails with
    /// `AlreadyDelivered`.
    pub fn deliver(&self) -> DispatchResult<()> {
        let response = self
            .pending_response()
            .ok_or(DispatchError::NoPendingResponse)?;

        let callback = self
            .completion_callback
            .borrow_mut()
            .take()
            .ok_or(DispatchError::AlreadyDelivered)?;

        let elapsed_ms = (Utc::now() - self.received_at).num_milliseconds();
        info!(
            turn_id = %self.turn_id,
            intent = %self.current_intent_name,
            action = response.dialog_action.kind(),
            elapsed_ms,
            "delivering turn response"
        );

        callback(response);
        Ok(())
    }
}

impl fmt::Debug for TurnContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TurnContext")
            .field("turn_id", &self.turn_id)
            .field("invocation_stage", &self.invocation_stage)
            .field("current_intent_name", &self.current_intent_name)
            .field("slots", &self.slots)
            .field("session_attributes", &self.session_attributes)
            .field("delivered", &self.is_delivered())
            .finish()
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
