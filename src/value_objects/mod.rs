//! Value objects for a single dialog turn

use serde::ser::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::events::{CONFIRM, DELEGATE, ELICIT, TELL};

/// A string-keyed JSON mapping shared by reference.
///
/// Cloning a `SharedMap` yields another handle to the same mapping, so edits
/// made by a handler are visible to every other holder, including response
/// documents that have already been built but not yet delivered.
#[derive(Clone, Default)]
pub struct SharedMap(Rc<RefCell<Map<String, Value>>>);

impl SharedMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_map(map: Map<String, Value>) -> Self {
        Self(Rc::new(RefCell::new(map)))
    }

    /// True if both handles point at the same mapping instance
    pub fn ptr_eq(&self, other: &SharedMap) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Run `f` against the current contents.
    ///
    /// The borrow ends when `f` returns, so it cannot be held across an
    /// emitted action.
    pub fn read<R>(&self, f: impl FnOnce(&Map<String, Value>) -> R) -> R {
        f(&self.0.borrow())
    }

    /// Edit the mapping in place; the borrow ends when `f` returns
    pub fn update<R>(&self, f: impl FnOnce(&mut Map<String, Value>) -> R) -> R {
        f(&mut self.0.borrow_mut())
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.0.borrow().get(key).cloned()
    }

    pub fn insert(&self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.0.borrow_mut().insert(key.into(), value)
    }

    pub fn remove(&self, key: &str) -> Option<Value> {
        self.0.borrow_mut().remove(key)
    }

    pub fn clear(&self) {
        self.0.borrow_mut().clear();
    }

    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }

    /// Owned copy of the current contents
    pub fn snapshot(&self) -> Map<String, Value> {
        self.0.borrow().clone()
    }
}

impl fmt::Debug for SharedMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.try_borrow() {
            Ok(map) => f.debug_tuple("SharedMap").field(&*map).finish(),
            Err(_) => f.write_str("SharedMap(<borrowed>)"),
        }
    }
}

impl PartialEq for SharedMap {
    fn eq(&self, other: &Self) -> bool {
        if self.ptr_eq(other) {
            return true;
        }
        match (self.0.try_borrow(), other.0.try_borrow()) {
            (Ok(a), Ok(b)) => *a == *b,
            _ => false,
        }
    }
}

impl From<Map<String, Value>> for SharedMap {
    fn from(map: Map<String, Value>) -> Self {
        Self::from_map(map)
    }
}

impl Serialize for SharedMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let map = self
            .0
            .try_borrow()
            .map_err(|_| S::Error::custom("shared map is mutably borrowed"))?;
        map.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for SharedMap {
    // `null` and a missing key both normalize to an empty mapping
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let map = Option::<Map<String, Value>>::deserialize(deserializer)?;
        Ok(Self::from_map(map.unwrap_or_default()))
    }
}

/// Inbound turn description as sent by the dialog platform
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_intent: Option<CurrentIntent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invocation_source: Option<String>,
    #[serde(default)]
    pub session_attributes: SharedMap,
    /// Fields the dispatcher does not interpret, kept for handlers
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The intent the platform resolved for this turn
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CurrentIntent {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub slots: SharedMap,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Which code hook produced the turn
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum InvocationStage {
    /// Final fulfillment (`FulfillmentCodeHook`)
    Fulfillment,
    /// Dialog management before fulfillment (`DialogCodeHook`)
    Dialog,
}

impl InvocationStage {
    /// Parse the platform's `invocationSource` marker
    pub fn from_source(source: &str) -> Option<Self> {
        match source {
            "FulfillmentCodeHook" => Some(Self::Fulfillment),
            "DialogCodeHook" => Some(Self::Dialog),
            _ => None,
        }
    }

    /// Suffix used for stage-specific event names
    pub fn suffix(&self) -> &'static str {
        match self {
            Self::Fulfillment => "Fulfillment",
            Self::Dialog => "Dialog",
        }
    }
}

/// What a handler wants said to the user.
///
/// Accepts either a bare string or a `{type, text|speech}` object.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum MessageSpec {
    Text(String),
    Structured {
        #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
        content_type: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        text: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        speech: Option<String>,
    },
}

impl MessageSpec {
    pub fn plain(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    pub fn ssml(speech: impl Into<String>) -> Self {
        Self::Structured {
            content_type: Some("SSML".to_string()),
            text: None,
            speech: Some(speech.into()),
        }
    }

    /// Structured message with an explicit content type
    pub fn typed(content_type: impl Into<String>, text: impl Into<String>) -> Self {
        Self::Structured {
            content_type: Some(content_type.into()),
            text: Some(text.into()),
            speech: None,
        }
    }
}

impl From<&str> for MessageSpec {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for MessageSpec {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

/// The terminal outcome a handler asks for
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseAction {
    /// Close the intent as fulfilled
    Tell { message: Option<MessageSpec> },
    /// Ask the user to confirm an intent
    Confirm {
        intent_name: String,
        message: Option<MessageSpec>,
    },
    /// Ask the user for a slot value
    Elicit {
        slot_name: String,
        message: Option<MessageSpec>,
    },
    /// Let the platform choose the next step
    Delegate,
}

impl ResponseAction {
    /// Event name the action is emitted under
    pub fn event_name(&self) -> &'static str {
        match self {
            Self::Tell { .. } => TELL,
            Self::Confirm { .. } => CONFIRM,
            Self::Elicit { .. } => ELICIT,
            Self::Delegate => DELEGATE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_missing_session_attributes_default_to_empty() {
        let request: TurnRequest = serde_json::from_value(json!({ "test": 123 })).unwrap();
        assert!(request.session_attributes.is_empty());
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({ "test": 123, "sessionAttributes": {} })
        );
    }

    #[test]
    fn test_null_slots_are_kept() {
        let request: TurnRequest = serde_json::from_value(json!({
            "currentIntent": { "name": "OrderFlowers", "slots": { "FlowerType": null } },
            "sessionAttributes": null
        }))
        .unwrap();
        let intent = request.current_intent.unwrap();
        assert_eq!(intent.slots.get("FlowerType"), Some(Value::Null));
        assert!(request.session_attributes.is_empty());
    }

    #[test]
    fn test_shared_map_clones_share_storage() {
        let map = SharedMap::new();
        let other = map.clone();
        other.insert("key", json!("value"));
        assert!(map.ptr_eq(&other));
        assert_eq!(map.get("key"), Some(json!("value")));
    }

    #[test]
    fn test_update_and_read_are_scoped() {
        let map = SharedMap::new();
        let previous = map.update(|m| {
            m.insert("FlowerType".to_string(), json!("roses"));
            m.insert("PickupDate".to_string(), Value::Null)
        });
        assert!(previous.is_none());
        assert_eq!(map.read(|m| m.len()), 2);

        // a later edit succeeds because no borrow escaped the closures
        map.insert("FlowerType", json!("tulips"));
        assert_eq!(map.get("FlowerType"), Some(json!("tulips")));
    }

    #[test]
    fn test_serializing_a_busy_map_fails_without_panicking() {
        let map = SharedMap::new();
        map.insert("visits", json!(1));

        let err = map.update(|_| serde_json::to_value(&map)).unwrap_err();
        assert!(err.to_string().contains("mutably borrowed"));
        assert_eq!(map.update(|_| format!("{map:?}")), "SharedMap(<borrowed>)");

        assert_eq!(serde_json::to_value(&map).unwrap(), json!({ "visits": 1 }));
    }

    #[test]
    fn test_message_spec_parses_both_shapes() {
        let bare: MessageSpec = serde_json::from_value(json!("hello")).unwrap();
        assert_eq!(bare, MessageSpec::plain("hello"));

        let ssml: MessageSpec =
            serde_json::from_value(json!({ "type": "SSML", "speech": "hi" })).unwrap();
        assert_eq!(ssml, MessageSpec::ssml("hi"));
    }

    #[test]
    fn test_invocation_stage_markers() {
        assert_eq!(
            InvocationStage::from_source("FulfillmentCodeHook"),
            Some(InvocationStage::Fulfillment)
        );
        assert_eq!(InvocationStage::from_source("DialogCodeHook"), Some(InvocationStage::Dialog));
        assert_eq!(InvocationStage::from_source("Other"), None);
        assert_eq!(InvocationStage::Dialog.suffix(), "Dialog");
    }
}
