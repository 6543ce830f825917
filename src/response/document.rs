//! Response documents returned to the dialog platform

use serde::{Deserialize, Serialize};

use super::speech::{SpeechPayload, build_optional_speech};
use crate::value_objects::{MessageSpec, SharedMap};

/// A finished turn response: `{sessionAttributes, dialogAction}`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ResponseDocument {
    pub session_attributes: SharedMap,
    pub dialog_action: DialogAction,
}

impl ResponseDocument {
    /// Wire representation of the document
    pub fn to_json(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(self)
    }
}

/// Outcome of the intent after a `Close` action
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum FulfillmentState {
    Fulfilled,
}

/// The next step the platform should take
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all_fields = "camelCase")]
pub enum DialogAction {
    Close {
        fulfillment_state: FulfillmentState,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<SpeechPayload>,
    },
    ConfirmIntent {
        intent_name: String,
        slots: SharedMap,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<SpeechPayload>,
    },
    ElicitSlot {
        slot_to_elicit: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        intent_name: Option<String>,
        slots: SharedMap,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<SpeechPayload>,
    },
    Delegate {
        slots: SharedMap,
    },
}

impl DialogAction {
    /// The `type` tag as it appears on the wire
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Close { .. } => "Close",
            Self::ConfirmIntent { .. } => "ConfirmIntent",
            Self::ElicitSlot { .. } => "ElicitSlot",
            Self::Delegate { .. } => "Delegate",
        }
    }

    pub fn message(&self) -> Option<&SpeechPayload> {
        match self {
            Self::Close { message, .. }
            | Self::ConfirmIntent { message, .. }
            | Self::ElicitSlot { message, .. } => message.as_ref(),
            Self::Delegate { .. } => None,
        }
    }
}

/// Close the intent as fulfilled
pub fn build_close(attributes: &SharedMap, message: Option<&MessageSpec>) -> ResponseDocument {
    ResponseDocument {
        session_attributes: attributes.clone(),
        dialog_action: DialogAction::Close {
            fulfillment_state: FulfillmentState::Fulfilled,
            message: build_optional_speech(message),
        },
    }
}

/// Ask the user to confirm `intent_name`
pub fn build_confirm(
    attributes: &SharedMap,
    slots: &SharedMap,
    intent_name: &str,
    message: Option<&MessageSpec>,
) -> ResponseDocument {
    ResponseDocument {
        session_attributes: attributes.clone(),
        dialog_action: DialogAction::ConfirmIntent {
            intent_name: intent_name.to_string(),
            slots: slots.clone(),
            message: build_optional_speech(message),
        },
    }
}

/// Ask the user for `slot_name`
pub fn build_elicit(
    attributes: &SharedMap,
    slots: &SharedMap,
    slot_name: &str,
    intent_name: Option<&str>,
    message: Option<&MessageSpec>,
) -> ResponseDocument {
    ResponseDocument {
        session_attributes: attributes.clone(),
        dialog_action: DialogAction::ElicitSlot {
            slot_to_elicit: slot_name.to_string(),
            intent_name: intent_name.map(str::to_string),
            slots: slots.clone(),
            message: build_optional_speech(message),
        },
    }
}

/// Let the platform pick the next step
pub fn build_delegate(attributes: &SharedMap, slots: &SharedMap) -> ResponseDocument {
    ResponseDocument {
        session_attributes: attributes.clone(),
        dialog_action: DialogAction::Delegate {
            slots: slots.clone(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn slots() -> SharedMap {
        SharedMap::from_map(
            json!({ "slotA": "v", "slotB": null })
                .as_object()
                .cloned()
                .unwrap(),
        )
    }

    #[test]
    fn test_close_document() {
        let attributes = SharedMap::new();
        let doc = build_close(&attributes, Some(&MessageSpec::plain("hello")));
        assert_eq!(
            doc.to_json().unwrap(),
            json!({
                "sessionAttributes": {},
                "dialogAction": {
                    "type": "Close",
                    "fulfillmentState": "Fulfilled",
                    "message": { "contentType": "PlainText", "content": "hello" }
                }
            })
        );
    }

    #[test]
    fn test_close_without_message_omits_key() {
        let doc = build_close(&SharedMap::new(), None);
        let json = doc.to_json().unwrap();
        let action = &json["dialogAction"];
        assert!(action.get("message").is_none());
        assert_eq!(action["fulfillmentState"], "Fulfilled");
    }

    #[test]
    fn test_confirm_document() {
        let doc = build_confirm(
            &SharedMap::new(),
            &slots(),
            "OrderFlowers",
            Some(&MessageSpec::plain("Shall I order?")),
        );
        assert_eq!(
            doc.to_json().unwrap()["dialogAction"],
            json!({
                "type": "ConfirmIntent",
                "intentName": "OrderFlowers",
                "slots": { "slotA": "v", "slotB": null },
                "message": { "contentType": "PlainText", "content": "Shall I order?" }
            })
        );
    }

    #[test]
    fn test_elicit_with_and_without_message() {
        let with = build_elicit(
            &SharedMap::new(),
            &slots(),
            "slotB",
            Some("OrderFlowers"),
            Some(&MessageSpec::plain("please retry")),
        );
        let action = with.to_json().unwrap()["dialogAction"].clone();
        assert_eq!(action["type"], "ElicitSlot");
        assert_eq!(action["slotToElicit"], "slotB");
        assert_eq!(action["intentName"], "OrderFlowers");
        assert_eq!(action["message"]["content"], "please retry");

        let without = build_elicit(&SharedMap::new(), &slots(), "slotB", None, None);
        let action = without.to_json().unwrap()["dialogAction"].clone();
        assert!(action.get("message").is_none());
        assert!(action.get("intentName").is_none());
    }

    #[test]
    fn test_delegate_carries_slots_only() {
        let doc = build_delegate(&SharedMap::new(), &slots());
        assert_eq!(
            doc.to_json().unwrap()["dialogAction"],
            json!({ "type": "Delegate", "slots": { "slotA": "v", "slotB": null } })
        );
        assert!(doc.dialog_action.message().is_none());
    }

    #[test]
    fn test_documents_read_live_mappings() {
        let attributes = SharedMap::new();
        attributes.insert("visits", json!(1));
        let doc = build_close(&attributes, None);
        attributes.clear();
        assert_eq!(doc.to_json().unwrap()["sessionAttributes"], json!({}));
        assert!(doc.session_attributes.ptr_eq(&attributes));
    }

    #[test]
    fn test_to_json_reports_serialization_failure() {
        let attributes = SharedMap::new();
        let doc = build_close(&attributes, None);
        let result = attributes.update(|_| doc.to_json());
        assert!(result.is_err());
        assert!(doc.to_json().is_ok());
    }
}
