//! Speech payloads for response messages

use serde::{Deserialize, Serialize};

use crate::value_objects::MessageSpec;

/// Content type used when a message does not name one
pub const PLAIN_TEXT: &str = "PlainText";

/// Speech Synthesis Markup Language content type
pub const SSML: &str = "SSML";

/// Wire form of a message: `{contentType, content}`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SpeechPayload {
    pub content_type: String,
    pub content: String,
}

/// Turn a message description into its wire speech object.
///
/// SSML messages have their `speech` wrapped in a `<speak>` element. Any
/// other structured message uses `text`, falling back to `speech` and then
/// to an empty string.
pub fn build_speech(message: &MessageSpec) -> SpeechPayload {
    match message {
        MessageSpec::Text(text) => SpeechPayload {
            content_type: PLAIN_TEXT.to_string(),
            content: text.clone(),
        },
        MessageSpec::Structured {
            content_type: Some(content_type),
            speech,
            ..
        } if content_type == SSML => SpeechPayload {
            content_type: SSML.to_string(),
            content: format!("<speak>{}</speak>", speech.as_deref().unwrap_or_default()),
        },
        MessageSpec::Structured {
            content_type,
            text,
            speech,
        } => SpeechPayload {
            content_type: content_type.clone().unwrap_or_else(|| PLAIN_TEXT.to_string()),
            content: text.clone().or_else(|| speech.clone()).unwrap_or_default(),
        },
    }
}

/// `None` in, `None` out; the message key is omitted from the document
pub fn build_optional_speech(message: Option<&MessageSpec>) -> Option<SpeechPayload> {
    message.map(build_speech)
}
