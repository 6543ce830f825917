//! Response builders
//!
//! Pure functions that assemble the four response document shapes from the
//! turn's current attributes and slots. Documents hold the live mappings, not
//! copies.

pub mod document;
pub mod speech;

pub use document::{
    DialogAction, FulfillmentState, ResponseDocument, build_close, build_confirm,
    build_delegate, build_elicit,
};
pub use speech::{SpeechPayload, build_optional_speech, build_speech};
