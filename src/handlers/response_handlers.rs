//! Built-in response action handlers
//!
//! One listener per response action plus the completion signal. Each one
//! steps aside when the application has registered its own listener under
//! the same name: the check is a listener count, so any number of
//! application listeners suppresses the built-in.

use tracing::{debug, trace};

use super::registry::HandlerSet;
use crate::errors::{DispatchError, DispatchResult};
use crate::events::{CONFIRM, DELEGATE, ELICIT, RESPONSE_READY, TELL};
use crate::response::{ResponseDocument, build_close, build_confirm, build_delegate, build_elicit};
use crate::routing::CallContext;
use crate::value_objects::ResponseAction;

/// The listeners every dispatcher registers before application handlers
pub fn built_in_handlers() -> HandlerSet {
    HandlerSet::new()
        .on(TELL, on_tell)
        .on(CONFIRM, on_confirm)
        .on(ELICIT, on_elicit)
        .on(DELEGATE, on_delegate)
        .on(RESPONSE_READY, on_response_ready)
}

fn suppressed(ctx: &CallContext) -> bool {
    let overridden = ctx.is_overridden();
    if overridden {
        trace!(event = ctx.name(), "built-in handler overridden");
    }
    overridden
}

fn missing(ctx: &CallContext) -> DispatchError {
    DispatchError::MissingAction {
        event: ctx.name().to_string(),
    }
}

/// Store the document and signal completion.
///
/// A delivered turn keeps the document it delivered; a later action fails
/// with `AlreadyDelivered` before anything is stored.
fn resolve(ctx: &CallContext, response: ResponseDocument) -> DispatchResult<()> {
    debug!(
        event = ctx.name(),
        action = response.dialog_action.kind(),
        "response built"
    );
    ctx.handler()?.set_response(response)?;
    ctx.emit(RESPONSE_READY, None)
}

fn on_tell(ctx: &CallContext, action: Option<&ResponseAction>) -> DispatchResult<()> {
    if suppressed(ctx) {
        return Ok(());
    }
    let message = match action {
        Some(ResponseAction::Tell { message }) => message.as_ref(),
        _ => None,
    };
    resolve(ctx, build_close(ctx.attributes(), message))
}

fn on_confirm(ctx: &CallContext, action: Option<&ResponseAction>) -> DispatchResult<()> {
    if suppressed(ctx) {
        return Ok(());
    }
    let Some(ResponseAction::Confirm {
        intent_name,
        message,
    }) = action
    else {
        return Err(missing(ctx));
    };
    resolve(
        ctx,
        build_confirm(ctx.attributes(), ctx.slots(), intent_name, message.as_ref()),
    )
}

fn on_elicit(ctx: &CallContext, action: Option<&ResponseAction>) -> DispatchResult<()> {
    if suppressed(ctx) {
        return Ok(());
    }
    let Some(ResponseAction::Elicit { slot_name, message }) = action else {
        return Err(missing(ctx));
    };
    let handler = ctx.handler()?;
    let intent_name = Some(handler.turn().current_intent_name()).filter(|name| !name.is_empty());
    resolve(
        ctx,
        build_elicit(
            ctx.attributes(),
            ctx.slots(),
            slot_name,
            intent_name,
            message.as_ref(),
        ),
    )
}

fn on_delegate(ctx: &CallContext, _action: Option<&ResponseAction>) -> DispatchResult<()> {
    if suppressed(ctx) {
        return Ok(());
    }
    resolve(ctx, build_delegate(ctx.attributes(), ctx.slots()))
}

fn on_response_ready(ctx: &CallContext, _action: Option<&ResponseAction>) -> DispatchResult<()> {
    if suppressed(ctx) {
        return Ok(());
    }
    ctx.handler()?.turn().deliver()
}
