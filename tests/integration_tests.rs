//! End-to-end turns driven by routing configuration

use lex_turn_dispatch::{
    CallContext, DispatchConfig, DispatchResult, Dispatcher, EventNaming, HandlerLibrary,
    MessageSpec, RegistrationError, ResponseAction,
};
use serde_json::{Value, json};
use std::cell::RefCell;
use std::rc::Rc;

const CONFIG: &str = r#"
event_naming = "both"

[[routes]]
"OrderFlowers.Dialog" = "validate_order"
"OrderFlowers" = "track_visit"

[[routes]]
"OrderFlowers.Fulfillment" = "fulfill_order"
"#;

const FLOWER_TYPES: [&str; 3] = ["roses", "lilies", "tulips"];

fn validate_order(ctx: &CallContext, _: Option<&ResponseAction>) -> DispatchResult<()> {
    let flower = ctx.slots().get("FlowerType").unwrap_or(Value::Null);
    match flower.as_str() {
        Some(kind) if !FLOWER_TYPES.contains(&kind) => {
            ctx.slots().insert("FlowerType", Value::Null);
            ctx.elicit(
                "FlowerType",
                Some(MessageSpec::plain(format!(
                    "We do not have {kind}, would you like a different type of flower?"
                ))),
            )
        }
        Some(_) => ctx.delegate(),
        None => ctx.elicit("FlowerType", None),
    }
}

fn track_visit(ctx: &CallContext, _: Option<&ResponseAction>) -> DispatchResult<()> {
    let visits = ctx
        .attributes()
        .get("visits")
        .and_then(|v| v.as_u64())
        .unwrap_or(0);
    ctx.attributes().insert("visits", json!(visits + 1));
    Ok(())
}

fn fulfill_order(ctx: &CallContext, _: Option<&ResponseAction>) -> DispatchResult<()> {
    let flower = ctx
        .slots()
        .get("FlowerType")
        .and_then(|v| v.as_str().map(str::to_string))
        .ok_or_else(|| anyhow::anyhow!("FlowerType slot is empty"))?;
    ctx.tell(MessageSpec::ssml(format!("Thanks, your {flower} are on the way")))
}

fn library() -> HandlerLibrary {
    let mut library = HandlerLibrary::new();
    library
        .register("validate_order", validate_order)
        .register("track_visit", track_visit)
        .register("fulfill_order", fulfill_order);
    library
}

fn run_turn(request: Value) -> (DispatchResult<()>, Option<Value>) {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();

    // Setup
    let config = DispatchConfig::from_toml_str(CONFIG).unwrap();
    let delivered: Rc<RefCell<Option<Value>>> = Rc::default();
    let sink = delivered.clone();
    let lex = Dispatcher::with_config(request, json!({}), move |doc| {
        *sink.borrow_mut() = Some(doc.to_json().unwrap())
    }, &config)
    .unwrap();
    assert_eq!(lex.event_naming(), EventNaming::Both);

    lex.register_routes(&library(), &config.routes).unwrap();

    // Execute
    let result = lex.execute();
    let document = delivered.borrow_mut().take();
    (result, document)
}

#[test]
fn test_dialog_turn_rejects_unknown_flower() {
    let (result, document) = run_turn(json!({
        "invocationSource": "DialogCodeHook",
        "currentIntent": { "name": "OrderFlowers", "slots": { "FlowerType": "cacti", "PickupDate": null } }
    }));

    // Verify
    result.unwrap();
    assert_eq!(
        document.unwrap(),
        json!({
            "sessionAttributes": {},
            "dialogAction": {
                "type": "ElicitSlot",
                "slotToElicit": "FlowerType",
                "intentName": "OrderFlowers",
                "slots": { "FlowerType": null, "PickupDate": null },
                "message": {
                    "contentType": "PlainText",
                    "content": "We do not have cacti, would you like a different type of flower?"
                }
            }
        })
    );
}

#[test]
fn test_dialog_turn_delegates_valid_order() {
    let (result, document) = run_turn(json!({
        "invocationSource": "DialogCodeHook",
        "currentIntent": { "name": "OrderFlowers", "slots": { "FlowerType": "roses" } },
        "sessionAttributes": { "visits": 4 }
    }));

    // Verify
    result.unwrap();
    let document = document.unwrap();
    assert_eq!(document["dialogAction"]["type"], "Delegate");
    // the plain-name listener fires after the suffixed one has delivered
    assert_eq!(document["sessionAttributes"], json!({ "visits": 4 }));
}

#[test]
fn test_fulfillment_turn_closes_with_ssml() {
    let (result, document) = run_turn(json!({
        "invocationSource": "FulfillmentCodeHook",
        "currentIntent": { "name": "OrderFlowers", "slots": { "FlowerType": "lilies" } }
    }));

    // Verify
    result.unwrap();
    assert_eq!(
        document.unwrap()["dialogAction"],
        json!({
            "type": "Close",
            "fulfillmentState": "Fulfilled",
            "message": {
                "contentType": "SSML",
                "content": "<speak>Thanks, your lilies are on the way</speak>"
            }
        })
    );
}

#[test]
fn test_fulfillment_failure_delivers_nothing() {
    let (result, document) = run_turn(json!({
        "invocationSource": "FulfillmentCodeHook",
        "currentIntent": { "name": "OrderFlowers", "slots": { "FlowerType": null } }
    }));

    // Verify
    assert_eq!(result.unwrap_err().to_string(), "FlowerType slot is empty");
    assert!(document.is_none());
}

#[test]
fn test_routes_must_be_objects() {
    // Setup
    let lex = Dispatcher::new(json!({}), json!({}), |_| {}).unwrap();
    let routes = vec![json!({ "OrderFlowers": "track_visit" }), json!("fulfill_order")];

    // Execute
    let err = lex.register_routes(&library(), &routes).unwrap_err();

    // Verify
    assert!(matches!(err, RegistrationError::InvalidHandlerSet { index: 1, .. }));
    assert_eq!(lex.listener_count("OrderFlowers"), 1);
}

#[test]
fn test_routes_must_name_known_functions() {
    // Setup
    let lex = Dispatcher::new(json!({}), json!({}), |_| {}).unwrap();
    let routes = vec![json!({ "BookHotel": "book_hotel" })];

    // Execute
    let err = lex.register_routes(&library(), &routes).unwrap_err();

    // Verify
    assert!(matches!(err, RegistrationError::NotCallable { ref event } if event == "BookHotel"));
    assert_eq!(err.to_string(), "event handler for 'BookHotel' is not callable");
}
