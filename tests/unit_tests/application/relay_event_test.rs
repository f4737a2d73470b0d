use serde_json::json;

use zakchat::application::services::RelayEvent;

fn to_json(event: &RelayEvent) -> serde_json::Value {
    serde_json::to_value(event).unwrap()
}

#[test]
fn given_content_event_when_serializing_then_has_content_field_only() {
    let event = RelayEvent::Content {
        content: "hi".to_string(),
    };

    assert_eq!(to_json(&event), json!({"content": "hi"}));
}

#[test]
fn given_image_event_when_serializing_then_uses_camel_case_image_url() {
    let event = RelayEvent::Image {
        image_url: "data:image/png;base64,AA==".to_string(),
    };

    assert_eq!(
        to_json(&event),
        json!({"imageUrl": "data:image/png;base64,AA=="})
    );
}

#[test]
fn given_done_event_when_serializing_then_is_done_true() {
    assert_eq!(
        to_json(&RelayEvent::Done { done: true }),
        json!({"done": true})
    );
}

#[test]
fn given_error_event_when_serializing_then_has_error_field() {
    let event = RelayEvent::Error {
        error: "Failed to send message".to_string(),
    };

    assert_eq!(to_json(&event), json!({"error": "Failed to send message"}));
}
