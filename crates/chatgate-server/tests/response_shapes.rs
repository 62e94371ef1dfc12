//! Response-shape tests — validates that the JSON payloads the routes
//! emit match what API consumers expect, field names and types included.

/// Verify the chat response shape:
/// { message, model, degraded, duration }
#[test]
fn test_chat_response_shape() {
    let response = serde_json::json!({
        "message": "Hello! How can I help?",
        "model": "llama-3.3-70b-versatile",
        "degraded": false,
        "duration": 843,
    });

    assert!(response["message"].is_string());
    assert!(response["model"].is_string());
    assert!(!response["model"].as_str().unwrap().is_empty());
    assert!(response["degraded"].is_boolean());
    assert!(response["duration"].is_number());
}

/// Error payloads carry a single actionable string.
#[test]
fn test_chat_error_shape() {
    let response = serde_json::json!({
        "error": "Missing configuration: GROQ_API_KEY not set (required for the groq backend)",
    });

    assert!(response["error"].is_string());
    assert!(response["error"].as_str().unwrap().contains("GROQ_API_KEY"));
}

/// Verify the model listing shape consumed by the picker:
/// { models: [{key, vendor, model, light}], default }
#[test]
fn test_models_response_shape() {
    let response = serde_json::json!({
        "models": [
            {
                "key": "grok",
                "vendor": "groq",
                "model": "llama-3.3-70b-versatile",
                "light": false,
            },
            {
                "key": "grok-light",
                "vendor": "groq",
                "model": "llama-3.3-70b-versatile",
                "light": true,
            },
        ],
        "default": "grok",
    });

    assert!(response["models"].is_array());
    assert!(response["default"].is_string());

    let entry = &response["models"][0];
    assert!(entry["key"].is_string());
    assert!(entry["vendor"].is_string());
    assert!(entry["model"].is_string());
    assert!(entry["light"].is_boolean());
}

/// Verify the status shape:
/// { providers: {*Configured booleans}, browserSessionPresent, defaultModel }
#[test]
fn test_status_response_shape() {
    let response = serde_json::json!({
        "providers": {
            "openaiConfigured": false,
            "groqConfigured": true,
            "anthropicConfigured": false,
            "geminiConfigured": false,
            "cohereConfigured": false,
        },
        "browserSessionPresent": false,
        "defaultModel": "grok",
    });

    assert!(response["providers"].is_object());
    for field in [
        "openaiConfigured",
        "groqConfigured",
        "anthropicConfigured",
        "geminiConfigured",
        "cohereConfigured",
    ] {
        assert!(response["providers"][field].is_boolean(), "missing {}", field);
    }
    assert!(response["browserSessionPresent"].is_boolean());
    assert!(response["defaultModel"].is_string());
}

/// Conversation history turns deserialize from the wire shape the
/// frontend sends: lowercase role strings plus content.
#[test]
fn test_history_turn_wire_shape() {
    let raw = serde_json::json!([
        { "role": "system", "content": "be brief" },
        { "role": "user", "content": "hi" },
        { "role": "assistant", "content": "hello" },
    ]);

    let turns: Vec<chatgate_core::ConversationTurn> =
        serde_json::from_value(raw).expect("wire shape must deserialize");
    assert_eq!(turns.len(), 3);
    assert_eq!(turns[0].role, chatgate_core::Role::System);
    assert_eq!(turns[2].role, chatgate_core::Role::Assistant);
}
