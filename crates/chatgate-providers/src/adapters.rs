//! Per-vendor request/response mapping.
//!
//! OpenAI and Groq share the same chat-completions format. Anthropic,
//! Gemini, and Cohere each use their own. All adapters are non-streaming
//! request/response calls over one shared [`reqwest::Client`].

use reqwest::Client;
use serde_json::{json, Value};
use tracing::{debug, warn};

use chatgate_core::{ConversationTurn, Error, Result, Role, Vendor};

/// Reply from one HTTP adapter: trimmed text plus the model identifier the
/// vendor reports having used.
#[derive(Debug, Clone)]
pub struct ProviderReply {
    pub reply: String,
    pub model: String,
}

/// Invoke the adapter matching the vendor.
pub async fn generate(
    client: &Client,
    vendor: Vendor,
    api_key: &str,
    model_id: &str,
    prompt: &str,
    history: &[ConversationTurn],
) -> Result<ProviderReply> {
    match vendor {
        Vendor::OpenAi => {
            generate_openai_compat(
                client,
                "https://api.openai.com/v1/chat/completions",
                "openai",
                api_key,
                model_id,
                prompt,
                history,
            )
            .await
        }
        Vendor::Groq => {
            generate_openai_compat(
                client,
                "https://api.groq.com/openai/v1/chat/completions",
                "groq",
                api_key,
                model_id,
                prompt,
                history,
            )
            .await
        }
        Vendor::Anthropic => generate_anthropic(client, api_key, model_id, prompt, history).await,
        Vendor::Gemini => generate_gemini(client, api_key, model_id, prompt, history).await,
        Vendor::Cohere => generate_cohere(client, api_key, model_id, prompt, history).await,
        Vendor::ChatGptWeb => Err(Error::backend(
            "chatgpt-web",
            "browser-only vendor has no HTTP adapter",
        )),
    }
}

// ---------------------------------------------------------------
// OpenAI-compatible (OpenAI, Groq)
// ---------------------------------------------------------------

fn to_openai_messages(history: &[ConversationTurn], prompt: &str) -> Vec<Value> {
    let mut msgs: Vec<Value> = Vec::new();
    for turn in history {
        let role = match turn.role {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::System => "system",
        };
        let text = turn.content.trim();
        if !text.is_empty() {
            msgs.push(json!({"role": role, "content": text}));
        }
    }
    if !prompt.is_empty() {
        msgs.push(json!({"role": "user", "content": prompt}));
    }
    msgs
}

async fn generate_openai_compat(
    client: &Client,
    url: &str,
    channel: &str,
    api_key: &str,
    model_id: &str,
    prompt: &str,
    history: &[ConversationTurn],
) -> Result<ProviderReply> {
    let body = json!({
        "model": model_id,
        "messages": to_openai_messages(history, prompt),
        "temperature": 0.7,
    });

    debug!("Calling {} with model {}", channel, model_id);

    let response = client
        .post(url)
        .header("Authorization", format!("Bearer {}", api_key))
        .header("Content-Type", "application/json")
        .json(&body)
        .send()
        .await
        .map_err(|e| Error::backend(channel, format!("Request failed: {}", e)))?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(Error::backend(
            channel,
            format!("API error {}: {}", status, body),
        ));
    }

    let parsed: Value = response
        .json()
        .await
        .map_err(|e| Error::backend(channel, format!("Malformed response: {}", e)))?;

    let reply = parsed["choices"][0]["message"]["content"]
        .as_str()
        .unwrap_or("")
        .trim()
        .to_string();
    let model = parsed["model"].as_str().unwrap_or(model_id).to_string();

    Ok(ProviderReply { reply, model })
}

// ---------------------------------------------------------------
// Anthropic
// ---------------------------------------------------------------

async fn generate_anthropic(
    client: &Client,
    api_key: &str,
    model_id: &str,
    prompt: &str,
    history: &[ConversationTurn],
) -> Result<ProviderReply> {
    // System turns go into the top-level system field, not the message list.
    let system: String = history
        .iter()
        .filter(|t| t.role == Role::System)
        .map(|t| t.content.as_str())
        .collect::<Vec<_>>()
        .join("\n");

    let mut messages: Vec<Value> = Vec::new();
    for turn in history.iter().filter(|t| t.role != Role::System) {
        let role = if turn.role == Role::User { "user" } else { "assistant" };
        let text = turn.content.trim();
        if !text.is_empty() {
            messages.push(json!({
                "role": role,
                "content": [{"type": "text", "text": text}],
            }));
        }
    }
    if !prompt.is_empty() {
        messages.push(json!({
            "role": "user",
            "content": [{"type": "text", "text": prompt}],
        }));
    }

    let mut body = json!({
        "model": model_id,
        "max_tokens": 1024,
        "temperature": 0.7,
        "messages": messages,
    });
    if !system.is_empty() {
        body["system"] = json!(system);
    }

    debug!("Calling anthropic with model {}", model_id);

    let response = client
        .post("https://api.anthropic.com/v1/messages")
        .header("x-api-key", api_key)
        .header("anthropic-version", "2023-06-01")
        .header("Content-Type", "application/json")
        .json(&body)
        .send()
        .await
        .map_err(|e| Error::backend("anthropic", format!("Request failed: {}", e)))?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(Error::backend(
            "anthropic",
            format!("API error {}: {}", status, body),
        ));
    }

    let parsed: Value = response
        .json()
        .await
        .map_err(|e| Error::backend("anthropic", format!("Malformed response: {}", e)))?;

    let parts: Vec<&str> = parsed["content"]
        .as_array()
        .map(|blocks| {
            blocks
                .iter()
                .filter_map(|b| b["text"].as_str())
                .collect()
        })
        .unwrap_or_default();

    Ok(ProviderReply {
        reply: parts.join("\n").trim().to_string(),
        model: parsed["model"].as_str().unwrap_or(model_id).to_string(),
    })
}

// ---------------------------------------------------------------
// Gemini
// ---------------------------------------------------------------

fn to_gemini_contents(history: &[ConversationTurn], prompt: &str) -> Vec<Value> {
    // Gemini expects role "user" or "model".
    let mut contents: Vec<Value> = history
        .iter()
        .map(|t| {
            let role = if t.role == Role::User { "user" } else { "model" };
            json!({"role": role, "parts": [{"text": t.content}]})
        })
        .collect();
    contents.push(json!({"role": "user", "parts": [{"text": prompt}]}));
    contents
}

/// The documented alternate identifier tried once when the primary model id
/// is not found for the current API version.
fn gemini_alternate_id(model_id: &str) -> Option<String> {
    if model_id.ends_with("-latest") {
        None
    } else {
        Some(format!("{}-latest", model_id))
    }
}

enum GeminiCallError {
    /// HTTP 404 — the model id is unknown to this API version.
    ModelNotFound,
    Other(Error),
}

async fn call_gemini(
    client: &Client,
    api_key: &str,
    model_id: &str,
    contents: &[Value],
) -> std::result::Result<ProviderReply, GeminiCallError> {
    let url = format!(
        "https://generativelanguage.googleapis.com/v1beta/models/{}:generateContent",
        model_id
    );

    let response = client
        .post(&url)
        .query(&[("key", api_key)])
        .header("Content-Type", "application/json")
        .json(&json!({"contents": contents}))
        .send()
        .await
        .map_err(|e| {
            GeminiCallError::Other(Error::backend("gemini", format!("Request failed: {}", e)))
        })?;

    let status = response.status();
    if status.as_u16() == 404 {
        return Err(GeminiCallError::ModelNotFound);
    }
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(GeminiCallError::Other(Error::backend(
            "gemini",
            format!("API error {}: {}", status, body),
        )));
    }

    let parsed: Value = response.json().await.map_err(|e| {
        GeminiCallError::Other(Error::backend("gemini", format!("Malformed response: {}", e)))
    })?;

    let reply: String = parsed["candidates"][0]["content"]["parts"]
        .as_array()
        .map(|parts| {
            parts
                .iter()
                .filter_map(|p| p["text"].as_str())
                .collect::<Vec<_>>()
                .join("")
        })
        .unwrap_or_default();

    Ok(ProviderReply {
        reply: reply.trim().to_string(),
        model: model_id.to_string(),
    })
}

async fn generate_gemini(
    client: &Client,
    api_key: &str,
    model_id: &str,
    prompt: &str,
    history: &[ConversationTurn],
) -> Result<ProviderReply> {
    let contents = to_gemini_contents(history, prompt);

    match call_gemini(client, api_key, model_id, &contents).await {
        Ok(reply) => Ok(reply),
        Err(GeminiCallError::ModelNotFound) => {
            // Two-step resolution: one retry with the -latest variant.
            let Some(alternate) = gemini_alternate_id(model_id) else {
                return Err(Error::backend(
                    "gemini",
                    format!("Model not found: {}", model_id),
                ));
            };
            warn!(
                "Gemini model {} not found, retrying as {}",
                model_id, alternate
            );
            match call_gemini(client, api_key, &alternate, &contents).await {
                Ok(reply) => Ok(reply),
                Err(GeminiCallError::ModelNotFound) => Err(Error::backend(
                    "gemini",
                    format!("Model not found: {} (also tried {})", model_id, alternate),
                )),
                Err(GeminiCallError::Other(e)) => Err(e),
            }
        }
        Err(GeminiCallError::Other(e)) => Err(e),
    }
}

// ---------------------------------------------------------------
// Cohere
// ---------------------------------------------------------------

async fn generate_cohere(
    client: &Client,
    api_key: &str,
    model_id: &str,
    prompt: &str,
    history: &[ConversationTurn],
) -> Result<ProviderReply> {
    let mut messages: Vec<Value> = history
        .iter()
        .map(|t| {
            let role = match t.role {
                Role::User => "user",
                Role::Assistant => "assistant",
                Role::System => "system",
            };
            json!({"role": role, "content": t.content})
        })
        .collect();
    messages.push(json!({"role": "user", "content": prompt}));

    let body = json!({
        "model": model_id,
        "messages": messages,
    });

    debug!("Calling cohere with model {}", model_id);

    let response = client
        .post("https://api.cohere.com/v2/chat")
        .header("Authorization", format!("Bearer {}", api_key))
        .header("Content-Type", "application/json")
        .json(&body)
        .send()
        .await
        .map_err(|e| Error::backend("cohere", format!("Request failed: {}", e)))?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(Error::backend(
            "cohere",
            format!("API error {}: {}", status, body),
        ));
    }

    let parsed: Value = response
        .json()
        .await
        .map_err(|e| Error::backend("cohere", format!("Malformed response: {}", e)))?;

    let reply: String = parsed["message"]["content"]
        .as_array()
        .map(|blocks| {
            blocks
                .iter()
                .filter_map(|b| b["text"].as_str())
                .collect::<Vec<_>>()
                .join("\n")
        })
        .unwrap_or_default();

    Ok(ProviderReply {
        reply: reply.trim().to_string(),
        model: model_id.to_string(),
    })
}
