//! The browser-automated generation channel.
//!
//! Each call owns one exclusive Chrome context: restore the persisted
//! session, open a fresh conversation, submit the composed prompt, wait
//! for the reply to stabilize, re-persist the session, tear down.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use chatgate_core::{ConversationTurn, Error, GenerationResult, Result, Role};

use crate::cdp::CdpConnection;
use crate::config::BrowserConfig;
use crate::session::SessionStore;
use crate::stability::{StabilityDetector, StabilitySource};

const CHANNEL: &str = "chatgpt-web";

/// Clicks the new-conversation control when present. Returns whether a
/// control was found; absence is fine — the page may already be fresh.
const NEW_CHAT_JS: &str = r#"(() => {
  const btn = [...document.querySelectorAll('button, a')]
    .find(el => el.textContent.trim() === 'New chat');
  if (btn) { btn.click(); return true; }
  return false;
})()"#;

/// Clicks the send button. Returns whether one was found.
const SEND_JS: &str = r#"(() => {
  const btn = document.querySelector('[data-testid="send-button"]')
    || [...document.querySelectorAll('button')].find(el =>
         (el.getAttribute('aria-label') || '').toLowerCase().includes('send'));
  if (btn) { btn.click(); return true; }
  return false;
})()"#;

/// Reads the last assistant bubble's text, or null before one exists.
const LAST_REPLY_JS: &str = r#"(() => {
  const bubbles = document.querySelectorAll('[data-message-author-role="assistant"]');
  return bubbles.length ? bubbles[bubbles.length - 1].innerText : null;
})()"#;

/// The session blob's schema. Owned by this channel; the store moves it
/// around without reading it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionState {
    pub cookies: Value,
    pub captured_at: String,
}

impl SessionState {
    pub fn capture(cookies: Value) -> Self {
        Self {
            cookies,
            captured_at: Utc::now().to_rfc3339(),
        }
    }
}

/// Generation channel backed by an authenticated ChatGPT web session.
pub struct BrowserChannel {
    config: BrowserConfig,
    store: SessionStore,
}

impl BrowserChannel {
    pub fn new(config: BrowserConfig, store: SessionStore) -> Self {
        Self { config, store }
    }

    pub fn config(&self) -> &BrowserConfig {
        &self.config
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// Whether a persisted session exists (for status reporting).
    pub fn session_present(&self) -> bool {
        self.store.exists()
    }

    /// Drive one exchange through the web UI. `logical_key` is echoed back
    /// as the resolved model id — this channel has no secondary model
    /// selection.
    pub async fn generate(
        &self,
        logical_key: &str,
        prompt: &str,
        history: &[ConversationTurn],
    ) -> Result<GenerationResult> {
        // Bootstrap: no session means no call. Never start an anonymous
        // browser session here.
        let state = self.load_session()?;
        let composed = compose_prompt(prompt, history, self.config.context_cap_chars);

        let mut cdp = CdpConnection::launch(&self.config, self.config.headless).await?;
        let driven = self.drive(&mut cdp, &state, &composed).await;
        // Teardown runs on every exit path, success or failure.
        cdp.close().await;
        let (reply, degraded) = driven?;

        if degraded {
            info!("Browser reply returned degraded (stall timeout reached)");
        }

        Ok(GenerationResult {
            reply_text: reply,
            resolved_model_id: logical_key.to_string(),
            degraded,
        })
    }

    fn load_session(&self) -> Result<SessionState> {
        let blob = self
            .store
            .load()?
            .ok_or_else(|| {
                Error::ConfigurationMissing(format!(
                    "No browser session at {}. Run `chatgate login` once to authenticate.",
                    self.store.path().display()
                ))
            })?;
        serde_json::from_str(&blob).map_err(|_| {
            Error::ConfigurationMissing(
                "Persisted browser session is unreadable; re-run `chatgate login`.".into(),
            )
        })
    }

    async fn drive(
        &self,
        cdp: &mut CdpConnection,
        state: &SessionState,
        composed: &str,
    ) -> Result<(String, bool)> {
        cdp.set_cookies(&state.cookies).await?;
        let session = cdp.open_page().await?;

        // Conversation reset. The new-chat control is optional.
        cdp.navigate(&session, &self.config.chat_url, self.config.nav_timeout())
            .await?;
        match cdp.evaluate(&session, NEW_CHAT_JS).await {
            Ok(clicked) if clicked.as_bool() == Some(true) => {
                cdp.wait_until_settled(&session, self.config.nav_timeout())
                    .await?;
            }
            Ok(_) => debug!("No new-chat control; page assumed fresh"),
            Err(e) => debug!("New-chat probe failed, proceeding: {}", e),
        }

        // Submit.
        let filled = cdp.evaluate(&session, &fill_composer_js(composed)).await?;
        if filled.as_bool() != Some(true) {
            return Err(Error::backend(CHANNEL, "Prompt composer not found on page"));
        }
        let sent = cdp.evaluate(&session, SEND_JS).await?;
        if sent.as_bool() != Some(true) {
            cdp.press_enter(&session).await?;
        }

        // Await completion by stability.
        let detector = StabilityDetector::new(
            self.config.poll_interval(),
            self.config.stable_samples,
            self.config.stall_timeout(),
        );
        let mut source = ReplySource {
            cdp: &mut *cdp,
            session: &session,
        };
        let outcome = detector.await_stable(&mut source).await;

        // Best-effort session re-persistence; failure never fails the call.
        match cdp.get_cookies().await {
            Ok(cookies) => {
                let refreshed = SessionState::capture(cookies);
                match serde_json::to_string_pretty(&refreshed) {
                    Ok(blob) => {
                        if let Err(e) = self.store.save(&blob) {
                            warn!("Session save failed (ignored): {}", e);
                        }
                    }
                    Err(e) => warn!("Session serialize failed (ignored): {}", e),
                }
            }
            Err(e) => warn!("Cookie capture failed (ignored): {}", e),
        }

        Ok((outcome.text.trim().to_string(), !outcome.complete))
    }
}

/// Samples the last assistant bubble; evaluation faults read as "no
/// element yet" so a transient DOM re-render never aborts the wait.
struct ReplySource<'a> {
    cdp: &'a mut CdpConnection,
    session: &'a str,
}

impl StabilitySource for ReplySource<'_> {
    async fn sample(&mut self) -> Option<String> {
        match self.cdp.evaluate(self.session, LAST_REPLY_JS).await {
            Ok(Value::String(text)) => Some(text),
            Ok(_) => None,
            Err(e) => {
                debug!("Reply sample failed: {}", e);
                None
            }
        }
    }
}

/// Fills the page composer with the given text. The UI accepts a single
/// freeform input, so structured history is flattened by
/// [`compose_prompt`] before this runs.
fn fill_composer_js(text: &str) -> String {
    format!(
        r#"(() => {{
  const text = {};
  const box = document.querySelector('#prompt-textarea')
    || document.querySelector('textarea')
    || document.querySelector('[contenteditable="true"]');
  if (!box) return false;
  box.focus();
  if (box.tagName === 'TEXTAREA') {{
    const setter = Object.getOwnPropertyDescriptor(
      window.HTMLTextAreaElement.prototype, 'value').set;
    setter.call(box, text);
  }} else {{
    box.innerText = text;
  }}
  box.dispatchEvent(new InputEvent('input', {{ bubbles: true }}));
  return true;
}})()"#,
        serde_json::to_string(text).unwrap_or_else(|_| "\"\"".into())
    )
}

/// Compress structured history into the single text block the UI accepts:
/// system turns as a preamble, prior turns as bounded recent context, the
/// new prompt as the final section.
fn compose_prompt(prompt: &str, history: &[ConversationTurn], context_cap: usize) -> String {
    let system: String = history
        .iter()
        .filter(|t| t.role == Role::System)
        .map(|t| t.content.as_str())
        .collect::<Vec<_>>()
        .join("\n");

    let lines: Vec<String> = history
        .iter()
        .filter_map(|t| match t.role {
            Role::User => Some(format!("User: {}", t.content)),
            Role::Assistant => Some(format!("Assistant: {}", t.content)),
            Role::System => None,
        })
        .collect();
    let joined = lines.join("\n");
    let prior = tail_chars(&joined, context_cap);

    let current = if prompt.is_empty() {
        "User: Hello".to_string()
    } else {
        format!("User: {}", prompt)
    };

    let mut composed = String::new();
    if !system.is_empty() {
        composed.push_str(&format!("(System)\n{}\n\n", system));
    }
    if !prior.is_empty() {
        composed.push_str(&format!("(Brief context)\n{}\n\n", prior));
    }
    composed.push_str(&format!("(Current)\n{}", current));
    composed
}

/// Last `max` chars of `s`, respecting char boundaries.
fn tail_chars(s: &str, max: usize) -> &str {
    let count = s.chars().count();
    if count <= max {
        return s;
    }
    let skip = count - max;
    match s.char_indices().nth(skip) {
        Some((idx, _)) => &s[idx..],
        None => "",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn turn(role: Role, content: &str) -> ConversationTurn {
        ConversationTurn::new(role, content)
    }

    #[test]
    fn test_compose_sections_and_delimiters() {
        let history = vec![
            turn(Role::System, "be concise"),
            turn(Role::User, "first question"),
            turn(Role::Assistant, "first answer"),
        ];
        let composed = compose_prompt("second question", &history, 1500);
        assert!(composed.starts_with("(System)\nbe concise\n\n"));
        assert!(composed.contains("(Brief context)\nUser: first question\nAssistant: first answer\n\n"));
        assert!(composed.ends_with("(Current)\nUser: second question"));
    }

    #[test]
    fn test_compose_context_cap_keeps_newest_prompt_whole() {
        let history: Vec<ConversationTurn> = (0..100)
            .map(|i| turn(Role::User, &format!("message number {} with padding text", i)))
            .collect();
        let composed = compose_prompt("the newest question", &history, 1500);

        let context = composed
            .split("(Brief context)\n")
            .nth(1)
            .unwrap()
            .split("\n\n(Current)")
            .next()
            .unwrap();
        assert!(context.chars().count() <= 1500);
        assert!(composed.ends_with("(Current)\nUser: the newest question"));
    }

    #[test]
    fn test_compose_empty_history() {
        let composed = compose_prompt("hello", &[], 1500);
        assert_eq!(composed, "(Current)\nUser: hello");
    }

    #[test]
    fn test_compose_empty_prompt_falls_back_to_greeting() {
        let composed = compose_prompt("", &[], 1500);
        assert_eq!(composed, "(Current)\nUser: Hello");
    }

    #[test]
    fn test_tail_chars_respects_char_boundaries() {
        let s = "héllo wörld";
        assert_eq!(tail_chars(s, 5), "wörld");
        assert_eq!(tail_chars(s, 100), s);
        assert_eq!(tail_chars("", 5), "");
    }

    #[tokio::test]
    async fn test_generate_without_session_fails_fast() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path().join("browser-session.json"));
        let channel = BrowserChannel::new(BrowserConfig::default(), store);

        // Must fail before any browser launch or navigation is attempted.
        let err = channel.generate("chatgpt", "hello", &[]).await.unwrap_err();
        match err {
            Error::ConfigurationMissing(msg) => assert!(msg.contains("chatgate login")),
            other => panic!("expected ConfigurationMissing, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_generate_with_corrupt_session_is_actionable() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path().join("browser-session.json"));
        store.save("not json").unwrap();
        let channel = BrowserChannel::new(BrowserConfig::default(), store);

        let err = channel.generate("chatgpt", "hello", &[]).await.unwrap_err();
        assert!(matches!(err, Error::ConfigurationMissing(_)));
    }

    #[test]
    fn test_session_state_round_trip() {
        let state = SessionState::capture(serde_json::json!([{"name": "sid", "value": "abc"}]));
        let blob = serde_json::to_string(&state).unwrap();
        let parsed: SessionState = serde_json::from_str(&blob).unwrap();
        assert_eq!(parsed.cookies[0]["name"], "sid");
        assert!(!parsed.captured_at.is_empty());
    }
}
