//! Minimal Chrome DevTools Protocol client.
//!
//! Spawns a Chrome process with an ephemeral profile, connects to its
//! DevTools WebSocket, and exposes the handful of commands the channel
//! needs: target/page setup, navigation, script evaluation, key input,
//! and cookie capture/restore. Commands are issued serially per
//! connection; events arriving between responses are skipped.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::TcpStream;
use tokio::process::{Child, Command};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, warn};

use chatgate_core::{Error, Result};

use crate::config::BrowserConfig;

const CHANNEL: &str = "chatgpt-web";
const COMMAND_TIMEOUT: Duration = Duration::from_secs(30);
const LAUNCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Candidate Chrome binaries when none is configured.
const CHROME_CANDIDATES: &[&str] = &[
    "chromium",
    "chromium-browser",
    "google-chrome",
    "google-chrome-stable",
];

type Ws = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// One exclusive automation context: a Chrome process plus its DevTools
/// connection. Never shared across generation calls.
pub struct CdpConnection {
    child: Child,
    ws: Ws,
    profile_dir: PathBuf,
    next_id: u64,
}

impl CdpConnection {
    /// Spawn Chrome with a fresh profile and connect to its DevTools
    /// socket. `headless` is overridable so the login flow can run headed.
    pub async fn launch(config: &BrowserConfig, headless: bool) -> Result<Self> {
        let binary = match &config.chrome_binary {
            Some(b) => b.clone(),
            None => find_chrome()?,
        };

        let profile_dir =
            std::env::temp_dir().join(format!("chatgate-profile-{}", uuid::Uuid::new_v4()));

        let mut cmd = Command::new(&binary);
        cmd.arg("--remote-debugging-port=0")
            .arg(format!("--user-data-dir={}", profile_dir.display()))
            .arg("--no-first-run")
            .arg("--no-default-browser-check")
            .arg("--disable-background-networking")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if headless {
            cmd.arg("--headless=new");
        }

        debug!("Launching {} (headless={})", binary, headless);
        let mut child = cmd
            .spawn()
            .map_err(|e| Error::backend(CHANNEL, format!("Failed to launch {}: {}", binary, e)))?;

        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| Error::backend(CHANNEL, "Chrome stderr not captured"))?;

        // Chrome prints the DevTools endpoint on stderr once it is ready.
        let ws_url = tokio::time::timeout(LAUNCH_TIMEOUT, async {
            let mut lines = BufReader::new(stderr).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                if let Some(url) = line.strip_prefix("DevTools listening on ") {
                    let url = url.trim().to_string();
                    // Keep draining stderr so Chrome never blocks on a
                    // full pipe.
                    tokio::spawn(async move {
                        while let Ok(Some(_)) = lines.next_line().await {}
                    });
                    return Some(url);
                }
            }
            None
        })
        .await
        .ok()
        .flatten()
        .ok_or_else(|| Error::backend(CHANNEL, "Chrome did not report a DevTools endpoint"))?;

        let (ws, _) = connect_async(ws_url.as_str())
            .await
            .map_err(|e| Error::backend(CHANNEL, format!("DevTools connect failed: {}", e)))?;

        Ok(Self {
            child,
            ws,
            profile_dir,
            next_id: 0,
        })
    }

    /// Send one command and wait for its response, skipping interleaved
    /// events. `session_id` scopes the command to an attached target.
    async fn call(
        &mut self,
        session_id: Option<&str>,
        method: &str,
        params: Value,
    ) -> Result<Value> {
        self.next_id += 1;
        let id = self.next_id;

        let mut msg = json!({ "id": id, "method": method, "params": params });
        if let Some(sid) = session_id {
            msg["sessionId"] = json!(sid);
        }

        self.ws
            .send(Message::Text(msg.to_string()))
            .await
            .map_err(|e| Error::backend(CHANNEL, format!("CDP send failed ({}): {}", method, e)))?;

        tokio::time::timeout(COMMAND_TIMEOUT, async {
            while let Some(frame) = self.ws.next().await {
                let frame = frame.map_err(|e| {
                    Error::backend(CHANNEL, format!("CDP read failed ({}): {}", method, e))
                })?;
                let Message::Text(raw) = frame else { continue };
                let Ok(parsed) = serde_json::from_str::<Value>(&raw) else {
                    continue;
                };
                if parsed["id"].as_u64() != Some(id) {
                    continue; // event or stale response
                }
                if let Some(err) = parsed.get("error") {
                    return Err(Error::backend(
                        CHANNEL,
                        format!("{} failed: {}", method, err),
                    ));
                }
                return Ok(parsed["result"].clone());
            }
            Err(Error::backend(
                CHANNEL,
                format!("DevTools connection closed during {}", method),
            ))
        })
        .await
        .map_err(|_| Error::backend(CHANNEL, format!("CDP command timed out: {}", method)))?
    }

    /// Open a blank page target and attach to it. Returns the session id
    /// scoping all page-level commands.
    pub async fn open_page(&mut self) -> Result<String> {
        let target = self
            .call(None, "Target.createTarget", json!({"url": "about:blank"}))
            .await?;
        let target_id = target["targetId"]
            .as_str()
            .ok_or_else(|| Error::backend(CHANNEL, "Target.createTarget returned no targetId"))?
            .to_string();

        let attached = self
            .call(
                None,
                "Target.attachToTarget",
                json!({"targetId": target_id, "flatten": true}),
            )
            .await?;
        let session_id = attached["sessionId"]
            .as_str()
            .ok_or_else(|| Error::backend(CHANNEL, "Target.attachToTarget returned no sessionId"))?
            .to_string();

        self.call(Some(&session_id), "Page.enable", json!({})).await?;
        self.call(Some(&session_id), "Runtime.enable", json!({}))
            .await?;

        Ok(session_id)
    }

    /// Navigate and wait for the document to settle.
    pub async fn navigate(&mut self, session_id: &str, url: &str, timeout: Duration) -> Result<()> {
        let result = self
            .call(Some(session_id), "Page.navigate", json!({"url": url}))
            .await?;
        if let Some(text) = result["errorText"].as_str() {
            if !text.is_empty() {
                return Err(Error::backend(CHANNEL, format!("Navigation failed: {}", text)));
            }
        }
        self.wait_until_settled(session_id, timeout).await
    }

    /// Approximate network-idle: poll until the document reports complete,
    /// then allow one settle period for late asynchronous rendering.
    pub async fn wait_until_settled(&mut self, session_id: &str, timeout: Duration) -> Result<()> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let state = self
                .evaluate(session_id, "document.readyState")
                .await
                .unwrap_or(Value::Null);
            if state.as_str() == Some("complete") {
                break;
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(Error::backend(
                    CHANNEL,
                    format!("Page did not finish loading within {:?}", timeout),
                ));
            }
            tokio::time::sleep(Duration::from_millis(200)).await;
        }
        tokio::time::sleep(Duration::from_millis(1000)).await;
        Ok(())
    }

    /// Evaluate an expression in the page, returning its value.
    pub async fn evaluate(&mut self, session_id: &str, expression: &str) -> Result<Value> {
        let result = self
            .call(
                Some(session_id),
                "Runtime.evaluate",
                json!({"expression": expression, "returnByValue": true, "awaitPromise": true}),
            )
            .await?;
        if let Some(details) = result.get("exceptionDetails") {
            return Err(Error::backend(
                CHANNEL,
                format!("Script failed: {}", details["text"].as_str().unwrap_or("exception")),
            ));
        }
        Ok(result["result"]["value"].clone())
    }

    /// Dispatch an Enter keystroke to the focused element.
    pub async fn press_enter(&mut self, session_id: &str) -> Result<()> {
        for (kind, text) in [("rawKeyDown", None), ("char", Some("\r")), ("keyUp", None)] {
            let mut params = json!({
                "type": kind,
                "key": "Enter",
                "code": "Enter",
                "windowsVirtualKeyCode": 13,
                "nativeVirtualKeyCode": 13,
            });
            if let Some(t) = text {
                params["text"] = json!(t);
            }
            self.call(Some(session_id), "Input.dispatchKeyEvent", params)
                .await?;
        }
        Ok(())
    }

    /// Capture all browser cookies.
    pub async fn get_cookies(&mut self) -> Result<Value> {
        let result = self.call(None, "Storage.getCookies", json!({})).await?;
        Ok(result["cookies"].clone())
    }

    /// Restore previously captured cookies.
    pub async fn set_cookies(&mut self, cookies: &Value) -> Result<()> {
        self.call(None, "Storage.setCookies", json!({"cookies": cookies}))
            .await?;
        Ok(())
    }

    /// Release the context: graceful browser shutdown, then a hard kill,
    /// then profile cleanup. Called on every exit path; the kill-on-drop
    /// child is the backstop if this is never reached.
    pub async fn close(mut self) {
        let close = self.call(None, "Browser.close", json!({}));
        if tokio::time::timeout(Duration::from_secs(5), close)
            .await
            .is_err()
        {
            debug!("Browser.close timed out; killing process");
        }
        if let Err(e) = self.child.kill().await {
            debug!("Chrome kill failed (already exited?): {}", e);
        }
        if let Err(e) = std::fs::remove_dir_all(&self.profile_dir) {
            warn!(
                "Failed to remove profile dir {}: {}",
                self.profile_dir.display(),
                e
            );
        }
    }
}

/// Locate a Chrome binary on PATH.
fn find_chrome() -> Result<String> {
    for candidate in CHROME_CANDIDATES {
        let found = std::process::Command::new("which")
            .arg(candidate)
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false);
        if found {
            return Ok(candidate.to_string());
        }
    }
    Err(Error::ConfigurationMissing(
        "No Chrome/Chromium binary found on PATH; set browser.chrome_binary".into(),
    ))
}
