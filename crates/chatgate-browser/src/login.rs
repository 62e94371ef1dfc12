//! One-time interactive login capture.
//!
//! Operator-invoked setup, not part of the request path: launches a
//! visible browser, waits for a manual login, then captures and persists
//! the session so headless generation calls can run authenticated.

use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

use chatgate_core::Result;

use crate::cdp::CdpConnection;
use crate::channel::SessionState;
use crate::config::BrowserConfig;
use crate::session::SessionStore;

/// Manual logins can take a while.
const LOGIN_NAV_TIMEOUT: Duration = Duration::from_secs(120);

/// Run the interactive login flow and persist the captured session.
pub async fn run_login(config: &BrowserConfig, store: &SessionStore) -> Result<()> {
    println!("Launching a visible browser window for one-time login...");
    let mut cdp = CdpConnection::launch(config, false).await?;

    let captured = async {
        let session = cdp.open_page().await?;
        cdp.navigate(&session, &config.chat_url, LOGIN_NAV_TIMEOUT)
            .await?;

        println!("Log in manually in the browser window.");
        println!("When your chats are visible, press ENTER here to save the session.");
        wait_for_enter().await?;

        cdp.get_cookies().await
    }
    .await;

    // The context is released whether or not capture succeeded.
    let cookies = match captured {
        Ok(cookies) => {
            cdp.close().await;
            cookies
        }
        Err(e) => {
            cdp.close().await;
            return Err(e);
        }
    };

    let state = SessionState::capture(cookies);
    let blob = serde_json::to_string_pretty(&state)?;
    store.save(&blob)?;

    info!("Browser session captured");
    println!("Session saved to {}", store.path().display());
    Ok(())
}

async fn wait_for_enter() -> std::io::Result<()> {
    let mut line = String::new();
    BufReader::new(tokio::io::stdin()).read_line(&mut line).await?;
    Ok(())
}
