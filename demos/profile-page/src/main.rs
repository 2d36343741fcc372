use alcove::prelude::*;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

// ---------------------------------------------------------------------------
// A scripted host
// ---------------------------------------------------------------------------
//
// In production the bridge and channel wrap the webview bindings of the
// host app. Here a scripted host stands in: it mints tokens with a
// shared secret the way the real host's backend would, and pushes one
// disconnect over the channel at the end.

const SECRET: &[u8] = b"demo-shared-secret";
const PAGE_ORIGIN: &str = "https://pages.host.example";

struct DemoHost;

impl HostBridge for DemoHost {
    async fn profile_details(&self) -> Result<SignedToken, BridgeError> {
        mint(
            "profile",
            serde_json::json!({
                "did": "did:plc:ada",
                "name": "Ada Lovelace",
                "socials": [{ "platform": "zap", "handle": "@ada" }],
            }),
        )
        .map_err(|e| BridgeError::Rejected {
            call: "profile_details",
            reason: e.to_string(),
        })
    }

    async fn avatar(&self) -> Result<Option<SignedToken>, BridgeError> {
        let token = mint(
            "avatar",
            serde_json::json!({
                "did": "did:plc:ada",
                "avatar": "data:image/png;base64,iVBORw0KGgo=",
            }),
        )
        .map_err(|e| BridgeError::Rejected {
            call: "avatar",
            reason: e.to_string(),
        })?;
        Ok(Some(token))
    }

    fn browser_details(&self) -> BrowserDetails {
        BrowserDetails {
            name: "hostapp".into(),
            version: "4.2.0".into(),
            platform: Platform::Android,
            supported_permissions: vec!["camera".into(), "microphone".into()],
        }
    }

    async fn request_permission(&self, permission: &str) -> Result<bool, BridgeError> {
        Ok(permission == "camera")
    }

    async fn close(&self) -> Result<(), BridgeError> {
        println!("[host] webview dismissed");
        Ok(())
    }
}

struct DemoChannel(mpsc::Receiver<ChannelMessage>);

impl MessageChannel for DemoChannel {
    async fn recv(&mut self) -> Option<ChannelMessage> {
        self.0.recv().await
    }
}

/// Mint a signed token the way the host's backend does.
fn mint(
    kind: &str,
    data: serde_json::Value,
) -> Result<SignedToken, jsonwebtoken::errors::Error> {
    let now = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map_or(0, |d| d.as_secs());
    let claims = serde_json::json!({
        "type": kind,
        "data": data,
        "iat": now,
        "exp": now + 300,
    });
    let token = jsonwebtoken::encode(
        &jsonwebtoken::Header::default(),
        &claims,
        &jsonwebtoken::EncodingKey::from_secret(SECRET),
    )?;
    Ok(SignedToken(token))
}

fn describe(snap: &SessionSnapshot) -> String {
    format!(
        "state: {} (profile: {}, avatar: {})",
        snap.state,
        snap.profile.as_ref().map(|p| p.name.as_str()).unwrap_or("-"),
        if snap.avatar.is_some() { "yes" } else { "no" },
    )
}

// ---------------------------------------------------------------------------
// Page bootstrap
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    eprintln!("mounting profile page against a scripted host");

    let (host_tx, host_rx) = mpsc::channel(8);
    let page = AlcovePageBuilder::new(TokenVerifier::hs256(SECRET))
        .allow_origin(PAGE_ORIGIN)
        .mount(DemoHost, DemoChannel(host_rx));

    if let Some(details) = page.browser_details() {
        println!(
            "[page] host surface: {} {} on {}",
            details.name, details.version, details.platform
        );
    }

    // Watch the session until profile and avatar are both on display.
    let mut session = page.session();
    loop {
        let snap = session.snapshot();
        println!("[page] {}", describe(&snap));
        if snap.state == SessionState::Ready && snap.avatar.is_some() {
            break;
        }
        session.changed().await?;
    }

    let granted = page.request_permission("camera").await?;
    println!("[page] camera permission granted: {granted}");

    // The host ends the session with a signed disconnect.
    host_tx
        .send(ChannelMessage {
            jwt: Some(mint("disconnected", serde_json::json!({}))?),
            origin: Some(PAGE_ORIGIN.into()),
        })
        .await?;

    loop {
        session.changed().await?;
        let snap = session.snapshot();
        println!("[page] {}", describe(&snap));
        if snap.state == SessionState::Disconnected {
            break;
        }
    }

    page.close().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    async fn settled(session: &mut SessionHandle) -> SessionSnapshot {
        tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                let snap = session.snapshot();
                if snap.state == SessionState::Ready && snap.avatar.is_some() {
                    return snap;
                }
                session.changed().await.expect("session closed");
            }
        })
        .await
        .expect("page never settled")
    }

    #[tokio::test]
    async fn test_scripted_host_reaches_ready_with_avatar() {
        let (_tx, rx) = mpsc::channel(4);
        let page = AlcovePageBuilder::new(TokenVerifier::hs256(SECRET))
            .mount(DemoHost, DemoChannel(rx));

        let mut session = page.session();
        let snap = settled(&mut session).await;
        assert_eq!(snap.profile.unwrap().name, "Ada Lovelace");
    }

    #[tokio::test]
    async fn test_scripted_disconnect_clears_page() {
        let (tx, rx) = mpsc::channel(4);
        let page = AlcovePageBuilder::new(TokenVerifier::hs256(SECRET))
            .allow_origin(PAGE_ORIGIN)
            .mount(DemoHost, DemoChannel(rx));

        let mut session = page.session();
        settled(&mut session).await;

        tx.send(ChannelMessage {
            jwt: Some(mint("disconnected", serde_json::json!({})).unwrap()),
            origin: Some(PAGE_ORIGIN.into()),
        })
        .await
        .unwrap();

        let snap = tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                session.changed().await.expect("session closed");
                let snap = session.snapshot();
                if snap.state == SessionState::Disconnected {
                    return snap;
                }
            }
        })
        .await
        .expect("disconnect never landed");
        assert!(snap.profile.is_none());
    }

    #[tokio::test]
    async fn test_scripted_host_grants_only_camera() {
        let (_tx, rx) = mpsc::channel(4);
        let page = AlcovePageBuilder::new(TokenVerifier::hs256(SECRET))
            .mount(DemoHost, DemoChannel(rx));

        assert!(page.request_permission("camera").await.unwrap());
        assert!(!page.request_permission("microphone").await.unwrap());
    }
}
