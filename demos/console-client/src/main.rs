//! Console walkthrough of a Warden session against a live API.
//!
//! ```text
//! WARDEN_API_URL=https://api.example.com \
//! WARDEN_EMAIL=alice@example.com WARDEN_PASSWORD=s3cret \
//! RUST_LOG=warden=debug cargo run -p console-client
//! ```
//!
//! The session is kept in a JSON file under the system temp directory,
//! so a second run within 24 hours restores it instead of signing in.

use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use warden::prelude::*;

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(env_or("RUST_LOG", "info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let base_url = env_or("WARDEN_API_URL", "http://localhost:8000/api");
    let session_file = std::env::temp_dir().join("warden-console-session.json");

    let (navigator, mut routes) = ChannelNavigator::new();
    let manager = SessionManager::builder()
        .storage(std::sync::Arc::new(FileStorage::new(&session_file)))
        .navigator(navigator)
        .build_http(TransportConfig::with_base_url(base_url.as_str()))?;

    tokio::spawn(async move {
        while let Some(route) = routes.recv().await {
            eprintln!("-> navigate to {route:?}");
        }
    });

    let mut notices = manager.subscribe_notices();
    tokio::spawn(async move {
        while notices.changed().await.is_ok() {
            if let Some(notice) = notices.borrow_and_update().clone() {
                eprintln!("[{:?}] {}: {}", notice.kind, notice.title, notice.message);
            }
        }
    });

    match manager.check_status().await {
        Ok(response) => tracing::info!(status = response.status, "API reachable"),
        Err(err) => tracing::warn!(error = %err, "status check failed"),
    }

    if manager.is_authenticated() {
        tracing::info!(file = %session_file.display(), "session restored");
    } else {
        let credentials = Credentials::new(
            env_or("WARDEN_EMAIL", "alice@example.com"),
            env_or("WARDEN_PASSWORD", "secret"),
        );
        if let Err(err) = manager.login(&credentials).await {
            eprintln!("sign-in failed: {}", err.user_message());
            return Ok(());
        }
    }

    let user = manager.refresh_profile().await?;
    println!(
        "signed in as {} (admin: {})",
        user.display_name().unwrap_or_else(|| "unknown".into()),
        manager.is_admin()
    );

    // Stand-in for UI events.
    for _ in 0..3 {
        tokio::time::sleep(Duration::from_secs(1)).await;
        manager.activity().pulse();
        println!("idle logout in {:?}", manager.idle_remaining());
    }

    manager.logout()?;
    println!("state: {}", manager.state());
    Ok(())
}
