use std::sync::Arc;
use std::time::Duration;

use ragpanel::{
    backend::{BackendApi, BackendClient},
    config::Config,
    panel::Panel,
    state::{Phase, Section},
};

fn live_client() -> BackendClient {
    let mut config = Config::from_env().expect("valid RAGPANEL_* environment");
    config.request_timeout.get_or_insert(Duration::from_secs(120));
    BackendClient::from_config(&config).expect("backend client")
}

#[tokio::test]
#[ignore = "Requires live backend"]
async fn live_backend_health() {
    let health = live_client().health().await.expect("backend reachable");
    assert_eq!(health.status, "ok", "unexpected health payload: {health:?}");
}

#[tokio::test]
#[ignore = "Requires live backend with an LLM"]
async fn live_summarize_roundtrip() {
    let backend: Arc<dyn BackendApi> = Arc::new(live_client());
    let panel = Panel::new(backend, 4);
    panel
        .set_summary_text(
            "Rust is a systems programming language focused on safety, speed, and concurrency. \
             It achieves memory safety without a garbage collector through ownership.",
        )
        .await;
    panel
        .summarize()
        .await
        .expect("summarize dispatched")
        .await
        .expect("join");

    let state = panel.snapshot().await;
    assert_eq!(state.phase(Section::Summary), Phase::Ready, "{}", state.summary());
    assert!(!state.summary().is_empty());
}
