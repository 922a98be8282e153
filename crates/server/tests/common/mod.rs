//! # Common Test Utilities
//!
//! `TestApp` spawns a real server on a random port. Its configuration points
//! the `default` provider at an `httpmock::MockServer` speaking the
//! OpenAI-compatible chat API, and its warehouse is an in-memory SQLite
//! database seeded with the Northwind demo data.

// Not every test file uses every helper.
#![allow(unused)]

use anyhow::Result;
use axum::serve;
use httpmock::{Method::POST, MockServer};
use insightql_server::{
    config, router,
    state::{build_app_state, AppState},
};
use reqwest::Client;
use serde_json::json;
use std::{fs::File, io::Write, net::SocketAddr};
use tempfile::{tempdir, TempDir};
use tokio::{net::TcpListener, task::JoinHandle};

// Unique substrings of the default system prompts.
pub const VALIDATOR: &str = "Context Validator";
pub const CLARIFIER: &str = "Intent Clarifier";
pub const ROUTER: &str = "Dashboard Router";
pub const TRANSLATOR: &str = "SQL Data Analyst";
pub const VISUALIZER: &str = "Data Visualization Expert";

pub const CHAT_PATH: &str = "/v1/chat/completions";

/// A harness for end-to-end testing of the Axum server.
pub struct TestApp {
    pub address: String,
    pub client: Client,
    pub mock_server: MockServer,
    pub app_state: AppState,
    _config_dir: TempDir,
    _server_handle: JoinHandle<()>,
    shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl TestApp {
    /// Spawns the application server and returns a `TestApp` instance.
    pub async fn spawn() -> Result<Self> {
        Self::spawn_with("").await
    }

    /// Like `spawn`, with extra YAML appended to the generated `config.yml`.
    pub async fn spawn_with(extra_config: &str) -> Result<Self> {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .compact()
            .with_test_writer()
            .try_init();

        let mock_server = MockServer::start_async().await;

        let config_dir = tempdir()?;
        let config_path = config_dir.path().join("config.yml");
        let config_content = format!(
            r#"
port: 0
db_url: ":memory:"
seed_demo_data: true
environment: "test"
providers:
  default:
    provider: "local"
    api_url: "{}"
    api_key: null
    model_name: "mock-chat-model"
{extra_config}
"#,
            mock_server.url(CHAT_PATH),
        );
        let mut file = File::create(&config_path)?;
        file.write_all(config_content.as_bytes())?;

        let config = config::get_config(Some(config_path.to_str().unwrap()))?;
        let app_state = build_app_state(config).await?;

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr: SocketAddr = listener.local_addr()?;
        let address = format!("http://{addr}");

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
        let app = router::create_router(app_state.clone());
        let server_handle = tokio::spawn(async move {
            let server = serve(listener, app).with_graceful_shutdown(async {
                shutdown_rx.await.ok();
            });
            if let Err(e) = server.await {
                tracing::error!("[TestApp] Server error: {}", e);
            }
        });

        Ok(Self {
            address,
            client: Client::new(),
            mock_server,
            app_state,
            _config_dir: config_dir,
            _server_handle: server_handle,
            shutdown_tx: Some(shutdown_tx),
        })
    }

    pub fn ws_url(&self) -> String {
        format!("{}/ws", self.address.replacen("http://", "ws://", 1))
    }

    /// Programs the model reply for prompts whose body contains every needle.
    pub async fn mock_reply(&self, needles: &[&str], reply: &str) {
        let content = reply.to_string();
        self.mock_server
            .mock_async(|when, then| {
                let mut when = when.method(POST).path(CHAT_PATH);
                for needle in needles {
                    when = when.body_contains(*needle);
                }
                then.status(200).json_body(json!({
                    "choices": [{"message": {"role": "assistant", "content": content}}]
                }));
            })
            .await;
    }

    /// Programs a single-chart run: clarifier, router, translator and visualizer.
    pub async fn mock_single_chart(&self, enriched_query: &str, sql: &str, visualization: &str) {
        self.mock_reply(
            &[CLARIFIER],
            &json!({"isAmbiguous": false, "enrichedQuery": enriched_query}).to_string(),
        )
        .await;
        self.mock_reply(&[ROUTER], r#"{"isDashboard": false}"#).await;
        self.mock_reply(&[TRANSLATOR], sql).await;
        self.mock_reply(&[VISUALIZER], visualization).await;
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}
