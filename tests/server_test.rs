//! HTTP surface tests against a server bound to an ephemeral port.

use mulepool::config::Config;
use mulepool::engine::Engine;
use mulepool::predictor::{EchoPredictor, PredictError, Predictor};
use mulepool::server;
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

/// Echoes input, fails on "boom", sleeps on "slow".
struct TestPredictor;

impl Predictor for TestPredictor {
    fn name(&self) -> &str {
        "test"
    }

    fn predict(&self, text: &str) -> Result<Value, PredictError> {
        match text {
            "boom" => Err(PredictError::new("model exploded")),
            "slow" => {
                std::thread::sleep(Duration::from_millis(300));
                Ok(json!("slow"))
            }
            other => Ok(json!(other)),
        }
    }
}

struct TestServer {
    base: String,
    client: reqwest::Client,
    stop: Option<oneshot::Sender<()>>,
    handle: tokio::task::JoinHandle<Engine>,
}

impl TestServer {
    async fn start(predictor: Arc<dyn Predictor>, timeout: Duration) -> Self {
        let config = Config {
            workers: 2,
            request_timeout: timeout,
            ..Config::default()
        };
        let engine = Engine::start(&config, predictor);
        let router = server::router(&engine);

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let (stop, stopped) = oneshot::channel::<()>();

        let handle = tokio::spawn(async move {
            server::serve(listener, router, async {
                let _ = stopped.await;
            })
            .await
            .unwrap();
            engine
        });

        Self {
            base,
            client: reqwest::Client::new(),
            stop: Some(stop),
            handle,
        }
    }

    async fn post(&self, path: &str, body: Value) -> (u16, Value) {
        let response = self
            .client
            .post(format!("{}{path}", self.base))
            .json(&body)
            .send()
            .await
            .unwrap();
        let status = response.status().as_u16();
        (status, response.json().await.unwrap())
    }

    async fn stop(self) {
        let TestServer {
            client,
            stop,
            handle,
            ..
        } = self;
        // Close pooled keep-alive connections so graceful shutdown can finish.
        drop(client);
        if let Some(stop) = stop {
            let _ = stop.send(());
        }
        let engine = handle.await.unwrap();
        engine.shutdown(Duration::from_secs(1)).await;
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn predict_returns_worker_result() {
    let server = TestServer::start(Arc::new(EchoPredictor), Duration::from_secs(5)).await;

    let (status, body) = server.post("/predict", json!({"text": "hola"})).await;
    assert_eq!(status, 200);
    assert_eq!(body, json!({"res": "hola"}));

    server.stop().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn missing_text_is_a_client_error() {
    let server = TestServer::start(Arc::new(EchoPredictor), Duration::from_secs(5)).await;

    let (status, body) = server.post("/predict", json!({})).await;
    assert_eq!(status, 400);
    assert!(body["error"].as_str().unwrap().contains("text"));

    let stats: Value = server
        .client
        .get(format!("{}/stats", server.base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(stats["queue_depth"], 0);
    assert_eq!(stats["workers"], 2);

    server.stop().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn invalid_json_is_a_client_error() {
    let server = TestServer::start(Arc::new(EchoPredictor), Duration::from_secs(5)).await;

    let response = server
        .client
        .post(format!("{}/predict", server.base))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);
    let body: Value = response.json().await.unwrap();
    assert!(body["error"].is_string());

    server.stop().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn worker_failure_is_an_error_payload() {
    let server = TestServer::start(Arc::new(TestPredictor), Duration::from_secs(5)).await;

    let (status, body) = server.post("/predict", json!({"text": "boom"})).await;
    assert_eq!(status, 500);
    assert_eq!(body, json!({"error": "model exploded"}));

    server.stop().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn slow_worker_yields_gateway_timeout() {
    let server = TestServer::start(Arc::new(TestPredictor), Duration::from_millis(50)).await;

    let (status, body) = server.post("/predict", json!({"text": "slow"})).await;
    assert_eq!(status, 504);
    assert!(body["error"].is_string());

    server.stop().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn sync_variant_returns_input_and_prediction() {
    let server = TestServer::start(Arc::new(EchoPredictor), Duration::from_secs(5)).await;

    let (status, body) = server.post("/predict/sync", json!({"text": "hola"})).await;
    assert_eq!(status, 200);
    assert_eq!(body, json!({"input": {"text": "hola"}, "prediction": "hola"}));

    server.stop().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn health_is_ok() {
    let server = TestServer::start(Arc::new(EchoPredictor), Duration::from_secs(5)).await;

    let response = server
        .client
        .get(format!("{}/health", server.base))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    assert_eq!(response.text().await.unwrap(), "OK");

    server.stop().await;
}
