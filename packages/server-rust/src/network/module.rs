//! Network module with deferred startup lifecycle.
//!
//! `new()` captures configuration and the pipeline stack, `start()` binds
//! the TCP listener, and `serve()` accepts connections until shutdown. The
//! split lets the binary report the bound port before traffic flows.

use std::future::{Future, IntoFuture};
use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::post;
use axum::Router;
use tokio::net::TcpListener;
use tracing::{info, warn};

use super::config::NetworkConfig;
use super::handlers::{message_handler, AppState, MESSAGE_ROUTE};
use super::middleware::{build_http_layers, MAX_BODY_BYTES};
use super::shutdown::ShutdownController;
use crate::pipeline::PipelineStack;

/// Manages the HTTP server lifecycle.
pub struct NetworkModule {
    config: NetworkConfig,
    pipeline: PipelineStack,
    listener: Option<TcpListener>,
    shutdown: Arc<ShutdownController>,
}

impl NetworkModule {
    /// Creates a new network module without binding any port.
    #[must_use]
    pub fn new(config: NetworkConfig, pipeline: PipelineStack) -> Self {
        Self {
            config,
            pipeline,
            listener: None,
            shutdown: Arc::new(ShutdownController::new()),
        }
    }

    #[must_use]
    pub fn shutdown_controller(&self) -> Arc<ShutdownController> {
        Arc::clone(&self.shutdown)
    }

    /// Assembles the axum router with its route and middleware.
    ///
    /// Routes:
    /// - `POST /api/v1/llm/message` -- classify, extract, and publish one message
    ///
    /// Bodies above [`MAX_BODY_BYTES`] are answered with 413.
    pub fn build_router(&self) -> Router {
        let state = AppState {
            pipeline: self.pipeline.clone(),
            shutdown: Arc::clone(&self.shutdown),
        };

        Router::new()
            .route(MESSAGE_ROUTE, post(message_handler))
            .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
            .layer(build_http_layers(&self.config))
            .with_state(state)
    }

    /// Binds the TCP listener to the configured host and port.
    ///
    /// Returns the actual bound port, which differs from the configured
    /// port when port 0 is used.
    ///
    /// # Errors
    ///
    /// Returns an error if the address cannot be bound (e.g., port in use).
    pub async fn start(&mut self) -> anyhow::Result<u16> {
        let addr = format!("{}:{}", self.config.host, self.config.port);
        let listener = TcpListener::bind(&addr).await?;
        let port = listener.local_addr()?.port();

        info!(host = %self.config.host, port, "TCP listener bound");

        self.listener = Some(listener);
        Ok(port)
    }

    /// Serves requests until `shutdown` resolves, then drains.
    ///
    /// After the shutdown signal the listener stops accepting, new requests on
    /// open connections get 503, and requests already inside the pipeline
    /// have up to `drain_timeout` to finish. When the timeout expires `serve`
    /// returns without waiting for the remaining connections.
    ///
    /// # Errors
    ///
    /// Returns an error if `start()` was not called first or the server hits
    /// a fatal I/O error.
    pub async fn serve(
        mut self,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> anyhow::Result<()> {
        let listener = self
            .listener
            .take()
            .ok_or_else(|| anyhow::anyhow!("start() must be called before serve()"))?;
        let router = self.build_router();
        let shutdown_ctrl = Arc::clone(&self.shutdown);
        let drain_timeout = self.config.drain_timeout;

        info!(route = MESSAGE_ROUTE, "serving HTTP");

        let signal_ctrl = Arc::clone(&shutdown_ctrl);
        let server = axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                shutdown.await;
                info!("shutdown signal received, draining");
                signal_ctrl.trigger_shutdown();
            })
            .into_future();

        let mut draining = shutdown_ctrl.shutdown_receiver();
        let deadline = async move {
            let signalled = draining.wait_for(|draining| *draining).await.is_ok();
            if !signalled {
                std::future::pending::<()>().await;
            }
            tokio::time::sleep(drain_timeout).await;
        };

        tokio::select! {
            served = server => {
                served?;
                info!("all connections drained");
            }
            () = deadline => {
                warn!(
                    in_flight = shutdown_ctrl.in_flight_count(),
                    ?drain_timeout,
                    "drain timeout expired, abandoning open connections"
                );
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::json;
    use tower::ServiceExt;

    use super::*;
    use crate::network::handlers::OUTCOME_HEADER;
    use crate::pipeline::{build_pipeline_stack, PipelineConfig};
    use crate::test_support::{hdfc_record, pipeline_with, RecordingPublisher, ScriptedExtractor};

    const HDFC: &str = "Your HDFC Bank account was debited INR 1200 at Amazon";

    fn module_with(config: NetworkConfig, extractor: Arc<ScriptedExtractor>) -> NetworkModule {
        let pipeline = pipeline_with(extractor, RecordingPublisher::new());
        let stack = build_pipeline_stack(Arc::new(pipeline), &PipelineConfig::default());
        NetworkModule::new(config, stack)
    }

    fn module(config: NetworkConfig) -> NetworkModule {
        module_with(config, ScriptedExtractor::ok(hdfc_record()))
    }

    fn local() -> NetworkConfig {
        NetworkConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            ..NetworkConfig::default()
        }
    }

    #[test]
    fn new_creates_module_without_binding() {
        let module = module(local());
        assert!(module.listener.is_none());
    }

    #[test]
    fn shutdown_controller_returns_shared_arc() {
        let module = module(local());
        assert!(Arc::ptr_eq(
            &module.shutdown_controller(),
            &module.shutdown_controller()
        ));
    }

    #[tokio::test]
    async fn start_binds_to_os_assigned_port() {
        let mut module = module(local());
        let port = module.start().await.unwrap();
        assert!(port > 0);
        assert!(module.listener.is_some());
    }

    #[tokio::test]
    async fn serve_without_start_is_an_error() {
        let module = module(local());
        let err = module.serve(std::future::pending::<()>()).await.unwrap_err();
        assert!(err.to_string().contains("start()"));
    }

    #[tokio::test]
    async fn serves_messages_until_shutdown() {
        let mut module = module(local());
        let port = module.start().await.unwrap();
        let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
        let server = tokio::spawn(module.serve(async {
            let _ = stop_rx.await;
        }));

        let response = reqwest::Client::new()
            .post(format!("http://127.0.0.1:{port}{MESSAGE_ROUTE}"))
            .json(&json!({ "message": HDFC }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
        assert_eq!(
            response.json::<serde_json::Value>().await.unwrap(),
            json!({ "amount": "1200", "merchant": "Amazon", "currency": "INR" })
        );

        stop_tx.send(()).unwrap();
        tokio::time::timeout(Duration::from_secs(5), server)
            .await
            .unwrap()
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn oversized_body_is_rejected() {
        let router = module(local()).build_router();
        let padding = "x".repeat(MAX_BODY_BYTES + 1);
        let body = json!({ "message": format!("{HDFC} {padding}") }).to_string();

        let response = router
            .oneshot(
                Request::post(MESSAGE_ROUTE)
                    .header("content-type", "application/json")
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(response.headers()[OUTCOME_HEADER], "payload_too_large");
    }

    #[tokio::test]
    async fn drain_timeout_bounds_shutdown() {
        let config = NetworkConfig {
            drain_timeout: Duration::from_millis(50),
            ..local()
        };
        let extractor = ScriptedExtractor::slow(hdfc_record(), Duration::from_millis(1500));
        let mut module = module_with(config, extractor);
        let shutdown = module.shutdown_controller();
        let port = module.start().await.unwrap();
        let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
        let server = tokio::spawn(module.serve(async {
            let _ = stop_rx.await;
        }));

        let request = tokio::spawn(
            reqwest::Client::new()
                .post(format!("http://127.0.0.1:{port}{MESSAGE_ROUTE}"))
                .json(&json!({ "message": HDFC }))
                .send(),
        );
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(shutdown.in_flight_count(), 1);

        let stopped_at = tokio::time::Instant::now();
        stop_tx.send(()).unwrap();
        tokio::time::timeout(Duration::from_secs(1), server)
            .await
            .expect("serve must return once the drain timeout expires")
            .unwrap()
            .unwrap();

        assert!(stopped_at.elapsed() < Duration::from_millis(1000));
        assert!(shutdown.is_draining());
        request.abort();
    }
}
