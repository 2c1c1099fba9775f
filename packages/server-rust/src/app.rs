//! Wires the pipeline from configuration and runs the server to completion.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use spendwire_core::KeywordClassifier;
use tracing::{info, warn};

use crate::config::ServerArgs;
use crate::extract::MistralExtractor;
use crate::network::NetworkModule;
use crate::pipeline::{build_pipeline_stack, Pipeline};
use crate::publish::{start_publisher, EventSink, KafkaRestSink, LogSink, PublishWorker};

/// A fully wired but not yet listening server.
pub struct App {
    network: NetworkModule,
    publish_worker: PublishWorker,
    flush_timeout: Duration,
}

impl App {
    /// Builds every component from `args` and binds the listener.
    ///
    /// Returns the app together with the bound port.
    ///
    /// # Errors
    ///
    /// Returns an error if an HTTP client cannot be built or the listener
    /// cannot be bound.
    pub async fn build(args: &ServerArgs) -> anyhow::Result<(Self, u16)> {
        let extractor_config = args.extractor_config();
        let publisher_config = args.publisher_config();
        let pipeline_config = args.pipeline_config();

        info!(
            model = %extractor_config.model,
            endpoint = %extractor_config.base_url,
            "configuring extractor"
        );
        let extractor = MistralExtractor::new(extractor_config)?;

        let sink: Arc<dyn EventSink> = match &publisher_config.rest_url {
            Some(url) => {
                info!(%url, "publishing through Kafka REST proxy");
                Arc::new(KafkaRestSink::new(url, publisher_config.request_timeout)?)
            }
            None => {
                info!("no Kafka REST proxy configured, records will be logged");
                Arc::new(LogSink)
            }
        };
        let (publisher, publish_worker) = start_publisher(sink, publisher_config.queue_capacity);

        let pipeline = Pipeline::new(
            Arc::new(KeywordClassifier::default()),
            Arc::new(extractor),
            Arc::new(publisher),
        );
        let stack = build_pipeline_stack(Arc::new(pipeline), &pipeline_config);

        let mut network = NetworkModule::new(args.network_config(), stack);
        let port = network.start().await?;

        Ok((
            Self {
                network,
                publish_worker,
                flush_timeout: publisher_config.flush_timeout,
            },
            port,
        ))
    }

    /// Serves until `shutdown` resolves, then drains requests and the
    /// publish queue.
    ///
    /// Records still queued once `flush_timeout` expires are dropped with a
    /// warning.
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails with a fatal I/O error. The
    /// publish queue is drained either way.
    pub async fn run(self, shutdown: impl Future<Output = ()> + Send + 'static) -> anyhow::Result<()> {
        let Self {
            network,
            mut publish_worker,
            flush_timeout,
        } = self;

        let served = network.serve(shutdown).await;

        info!(?flush_timeout, "flushing publish queue");
        if !publish_worker.stop(flush_timeout).await {
            warn!(?flush_timeout, "publish queue flush timed out, undelivered records dropped");
        }
        served
    }
}
