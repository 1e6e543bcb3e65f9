//! Event bus on Redis Streams.
//!
//! Routing keys map to stream keys (`{prefix}.{routing_key}`); every logical
//! queue is a consumer group on its stream, so independent queues bound to
//! the same routing key each see every message (topic fan-out). Delivery is
//! at-least-once: messages are acknowledged explicitly, undecodable payloads
//! are acked and dropped, and handler failures are retried before the
//! message is diverted to the dead-letter stream.
//!
//! Each consumer loop owns an exclusive connection. Consumers must never
//! share one: a failing connection then only takes down its own loop, which
//! recovers through the bounded reconnect policy below.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::streams::{StreamReadOptions, StreamReadReply};
use redis::{AsyncCommands, Client};
use serde_json::Value;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::error::AppError;

// Consumer reconnect policy: base delay doubling per attempt, hard cap on
// attempts. Exceeding the cap stops that consumer only.
const MAX_CONNECT_ATTEMPTS: u32 = 5;
const CONNECT_BASE_DELAY_MS: u64 = 1_000;

// Handler retry policy before a message is dead-lettered.
const MAX_HANDLER_ATTEMPTS: u32 = 3;
const HANDLER_RETRY_DELAY_MS: u64 = 100;

// Publisher retry configuration (request path)
const PUBLISHER_MAX_ATTEMPTS: u32 = 3;
const PUBLISHER_INITIAL_RETRY_DELAY_MS: u64 = 50;
const PUBLISHER_MAX_RETRY_DELAY_MS: u64 = 200;

const READ_BATCH_SIZE: usize = 16;
const READ_BLOCK_MS: usize = 1_000;

const PAYLOAD_FIELD: &str = "payload";

/// Handler invoked for every decoded message on a queue.
#[async_trait]
pub trait EventHandler: Send + Sync {
    async fn handle(&self, payload: Value) -> Result<(), AppError>;
}

/// One logical queue bound to a routing key.
#[derive(Debug, Clone, Copy)]
pub struct ConsumerConfig {
    pub queue: &'static str,
    pub routing_key: &'static str,
    pub dead_letter: bool,
}

pub struct EventBus {
    prefix: String,
    client: Client,
    publisher: Mutex<ConnectionManager>,
}

impl EventBus {
    pub async fn connect(redis_url: &str, prefix: impl Into<String>) -> Result<Arc<Self>, AppError> {
        let client = Client::open(redis_url)
            .map_err(|err| AppError::config(format!("Invalid REDIS_URL: {err}")))?;

        let manager = ConnectionManager::new(client.clone()).await.map_err(|err| {
            AppError::broker_unavailable(format!(
                "Unable to initialize event bus connection manager: {err}"
            ))
        })?;

        Ok(Arc::new(Self {
            prefix: prefix.into(),
            client,
            publisher: Mutex::new(manager),
        }))
    }

    pub fn stream_key(&self, routing_key: &str) -> String {
        format!("{}.{routing_key}", self.prefix)
    }

    pub fn dead_letter_key(&self) -> String {
        format!("{}.dlq", self.prefix)
    }

    /// Publish a JSON payload under a routing key, retrying transient
    /// failures with exponential backoff.
    pub async fn publish(&self, routing_key: &str, payload: &Value) -> Result<(), AppError> {
        let key = self.stream_key(routing_key);
        let encoded = serde_json::to_string(payload)
            .map_err(|err| AppError::internal(format!("Failed to serialize event: {err}")))?;

        let mut attempt = 0u32;
        loop {
            attempt += 1;

            let publish_res = {
                let mut publisher = self.publisher.lock().await;
                publisher
                    .xadd::<_, _, _, _, String>(&key, "*", &[(PAYLOAD_FIELD, encoded.as_str())])
                    .await
            };

            match publish_res {
                Ok(_) => return Ok(()),
                Err(err) => {
                    if attempt >= PUBLISHER_MAX_ATTEMPTS {
                        return Err(AppError::broker_unavailable(format!(
                            "Failed to publish event {routing_key}: {err}"
                        )));
                    }

                    let delay_ms = PUBLISHER_INITIAL_RETRY_DELAY_MS
                        .saturating_mul(2_u64.pow(attempt - 1))
                        .min(PUBLISHER_MAX_RETRY_DELAY_MS);
                    warn!(
                        error = %err,
                        routing_key,
                        attempt,
                        retry_delay_ms = delay_ms,
                        "event publish failed, retrying"
                    );
                    sleep(Duration::from_millis(delay_ms)).await;
                }
            }
        }
    }
}

/// Spawn a consumer loop for one queue. The loop runs until shutdown is
/// requested or the reconnect budget is exhausted.
pub fn spawn_consumer(
    bus: Arc<EventBus>,
    config: ConsumerConfig,
    handler: Arc<dyn EventHandler>,
    shutdown: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        run_consumer_with_retry(bus, config, handler, shutdown).await;
    })
}

async fn run_consumer_with_retry(
    bus: Arc<EventBus>,
    config: ConsumerConfig,
    handler: Arc<dyn EventHandler>,
    shutdown: CancellationToken,
) {
    let mut attempt = 0u32;

    loop {
        attempt += 1;

        match run_consumer_loop(&bus, config, handler.as_ref(), &shutdown).await {
            Ok(()) => {
                info!(queue = config.queue, "consumer stopped");
                return;
            }
            Err(err) => {
                if attempt >= MAX_CONNECT_ATTEMPTS {
                    // Other consumers keep running; this queue stays dark
                    // until the process restarts.
                    error!(
                        error = %err,
                        queue = config.queue,
                        attempts = attempt,
                        "consumer connection retries exhausted, stopping consumer"
                    );
                    return;
                }

                let delay_ms = CONNECT_BASE_DELAY_MS.saturating_mul(2_u64.pow(attempt - 1));
                warn!(
                    error = %err,
                    queue = config.queue,
                    attempt,
                    retry_delay_ms = delay_ms,
                    "consumer connection failed, retrying"
                );
                sleep(Duration::from_millis(delay_ms)).await;
            }
        }
    }
}

async fn run_consumer_loop(
    bus: &EventBus,
    config: ConsumerConfig,
    handler: &dyn EventHandler,
    shutdown: &CancellationToken,
) -> Result<(), AppError> {
    let key = bus.stream_key(config.routing_key);
    let consumer_name = format!("{}-{}", config.queue, Uuid::new_v4());

    // Exclusive connection for this consumer loop.
    let mut conn = ConnectionManager::new(bus.client.clone())
        .await
        .map_err(broker_err)?;

    // Bind the queue: group creation from stream origin so messages published
    // while no consumer was attached are still delivered.
    let group_res: Result<String, _> = conn
        .xgroup_create_mkstream(&key, config.queue, "0")
        .await;
    if let Err(err) = group_res {
        if err.code() != Some("BUSYGROUP") {
            return Err(broker_err(err));
        }
    }

    info!(
        queue = config.queue,
        routing_key = config.routing_key,
        stream = %key,
        "consumer started"
    );

    loop {
        if shutdown.is_cancelled() {
            return Ok(());
        }

        let options = StreamReadOptions::default()
            .group(config.queue, &consumer_name)
            .count(READ_BATCH_SIZE)
            .block(READ_BLOCK_MS);

        let reply: StreamReadReply = conn
            .xread_options(&[&key], &[">"], &options)
            .await
            .map_err(broker_err)?;

        for stream in reply.keys {
            for entry in stream.ids {
                let raw: Option<String> = entry.get(PAYLOAD_FIELD);
                match raw {
                    None => {
                        warn!(
                            queue = config.queue,
                            entry_id = %entry.id,
                            "stream entry without payload field, dropping"
                        );
                    }
                    Some(raw) => match serde_json::from_str::<Value>(&raw) {
                        // Undecodable: reject without requeue.
                        Err(err) => {
                            warn!(
                                error = %err,
                                queue = config.queue,
                                entry_id = %entry.id,
                                "undecodable message, dropping"
                            );
                        }
                        Ok(payload) => {
                            dispatch_with_retry(bus, &mut conn, config, handler, &raw, payload)
                                .await?;
                        }
                    },
                }

                let _: i64 = conn
                    .xack(&key, config.queue, &[entry.id.as_str()])
                    .await
                    .map_err(broker_err)?;
            }
        }
    }
}

/// Run the handler with bounded retries; exhausted messages go to the
/// dead-letter stream when the queue is configured with one.
async fn dispatch_with_retry(
    bus: &EventBus,
    conn: &mut ConnectionManager,
    config: ConsumerConfig,
    handler: &dyn EventHandler,
    raw: &str,
    payload: Value,
) -> Result<(), AppError> {
    for attempt in 1..=MAX_HANDLER_ATTEMPTS {
        match handler.handle(payload.clone()).await {
            Ok(()) => return Ok(()),
            Err(err) => {
                warn!(
                    error = %err,
                    queue = config.queue,
                    attempt,
                    "handler failed"
                );
                if attempt < MAX_HANDLER_ATTEMPTS {
                    sleep(Duration::from_millis(HANDLER_RETRY_DELAY_MS * attempt as u64)).await;
                }
            }
        }
    }

    if config.dead_letter {
        let dlq = bus.dead_letter_key();
        let _: String = conn
            .xadd(
                &dlq,
                "*",
                &[
                    (PAYLOAD_FIELD, raw),
                    ("source_queue", config.queue),
                    ("source_routing_key", config.routing_key),
                ],
            )
            .await
            .map_err(broker_err)?;
        error!(
            queue = config.queue,
            "handler retries exhausted, message diverted to dead-letter stream"
        );
    } else {
        error!(
            queue = config.queue,
            "handler retries exhausted, message dropped"
        );
    }
    Ok(())
}

fn broker_err(err: redis::RedisError) -> AppError {
    AppError::broker_unavailable(err.to_string())
}
