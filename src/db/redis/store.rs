use redis::AsyncCommands;
use redis::Client;
use tokio::sync::mpsc;

use crate::db::cache::{CacheRecord, CacheStore};
use crate::error::AppError;
use crate::error::AppResult;

/// How long an expired record is kept around as a fail-open fallback
const STALE_RETENTION_SECS: u64 = 30 * 24 * 60 * 60;

/// Records with a TTL above this are written without a Redis expiry
const PERSISTENT_TTL_SECS: u64 = 10 * 365 * 24 * 60 * 60;

/// Creates a Redis client for caching
pub fn create_redis_client(redis_url: &str) -> anyhow::Result<Client> {
    let client = Client::open(redis_url)?;
    Ok(client)
}

/// Redis key expiry for a record: its own TTL plus the stale retention window
fn redis_expiry(record: &CacheRecord) -> Option<u64> {
    let ttl_secs = record.ttl().as_secs();
    if ttl_secs >= PERSISTENT_TTL_SECS {
        None
    } else {
        Some(ttl_secs + STALE_RETENTION_SECS)
    }
}

/// Message for asynchronous cache writes
struct CacheWriteMessage {
    key: String,
    value: String,
    expiry: Option<u64>,
}

/// Redis-backed record store with a background writer
#[derive(Clone)]
pub struct RedisStore {
    redis_client: Client,
    write_tx: mpsc::UnboundedSender<CacheWriteMessage>,
}

/// Handle for gracefully shutting down the cache writer
pub struct CacheWriterHandle {
    shutdown_tx: mpsc::Sender<()>,
}

impl CacheWriterHandle {
    /// Initiates a graceful shutdown of the cache writer
    ///
    /// Sends a shutdown signal to the writer task, which flushes all pending
    /// writes to Redis before exiting.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;
        tracing::info!("Cache writer shutdown signal sent");
    }
}

impl RedisStore {
    /// Creates a new store and spawns its background write task
    ///
    /// Writes never block the request that produced them.
    pub fn new(redis_client: Client) -> (Self, CacheWriterHandle) {
        let (write_tx, write_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);

        let client = redis_client.clone();
        tokio::spawn(async move {
            Self::cache_writer_task(client, write_rx, shutdown_rx).await;
        });

        let store = Self {
            redis_client,
            write_tx,
        };

        (store, CacheWriterHandle { shutdown_tx })
    }

    async fn cache_writer_task(
        client: Client,
        mut write_rx: mpsc::UnboundedReceiver<CacheWriteMessage>,
        mut shutdown_rx: mpsc::Receiver<()>,
    ) {
        tracing::info!("Cache writer task started");

        loop {
            tokio::select! {
                Some(msg) = write_rx.recv() => {
                    if let Err(e) = Self::write_to_redis(&client, msg).await {
                        tracing::error!(error = %e, "Failed to write to Redis cache");
                    }
                }
                _ = shutdown_rx.recv() => {
                    tracing::info!("Cache writer shutting down, flushing remaining writes");

                    write_rx.close();
                    while let Some(msg) = write_rx.recv().await {
                        if let Err(e) = Self::write_to_redis(&client, msg).await {
                            tracing::error!(error = %e, "Failed to flush cache write during shutdown");
                        }
                    }

                    tracing::info!("Cache writer task stopped");
                    break;
                }
            }
        }
    }

    async fn write_to_redis(client: &Client, msg: CacheWriteMessage) -> AppResult<()> {
        let mut conn = client.get_multiplexed_async_connection().await?;
        match msg.expiry {
            Some(secs) => {
                let _: () = conn.set_ex(msg.key, msg.value, secs).await?;
            }
            None => {
                let _: () = conn.set(msg.key, msg.value).await?;
            }
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl CacheStore for RedisStore {
    async fn load(&self, key: &str) -> AppResult<Option<CacheRecord>> {
        let mut conn = self.redis_client.get_multiplexed_async_connection().await?;
        let cached: Option<String> = conn.get(key).await?;

        match cached {
            Some(json) => {
                let record = serde_json::from_str(&json).map_err(|e| {
                    AppError::Internal(format!("Cache deserialization error: {}", e))
                })?;
                Ok(Some(record))
            }
            None => Ok(None),
        }
    }

    async fn save(&self, record: CacheRecord) {
        let value = match serde_json::to_string(&record) {
            Ok(json) => json,
            Err(e) => {
                tracing::error!(error = %e, "Cache serialization error");
                return;
            }
        };

        let msg = CacheWriteMessage {
            expiry: redis_expiry(&record),
            key: record.key,
            value,
        };

        if let Err(e) = self.write_tx.send(msg) {
            tracing::error!(error = %e, "Failed to send cache write message");
        }
    }

    fn name(&self) -> &'static str {
        "redis"
    }
}
