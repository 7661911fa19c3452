use anyhow::{Context, Result};
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config;

/// One stream message as read through a consumer group.
#[derive(Debug, Clone)]
pub struct StreamEntry {
    pub id: String,
    pub payload: String,
}

/// Shared Redis connection for cache keys, dedup sets and streams.
///
/// The managed connection reconnects on its own, so a Redis outage mid-run
/// surfaces as per-call errors on the affected tick rather than a dead
/// process; only the initial connect is allowed to be fatal.
#[derive(Clone)]
pub struct RedisBus {
    connection: ConnectionManager,
}

impl RedisBus {
    /// Connect using REDIS_URL (or the default) and verify with a ping.
    pub async fn connect() -> Result<Self> {
        Self::connect_url(&config::redis_url()).await
    }

    pub async fn connect_url(url: &str) -> Result<Self> {
        let client = Client::open(url).with_context(|| format!("invalid redis url {url}"))?;
        let connection = ConnectionManager::new(client)
            .await
            .context("redis connect failed")?;
        let bus = Self { connection };
        bus.ping().await?;
        Ok(bus)
    }

    pub async fn ping(&self) -> Result<()> {
        let mut conn = self.connection.clone();
        redis::cmd("PING")
            .query_async::<_, String>(&mut conn)
            .await
            .context("redis ping failed")?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Key/value with TTL
    // ------------------------------------------------------------------

    pub async fn get_string(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.connection.clone();
        let v: Option<String> = conn.get(key).await.context("redis get failed")?;
        Ok(v)
    }

    pub async fn set_string(&self, key: &str, value: &str, ttl_secs: u64) -> Result<()> {
        let mut conn = self.connection.clone();
        conn.set_ex::<_, _, ()>(key, value, ttl_secs)
            .await
            .context("redis set failed")?;
        Ok(())
    }

    pub async fn get_i64(&self, key: &str) -> Result<Option<i64>> {
        let mut conn = self.connection.clone();
        let v: Option<i64> = conn.get(key).await.context("redis get failed")?;
        Ok(v)
    }

    pub async fn set_i64(&self, key: &str, value: i64, ttl_secs: u64) -> Result<()> {
        let mut conn = self.connection.clone();
        conn.set_ex::<_, _, ()>(key, value, ttl_secs)
            .await
            .context("redis set failed")?;
        Ok(())
    }

    /// Missing or unset key reads as `Ok(None)`; decode errors propagate.
    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.get_string(key).await? {
            Some(raw) => {
                let v = serde_json::from_str(&raw)
                    .with_context(|| format!("unmarshal {key}"))?;
                Ok(Some(v))
            }
            None => Ok(None),
        }
    }

    pub async fn set_json<T: Serialize>(&self, key: &str, value: &T, ttl_secs: u64) -> Result<()> {
        let raw = serde_json::to_string(value)?;
        self.set_string(key, &raw, ttl_secs).await
    }

    // ------------------------------------------------------------------
    // Dedup sets
    // ------------------------------------------------------------------

    /// Add `member` to the set at `key`, refreshing the TTL. Returns true
    /// when the member was already present (duplicate).
    pub async fn set_add(&self, key: &str, member: &str, ttl_secs: u64) -> Result<bool> {
        let mut conn = self.connection.clone();
        let added: i64 = conn.sadd(key, member).await.context("redis sadd failed")?;
        // TTL refresh is best-effort; the member is already recorded.
        let _: Result<bool, _> = conn.expire(key, ttl_secs as i64).await;
        Ok(added == 0)
    }

    // ------------------------------------------------------------------
    // Bounded lists
    // ------------------------------------------------------------------

    /// Push to the head of a list and trim it to the newest `keep` entries.
    pub async fn list_push_capped(&self, key: &str, value: &str, keep: usize) -> Result<()> {
        let mut conn = self.connection.clone();
        conn.lpush::<_, _, ()>(key, value)
            .await
            .context("redis lpush failed")?;
        conn.ltrim::<_, ()>(key, 0, keep as isize - 1)
            .await
            .context("redis ltrim failed")?;
        Ok(())
    }

    /// Read the newest `count` entries (head of the list first).
    pub async fn list_head(&self, key: &str, count: usize) -> Result<Vec<String>> {
        let mut conn = self.connection.clone();
        let items: Vec<String> = conn
            .lrange(key, 0, count as isize - 1)
            .await
            .context("redis lrange failed")?;
        Ok(items)
    }

    // ------------------------------------------------------------------
    // Streams
    // ------------------------------------------------------------------

    /// XADD a JSON payload to a stream; returns the entry id.
    pub async fn emit<T: Serialize>(&self, stream: &str, payload: &T) -> Result<String> {
        let body = serde_json::to_string(payload)?;
        let mut conn = self.connection.clone();
        let id: String = conn
            .xadd(stream, "*", &[("payload", body.as_str())])
            .await
            .with_context(|| format!("xadd {stream}"))?;
        Ok(id)
    }

    /// Create the consumer group with MKSTREAM; an already-existing group
    /// (BUSYGROUP) is not an error.
    pub async fn ensure_group(&self, stream: &str, group: &str) -> Result<()> {
        let mut conn = self.connection.clone();
        let res: Result<(), redis::RedisError> =
            conn.xgroup_create_mkstream(stream, group, "0").await;
        match res {
            Ok(()) => Ok(()),
            Err(e) if e.to_string().contains("BUSYGROUP") => Ok(()),
            Err(e) => Err(e).with_context(|| format!("xgroup create {stream}/{group}")),
        }
    }

    /// Blocking group read of new messages; returns entries with their
    /// `payload` field. Entries without a payload are skipped.
    pub async fn read_group(
        &self,
        stream: &str,
        group: &str,
        consumer: &str,
        count: usize,
        block_ms: usize,
    ) -> Result<Vec<StreamEntry>> {
        use redis::streams::{StreamReadOptions, StreamReadReply};

        let mut conn = self.connection.clone();
        let opts = StreamReadOptions::default()
            .group(group, consumer)
            .count(count)
            .block(block_ms);
        let reply: StreamReadReply = conn
            .xread_options(&[stream], &[">"], &opts)
            .await
            .with_context(|| format!("xreadgroup {stream}/{group}"))?;

        let mut out = Vec::new();
        for key in reply.keys {
            for entry in key.ids {
                if let Some(payload) = entry.get::<String>("payload") {
                    out.push(StreamEntry {
                        id: entry.id.clone(),
                        payload,
                    });
                }
            }
        }
        Ok(out)
    }

    pub async fn ack(&self, stream: &str, group: &str, ids: &[String]) -> Result<()> {
        if ids.is_empty() {
            return Ok(());
        }
        let mut conn = self.connection.clone();
        conn.xack::<_, _, _, ()>(stream, group, ids)
            .await
            .with_context(|| format!("xack {stream}/{group}"))?;
        Ok(())
    }
}
