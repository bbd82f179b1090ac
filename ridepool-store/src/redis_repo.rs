use chrono::Utc;
use redis::RedisResult;
use tracing::debug;

/// Redis-backed fixed-window request counter.
#[derive(Clone)]
pub struct RedisClient {
    client: redis::Client,
}

impl RedisClient {
    /// Parses the URL only; the first command opens the connection.
    pub fn new(connection_string: &str) -> Result<Self, redis::RedisError> {
        let client = redis::Client::open(connection_string)?;
        Ok(Self { client })
    }

    /// Counter key for `client_ip` in the window containing `now` (unix seconds).
    /// Each window gets its own key, so a count never carries over into the next one.
    pub fn rate_limit_key(client_ip: &str, now: i64, window_seconds: i64) -> String {
        let window = window_seconds.max(1);
        format!("ratelimit:{}:{}", client_ip, now.div_euclid(window))
    }

    /// Count one request from `client_ip`; true while the current window's count is within `limit`.
    pub async fn check_rate_limit(&self, client_ip: &str, limit: i64, window_seconds: i64) -> RedisResult<bool> {
        let key = Self::rate_limit_key(client_ip, Utc::now().timestamp(), window_seconds);
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        // The expiry only cleans up finished windows.
        let (count,): (i64,) = redis::pipe()
            .atomic()
            .incr(key.as_str(), 1)
            .expire(key.as_str(), window_seconds.max(1))
            .ignore()
            .query_async(&mut conn)
            .await?;

        if count > limit {
            debug!("Rate limit exceeded for {} ({} > {})", key, count, limit);
        }
        Ok(count <= limit)
    }
}
