//! Fixed-window rate limiting keyed by client IP
//!
//! Counters live in process memory, so limits apply per instance. The map is
//! bounded; expired windows are dropped on access and by [`RateLimiter::spawn_sweeper`].

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use axum::{
    extract::{Request, State},
    http::{HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};
use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::error::ApiError;

/// Upper bound on tracked clients per limiter
pub const MAX_TRACKED_KEYS: usize = 10_000;

#[derive(Debug, Clone, Copy)]
struct Window {
    count: u32,
    started: Instant,
    reset_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Decision {
    Allowed { remaining: u32 },
    Limited { reset_at: DateTime<Utc> },
}

pub struct RateLimiter {
    name: &'static str,
    limit: u32,
    window: Duration,
    entries: Mutex<HashMap<String, Window>>,
}

impl RateLimiter {
    pub fn new(name: &'static str, limit: u32, window: Duration) -> Self {
        Self {
            name,
            limit,
            window,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// `limit` requests per minute
    pub fn per_minute(name: &'static str, limit: u32) -> Self {
        Self::new(name, limit, Duration::from_secs(60))
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Count a request from `key`
    pub fn check(&self, key: &str) -> Decision {
        self.check_at(key, Instant::now())
    }

    fn check_at(&self, key: &str, now: Instant) -> Decision {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());

        let expired = entries
            .get(key)
            .map(|w| now.duration_since(w.started) >= self.window)
            .unwrap_or(true);

        if expired {
            if !entries.contains_key(key) && entries.len() >= MAX_TRACKED_KEYS {
                self.purge(&mut entries, now);
                if entries.len() >= MAX_TRACKED_KEYS {
                    Self::evict_oldest(&mut entries);
                }
            }

            let reset_at = Utc::now()
                + chrono::Duration::from_std(self.window).unwrap_or(chrono::Duration::zero());
            entries.insert(
                key.to_string(),
                Window {
                    count: 1,
                    started: now,
                    reset_at,
                },
            );
            return Decision::Allowed {
                remaining: self.limit.saturating_sub(1),
            };
        }

        match entries.get_mut(key) {
            Some(window) if window.count < self.limit => {
                window.count += 1;
                Decision::Allowed {
                    remaining: self.limit - window.count,
                }
            }
            Some(window) => Decision::Limited {
                reset_at: window.reset_at,
            },
            None => Decision::Allowed {
                remaining: self.limit.saturating_sub(1),
            },
        }
    }

    fn purge(&self, entries: &mut HashMap<String, Window>, now: Instant) -> usize {
        let before = entries.len();
        entries.retain(|_, w| now.duration_since(w.started) < self.window);
        before - entries.len()
    }

    fn evict_oldest(entries: &mut HashMap<String, Window>) {
        if let Some(oldest) = entries
            .iter()
            .min_by_key(|(_, w)| w.started)
            .map(|(k, _)| k.clone())
        {
            entries.remove(&oldest);
        }
    }

    /// Drop expired windows; returns how many were removed
    pub fn sweep(&self) -> usize {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        self.purge(&mut entries, Instant::now())
    }

    pub fn tracked_keys(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Background task sweeping expired windows every `every`
    pub fn spawn_sweeper(self: Arc<Self>, every: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            loop {
                ticker.tick().await;
                let removed = self.sweep();
                if removed > 0 {
                    debug!("Rate limiter '{}' swept {} expired window(s)", self.name, removed);
                }
            }
        })
    }
}

/// First `x-forwarded-for` entry, else `unknown`
pub fn client_ip(headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|h| h.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .unwrap_or("unknown")
        .to_string()
}

/// Route layer: `429` once a client exceeds the limiter's window
pub async fn rate_limit(
    State(limiter): State<Arc<RateLimiter>>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let ip = client_ip(request.headers());

    match limiter.check(&ip) {
        Decision::Allowed { remaining } => {
            let mut response = next.run(request).await;
            let headers = response.headers_mut();
            headers.insert("x-ratelimit-limit", HeaderValue::from(limiter.limit()));
            headers.insert("x-ratelimit-remaining", HeaderValue::from(remaining));
            Ok(response)
        }
        Decision::Limited { reset_at } => {
            warn!("Rate limit '{}' exceeded for {}", limiter.name, ip);
            Err(ApiError::RateLimited { reset_at })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::StatusCode, middleware, routing::post, Router};
    use tower::ServiceExt;

    #[test]
    fn test_fixed_window() {
        let limiter = RateLimiter::per_minute("test", 3);
        let start = Instant::now();

        for expected in [2, 1, 0] {
            assert_eq!(
                limiter.check_at("1.2.3.4", start),
                Decision::Allowed {
                    remaining: expected
                }
            );
        }
        assert!(matches!(
            limiter.check_at("1.2.3.4", start + Duration::from_secs(30)),
            Decision::Limited { .. }
        ));

        // Other clients have their own window
        assert!(matches!(
            limiter.check_at("5.6.7.8", start),
            Decision::Allowed { .. }
        ));

        // A new window starts after expiry
        assert_eq!(
            limiter.check_at("1.2.3.4", start + Duration::from_secs(61)),
            Decision::Allowed { remaining: 2 }
        );
    }

    #[test]
    fn test_tracked_keys_are_bounded() {
        let limiter = RateLimiter::per_minute("bounded", 1);
        let now = Instant::now();
        for i in 0..(MAX_TRACKED_KEYS + 50) {
            limiter.check_at(&format!("10.0.{}.{}", i / 256, i % 256), now);
        }
        assert_eq!(limiter.tracked_keys(), MAX_TRACKED_KEYS);
    }

    #[test]
    fn test_sweep_drops_expired() {
        let limiter = RateLimiter::new("sweep", 5, Duration::ZERO);
        limiter.check("a");
        limiter.check("b");
        assert_eq!(limiter.sweep(), 2);
        assert_eq!(limiter.tracked_keys(), 0);
    }

    #[test]
    fn test_client_ip() {
        let mut headers = HeaderMap::new();
        assert_eq!(client_ip(&headers), "unknown");

        headers.insert("x-forwarded-for", "203.0.113.7, 10.0.0.1".parse().unwrap());
        assert_eq!(client_ip(&headers), "203.0.113.7");
    }

    #[tokio::test]
    async fn test_rate_limit_layer() {
        let limiter = Arc::new(RateLimiter::per_minute("contact", 2));
        let app = Router::new().route(
            "/contact",
            post(|| async { "ok" }).layer(middleware::from_fn_with_state(limiter, rate_limit)),
        );

        let request = || {
            axum::http::Request::builder()
                .method("POST")
                .uri("/contact")
                .header("x-forwarded-for", "198.51.100.1")
                .body(Body::empty())
                .unwrap()
        };

        let first = app.clone().oneshot(request()).await.unwrap();
        assert_eq!(first.status(), StatusCode::OK);
        assert_eq!(first.headers()["x-ratelimit-remaining"], "1");

        app.clone().oneshot(request()).await.unwrap();

        let third = app.oneshot(request()).await.unwrap();
        assert_eq!(third.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(third.headers()["x-ratelimit-remaining"], "0");
        assert!(third.headers().contains_key("x-ratelimit-reset"));
    }
}
