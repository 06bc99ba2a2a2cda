//! Blanket per-IP rate limiting.
//!
//! A process-wide fixed-window counter keyed by client address: up to
//! `MAX_REQUESTS` per `WINDOW`, then 429 until the window rolls over. State is
//! in-memory only and resets on restart.

use crate::{error::ApiError, AppState};
use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::warn;

/// Window length.
pub const WINDOW: Duration = Duration::from_secs(15 * 60);
/// Requests allowed per client address per window.
pub const MAX_REQUESTS: u32 = 100;

#[derive(Debug)]
struct Window {
    started: Instant,
    count: u32,
}

/// Fixed-window counter shared across all requests.
#[derive(Debug)]
pub struct RateLimiter {
    window: Duration,
    max_requests: u32,
    windows: Mutex<HashMap<IpAddr, Window>>,
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::with_limits(WINDOW, MAX_REQUESTS)
    }
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Custom limits, for tests.
    pub fn with_limits(window: Duration, max_requests: u32) -> Self {
        Self {
            window,
            max_requests,
            windows: Mutex::new(HashMap::new()),
        }
    }

    /// Counts one request from `ip`; `false` means the cap is exhausted for
    /// the current window.
    pub fn try_acquire(&self, ip: IpAddr) -> bool {
        let now = Instant::now();
        let mut windows = self.windows.lock().unwrap_or_else(|e| e.into_inner());

        // Expired windows are dropped wholesale so the map only ever holds
        // addresses seen within the current window.
        windows.retain(|_, w| now.duration_since(w.started) < self.window);

        let window = windows.entry(ip).or_insert(Window {
            started: now,
            count: 0,
        });
        if window.count >= self.max_requests {
            return false;
        }
        window.count += 1;
        true
    }

    #[cfg(test)]
    fn tracked_clients(&self) -> usize {
        self.windows.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

/// Axum middleware applying the limiter to every route.
///
/// The client address comes from `ConnectInfo` when the router is served with
/// connect info; unit tests drive the router without a socket, in which case
/// the loopback address is counted.
pub async fn rate_limit(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let ip = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::LOCALHOST));

    if state.limiter.try_acquire(ip) {
        next.run(request).await
    } else {
        warn!(%ip, "rate limit exceeded");
        ApiError::RateLimited.into_response()
    }
}
