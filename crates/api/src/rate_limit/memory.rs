//! In-process fixed-window counter.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::time::Instant;

use super::{CountingError, CountingService, LimitRequest, LimitResponse};

/// Expired windows are swept once the map grows past this many keys.
const SWEEP_THRESHOLD: usize = 4096;

#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    count: u64,
}

/// Counts requests per key in fixed windows, for single-instance
/// deployments without a shared counting service.
pub struct InMemoryCountingService {
    max_requests: u64,
    window: Duration,
    windows: Mutex<HashMap<String, Window>>,
}

impl InMemoryCountingService {
    pub fn new(max_requests: u64, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            windows: Mutex::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl CountingService for InMemoryCountingService {
    async fn limit(&self, request: &LimitRequest) -> Result<LimitResponse, CountingError> {
        let window = request
            .window
            .map(Duration::from_millis)
            .unwrap_or(self.window);
        let weight = request.weight.unwrap_or(1);
        let now = Instant::now();

        let mut windows = self.windows.lock().await;
        if windows.len() > SWEEP_THRESHOLD {
            windows.retain(|_, w| now.duration_since(w.started) < window);
        }

        let entry = windows.entry(request.key.clone()).or_insert(Window {
            started: now,
            count: 0,
        });
        if now.duration_since(entry.started) >= window {
            *entry = Window {
                started: now,
                count: 0,
            };
        }
        entry.count = entry.count.saturating_add(weight);

        let resets_in = window.saturating_sub(now.duration_since(entry.started));
        let reset = chrono::Utc::now().timestamp_millis() + resets_in.as_millis() as i64;

        Ok(LimitResponse {
            success: entry.count <= self.max_requests,
            remaining: Some(self.max_requests.saturating_sub(entry.count)),
            reset: Some(reset),
            limit: Some(self.max_requests),
        })
    }
}
