//! Injectable pacing (inter-request delay) and identity (user-agent) strategies.
//!
//! Production runs use [`RandomPacer`] and [`RotatingUserAgents`] to stay under
//! registry rate limits; tests plug in [`NoPacing`] and [`FixedUserAgent`].

use std::time::Duration;

use crate::http::BoxFuture;

/// Longest pause a pacer will ever take.
pub const MAX_DELAY: Duration = Duration::from_secs(3600);

/// Waits between network-touching steps.
pub trait Pacer: Send + Sync {
    fn pause(&self) -> BoxFuture<'_, ()>;
}

/// Sleeps a uniformly random duration in `[min, max]`.
#[derive(Debug, Clone)]
pub struct RandomPacer {
    min: Duration,
    max: Duration,
}

impl RandomPacer {
    /// Swaps the bounds if given in the wrong order.
    pub fn new(min: Duration, max: Duration) -> Self {
        if min <= max {
            Self { min, max }
        } else {
            Self { min: max, max: min }
        }
    }

    /// Out-of-range values are clamped to `[0, MAX_DELAY]`.
    pub fn from_secs_f64(min: f64, max: f64) -> Self {
        Self::new(clamped_secs(min), clamped_secs(max))
    }

    pub fn next_delay(&self) -> Duration {
        let span = self.max - self.min;
        self.min + span.mul_f64(fastrand::f64())
    }
}

fn clamped_secs(secs: f64) -> Duration {
    Duration::try_from_secs_f64(secs.max(0.0))
        .unwrap_or(MAX_DELAY)
        .min(MAX_DELAY)
}

impl Default for RandomPacer {
    fn default() -> Self {
        Self::new(Duration::from_secs(1), Duration::from_secs(3))
    }
}

impl Pacer for RandomPacer {
    fn pause(&self) -> BoxFuture<'_, ()> {
        let delay = self.next_delay();
        Box::pin(async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
        })
    }
}

/// Never waits.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPacing;

impl Pacer for NoPacing {
    fn pause(&self) -> BoxFuture<'_, ()> {
        Box::pin(async {})
    }
}

/// Supplies the User-Agent header for each outgoing request.
pub trait UserAgentPool: Send + Sync {
    fn user_agent(&self) -> &str;
}

const DESKTOP_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:121.0) Gecko/20100101 Firefox/121.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
];

/// Picks a random desktop browser identity per request.
#[derive(Debug, Clone)]
pub struct RotatingUserAgents {
    agents: Vec<String>,
}

impl RotatingUserAgents {
    /// Falls back to the built-in desktop agents when `agents` is empty.
    pub fn new(agents: Vec<String>) -> Self {
        if agents.is_empty() {
            Self::default()
        } else {
            Self { agents }
        }
    }
}

impl Default for RotatingUserAgents {
    fn default() -> Self {
        Self {
            agents: DESKTOP_AGENTS.iter().map(|a| a.to_string()).collect(),
        }
    }
}

impl UserAgentPool for RotatingUserAgents {
    fn user_agent(&self) -> &str {
        &self.agents[fastrand::usize(..self.agents.len())]
    }
}

#[derive(Debug, Clone)]
pub struct FixedUserAgent(pub String);

impl Default for FixedUserAgent {
    fn default() -> Self {
        Self(format!("bibverify/{}", env!("CARGO_PKG_VERSION")))
    }
}

impl UserAgentPool for FixedUserAgent {
    fn user_agent(&self) -> &str {
        &self.0
    }
}
