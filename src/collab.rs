// External collaborator contracts.
//
// The core never talks to the network itself. It defines the two
// collaborator interfaces (passage source, text analyst), the error
// vocabulary they report in, and the retry policy the networking boundary
// must apply to rate-limited calls. Hosts implement the traits (browser
// fetch behind wasm-bindgen-futures, mocks in tests); the session consumes
// only the resulting text.

use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tracing::warn;

/// Failure vocabulary shared by both collaborators. Only rate limiting is
/// retryable; everything else is terminal and surfaced to the user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CollabError {
    #[error("passage not found")]
    NotFound,
    #[error("no API credential configured")]
    AuthMissing,
    #[error("rate limited")]
    RateLimited,
    #[error("service unavailable: {0}")]
    Unavailable(String),
    #[error("service returned no text")]
    Empty,
}

impl CollabError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, CollabError::RateLimited)
    }
}

/// Resolves a human-readable passage reference to its plain-text body.
pub trait PassageSource {
    fn fetch(&self, reference: &str) -> impl Future<Output = Result<String, CollabError>>;
}

/// Generative analysis: takes a prompt, returns a text body to display
/// verbatim.
pub trait TextAnalyst {
    fn analyze(&self, prompt: &str) -> impl Future<Output = Result<String, CollabError>>;
}

/// Bounded exponential backoff applied to rate-limited collaborator calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt; 3 retries = up to 4 requests.
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_retries: 3, base_delay: Duration::from_secs(1) }
    }
}

impl RetryPolicy {
    /// Delay before retry number `attempt` (0-based): base * 2^attempt.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay * 2u32.saturating_pow(attempt)
    }
}

/// Drive `op` under `policy`, sleeping between rate-limited attempts via
/// the host-supplied `sleep` (a timer future in the browser, a no-op
/// recorder in tests). Non-retryable errors return immediately.
pub async fn run_with_retry<T, Op, OpFut, Sleep, SleepFut>(
    policy: &RetryPolicy,
    mut sleep: Sleep,
    mut op: Op,
) -> Result<T, CollabError>
where
    Op: FnMut(u32) -> OpFut,
    OpFut: Future<Output = Result<T, CollabError>>,
    Sleep: FnMut(Duration) -> SleepFut,
    SleepFut: Future<Output = ()>,
{
    let mut attempt = 0;
    loop {
        match op(attempt).await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_retryable() && attempt < policy.max_retries => {
                warn!(attempt, "collaborator rate limited, backing off");
                sleep(policy.delay_for(attempt)).await;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}

/// Analysis calls are the rate-limited path: drive the analyst under the
/// policy. Passage lookups are not retried; call `PassageSource::fetch`
/// directly and surface whatever it returns.
pub async fn analyze_with_retry<A, Sleep, SleepFut>(
    analyst: &A,
    prompt: &str,
    policy: &RetryPolicy,
    sleep: Sleep,
) -> Result<String, CollabError>
where
    A: TextAnalyst,
    Sleep: FnMut(Duration) -> SleepFut,
    SleepFut: Future<Output = ()>,
{
    run_with_retry(policy, sleep, |_| analyst.analyze(prompt)).await
}
