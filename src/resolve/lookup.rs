//! Retrying lookup client
//!
//! Wraps a single forward or reverse provider call with a per-attempt
//! timeout, linear backoff and a bounded number of retries, and classifies
//! whatever comes back into a success or a terminal failure category.
//!
//! Attempt `n` (zero based) waits `n * backoff_step` before the call and
//! allows `base_timeout + n * timeout_step` for it. With the defaults that
//! is 0s/2s/4s of backoff and 15s/20s/25s of timeout over three attempts.

use crate::constants::lookup::{
    BACKOFF_STEP_MS, BASE_TIMEOUT_MS, MAX_RETRIES, MIN_ADDRESS_LEN, MIN_INTERVAL_MS,
    SUPPRESSION_MS, TIMEOUT_STEP_MS,
};
use crate::coord::Position;
use crate::geo::address::formatted_address;
use crate::geo::{GeoProvider, ProviderError, ReversePlace, SearchHit};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// Timing and retry policy shared by the lookup client and the engine
#[derive(Debug, Clone, PartialEq)]
pub struct LookupPolicy {
    pub max_retries: u32,
    pub base_timeout: Duration,
    pub timeout_step: Duration,
    pub backoff_step: Duration,
    pub min_interval: Duration,
    pub suppression_window: Duration,
    pub min_address_len: usize,
    pub drop_superseded: bool,
}

impl LookupPolicy {
    /// Timeout allowed for the given attempt
    pub fn timeout_for(&self, attempt: u32) -> Duration {
        self.base_timeout + self.timeout_step * attempt
    }

    /// Delay before the given attempt
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        self.backoff_step * attempt
    }
}

impl Default for LookupPolicy {
    fn default() -> Self {
        Self {
            max_retries: MAX_RETRIES,
            base_timeout: Duration::from_millis(BASE_TIMEOUT_MS),
            timeout_step: Duration::from_millis(TIMEOUT_STEP_MS),
            backoff_step: Duration::from_millis(BACKOFF_STEP_MS),
            min_interval: Duration::from_millis(MIN_INTERVAL_MS),
            suppression_window: Duration::from_millis(SUPPRESSION_MS),
            min_address_len: MIN_ADDRESS_LEN,
            drop_superseded: true,
        }
    }
}

/// Direction of a lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LookupKind {
    /// Address to position
    Forward,
    /// Position to address
    Reverse,
}

impl std::fmt::Display for LookupKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Forward => write!(f, "forward"),
            Self::Reverse => write!(f, "reverse"),
        }
    }
}

/// What is being looked up
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LookupInput {
    Address(String),
    Position(Position),
}

/// A single lookup invocation
#[derive(Debug, Clone, PartialEq)]
pub struct LookupRequest {
    pub input: LookupInput,
    pub attempt: u32,
}

impl LookupRequest {
    pub fn forward(address: impl Into<String>) -> Self {
        Self {
            input: LookupInput::Address(address.into()),
            attempt: 0,
        }
    }

    pub fn reverse(position: Position) -> Self {
        Self {
            input: LookupInput::Position(position),
            attempt: 0,
        }
    }

    pub fn kind(&self) -> LookupKind {
        match self.input {
            LookupInput::Address(_) => LookupKind::Forward,
            LookupInput::Position(_) => LookupKind::Reverse,
        }
    }
}

/// Terminal failure categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureCategory {
    /// The call kept exceeding its timeout (or never connected)
    Timeout,
    /// The provider kept answering 429
    RateLimited,
    /// The provider kept returning no usable result
    NotFound,
    /// The provider answered with another non-2xx status
    ServiceUnavailable,
    /// The local rate limiter refused before any network call
    ClientRateLimited,
    /// The provider's payload could not be understood
    Unknown,
}

impl FailureCategory {
    /// User-facing message for this category
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Timeout => {
                "The lookup timed out after multiple attempts. Try again or pick the location on the map directly."
            }
            Self::RateLimited => "The location service is busy. Wait a moment and retry.",
            Self::NotFound => {
                "Could not find this address. Add more detail or pick the location on the map."
            }
            Self::ServiceUnavailable => "The location service is temporarily unavailable.",
            Self::ClientRateLimited => "Please wait a moment before searching again.",
            Self::Unknown => "The location lookup failed unexpectedly. Pick the location on the map.",
        }
    }

    /// Whether another attempt may succeed
    fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout | Self::RateLimited | Self::NotFound)
    }
}

impl std::fmt::Display for FailureCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Timeout => "timeout",
            Self::RateLimited => "rate_limited",
            Self::NotFound => "not_found",
            Self::ServiceUnavailable => "service_unavailable",
            Self::ClientRateLimited => "client_rate_limited",
            Self::Unknown => "unknown",
        };
        write!(f, "{}", name)
    }
}

/// A classified, terminal lookup failure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, thiserror::Error)]
#[error("{message} ({detail})")]
pub struct LookupFailure {
    pub category: FailureCategory,
    /// User-facing message
    pub message: String,
    /// Technical detail of the last attempt
    pub detail: String,
    /// Attempts made (0 when refused before the network)
    pub attempts: u32,
}

impl LookupFailure {
    pub fn new(category: FailureCategory, detail: impl Into<String>, attempts: u32) -> Self {
        Self {
            category,
            message: category.user_message().to_string(),
            detail: detail.into(),
            attempts,
        }
    }
}

/// A successful lookup
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Resolved {
    /// Set for forward lookups
    pub position: Option<Position>,
    /// Formatted address (reverse) or provider display name (forward)
    pub address: Option<String>,
    /// The provider record the result was taken from
    pub raw: serde_json::Value,
    pub attempts: u32,
}

pub type LookupResult = std::result::Result<Resolved, LookupFailure>;

/// Outcome of one attempt
enum Attempt {
    Success(Resolved),
    Failure(FailureCategory, String),
}

/// Lookup client with timeout, backoff and bounded retries
#[derive(Debug, Clone)]
pub struct LookupClient<P> {
    provider: P,
    policy: LookupPolicy,
}

impl<P: GeoProvider> LookupClient<P> {
    pub fn new(provider: P, policy: LookupPolicy) -> Self {
        Self { provider, policy }
    }

    pub fn policy(&self) -> &LookupPolicy {
        &self.policy
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Run a lookup to a terminal result
    ///
    /// Intermediate attempts are never surfaced; the caller only sees the
    /// final success or the category of the last failure.
    pub async fn lookup(&self, mut request: LookupRequest) -> LookupResult {
        let kind = request.kind();

        loop {
            let attempt = request.attempt;

            if attempt > 0 {
                let delay = self.policy.backoff_for(attempt);
                debug!("{} lookup: backing off {:?} before attempt {}", kind, delay, attempt);
                tokio::time::sleep(delay).await;
            }

            match self.attempt(&request.input, attempt).await {
                Attempt::Success(resolved) => {
                    debug!("{} lookup succeeded on attempt {}", kind, attempt);
                    return Ok(resolved);
                }
                Attempt::Failure(category, detail) => {
                    if category.is_retryable() && attempt < self.policy.max_retries {
                        debug!(
                            "{} lookup attempt {} failed ({}): {}, retrying",
                            kind, attempt, category, detail
                        );
                        request.attempt += 1;
                        continue;
                    }

                    warn!(
                        "{} lookup gave up after {} attempt(s): {} ({})",
                        kind,
                        attempt + 1,
                        category,
                        detail
                    );
                    return Err(LookupFailure::new(category, detail, attempt + 1));
                }
            }
        }
    }

    async fn attempt(&self, input: &LookupInput, attempt: u32) -> Attempt {
        let timeout = self.policy.timeout_for(attempt);

        match input {
            LookupInput::Address(query) => {
                match tokio::time::timeout(timeout, self.provider.search(query)).await {
                    Err(_) => timed_out(timeout),
                    Ok(Err(e)) => classify_provider_error(e),
                    Ok(Ok(hits)) => classify_search(hits, attempt),
                }
            }
            LookupInput::Position(position) => {
                match tokio::time::timeout(timeout, self.provider.reverse(*position)).await {
                    Err(_) => timed_out(timeout),
                    Ok(Err(e)) => classify_provider_error(e),
                    Ok(Ok(place)) => classify_reverse(place, attempt),
                }
            }
        }
    }
}

fn timed_out(timeout: Duration) -> Attempt {
    Attempt::Failure(
        FailureCategory::Timeout,
        format!("no response within {:?}", timeout),
    )
}

fn classify_provider_error(error: ProviderError) -> Attempt {
    let category = match &error {
        ProviderError::Status(429) => FailureCategory::RateLimited,
        ProviderError::Status(_) => FailureCategory::ServiceUnavailable,
        ProviderError::Transport(_) => FailureCategory::Timeout,
        ProviderError::Decode(_) => FailureCategory::Unknown,
    };
    Attempt::Failure(category, error.to_string())
}

fn classify_search(hits: Vec<SearchHit>, attempt: u32) -> Attempt {
    let Some(hit) = hits.into_iter().next() else {
        return Attempt::Failure(FailureCategory::NotFound, "empty search result".to_string());
    };

    match hit.position() {
        Ok(position) => Attempt::Success(Resolved {
            position: Some(position),
            address: hit.display_name.clone(),
            raw: serde_json::to_value(&hit).unwrap_or_default(),
            attempts: attempt + 1,
        }),
        Err(e) => Attempt::Failure(FailureCategory::Unknown, e.to_string()),
    }
}

fn classify_reverse(place: ReversePlace, attempt: u32) -> Attempt {
    let display_name = match place.display_name.as_deref().map(str::trim) {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => {
            return Attempt::Failure(
                FailureCategory::NotFound,
                "reverse result has no display name".to_string(),
            )
        }
    };

    Attempt::Success(Resolved {
        position: None,
        address: Some(formatted_address(place.address.as_ref(), &display_name)),
        raw: serde_json::to_value(&place).unwrap_or_default(),
        attempts: attempt + 1,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::address::AddressDetails;
    use crate::resolve::testing::{hit, place, Reply, ScriptedProvider};
    use tokio::time::Instant;

    fn client(provider: &ScriptedProvider) -> LookupClient<ScriptedProvider> {
        LookupClient::new(provider.clone(), LookupPolicy::default())
    }

    #[test]
    fn test_policy_schedule() {
        let policy = LookupPolicy::default();
        assert_eq!(policy.timeout_for(0), Duration::from_secs(15));
        assert_eq!(policy.timeout_for(1), Duration::from_secs(20));
        assert_eq!(policy.timeout_for(2), Duration::from_secs(25));
        assert_eq!(policy.backoff_for(0), Duration::ZERO);
        assert_eq!(policy.backoff_for(1), Duration::from_secs(2));
        assert_eq!(policy.backoff_for(2), Duration::from_secs(4));
    }

    #[test]
    fn test_request_kind() {
        assert_eq!(LookupRequest::forward("x").kind(), LookupKind::Forward);
        assert_eq!(
            LookupRequest::reverse(Position::new(0.0, 0.0)).kind(),
            LookupKind::Reverse
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_forward_success_first_attempt() {
        let provider = ScriptedProvider::new();
        provider.push_search(Reply::Ready(Ok(vec![hit("-6.2383", "107.0215")])));

        let resolved = client(&provider)
            .lookup(LookupRequest::forward("Jl. Raya Tambun, Bekasi"))
            .await
            .unwrap();

        assert_eq!(resolved.position, Some(Position::new(-6.2383, 107.0215)));
        assert_eq!(resolved.attempts, 1);
        assert_eq!(provider.search_calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retryable_failure_attempted_three_times() {
        let provider = ScriptedProvider::new();
        provider.push_search(Reply::Ready(Err(ProviderError::Status(429))));

        let start = Instant::now();
        let failure = client(&provider)
            .lookup(LookupRequest::forward("Jl. Raya Tambun, Bekasi"))
            .await
            .unwrap_err();

        assert_eq!(failure.category, FailureCategory::RateLimited);
        assert_eq!(failure.attempts, 3);
        assert_eq!(provider.search_calls(), 3);
        assert_eq!(start.elapsed(), Duration::from_millis(6000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_recovers_after_transient_failure() {
        let provider = ScriptedProvider::new();
        provider.push_search(Reply::Ready(Ok(vec![])));
        provider.push_search(Reply::Ready(Ok(vec![hit("-6.3", "106.8")])));

        let start = Instant::now();
        let resolved = client(&provider)
            .lookup(LookupRequest::forward("Jl. Margonda Raya, Depok"))
            .await
            .unwrap();

        assert_eq!(resolved.attempts, 2);
        assert_eq!(start.elapsed(), Duration::from_millis(2000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_results_exhaust_to_not_found() {
        let provider = ScriptedProvider::new();
        provider.push_search(Reply::Ready(Ok(vec![])));

        let failure = client(&provider)
            .lookup(LookupRequest::forward("Nowhere in particular"))
            .await
            .unwrap_err();

        assert_eq!(failure.category, FailureCategory::NotFound);
        assert_eq!(provider.search_calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_server_error_not_retried() {
        let provider = ScriptedProvider::new();
        provider.push_search(Reply::Ready(Err(ProviderError::Status(503))));

        let failure = client(&provider)
            .lookup(LookupRequest::forward("Jl. Raya Tambun, Bekasi"))
            .await
            .unwrap_err();

        assert_eq!(failure.category, FailureCategory::ServiceUnavailable);
        assert_eq!(failure.attempts, 1);
        assert_eq!(provider.search_calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_hanging_call_times_out_with_growing_timeouts() {
        let provider = ScriptedProvider::new();
        provider.push_reverse(Reply::Hang);

        let start = Instant::now();
        let failure = client(&provider)
            .lookup(LookupRequest::reverse(Position::new(-6.2, 106.8)))
            .await
            .unwrap_err();

        assert_eq!(failure.category, FailureCategory::Timeout);
        assert_eq!(provider.reverse_calls(), 3);
        // 15s + 20s + 25s of timeouts and 2s + 4s of backoff
        assert_eq!(start.elapsed(), Duration::from_secs(66));
    }

    #[tokio::test(start_paused = true)]
    async fn test_transport_error_is_retried_as_timeout() {
        let provider = ScriptedProvider::new();
        provider.push_reverse(Reply::Ready(Err(ProviderError::Transport(
            "connection reset".to_string(),
        ))));

        let failure = client(&provider)
            .lookup(LookupRequest::reverse(Position::new(-6.2, 106.8)))
            .await
            .unwrap_err();

        assert_eq!(failure.category, FailureCategory::Timeout);
        assert_eq!(failure.attempts, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_malformed_coordinates_are_terminal() {
        let provider = ScriptedProvider::new();
        provider.push_search(Reply::Ready(Ok(vec![hit("abc", "107.0")])));

        let failure = client(&provider)
            .lookup(LookupRequest::forward("Jl. Raya Tambun, Bekasi"))
            .await
            .unwrap_err();

        assert_eq!(failure.category, FailureCategory::Unknown);
        assert_eq!(provider.search_calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reverse_prefers_structured_fields() {
        let provider = ScriptedProvider::new();
        let details = AddressDetails {
            road: Some("Jl. Test".to_string()),
            city: Some("Depok".to_string()),
            ..Default::default()
        };
        provider.push_reverse(Reply::Ready(Ok(place(
            "Jl. Test, Beji, Depok, Jawa Barat, Indonesia",
            Some(details),
        ))));

        let resolved = client(&provider)
            .lookup(LookupRequest::reverse(Position::new(-6.2, 106.8)))
            .await
            .unwrap();

        assert_eq!(resolved.address.as_deref(), Some("Jl. Test, Depok"));
        assert!(resolved.position.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_reverse_without_display_name_is_not_found() {
        let provider = ScriptedProvider::new();
        provider.push_reverse(Reply::Ready(Ok(ReversePlace::default())));

        let failure = client(&provider)
            .lookup(LookupRequest::reverse(Position::new(0.0, 0.0)))
            .await
            .unwrap_err();

        assert_eq!(failure.category, FailureCategory::NotFound);
        assert_eq!(provider.reverse_calls(), 3);
    }

    #[test]
    fn test_failure_messages() {
        let failure = LookupFailure::new(FailureCategory::NotFound, "empty", 3);
        assert!(failure.message.contains("Could not find this address"));
        assert_eq!(failure.category.to_string(), "not_found");
        assert!(FailureCategory::ClientRateLimited
            .user_message()
            .contains("wait"));
    }
}
