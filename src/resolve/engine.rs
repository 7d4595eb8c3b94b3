//! Resolution engine
//!
//! Serves the two collaborator operations:
//! - `resolve_address_to_position`: explicit "look up this address" action,
//!   gated by length, suppression, trigger gate and rate limiter
//! - `resolve_position_to_address`: a map click, never rate limited
//!
//! Forward and reverse lookups may be in flight at the same time. Within a
//! kind, each request takes a generation number; when `drop_superseded` is
//! set, a result whose generation is no longer the latest of its kind is
//! discarded instead of applied.
//!
//! The state lock is never held across a provider call.

use crate::coord::{Position, ReferencePoint};
use crate::geo::GeoProvider;
use crate::resolve::guard::{AddressObservation, LoopGuard};
use crate::resolve::listener::{PositionUpdate, ResolutionListener, Tee};
use crate::resolve::lookup::{
    FailureCategory, LookupClient, LookupFailure, LookupKind, LookupPolicy, LookupRequest,
};
use crate::resolve::rate_limit::RateLimiter;
use crate::resolve::trigger::TriggerGate;
use chrono::Utc;
use serde::Serialize;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, info};

/// Notice shown when the address is too short to look up
pub const SHORT_ADDRESS_NOTICE: &str =
    "Enter a more complete address (street, district and city) before searching.";

/// Notice shown when a map click could not be turned into an address
pub const POSITION_KEPT_NOTICE: &str =
    "The location was saved, but its address could not be looked up.";

/// Why a forward request never reached the provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Rejection {
    /// Trimmed address is not longer than the minimum length
    TooShort,
    /// The address change is an echo of a reverse-lookup write
    Suppressed,
    /// The trigger value was already processed or is older
    StaleTrigger,
}

/// Result of `resolve_address_to_position`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum ForwardOutcome {
    Resolved(PositionUpdate),
    Rejected(Rejection),
    Failed(LookupFailure),
    Superseded,
}

/// Result of `resolve_position_to_address`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum ReverseOutcome {
    /// Position and address applied
    Resolved(PositionUpdate),
    /// Position applied, address lookup failed
    PositionOnly {
        update: PositionUpdate,
        failure: LookupFailure,
    },
    Superseded,
}

/// Which lookups are currently running
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EnginePhase {
    Idle,
    ForwardInFlight,
    ReverseInFlight,
    BothInFlight,
}

/// Point-in-time view of the engine
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EngineSnapshot {
    pub position: Option<Position>,
    pub address: String,
    pub distance_km: Option<f64>,
    pub phase: EnginePhase,
    pub suppressed: bool,
}

/// Generation bookkeeping for one lookup kind
#[derive(Debug, Default)]
struct Lane {
    latest: u64,
    in_flight: u32,
}

impl Lane {
    fn begin(&mut self) -> u64 {
        self.latest += 1;
        self.in_flight += 1;
        self.latest
    }

    /// Returns whether `generation` is still the newest request
    fn finish(&mut self, generation: u64) -> bool {
        self.in_flight = self.in_flight.saturating_sub(1);
        generation == self.latest
    }
}

struct EngineState {
    guard: LoopGuard,
    rate_limiter: RateLimiter,
    trigger_gate: TriggerGate,
    forward: Lane,
    reverse: Lane,
}

impl EngineState {
    fn phase(&self) -> EnginePhase {
        match (self.forward.in_flight > 0, self.reverse.in_flight > 0) {
            (false, false) => EnginePhase::Idle,
            (true, false) => EnginePhase::ForwardInFlight,
            (false, true) => EnginePhase::ReverseInFlight,
            (true, true) => EnginePhase::BothInFlight,
        }
    }
}

/// Epoch-millisecond clock that follows tokio's (pausable) clock
struct Clock {
    origin: Instant,
    origin_epoch_ms: i64,
}

impl Clock {
    fn new() -> Self {
        Self {
            origin: Instant::now(),
            origin_epoch_ms: Utc::now().timestamp_millis(),
        }
    }

    fn now_ms(&self) -> i64 {
        let elapsed = i64::try_from(self.origin.elapsed().as_millis()).unwrap_or(i64::MAX);
        self.origin_epoch_ms.saturating_add(elapsed)
    }
}

/// Address/coordinate resolution engine for one location picker
pub struct ResolutionEngine<P, L> {
    client: LookupClient<P>,
    listener: L,
    reference: ReferencePoint,
    state: Mutex<EngineState>,
    clock: Clock,
}

impl<P: GeoProvider, L: ResolutionListener> ResolutionEngine<P, L> {
    pub fn new(provider: P, listener: L, policy: LookupPolicy, reference: ReferencePoint) -> Self {
        let state = EngineState {
            guard: LoopGuard::new(policy.suppression_window),
            rate_limiter: RateLimiter::new(policy.min_interval),
            trigger_gate: TriggerGate::new(),
            forward: Lane::default(),
            reverse: Lane::default(),
        };

        Self {
            client: LookupClient::new(provider, policy),
            listener,
            reference,
            state: Mutex::new(state),
            clock: Clock::new(),
        }
    }

    /// Seed with a stored position and address
    ///
    /// Publishes the initial position and its distance when one is given.
    pub fn with_initial(mut self, position: Option<Position>, address: impl Into<String>) -> Self {
        self.state.get_mut().guard.seed(position, address);

        if let Some(position) = position {
            let update = self.update(position, None);
            self.listener.on_position_change(&update);
        }
        self
    }

    pub fn listener(&self) -> &L {
        &self.listener
    }

    pub fn reference(&self) -> &ReferencePoint {
        &self.reference
    }

    pub fn policy(&self) -> &LookupPolicy {
        self.client.policy()
    }

    fn update(&self, position: Position, address: Option<String>) -> PositionUpdate {
        PositionUpdate {
            position,
            address,
            distance_km: self.reference.distance_km(position),
        }
    }

    /// Current position, address, distance and in-flight state
    pub async fn snapshot(&self) -> EngineSnapshot {
        let mut state = self.state.lock().await;
        let suppressed = state.guard.is_suppressed(Instant::now());
        let position = state.guard.position();

        EngineSnapshot {
            position,
            address: state.guard.address().to_string(),
            distance_km: position.map(|p| self.reference.distance_km(p)),
            phase: state.phase(),
            suppressed,
        }
    }

    /// Handle a change of the collaborator's address field
    pub async fn observe_address_change(&self, address: &str) -> AddressObservation {
        let observation = self
            .state
            .lock()
            .await
            .guard
            .observe_address_change(address, Instant::now());

        if observation == AddressObservation::Suppressed {
            debug!("Ignoring address change during suppression window");
        }
        observation
    }

    /// Resolve an address to a position
    ///
    /// The user's address text is never overwritten by a forward result.
    pub async fn resolve_address_to_position(&self, address: &str, trigger: u64) -> ForwardOutcome {
        self.forward(address, trigger, &self.listener).await
    }

    /// [`Self::resolve_address_to_position`], also reporting to `observer`
    ///
    /// `observer` receives only the notifications of this request, even
    /// while other requests on the same engine overlap it.
    pub async fn resolve_address_to_position_with<O>(
        &self,
        address: &str,
        trigger: u64,
        observer: &O,
    ) -> ForwardOutcome
    where
        O: ResolutionListener + ?Sized,
    {
        self.forward(address, trigger, &Tee::new(&self.listener, observer))
            .await
    }

    /// Resolve a clicked position to an address
    ///
    /// The position is authoritative: it is applied even when the address
    /// lookup fails, in which case only a notice is raised.
    pub async fn resolve_position_to_address(&self, position: Position) -> ReverseOutcome {
        self.reverse(position, &self.listener).await
    }

    /// [`Self::resolve_position_to_address`], also reporting to `observer`
    pub async fn resolve_position_to_address_with<O>(
        &self,
        position: Position,
        observer: &O,
    ) -> ReverseOutcome
    where
        O: ResolutionListener + ?Sized,
    {
        self.reverse(position, &Tee::new(&self.listener, observer))
            .await
    }

    async fn forward<S>(&self, address: &str, trigger: u64, sink: &S) -> ForwardOutcome
    where
        S: ResolutionListener + ?Sized,
    {
        let query = address.trim();
        let policy = self.client.policy();

        if query.chars().count() <= policy.min_address_len {
            debug!("Rejecting short address ({} chars)", query.chars().count());
            sink.on_notice(SHORT_ADDRESS_NOTICE);
            return ForwardOutcome::Rejected(Rejection::TooShort);
        }

        let generation = {
            let mut state = self.state.lock().await;

            if state.guard.is_suppressed(Instant::now()) {
                debug!("Skipping forward lookup during suppression window");
                return ForwardOutcome::Rejected(Rejection::Suppressed);
            }

            if !state.trigger_gate.should_process(trigger) {
                debug!("Ignoring already processed trigger {}", trigger);
                return ForwardOutcome::Rejected(Rejection::StaleTrigger);
            }

            let now_ms = self.clock.now_ms();
            if !state.rate_limiter.try_acquire(now_ms) {
                let wait = state.rate_limiter.remaining(now_ms);
                drop(state);

                info!("Forward lookup refused by local rate limiter ({:?} left)", wait);
                let failure = LookupFailure::new(
                    FailureCategory::ClientRateLimited,
                    format!("next lookup allowed in {:?}", wait),
                    0,
                );
                sink.on_error(&failure);
                return ForwardOutcome::Failed(failure);
            }

            state.forward.begin()
        };

        info!("Forward lookup #{} for {:?}", generation, query);
        let result = self.client.lookup(LookupRequest::forward(query)).await;

        let mut state = self.state.lock().await;
        if !state.forward.finish(generation) && policy.drop_superseded {
            debug!("Dropping superseded forward result #{}", generation);
            return ForwardOutcome::Superseded;
        }

        let failure = match result {
            Ok(resolved) => match resolved.position {
                Some(position) => {
                    state.guard.apply_address_derived_position(position);
                    drop(state);

                    let update = self.update(position, None);
                    info!("Resolved address to {} ({} km)", position, update.distance_km);
                    sink.on_position_change(&update);
                    return ForwardOutcome::Resolved(update);
                }
                None => LookupFailure::new(
                    FailureCategory::Unknown,
                    format!("{} result without a position", LookupKind::Forward),
                    resolved.attempts,
                ),
            },
            Err(failure) => failure,
        };
        drop(state);

        sink.on_error(&failure);
        ForwardOutcome::Failed(failure)
    }

    async fn reverse<S>(&self, position: Position, sink: &S) -> ReverseOutcome
    where
        S: ResolutionListener + ?Sized,
    {
        let generation = self.state.lock().await.reverse.begin();

        info!("Reverse lookup #{} for {}", generation, position);
        let result = self.client.lookup(LookupRequest::reverse(position)).await;

        let mut state = self.state.lock().await;
        if !state.reverse.finish(generation) && self.client.policy().drop_superseded {
            debug!("Dropping superseded reverse result #{}", generation);
            return ReverseOutcome::Superseded;
        }

        match result.and_then(|resolved| {
            resolved.address.ok_or_else(|| {
                LookupFailure::new(
                    FailureCategory::Unknown,
                    format!("{} result without an address", LookupKind::Reverse),
                    resolved.attempts,
                )
            })
        }) {
            Ok(address) => {
                state
                    .guard
                    .apply_coordinate_derived_address(position, address.clone(), Instant::now());
                drop(state);

                let update = self.update(position, Some(address.clone()));
                sink.on_position_change(&update);
                sink.on_address_change(&address);
                ReverseOutcome::Resolved(update)
            }
            Err(failure) => {
                state.guard.commit_position(position);
                drop(state);

                let update = self.update(position, None);
                sink.on_position_change(&update);
                sink.on_notice(POSITION_KEPT_NOTICE);
                ReverseOutcome::PositionOnly { update, failure }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::address::AddressDetails;
    use crate::geo::ProviderError;
    use crate::resolve::listener::{EventLog, ResolutionEvent};
    use crate::resolve::testing::{hit, place, Reply, ScriptedProvider};
    use std::sync::Arc;
    use std::time::Duration;

    const TAMBUN: &str = "Jl. Raya Tambun, Tambun Selatan, Bekasi, West Java";

    fn engine(
        provider: &ScriptedProvider,
        policy: LookupPolicy,
    ) -> (ResolutionEngine<ScriptedProvider, Arc<EventLog>>, Arc<EventLog>) {
        let log = Arc::new(EventLog::new());
        let engine = ResolutionEngine::new(
            provider.clone(),
            Arc::clone(&log),
            policy,
            ReferencePoint::default(),
        );
        (engine, log)
    }

    fn events(log: &EventLog) -> Vec<ResolutionEvent> {
        log.drain().into_iter().map(|e| e.event).collect()
    }

    fn depok_place() -> crate::geo::ReversePlace {
        place(
            "Jl. Test, Beji, Depok, Jawa Barat, Indonesia",
            Some(AddressDetails {
                road: Some("Jl. Test".to_string()),
                city: Some("Depok".to_string()),
                ..Default::default()
            }),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_forward_resolution_reports_position_and_distance() {
        let provider = ScriptedProvider::new();
        provider.push_search(Reply::Ready(Ok(vec![hit("-6.2383", "107.0215")])));
        let (engine, log) = engine(&provider, LookupPolicy::default());

        engine.observe_address_change(TAMBUN).await;
        let outcome = engine.resolve_address_to_position(TAMBUN, 1).await;

        let ForwardOutcome::Resolved(update) = outcome else {
            panic!("expected resolution, got {:?}", outcome);
        };
        assert_eq!(update.position, Position::new(-6.2383, 107.0215));
        assert!(update.distance_km > 20.0 && update.distance_km < 35.0);

        let snapshot = engine.snapshot().await;
        assert_eq!(snapshot.position, Some(Position::new(-6.2383, 107.0215)));
        assert_eq!(snapshot.address, TAMBUN);
        assert_eq!(snapshot.phase, EnginePhase::Idle);

        let events = events(&log);
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], ResolutionEvent::PositionChanged { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_short_address_rejected_without_network() {
        let provider = ScriptedProvider::new();
        let (engine, log) = engine(&provider, LookupPolicy::default());

        let outcome = engine.resolve_address_to_position("Bekasi", 1).await;

        assert_eq!(outcome, ForwardOutcome::Rejected(Rejection::TooShort));
        assert_eq!(provider.search_calls(), 0);
        assert_eq!(
            events(&log),
            vec![ResolutionEvent::Notice {
                message: SHORT_ADDRESS_NOTICE.to_string()
            }]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_exactly_minimum_length_rejected() {
        let provider = ScriptedProvider::new();
        let (engine, _log) = engine(&provider, LookupPolicy::default());

        let outcome = engine.resolve_address_to_position("  Jl. Depok  ", 1).await;

        assert_eq!(outcome, ForwardOutcome::Rejected(Rejection::TooShort));
        assert_eq!(provider.search_calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_repeated_trigger_processed_once() {
        let provider = ScriptedProvider::new();
        provider.push_search(Reply::Ready(Ok(vec![hit("-6.2383", "107.0215")])));
        let (engine, _log) = engine(&provider, LookupPolicy::default());

        engine.resolve_address_to_position(TAMBUN, 5).await;
        tokio::time::advance(Duration::from_secs(5)).await;

        assert_eq!(
            engine.resolve_address_to_position(TAMBUN, 5).await,
            ForwardOutcome::Rejected(Rejection::StaleTrigger)
        );
        assert_eq!(
            engine.resolve_address_to_position(TAMBUN, 4).await,
            ForwardOutcome::Rejected(Rejection::StaleTrigger)
        );
        assert_eq!(provider.search_calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_local_rate_limit() {
        let provider = ScriptedProvider::new();
        provider.push_search(Reply::Ready(Ok(vec![hit("-6.2383", "107.0215")])));
        let (engine, log) = engine(&provider, LookupPolicy::default());

        engine.resolve_address_to_position(TAMBUN, 1).await;
        log.drain();

        tokio::time::advance(Duration::from_millis(1000)).await;
        let ForwardOutcome::Failed(failure) = engine.resolve_address_to_position(TAMBUN, 2).await
        else {
            panic!("expected local rate limit");
        };
        assert_eq!(failure.category, FailureCategory::ClientRateLimited);
        assert_eq!(failure.attempts, 0);
        assert_eq!(provider.search_calls(), 1);
        let rejected = events(&log);
        assert_eq!(rejected.len(), 1);
        assert!(matches!(
            &rejected[0],
            ResolutionEvent::Error {
                category: FailureCategory::ClientRateLimited,
                ..
            }
        ));

        tokio::time::advance(Duration::from_millis(1001)).await;
        assert!(matches!(
            engine.resolve_address_to_position(TAMBUN, 3).await,
            ForwardOutcome::Resolved(_)
        ));
        assert_eq!(provider.search_calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_retries_leave_position_unset() {
        let provider = ScriptedProvider::new();
        provider.push_search(Reply::Ready(Err(ProviderError::Status(429))));
        let (engine, log) = engine(&provider, LookupPolicy::default());

        let start = Instant::now();
        let ForwardOutcome::Failed(failure) = engine.resolve_address_to_position(TAMBUN, 1).await
        else {
            panic!("expected failure");
        };

        assert_eq!(failure.category, FailureCategory::RateLimited);
        assert_eq!(start.elapsed(), Duration::from_secs(6));
        assert_eq!(provider.search_calls(), 3);
        assert_eq!(engine.snapshot().await.position, None);
        let events = events(&log);
        assert_eq!(events.len(), 1);
        assert!(matches!(&events[0], ResolutionEvent::Error { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_reverse_resolution_formats_structured_address() {
        let provider = ScriptedProvider::new();
        provider.push_reverse(Reply::Ready(Ok(depok_place())));
        let (engine, log) = engine(&provider, LookupPolicy::default());

        let outcome = engine
            .resolve_position_to_address(Position::new(-6.2, 106.8))
            .await;

        let ReverseOutcome::Resolved(update) = outcome else {
            panic!("expected resolution");
        };
        assert_eq!(update.address.as_deref(), Some("Jl. Test, Depok"));

        let snapshot = engine.snapshot().await;
        assert_eq!(snapshot.address, "Jl. Test, Depok");
        assert_eq!(snapshot.position, Some(Position::new(-6.2, 106.8)));
        assert!(snapshot.suppressed);

        let events = events(&log);
        assert!(matches!(events[0], ResolutionEvent::PositionChanged { .. }));
        assert_eq!(
            events[1],
            ResolutionEvent::AddressChanged {
                address: "Jl. Test, Depok".to_string()
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_reverse_write_does_not_trigger_forward_lookup() {
        let provider = ScriptedProvider::new();
        provider.push_reverse(Reply::Ready(Ok(place(
            "Jl. Margonda Raya No. 100, Depok, Jawa Barat",
            None,
        ))));
        provider.push_search(Reply::Ready(Ok(vec![hit("-6.36", "106.83")])));
        let (engine, _log) = engine(&provider, LookupPolicy::default());

        engine
            .resolve_position_to_address(Position::new(-6.36, 106.83))
            .await;
        let echoed = engine.snapshot().await.address;

        assert_eq!(
            engine.observe_address_change(&echoed).await,
            AddressObservation::Suppressed
        );
        assert_eq!(
            engine.resolve_address_to_position(&echoed, 1).await,
            ForwardOutcome::Rejected(Rejection::Suppressed)
        );
        assert_eq!(provider.search_calls(), 0);

        tokio::time::advance(Duration::from_millis(100)).await;

        assert_eq!(
            engine.observe_address_change(&echoed).await,
            AddressObservation::Accepted
        );
        assert!(matches!(
            engine.resolve_address_to_position(&echoed, 1).await,
            ForwardOutcome::Resolved(_)
        ));
        assert_eq!(provider.search_calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reverse_failure_keeps_position_with_notice() {
        let provider = ScriptedProvider::new();
        provider.push_reverse(Reply::Ready(Err(ProviderError::Status(500))));
        let (engine, log) = engine(&provider, LookupPolicy::default());
        let engine = engine.with_initial(None, "typed by the user");
        log.drain();

        let outcome = engine
            .resolve_position_to_address(Position::new(-6.3, 106.9))
            .await;

        let ReverseOutcome::PositionOnly { update, failure } = outcome else {
            panic!("expected position-only outcome");
        };
        assert_eq!(failure.category, FailureCategory::ServiceUnavailable);
        assert_eq!(update.address, None);

        let snapshot = engine.snapshot().await;
        assert_eq!(snapshot.position, Some(Position::new(-6.3, 106.9)));
        assert_eq!(snapshot.address, "typed by the user");
        assert!(!snapshot.suppressed);

        let events = events(&log);
        assert_eq!(events.len(), 2);
        assert_eq!(
            events[1],
            ResolutionEvent::Notice {
                message: POSITION_KEPT_NOTICE.to_string()
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_superseded_reverse_result_dropped() {
        let provider = ScriptedProvider::new();
        provider.push_reverse(Reply::Delayed(
            Duration::from_secs(3),
            Ok(place("Old click, Bekasi", None)),
        ));
        provider.push_reverse(Reply::Delayed(
            Duration::from_secs(1),
            Ok(place("New click, Depok", None)),
        ));
        let (engine, _log) = engine(&provider, LookupPolicy::default());

        let (first, second) = tokio::join!(
            engine.resolve_position_to_address(Position::new(-6.24, 107.02)),
            async {
                tokio::time::sleep(Duration::from_millis(10)).await;
                engine
                    .resolve_position_to_address(Position::new(-6.37, 106.82))
                    .await
            }
        );

        assert_eq!(first, ReverseOutcome::Superseded);
        assert!(matches!(second, ReverseOutcome::Resolved(_)));

        let snapshot = engine.snapshot().await;
        assert_eq!(snapshot.position, Some(Position::new(-6.37, 106.82)));
        assert_eq!(snapshot.address, "New click, Depok");
    }

    #[tokio::test(start_paused = true)]
    async fn test_completion_order_applies_when_not_dropping() {
        let provider = ScriptedProvider::new();
        provider.push_reverse(Reply::Delayed(
            Duration::from_secs(3),
            Ok(place("Old click, Bekasi", None)),
        ));
        provider.push_reverse(Reply::Delayed(
            Duration::from_secs(1),
            Ok(place("New click, Depok", None)),
        ));
        let policy = LookupPolicy {
            drop_superseded: false,
            ..Default::default()
        };
        let (engine, _log) = engine(&provider, policy);

        tokio::join!(
            engine.resolve_position_to_address(Position::new(-6.24, 107.02)),
            async {
                tokio::time::sleep(Duration::from_millis(10)).await;
                engine
                    .resolve_position_to_address(Position::new(-6.37, 106.82))
                    .await
            }
        );

        let snapshot = engine.snapshot().await;
        assert_eq!(snapshot.position, Some(Position::new(-6.24, 107.02)));
        assert_eq!(snapshot.address, "Old click, Bekasi");
    }

    #[tokio::test(start_paused = true)]
    async fn test_superseded_forward_result_dropped() {
        let provider = ScriptedProvider::new();
        provider.push_search(Reply::Delayed(
            Duration::from_secs(10),
            Ok(vec![hit("-6.2383", "107.0215")]),
        ));
        provider.push_search(Reply::Delayed(
            Duration::from_secs(1),
            Ok(vec![hit("-6.3600", "106.8300")]),
        ));
        let (engine, log) = engine(&provider, LookupPolicy::default());

        let (first, second) = tokio::join!(
            engine.resolve_address_to_position(TAMBUN, 1),
            async {
                tokio::time::sleep(Duration::from_secs(3)).await;
                engine
                    .resolve_address_to_position("Jl. Margonda Raya, Depok", 2)
                    .await
            }
        );

        assert_eq!(first, ForwardOutcome::Superseded);
        let ForwardOutcome::Resolved(update) = second else {
            panic!("expected resolution, got {:?}", second);
        };
        assert_eq!(update.position, Position::new(-6.36, 106.83));
        assert_eq!(
            engine.snapshot().await.position,
            Some(Position::new(-6.36, 106.83))
        );
        assert_eq!(provider.search_calls(), 2);
        assert_eq!(events(&log).len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_forward_completion_order_applies_when_not_dropping() {
        let provider = ScriptedProvider::new();
        provider.push_search(Reply::Delayed(
            Duration::from_secs(10),
            Ok(vec![hit("-6.2383", "107.0215")]),
        ));
        provider.push_search(Reply::Delayed(
            Duration::from_secs(1),
            Ok(vec![hit("-6.3600", "106.8300")]),
        ));
        let policy = LookupPolicy {
            drop_superseded: false,
            ..Default::default()
        };
        let (engine, log) = engine(&provider, policy);

        let (first, second) = tokio::join!(
            engine.resolve_address_to_position(TAMBUN, 1),
            async {
                tokio::time::sleep(Duration::from_secs(3)).await;
                engine
                    .resolve_address_to_position("Jl. Margonda Raya, Depok", 2)
                    .await
            }
        );

        assert!(matches!(first, ForwardOutcome::Resolved(_)));
        assert!(matches!(second, ForwardOutcome::Resolved(_)));
        assert_eq!(
            engine.snapshot().await.position,
            Some(Position::new(-6.2383, 107.0215))
        );
        assert_eq!(events(&log).len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_observers_receive_only_their_own_request() {
        let provider = ScriptedProvider::new();
        provider.push_search(Reply::Delayed(
            Duration::from_secs(1),
            Ok(vec![hit("-6.2383", "107.0215")]),
        ));
        provider.push_reverse(Reply::Delayed(
            Duration::from_millis(500),
            Ok(depok_place()),
        ));
        let (engine, log) = engine(&provider, LookupPolicy::default());
        let geocode_events = EventLog::new();
        let click_events = EventLog::new();

        let (forward, reverse) = tokio::join!(
            engine.resolve_address_to_position_with(TAMBUN, 1, &geocode_events),
            engine.resolve_position_to_address_with(Position::new(-6.2, 106.8), &click_events),
        );
        assert!(matches!(forward, ForwardOutcome::Resolved(_)));
        assert!(matches!(reverse, ReverseOutcome::Resolved(_)));

        let geocode_events = events(&geocode_events);
        assert_eq!(geocode_events.len(), 1);
        assert!(matches!(
            &geocode_events[0],
            ResolutionEvent::PositionChanged { address: None, .. }
        ));

        let click_events = events(&click_events);
        assert_eq!(click_events.len(), 2);
        assert!(matches!(
            &click_events[0],
            ResolutionEvent::PositionChanged { address: Some(_), .. }
        ));
        assert!(matches!(&click_events[1], ResolutionEvent::AddressChanged { .. }));

        assert_eq!(events(&log).len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_forward_and_reverse_may_overlap() {
        let provider = ScriptedProvider::new();
        provider.push_search(Reply::Delayed(
            Duration::from_secs(2),
            Ok(vec![hit("-6.2383", "107.0215")]),
        ));
        provider.push_reverse(Reply::Delayed(
            Duration::from_secs(2),
            Ok(place("Jl. Test, Depok", None)),
        ));
        let (engine, _log) = engine(&provider, LookupPolicy::default());

        let (forward, reverse, phase) = tokio::join!(
            engine.resolve_address_to_position(TAMBUN, 1),
            engine.resolve_position_to_address(Position::new(-6.2, 106.8)),
            async {
                tokio::time::sleep(Duration::from_secs(1)).await;
                engine.snapshot().await.phase
            }
        );

        assert_eq!(phase, EnginePhase::BothInFlight);
        assert!(matches!(forward, ForwardOutcome::Resolved(_)));
        assert!(matches!(reverse, ReverseOutcome::Resolved(_)));
        assert_eq!(engine.snapshot().await.phase, EnginePhase::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_initial_values_published() {
        let provider = ScriptedProvider::new();
        let (engine, log) = engine(&provider, LookupPolicy::default());
        let campus = ReferencePoint::default().position;

        let engine = engine.with_initial(Some(campus), "Kampus, Depok");

        let snapshot = engine.snapshot().await;
        assert_eq!(snapshot.distance_km, Some(0.0));
        assert_eq!(snapshot.address, "Kampus, Depok");
        let events = events(&log);
        assert_eq!(events.len(), 1);
        assert!(matches!(
            &events[0],
            ResolutionEvent::PositionChanged { distance_km, .. } if *distance_km == 0.0
        ));
    }
}
