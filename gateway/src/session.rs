use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use quote::{QuoteFeed, QuoteFeedConfig};
use tracing::{info, warn};

use crate::api::{Credentials, MdApi};
use crate::error::GatewayError;
use crate::gate::ShutdownGate;
use crate::handler::QuoteHandler;
use crate::instruments::InstrumentSet;
use crate::state::{SessionError, SessionState, SubscriptionStatus};

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub credentials: Credentials,
    pub front: String,
    pub instruments: Vec<String>,
    pub feed: QuoteFeedConfig,
}

impl SessionConfig {
    pub fn new(
        credentials: Credentials,
        front: impl Into<String>,
        instruments: Vec<String>,
    ) -> Self {
        Self {
            credentials,
            front: front.into(),
            instruments,
            feed: QuoteFeedConfig::default(),
        }
    }
}

/// Result of the bounded shutdown path. The transport handle is released in
/// every case.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownOutcome {
    /// The front acknowledged the logout before the timeout.
    Acknowledged,
    /// No logout ack arrived in time; the session was terminated locally.
    TimedOut,
    /// The session never reached a logged-in state, so no logout was issued.
    NotLoggedIn,
}

/// Mutable session record. All fields are guarded by the single session
/// mutex; the delivery thread and the control thread both mutate through it.
#[derive(Debug)]
pub(crate) struct SessionCore {
    pub(crate) state: SessionState,
    pub(crate) last_error: Option<SessionError>,
    pub(crate) trading_day: Option<String>,
    pub(crate) instruments: InstrumentSet,
    pub(crate) subscriptions: HashMap<String, SubscriptionStatus>,
    pub(crate) last_disconnect_reason: Option<i32>,
}

impl SessionCore {
    fn new(instruments: InstrumentSet) -> Self {
        Self {
            state: SessionState::Disconnected,
            last_error: None,
            trading_day: None,
            instruments,
            subscriptions: HashMap::new(),
            last_disconnect_reason: None,
        }
    }

    pub(crate) fn transition(&mut self, to: SessionState) {
        if self.state == to {
            return;
        }
        let from = self.state;
        self.state = to;
        info!(from = %from, to = %to, "session state");
    }

    pub(crate) fn record_error(&mut self, code: i32, message: impl Into<String>) {
        let message = message.into();
        warn!(code, message = %message, "gateway error recorded");
        self.last_error = Some(SessionError { code, message });
    }
}

/// State shared between the controller and the callback handler. The handler
/// holds this through an `Arc`: a callback relation, not ownership.
pub(crate) struct SessionShared {
    pub(crate) api: Arc<dyn MdApi>,
    pub(crate) credentials: Credentials,
    pub(crate) front: String,
    pub(crate) feed: Arc<QuoteFeed>,
    pub(crate) gate: ShutdownGate,
    core: Mutex<SessionCore>,
    request_id: AtomicI32,
}

impl SessionShared {
    /// A poisoned mutex still holds a consistent record (every mutation is a
    /// single field store); recover the guard instead of propagating.
    pub(crate) fn core(&self) -> MutexGuard<'_, SessionCore> {
        match self.core.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    pub(crate) fn next_request_id(&self) -> i32 {
        self.request_id.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub(crate) fn record_fault(&self, code: i32, message: impl Into<String>) {
        self.core().record_error(code, message);
    }
}

/// Session controller: owns the gateway handle and drives the
/// connect → login → subscribe lifecycle forward, and logout → wait →
/// release on the way down.
pub struct MdSession {
    shared: Arc<SessionShared>,
    started: AtomicBool,
}

impl MdSession {
    pub fn new(config: SessionConfig, api: Arc<dyn MdApi>) -> Result<Self, GatewayError> {
        let instruments = InstrumentSet::from_codes(config.instruments)?;
        let shared = Arc::new(SessionShared {
            api,
            credentials: config.credentials,
            front: config.front,
            feed: Arc::new(QuoteFeed::with_config(config.feed)),
            gate: ShutdownGate::new(),
            core: Mutex::new(SessionCore::new(instruments)),
            request_id: AtomicI32::new(0),
        });

        let handler: Arc<QuoteHandler> = Arc::new(QuoteHandler::new(Arc::clone(&shared)));
        shared.api.register_spi(handler);

        Ok(Self {
            shared,
            started: AtomicBool::new(false),
        })
    }

    /// Initiates the transport connect and returns immediately; all further
    /// progress arrives through the callback handler. A second call fails
    /// without touching the front.
    pub fn start(&self) -> Result<(), GatewayError> {
        if self
            .started
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(GatewayError::AlreadyStarted);
        }

        info!(front = %self.shared.front, "session starting");
        self.shared.api.connect(&self.shared.front)
    }

    pub fn subscribe(&self, instrument: &str) -> Result<(), GatewayError> {
        {
            let mut core = self.shared.core();
            if !core.state.can_request() {
                return Err(GatewayError::InvalidState(core.state));
            }
            core.instruments.add(instrument)?;
            core.subscriptions
                .insert(instrument.to_string(), SubscriptionStatus::Pending);
        }

        let request_id = self.shared.next_request_id();
        self.shared
            .api
            .subscribe(&[instrument.to_string()], request_id)
    }

    pub fn unsubscribe(&self, instrument: &str) -> Result<(), GatewayError> {
        {
            let mut core = self.shared.core();
            if !core.state.can_request() {
                return Err(GatewayError::InvalidState(core.state));
            }
            if !core.instruments.remove(instrument) {
                return Err(GatewayError::UnknownInstrument(instrument.to_string()));
            }
        }

        let request_id = self.shared.next_request_id();
        self.shared
            .api
            .unsubscribe(&[instrument.to_string()], request_id)
    }

    /// Issues a logout when the session is in a loggable-out state, waits on
    /// the gate up to `timeout`, then releases the transport handle
    /// unconditionally and forces the terminal state locally if the front
    /// never answered.
    pub fn shutdown(&self, timeout: Duration) -> ShutdownOutcome {
        let logout_wanted = {
            let mut core = self.shared.core();
            match core.state {
                state if state.can_logout() => {
                    core.transition(SessionState::LoggingOut);
                    true
                }
                SessionState::LoggingOut => true,
                _ => false,
            }
        };

        if logout_wanted {
            let request_id = self.shared.next_request_id();
            if let Err(error) = self.shared.api.logout(request_id) {
                self.shared.record_fault(-1, error.to_string());
            }
        }

        // A logout ack may already have been processed before this call;
        // the gate remembers it.
        let acknowledged = if logout_wanted {
            self.shared.gate.wait(timeout)
        } else {
            self.shared.gate.is_set()
        };

        {
            let mut core = self.shared.core();
            if core.state != SessionState::Terminated {
                core.transition(SessionState::Terminated);
            }
        }
        self.shared.api.release();

        let outcome = if acknowledged {
            ShutdownOutcome::Acknowledged
        } else if logout_wanted {
            ShutdownOutcome::TimedOut
        } else {
            ShutdownOutcome::NotLoggedIn
        };
        info!(outcome = ?outcome, "session shutdown");
        outcome
    }

    pub fn state(&self) -> SessionState {
        self.shared.core().state
    }

    pub fn last_error(&self) -> Option<SessionError> {
        self.shared.core().last_error.clone()
    }

    pub fn trading_day(&self) -> Option<String> {
        self.shared.core().trading_day.clone()
    }

    pub fn subscription_status(&self, instrument: &str) -> Option<SubscriptionStatus> {
        self.shared.core().subscriptions.get(instrument).copied()
    }

    pub fn last_disconnect_reason(&self) -> Option<i32> {
        self.shared.core().last_disconnect_reason
    }

    pub fn instruments(&self) -> Vec<String> {
        self.shared.core().instruments.list()
    }

    pub fn feed(&self) -> Arc<QuoteFeed> {
        Arc::clone(&self.shared.feed)
    }
}
