use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use quote::DepthQuote;
use tracing::{debug, warn};

use crate::api::{MdSpi, RspInfo};
use crate::session::SessionShared;
use crate::state::{SessionState, SubscriptionStatus};

/// Translates every inbound gateway event into a state transition on the
/// shared session core. Invoked only from the SDK delivery thread; never
/// blocks, and faults are contained at each entry point.
pub(crate) struct QuoteHandler {
    shared: Arc<SessionShared>,
}

impl QuoteHandler {
    pub(crate) fn new(shared: Arc<SessionShared>) -> Self {
        Self { shared }
    }

    fn contain(&self, entry: &'static str, body: impl FnOnce()) {
        if catch_unwind(AssertUnwindSafe(body)).is_err() {
            self.shared
                .record_fault(-1, format!("fault contained in {} callback", entry));
        }
    }
}

impl MdSpi for QuoteHandler {
    fn on_front_connected(&self) {
        self.contain("on_front_connected", || {
            let shared = &self.shared;
            let proceed = {
                let mut core = shared.core();
                match core.state {
                    SessionState::LoggingOut | SessionState::Terminated => false,
                    _ => {
                        core.transition(SessionState::Connected);
                        true
                    }
                }
            };
            if !proceed {
                return;
            }

            let request_id = shared.next_request_id();
            shared.core().transition(SessionState::LoggingIn);
            if let Err(error) = shared.api.login(&shared.credentials, request_id) {
                shared.record_fault(-1, error.to_string());
            }
        });
    }

    fn on_front_disconnected(&self, reason: i32) {
        self.contain("on_front_disconnected", || {
            let mut core = self.shared.core();
            if core.state == SessionState::Terminated {
                return;
            }
            warn!(reason, "front disconnected");
            core.last_disconnect_reason = Some(reason);
            core.transition(SessionState::Disconnected);
        });
    }

    fn on_rsp_user_login(&self, trading_day: &str, rsp: &RspInfo, _request_id: i32, _is_last: bool) {
        self.contain("on_rsp_user_login", || {
            let shared = &self.shared;
            if !rsp.is_ok() {
                let mut core = shared.core();
                core.record_error(rsp.code, rsp.message.clone());
                core.transition(SessionState::Disconnected);
                return;
            }

            let batch = {
                let mut core = shared.core();
                if core.state != SessionState::LoggingIn {
                    return;
                }
                core.transition(SessionState::LoggedIn);
                core.trading_day = Some(trading_day.to_string());
                let batch = core.instruments.list();
                for instrument in &batch {
                    core.subscriptions
                        .insert(instrument.clone(), SubscriptionStatus::Pending);
                }
                batch
            };
            if batch.is_empty() {
                return;
            }

            let request_id = shared.next_request_id();
            shared.core().transition(SessionState::Subscribing);
            if let Err(error) = shared.api.subscribe(&batch, request_id) {
                shared.record_fault(-1, error.to_string());
            }
        });
    }

    fn on_rsp_sub_market_data(&self, instrument: &str, rsp: &RspInfo, _request_id: i32, _is_last: bool) {
        self.contain("on_rsp_sub_market_data", || {
            let mut core = self.shared.core();
            if rsp.is_ok() {
                core.subscriptions
                    .insert(instrument.to_string(), SubscriptionStatus::Active);
                if matches!(core.state, SessionState::Subscribing | SessionState::LoggedIn) {
                    core.transition(SessionState::Active);
                }
            } else {
                // One failed instrument never aborts the rest of the batch.
                core.subscriptions
                    .insert(instrument.to_string(), SubscriptionStatus::Failed(rsp.code));
                core.record_error(rsp.code, rsp.message.clone());
                if core.state == SessionState::Subscribing {
                    core.transition(SessionState::LoggedIn);
                }
            }
        });
    }

    fn on_rsp_unsub_market_data(
        &self,
        instrument: &str,
        rsp: &RspInfo,
        _request_id: i32,
        _is_last: bool,
    ) {
        self.contain("on_rsp_unsub_market_data", || {
            let mut core = self.shared.core();
            if rsp.is_ok() {
                core.subscriptions.remove(instrument);
                debug!(instrument, "unsubscribed");
            } else {
                core.record_error(rsp.code, rsp.message.clone());
            }
        });
    }

    fn on_depth_quote(&self, quote: DepthQuote) {
        // Hot path: publish without touching the session mutex.
        self.shared.feed.publish(quote);
    }

    fn on_rsp_user_logout(&self, rsp: &RspInfo, _request_id: i32, _is_last: bool) {
        self.contain("on_rsp_user_logout", || {
            {
                let mut core = self.shared.core();
                if !rsp.is_ok() {
                    core.record_error(rsp.code, rsp.message.clone());
                }
                core.transition(SessionState::Terminated);
            }
            // The gate opens on any logout ack; shutdown must not hang on a
            // refused logout.
            self.shared.gate.set();
        });
    }
}
