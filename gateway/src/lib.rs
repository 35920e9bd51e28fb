pub mod api;
pub mod error;
pub mod gate;
mod handler;
pub mod instruments;
pub mod mock;
pub mod session;
pub mod sim;
pub mod state;

pub use api::{Credentials, MdApi, MdSpi, RspInfo, MAX_SUBSCRIBE_BATCH};
pub use error::GatewayError;
pub use gate::ShutdownGate;
pub use instruments::InstrumentSet;
pub use mock::{MockMdApi, MockRequest};
pub use session::{MdSession, SessionConfig, ShutdownOutcome};
pub use sim::SimFront;
pub use state::{SessionError, SessionState, SubscriptionStatus};

#[cfg(test)]
mod tests {
    use super::{
        Credentials, MdSession, MockMdApi, MockRequest, RspInfo, SessionConfig, SessionState,
        ShutdownOutcome, SubscriptionStatus,
    };
    use quote::QuoteFeed;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    fn session_with_mock(instruments: &[&str]) -> (MdSession, Arc<MockMdApi>) {
        let api = Arc::new(MockMdApi::new());
        let credentials =
            Credentials::new("1013", "166006", "secret").expect("credentials should be valid");
        let config = SessionConfig::new(
            credentials,
            "tcp://127.0.0.1:17001",
            instruments.iter().map(|x| x.to_string()).collect(),
        );
        let session = MdSession::new(config, api.clone()).expect("session should build");
        (session, api)
    }

    #[test]
    fn happy_path_reaches_active_and_shuts_down_cleanly() {
        let (session, api) = session_with_mock(&["al2412"]);
        session.start().expect("start should connect");
        assert!(matches!(api.requests()[0], MockRequest::Connect(_)));

        api.fire_connected();
        assert_eq!(session.state(), SessionState::LoggingIn);

        api.fire_login_rsp("20260807", RspInfo::ok(), 1);
        assert_eq!(session.state(), SessionState::Subscribing);
        assert_eq!(session.trading_day().as_deref(), Some("20260807"));
        assert_eq!(api.subscribe_batches(), vec![vec!["al2412".to_string()]]);

        api.fire_sub_rsp("al2412", RspInfo::ok(), 2, true);
        assert_eq!(session.state(), SessionState::Active);
        assert_eq!(
            session.subscription_status("al2412"),
            Some(SubscriptionStatus::Active)
        );

        let mut ticks = session.feed().subscribe("al2412");
        let quote = QuoteFeed::bootstrap_quotes("al2412", "SHFE", 1).remove(0);
        api.fire_quote(quote);
        let received = ticks.try_recv().expect("tick should be published");
        assert_eq!(received.instrument, "al2412");

        let api_for_ack = api.clone();
        let ack = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            api_for_ack.fire_logout_rsp(RspInfo::ok(), 3);
        });
        let outcome = session.shutdown(Duration::from_secs(2));
        ack.join().expect("ack thread should finish");

        assert_eq!(outcome, ShutdownOutcome::Acknowledged);
        assert_eq!(session.state(), SessionState::Terminated);
        assert!(api.released());
    }
}
