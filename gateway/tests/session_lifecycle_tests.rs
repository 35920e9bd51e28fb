use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use gateway::{
    Credentials, MdSession, MockMdApi, MockRequest, RspInfo, SessionConfig, SessionState,
    ShutdownOutcome, SubscriptionStatus,
};
use quote::QuoteFeed;

fn build_session(instruments: &[&str]) -> (MdSession, Arc<MockMdApi>) {
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

fn drive_to_active(session: &MdSession, api: &MockMdApi, instruments: &[&str]) {
    session.start().expect("start should connect");
    api.fire_connected();
    api.fire_login_rsp("20260807", RspInfo::ok(), 1);
    let last = instruments.len().saturating_sub(1);
    for (index, instrument) in instruments.iter().enumerate() {
        api.fire_sub_rsp(instrument, RspInfo::ok(), 2, index == last);
    }
    assert_eq!(session.state(), SessionState::Active);
}

#[test]
fn login_failure_records_error_and_never_subscribes() {
    let (session, api) = build_session(&["al1412"]);
    session.start().expect("start should connect");
    api.fire_connected();

    api.fire_login_rsp("", RspInfo::error(5, "invalid password"), 1);

    assert_eq!(session.state(), SessionState::Disconnected);
    let error = session.last_error().expect("login error should be recorded");
    assert_eq!(error.code, 5);
    assert!(api.subscribe_batches().is_empty());
}

#[test]
fn login_success_issues_exactly_one_subscribe_batch() {
    let (session, api) = build_session(&["al1412"]);
    session.start().expect("start should connect");
    api.fire_connected();

    api.fire_login_rsp("20260807", RspInfo::ok(), 1);

    let batches = api.subscribe_batches();
    assert_eq!(batches, vec![vec!["al1412".to_string()]]);
    assert_eq!(session.state(), SessionState::Subscribing);
}

#[test]
fn subscribe_while_disconnected_fails_without_outbound_request() {
    let (session, api) = build_session(&[]);

    let result = session.subscribe("al1412");

    assert!(result.is_err());
    assert!(api.subscribe_batches().is_empty());
    assert_eq!(session.state(), SessionState::Disconnected);
}

#[test]
fn mixed_batch_ack_isolates_the_failed_instrument() {
    let (session, api) = build_session(&["cu2412", "al2412"]);
    session.start().expect("start should connect");
    api.fire_connected();
    api.fire_login_rsp("20260807", RspInfo::ok(), 1);

    api.fire_sub_rsp("cu2412", RspInfo::error(16, "no such instrument"), 2, false);
    api.fire_sub_rsp("al2412", RspInfo::ok(), 2, true);

    assert_eq!(
        session.subscription_status("cu2412"),
        Some(SubscriptionStatus::Failed(16))
    );
    assert_eq!(
        session.subscription_status("al2412"),
        Some(SubscriptionStatus::Active)
    );
    assert_eq!(session.state(), SessionState::Active);
}

#[test]
fn mixed_batch_ack_converges_to_active_in_either_order() {
    let (session, api) = build_session(&["cu2412", "al2412"]);
    session.start().expect("start should connect");
    api.fire_connected();
    api.fire_login_rsp("20260807", RspInfo::ok(), 1);

    api.fire_sub_rsp("al2412", RspInfo::ok(), 2, false);
    api.fire_sub_rsp("cu2412", RspInfo::error(16, "no such instrument"), 2, true);

    assert_eq!(session.state(), SessionState::Active);
    assert_eq!(
        session.subscription_status("cu2412"),
        Some(SubscriptionStatus::Failed(16))
    );
}

#[test]
fn shutdown_returns_within_timeout_against_a_dead_front() {
    let (session, api) = build_session(&["al2412"]);
    drive_to_active(&session, &api, &["al2412"]);

    let started = Instant::now();
    let outcome = session.shutdown(Duration::from_millis(100));
    let elapsed = started.elapsed();

    assert_eq!(outcome, ShutdownOutcome::TimedOut);
    assert!(elapsed >= Duration::from_millis(100));
    assert!(elapsed < Duration::from_secs(1));
    assert_eq!(session.state(), SessionState::Terminated);
    assert!(api.released());
    assert!(api
        .requests()
        .iter()
        .any(|request| matches!(request, MockRequest::Logout { .. })));
}

#[test]
fn concurrent_ticks_and_logout_ack_always_terminate() {
    for _ in 0..20 {
        let (session, api) = build_session(&["al2412"]);
        drive_to_active(&session, &api, &["al2412"]);

        let tick_api = api.clone();
        let ticker = thread::spawn(move || {
            let quotes = QuoteFeed::bootstrap_quotes("al2412", "SHFE", 50);
            for quote in quotes {
                tick_api.fire_quote(quote);
            }
        });
        let ack_api = api.clone();
        let acker = thread::spawn(move || {
            ack_api.fire_logout_rsp(RspInfo::ok(), 9);
        });

        let outcome = session.shutdown(Duration::from_secs(2));
        ticker.join().expect("tick thread should finish");
        acker.join().expect("ack thread should finish");

        assert_eq!(outcome, ShutdownOutcome::Acknowledged);
        assert_eq!(session.state(), SessionState::Terminated);
        assert_eq!(session.feed().metrics().published, 50);
    }
}

#[test]
fn shutdown_without_login_skips_logout_but_releases() {
    let (session, api) = build_session(&["al2412"]);
    session.start().expect("start should connect");
    api.fire_connected();

    let outcome = session.shutdown(Duration::from_millis(50));

    assert_eq!(outcome, ShutdownOutcome::NotLoggedIn);
    assert_eq!(session.state(), SessionState::Terminated);
    assert!(api.released());
    assert!(!api
        .requests()
        .iter()
        .any(|request| matches!(request, MockRequest::Logout { .. })));
}

#[test]
fn second_start_fails_without_a_second_connect() {
    let (session, api) = build_session(&["al2412"]);
    session.start().expect("first start should connect");

    assert!(session.start().is_err());
    let connects = api
        .requests()
        .iter()
        .filter(|request| matches!(request, MockRequest::Connect(_)))
        .count();
    assert_eq!(connects, 1);
}

#[test]
fn unsolicited_disconnect_re_drives_login_on_reconnect() {
    let (session, api) = build_session(&["al2412"]);
    drive_to_active(&session, &api, &["al2412"]);

    api.fire_disconnected(0x1001);
    assert_eq!(session.state(), SessionState::Disconnected);
    assert_eq!(session.last_disconnect_reason(), Some(0x1001));

    api.fire_connected();
    assert_eq!(session.state(), SessionState::LoggingIn);

    let login_ids: Vec<i32> = api
        .requests()
        .iter()
        .filter_map(|request| match request {
            MockRequest::Login { request_id } => Some(*request_id),
            _ => None,
        })
        .collect();
    assert_eq!(login_ids.len(), 2);
    assert!(login_ids[1] > login_ids[0]);
}

#[test]
fn unsubscribe_ack_clears_bookkeeping() {
    let (session, api) = build_session(&["al2412"]);
    drive_to_active(&session, &api, &["al2412"]);

    session.unsubscribe("al2412").expect("unsubscribe should be accepted");
    assert!(api
        .requests()
        .iter()
        .any(|request| matches!(request, MockRequest::Unsubscribe { .. })));

    api.fire_unsub_rsp("al2412", RspInfo::ok(), 5, true);

    assert_eq!(session.subscription_status("al2412"), None);
    assert!(session.instruments().is_empty());
    assert_eq!(session.state(), SessionState::Active);
}

#[test]
fn unsubscribe_of_unknown_instrument_is_rejected() {
    let (session, api) = build_session(&["al2412"]);
    drive_to_active(&session, &api, &["al2412"]);

    assert!(session.unsubscribe("zn2501").is_err());
    assert!(!api
        .requests()
        .iter()
        .any(|request| matches!(request, MockRequest::Unsubscribe { .. })));
}

#[test]
fn runtime_subscribe_issues_batch_of_one() {
    let (session, api) = build_session(&["al2412"]);
    drive_to_active(&session, &api, &["al2412"]);

    session.subscribe("rb2501").expect("subscribe should be accepted");
    api.fire_sub_rsp("rb2501", RspInfo::ok(), 6, true);

    assert_eq!(
        session.subscription_status("rb2501"),
        Some(SubscriptionStatus::Active)
    );
    let batches = api.subscribe_batches();
    assert_eq!(batches.last(), Some(&vec!["rb2501".to_string()]));
}

#[test]
fn logout_ack_with_error_code_still_unblocks_shutdown() {
    let (session, api) = build_session(&["al2412"]);
    drive_to_active(&session, &api, &["al2412"]);

    let ack_api = api.clone();
    let acker = thread::spawn(move || {
        thread::sleep(Duration::from_millis(20));
        ack_api.fire_logout_rsp(RspInfo::error(37, "logout refused"), 9);
    });

    let outcome = session.shutdown(Duration::from_secs(2));
    acker.join().expect("ack thread should finish");

    assert_eq!(outcome, ShutdownOutcome::Acknowledged);
    assert_eq!(session.state(), SessionState::Terminated);
    let error = session.last_error().expect("refused logout should be recorded");
    assert_eq!(error.code, 37);
}
