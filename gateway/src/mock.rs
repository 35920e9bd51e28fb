use std::sync::{Arc, Mutex};

use quote::DepthQuote;

use crate::api::{Credentials, MdApi, MdSpi, RspInfo};
use crate::error::GatewayError;

/// Outbound request recorded by the mock front.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockRequest {
    Connect(String),
    Login { request_id: i32 },
    Subscribe { instruments: Vec<String>, request_id: i32 },
    Unsubscribe { instruments: Vec<String>, request_id: i32 },
    Logout { request_id: i32 },
    Release,
}

/// Scripted gateway front for tests: records every outbound request and lets
/// the test fire callbacks on whichever thread it chooses.
#[derive(Default)]
pub struct MockMdApi {
    spi: Mutex<Option<Arc<dyn MdSpi>>>,
    requests: Mutex<Vec<MockRequest>>,
}

impl MockMdApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn requests(&self) -> Vec<MockRequest> {
        self.requests.lock().expect("mock request log poisoned").clone()
    }

    pub fn subscribe_batches(&self) -> Vec<Vec<String>> {
        self.requests()
            .into_iter()
            .filter_map(|request| match request {
                MockRequest::Subscribe { instruments, .. } => Some(instruments),
                _ => None,
            })
            .collect()
    }

    pub fn released(&self) -> bool {
        self.requests().contains(&MockRequest::Release)
    }

    fn spi(&self) -> Arc<dyn MdSpi> {
        self.spi
            .lock()
            .expect("mock spi slot poisoned")
            .clone()
            .expect("no spi registered with mock front")
    }

    fn record(&self, request: MockRequest) {
        self.requests
            .lock()
            .expect("mock request log poisoned")
            .push(request);
    }

    pub fn fire_connected(&self) {
        self.spi().on_front_connected();
    }

    pub fn fire_disconnected(&self, reason: i32) {
        self.spi().on_front_disconnected(reason);
    }

    pub fn fire_login_rsp(&self, trading_day: &str, rsp: RspInfo, request_id: i32) {
        self.spi().on_rsp_user_login(trading_day, &rsp, request_id, true);
    }

    pub fn fire_sub_rsp(&self, instrument: &str, rsp: RspInfo, request_id: i32, is_last: bool) {
        self.spi()
            .on_rsp_sub_market_data(instrument, &rsp, request_id, is_last);
    }

    pub fn fire_unsub_rsp(&self, instrument: &str, rsp: RspInfo, request_id: i32, is_last: bool) {
        self.spi()
            .on_rsp_unsub_market_data(instrument, &rsp, request_id, is_last);
    }

    pub fn fire_quote(&self, quote: DepthQuote) {
        self.spi().on_depth_quote(quote);
    }

    pub fn fire_logout_rsp(&self, rsp: RspInfo, request_id: i32) {
        self.spi().on_rsp_user_logout(&rsp, request_id, true);
    }
}

impl MdApi for MockMdApi {
    fn register_spi(&self, spi: Arc<dyn MdSpi>) {
        *self.spi.lock().expect("mock spi slot poisoned") = Some(spi);
    }

    fn connect(&self, front: &str) -> Result<(), GatewayError> {
        self.record(MockRequest::Connect(front.to_string()));
        Ok(())
    }

    fn login(&self, _credentials: &Credentials, request_id: i32) -> Result<(), GatewayError> {
        self.record(MockRequest::Login { request_id });
        Ok(())
    }

    fn subscribe(&self, instruments: &[String], request_id: i32) -> Result<(), GatewayError> {
        self.record(MockRequest::Subscribe {
            instruments: instruments.to_vec(),
            request_id,
        });
        Ok(())
    }

    fn unsubscribe(&self, instruments: &[String], request_id: i32) -> Result<(), GatewayError> {
        self.record(MockRequest::Unsubscribe {
            instruments: instruments.to_vec(),
            request_id,
        });
        Ok(())
    }

    fn logout(&self, request_id: i32) -> Result<(), GatewayError> {
        self.record(MockRequest::Logout { request_id });
        Ok(())
    }

    // Keeps the spi slot so tests may keep firing events after release;
    // a real front would tear the callback channel down here.
    fn release(&self) {
        self.record(MockRequest::Release);
    }
}
