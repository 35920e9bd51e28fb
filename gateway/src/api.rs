use std::sync::Arc;

use quote::DepthQuote;

use crate::error::GatewayError;

/// Maximum instruments the front accepts in one subscribe/unsubscribe batch.
pub const MAX_SUBSCRIBE_BATCH: usize = 1024;

#[derive(Clone)]
pub struct Credentials {
    pub broker_id: String,
    pub user_id: String,
    pub password: String,
}

impl Credentials {
    pub fn new(
        broker_id: impl Into<String>,
        user_id: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<Self, GatewayError> {
        let credentials = Self {
            broker_id: broker_id.into(),
            user_id: user_id.into(),
            password: password.into(),
        };

        if credentials.broker_id.is_empty() {
            return Err(GatewayError::InvalidCredentials("broker_id".to_string()));
        }
        if credentials.user_id.is_empty() {
            return Err(GatewayError::InvalidCredentials("user_id".to_string()));
        }
        if credentials.password.is_empty() {
            return Err(GatewayError::InvalidCredentials("password".to_string()));
        }

        Ok(credentials)
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("broker_id", &self.broker_id)
            .field("user_id", &self.user_id)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Response envelope attached to every gateway acknowledgment.
/// Code 0 means success; anything else carries a front-supplied message.
#[derive(Debug, Clone, Default)]
pub struct RspInfo {
    pub code: i32,
    pub message: String,
}

impl RspInfo {
    pub fn ok() -> Self {
        Self::default()
    }

    pub fn error(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.code == 0
    }
}

/// Request side of the gateway SDK boundary. Implementations own the wire
/// protocol and transport; all requests are fire-and-forget with outcomes
/// delivered through the registered `MdSpi`.
pub trait MdApi: Send + Sync {
    fn register_spi(&self, spi: Arc<dyn MdSpi>);
    fn connect(&self, front: &str) -> Result<(), GatewayError>;
    fn login(&self, credentials: &Credentials, request_id: i32) -> Result<(), GatewayError>;
    fn subscribe(&self, instruments: &[String], request_id: i32) -> Result<(), GatewayError>;
    fn unsubscribe(&self, instruments: &[String], request_id: i32) -> Result<(), GatewayError>;
    fn logout(&self, request_id: i32) -> Result<(), GatewayError>;
    fn release(&self);
}

/// Callback side of the gateway SDK boundary, invoked from the SDK's own
/// delivery thread. Entry points must not block and must not panic across
/// the boundary.
pub trait MdSpi: Send + Sync {
    fn on_front_connected(&self);
    fn on_front_disconnected(&self, reason: i32);
    fn on_rsp_user_login(&self, trading_day: &str, rsp: &RspInfo, request_id: i32, is_last: bool);
    fn on_rsp_sub_market_data(&self, instrument: &str, rsp: &RspInfo, request_id: i32, is_last: bool);
    fn on_rsp_unsub_market_data(
        &self,
        instrument: &str,
        rsp: &RspInfo,
        request_id: i32,
        is_last: bool,
    );
    fn on_depth_quote(&self, quote: DepthQuote);
    fn on_rsp_user_logout(&self, rsp: &RspInfo, request_id: i32, is_last: bool);
}

#[cfg(test)]
mod tests {
    use super::{Credentials, RspInfo};

    #[test]
    fn credentials_reject_empty_fields() {
        assert!(Credentials::new("", "u", "p").is_err());
        assert!(Credentials::new("b", "", "p").is_err());
        assert!(Credentials::new("b", "u", "").is_err());
        assert!(Credentials::new("1013", "166006", "secret").is_ok());
    }

    #[test]
    fn credentials_debug_never_prints_password() {
        let credentials =
            Credentials::new("1013", "166006", "secret").expect("credentials should be valid");
        let rendered = format!("{:?}", credentials);
        assert!(!rendered.contains("secret"));
        assert!(rendered.contains("166006"));
    }

    #[test]
    fn rsp_info_zero_code_is_success() {
        assert!(RspInfo::ok().is_ok());
        assert!(!RspInfo::error(5, "bad password").is_ok());
    }
}
