use crate::state::SessionState;

#[derive(Debug, Clone)]
pub enum GatewayError {
    NotConnected,
    ConnectionFailed(String),
    AlreadyStarted,
    InvalidState(SessionState),
    InvalidCredentials(String),
    BatchOverflow(usize),
    UnknownInstrument(String),
    RequestFailed(String),
}

impl std::fmt::Display for GatewayError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GatewayError::NotConnected => write!(f, "gateway front not connected"),
            GatewayError::ConnectionFailed(msg) => write!(f, "connection failed: {}", msg),
            GatewayError::AlreadyStarted => write!(f, "session already started"),
            GatewayError::InvalidState(state) => {
                write!(f, "invalid session state: {}", state)
            }
            GatewayError::InvalidCredentials(field) => {
                write!(f, "credential field must not be empty: {}", field)
            }
            GatewayError::BatchOverflow(max) => {
                write!(f, "instrument batch exceeds gateway maximum of {}", max)
            }
            GatewayError::UnknownInstrument(instrument) => {
                write!(f, "instrument not in subscription set: {}", instrument)
            }
            GatewayError::RequestFailed(msg) => write!(f, "request failed: {}", msg),
        }
    }
}

impl std::error::Error for GatewayError {}
