use std::fmt::{Display, Formatter};

/// Session lifecycle states, ordered along the connect/login/subscribe path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    Disconnected,
    Connected,
    LoggingIn,
    LoggedIn,
    Subscribing,
    Active,
    LoggingOut,
    Terminated,
}

impl SessionState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connected => "connected",
            Self::LoggingIn => "logging_in",
            Self::LoggedIn => "logged_in",
            Self::Subscribing => "subscribing",
            Self::Active => "active",
            Self::LoggingOut => "logging_out",
            Self::Terminated => "terminated",
        }
    }

    /// States from which subscribe/unsubscribe requests may be issued.
    pub fn can_request(self) -> bool {
        matches!(self, Self::LoggedIn | Self::Active)
    }

    /// States from which a logout request makes sense on shutdown.
    pub fn can_logout(self) -> bool {
        matches!(self, Self::LoggedIn | Self::Subscribing | Self::Active)
    }
}

impl Display for SessionState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Last error recorded for the session: gateway error code plus message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionError {
    pub code: i32,
    pub message: String,
}

/// Per-instrument subscription bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionStatus {
    Pending,
    Active,
    Failed(i32),
}

#[cfg(test)]
mod tests {
    use super::SessionState;

    #[test]
    fn request_states_are_logged_in_or_active() {
        assert!(SessionState::LoggedIn.can_request());
        assert!(SessionState::Active.can_request());
        assert!(!SessionState::Disconnected.can_request());
        assert!(!SessionState::Subscribing.can_request());
        assert!(!SessionState::Terminated.can_request());
    }

    #[test]
    fn logout_states_cover_subscribing() {
        assert!(SessionState::Subscribing.can_logout());
        assert!(!SessionState::LoggingIn.can_logout());
        assert!(!SessionState::LoggingOut.can_logout());
    }
}
