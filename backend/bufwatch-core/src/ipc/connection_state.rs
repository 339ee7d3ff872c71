//! Lifecycle of the single companion connection.

use std::fmt::{Display, Formatter, Result as FormatResult};

/// `Unbound -> Listening -> Connected -> Closed`.
///
/// A failed accept leaves the manager in `Listening`; nothing moves back
/// out of `Closed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Unbound,
    Listening,
    Connected,
    Closed,
}

impl ConnectionState {
    pub fn is_connected(self) -> bool {
        self == ConnectionState::Connected
    }
}

impl Display for ConnectionState {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> FormatResult {
        let name = match self {
            ConnectionState::Unbound => "unbound",
            ConnectionState::Listening => "listening",
            ConnectionState::Connected => "connected",
            ConnectionState::Closed => "closed",
        };
        formatter.write_str(name)
    }
}
