//! Authentication infrastructure module
//!
//! Token issuing and verification plus the login/logout/refresh service.

mod clock;
mod jwt;
mod service;

pub use clock::{Clock, SystemClock};
pub use jwt::{TokenClaims, TokenConfig, TokenIssuer, TokenPair, TokenService, TokenType};
pub use service::{AuthService, AuthSession};
pub(crate) use service::start_session;

#[cfg(test)]
pub use clock::mock::ManualClock;
