//! Domain types and models

pub mod request;
pub mod resources;
pub mod session;

pub use request::{ApiRequest, Query, QueryValue, Verb, DEFAULT_TIMEOUT};
pub use resources::*;
pub use session::{ServerBinding, Session, TokenKind, LOGIN_TIMESTAMP_FORMAT};
