mod error_handler;
mod internal;
mod session;

pub use error_handler::log_errors;
pub use internal::{INTERNAL_KEY_HEADER, internal_key_middleware};
pub use session::{CurrentSession, session_middleware};
