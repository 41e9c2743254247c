mod handler;
mod model;

pub use handler::{
    active_users, create_session, current_session, destroy_current_session,
    destroy_user_sessions, health, update_current_session, user_sessions,
};
pub use model::{CreateSessionRequest, CreateSessionResponse, is_valid_user_id};
