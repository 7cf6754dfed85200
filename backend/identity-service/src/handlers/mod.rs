/// HTTP request handlers (REST API)
pub mod users;

// Re-export handlers for easy access
pub use users::{
    delete_user, get_user, health, list_users, login, register, update_user, MessageResponse,
};
