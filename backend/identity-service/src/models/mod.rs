/// Data models for identity and authentication
pub mod user;

pub use user::{
    Favorite, LoginRequest, LoginResponse, NewUser, RegisterRequest, UpdateUserRequest, User,
    UserResponse,
};
