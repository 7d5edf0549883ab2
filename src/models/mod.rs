//! 领域模型

pub mod user;

pub use user::{AuthenticatedUser, User, UserResponse};
