//! Password hashing and login tokens.

pub mod password;
pub mod token;

pub use password::{PasswordError, hash_password, verify_password};
pub use token::generate_token;
