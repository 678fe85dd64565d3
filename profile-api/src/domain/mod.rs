mod error;
pub mod models;
pub mod placeholder;
pub mod ports;
pub mod retry;
pub mod services;
pub mod validator;

pub use error::*;
