pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod session;

pub use session::{open_session, SessionHandle, SessionServices};
