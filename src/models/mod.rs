pub mod events;
pub mod exam;
pub mod session;
pub mod state;
pub mod submission;
