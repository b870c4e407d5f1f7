//! Application state shared by every request

pub mod state;

pub use state::AppState;
