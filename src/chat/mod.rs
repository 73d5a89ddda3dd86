// src/chat/mod.rs - Chat sessions: records, persistence, lifecycle, submission

pub mod autosave;
pub mod controller;
pub mod manager;
pub mod session;
pub mod store;

pub use controller::{ChatController, SubmitOutcome};
pub use manager::SessionManager;
pub use session::{Session, SessionSummary};
pub use store::SessionStore;
