//! Per-session listener, request workers and shared session state

mod listener;
mod registry;
mod state;
mod worker;

pub use listener::SessionListener;
pub use registry::SessionRegistry;
pub use state::{ListeningHandle, SessionState};
pub use worker::RequestWorker;
