//! rh-host: Coordinator and session listeners for roamhost
//!
//! The coordinator listens on a well-known port and turns every session
//! request into a dedicated [`SessionListener`] on a freshly allocated port.
//! Each listener spawns one [`RequestWorker`] per connection; a worker either
//! bumps the session counter or migrates the session to another coordinator,
//! closing its own listener once the destination has taken over.

mod accept;
pub mod allocator;
pub mod coordinator;
pub mod migration;
pub mod session;
pub mod state;

pub use allocator::PortAllocator;
pub use coordinator::Coordinator;
pub use migration::MigrationClient;
pub use session::{ListeningHandle, RequestWorker, SessionListener, SessionRegistry, SessionState};
pub use state::HostState;
