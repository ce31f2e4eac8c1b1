//! Process-wide host state

use std::sync::Arc;

use rh_core::HostConfig;
use rh_protocol::{HtmlPresenter, Presenter};

use crate::allocator::PortAllocator;
use crate::migration::MigrationClient;
use crate::session::SessionRegistry;

/// State shared by the coordinator and every session it starts
pub struct HostState {
    /// Configuration
    pub config: HostConfig,
    /// Session port allocator
    pub allocator: PortAllocator,
    /// Live sessions
    pub sessions: SessionRegistry,
    /// Page rendering and response framing
    pub presenter: Arc<dyn Presenter>,
    /// Handshake client used by migrating workers
    pub migration: MigrationClient,
}

impl HostState {
    /// Create host state with the HTML presenter
    pub fn new(config: HostConfig) -> Self {
        Self::with_presenter(config, Arc::new(HtmlPresenter::new()))
    }

    /// Create host state with a custom presenter
    pub fn with_presenter(config: HostConfig, presenter: Arc<dyn Presenter>) -> Self {
        Self {
            allocator: PortAllocator::new(config.session.first_port),
            sessions: SessionRegistry::new(),
            migration: MigrationClient::from_config(&config),
            presenter,
            config,
        }
    }
}
