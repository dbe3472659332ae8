//! Wiring of the dialer components
//!
//! [`DialerConsole`] builds one [`DialerStore`] and hands it, together with a
//! backend, to the [`CampaignNavigator`] and the [`DialerLoop`]. Front ends
//! hold a console and talk to those two; state is read through snapshots.
//!
//! # Examples
//!
//! ```rust,no_run
//! use dialer_core::{DialerConfig, DialerConsole};
//!
//! # async fn run() -> dialer_core::DialerResult<()> {
//! let config = DialerConfig::new("https://crm.example.com".parse().unwrap());
//! let console = DialerConsole::connect(config)?;
//!
//! let session = console.session().expect("REST console has a session");
//! let operator = session.login("mario", "secret").await?;
//! console.navigator().load_active_campaigns(&operator).await?;
//!
//! if let Some(contact) = console.snapshot().current_contact {
//!     console.dialer().dial(&contact).await?;
//! }
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use tokio::sync::{broadcast, watch};

use crate::api::rest::RestBackend;
use crate::api::DialerBackend;
use crate::config::DialerConfig;
use crate::dialer::DialerLoop;
use crate::error::DialerResult;
use crate::events::DialerEvent;
use crate::navigator::CampaignNavigator;
use crate::session::SessionGuard;
use crate::store::{DialerSnapshot, DialerStore};

pub struct DialerConsole {
    config: Arc<DialerConfig>,
    session: Option<Arc<SessionGuard>>,
    store: Arc<DialerStore>,
    navigator: CampaignNavigator,
    dialer: Arc<DialerLoop>,
}

impl DialerConsole {
    /// Console talking to the REST backend at `config.base_url`
    pub fn connect(config: DialerConfig) -> DialerResult<Self> {
        config.validate()?;
        let session = Arc::new(SessionGuard::new(&config)?);
        let backend = Arc::new(RestBackend::new(Arc::clone(&session)));
        let mut console = Self::with_backend(config, backend);
        console.session = Some(session);
        Ok(console)
    }

    /// Console over any backend; there is no session to manage
    pub fn with_backend(config: DialerConfig, backend: Arc<dyn DialerBackend>) -> Self {
        let config = Arc::new(config);
        let store = Arc::new(DialerStore::new(config.event_buffer));
        let navigator = CampaignNavigator::new(Arc::clone(&backend), Arc::clone(&store));
        let dialer = Arc::new(DialerLoop::new(backend, Arc::clone(&store), Arc::clone(&config)));
        Self {
            config,
            session: None,
            store,
            navigator,
            dialer,
        }
    }

    pub fn config(&self) -> &DialerConfig {
        &self.config
    }

    pub fn session(&self) -> Option<&Arc<SessionGuard>> {
        self.session.as_ref()
    }

    pub fn navigator(&self) -> &CampaignNavigator {
        &self.navigator
    }

    pub fn dialer(&self) -> &Arc<DialerLoop> {
        &self.dialer
    }

    pub fn store(&self) -> &Arc<DialerStore> {
        &self.store
    }

    /// Stop the dialer and drop all navigation state
    pub fn leave(&self) {
        self.dialer.stop();
        self.store.reset();
    }

    pub fn snapshot(&self) -> DialerSnapshot {
        self.store.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<DialerSnapshot> {
        self.store.subscribe()
    }

    pub fn events(&self) -> broadcast::Receiver<DialerEvent> {
        self.store.events()
    }
}
