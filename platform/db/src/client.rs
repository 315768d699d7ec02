use std::sync::Arc;

use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use crate::{Backend, DatabaseSettings, DbError, DbResult, Handle, InitPolicy, RestBackend};

enum Source {
    Settings(DatabaseSettings),
    Backend(Handle),
}

/// Owns the one shared handle to the data service.
///
/// The handle is created on the first [`ClientAccessor::get`] (or eagerly by
/// [`ClientAccessor::connect`]) and reused afterwards. Creation waits for the
/// backend's readiness probe, bounded by the [`InitPolicy`]; a failed attempt
/// leaves nothing cached, so the next caller tries again.
pub struct ClientAccessor {
    source: Source,
    policy: InitPolicy,
    handle: OnceCell<Handle>,
}

impl std::fmt::Debug for ClientAccessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientAccessor")
            .field("policy", &self.policy)
            .field("initialized", &self.is_initialized())
            .finish_non_exhaustive()
    }
}

impl ClientAccessor {
    pub fn new(settings: DatabaseSettings) -> Self {
        let policy = settings.init;
        Self {
            source: Source::Settings(settings),
            policy,
            handle: OnceCell::new(),
        }
    }

    pub fn with_backend(backend: Arc<dyn Backend>) -> Self {
        Self {
            source: Source::Backend(backend),
            policy: InitPolicy::default(),
            handle: OnceCell::new(),
        }
    }

    pub fn with_policy(mut self, policy: InitPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Create the handle now, failing fast if the service never becomes
    /// ready.
    pub async fn connect(settings: DatabaseSettings) -> DbResult<Self> {
        let accessor = Self::new(settings);
        accessor.get().await?;
        Ok(accessor)
    }

    pub fn is_initialized(&self) -> bool {
        self.handle.initialized()
    }

    pub async fn get(&self) -> DbResult<Handle> {
        self.handle
            .get_or_try_init(|| self.initialize())
            .await
            .cloned()
    }

    async fn initialize(&self) -> DbResult<Handle> {
        let backend: Handle = match &self.source {
            Source::Settings(settings) => Arc::new(RestBackend::new(settings)?),
            Source::Backend(backend) => backend.clone(),
        };
        wait_until_ready(backend.as_ref(), self.policy).await?;
        info!("database client initialized");
        Ok(backend)
    }
}

async fn wait_until_ready(backend: &dyn Backend, policy: InitPolicy) -> DbResult<()> {
    let poll = async {
        while !backend.ready().await {
            debug!(interval = ?policy.poll_interval, "database not ready; polling");
            tokio::time::sleep(policy.poll_interval).await;
        }
    };
    tokio::time::timeout(policy.timeout, poll).await.map_err(|_| {
        warn!(timeout = ?policy.timeout, "database never became ready");
        DbError::InitTimeout(policy.timeout)
    })
}
