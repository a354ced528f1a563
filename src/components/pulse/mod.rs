mod actor;
pub mod deep_link;
mod handle;
pub mod reducer;
pub mod refresh;
mod scheduler;
pub mod state;

pub use handle::PulseHandle;
pub use reducer::{update, Effect, Mutation, PulseMsg};
pub use refresh::{refresh_next_event, PulseServices, RefreshOutcome};
pub use state::{PermissionState, PulseState, RefreshSettings, Status};

use crate::config::Config;
use crate::error::PulseResult;
use crate::utils::time::local_date;
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Next-event, live activity and reminder orchestration
pub struct Pulse {
    services: PulseServices,
    handle: RwLock<Option<PulseHandle>>,
}

impl Pulse {
    /// Create a new pulse component
    pub fn new(services: PulseServices) -> Self {
        Self {
            services,
            handle: RwLock::new(None),
        }
    }

    /// Get the handle if it exists
    pub async fn get_handle(&self) -> Option<PulseHandle> {
        let handle_lock = self.handle.read().await;
        handle_lock.clone()
    }
}

#[async_trait]
impl super::Component for Pulse {
    fn name(&self) -> &'static str {
        "pulse"
    }

    async fn init(&self, config: Arc<RwLock<Config>>) -> PulseResult<()> {
        let settings = {
            let config_read = config.read().await;
            RefreshSettings::from_config(&config_read)?
        };

        let mut handle_lock = self.handle.write().await;
        if handle_lock.is_some() {
            return Ok(());
        }

        let today = local_date(Utc::now(), settings.tz);
        let handle = PulseHandle::new(self.services.clone(), settings, today);
        handle.dispatch(PulseMsg::Initialized).await?;
        handle.dispatch(PulseMsg::Appeared).await?;
        *handle_lock = Some(handle);
        Ok(())
    }

    async fn shutdown(&self) -> PulseResult<()> {
        let handle_lock = self.handle.read().await;
        if let Some(handle) = &*handle_lock {
            handle.dispatch(PulseMsg::Disappeared).await?;
            handle.shutdown().await?;
        }
        Ok(())
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}
