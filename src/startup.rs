use crate::components::calendar::MemoryEventStore;
use crate::components::important::{FlagStore, ImportantEventStore};
use crate::components::live_activity::MemoryActivityService;
use crate::components::pulse::{Pulse, PulseServices};
use crate::components::reminders::LocalReminderScheduler;
use crate::components::ComponentManager;
use crate::config::Config;
use crate::error::{Error, PulseResult};
use crate::shutdown;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::{oneshot, RwLock};
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Initialize logging with environment-based configuration
pub fn init_logging() -> miette::Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| Error::Other(format!("Failed to set up logging: {}", e)))?;

    Ok(())
}

/// Load and initialize the application config
pub async fn load_config() -> miette::Result<Arc<RwLock<Config>>> {
    match Config::load() {
        Ok(config) => Ok(Arc::new(RwLock::new(config))),
        Err(e) => {
            error!("Failed to load configuration: {:?}", e);
            Err(e.into())
        }
    }
}

/// Build the in-process services the orchestrator runs against
pub fn build_services(config: &Config) -> PulseResult<(PulseServices, LocalReminderScheduler)> {
    let tz = config.tz()?;

    let events = match &config.events_file {
        Some(path) => {
            info!("Loading events from {}", path);
            MemoryEventStore::from_file(Path::new(path), tz)?
        }
        None => MemoryEventStore::new(tz),
    };

    let flags: Arc<dyn FlagStore> = match ImportantEventStore::open(config.important_store()) {
        Ok(store) => Arc::new(store),
        Err(e) => {
            warn!(
                "Could not open {}, importance flags will not be saved: {}",
                config.important_store_path, e
            );
            Arc::new(ImportantEventStore::in_memory())
        }
    };

    let reminders = LocalReminderScheduler::new();
    let services = PulseServices {
        events: Arc::new(events),
        flags,
        activities: Arc::new(MemoryActivityService::new(config.max_live_activities)),
        reminders: Arc::new(reminders.clone()),
    };
    Ok((services, reminders))
}

/// Start the components and run until a termination signal arrives
pub async fn start(config: Arc<RwLock<Config>>) -> miette::Result<()> {
    let (services, reminders) = {
        let config_read = config.read().await;
        crate::utils::i18n::set_locale(&config_read.locale);
        info!("Setting locale to {}", config_read.locale);
        build_services(&config_read)?
    };

    // Initialize component manager
    let mut component_manager = ComponentManager::new(Arc::clone(&config));
    component_manager.register(Pulse::new(services));
    let component_manager = Arc::new(component_manager);

    component_manager.init_all().await?;

    // Create shutdown channel
    let (shutdown_send, shutdown_recv) = oneshot::channel();

    let shutdown_components = Arc::clone(&component_manager);
    tokio::spawn(async move {
        shutdown::handle_signals(shutdown_send, shutdown_components, reminders).await;
    });

    info!("CalendarPulse is running");
    if shutdown_recv.await.is_err() {
        error!("Signal handler stopped unexpectedly");
    }
    info!("Received shutdown signal, exiting");
    Ok(())
}
