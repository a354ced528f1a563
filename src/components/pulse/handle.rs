use super::actor::{PulseActor, PulseCommand};
use super::reducer::PulseMsg;
use super::refresh::{PulseServices, RefreshOutcome};
use super::state::{PulseState, RefreshSettings};
use crate::components::calendar::{Event, EventDraft};
use crate::error::{component_error, PulseResult};
use chrono::NaiveDate;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Handle for interacting with the pulse actor
#[derive(Clone)]
pub struct PulseHandle {
    command_tx: mpsc::Sender<PulseCommand>,
    _actor_task: Arc<JoinHandle<()>>,
}

impl PulseHandle {
    /// Create a new PulseHandle and spawn the actor
    pub fn new(services: PulseServices, settings: RefreshSettings, today: NaiveDate) -> Self {
        let (mut actor, command_tx) = PulseActor::new(services, settings, today);

        let actor_task = tokio::spawn(async move {
            actor.run().await;
        });

        Self {
            command_tx,
            _actor_task: Arc::new(actor_task),
        }
    }

    async fn send(&self, command: PulseCommand) -> PulseResult<()> {
        self.command_tx
            .send(command)
            .await
            .map_err(|e| component_error(&format!("Pulse actor mailbox error: {}", e)))
    }

    async fn request<T>(
        &self,
        command: impl FnOnce(mpsc::Sender<T>) -> PulseCommand,
    ) -> PulseResult<T> {
        let (response_tx, mut response_rx) = mpsc::channel(1);
        self.send(command(response_tx)).await?;
        response_rx
            .recv()
            .await
            .ok_or_else(|| component_error("Pulse actor response channel closed"))
    }

    /// Feed a message to the actor; returns once it is queued
    pub async fn dispatch(&self, msg: PulseMsg) -> PulseResult<()> {
        self.send(PulseCommand::Dispatch(msg)).await
    }

    pub async fn create_event(&self, draft: EventDraft) -> PulseResult<Event> {
        self.request(|tx| PulseCommand::CreateEvent(draft, tx)).await?
    }

    pub async fn update_event(&self, id: &str, draft: EventDraft) -> PulseResult<Event> {
        let id = id.to_string();
        self.request(|tx| PulseCommand::UpdateEvent(id, draft, tx)).await?
    }

    pub async fn delete_event(&self, id: &str) -> PulseResult<()> {
        let id = id.to_string();
        self.request(|tx| PulseCommand::DeleteEvent(id, tx)).await?
    }

    /// Flip the importance flag of `id`; resolves to the new value
    pub async fn toggle_important(&self, id: &str) -> PulseResult<bool> {
        let id = id.to_string();
        self.request(|tx| PulseCommand::ToggleImportant(id, tx)).await?
    }

    pub async fn open_deep_link(&self, url: &str) -> PulseResult<()> {
        let url = url.to_string();
        self.request(|tx| PulseCommand::OpenDeepLink(url, tx)).await?
    }

    /// Current state, after every command sent before it was processed
    pub async fn snapshot(&self) -> PulseResult<PulseState> {
        self.request(PulseCommand::Snapshot).await
    }

    /// Outcome of the latest next-event refresh
    pub async fn last_refresh(&self) -> PulseResult<Option<RefreshOutcome>> {
        self.request(PulseCommand::LastRefresh).await
    }

    /// Shutdown the actor
    pub async fn shutdown(&self) -> PulseResult<()> {
        let _ = self.command_tx.send(PulseCommand::Shutdown).await;
        Ok(())
    }
}
