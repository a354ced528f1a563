use super::deep_link;
use super::reducer::{update, Effect, Mutation, PulseMsg};
use super::refresh::{refresh_next_event, PulseServices, RefreshOutcome};
use super::scheduler::{spawn_observer, spawn_ticker};
use super::state::{PermissionState, PulseState, RefreshSettings};
use crate::components::calendar::{queries, Event, EventDraft};
use crate::components::reminders::ReminderTracker;
use crate::error::{Error, PulseResult};
use crate::utils::time::local_date;
use chrono::{NaiveDate, Utc};
use std::collections::VecDeque;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Commands that can be sent to the pulse actor
pub enum PulseCommand {
    Dispatch(PulseMsg),
    CreateEvent(EventDraft, mpsc::Sender<PulseResult<Event>>),
    UpdateEvent(String, EventDraft, mpsc::Sender<PulseResult<Event>>),
    DeleteEvent(String, mpsc::Sender<PulseResult<()>>),
    ToggleImportant(String, mpsc::Sender<PulseResult<bool>>),
    OpenDeepLink(String, mpsc::Sender<PulseResult<()>>),
    Snapshot(mpsc::Sender<PulseState>),
    LastRefresh(mpsc::Sender<Option<RefreshOutcome>>),
    Shutdown,
}

/// Owns the state record and runs every transition and effect in order
pub struct PulseActor {
    state: PulseState,
    services: PulseServices,
    tracker: ReminderTracker,
    last_refresh: Option<RefreshOutcome>,
    command_rx: mpsc::Receiver<PulseCommand>,
    /// Weak so the actor stops once every handle is gone
    command_tx: mpsc::WeakSender<PulseCommand>,
    ticker: Option<JoinHandle<()>>,
    observer: Option<JoinHandle<()>>,
}

impl PulseActor {
    /// Create a new actor and the sender feeding it
    pub fn new(
        services: PulseServices,
        settings: RefreshSettings,
        today: NaiveDate,
    ) -> (Self, mpsc::Sender<PulseCommand>) {
        let (command_tx, command_rx) = mpsc::channel(32);
        let state = PulseState::new(
            settings,
            services.events.has_read_access(),
            services.flags.all(),
            today,
        );

        let actor = Self {
            state,
            services,
            tracker: ReminderTracker::new(),
            last_refresh: None,
            command_rx,
            command_tx: command_tx.downgrade(),
            ticker: None,
            observer: None,
        };
        (actor, command_tx)
    }

    /// Start the actor's processing loop
    pub async fn run(&mut self) {
        info!("Pulse actor started");

        while let Some(cmd) = self.command_rx.recv().await {
            match cmd {
                PulseCommand::Dispatch(msg) => self.dispatch(msg).await,
                PulseCommand::CreateEvent(draft, response_tx) => {
                    let result = self.create_event(draft).await;
                    let _ = response_tx.send(result).await;
                }
                PulseCommand::UpdateEvent(id, draft, response_tx) => {
                    let result = self.update_event(&id, draft).await;
                    let _ = response_tx.send(result).await;
                }
                PulseCommand::DeleteEvent(id, response_tx) => {
                    let result = self.delete_event(&id).await;
                    let _ = response_tx.send(result).await;
                }
                PulseCommand::ToggleImportant(id, response_tx) => {
                    let result = self.toggle_important(&id).await;
                    let _ = response_tx.send(result).await;
                }
                PulseCommand::OpenDeepLink(url, response_tx) => {
                    let result = self.open_deep_link(&url).await;
                    let _ = response_tx.send(result).await;
                }
                PulseCommand::Snapshot(response_tx) => {
                    let _ = response_tx.send(self.state.clone()).await;
                }
                PulseCommand::LastRefresh(response_tx) => {
                    let _ = response_tx.send(self.last_refresh.clone()).await;
                }
                PulseCommand::Shutdown => {
                    info!("Pulse actor shutting down");
                    break;
                }
            }
        }

        self.stop_ticker();
        self.stop_observer();
        info!("Pulse actor shut down");
    }

    /// Run `msg` through the reducer and carry out the effects, including the
    /// ones produced by messages the effects themselves emit
    async fn dispatch(&mut self, msg: PulseMsg) {
        debug!("Dispatching {:?}", msg);
        let previous = self.state.status.clone();
        let mut queue: VecDeque<Effect> = update(&mut self.state, msg).into();
        while let Some(effect) = queue.pop_front() {
            if let Some(follow_up) = self.run_effect(effect).await {
                queue.extend(update(&mut self.state, follow_up));
            }
        }
        if self.state.status != previous {
            info!("Status: {}", self.state.status_message());
        }
    }

    async fn run_effect(&mut self, effect: Effect) -> Option<PulseMsg> {
        let now = Utc::now();
        let settings = &self.state.settings;
        let events = self.services.events.as_ref();

        match effect {
            Effect::RequestPermission => Some(PulseMsg::PermissionResolved(
                self.services
                    .events
                    .request_access()
                    .await
                    .map_err(|e| e.to_string()),
            )),
            Effect::RequestNotificationAccess => {
                match self.services.reminders.request_access().await {
                    Ok(granted) => info!("Notification access granted: {}", granted),
                    Err(e) => warn!("Notification access request failed: {}", e),
                }
                None
            }
            Effect::RefreshNext => {
                if !self.state.is_granted() {
                    return None;
                }
                let result = refresh_next_event(
                    &self.services,
                    &self.state.settings,
                    &mut self.tracker,
                    &self.state.important_ids,
                    now,
                )
                .await;
                match result {
                    Ok(outcome) => {
                        let next = outcome.next.clone();
                        self.last_refresh = Some(outcome);
                        Some(PulseMsg::NextEventLoaded(next))
                    }
                    Err(e) => {
                        error!("Failed to refresh the next event: {}", e);
                        Some(PulseMsg::RefreshFailed(e.to_string()))
                    }
                }
            }
            Effect::RefreshCalendars => Some(if self.state.is_granted() {
                loaded(events.fetch_writable_calendars().await.map(PulseMsg::CalendarsLoaded))
            } else {
                PulseMsg::CalendarsLoaded(Vec::new())
            }),
            Effect::RefreshDay => Some(if self.state.is_granted() {
                let result = queries::events_on(events, self.state.selected_date, settings.tz).await;
                loaded(result.map(PulseMsg::DayEventsLoaded))
            } else {
                PulseMsg::DayEventsLoaded(Vec::new())
            }),
            Effect::RefreshImportant => Some(if self.state.is_granted() {
                let result = queries::upcoming_events(events, now, settings.upcoming_days).await;
                loaded(result.map(PulseMsg::UpcomingLoaded))
            } else {
                PulseMsg::UpcomingLoaded(Vec::new())
            }),
            Effect::RefreshEventDays => Some(if self.state.is_granted() {
                let result = queries::event_days(
                    events,
                    local_date(now, settings.tz),
                    settings.marker_past_days,
                    settings.marker_future_days,
                    settings.tz,
                )
                .await;
                loaded(result.map(PulseMsg::EventDaysLoaded))
            } else {
                PulseMsg::EventDaysLoaded(Default::default())
            }),
            Effect::StartAutoRefresh => {
                if self.ticker.is_none() {
                    self.ticker = Some(spawn_ticker(
                        self.command_tx.clone(),
                        settings.refresh_interval,
                    ));
                }
                None
            }
            Effect::StopAutoRefresh => {
                self.stop_ticker();
                None
            }
            Effect::StartObserving => {
                if self.observer.is_none() {
                    self.observer = Some(spawn_observer(
                        self.services.events.subscribe_changes(),
                        self.command_tx.clone(),
                    ));
                }
                None
            }
            Effect::StopObserving => {
                self.stop_observer();
                None
            }
        }
    }

    fn stop_ticker(&mut self) {
        if let Some(task) = self.ticker.take() {
            task.abort();
            debug!("Auto refresh stopped");
        }
    }

    fn stop_observer(&mut self) {
        if let Some(task) = self.observer.take() {
            task.abort();
            debug!("Stopped observing the event store");
        }
    }

    /// Mutations need granted permission; otherwise the status says so and nothing is touched
    async fn ensure_permission(&mut self) -> PulseResult<()> {
        let denied = match &self.state.permission {
            PermissionState::Granted => return Ok(()),
            PermissionState::Denied => Error::PermissionDenied,
            PermissionState::Unknown | PermissionState::Failed(_) => Error::PermissionUnknown,
        };
        self.dispatch(PulseMsg::PermissionRequired).await;
        Err(denied)
    }

    async fn create_event(&mut self, draft: EventDraft) -> PulseResult<Event> {
        self.ensure_permission().await?;
        match self.services.events.create_event(draft).await {
            Ok(event) => {
                info!("Created event {} ({})", event.id, event.title);
                self.dispatch(PulseMsg::EventSaved).await;
                Ok(event)
            }
            Err(e) => {
                self.mutation_failed(Mutation::Save, &e).await;
                Err(e)
            }
        }
    }

    async fn update_event(&mut self, id: &str, draft: EventDraft) -> PulseResult<Event> {
        self.ensure_permission().await?;
        match self.services.events.update_event(id, draft).await {
            Ok(event) => {
                info!("Updated event {}", event.id);
                self.dispatch(PulseMsg::EventSaved).await;
                Ok(event)
            }
            Err(e) => {
                self.mutation_failed(Mutation::Update, &e).await;
                Err(e)
            }
        }
    }

    async fn delete_event(&mut self, id: &str) -> PulseResult<()> {
        self.ensure_permission().await?;
        if let Err(e) = self.services.events.delete_event(id).await {
            self.mutation_failed(Mutation::Delete, &e).await;
            return Err(e);
        }

        info!("Deleted event {}", id);
        if let Err(e) = self.services.flags.remove(id) {
            warn!("Failed to forget importance flag of {}: {}", id, e);
        }
        self.dispatch(PulseMsg::EventDeleted {
            event_id: id.to_string(),
        })
        .await;
        Ok(())
    }

    async fn mutation_failed(&mut self, mutation: Mutation, e: &Error) {
        warn!("{:?} failed: {}", mutation, e);
        self.dispatch(PulseMsg::MutationFailed {
            mutation,
            message: e.to_string(),
        })
        .await;
    }

    async fn toggle_important(&mut self, id: &str) -> PulseResult<bool> {
        let important = self.services.flags.toggle(id)?;
        debug!("Event {} important: {}", id, important);
        self.dispatch(PulseMsg::ImportantToggled {
            event_id: id.to_string(),
            important,
        })
        .await;
        Ok(important)
    }

    async fn open_deep_link(&mut self, url: &str) -> PulseResult<()> {
        deep_link::parse(url)?;
        let today = local_date(Utc::now(), self.state.settings.tz);
        self.dispatch(PulseMsg::DeepLinkOpened { today }).await;
        Ok(())
    }
}

/// Message for a finished list load; a failed load only changes the status
fn loaded(result: PulseResult<PulseMsg>) -> PulseMsg {
    match result {
        Ok(msg) => msg,
        Err(e) => {
            error!("Failed to refresh events: {}", e);
            PulseMsg::RefreshFailed(e.to_string())
        }
    }
}
