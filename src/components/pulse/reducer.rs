//! State transitions of the orchestrator
//!
//! [`update`] never touches a service. It mutates the state and returns the
//! effects the actor has to carry out; effects that load data come back as
//! further messages.

use super::state::{PermissionState, PulseState, Status};
use crate::components::calendar::{CalendarListItem, Event};
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::BTreeSet;

/// Which mutation a failure belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutation {
    Save,
    Update,
    Delete,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PulseMsg {
    Initialized,
    Appeared,
    Disappeared,
    BecameActive,
    EnteredBackground,
    /// Outcome of a permission request; `Err` carries the failure text
    PermissionResolved(Result<bool, String>),
    TimerTick,
    StoreChanged { at: DateTime<Utc> },
    DateSelected(NaiveDate),
    DeepLinkOpened { today: NaiveDate },
    NextEventLoaded(Option<Event>),
    DayEventsLoaded(Vec<Event>),
    /// Upcoming events; only the important ones are kept
    UpcomingLoaded(Vec<Event>),
    EventDaysLoaded(BTreeSet<NaiveDate>),
    CalendarsLoaded(Vec<CalendarListItem>),
    ImportantToggled { event_id: String, important: bool },
    EventSaved,
    EventDeleted { event_id: String },
    MutationFailed { mutation: Mutation, message: String },
    PermissionRequired,
    RefreshFailed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Effect {
    RequestPermission,
    RequestNotificationAccess,
    RefreshNext,
    RefreshCalendars,
    RefreshDay,
    RefreshImportant,
    RefreshEventDays,
    StartAutoRefresh,
    StopAutoRefresh,
    StartObserving,
    StopObserving,
}

const LISTS: [Effect; 3] = [Effect::RefreshDay, Effect::RefreshImportant, Effect::RefreshEventDays];

fn full_refresh() -> Vec<Effect> {
    let mut effects = vec![Effect::RefreshCalendars, Effect::RefreshNext];
    effects.extend(LISTS);
    effects
}

fn after_mutation() -> Vec<Effect> {
    let mut effects = vec![Effect::RefreshNext];
    effects.extend(LISTS);
    effects
}

fn start_background(state: &mut PulseState, effects: &mut Vec<Effect>) {
    if !state.auto_refresh {
        state.auto_refresh = true;
        effects.push(Effect::StartAutoRefresh);
    }
    if !state.observing {
        state.observing = true;
        effects.push(Effect::StartObserving);
    }
}

fn stop_background(state: &mut PulseState) -> Vec<Effect> {
    let mut effects = Vec::new();
    if state.auto_refresh {
        state.auto_refresh = false;
        effects.push(Effect::StopAutoRefresh);
    }
    state.refresh_tick = 0;
    if state.observing {
        state.observing = false;
        effects.push(Effect::StopObserving);
    }
    effects
}

/// Apply `msg` to `state` and return the effects to run, in order
pub fn update(state: &mut PulseState, msg: PulseMsg) -> Vec<Effect> {
    match msg {
        PulseMsg::Initialized => {
            if state.is_granted() {
                let mut effects = vec![Effect::RefreshCalendars];
                effects.extend(LISTS);
                effects
            } else {
                Vec::new()
            }
        }

        PulseMsg::Appeared => match state.permission {
            PermissionState::Granted => {
                let mut effects = full_refresh();
                start_background(state, &mut effects);
                effects
            }
            PermissionState::Unknown if !state.did_request_initial_permission => {
                state.did_request_initial_permission = true;
                vec![Effect::RequestPermission]
            }
            _ => Vec::new(),
        },

        PulseMsg::BecameActive => {
            if !state.is_granted() {
                return Vec::new();
            }
            let mut effects = full_refresh();
            start_background(state, &mut effects);
            effects
        }

        PulseMsg::Disappeared | PulseMsg::EnteredBackground => stop_background(state),

        PulseMsg::PermissionResolved(Ok(true)) => {
            state.permission = PermissionState::Granted;
            state.status = Status::PermissionGranted;
            let mut effects = vec![Effect::RequestNotificationAccess];
            effects.extend(full_refresh());
            start_background(state, &mut effects);
            effects
        }

        PulseMsg::PermissionResolved(Ok(false)) => {
            state.permission = PermissionState::Denied;
            state.status = Status::PermissionDenied;
            state.day_events.clear();
            state.important_upcoming.clear();
            state.event_days.clear();
            stop_background(state)
        }

        PulseMsg::PermissionResolved(Err(message)) => {
            state.status = Status::PermissionRequestFailed(message.clone());
            state.permission = PermissionState::Failed(message);
            Vec::new()
        }

        PulseMsg::TimerTick => {
            // A tick that raced with stopping the timer
            if !state.auto_refresh {
                return Vec::new();
            }
            state.refresh_tick += 1;
            let mut effects = vec![Effect::RefreshNext];
            if state.refresh_tick % state.settings.full_refresh_every_ticks.max(1) == 0 {
                effects.extend(LISTS);
            }
            effects
        }

        PulseMsg::StoreChanged { at } => {
            if !state.observing {
                return Vec::new();
            }
            let due = state
                .last_store_change
                .map_or(true, |last| at - last > state.settings.debounce);
            if !due {
                return Vec::new();
            }
            state.last_store_change = Some(at);
            vec![
                Effect::RefreshNext,
                Effect::RefreshCalendars,
                Effect::RefreshDay,
                Effect::RefreshImportant,
                Effect::RefreshEventDays,
            ]
        }

        PulseMsg::DateSelected(date) | PulseMsg::DeepLinkOpened { today: date } => {
            state.selected_date = date;
            vec![Effect::RefreshDay]
        }

        PulseMsg::NextEventLoaded(next) => {
            state.status = if next.is_some() {
                Status::NextEvent
            } else {
                Status::NoUpcomingEvent
            };
            state.next_event = next;
            Vec::new()
        }

        PulseMsg::DayEventsLoaded(events) => {
            state.day_events = if state.is_granted() { events } else { Vec::new() };
            Vec::new()
        }

        PulseMsg::UpcomingLoaded(events) => {
            state.important_upcoming = if state.is_granted() {
                events.into_iter().filter(|e| state.important_ids.contains(&e.id)).collect()
            } else {
                Vec::new()
            };
            Vec::new()
        }

        PulseMsg::EventDaysLoaded(days) => {
            state.event_days = if state.is_granted() { days } else { BTreeSet::new() };
            Vec::new()
        }

        PulseMsg::CalendarsLoaded(calendars) => {
            state.calendars = if state.is_granted() { calendars } else { Vec::new() };
            Vec::new()
        }

        PulseMsg::ImportantToggled { event_id, important } => {
            let is_next = state.next_event.as_ref().is_some_and(|e| e.id == event_id);
            if important {
                state.important_ids.insert(event_id);
            } else {
                state.important_ids.remove(&event_id);
            }

            let mut effects = Vec::new();
            if is_next {
                effects.push(Effect::RefreshNext);
            }
            effects.push(Effect::RefreshImportant);
            effects
        }

        PulseMsg::EventSaved => {
            state.status = Status::NextEvent;
            after_mutation()
        }

        PulseMsg::EventDeleted { event_id } => {
            state.important_ids.remove(&event_id);
            state.status = Status::EventDeleted;
            after_mutation()
        }

        PulseMsg::MutationFailed { mutation, message } => {
            state.status = match mutation {
                Mutation::Save => Status::SaveFailed(message),
                Mutation::Update => Status::UpdateFailed(message),
                Mutation::Delete => Status::DeleteFailed(message),
            };
            Vec::new()
        }

        PulseMsg::PermissionRequired => {
            state.status = Status::PermissionRequired;
            Vec::new()
        }

        PulseMsg::RefreshFailed(message) => {
            state.status = Status::RefreshFailed(message);
            Vec::new()
        }
    }
}
