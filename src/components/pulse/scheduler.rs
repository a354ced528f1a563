use super::actor::PulseCommand;
use super::reducer::PulseMsg;
use chrono::Utc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Deliver `msg` unless the actor has stopped; false once it is gone
async fn forward(command_tx: &mpsc::WeakSender<PulseCommand>, msg: PulseMsg) -> bool {
    let Some(sender) = command_tx.upgrade() else {
        return false;
    };
    sender.send(PulseCommand::Dispatch(msg)).await.is_ok()
}

/// Send a `TimerTick` every `period`, first one after a full period
pub fn spawn_ticker(command_tx: mpsc::WeakSender<PulseCommand>, period: Duration) -> JoinHandle<()> {
    info!("Auto refresh every {}s", period.as_secs());
    tokio::spawn(async move {
        let mut interval = interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            if !forward(&command_tx, PulseMsg::TimerTick).await {
                debug!("Pulse actor gone, stopping ticker");
                break;
            }
        }
    })
}

/// Forward event store change notifications as `StoreChanged` messages
pub fn spawn_observer(
    mut changes: broadcast::Receiver<()>,
    command_tx: mpsc::WeakSender<PulseCommand>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match changes.recv().await {
                Ok(()) => {}
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!("Missed {} event store notifications", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
            if !forward(&command_tx, PulseMsg::StoreChanged { at: Utc::now() }).await {
                break;
            }
        }
        debug!("Event store observer stopped");
    })
}
