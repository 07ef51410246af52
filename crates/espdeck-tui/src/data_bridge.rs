//! Data bridge: connects [`Controller`] subscriptions to TUI actions.
//!
//! Starts the poll loop, pushes the current snapshots, then forwards every
//! change and notice as an [`Action`] until cancelled. Cancellation shuts
//! the controller down.

use tokio::sync::broadcast::error::RecvError;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use espdeck_core::{Controller, Notice};

use crate::action::{Action, Notification, NotificationLevel};

fn notice_action(notice: Notice) -> Action {
    match notice {
        Notice::RestartAcknowledged { message } => Action::RestartAcknowledged(message),
        Notice::Diagnostic { operation, message } => Action::Diagnostic { operation, message },
    }
}

pub async fn run_data_bridge(
    controller: Controller,
    action_tx: mpsc::UnboundedSender<Action>,
    cancel: CancellationToken,
) {
    let mut devices = controller.devices();
    let mut logs = controller.logs();
    let mut status = controller.status_watch();
    let mut loading = controller.loading();
    let mut notices = controller.notices();

    let _ = action_tx.send(Action::LoadingChanged(*loading.borrow_and_update()));
    let _ = action_tx.send(Action::DevicesUpdated(devices.current().clone()));
    let _ = action_tx.send(Action::LogsUpdated(logs.current().clone()));
    if let Some(s) = status.borrow_and_update().clone() {
        let _ = action_tx.send(Action::StatusUpdated(s));
    }

    controller.start().await;

    loop {
        tokio::select! {
            biased;

            () = cancel.cancelled() => break,

            Some(d) = devices.changed() => {
                debug!(count = d.len(), "dispatching DevicesUpdated");
                let _ = action_tx.send(Action::DevicesUpdated(d));
            }
            Ok(()) = status.changed() => {
                let current = status.borrow_and_update().clone();
                if let Some(s) = current {
                    let _ = action_tx.send(Action::StatusUpdated(s));
                }
            }
            Some(l) = logs.changed() => {
                let _ = action_tx.send(Action::LogsUpdated(l));
            }
            Ok(()) = loading.changed() => {
                let value = *loading.borrow_and_update();
                let _ = action_tx.send(Action::LoadingChanged(value));
            }
            notice = notices.recv() => match notice {
                Ok(notice) => {
                    let _ = action_tx.send(notice_action(notice));
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "notice receiver lagged");
                    let _ = action_tx.send(Action::Notify(Notification {
                        message: format!("{skipped} notices dropped"),
                        level: NotificationLevel::Warning,
                    }));
                }
                Err(RecvError::Closed) => break,
            },
        }
    }

    controller.shutdown().await;
    debug!("data bridge shut down");
}
