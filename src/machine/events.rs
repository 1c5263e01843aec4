//! Notifications the machine emits as it moves through a transaction.
//!
//! The machine calls its [`EventSink`] synchronously, in order, for every
//! state change, balance update, selection, change breakdown and refund.
//! Rendering those to a display is up to the sink.

use tracing::{info, warn};

use super::state::{MachineState, Refund};
use crate::Amount;
use crate::ledger::Change;
use crate::model::{Item, SlotId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    StateChanged(MachineState),
    BalanceUpdated(Amount),
    ItemSelected { slot: SlotId, item: Item },
    ChangeDispensed(Change),
    RefundIssued(Refund),
}

/// Receiver of machine notifications.
pub trait EventSink {
    fn notify(&mut self, notification: &Notification);
}

/// Sink that writes every notification to the `tracing` log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl EventSink for LogSink {
    fn notify(&mut self, notification: &Notification) {
        match notification {
            Notification::StateChanged(state) => info!(state = %state, "state changed"),
            Notification::BalanceUpdated(balance) => info!(balance = %balance, "balance updated"),
            Notification::ItemSelected { slot, item } => {
                info!(slot = %slot, item = %item.name, price = %item.price, "item selected")
            }
            Notification::ChangeDispensed(change) if change.is_empty() => {
                info!("no change due")
            }
            Notification::ChangeDispensed(change) => {
                for (denomination, count) in change.iter() {
                    info!(denomination = %denomination, count, "change dispensed");
                }
            }
            Notification::RefundIssued(refund) if !refund.is_complete() => {
                warn!(
                    refunded = %refund.change.total(),
                    shortfall = %refund.shortfall,
                    "partial refund"
                )
            }
            Notification::RefundIssued(refund) => {
                info!(refunded = %refund.change.total(), "refund issued")
            }
        }
    }
}

/// Sink that keeps every notification in memory.
#[derive(Debug, Default, Clone)]
pub struct RecordingSink {
    notifications: Vec<Notification>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notifications(&self) -> &[Notification] {
        &self.notifications
    }

    /// Drain recorded notifications.
    pub fn take(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.notifications)
    }
}

impl EventSink for RecordingSink {
    fn notify(&mut self, notification: &Notification) {
        self.notifications.push(notification.clone());
    }
}
