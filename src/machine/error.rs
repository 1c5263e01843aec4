//! Error types for machine operations.

use thiserror::Error;

use crate::Amount;
use crate::ledger::LedgerError;
use crate::model::SlotId;
use crate::payment::PaymentError;
use crate::slot::SlotError;

/// Top-level error returned by [`VendingMachine`](super::VendingMachine) operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MachineError {
    #[error("machine is out of service")]
    OutOfService,

    #[error("payment rejected: {0}")]
    Payment(#[from] PaymentError),

    #[error("selection failed: {0}")]
    Selection(#[from] SelectionError),

    #[error("dispense failed: {0}")]
    Dispense(#[from] DispenseError),

    #[error("{0}")]
    Slot(#[from] SlotError),

    #[error("{0}")]
    Ledger(#[from] LedgerError),

    #[error("balance {balance} cannot take {worth} more")]
    BalanceOverflow { balance: Amount, worth: Amount },
}

/// Error while selecting a slot.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionError {
    #[error("request not confirmed")]
    NotConfirmed,
    #[error("slot {0} is sold out")]
    SlotSoldOut(SlotId),
}

/// Error while dispensing the selected item.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispenseError {
    #[error("no confirmed selection")]
    NotConfirmed,
    #[error("slot {0} is sold out")]
    SlotSoldOut(SlotId),
    #[error("item not fully paid: price {price}, balance {balance}")]
    ItemNotFullyPaid { price: Amount, balance: Amount },
}
