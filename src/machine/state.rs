use std::fmt;

use crate::Amount;
use crate::ledger::Change;
use crate::model::{Item, SlotId};

/// Operating state of the machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MachineState {
    OutOfService,
    #[default]
    Idle,
    ProcessingSelection,
    Dispensing,
    Refunding,
}

impl fmt::Display for MachineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let description = match self {
            MachineState::OutOfService => "out of service",
            MachineState::Idle => "idle, waiting for customer",
            MachineState::ProcessingSelection => "processing customer selection",
            MachineState::Dispensing => "dispensing item and change",
            MachineState::Refunding => "refunding customer money",
        };
        f.write_str(description)
    }
}

/// The purchase attempt in progress.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transaction {
    pub selected: Option<SlotId>,
    pub balance: Amount,
    pub confirmed: bool,
}

impl Transaction {
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// Money handed back to the customer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Refund {
    pub change: Change,
    /// Part of the balance the ledger could not cover
    pub shortfall: Amount,
}

impl Refund {
    pub fn is_complete(&self) -> bool {
        self.shortfall.is_zero()
    }
}

/// Outcome of a dispense request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Vend {
    /// The item was released together with any change owed.
    Dispensed { item: Item, change: Change },
    /// Change could not be made; the whole balance was refunded instead.
    Refunded(Refund),
}

impl Vend {
    pub fn item(&self) -> Option<&Item> {
        match self {
            Vend::Dispensed { item, .. } => Some(item),
            Vend::Refunded(_) => None,
        }
    }

    /// Money returned to the customer, whichever way the vend went.
    pub fn change(&self) -> &Change {
        match self {
            Vend::Dispensed { change, .. } => change,
            Vend::Refunded(refund) => &refund.change,
        }
    }
}

/// Point-in-time figures for an operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MachineStats {
    pub state: MachineState,
    pub balance: Amount,
    pub sales_total: Amount,
    pub ledger_value: Amount,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Denomination;

    #[test]
    fn machine_state_default() {
        assert_eq!(MachineState::default(), MachineState::Idle);
    }

    #[test]
    fn transaction_clear_resets_everything() {
        let mut tx = Transaction {
            selected: Some(SlotId(2)),
            balance: Amount::from_cents(30),
            confirmed: true,
        };
        tx.clear();
        assert_eq!(tx, Transaction::default());
    }

    #[test]
    fn vend_accessors() {
        let change: Change = [(Denomination::Coin(Amount::from_cents(10)), 1)]
            .into_iter()
            .collect();
        let refunded = Vend::Refunded(Refund {
            change: change.clone(),
            shortfall: Amount::ZERO,
        });
        assert_eq!(refunded.item(), None);
        assert_eq!(refunded.change(), &change);

        let item = Item::new("Donut", Amount::from_cents(125));
        let dispensed = Vend::Dispensed {
            item: item.clone(),
            change: Change::new(),
        };
        assert_eq!(dispensed.item(), Some(&item));
        assert!(dispensed.change().is_empty());
    }
}
