//! Transaction state machine.
//!
//! The machine owns the open transaction (selected slot, balance, confirmation
//! flag) and drives the ledger and slot inventory through a purchase:
//! confirm, select, pay, then either dispense with change or refund.
//! Also supports an async stream of commands.

use tokio_stream::{Stream, StreamExt};
use tracing::{info, warn};

use crate::Amount;
use crate::config::{ConfigError, MachineConfig};
use crate::ledger::{DenominationLedger, LedgerError};
use crate::model::{Channel, Command, Instrument, Item, SlotId};
use crate::payment::ChannelValidator;
use crate::slot::{Slot, SlotInventory};

mod state;
pub use state::{MachineState, MachineStats, Refund, Transaction, Vend};

mod error;
pub use error::{DispenseError, MachineError, SelectionError};

mod events;
pub use events::{EventSink, LogSink, Notification, RecordingSink};

/// A single-customer vending machine.
///
/// Holds the change ledger and the slot array across transactions, and at
/// most one open transaction at a time.
pub struct VendingMachine<S: EventSink = LogSink> {
    state: MachineState,
    transaction: Transaction,
    ledger: DenominationLedger,
    slots: SlotInventory,
    coin_slot: ChannelValidator,
    note_slot: ChannelValidator,
    card_reader: ChannelValidator,
    sales_total: Amount,
    sink: S,
}

impl VendingMachine<LogSink> {
    pub fn new(config: &MachineConfig) -> Result<Self, ConfigError> {
        Self::with_sink(config, LogSink)
    }
}

/// Public API
impl<S: EventSink> VendingMachine<S> {
    pub fn with_sink(config: &MachineConfig, sink: S) -> Result<Self, ConfigError> {
        config.validate()?;

        let coin_slot = ChannelValidator::coins(config.coins.iter().copied());
        let note_slot = ChannelValidator::notes(config.notes.iter().copied());

        let mut ledger =
            DenominationLedger::new(coin_slot.denominations().chain(note_slot.denominations()));
        for entry in &config.float {
            if let Some(denomination) = entry.denomination() {
                ledger
                    .add(denomination, entry.count)
                    .map_err(|e| ConfigError::Invalid(e.to_string()))?;
            }
        }

        let mut slots = SlotInventory::new(
            config
                .slots
                .iter()
                .map(|slot| Slot::new(slot.capacity))
                .collect(),
        );
        for (index, slot) in config.slots.iter().enumerate() {
            if let Some(item) = &slot.item {
                slots
                    .load(SlotId(index), item.clone(), slot.quantity)
                    .map_err(|e| ConfigError::Invalid(e.to_string()))?;
            }
        }

        Ok(Self {
            state: MachineState::Idle,
            transaction: Transaction::default(),
            ledger,
            slots,
            coin_slot,
            note_slot,
            card_reader: ChannelValidator::card(),
            sales_total: Amount::ZERO,
            sink,
        })
    }

    /// Run the machine with the given command stream
    pub async fn run(&mut self, mut stream: impl Stream<Item = Command> + Unpin) {
        while let Some(command) = stream.next().await {
            // a rejected command leaves the machine consistent, so keep going
            let _ = self.apply(command);
        }
    }

    /// Apply a single command on top of the current machine state
    pub fn apply(&mut self, command: Command) -> Result<(), MachineError> {
        let result = match &command {
            Command::Confirm => self.confirm(),
            Command::Select(slot) => self.select(*slot).map(|_| ()),
            Command::Insert {
                channel,
                instrument,
            } => self.insert_money(*channel, instrument.clone()).map(|_| ()),
            Command::Dispense => self.dispense().map(|_| ()),
            Command::Cancel => {
                self.cancel();
                Ok(())
            }
            Command::Reset => {
                self.reset();
                Ok(())
            }
            Command::Restock { slot, quantity } => self.restock(*slot, *quantity),
            Command::Float {
                denomination,
                count,
            } => self
                .ledger
                .add(*denomination, *count)
                .map_err(MachineError::from),
            Command::SetInService(in_service) => {
                self.set_in_service(*in_service);
                Ok(())
            }
        };
        Self::log_result(&command, &result);
        result
    }

    pub fn state(&self) -> MachineState {
        self.state
    }

    pub fn balance(&self) -> Amount {
        self.transaction.balance
    }

    pub fn sales_total(&self) -> Amount {
        self.sales_total
    }

    pub fn selected_slot(&self) -> Option<SlotId> {
        self.transaction.selected
    }

    pub fn transaction(&self) -> &Transaction {
        &self.transaction
    }

    pub fn ledger(&self) -> &DenominationLedger {
        &self.ledger
    }

    /// Direct access to the change stock, for operators topping up the float.
    pub fn ledger_mut(&mut self) -> &mut DenominationLedger {
        &mut self.ledger
    }

    pub fn slots(&self) -> &SlotInventory {
        &self.slots
    }

    pub fn validator(&self, channel: Channel) -> &ChannelValidator {
        match channel {
            Channel::Coin => &self.coin_slot,
            Channel::Note => &self.note_slot,
            Channel::Card => &self.card_reader,
        }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn stats(&self) -> MachineStats {
        MachineStats {
            state: self.state,
            balance: self.transaction.balance,
            sales_total: self.sales_total,
            ledger_value: self.ledger.total_value(),
        }
    }

    /// Take the machine out of service, or bring it back.
    pub fn set_in_service(&mut self, in_service: bool) {
        let state = match (in_service, self.transaction.selected) {
            (false, _) => MachineState::OutOfService,
            (true, Some(_)) => MachineState::ProcessingSelection,
            (true, None) => MachineState::Idle,
        };
        self.set_state(state);
    }

    /// Load a slot with an item. Operator action, allowed in any state.
    pub fn stock_slot(&mut self, slot: SlotId, item: Item, quantity: u32) -> Result<(), MachineError> {
        self.slots.load(slot, item, quantity)?;
        Ok(())
    }

    pub fn restock(&mut self, slot: SlotId, quantity: u32) -> Result<(), MachineError> {
        self.slots.restock(slot, quantity)?;
        Ok(())
    }

    /// Confirm the next selection.
    pub fn confirm(&mut self) -> Result<(), MachineError> {
        self.ensure_in_service()?;
        self.transaction.confirmed = true;
        Ok(())
    }

    /// Open a transaction on `slot`:
    /// - Ensure the slot exists
    /// - Ensure the request was confirmed
    /// - Ensure the slot has items
    /// - Record the selection and consume the confirmation
    pub fn select(&mut self, slot: SlotId) -> Result<Item, MachineError> {
        self.ensure_in_service()?;

        let selected = self.slots.get(slot)?;
        if !self.transaction.confirmed {
            return Err(SelectionError::NotConfirmed.into());
        }
        let item = match selected.item() {
            Some(item) if !selected.is_empty() => item.clone(),
            _ => return Err(SelectionError::SlotSoldOut(slot).into()),
        };

        self.transaction.selected = Some(slot);
        self.transaction.confirmed = false;
        self.set_state(MachineState::ProcessingSelection);
        self.notify(Notification::ItemSelected {
            slot,
            item: item.clone(),
        });

        Ok(item)
    }

    /// Present `instrument` to `channel`:
    /// - Validate it against the channel before touching any state
    /// - Ensure the balance can take its worth
    /// - Stock cash in the ledger (cards carry no stock)
    /// - Add its worth to the balance
    ///
    /// Returns the new balance. Never changes the machine state.
    pub fn insert_money(
        &mut self,
        channel: Channel,
        instrument: Instrument,
    ) -> Result<Amount, MachineError> {
        self.ensure_in_service()?;
        self.validator(channel).validate(&instrument)?;

        let worth = instrument.worth();
        let balance = self.transaction.balance.checked_add(worth).ok_or(
            MachineError::BalanceOverflow {
                balance: self.transaction.balance,
                worth,
            },
        )?;
        if let Some(denomination) = instrument.denomination() {
            self.ledger.add(denomination, 1)?;
        }

        self.transaction.balance = balance;
        self.notify(Notification::BalanceUpdated(balance));
        Ok(balance)
    }

    /// Release the selected item:
    /// - Ensure there is a confirmed selection that still has items
    /// - Ensure the balance covers the price
    /// - Make change for the difference, or refund everything if it can't be made
    pub fn dispense(&mut self) -> Result<Vend, MachineError> {
        self.ensure_in_service()?;

        let slot = self
            .transaction
            .selected
            .ok_or(DispenseError::NotConfirmed)?;
        let selected = self.slots.get(slot)?;
        let item = match selected.item() {
            Some(item) if !selected.is_empty() => item.clone(),
            _ => return Err(DispenseError::SlotSoldOut(slot).into()),
        };

        let balance = self.transaction.balance;
        if balance < item.price {
            return Err(DispenseError::ItemNotFullyPaid {
                price: item.price,
                balance,
            }
            .into());
        }

        match self.ledger.compute_change(balance - item.price) {
            Ok(change) => {
                self.slots.dispense_one(slot)?;
                self.ledger.apply_change(&change);
                self.sales_total = self.sales_total.saturating_add(item.price);
                self.transaction.clear();

                self.notify(Notification::ChangeDispensed(change.clone()));
                self.notify(Notification::BalanceUpdated(Amount::ZERO));
                self.set_state(MachineState::Dispensing);

                Ok(Vend::Dispensed { item, change })
            }
            Err(e @ LedgerError::InsufficientChange { .. }) => {
                info!(slot = %slot, balance = %balance, reason = %e, "refunding instead of dispensing");
                Ok(Vend::Refunded(self.refund()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Abort the transaction and hand back the whole balance. With nothing
    /// paid in, the refund is empty.
    pub fn cancel(&mut self) -> Refund {
        self.refund()
    }

    /// Back to factory state: empty slots, empty ledger, no transaction.
    pub fn reset(&mut self) {
        self.slots.clear();
        self.ledger.clear();
        self.transaction.clear();
        self.sales_total = Amount::ZERO;
        self.set_state(MachineState::Idle);
    }
}

/// Private API
impl<S: EventSink> VendingMachine<S> {
    /// Small helper to log `apply` results
    fn log_result(command: &Command, result: &Result<(), MachineError>) {
        let name = command.name();
        match result {
            Ok(()) => info!(command = ?command, "{name} applied"),
            Err(e) => info!(command = ?command, reason = %e, "{name} skipped"),
        }
    }

    fn ensure_in_service(&self) -> Result<(), MachineError> {
        if self.state == MachineState::OutOfService {
            return Err(MachineError::OutOfService);
        }
        Ok(())
    }

    fn set_state(&mut self, state: MachineState) {
        self.state = state;
        self.notify(Notification::StateChanged(state));
    }

    fn notify(&mut self, notification: Notification) {
        self.sink.notify(&notification);
    }

    /// Return the whole balance as change. When the ledger cannot cover it,
    /// hand back what it can and take the machine out of service.
    fn refund(&mut self) -> Refund {
        let out_of_service = self.state == MachineState::OutOfService;
        self.set_state(MachineState::Refunding);

        let balance = self.transaction.balance;
        let refund = match self.ledger.compute_change(balance) {
            Ok(change) => Refund {
                change,
                shortfall: Amount::ZERO,
            },
            Err(e) => {
                let (change, shortfall) = self.ledger.compute_partial_change(balance);
                warn!(
                    balance = %balance,
                    shortfall = %shortfall,
                    reason = %e,
                    "ledger cannot cover refund"
                );
                Refund { change, shortfall }
            }
        };

        self.ledger.apply_change(&refund.change);
        self.transaction.clear();

        self.notify(Notification::RefundIssued(refund.clone()));
        self.notify(Notification::BalanceUpdated(Amount::ZERO));
        if out_of_service || !refund.is_complete() {
            self.set_state(MachineState::OutOfService);
        }

        refund
    }
}
