pub mod amount;
pub mod config;
pub mod csv;
pub mod ledger;
pub mod machine;
pub mod model;
pub mod payment;
pub mod slot;

pub use amount::Amount;
pub use config::MachineConfig;
pub use ledger::{Change, DenominationLedger};
pub use machine::VendingMachine;
pub use model::{Channel, Command, Denomination, Instrument, Item, SlotId};
