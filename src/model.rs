//! Core domain types for the vending machine.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::Amount;

/// Index of a slot in the machine's slot array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SlotId(pub usize);

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Payment channel an instrument is presented through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Coin,
    Note,
    Card,
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Channel::Coin => "coin",
            Channel::Note => "note",
            Channel::Card => "card",
        };
        f.write_str(name)
    }
}

/// A unit of physical currency the machine can hold as change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Denomination {
    Coin(Amount),
    Note(Amount),
}

impl Denomination {
    pub fn worth(&self) -> Amount {
        match self {
            Denomination::Coin(worth) | Denomination::Note(worth) => *worth,
        }
    }

    pub fn channel(&self) -> Channel {
        match self {
            Denomination::Coin(_) => Channel::Coin,
            Denomination::Note(_) => Channel::Note,
        }
    }
}

impl fmt::Display for Denomination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.worth(), self.channel())
    }
}

/// A card presented to the card reader. It authorises a fixed worth and is
/// never stocked as change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Card {
    pub number: String,
    pub brand: String,
    pub worth: Amount,
}

impl Card {
    pub fn new(number: impl Into<String>, brand: impl Into<String>, worth: Amount) -> Self {
        Self {
            number: number.into(),
            brand: brand.into(),
            worth,
        }
    }
}

/// A payment instrument handed to the machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instrument {
    Coin(Amount),
    Note(Amount),
    Card(Card),
}

impl Instrument {
    pub fn worth(&self) -> Amount {
        match self {
            Instrument::Coin(worth) | Instrument::Note(worth) => *worth,
            Instrument::Card(card) => card.worth,
        }
    }

    pub fn channel(&self) -> Channel {
        match self {
            Instrument::Coin(_) => Channel::Coin,
            Instrument::Note(_) => Channel::Note,
            Instrument::Card(_) => Channel::Card,
        }
    }

    /// The stockable denomination behind this instrument, `None` for cards.
    pub fn denomination(&self) -> Option<Denomination> {
        match self {
            Instrument::Coin(worth) => Some(Denomination::Coin(*worth)),
            Instrument::Note(worth) => Some(Denomination::Note(*worth)),
            Instrument::Card(_) => None,
        }
    }
}

/// A product sold from a slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub name: String,
    pub price: Amount,
}

impl Item {
    pub fn new(name: impl Into<String>, price: Amount) -> Self {
        Self {
            name: name.into(),
            price,
        }
    }
}

/// An input the machine reacts to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Press the confirm button.
    Confirm,
    /// Choose a slot; only accepted after `Confirm`.
    Select(SlotId),
    /// Present a payment instrument to a channel.
    Insert {
        channel: Channel,
        instrument: Instrument,
    },
    /// Ask for the selected item.
    Dispense,
    /// Abort and get the balance back.
    Cancel,
    /// Return to factory state: empty slots, empty ledger.
    Reset,
    /// Operator adds items to a slot.
    Restock { slot: SlotId, quantity: u32 },
    /// Operator adds change to the ledger.
    Float {
        denomination: Denomination,
        count: u32,
    },
    /// Operator takes the machine out of (or back into) service.
    SetInService(bool),
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::Confirm => "confirm",
            Command::Select(_) => "select",
            Command::Insert { .. } => "insert",
            Command::Dispense => "dispense",
            Command::Cancel => "cancel",
            Command::Reset => "reset",
            Command::Restock { .. } => "restock",
            Command::Float { .. } => "float",
            Command::SetInService(_) => "service",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instrument_channels() {
        assert_eq!(Instrument::Coin(Amount::from_cents(10)).channel(), Channel::Coin);
        assert_eq!(Instrument::Note(Amount::from_units(20)).channel(), Channel::Note);
        let card = Card::new("4002123456789900", "VISA", Amount::from_units(1));
        assert_eq!(Instrument::Card(card).channel(), Channel::Card);
    }

    #[test]
    fn cards_have_no_denomination() {
        let card = Card::new("4002123456789900", "VISA", Amount::from_units(1));
        let instrument = Instrument::Card(card);
        assert_eq!(instrument.worth(), Amount::from_units(1));
        assert_eq!(instrument.denomination(), None);
    }

    #[test]
    fn cash_maps_to_denomination() {
        let coin = Instrument::Coin(Amount::from_cents(25));
        assert_eq!(
            coin.denomination(),
            Some(Denomination::Coin(Amount::from_cents(25)))
        );
    }

    #[test]
    fn same_worth_different_channel_are_distinct() {
        let coin = Denomination::Coin(Amount::from_units(1));
        let note = Denomination::Note(Amount::from_units(1));
        assert_ne!(coin, note);
        assert_eq!(coin.worth(), note.worth());
    }

    #[test]
    fn denomination_display() {
        assert_eq!(Denomination::Coin(Amount::from_cents(10)).to_string(), "0.10 coin");
        assert_eq!(SlotId(3).to_string(), "#3");
    }
}
