//! Payment channel validation.
//!
//! Each channel accepts exactly one kind of [`Instrument`]. Coin and note
//! channels additionally restrict the worths they take to an allow-list fixed
//! at construction.

use thiserror::Error;

use crate::Amount;
use crate::model::{Channel, Denomination, Instrument};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PaymentError {
    #[error("invalid entry: {found} inserted into the {expected} slot")]
    InvalidEntry { expected: Channel, found: Channel },
    #[error("invalid entry: card authorises no funds")]
    EmptyCard,
    #[error("unsupported denomination: {worth} {channel}s are not accepted")]
    UnsupportedDenomination { channel: Channel, worth: Amount },
}

/// Validator for a single payment channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelValidator {
    channel: Channel,
    accepted: Vec<Amount>,
}

impl ChannelValidator {
    pub fn coins(accepted: impl IntoIterator<Item = Amount>) -> Self {
        Self {
            channel: Channel::Coin,
            accepted: accepted.into_iter().collect(),
        }
    }

    pub fn notes(accepted: impl IntoIterator<Item = Amount>) -> Self {
        Self {
            channel: Channel::Note,
            accepted: accepted.into_iter().collect(),
        }
    }

    pub fn card() -> Self {
        Self {
            channel: Channel::Card,
            accepted: Vec::new(),
        }
    }

    pub fn channel(&self) -> Channel {
        self.channel
    }

    /// Denominations this channel takes in, empty for the card reader.
    pub fn denominations(&self) -> impl Iterator<Item = Denomination> + '_ {
        let channel = self.channel;
        self.accepted.iter().filter_map(move |worth| match channel {
            Channel::Coin => Some(Denomination::Coin(*worth)),
            Channel::Note => Some(Denomination::Note(*worth)),
            Channel::Card => None,
        })
    }

    pub fn validate(&self, instrument: &Instrument) -> Result<(), PaymentError> {
        if instrument.channel() != self.channel {
            return Err(PaymentError::InvalidEntry {
                expected: self.channel,
                found: instrument.channel(),
            });
        }

        match instrument {
            Instrument::Card(card) if !card.worth.is_positive() => Err(PaymentError::EmptyCard),
            Instrument::Card(_) => Ok(()),
            Instrument::Coin(worth) | Instrument::Note(worth) => {
                if self.accepted.contains(worth) {
                    Ok(())
                } else {
                    Err(PaymentError::UnsupportedDenomination {
                        channel: self.channel,
                        worth: *worth,
                    })
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Card;

    fn coin_slot() -> ChannelValidator {
        ChannelValidator::coins([10, 25, 50, 100].map(Amount::from_cents))
    }

    fn note_slot() -> ChannelValidator {
        ChannelValidator::notes([20, 50].map(Amount::from_units))
    }

    fn visa(units: i64) -> Instrument {
        Instrument::Card(Card::new("4002123456789900", "VISA", Amount::from_units(units)))
    }

    #[test]
    fn accepts_allowed_coin() {
        assert_eq!(coin_slot().validate(&Instrument::Coin(Amount::from_cents(25))), Ok(()));
    }

    #[test]
    fn rejects_note_in_coin_slot() {
        let result = coin_slot().validate(&Instrument::Note(Amount::from_units(20)));
        assert_eq!(
            result,
            Err(PaymentError::InvalidEntry {
                expected: Channel::Coin,
                found: Channel::Note,
            })
        );
    }

    #[test]
    fn rejects_unsupported_coin() {
        let result = coin_slot().validate(&Instrument::Coin(Amount::from_cents(5)));
        assert_eq!(
            result,
            Err(PaymentError::UnsupportedDenomination {
                channel: Channel::Coin,
                worth: Amount::from_cents(5),
            })
        );
    }

    #[test]
    fn rejects_unsupported_note() {
        let result = note_slot().validate(&Instrument::Note(Amount::from_units(100)));
        assert!(matches!(
            result,
            Err(PaymentError::UnsupportedDenomination { channel: Channel::Note, .. })
        ));
    }

    #[test]
    fn card_reader_takes_any_funded_card() {
        let reader = ChannelValidator::card();
        assert_eq!(reader.validate(&visa(1)), Ok(()));
        assert_eq!(reader.validate(&visa(0)), Err(PaymentError::EmptyCard));
        assert!(matches!(
            reader.validate(&Instrument::Coin(Amount::from_cents(10))),
            Err(PaymentError::InvalidEntry { expected: Channel::Card, .. })
        ));
    }

    #[test]
    fn card_in_note_slot_is_invalid() {
        assert!(matches!(
            note_slot().validate(&visa(5)),
            Err(PaymentError::InvalidEntry { found: Channel::Card, .. })
        ));
    }

    #[test]
    fn denominations_follow_channel() {
        let notes: Vec<_> = note_slot().denominations().collect();
        assert_eq!(
            notes,
            vec![
                Denomination::Note(Amount::from_units(20)),
                Denomination::Note(Amount::from_units(50)),
            ]
        );
        assert_eq!(ChannelValidator::card().denominations().count(), 0);
    }
}
