//! Change stock of the machine and the change-making algorithm.
//!
//! The ledger keeps a count per [`Denomination`]. Change is assembled greedily
//! one unit at a time from the recognised coin and note denominations,
//! highest worth first, never allocating more units than are in stock. The
//! computation is pure; stock only moves through [`DenominationLedger::add`],
//! [`DenominationLedger::deduct`] and [`DenominationLedger::apply_change`].

use std::cmp::Reverse;
use std::collections::{BTreeMap, HashMap};

use thiserror::Error;

use crate::Amount;
use crate::model::{Channel, Denomination};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("insufficient change: cannot cover {remaining} of {requested}")]
    InsufficientChange { requested: Amount, remaining: Amount },
    #[error("cannot make change for negative amount {0}")]
    NegativeAmount(Amount),
    #[error("stock of {denomination} cannot hold {count} more")]
    StockOverflow { denomination: Denomination, count: u32 },
}

/// A set of denominations and unit counts handed out as change or refund.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Change(BTreeMap<Denomination, u32>);

impl Change {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, denomination: &Denomination) -> u32 {
        self.0.get(denomination).copied().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of distinct denominations.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn total(&self) -> Amount {
        self.0.iter().map(|(d, n)| d.worth().saturating_mul(*n)).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Denomination, &u32)> + '_ {
        self.0.iter()
    }

    fn push(&mut self, denomination: Denomination) {
        *self.0.entry(denomination).or_insert(0) += 1;
    }
}

impl FromIterator<(Denomination, u32)> for Change {
    fn from_iter<I: IntoIterator<Item = (Denomination, u32)>>(iter: I) -> Self {
        Change(iter.into_iter().filter(|(_, n)| *n > 0).collect())
    }
}

/// Stock of change, keyed by denomination.
#[derive(Debug, Clone)]
pub struct DenominationLedger {
    stock: HashMap<Denomination, u32>,
    /// Denominations usable as change, highest worth first
    candidates: Vec<Denomination>,
}

/// Public API
impl DenominationLedger {
    /// Create an empty ledger that makes change from the given denominations.
    pub fn new(recognized: impl IntoIterator<Item = Denomination>) -> Self {
        let mut candidates: Vec<Denomination> = recognized
            .into_iter()
            .filter(|d| d.worth().is_positive())
            .collect();
        // highest worth first, notes ahead of coins of the same worth
        candidates.sort_by_key(|d| (Reverse(d.worth()), d.channel() != Channel::Note));
        candidates.dedup();

        Self {
            stock: HashMap::new(),
            candidates,
        }
    }

    /// Denominations considered when making change, in allocation order.
    pub fn denominations(&self) -> &[Denomination] {
        &self.candidates
    }

    pub fn count(&self, denomination: &Denomination) -> u32 {
        self.stock.get(denomination).copied().unwrap_or(0)
    }

    /// Put `n` units into stock. Fails without touching the ledger when the
    /// count would not fit.
    pub fn add(&mut self, denomination: Denomination, n: u32) -> Result<(), LedgerError> {
        let count = self.stock.entry(denomination).or_insert(0);
        *count = count
            .checked_add(n)
            .ok_or(LedgerError::StockOverflow { denomination, count: n })?;
        Ok(())
    }

    /// Remove `n` units. Does nothing when fewer than `n` are in stock;
    /// check with [`has_sufficient`](Self::has_sufficient) first.
    pub fn deduct(&mut self, denomination: &Denomination, n: u32) {
        if let Some(count) = self.stock.get_mut(denomination)
            && *count >= n
        {
            *count -= n;
        }
    }

    pub fn has_sufficient(&self, denomination: &Denomination, n: u32) -> bool {
        self.count(denomination) >= n
    }

    pub fn clear(&mut self) {
        self.stock.clear();
    }

    /// Non-empty stock entries, highest worth first.
    pub fn stock(&self) -> Vec<(Denomination, u32)> {
        let mut entries: Vec<_> = self
            .stock
            .iter()
            .filter(|(_, n)| **n > 0)
            .map(|(d, n)| (*d, *n))
            .collect();
        entries.sort_by_key(|(d, _)| (Reverse(d.worth()), d.channel() != Channel::Note));
        entries
    }

    /// Worth of everything in stock.
    pub fn total_value(&self) -> Amount {
        self.stock.iter().map(|(d, n)| d.worth().saturating_mul(*n)).sum()
    }

    /// Assemble exact change for `amount` from current stock without touching it.
    pub fn compute_change(&self, amount: Amount) -> Result<Change, LedgerError> {
        if amount < Amount::ZERO {
            return Err(LedgerError::NegativeAmount(amount));
        }

        let (change, remaining) = self.allocate(amount);
        if remaining.is_zero() {
            Ok(change)
        } else {
            Err(LedgerError::InsufficientChange {
                requested: amount,
                remaining,
            })
        }
    }

    /// Like [`compute_change`](Self::compute_change) but returns whatever the
    /// greedy pass could assemble together with the uncovered remainder.
    pub fn compute_partial_change(&self, amount: Amount) -> (Change, Amount) {
        if amount < Amount::ZERO {
            return (Change::new(), amount);
        }
        self.allocate(amount)
    }

    pub fn can_make_change(&self, amount: Amount) -> bool {
        self.compute_change(amount).is_ok()
    }

    /// Take the units of a previously computed change out of stock.
    pub fn apply_change(&mut self, change: &Change) {
        for (denomination, n) in change.iter() {
            self.deduct(denomination, *n);
        }
    }
}

/// Private API
impl DenominationLedger {
    /// Greedy-by-unit allocation: every step takes one unit of the first
    /// candidate that fits the remainder and still has unallocated stock.
    fn allocate(&self, amount: Amount) -> (Change, Amount) {
        let mut change = Change::new();
        let mut remaining = amount;

        while remaining.is_positive() {
            let next = self.candidates.iter().find(|d| {
                d.worth() <= remaining && self.count(d) > change.count(d)
            });

            match next {
                Some(denomination) => {
                    remaining -= denomination.worth();
                    change.push(*denomination);
                }
                None => break,
            }
        }

        (change, remaining)
    }
}
