//! Product slots and their stock counters.

use thiserror::Error;

use crate::model::{Item, SlotId};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SlotError {
    #[error("slot {0} does not exist")]
    UnknownSlot(SlotId),
    #[error("slot {0} is out of items")]
    EmptySlot(SlotId),
    #[error("slot {slot} is full: {quantity} of {capacity}, cannot add {requested}")]
    SlotFull {
        slot: SlotId,
        quantity: u32,
        capacity: u32,
        requested: u32,
    },
}

/// A dispensing compartment holding one item type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Slot {
    item: Option<Item>,
    quantity: u32,
    capacity: u32,
}

impl Slot {
    pub fn new(capacity: u32) -> Self {
        Self {
            item: None,
            quantity: 0,
            capacity,
        }
    }

    pub fn item(&self) -> Option<&Item> {
        self.item.as_ref()
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    pub fn is_empty(&self) -> bool {
        self.quantity == 0
    }

    /// Assign `item` to the slot, replacing whatever it held.
    pub fn load(&mut self, id: SlotId, item: Item, quantity: u32) -> Result<(), SlotError> {
        if quantity > self.capacity {
            return Err(SlotError::SlotFull {
                slot: id,
                quantity: 0,
                capacity: self.capacity,
                requested: quantity,
            });
        }
        self.item = Some(item);
        self.quantity = quantity;
        Ok(())
    }

    pub fn restock(&mut self, id: SlotId, n: u32) -> Result<(), SlotError> {
        match self.quantity.checked_add(n) {
            Some(total) if total <= self.capacity => {
                self.quantity = total;
                Ok(())
            }
            _ => Err(SlotError::SlotFull {
                slot: id,
                quantity: self.quantity,
                capacity: self.capacity,
                requested: n,
            }),
        }
    }

    pub fn dispense_one(&mut self, id: SlotId) -> Result<(), SlotError> {
        if self.quantity == 0 {
            return Err(SlotError::EmptySlot(id));
        }
        self.quantity -= 1;
        Ok(())
    }

    /// Empty the slot. Capacity is kept.
    pub fn clear(&mut self) {
        self.item = None;
        self.quantity = 0;
    }
}

/// The machine's slot array.
#[derive(Debug, Clone, Default)]
pub struct SlotInventory {
    slots: Vec<Slot>,
}

impl SlotInventory {
    pub fn new(slots: Vec<Slot>) -> Self {
        Self { slots }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn get(&self, id: SlotId) -> Result<&Slot, SlotError> {
        self.slots.get(id.0).ok_or(SlotError::UnknownSlot(id))
    }

    pub fn quantity(&self, id: SlotId) -> Result<u32, SlotError> {
        self.get(id).map(Slot::quantity)
    }

    pub fn load(&mut self, id: SlotId, item: Item, quantity: u32) -> Result<(), SlotError> {
        self.get_mut(id)?.load(id, item, quantity)
    }

    pub fn restock(&mut self, id: SlotId, n: u32) -> Result<(), SlotError> {
        self.get_mut(id)?.restock(id, n)
    }

    pub fn dispense_one(&mut self, id: SlotId) -> Result<(), SlotError> {
        self.get_mut(id)?.dispense_one(id)
    }

    pub fn clear(&mut self) {
        self.slots.iter_mut().for_each(Slot::clear);
    }

    pub fn iter(&self) -> impl Iterator<Item = (SlotId, &Slot)> + '_ {
        self.slots.iter().enumerate().map(|(i, s)| (SlotId(i), s))
    }

    fn get_mut(&mut self, id: SlotId) -> Result<&mut Slot, SlotError> {
        self.slots.get_mut(id.0).ok_or(SlotError::UnknownSlot(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Amount;

    fn peanuts() -> Item {
        Item::new("Peanuts", Amount::from_units(3))
    }

    fn inventory() -> SlotInventory {
        let mut inventory = SlotInventory::new(vec![Slot::new(4), Slot::new(3)]);
        inventory.load(SlotId(0), peanuts(), 3).unwrap();
        inventory
    }

    #[test]
    fn new_slot_is_empty() {
        let slot = Slot::new(5);
        assert!(slot.is_empty());
        assert_eq!(slot.item(), None);
        assert_eq!(slot.capacity(), 5);
    }

    #[test]
    fn load_sets_item_and_quantity() {
        let inventory = inventory();
        let slot = inventory.get(SlotId(0)).unwrap();
        assert_eq!(slot.item(), Some(&peanuts()));
        assert_eq!(slot.quantity(), 3);
    }

    #[test]
    fn load_over_capacity_fails() {
        let mut inventory = inventory();
        let result = inventory.load(SlotId(1), peanuts(), 4);
        assert!(matches!(result, Err(SlotError::SlotFull { requested: 4, .. })));
        assert_eq!(inventory.quantity(SlotId(1)), Ok(0));
    }

    #[test]
    fn restock_up_to_capacity() {
        let mut inventory = inventory();
        inventory.restock(SlotId(0), 1).unwrap();
        assert_eq!(inventory.quantity(SlotId(0)), Ok(4));

        let result = inventory.restock(SlotId(0), 1);
        assert_eq!(
            result,
            Err(SlotError::SlotFull {
                slot: SlotId(0),
                quantity: 4,
                capacity: 4,
                requested: 1,
            })
        );
        assert_eq!(inventory.quantity(SlotId(0)), Ok(4));
    }

    #[test]
    fn dispense_decrements_until_empty() {
        let mut inventory = inventory();
        for _ in 0..3 {
            inventory.dispense_one(SlotId(0)).unwrap();
        }
        assert_eq!(inventory.quantity(SlotId(0)), Ok(0));
        assert_eq!(
            inventory.dispense_one(SlotId(0)),
            Err(SlotError::EmptySlot(SlotId(0)))
        );
    }

    #[test]
    fn unknown_slot() {
        let mut inventory = inventory();
        assert_eq!(
            inventory.quantity(SlotId(9)),
            Err(SlotError::UnknownSlot(SlotId(9)))
        );
        assert_eq!(
            inventory.restock(SlotId(9), 1),
            Err(SlotError::UnknownSlot(SlotId(9)))
        );
    }

    #[test]
    fn clear_keeps_slots_but_empties_them() {
        let mut inventory = inventory();
        inventory.clear();
        assert_eq!(inventory.len(), 2);
        let slot = inventory.get(SlotId(0)).unwrap();
        assert!(slot.is_empty());
        assert_eq!(slot.item(), None);
        assert_eq!(slot.capacity(), 4);
    }
}
