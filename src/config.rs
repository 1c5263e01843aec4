//! Machine configuration: accepted denominations, slot layout and opening float.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::Amount;
use crate::model::{Channel, Denomination, Item};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MachineConfig {
    /// Coin worths the coin slot accepts
    #[serde(default = "default_coins")]
    pub coins: Vec<Amount>,
    /// Note worths the note slot accepts
    #[serde(default = "default_notes")]
    pub notes: Vec<Amount>,
    #[serde(default)]
    pub slots: Vec<SlotConfig>,
    /// Change stocked in the ledger at start-up
    #[serde(default)]
    pub float: Vec<FloatConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotConfig {
    pub capacity: u32,
    #[serde(default)]
    pub item: Option<Item>,
    #[serde(default)]
    pub quantity: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FloatConfig {
    pub channel: Channel,
    pub worth: Amount,
    pub count: u32,
}

impl FloatConfig {
    pub fn denomination(&self) -> Option<Denomination> {
        match self.channel {
            Channel::Coin => Some(Denomination::Coin(self.worth)),
            Channel::Note => Some(Denomination::Note(self.worth)),
            Channel::Card => None,
        }
    }
}

fn default_coins() -> Vec<Amount> {
    [10, 25, 50, 100].into_iter().map(Amount::from_cents).collect()
}

fn default_notes() -> Vec<Amount> {
    [20, 50].into_iter().map(Amount::from_units).collect()
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            coins: default_coins(),
            notes: default_notes(),
            slots: Vec::new(),
            float: Vec::new(),
        }
    }
}

impl MachineConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Append an empty slot.
    pub fn with_slot(mut self, capacity: u32) -> Self {
        self.slots.push(SlotConfig {
            capacity,
            item: None,
            quantity: 0,
        });
        self
    }

    /// Append a slot holding `quantity` units of `item`.
    pub fn with_item(mut self, item: Item, quantity: u32, capacity: u32) -> Self {
        self.slots.push(SlotConfig {
            capacity,
            item: Some(item),
            quantity,
        });
        self
    }

    pub fn with_float(mut self, denomination: Denomination, count: u32) -> Self {
        self.float.push(FloatConfig {
            channel: denomination.channel(),
            worth: denomination.worth(),
            count,
        });
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(worth) = self
            .coins
            .iter()
            .chain(&self.notes)
            .find(|w| !w.is_positive())
        {
            return Err(ConfigError::Invalid(format!(
                "accepted worth {worth} must be positive"
            )));
        }

        for (index, slot) in self.slots.iter().enumerate() {
            if slot.quantity > slot.capacity {
                return Err(ConfigError::Invalid(format!(
                    "slot {index}: quantity {} exceeds capacity {}",
                    slot.quantity, slot.capacity
                )));
            }
            if slot.quantity > 0 && slot.item.is_none() {
                return Err(ConfigError::Invalid(format!(
                    "slot {index}: quantity {} without an item",
                    slot.quantity
                )));
            }
        }

        for entry in &self.float {
            if entry.channel == Channel::Card {
                return Err(ConfigError::Invalid(
                    "float cannot hold card payments".to_string(),
                ));
            }
            if !entry.worth.is_positive() {
                return Err(ConfigError::Invalid(format!(
                    "float worth {} must be positive",
                    entry.worth
                )));
            }
        }

        Ok(())
    }
}
