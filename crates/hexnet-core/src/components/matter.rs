//! Matter economy components: production, collection (storage), consumption

use serde::{Deserialize, Serialize};

/// Generates matter into the tile's network every tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatterProduction {
    pub amount: i32,
    pub bonus: i32,
    pub multiplier: i32,
}

impl MatterProduction {
    pub fn new(amount: i32) -> Self {
        Self {
            amount,
            bonus: 0,
            multiplier: 0,
        }
    }

    /// Matter generated per tick
    pub fn total(&self) -> i32 {
        (self.amount + self.bonus) * (1 + self.multiplier)
    }
}

impl std::fmt::Display for MatterProduction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Generate ({} + {}) * {} = {} matter per step",
            self.amount,
            self.bonus,
            self.multiplier + 1,
            self.total()
        )
    }
}

/// Stores overflow matter. Stored value is folded back into the pool every tick
/// and re-earned during collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatterCollection {
    pub value: i32,
    /// Value carried over from the previous tick
    pub persist: i32,
    pub max: i32,
    /// Per-tick transfer cap
    pub cap: i32,
    pub multiplier: i32,
    pub bonus: i32,
}

impl MatterCollection {
    pub fn new(max: i32) -> Self {
        Self {
            value: 0,
            persist: 0,
            max,
            cap: 1,
            multiplier: 0,
            bonus: 0,
        }
    }

    pub fn with_cap(mut self, cap: i32) -> Self {
        self.cap = cap;
        self
    }

    /// Maximum newly collected matter per tick
    pub fn throughput(&self) -> i32 {
        self.cap + self.multiplier
    }

    /// Fill level as fraction (0-1)
    pub fn level(&self) -> f32 {
        if self.max > 0 {
            self.value as f32 / self.max as f32
        } else {
            0.0
        }
    }
}

impl std::fmt::Display for MatterCollection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Storage {}/{} matter (throughput {})",
            self.value,
            self.max,
            self.throughput()
        )
    }
}

/// Draws matter from the network every tick to stay operational
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatterConsumption {
    pub amount: i32,
    pub multiplier: i32,
    pub discount: i32,
    /// Fully funded this tick
    pub active: bool,
}

impl MatterConsumption {
    pub fn new(amount: i32) -> Self {
        Self {
            amount,
            multiplier: 0,
            discount: 0,
            active: false,
        }
    }

    /// Matter required this tick (never below 1)
    pub fn total(&self) -> i32 {
        (self.amount * (self.multiplier + 1) - self.discount).max(1)
    }
}

impl std::fmt::Display for MatterConsumption {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Require {} * {} - {} = {} {}",
            self.amount,
            self.multiplier + 1,
            self.discount,
            self.total(),
            if self.active { "active" } else { "inactive" }
        )
    }
}
