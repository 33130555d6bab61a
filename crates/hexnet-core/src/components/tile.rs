//! Tile identity and lifecycle components: Tile, Suspended, Construction, Integrity

use super::common::AgentId;
use serde::{Deserialize, Serialize};

/// Tile component - identity of the structure occupying a grid cell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tile {
    /// Owning agent
    pub agent: AgentId,
    /// Frame number the tile was placed on (earlier = first claim on matter)
    pub frame: u64,
    /// Grid address
    pub index: usize,
    /// Catalog kind name
    pub kind: String,
}

impl Tile {
    pub fn new(kind: impl Into<String>, agent: AgentId, index: usize, frame: u64) -> Self {
        Self {
            agent,
            frame,
            index,
            kind: kind.into(),
        }
    }
}

/// Marker - tile is switched off by its owner
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suspended;

impl std::fmt::Display for Suspended {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Suspended")
    }
}

/// Construction in progress. While present the tile is inactive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Construction {
    pub value: i32,
    pub max: i32,
    /// Matter charged per funded tick
    pub cost: i32,
    pub multiplier: i32,
    /// Replaces an existing structure when complete
    pub upgrade: bool,
}

impl Construction {
    pub fn new(max: i32) -> Self {
        Self {
            value: 0,
            max,
            cost: 1,
            multiplier: 0,
            upgrade: false,
        }
    }

    pub fn upgrade(max: i32) -> Self {
        Self {
            upgrade: true,
            ..Self::new(max)
        }
    }

    pub fn with_cost(mut self, cost: i32) -> Self {
        self.cost = cost;
        self
    }

    /// Matter required (and progress gained) for one funded tick
    pub fn charge(&self) -> i32 {
        self.cost * (1 + self.multiplier)
    }

    pub fn is_complete(&self) -> bool {
        self.value >= self.max
    }

    /// Progress as fraction (0-1)
    pub fn progress(&self) -> f32 {
        if self.max > 0 {
            (self.value as f32 / self.max as f32).min(1.0)
        } else {
            1.0
        }
    }
}

impl std::fmt::Display for Construction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.upgrade {
            write!(f, "Upgrading {}/{}", self.value, self.max)
        } else {
            write!(f, "Under construction {}/{}", self.value, self.max)
        }
    }
}

/// Structural integrity (health) of a tile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Integrity {
    pub value: i32,
    pub max: i32,
    pub armor: i32,
    /// Damage carried over between hits, always within [0, armor]
    pub remainder: i32,
    /// Buffered repair fragments awaiting exchange into integrity points
    pub fragments: i32,
    /// Frame of the last hit
    pub last_damaged: Option<u64>,
}

impl Integrity {
    /// Fresh integrity for a structure still under construction (value 0)
    pub fn new(max: i32) -> Self {
        Self {
            value: 0,
            max,
            armor: 0,
            remainder: 0,
            fragments: 0,
            last_damaged: None,
        }
    }

    /// Integrity starting at full health
    pub fn full(max: i32) -> Self {
        Self {
            value: max,
            ..Self::new(max)
        }
    }

    pub fn is_damaged(&self) -> bool {
        self.value < self.max
    }

    pub fn is_destroyed(&self) -> bool {
        self.value < 0
    }

    /// Apply armor-amortized damage.
    ///
    /// `delta + remainder` is divided by `armor + 1`; the quotient is applied and
    /// the rest carries into the next hit, so armor never rounds damage away.
    pub fn damage(&mut self, delta: i32, frame: u64) {
        let amortization = self.armor.max(0) + 1;
        let carried = self.remainder % amortization;
        let total = delta.saturating_add(carried);
        self.remainder = total % amortization;
        self.value -= total / amortization;
        self.last_damaged = Some(frame);
    }

    /// Convert buffered fragments into integrity points. Returns points restored.
    ///
    /// A buffer holding exactly `exchange_rate` fragments is kept for the next tick.
    pub fn exchange_fragments(&mut self, exchange_rate: i32) -> i32 {
        let before = self.value;
        while self.fragments > exchange_rate {
            self.value = (self.value + 1).min(self.max);
            self.fragments -= exchange_rate;
        }
        self.value - before
    }

    /// Health as fraction (0-1)
    pub fn fraction(&self) -> f32 {
        if self.max > 0 {
            (self.value.max(0) as f32 / self.max as f32).min(1.0)
        } else {
            0.0
        }
    }
}

impl std::fmt::Display for Integrity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Integrity {}/{} restore {} armor {}",
            self.value, self.max, self.fragments, self.armor
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_construction_charge_scales_with_multiplier() {
        let mut c = Construction::new(10).with_cost(2);
        assert_eq!(c.charge(), 2);
        c.multiplier = 1;
        assert_eq!(c.charge(), 4);
        assert!(!c.is_complete());
        c.value = 10;
        assert!(c.is_complete());
        assert_eq!(c.to_string(), "Under construction 10/10");
    }

    #[test]
    fn test_damage_without_armor() {
        let mut health = Integrity::full(5);
        health.damage(2, 7);
        assert_eq!(health.value, 3);
        assert_eq!(health.remainder, 0);
        assert_eq!(health.last_damaged, Some(7));
    }

    #[test]
    fn test_damage_amortized_by_armor() {
        let mut health = Integrity::full(100);
        health.armor = 3;

        for call in 1..=100 {
            let before = health.value;
            health.damage(1, call);
            let expected = if call % 4 == 0 { 1 } else { 0 };
            assert_eq!(before - health.value, expected, "call {}", call);
            assert!(health.remainder >= 0 && health.remainder <= health.armor);
        }
        assert_eq!(health.value, 75);
    }

    #[test]
    fn test_damage_after_armor_drops() {
        let mut health = Integrity::full(10);
        health.armor = 4;
        health.damage(3, 1);
        assert_eq!(health.value, 10);
        assert_eq!(health.remainder, 3);

        // Armor stripped by propagation reset: stale remainder must not exceed it
        health.armor = 1;
        health.damage(1, 2);
        assert_eq!(health.value, 9);
        assert_eq!(health.remainder, 0);
    }

    #[test]
    fn test_fragment_exchange() {
        let mut health = Integrity::full(5);
        health.value = 2;
        health.fragments = 25;
        assert_eq!(health.exchange_fragments(10), 2);
        assert_eq!(health.value, 4);
        assert_eq!(health.fragments, 5);
    }

    #[test]
    fn test_fragment_exchange_caps_at_max() {
        let mut health = Integrity::full(5);
        health.value = 4;
        health.fragments = 30;
        health.exchange_fragments(10);
        assert_eq!(health.value, 5);
        assert_eq!(health.fragments, 10);
    }

    #[test]
    fn test_fragment_exchange_needs_more_than_rate() {
        let mut health = Integrity::full(5);
        health.value = 2;
        health.fragments = 10;
        assert_eq!(health.exchange_fragments(10), 0);
        assert_eq!(health.fragments, 10);

        health.fragments = 11;
        assert_eq!(health.exchange_fragments(10), 1);
        assert_eq!(health.value, 3);
        assert_eq!(health.fragments, 1);
    }

    #[test]
    fn test_damage_saturates_on_huge_delta() {
        let mut health = Integrity::full(5);
        health.armor = 1;
        health.damage(1, 1);
        assert_eq!(health.remainder, 1);

        health.damage(i32::MAX, 2);
        assert_eq!(health.value, 5 - i32::MAX / 2);
        assert!(health.is_destroyed());
        assert_eq!(health.remainder, 1);
    }
}
