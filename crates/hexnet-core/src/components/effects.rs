//! Area-effect components: modifier emitters, repair emitters, unit spawners, targeting

use serde::{Deserialize, Serialize};

/// Which attribute a modifier emitter amplifies on nearby tiles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModifierKind {
    /// Radius of effect
    Radius,
    /// Throughput / efficiency bonus
    Efficiency,
    /// Speed (rate multipliers)
    Rate,
    /// Consumption discount
    Cost,
    /// Integrity armor
    Armor,
}

impl ModifierKind {
    pub fn label(&self) -> &'static str {
        match self {
            ModifierKind::Radius => "radius of effect",
            ModifierKind::Efficiency => "efficiency",
            ModifierKind::Rate => "speed",
            ModifierKind::Cost => "cost reduction",
            ModifierKind::Armor => "integrity/armor",
        }
    }
}

impl std::fmt::Display for ModifierKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Propagates a modifier to tiles within a bounded hex distance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Modifier {
    pub kind: ModifierKind,
    /// Base delta per target
    pub delta: i32,
    pub radius: i32,
    pub extend: i32,
    pub bonus: i32,
    /// Radius precomputed for the current tick
    pub effective_radius: i32,
    /// Delta precomputed for the current tick
    pub effective_delta: i32,
}

impl Modifier {
    pub fn new(kind: ModifierKind, delta: i32) -> Self {
        Self {
            kind,
            delta,
            radius: 1,
            extend: 0,
            bonus: 0,
            effective_radius: 0,
            effective_delta: 0,
        }
    }

    /// Snapshot radius/delta for this tick from last tick's received modifiers
    pub fn precompute(&mut self) {
        self.effective_radius = self.radius + self.extend;
        self.effective_delta = self.delta + self.bonus;
    }
}

impl std::fmt::Display for Modifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "propagate {} {} by {} cells",
            self.effective_delta, self.kind, self.effective_radius
        )
    }
}

/// Restores integrity of damaged tiles in range, paid from the network pool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Repair {
    pub radius: i32,
    pub extend: i32,
    pub multiplier: i32,
    pub bonus: i32,
    /// Targets serviced this tick
    pub count: i32,
}

impl Repair {
    pub fn new(radius: i32) -> Self {
        Self {
            radius,
            extend: 0,
            multiplier: 0,
            bonus: 0,
            count: 0,
        }
    }

    pub fn range(&self) -> i32 {
        self.radius + self.extend
    }

    /// Maximum targets serviced per tick
    pub fn capacity(&self) -> i32 {
        self.multiplier + 1
    }

    pub fn is_active(&self) -> bool {
        self.count > 0
    }
}

impl Default for Repair {
    fn default() -> Self {
        Self::new(1)
    }
}

impl std::fmt::Display for Repair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "restoring {}", self.count)
    }
}

/// Accumulates production and emits unit spawn requests on overflow
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitProduction {
    pub stack: i32,
    pub threshold: i32,
    pub multiplier: i32,
    /// Extra damage for spawned units
    pub bonus: i32,
    /// Extended speed for spawned units
    pub extend: i32,
    pub armor: i32,
}

impl UnitProduction {
    pub fn new(threshold: i32) -> Self {
        Self {
            stack: 0,
            threshold,
            multiplier: 0,
            bonus: 0,
            extend: 0,
            armor: 0,
        }
    }

    /// Units per batch and stack gained per tick
    pub fn batch(&self) -> i32 {
        self.multiplier + 1
    }
}

impl std::fmt::Display for UnitProduction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "build {} units at {}/{} with +{} damage +{} speed +{} armor",
            self.batch(),
            self.stack,
            self.threshold,
            self.bonus,
            self.extend,
            self.armor
        )
    }
}

/// Turret targeting parameters. Fire control lives in the combat collaborator;
/// only the modifier-affected fields are owned here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Targeting {
    pub radius: i32,
    pub extend: i32,
    pub multiplier: i32,
    pub bonus: i32,
    pub damage: i32,
    pub rate: i32,
}

impl Targeting {
    /// World-unit radius added per point of `extend`
    pub const EXTEND_SCALE: i32 = 50;

    pub fn new(radius: i32, damage: i32, rate: i32) -> Self {
        Self {
            radius,
            extend: 0,
            multiplier: 0,
            bonus: 0,
            damage,
            rate,
        }
    }

    pub fn range(&self) -> i32 {
        self.radius + self.extend * Self::EXTEND_SCALE
    }

    pub fn total_damage(&self) -> i32 {
        self.damage + self.bonus
    }

    /// Seconds between shots, `None` when the rate is not positive
    pub fn cooldown(&self) -> Option<f32> {
        let rate = self.rate + self.multiplier;
        (rate > 0).then(|| 1.0 / rate as f32)
    }
}

impl std::fmt::Display for Targeting {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "shoot in {}+{} radius with {}+{} damage",
            self.radius, self.extend, self.damage, self.bonus
        )
    }
}
