//! Modifier system - emitters amplify or discount the capabilities of nearby tiles.
//!
//! Runs in two passes. The reset pass snapshots each funded emitter's radius
//! and delta from last tick's received modifiers, then zeroes every
//! modifier-affected field on every tile. The apply pass adds each emitter's
//! delta into the fields its kind governs on every tile in reach except
//! itself. Received modifiers therefore take effect one tick later.

use crate::components::{
    Construction, Integrity, MatterCollection, MatterConsumption, MatterProduction, Modifier,
    ModifierKind, Repair, Targeting, UnitProduction,
};
use crate::grid::{HexGrid, Traversal};
use hecs::{Entity, World};
use log::trace;

/// Every component a modifier can touch on one tile
struct Modifiable<'a> {
    integrity: Option<&'a mut Integrity>,
    construction: Option<&'a mut Construction>,
    production: Option<&'a mut MatterProduction>,
    collection: Option<&'a mut MatterCollection>,
    consumption: Option<&'a mut MatterConsumption>,
    modifier: Option<&'a mut Modifier>,
    repair: Option<&'a mut Repair>,
    units: Option<&'a mut UnitProduction>,
    targeting: Option<&'a mut Targeting>,
}

impl<'a> Modifiable<'a> {
    fn fetch(world: &'a mut World, entity: Entity) -> Option<Self> {
        let (integrity, construction, production, collection, consumption, modifier, repair, units, targeting) =
            world
                .query_one_mut::<(
                    Option<&mut Integrity>,
                    Option<&mut Construction>,
                    Option<&mut MatterProduction>,
                    Option<&mut MatterCollection>,
                    Option<&mut MatterConsumption>,
                    Option<&mut Modifier>,
                    Option<&mut Repair>,
                    Option<&mut UnitProduction>,
                    Option<&mut Targeting>,
                )>(entity)
                .ok()?;
        Some(Self {
            integrity,
            construction,
            production,
            collection,
            consumption,
            modifier,
            repair,
            units,
            targeting,
        })
    }

    /// Emits this tick: active, carries a modifier, and its upkeep was funded
    fn is_emitting(&self) -> bool {
        self.construction.is_none()
            && self.modifier.is_some()
            && self.consumption.as_ref().map_or(false, |c| c.active)
    }

    fn reset(&mut self) {
        if let Some(health) = self.integrity.as_deref_mut() {
            health.armor = 0;
        }
        if let Some(repair) = self.repair.as_deref_mut() {
            repair.multiplier = 0;
            repair.bonus = 0;
            repair.extend = 0;
        }
        if let Some(production) = self.production.as_deref_mut() {
            production.multiplier = 0;
            production.bonus = 0;
        }
        if let Some(site) = self.construction.as_deref_mut() {
            site.multiplier = 0;
        }
        if let Some(store) = self.collection.as_deref_mut() {
            store.multiplier = 0;
            store.bonus = 0;
        }
        if let Some(targeting) = self.targeting.as_deref_mut() {
            targeting.multiplier = 0;
            targeting.bonus = 0;
            targeting.extend = 0;
        }
        if let Some(units) = self.units.as_deref_mut() {
            units.multiplier = 0;
            units.extend = 0;
            units.bonus = 0;
            units.armor = 0;
        }
        if let Some(consumer) = self.consumption.as_deref_mut() {
            consumer.multiplier = 0;
            consumer.discount = 0;
        }
        if let Some(modifier) = self.modifier.as_deref_mut() {
            modifier.extend = 0;
            modifier.bonus = 0;
        }
    }

    fn apply(&mut self, kind: ModifierKind, delta: i32) {
        match kind {
            ModifierKind::Radius => {
                if let Some(m) = self.modifier.as_deref_mut() {
                    m.extend += delta;
                }
                if let Some(t) = self.targeting.as_deref_mut() {
                    t.extend += delta;
                }
                if let Some(r) = self.repair.as_deref_mut() {
                    r.extend += delta;
                }
                if let Some(u) = self.units.as_deref_mut() {
                    u.extend += delta;
                }
            }
            ModifierKind::Efficiency => {
                if let Some(p) = self.production.as_deref_mut() {
                    p.bonus += delta;
                }
                if let Some(s) = self.collection.as_deref_mut() {
                    s.bonus += delta;
                }
                if let Some(t) = self.targeting.as_deref_mut() {
                    t.bonus += delta;
                }
                if let Some(r) = self.repair.as_deref_mut() {
                    r.bonus += delta;
                }
                if let Some(u) = self.units.as_deref_mut() {
                    u.bonus += delta;
                }
                if let Some(m) = self.modifier.as_deref_mut() {
                    if matches!(m.kind, ModifierKind::Cost | ModifierKind::Armor) {
                        m.bonus += delta;
                    }
                }
            }
            ModifierKind::Rate => {
                if let Some(p) = self.production.as_deref_mut() {
                    p.multiplier += delta;
                }
                if let Some(c) = self.construction.as_deref_mut() {
                    c.multiplier += delta;
                }
                if let Some(s) = self.collection.as_deref_mut() {
                    s.multiplier += delta;
                }
                if let Some(t) = self.targeting.as_deref_mut() {
                    t.multiplier += delta;
                }
                if let Some(u) = self.units.as_deref_mut() {
                    u.multiplier += delta;
                }
                if let Some(r) = self.repair.as_deref_mut() {
                    r.multiplier += delta;
                }
                // Emitters would otherwise speed up each other's upkeep
                if self.modifier.is_none() {
                    if let Some(c) = self.consumption.as_deref_mut() {
                        c.multiplier += delta;
                    }
                }
            }
            ModifierKind::Cost => {
                if let Some(c) = self.consumption.as_deref_mut() {
                    c.discount += delta;
                }
            }
            ModifierKind::Armor => {
                if let Some(h) = self.integrity.as_deref_mut() {
                    h.armor += delta;
                }
                if let Some(u) = self.units.as_deref_mut() {
                    u.armor += delta;
                }
            }
        }
    }
}

/// Reset then re-apply all modifier effects for this tick
pub fn modifier_system(world: &mut World, grid: &HexGrid, scratch: &mut Traversal) {
    let occupied: Vec<(usize, Entity)> = grid.occupied().collect();

    let mut emitters = Vec::new();
    for &(index, entity) in &occupied {
        let Some(mut tile) = Modifiable::fetch(world, entity) else { continue };
        if tile.is_emitting() {
            if let Some(modifier) = tile.modifier.as_deref_mut() {
                modifier.precompute();
                emitters.push((
                    index,
                    modifier.kind,
                    modifier.effective_radius,
                    modifier.effective_delta,
                ));
            }
        }
        tile.reset();
    }

    for (origin, kind, radius, delta) in emitters {
        let targets = grid.spread(world, scratch, origin, radius.max(0) as u32);
        for target in targets.into_iter().filter(|&t| t != origin) {
            let Some(entity) = grid.get(target) else { continue };
            if let Some(mut tile) = Modifiable::fetch(world, entity) {
                tile.apply(kind, delta);
            }
        }
        trace!("emitter at {} applied {} {} within {}", origin, delta, kind, radius);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::Fixture;

    fn funded(amount: i32) -> MatterConsumption {
        let mut consumer = MatterConsumption::new(amount);
        consumer.active = true;
        consumer
    }

    #[test]
    fn test_rate_emitter_skips_itself() {
        let mut f = Fixture::new();
        let emitter = f.place(
            4,
            4,
            1,
            0,
            (Modifier::new(ModifierKind::Rate, 1), funded(1), MatterProduction::new(1)),
        );
        let neighbor = f.place(5, 4, 1, 1, (MatterProduction::new(1),));

        modifier_system(&mut f.world, &f.grid, &mut f.scratch);
        assert_eq!(f.get::<MatterProduction>(emitter).multiplier, 0);
        assert_eq!(f.get::<MatterConsumption>(emitter).multiplier, 0);
        assert_eq!(f.get::<MatterProduction>(neighbor).multiplier, 1);
    }

    #[test]
    fn test_unfunded_emitter_has_no_effect() {
        let mut f = Fixture::new();
        f.place(4, 4, 1, 0, (Modifier::new(ModifierKind::Cost, 2), MatterConsumption::new(1)));
        let neighbor = f.place(5, 4, 1, 1, (funded(3),));

        modifier_system(&mut f.world, &f.grid, &mut f.scratch);
        assert_eq!(f.get::<MatterConsumption>(neighbor).discount, 0);
    }

    #[test]
    fn test_effects_do_not_accumulate() {
        let mut f = Fixture::new();
        f.place(4, 4, 1, 0, (Modifier::new(ModifierKind::Armor, 2), funded(1)));
        let neighbor = f.place(5, 4, 1, 1, (Integrity::full(5), UnitProduction::new(10)));

        for _ in 0..3 {
            modifier_system(&mut f.world, &f.grid, &mut f.scratch);
        }
        assert_eq!(f.get::<Integrity>(neighbor).armor, 2);
        assert_eq!(f.get::<UnitProduction>(neighbor).armor, 2);
    }

    #[test]
    fn test_rate_spares_other_emitters_upkeep() {
        let mut f = Fixture::new();
        f.place(4, 4, 1, 0, (Modifier::new(ModifierKind::Rate, 1), funded(1)));
        let other = f.place(5, 4, 1, 1, (Modifier::new(ModifierKind::Cost, 1), funded(1)));
        let plain = f.place(3, 4, 1, 2, (funded(1),));

        modifier_system(&mut f.world, &f.grid, &mut f.scratch);
        assert_eq!(f.get::<MatterConsumption>(other).multiplier, 0);
        assert_eq!(f.get::<MatterConsumption>(plain).multiplier, 1);
    }

    #[test]
    fn test_radius_extension_lands_one_tick_later() {
        let mut f = Fixture::new();
        f.place(3, 4, 1, 0, (Modifier::new(ModifierKind::Radius, 1), funded(1)));
        let efficiency = f.place(4, 4, 1, 1, (Modifier::new(ModifierKind::Efficiency, 1), funded(1)));
        f.place_bare(5, 4, 1, 2);
        let far = f.place(6, 4, 1, 3, (MatterProduction::new(1),));

        modifier_system(&mut f.world, &f.grid, &mut f.scratch);
        assert_eq!(f.get::<Modifier>(efficiency).extend, 1);
        assert_eq!(f.get::<MatterProduction>(far).bonus, 0);

        modifier_system(&mut f.world, &f.grid, &mut f.scratch);
        assert_eq!(f.get::<Modifier>(efficiency).effective_radius, 2);
        assert_eq!(f.get::<MatterProduction>(far).bonus, 1);
    }

    #[test]
    fn test_efficiency_boosts_cost_modifier_only() {
        let mut f = Fixture::new();
        f.place(4, 4, 1, 0, (Modifier::new(ModifierKind::Efficiency, 2), funded(1)));
        let cost = f.place(5, 4, 1, 1, (Modifier::new(ModifierKind::Cost, 1), funded(1)));
        let rate = f.place(3, 4, 1, 2, (Modifier::new(ModifierKind::Rate, 1), funded(1)));
        let store = f.place(4, 5, 1, 3, (MatterCollection::new(10),));

        modifier_system(&mut f.world, &f.grid, &mut f.scratch);
        assert_eq!(f.get::<Modifier>(cost).bonus, 2);
        assert_eq!(f.get::<Modifier>(rate).bonus, 0);
        assert_eq!(f.get::<MatterCollection>(store).bonus, 2);
    }

    #[test]
    fn test_inactive_target_reached_but_emitter_under_construction_silent() {
        let mut f = Fixture::new();
        f.place(4, 4, 1, 0, (Modifier::new(ModifierKind::Rate, 1), funded(1)));
        let site = f.place(5, 4, 1, 1, (Construction::new(10),));
        f.place(3, 4, 1, 2, (Modifier::new(ModifierKind::Cost, 1), funded(1), Construction::new(5)));
        let consumer = f.place(2, 4, 1, 3, (funded(2),));

        modifier_system(&mut f.world, &f.grid, &mut f.scratch);
        assert_eq!(f.get::<Construction>(site).multiplier, 1);
        assert_eq!(f.get::<MatterConsumption>(consumer).discount, 0);
    }
}
