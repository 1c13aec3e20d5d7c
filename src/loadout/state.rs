use std::collections::HashMap;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use super::team::{Side, TeamTargets};

/// Wear applied when a skin is freshly picked.
pub const FRESH_WEAR: f32 = 0.01;

/// Per-weapon cosmetic state. An entry exists only for weapons the player
/// explicitly customized; absence means the default skin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeaponAttributes {
    pub paint: i32,
    pub wear: f32,
    pub seed: i32,
    pub stattrak: bool,
}

impl WeaponAttributes {
    /// Attributes of a newly picked skin: fresh wear, zero seed, no counter.
    pub fn fresh(paint: i32) -> Self {
        Self {
            paint,
            wear: FRESH_WEAR,
            seed: 0,
            stattrak: false,
        }
    }
}

/// Everything a player has equipped for one side. `music`/`pin` keep the
/// explicit zero sentinel so "cleared" survives hydration, unlike `None`
/// which means never selected.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TeamLoadout {
    pub weapons: HashMap<u16, WeaponAttributes>,
    pub knife: Option<String>,
    pub glove: u16,
    pub music: Option<u16>,
    pub pin: Option<u16>,
}

/// Agent models are keyed directly by side; a pick only ever lands on one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AgentSelection {
    t: Option<String>,
    ct: Option<String>,
}

impl AgentSelection {
    pub fn for_side(&self, side: Side) -> Option<&str> {
        match side {
            Side::Terrorist => self.t.as_deref(),
            Side::CounterTerrorist => self.ct.as_deref(),
        }
    }

    pub fn set(&mut self, side: Side, model: Option<String>) {
        match side {
            Side::Terrorist => self.t = model,
            Side::CounterTerrorist => self.ct = model,
        }
    }
}

/// A single player's full cosmetic state across both sides.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlayerLoadouts {
    terrorist: TeamLoadout,
    counter_terrorist: TeamLoadout,
    pub agents: AgentSelection,
}

impl PlayerLoadouts {
    pub fn side(&self, side: Side) -> &TeamLoadout {
        match side {
            Side::Terrorist => &self.terrorist,
            Side::CounterTerrorist => &self.counter_terrorist,
        }
    }

    pub fn side_mut(&mut self, side: Side) -> &mut TeamLoadout {
        match side {
            Side::Terrorist => &mut self.terrorist,
            Side::CounterTerrorist => &mut self.counter_terrorist,
        }
    }
}

/// Authoritative in-memory loadout state for every connected player, keyed
/// by session slot. Each slot's entry is an independent mutation unit; the
/// map's shard locks serialize concurrent mutations of the same player
/// without blocking unrelated slots.
#[derive(Debug, Default)]
pub struct LoadoutStore {
    players: DashMap<i32, PlayerLoadouts>,
}

impl LoadoutStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn mutate<R>(&self, slot: i32, f: impl FnOnce(&mut PlayerLoadouts) -> R) -> R {
        let mut entry = self.players.entry(slot).or_default();
        f(&mut entry)
    }

    pub fn upsert_weapon(
        &self,
        slot: i32,
        targets: TeamTargets,
        defindex: u16,
        f: impl Fn(&mut WeaponAttributes),
    ) {
        self.mutate(slot, |loadouts| {
            for side in targets.sides() {
                let attrs = loadouts
                    .side_mut(side)
                    .weapons
                    .entry(defindex)
                    .or_insert_with(|| WeaponAttributes::fresh(0));
                f(attrs);
            }
        });
    }

    pub fn remove_weapon(&self, slot: i32, targets: TeamTargets, defindex: u16) {
        self.mutate(slot, |loadouts| {
            for side in targets.sides() {
                loadouts.side_mut(side).weapons.remove(&defindex);
            }
        });
    }

    /// Flips the counter on sides where the weapon already carries a custom
    /// paint. Returns the new state, or None if no side had one.
    pub fn toggle_stattrak(&self, slot: i32, targets: TeamTargets, defindex: u16) -> Option<bool> {
        self.mutate(slot, |loadouts| {
            let current = targets.sides().find_map(|side| {
                loadouts
                    .side(side)
                    .weapons
                    .get(&defindex)
                    .filter(|attrs| attrs.paint != 0)
                    .map(|attrs| attrs.stattrak)
            })?;
            let toggled = !current;
            for side in targets.sides() {
                if let Some(attrs) = loadouts.side_mut(side).weapons.get_mut(&defindex) {
                    if attrs.paint != 0 {
                        attrs.stattrak = toggled;
                    }
                }
            }
            Some(toggled)
        })
    }

    pub fn set_knife(&self, slot: i32, targets: TeamTargets, class: String) {
        self.mutate(slot, |loadouts| {
            for side in targets.sides() {
                loadouts.side_mut(side).knife = Some(class.clone());
            }
        });
    }

    pub fn set_glove(&self, slot: i32, targets: TeamTargets, defindex: u16) {
        self.mutate(slot, |loadouts| {
            for side in targets.sides() {
                loadouts.side_mut(side).glove = defindex;
            }
        });
    }

    pub fn set_music(&self, slot: i32, targets: TeamTargets, kit: u16) {
        self.mutate(slot, |loadouts| {
            for side in targets.sides() {
                loadouts.side_mut(side).music = Some(kit);
            }
        });
    }

    pub fn set_pin(&self, slot: i32, targets: TeamTargets, pin: u16) {
        self.mutate(slot, |loadouts| {
            for side in targets.sides() {
                loadouts.side_mut(side).pin = Some(pin);
            }
        });
    }

    pub fn set_agent(&self, slot: i32, side: Side, model: Option<String>) {
        self.mutate(slot, |loadouts| loadouts.agents.set(side, model));
    }

    pub fn weapon(&self, slot: i32, side: Side, defindex: u16) -> Option<WeaponAttributes> {
        self.players
            .get(&slot)
            .and_then(|entry| entry.side(side).weapons.get(&defindex).copied())
    }

    pub fn knife(&self, slot: i32, side: Side) -> Option<String> {
        self.players
            .get(&slot)
            .and_then(|entry| entry.side(side).knife.clone())
    }

    pub fn glove(&self, slot: i32, side: Side) -> u16 {
        self.players
            .get(&slot)
            .map(|entry| entry.side(side).glove)
            .unwrap_or(0)
    }

    pub fn music(&self, slot: i32, side: Side) -> Option<u16> {
        self.players.get(&slot).and_then(|entry| entry.side(side).music)
    }

    pub fn pin(&self, slot: i32, side: Side) -> Option<u16> {
        self.players.get(&slot).and_then(|entry| entry.side(side).pin)
    }

    pub fn agent(&self, slot: i32, side: Side) -> Option<String> {
        self.players
            .get(&slot)
            .and_then(|entry| entry.agents.for_side(side).map(str::to_owned))
    }

    /// Populates the slot from durable state unless the session already
    /// holds an entry; live in-memory state always wins over hydration.
    pub fn hydrate_if_absent(&self, slot: i32, loadouts: PlayerLoadouts) -> bool {
        match self.players.entry(slot) {
            Entry::Occupied(_) => false,
            Entry::Vacant(vacant) => {
                vacant.insert(loadouts);
                true
            }
        }
    }

    /// Drops a player's state. Called on disconnect so a reused slot never
    /// sees the previous occupant's loadout.
    pub fn clear_player(&self, slot: i32) {
        self.players.remove(&slot);
    }

    /// Hot-reload reset of every player.
    pub fn clear_all(&self) {
        self.players.clear();
    }
}
