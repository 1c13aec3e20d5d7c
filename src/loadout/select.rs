use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::debug;

use super::cooldown::{CooldownGate, CooldownKind};
use super::preview::PreviewImages;
use super::state::{LoadoutStore, WeaponAttributes};
use super::team::{MatchTeam, TeamTargets, resolve_targets};
use crate::catalog::Catalogs;
use crate::session::{Category, GameSession, PlayerRef};
use crate::sync::{SyncEngine, SyncJob};

/// How one selection event ended. Only `Applied` touched state; the rest
/// are normal outcomes, not errors.
#[derive(Debug, Clone, PartialEq)]
pub enum SelectOutcome {
    Applied { label: String },
    Throttled { remaining: Duration },
    NotFound,
    SessionGone,
}

/// Turns a user pick into a validated, applied, persisted mutation. Every
/// method runs on the foreground path and never awaits: the store mutation
/// is immediate, the durable write is enqueued fire-and-forget.
pub struct SelectionPipeline {
    store: Arc<LoadoutStore>,
    catalogs: Arc<Catalogs>,
    cooldowns: Arc<CooldownGate>,
    session: Arc<dyn GameSession>,
    sync: Arc<SyncEngine>,
    previews: Arc<PreviewImages>,
    previews_enabled: bool,
}

impl SelectionPipeline {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        store: Arc<LoadoutStore>,
        catalogs: Arc<Catalogs>,
        cooldowns: Arc<CooldownGate>,
        session: Arc<dyn GameSession>,
        sync: Arc<SyncEngine>,
        previews: Arc<PreviewImages>,
        previews_enabled: bool,
    ) -> Self {
        Self {
            store,
            catalogs,
            cooldowns,
            session,
            sync,
            previews,
            previews_enabled,
        }
    }

    /// Session validity then the selection gate, in that order. A torn-down
    /// session is a silent no-op and must not consume the cooldown.
    fn admit(&self, player: &PlayerRef) -> Option<SelectOutcome> {
        if !self.session.is_valid(player) {
            return Some(SelectOutcome::SessionGone);
        }
        if let Err(remaining) =
            self.cooldowns
                .try_acquire(CooldownKind::Selection, player.slot, Instant::now())
        {
            return Some(SelectOutcome::Throttled { remaining });
        }
        None
    }

    fn register_preview(&self, slot: i32, image: Option<&str>) {
        if !self.previews_enabled {
            return;
        }
        if let Some(image) = image {
            self.previews.register(slot, image.to_owned());
        }
    }

    pub fn select_skin(&self, player: &PlayerRef, weapon_class: &str, paint: i32) -> SelectOutcome {
        if let Some(outcome) = self.admit(player) {
            return outcome;
        }
        let Some(weapon) = self.catalogs.weapon_by_class(weapon_class) else {
            debug!(weapon_class, "skin pick for unknown weapon");
            return SelectOutcome::NotFound;
        };
        let targets = resolve_targets(self.session.current_side(player));

        let (attrs, label) = if paint == 0 {
            self.store.remove_weapon(player.slot, targets, weapon.defindex);
            (None, format!("{} | Default", weapon.name))
        } else {
            let Some(skin) = self.catalogs.skin(weapon_class, paint) else {
                debug!(weapon_class, paint, "skin pick no longer in catalog");
                return SelectOutcome::NotFound;
            };
            let fresh = WeaponAttributes::fresh(paint);
            self.store
                .upsert_weapon(player.slot, targets, weapon.defindex, move |attrs| *attrs = fresh);
            self.register_preview(player.slot, skin.image.as_deref());
            (Some(fresh), skin.name.clone())
        };

        self.session.apply_visual(player, Category::Skins);
        self.sync.enqueue(
            player.account_id,
            SyncJob::Weapon {
                targets,
                defindex: weapon.defindex,
                attrs,
            },
        );
        SelectOutcome::Applied { label }
    }

    pub fn select_knife(&self, player: &PlayerRef, class: &str) -> SelectOutcome {
        if let Some(outcome) = self.admit(player) {
            return outcome;
        }
        let Some(knife) = self.catalogs.knife_by_class(class) else {
            return SelectOutcome::NotFound;
        };
        let targets = resolve_targets(self.session.current_side(player));

        self.store.set_knife(player.slot, targets, knife.class.clone());
        self.session.apply_visual(player, Category::Knives);
        self.sync.enqueue(
            player.account_id,
            SyncJob::Knife {
                targets,
                class: knife.class.clone(),
            },
        );
        SelectOutcome::Applied {
            label: knife.name.clone(),
        }
    }

    pub fn select_glove(&self, player: &PlayerRef, defindex: u16) -> SelectOutcome {
        if let Some(outcome) = self.admit(player) {
            return outcome;
        }
        let targets = resolve_targets(self.session.current_side(player));

        let label = if defindex == 0 {
            self.store.set_glove(player.slot, targets, 0);
            "Default".to_owned()
        } else {
            let Some(glove) = self.catalogs.glove(defindex) else {
                return SelectOutcome::NotFound;
            };
            self.store.set_glove(player.slot, targets, defindex);
            // The finish rides in the weapons map under the glove defindex.
            let attrs = WeaponAttributes::fresh(glove.paint);
            self.store
                .upsert_weapon(player.slot, targets, defindex, move |entry| *entry = attrs);
            self.register_preview(player.slot, glove.image.as_deref());
            self.sync.enqueue(
                player.account_id,
                SyncJob::Weapon {
                    targets,
                    defindex,
                    attrs: Some(attrs),
                },
            );
            glove.name.clone()
        };

        self.session.apply_visual(player, Category::Gloves);
        self.sync.enqueue(
            player.account_id,
            SyncJob::Glove { targets, defindex },
        );
        SelectOutcome::Applied { label }
    }

    /// An agent pick only ever lands on one side's slot, so a player with
    /// no fixed side has nothing to select.
    pub fn select_agent(&self, player: &PlayerRef, name: &str) -> SelectOutcome {
        if let Some(outcome) = self.admit(player) {
            return outcome;
        }
        let MatchTeam::Playing(side) = self.session.current_side(player) else {
            return SelectOutcome::NotFound;
        };
        let Some(agent) = self.catalogs.agent(side, name) else {
            return SelectOutcome::NotFound;
        };

        self.store.set_agent(player.slot, side, agent.model.clone());
        self.register_preview(player.slot, agent.image.as_deref());
        self.session.apply_visual(player, Category::Agents);
        self.sync.enqueue(
            player.account_id,
            SyncJob::Agent {
                side,
                model: agent.model.clone(),
            },
        );
        SelectOutcome::Applied {
            label: agent.name.clone(),
        }
    }

    /// Kit 0 clears, and the zero is stored explicitly so a reconnect does
    /// not resurrect an older pick.
    pub fn select_music(&self, player: &PlayerRef, kit: u16) -> SelectOutcome {
        if let Some(outcome) = self.admit(player) {
            return outcome;
        }
        let label = if kit == 0 {
            "None".to_owned()
        } else {
            let Some(record) = self.catalogs.music_kit(kit) else {
                return SelectOutcome::NotFound;
            };
            self.register_preview(player.slot, record.image.as_deref());
            record.name.clone()
        };
        let targets = resolve_targets(self.session.current_side(player));

        self.store.set_music(player.slot, targets, kit);
        self.session.apply_visual(player, Category::Music);
        self.sync
            .enqueue(player.account_id, SyncJob::Music { targets, kit });
        SelectOutcome::Applied { label }
    }

    pub fn select_pin(&self, player: &PlayerRef, pin: u16) -> SelectOutcome {
        if let Some(outcome) = self.admit(player) {
            return outcome;
        }
        let label = if pin == 0 {
            "None".to_owned()
        } else {
            let Some(record) = self.catalogs.pin(pin) else {
                return SelectOutcome::NotFound;
            };
            self.register_preview(player.slot, record.image.as_deref());
            record.name.clone()
        };
        let targets = resolve_targets(self.session.current_side(player));

        self.store.set_pin(player.slot, targets, pin);
        self.session.apply_visual(player, Category::Pins);
        self.sync
            .enqueue(player.account_id, SyncJob::Pin { targets, pin });
        SelectOutcome::Applied { label }
    }

    /// Direct command: gated by the command cooldown, never the selection
    /// one. Only flips weapons that already carry a custom paint.
    pub fn toggle_stattrak(&self, player: &PlayerRef) -> SelectOutcome {
        if !self.session.is_valid(player) {
            return SelectOutcome::SessionGone;
        }
        if let Err(remaining) =
            self.cooldowns
                .try_acquire(CooldownKind::Command, player.slot, Instant::now())
        {
            return SelectOutcome::Throttled { remaining };
        }
        let Some(defindex) = self.session.active_weapon(player) else {
            return SelectOutcome::NotFound;
        };
        let targets = resolve_targets(self.session.current_side(player));

        let Some(enabled) = self.store.toggle_stattrak(player.slot, targets, defindex) else {
            return SelectOutcome::NotFound;
        };
        self.session.apply_visual(player, Category::Skins);
        for side in targets.sides() {
            if let Some(attrs) = self.store.weapon(player.slot, side, defindex) {
                self.sync.enqueue(
                    player.account_id,
                    SyncJob::Weapon {
                        targets: TeamTargets::One(side),
                        defindex,
                        attrs: Some(attrs),
                    },
                );
            }
        }
        SelectOutcome::Applied {
            label: if enabled { "StatTrak on" } else { "StatTrak off" }.to_owned(),
        }
    }
}
