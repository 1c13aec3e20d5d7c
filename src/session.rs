use dashmap::DashMap;
use tracing::debug;

use crate::loadout::team::MatchTeam;

/// Ephemeral identity of a connected session. The slot is process-local and
/// reused after disconnect; only the account id is ever persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerRef {
    pub slot: i32,
    pub account_id: u64,
    pub name: String,
    pub address: String,
}

/// The cosmetic categories the engine manages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Skins,
    Knives,
    Gloves,
    Agents,
    Music,
    Pins,
}

impl Category {
    pub fn label(self) -> &'static str {
        match self {
            Category::Skins => "skins",
            Category::Knives => "knives",
            Category::Gloves => "gloves",
            Category::Agents => "agents",
            Category::Music => "music",
            Category::Pins => "pins",
        }
    }

    pub fn parse(label: &str) -> Option<Category> {
        match label {
            "skins" => Some(Category::Skins),
            "knives" => Some(Category::Knives),
            "gloves" => Some(Category::Gloves),
            "agents" => Some(Category::Agents),
            "music" => Some(Category::Music),
            "pins" => Some(Category::Pins),
            _ => None,
        }
    }
}

/// Boundary to the game-session host. `apply_visual` re-equips a category
/// from current loadout state and must be idempotent; re-equipping what is
/// already held is safe to call repeatedly.
pub trait GameSession: Send + Sync {
    fn is_valid(&self, player: &PlayerRef) -> bool;
    fn current_side(&self, player: &PlayerRef) -> MatchTeam;
    fn active_weapon(&self, player: &PlayerRef) -> Option<u16>;
    fn connected_players(&self) -> Vec<PlayerRef>;
    fn apply_visual(&self, player: &PlayerRef, category: Category);
}

struct SessionEntry {
    player: PlayerRef,
    team: MatchTeam,
    active_weapon: Option<u16>,
}

/// Session state mirrored from host events. The production host owns the
/// actual entities; this registry answers validity/side/active-weapon
/// queries and logs visual re-application for the host to pick up.
#[derive(Default)]
pub struct SessionRegistry {
    players: DashMap<i32, SessionEntry>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connect(&self, player: PlayerRef, team: MatchTeam) {
        self.players.insert(
            player.slot,
            SessionEntry {
                player,
                team,
                active_weapon: None,
            },
        );
    }

    pub fn disconnect(&self, slot: i32) {
        self.players.remove(&slot);
    }

    pub fn set_team(&self, slot: i32, team: MatchTeam) {
        if let Some(mut entry) = self.players.get_mut(&slot) {
            entry.team = team;
        }
    }

    pub fn set_active_weapon(&self, slot: i32, defindex: Option<u16>) {
        if let Some(mut entry) = self.players.get_mut(&slot) {
            entry.active_weapon = defindex;
        }
    }

    pub fn player(&self, slot: i32) -> Option<PlayerRef> {
        self.players.get(&slot).map(|entry| entry.player.clone())
    }
}

impl GameSession for SessionRegistry {
    fn is_valid(&self, player: &PlayerRef) -> bool {
        self.players
            .get(&player.slot)
            .is_some_and(|entry| entry.player.account_id == player.account_id)
    }

    fn current_side(&self, player: &PlayerRef) -> MatchTeam {
        self.players
            .get(&player.slot)
            .map(|entry| entry.team)
            .unwrap_or(MatchTeam::Unassigned)
    }

    fn active_weapon(&self, player: &PlayerRef) -> Option<u16> {
        self.players.get(&player.slot).and_then(|entry| entry.active_weapon)
    }

    fn connected_players(&self) -> Vec<PlayerRef> {
        self.players.iter().map(|entry| entry.player.clone()).collect()
    }

    fn apply_visual(&self, player: &PlayerRef, category: Category) {
        debug!(
            slot = player.slot,
            category = category.label(),
            "re-applying visuals"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loadout::team::Side;

    fn player(slot: i32, account_id: u64) -> PlayerRef {
        PlayerRef {
            slot,
            account_id,
            name: format!("player{slot}"),
            address: "127.0.0.1".into(),
        }
    }

    #[test]
    fn validity_tracks_slot_occupancy() {
        let registry = SessionRegistry::new();
        let p = player(1, 76561198000000001);
        assert!(!registry.is_valid(&p));

        registry.connect(p.clone(), MatchTeam::Unassigned);
        assert!(registry.is_valid(&p));

        // Slot reused by a different account: the stale ref is invalid.
        registry.connect(player(1, 76561198000000002), MatchTeam::Unassigned);
        assert!(!registry.is_valid(&p));

        registry.disconnect(1);
        assert!(!registry.is_valid(&p));
    }

    #[test]
    fn side_updates_flow_through() {
        let registry = SessionRegistry::new();
        let p = player(2, 76561198000000003);
        registry.connect(p.clone(), MatchTeam::Unassigned);
        assert_eq!(registry.current_side(&p), MatchTeam::Unassigned);

        registry.set_team(2, MatchTeam::Playing(Side::Terrorist));
        assert_eq!(registry.current_side(&p), MatchTeam::Playing(Side::Terrorist));
    }
}
