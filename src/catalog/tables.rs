use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;
use tracing::{info, warn};

use super::records::{
    AgentRecord, GloveRecord, MusicRecord, PinRecord, RawAgentRecord, SkinRecord, WeaponRecord,
};
use crate::loadout::team::Side;

/// Immutable lookup tables of selectable items, loaded once at startup.
/// A missing or malformed data file leaves that category empty; it never
/// takes the process down.
#[derive(Debug, Default)]
pub struct Catalogs {
    weapons: Vec<WeaponRecord>,
    skins: Vec<SkinRecord>,
    gloves: Vec<GloveRecord>,
    agents: Vec<AgentRecord>,
    music: Vec<MusicRecord>,
    pins: Vec<PinRecord>,
}

impl Catalogs {
    pub fn load(dir: &Path) -> Self {
        let raw_agents: Vec<RawAgentRecord> = load_or_empty(&dir.join("agents.json"), "agents");
        let agents = raw_agents
            .into_iter()
            .filter_map(|raw| {
                let name = raw.name.clone();
                let record = raw.validate();
                if record.is_none() {
                    warn!(agent = %name, "skipping agent with invalid team");
                }
                record
            })
            .collect::<Vec<_>>();

        let catalogs = Self {
            weapons: load_or_empty(&dir.join("weapons.json"), "weapons"),
            skins: load_or_empty(&dir.join("skins.json"), "skins"),
            gloves: load_or_empty(&dir.join("gloves.json"), "gloves"),
            agents,
            music: load_or_empty(&dir.join("music.json"), "music"),
            pins: load_or_empty(&dir.join("collectibles.json"), "pins"),
        };
        info!(
            weapons = catalogs.weapons.len(),
            skins = catalogs.skins.len(),
            gloves = catalogs.gloves.len(),
            agents = catalogs.agents.len(),
            music = catalogs.music.len(),
            pins = catalogs.pins.len(),
            "catalogs loaded"
        );
        catalogs
    }

    #[cfg(test)]
    pub(crate) fn from_parts(
        weapons: Vec<WeaponRecord>,
        skins: Vec<SkinRecord>,
        gloves: Vec<GloveRecord>,
        agents: Vec<AgentRecord>,
        music: Vec<MusicRecord>,
        pins: Vec<PinRecord>,
    ) -> Self {
        Self {
            weapons,
            skins,
            gloves,
            agents,
            music,
            pins,
        }
    }

    pub fn weapons(&self) -> impl Iterator<Item = &WeaponRecord> {
        self.weapons.iter()
    }

    pub fn weapon_by_class(&self, class: &str) -> Option<&WeaponRecord> {
        self.weapons.iter().find(|weapon| weapon.class == class)
    }

    pub fn knives(&self) -> impl Iterator<Item = &WeaponRecord> {
        self.weapons.iter().filter(|weapon| weapon.is_knife())
    }

    pub fn knife_by_class(&self, class: &str) -> Option<&WeaponRecord> {
        self.knives().find(|knife| knife.class == class)
    }

    pub fn skins_for_weapon<'a>(&'a self, class: &'a str) -> impl Iterator<Item = &'a SkinRecord> {
        self.skins.iter().filter(move |skin| skin.weapon_class == class)
    }

    pub fn skin(&self, class: &str, paint: i32) -> Option<&SkinRecord> {
        self.skins
            .iter()
            .find(|skin| skin.weapon_class == class && skin.paint == paint)
    }

    pub fn gloves(&self) -> impl Iterator<Item = &GloveRecord> {
        self.gloves.iter()
    }

    pub fn glove(&self, defindex: u16) -> Option<&GloveRecord> {
        self.gloves.iter().find(|glove| glove.defindex == defindex)
    }

    pub fn agents_for_side(&self, side: Side) -> impl Iterator<Item = &AgentRecord> {
        self.agents.iter().filter(move |agent| agent.side == side)
    }

    pub fn agent(&self, side: Side, name: &str) -> Option<&AgentRecord> {
        self.agents
            .iter()
            .find(|agent| agent.side == side && agent.name == name)
    }

    pub fn music(&self) -> impl Iterator<Item = &MusicRecord> {
        self.music.iter()
    }

    pub fn music_kit(&self, id: u16) -> Option<&MusicRecord> {
        self.music.iter().find(|kit| kit.id == id)
    }

    pub fn pins(&self) -> impl Iterator<Item = &PinRecord> {
        self.pins.iter()
    }

    pub fn pin(&self, id: u16) -> Option<&PinRecord> {
        self.pins.iter().find(|pin| pin.id == id)
    }
}

fn load_or_empty<T: DeserializeOwned>(path: &Path, label: &str) -> Vec<T> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) => {
            warn!(catalog = label, path = %path.display(), %err, "catalog file unreadable, starting empty");
            return Vec::new();
        }
    };
    match serde_json::from_str(&text) {
        Ok(records) => records,
        Err(err) => {
            warn!(catalog = label, path = %path.display(), %err, "catalog file malformed, starting empty");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Catalogs {
        let weapons: Vec<WeaponRecord> = serde_json::from_str(
            r#"[
                {"weapon_name": "weapon_ak47", "weapon_defindex": 7, "name": "AK-47"},
                {"weapon_name": "weapon_knife_karambit", "weapon_defindex": 507, "name": "Karambit"},
                {"weapon_name": "weapon_bayonet", "weapon_defindex": 500, "name": "Bayonet"}
            ]"#,
        )
        .unwrap();
        let skins: Vec<SkinRecord> = serde_json::from_str(
            r#"[
                {"weapon_name": "weapon_ak47", "paint": 44, "paint_name": "AK-47 | Case Hardened",
                 "image": "img/ak47_44.png"},
                {"weapon_name": "weapon_ak47", "paint": 302, "paint_name": "AK-47 | Vulcan"}
            ]"#,
        )
        .unwrap();
        let raw_agents: Vec<RawAgentRecord> = serde_json::from_str(
            r#"[
                {"agent_name": "Elite Crew", "team": 2, "model": "models/t/elite.vmdl"},
                {"agent_name": "Default", "team": 3, "model": "null"},
                {"agent_name": "Broken", "team": 9, "model": "models/x.vmdl"}
            ]"#,
        )
        .unwrap();
        let agents = raw_agents.into_iter().filter_map(RawAgentRecord::validate).collect();
        Catalogs::from_parts(weapons, skins, Vec::new(), agents, Vec::new(), Vec::new())
    }

    #[test]
    fn knives_are_derived_from_the_weapon_list() {
        let catalogs = sample();
        let knives: Vec<_> = catalogs.knives().map(|k| k.class.as_str()).collect();
        assert_eq!(knives, vec!["weapon_knife_karambit", "weapon_bayonet"]);
        assert!(catalogs.knife_by_class("weapon_ak47").is_none());
    }

    #[test]
    fn skin_lookup_is_keyed_by_class_and_paint() {
        let catalogs = sample();
        assert_eq!(catalogs.skin("weapon_ak47", 44).unwrap().name, "AK-47 | Case Hardened");
        assert!(catalogs.skin("weapon_ak47", 999).is_none());
        assert_eq!(catalogs.skins_for_weapon("weapon_ak47").count(), 2);
    }

    #[test]
    fn agent_validation_drops_bad_teams_and_maps_null_model() {
        let catalogs = sample();
        assert_eq!(catalogs.agents_for_side(Side::Terrorist).count(), 1);
        let default = catalogs.agent(Side::CounterTerrorist, "Default").unwrap();
        assert_eq!(default.model, None);
        assert!(catalogs.agent(Side::Terrorist, "Broken").is_none());
    }

    #[test]
    fn missing_catalog_file_yields_empty_tables() {
        let catalogs = Catalogs::load(Path::new("/nonexistent/csloadout-data"));
        assert_eq!(catalogs.weapons().count(), 0);
        assert_eq!(catalogs.skins_for_weapon("weapon_ak47").count(), 0);
    }
}
