use serde::Deserialize;

use crate::loadout::team::Side;

/// A selectable weapon class, also the source of the knife list.
#[derive(Debug, Clone, Deserialize)]
pub struct WeaponRecord {
    #[serde(rename = "weapon_name")]
    pub class: String,
    #[serde(rename = "weapon_defindex")]
    pub defindex: u16,
    pub name: String,
}

impl WeaponRecord {
    pub fn is_knife(&self) -> bool {
        self.class.starts_with("weapon_knife") || self.class.starts_with("weapon_bayonet")
    }
}

/// One paint finish for one weapon class.
#[derive(Debug, Clone, Deserialize)]
pub struct SkinRecord {
    #[serde(rename = "weapon_name")]
    pub weapon_class: String,
    pub paint: i32,
    #[serde(rename = "paint_name")]
    pub name: String,
    #[serde(default)]
    pub image: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GloveRecord {
    #[serde(rename = "paint_name")]
    pub name: String,
    #[serde(rename = "weapon_defindex")]
    pub defindex: u16,
    pub paint: i32,
    #[serde(default)]
    pub image: Option<String>,
}

/// An agent model, fixed to one side. `model: None` is the default model
/// entry that clears a previous pick.
#[derive(Debug, Clone)]
pub struct AgentRecord {
    pub name: String,
    pub side: Side,
    pub model: Option<String>,
    pub image: Option<String>,
}

/// Agent rows as they appear in the data file, before side validation.
#[derive(Debug, Clone, Deserialize)]
pub(super) struct RawAgentRecord {
    #[serde(rename = "agent_name")]
    pub name: String,
    pub team: u8,
    pub model: String,
    #[serde(default)]
    pub image: Option<String>,
}

impl RawAgentRecord {
    pub fn validate(self) -> Option<AgentRecord> {
        let side = Side::from_team_num(self.team)?;
        let model = (self.model != "null").then_some(self.model);
        Some(AgentRecord {
            name: self.name,
            side,
            model,
            image: self.image,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MusicRecord {
    pub id: u16,
    pub name: String,
    #[serde(default)]
    pub image: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PinRecord {
    pub id: u16,
    pub name: String,
    #[serde(default)]
    pub image: Option<String>,
}
