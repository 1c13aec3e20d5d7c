mod records;
mod tables;

pub use records::{AgentRecord, GloveRecord, MusicRecord, PinRecord, SkinRecord, WeaponRecord};
pub use tables::Catalogs;
