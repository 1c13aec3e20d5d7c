pub mod cooldown;
pub mod preview;
pub mod select;
pub mod state;
pub mod team;

pub use cooldown::{CooldownGate, CooldownKind};
pub use preview::PreviewImages;
pub use select::{SelectOutcome, SelectionPipeline};
pub use state::LoadoutStore;
pub use team::{MatchTeam, Side, TeamTargets, resolve_targets};
