use std::sync::Arc;

use crate::catalog::Catalogs;
use crate::loadout::cooldown::CooldownGate;
use crate::loadout::preview::PreviewImages;
use crate::loadout::select::SelectionPipeline;
use crate::loadout::state::LoadoutStore;
use crate::session::{GameSession, SessionRegistry};
use crate::sync::{LoadoutStorage, SyncEngine};
use crate::util::config::Config;

/// Everything the handlers share. Built once at startup and handed to axum
/// behind an Arc.
pub struct AppState {
    pub config: Config,
    pub catalogs: Arc<Catalogs>,
    pub store: Arc<LoadoutStore>,
    pub cooldowns: Arc<CooldownGate>,
    pub previews: Arc<PreviewImages>,
    pub session: Arc<SessionRegistry>,
    pub sync: Arc<SyncEngine>,
    pub pipeline: SelectionPipeline,
}

impl AppState {
    pub fn new(
        config: Config,
        catalogs: Arc<Catalogs>,
        storage: Arc<dyn LoadoutStorage>,
    ) -> Arc<Self> {
        let store = Arc::new(LoadoutStore::new());
        let cooldowns = Arc::new(CooldownGate::new(
            config.cooldowns.command(),
            config.cooldowns.selection(),
        ));
        let previews = PreviewImages::new(config.preview.duration());
        let session = Arc::new(SessionRegistry::new());
        let sync = SyncEngine::new(storage);
        let pipeline = SelectionPipeline::new(
            Arc::clone(&store),
            Arc::clone(&catalogs),
            Arc::clone(&cooldowns),
            Arc::clone(&session) as Arc<dyn GameSession>,
            Arc::clone(&sync),
            Arc::clone(&previews),
            config.preview.enabled,
        );
        Arc::new(Self {
            config,
            catalogs,
            store,
            cooldowns,
            previews,
            session,
            sync,
            pipeline,
        })
    }
}
