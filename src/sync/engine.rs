use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::storage::{LoadoutStorage, StorageError};
use crate::loadout::state::{LoadoutStore, WeaponAttributes};
use crate::loadout::team::{Side, TeamTargets};
use crate::session::PlayerRef;

const RETRY_LIMIT: u32 = 3;
const RETRY_BASE: Duration = Duration::from_millis(250);

/// One accepted mutation, carrying the post-mutation value(s) for the
/// affected side(s).
#[derive(Debug, Clone)]
pub enum SyncJob {
    Weapon {
        targets: TeamTargets,
        defindex: u16,
        attrs: Option<WeaponAttributes>,
    },
    Knife {
        targets: TeamTargets,
        class: String,
    },
    Glove {
        targets: TeamTargets,
        defindex: u16,
    },
    Agent {
        side: Side,
        model: Option<String>,
    },
    Music {
        targets: TeamTargets,
        kit: u16,
    },
    Pin {
        targets: TeamTargets,
        pin: u16,
    },
}

/// Reconciles the in-memory store with durable storage. Every account gets
/// its own queue drained by a single worker task, so a player's writes land
/// in the order they were accepted — a delayed earlier write can never
/// overwrite a later one. Queues for different accounts are unrelated.
pub struct SyncEngine {
    storage: Arc<dyn LoadoutStorage>,
    queues: DashMap<u64, mpsc::UnboundedSender<SyncJob>>,
}

impl SyncEngine {
    pub fn new(storage: Arc<dyn LoadoutStorage>) -> Arc<Self> {
        Arc::new(Self {
            storage,
            queues: DashMap::new(),
        })
    }

    /// Fire-and-forget from the caller's perspective; the foreground path
    /// never waits on storage.
    pub fn enqueue(&self, account_id: u64, job: SyncJob) {
        let mut job = job;
        loop {
            let sender = self
                .queues
                .entry(account_id)
                .or_insert_with(|| self.spawn_worker(account_id))
                .clone();
            match sender.send(job) {
                Ok(()) => return,
                Err(failed) => {
                    // Worker died; replace the queue and retry the send.
                    job = failed.0;
                    self.queues.remove(&account_id);
                }
            }
        }
    }

    fn spawn_worker(&self, account_id: u64) -> mpsc::UnboundedSender<SyncJob> {
        let (tx, mut rx) = mpsc::unbounded_channel::<SyncJob>();
        let storage = Arc::clone(&self.storage);
        tokio::spawn(async move {
            while let Some(job) = rx.recv().await {
                apply_with_retry(storage.as_ref(), account_id, job).await;
            }
        });
        tx
    }

    /// Reads the player's durable record and populates the store unless an
    /// in-memory entry already exists. Returns whether it populated.
    pub async fn hydrate(
        &self,
        player: &PlayerRef,
        store: &LoadoutStore,
    ) -> Result<bool, StorageError> {
        let loadouts = self.storage.read_loadout(player.account_id).await?;
        let populated = store.hydrate_if_absent(player.slot, loadouts);
        debug!(slot = player.slot, account_id = player.account_id, populated, "hydrated");
        Ok(populated)
    }
}

async fn apply_with_retry(storage: &dyn LoadoutStorage, account_id: u64, job: SyncJob) {
    let mut attempt = 0;
    loop {
        match apply(storage, account_id, &job).await {
            Ok(()) => return,
            Err(err) => {
                attempt += 1;
                if attempt >= RETRY_LIMIT {
                    warn!(account_id, %err, "dropping loadout write after {attempt} attempts");
                    return;
                }
                warn!(account_id, %err, attempt, "loadout write failed, retrying");
                tokio::time::sleep(RETRY_BASE * 2u32.pow(attempt - 1)).await;
            }
        }
    }
}

async fn apply(
    storage: &dyn LoadoutStorage,
    account_id: u64,
    job: &SyncJob,
) -> Result<(), StorageError> {
    match job {
        SyncJob::Weapon {
            targets,
            defindex,
            attrs,
        } => {
            for side in targets.sides() {
                match attrs {
                    Some(attrs) => {
                        storage
                            .write_weapon(account_id, side, *defindex, *attrs)
                            .await?
                    }
                    None => storage.clear_weapon(account_id, side, *defindex).await?,
                }
            }
        }
        SyncJob::Knife { targets, class } => {
            for side in targets.sides() {
                storage.write_knife(account_id, side, class).await?;
            }
        }
        SyncJob::Glove { targets, defindex } => {
            for side in targets.sides() {
                storage.write_glove(account_id, side, *defindex).await?;
            }
        }
        SyncJob::Agent { side, model } => {
            storage
                .write_agent(account_id, *side, model.as_deref())
                .await?;
        }
        SyncJob::Music { targets, kit } => {
            for side in targets.sides() {
                storage.write_music(account_id, side, *kit).await?;
            }
        }
        SyncJob::Pin { targets, pin } => {
            for side in targets.sides() {
                storage.write_pin(account_id, side, *pin).await?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::loadout::state::PlayerLoadouts;

    /// In-memory storage double. The first `delayed_writes` writes sleep
    /// before landing and `failures` writes error out, letting tests shape
    /// the races the engine must survive.
    #[derive(Default)]
    pub(crate) struct MockStorage {
        pub loadouts: Mutex<PlayerLoadouts>,
        pub writes: Mutex<Vec<(u64, String)>>,
        pub delayed_writes: AtomicU32,
        pub failures: AtomicU32,
        pub delay: Duration,
    }

    impl MockStorage {
        pub fn new() -> Arc<Self> {
            Arc::new(Self::default())
        }

        pub fn with_first_write_delayed(delay: Duration) -> Arc<Self> {
            Arc::new(Self {
                delayed_writes: AtomicU32::new(1),
                delay,
                ..Self::default()
            })
        }

        async fn record(&self, account_id: u64, description: String) -> Result<(), StorageError> {
            if self
                .delayed_writes
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok()
            {
                tokio::time::sleep(self.delay).await;
            }
            if self
                .failures
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok()
            {
                return Err(StorageError::Database(sqlx::Error::PoolClosed));
            }
            self.writes.lock().unwrap().push((account_id, description));
            Ok(())
        }
    }

    #[async_trait]
    impl LoadoutStorage for MockStorage {
        async fn read_loadout(&self, _account_id: u64) -> Result<PlayerLoadouts, StorageError> {
            Ok(self.loadouts.lock().unwrap().clone())
        }

        async fn write_weapon(
            &self,
            account_id: u64,
            side: Side,
            defindex: u16,
            attrs: WeaponAttributes,
        ) -> Result<(), StorageError> {
            self.record(account_id, format!("weapon:{side:?}:{defindex}:{}", attrs.paint))
                .await?;
            self.loadouts
                .lock()
                .unwrap()
                .side_mut(side)
                .weapons
                .insert(defindex, attrs);
            Ok(())
        }

        async fn clear_weapon(
            &self,
            account_id: u64,
            side: Side,
            defindex: u16,
        ) -> Result<(), StorageError> {
            self.record(account_id, format!("clear:{side:?}:{defindex}")).await?;
            self.loadouts
                .lock()
                .unwrap()
                .side_mut(side)
                .weapons
                .remove(&defindex);
            Ok(())
        }

        async fn write_knife(
            &self,
            account_id: u64,
            side: Side,
            class: &str,
        ) -> Result<(), StorageError> {
            self.record(account_id, format!("knife:{side:?}:{class}")).await?;
            self.loadouts.lock().unwrap().side_mut(side).knife = Some(class.to_owned());
            Ok(())
        }

        async fn write_glove(
            &self,
            account_id: u64,
            side: Side,
            defindex: u16,
        ) -> Result<(), StorageError> {
            self.record(account_id, format!("glove:{side:?}:{defindex}")).await?;
            self.loadouts.lock().unwrap().side_mut(side).glove = defindex;
            Ok(())
        }

        async fn write_agent(
            &self,
            account_id: u64,
            side: Side,
            model: Option<&str>,
        ) -> Result<(), StorageError> {
            self.record(account_id, format!("agent:{side:?}:{model:?}")).await?;
            self.loadouts
                .lock()
                .unwrap()
                .agents
                .set(side, model.map(str::to_owned));
            Ok(())
        }

        async fn write_music(
            &self,
            account_id: u64,
            side: Side,
            kit: u16,
        ) -> Result<(), StorageError> {
            self.record(account_id, format!("music:{side:?}:{kit}")).await?;
            self.loadouts.lock().unwrap().side_mut(side).music = Some(kit);
            Ok(())
        }

        async fn write_pin(
            &self,
            account_id: u64,
            side: Side,
            pin: u16,
        ) -> Result<(), StorageError> {
            self.record(account_id, format!("pin:{side:?}:{pin}")).await?;
            self.loadouts.lock().unwrap().side_mut(side).pin = Some(pin);
            Ok(())
        }
    }

    fn player(slot: i32, account_id: u64) -> PlayerRef {
        PlayerRef {
            slot,
            account_id,
            name: "tester".into(),
            address: "127.0.0.1".into(),
        }
    }

    const ACCOUNT: u64 = 76561198000000001;

    #[tokio::test]
    async fn same_player_jobs_land_in_accepted_order() {
        // M1's write stalls; a racing engine would let M2 finish first and
        // then get clobbered. The per-account worker must hold M2 back.
        let storage = MockStorage::with_first_write_delayed(Duration::from_millis(50));
        let engine = SyncEngine::new(storage.clone());

        engine.enqueue(
            ACCOUNT,
            SyncJob::Music {
                targets: TeamTargets::One(Side::Terrorist),
                kit: 1,
            },
        );
        engine.enqueue(
            ACCOUNT,
            SyncJob::Music {
                targets: TeamTargets::One(Side::Terrorist),
                kit: 2,
            },
        );

        tokio::time::sleep(Duration::from_millis(150)).await;
        let writes = storage.writes.lock().unwrap();
        assert_eq!(
            *writes,
            vec![
                (ACCOUNT, "music:Terrorist:1".to_owned()),
                (ACCOUNT, "music:Terrorist:2".to_owned()),
            ]
        );
        drop(writes);
        assert_eq!(
            storage.loadouts.lock().unwrap().side(Side::Terrorist).music,
            Some(2)
        );
    }

    #[tokio::test]
    async fn failed_write_is_retried_then_dropped() {
        let storage = MockStorage::new();
        storage.failures.store(1, Ordering::SeqCst);
        let engine = SyncEngine::new(storage.clone());

        engine.enqueue(
            ACCOUNT,
            SyncJob::Pin {
                targets: TeamTargets::One(Side::Terrorist),
                pin: 21,
            },
        );
        tokio::time::sleep(Duration::from_millis(400)).await;
        assert_eq!(
            storage.loadouts.lock().unwrap().side(Side::Terrorist).pin,
            Some(21)
        );

        // More failures than the retry limit: the job is dropped, but the
        // queue keeps serving later jobs.
        storage.failures.store(RETRY_LIMIT, Ordering::SeqCst);
        engine.enqueue(
            ACCOUNT,
            SyncJob::Pin {
                targets: TeamTargets::One(Side::Terrorist),
                pin: 22,
            },
        );
        tokio::time::sleep(Duration::from_millis(900)).await;
        assert_eq!(
            storage.loadouts.lock().unwrap().side(Side::Terrorist).pin,
            Some(21)
        );

        engine.enqueue(
            ACCOUNT,
            SyncJob::Pin {
                targets: TeamTargets::One(Side::Terrorist),
                pin: 23,
            },
        );
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(
            storage.loadouts.lock().unwrap().side(Side::Terrorist).pin,
            Some(23)
        );
    }

    #[tokio::test]
    async fn broadcast_job_writes_every_target_side() {
        let storage = MockStorage::new();
        let engine = SyncEngine::new(storage.clone());

        engine.enqueue(
            ACCOUNT,
            SyncJob::Knife {
                targets: TeamTargets::Both,
                class: "weapon_knife_karambit".into(),
            },
        );
        tokio::time::sleep(Duration::from_millis(100)).await;

        let loadouts = storage.loadouts.lock().unwrap();
        for side in Side::BOTH {
            assert_eq!(
                loadouts.side(side).knife.as_deref(),
                Some("weapon_knife_karambit")
            );
        }
    }

    #[tokio::test]
    async fn hydrate_populates_only_absent_slots() {
        let storage = MockStorage::new();
        storage
            .loadouts
            .lock()
            .unwrap()
            .side_mut(Side::CounterTerrorist)
            .glove = 5027;
        let engine = SyncEngine::new(storage.clone());
        let store = LoadoutStore::new();

        let p = player(1, ACCOUNT);
        assert!(engine.hydrate(&p, &store).await.unwrap());
        assert_eq!(store.glove(1, Side::CounterTerrorist), 5027);

        // Live state wins over a second hydration.
        store.set_glove(1, TeamTargets::Both, 4725);
        assert!(!engine.hydrate(&p, &store).await.unwrap());
        assert_eq!(store.glove(1, Side::CounterTerrorist), 4725);
    }
}
