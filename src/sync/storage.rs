use async_trait::async_trait;
use sqlx::{FromRow, MySqlPool};
use thiserror::Error;

use crate::loadout::state::{PlayerLoadouts, WeaponAttributes};
use crate::loadout::team::Side;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Durable loadout storage, keyed by the external account id. Writes carry
/// post-mutation values for a single side; ordering across writes is the
/// sync engine's job, not the store's.
#[async_trait]
pub trait LoadoutStorage: Send + Sync {
    async fn read_loadout(&self, account_id: u64) -> Result<PlayerLoadouts, StorageError>;
    async fn write_weapon(
        &self,
        account_id: u64,
        side: Side,
        defindex: u16,
        attrs: WeaponAttributes,
    ) -> Result<(), StorageError>;
    async fn clear_weapon(&self, account_id: u64, side: Side, defindex: u16)
    -> Result<(), StorageError>;
    async fn write_knife(&self, account_id: u64, side: Side, class: &str)
    -> Result<(), StorageError>;
    async fn write_glove(&self, account_id: u64, side: Side, defindex: u16)
    -> Result<(), StorageError>;
    async fn write_agent(
        &self,
        account_id: u64,
        side: Side,
        model: Option<&str>,
    ) -> Result<(), StorageError>;
    async fn write_music(&self, account_id: u64, side: Side, kit: u16) -> Result<(), StorageError>;
    async fn write_pin(&self, account_id: u64, side: Side, pin: u16) -> Result<(), StorageError>;
}

/// MySQL-backed storage. One row per (account, side) for single-value
/// categories, one per (account, side, defindex) for weapons, one per
/// account for the two-sided agent record.
pub struct MySqlStorage {
    pool: MySqlPool,
}

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS player_skins (
        steamid BIGINT UNSIGNED NOT NULL,
        weapon_team SMALLINT UNSIGNED NOT NULL,
        weapon_defindex INT NOT NULL,
        weapon_paint_id INT NOT NULL,
        weapon_wear FLOAT NOT NULL DEFAULT 0.01,
        weapon_seed INT NOT NULL DEFAULT 0,
        weapon_stattrak TINYINT(1) NOT NULL DEFAULT 0,
        PRIMARY KEY (steamid, weapon_team, weapon_defindex))",
    "CREATE TABLE IF NOT EXISTS player_knife (
        steamid BIGINT UNSIGNED NOT NULL,
        weapon_team SMALLINT UNSIGNED NOT NULL,
        knife VARCHAR(64) NOT NULL,
        PRIMARY KEY (steamid, weapon_team))",
    "CREATE TABLE IF NOT EXISTS player_gloves (
        steamid BIGINT UNSIGNED NOT NULL,
        weapon_team SMALLINT UNSIGNED NOT NULL,
        weapon_defindex SMALLINT UNSIGNED NOT NULL,
        PRIMARY KEY (steamid, weapon_team))",
    "CREATE TABLE IF NOT EXISTS player_agents (
        steamid BIGINT UNSIGNED NOT NULL,
        agent_t VARCHAR(255) NULL,
        agent_ct VARCHAR(255) NULL,
        PRIMARY KEY (steamid))",
    "CREATE TABLE IF NOT EXISTS player_music (
        steamid BIGINT UNSIGNED NOT NULL,
        weapon_team SMALLINT UNSIGNED NOT NULL,
        music_id SMALLINT UNSIGNED NOT NULL,
        PRIMARY KEY (steamid, weapon_team))",
    "CREATE TABLE IF NOT EXISTS player_pins (
        steamid BIGINT UNSIGNED NOT NULL,
        weapon_team SMALLINT UNSIGNED NOT NULL,
        pin_id SMALLINT UNSIGNED NOT NULL,
        PRIMARY KEY (steamid, weapon_team))",
];

#[derive(FromRow)]
struct SkinRow {
    weapon_team: u16,
    weapon_defindex: i32,
    weapon_paint_id: i32,
    weapon_wear: f32,
    weapon_seed: i32,
    weapon_stattrak: bool,
}

#[derive(FromRow)]
struct KnifeRow {
    weapon_team: u16,
    knife: String,
}

#[derive(FromRow)]
struct GloveRow {
    weapon_team: u16,
    weapon_defindex: u16,
}

#[derive(FromRow)]
struct AgentRow {
    agent_t: Option<String>,
    agent_ct: Option<String>,
}

#[derive(FromRow)]
struct MusicRow {
    weapon_team: u16,
    music_id: u16,
}

#[derive(FromRow)]
struct PinRow {
    weapon_team: u16,
    pin_id: u16,
}

impl MySqlStorage {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    /// Creates any missing tables. Runs once at startup.
    pub async fn ensure_schema(&self) -> Result<(), StorageError> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }
}

fn side_of(team: u16) -> Option<Side> {
    u8::try_from(team).ok().and_then(Side::from_team_num)
}

#[async_trait]
impl LoadoutStorage for MySqlStorage {
    async fn read_loadout(&self, account_id: u64) -> Result<PlayerLoadouts, StorageError> {
        let mut loadouts = PlayerLoadouts::default();

        let skins: Vec<SkinRow> = sqlx::query_as(
            "SELECT weapon_team, weapon_defindex, weapon_paint_id, weapon_wear, weapon_seed,
                    weapon_stattrak
             FROM player_skins WHERE steamid = ?",
        )
        .bind(account_id)
        .fetch_all(&self.pool)
        .await?;
        for row in skins {
            let Some(side) = side_of(row.weapon_team) else { continue };
            let Ok(defindex) = u16::try_from(row.weapon_defindex) else { continue };
            loadouts.side_mut(side).weapons.insert(
                defindex,
                WeaponAttributes {
                    paint: row.weapon_paint_id,
                    wear: row.weapon_wear,
                    seed: row.weapon_seed,
                    stattrak: row.weapon_stattrak,
                },
            );
        }

        let knives: Vec<KnifeRow> =
            sqlx::query_as("SELECT weapon_team, knife FROM player_knife WHERE steamid = ?")
                .bind(account_id)
                .fetch_all(&self.pool)
                .await?;
        for row in knives {
            if let Some(side) = side_of(row.weapon_team) {
                loadouts.side_mut(side).knife = Some(row.knife);
            }
        }

        let gloves: Vec<GloveRow> =
            sqlx::query_as("SELECT weapon_team, weapon_defindex FROM player_gloves WHERE steamid = ?")
                .bind(account_id)
                .fetch_all(&self.pool)
                .await?;
        for row in gloves {
            if let Some(side) = side_of(row.weapon_team) {
                loadouts.side_mut(side).glove = row.weapon_defindex;
            }
        }

        let agents: Option<AgentRow> =
            sqlx::query_as("SELECT agent_t, agent_ct FROM player_agents WHERE steamid = ?")
                .bind(account_id)
                .fetch_optional(&self.pool)
                .await?;
        if let Some(row) = agents {
            loadouts.agents.set(Side::Terrorist, row.agent_t);
            loadouts.agents.set(Side::CounterTerrorist, row.agent_ct);
        }

        let music: Vec<MusicRow> =
            sqlx::query_as("SELECT weapon_team, music_id FROM player_music WHERE steamid = ?")
                .bind(account_id)
                .fetch_all(&self.pool)
                .await?;
        for row in music {
            if let Some(side) = side_of(row.weapon_team) {
                loadouts.side_mut(side).music = Some(row.music_id);
            }
        }

        let pins: Vec<PinRow> =
            sqlx::query_as("SELECT weapon_team, pin_id FROM player_pins WHERE steamid = ?")
                .bind(account_id)
                .fetch_all(&self.pool)
                .await?;
        for row in pins {
            if let Some(side) = side_of(row.weapon_team) {
                loadouts.side_mut(side).pin = Some(row.pin_id);
            }
        }

        Ok(loadouts)
    }

    async fn write_weapon(
        &self,
        account_id: u64,
        side: Side,
        defindex: u16,
        attrs: WeaponAttributes,
    ) -> Result<(), StorageError> {
        sqlx::query(
            "INSERT INTO player_skins (steamid, weapon_team, weapon_defindex, weapon_paint_id,
                                       weapon_wear, weapon_seed, weapon_stattrak)
             VALUES (?, ?, ?, ?, ?, ?, ?)
             ON DUPLICATE KEY UPDATE weapon_paint_id = VALUES(weapon_paint_id),
                                     weapon_wear = VALUES(weapon_wear),
                                     weapon_seed = VALUES(weapon_seed),
                                     weapon_stattrak = VALUES(weapon_stattrak)",
        )
        .bind(account_id)
        .bind(side.team_num() as u16)
        .bind(defindex as i32)
        .bind(attrs.paint)
        .bind(attrs.wear)
        .bind(attrs.seed)
        .bind(attrs.stattrak)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn clear_weapon(
        &self,
        account_id: u64,
        side: Side,
        defindex: u16,
    ) -> Result<(), StorageError> {
        sqlx::query(
            "DELETE FROM player_skins WHERE steamid = ? AND weapon_team = ? AND weapon_defindex = ?",
        )
        .bind(account_id)
        .bind(side.team_num() as u16)
        .bind(defindex as i32)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn write_knife(
        &self,
        account_id: u64,
        side: Side,
        class: &str,
    ) -> Result<(), StorageError> {
        sqlx::query(
            "INSERT INTO player_knife (steamid, weapon_team, knife) VALUES (?, ?, ?)
             ON DUPLICATE KEY UPDATE knife = VALUES(knife)",
        )
        .bind(account_id)
        .bind(side.team_num() as u16)
        .bind(class)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn write_glove(
        &self,
        account_id: u64,
        side: Side,
        defindex: u16,
    ) -> Result<(), StorageError> {
        sqlx::query(
            "INSERT INTO player_gloves (steamid, weapon_team, weapon_defindex) VALUES (?, ?, ?)
             ON DUPLICATE KEY UPDATE weapon_defindex = VALUES(weapon_defindex)",
        )
        .bind(account_id)
        .bind(side.team_num() as u16)
        .bind(defindex)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn write_agent(
        &self,
        account_id: u64,
        side: Side,
        model: Option<&str>,
    ) -> Result<(), StorageError> {
        let statement = match side {
            Side::Terrorist => {
                "INSERT INTO player_agents (steamid, agent_t) VALUES (?, ?)
                 ON DUPLICATE KEY UPDATE agent_t = VALUES(agent_t)"
            }
            Side::CounterTerrorist => {
                "INSERT INTO player_agents (steamid, agent_ct) VALUES (?, ?)
                 ON DUPLICATE KEY UPDATE agent_ct = VALUES(agent_ct)"
            }
        };
        sqlx::query(statement)
            .bind(account_id)
            .bind(model)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn write_music(&self, account_id: u64, side: Side, kit: u16) -> Result<(), StorageError> {
        sqlx::query(
            "INSERT INTO player_music (steamid, weapon_team, music_id) VALUES (?, ?, ?)
             ON DUPLICATE KEY UPDATE music_id = VALUES(music_id)",
        )
        .bind(account_id)
        .bind(side.team_num() as u16)
        .bind(kit)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn write_pin(&self, account_id: u64, side: Side, pin: u16) -> Result<(), StorageError> {
        sqlx::query(
            "INSERT INTO player_pins (steamid, weapon_team, pin_id) VALUES (?, ?, ?)
             ON DUPLICATE KEY UPDATE pin_id = VALUES(pin_id)",
        )
        .bind(account_id)
        .bind(side.team_num() as u16)
        .bind(pin)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
