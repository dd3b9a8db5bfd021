//! Run event kinds
//!
//! Typed payloads for everything the session layer knows how to log. Each
//! kind turns into an [`EventRecord`] with a fixed `type` tag and field set.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::record::{decimal, EventRecord};

/// A player as it appears in records
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerRef {
    /// Stable network id; absent for players that are not networked yet
    pub id: Option<String>,
    /// Display name
    pub name: String,
}

impl PlayerRef {
    /// Create a player reference with a known id
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            name: name.into(),
        }
    }

    fn id_value(&self) -> Value {
        self.id.clone().map_or(Value::Null, Value::String)
    }
}

/// One chosen skill variant in a loadout
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadoutSlot {
    pub family: String,
    pub variant: String,
}

/// Cumulative combat and economy stats for one player
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerStats {
    pub total_damage_dealt: f64,
    pub total_minion_damage_dealt: f64,
    pub total_kills: f64,
    pub total_minion_kills: f64,
    pub highest_damage_dealt: f64,
    pub total_damage_taken: f64,
    pub gold_collected: f64,
    pub total_gold_purchases: f64,
    pub current_health_fraction: f64,
    pub current_shield_fraction: f64,
    pub current_barrier_fraction: f64,
}

/// Everything that can happen during a run
#[derive(Debug, Clone, PartialEq)]
pub enum RunEvent {
    RunStart {
        game_mode: i64,
        hosted_by: String,
        difficulty: i64,
    },
    StageStart {
        stage_index: i64,
        difficulty_coeff: f64,
    },
    StageFinished {
        difficulty_coeff: f64,
    },
    PlayerSpawn {
        player: PlayerRef,
        survivor_id: i64,
        survivor_name: String,
        loadout: Vec<LoadoutSlot>,
    },
    PlayerDeath {
        player: PlayerRef,
    },
    ItemPickup {
        player: PlayerRef,
        item_id: i64,
        item_name: String,
        count: i64,
    },
    ItemDrop {
        player: PlayerRef,
        item_id: i64,
        item_name: String,
        count: i64,
    },
    MountainShrineActivated,
    BossSpawn {
        boss_id: i64,
        boss_name: String,
    },
    BossDeath {
        boss_id: i64,
        boss_name: String,
    },
    BossUpdate {
        bosses_alive: u32,
        total_health: f64,
    },
    TeleporterStart,
    TeleporterCharged,
    TeleporterUpdate {
        charged_amount: f64,
    },
    TeleporterFinished,
    RunEnd {
        is_win: bool,
    },
    StatsUpdate {
        player: PlayerRef,
        stats: PlayerStats,
    },
}

impl RunEvent {
    /// The `type` tag written for this event
    pub fn kind(&self) -> &'static str {
        match self {
            RunEvent::RunStart { .. } => "RUN_START",
            RunEvent::StageStart { .. } => "STAGE_START",
            RunEvent::StageFinished { .. } => "STAGE_FINISHED",
            RunEvent::PlayerSpawn { .. } => "PLAYER_SPAWN",
            RunEvent::PlayerDeath { .. } => "PLAYER_DEATH",
            RunEvent::ItemPickup { .. } => "ITEM_PICKUP",
            RunEvent::ItemDrop { .. } => "ITEM_DROP",
            RunEvent::MountainShrineActivated => "MOUNTAIN_SHRINE_ACTIVATED",
            RunEvent::BossSpawn { .. } => "BOSS_SPAWN",
            RunEvent::BossDeath { .. } => "BOSS_DEATH",
            RunEvent::BossUpdate { .. } => "BOSS_UPDATE",
            RunEvent::TeleporterStart => "TELEPORTER_START",
            RunEvent::TeleporterCharged => "TELEPORTER_CHARGED",
            RunEvent::TeleporterUpdate { .. } => "TELEPORTER_UPDATE",
            RunEvent::TeleporterFinished => "TELEPORTER_FINISHED",
            RunEvent::RunEnd { .. } => "RUN_END",
            RunEvent::StatsUpdate { .. } => "STATS_UPDATE",
        }
    }

    /// Whether this record is worth writing.
    ///
    /// Item transfers of zero items carry no information and are skipped.
    pub fn is_degenerate(&self) -> bool {
        matches!(
            self,
            RunEvent::ItemPickup { count: 0, .. } | RunEvent::ItemDrop { count: 0, .. }
        )
    }

    /// Whether the stream should be flushed right after this record
    pub fn wants_flush(&self) -> bool {
        matches!(self, RunEvent::RunEnd { .. })
    }

    /// Build the record, stamped with clock readings taken by the caller.
    pub fn to_record(&self, time: f64, stopwatch: f64) -> EventRecord {
        let record = EventRecord::stamped(self.kind(), time, stopwatch);

        match self {
            RunEvent::RunStart {
                game_mode,
                hosted_by,
                difficulty,
            } => record
                .with("gameModeIndex", *game_mode)
                .with("hostedBy", hosted_by.as_str())
                .with("difficulty", *difficulty),

            RunEvent::StageStart {
                stage_index,
                difficulty_coeff,
            } => record
                .with("stageIndex", *stage_index)
                .with_decimal("difficultyCoeff", *difficulty_coeff),

            RunEvent::StageFinished { difficulty_coeff } => {
                record.with_decimal("difficultyCoeff", *difficulty_coeff)
            }

            RunEvent::PlayerSpawn {
                player,
                survivor_id,
                survivor_name,
                loadout,
            } => record
                .with("playerId", player.id_value())
                .with("playerName", player.name.as_str())
                .with("survivorId", *survivor_id)
                .with("survivorName", survivor_name.as_str())
                .with("loadout", json!(loadout)),

            RunEvent::PlayerDeath { player } => record
                .with("playerId", player.id_value())
                .with("playerName", player.name.as_str()),

            RunEvent::ItemPickup {
                player,
                item_id,
                item_name,
                count,
            }
            | RunEvent::ItemDrop {
                player,
                item_id,
                item_name,
                count,
            } => record
                .with("playerId", player.id_value())
                .with("playerName", player.name.as_str())
                .with("itemId", *item_id)
                .with("itemName", item_name.as_str())
                .with("count", *count),

            RunEvent::BossSpawn { boss_id, boss_name } | RunEvent::BossDeath { boss_id, boss_name } => {
                record
                    .with("bossId", *boss_id)
                    .with("bossName", boss_name.as_str())
            }

            RunEvent::BossUpdate {
                bosses_alive,
                total_health,
            } => record
                .with("numBossesAlive", *bosses_alive)
                .with_decimal("totalBossesHealth", *total_health),

            RunEvent::TeleporterUpdate { charged_amount } => {
                record.with_decimal("chargedAmount", *charged_amount)
            }

            RunEvent::RunEnd { is_win } => record.with("isWin", *is_win),

            RunEvent::StatsUpdate { player, stats } => record
                .with("playerId", player.id_value())
                .with("playerName", player.name.as_str())
                .with("totalDamageDealt", decimal(stats.total_damage_dealt))
                .with("totalMinionDamageDealt", decimal(stats.total_minion_damage_dealt))
                .with("totalKills", decimal(stats.total_kills))
                .with("totalMinionKills", decimal(stats.total_minion_kills))
                .with("highestDamageDealt", decimal(stats.highest_damage_dealt))
                .with("totalDamageTaken", decimal(stats.total_damage_taken))
                .with("goldCollected", decimal(stats.gold_collected))
                .with("totalGoldPurchases", decimal(stats.total_gold_purchases))
                .with("currentHealthFraction", decimal(stats.current_health_fraction))
                .with("currentShieldFraction", decimal(stats.current_shield_fraction))
                .with("currentBarrierFraction", decimal(stats.current_barrier_fraction)),

            RunEvent::MountainShrineActivated
            | RunEvent::TeleporterStart
            | RunEvent::TeleporterCharged
            | RunEvent::TeleporterFinished => record,
        }
    }
}
