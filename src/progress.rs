//! Meta progression kept between runs
//!
//! Currency earned in runs buys permanent stat upgrades and one-off feature
//! unlocks. Lifetime stats drive achievements. The whole structure is
//! persisted as JSON by a [`crate::persistence::ProgressStore`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::settings::Character;

/// Permanent stat upgrades bought between runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PermanentUpgrade {
    PlayerDamage,
    PlayerSpeed,
    XpGain,
    EnemyHealth,
    MagnetRadius,
    Luck,
}

/// Pricing and effect of a permanent upgrade
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UpgradeSpec {
    pub base_cost: f64,
    pub cost_growth: f64,
    /// Effect per level (fraction; negative for reductions)
    pub effect: f32,
    pub max_level: u32,
}

impl PermanentUpgrade {
    pub const ALL: [PermanentUpgrade; 6] = [
        PermanentUpgrade::PlayerDamage,
        PermanentUpgrade::PlayerSpeed,
        PermanentUpgrade::XpGain,
        PermanentUpgrade::EnemyHealth,
        PermanentUpgrade::MagnetRadius,
        PermanentUpgrade::Luck,
    ];

    pub fn key(self) -> &'static str {
        match self {
            PermanentUpgrade::PlayerDamage => "playerDamage",
            PermanentUpgrade::PlayerSpeed => "playerSpeed",
            PermanentUpgrade::XpGain => "xpGain",
            PermanentUpgrade::EnemyHealth => "enemyHealth",
            PermanentUpgrade::MagnetRadius => "magnetRadius",
            PermanentUpgrade::Luck => "luck",
        }
    }

    pub fn spec(self) -> UpgradeSpec {
        let (base_cost, cost_growth, effect, max_level) = match self {
            PermanentUpgrade::PlayerDamage => (100.0, 1.2, 0.02, 10),
            PermanentUpgrade::PlayerSpeed => (80.0, 1.2, 0.015, 10),
            PermanentUpgrade::XpGain => (90.0, 1.2, 0.03, 10),
            PermanentUpgrade::EnemyHealth => (150.0, 1.25, -0.02, 5),
            PermanentUpgrade::MagnetRadius => (60.0, 1.2, 0.04, 10),
            PermanentUpgrade::Luck => (200.0, 1.3, 0.001, 5),
        };
        UpgradeSpec {
            base_cost,
            cost_growth,
            effect,
            max_level,
        }
    }
}

/// One-off unlocks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feature {
    ReducedDashCooldown,
    DogCompanion,
    NightOwl,
    Doppelganger,
    RocketLauncher,
}

impl Feature {
    pub const ALL: [Feature; 5] = [
        Feature::ReducedDashCooldown,
        Feature::DogCompanion,
        Feature::NightOwl,
        Feature::Doppelganger,
        Feature::RocketLauncher,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Feature::ReducedDashCooldown => "reduced_dash_cooldown",
            Feature::DogCompanion => "dog_companion",
            Feature::NightOwl => "night_owl",
            Feature::Doppelganger => "doppelganger",
            Feature::RocketLauncher => "rocket_launcher",
        }
    }

    pub fn cost(self) -> u64 {
        match self {
            Feature::ReducedDashCooldown => 1000,
            Feature::DogCompanion => 500,
            Feature::NightOwl => 1300,
            Feature::Doppelganger => 1200,
            Feature::RocketLauncher => 1100,
        }
    }
}

/// Why a purchase was refused
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PurchaseError {
    #[error("not enough currency: need {needed}, have {available}")]
    InsufficientFunds { needed: u64, available: u64 },
    #[error("already at max level")]
    MaxLevel,
    #[error("already unlocked")]
    AlreadyUnlocked,
}

/// Lifetime totals across every run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LifetimeStats {
    pub total_kills: u64,
    pub total_coins: u64,
    pub total_deaths: u64,
    pub total_bosses: u64,
    pub longest_run_ms: f64,
}

/// What a finished run contributes to the meta progress
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunSummary {
    pub score: u64,
    pub coins: u32,
    pub kills: u32,
    pub bosses: u32,
    pub level: u32,
    pub duration_ms: f64,
}

/// Survive this long in one run for "survivor"
pub const SURVIVOR_RUN_MS: f64 = 5.0 * 60.0 * 1000.0;

/// Achievement keys with their unlock checks
const ACHIEVEMENTS: [(&str, fn(&LifetimeStats, &RunSummary) -> bool); 6] = [
    ("first_blood", |s, _| s.total_kills >= 1),
    ("hunter", |s, _| s.total_kills >= 100),
    ("slayer", |s, _| s.total_kills >= 1000),
    ("boss_breaker", |s, _| s.total_bosses >= 1),
    ("survivor", |_, r| r.duration_ms >= SURVIVOR_RUN_MS),
    ("treasure_hunter", |s, _| s.total_coins >= 100),
];

/// Persisted meta progress
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SavedProgress {
    pub currency: u64,
    /// Permanent upgrade key → level
    pub upgrades: BTreeMap<String, u32>,
    /// Feature key → unlocked
    pub unlocked: BTreeMap<String, bool>,
    pub stats: LifetimeStats,
    /// Achievement key → earned
    pub achievements: BTreeMap<String, bool>,
}

impl SavedProgress {
    pub fn upgrade_level(&self, upgrade: PermanentUpgrade) -> u32 {
        self.upgrades.get(upgrade.key()).copied().unwrap_or(0)
    }

    /// Total effect of an upgrade at its current level
    pub fn upgrade_effect(&self, upgrade: PermanentUpgrade) -> f32 {
        upgrade.spec().effect * self.upgrade_level(upgrade) as f32
    }

    /// Price of the next level, or None at max level
    pub fn upgrade_cost(&self, upgrade: PermanentUpgrade) -> Option<u64> {
        let spec = upgrade.spec();
        let level = self.upgrade_level(upgrade);
        if level >= spec.max_level {
            return None;
        }
        // Nudge before flooring so exact products like 100 * 1.2^2 stay 144
        let raw = spec.base_cost * spec.cost_growth.powi(level as i32);
        Some((raw + 1e-6).floor() as u64)
    }

    fn spend(&mut self, cost: u64) -> Result<(), PurchaseError> {
        if self.currency < cost {
            return Err(PurchaseError::InsufficientFunds {
                needed: cost,
                available: self.currency,
            });
        }
        self.currency -= cost;
        Ok(())
    }

    /// Buy the next level of `upgrade`; returns the new level
    pub fn buy_upgrade(&mut self, upgrade: PermanentUpgrade) -> Result<u32, PurchaseError> {
        let cost = self.upgrade_cost(upgrade).ok_or(PurchaseError::MaxLevel)?;
        self.spend(cost)?;
        let level = self.upgrades.entry(upgrade.key().to_string()).or_insert(0);
        *level += 1;
        log::info!("Bought {} level {} for {}", upgrade.key(), *level, cost);
        Ok(*level)
    }

    pub fn is_unlocked(&self, feature: Feature) -> bool {
        self.unlocked.get(feature.key()).copied().unwrap_or(false)
    }

    pub fn unlock(&mut self, feature: Feature) -> Result<(), PurchaseError> {
        if self.is_unlocked(feature) {
            return Err(PurchaseError::AlreadyUnlocked);
        }
        self.spend(feature.cost())?;
        self.unlocked.insert(feature.key().to_string(), true);
        log::info!("Unlocked {}", feature.key());
        Ok(())
    }

    pub fn has_achievement(&self, key: &str) -> bool {
        self.achievements.get(key).copied().unwrap_or(false)
    }

    pub fn character_available(&self, character: Character) -> bool {
        character
            .required_achievement()
            .is_none_or(|key| self.has_achievement(key))
    }

    /// Bank a finished run: coins become currency, stats accumulate, and
    /// newly earned achievements are returned
    pub fn record_run(&mut self, run: &RunSummary) -> Vec<&'static str> {
        self.currency += u64::from(run.coins);
        self.stats.total_coins += u64::from(run.coins);
        self.stats.total_kills += u64::from(run.kills);
        self.stats.total_bosses += u64::from(run.bosses);
        self.stats.total_deaths += 1;
        self.stats.longest_run_ms = self.stats.longest_run_ms.max(run.duration_ms);

        let mut earned = Vec::new();
        for (key, check) in ACHIEVEMENTS {
            if !self.has_achievement(key) && check(&self.stats, run) {
                self.achievements.insert(key.to_string(), true);
                earned.push(key);
            }
        }
        if !earned.is_empty() {
            log::info!("Achievements earned: {:?}", earned);
        }
        earned
    }
}
