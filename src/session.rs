//! Run start/end boundaries
//!
//! Meta progress is read once when a run starts and written once when it
//! ends. Nothing in here runs mid-frame.

use crate::consts::DASH_COOLDOWN_REDUCED_MS;
use crate::persistence::{ProgressStore, save_or_warn};
use crate::progress::{Feature, PermanentUpgrade, RunSummary, SavedProgress};
use crate::settings::{Character, Settings};
use crate::sim::{ModifierKind, PowerUp, World};

/// Build a new run with permanent upgrades and unlocks applied
pub fn start_run(progress: &SavedProgress, mut settings: Settings, seed: u64, now: f64) -> World {
    if !progress.character_available(settings.character) {
        log::warn!(
            "{} is locked, starting as {}",
            settings.character.as_str(),
            Character::Cowboy.as_str()
        );
        settings.character = Character::Cowboy;
    }

    let mut world = World::new(seed, settings, now);

    let player = &mut world.player;
    player.damage_multiplier *= 1.0 + progress.upgrade_effect(PermanentUpgrade::PlayerDamage);
    player.speed *= 1.0 + progress.upgrade_effect(PermanentUpgrade::PlayerSpeed);
    player.magnet_radius *= 1.0 + progress.upgrade_effect(PermanentUpgrade::MagnetRadius);
    if progress.is_unlocked(Feature::ReducedDashCooldown) {
        player.dash_cooldown = DASH_COOLDOWN_REDUCED_MS;
    }

    world.bonuses.xp_gain = 1.0 + progress.upgrade_effect(PermanentUpgrade::XpGain);
    world.bonuses.enemy_health = 1.0 + progress.upgrade_effect(PermanentUpgrade::EnemyHealth);
    world.bonuses.luck = progress.upgrade_effect(PermanentUpgrade::Luck);

    let unlockable = [
        (Feature::RocketLauncher, PowerUp::Modifier(ModifierKind::HeavyShells)),
        (Feature::DogCompanion, PowerUp::Dog),
        (Feature::NightOwl, PowerUp::Owl),
        (Feature::Doppelganger, PowerUp::Doppelganger),
    ];
    for (feature, power_up) in unlockable {
        if progress.is_unlocked(feature) {
            world.power_ups.push(power_up);
        }
    }

    log::debug!(
        "Run bonuses: {:?}, {} power-ups in pool",
        world.bonuses,
        world.power_ups.len()
    );
    world
}

/// Summarize a finished (or abandoned) run
pub fn summarize(world: &World) -> RunSummary {
    RunSummary {
        score: world.score,
        coins: world.player.coins,
        kills: world.enemies_defeated,
        bosses: world.bosses_defeated,
        level: world.player.level,
        duration_ms: world.elapsed_ms(),
    }
}

/// Bank the run into `progress`; returns the summary and new achievements
pub fn end_run(world: &World, progress: &mut SavedProgress) -> (RunSummary, Vec<&'static str>) {
    let summary = summarize(world);
    let earned = progress.record_run(&summary);
    log::info!(
        "Run banked: {} coins, {} kills, level {} ({} total currency)",
        summary.coins,
        summary.kills,
        summary.level,
        progress.currency
    );
    (summary, earned)
}

/// Bank the run and persist it; storage failures are logged, not raised
pub fn finish_and_save(
    world: &World,
    progress: &mut SavedProgress,
    store: &mut dyn ProgressStore,
) -> (RunSummary, Vec<&'static str>) {
    let result = end_run(world, progress);
    save_or_warn(store, progress);
    result
}
