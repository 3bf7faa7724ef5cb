//! XP, level-up drafts, upgrade effects, and defeat rewards

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::state::{GameEvent, GamePhase, PickupKind, Player, World};
use crate::consts::*;

/// In-run upgrades offered at level-up
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum UpgradeKind {
    Speed,
    FireRate,
    MagnetRadius,
    Damage,
    ProjectileSpeed,
    Knockback,
    Luck,
}

/// Catalog entry for an upgrade
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UpgradeOption {
    pub kind: UpgradeKind,
    pub name: &'static str,
    pub description: &'static str,
    pub value: f32,
}

/// The full level-up catalog; drafts are drawn from this without replacement
pub const UPGRADE_CATALOG: [UpgradeOption; 7] = [
    UpgradeOption {
        kind: UpgradeKind::Speed,
        name: "Fast Runner",
        description: "Increase movement speed by 8%",
        value: 0.08,
    },
    UpgradeOption {
        kind: UpgradeKind::FireRate,
        name: "Rapid Fire",
        description: "Increase fire rate by 8%",
        value: 0.08,
    },
    UpgradeOption {
        kind: UpgradeKind::MagnetRadius,
        name: "Magnet Field",
        description: "Increase pickup radius by 8%",
        value: 0.08,
    },
    UpgradeOption {
        kind: UpgradeKind::Damage,
        name: "Increased Damage",
        description: "Increase projectile damage by 15%",
        value: 0.15,
    },
    UpgradeOption {
        kind: UpgradeKind::ProjectileSpeed,
        name: "Swift Shots",
        description: "Increase projectile speed by 8%",
        value: 0.08,
    },
    UpgradeOption {
        kind: UpgradeKind::Knockback,
        name: "Power Shot",
        description: "Projectiles knock enemies back by 8%",
        value: 0.08,
    },
    UpgradeOption {
        kind: UpgradeKind::Luck,
        name: "Lucky Charm",
        description: "Increase pickup drop rate by 0.5%",
        value: 0.005,
    },
];

impl UpgradeKind {
    /// Name used in the upgrade-level map
    pub fn key(self) -> &'static str {
        match self {
            UpgradeKind::Speed => "speed",
            UpgradeKind::FireRate => "fireRate",
            UpgradeKind::MagnetRadius => "magnetRadius",
            UpgradeKind::Damage => "damage",
            UpgradeKind::ProjectileSpeed => "projectileSpeed",
            UpgradeKind::Knockback => "knockback",
            UpgradeKind::Luck => "luck",
        }
    }

    pub fn option(self) -> &'static UpgradeOption {
        UPGRADE_CATALOG
            .iter()
            .find(|o| o.kind == self)
            .unwrap_or(&UPGRADE_CATALOG[0])
    }
}

/// Score for a regular defeat and for a boss
pub const DEFEAT_SCORE: u64 = 10;
pub const BOSS_DEFEAT_SCORE: u64 = 100;
/// XP granted directly by each defeat
pub const DEFEAT_XP: f32 = 1.0;

/// Base drop chances per defeat
pub const XP_GEM_CHANCE: f32 = 0.3;
pub const APPLE_CHANCE: f32 = 0.02;
pub const BOX_CHANCE: f32 = 0.01;

/// Knockback distance (pixels) per point of knockback strength
pub const KNOCKBACK_DISTANCE: f32 = 100.0;

/// Draw up to `count` distinct items from `pool` without replacement
pub fn draw_without_replacement<T: Copy, R: Rng + ?Sized>(pool: &[T], count: usize, rng: &mut R) -> Vec<T> {
    let amount = count.min(pool.len());
    rand::seq::index::sample(rng, pool.len(), amount)
        .into_iter()
        .map(|i| pool[i])
        .collect()
}

/// A level-up draft from the full catalog
pub fn draw_draft<R: Rng + ?Sized>(count: usize, rng: &mut R) -> Vec<UpgradeKind> {
    let kinds: Vec<UpgradeKind> = UPGRADE_CATALOG.iter().map(|o| o.kind).collect();
    draw_without_replacement(&kinds, count, rng)
}

/// XP needed for the level after one needing `current`
pub fn next_threshold(current: u32) -> u32 {
    (current as f32 * XP_GROWTH).ceil() as u32
}

/// Minimum time between shots for a given fire-rate upgrade level
pub fn fire_interval_ms(fire_rate_level: u32) -> f64 {
    let scaled = BASE_FIRE_INTERVAL_MS * (1.0 - fire_rate_level as f64 * FIRE_RATE_PER_LEVEL);
    scaled.max(MIN_FIRE_INTERVAL_MS)
}

/// Roll the pickups dropped by one defeat
pub fn roll_drops<R: Rng + ?Sized>(luck: f32, rng: &mut R) -> Vec<PickupKind> {
    let mut drops = Vec::new();
    if rng.random::<f32>() < XP_GEM_CHANCE + luck {
        drops.push(PickupKind::XpGem);
    }
    if rng.random::<f32>() < APPLE_CHANCE {
        drops.push(PickupKind::Apple);
    }
    if rng.random::<f32>() < BOX_CHANCE + luck {
        drops.push(PickupKind::Box);
    }
    drops
}

/// Apply one level of `kind` to the player's stats
pub fn apply_upgrade(player: &mut Player, kind: UpgradeKind) {
    let value = kind.option().value;
    match kind {
        UpgradeKind::Speed => player.speed *= 1.0 + value,
        // Read through the level counter by `fire_interval_ms`
        UpgradeKind::FireRate => {}
        UpgradeKind::MagnetRadius => player.magnet_radius *= 1.0 + value,
        UpgradeKind::Damage => player.damage_multiplier *= 1.0 + value,
        UpgradeKind::ProjectileSpeed => player.projectile_speed_multiplier *= 1.0 + value,
        UpgradeKind::Knockback => player.knockback_strength += value,
        UpgradeKind::Luck => player.luck += value,
    }
    *player.upgrade_levels.entry(kind).or_insert(0) += 1;
}

impl World {
    /// Add XP (scaled by the permanent XP bonus) and open a draft if the
    /// threshold is reached
    pub fn grant_xp(&mut self, amount: f32) {
        self.xp_collected += amount;
        self.add_xp(amount * self.bonuses.xp_gain);
    }

    fn add_xp(&mut self, amount: f32) {
        self.player.xp += amount;
        if self.pending_draft.is_none() && self.player.xp >= self.player.xp_to_next as f32 {
            self.open_level_up();
        }
    }

    fn open_level_up(&mut self) {
        let draft = draw_draft(self.settings.draft_size(), &mut self.rng);
        log::info!(
            "Level up available at level {} (draft of {})",
            self.player.level,
            draft.len()
        );
        self.pending_draft = Some(draft);
        self.phase = GamePhase::LevelUp;
        self.events.push(GameEvent::LevelUpReady {
            level: self.player.level + 1,
        });
    }

    /// Options currently awaiting a choice
    pub fn draft(&self) -> Option<&[UpgradeKind]> {
        self.pending_draft.as_deref()
    }

    /// Commit the draft option at `index` and resume the simulation
    pub fn choose_upgrade(&mut self, index: usize) -> Option<UpgradeKind> {
        if self.phase != GamePhase::LevelUp {
            return None;
        }
        let kind = *self.pending_draft.as_ref()?.get(index)?;
        apply_upgrade(&mut self.player, kind);

        self.pending_draft = None;
        self.player.level += 1;
        self.player.xp = 0.0;
        self.player.xp_to_next = next_threshold(self.player.xp_to_next);
        self.phase = GamePhase::Playing;
        self.events.push(GameEvent::UpgradeChosen(kind));
        log::info!("Chose {:?}, now level {}", kind, self.player.level);
        Some(kind)
    }

    /// Spend apples at the merchant for a full level's worth of XP
    pub fn trade_apples_for_xp(&mut self) -> bool {
        if self.phase != GamePhase::Merchant || self.player.apples < MERCHANT_APPLE_PRICE {
            return false;
        }
        self.player.apples -= MERCHANT_APPLE_PRICE;
        self.add_xp(self.player.xp_to_next as f32);
        log::info!("Traded {} apples for XP", MERCHANT_APPLE_PRICE);
        true
    }

    /// Close the merchant and resume play
    pub fn leave_merchant(&mut self) {
        if self.phase == GamePhase::Merchant {
            self.phase = GamePhase::Playing;
            self.events.push(GameEvent::MerchantClosed);
        }
    }

    /// Total luck from in-run upgrades and permanent bonuses
    pub fn luck(&self) -> f32 {
        self.player.luck + self.bonuses.luck
    }

    /// Rewards for defeating the enemy at `index` (already at zero health)
    pub fn on_enemy_defeated(&mut self, index: usize) {
        let Some(enemy) = self.enemies.get(index) else {
            return;
        };
        let (pos, species, is_boss) = (enemy.pos, enemy.species, enemy.is_boss);

        self.enemies_defeated += 1;
        self.player.coins += 1;
        if is_boss {
            self.bosses_defeated += 1;
            self.score += BOSS_DEFEAT_SCORE;
        } else {
            self.score += DEFEAT_SCORE;
        }
        self.events.push(GameEvent::EnemyDefeated { species, is_boss });

        let mut drops = roll_drops(self.luck(), &mut self.rng);
        if is_boss && !drops.contains(&PickupKind::Box) {
            drops.push(PickupKind::Box);
        }
        for kind in drops {
            let offset = Vec2::new(
                self.rng.random_range(-8.0..8.0),
                self.rng.random_range(-8.0..8.0),
            );
            self.spawn_pickup(kind, pos + offset);
        }

        self.grant_xp(DEFEAT_XP);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Settings;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;
    use std::collections::BTreeSet;

    fn world() -> World {
        World::new(5, Settings::default(), 0.0)
    }

    #[test]
    fn test_fire_interval_clamps() {
        assert_eq!(fire_interval_ms(0), 400.0);
        assert!((fire_interval_ms(5) - 240.0).abs() < 1e-9);
        assert_eq!(fire_interval_ms(12), MIN_FIRE_INTERVAL_MS);
        assert_eq!(fire_interval_ms(50), MIN_FIRE_INTERVAL_MS);
    }

    #[test]
    fn test_threshold_growth() {
        assert_eq!(next_threshold(3), 4);
        assert_eq!(next_threshold(4), 5);
        assert_eq!(next_threshold(10), 12);
    }

    #[test]
    fn test_draft_is_distinct_and_bounded() {
        let mut rng = Pcg32::seed_from_u64(2);
        for count in 0..10 {
            let draft = draw_draft(count, &mut rng);
            assert_eq!(draft.len(), count.min(UPGRADE_CATALOG.len()));
            let unique: BTreeSet<_> = draft.iter().collect();
            assert_eq!(unique.len(), draft.len());
        }
    }

    #[test]
    fn test_reaching_threshold_opens_draft() {
        let mut w = world();
        w.grant_xp(2.0);
        assert_eq!(w.phase, GamePhase::Playing);
        w.grant_xp(1.0);
        assert_eq!(w.phase, GamePhase::LevelUp);
        assert_eq!(w.draft().map(<[_]>::len), Some(3));
    }

    #[test]
    fn test_choose_upgrade_applies_and_resumes() {
        let mut w = world();
        w.grant_xp(3.0);
        let offered = w.draft().expect("draft open")[1];
        let before = w.player.clone();

        assert_eq!(w.choose_upgrade(1), Some(offered));
        assert_eq!(w.phase, GamePhase::Playing);
        assert_eq!(w.player.level, before.level + 1);
        assert_eq!(w.player.xp, 0.0);
        assert_eq!(w.player.xp_to_next, 4);
        assert_eq!(w.player.upgrade_level(offered), 1);
        assert!(w.draft().is_none());
        // A second commit is rejected
        assert_eq!(w.choose_upgrade(0), None);
    }

    #[test]
    fn test_choose_out_of_range_keeps_draft_open() {
        let mut w = world();
        w.grant_xp(3.0);
        assert_eq!(w.choose_upgrade(7), None);
        assert_eq!(w.phase, GamePhase::LevelUp);
    }

    #[test]
    fn test_xp_while_draft_open_does_not_redraw() {
        let mut w = world();
        w.grant_xp(3.0);
        let first = w.draft().expect("draft").to_vec();
        w.grant_xp(10.0);
        assert_eq!(w.draft().expect("draft"), first.as_slice());
    }

    #[test]
    fn test_hardcore_draft_offers_two() {
        let settings = Settings {
            hardcore: true,
            ..Default::default()
        };
        let mut w = World::new(1, settings, 0.0);
        w.grant_xp(3.0);
        assert_eq!(w.draft().map(<[_]>::len), Some(2));
    }

    #[test]
    fn test_apply_upgrade_effects() {
        let mut p = Player::new(Vec2::ZERO);
        apply_upgrade(&mut p, UpgradeKind::Damage);
        apply_upgrade(&mut p, UpgradeKind::Damage);
        assert!((p.damage_multiplier - 1.15 * 1.15).abs() < 1e-5);
        assert_eq!(p.upgrade_level(UpgradeKind::Damage), 2);

        apply_upgrade(&mut p, UpgradeKind::Knockback);
        assert!((p.knockback_strength - 0.08).abs() < 1e-6);

        apply_upgrade(&mut p, UpgradeKind::FireRate);
        assert_eq!(p.upgrade_level(UpgradeKind::FireRate), 1);
    }

    #[test]
    fn test_defeat_rewards() {
        let mut w = world();
        let id = w.spawn_enemy_at(crate::sim::Species::Zombie, Vec2::new(100.0, 100.0));
        let index = w.enemies.iter().position(|e| e.id == id).expect("spawned");
        w.enemies[index].health = 0.0;
        w.on_enemy_defeated(index);
        assert_eq!(w.score, DEFEAT_SCORE);
        assert_eq!(w.player.coins, 1);
        assert_eq!(w.enemies_defeated, 1);
        assert_eq!(w.player.xp, DEFEAT_XP);
    }

    #[test]
    fn test_merchant_trade() {
        let mut w = world();
        w.player.apples = 2;
        assert!(!w.trade_apples_for_xp());

        w.phase = GamePhase::Merchant;
        assert!(!w.trade_apples_for_xp());
        w.player.apples = 4;
        assert!(w.trade_apples_for_xp());
        assert_eq!(w.player.apples, 1);
        assert_eq!(w.phase, GamePhase::LevelUp);
    }

    #[test]
    fn test_leave_merchant_resumes() {
        let mut w = world();
        w.phase = GamePhase::Merchant;
        w.leave_merchant();
        assert_eq!(w.phase, GamePhase::Playing);
        assert!(w.drain_events().contains(&GameEvent::MerchantClosed));
    }

    #[test]
    fn test_boss_always_drops_box() {
        let mut w = world();
        let id = w.spawn_boss(crate::sim::Species::Zombie);
        let index = w.enemies.iter().position(|e| e.id == id).expect("boss");
        w.on_enemy_defeated(index);
        assert!(w.pickups.iter().any(|p| p.kind == PickupKind::Box));
        assert_eq!(w.score, BOSS_DEFEAT_SCORE);
        assert_eq!(w.bosses_defeated, 1);
    }
}
