//! World state and core simulation types
//!
//! Everything the frame step reads or writes lives in [`World`]. The
//! per-run RNG is seeded once so a run is reproducible from its seed and
//! the input stream.

use std::collections::{BTreeMap, BTreeSet};

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::bounds::Aabb;
use super::collision::Target;
use super::companion::Companions;
use super::enemy::{Enemy, Species, base_speed_for, edge_spawn_position};
use super::progression::UpgradeKind;
use super::quadtree::Quadtree;
use super::weapon::WeaponPool;
use crate::consts::*;
use crate::settings::{Character, Settings};

/// Current phase of gameplay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Active gameplay
    Playing,
    /// Paused by the player
    Paused,
    /// Waiting for an upgrade choice
    LevelUp,
    /// Trading with the merchant
    Merchant,
    /// Run ended
    GameOver,
}

/// Something that happened during a frame; drained by the host for
/// sound and UI feedback
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GameEvent {
    ShotFired,
    EnemyDefeated { species: Species, is_boss: bool },
    BossSpawned(Species),
    PlayerHit { lives_left: u32 },
    XpCollected,
    AppleCollected,
    PowerUpCollected(PowerUp),
    LevelUpReady { level: u32 },
    UpgradeChosen(UpgradeKind),
    Dashed,
    MerchantArrived,
    MerchantOpened,
    MerchantClosed,
    PlayerTwoJoined,
    GameOver,
}

/// Weapon modifiers granted by mystery boxes
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ModifierKind {
    /// Fan of shots; stacks
    VShape,
    /// Shots pass through a second enemy
    Ricochet,
    /// Also fire backwards
    DualGun,
    /// Aim at the nearest enemy regardless of input
    AutoAim,
    /// Spread of pellets instead of a single bullet
    Shotgun,
    /// Big, double-damage shells that pierce three enemies
    HeavyShells,
}

/// What a mystery box can grant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PowerUp {
    Modifier(ModifierKind),
    Dog,
    Owl,
    Doppelganger,
}

/// Power-ups available in every run
pub const BASE_POWER_UPS: [PowerUp; 5] = [
    PowerUp::Modifier(ModifierKind::VShape),
    PowerUp::Modifier(ModifierKind::Ricochet),
    PowerUp::Modifier(ModifierKind::DualGun),
    PowerUp::Modifier(ModifierKind::AutoAim),
    PowerUp::Modifier(ModifierKind::Shotgun),
];

/// Active weapon modifiers
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifiers {
    active: BTreeSet<ModifierKind>,
    /// Extra shots in the V-shape fan
    pub v_shape_level: u32,
}

impl Modifiers {
    pub fn has(&self, kind: ModifierKind) -> bool {
        self.active.contains(&kind)
    }

    pub fn grant(&mut self, kind: ModifierKind) {
        if kind == ModifierKind::VShape {
            self.v_shape_level += 1;
        }
        self.active.insert(kind);
    }

    pub fn iter(&self) -> impl Iterator<Item = ModifierKind> + '_ {
        self.active.iter().copied()
    }
}

/// The player avatar
#[derive(Debug, Clone)]
pub struct Player {
    pub pos: Vec2,
    pub size: f32,
    /// Pixels per frame
    pub speed: f32,
    /// Last aim or movement angle
    pub facing_angle: f32,
    pub lives: u32,
    pub max_lives: u32,
    pub xp: f32,
    pub xp_to_next: u32,
    pub level: u32,
    pub coins: u32,
    pub apples: u32,
    pub magnet_radius: f32,

    pub is_dashing: bool,
    pub last_dash_time: f64,
    pub dash_cooldown: f64,
    pub dash_end_time: f64,
    /// Absolute time until which the player cannot be hurt
    pub invincible_until: f64,

    pub damage_multiplier: f32,
    pub projectile_size_multiplier: f32,
    pub projectile_speed_multiplier: f32,
    pub knockback_strength: f32,
    pub luck: f32,
    /// Levels taken of each in-run upgrade
    pub upgrade_levels: BTreeMap<UpgradeKind, u32>,

    pub character: Character,
    pub last_fire_time: f64,
}

impl Player {
    pub fn new(pos: Vec2) -> Self {
        Self {
            pos,
            size: PLAYER_SIZE,
            speed: PLAYER_BASE_SPEED,
            facing_angle: 0.0,
            lives: PLAYER_LIVES,
            max_lives: PLAYER_LIVES,
            xp: 0.0,
            xp_to_next: FIRST_LEVEL_XP,
            level: 1,
            coins: 0,
            apples: 0,
            magnet_radius: PLAYER_MAGNET_RADIUS,
            is_dashing: false,
            last_dash_time: f64::NEG_INFINITY,
            dash_cooldown: DASH_COOLDOWN_MS,
            dash_end_time: 0.0,
            invincible_until: f64::NEG_INFINITY,
            damage_multiplier: 1.0,
            projectile_size_multiplier: 1.0,
            projectile_speed_multiplier: 1.0,
            knockback_strength: 0.0,
            luck: 0.0,
            upgrade_levels: BTreeMap::new(),
            character: Character::Cowboy,
            last_fire_time: f64::NEG_INFINITY,
        }
    }

    #[inline]
    pub fn radius(&self) -> f32 {
        self.size / 2.0
    }

    pub fn is_invincible(&self, now: f64) -> bool {
        now < self.invincible_until
    }

    /// Extend invincibility to `until`; overlapping grants never shorten it
    pub fn grant_invincibility(&mut self, until: f64) {
        self.invincible_until = self.invincible_until.max(until);
    }

    pub fn upgrade_level(&self, kind: UpgradeKind) -> u32 {
        self.upgrade_levels.get(&kind).copied().unwrap_or(0)
    }

    pub fn can_dash(&self, now: f64) -> bool {
        !self.is_dashing && now - self.last_dash_time >= self.dash_cooldown
    }

    /// Start a dash if the cooldown allows
    pub fn try_dash(&mut self, now: f64) -> bool {
        if !self.can_dash(now) {
            return false;
        }
        self.is_dashing = true;
        self.last_dash_time = now;
        self.dash_end_time = now + DASH_DURATION_MS;
        self.grant_invincibility(self.dash_end_time);
        true
    }

    /// End the dash once its duration has passed
    pub fn update_dash(&mut self, now: f64) {
        if self.is_dashing && now >= self.dash_end_time {
            self.is_dashing = false;
        }
    }

    /// Movement speed this frame
    pub fn current_speed(&self) -> f32 {
        if self.is_dashing {
            self.speed * DASH_SPEED_FACTOR
        } else {
            self.speed
        }
    }
}

/// Collectible kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PickupKind {
    XpGem,
    /// Restores a life; also merchant currency
    Apple,
    /// Mystery box granting a power-up
    Box,
}

impl PickupKind {
    pub fn size(self) -> f32 {
        match self {
            PickupKind::XpGem => 12.0,
            PickupKind::Apple => 20.0,
            PickupKind::Box => 25.0,
        }
    }

    /// How long the pickup stays on the ground, if it expires
    pub fn lifetime_ms(self) -> Option<f64> {
        match self {
            PickupKind::Apple => Some(APPLE_LIFETIME_MS),
            _ => None,
        }
    }
}

pub const APPLE_LIFETIME_MS: f64 = 5000.0;

/// A collectible on the ground
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pickup {
    pub id: u32,
    pub kind: PickupKind,
    pub pos: Vec2,
    pub size: f32,
    pub expires_at: Option<f64>,
}

/// Obstacle kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DestructibleKind {
    /// Breaks in one hit and drops a box
    Barrel,
    /// Never breaks; absorbs projectiles
    Brick,
}

pub const BARREL_COUNT: usize = 5;
pub const BRICK_COUNT: usize = 4;
pub const BARREL_SIZE: f32 = 15.0;
pub const BRICK_SIZE: f32 = 30.0;
/// Obstacles are never placed closer than this to the world centre
pub const OBSTACLE_CLEARANCE: f32 = 200.0;

/// A static obstacle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Destructible {
    pub id: u32,
    pub kind: DestructibleKind,
    pub pos: Vec2,
    pub size: f32,
    pub health: f32,
}

impl Destructible {
    #[inline]
    pub fn radius(&self) -> f32 {
        self.size / 2.0
    }

    pub fn is_destroyed(&self) -> bool {
        self.health <= 0.0
    }
}

/// The travelling merchant
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Merchant {
    pub pos: Vec2,
    pub size: f32,
}

/// Permanent meta bonuses applied to a run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunBonuses {
    pub xp_gain: f32,
    pub enemy_health: f32,
    pub luck: f32,
}

impl Default for RunBonuses {
    fn default() -> Self {
        Self {
            xp_gain: 1.0,
            enemy_health: 1.0,
            luck: 0.0,
        }
    }
}

/// Complete state of one run
#[derive(Debug, Clone)]
pub struct World {
    pub settings: Settings,
    pub rng: Pcg32,
    pub phase: GamePhase,
    /// Run start (ms)
    pub started_at: f64,
    /// Timestamp of the most recent frame
    pub now: f64,

    pub player: Player,
    pub enemies: Vec<Enemy>,
    pub weapons: WeaponPool,
    pub pickups: Vec<Pickup>,
    pub destructibles: Vec<Destructible>,
    pub merchant: Option<Merchant>,
    pub companions: Companions,
    pub modifiers: Modifiers,
    /// Power-ups a box may grant this run
    pub power_ups: Vec<PowerUp>,
    pub bonuses: RunBonuses,

    pub score: u64,
    pub enemies_defeated: u32,
    pub bosses_defeated: u32,
    pub xp_collected: f32,

    pub pending_draft: Option<Vec<UpgradeKind>>,
    /// Highest player level that has already produced a boss
    pub last_boss_level: u32,
    pub last_enemy_spawn: f64,
    pub last_merchant_spawn: f64,

    /// Broad phase, rebuilt each frame
    pub index: Quadtree<Target>,
    pub events: Vec<GameEvent>,
    next_id: u32,
}

/// Centre of the world
pub fn world_center() -> Vec2 {
    Vec2::new(WORLD_WIDTH / 2.0, WORLD_HEIGHT / 2.0)
}

impl World {
    /// Fresh run with the player at the centre and obstacles placed
    pub fn new(seed: u64, settings: Settings, now: f64) -> Self {
        let mut player = Player::new(world_center());
        player.character = settings.character;

        let mut world = Self {
            settings,
            rng: Pcg32::seed_from_u64(seed),
            phase: GamePhase::Playing,
            started_at: now,
            now,
            player,
            enemies: Vec::new(),
            weapons: WeaponPool::default(),
            pickups: Vec::new(),
            destructibles: Vec::new(),
            merchant: None,
            companions: Companions::default(),
            modifiers: Modifiers::default(),
            power_ups: BASE_POWER_UPS.to_vec(),
            bonuses: RunBonuses::default(),
            score: 0,
            enemies_defeated: 0,
            bosses_defeated: 0,
            xp_collected: 0.0,
            pending_draft: None,
            last_boss_level: 0,
            last_enemy_spawn: now,
            last_merchant_spawn: now,
            index: Quadtree::new(
                Aabb::new(0.0, 0.0, WORLD_WIDTH, WORLD_HEIGHT),
                QUADTREE_MAX_OBJECTS,
                QUADTREE_MAX_LEVELS,
            ),
            events: Vec::new(),
            next_id: 1,
        };
        world.place_initial_obstacles();
        log::info!("New run (seed {}, {:?})", seed, world.settings.difficulty);
        world
    }

    /// Allocate a new entity id (shared by enemies, obstacles, and pickups)
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Milliseconds since the run started
    pub fn elapsed_ms(&self) -> f64 {
        self.now - self.started_at
    }

    pub fn is_over(&self) -> bool {
        self.phase == GamePhase::GameOver
    }

    /// Take the events produced since the last drain
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Add a fully built enemy, assigning it a fresh id
    pub fn insert_enemy(&mut self, mut enemy: Enemy) -> u32 {
        enemy.id = self.next_entity_id();
        let id = enemy.id;
        self.enemies.push(enemy);
        id
    }

    /// Spawn a regular enemy of `species` at `pos`
    pub fn spawn_enemy_at(&mut self, species: Species, pos: Vec2) -> u32 {
        let config = species.config();
        let speed = base_speed_for(self.settings.difficulty, self.player.level) * config.speed_multiplier;
        let health = config.base_health * self.bonuses.enemy_health;
        let enemy = Enemy::new(0, species, pos, speed, health, self.now);
        self.insert_enemy(enemy)
    }

    /// Spawn a random eligible species just outside the world edge,
    /// unless the live enemy cap is reached
    pub fn spawn_random_enemy(&mut self) -> Option<u32> {
        if self.enemies.len() >= self.settings.max_enemies {
            return None;
        }
        let eligible: Vec<Species> = Species::eligible(self.player.level).collect();
        let species = eligible[self.rng.random_range(0..eligible.len())];
        let pos = edge_spawn_position(&mut self.rng, SPAWN_EDGE_OFFSET);
        Some(self.spawn_enemy_at(species, pos))
    }

    /// Spawn a boss mimicking `species`
    pub fn spawn_boss(&mut self, species: Species) -> u32 {
        let pos = edge_spawn_position(&mut self.rng, SPAWN_EDGE_OFFSET);
        let base = base_speed_for(self.settings.difficulty, self.player.level);
        let boss = Enemy::boss(0, species, pos, base, self.now);
        let id = self.insert_enemy(boss);
        self.events.push(GameEvent::BossSpawned(species));
        log::info!("Boss {} spawned at level {}", species.name(), self.player.level);
        id
    }

    /// Spawn a boss with a random mimic
    pub fn spawn_random_boss(&mut self) -> u32 {
        let mimics = Species::BOSS_MIMICS;
        let species = mimics[self.rng.random_range(0..mimics.len())];
        self.spawn_boss(species)
    }

    pub fn spawn_pickup(&mut self, kind: PickupKind, pos: Vec2) -> u32 {
        let id = self.next_entity_id();
        self.pickups.push(Pickup {
            id,
            kind,
            pos,
            size: kind.size(),
            expires_at: kind.lifetime_ms().map(|life| self.now + life),
        });
        id
    }

    pub fn spawn_destructible(&mut self, kind: DestructibleKind, pos: Vec2) -> u32 {
        let id = self.next_entity_id();
        let (size, health) = match kind {
            DestructibleKind::Barrel => (BARREL_SIZE, 1.0),
            DestructibleKind::Brick => (BRICK_SIZE, f32::INFINITY),
        };
        self.destructibles.push(Destructible {
            id,
            kind,
            pos,
            size,
            health,
        });
        id
    }

    /// Scatter barrels and bricks away from the spawn point
    pub fn place_initial_obstacles(&mut self) {
        let layout = std::iter::repeat_n(DestructibleKind::Barrel, BARREL_COUNT)
            .chain(std::iter::repeat_n(DestructibleKind::Brick, BRICK_COUNT));
        for kind in layout {
            let pos = self.random_obstacle_position();
            self.spawn_destructible(kind, pos);
        }
    }

    fn random_obstacle_position(&mut self) -> Vec2 {
        let margin = 50.0;
        let center = world_center();
        loop {
            let pos = Vec2::new(
                self.rng.random_range(margin..WORLD_WIDTH - margin),
                self.rng.random_range(margin..WORLD_HEIGHT - margin),
            );
            if pos.distance(center) >= OBSTACLE_CLEARANCE {
                return pos;
            }
        }
    }

    /// Grant a random power-up from this run's pool
    pub fn grant_random_power_up(&mut self) -> Option<PowerUp> {
        if self.power_ups.is_empty() {
            return None;
        }
        let power_up = self.power_ups[self.rng.random_range(0..self.power_ups.len())];
        self.grant_power_up(power_up);
        Some(power_up)
    }

    pub fn grant_power_up(&mut self, power_up: PowerUp) {
        match power_up {
            PowerUp::Modifier(kind) => self.modifiers.grant(kind),
            PowerUp::Dog => self.companions.summon_dog(self.player.pos),
            PowerUp::Owl => self.companions.summon_owl(self.player.pos, self.now),
            PowerUp::Doppelganger => self.companions.summon_doppelganger(self.player.pos, self.now),
        }
        self.events.push(GameEvent::PowerUpCollected(power_up));
        log::info!("Power-up: {:?}", power_up);
    }

    /// End the run
    pub fn game_over(&mut self) {
        if self.phase == GamePhase::GameOver {
            return;
        }
        self.phase = GamePhase::GameOver;
        self.pending_draft = None;
        self.companions.clear();
        self.events.push(GameEvent::GameOver);
        log::info!(
            "Game over: score {}, level {}, {} defeated",
            self.score,
            self.player.level,
            self.enemies_defeated
        );
    }

    /// Remove enemies and obstacles destroyed during the frame
    pub fn remove_dead(&mut self) {
        self.enemies.retain(|e| !e.is_dead());
        self.destructibles.retain(|d| !d.is_destroyed());
    }
}
