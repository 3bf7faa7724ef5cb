//! Horde Survivor - simulation core for a top-down survival arena
//!
//! Core modules:
//! - `sim`: Per-frame simulation (spatial index, weapons, collisions, progression)
//! - `platform`: Wall-clock time
//! - `persistence`: Progress stores (memory, JSON file, LocalStorage)
//! - `progress`: Meta progression kept between runs
//! - `session`: Run start/end boundaries
//! - `settings`: Run configuration
//! - `audio`: Fire-and-forget sound notifications
//! - `web`: Browser host bindings (wasm32 only)

pub mod audio;
pub mod persistence;
pub mod platform;
pub mod progress;
pub mod session;
pub mod settings;
pub mod sim;
#[cfg(target_arch = "wasm32")]
pub mod web;

pub use progress::SavedProgress;
pub use settings::{Character, Difficulty, Settings};

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// World dimensions (pixels)
    pub const WORLD_WIDTH: f32 = 1125.0 * 1.5;
    pub const WORLD_HEIGHT: f32 = 845.0 * 1.5;

    /// Player defaults
    pub const PLAYER_SIZE: f32 = 35.0;
    pub const PLAYER_BASE_SPEED: f32 = 1.4;
    pub const PLAYER_LIVES: u32 = 3;
    pub const PLAYER_MAGNET_RADIUS: f32 = 46.0;
    /// XP needed for the first level-up
    pub const FIRST_LEVEL_XP: u32 = 3;
    /// Threshold growth per level
    pub const XP_GROWTH: f32 = 1.2;

    /// Dash
    pub const DASH_DURATION_MS: f64 = 300.0;
    pub const DASH_COOLDOWN_MS: f64 = 6000.0;
    pub const DASH_COOLDOWN_REDUCED_MS: f64 = 3000.0;
    pub const DASH_SPEED_FACTOR: f32 = 3.0;

    /// Grace window after the player is hit
    pub const HIT_INVINCIBILITY_MS: f64 = 1000.0;

    /// Weapons
    pub const WEAPON_POOL_CAPACITY: usize = 500;
    pub const PROJECTILE_LIFETIME_MS: f64 = 2000.0;
    pub const PROJECTILE_SPEED: f32 = 5.04;
    pub const PROJECTILE_SIZE: f32 = 38.0;
    pub const BASE_FIRE_INTERVAL_MS: f64 = 400.0;
    pub const MIN_FIRE_INTERVAL_MS: f64 = 100.0;
    pub const FIRE_RATE_PER_LEVEL: f64 = 0.08;

    /// Enemies
    pub const BASE_ENEMY_SPEED: f32 = 0.84;
    pub const MAX_ENEMIES: usize = 100;
    pub const ENEMY_SPAWN_INTERVAL_MS: f64 = 1000.0;
    pub const SPAWN_EDGE_OFFSET: f32 = 29.0;
    pub const BOSS_LEVEL_INTERVAL: u32 = 11;
    pub const BOSS_HEALTH: f32 = 20.0;

    /// Quadtree tuning
    pub const QUADTREE_MAX_OBJECTS: usize = 10;
    pub const QUADTREE_MAX_LEVELS: u32 = 4;

    /// Merchant
    pub const MERCHANT_SPAWN_INTERVAL_MS: f64 = 180_000.0;
    pub const MERCHANT_SIZE: f32 = 40.0;
    pub const MERCHANT_APPLE_PRICE: u32 = 3;
}

/// Angle (radians) of the direction from `from` toward `to`
#[inline]
pub fn angle_to(from: Vec2, to: Vec2) -> f32 {
    let d = to - from;
    d.y.atan2(d.x)
}

/// Unit vector pointing along `angle`
#[inline]
pub fn unit_from_angle(angle: f32) -> Vec2 {
    Vec2::new(angle.cos(), angle.sin())
}

/// Install the platform logger (idempotent)
#[cfg(not(target_arch = "wasm32"))]
pub fn init_logging() {
    let _ = env_logger::try_init();
}

/// Install the platform logger (idempotent)
#[cfg(target_arch = "wasm32")]
pub fn init_logging() {
    console_error_panic_hook::set_once();
    let _ = console_log::init_with_level(log::Level::Info);
}
