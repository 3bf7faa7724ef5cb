//! Fixed-capacity projectile pool and volley patterns
//!
//! Slots are allocated once and recycled. When every slot is busy a new
//! shot is dropped without error, which bounds both memory and per-frame
//! work no matter how fast the player fires.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::unit_from_angle;

/// Angular step between V-shape projectiles
pub const V_SHAPE_STEP: f32 = std::f32::consts::PI / 18.0;
/// Shotgun pellets per volley and their jitter cone
pub const SHOTGUN_PELLETS: u32 = 8;
pub const SHOTGUN_CONE: f32 = std::f32::consts::PI / 8.0;
/// Shotgun pellets are slightly smaller than bullets
pub const SHOTGUN_SIZE: f32 = 30.0;
/// Skull fan
pub const SKULL_FAN_STEP: f32 = 0.2;
pub const SKULL_BONE_SIZE: f32 = 20.0;
/// Dash nova (Skull)
pub const NOVA_COUNT: u32 = 6;
pub const NOVA_SPEED: f32 = 6.0;
pub const NOVA_SIZE: f32 = 20.0;
pub const NOVA_LIFETIME_MS: f64 = 1500.0;

/// A single pooled projectile slot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Projectile {
    pub pos: Vec2,
    pub vel: Vec2,
    pub angle: f32,
    pub size: f32,
    pub damage: f32,
    /// Hits remaining before the projectile is spent
    pub hits_left: u32,
    /// Entity ids already damaged by this projectile
    pub hit_ids: Vec<u32>,
    /// Absolute expiry time (ms)
    pub expires_at: f64,
    pub active: bool,
}

impl Projectile {
    fn inactive() -> Self {
        Self {
            pos: Vec2::ZERO,
            vel: Vec2::ZERO,
            angle: 0.0,
            size: 0.0,
            damage: 0.0,
            hits_left: 0,
            hit_ids: Vec::new(),
            expires_at: 0.0,
            active: false,
        }
    }

    #[inline]
    pub fn radius(&self) -> f32 {
        self.size / 2.0
    }

    pub fn has_hit(&self, id: u32) -> bool {
        self.hit_ids.contains(&id)
    }

    /// Record a hit on `id`; returns false if it was already hit
    pub fn register_hit(&mut self, id: u32) -> bool {
        if self.has_hit(id) || !self.active {
            return false;
        }
        self.hit_ids.push(id);
        self.hits_left = self.hits_left.saturating_sub(1);
        if self.hits_left == 0 {
            self.active = false;
        }
        true
    }

    /// Spend the projectile without recording a hit (e.g. hitting a wall)
    pub fn absorb(&mut self) {
        self.active = false;
    }
}

/// Per-shot parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShotConfig {
    pub speed: f32,
    pub size: f32,
    pub damage: f32,
    pub lifetime_ms: f64,
    pub hits: u32,
}

impl Default for ShotConfig {
    fn default() -> Self {
        Self {
            speed: PROJECTILE_SPEED,
            size: PROJECTILE_SIZE,
            damage: 1.0,
            lifetime_ms: PROJECTILE_LIFETIME_MS,
            hits: 1,
        }
    }
}

/// How a single trigger pull fans out
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SpreadPattern {
    Single,
    /// Symmetric fan of `count` shots, `step` radians apart
    Fan { count: u32, step: f32 },
    /// `count` pellets jittered uniformly inside `cone` radians
    Shotgun { count: u32, cone: f32 },
}

/// Angles emitted for one trigger pull; `mirrored` adds the reverse of each
pub fn volley_angles<R: Rng + ?Sized>(
    base: f32,
    pattern: SpreadPattern,
    mirrored: bool,
    rng: &mut R,
) -> Vec<f32> {
    let mut angles = match pattern {
        SpreadPattern::Single => vec![base],
        SpreadPattern::Fan { count, step } => {
            let half = step * count.saturating_sub(1) as f32 / 2.0;
            (0..count).map(|i| base - half + i as f32 * step).collect()
        }
        SpreadPattern::Shotgun { count, cone } => (0..count)
            .map(|_| base + (rng.random::<f32>() - 0.5) * cone)
            .collect(),
    };
    if mirrored {
        let reversed: Vec<f32> = angles.iter().map(|a| a + std::f32::consts::PI).collect();
        angles.extend(reversed);
    }
    angles
}

/// `count` evenly spaced angles around a full circle
pub fn radial_angles(count: u32) -> Vec<f32> {
    (0..count)
        .map(|i| i as f32 / count as f32 * std::f32::consts::TAU)
        .collect()
}

/// Fixed ring of reusable projectile slots
#[derive(Debug, Clone)]
pub struct WeaponPool {
    slots: Vec<Projectile>,
}

impl Default for WeaponPool {
    fn default() -> Self {
        Self::new(WEAPON_POOL_CAPACITY)
    }
}

impl WeaponPool {
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: (0..capacity).map(|_| Projectile::inactive()).collect(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn active_count(&self) -> usize {
        self.slots.iter().filter(|p| p.active).count()
    }

    pub fn iter_active(&self) -> impl Iterator<Item = &Projectile> {
        self.slots.iter().filter(|p| p.active)
    }

    pub fn iter_active_mut(&mut self) -> impl Iterator<Item = &mut Projectile> {
        self.slots.iter_mut().filter(|p| p.active)
    }

    /// Claim the first free slot; returns false (and does nothing) when full
    pub fn fire(&mut self, origin: Vec2, angle: f32, shot: &ShotConfig, now: f64) -> bool {
        let Some(slot) = self.slots.iter_mut().find(|p| !p.active) else {
            log::debug!("Weapon pool exhausted, shot dropped");
            return false;
        };

        slot.pos = origin;
        slot.angle = angle;
        slot.vel = unit_from_angle(angle) * shot.speed;
        slot.size = shot.size;
        slot.damage = shot.damage;
        slot.expires_at = now + shot.lifetime_ms;
        slot.hits_left = shot.hits.max(1);
        slot.hit_ids.clear();
        slot.active = true;
        true
    }

    /// Fire one shot per angle; returns how many were actually emitted
    pub fn fire_volley(&mut self, origin: Vec2, angles: &[f32], shot: &ShotConfig, now: f64) -> usize {
        angles
            .iter()
            .filter(|&&angle| self.fire(origin, angle, shot, now))
            .count()
    }

    /// Move every live projectile and recycle expired ones
    pub fn advance(&mut self, now: f64) {
        for p in self.slots.iter_mut().filter(|p| p.active) {
            p.pos += p.vel;
            if now > p.expires_at {
                p.active = false;
            }
        }
    }

    /// Deactivate every slot (run reset)
    pub fn reset(&mut self) {
        for p in &mut self.slots {
            p.active = false;
            p.hit_ids.clear();
        }
    }

    pub(crate) fn slots_mut(&mut self) -> &mut [Projectile] {
        &mut self.slots
    }
}
