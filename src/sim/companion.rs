//! Allies: the dog, the owl, the doppelganger, and a second player
//!
//! Companions share the player's weapon pool, so their shots obey the same
//! capacity limit and collision pass as the player's.

use glam::Vec2;

use super::bounds::{circles_overlap, clamp_to_world};
use super::enemy::nearest_targetable;
use super::state::{GameEvent, World};
use super::weapon::{ShotConfig, WeaponPool};
use crate::consts::*;
use crate::angle_to;

pub const DOG_SIZE: f32 = 25.0;
/// The dog only chases enemies inside this radius
pub const DOG_CHASE_RADIUS: f32 = 300.0;
pub const DOG_CHASE_SPEED: f32 = 3.0;
pub const DOG_FOLLOW_SPEED: f32 = 2.0;
/// The dog stops following once this close to the player
pub const DOG_HEEL_DISTANCE: f32 = 40.0;
pub const DOG_BITE_DAMAGE: f32 = 1.0;

pub const OWL_SIZE: f32 = 25.0;
pub const OWL_ORBIT_RADIUS: f32 = 60.0;
/// Radians per frame
pub const OWL_ORBIT_STEP: f32 = 0.03;
pub const OWL_FIRE_INTERVAL_MS: f64 = 1500.0;

pub const DOPPELGANGER_LIFETIME_MS: f64 = 8000.0;
pub const DOPPELGANGER_FIRE_INTERVAL_MS: f64 = 400.0;

pub const PLAYER_TWO_FIRE_INTERVAL_MS: f64 = 400.0;
/// Companion shots are smaller than the player's
pub const COMPANION_SHOT_SIZE: f32 = 20.0;

/// Dog behaviour
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DogState {
    Following,
    Chasing { target: u32 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Dog {
    pub pos: Vec2,
    pub state: DogState,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Owl {
    pub pos: Vec2,
    pub orbit_angle: f32,
    pub last_shot: f64,
}

/// Mirror image of the player that fires for a limited time
#[derive(Debug, Clone, PartialEq)]
pub struct Doppelganger {
    pub pos: Vec2,
    pub expires_at: f64,
    pub last_shot: f64,
}

/// Second local player driven by its own input
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerTwo {
    pub pos: Vec2,
    pub aim_angle: f32,
    pub last_shot: f64,
}

/// All allies present in a run (at most one of each)
#[derive(Debug, Clone, Default)]
pub struct Companions {
    pub dog: Option<Dog>,
    pub owl: Option<Owl>,
    pub doppelganger: Option<Doppelganger>,
    pub player_two: Option<PlayerTwo>,
}

impl Companions {
    pub fn summon_dog(&mut self, at: Vec2) {
        self.dog.get_or_insert(Dog {
            pos: at,
            state: DogState::Following,
        });
    }

    pub fn summon_owl(&mut self, at: Vec2, now: f64) {
        self.owl.get_or_insert(Owl {
            pos: at + Vec2::new(OWL_ORBIT_RADIUS, 0.0),
            orbit_angle: 0.0,
            last_shot: now,
        });
    }

    /// Summon, or refresh the lifetime of an existing doppelganger
    pub fn summon_doppelganger(&mut self, player_pos: Vec2, now: f64) {
        let expires_at = now + DOPPELGANGER_LIFETIME_MS;
        match self.doppelganger.as_mut() {
            Some(d) => d.expires_at = expires_at,
            None => {
                self.doppelganger = Some(Doppelganger {
                    pos: mirrored(player_pos),
                    expires_at,
                    last_shot: now,
                })
            }
        }
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// Point reflected through the world centre
pub fn mirrored(pos: Vec2) -> Vec2 {
    Vec2::new(WORLD_WIDTH - pos.x, WORLD_HEIGHT - pos.y)
}

fn companion_shot() -> ShotConfig {
    ShotConfig {
        size: COMPANION_SHOT_SIZE,
        ..Default::default()
    }
}

/// Fire one shot from `from` at the nearest enemy if `interval` has passed.
/// Returns whether a shot left the pool.
fn fire_at_nearest(
    weapons: &mut WeaponPool,
    enemies: &[super::enemy::Enemy],
    from: Vec2,
    last_shot: &mut f64,
    interval: f64,
    now: f64,
) -> bool {
    if now - *last_shot < interval {
        return false;
    }
    let Some(target) = nearest_targetable(enemies, from) else {
        return false;
    };
    *last_shot = now;
    weapons.fire(from, angle_to(from, target.pos), &companion_shot(), now)
}

impl World {
    /// Let a second player join at the cost of one of the first player's
    /// lives. Needs at least two lives.
    pub fn join_player_two(&mut self) -> bool {
        if self.companions.player_two.is_some() || self.player.lives <= 1 {
            return false;
        }
        self.player.lives -= 1;
        self.companions.player_two = Some(PlayerTwo {
            pos: self.player.pos + Vec2::new(self.player.size, 0.0),
            aim_angle: 0.0,
            last_shot: f64::NEG_INFINITY,
        });
        self.events.push(GameEvent::PlayerTwoJoined);
        log::info!("Player two joined ({} lives left)", self.player.lives);
        true
    }

    /// Advance every companion by one frame
    pub fn update_companions(&mut self, p2_move: Vec2, p2_aim: Vec2, now: f64) {
        self.update_dog();
        self.update_owl(now);
        self.update_doppelganger(now);
        self.update_player_two(p2_move, p2_aim, now);
    }

    fn update_dog(&mut self) {
        let mut defeated = None;
        {
            let Some(dog) = self.companions.dog.as_mut() else {
                return;
            };
            match dog.state {
                DogState::Following => {
                    let prey = nearest_targetable(&self.enemies, dog.pos)
                        .filter(|e| e.pos.distance(dog.pos) <= DOG_CHASE_RADIUS);
                    if let Some(prey) = prey {
                        dog.state = DogState::Chasing { target: prey.id };
                    } else if dog.pos.distance(self.player.pos) > DOG_HEEL_DISTANCE {
                        dog.pos += (self.player.pos - dog.pos).normalize_or_zero() * DOG_FOLLOW_SPEED;
                    }
                }
                DogState::Chasing { target } => {
                    let prey = self
                        .enemies
                        .iter()
                        .position(|e| e.id == target && e.is_targetable());
                    match prey {
                        None => dog.state = DogState::Following,
                        Some(index) => {
                            let enemy = &mut self.enemies[index];
                            dog.pos += (enemy.pos - dog.pos).normalize_or_zero() * DOG_CHASE_SPEED;
                            if circles_overlap(dog.pos, DOG_SIZE / 2.0, enemy.pos, enemy.radius()) {
                                enemy.health -= DOG_BITE_DAMAGE;
                                dog.state = DogState::Following;
                                if enemy.is_dead() {
                                    defeated = Some(index);
                                }
                            }
                        }
                    }
                }
            }
        }
        if let Some(index) = defeated {
            self.on_enemy_defeated(index);
        }
    }

    fn update_owl(&mut self, now: f64) {
        let Some(owl) = self.companions.owl.as_mut() else {
            return;
        };
        owl.orbit_angle = (owl.orbit_angle + OWL_ORBIT_STEP) % std::f32::consts::TAU;
        owl.pos = self.player.pos + crate::unit_from_angle(owl.orbit_angle) * OWL_ORBIT_RADIUS;
        if fire_at_nearest(
            &mut self.weapons,
            &self.enemies,
            owl.pos,
            &mut owl.last_shot,
            OWL_FIRE_INTERVAL_MS,
            now,
        ) {
            self.events.push(GameEvent::ShotFired);
        }
    }

    fn update_doppelganger(&mut self, now: f64) {
        let Some(double) = self.companions.doppelganger.as_mut() else {
            return;
        };
        if now >= double.expires_at {
            self.companions.doppelganger = None;
            return;
        }
        double.pos = mirrored(self.player.pos);
        if fire_at_nearest(
            &mut self.weapons,
            &self.enemies,
            double.pos,
            &mut double.last_shot,
            DOPPELGANGER_FIRE_INTERVAL_MS,
            now,
        ) {
            self.events.push(GameEvent::ShotFired);
        }
    }

    fn update_player_two(&mut self, move_dir: Vec2, aim_dir: Vec2, now: f64) {
        let Some(p2) = self.companions.player_two.as_mut() else {
            return;
        };
        p2.pos += move_dir.normalize_or_zero() * PLAYER_BASE_SPEED;
        p2.pos = clamp_to_world(p2.pos, PLAYER_SIZE, WORLD_WIDTH, WORLD_HEIGHT);

        if aim_dir == Vec2::ZERO {
            return;
        }
        p2.aim_angle = aim_dir.y.atan2(aim_dir.x);
        if now - p2.last_shot >= PLAYER_TWO_FIRE_INTERVAL_MS {
            p2.last_shot = now;
            if self.weapons.fire(p2.pos, p2.aim_angle, &ShotConfig::default(), now) {
                self.events.push(GameEvent::ShotFired);
            }
        }
    }
}
