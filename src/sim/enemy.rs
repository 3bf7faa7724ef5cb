//! Enemy species, per-species steering, and spawn math
//!
//! Every enemy shares a common core (position, size, speed, health). The
//! species-specific timers live in [`EnemyBehavior`], one variant per
//! behaviour, so steering updates are matched exhaustively.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::settings::Difficulty;
use crate::unit_from_angle;

/// Enemy species tag (selects visuals and behaviour)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Species {
    Zombie,
    Skeleton,
    Snail,
    Mosquito,
    Bat,
    Devil,
    Demon,
    Ghost,
    Eye,
    BigZombie,
    Vampire,
}

/// Static per-species tuning
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpeciesConfig {
    pub size: f32,
    pub base_health: f32,
    pub speed_multiplier: f32,
    /// Player level at which the species starts spawning
    pub min_level: u32,
}

impl Species {
    pub const ALL: [Species; 11] = [
        Species::Zombie,
        Species::Skeleton,
        Species::Snail,
        Species::Mosquito,
        Species::Bat,
        Species::Devil,
        Species::Demon,
        Species::Ghost,
        Species::Eye,
        Species::BigZombie,
        Species::Vampire,
    ];

    /// Species a boss may mimic
    pub const BOSS_MIMICS: [Species; 7] = [
        Species::Zombie,
        Species::Skeleton,
        Species::Bat,
        Species::Devil,
        Species::Demon,
        Species::Ghost,
        Species::Vampire,
    ];

    pub fn config(self) -> SpeciesConfig {
        let (size, base_health, speed_multiplier, min_level) = match self {
            Species::Zombie => (17.0, 1.0, 1.0, 1),
            Species::Skeleton => (20.0, 2.0, 1.15, 5),
            Species::Snail => (22.0, 4.0, 0.3, 4),
            Species::Mosquito => (15.0, 2.0, 1.5, 7),
            Species::Bat => (25.0 * 0.85, 3.0, 2.0, 10),
            Species::Devil => (20.0 * 0.8, 3.0, 1.84, 12),
            Species::Demon => (28.0 * 0.7, 4.0, 1.8975, 15),
            Species::Ghost => (22.0, 4.0, 1.2, 12),
            Species::Eye => (25.0 * 0.6, 4.0, 1.1 * 1.1, 20),
            Species::BigZombie => (17.0 * 1.75, 6.0, 0.5, 25),
            Species::Vampire => (20.0, 5.0, 1.2, 30),
        };
        SpeciesConfig {
            size,
            base_health,
            speed_multiplier,
            min_level,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Species::Zombie => "zombie",
            Species::Skeleton => "skeleton",
            Species::Snail => "snail",
            Species::Mosquito => "mosquito",
            Species::Bat => "bat",
            Species::Devil => "devil",
            Species::Demon => "demon",
            Species::Ghost => "ghost",
            Species::Eye => "eye",
            Species::BigZombie => "big_zombie",
            Species::Vampire => "vampire",
        }
    }

    /// Species unlocked at `level`
    pub fn eligible(level: u32) -> impl Iterator<Item = Species> {
        Species::ALL
            .into_iter()
            .filter(move |s| s.config().min_level <= level)
    }
}

/// Movement axis for axis-locked steering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Axis {
    X,
    Y,
}

/// Mosquitoes only re-aim this often
pub const MOSQUITO_RETARGET_MS: f64 = 2000.0;
/// Bats alternate this many frames moving, then paused
pub const BAT_PHASE_FRAMES: u32 = 30;
pub const DEVIL_AXIS_SWAP_MS: f64 = 1000.0;
pub const DEMON_STATE_MS: f64 = 2000.0;
pub const GHOST_PHASE_MS: f64 = 3000.0;
/// Eyes hold position between these distances from the player
pub const EYE_HOLD_FAR: f32 = 200.0;
pub const EYE_HOLD_NEAR: f32 = 150.0;

/// Species-specific transient state
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum EnemyBehavior {
    /// Direct chase every frame
    Pursuer,
    /// Flies along a heading refreshed every `MOSQUITO_RETARGET_MS`
    Mosquito { heading: Vec2, last_retarget: f64 },
    /// Alternates moving and paused frames
    Bat { paused: bool, frames_in_state: u32 },
    /// Moves along one axis at a time
    Devil { axis: Axis, last_swap: f64 },
    /// Alternates following and wandering
    Demon {
        wandering: bool,
        last_change: f64,
        wander_dir: Vec2,
    },
    /// Fades in and out; invisible ghosts cannot be hit
    Ghost { visible: bool, last_phase_change: f64 },
    /// Keeps its distance from the player
    Eye,
}

impl EnemyBehavior {
    pub fn for_species(species: Species, now: f64) -> Self {
        match species {
            Species::Mosquito => EnemyBehavior::Mosquito {
                heading: Vec2::ZERO,
                last_retarget: now,
            },
            Species::Bat => EnemyBehavior::Bat {
                paused: false,
                frames_in_state: 0,
            },
            Species::Devil => EnemyBehavior::Devil {
                axis: Axis::X,
                last_swap: now,
            },
            Species::Demon => EnemyBehavior::Demon {
                wandering: false,
                last_change: now,
                wander_dir: Vec2::ZERO,
            },
            Species::Ghost => EnemyBehavior::Ghost {
                visible: true,
                last_phase_change: now,
            },
            Species::Eye => EnemyBehavior::Eye,
            Species::Zombie
            | Species::Skeleton
            | Species::Snail
            | Species::BigZombie
            | Species::Vampire => EnemyBehavior::Pursuer,
        }
    }
}

/// A live enemy (or boss)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Enemy {
    pub id: u32,
    pub species: Species,
    pub pos: Vec2,
    pub size: f32,
    /// Pixels per frame
    pub speed: f32,
    pub health: f32,
    pub is_boss: bool,
    pub behavior: EnemyBehavior,
}

impl Enemy {
    pub fn new(id: u32, species: Species, pos: Vec2, speed: f32, health: f32, now: f64) -> Self {
        Self {
            id,
            species,
            pos,
            size: species.config().size,
            speed,
            health,
            is_boss: false,
            behavior: EnemyBehavior::for_species(species, now),
        }
    }

    /// A boss mimicking `species`: double size, 3/4 speed
    pub fn boss(id: u32, species: Species, pos: Vec2, base_speed: f32, now: f64) -> Self {
        let config = species.config();
        let mut boss = Self::new(
            id,
            species,
            pos,
            base_speed * config.speed_multiplier * 0.75,
            BOSS_HEALTH,
            now,
        );
        boss.size = config.size * 2.0;
        boss.is_boss = true;
        boss
    }

    #[inline]
    pub fn radius(&self) -> f32 {
        self.size / 2.0
    }

    #[inline]
    pub fn is_dead(&self) -> bool {
        self.health <= 0.0
    }

    /// Whether projectiles can currently hit this enemy
    pub fn is_targetable(&self) -> bool {
        match self.behavior {
            EnemyBehavior::Ghost { visible, .. } => visible && !self.is_dead(),
            _ => !self.is_dead(),
        }
    }

    /// Advance the behaviour state and return this frame's displacement
    pub fn steer<R: Rng + ?Sized>(&mut self, target: Vec2, now: f64, rng: &mut R) -> Vec2 {
        let chase = (target - self.pos).normalize_or_zero() * self.speed;

        match &mut self.behavior {
            EnemyBehavior::Pursuer => chase,

            EnemyBehavior::Mosquito {
                heading,
                last_retarget,
            } => {
                if *heading == Vec2::ZERO || now - *last_retarget >= MOSQUITO_RETARGET_MS {
                    *heading = (target - self.pos).normalize_or_zero();
                    *last_retarget = now;
                }
                *heading * self.speed
            }

            EnemyBehavior::Bat {
                paused,
                frames_in_state,
            } => {
                *frames_in_state += 1;
                if *frames_in_state >= BAT_PHASE_FRAMES {
                    *paused = !*paused;
                    *frames_in_state = 0;
                }
                if *paused { Vec2::ZERO } else { chase }
            }

            EnemyBehavior::Devil { axis, last_swap } => {
                if now - *last_swap >= DEVIL_AXIS_SWAP_MS {
                    *axis = match *axis {
                        Axis::X => Axis::Y,
                        Axis::Y => Axis::X,
                    };
                    *last_swap = now;
                }
                let delta = target - self.pos;
                match axis {
                    Axis::X => Vec2::new(delta.x.clamp(-self.speed, self.speed), 0.0),
                    Axis::Y => Vec2::new(0.0, delta.y.clamp(-self.speed, self.speed)),
                }
            }

            EnemyBehavior::Demon {
                wandering,
                last_change,
                wander_dir,
            } => {
                if now - *last_change >= DEMON_STATE_MS {
                    *wandering = !*wandering;
                    *last_change = now;
                    if *wandering {
                        *wander_dir = unit_from_angle(rng.random::<f32>() * std::f32::consts::TAU);
                    }
                }
                if *wandering {
                    *wander_dir * self.speed
                } else {
                    chase
                }
            }

            EnemyBehavior::Ghost {
                visible,
                last_phase_change,
            } => {
                if now - *last_phase_change >= GHOST_PHASE_MS {
                    *visible = !*visible;
                    *last_phase_change = now;
                }
                chase
            }

            EnemyBehavior::Eye => {
                let dist = self.pos.distance(target);
                if dist > EYE_HOLD_FAR {
                    chase
                } else if dist < EYE_HOLD_NEAR {
                    -chase
                } else {
                    Vec2::ZERO
                }
            }
        }
    }
}

/// Base enemy speed for the current difficulty and player level
pub fn base_speed_for(difficulty: Difficulty, player_level: u32) -> f32 {
    BASE_ENEMY_SPEED
        * difficulty.speed_multiplier()
        * difficulty.level_speed_multiplier(player_level)
}

/// Effective speed of a freshly spawned enemy
pub fn spawn_speed(difficulty: Difficulty, player_level: u32, species: Species) -> f32 {
    base_speed_for(difficulty, player_level) * species.config().speed_multiplier
}

/// Closest enemy that can currently be hit, by straight-line distance
pub fn nearest_targetable(enemies: &[Enemy], from: Vec2) -> Option<&Enemy> {
    enemies
        .iter()
        .filter(|e| e.is_targetable())
        .min_by(|a, b| {
            a.pos
                .distance_squared(from)
                .total_cmp(&b.pos.distance_squared(from))
        })
}

/// Random point just outside one of the four world edges
pub fn edge_spawn_position<R: Rng + ?Sized>(rng: &mut R, margin: f32) -> Vec2 {
    match rng.random_range(0..4) {
        0 => Vec2::new(rng.random::<f32>() * WORLD_WIDTH, -margin),
        1 => Vec2::new(WORLD_WIDTH + margin, rng.random::<f32>() * WORLD_HEIGHT),
        2 => Vec2::new(rng.random::<f32>() * WORLD_WIDTH, WORLD_HEIGHT + margin),
        _ => Vec2::new(-margin, rng.random::<f32>() * WORLD_HEIGHT),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn enemy(species: Species, pos: Vec2) -> Enemy {
        Enemy::new(1, species, pos, 1.0, 1.0, 0.0)
    }

    #[test]
    fn test_pursuer_moves_straight_at_target() {
        let mut rng = Pcg32::seed_from_u64(1);
        let mut e = enemy(Species::Zombie, Vec2::new(0.0, 0.0));
        let step = e.steer(Vec2::new(10.0, 0.0), 0.0, &mut rng);
        assert!((step - Vec2::new(1.0, 0.0)).length() < 1e-6);
    }

    #[test]
    fn test_pursuer_on_target_does_not_move() {
        let mut rng = Pcg32::seed_from_u64(1);
        let mut e = enemy(Species::Zombie, Vec2::new(5.0, 5.0));
        assert_eq!(e.steer(Vec2::new(5.0, 5.0), 0.0, &mut rng), Vec2::ZERO);
    }

    #[test]
    fn test_bat_alternates_pause() {
        let mut rng = Pcg32::seed_from_u64(1);
        let mut e = enemy(Species::Bat, Vec2::ZERO);
        let target = Vec2::new(100.0, 0.0);
        let moving: Vec<bool> = (0..70)
            .map(|i| e.steer(target, i as f64 * 16.0, &mut rng) != Vec2::ZERO)
            .collect();
        assert!(moving[..29].iter().all(|m| *m));
        assert!(moving[29..59].iter().all(|m| !*m));
        assert!(moving[59]);
    }

    #[test]
    fn test_devil_locks_to_one_axis_and_swaps() {
        let mut rng = Pcg32::seed_from_u64(1);
        let mut e = enemy(Species::Devil, Vec2::ZERO);
        let target = Vec2::new(50.0, 50.0);
        let first = e.steer(target, 10.0, &mut rng);
        assert_eq!(first, Vec2::new(1.0, 0.0));
        let later = e.steer(target, DEVIL_AXIS_SWAP_MS + 10.0, &mut rng);
        assert_eq!(later, Vec2::new(0.0, 1.0));
    }

    #[test]
    fn test_mosquito_keeps_heading_between_retargets() {
        let mut rng = Pcg32::seed_from_u64(1);
        let mut e = enemy(Species::Mosquito, Vec2::ZERO);
        let first = e.steer(Vec2::new(100.0, 0.0), 0.0, &mut rng);
        // Target jumps, but heading is held until the retarget window passes
        let held = e.steer(Vec2::new(0.0, 100.0), 500.0, &mut rng);
        assert_eq!(first, held);
        let retargeted = e.steer(Vec2::new(0.0, 100.0), MOSQUITO_RETARGET_MS + 1.0, &mut rng);
        assert!((retargeted - Vec2::new(0.0, 1.0)).length() < 1e-6);
    }

    #[test]
    fn test_ghost_untargetable_while_invisible() {
        let mut rng = Pcg32::seed_from_u64(1);
        let mut e = enemy(Species::Ghost, Vec2::ZERO);
        assert!(e.is_targetable());
        e.steer(Vec2::new(10.0, 0.0), GHOST_PHASE_MS, &mut rng);
        assert!(!e.is_targetable());
        e.steer(Vec2::new(10.0, 0.0), GHOST_PHASE_MS * 2.0, &mut rng);
        assert!(e.is_targetable());
    }

    #[test]
    fn test_eye_holds_range() {
        let mut rng = Pcg32::seed_from_u64(1);
        let mut e = enemy(Species::Eye, Vec2::ZERO);
        assert!(e.steer(Vec2::new(300.0, 0.0), 0.0, &mut rng).x > 0.0);
        assert_eq!(e.steer(Vec2::new(175.0, 0.0), 0.0, &mut rng), Vec2::ZERO);
        assert!(e.steer(Vec2::new(100.0, 0.0), 0.0, &mut rng).x < 0.0);
    }

    #[test]
    fn test_boss_scales_from_mimic() {
        let boss = Enemy::boss(7, Species::Skeleton, Vec2::ZERO, 1.0, 0.0);
        assert!(boss.is_boss);
        assert_eq!(boss.size, 40.0);
        assert!((boss.speed - 1.15 * 0.75).abs() < 1e-6);
        assert_eq!(boss.health, BOSS_HEALTH);
    }

    #[test]
    fn test_spawn_speed_scales_with_difficulty_and_level() {
        let easy = spawn_speed(Difficulty::Easy, 1, Species::Zombie);
        assert!((easy - 0.84 * 0.9).abs() < 1e-6);
        let hard = spawn_speed(Difficulty::Hard, 5, Species::Zombie);
        assert!((hard - 0.84 * 1.75 * 1.1).abs() < 1e-5);
    }

    #[test]
    fn test_only_zombies_at_level_one() {
        let eligible: Vec<_> = Species::eligible(1).collect();
        assert_eq!(eligible, vec![Species::Zombie]);
        assert_eq!(Species::eligible(30).count(), Species::ALL.len());
    }

    #[test]
    fn test_nearest_skips_dead_and_hidden() {
        let mut near = enemy(Species::Zombie, Vec2::new(5.0, 0.0));
        near.health = 0.0;
        let mut ghost = enemy(Species::Ghost, Vec2::new(6.0, 0.0));
        ghost.behavior = EnemyBehavior::Ghost {
            visible: false,
            last_phase_change: 0.0,
        };
        let mut far = enemy(Species::Zombie, Vec2::new(50.0, 0.0));
        far.id = 3;
        let enemies = vec![near, ghost, far];
        assert_eq!(nearest_targetable(&enemies, Vec2::ZERO).map(|e| e.id), Some(3));
        assert!(nearest_targetable(&[], Vec2::ZERO).is_none());
    }

    #[test]
    fn test_edge_spawn_outside_world() {
        let mut rng = Pcg32::seed_from_u64(9);
        for _ in 0..100 {
            let p = edge_spawn_position(&mut rng, SPAWN_EDGE_OFFSET);
            let outside = p.x < 0.0 || p.y < 0.0 || p.x > WORLD_WIDTH || p.y > WORLD_HEIGHT;
            assert!(outside);
        }
    }
}
