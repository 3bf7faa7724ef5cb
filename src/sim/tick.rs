//! Per-frame simulation step
//!
//! Frames are driven by wall-clock timestamps in milliseconds. Movement is
//! applied per frame; every timer (fire rate, dash, spawns, invincibility)
//! compares absolute timestamps.

use glam::Vec2;

use super::bounds::clamp_to_world;
use super::collision::{
    collect_pickups, rebuild_index, resolve_player_contacts, resolve_projectile_hits,
    touching_merchant,
};
use super::enemy::nearest_targetable;
use super::progression::{UpgradeKind, fire_interval_ms};
use super::state::{GameEvent, GamePhase, Merchant, ModifierKind, Modifiers, Player, World};
use super::weapon::*;
use crate::angle_to;
use crate::consts::*;
use crate::settings::Character;

/// Input commands for a single frame
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Movement direction; only its direction matters
    pub move_dir: Vec2,
    /// Aim direction; zero lets the weapon pick the nearest enemy
    pub aim_dir: Vec2,
    /// Dash request
    pub dash: bool,
    /// Pause toggle
    pub pause: bool,
    /// Second player's movement and aim
    pub player_two_move: Vec2,
    pub player_two_aim: Vec2,
    /// Idle/demo mode - steer the player automatically
    pub autopilot: bool,
}

/// Distance at which the autopilot starts backing away from an enemy
const AUTOPILOT_FLEE_RADIUS: f32 = 180.0;
/// The merchant appears this far to the player's right
const MERCHANT_OFFSET: f32 = 200.0;

/// Advance the world by one frame ending at `now`
pub fn tick(world: &mut World, input: &TickInput, now: f64) {
    // Handle pause toggle
    if input.pause {
        match world.phase {
            GamePhase::Playing => {
                world.phase = GamePhase::Paused;
                return;
            }
            GamePhase::Paused => world.phase = GamePhase::Playing,
            _ => {}
        }
    }

    if world.phase != GamePhase::Playing {
        return;
    }
    world.now = now;

    let mut input = input.clone();
    if input.autopilot {
        input.move_dir = autopilot_direction(world);
    }
    let input = &input;

    world.player.update_dash(now);
    spawn_enemies(world, now);
    update_merchant(world, now);
    if world.phase != GamePhase::Playing {
        return;
    }

    collect_pickups(world, now);
    if world.phase != GamePhase::Playing {
        return;
    }

    move_player(world, input, now);
    world.update_companions(input.player_two_move, input.player_two_aim, now);
    if world.phase != GamePhase::Playing {
        world.remove_dead();
        return;
    }

    fire_player_weapon(world, input, now);
    world.weapons.advance(now);

    rebuild_index(world);
    let pass = resolve_projectile_hits(world);
    if pass.interrupted {
        world.remove_dead();
        return;
    }

    move_enemies(world, now);
    resolve_player_contacts(world, now);
    world.remove_dead();
}

/// Regular spawns on a timer, plus a boss every `BOSS_LEVEL_INTERVAL` levels
fn spawn_enemies(world: &mut World, now: f64) {
    if now - world.last_enemy_spawn >= world.settings.spawn_interval_ms {
        world.last_enemy_spawn = now;
        world.spawn_random_enemy();
    }

    let level = world.player.level;
    if level % BOSS_LEVEL_INTERVAL == 0 && level > world.last_boss_level {
        world.last_boss_level = level;
        world.spawn_random_boss();
    }
}

fn update_merchant(world: &mut World, now: f64) {
    if world.merchant.is_none() && now - world.last_merchant_spawn >= MERCHANT_SPAWN_INTERVAL_MS {
        world.last_merchant_spawn = now;
        let pos = clamp_to_world(
            world.player.pos + Vec2::new(MERCHANT_OFFSET, 0.0),
            MERCHANT_SIZE,
            WORLD_WIDTH,
            WORLD_HEIGHT,
        );
        world.merchant = Some(Merchant {
            pos,
            size: MERCHANT_SIZE,
        });
        world.events.push(GameEvent::MerchantArrived);
        log::info!("Merchant arrived");
    }

    if touching_merchant(world) {
        world.merchant = None;
        world.phase = GamePhase::Merchant;
        world.events.push(GameEvent::MerchantOpened);
    }
}

fn move_player(world: &mut World, input: &TickInput, now: f64) {
    if input.dash && world.player.try_dash(now) {
        world.events.push(GameEvent::Dashed);
        if world.player.character == Character::Skull {
            let shot = nova_shot(&world.player);
            world
                .weapons
                .fire_volley(world.player.pos, &radial_angles(NOVA_COUNT), &shot, now);
        }
    }

    let player = &mut world.player;
    let dir = input.move_dir.normalize_or_zero();
    player.pos += dir * player.current_speed();
    player.pos = clamp_to_world(player.pos, player.size, WORLD_WIDTH, WORLD_HEIGHT);

    if input.aim_dir != Vec2::ZERO {
        player.facing_angle = input.aim_dir.y.atan2(input.aim_dir.x);
    } else if dir != Vec2::ZERO {
        player.facing_angle = dir.y.atan2(dir.x);
    }
}

/// Spread pattern and per-shot parameters for the player's current kit
pub fn player_loadout(player: &Player, modifiers: &Modifiers) -> (SpreadPattern, ShotConfig) {
    let heavy = modifiers.has(ModifierKind::HeavyShells);
    let shotgun = modifiers.has(ModifierKind::Shotgun);

    let (pattern, base_size) = if shotgun {
        (
            SpreadPattern::Shotgun {
                count: SHOTGUN_PELLETS,
                cone: SHOTGUN_CONE,
            },
            SHOTGUN_SIZE,
        )
    } else if modifiers.v_shape_level > 0 {
        (
            SpreadPattern::Fan {
                count: modifiers.v_shape_level + 1,
                step: V_SHAPE_STEP,
            },
            PROJECTILE_SIZE,
        )
    } else if player.character == Character::Skull {
        (
            SpreadPattern::Fan {
                count: 2,
                step: SKULL_FAN_STEP,
            },
            SKULL_BONE_SIZE,
        )
    } else {
        (SpreadPattern::Single, PROJECTILE_SIZE)
    };

    let hits = if heavy {
        3
    } else if modifiers.has(ModifierKind::Ricochet) {
        2
    } else {
        1
    };

    let shot = ShotConfig {
        speed: PROJECTILE_SPEED * player.projectile_speed_multiplier,
        size: base_size * player.projectile_size_multiplier * if heavy { 2.0 } else { 1.0 },
        damage: player.damage_multiplier * if heavy { 2.0 } else { 1.0 },
        lifetime_ms: PROJECTILE_LIFETIME_MS,
        hits,
    };
    (pattern, shot)
}

fn nova_shot(player: &Player) -> ShotConfig {
    ShotConfig {
        speed: NOVA_SPEED * player.projectile_speed_multiplier,
        size: NOVA_SIZE * player.projectile_size_multiplier,
        damage: player.damage_multiplier,
        lifetime_ms: NOVA_LIFETIME_MS,
        hits: 1,
    }
}

/// Angle the player's weapon fires at this frame: explicit aim, else the
/// nearest enemy, else the facing angle
pub fn firing_angle(world: &World, aim_dir: Vec2) -> f32 {
    let player = &world.player;
    if aim_dir != Vec2::ZERO && !world.modifiers.has(ModifierKind::AutoAim) {
        return aim_dir.y.atan2(aim_dir.x);
    }
    nearest_targetable(&world.enemies, player.pos)
        .map(|e| angle_to(player.pos, e.pos))
        .unwrap_or(player.facing_angle)
}

fn fire_player_weapon(world: &mut World, input: &TickInput, now: f64) {
    let interval = fire_interval_ms(world.player.upgrade_level(UpgradeKind::FireRate));
    if now - world.player.last_fire_time < interval {
        return;
    }
    world.player.last_fire_time = now;

    let angle = firing_angle(world, input.aim_dir);
    let (pattern, shot) = player_loadout(&world.player, &world.modifiers);
    let mirrored = world.modifiers.has(ModifierKind::DualGun);
    let angles = volley_angles(angle, pattern, mirrored, &mut world.rng);
    if world.weapons.fire_volley(world.player.pos, &angles, &shot, now) > 0 {
        world.events.push(GameEvent::ShotFired);
    }
}

fn move_enemies(world: &mut World, now: f64) {
    let target = world.player.pos;
    for enemy in world.enemies.iter_mut().filter(|e| !e.is_dead()) {
        let step = enemy.steer(target, now, &mut world.rng);
        enemy.pos += step;
    }
}

/// Demo steering: back away from close enemies, otherwise collect pickups,
/// otherwise drift to the centre
fn autopilot_direction(world: &World) -> Vec2 {
    let pos = world.player.pos;
    if let Some(threat) = nearest_targetable(&world.enemies, pos) {
        if threat.pos.distance(pos) < AUTOPILOT_FLEE_RADIUS {
            return (pos - threat.pos).normalize_or_zero();
        }
    }
    let nearest_pickup = world.pickups.iter().min_by(|a, b| {
        a.pos
            .distance_squared(pos)
            .total_cmp(&b.pos.distance_squared(pos))
    });
    match nearest_pickup {
        Some(p) => (p.pos - pos).normalize_or_zero(),
        None => (super::state::world_center() - pos).normalize_or_zero(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Settings;
    use crate::sim::enemy::{Enemy, Species};
    use crate::sim::state::PickupKind;

    /// A quiet world: no obstacles and no timed spawns
    fn world() -> World {
        let settings = Settings {
            spawn_interval_ms: f64::INFINITY,
            ..Default::default()
        };
        let mut w = World::new(21, settings, 0.0);
        w.destructibles.clear();
        w
    }

    #[test]
    fn test_pause_toggle_freezes_world() {
        let mut w = world();
        let pause = TickInput {
            pause: true,
            ..Default::default()
        };
        tick(&mut w, &pause, 16.0);
        assert_eq!(w.phase, GamePhase::Paused);

        let start = w.player.pos;
        let walk = TickInput {
            move_dir: Vec2::new(1.0, 0.0),
            ..Default::default()
        };
        tick(&mut w, &walk, 32.0);
        assert_eq!(w.player.pos, start);

        tick(&mut w, &pause, 48.0);
        assert_eq!(w.phase, GamePhase::Playing);
    }

    #[test]
    fn test_movement_is_normalised() {
        let mut w = world();
        let start = w.player.pos;
        let input = TickInput {
            move_dir: Vec2::new(10.0, 0.0),
            ..Default::default()
        };
        tick(&mut w, &input, 16.0);
        assert!((w.player.pos.x - start.x - PLAYER_BASE_SPEED).abs() < 1e-4);
    }

    #[test]
    fn test_player_stays_in_world() {
        let mut w = world();
        let input = TickInput {
            move_dir: Vec2::new(-1.0, -1.0),
            ..Default::default()
        };
        for i in 0..2000 {
            tick(&mut w, &input, i as f64 * 16.0);
        }
        assert!(w.player.pos.x >= w.player.radius() - 1e-3);
        assert!(w.player.pos.y >= w.player.radius() - 1e-3);
    }

    #[test]
    fn test_fire_rate_gate() {
        let mut w = world();
        let aim = TickInput {
            aim_dir: Vec2::new(1.0, 0.0),
            ..Default::default()
        };
        tick(&mut w, &aim, 0.0);
        assert_eq!(w.weapons.active_count(), 1);
        tick(&mut w, &aim, BASE_FIRE_INTERVAL_MS - 1.0);
        assert_eq!(w.weapons.active_count(), 1);
        tick(&mut w, &aim, BASE_FIRE_INTERVAL_MS);
        assert_eq!(w.weapons.active_count(), 2);
    }

    #[test]
    fn test_auto_aim_targets_nearest_enemy() {
        let mut w = world();
        let pos = w.player.pos;
        w.spawn_enemy_at(Species::Zombie, pos + Vec2::new(0.0, 300.0));
        w.spawn_enemy_at(Species::Zombie, pos + Vec2::new(-500.0, 0.0));
        let angle = firing_angle(&w, Vec2::ZERO);
        assert!((angle - std::f32::consts::FRAC_PI_2).abs() < 1e-4);

        // Explicit aim wins unless auto-aim is active
        assert!(firing_angle(&w, Vec2::new(1.0, 0.0)).abs() < 1e-6);
        w.modifiers.grant(ModifierKind::AutoAim);
        assert!((firing_angle(&w, Vec2::new(1.0, 0.0)) - std::f32::consts::FRAC_PI_2).abs() < 1e-4);
    }

    #[test]
    fn test_no_target_falls_back_to_facing() {
        let mut w = world();
        w.player.facing_angle = 1.25;
        assert_eq!(firing_angle(&w, Vec2::ZERO), 1.25);
    }

    #[test]
    fn test_loadouts() {
        let player = Player::new(Vec2::ZERO);
        let mut mods = Modifiers::default();
        assert_eq!(player_loadout(&player, &mods).0, SpreadPattern::Single);

        mods.grant(ModifierKind::VShape);
        mods.grant(ModifierKind::Ricochet);
        let (pattern, shot) = player_loadout(&player, &mods);
        assert_eq!(
            pattern,
            SpreadPattern::Fan {
                count: 2,
                step: V_SHAPE_STEP
            }
        );
        assert_eq!(shot.hits, 2);

        mods.grant(ModifierKind::HeavyShells);
        let (_, heavy) = player_loadout(&player, &mods);
        assert_eq!(heavy.hits, 3);
        assert_eq!(heavy.damage, 2.0);
        assert_eq!(heavy.size, PROJECTILE_SIZE * 2.0);
    }

    #[test]
    fn test_skull_dash_releases_nova() {
        let settings = Settings {
            character: Character::Skull,
            spawn_interval_ms: f64::INFINITY,
            ..Default::default()
        };
        let mut w = World::new(4, settings, 0.0);
        w.destructibles.clear();
        // Hold fire so only the nova is in the pool
        w.player.last_fire_time = 0.0;
        let dash = TickInput {
            dash: true,
            ..Default::default()
        };
        tick(&mut w, &dash, 16.0);
        assert!(w.player.is_dashing);
        assert_eq!(w.weapons.active_count(), NOVA_COUNT as usize);
    }

    #[test]
    fn test_dash_speeds_up_movement() {
        let mut w = world();
        let start = w.player.pos;
        let input = TickInput {
            move_dir: Vec2::new(1.0, 0.0),
            dash: true,
            ..Default::default()
        };
        tick(&mut w, &input, 16.0);
        assert!((w.player.pos.x - start.x - PLAYER_BASE_SPEED * DASH_SPEED_FACTOR).abs() < 1e-4);
    }

    #[test]
    fn test_level_up_stops_the_frame() {
        let mut w = world();
        let pos = w.player.pos;
        w.player.xp = (FIRST_LEVEL_XP - 1) as f32;
        w.spawn_pickup(PickupKind::XpGem, pos);
        let enemy_id = w.insert_enemy(Enemy::new(0, Species::Zombie, pos, 1.0, 100.0, 0.0));

        tick(&mut w, &TickInput::default(), 16.0);

        assert_eq!(w.phase, GamePhase::LevelUp);
        assert_eq!(w.player.lives, PLAYER_LIVES);
        let enemy = w.enemies.iter().find(|e| e.id == enemy_id).expect("enemy");
        assert_eq!(enemy.pos, pos);
        assert_eq!(w.weapons.active_count(), 0);

        // Frames are ignored until a choice is made
        tick(&mut w, &TickInput::default(), 32.0);
        assert_eq!(w.player.lives, PLAYER_LIVES);
        w.choose_upgrade(0);
        assert_eq!(w.phase, GamePhase::Playing);
    }

    #[test]
    fn test_boss_every_eleven_levels() {
        let mut w = world();
        w.player.level = BOSS_LEVEL_INTERVAL;
        tick(&mut w, &TickInput::default(), 16.0);
        assert_eq!(w.enemies.iter().filter(|e| e.is_boss).count(), 1);
        tick(&mut w, &TickInput::default(), 32.0);
        assert_eq!(w.enemies.iter().filter(|e| e.is_boss).count(), 1);
    }

    #[test]
    fn test_timed_spawning() {
        let mut w = World::new(8, Settings::default(), 0.0);
        tick(&mut w, &TickInput::default(), ENEMY_SPAWN_INTERVAL_MS - 1.0);
        assert!(w.enemies.is_empty());
        tick(&mut w, &TickInput::default(), ENEMY_SPAWN_INTERVAL_MS);
        assert_eq!(w.enemies.len(), 1);
    }

    #[test]
    fn test_merchant_arrives_and_opens() {
        let mut w = world();
        tick(&mut w, &TickInput::default(), MERCHANT_SPAWN_INTERVAL_MS);
        let merchant = w.merchant.expect("merchant arrived");
        assert!((merchant.pos.x - w.player.pos.x - MERCHANT_OFFSET).abs() < 1.0);

        let walk = TickInput {
            move_dir: Vec2::new(1.0, 0.0),
            ..Default::default()
        };
        let mut now = MERCHANT_SPAWN_INTERVAL_MS;
        while w.phase == GamePhase::Playing && now < MERCHANT_SPAWN_INTERVAL_MS + 60_000.0 {
            now += 16.0;
            tick(&mut w, &walk, now);
        }
        assert_eq!(w.phase, GamePhase::Merchant);
        assert!(w.merchant.is_none());
    }

    #[test]
    fn test_autopilot_flees_close_enemy() {
        let mut w = world();
        let pos = w.player.pos;
        w.spawn_enemy_at(Species::Zombie, pos + Vec2::new(50.0, 0.0));
        let dir = autopilot_direction(&w);
        assert!(dir.x < -0.99);
    }
}
