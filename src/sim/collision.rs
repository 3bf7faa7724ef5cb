//! Contact resolution: projectiles against enemies and obstacles, enemies
//! against the player, and pickups against the player
//!
//! Projectile contacts go through the quadtree broad phase and are then
//! confirmed with an exact circle test. Nothing is removed from the entity
//! lists here; dead entities are flagged and swept at the end of the frame,
//! which keeps the tree's index handles valid for the whole pass.

use super::bounds::{Aabb, circles_overlap};
use super::progression::KNOCKBACK_DISTANCE;
use super::state::{DestructibleKind, GameEvent, GamePhase, PickupKind, World};
use crate::consts::*;

/// Broad-phase handle: an index into the world's enemy or obstacle list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Enemy(usize),
    Destructible(usize),
}

/// Fraction of the remaining distance a magnetised pickup moves per frame
pub const MAGNET_PULL: f32 = 0.05;

/// Summary of one projectile pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProjectilePass {
    /// Confirmed projectile-enemy hits
    pub hits: usize,
    /// Enemies brought to zero health
    pub defeated: usize,
    /// The pass stopped early because the phase left `Playing`
    pub interrupted: bool,
}

/// Rebuild the quadtree from current enemy and obstacle positions
pub fn rebuild_index(world: &mut World) {
    world.index.clear();
    for (i, enemy) in world.enemies.iter().enumerate() {
        if !enemy.is_dead() {
            world.index.insert(Aabb::around(enemy.pos, enemy.size), Target::Enemy(i));
        }
    }
    for (i, obstacle) in world.destructibles.iter().enumerate() {
        if !obstacle.is_destroyed() {
            world
                .index
                .insert(Aabb::around(obstacle.pos, obstacle.size), Target::Destructible(i));
        }
    }
}

/// Test every live projectile against nearby targets.
///
/// Each projectile damages a given entity at most once. Defeat rewards are
/// granted as soon as the projectile is done, and the pass stops if a
/// reward pauses the game (level-up).
pub fn resolve_projectile_hits(world: &mut World) -> ProjectilePass {
    let mut pass = ProjectilePass::default();
    let knockback = world.player.knockback_strength * KNOCKBACK_DISTANCE;
    let mut candidates = Vec::new();
    let mut defeated = Vec::new();
    let mut broken = Vec::new();

    for slot in 0..world.weapons.capacity() {
        defeated.clear();
        broken.clear();
        {
            let proj = &mut world.weapons.slots_mut()[slot];
            if !proj.active {
                continue;
            }
            candidates.clear();
            world
                .index
                .retrieve_into(&Aabb::around(proj.pos, proj.size), &mut candidates);

            for &target in &candidates {
                if !proj.active {
                    break;
                }
                match target {
                    Target::Enemy(i) => {
                        let enemy = &mut world.enemies[i];
                        if !enemy.is_targetable()
                            || !circles_overlap(proj.pos, proj.radius(), enemy.pos, enemy.radius())
                            || !proj.register_hit(enemy.id)
                        {
                            continue;
                        }
                        enemy.health -= proj.damage;
                        if knockback > 0.0 {
                            enemy.pos += proj.vel.normalize_or_zero() * knockback;
                        }
                        pass.hits += 1;
                        if enemy.is_dead() {
                            defeated.push(i);
                        }
                    }
                    Target::Destructible(i) => {
                        let obstacle = &mut world.destructibles[i];
                        if obstacle.is_destroyed()
                            || !circles_overlap(proj.pos, proj.radius(), obstacle.pos, obstacle.radius())
                        {
                            continue;
                        }
                        match obstacle.kind {
                            DestructibleKind::Brick => proj.absorb(),
                            DestructibleKind::Barrel => {
                                if proj.register_hit(obstacle.id) {
                                    obstacle.health -= proj.damage;
                                    if obstacle.is_destroyed() {
                                        broken.push(obstacle.pos);
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }

        for &pos in &broken {
            world.spawn_pickup(PickupKind::Box, pos);
        }
        for &i in &defeated {
            world.on_enemy_defeated(i);
        }
        pass.defeated += defeated.len();

        if world.phase != GamePhase::Playing {
            pass.interrupted = true;
            break;
        }
    }
    pass
}

/// Damage the player once if any enemy touches them. Returns whether a life
/// was lost.
pub fn resolve_player_contacts(world: &mut World, now: f64) -> bool {
    let player = &world.player;
    if player.is_dashing || player.is_invincible(now) {
        return false;
    }
    let touching = world
        .enemies
        .iter()
        .any(|e| !e.is_dead() && circles_overlap(player.pos, player.radius(), e.pos, e.radius()));
    if !touching {
        return false;
    }
    world.hurt_player(now);
    true
}

impl World {
    /// Take one life and start the hit grace window
    pub fn hurt_player(&mut self, now: f64) {
        self.player.lives = self.player.lives.saturating_sub(1);
        self.player.grant_invincibility(now + HIT_INVINCIBILITY_MS);
        self.events.push(GameEvent::PlayerHit {
            lives_left: self.player.lives,
        });
        log::debug!("Player hit, {} lives left", self.player.lives);
        if self.player.lives == 0 {
            self.game_over();
        }
    }
}

/// Expire, attract, and collect pickups
pub fn collect_pickups(world: &mut World, now: f64) {
    world
        .pickups
        .retain(|p| p.expires_at.is_none_or(|deadline| now < deadline));

    let target = world.player.pos;
    let magnet = world.player.magnet_radius;
    let reach = world.player.size;
    let mut collected = Vec::new();
    world.pickups.retain_mut(|p| {
        if p.pos.distance(target) < magnet {
            p.pos = p.pos.lerp(target, MAGNET_PULL);
        }
        if p.pos.distance(target) < reach {
            collected.push(p.kind);
            false
        } else {
            true
        }
    });

    for kind in collected {
        match kind {
            PickupKind::XpGem => {
                world.events.push(GameEvent::XpCollected);
                world.grant_xp(1.0);
            }
            PickupKind::Apple => {
                world.player.apples += 1;
                if world.player.lives < world.player.max_lives {
                    world.player.lives += 1;
                }
                world.events.push(GameEvent::AppleCollected);
            }
            PickupKind::Box => {
                world.grant_random_power_up();
            }
        }
    }
}

/// Whether the player is touching the merchant
pub fn touching_merchant(world: &World) -> bool {
    world.merchant.is_some_and(|m| {
        circles_overlap(world.player.pos, world.player.radius(), m.pos, m.size / 2.0)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Settings;
    use glam::Vec2;
    use crate::sim::enemy::{Enemy, Species};
    use crate::sim::weapon::ShotConfig;

    fn world() -> World {
        let mut w = World::new(11, Settings::default(), 0.0);
        w.destructibles.clear();
        w
    }

    fn zombie_at(w: &mut World, pos: Vec2, health: f32) -> u32 {
        w.insert_enemy(Enemy::new(0, Species::Zombie, pos, 0.0, health, 0.0))
    }

    #[test]
    fn test_projectile_hits_overlapping_enemy_once() {
        let mut w = world();
        let id = zombie_at(&mut w, Vec2::new(300.0, 300.0), 5.0);
        let shot = ShotConfig {
            hits: 3,
            ..Default::default()
        };
        w.weapons.fire(Vec2::new(300.0, 300.0), 0.0, &shot, 0.0);

        rebuild_index(&mut w);
        let first = resolve_projectile_hits(&mut w);
        let second = resolve_projectile_hits(&mut w);
        assert_eq!(first.hits, 1);
        assert_eq!(second.hits, 0);
        let enemy = w.enemies.iter().find(|e| e.id == id).expect("enemy");
        assert_eq!(enemy.health, 4.0);
    }

    #[test]
    fn test_piercing_projectile_spends_itself() {
        let mut w = world();
        zombie_at(&mut w, Vec2::new(300.0, 300.0), 5.0);
        zombie_at(&mut w, Vec2::new(305.0, 300.0), 5.0);
        zombie_at(&mut w, Vec2::new(310.0, 300.0), 5.0);
        let shot = ShotConfig {
            hits: 2,
            ..Default::default()
        };
        w.weapons.fire(Vec2::new(305.0, 300.0), 0.0, &shot, 0.0);
        rebuild_index(&mut w);
        let pass = resolve_projectile_hits(&mut w);
        assert_eq!(pass.hits, 2);
        assert_eq!(w.weapons.active_count(), 0);
    }

    #[test]
    fn test_kill_rewards_and_sweep() {
        let mut w = world();
        zombie_at(&mut w, Vec2::new(300.0, 300.0), 1.0);
        w.weapons.fire(Vec2::new(300.0, 300.0), 0.0, &ShotConfig::default(), 0.0);
        rebuild_index(&mut w);
        let pass = resolve_projectile_hits(&mut w);
        assert_eq!(pass.defeated, 1);
        assert_eq!(w.enemies_defeated, 1);
        w.remove_dead();
        assert!(w.enemies.is_empty());
    }

    #[test]
    fn test_brick_absorbs_and_barrel_breaks() {
        let mut w = world();
        w.spawn_destructible(DestructibleKind::Brick, Vec2::new(200.0, 200.0));
        w.spawn_destructible(DestructibleKind::Barrel, Vec2::new(600.0, 600.0));
        let shot = ShotConfig::default();
        w.weapons.fire(Vec2::new(200.0, 200.0), 0.0, &shot, 0.0);
        w.weapons.fire(Vec2::new(600.0, 600.0), 0.0, &shot, 0.0);
        rebuild_index(&mut w);
        resolve_projectile_hits(&mut w);

        assert_eq!(w.weapons.active_count(), 0);
        w.remove_dead();
        assert_eq!(w.destructibles.len(), 1);
        assert_eq!(w.destructibles[0].kind, DestructibleKind::Brick);
        assert!(w.pickups.iter().any(|p| p.kind == PickupKind::Box));
    }

    #[test]
    fn test_invisible_ghost_is_not_hit() {
        let mut w = world();
        let mut ghost = Enemy::new(0, Species::Ghost, Vec2::new(300.0, 300.0), 0.0, 4.0, 0.0);
        ghost.behavior = crate::sim::enemy::EnemyBehavior::Ghost {
            visible: false,
            last_phase_change: 0.0,
        };
        w.insert_enemy(ghost);
        w.weapons.fire(Vec2::new(300.0, 300.0), 0.0, &ShotConfig::default(), 0.0);
        rebuild_index(&mut w);
        assert_eq!(resolve_projectile_hits(&mut w).hits, 0);
        assert_eq!(w.weapons.active_count(), 1);
    }

    #[test]
    fn test_contact_costs_one_life_then_grace() {
        let mut w = world();
        let at = w.player.pos;
        zombie_at(&mut w, at, 1.0);
        zombie_at(&mut w, at + Vec2::new(3.0, 0.0), 1.0);

        assert!(resolve_player_contacts(&mut w, 100.0));
        assert_eq!(w.player.lives, PLAYER_LIVES - 1);
        assert!(!resolve_player_contacts(&mut w, 100.0 + HIT_INVINCIBILITY_MS - 1.0));
        assert!(resolve_player_contacts(&mut w, 100.0 + HIT_INVINCIBILITY_MS));
        assert_eq!(w.player.lives, PLAYER_LIVES - 2);
    }

    #[test]
    fn test_dashing_player_is_not_hurt() {
        let mut w = world();
        let at = w.player.pos;
        zombie_at(&mut w, at, 1.0);
        w.player.is_dashing = true;
        assert!(!resolve_player_contacts(&mut w, 0.0));
        assert_eq!(w.player.lives, PLAYER_LIVES);
    }

    #[test]
    fn test_last_life_ends_run() {
        let mut w = world();
        w.player.lives = 1;
        w.hurt_player(0.0);
        assert_eq!(w.phase, GamePhase::GameOver);
    }

    #[test]
    fn test_magnet_pulls_then_collects() {
        let mut w = world();
        let at = w.player.pos;
        w.spawn_pickup(PickupKind::XpGem, at + Vec2::new(PLAYER_MAGNET_RADIUS - 1.0, 0.0));
        collect_pickups(&mut w, 0.0);
        assert_eq!(w.pickups.len(), 1);
        assert!(w.pickups[0].pos.x < at.x + PLAYER_MAGNET_RADIUS - 1.0);
        for _ in 0..20 {
            collect_pickups(&mut w, 0.0);
        }
        assert!(w.pickups.is_empty());
        assert_eq!(w.player.xp, 1.0);
    }

    #[test]
    fn test_apple_expires_on_the_ground() {
        let mut w = world();
        w.spawn_pickup(PickupKind::Apple, Vec2::new(10.0, 10.0));
        collect_pickups(&mut w, 4999.0);
        assert_eq!(w.pickups.len(), 1);
        collect_pickups(&mut w, 5000.0);
        assert!(w.pickups.is_empty());
    }
}
