//! Read-only view of a frame for renderers and UIs
//!
//! The simulation never draws. Hosts call [`World::snapshot`] after each
//! frame and render the sprite list plus the HUD fields however they like.

use serde::Serialize;

use super::enemy::Species;
use super::progression::UpgradeKind;
use super::state::{DestructibleKind, GamePhase, ModifierKind, PickupKind, World};
use crate::consts::*;
use crate::settings::Character;

/// What a sprite depicts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SpriteKind {
    Player(Character),
    PlayerTwo,
    Enemy,
    Boss,
    Projectile,
    Pickup(PickupKind),
    Obstacle(DestructibleKind),
    Merchant,
    Dog,
    Owl,
    Doppelganger,
}

/// One drawable entity
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SpriteView {
    pub kind: SpriteKind,
    pub x: f32,
    pub y: f32,
    pub size: f32,
    /// Set for enemies and bosses
    pub species: Option<Species>,
    /// False for sprites drawn faded (invisible ghosts, invincible player)
    pub active: bool,
}

/// HUD fields
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Hud {
    pub phase: GamePhase,
    pub score: u64,
    pub level: u32,
    pub xp: f32,
    pub xp_to_next: u32,
    pub lives: u32,
    pub coins: u32,
    pub apples: u32,
    pub elapsed_ms: f64,
    pub dash_ready: bool,
    pub modifiers: Vec<ModifierKind>,
    /// Options awaiting a choice during level-up
    pub draft: Vec<UpgradeKind>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub sprites: Vec<SpriteView>,
    pub hud: Hud,
}

fn sprite(kind: SpriteKind, pos: glam::Vec2, size: f32) -> SpriteView {
    SpriteView {
        kind,
        x: pos.x,
        y: pos.y,
        size,
        species: None,
        active: true,
    }
}

impl World {
    /// Capture everything a renderer needs for the current frame
    pub fn snapshot(&self) -> Snapshot {
        let mut sprites = Vec::with_capacity(
            self.destructibles.len() + self.pickups.len() + self.enemies.len() + self.weapons.active_count() + 6,
        );

        sprites.extend(
            self.destructibles
                .iter()
                .map(|d| sprite(SpriteKind::Obstacle(d.kind), d.pos, d.size)),
        );
        sprites.extend(
            self.pickups
                .iter()
                .map(|p| sprite(SpriteKind::Pickup(p.kind), p.pos, p.size)),
        );
        if let Some(m) = self.merchant {
            sprites.push(sprite(SpriteKind::Merchant, m.pos, m.size));
        }
        sprites.extend(self.enemies.iter().map(|e| SpriteView {
            species: Some(e.species),
            active: e.is_targetable(),
            ..sprite(
                if e.is_boss { SpriteKind::Boss } else { SpriteKind::Enemy },
                e.pos,
                e.size,
            )
        }));
        sprites.extend(
            self.weapons
                .iter_active()
                .map(|p| sprite(SpriteKind::Projectile, p.pos, p.size)),
        );

        let c = &self.companions;
        if let Some(dog) = &c.dog {
            sprites.push(sprite(SpriteKind::Dog, dog.pos, super::companion::DOG_SIZE));
        }
        if let Some(owl) = &c.owl {
            sprites.push(sprite(SpriteKind::Owl, owl.pos, super::companion::OWL_SIZE));
        }
        if let Some(double) = &c.doppelganger {
            sprites.push(sprite(SpriteKind::Doppelganger, double.pos, PLAYER_SIZE));
        }
        if let Some(p2) = &c.player_two {
            sprites.push(sprite(SpriteKind::PlayerTwo, p2.pos, PLAYER_SIZE));
        }

        let player = &self.player;
        sprites.push(SpriteView {
            active: !player.is_invincible(self.now),
            ..sprite(SpriteKind::Player(player.character), player.pos, player.size)
        });

        Snapshot {
            sprites,
            hud: Hud {
                phase: self.phase,
                score: self.score,
                level: player.level,
                xp: player.xp,
                xp_to_next: player.xp_to_next,
                lives: player.lives,
                coins: player.coins,
                apples: player.apples,
                elapsed_ms: self.elapsed_ms(),
                dash_ready: player.can_dash(self.now),
                modifiers: self.modifiers.iter().collect(),
                draft: self.pending_draft.clone().unwrap_or_default(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Settings;
    use crate::sim::weapon::ShotConfig;
    use glam::Vec2;

    #[test]
    fn test_snapshot_lists_every_entity() {
        let mut w = World::new(2, Settings::default(), 0.0);
        w.spawn_enemy_at(Species::Bat, Vec2::new(100.0, 100.0));
        w.spawn_pickup(PickupKind::Apple, Vec2::new(200.0, 200.0));
        w.weapons.fire(Vec2::ZERO, 0.0, &ShotConfig::default(), 0.0);

        let snap = w.snapshot();
        let count = |kind: SpriteKind| snap.sprites.iter().filter(|s| s.kind == kind).count();
        assert_eq!(count(SpriteKind::Enemy), 1);
        assert_eq!(count(SpriteKind::Projectile), 1);
        assert_eq!(count(SpriteKind::Pickup(PickupKind::Apple)), 1);
        assert_eq!(count(SpriteKind::Player(Character::Cowboy)), 1);
        let enemy = snap
            .sprites
            .iter()
            .find(|s| s.kind == SpriteKind::Enemy)
            .expect("enemy sprite");
        assert_eq!(enemy.species, Some(Species::Bat));
        assert_eq!(snap.hud.lives, PLAYER_LIVES);
    }

    #[test]
    fn test_hud_shows_open_draft() {
        let mut w = World::new(2, Settings::default(), 0.0);
        w.grant_xp(FIRST_LEVEL_XP as f32);
        let snap = w.snapshot();
        assert_eq!(snap.hud.phase, GamePhase::LevelUp);
        assert_eq!(snap.hud.draft.len(), 3);
    }

    #[test]
    fn test_snapshot_serializes() {
        let w = World::new(2, Settings::default(), 0.0);
        let json = serde_json::to_string(&w.snapshot()).expect("serialize");
        assert!(json.contains("\"sprites\""));
    }
}
