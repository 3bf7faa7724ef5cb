//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must stay free of rendering
//! and platform dependencies:
//! - Wall-clock timestamps come in through `tick`
//! - Seeded RNG only
//! - Stable iteration order (insertion order of entity lists)

pub mod bounds;
pub mod collision;
pub mod companion;
pub mod enemy;
pub mod progression;
pub mod quadtree;
pub mod snapshot;
pub mod state;
pub mod tick;
pub mod weapon;

pub use bounds::{Aabb, circles_overlap};
pub use collision::{ProjectilePass, Target};
pub use companion::{Companions, DogState};
pub use enemy::{Enemy, EnemyBehavior, Species};
pub use progression::{UPGRADE_CATALOG, UpgradeKind, UpgradeOption, fire_interval_ms};
pub use quadtree::Quadtree;
pub use snapshot::{Hud, Snapshot, SpriteKind, SpriteView};
pub use state::{
    Destructible, DestructibleKind, GameEvent, GamePhase, Merchant, ModifierKind, Modifiers,
    Pickup, PickupKind, Player, PowerUp, RunBonuses, World,
};
pub use tick::{TickInput, tick};
pub use weapon::{Projectile, ShotConfig, SpreadPattern, WeaponPool};
