//! Fire-and-forget sound and haptic notifications
//!
//! The simulation never plays audio itself. Hosts drain the frame's
//! [`GameEvent`]s and hand them to an [`AudioManager`], which maps them to
//! [`SoundEffect`]s and forwards them to whatever [`Notifier`] the platform
//! provides. Notifier failures are swallowed.

use crate::sim::GameEvent;

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundEffect {
    /// Any shot leaving the weapon pool
    PlayerShoot,
    /// Player takes damage
    PlayerScream,
    EnemyDeath,
    XpPickup,
    /// Mystery box or apple collected
    BoxPickup,
    /// Dash started
    Dodge,
    LevelUp,
    /// Upgrade chosen or merchant menu
    UiClick,
    GameOver,
}

impl SoundEffect {
    /// Asset name the host loads for this effect
    pub fn asset_name(self) -> &'static str {
        match self {
            SoundEffect::PlayerShoot => "playerShoot",
            SoundEffect::PlayerScream => "playerScream",
            SoundEffect::EnemyDeath => "enemyDeath",
            SoundEffect::XpPickup => "xpPickup",
            SoundEffect::BoxPickup => "boxPickup",
            SoundEffect::Dodge => "dodge",
            SoundEffect::LevelUp => "levelUp",
            SoundEffect::UiClick => "uiClick",
            SoundEffect::GameOver => "gameOver",
        }
    }

    /// Sound for a simulation event, if it has one
    pub fn for_event(event: &GameEvent) -> Option<Self> {
        let effect = match event {
            GameEvent::ShotFired => SoundEffect::PlayerShoot,
            GameEvent::PlayerHit { .. } => SoundEffect::PlayerScream,
            GameEvent::EnemyDefeated { .. } => SoundEffect::EnemyDeath,
            GameEvent::XpCollected => SoundEffect::XpPickup,
            GameEvent::AppleCollected | GameEvent::PowerUpCollected(_) => SoundEffect::BoxPickup,
            GameEvent::Dashed => SoundEffect::Dodge,
            GameEvent::LevelUpReady { .. } => SoundEffect::LevelUp,
            GameEvent::UpgradeChosen(_) | GameEvent::MerchantOpened | GameEvent::MerchantClosed => {
                SoundEffect::UiClick
            }
            GameEvent::GameOver => SoundEffect::GameOver,
            GameEvent::BossSpawned(_)
            | GameEvent::MerchantArrived
            | GameEvent::PlayerTwoJoined => return None,
        };
        Some(effect)
    }
}

/// Haptic pulse on player damage (ms)
pub const HIT_VIBRATION_MS: u32 = 100;

/// Platform sink for sounds and haptics
pub trait Notifier {
    fn notify(&mut self, effect: SoundEffect);

    /// Devices without haptics ignore this
    fn vibrate(&mut self, _duration_ms: u32) {}
}

/// Notifier that only logs (headless runs)
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&mut self, effect: SoundEffect) {
        log::trace!("sound: {}", effect.asset_name());
    }
}

/// Routes simulation events to a notifier
#[derive(Debug, Default)]
pub struct AudioManager<N: Notifier> {
    notifier: N,
    muted: bool,
}

impl<N: Notifier> AudioManager<N> {
    pub fn new(notifier: N) -> Self {
        Self {
            notifier,
            muted: false,
        }
    }

    /// Mute/unmute all audio (haptics still fire)
    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    /// Play a sound effect
    pub fn play(&mut self, effect: SoundEffect) {
        if !self.muted {
            self.notifier.notify(effect);
        }
    }

    /// Forward every event from one frame
    pub fn dispatch(&mut self, events: &[GameEvent]) {
        for event in events {
            if matches!(event, GameEvent::PlayerHit { .. }) {
                self.notifier.vibrate(HIT_VIBRATION_MS);
            }
            if let Some(effect) = SoundEffect::for_event(event) {
                self.play(effect);
            }
        }
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    pub fn notifier_mut(&mut self) -> &mut N {
        &mut self.notifier
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::Species;

    #[derive(Default)]
    struct Recorder {
        sounds: Vec<SoundEffect>,
        vibrations: Vec<u32>,
    }

    impl Notifier for Recorder {
        fn notify(&mut self, effect: SoundEffect) {
            self.sounds.push(effect);
        }

        fn vibrate(&mut self, duration_ms: u32) {
            self.vibrations.push(duration_ms);
        }
    }

    #[test]
    fn test_dispatch_maps_events() {
        let mut audio = AudioManager::new(Recorder::default());
        audio.dispatch(&[
            GameEvent::ShotFired,
            GameEvent::EnemyDefeated {
                species: Species::Zombie,
                is_boss: false,
            },
            GameEvent::MerchantArrived,
            GameEvent::PlayerHit { lives_left: 2 },
        ]);
        assert_eq!(
            audio.notifier().sounds,
            vec![
                SoundEffect::PlayerShoot,
                SoundEffect::EnemyDeath,
                SoundEffect::PlayerScream
            ]
        );
        assert_eq!(audio.notifier().vibrations, vec![HIT_VIBRATION_MS]);
    }

    #[test]
    fn test_muted_suppresses_sound_only() {
        let mut audio = AudioManager::new(Recorder::default());
        audio.set_muted(true);
        audio.dispatch(&[GameEvent::PlayerHit { lives_left: 0 }, GameEvent::GameOver]);
        assert!(audio.notifier().sounds.is_empty());
        assert_eq!(audio.notifier().vibrations.len(), 1);
    }
}
