//! Run settings chosen before a run starts
//!
//! Loaded and saved as JSON alongside the meta progress.

use serde::{Deserialize, Serialize};

/// Difficulty levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Difficulty {
    #[default]
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "easy" => Some(Difficulty::Easy),
            "medium" | "med" => Some(Difficulty::Medium),
            "hard" => Some(Difficulty::Hard),
            _ => None,
        }
    }

    /// Enemy speed multiplier
    pub fn speed_multiplier(&self) -> f32 {
        match self {
            Difficulty::Easy => 0.9,
            Difficulty::Medium => 1.35,
            Difficulty::Hard => 1.75,
        }
    }

    /// Extra enemy speed per player level above 1
    pub fn level_speed_multiplier(&self, player_level: u32) -> f32 {
        let per_level = match self {
            Difficulty::Hard => 0.025,
            _ => 0.02,
        };
        1.0 + per_level * player_level.saturating_sub(1) as f32
    }
}

/// Playable characters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Character {
    /// Standard bullets and dash
    #[default]
    Cowboy,
    /// Fires a two-bone fan; dashing releases a nova of bones
    Skull,
}

impl Character {
    pub fn as_str(&self) -> &'static str {
        match self {
            Character::Cowboy => "Cowboy",
            Character::Skull => "Skull",
        }
    }

    /// Achievement required to play this character, if any
    pub fn required_achievement(&self) -> Option<&'static str> {
        match self {
            Character::Cowboy => None,
            Character::Skull => Some("slayer"),
        }
    }
}

/// Run configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub difficulty: Difficulty,
    pub character: Character,
    /// Level-up drafts offer 2 options instead of 3
    pub hardcore: bool,
    /// Upper bound on live enemies
    pub max_enemies: usize,
    /// Milliseconds between regular enemy spawns
    pub spawn_interval_ms: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            difficulty: Difficulty::Easy,
            character: Character::Cowboy,
            hardcore: false,
            max_enemies: crate::consts::MAX_ENEMIES,
            spawn_interval_ms: crate::consts::ENEMY_SPAWN_INTERVAL_MS,
        }
    }
}

impl Settings {
    /// Number of options shown on level-up
    pub fn draft_size(&self) -> usize {
        if self.hardcore { 2 } else { 3 }
    }

    /// Parse settings JSON, falling back to defaults on malformed input
    pub fn from_json(json: &str) -> Self {
        match serde_json::from_str(json) {
            Ok(settings) => settings,
            Err(e) => {
                log::warn!("Ignoring malformed settings: {}", e);
                Self::default()
            }
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_difficulty_from_str() {
        assert_eq!(Difficulty::from_str("HARD"), Some(Difficulty::Hard));
        assert_eq!(Difficulty::from_str("med"), Some(Difficulty::Medium));
        assert_eq!(Difficulty::from_str("nightmare"), None);
    }

    #[test]
    fn test_level_speed_multiplier() {
        assert_eq!(Difficulty::Easy.level_speed_multiplier(1), 1.0);
        assert!((Difficulty::Medium.level_speed_multiplier(11) - 1.2).abs() < 1e-6);
        assert!((Difficulty::Hard.level_speed_multiplier(11) - 1.25).abs() < 1e-6);
    }

    #[test]
    fn test_draft_size() {
        let mut s = Settings::default();
        assert_eq!(s.draft_size(), 3);
        s.hardcore = true;
        assert_eq!(s.draft_size(), 2);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let s = Settings::from_json(r#"{"difficulty":"Hard"}"#);
        assert_eq!(s.difficulty, Difficulty::Hard);
        assert_eq!(s.character, Character::Cowboy);
        assert_eq!(s.max_enemies, crate::consts::MAX_ENEMIES);

        let fallback = Settings::from_json("not json");
        assert_eq!(fallback.difficulty, Difficulty::Easy);
    }
}
