//! Browser host bindings
//!
//! JavaScript owns the canvas, input listeners and the animation frame
//! loop. Each frame it calls [`WebGame::tick`], draws the JSON snapshot and
//! plays the sound names returned by [`WebGame::take_sounds`].

use wasm_bindgen::prelude::*;

use crate::audio::{AudioManager, Notifier, SoundEffect};
use crate::persistence::{LocalStorageStore, load_or_default};
use crate::progress::SavedProgress;
use crate::session;
use crate::settings::Settings;
use crate::sim::{GamePhase, TickInput, World, tick};

/// Queues sound names for JS and vibrates through the Navigator API
#[derive(Debug, Default)]
struct WebNotifier {
    pending: Vec<&'static str>,
}

impl Notifier for WebNotifier {
    fn notify(&mut self, effect: SoundEffect) {
        self.pending.push(effect.asset_name());
    }

    fn vibrate(&mut self, duration_ms: u32) {
        if let Some(window) = web_sys::window() {
            let _ = window.navigator().vibrate_with_duration(duration_ms);
        }
    }
}

#[wasm_bindgen]
pub struct WebGame {
    world: World,
    progress: SavedProgress,
    store: LocalStorageStore,
    audio: AudioManager<WebNotifier>,
    input: TickInput,
    banked: bool,
}

#[wasm_bindgen]
impl WebGame {
    /// Start a run; `settings_json` may be empty or malformed
    #[wasm_bindgen(constructor)]
    pub fn new(settings_json: &str, now: f64) -> WebGame {
        crate::init_logging();
        let settings = if settings_json.is_empty() {
            Settings::default()
        } else {
            Settings::from_json(settings_json)
        };
        let store = LocalStorageStore::default();
        let progress = load_or_default(&store);
        let world = session::start_run(&progress, settings, crate::platform::run_seed(), now);
        log::info!("Horde Survivor (web) started");
        WebGame {
            world,
            progress,
            store,
            audio: AudioManager::new(WebNotifier::default()),
            input: TickInput::default(),
            banked: false,
        }
    }

    pub fn set_move(&mut self, x: f32, y: f32) {
        self.input.move_dir = glam::Vec2::new(x, y);
    }

    pub fn set_aim(&mut self, x: f32, y: f32) {
        self.input.aim_dir = glam::Vec2::new(x, y);
    }

    pub fn set_player_two(&mut self, move_x: f32, move_y: f32, aim_x: f32, aim_y: f32) {
        self.input.player_two_move = glam::Vec2::new(move_x, move_y);
        self.input.player_two_aim = glam::Vec2::new(aim_x, aim_y);
    }

    /// One-shot requests apply to the next tick only
    pub fn request_dash(&mut self) {
        self.input.dash = true;
    }

    pub fn toggle_pause(&mut self) {
        self.input.pause = true;
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.audio.set_muted(muted);
    }

    /// Advance one frame; banks and saves progress once when the run ends
    pub fn tick(&mut self, now: f64) {
        tick(&mut self.world, &self.input, now);
        self.input.dash = false;
        self.input.pause = false;

        let events = self.world.drain_events();
        self.audio.dispatch(&events);

        if self.world.is_over() && !self.banked {
            self.banked = true;
            session::finish_and_save(&self.world, &mut self.progress, &mut self.store);
        }
    }

    /// Current frame as JSON (sprites + HUD)
    pub fn snapshot_json(&self) -> String {
        serde_json::to_string(&self.world.snapshot()).unwrap_or_default()
    }

    /// Sound asset names queued since the last call
    pub fn take_sounds(&mut self) -> Vec<String> {
        std::mem::take(&mut self.audio.notifier_mut().pending)
            .into_iter()
            .map(String::from)
            .collect()
    }

    pub fn choose_upgrade(&mut self, index: usize) -> bool {
        self.world.choose_upgrade(index).is_some()
    }

    pub fn trade_apples(&mut self) -> bool {
        self.world.trade_apples_for_xp()
    }

    pub fn leave_merchant(&mut self) {
        self.world.leave_merchant();
    }

    pub fn join_player_two(&mut self) -> bool {
        self.world.join_player_two()
    }

    pub fn is_level_up(&self) -> bool {
        self.world.phase == GamePhase::LevelUp
    }

    pub fn is_over(&self) -> bool {
        self.world.is_over()
    }

    pub fn currency(&self) -> f64 {
        self.progress.currency as f64
    }
}
