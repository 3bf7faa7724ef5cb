//! Horde Survivor entry point
//!
//! Native builds run a headless autopilot session: load progress, play one
//! run on a fixed 60 Hz clock, bank the result and save. Browser hosts link
//! the library directly and drive `tick` from their own frame loop.
//!
//! Usage: `horde-survivor [settings.json] [progress.json]`

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use horde_survivor::audio::{AudioManager, LogNotifier};
    use horde_survivor::persistence::{JsonFileStore, load_or_default};
    use horde_survivor::sim::{GamePhase, TickInput, tick};
    use horde_survivor::{Settings, platform, session};

    /// 60 Hz frame step (ms)
    const FRAME_MS: f64 = 1000.0 / 60.0;
    /// Give up after ten simulated minutes
    const MAX_FRAMES: u64 = 60 * 60 * 10;
    const DEFAULT_PROGRESS_PATH: &str = "horde_survivor_progress.json";

    horde_survivor::init_logging();
    log::info!("Horde Survivor (headless) starting...");

    let mut args = std::env::args().skip(1);
    let settings = match args.next() {
        Some(path) => match std::fs::read_to_string(&path) {
            Ok(json) => Settings::from_json(&json),
            Err(e) => {
                log::warn!("Could not read settings {}: {}", path, e);
                Settings::default()
            }
        },
        None => Settings::default(),
    };
    let mut store = JsonFileStore::new(args.next().unwrap_or_else(|| DEFAULT_PROGRESS_PATH.into()));
    let mut progress = load_or_default(&store);

    let seed = platform::run_seed();
    let mut now = 0.0;
    let mut world = session::start_run(&progress, settings, seed, now);
    let mut audio = AudioManager::new(LogNotifier);
    let input = TickInput {
        autopilot: true,
        ..Default::default()
    };

    let mut frames = 0;
    while !world.is_over() && frames < MAX_FRAMES {
        now += FRAME_MS;
        frames += 1;
        tick(&mut world, &input, now);

        match world.phase {
            GamePhase::LevelUp => {
                if let Some(kind) = world.choose_upgrade(0) {
                    log::info!("Level {}: took {}", world.player.level, kind.key());
                }
            }
            GamePhase::Merchant => {
                world.trade_apples_for_xp();
                if world.phase == GamePhase::Merchant {
                    world.leave_merchant();
                }
            }
            _ => {}
        }

        audio.dispatch(&world.drain_events());
    }

    if !world.is_over() {
        log::info!("Frame limit reached, ending run");
    }
    let (summary, earned) = session::finish_and_save(&world, &mut progress, &mut store);
    log::info!(
        "Score {} | level {} | {} kills ({} bosses) | {:.1}s survived",
        summary.score,
        summary.level,
        summary.kills,
        summary.bosses,
        summary.duration_ms / 1000.0
    );
    for key in earned {
        log::info!("Achievement unlocked: {}", key);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // Browser hosts use the library; this only satisfies the bin target
}
