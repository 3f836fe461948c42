use std::{
    fs,
    path::Path,
    sync::{atomic::Ordering, Arc},
};

use anyhow::{bail, Context};
use atomic_float::AtomicF64;
use fourkey_chart::{ParseOptions, ParseReport};
use fourkey_core::input::events::KeyEvent;
use fourkey_core::input::InputQueue;
use fourkey_core::time::conductor::Conductor;
use fourkey_core::{GameplayConfig, JudgementEvent, PlaySession, Stats};
use fourkey_schema::{Beatmap, Millis};
use serde::Serialize;

/// Time simulated after the last object so every deadline can pass.
const TAIL_MS: Millis = 1000.0;

pub fn load_chart(path: impl AsRef<Path>, options: &ParseOptions) -> anyhow::Result<ParseReport> {
    let path = path.as_ref();
    fourkey_chart::parse_file_with_options(path, options)
        .with_context(|| format!("failed to load chart: {}", path.display()))
}

/// Reads a beatmap previously written by `fourkey parse`.
pub fn load_beatmap_json(path: impl AsRef<Path>) -> anyhow::Result<Beatmap> {
    let path = path.as_ref();
    let bytes = fs::read(path).with_context(|| format!("failed to read beatmap: {}", path.display()))?;
    serde_json::from_slice(&bytes).with_context(|| format!("failed to parse beatmap json: {}", path.display()))
}

pub fn load_key_events(path: impl AsRef<Path>) -> anyhow::Result<Vec<KeyEvent>> {
    let path = path.as_ref();
    let src = fs::read_to_string(path).with_context(|| format!("failed to read inputs: {}", path.display()))?;
    serde_json::from_str(&src).with_context(|| format!("failed to parse inputs json: {}", path.display()))
}

#[derive(Debug, Clone, Copy)]
pub struct SimulationOptions {
    pub frame_ms: Millis,
    /// How often the simulated audio thread publishes its position.
    pub audio_update_ms: Millis,
}

impl Default for SimulationOptions {
    fn default() -> Self {
        Self {
            frame_ms: 16.0,
            audio_update_ms: 50.0,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SimulationReport {
    pub stats: Stats,
    pub judgements: Vec<JudgementEvent>,
    pub frames: u64,
    pub end_time_ms: Millis,
    pub finished: bool,
}

/// Plays `beatmap` against scripted key events with a fixed frame clock.
///
/// Each frame queues the inputs that happened up to the song time, drains
/// them into the session and then runs the expiry sweep.
pub fn simulate(
    beatmap: Arc<Beatmap>,
    config: GameplayConfig,
    inputs: &[KeyEvent],
    options: SimulationOptions,
) -> anyhow::Result<SimulationReport> {
    if !(options.frame_ms.is_finite() && options.frame_ms > 0.0) {
        bail!("frame length must be positive, got {}", options.frame_ms);
    }
    let audio_update_ms = if options.audio_update_ms.is_finite() && options.audio_update_ms > 0.0 {
        options.audio_update_ms
    } else {
        options.frame_ms
    };

    let mut inputs = inputs.to_vec();
    inputs.sort_by(|a, b| a.time_ms.total_cmp(&b.time_ms));

    let end_time_ms = beatmap.last_object_end() as f64
        + config.windows().max_window.max(config.windows().miss)
        + TAIL_MS;

    let mut session = PlaySession::new(config);
    session.select_chart(beatmap);
    let judgements_rx = session.subscribe();
    session.play()?;

    let audio_position = Arc::new(AtomicF64::new(0.0));
    let mut conductor = Conductor::new(Arc::clone(&audio_position));
    let queue = InputQueue::new();
    let mut pending = inputs.into_iter().peekable();
    let mut next_audio_update = 0.0;
    let mut frames = 0u64;
    let mut host_ms = 0.0;

    loop {
        if host_ms >= next_audio_update {
            audio_position.store(host_ms, Ordering::Release);
            conductor.update(host_ms);
            next_audio_update += audio_update_ms;
        }
        let now = conductor.time_ms(host_ms);

        while let Some(event) = pending.next_if(|e| e.time_ms <= now) {
            queue.push(event);
        }
        session.drain_input(&queue);
        session.tick(now);
        frames += 1;

        if now >= end_time_ms || (session.is_finished() && pending.peek().is_none()) {
            break;
        }
        host_ms += options.frame_ms;
    }

    log::debug!("simulation ran {frames} frames up to {host_ms}ms");
    Ok(SimulationReport {
        stats: session.stats().clone(),
        judgements: judgements_rx.try_iter().collect(),
        frames,
        end_time_ms: host_ms,
        finished: session.is_finished(),
    })
}
