use std::sync::Arc;

use crossbeam_channel::{unbounded, Receiver, Sender};
use fourkey_schema::{Beatmap, Millis, LANE_COUNT};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::GameplayConfig;
use crate::gameplay::judge::{JudgeMachine, JudgementEvent, Lane};
use crate::gameplay::position::PositionMapper;
use crate::gameplay::score::Stats;
use crate::input::events::KeyEvent;
use crate::input::InputQueue;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("no chart selected")]
    NoChart,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PlayState {
    #[default]
    Stopped,
    Playing,
    Paused,
}

/// Single-writer handle for hosts that drive input and ticks from different threads.
pub type SharedSession = Arc<Mutex<PlaySession>>;

/// Play lifecycle around one selected chart.
pub struct PlaySession {
    config: GameplayConfig,
    beatmap: Option<Arc<Beatmap>>,
    judge: Option<JudgeMachine>,
    stats: Stats,
    state: PlayState,
    pressed: [bool; LANE_COUNT],
    subscribers: Vec<Sender<JudgementEvent>>,
}

impl PlaySession {
    pub fn new(config: GameplayConfig) -> Self {
        Self {
            config,
            beatmap: None,
            judge: None,
            stats: Stats::default(),
            state: PlayState::Stopped,
            pressed: [false; LANE_COUNT],
            subscribers: Vec::new(),
        }
    }

    pub fn into_shared(self) -> SharedSession {
        Arc::new(Mutex::new(self))
    }

    pub fn config(&self) -> &GameplayConfig {
        &self.config
    }

    pub fn state(&self) -> PlayState {
        self.state
    }

    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    pub fn beatmap(&self) -> Option<&Arc<Beatmap>> {
        self.beatmap.as_ref()
    }

    pub fn judge(&self) -> Option<&JudgeMachine> {
        self.judge.as_ref()
    }

    /// Every note has been judged.
    pub fn is_finished(&self) -> bool {
        self.judge.as_ref().is_some_and(JudgeMachine::is_finished)
    }

    /// Receives every judgement from now on. Dropping the receiver unsubscribes.
    pub fn subscribe(&mut self) -> Receiver<JudgementEvent> {
        let (tx, rx) = unbounded();
        self.subscribers.push(tx);
        rx
    }

    /// Replaces the chart and rebuilds all judgement state from scratch.
    pub fn select_chart(&mut self, beatmap: Arc<Beatmap>) {
        log::info!(
            "chart selected: {} [{}], {} objects",
            beatmap.title().unwrap_or("untitled"),
            beatmap.version().unwrap_or("-"),
            beatmap.hit_objects.len()
        );
        self.judge = Some(JudgeMachine::new(
            &beatmap,
            self.config.windows(),
            self.config.auto_play,
        ));
        self.beatmap = Some(beatmap);
        self.stats = Stats::default();
        self.pressed = [false; LANE_COUNT];
        self.state = PlayState::Stopped;
    }

    /// Applies new settings. A selected chart is reloaded since windows and
    /// auto play are baked into the judge.
    pub fn set_config(&mut self, config: GameplayConfig) {
        self.config = config;
        if let Some(beatmap) = self.beatmap.clone() {
            self.select_chart(beatmap);
        }
    }

    pub fn play(&mut self) -> Result<(), SessionError> {
        if self.judge.is_none() {
            return Err(SessionError::NoChart);
        }
        if self.state != PlayState::Playing {
            log::info!("play");
            self.state = PlayState::Playing;
        }
        Ok(())
    }

    pub fn pause(&mut self) {
        if self.state == PlayState::Playing {
            log::info!("pause");
            self.state = PlayState::Paused;
        }
    }

    /// Continues play. Key state is forgotten since releases during the
    /// pause were never seen.
    pub fn resume(&mut self) {
        if self.state == PlayState::Paused {
            log::info!("resume");
            self.pressed = [false; LANE_COUNT];
            self.state = PlayState::Playing;
        }
    }

    /// Stops playback and rewinds: cursors, held notes, flags and stats.
    pub fn stop(&mut self) {
        log::info!("stop");
        if let Some(judge) = &mut self.judge {
            judge.reset();
        }
        self.stats = Stats::default();
        self.pressed = [false; LANE_COUNT];
        self.state = PlayState::Stopped;
    }

    pub fn key_down(&mut self, lane: Lane, t: Millis) -> Vec<JudgementEvent> {
        if !self.accepting(lane) {
            return Vec::new();
        }
        if std::mem::replace(&mut self.pressed[lane], true) {
            log::debug!("repeat key down on lane {lane} ignored");
            return Vec::new();
        }
        let events = match &mut self.judge {
            Some(judge) => judge.key_down(lane, t),
            None => Vec::new(),
        };
        self.publish(&events);
        events
    }

    pub fn key_up(&mut self, lane: Lane, t: Millis) -> Vec<JudgementEvent> {
        if !self.accepting(lane) {
            return Vec::new();
        }
        self.pressed[lane] = false;
        let events = match &mut self.judge {
            Some(judge) => judge.key_up(lane, t),
            None => Vec::new(),
        };
        self.publish(&events);
        events
    }

    /// Key transition by bound key name; unbound keys are ignored.
    pub fn key_by_name(&mut self, key: &str, pressed: bool, t: Millis) -> Vec<JudgementEvent> {
        let Some(lane) = self.config.lane_for_key(key) else {
            log::debug!("unbound key {key:?}");
            return Vec::new();
        };
        self.handle(KeyEvent { lane, pressed, time_ms: t })
    }

    pub fn handle(&mut self, event: KeyEvent) -> Vec<JudgementEvent> {
        if event.pressed {
            self.key_down(event.lane, event.time_ms)
        } else {
            self.key_up(event.lane, event.time_ms)
        }
    }

    /// Feeds every queued key event, oldest first.
    pub fn drain_input(&mut self, queue: &InputQueue) -> Vec<JudgementEvent> {
        let mut events = Vec::new();
        for key in queue.drain() {
            events.extend(self.handle(key));
        }
        events
    }

    /// Per-frame expiry sweep.
    pub fn tick(&mut self, now: Millis) -> Vec<JudgementEvent> {
        if self.state != PlayState::Playing {
            return Vec::new();
        }
        let events = match &mut self.judge {
            Some(judge) => judge.tick(now),
            None => Vec::new(),
        };
        self.publish(&events);
        events
    }

    pub fn position_mapper(&self) -> PositionMapper {
        PositionMapper::from_config(&self.config)
    }

    /// Pixel offset of a note from the judgement line under the current settings.
    pub fn note_offset(&self, note_time: Millis, current_time: Millis) -> Option<f64> {
        let beatmap = self.beatmap.as_ref()?;
        Some(self.position_mapper().note_offset(beatmap, note_time, current_time))
    }

    fn accepting(&self, lane: Lane) -> bool {
        if self.state != PlayState::Playing {
            log::debug!("key event on lane {lane} while {:?}, ignored", self.state);
            return false;
        }
        if lane >= LANE_COUNT {
            log::debug!("key event on unknown lane {lane}");
            return false;
        }
        true
    }

    fn publish(&mut self, events: &[JudgementEvent]) {
        for event in events {
            self.stats.apply_event(event);
            self.subscribers.retain(|tx| tx.send(*event).is_ok());
        }
    }
}
