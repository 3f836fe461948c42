use fourkey_schema::{Beatmap, Millis, LANE_COUNT};
use serde::{Deserialize, Serialize};

use super::JudgementTier;
use crate::config::JudgementWindows;

/// Lane index, 0..LANE_COUNT.
pub type Lane = usize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct JudgementEvent {
    pub tier: JudgementTier,
    pub lane: Lane,
    /// Index into `Beatmap::hit_objects`.
    pub note_index: usize,
    /// `true` for heads and plain notes, `false` for long-note tails.
    pub is_head: bool,
    /// Signed `input - target` in ms; positive is late.
    pub delta_ms: f64,
    pub time_ms: Millis,
}

/// Per-note progress. Heads and tails are each judged at most once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NoteState {
    #[default]
    Pending,
    /// Long note whose head was hit and is still held down.
    Held,
    /// Long note whose head expired; waits for its tail deadline.
    HeadJudged,
    Done,
}

#[derive(Debug, Clone, Copy)]
struct LaneNote {
    index: usize,
    time: Millis,
    end_time: Millis,
    long: bool,
}

/// Per-lane cursors over the chart plus the long note held in each lane.
///
/// The beatmap is only read at construction; all progress lives here so it
/// can be thrown away and rebuilt on every chart selection.
#[derive(Debug, Clone)]
pub struct JudgeMachine {
    windows: JudgementWindows,
    auto_play: bool,
    lanes: [Vec<LaneNote>; LANE_COUNT],
    cursors: [usize; LANE_COUNT],
    holding: [Option<usize>; LANE_COUNT],
    states: Vec<NoteState>,
}

impl JudgeMachine {
    pub fn new(beatmap: &Beatmap, windows: JudgementWindows, auto_play: bool) -> Self {
        let mut lanes: [Vec<LaneNote>; LANE_COUNT] = Default::default();
        for (index, obj) in beatmap.hit_objects.iter().enumerate() {
            let Some(lane) = lanes.get_mut(usize::from(obj.column)) else {
                log::debug!("object {index} has out-of-range column {}, ignored", obj.column);
                continue;
            };
            lane.push(LaneNote {
                index,
                time: obj.time as f64,
                end_time: obj.end() as f64,
                long: obj.is_long_note,
            });
        }
        for lane in &mut lanes {
            lane.sort_by(|a, b| a.time.total_cmp(&b.time).then(a.index.cmp(&b.index)));
        }

        let mut machine = Self {
            windows,
            auto_play,
            lanes,
            cursors: [0; LANE_COUNT],
            holding: [None; LANE_COUNT],
            states: vec![NoteState::Done; beatmap.hit_objects.len()],
        };
        machine.reset();
        machine
    }

    /// Rewinds every lane and forgets all judgements. Objects outside the
    /// four lanes stay `Done`.
    pub fn reset(&mut self) {
        self.cursors = [0; LANE_COUNT];
        self.holding = [None; LANE_COUNT];
        self.states.fill(NoteState::Done);
        for note in self.lanes.iter().flatten() {
            self.states[note.index] = NoteState::Pending;
        }
    }

    pub fn windows(&self) -> &JudgementWindows {
        &self.windows
    }

    pub fn auto_play(&self) -> bool {
        self.auto_play
    }

    pub fn note_state(&self, note_index: usize) -> Option<NoteState> {
        self.states.get(note_index).copied()
    }

    /// Hit-object index at the lane's cursor, if any note is left.
    pub fn cursor_note(&self, lane: Lane) -> Option<usize> {
        let cursor = *self.cursors.get(lane)?;
        self.lanes[lane].get(cursor).map(|n| n.index)
    }

    pub fn holding(&self, lane: Lane) -> Option<usize> {
        let pos = (*self.holding.get(lane)?)?;
        self.lanes[lane].get(pos).map(|n| n.index)
    }

    /// True once every head and tail has been judged.
    pub fn is_finished(&self) -> bool {
        self.states.iter().all(|s| *s == NoteState::Done)
    }

    pub fn key_down(&mut self, lane: Lane, t: Millis) -> Vec<JudgementEvent> {
        if lane >= LANE_COUNT {
            log::debug!("key down on unknown lane {lane}");
            return Vec::new();
        }
        let mut events = Vec::new();
        self.expire_lane(lane, t, &mut events);

        if self.holding[lane].is_some() {
            log::debug!("lane {lane} already holding a long note, key down ignored");
            return events;
        }
        let cursor = self.cursors[lane];
        let Some(note) = self.lanes[lane].get(cursor).copied() else {
            return events;
        };
        if self.states[note.index] != NoteState::Pending {
            log::debug!("note {} head already judged, key down ignored", note.index);
            return events;
        }
        let Some(tier) = self.windows.classify(note.time - t) else {
            return events;
        };

        events.push(self.event(tier, lane, note.index, true, t - note.time, t));
        if note.long {
            self.states[note.index] = NoteState::Held;
            self.holding[lane] = Some(cursor);
        } else {
            self.states[note.index] = NoteState::Done;
            self.cursors[lane] = cursor + 1;
        }
        events
    }

    pub fn key_up(&mut self, lane: Lane, t: Millis) -> Vec<JudgementEvent> {
        let Some(pos) = self.holding.get_mut(lane).and_then(Option::take) else {
            return Vec::new();
        };
        let note = self.lanes[lane][pos];
        // a release outside every window still ends the hold
        let tier = self
            .windows
            .classify(note.end_time - t)
            .unwrap_or(JudgementTier::Miss);

        self.states[note.index] = NoteState::Done;
        self.cursors[lane] = pos + 1;
        vec![self.event(tier, lane, note.index, false, t - note.end_time, t)]
    }

    /// Expires everything whose deadline has passed in every lane.
    pub fn tick(&mut self, now: Millis) -> Vec<JudgementEvent> {
        let mut events = Vec::new();
        for lane in 0..LANE_COUNT {
            self.expire_lane(lane, now, &mut events);
        }
        events
    }

    fn expire_lane(&mut self, lane: Lane, now: Millis, events: &mut Vec<JudgementEvent>) {
        let deadline = now - self.windows.max_window;

        if let Some(pos) = self.holding[lane] {
            let note = self.lanes[lane][pos];
            if note.end_time >= deadline {
                return;
            }
            events.push(self.forced(lane, note.index, false, now, note.end_time));
            self.states[note.index] = NoteState::Done;
            self.holding[lane] = None;
            self.cursors[lane] = pos + 1;
        }

        while let Some(note) = self.lanes[lane].get(self.cursors[lane]).copied() {
            match self.states[note.index] {
                NoteState::Pending if note.time < deadline => {
                    events.push(self.forced(lane, note.index, true, now, note.time));
                    if note.long {
                        self.states[note.index] = NoteState::HeadJudged;
                    } else {
                        self.states[note.index] = NoteState::Done;
                        self.cursors[lane] += 1;
                    }
                }
                NoteState::HeadJudged if note.end_time < deadline => {
                    events.push(self.forced(lane, note.index, false, now, note.end_time));
                    self.states[note.index] = NoteState::Done;
                    self.cursors[lane] += 1;
                }
                NoteState::Done => {
                    log::debug!("cursor in lane {lane} found judged note {}", note.index);
                    self.cursors[lane] += 1;
                }
                _ => break,
            }
        }
    }

    /// Judgement for a note nobody hit in time.
    fn forced(&self, lane: Lane, note_index: usize, is_head: bool, now: Millis, target: Millis) -> JudgementEvent {
        self.event(JudgementTier::Miss, lane, note_index, is_head, now - target, now)
    }

    fn event(
        &self,
        tier: JudgementTier,
        lane: Lane,
        note_index: usize,
        is_head: bool,
        delta_ms: f64,
        time_ms: Millis,
    ) -> JudgementEvent {
        JudgementEvent {
            tier: if self.auto_play { JudgementTier::Perfect } else { tier },
            lane,
            note_index,
            is_head,
            delta_ms,
            time_ms,
        }
    }
}
