mod common;

use common::beatmap;
use fourkey_core::{JudgeMachine, JudgementTier, JudgementWindows, NoteState, Stats};

fn manual(notes: &[(u8, i64, Option<i64>)]) -> JudgeMachine {
    JudgeMachine::new(&beatmap(notes), JudgementWindows::MANUAL, false)
}

#[test]
fn test_press_near_note_is_perfect() {
    let mut judge = manual(&[(0, 110, None)]);
    let events = judge.key_down(0, 100.0);

    assert_eq!(events.len(), 1);
    assert_eq!(events[0].tier, JudgementTier::Perfect);
    assert_eq!(events[0].note_index, 0);
    assert!(events[0].is_head);
    assert_eq!(events[0].delta_ms, -10.0);

    let stats = Stats::from_events(&events);
    assert_eq!(stats.combo, 1);
    assert_eq!(stats.score, 300);
}

#[test]
fn test_long_note_late_release_misses_tail() {
    let mut judge = manual(&[(1, 0, Some(500))]);

    let head = judge.key_down(1, 5.0);
    assert_eq!(head[0].tier, JudgementTier::Perfect);
    assert_eq!(judge.note_state(0), Some(NoteState::Held));
    assert_eq!(judge.holding(1), Some(0));

    let tail = judge.key_up(1, 800.0);
    assert_eq!(tail.len(), 1);
    assert_eq!(tail[0].tier, JudgementTier::Miss);
    assert!(!tail[0].is_head);
    assert_eq!(judge.holding(1), None);
    assert_eq!(judge.note_state(0), Some(NoteState::Done));

    let stats = Stats::from_events(head.iter().chain(&tail));
    assert_eq!(stats.combo, 0);
    assert_eq!(stats.heads_judged, 1);
    assert_eq!(stats.tails_judged, 1);
}

#[test]
fn test_untouched_note_expires_once() {
    let mut judge = manual(&[(2, 1000, None)]);

    let events = judge.tick(1181.0);
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].tier, JudgementTier::Miss);
    assert_eq!(events[0].lane, 2);
    assert_eq!(judge.cursor_note(2), None);

    assert!(judge.tick(1300.0).is_empty());
    assert!(judge.is_finished());
}

#[test]
fn test_note_does_not_expire_at_its_deadline() {
    let mut judge = manual(&[(0, 1000, None)]);
    // deadline is now - max_window, and expiry is strict
    assert!(judge.tick(1179.0).is_empty());
    assert_eq!(judge.note_state(0), Some(NoteState::Pending));
}

#[test]
fn test_window_boundaries_are_inclusive() {
    let mut judge = manual(&[(0, 1000, None), (1, 1000, None)]);
    assert_eq!(judge.key_down(0, 1022.0)[0].tier, JudgementTier::Perfect);
    assert_eq!(judge.key_down(1, 1022.5)[0].tier, JudgementTier::Great);
}

#[test]
fn test_second_press_on_held_note_is_ignored() {
    let mut judge = manual(&[(0, 1000, Some(2000))]);
    assert_eq!(judge.key_down(0, 1000.0).len(), 1);
    assert!(judge.key_down(0, 1005.0).is_empty());
    assert_eq!(judge.note_state(0), Some(NoteState::Held));
}

#[test]
fn test_second_press_does_not_rejudge_plain_note() {
    let mut judge = manual(&[(0, 1000, None), (0, 3000, None)]);
    assert_eq!(judge.key_down(0, 1000.0).len(), 1);
    assert!(judge.key_down(0, 1001.0).is_empty());
    assert_eq!(judge.cursor_note(0), Some(1));
    assert_eq!(judge.note_state(1), Some(NoteState::Pending));
}

#[test]
fn test_early_press_outside_windows_is_ignored() {
    let mut judge = manual(&[(0, 1000, None)]);
    assert!(judge.key_down(0, 700.0).is_empty());
    assert_eq!(judge.note_state(0), Some(NoteState::Pending));
}

#[test]
fn test_press_inside_miss_window_consumes_note() {
    let mut judge = manual(&[(0, 1000, None)]);
    let events = judge.key_down(0, 850.0);
    assert_eq!(events[0].tier, JudgementTier::Miss);
    assert_eq!(judge.note_state(0), Some(NoteState::Done));
}

#[test]
fn test_stale_notes_are_swept_before_matching() {
    let mut judge = manual(&[(0, 100, None), (0, 1000, None)]);
    let events = judge.key_down(0, 1000.0);
    assert_eq!(events.len(), 2);
    assert_eq!((events[0].note_index, events[0].tier), (0, JudgementTier::Miss));
    assert_eq!((events[1].note_index, events[1].tier), (1, JudgementTier::Perfect));
}

#[test]
fn test_expired_long_note_waits_for_its_tail() {
    let mut judge = manual(&[(3, 1000, Some(3000))]);

    let head = judge.tick(1200.0);
    assert_eq!(head.len(), 1);
    assert!(head[0].is_head);
    assert_eq!(judge.note_state(0), Some(NoteState::HeadJudged));
    assert_eq!(judge.cursor_note(3), Some(0));

    assert!(judge.key_down(3, 1300.0).is_empty());
    assert!(judge.tick(3100.0).is_empty());

    let tail = judge.tick(3180.0);
    assert_eq!(tail.len(), 1);
    assert!(!tail[0].is_head);
    assert_eq!(tail[0].tier, JudgementTier::Miss);
    assert!(judge.is_finished());
}

#[test]
fn test_held_long_note_past_its_tail_is_forced() {
    let mut judge = manual(&[(0, 1000, Some(2000))]);
    judge.key_down(0, 1000.0);

    let events = judge.tick(2180.0);
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].tier, JudgementTier::Miss);
    assert!(!events[0].is_head);
    assert_eq!(judge.holding(0), None);

    assert!(judge.key_up(0, 2200.0).is_empty());
}

#[test]
fn test_release_near_tail_is_judged_by_offset() {
    let mut judge = manual(&[(0, 1000, Some(2000))]);
    judge.key_down(0, 1000.0);
    let tail = judge.key_up(0, 1960.0);
    assert_eq!(tail[0].tier, JudgementTier::Great);
    assert_eq!(tail[0].delta_ms, -40.0);
}

#[test]
fn test_release_without_hold_is_noop() {
    let mut judge = manual(&[(0, 1000, None)]);
    assert!(judge.key_up(0, 1000.0).is_empty());
}

#[test]
fn test_lanes_are_independent() {
    let mut judge = manual(&[(0, 1000, None), (1, 1000, None)]);
    let events = judge.key_down(1, 1000.0);
    assert_eq!(events[0].note_index, 1);
    assert_eq!(judge.note_state(0), Some(NoteState::Pending));
}

#[test]
fn test_auto_play_judges_everything_perfect() {
    let map = beatmap(&[(0, 1000, None), (2, 2000, Some(2500))]);
    let mut judge = JudgeMachine::new(&map, JudgementWindows::AUTO, true);

    let mut events = Vec::new();
    let mut now = 0.0;
    while now < 3000.0 {
        events.extend(judge.tick(now));
        now += 1.0;
    }

    assert_eq!(events.len(), 3);
    assert!(events.iter().all(|e| e.tier == JudgementTier::Perfect));
    assert!(judge.is_finished());
    assert_eq!(Stats::from_events(&events).max_combo, 3);
}

#[test]
fn test_reset_forgets_judgements() {
    let mut judge = manual(&[(0, 1000, None), (1, 1000, Some(1500))]);
    judge.key_down(0, 1000.0);
    judge.key_down(1, 1000.0);
    judge.reset();

    assert_eq!(judge.note_state(0), Some(NoteState::Pending));
    assert_eq!(judge.note_state(1), Some(NoteState::Pending));
    assert_eq!(judge.cursor_note(0), Some(0));
    assert_eq!(judge.holding(1), None);
    assert_eq!(judge.key_down(0, 1000.0).len(), 1);
}

#[test]
fn test_unknown_lanes_and_columns_are_ignored() {
    let mut judge = manual(&[(5, 1000, None), (0, 1000, None)]);
    assert!(judge.key_down(7, 1000.0).is_empty());
    assert!(judge.key_up(7, 1000.0).is_empty());
    assert_eq!(judge.key_down(0, 1000.0)[0].note_index, 1);
}

#[test]
fn test_objects_outside_the_lanes_do_not_block_completion() {
    let mut judge = manual(&[(5, 1000, None), (0, 1000, None)]);
    judge.key_down(0, 1000.0);
    assert_eq!(judge.note_state(0), Some(NoteState::Done));
    assert!(judge.is_finished());
}
