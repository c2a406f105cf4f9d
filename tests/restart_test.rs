//! Restart semantics: a reset is one atomic step that clears every
//! counter, queue, and flag before any new reservation can be observed.

use screw_sort::core::{demo_level, LevelConfig, PartSpec, TraySpec};
use screw_sort::engine::{PuzzleEngine, ScriptedAnimator, TapOutcome};
use screw_sort::types::{
    GamePhase, PlacementTarget, ScrewColor, ScrewId, ScrewState, TrayId, WinCondition,
};

#[test]
fn restart_mid_transition_resets_everything() {
    let mut engine = PuzzleEngine::new(demo_level()).unwrap();
    let mut animator = ScriptedAnimator::new();

    // Park a green screw in the buffer, then land three reds so a
    // carousel transition is running when the reset hits.
    let green = ScrewId(4);
    assert!(matches!(
        engine.tap_screw(green),
        TapOutcome::Accepted(PlacementTarget::Buffer { .. })
    ));
    for red in [ScrewId(0), ScrewId(1), ScrewId(6)] {
        assert!(matches!(engine.tap_screw(red), TapOutcome::Accepted(_)));
    }
    animator.collect(&mut engine);
    for _ in 0..4 {
        animator.complete_next(&mut engine);
    }
    assert!(engine.carousel_busy());
    assert_eq!(engine.state().buffer().len(), 1);
    assert_eq!(engine.state().session().removed_screws, 4);

    engine.reset();

    // Everything back to level-load values, atomically.
    let state = engine.state();
    assert_eq!(state.session().phase, GamePhase::Playing);
    assert_eq!(state.session().removed_screws, 0);
    assert_eq!(state.session().episode, 1);
    assert!(!engine.carousel_busy());
    assert!(engine.transfer_in_flight().is_none());
    assert!(state.buffer().is_empty());
    assert_eq!(state.screws_in_board(), 15);
    for (id, tray) in state.trays() {
        assert_eq!(tray.count, 0);
        assert_eq!(tray.display_order, id.0);
        assert!(!tray.is_animating);
    }
    assert!(engine.take_commands().is_empty());
}

#[test]
fn stale_completions_after_restart_are_harmless() {
    let mut engine = PuzzleEngine::new(demo_level()).unwrap();
    let mut animator = ScriptedAnimator::new();

    for red in [ScrewId(0), ScrewId(1), ScrewId(6)] {
        engine.tap_screw(red);
    }
    animator.collect(&mut engine);
    for _ in 0..3 {
        animator.complete_next(&mut engine);
    }
    assert!(engine.carousel_busy());
    animator.collect(&mut engine);

    engine.reset();

    // The old session's hide completion (and a replayed removal) arrive
    // after the reset: both must leave the fresh session untouched.
    while animator.complete_next(&mut engine).is_some() {}
    engine.animation_done(screw_sort::types::AnimationDone::ScrewRemoved { screw: ScrewId(0) });

    let state = engine.state();
    assert_eq!(state.session().removed_screws, 0);
    assert_eq!(state.screw(ScrewId(0)).unwrap().state, ScrewState::InBoard);
    assert_eq!(state.tray(TrayId(0)).unwrap().display_order, 0);
    assert!(!engine.carousel_busy());

    // The fresh session plays normally.
    assert_eq!(
        engine.tap_screw(ScrewId(0)),
        TapOutcome::Accepted(PlacementTarget::Tray {
            tray: TrayId(0),
            slot: 0,
        })
    );
}

#[test]
fn load_swaps_levels_and_keeps_observers() {
    use ScrewColor::*;
    let mut engine = PuzzleEngine::new(demo_level()).unwrap();
    let log = screw_sort::engine::EventLog::attach(&mut engine);
    let mut animator = ScriptedAnimator::new();

    let tiny = LevelConfig {
        tray_capacity: 1,
        buffer_capacity: 1,
        trays: vec![
            TraySpec::new(Red),
            TraySpec::new(Blue),
            TraySpec::new(Green),
            TraySpec::new(Yellow),
            TraySpec::new(Purple),
        ],
        parts: vec![PartSpec {
            layer: 0,
            screws: vec![Red],
        }],
        win_condition: WinCondition::AllScrewsRemoved,
    };
    engine.load(tiny).unwrap();

    assert_eq!(engine.state().session().total_screws, 1);
    engine.tap_screw(ScrewId(0));
    animator.settle(&mut engine);

    assert_eq!(engine.state().session().phase, GamePhase::Won);
    // The observer attached before the load still sees the new session.
    assert_eq!(log.count(screw_sort::types::Topic::GameWon), 1);
}
