use criterion::{black_box, criterion_group, criterion_main, Criterion};

use screw_sort::core::{demo_level, find_placement_target, PuzzleState};
use screw_sort::engine::{PuzzleEngine, ScriptedAnimator, TapOutcome};
use screw_sort::types::{GamePhase, ScrewColor, ScrewId, ScrewState};

fn bench_resolve(c: &mut Criterion) {
    let state = PuzzleState::from_level(&demo_level()).unwrap();

    c.bench_function("resolve_placement", |b| {
        b.iter(|| find_placement_target(&state, false, black_box(ScrewColor::Red)))
    });
}

fn bench_tap_cycle(c: &mut Criterion) {
    c.bench_function("tap_and_land_one_screw", |b| {
        b.iter(|| {
            let mut engine = PuzzleEngine::new(demo_level()).unwrap();
            let mut animator = ScriptedAnimator::new();
            engine.tap_screw(black_box(ScrewId(0)));
            animator.settle(&mut engine);
        })
    });
}

fn bench_demo_playthrough(c: &mut Criterion) {
    c.bench_function("demo_level_playthrough", |b| {
        b.iter(|| {
            let mut engine = PuzzleEngine::new(demo_level()).unwrap();
            let mut animator = ScriptedAnimator::new();

            while engine.state().session().phase == GamePhase::Playing {
                let candidates: Vec<ScrewId> = engine
                    .state()
                    .screws()
                    .filter(|(_, s)| s.state == ScrewState::InBoard && !s.is_animating)
                    .map(|(id, _)| id)
                    .collect();
                let tapped = candidates
                    .into_iter()
                    .any(|id| matches!(engine.tap_screw(id), TapOutcome::Accepted(_)));
                if !tapped {
                    break;
                }
                animator.settle(&mut engine);
            }
            black_box(engine.state().session().removed_screws)
        })
    });
}

criterion_group!(
    benches,
    bench_resolve,
    bench_tap_cycle,
    bench_demo_playthrough
);
criterion_main!(benches);
