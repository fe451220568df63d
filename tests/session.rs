// Integration tests (native) for full game sessions. Audio renders nowhere on
// the host target, so these exercise the silent-engine branch end to end while
// the bookkeeping stays observable.

use pale_lady::audio::{AudioConfig, AudioEngine};
use pale_lady::{ChapelGame, GamePhase, ManorGame};
use rand::SeedableRng;
use rand::rngs::StdRng;

const FRAME_MS: f64 = 16.0;
const VIEW_W: f64 = 4_000.0; // wide viewport keeps the Lady on screen
const VIEW_H: f64 = 800.0;

/// Tick with the cursor parked in a corner, far from everything.
fn idle_tick(g: &mut ManorGame, now: f64) {
    g.tick(now, 0.0, 0.0, 0.0, VIEW_W, VIEW_H);
}

/// Tick with the cursor aimed straight at the Lady's sprite center.
fn aim_tick(g: &mut ManorGame, now: f64) {
    let x = g.lady_x();
    g.tick(now, x, VIEW_H / 2.0, 0.0, VIEW_W, VIEW_H);
}

#[test]
fn sanity_stays_in_bounds_through_a_whole_run() {
    let mut g = ManorGame::with_seed(1);
    let mut now = 0.0;
    for i in 0..4_000 {
        now += FRAME_MS;
        // Alternate staring her down and hiding, with flashlight flips.
        if i % 500 == 0 {
            g.toggle_flashlight();
        }
        if g.lady_visible() {
            aim_tick(&mut g, now);
        } else {
            idle_tick(&mut g, now);
        }
        let s = g.sanity();
        assert!((0.0..=100.0).contains(&s), "sanity {s} out of bounds");
        if g.phase() == GamePhase::GameOver {
            break;
        }
    }
}

#[test]
fn staring_at_the_lady_breaks_the_mind_exactly_once() {
    let mut g = ManorGame::with_seed(7);
    let mut now = 0.0;
    while g.phase() == GamePhase::Playing {
        now += FRAME_MS;
        if g.lady_visible() {
            aim_tick(&mut g, now);
        } else {
            idle_tick(&mut g, now);
        }
        assert!(now < 120_000.0, "never drained to zero");
    }
    assert_eq!(g.phase(), GamePhase::GameOver);
    assert_eq!(g.sanity(), 0.0);
    assert_eq!(g.death_cause().as_deref(), Some("Your mind has broken."));
    assert_eq!(g.heartbeat_bpm(), 0.0);
    assert!(!g.lady_visible());

    // Further ticks are no-ops: terminal state is idempotent.
    for _ in 0..100 {
        now += FRAME_MS;
        idle_tick(&mut g, now);
    }
    assert_eq!(g.phase(), GamePhase::GameOver);
    assert_eq!(g.death_cause().as_deref(), Some("Your mind has broken."));
}

#[test]
fn doll_hunt_opens_the_quiz_and_levels_advance() {
    let mut g = ManorGame::with_seed(3);
    idle_tick(&mut g, FRAME_MS);

    // Level 1 needs 2 + 1 dolls.
    assert_eq!(g.level(), 1);
    assert_eq!(g.dolls_needed(), 3);
    assert_eq!(g.doll_positions().len(), 3);

    for _ in 0..3 {
        assert!(g.try_collect(0));
    }
    assert_eq!(g.dolls_found(), 3);
    assert_eq!(g.phase(), GamePhase::Quiz);
    // Riddle index (1-1) % 4 = 0.
    assert_eq!(g.riddle(), "I have keys but open no locks.");

    // Collecting mid-quiz does nothing.
    assert!(!g.try_collect(0));

    assert!(g.submit_answer("  Piano "));
    assert_eq!(g.level(), 2);
    assert_eq!(g.phase(), GamePhase::Playing);
    assert_eq!(g.dolls_needed(), 4);
    assert_eq!(g.doll_positions().len(), 4);
}

#[test]
fn nothing_is_found_in_the_dark() {
    let mut g = ManorGame::with_seed(3);
    idle_tick(&mut g, FRAME_MS);
    g.toggle_flashlight();
    assert!(!g.try_collect(0));
    assert_eq!(g.dolls_found(), 0);
}

#[test]
fn wrong_answers_drain_sanity_to_terminal_zero() {
    let mut g = ManorGame::with_seed(11);
    idle_tick(&mut g, FRAME_MS);
    for _ in 0..3 {
        g.try_collect(0);
    }
    assert_eq!(g.phase(), GamePhase::Quiz);

    // 100 → 80 → ... → 0; the fifth wrong answer ends the run.
    for i in 1..=5 {
        assert!(!g.submit_answer("wrong"));
        assert!((g.sanity() - (100.0 - 20.0 * i as f64)).abs() < 1e-9);
    }
    assert_eq!(g.phase(), GamePhase::GameOver);
    assert_eq!(g.death_cause().as_deref(), Some("Your mind has broken."));
    // Answers after the end fall on deaf ears.
    assert!(!g.submit_answer("piano"));
}

fn collect_all_chapel_dolls(g: &mut ChapelGame, now: &mut f64) {
    while g.phase() == GamePhase::Playing {
        let dolls = g.doll_positions();
        if dolls.is_empty() {
            break;
        }
        *now += FRAME_MS;
        // Stand on the first doll and grab it.
        g.tick(*now, dolls[0], dolls[1]);
        assert!(g.try_collect(0));
    }
}

#[test]
fn chapel_wrong_answers_make_her_permanently_faster() {
    let mut g = ChapelGame::with_seed(2);
    let mut now = 0.0;
    collect_all_chapel_dolls(&mut g, &mut now);
    assert_eq!(g.phase(), GamePhase::Quiz);

    assert!(!g.submit_answer("nope"));
    assert!(!g.submit_answer("still nope"));
    assert!(g.submit_answer("piano"));
    assert_eq!(g.level(), 2);

    // Wait for her next manifestation and check the walk speed:
    // base 6.0 + 0.8 × level 2 + two 3.0 penalties.
    while !g.lady_visible() {
        now += FRAME_MS;
        g.tick(now, 39.0, 39.0);
        assert!(now < 60_000.0, "she never came back");
    }
    assert!((g.lady_speed() - 13.6).abs() < 1e-9);
}

#[test]
fn contact_ends_the_chapel_run_exactly_once() {
    let mut g = ChapelGame::with_seed(9);
    let mut now = 0.0;
    // Stand still in the middle until she walks into us.
    while g.phase() == GamePhase::Playing {
        now += FRAME_MS;
        g.tick(now, 0.0, 0.0);
        assert!(now < 60_000.0, "she never caught a frozen player");
    }
    assert_eq!(g.phase(), GamePhase::GameOver);
    assert_eq!(g.death_cause().as_deref(), Some("She caught you."));
    assert_eq!(g.heartbeat_bpm(), 0.0);

    for _ in 0..100 {
        now += FRAME_MS;
        g.tick(now, 0.0, 0.0);
    }
    assert_eq!(g.phase(), GamePhase::GameOver);
    assert_eq!(g.death_cause().as_deref(), Some("She caught you."));
}

#[test]
fn stop_all_clears_audio_bookkeeping() {
    let mut rng = StdRng::seed_from_u64(4);
    let mut engine = AudioEngine::new(AudioConfig::default());
    engine.play_ambience(0.0, &mut rng);
    assert!(engine.melody_pending());

    // Let the melodic loop fire and reschedule a few times.
    let mut now = 0.0;
    while now < 12_000.0 {
        now += FRAME_MS;
        engine.tick(now, &mut rng);
    }
    assert!(engine.melody_pending());

    engine.stop_all();
    assert!(!engine.melody_pending());
    assert_eq!(engine.sustained_voices(), 0);

    // Idempotent, and nothing re-arms on its own.
    engine.stop_all();
    for _ in 0..100 {
        now += FRAME_MS;
        engine.tick(now, &mut rng);
    }
    assert!(!engine.melody_pending());
}
