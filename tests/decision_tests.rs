// Integration tests for the decision engines: roam selection and dwell,
// hold corrections, and the threshold boundary in both directions.

use aeolus::decision::{DecisionEngine, Directive};
use aeolus::{
    Direction, HoldConfig, HoldPolicy, ProximityState, RoamConfig, RoamPolicy, Snapshot,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rstest::rstest;
use std::time::{Duration, Instant};

fn roam_with_seed(seed: u64) -> RoamPolicy<StdRng> {
    RoamPolicy::new(RoamConfig::default(), StdRng::seed_from_u64(seed))
}

fn ranges(front: f32, back: f32, left: f32, right: f32) -> Snapshot {
    Snapshot::new([front, back, left, right], [false; 4])
}

#[test]
fn single_open_direction_wins_for_any_seed() {
    // Scenario A: front is the only direction above the threshold.
    let snapshot = ranges(200.0, 50.0, 50.0, 50.0);
    for seed in 0..32 {
        let mut policy = roam_with_seed(seed);
        assert_eq!(
            policy.decide(&snapshot, Instant::now()),
            Directive::Move(Direction::Front),
            "seed {}",
            seed
        );
    }
}

#[test]
fn all_blocked_hovers_for_any_seed() {
    // Scenario B: everything inside the threshold, now and after the backoff.
    let snapshot = ranges(50.0, 50.0, 50.0, 50.0);
    for seed in 0..32 {
        let mut policy = roam_with_seed(seed);
        let start = Instant::now();
        assert_eq!(policy.decide(&snapshot, start), Directive::Hover);
        assert!(policy.state().is_stuck());

        let after_backoff = start + policy.backoff();
        assert_eq!(policy.decide(&snapshot, after_backoff), Directive::Hover);
        assert!(policy.state().is_stuck());
    }
    assert_eq!(roam_with_seed(0).backoff(), Duration::from_secs(1));
}

#[rstest]
#[case(150.0)]
#[case(149.9)]
fn at_or_below_threshold_is_blocked_for_roam(#[case] front: f32) {
    let snapshot = ranges(front, 50.0, 50.0, 50.0);
    let mut policy = roam_with_seed(3);
    assert_eq!(policy.decide(&snapshot, Instant::now()), Directive::Hover);
}

#[test]
fn just_above_threshold_is_open_for_roam() {
    let snapshot = ranges(150.1, 50.0, 50.0, 50.0);
    let mut policy = roam_with_seed(3);
    assert_eq!(
        policy.decide(&snapshot, Instant::now()),
        Directive::Move(Direction::Front)
    );
}

#[test]
fn dwell_holds_the_chosen_direction() {
    let snapshot = ranges(400.0, 400.0, 400.0, 400.0);
    for seed in [1, 9, 27] {
        let mut policy = roam_with_seed(seed);
        let start = Instant::now();
        let chosen = match policy.decide(&snapshot, start) {
            Directive::Move(direction) => direction,
            other => panic!("expected a move, got {:?}", other),
        };
        // Repeated decisions inside the dwell window must not flap.
        for secs in 1..=3 {
            let now = start + Duration::from_secs(secs);
            assert_eq!(policy.decide(&snapshot, now), Directive::Move(chosen));
        }
    }
}

#[test]
fn dwell_expiry_reevaluates() {
    let mut policy = roam_with_seed(5);
    let start = Instant::now();
    assert_eq!(
        policy.decide(&ranges(200.0, 50.0, 50.0, 50.0), start),
        Directive::Move(Direction::Front)
    );

    // Past MIN_MOVE_DURATION the old pick is blocked and back has opened up.
    let later = start + Duration::from_secs(5);
    assert_eq!(
        policy.decide(&ranges(50.0, 200.0, 50.0, 50.0), later),
        Directive::Move(Direction::Back)
    );
}

#[test]
fn obstacle_mid_dwell_forces_reselection() {
    let mut policy = roam_with_seed(5);
    let start = Instant::now();
    assert_eq!(
        policy.decide(&ranges(200.0, 50.0, 50.0, 50.0), start),
        Directive::Move(Direction::Front)
    );

    // One second in, front drops inside the threshold: no dwell continuation.
    let now = start + Duration::from_secs(1);
    assert_eq!(
        policy.decide(&ranges(100.0, 200.0, 50.0, 50.0), now),
        Directive::Move(Direction::Back)
    );
    assert_eq!(policy.state().direction(), Some(Direction::Back));
}

#[test]
fn hold_corrections_follow_fixed_order() {
    let mut policy = HoldPolicy::new(HoldConfig::default());
    let snapshot = Snapshot::new([100.0, 400.0, 100.0, 400.0], [true, false, true, false]);

    let directive = policy.decide(&snapshot, Instant::now());
    let corrections = match directive {
        Directive::Correct(corrections) => corrections,
        other => panic!("expected corrections, got {:?}", other),
    };

    assert_eq!(corrections.len(), 2);
    assert_eq!(corrections[0].intruder, Direction::Front);
    assert_eq!(corrections[0].response, Direction::Back);
    assert_eq!(corrections[0].distance_m, 0.1);
    assert_eq!(corrections[1].intruder, Direction::Left);
    assert_eq!(corrections[1].response, Direction::Right);
}

#[test]
fn hold_without_flags_is_a_no_op() {
    let mut policy = HoldPolicy::new(HoldConfig::default());
    let snapshot = ranges(400.0, 400.0, 400.0, 400.0);
    assert_eq!(
        policy.decide(&snapshot, Instant::now()),
        Directive::Correct(Vec::new())
    );
}

#[test]
fn hold_consumes_each_crossing_exactly_once() {
    // Scenario C: front sequence 300 -> 100 -> 300 yields one backward move.
    let state = ProximityState::new(150.0);
    let mut policy = HoldPolicy::new(HoldConfig::default());

    state.update(Direction::Front, 300.0);
    assert_eq!(
        policy.decide(&state.snapshot(), Instant::now()),
        Directive::Correct(Vec::new())
    );

    state.update(Direction::Front, 100.0);
    match policy.decide(&state.snapshot(), Instant::now()) {
        Directive::Correct(corrections) => {
            assert_eq!(corrections.len(), 1);
            assert_eq!(corrections[0].response, Direction::Back);
        }
        other => panic!("expected corrections, got {:?}", other),
    }

    // Consumed flag without a fresh sample: nothing to correct.
    assert_eq!(
        policy.decide(&state.snapshot(), Instant::now()),
        Directive::Correct(Vec::new())
    );

    state.update(Direction::Front, 300.0);
    assert_eq!(
        policy.decide(&state.snapshot(), Instant::now()),
        Directive::Correct(Vec::new())
    );
}

#[test]
fn hold_retriggers_while_still_below_threshold() {
    let state = ProximityState::new(150.0);
    let mut policy = HoldPolicy::new(HoldConfig::default());

    state.update(Direction::Left, 90.0);
    match policy.decide(&state.snapshot(), Instant::now()) {
        Directive::Correct(corrections) => assert_eq!(corrections.len(), 1),
        other => panic!("expected corrections, got {:?}", other),
    }

    // The obstacle is still there on the next sample: correct again.
    state.update(Direction::Left, 90.0);
    match policy.decide(&state.snapshot(), Instant::now()) {
        Directive::Correct(corrections) => {
            assert_eq!(corrections.len(), 1);
            assert_eq!(corrections[0].response, Direction::Right);
        }
        other => panic!("expected corrections, got {:?}", other),
    }
}
