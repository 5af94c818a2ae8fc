// blockfall_engine/tests/session_invariants_prop.rs

/**
 * Property tests for whole sessions driven by generated input sequences.
 *
 * Invariants covered:
 * - Grid dimensions never change.
 * - Score and lines cleared never decrease, except on the tick a session is lost.
 * - Every lock earns at least one point per locked cell.
 * - The speed multiplier always matches the lines cleared, and stays at 1 for the first ten.
 * - The active piece stays within the grid's columns and never overlaps locked cells.
 * - A loss resets the session and raises the high score only when it was beaten.
 */
use std::time::Duration;

use blockfall_engine::{Button, Feedback, Game, GridProfile, SpeedMultiplier, TickInput};
use proptest::prelude::*;

fn arb_input() -> impl Strategy<Value = TickInput> {
    (0u64..700, any::<[bool; 5]>(), any::<[bool; 5]>()).prop_map(|(ms, held, pressed)| TickInput {
        elapsed: Duration::from_millis(ms),
        held,
        pressed,
    })
}

fn arb_profile() -> impl Strategy<Value = GridProfile> {
    (0..GridProfile::VARIANTS.len()).prop_map(|i| GridProfile::VARIANTS[i])
}

fn assert_active_in_bounds(game: &Game) {
    let state = game.state();
    let (ax, _) = state.active.anchor;
    assert!(ax >= 0);
    assert!(ax + state.active.width() as isize <= state.grid.width() as isize);
    for (col, row) in state.active.occupied_cells() {
        assert_ne!(state.grid.cell(col, row), Ok(true), "overlap at {:?}", (col, row));
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn sessions_keep_invariants(
        seed in any::<u64>(),
        profile in arb_profile(),
        inputs in proptest::collection::vec(arb_input(), 1..400),
    ) {
        let mut game = Game::builder().seed(seed).profile(profile).build();
        let size = profile.size();
        let every_n = game.config.speedup_every_n_lineclears;

        for input in &inputs {
            let (score, lines, high_score) = {
                let s = game.state();
                (s.score, s.lines_cleared, s.high_score)
            };
            let report = game.update(input).clone();
            let state = game.state();

            prop_assert_eq!(state.grid.size(), size);
            prop_assert_eq!(state.speed, SpeedMultiplier::from_lineclears(state.lines_cleared, every_n));
            if state.lines_cleared <= 10 {
                prop_assert_eq!(state.speed.get(), 1.0);
            }

            for feedback in &report.feedback {
                if let Feedback::PieceLocked { piece, points } = feedback {
                    prop_assert!(*points as usize >= piece.occupied_count());
                }
            }

            if report.just_lost {
                prop_assert_eq!(state.score, 0);
                prop_assert_eq!(state.lines_cleared, 0);
                prop_assert_eq!(state.grid.occupied_count(), 0);
                let lost_with = report.feedback.iter().find_map(|f| match f {
                    Feedback::GameLost { score, .. } => Some(*score),
                    _ => None,
                });
                prop_assert!(lost_with.is_some());
                let lost_with = lost_with.unwrap_or_default();
                if lost_with > high_score {
                    prop_assert_eq!(report.new_high_score, Some(lost_with));
                    prop_assert_eq!(state.high_score, lost_with);
                } else {
                    prop_assert_eq!(report.new_high_score, None);
                    prop_assert_eq!(state.high_score, high_score);
                }
            } else {
                prop_assert!(state.score >= score);
                prop_assert!(state.lines_cleared >= lines);
                prop_assert_eq!(report.new_high_score, None);
            }

            assert_active_in_bounds(&game);
        }
    }

    #[test]
    fn same_seed_same_session(
        seed in any::<u64>(),
        inputs in proptest::collection::vec(arb_input(), 1..100),
    ) {
        let mut a = Game::builder().seed(seed).build();
        let mut b = Game::builder().seed(seed).build();
        for input in &inputs {
            prop_assert_eq!(a.update(input), b.update(input));
        }
        prop_assert_eq!(a.state(), b.state());
    }
}

#[test]
fn hard_drops_alone_eventually_lose() {
    let mut game = Game::builder().seed(20261016).build();
    let drop = TickInput::idle(Duration::from_millis(16)).press(Button::DropHard);
    let mut lost = false;
    for _ in 0..1000 {
        if game.update(&drop).just_lost {
            lost = true;
            break;
        }
    }
    assert!(lost);
    assert_eq!(game.state().score, 0);
    assert!(game.state().high_score > 0);
}

#[test]
fn idle_session_falls_at_base_rate() {
    let mut game = Game::builder().seed(8).build();
    let start = game.state().active.anchor;
    for _ in 0..3 {
        game.update(&TickInput::idle(Duration::from_millis(501)));
    }
    assert_eq!(game.state().active.anchor, (start.0, start.1 + 3));
}
