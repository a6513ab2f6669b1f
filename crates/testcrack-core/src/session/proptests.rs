//! Property-based tests for the session controller
//!
//! Random operation sequences must never break the state invariants.

use super::*;
use crate::assessment::{AssessmentContent, Question};
use proptest::prelude::*;
use std::time::Duration;

#[derive(Debug, Clone)]
enum Op {
    Select(usize, usize),
    Next,
    Previous,
    Wait(u64),
}

fn arb_content() -> impl Strategy<Value = AssessmentContent> {
    prop::collection::vec(2usize..6, 1..7).prop_map(|option_counts| {
        let questions = option_counts
            .iter()
            .enumerate()
            .map(|(i, &n)| Question {
                prompt: format!("question {i}"),
                options: (0..n).map(|o| format!("option {o}")).collect(),
            })
            .collect();
        AssessmentContent::new("passage text", questions)
    })
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0usize..8, 0usize..7).prop_map(|(i, c)| Op::Select(i, c)),
        Just(Op::Next),
        Just(Op::Previous),
        (0u64..5_000).prop_map(Op::Wait),
    ]
}

proptest! {
    #[test]
    fn answers_and_index_stay_consistent(
        content in arb_content(),
        ops in prop::collection::vec(arb_op(), 0..60),
    ) {
        let n = content.questions.len();
        let clock = ManualClock::new();
        let mut ctl = SessionController::with_clock(clock.clone());
        ctl.load_local(content.clone());
        ctl.advance_to_questions().unwrap();

        let mut submissions = 0;
        for op in ops {
            match op {
                Op::Select(i, c) if ctl.phase() == Phase::Submitting => {
                    prop_assert!(ctl.select_answer(i, c).is_err());
                }
                Op::Select(i, c) => {
                    let before = ctl.state().answers.clone();
                    let applied = ctl.select_answer(i, c).unwrap();
                    let in_range = i < n && c < content.questions[i].options.len();
                    prop_assert_eq!(applied.is_some(), in_range);
                    if !in_range {
                        prop_assert_eq!(&ctl.state().answers, &before);
                    }
                }
                Op::Next => {
                    if let Advance::Submit(pending) = ctl.next_question().unwrap() {
                        submissions += 1;
                        prop_assert_eq!(pending.payload.answers.len(), n);
                        prop_assert!(pending.payload.answers[n - 1].is_some());
                    }
                }
                Op::Previous => {
                    if ctl.phase() == Phase::Answering {
                        ctl.previous_question().unwrap();
                    }
                }
                Op::Wait(ms) => clock.advance(Duration::from_millis(ms)),
            }

            prop_assert_eq!(ctl.state().answers.len(), n);
            prop_assert!(ctl.state().current_question_index < n);
            prop_assert!(matches!(ctl.phase(), Phase::Answering | Phase::Submitting));
        }
        prop_assert!(submissions <= 1);
    }

    #[test]
    fn payload_durations_match_captured_gaps(
        reading_ms in 0u64..600_000,
        answering_ms in 0u64..600_000,
        after_ms in 0u64..600_000,
    ) {
        let clock = ManualClock::new();
        let mut ctl = SessionController::with_clock(clock.clone());
        ctl.load_local(AssessmentContent::new(
            "p",
            vec![Question::new("q", &["a", "b"])],
        ));
        clock.advance(Duration::from_millis(reading_ms));
        ctl.advance_to_questions().unwrap();
        ctl.select_answer(0, 1).unwrap();
        clock.advance(Duration::from_millis(answering_ms));
        let Advance::Submit(pending) = ctl.next_question().unwrap() else {
            return Err(TestCaseError::fail("expected submission"));
        };
        clock.advance(Duration::from_millis(after_ms));

        prop_assert_eq!(pending.payload.reading_time_seconds, reading_ms / 1000);
        prop_assert_eq!(pending.payload.question_time_seconds, answering_ms / 1000);
    }
}
