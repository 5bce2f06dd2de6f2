//! Property-based tests for the view state machine
//!
//! These tests drive random event sequences through `transition` and check
//! the invariants hold after every step.

use super::transition::*;
use super::*;
use crate::catalog::topics;
use crate::imaging::ImageFile;
use crate::llm::GeneratedImage;
use crate::normalize::{Reply, Source};
use proptest::prelude::*;

// ============================================================================
// Arbitrary Generators
// ============================================================================

fn arb_topic_key() -> impl Strategy<Value = String> {
    let keys: Vec<String> = topics().iter().map(|t| t.key.to_string()).collect();
    prop_oneof![
        4 => proptest::sample::select(keys),
        1 => "[a-z]{3,8}",
    ]
}

fn arb_text() -> impl Strategy<Value = String> {
    prop_oneof![
        4 => "[a-zA-Z ]{1,30}",
        1 => Just(String::new()),
        1 => Just("   ".to_string()),
    ]
}

fn arb_image_file() -> impl Strategy<Value = Option<ImageFile>> {
    let mime = prop_oneof![
        Just("image/png".to_string()),
        Just("image/jpeg".to_string()),
        Just("image/gif".to_string()),
    ];
    proptest::option::of(
        (mime, 0usize..64).prop_map(|(mime_type, len)| ImageFile {
            mime_type,
            bytes: vec![1; len],
        }),
    )
}

fn arb_failure() -> impl Strategy<Value = FailureKind> {
    prop_oneof![
        Just(FailureKind::Configuration),
        Just(FailureKind::Provider),
        Just(FailureKind::Cancelled),
    ]
}

fn arb_reply() -> impl Strategy<Value = Reply> {
    ("[a-zA-Z ]{0,20}", 0usize..3).prop_map(|(text, n)| Reply {
        text,
        sources: (0..n)
            .map(|i| Source {
                uri: format!("https://example.org/{i}"),
                title: format!("Source {i}"),
            })
            .collect(),
    })
}

fn arb_user_event() -> impl Strategy<Value = Event> {
    prop_oneof![
        Just(Event::GetStarted),
        arb_topic_key().prop_map(|key| Event::SelectTopic { key }),
        Just(Event::ToggleTooltip),
        arb_text().prop_map(|query| Event::Search { query }),
        Just(Event::StartTopic),
        Just(Event::ShowImageGenerator),
        Just(Event::ShowImageIdentifier),
        arb_text().prop_map(|text| Event::SendMessage { text }),
        arb_image_file().prop_map(|file| Event::SelectImage { file }),
        arb_text().prop_map(|prompt| Event::SubmitIdentification { prompt }),
        arb_text().prop_map(|prompt| Event::GenerateImage { prompt }),
        Just(Event::Back),
    ]
}

fn arb_completion() -> impl Strategy<Value = Event> {
    let reply = prop_oneof![
        arb_reply().prop_map(Ok::<Reply, FailureKind>),
        arb_failure().prop_map(Err),
    ];
    let image = prop_oneof![
        Just(Ok(GeneratedImage {
            mime_type: "image/png".to_string(),
            data: "AAAA".to_string(),
        })),
        arb_failure().prop_map(Err::<GeneratedImage, FailureKind>),
    ];
    prop_oneof![
        (0u64..4, reply).prop_map(|(epoch, outcome)| Event::ReplyReady { epoch, outcome }),
        (0u64..4, image).prop_map(|(epoch, outcome)| Event::ImageReady { epoch, outcome }),
    ]
}

fn arb_event() -> impl Strategy<Value = Event> {
    prop_oneof![
        3 => arb_user_event(),
        1 => arb_completion(),
    ]
}

type Step = (ViewState, Event, Result<TransitionResult, TransitionError>);

/// Apply events in order; rejected events leave the state unchanged
fn run(events: Vec<Event>) -> Vec<Step> {
    let mut state = ViewState::new();
    let mut steps = Vec::new();
    for event in events {
        let result = transition(&state, event.clone());
        let before = state.clone();
        if let Ok(ok) = &result {
            state = ok.new_state.clone();
        }
        steps.push((before, event, result));
    }
    steps
}

// ============================================================================
// Invariant Tests
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// Same state and event, same result
    #[test]
    fn prop_transition_is_deterministic(events in proptest::collection::vec(arb_event(), 0..30)) {
        let mut state = ViewState::new();
        for event in events {
            let a = transition(&state, event.clone());
            let b = transition(&state, event);
            match (a, b) {
                (Ok(a), Ok(b)) => {
                    prop_assert_eq!(&a.new_state, &b.new_state);
                    prop_assert_eq!(&a.effects, &b.effects);
                    state = a.new_state;
                }
                (Err(a), Err(b)) => prop_assert_eq!(a, b),
                _ => prop_assert!(false, "transition gave different outcomes"),
            }
        }
    }

    /// Back always lands on an empty welcome screen and ends the session
    #[test]
    fn prop_back_resets(events in proptest::collection::vec(arb_event(), 0..30)) {
        for (before, event, result) in run(events) {
            if matches!(event, Event::Back) {
                let result = result.unwrap();
                prop_assert_eq!(&result.new_state.screen, &Screen::Welcome);
                prop_assert!(result.new_state.transcript.is_empty());
                prop_assert!(!result.new_state.is_busy());
                prop_assert_eq!(result.new_state.epoch, before.epoch + 1);
                prop_assert_eq!(result.effects, vec![Effect::EndSession]);
            }
        }
    }

    /// Within one conversation the transcript only grows
    #[test]
    fn prop_transcript_append_only(events in proptest::collection::vec(arb_event(), 0..40)) {
        for (before, _, result) in run(events) {
            let Ok(result) = result else { continue };
            let after = &result.new_state;
            prop_assert!(after.epoch >= before.epoch);

            let restarted = after.epoch != before.epoch
                || result.effects.contains(&Effect::EndSession);
            if !restarted {
                prop_assert!(after.transcript.len() >= before.transcript.len());
                prop_assert_eq!(&after.transcript[..before.transcript.len()], &before.transcript[..]);
            }
        }
    }

    /// Completions from an earlier conversation are dropped
    #[test]
    fn prop_stale_completion_ignored(
        events in proptest::collection::vec(arb_event(), 0..30),
        completion in arb_completion(),
    ) {
        let steps = run(events);
        let state = steps
            .last()
            .map(|(before, _, result)| match result {
                Ok(r) => r.new_state.clone(),
                Err(_) => before.clone(),
            })
            .unwrap_or_default();

        let epoch = match &completion {
            Event::ReplyReady { epoch, .. } | Event::ImageReady { epoch, .. } => *epoch,
            _ => unreachable!(),
        };
        let result = transition(&state, completion).unwrap();
        if epoch != state.epoch {
            prop_assert_eq!(result.new_state, state);
        }
        prop_assert!(result.effects.is_empty());
    }

    /// A busy view accepts no new work
    #[test]
    fn prop_busy_rejects_new_work(events in proptest::collection::vec(arb_event(), 0..30)) {
        for (before, event, result) in run(events) {
            let starts_work = matches!(
                event,
                Event::SendMessage { .. } | Event::GenerateImage { .. }
            );
            if before.is_busy() && starts_work {
                prop_assert!(result.is_err());
            }
        }
    }

    /// Work-starting effects always carry the current epoch
    #[test]
    fn prop_effects_tagged_with_epoch(events in proptest::collection::vec(arb_event(), 0..30)) {
        for (before, _, result) in run(events) {
            let Ok(result) = result else { continue };
            for effect in &result.effects {
                match effect {
                    Effect::RunTurn { epoch, .. }
                    | Effect::IdentifyImage { epoch, .. }
                    | Effect::GenerateImage { epoch, .. } => {
                        prop_assert_eq!(*epoch, before.epoch);
                        prop_assert!(result.new_state.is_busy());
                    }
                    Effect::EndSession => {}
                }
            }
        }
    }
}
