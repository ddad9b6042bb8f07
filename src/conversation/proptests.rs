//! Property-based tests for the conversation state machine
//!
//! Events are run through a small in-memory executor that applies effects to
//! a `Session` and holds at most one reply back until a `Deliver` step.

use super::*;
use crate::gateway::GatewayReply;
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Step {
    Event(Event),
    /// Let the pending gateway call settle
    Deliver,
}

struct Harness {
    state: ConvState,
    session: Session,
    pending: Option<String>,
    requests_issued: usize,
}

impl Harness {
    fn new() -> Self {
        Self {
            state: ConvState::Idle,
            session: Session::new(),
            pending: None,
            requests_issued: 0,
        }
    }

    fn apply(&mut self, event: Event) -> bool {
        let Ok(result) = transition(&self.state, &self.session, event) else {
            return false;
        };
        self.state = result.new_state;
        for effect in result.effects {
            match effect {
                Effect::SetOpen(open) => self.session.open = open,
                Effect::SetInput(text) => self.session.input = text,
                Effect::AppendMessage(msg) => self.session.transcript.push(msg),
                Effect::RequestReply { message, .. } => {
                    assert!(self.pending.is_none(), "second request while one is in flight");
                    self.pending = Some(message);
                    self.requests_issued += 1;
                }
                Effect::NotifyStateChange => {}
            }
        }
        true
    }

    fn deliver(&mut self) {
        if let Some(message) = self.pending.take() {
            let delivered = self.apply(Event::ReplyReady {
                reply: GatewayReply {
                    text: format!("re: {message}"),
                    sources: vec![],
                },
            });
            assert!(delivered);
        }
    }
}

fn arb_text() -> impl Strategy<Value = String> {
    prop_oneof![
        Just(String::new()),
        Just("   ".to_string()),
        "[a-zA-Z ?]{1,30}",
        Just("Where are you located?".to_string()),
    ]
}

fn arb_step() -> impl Strategy<Value = Step> {
    prop_oneof![
        3 => arb_text().prop_map(|text| Step::Event(Event::Send { text })),
        1 => arb_text().prop_map(|text| Step::Event(Event::SetInput { text })),
        1 => Just(Step::Event(Event::Submit)),
        1 => proptest::option::of("[A-Za-z ]{0,12}")
            .prop_map(|topic| Step::Event(Event::Open { topic })),
        1 => Just(Step::Event(Event::Close)),
        1 => Just(Step::Event(Event::Toggle)),
        3 => Just(Step::Deliver),
    ]
}

proptest! {
    #[test]
    fn transcript_grows_by_two_per_completed_send(
        steps in proptest::collection::vec(arb_step(), 0..40)
    ) {
        let mut h = Harness::new();
        for step in steps {
            match step {
                Step::Event(event) => { h.apply(event); }
                Step::Deliver => h.deliver(),
            }
        }
        h.deliver();

        prop_assert_eq!(h.state.clone(), ConvState::Idle);
        prop_assert_eq!(h.session.transcript.len(), 1 + 2 * h.requests_issued);
    }

    #[test]
    fn user_and_model_messages_alternate(
        steps in proptest::collection::vec(arb_step(), 0..40)
    ) {
        let mut h = Harness::new();
        for step in steps {
            match step {
                Step::Event(event) => { h.apply(event); }
                Step::Deliver => h.deliver(),
            }
        }
        h.deliver();

        prop_assert_eq!(h.session.transcript[0].clone(), ChatMessage::greeting());
        for (i, msg) in h.session.transcript.iter().enumerate().skip(1) {
            let expected = if i % 2 == 1 { Role::User } else { Role::Model };
            prop_assert_eq!(msg.role, expected);
        }
    }

    #[test]
    fn sends_while_loading_are_noops(
        first in "[a-z]{1,10}",
        others in proptest::collection::vec(arb_text(), 1..10)
    ) {
        let mut h = Harness::new();
        let accepted = h.apply(Event::Send { text: first });
        prop_assert!(accepted);
        let len = h.session.transcript.len();

        for text in others {
            let accepted = h.apply(Event::Send { text });
            prop_assert!(!accepted);
            prop_assert!(h.state.is_loading());
            prop_assert_eq!(h.session.transcript.len(), len);
        }
        prop_assert_eq!(h.requests_issued, 1);
    }

    #[test]
    fn blank_sends_never_change_anything(text in "[ \t\n]{0,8}", open in any::<bool>()) {
        let mut h = Harness::new();
        h.session.open = open;
        let before = h.session.clone();

        let accepted = h.apply(Event::Send { text });
        prop_assert!(!accepted);
        prop_assert_eq!(&h.session, &before);
        prop_assert!(!h.state.is_loading());
    }

    #[test]
    fn topic_opens_keep_the_draft(
        steps in proptest::collection::vec(arb_step(), 0..20),
        draft in "[a-z ]{0,20}",
        topic in "[A-Za-z ]{0,12}"
    ) {
        let mut h = Harness::new();
        for step in steps {
            match step {
                Step::Event(event) => { h.apply(event); }
                Step::Deliver => h.deliver(),
            }
        }
        h.apply(Event::SetInput { text: draft.clone() });
        h.apply(Event::Open { topic: Some(topic) });

        prop_assert!(h.session.open);
        prop_assert_eq!(&h.session.input, &draft);
    }
}
