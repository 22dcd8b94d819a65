//! Property-based tests for the wire codec, roster invariants, and the
//! session state machine's tolerance of arbitrary inbound data.

use proptest::prelude::*;

use parlor_core::channel::{Command, Event};
use parlor_core::config::SessionConfig;
use parlor_core::roster::Roster;
use parlor_core::session::{ChatSession, SessionPhase};
use parlor_core::types::{ConnectionProfile, Gender, Identity, UserId};
use parlor_core::wire::{self, OutboundMessage};

fn arb_user_id() -> impl Strategy<Value = UserId> {
    (1u32..10_000).prop_map(UserId)
}

fn arb_name() -> impl Strategy<Value = String> {
    prop::string::string_regex(r"[A-Za-z][A-Za-z0-9 _-]{0,30}").unwrap()
}

fn arb_color() -> impl Strategy<Value = String> {
    prop::string::string_regex(r"#[0-9a-f]{6}").unwrap()
}

fn arb_identity() -> impl Strategy<Value = Identity> {
    (arb_user_id(), arb_name(), any::<u8>(), arb_color()).prop_map(
        |(user_id, user_name, gender, user_color)| Identity {
            user_id,
            user_name,
            gender: Gender::from(gender),
            user_color,
        },
    )
}

#[derive(Debug, Clone)]
enum RosterOp {
    Add(Identity),
    Remove(UserId),
}

fn arb_roster_op() -> impl Strategy<Value = RosterOp> {
    prop_oneof![
        arb_identity().prop_map(RosterOp::Add),
        arb_user_id().prop_map(RosterOp::Remove),
    ]
}

/// Drive a session to `Online` as user 1.
fn online_session() -> ChatSession {
    let mut session = ChatSession::new(SessionConfig::default());
    session.handle_command(Command::Connect {
        profile: ConnectionProfile::default(),
    });
    session.handle_event(Event::Opened);
    session.handle_event(Event::FrameReceived {
        text: r##"{"action":"Authorized","userId":1,"userName":"Self","gender":0,"userColor":"#34495e","users":[]}"##
            .to_string(),
    });
    assert_eq!(session.phase(), SessionPhase::Online);
    session
}

proptest! {
    /// Decoding never panics, whatever bytes arrive in a text frame.
    #[test]
    fn decode_never_panics(frame in "\\PC{0,256}") {
        let _ = wire::decode(&frame);
    }

    /// Every encoded outbound chat message parses back to itself, for any
    /// target and any text content.
    #[test]
    fn outbound_chat_survives_its_own_encoding(
        to_user_id in prop_oneof![Just(UserId::BROADCAST), arb_user_id()],
        text in "\\PC{0,200}",
    ) {
        let message = OutboundMessage::Chat { to_user_id, text };
        let decoded: OutboundMessage =
            serde_json::from_str(&wire::encode(&message)).expect("own encoding parses");
        prop_assert_eq!(decoded, message);
    }

    /// After any sequence of adds and removes, roster ids stay unique, the
    /// session's own id never appears, and order follows first arrival.
    #[test]
    fn roster_invariants_hold_under_churn(
        self_id in arb_user_id(),
        ops in prop::collection::vec(arb_roster_op(), 0..40),
    ) {
        let mut roster = Roster::new();
        let mut first_arrival: Vec<UserId> = Vec::new();

        for op in ops {
            match op {
                RosterOp::Add(entry) => {
                    let id = entry.user_id;
                    roster.add(entry, self_id);
                    if id != self_id && !first_arrival.contains(&id) {
                        first_arrival.push(id);
                    }
                }
                RosterOp::Remove(id) => {
                    roster.remove(id);
                    first_arrival.retain(|&existing| existing != id);
                }
            }
        }

        let ids: Vec<UserId> = roster.iter().map(|e| e.user_id).collect();
        prop_assert_eq!(ids.clone(), first_arrival);
        prop_assert!(!ids.contains(&self_id));
        let mut unique = ids.clone();
        unique.sort();
        unique.dedup();
        prop_assert_eq!(unique.len(), ids.len());
    }

    /// An online session never leaves `Online` because of frame content:
    /// only transport drops and commands change the phase.
    #[test]
    fn frames_never_change_an_online_phase(frames in prop::collection::vec("\\PC{0,128}", 0..20)) {
        let mut session = online_session();
        for text in frames {
            session.handle_event(Event::FrameReceived { text });
            prop_assert_eq!(session.phase(), SessionPhase::Online);
        }
    }

    /// Sending whitespace-only text never produces an outbound frame.
    #[test]
    fn blank_text_is_never_sent(text in "[ \\t\\r\\n]{0,32}") {
        let mut session = online_session();
        let (effects, _) = session.handle_command(Command::SendText { text });
        prop_assert!(effects.is_empty());
    }
}
