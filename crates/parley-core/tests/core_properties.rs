//! Property-based tests for the core state machines.

use std::{ops::Add, time::Duration};

use parley_core::{Identity, MessageLog, Session, SessionState, TYPING_STOP_DELAY, TypingPresence};
use parley_proto::{HistoryEntry, OutboundEvent};
use proptest::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct Ms(u64);

impl Add<Duration> for Ms {
    type Output = Ms;

    fn add(self, rhs: Duration) -> Ms {
        Ms(self.0 + u64::try_from(rhs.as_millis()).unwrap())
    }
}

fn history() -> impl Strategy<Value = Vec<HistoryEntry>> {
    prop::collection::vec(
        ("(alice|bob|carol)", "[a-z ]{0,12}").prop_map(|(u, m)| HistoryEntry::new(u, m)),
        0..16,
    )
}

#[derive(Debug, Clone)]
enum Intent {
    Login(String),
    JoinRoom(String),
    PrivateChat(String),
    Logout,
}

fn intent() -> impl Strategy<Value = Intent> {
    prop_oneof![
        "(alice|bob)".prop_map(Intent::Login),
        "(general|random)".prop_map(Intent::JoinRoom),
        "(carol|dave)".prop_map(Intent::PrivateChat),
        Just(Intent::Logout),
    ]
}

proptest! {
    #[test]
    fn prop_hydrate_then_append_keeps_prefix(
        entries in history(),
        live in prop::collection::vec("[a-z: ]{0,12}", 0..16),
    ) {
        let me = Identity::new("alice").unwrap();
        let mut log = MessageLog::new();
        log.hydrate(entries.clone(), Some(&me));
        let hydrated = log.entries().to_vec();

        for text in &live {
            log.append(text.clone());
        }

        prop_assert_eq!(log.len(), entries.len() + live.len());
        prop_assert_eq!(&log.entries()[..entries.len()], hydrated.as_slice());
        for (message, text) in log.entries()[entries.len()..].iter().zip(&live) {
            prop_assert_eq!(message.display_text(), text.as_str());
        }
    }

    #[test]
    fn prop_own_history_prefixed_with_you(entries in history()) {
        let me = Identity::new("alice").unwrap();
        let mut log = MessageLog::new();
        log.hydrate(entries.clone(), Some(&me));

        for (line, entry) in log.display_lines().iter().zip(&entries) {
            let expected = if entry.user == "alice" {
                format!("You: {}", entry.message)
            } else {
                format!("{}: {}", entry.user, entry.message)
            };
            prop_assert_eq!(line, &expected);
        }
    }

    #[test]
    fn prop_session_state_is_consistent(intents in prop::collection::vec(intent(), 0..32)) {
        let mut session = Session::new();

        for intent in intents {
            let _ = match intent {
                Intent::Login(name) => session.login(Identity::new(&name).unwrap()).map(|()| ()),
                Intent::JoinRoom(room) => session.join_room(room).map(|_| ()),
                Intent::PrivateChat(who) => session.start_private_chat(who).map(|_| ()),
                Intent::Logout => session.logout().map(|_| ()),
            };

            match session.state() {
                SessionState::LoggedOut => {
                    prop_assert!(session.identity().is_none());
                    prop_assert!(session.conversation().is_none());
                },
                SessionState::LoggedIn => {
                    prop_assert!(session.identity().is_some());
                    prop_assert!(session.room().is_none());
                },
                SessionState::RoomJoined => {
                    prop_assert!(session.identity().is_some());
                    prop_assert!(session.room().is_some());
                    prop_assert!(session.private_target().is_none());
                },
            }
        }
    }

    #[test]
    fn prop_keystroke_burst_yields_one_stop(gaps in prop::collection::vec(0u64..999, 1..20)) {
        let mut presence = TypingPresence::new();
        let mut now = Ms(0);
        let mut stops = 0;

        for gap in gaps {
            now = Ms(now.0 + gap);
            if presence.poll(now).is_some() {
                stops += 1;
            }
            prop_assert_eq!(presence.keystroke(now), OutboundEvent::Typing { is_typing: true });
        }

        let deadline = presence.deadline().unwrap();
        prop_assert_eq!(deadline, now + TYPING_STOP_DELAY);
        prop_assert_eq!(presence.poll(deadline), Some(OutboundEvent::Typing { is_typing: false }));
        prop_assert_eq!(presence.poll(Ms(deadline.0 + 10_000)), None);
        prop_assert_eq!(stops, 0);
    }
}
