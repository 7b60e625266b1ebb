//! Property-based tests for the packet codec.
//!
//! Verifies that every event of the contract survives the wire in both
//! directions and that the decoder never panics on arbitrary text.

use parley_proto::{EnginePacket, HistoryEntry, InboundEvent, OutboundEvent, TypingSignal};
use proptest::prelude::*;

fn arbitrary_text() -> impl Strategy<Value = String> {
    // Includes quotes, backslashes, commas and brackets that stress the JSON
    // array encoding.
    "[a-zA-Z0-9 ,\\[\\]\"\\\\:/éß🙂]{0,40}"
}

fn arbitrary_outbound() -> impl Strategy<Value = OutboundEvent> {
    prop_oneof![
        arbitrary_text().prop_map(|username| OutboundEvent::Login { username }),
        arbitrary_text().prop_map(|room_name| OutboundEvent::JoinRoom { room_name }),
        arbitrary_text().prop_map(|recipient| OutboundEvent::PrivateChat { recipient }),
        any::<bool>().prop_map(|is_typing| OutboundEvent::Typing { is_typing }),
        arbitrary_text().prop_map(|text| OutboundEvent::ChatMessage { text }),
        Just(OutboundEvent::Logout),
    ]
}

fn arbitrary_inbound() -> impl Strategy<Value = InboundEvent> {
    prop_oneof![
        arbitrary_text().prop_map(|message| InboundEvent::LoginError { message }),
        prop::collection::vec((arbitrary_text(), arbitrary_text()), 0..8).prop_map(|pairs| {
            InboundEvent::MessageHistory {
                entries: pairs.into_iter().map(|(u, m)| HistoryEntry::new(u, m)).collect(),
            }
        }),
        (arbitrary_text(), any::<bool>()).prop_map(|(username, is_typing)| {
            InboundEvent::Typing(TypingSignal { username, is_typing })
        }),
        arbitrary_text().prop_map(|text| InboundEvent::ChatMessage { text }),
    ]
}

proptest! {
    #[test]
    fn prop_outbound_survives_wire(event in arbitrary_outbound()) {
        let text = event.clone().into_packet().encode().expect("encode");
        let decoded = EnginePacket::decode(&text).expect("decode");
        prop_assert_eq!(OutboundEvent::from_packet(decoded).expect("event"), Some(event));
    }

    #[test]
    fn prop_inbound_survives_wire(event in arbitrary_inbound()) {
        let text = event.clone().into_packet().encode().expect("encode");
        let decoded = EnginePacket::decode(&text).expect("decode");
        prop_assert_eq!(InboundEvent::from_packet(decoded).expect("event"), Some(event));
    }

    #[test]
    fn prop_decode_never_panics(text in ".{0,64}") {
        let _ = EnginePacket::decode(&text);
    }

    #[test]
    fn prop_message_packets_decode_to_events_or_errors(body in ".{0,64}") {
        // Anything behind "42" is either a well-formed event or a clean error.
        let text = format!("42{body}");
        if let Ok(packet) = EnginePacket::decode(&text) {
            prop_assert!(matches!(packet, EnginePacket::Message(_)));
        }
    }
}
