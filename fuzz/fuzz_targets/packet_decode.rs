//! Fuzz target for EnginePacket::decode
//!
//! Feeds arbitrary text to the packet decoder and the event decoders. Invalid
//! input must come back as an error, never a panic. Anything that decodes to
//! an event must encode again.

#![no_main]

use libfuzzer_sys::fuzz_target;
use parley_proto::{EnginePacket, InboundEvent, OutboundEvent};

fuzz_target!(|text: &str| {
    let Ok(packet) = EnginePacket::decode(text) else {
        return;
    };

    if let Ok(Some(event)) = InboundEvent::from_packet(packet.clone()) {
        assert!(event.into_packet().encode().is_ok());
    }
    if let Ok(Some(event)) = OutboundEvent::from_packet(packet) {
        assert!(event.into_packet().encode().is_ok());
    }
});
