//! Fuzz target for the client's inbound path
//!
//! Logs in, joins a room, then feeds an arbitrary sequence of server packets,
//! user intents and clock ticks. The client may reject input with an error
//! but must never panic, and a channel must exist exactly while an identity
//! does.

#![no_main]

use std::time::Duration;

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use parley_client::{Client, ClientEvent, Environment};
use parley_harness::SimEnv;

#[derive(Debug, Arbitrary)]
enum Input {
    Packet(String),
    Login(String),
    Join(String),
    Private(String),
    Send(String),
    Keystroke,
    Logout,
    Advance(u16),
    Drop,
}

fuzz_target!(|inputs: Vec<Input>| {
    let env = SimEnv::new();
    let mut client = Client::new(env.clone());

    for input in inputs {
        let event = match input {
            Input::Packet(text) => match client.channel() {
                Some(channel) => ClientEvent::PacketReceived { channel, text },
                None => continue,
            },
            Input::Login(username) => ClientEvent::Login { username },
            Input::Join(room_name) => ClientEvent::JoinRoom { room_name },
            Input::Private(recipient) => ClientEvent::StartPrivateChat { recipient },
            Input::Send(text) => ClientEvent::SendMessage { text },
            Input::Keystroke => ClientEvent::Keystroke,
            Input::Logout => ClientEvent::Logout,
            Input::Advance(ms) => {
                env.advance(Duration::from_millis(u64::from(ms)));
                ClientEvent::Tick { now: env.now() }
            },
            Input::Drop => match client.channel() {
                Some(channel) => ClientEvent::ChannelClosed { channel },
                None => continue,
            },
        };

        let _ = client.handle(event);
        assert_eq!(client.session().identity().is_some(), client.channel().is_some());
    }
});
