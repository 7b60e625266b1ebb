//! Integration tests for App, Bridge and Runtime behavior.
//!
//! # Oracle Pattern
//!
//! Tests end with oracle checks that verify:
//! - App state reflects the session the client holds
//! - Channel operations are queued in the order the server must see them
//! - Stale or foreign traffic leaves the App untouched

use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
    time::Duration,
};

use parley_app::{
    App, AppAction, AppEvent, Bridge, ChannelId, ChannelInbound, ChannelOp, Conversation, Driver,
    KeyInput, Runtime, Screen,
};
use parley_client::Environment;
use parley_proto::OutboundEvent;

#[derive(Clone, Default)]
struct TestEnv {
    now: Arc<Mutex<Duration>>,
}

impl TestEnv {
    fn advance(&self, by: Duration) {
        *self.now.lock().unwrap() += by;
    }
}

impl Environment for TestEnv {
    type Instant = Duration;

    fn now(&self) -> Duration {
        *self.now.lock().unwrap()
    }
}

/// Route App actions through the Bridge and feed resulting events back.
fn process_actions<E: Environment>(app: &mut App, bridge: &mut Bridge<E>, actions: Vec<AppAction>) {
    let mut pending = actions;
    while !pending.is_empty() {
        for action in std::mem::take(&mut pending) {
            if action.is_protocol() {
                for event in bridge.process_app_action(action) {
                    pending.extend(app.handle(event));
                }
            }
        }
    }
}

/// Type a line and press Enter. Returns the channel ops the line produced.
fn type_line<E: Environment>(app: &mut App, bridge: &mut Bridge<E>, line: &str) -> Vec<ChannelOp> {
    for c in line.chars() {
        let actions = app.handle(AppEvent::Key(KeyInput::Char(c)));
        process_actions(app, bridge, actions);
    }
    let actions = app.handle(AppEvent::Key(KeyInput::Enter));
    process_actions(app, bridge, actions);
    bridge.take_outgoing()
}

/// Feed a raw server packet through the Bridge into the App.
fn receive<E: Environment>(app: &mut App, bridge: &mut Bridge<E>, channel: ChannelId, text: &str) {
    for event in bridge.handle_packet(channel, text.to_string()) {
        app.handle(event);
    }
}

fn sent_events(ops: &[ChannelOp]) -> Vec<&OutboundEvent> {
    ops.iter()
        .filter_map(|op| match op {
            ChannelOp::Send { event, .. } => Some(event),
            _ => None,
        })
        .collect()
}

/// Logged in on an open channel, sitting in the lobby.
fn lobby(env: &TestEnv) -> (App, Bridge<TestEnv>, ChannelId) {
    let mut app = App::new("http://localhost:3000".into());
    let mut bridge = Bridge::new(env.clone());

    let ops = type_line(&mut app, &mut bridge, "alice");
    assert!(matches!(ops.first(), Some(ChannelOp::Open { .. })));
    let channel = bridge.client().channel().unwrap();
    for event in bridge.handle_channel_opened(channel) {
        app.handle(event);
    }

    (app, bridge, channel)
}

#[test]
fn login_through_input_line() {
    let env = TestEnv::default();
    let mut app = App::new("http://localhost:3000".into());
    let mut bridge = Bridge::new(env);

    let ops = type_line(&mut app, &mut bridge, "  alice ");

    assert!(matches!(&ops[0], ChannelOp::Open { username, .. } if username == "alice"));
    assert_eq!(sent_events(&ops), vec![&OutboundEvent::Login { username: "alice".into() }]);

    // Oracle
    assert_eq!(app.screen(), Screen::Lobby);
    assert_eq!(app.username(), Some("alice"));
    assert_eq!(app.input(), "");
}

#[test]
fn join_room_loads_history_with_own_entries_marked() {
    let env = TestEnv::default();
    let (mut app, mut bridge, channel) = lobby(&env);

    let ops = type_line(&mut app, &mut bridge, "/join general");
    assert_eq!(sent_events(&ops), vec![&OutboundEvent::JoinRoom { room_name: "general".into() }]);

    receive(
        &mut app,
        &mut bridge,
        channel,
        concat!(
            r#"42["messageHistory",[{"user":"bob","message":"hey"},"#,
            r#"{"user":"alice","message":"hi bob"}]]"#
        ),
    );
    receive(&mut app, &mut bridge, channel, r#"42["chatMessage","bob: welcome back"]"#);

    // Oracle
    assert_eq!(app.screen(), Screen::Chat);
    assert_eq!(app.conversation(), Some(&Conversation::Room("general".into())));
    let lines: Vec<_> = app.messages().iter().map(|m| m.display_text().into_owned()).collect();
    assert_eq!(lines, vec!["bob: hey", "You: hi bob", "bob: welcome back"]);
}

#[test]
fn join_prompt_collects_room_name() {
    let env = TestEnv::default();
    let (mut app, mut bridge, _) = lobby(&env);

    let ops = type_line(&mut app, &mut bridge, "/join");
    assert!(ops.is_empty());
    assert!(app.prompt().is_some());

    let ops = type_line(&mut app, &mut bridge, "random");
    assert_eq!(sent_events(&ops), vec![&OutboundEvent::JoinRoom { room_name: "random".into() }]);
    assert!(app.prompt().is_none());
}

#[test]
fn sending_does_not_echo_locally() {
    let env = TestEnv::default();
    let (mut app, mut bridge, channel) = lobby(&env);
    let _ = type_line(&mut app, &mut bridge, "/join general");

    let ops = type_line(&mut app, &mut bridge, "hello");
    assert!(sent_events(&ops).contains(&&OutboundEvent::ChatMessage { text: "hello".into() }));
    assert!(app.messages().is_empty());

    receive(&mut app, &mut bridge, channel, r#"42["chatMessage","alice: hello"]"#);
    assert_eq!(app.messages().len(), 1);
}

#[test]
fn typing_burst_sends_one_stop_after_quiet_period() {
    let env = TestEnv::default();
    let (mut app, mut bridge, _) = lobby(&env);
    let _ = type_line(&mut app, &mut bridge, "/join general");

    for c in "hey".chars() {
        let actions = app.handle(AppEvent::Key(KeyInput::Char(c)));
        process_actions(&mut app, &mut bridge, actions);
        env.advance(Duration::from_millis(300));
    }
    let ops = bridge.take_outgoing();
    assert_eq!(sent_events(&ops), vec![&OutboundEvent::Typing { is_typing: true }; 3]);

    let _ = bridge.handle_tick(env.now());
    assert!(bridge.take_outgoing().is_empty());

    env.advance(Duration::from_millis(1000));
    let _ = bridge.handle_tick(env.now());
    let ops = bridge.take_outgoing();
    assert_eq!(sent_events(&ops), vec![&OutboundEvent::Typing { is_typing: false }]);

    let _ = bridge.handle_tick(env.now());
    assert!(bridge.take_outgoing().is_empty());
}

#[test]
fn peer_typing_updates_status_line() {
    let env = TestEnv::default();
    let (mut app, mut bridge, channel) = lobby(&env);
    let _ = type_line(&mut app, &mut bridge, "/join general");

    receive(&mut app, &mut bridge, channel, r#"42["typing",{"username":"bob","isTyping":true}]"#);
    assert_eq!(app.typing_status(), "bob is typing...");

    receive(&mut app, &mut bridge, channel, r#"42["typing",{"username":"bob","isTyping":false}]"#);
    assert_eq!(app.typing_status(), "");
}

#[test]
fn login_error_shows_alert_and_returns_to_login() {
    let env = TestEnv::default();
    let (mut app, mut bridge, channel) = lobby(&env);

    receive(&mut app, &mut bridge, channel, r#"42["loginError","Username taken"]"#);

    // Oracle
    assert_eq!(app.alert(), Some("Username taken"));
    assert_eq!(app.screen(), Screen::Login);
    assert!(app.username().is_none());
    assert!(matches!(bridge.take_outgoing().as_slice(), [ChannelOp::Close { .. }]));

    let actions = app.handle(AppEvent::Key(KeyInput::Char('x')));
    assert_eq!(actions, vec![AppAction::Render]);
    assert!(app.alert().is_none());
    assert_eq!(app.input(), "");
}

#[test]
fn logout_emits_logout_then_closes() {
    let env = TestEnv::default();
    let (mut app, mut bridge, channel) = lobby(&env);
    let _ = type_line(&mut app, &mut bridge, "/join general");
    receive(&mut app, &mut bridge, channel, r#"42["chatMessage","bob: hi"]"#);

    let ops = type_line(&mut app, &mut bridge, "/logout");

    assert_eq!(ops, vec![
        ChannelOp::Send { channel, event: OutboundEvent::Logout },
        ChannelOp::Close { channel },
    ]);
    assert_eq!(app.screen(), Screen::Login);
    assert!(app.messages().is_empty());
}

#[test]
fn traffic_on_old_channel_is_ignored_after_relogin() {
    let env = TestEnv::default();
    let (mut app, mut bridge, old) = lobby(&env);
    let _ = type_line(&mut app, &mut bridge, "/logout");
    let _ = type_line(&mut app, &mut bridge, "alice");

    receive(&mut app, &mut bridge, old, r#"42["loginError","late"]"#);
    for event in bridge.handle_channel_closed(old) {
        app.handle(event);
    }

    // Oracle
    assert!(app.alert().is_none());
    assert_eq!(app.username(), Some("alice"));
    assert!(bridge.client().channel().is_some_and(|ch| ch != old));
}

/// Scripted driver: replays queued input, records channel ops.
#[derive(Default)]
struct ScriptDriver {
    env: TestEnv,
    input: VecDeque<AppEvent>,
    inbound: VecDeque<ChannelInbound>,
    opened: Vec<ChannelId>,
    sent: Vec<(ChannelId, OutboundEvent)>,
    closed: Vec<ChannelId>,
    refuse_open: bool,
    renders: usize,
}

#[derive(Debug)]
struct ScriptError;

impl std::fmt::Display for ScriptError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("connection refused")
    }
}

impl std::error::Error for ScriptError {}

impl Driver for ScriptDriver {
    type Error = ScriptError;
    type Instant = Duration;

    async fn poll_event(&mut self) -> Result<Option<AppEvent>, Self::Error> {
        Ok(self.input.pop_front())
    }

    async fn open_channel(
        &mut self,
        channel: ChannelId,
        _username: &str,
    ) -> Result<(), Self::Error> {
        if self.refuse_open {
            return Err(ScriptError);
        }
        self.opened.push(channel);
        Ok(())
    }

    async fn send_event(
        &mut self,
        channel: ChannelId,
        event: OutboundEvent,
    ) -> Result<(), Self::Error> {
        if self.opened.contains(&channel) && !self.closed.contains(&channel) {
            self.sent.push((channel, event));
        }
        Ok(())
    }

    async fn recv(&mut self) -> Option<ChannelInbound> {
        self.inbound.pop_front()
    }

    async fn close_channel(&mut self, channel: ChannelId) {
        self.closed.push(channel);
    }

    fn is_connected(&self) -> bool {
        self.opened.iter().any(|ch| !self.closed.contains(ch))
    }

    fn now(&self) -> Duration {
        self.env.now()
    }

    fn render(&mut self, _app: &App) -> Result<(), Self::Error> {
        self.renders += 1;
        Ok(())
    }

    async fn stop(&mut self) {}
}

#[tokio::test]
async fn runtime_opens_channel_before_sending_login() {
    let env = TestEnv::default();
    let driver = ScriptDriver { env: env.clone(), ..Default::default() };
    let mut runtime = Runtime::new(driver, env, "http://localhost:3000".into());

    runtime.auto_login("alice").await.unwrap();

    let driver = runtime.driver();
    assert_eq!(driver.opened.len(), 1);
    let login = OutboundEvent::Login { username: "alice".into() };
    assert_eq!(driver.sent, vec![(driver.opened[0], login)]);
    assert_eq!(runtime.app().screen(), Screen::Lobby);
    assert!(driver.renders > 0);
}

#[tokio::test]
async fn runtime_reports_refused_channel_and_logs_out() {
    let env = TestEnv::default();
    let driver = ScriptDriver { env: env.clone(), refuse_open: true, ..Default::default() };
    let mut runtime = Runtime::new(driver, env, "http://localhost:3000".into());

    runtime.auto_login("alice").await.unwrap();

    assert!(runtime.driver().sent.is_empty());
    assert_eq!(runtime.app().screen(), Screen::Login);
    assert!(runtime.app().status_message().is_some_and(|s| s.contains("connection refused")));
}

#[tokio::test]
async fn runtime_routes_packets_then_quits_on_esc() {
    let env = TestEnv::default();
    let driver = ScriptDriver { env: env.clone(), ..Default::default() };
    let mut runtime = Runtime::new(driver, env, "http://localhost:3000".into());
    runtime.auto_login("alice").await.unwrap();
    let channel = runtime.bridge().client().channel().unwrap();

    let actions = runtime.app().join_room("general".into());
    assert!(!runtime.process_actions(actions).await.unwrap());

    let text = r#"42["chatMessage","bob: hi"]"#.into();
    runtime.driver_mut().inbound.push_back(ChannelInbound::Packet { channel, text });
    assert!(!runtime.process_cycle().await.unwrap());
    assert_eq!(runtime.app().messages().len(), 1);

    runtime.driver_mut().input.push_back(AppEvent::Key(KeyInput::Esc));
    assert!(runtime.process_cycle().await.unwrap());
}

#[tokio::test]
async fn runtime_server_close_returns_to_login() {
    let env = TestEnv::default();
    let driver = ScriptDriver { env: env.clone(), ..Default::default() };
    let mut runtime = Runtime::new(driver, env, "http://localhost:3000".into());
    runtime.auto_login("alice").await.unwrap();
    let channel = runtime.bridge().client().channel().unwrap();

    runtime.driver_mut().inbound.push_back(ChannelInbound::Closed { channel });
    assert!(!runtime.process_cycle().await.unwrap());

    assert_eq!(runtime.app().screen(), Screen::Login);
    assert!(runtime.driver().closed.contains(&channel));
    assert!(runtime.bridge().client().channel().is_none());
}
