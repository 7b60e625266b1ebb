//! Property-based tests for two runtimes sharing one simulated server.
//!
//! Random user actions, clock jumps and server kicks are applied to a pair of
//! runtimes. The standard invariants are asserted after every runtime cycle
//! and the server's view of who is online must agree with the clients once
//! traffic settles.

use std::time::Duration;

use parley_app::{AppEvent, KeyInput, Runtime, Screen};
use parley_harness::{InvariantRegistry, SharedSimServer, SimDriver, SimEnv, create_shared_server};
use proptest::prelude::*;

type SimRuntime = Runtime<SimDriver, SimEnv>;

#[derive(Debug, Clone)]
enum Step {
    Line { user: usize, text: &'static str },
    Press { user: usize, c: char },
    Advance(u64),
    Kick(usize),
}

fn step_strategy() -> impl Strategy<Value = Step> {
    let user = 0..2usize;
    prop_oneof![
        6 => (user.clone(), prop::sample::select(vec![
            "alice",
            "bob",
            "/join general",
            "/join random",
            "/dm alice",
            "/dm bob",
            "/join",
            "general",
            "hello",
            "how are you",
            "/logout",
            "/dance",
        ]))
        .prop_map(|(user, text)| Step::Line { user, text }),
        3 => (user.clone(), prop::sample::select(vec!['a', 'x', ' ']))
            .prop_map(|(user, c)| Step::Press { user, c }),
        2 => prop::sample::select(vec![200u64, 999, 1_000, 2_500]).prop_map(Step::Advance),
        1 => user.prop_map(Step::Kick),
    ]
}

fn runtime(server: &SharedSimServer, env: &SimEnv) -> SimRuntime {
    let driver = SimDriver::new(server.clone(), env.clone())
        .with_invariants(InvariantRegistry::standard());
    Runtime::new(driver, env.clone(), "sim://local".into())
}

async fn settle(runtimes: &mut [SimRuntime]) -> Result<(), TestCaseError> {
    for _ in 0..1_000 {
        let mut idle = true;
        for rt in runtimes.iter_mut() {
            if rt.driver().has_pending() {
                idle = false;
                let quit =
                    rt.process_cycle().await.map_err(|e| TestCaseError::fail(e.to_string()))?;
                prop_assert!(!quit, "runtime quit unexpectedly");
                rt.driver().check_invariants(rt.bridge(), rt.app(), "after cycle");
            }
        }
        if idle {
            return Ok(());
        }
    }
    Err(TestCaseError::fail("simulation did not settle"))
}

fn apply(runtimes: &[SimRuntime], server: &SharedSimServer, env: &SimEnv, step: Step) {
    match step {
        Step::Line { user, text } => {
            let driver = runtimes[user].driver();
            for c in text.chars() {
                driver.inject_event(AppEvent::Key(KeyInput::Char(c)));
            }
            driver.inject_event(AppEvent::Key(KeyInput::Enter));
        },
        Step::Press { user, c } => {
            runtimes[user].driver().inject_event(AppEvent::Key(KeyInput::Char(c)));
        },
        Step::Advance(ms) => {
            env.advance(Duration::from_millis(ms));
            for rt in runtimes.iter() {
                rt.driver().inject_tick();
            }
        },
        Step::Kick(user) => {
            let rt = &runtimes[user];
            let conn = rt.bridge().client().channel().and_then(|ch| rt.driver().connection(ch));
            if let Some(conn) = conn {
                server.lock().unwrap().kick(conn);
            }
        },
    }
}

fn check_server_agrees(
    runtimes: &[SimRuntime],
    server: &SharedSimServer,
) -> Result<(), TestCaseError> {
    let server = server.lock().unwrap();
    let online = server.online_users();
    let mut unique = online.clone();
    unique.sort();
    unique.dedup();
    prop_assert_eq!(unique.len(), online.len(), "duplicate usernames online: {:?}", online);

    for rt in runtimes {
        if let Some(name) = rt.app().username() {
            prop_assert!(online.contains(&name), "{} missing from {:?}", name, online);
            prop_assert_ne!(rt.app().screen(), Screen::Login);
        }
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_runtimes_agree_with_server(steps in prop::collection::vec(step_strategy(), 0..40)) {
        let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
        rt.block_on(async {
            let server = create_shared_server();
            let env = SimEnv::new();
            let mut runtimes = [runtime(&server, &env), runtime(&server, &env)];

            for step in steps {
                apply(&runtimes, &server, &env, step);
                settle(&mut runtimes).await?;
                check_server_agrees(&runtimes, &server)?;
            }
            Ok::<(), TestCaseError>(())
        })?;
    }
}
