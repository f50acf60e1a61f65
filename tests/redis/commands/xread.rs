use std::time::Duration;

use redis_replica::{
    commands::{CommandError, CommandResult},
    resp::RespValue,
};
use tokio::time::timeout;

use crate::test_utils::{TestEnv, TestUtils};

fn stream_reply(key: &str, entries: Vec<RespValue>) -> RespValue {
    RespValue::Array(vec![
        TestUtils::expected_bulk_string(key),
        RespValue::Array(entries),
    ])
}

async fn add(env: &TestEnv, key: &str, stream_id: &str) {
    env.exec_command_ok(
        TestUtils::xadd_command(key, stream_id, &["mango", "apple"]),
        &TestUtils::client_address(41844),
        &TestUtils::expected_bulk_string(stream_id),
    )
    .await;
}

#[tokio::test]
async fn test_handle_xread_command() {
    let env = TestEnv::new_master_server();

    for key in ["fruits", "exotic fruits"] {
        for stream_id in ["1526919030404-0", "1526919030404-1", "1526919030414-0"] {
            add(&env, key, stream_id).await;
        }
    }

    let entry = |stream_id: &str| TestUtils::expected_stream_entry(stream_id, &["mango", "apple"]);

    let test_cases: Vec<(&[&str], &[&str], RespValue)> = vec![
        (
            &["fruits"],
            &["1526919030404-0"],
            RespValue::Array(vec![stream_reply(
                "fruits",
                vec![entry("1526919030404-1"), entry("1526919030414-0")],
            )]),
        ),
        (
            &["fruits"],
            &["1526919030404"],
            RespValue::Array(vec![stream_reply(
                "fruits",
                vec![entry("1526919030404-1"), entry("1526919030414-0")],
            )]),
        ),
        (
            &["fruits", "exotic fruits"],
            &["1526919030404-1", "0-0"],
            RespValue::Array(vec![
                stream_reply("fruits", vec![entry("1526919030414-0")]),
                stream_reply(
                    "exotic fruits",
                    vec![
                        entry("1526919030404-0"),
                        entry("1526919030404-1"),
                        entry("1526919030414-0"),
                    ],
                ),
            ]),
        ),
        (
            &["fruits", "exotic fruits"],
            &["1526919030414-0", "1526919030404-1"],
            RespValue::Array(vec![stream_reply(
                "exotic fruits",
                vec![entry("1526919030414-0")],
            )]),
        ),
        (&["fruits"], &["1526919030414-0"], TestUtils::expected_null()),
        (&["vegetables"], &["0-0"], TestUtils::expected_null()),
    ];

    for (keys, start_stream_ids, expected_response) in test_cases {
        env.exec_command_ok(
            TestUtils::xread_command(keys, start_stream_ids),
            &TestUtils::client_address(41844),
            &expected_response,
        )
        .await;
    }
}

#[tokio::test]
async fn test_handle_xread_command_blocking_wakes_on_xadd() {
    let env = TestEnv::new_master_server();
    add(&env, "fruits", "1-1").await;

    let reader_env = env.clone();
    let reader = tokio::spawn(async move {
        reader_env
            .exec_command(
                TestUtils::xread_blocking_command("1000", &["fruits"], &["$"]),
                &TestUtils::client_address(41845),
            )
            .await
    });

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(env.get_state().await.subscriber_count(b"fruits"), 1);

    add(&env, "fruits", "1-2").await;

    let result = timeout(Duration::from_millis(500), reader)
        .await
        .expect("blocked XREAD was not woken")
        .unwrap();

    assert_eq!(
        result,
        Ok(CommandResult::Response(RespValue::Array(vec![stream_reply(
            "fruits",
            vec![TestUtils::expected_stream_entry("1-2", &["mango", "apple"])],
        )])))
    );
    assert_eq!(env.get_state().await.subscriber_count(b"fruits"), 0);
}

#[tokio::test]
async fn test_handle_xread_command_blocking_forever_on_new_stream() {
    let env = TestEnv::new_master_server();

    let reader_env = env.clone();
    let reader = tokio::spawn(async move {
        reader_env
            .exec_command(
                TestUtils::xread_blocking_command("0", &["fruits"], &["0-0"]),
                &TestUtils::client_address(41845),
            )
            .await
    });

    tokio::time::sleep(Duration::from_millis(150)).await;
    assert!(!reader.is_finished());

    add(&env, "fruits", "5-1").await;

    let result = timeout(Duration::from_millis(500), reader)
        .await
        .expect("blocked XREAD was not woken")
        .unwrap();

    assert_eq!(
        result,
        Ok(CommandResult::Response(RespValue::Array(vec![stream_reply(
            "fruits",
            vec![TestUtils::expected_stream_entry("5-1", &["mango", "apple"])],
        )])))
    );
}

#[tokio::test]
async fn test_handle_xread_command_blocking_times_out() {
    let env = TestEnv::new_master_server();
    add(&env, "fruits", "1-1").await;

    env.exec_command_ok(
        TestUtils::xread_blocking_command("100", &["fruits"], &["1-1"]),
        &TestUtils::client_address(41844),
        &TestUtils::expected_null(),
    )
    .await;

    assert_eq!(env.get_state().await.subscriber_count(b"fruits"), 0);
}

#[tokio::test]
async fn test_handle_xread_command_blocking_returns_existing_entries() {
    let env = TestEnv::new_master_server();
    add(&env, "fruits", "1-1").await;

    env.exec_command_ok(
        TestUtils::xread_blocking_command("0", &["fruits"], &["0-0"]),
        &TestUtils::client_address(41844),
        &RespValue::Array(vec![stream_reply(
            "fruits",
            vec![TestUtils::expected_stream_entry("1-1", &["mango", "apple"])],
        )]),
    )
    .await;
}

#[tokio::test]
async fn test_handle_xread_command_invalid() {
    let env = TestEnv::new_master_server();

    env.exec_command_ok(
        TestUtils::set_command("grape", "mango"),
        &TestUtils::client_address(41844),
        &TestUtils::expected_simple_string("OK"),
    )
    .await;

    let test_cases = vec![
        (
            TestUtils::xread_command(&["grape"], &["0-0"]),
            CommandError::WrongType,
        ),
        (
            TestUtils::xread_command(&["fruits", "vegetables"], &["0-0"]),
            CommandError::UnbalancedStreams("xread"),
        ),
        (
            TestUtils::command(&["XREAD", "fruits", "0-0"]),
            CommandError::SyntaxError,
        ),
    ];

    for (command, expected_error) in test_cases {
        env.exec_command_err(command, &TestUtils::client_address(41844), expected_error)
            .await;
    }
}
