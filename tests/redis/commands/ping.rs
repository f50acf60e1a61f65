use redis_replica::commands::CommandError;

use crate::test_utils::{TestEnv, TestUtils};

#[tokio::test]
async fn test_handle_ping_command() {
    let env = TestEnv::new_master_server();

    env.exec_command_ok(
        TestUtils::ping_command(),
        &TestUtils::client_address(41844),
        &TestUtils::expected_simple_string("PONG"),
    )
    .await;
}

#[tokio::test]
async fn test_handle_ping_command_with_message() {
    let env = TestEnv::new_master_server();

    env.exec_command_ok(
        TestUtils::command(&["ping", "grape"]),
        &TestUtils::client_address(41844),
        &TestUtils::expected_bulk_string("grape"),
    )
    .await;
}

#[tokio::test]
async fn test_handle_ping_command_invalid() {
    let env = TestEnv::new_master_server();

    env.exec_command_err(
        TestUtils::command(&["PING", "grape", "mango"]),
        &TestUtils::client_address(41844),
        CommandError::WrongNumberOfArguments("ping"),
    )
    .await;
}
