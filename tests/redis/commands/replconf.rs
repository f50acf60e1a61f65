use redis_replica::{
    commands::{CommandError, CommandResult},
    replication::shared_writer,
};

use crate::test_utils::{TestEnv, TestUtils};

#[tokio::test]
async fn test_handle_replconf_handshake_options() {
    let env = TestEnv::new_master_server();

    let test_cases = vec![
        TestUtils::replconf_command("listening-port", "6380"),
        TestUtils::command(&["REPLCONF", "capa", "eof", "capa", "psync2"]),
        TestUtils::replconf_command("something-new", "1"),
    ];

    for command in test_cases {
        env.exec_command_ok(
            command,
            &TestUtils::client_address(41844),
            &TestUtils::expected_simple_string("OK"),
        )
        .await;
    }
}

#[tokio::test]
async fn test_handle_replconf_getack_on_replica() {
    let env = TestEnv::new_replica_server(6380);
    let primary_address = TestUtils::client_address(6379);

    let result = env
        .exec_primary_command(TestUtils::replconf_command("GETACK", "*"), &primary_address)
        .await;
    assert_eq!(
        result,
        Ok(CommandResult::Response(TestUtils::expected_bulk_string_array(&[
            "REPLCONF", "ACK", "0"
        ])))
    );

    env.get_replication().await.offset = 37;

    let result = env
        .exec_primary_command(TestUtils::replconf_command("getack", "*"), &primary_address)
        .await;
    assert_eq!(
        result,
        Ok(CommandResult::Response(TestUtils::expected_bulk_string_array(&[
            "REPLCONF", "ACK", "37"
        ])))
    );
}

#[tokio::test]
async fn test_handle_replconf_ack_records_offset() {
    let env = TestEnv::new_master_server();
    let replica_address = TestUtils::client_address(41900);

    env.get_replication()
        .await
        .add_replica(replica_address.clone(), shared_writer(tokio::io::sink()));

    let result = env
        .exec_command(TestUtils::replconf_command("ACK", "154"), &replica_address)
        .await;

    assert_eq!(result, Ok(CommandResult::NoResponse));
    assert_eq!(
        env.get_replication().await.acknowledged_offset(&replica_address),
        Some(154)
    );
}

#[tokio::test]
async fn test_handle_replconf_ack_from_unknown_client_is_ignored() {
    let env = TestEnv::new_master_server();

    let result = env
        .exec_command(
            TestUtils::replconf_command("ACK", "154"),
            &TestUtils::client_address(41844),
        )
        .await;

    assert_eq!(result, Ok(CommandResult::NoResponse));
    assert_eq!(env.get_replication().await.replica_count(), 0);
}

#[tokio::test]
async fn test_handle_replconf_invalid() {
    let env = TestEnv::new_master_server();

    let test_cases = vec![
        (
            TestUtils::command(&["REPLCONF"]),
            CommandError::WrongNumberOfArguments("replconf"),
        ),
        (
            TestUtils::replconf_command("listening-port", "port"),
            CommandError::InvalidInteger,
        ),
        (
            TestUtils::replconf_command("ACK", "-1"),
            CommandError::InvalidInteger,
        ),
    ];

    for (command, expected_error) in test_cases {
        env.exec_command_err(command, &TestUtils::client_address(41844), expected_error)
            .await;
    }
}
