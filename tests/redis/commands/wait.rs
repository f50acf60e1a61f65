use std::time::Duration;

use redis_replica::{
    commands::{CommandError, CommandResult},
    replication::shared_writer,
    resp::RespValue,
};
use tokio::{
    io::{duplex, AsyncReadExt},
    time::{timeout, Instant},
};

use crate::test_utils::{TestEnv, TestUtils};

async fn attach_sink_replica(env: &TestEnv, port: u16) -> String {
    let address = TestUtils::client_address(port);

    env.get_replication()
        .await
        .add_replica(address.clone(), shared_writer(tokio::io::sink()));

    address
}

#[tokio::test]
async fn test_handle_wait_command_without_replicas() {
    let env = TestEnv::new_master_server();

    for (number_of_replicas, timeout_ms) in [(0, 100), (3, 100), (1, 0)] {
        env.exec_command_ok(
            TestUtils::wait_command(number_of_replicas, timeout_ms),
            &TestUtils::client_address(41844),
            &TestUtils::expected_integer(0),
        )
        .await;
    }
}

#[tokio::test]
async fn test_handle_wait_command_before_any_write() {
    let env = TestEnv::new_master_server();
    attach_sink_replica(&env, 41900).await;
    attach_sink_replica(&env, 41901).await;

    env.exec_command_ok(
        TestUtils::wait_command(1, 500),
        &TestUtils::client_address(41844),
        &TestUtils::expected_integer(2),
    )
    .await;
}

#[tokio::test]
async fn test_handle_wait_command_counts_acknowledgements() {
    let env = TestEnv::new_master_server();
    let first = attach_sink_replica(&env, 41900).await;
    attach_sink_replica(&env, 41901).await;

    env.exec_command_ok(
        TestUtils::set_command("grape", "mango"),
        &TestUtils::client_address(41844),
        &TestUtils::expected_simple_string("OK"),
    )
    .await;

    let offset = env.get_replication().await.offset;

    let waiter_env = env.clone();
    let waiter = tokio::spawn(async move {
        waiter_env
            .exec_command(
                TestUtils::wait_command(2, 300),
                &TestUtils::client_address(41844),
            )
            .await
    });

    tokio::time::sleep(Duration::from_millis(50)).await;

    let result = env
        .exec_command(
            TestUtils::replconf_command("ACK", &offset.to_string()),
            &first,
        )
        .await;
    assert_eq!(result, Ok(CommandResult::NoResponse));

    let started = Instant::now();
    let result = timeout(Duration::from_secs(1), waiter).await.unwrap().unwrap();

    assert_eq!(result, Ok(CommandResult::Response(RespValue::Integer(1))));
    assert!(started.elapsed() >= Duration::from_millis(100));
}

#[tokio::test]
async fn test_handle_wait_command_returns_once_enough_replicas_acknowledge() {
    let env = TestEnv::new_master_server();
    let first = attach_sink_replica(&env, 41900).await;
    attach_sink_replica(&env, 41901).await;

    env.exec_command_ok(
        TestUtils::set_command("grape", "mango"),
        &TestUtils::client_address(41844),
        &TestUtils::expected_simple_string("OK"),
    )
    .await;

    let offset = env.get_replication().await.offset;

    let waiter_env = env.clone();
    let waiter = tokio::spawn(async move {
        waiter_env
            .exec_command(TestUtils::wait_command(1, 0), &TestUtils::client_address(41844))
            .await
    });

    tokio::time::sleep(Duration::from_millis(50)).await;

    env.exec_command(
        TestUtils::replconf_command("ACK", &offset.to_string()),
        &first,
    )
    .await
    .unwrap();

    let result = timeout(Duration::from_millis(500), waiter).await.unwrap().unwrap();
    assert_eq!(result, Ok(CommandResult::Response(RespValue::Integer(1))));
}

#[tokio::test]
async fn test_handle_wait_command_sends_getack_after_writes() {
    let env = TestEnv::new_master_server();
    let (replica_side, mut replica_reader) = duplex(1024);

    env.get_replication()
        .await
        .add_replica(TestUtils::client_address(41900), shared_writer(replica_side));

    let set = TestUtils::set_command("grape", "mango");
    let set_bytes = set.encode();

    env.exec_command_ok(
        set,
        &TestUtils::client_address(41844),
        &TestUtils::expected_simple_string("OK"),
    )
    .await;

    env.exec_command_ok(
        TestUtils::wait_command(1, 100),
        &TestUtils::client_address(41844),
        &TestUtils::expected_integer(0),
    )
    .await;

    let getack = TestUtils::command(&["REPLCONF", "GETACK", "*"]).encode();
    let mut received = vec![0; set_bytes.len() + getack.len()];
    replica_reader.read_exact(&mut received).await.unwrap();

    assert_eq!(&received[..set_bytes.len()], &set_bytes[..]);
    assert_eq!(&received[set_bytes.len()..], &getack[..]);
    assert_eq!(env.get_replication().await.offset, set_bytes.len() as u64);
}

#[tokio::test]
async fn test_handle_wait_command_sends_getack_when_already_synced() {
    let env = TestEnv::new_master_server();
    let (replica_side, mut replica_reader) = duplex(1024);

    env.get_replication()
        .await
        .add_replica(TestUtils::client_address(41900), shared_writer(replica_side));

    env.exec_command_ok(
        TestUtils::wait_command(1, 100),
        &TestUtils::client_address(41844),
        &TestUtils::expected_integer(1),
    )
    .await;

    let getack = TestUtils::command(&["REPLCONF", "GETACK", "*"]).encode();
    let mut received = vec![0; getack.len()];
    timeout(Duration::from_secs(1), replica_reader.read_exact(&mut received))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(&received[..], &getack[..]);
    assert_eq!(env.get_replication().await.offset, 0);
}

#[tokio::test]
async fn test_handle_wait_command_on_replica() {
    let env = TestEnv::new_replica_server(6380);

    env.exec_command_err(
        TestUtils::wait_command(1, 100),
        &TestUtils::client_address(41844),
        CommandError::NotAllowedOnReplica("wait"),
    )
    .await;
}

#[tokio::test]
async fn test_handle_wait_command_invalid() {
    let env = TestEnv::new_master_server();

    let test_cases = vec![
        (
            TestUtils::command(&["WAIT", "1"]),
            CommandError::WrongNumberOfArguments("wait"),
        ),
        (
            TestUtils::command(&["WAIT", "one", "100"]),
            CommandError::InvalidInteger,
        ),
        (
            TestUtils::command(&["WAIT", "1", "-100"]),
            CommandError::InvalidTimeout,
        ),
    ];

    for (command, expected_error) in test_cases {
        env.exec_command_err(command, &TestUtils::client_address(41844), expected_error)
            .await;
    }
}
