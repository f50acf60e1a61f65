use crate::test_utils::{TestEnv, TestUtils};

#[tokio::test]
async fn test_handle_type_command() {
    let env = TestEnv::new_master_server();

    env.exec_command_ok(
        TestUtils::set_command("grape", "mango"),
        &TestUtils::client_address(41844),
        &TestUtils::expected_simple_string("OK"),
    )
    .await;

    env.exec_command_ok(
        TestUtils::xadd_command("fruits", "0-1", &["mango", "apple"]),
        &TestUtils::client_address(41844),
        &TestUtils::expected_bulk_string("0-1"),
    )
    .await;

    let test_cases = vec![("grape", "string"), ("fruits", "stream"), ("banana", "none")];

    for (key, expected) in test_cases {
        env.exec_command_ok(
            TestUtils::type_command(key),
            &TestUtils::client_address(41844),
            &TestUtils::expected_simple_string(expected),
        )
        .await;
    }
}

#[tokio::test]
async fn test_handle_type_command_expired_key() {
    let env = TestEnv::new_master_server();

    env.exec_command_ok(
        TestUtils::set_command_with_expiration("grape", "mango", 10),
        &TestUtils::client_address(41844),
        &TestUtils::expected_simple_string("OK"),
    )
    .await;

    tokio::time::sleep(std::time::Duration::from_millis(50)).await;

    env.exec_command_ok(
        TestUtils::type_command("grape"),
        &TestUtils::client_address(41844),
        &TestUtils::expected_simple_string("none"),
    )
    .await;
}
