use keel::{Coordinator, Provider, Result, SessionConfig};
use std::time::Duration;

pub fn transaction_timeout<P: Provider>(connect: &impl Fn() -> Result<P>) {
    let mut coordinator = Coordinator::new(
        connect().expect("Could not connect"),
        SessionConfig::new(),
    );

    let statement = coordinator
        .prepare_statement("SELECT 1")
        .expect("Failed to prepare outside of a transaction");
    assert_eq!(statement.timeout().unwrap(), None);

    coordinator.begin_transaction(Some(Duration::from_secs(30)));
    let statement = coordinator
        .prepare_statement("SELECT 2")
        .expect("Failed to prepare inside the transaction");
    let timeout = statement
        .timeout()
        .unwrap()
        .expect("The statement did not inherit the transaction timeout");
    assert!(timeout > 0 && timeout <= 30, "{}", timeout);
    statement.execute().expect("Failed to run the statement");

    coordinator.begin_transaction(None);
    let statement = coordinator
        .prepare_statement("SELECT 3")
        .expect("Failed to prepare inside an untimed transaction");
    assert_eq!(statement.timeout().unwrap(), None);

    coordinator.begin_transaction(Some(Duration::ZERO));
    let error = coordinator
        .prepare_statement("SELECT 4")
        .expect_err("The transaction already timed out");
    assert!(error.is_assertion(), "{:?}", error);
    assert_eq!(coordinator.registry().len(), 3);

    coordinator.end_transaction();
    let statement = coordinator
        .prepare_statement("SELECT 5")
        .expect("Failed to prepare after the transaction");
    assert_eq!(statement.timeout().unwrap(), None);
}
