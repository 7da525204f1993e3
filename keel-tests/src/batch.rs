use indoc::indoc;
use keel::{
    Coordinator, CountingObserver, GeneratedKeys, PrepareError, Provider, Result, SessionConfig,
    Variant,
};
use std::sync::{Arc, Mutex, PoisonError};

static MUTEX: Mutex<()> = Mutex::new(());

pub fn batch<P: Provider>(connect: &impl Fn() -> Result<P>) {
    let _lock = MUTEX.lock().unwrap_or_else(PoisonError::into_inner);
    let observer = Arc::new(CountingObserver::new());
    let mut coordinator = Coordinator::new(
        connect().expect("Could not connect"),
        SessionConfig::new(),
    )
    .with_observer(observer.clone());

    // Setup
    let statement = coordinator
        .create_statement()
        .expect("Failed to create a bare statement");
    statement
        .execute_sql("DROP TABLE IF EXISTS batch_orders")
        .expect("Failed to drop the batch_orders table");
    statement
        .execute_sql(indoc! {"
            CREATE TABLE batch_orders (
                id INTEGER NOT NULL,
                note VARCHAR(64)
            )
        "})
        .expect("Failed to create the batch_orders table");

    // Plain statements leave the batch alone
    coordinator.add_to_batch("INSERT INTO batch_orders (id, note) VALUES (1, 'first')");
    coordinator.add_to_batch("INSERT INTO batch_orders (id, note) VALUES (2, 'second')");
    let count = coordinator
        .prepare_statement("SELECT id FROM batch_orders")
        .expect("Failed to prepare the count");
    assert_eq!(coordinator.pending_batch().len(), 2);
    assert_eq!(count.execute().expect("Failed to count the orders"), 0);
    assert_eq!(observer.counts().batch_start, 0);

    // Any other variant runs it first
    let keyed = coordinator
        .prepare_statement_with(
            "INSERT INTO batch_orders (id, note) VALUES (3, 'third')",
            Variant::ReturnGeneratedKeys(GeneratedKeys::No),
        )
        .expect("Failed to prepare the keyed insert");
    assert!(coordinator.pending_batch().is_empty());
    assert_eq!(observer.counts().batch_start, 1);
    assert_eq!(observer.counts().batch_end, 1);
    assert_eq!(count.execute().expect("Failed to count the orders"), 2);
    keyed.execute().expect("Failed to insert the third order");
    assert_eq!(count.execute().expect("Failed to count the orders"), 3);

    // A failing batch aborts the preparation and is discarded
    coordinator.add_to_batch("INSERT INTO batch_orders_missing (id) VALUES (1)");
    let error = coordinator
        .prepare_statement_with(
            "SELECT note FROM batch_orders",
            Variant::ReturnGeneratedKeys(GeneratedKeys::No),
        )
        .expect_err("The batch should have failed");
    assert!(matches!(error, PrepareError::Batch(..)), "{:?}", error);
    assert!(coordinator.pending_batch().is_empty());
    assert_eq!(coordinator.registry().len(), 3);
    assert_eq!(observer.counts().prepare_start, 2);
    assert_eq!(observer.counts().prepare_end, 2);

    // Explicit execution
    coordinator.add_to_batch("DELETE FROM batch_orders WHERE id = 1");
    coordinator.add_to_batch("DELETE FROM batch_orders WHERE id = 2");
    coordinator
        .execute_batch()
        .expect("Failed to execute the batch");
    assert!(coordinator.pending_batch().is_empty());
    assert_eq!(count.execute().expect("Failed to count the orders"), 1);

    coordinator.close().expect("Failed to close the connection");
    assert_eq!(observer.counts().release_start, 1);
    assert_eq!(observer.counts().release_end, 1);
}
