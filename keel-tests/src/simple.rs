use indoc::indoc;
#[cfg(not(feature = "disable-generated-keys"))]
use keel::GeneratedKeys;
use keel::{Coordinator, PrepareError, Provider, Result, SessionConfig, Variant};
use std::sync::{Mutex, PoisonError};

static MUTEX: Mutex<()> = Mutex::new(());

pub fn simple<P: Provider>(connect: &impl Fn() -> Result<P>) {
    let _lock = MUTEX.lock().unwrap_or_else(PoisonError::into_inner);
    let provider = connect().expect("Could not connect");
    let mut coordinator = Coordinator::new(
        provider,
        SessionConfig::new()
            .with_generated_keys(true)
            .with_fetch_size(Some(64)),
    );

    // Setup
    let statement = coordinator
        .create_statement()
        .expect("Failed to create a bare statement");
    assert_eq!(statement.sql().unwrap(), None);
    statement
        .execute_sql("DROP TABLE IF EXISTS simple_trades")
        .expect("Failed to drop the simple_trades table");
    statement
        .execute_sql(indoc! {"
            CREATE TABLE simple_trades (
                id INTEGER PRIMARY KEY,
                symbol VARCHAR(16) NOT NULL,
                quantity INTEGER NOT NULL
            )
        "})
        .expect("Failed to create the simple_trades table");

    // Insert
    #[cfg(not(feature = "disable-generated-keys"))]
    let variant = Variant::ReturnGeneratedKeys(GeneratedKeys::All);
    #[cfg(feature = "disable-generated-keys")]
    let variant = Variant::Plain;
    let insert = coordinator
        .prepare_statement_with(
            "INSERT INTO simple_trades (symbol, quantity) VALUES ('AAPL', 10)",
            variant,
        )
        .expect("Failed to prepare the insert");
    assert_eq!(insert.execute().expect("Failed to insert the first trade"), 1);
    let first = insert.generated_key().unwrap();
    assert_eq!(insert.execute().expect("Failed to insert the second trade"), 1);
    let second = insert.generated_key().unwrap();
    #[cfg(not(feature = "disable-generated-keys"))]
    {
        let (first, second) = (
            first.expect("The first trade has no generated key"),
            second.expect("The second trade has no generated key"),
        );
        assert!(second > first, "{} is not after {}", second, first);
    }
    #[cfg(feature = "disable-generated-keys")]
    let _ = (first, second);
    assert_eq!(insert.fetch_size().unwrap(), None);

    // Query
    let query = coordinator
        .prepare_query_statement("SELECT symbol, quantity FROM simple_trades", false, None)
        .expect("Failed to prepare the query");
    assert_eq!(query.fetch_size().unwrap(), Some(64));
    assert_eq!(query.execute().expect("Failed to run the query"), 2);
    assert_eq!(query.execute().expect("Failed to run the query again"), 2);
    assert_eq!(coordinator.registry().last_query(), Some(query.clone()));
    assert_eq!(coordinator.registry().len(), 3);

    // Release
    coordinator
        .release(&insert)
        .expect("Failed to release the insert");
    assert!(insert.is_closed().unwrap());
    assert!(insert.execute().is_err());
    assert!(!coordinator.registry().contains(insert.id()));
    assert_eq!(coordinator.registry().len(), 2);

    // Close
    coordinator.close().expect("Failed to close the connection");
    assert!(coordinator.is_closed());
    assert!(coordinator.registry().is_empty());
    assert!(statement.is_closed().unwrap());
    assert!(query.is_closed().unwrap());
    assert!(matches!(
        coordinator.prepare_statement("SELECT 1"),
        Err(PrepareError::Closed)
    ));
    coordinator.close().expect("Closing twice must succeed");
}
