use indoc::indoc;
use keel::{Coordinator, Provider, Result, SessionConfig};
use std::sync::{Mutex, PoisonError};

static MUTEX: Mutex<()> = Mutex::new(());

pub fn inspection<P: Provider>(connect: &impl Fn() -> Result<P>) {
    let _lock = MUTEX.lock().unwrap_or_else(PoisonError::into_inner);
    let mut coordinator = Coordinator::new(
        connect().expect("Could not connect"),
        SessionConfig::new(),
    )
    .with_inspector(|sql: &str| -> Result<Option<String>> {
        Ok(sql
            .contains("{ledger}")
            .then(|| sql.replace("{ledger}", "inspected_ledger")))
    });

    // Setup, bare statements are not inspected
    let statement = coordinator
        .create_statement()
        .expect("Failed to create a bare statement");
    statement
        .execute_sql("DROP TABLE IF EXISTS inspected_ledger")
        .expect("Failed to drop the inspected_ledger table");
    statement
        .execute_sql(indoc! {"
            CREATE TABLE inspected_ledger (
                entry INTEGER NOT NULL
            )
        "})
        .expect("Failed to create the inspected_ledger table");

    let insert = coordinator
        .prepare_statement("INSERT INTO {ledger} (entry) VALUES (1)")
        .expect("Failed to prepare the inspected insert");
    assert_eq!(
        insert.sql().unwrap().as_deref(),
        Some("INSERT INTO inspected_ledger (entry) VALUES (1)")
    );
    insert.execute().expect("Failed to insert the entry");

    let query = coordinator
        .prepare_query_statement("SELECT entry FROM {ledger}", false, None)
        .expect("Failed to prepare the inspected query");
    assert_eq!(query.execute().expect("Failed to run the query"), 1);

    // Untouched text
    let query = coordinator
        .prepare_query_statement("SELECT entry FROM inspected_ledger", false, None)
        .expect("Failed to prepare the query");
    assert_eq!(
        query.sql().unwrap().as_deref(),
        Some("SELECT entry FROM inspected_ledger")
    );

    // Errors carry the inspected text
    let error = coordinator
        .prepare_statement("SELECT missing_column FROM {ledger}")
        .expect_err("The column does not exist");
    assert!(error.is_statement_preparation(), "{:?}", error);
    assert_eq!(
        error.sql(),
        Some("SELECT missing_column FROM inspected_ledger")
    );
    assert_eq!(coordinator.registry().len(), 4);
}
