use keel::{
    Coordinator, GeneratedKeys, Provider, Result, ScrollMode, SessionConfig, Variant,
};

pub fn configuration<P: Provider>(connect: &impl Fn() -> Result<P>) {
    let mut coordinator = Coordinator::new(
        connect().expect("Could not connect"),
        SessionConfig::new(),
    );
    coordinator.add_to_batch("SELECT 1");

    let error = coordinator
        .prepare_statement_with(
            "SELECT 1",
            Variant::ReturnGeneratedKeys(GeneratedKeys::Columns(vec!["id".into()])),
        )
        .expect_err("Generated keys are not enabled");
    assert!(error.is_configuration(), "{:?}", error);

    let error = coordinator
        .prepare_query_statement("SELECT 1", false, Some(ScrollMode::ScrollInsensitive))
        .expect_err("Scrollable result sets are not enabled");
    assert!(error.is_configuration(), "{:?}", error);

    // Rejected before touching the batch or the driver
    assert_eq!(coordinator.pending_batch().len(), 1);
    assert!(coordinator.registry().is_empty());
    assert_eq!(coordinator.registry().last_query(), None);

    // Forward only is the default cursor
    let query = coordinator
        .prepare_query_statement("SELECT 1", false, Some(ScrollMode::ForwardOnly))
        .expect("A forward only query needs no configuration");
    assert_eq!(coordinator.pending_batch().len(), 1);
    assert_eq!(query.execute().expect("Failed to run the query"), 1);

    coordinator.close().expect("Failed to close the connection");
    assert!(coordinator.pending_batch().is_empty());
}
