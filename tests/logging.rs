mod resource {
    pub mod mock;
}

#[cfg(test)]
mod tests {
    use crate::resource::mock::{Journal, MockProvider};
    use keel::{Coordinator, Result, SessionConfig, StatementLogger};
    use log::{LevelFilter, Log, Metadata, Record};
    use std::sync::{Mutex, Once};

    struct Capture(Mutex<Vec<(String, String)>>);

    impl Log for Capture {
        fn enabled(&self, _metadata: &Metadata) -> bool {
            true
        }

        fn log(&self, record: &Record) {
            self.0
                .lock()
                .unwrap()
                .push((record.target().to_owned(), record.args().to_string()));
        }

        fn flush(&self) {}
    }

    static CAPTURE: Capture = Capture(Mutex::new(Vec::new()));
    static INIT: Once = Once::new();

    fn capture() -> &'static Capture {
        INIT.call_once(|| {
            log::set_logger(&CAPTURE).expect("Another logger was already installed");
            log::set_max_level(LevelFilter::Trace);
        });
        &CAPTURE
    }

    fn records_mentioning(needle: &str) -> Vec<(String, String)> {
        capture()
            .0
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, message)| message.contains(needle))
            .cloned()
            .collect()
    }

    #[test]
    fn logs_the_inspected_text() {
        capture();
        let mut coordinator = Coordinator::new(
            MockProvider::new(Journal::default()),
            SessionConfig::new(),
        )
        .with_inspector(|sql: &str| -> Result<Option<String>> {
            Ok(Some(sql.replace("ledger_original", "ledger_rewritten")))
        });
        coordinator
            .prepare_query_statement("SELECT * FROM ledger_original", false, None)
            .unwrap();
        let statements = records_mentioning("SELECT * FROM ledger_rewritten");
        assert!(
            statements.iter().any(|(target, _)| target == "keel::sql"),
            "{:?}",
            statements
        );
        assert!(
            statements.iter().any(|(target, _)| target == "keel::telemetry"),
            "{:?}",
            statements
        );
        let leaked = records_mentioning("ledger_original");
        assert!(leaked.is_empty(), "{:?}", leaked);
    }

    #[test]
    fn formatted_statements() {
        capture();
        let logger = StatementLogger {
            show_sql: false,
            format_sql: true,
        };
        logger.log("SELECT  quantity\n\tFROM   holdings_formatted\n");
        assert!(
            records_mentioning("SELECT quantity FROM holdings_formatted")
                .iter()
                .any(|(target, _)| target == "keel::sql")
        );
    }

    #[test]
    fn long_statements_are_truncated() {
        capture();
        let sql = format!("SELECT 'truncated_marker', '{}'", "x".repeat(1000));
        StatementLogger::default().log(&sql);
        let records = records_mentioning("truncated_marker");
        let (_, message) = records
            .iter()
            .find(|(target, _)| target == "keel::sql")
            .expect("The statement was not logged");
        assert!(message.len() <= 500, "{}", message.len());
        assert!(message.ends_with("..."));
    }
}
