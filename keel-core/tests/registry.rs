#[cfg(test)]
mod tests {
    use keel_core::{Error, Handle, ResourceRegistry, Result, Statement};
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };

    #[derive(Default)]
    struct Cursor {
        closes: Arc<AtomicUsize>,
        cancels: Arc<AtomicUsize>,
        closed: bool,
        fail_close: bool,
    }

    impl Statement for Cursor {
        fn sql(&self) -> Option<&str> {
            Some("SELECT 1")
        }
        fn timeout(&self) -> Option<u32> {
            None
        }
        fn set_timeout(&mut self, _seconds: u32) -> Result<()> {
            Ok(())
        }
        fn fetch_size(&self) -> Option<u32> {
            None
        }
        fn set_fetch_size(&mut self, _rows: u32) -> Result<()> {
            Ok(())
        }
        fn execute(&mut self) -> Result<u64> {
            Ok(1)
        }
        fn execute_sql(&mut self, _sql: &str) -> Result<u64> {
            Ok(1)
        }
        fn cancel(&mut self) -> Result<()> {
            self.cancels.fetch_add(1, Ordering::Relaxed);
            Ok(())
        }
        fn close(&mut self) -> Result<()> {
            self.closed = true;
            self.closes.fetch_add(1, Ordering::Relaxed);
            if self.fail_close {
                return Err(Error::msg("the cursor is stuck"));
            }
            Ok(())
        }
        fn is_closed(&self) -> bool {
            self.closed
        }
    }

    fn cursor(closes: &Arc<AtomicUsize>) -> Handle<Cursor> {
        Handle::new(Cursor {
            closes: closes.clone(),
            ..Default::default()
        })
    }

    #[test]
    fn register_and_release() {
        let closes = Arc::new(AtomicUsize::new(0));
        let registry = ResourceRegistry::new();
        let (first, second) = (cursor(&closes), cursor(&closes));
        registry.register(&first, true).unwrap();
        registry.register(&second, true).unwrap();
        registry.register(&first, true).unwrap();
        assert_eq!(registry.len(), 2);
        assert!(registry.contains(first.id()));

        registry.release(&first).unwrap();
        assert!(!registry.contains(first.id()));
        assert!(first.is_closed().unwrap());
        assert_eq!(closes.load(Ordering::Relaxed), 1);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn release_all() {
        let closes = Arc::new(AtomicUsize::new(0));
        let registry = ResourceRegistry::new();
        let owned = cursor(&closes);
        let borrowed = cursor(&closes);
        registry.register(&owned, true).unwrap();
        registry.register(&borrowed, false).unwrap();
        registry.register_last_query(&owned);

        registry.release_all().unwrap();
        assert!(registry.is_closed());
        assert!(registry.is_empty());
        assert_eq!(registry.last_query(), None);
        assert!(owned.is_closed().unwrap());
        assert!(!borrowed.is_closed().unwrap());
        assert_eq!(closes.load(Ordering::Relaxed), 1);

        registry.release_all().unwrap();
        assert_eq!(closes.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn release_all_attempts_every_statement() {
        let closes = Arc::new(AtomicUsize::new(0));
        let registry = ResourceRegistry::new();
        let stuck = Handle::new(Cursor {
            closes: closes.clone(),
            fail_close: true,
            ..Default::default()
        });
        let fine = cursor(&closes);
        registry.register(&stuck, true).unwrap();
        registry.register(&fine, true).unwrap();
        let error = registry.release_all().expect_err("The first cursor fails to close");
        assert_eq!(error.to_string(), "the cursor is stuck");
        assert!(fine.is_closed().unwrap());
        assert_eq!(closes.load(Ordering::Relaxed), 2);
        assert!(registry.is_empty());
    }

    #[test]
    fn closed_registry_refuses() {
        let closes = Arc::new(AtomicUsize::new(0));
        let registry = ResourceRegistry::new();
        registry.release_all().unwrap();
        let late = cursor(&closes);
        assert!(registry.register(&late, true).is_err());
        assert!(late.is_closed().unwrap());
        assert!(registry.is_empty());
        registry.register_last_query(&late);
        assert_eq!(registry.last_query(), None);
    }

    #[test]
    fn last_query() {
        let closes = Arc::new(AtomicUsize::new(0));
        let cancels = Arc::new(AtomicUsize::new(0));
        let registry = ResourceRegistry::new();
        let query = Handle::new(Cursor {
            closes: closes.clone(),
            cancels: cancels.clone(),
            ..Default::default()
        });
        registry.register(&query, true).unwrap();
        registry.register_last_query(&query);
        assert_eq!(registry.last_query(), Some(query.clone()));

        registry.cancel_last_query().unwrap();
        assert_eq!(cancels.load(Ordering::Relaxed), 1);
        assert_eq!(registry.last_query(), None);
        registry.cancel_last_query().unwrap();
        assert_eq!(cancels.load(Ordering::Relaxed), 1);

        registry.register_last_query(&query);
        registry.release(&query).unwrap();
        assert_eq!(registry.last_query(), None);

        let other = cursor(&closes);
        registry.register_last_query(&other);
        registry.clear_last_query();
        assert_eq!(registry.last_query(), None);
    }
}
