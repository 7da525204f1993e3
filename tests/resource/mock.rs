use keel::{
    Error, EventSink, Interrupter, Observer, Preparation, PrepareEvent, Provider, Result,
    Statement,
};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    CreateStatement,
    Prepare(String, Preparation),
    Batch(Vec<String>),
    PrepareStart,
    PrepareEnd,
    EventBegin,
    EventComplete(String),
    SetTimeout(u32),
    SetFetchSize(u32),
    CloseStatement(Option<String>),
    Cancel(Option<String>),
    Interrupt(Option<String>),
    CloseProvider,
}

/// Ordered record of everything the mock collaborators saw.
#[derive(Debug, Default, Clone)]
pub struct Journal(Arc<Mutex<Vec<Call>>>);

impl Journal {
    pub fn push(&self, call: Call) {
        self.0.lock().unwrap().push(call);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.0.lock().unwrap().clone()
    }

    pub fn count(&self, predicate: impl Fn(&Call) -> bool) -> usize {
        self.0.lock().unwrap().iter().filter(|v| predicate(v)).count()
    }

    pub fn position(&self, call: &Call) -> Option<usize> {
        self.0.lock().unwrap().iter().position(|v| v == call)
    }

    pub fn clear(&self) {
        self.0.lock().unwrap().clear();
    }
}

#[derive(Debug, Default)]
pub struct MockProvider {
    pub journal: Journal,
    pub fail_create: bool,
    pub fail_prepare: bool,
    pub fail_batch: bool,
    pub fail_timeout: bool,
    pub fail_fetch_size: bool,
    pub interruptible: bool,
}

impl MockProvider {
    pub fn new(journal: Journal) -> Self {
        Self {
            journal,
            ..Default::default()
        }
    }

    fn statement(&self, sql: Option<String>, preparation: Preparation) -> MockStatement {
        MockStatement {
            journal: self.journal.clone(),
            sql,
            preparation,
            timeout: None,
            fetch_size: None,
            executions: 0,
            closed: false,
            fail_timeout: self.fail_timeout,
            fail_fetch_size: self.fail_fetch_size,
            interruptible: self.interruptible,
        }
    }
}

impl Provider for MockProvider {
    type Statement = MockStatement;

    const NAME: &'static str = "mock";

    fn create_statement(&self) -> Result<MockStatement> {
        self.journal.push(Call::CreateStatement);
        if self.fail_create {
            return Err(Error::msg("mock: out of statements"));
        }
        Ok(self.statement(None, Preparation::default()))
    }

    fn prepare_command(&self, sql: &str, preparation: &Preparation) -> Result<MockStatement> {
        self.journal
            .push(Call::Prepare(sql.to_owned(), preparation.clone()));
        if self.fail_prepare {
            return Err(Error::msg(format!("mock: syntax error near `{}`", sql)));
        }
        Ok(self.statement(Some(sql.to_owned()), preparation.clone()))
    }

    fn execute_batch(&self, statements: &[String]) -> Result<u64> {
        self.journal.push(Call::Batch(statements.to_vec()));
        if self.fail_batch {
            return Err(Error::msg("mock: constraint violation"));
        }
        Ok(statements.len() as u64)
    }

    fn close(&mut self) -> Result<()> {
        self.journal.push(Call::CloseProvider);
        Ok(())
    }
}

#[derive(Debug)]
pub struct MockStatement {
    journal: Journal,
    sql: Option<String>,
    pub preparation: Preparation,
    timeout: Option<u32>,
    fetch_size: Option<u32>,
    pub executions: u64,
    closed: bool,
    fail_timeout: bool,
    fail_fetch_size: bool,
    interruptible: bool,
}

impl Statement for MockStatement {
    fn sql(&self) -> Option<&str> {
        self.sql.as_deref()
    }

    fn timeout(&self) -> Option<u32> {
        self.timeout
    }

    fn set_timeout(&mut self, seconds: u32) -> Result<()> {
        self.journal.push(Call::SetTimeout(seconds));
        if self.fail_timeout {
            return Err(Error::msg("mock: timeouts are not supported"));
        }
        self.timeout = Some(seconds);
        Ok(())
    }

    fn fetch_size(&self) -> Option<u32> {
        self.fetch_size
    }

    fn set_fetch_size(&mut self, rows: u32) -> Result<()> {
        self.journal.push(Call::SetFetchSize(rows));
        if self.fail_fetch_size {
            return Err(Error::msg("mock: invalid fetch size"));
        }
        self.fetch_size = Some(rows);
        Ok(())
    }

    fn execute(&mut self) -> Result<u64> {
        if self.closed {
            return Err(Error::msg("mock: statement is closed"));
        }
        self.executions += 1;
        Ok(1)
    }

    fn execute_sql(&mut self, _sql: &str) -> Result<u64> {
        if self.closed {
            return Err(Error::msg("mock: statement is closed"));
        }
        self.executions += 1;
        Ok(1)
    }

    fn cancel(&mut self) -> Result<()> {
        self.journal.push(Call::Cancel(self.sql.clone()));
        Ok(())
    }

    fn interrupter(&self) -> Option<Arc<dyn Interrupter>> {
        self.interruptible.then(|| {
            Arc::new(MockInterrupter {
                journal: self.journal.clone(),
                sql: self.sql.clone(),
            }) as Arc<dyn Interrupter>
        })
    }

    fn close(&mut self) -> Result<()> {
        if !self.closed {
            self.closed = true;
            self.journal.push(Call::CloseStatement(self.sql.clone()));
        }
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.closed
    }
}

/// Journals interruptions without touching the statement.
pub struct MockInterrupter {
    journal: Journal,
    sql: Option<String>,
}

impl Interrupter for MockInterrupter {
    fn interrupt(&self) -> Result<()> {
        self.journal.push(Call::Interrupt(self.sql.clone()));
        Ok(())
    }
}

pub struct JournalObserver(pub Journal);

impl Observer for JournalObserver {
    fn prepare_start(&self) {
        self.0.push(Call::PrepareStart);
    }
    fn prepare_end(&self) {
        self.0.push(Call::PrepareEnd);
    }
}

pub struct JournalEventSink(pub Journal);

impl EventSink for JournalEventSink {
    fn begin_event(&self) -> PrepareEvent {
        self.0.push(Call::EventBegin);
        PrepareEvent::begin()
    }

    fn complete_event(&self, event: PrepareEvent, sql: &str) {
        assert!(!event.is_complete());
        self.0.push(Call::EventComplete(sql.to_owned()));
    }
}
