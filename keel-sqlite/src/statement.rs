use crate::{CBox, Database, error_message_from_ptr};
use keel_core::{
    Context, Error, Interrupter, Preparation, Result, Statement, log_error, truncate_long,
};
use libsqlite3_sys::{
    SQLITE_BUSY, SQLITE_DONE, SQLITE_INTERRUPT, SQLITE_OK, SQLITE_ROW, sqlite3,
    sqlite3_column_count, sqlite3_errmsg, sqlite3_finalize, sqlite3_interrupt,
    sqlite3_last_insert_rowid, sqlite3_prepare_v2, sqlite3_progress_handler, sqlite3_reset,
    sqlite3_step, sqlite3_stmt, sqlite3_total_changes,
};
use std::{
    ffi::{CString, c_int, c_void},
    ptr,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::{Duration, Instant},
};

/// Virtual machine instructions between two deadline checks.
const PROGRESS_STEPS: c_int = 1000;

pub struct SqliteStatement {
    statement: Option<CBox<*mut sqlite3_stmt>>,
    database: Arc<Database>,
    sql: Option<String>,
    preparation: Preparation,
    timeout: Option<u32>,
    fetch_size: Option<u32>,
    generated_key: Option<i64>,
    running: Arc<AtomicBool>,
    closed: bool,
}

impl SqliteStatement {
    pub(crate) fn bare(database: Arc<Database>) -> Self {
        Self {
            statement: None,
            database,
            sql: None,
            preparation: Preparation::default(),
            timeout: None,
            fetch_size: None,
            generated_key: None,
            running: Arc::new(AtomicBool::new(false)),
            closed: false,
        }
    }

    pub(crate) fn prepare(
        database: Arc<Database>,
        sql: &str,
        preparation: Preparation,
    ) -> Result<Self> {
        let statement = {
            let _lock = database.lock()?;
            let (statement, consumed) = compile(*database.handle, sql)?;
            if statement.is_null() {
                return Err(Error::msg("Cannot prepare an empty command"));
            }
            if !sql.get(consumed..).unwrap_or_default().trim().is_empty() {
                return Err(Error::msg(
                    "Cannot prepare more than one statement at a time",
                ));
            }
            statement
        };
        Ok(Self {
            statement: Some(statement),
            sql: Some(sql.to_owned()),
            preparation,
            ..Self::bare(database)
        })
    }

    pub fn preparation(&self) -> &Preparation {
        &self.preparation
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed {
            return Err(Error::msg("The statement is closed"));
        }
        Ok(())
    }
}

impl Statement for SqliteStatement {
    fn sql(&self) -> Option<&str> {
        self.sql.as_deref()
    }

    fn timeout(&self) -> Option<u32> {
        self.timeout
    }

    /// Zero removes the timeout.
    fn set_timeout(&mut self, seconds: u32) -> Result<()> {
        self.ensure_open()?;
        self.timeout = (seconds > 0).then_some(seconds);
        Ok(())
    }

    fn fetch_size(&self) -> Option<u32> {
        self.fetch_size
    }

    /// Kept as a hint, sqlite always steps one row at a time.
    fn set_fetch_size(&mut self, rows: u32) -> Result<()> {
        self.ensure_open()?;
        self.fetch_size = Some(rows);
        Ok(())
    }

    fn execute(&mut self) -> Result<u64> {
        self.ensure_open()?;
        let Some(statement) = &self.statement else {
            return Err(Error::msg(
                "A bare statement has no command, use `execute_sql` instead",
            ));
        };
        let _lock = self.database.lock()?;
        let _running = Running::start(&self.running);
        let connection = *self.database.handle;
        let rows = step_all(connection, **statement, self.timeout)
            .with_context(|| {
                let sql = self.sql.as_deref().unwrap_or_default();
                format!("While executing:\n{}", truncate_long!(sql))
            })
            .map_err(|e| log_error!(e))?;
        if self.preparation.generated_keys.is_requested()
            && unsafe { sqlite3_column_count(**statement) } == 0
        {
            self.generated_key = Some(unsafe { sqlite3_last_insert_rowid(connection) });
        }
        Ok(rows)
    }

    fn execute_sql(&mut self, sql: &str) -> Result<u64> {
        self.ensure_open()?;
        let _lock = self.database.lock()?;
        let _running = Running::start(&self.running);
        run_script(*self.database.handle, sql, self.timeout)
            .with_context(|| format!("While executing:\n{}", truncate_long!(sql)))
            .map_err(|e| log_error!(e))
    }

    fn generated_key(&self) -> Option<i64> {
        self.generated_key
    }

    fn cancel(&mut self) -> Result<()> {
        self.ensure_open()?;
        unsafe {
            sqlite3_interrupt(*self.database.handle);
        }
        Ok(())
    }

    fn interrupter(&self) -> Option<Arc<dyn Interrupter>> {
        Some(Arc::new(SqliteInterrupter {
            database: self.database.clone(),
            running: self.running.clone(),
        }))
    }

    fn close(&mut self) -> Result<()> {
        self.closed = true;
        self.statement = None;
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.closed
    }
}

/// Interrupts its statement only while that one is stepping, the connection may be
/// running another statement otherwise.
struct SqliteInterrupter {
    database: Arc<Database>,
    running: Arc<AtomicBool>,
}

impl Interrupter for SqliteInterrupter {
    fn interrupt(&self) -> Result<()> {
        if self.running.load(Ordering::Acquire) {
            unsafe {
                sqlite3_interrupt(*self.database.handle);
            }
        }
        Ok(())
    }
}

/// Marks the statement as running for as long as it lives.
struct Running<'a>(&'a AtomicBool);

impl<'a> Running<'a> {
    fn start(running: &'a AtomicBool) -> Self {
        running.store(true, Ordering::Release);
        Self(running)
    }
}

impl Drop for Running<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Compiles the first statement of `sql`, returning it with the number of bytes consumed.
/// The statement is null when `sql` holds only whitespace or comments.
pub(crate) fn compile(
    connection: *mut sqlite3,
    sql: &str,
) -> Result<(CBox<*mut sqlite3_stmt>, usize)> {
    let command = CString::new(sql).context("Could not create a CString from the command")?;
    let mut statement = CBox::new(ptr::null_mut::<sqlite3_stmt>(), |p| unsafe {
        sqlite3_finalize(p);
    });
    let mut tail = ptr::null();
    let rc = unsafe {
        sqlite3_prepare_v2(
            connection,
            command.as_ptr(),
            sql.len() as c_int,
            &mut *statement,
            &mut tail,
        )
    };
    if rc != SQLITE_OK {
        return Err(Error::msg(
            error_message_from_ptr(&unsafe { sqlite3_errmsg(connection) }).to_string(),
        ));
    }
    let consumed = if tail.is_null() {
        sql.len()
    } else {
        (tail as usize - command.as_ptr() as usize).min(sql.len())
    };
    Ok((statement, consumed))
}

/// Runs every statement of `sql` in order, returning the total rows affected or produced.
pub(crate) fn run_script(
    connection: *mut sqlite3,
    sql: &str,
    timeout: Option<u32>,
) -> Result<u64> {
    let mut rest = sql;
    let mut total = 0;
    while !rest.trim().is_empty() {
        let (statement, consumed) = compile(connection, rest)?;
        rest = rest.get(consumed..).unwrap_or_default();
        if !statement.is_null() {
            total += step_all(connection, *statement, timeout)?;
        } else if consumed == 0 {
            break;
        }
    }
    Ok(total)
}

/// Steps the statement until done, then resets it so it can run again.
fn step_all(
    connection: *mut sqlite3,
    statement: *mut sqlite3_stmt,
    timeout: Option<u32>,
) -> Result<u64> {
    let changes = unsafe { sqlite3_total_changes(connection) };
    let guard = DeadlineGuard::install(connection, timeout);
    let mut rows = 0;
    let result = loop {
        match unsafe { sqlite3_step(statement) } {
            SQLITE_ROW => rows += 1,
            SQLITE_DONE => break Ok(()),
            SQLITE_BUSY => continue,
            SQLITE_INTERRUPT if guard.expired() => {
                break Err(Error::msg(format!(
                    "The statement exceeded its timeout of {} seconds",
                    timeout.unwrap_or_default()
                )));
            }
            _ => {
                break Err(Error::msg(
                    error_message_from_ptr(&unsafe { sqlite3_errmsg(connection) }).to_string(),
                ));
            }
        }
    };
    drop(guard);
    unsafe {
        sqlite3_reset(statement);
    }
    result?;
    if unsafe { sqlite3_column_count(statement) } > 0 {
        Ok(rows)
    } else {
        let changed = unsafe { sqlite3_total_changes(connection) } - changes;
        Ok(changed.max(0) as u64)
    }
}

unsafe extern "C" fn past_deadline(deadline: *mut c_void) -> c_int {
    let deadline = unsafe { &*(deadline as *const Instant) };
    (Instant::now() >= *deadline) as c_int
}

/// Interrupts the running statement through the progress handler once the deadline passes.
struct DeadlineGuard {
    connection: *mut sqlite3,
    deadline: Option<Box<Instant>>,
}

impl DeadlineGuard {
    fn install(connection: *mut sqlite3, timeout: Option<u32>) -> Self {
        let deadline = timeout
            .filter(|v| *v > 0)
            .map(|v| Box::new(Instant::now() + Duration::from_secs(v.into())));
        if let Some(deadline) = &deadline {
            unsafe {
                sqlite3_progress_handler(
                    connection,
                    PROGRESS_STEPS,
                    Some(past_deadline),
                    &**deadline as *const Instant as *mut c_void,
                );
            }
        }
        Self {
            connection,
            deadline,
        }
    }

    fn expired(&self) -> bool {
        self.deadline
            .as_ref()
            .is_some_and(|v| Instant::now() >= **v)
    }
}

impl Drop for DeadlineGuard {
    fn drop(&mut self) {
        if self.deadline.is_some() {
            unsafe {
                sqlite3_progress_handler(self.connection, 0, None, ptr::null_mut());
            }
        }
    }
}
