use crate::{CBox, SqliteStatement, error_message_from_ptr, statement::run_script};
use keel_core::{Context, Error, Preparation, Provider, Result, log_error, truncate_long};
use libsqlite3_sys::{
    SQLITE_OK, SQLITE_OPEN_CREATE, SQLITE_OPEN_READWRITE, SQLITE_OPEN_URI, sqlite3,
    sqlite3_close, sqlite3_errmsg, sqlite3_open_v2,
};
use std::{
    ffi::CString,
    ptr,
    sync::{Arc, Mutex, MutexGuard},
};

/// The native connection, shared with the statements it created.
///
/// Every call stepping a statement holds `lock`: the progress handler, the change
/// counter and the last rowid are connection wide.
pub(crate) struct Database {
    pub(crate) handle: CBox<*mut sqlite3>,
    lock: Mutex<()>,
}

impl Database {
    pub(crate) fn lock(&self) -> Result<MutexGuard<'_, ()>> {
        self.lock
            .lock()
            .map_err(|_| Error::msg("The sqlite connection is poisoned"))
    }
}

/// Sqlite connection opened from a `sqlite://` url.
///
/// Anything after the scheme is a sqlite URI filename, query parameters included:
/// `sqlite://data.sqlite?mode=rwc`, `sqlite://:memory:`.
pub struct SqliteConnection {
    database: Option<Arc<Database>>,
}

impl SqliteConnection {
    pub fn connect(url: &str) -> Result<Self> {
        let prefix = format!("{}://", <Self as Provider>::NAME);
        let Some(location) = url.strip_prefix(&prefix) else {
            return Err(log_error!(Error::msg(format!(
                "Expected sqlite connection url to start with `{}`",
                &prefix
            ))));
        };
        let context = || format!("Error while decoding connection URL: `{}`", url);
        let location = CString::new(format!("file:{}", location)).with_context(context)?;
        let mut connection = CBox::new(ptr::null_mut::<sqlite3>(), |p| unsafe {
            sqlite3_close(p);
        });
        let rc = unsafe {
            sqlite3_open_v2(
                location.as_ptr(),
                &mut *connection,
                SQLITE_OPEN_READWRITE | SQLITE_OPEN_CREATE | SQLITE_OPEN_URI,
                ptr::null(),
            )
        };
        if rc != SQLITE_OK {
            let message = if connection.is_null() {
                "Could not allocate the connection".to_string()
            } else {
                error_message_from_ptr(&unsafe { sqlite3_errmsg(*connection) }).to_string()
            };
            return Err(log_error!(Error::msg(message).context(context())));
        }
        log::debug!("Opened the sqlite database `{}`", url);
        Ok(Self {
            database: Some(Arc::new(Database {
                handle: connection,
                lock: Mutex::new(()),
            })),
        })
    }

    pub fn is_closed(&self) -> bool {
        self.database.is_none()
    }

    fn database(&self) -> Result<&Arc<Database>> {
        self.database
            .as_ref()
            .ok_or_else(|| Error::msg("The sqlite connection is closed"))
    }
}

impl Provider for SqliteConnection {
    type Statement = SqliteStatement;

    const NAME: &'static str = "sqlite";

    fn create_statement(&self) -> Result<SqliteStatement> {
        Ok(SqliteStatement::bare(self.database()?.clone()))
    }

    fn prepare_command(&self, sql: &str, preparation: &Preparation) -> Result<SqliteStatement> {
        if preparation.callable {
            return Err(Error::msg("SQLite does not support callable statements"));
        }
        if let Some(mode) = preparation.scroll.filter(|v| !v.is_forward_only()) {
            return Err(Error::msg(format!(
                "SQLite supports only forward-only cursors, {} was requested",
                mode
            )));
        }
        SqliteStatement::prepare(self.database()?.clone(), sql, preparation.clone())
    }

    fn execute_batch(&self, statements: &[String]) -> Result<u64> {
        let database = self.database()?;
        let _lock = database.lock()?;
        let mut total = 0;
        for (i, sql) in statements.iter().enumerate() {
            total += run_script(*database.handle, sql, None).with_context(|| {
                format!(
                    "While executing the statement {} of the batch:\n{}",
                    i + 1,
                    truncate_long!(sql)
                )
            })?;
        }
        Ok(total)
    }

    /// The native connection is closed once the last statement created from it is finalized.
    fn close(&mut self) -> Result<()> {
        if let Some(database) = self.database.take() {
            let pending = Arc::strong_count(&database) - 1;
            if pending > 0 {
                log::debug!(
                    "Closing a sqlite connection still shared by {} statements",
                    pending
                );
            }
        }
        Ok(())
    }
}
