use crate::{Preparation, Result, Statement};

/// The physical connection of a driver, as seen by the preparation protocol.
pub trait Provider {
    type Statement: Statement;

    const NAME: &'static str;

    /// Create a bare statement, with no command text.
    fn create_statement(&self) -> Result<Self::Statement>;

    /// Prepare `sql` with the driver parameters of the requested variant.
    fn prepare_command(&self, sql: &str, preparation: &Preparation) -> Result<Self::Statement>;

    /// Execute the statements in order, stopping at the first failure.
    /// Returns the total number of rows affected.
    fn execute_batch(&self, statements: &[String]) -> Result<u64>;

    /// Close the physical connection. Every statement was already released.
    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}
