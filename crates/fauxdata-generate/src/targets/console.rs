use std::io::Write;

use super::Target;
use crate::errors::TargetError;
use crate::table::GeneratedTable;

pub(super) const DEFAULT_ROWS: usize = 10;

/// Prints the head of the table to stdout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleTarget {
    pub name: String,
    pub rows: usize,
}

impl Target for ConsoleTarget {
    fn kind(&self) -> &'static str {
        "Console"
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn save(&self, table: &GeneratedTable) -> Result<(), TargetError> {
        let mut stdout = std::io::stdout().lock();
        writeln!(stdout, "[{}] {} rows", table.name, table.frame.height())?;
        write!(stdout, "{}", table.frame.head(self.rows))?;
        stdout.flush()?;
        Ok(())
    }
}
