//! Program storage traits

/// Errors that can occur when opening a program
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CatalogError {
    /// No program with that name
    NotFound,
}

/// Forward-only, restartable reader of instruction lines
pub trait ProgramSource {
    /// Check if another line is available
    fn has_next(&self) -> bool;

    /// Read the next line (None once exhausted)
    fn next_line(&mut self) -> Option<&str>;

    /// Restart from the first line
    fn rewind(&mut self);
}

/// Read-only collection of named programs
pub trait ProgramCatalog {
    /// Reader handed out for an opened program
    type Source: ProgramSource;

    /// Open a program by name
    fn open(&self, name: &str) -> Result<Self::Source, CatalogError>;
}
