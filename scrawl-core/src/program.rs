//! Program catalog over configured programs
//!
//! [`ProgramLibrary`] serves the programs parsed from `robot.toml` by name,
//! handing out a [`ProgramCursor`] per run. [`CycleSelector`] steps
//! through the same programs for a single select button.

use crate::config::ProgramConfig;
use crate::traits::{CatalogError, ProgramCatalog, ProgramSelector, ProgramSource};

/// Forward-only reader over one program
#[derive(Debug, Clone, Copy)]
pub struct ProgramCursor<'a> {
    program: &'a ProgramConfig,
    next: usize,
}

impl<'a> ProgramCursor<'a> {
    pub fn new(program: &'a ProgramConfig) -> Self {
        Self { program, next: 0 }
    }

    /// Name of the program being read
    pub fn name(&self) -> &'a str {
        self.program.name.as_str()
    }
}

impl ProgramSource for ProgramCursor<'_> {
    fn has_next(&self) -> bool {
        self.next < self.program.lines.len()
    }

    fn next_line(&mut self) -> Option<&str> {
        let line = self.program.lines.get(self.next)?;
        self.next += 1;
        Some(line.as_str())
    }

    fn rewind(&mut self) {
        self.next = 0;
    }
}

/// Read-only catalog of named programs
#[derive(Debug, Clone, Copy)]
pub struct ProgramLibrary<'a> {
    programs: &'a [ProgramConfig],
}

impl<'a> ProgramLibrary<'a> {
    pub fn new(programs: &'a [ProgramConfig]) -> Self {
        Self { programs }
    }

    pub fn len(&self) -> usize {
        self.programs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.programs.is_empty()
    }

    /// Program names in catalog order
    pub fn names(&self) -> impl Iterator<Item = &'a str> {
        self.programs.iter().map(|p| p.name.as_str())
    }
}

impl<'a> ProgramCatalog for ProgramLibrary<'a> {
    type Source = ProgramCursor<'a>;

    fn open(&self, name: &str) -> Result<Self::Source, CatalogError> {
        self.programs
            .iter()
            .find(|p| p.name.as_str() == name)
            .map(ProgramCursor::new)
            .ok_or(CatalogError::NotFound)
    }
}

/// Selects programs in catalog order, wrapping at the end
#[derive(Debug, Clone, Copy)]
pub struct CycleSelector<'a> {
    programs: &'a [ProgramConfig],
    index: usize,
}

impl<'a> CycleSelector<'a> {
    pub fn new(programs: &'a [ProgramConfig]) -> Self {
        Self { programs, index: 0 }
    }

    /// Move to the next program and return its name
    pub fn advance(&mut self) -> Option<&'a str> {
        if self.programs.is_empty() {
            return None;
        }
        self.index = (self.index + 1) % self.programs.len();
        Some(self.programs[self.index].name.as_str())
    }

    pub fn index(&self) -> usize {
        self.index
    }
}

impl ProgramSelector for CycleSelector<'_> {
    fn selected(&self) -> Option<&str> {
        self.programs.get(self.index).map(|p| p.name.as_str())
    }
}
