//! Operator input traits

/// Edge-triggered start request (post-debounce)
pub trait StartTrigger {
    /// Returns `true` once per rising edge seen since the last call
    ///
    /// Each edge is consumed exactly once.
    fn take_rising_edge(&mut self) -> bool;
}

/// Chooses which program a start request loads
pub trait ProgramSelector {
    /// Name of the currently selected program, if any
    fn selected(&self) -> Option<&str>;
}
