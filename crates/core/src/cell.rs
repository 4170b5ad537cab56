//! Per-cell next-state decision.
//!
//! Every cell is evaluated once per clock edge against the same snapshot of
//! the previous generation. The override inputs (reset, row clear, row set)
//! and the stepping inputs (enable, pulse) can all be active in one cycle;
//! [`decide`] resolves them in a fixed priority order:
//!
//! 1. reset, or row-select + clear mask → dead
//! 2. row-select + set mask → alive
//! 3. enable or pulse → Game of Life rule
//! 4. hold

/// Inputs seen by a single cell on one clock edge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CellInputs {
    /// Global reset line
    pub reset: bool,
    /// Row is selected and this column's clear mask bit is set
    pub clear: bool,
    /// Row is selected and this column's set mask bit is set
    pub set: bool,
    /// Advance one generation this cycle (enable or one-shot pulse)
    pub advance: bool,
}

/// Tagged next state of a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextState {
    /// Forced dead by reset or a clear mask
    Clear,
    /// Forced alive by a set mask
    Set,
    /// Result of the Life rule
    Computed(bool),
    /// No input active; keep the current value
    Hold,
}

impl NextState {
    /// Apply the decision to the current value.
    #[inline]
    pub fn resolve(self, alive: bool) -> bool {
        match self {
            NextState::Clear => false,
            NextState::Set => true,
            NextState::Computed(v) => v,
            NextState::Hold => alive,
        }
    }
}

/// Conway's B3/S23 rule.
#[inline]
pub fn life_rule(alive: bool, live_neighbors: u8) -> bool {
    matches!((alive, live_neighbors), (true, 2) | (true, 3) | (false, 3))
}

/// Decide a cell's next state from its current value, live neighbor count and
/// the inputs active this cycle.
#[inline]
pub fn decide(alive: bool, live_neighbors: u8, inputs: CellInputs) -> NextState {
    if inputs.reset || inputs.clear {
        NextState::Clear
    } else if inputs.set {
        NextState::Set
    } else if inputs.advance {
        NextState::Computed(life_rule(alive, live_neighbors))
    } else {
        NextState::Hold
    }
}
