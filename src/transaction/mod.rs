// ============================================================================
// Transaction Module
// ============================================================================
//
// A flush is one atomic batch of row changes. The batch is validated in full
// before any row is touched, so a rejected flush leaves the store unchanged.
//
// ============================================================================

pub mod change;

pub use change::Change;
