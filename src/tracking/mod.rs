// ============================================================================
// Change Tracking
// ============================================================================
//
// Every DbContext owns one ChangeTracker. Entities enter it as Added (new),
// Unchanged (attached or loaded), and move to Modified when detect_changes
// finds a property that differs from its snapshot. The tracker turns pending
// entries into the flush batch handed to storage.
//
// ============================================================================

pub mod entry;
pub mod tracker;

pub use entry::{EntityEntry, EntityState, PropertyEntry};
pub use tracker::ChangeTracker;
