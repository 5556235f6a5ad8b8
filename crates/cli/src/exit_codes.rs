//! CLI Exit Code Registry
//!
//! Single source of truth for `trecon` exit codes. Scripts and schedulers
//! rely on them, so treat changes as breaking.
//!
//! | Code | Meaning                                                        |
//! |------|----------------------------------------------------------------|
//! | 0    | Every entry valid (categories) or identical (dimensions)       |
//! | 1    | Run completed, at least one discrepancy                        |
//! | 2    | Usage error (bad arguments; clap's default)                    |
//! | 3    | Invalid configuration (TOML syntax or validation)              |
//! | 4    | Runtime failure (sink unavailable, unreadable input, aborted)  |
//!
//! An aborted entry outranks discrepancies: a run with both exits 4.

/// Success: the sink is consistent with its sources.
pub const EXIT_SUCCESS: u8 = 0;

/// Reconciliation completed and found discrepancies.
pub const EXIT_DISCREPANCIES: u8 = 1;

/// Usage error - bad arguments, unknown flags.
pub const EXIT_USAGE: u8 = 2;

/// Config could not be parsed or failed validation.
pub const EXIT_INVALID_CONFIG: u8 = 3;

/// Sink or source unavailable, or at least one entry aborted.
pub const EXIT_RUNTIME: u8 = 4;
