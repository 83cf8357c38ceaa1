//! CLI Exit Code Registry
//!
//! Single source of truth for `pogkit` exit codes. Scripts rely on them.
//!
//! | Code | Meaning                                                   |
//! |------|-----------------------------------------------------------|
//! | 0    | Success, no error-severity issues                         |
//! | 1    | General error (unspecified)                               |
//! | 2    | Usage error (bad arguments, invalid config file)          |
//! | 3    | Operation failed (`ok=false`: bad table, archive, params) |
//! | 4    | Operation completed but recorded error-severity issues    |
//! | 5    | I/O error reading inputs or writing outputs               |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant
//! 2. Document what triggers it
//! 3. Update the table above

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, unreadable or invalid config.
pub const EXIT_USAGE: u8 = 2;

/// The engine returned `ok=false`. Nothing was written except report files.
pub const EXIT_OP_FAILED: u8 = 3;

/// The operation finished but at least one issue has severity `error`
/// (document not found, wrong purpose, invalid JSON, ...). Outputs were written.
pub const EXIT_ISSUES: u8 = 4;

/// Input file could not be read, or an output file could not be written.
pub const EXIT_IO: u8 = 5;
