//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract; scripts rely on them.
//!
//! | Code | Meaning                                              |
//! |------|------------------------------------------------------|
//! | 0    | Success                                              |
//! | 1    | General error (unspecified)                          |
//! | 2    | Usage error (bad args, unknown cell key/direction)   |
//! | 3    | Chart has validation errors / submission blocked     |
//! | 4    | Parse error (chart JSON, replay script TOML)         |
//! | 5    | IO error (unreadable input, unwritable output)       |

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, unknown cell key or direction.
pub const EXIT_USAGE: u8 = 2;

/// The chart has validation errors (validate), or the last submission in a
/// replay was blocked.
pub const EXIT_CHART_INVALID: u8 = 3;

/// Input could not be parsed (chart JSON, replay script).
pub const EXIT_PARSE: u8 = 4;

/// File could not be read or written.
pub const EXIT_IO: u8 = 5;
