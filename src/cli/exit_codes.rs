//! Exit codes for the CLI
//!
//! | Code | Constant | Meaning |
//! |------|----------|---------|
//! | 0 | `SUCCESS` | Scan completed and no rule matched |
//! | 1 | `MATCHES_FOUND` | At least one rule matched an item |
//! | 3 | `ERROR` | Configuration, manifest or report error |
//! | 4 | `INVALID_ARGS` | Invalid arguments |
//!
//! ```rust,ignore
//! use resscan::cli::exit_codes;
//!
//! std::process::exit(exit_codes::MATCHES_FOUND);
//! ```

/// Nothing matched or the command completed normally
pub const SUCCESS: i32 = 0;

/// At least one rule matched
pub const MATCHES_FOUND: i32 = 1;

/// Runtime error (unreadable config or manifest, report not writable)
pub const ERROR: i32 = 3;

/// Invalid arguments (bad working directory, existing file without `--force`)
pub const INVALID_ARGS: i32 = 4;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes_are_distinct() {
        let codes = [SUCCESS, MATCHES_FOUND, ERROR, INVALID_ARGS];
        for i in 0..codes.len() {
            for j in (i + 1)..codes.len() {
                assert_ne!(codes[i], codes[j]);
            }
        }
    }
}
