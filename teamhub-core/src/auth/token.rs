//! Session token generation.
//!
//! Tokens are opaque random strings; all meaning lives server-side in the
//! session table. 48 alphanumeric characters gives ~285 bits of entropy.

use rand::distributions::Alphanumeric;
use rand::Rng;

/// Length of generated session tokens
pub const TOKEN_LEN: usize = 48;

/// Generates a fresh random session token
pub fn generate() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_LEN)
        .map(char::from)
        .collect()
}
