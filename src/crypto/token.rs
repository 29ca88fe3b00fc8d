//! Opaque API tokens handed out at login.

use rand_core::{OsRng, RngCore};

/// Number of random bytes behind a token; the hex form is twice as long.
pub const TOKEN_BYTES: usize = 20;

/// Generate a fresh random token, hex encoded.
pub fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}
