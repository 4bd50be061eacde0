use rand::{distributions::Alphanumeric, Rng};

pub const CODE_LEN: usize = 7;

/// Draws a fresh short code: `CODE_LEN` independent symbols from `[a-zA-Z0-9]`.
///
/// Codes are lookup keys, not secrets, so any uniform RNG will do.
pub fn new_code<R: Rng + ?Sized>(rng: &mut R) -> String {
    rng.sample_iter(&Alphanumeric)
        .take(CODE_LEN)
        .map(char::from)
        .collect()
}

pub fn is_code_symbol(c: char) -> bool {
    c.is_ascii_alphanumeric()
}
