//! Public case reference codes.

use sha2::Sha256;

const SALT: &[u8] = b"CBRS";
const ROUNDS: u32 = 99_999;
const CODE_LEN: usize = 8;

/// Derive the 8-character public reference for a case id.
///
/// PBKDF2-HMAC-SHA256 over the decimal id, rendered as upper-case hex, of
/// which the last eight characters are kept. The code depends only on the
/// id, so it can only be computed once the row has been inserted.
pub fn reference_code(case_id: i64) -> String {
  let mut key = [0u8; 32];
  pbkdf2::pbkdf2_hmac::<Sha256>(case_id.to_string().as_bytes(), SALT, ROUNDS, &mut key);
  let hex = hex::encode_upper(key);
  hex[hex.len() - CODE_LEN..].to_owned()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn known_codes() {
    assert_eq!(reference_code(42), "3900F86C");
    assert_eq!(reference_code(43), "4823B837");
    assert_eq!(reference_code(7), "10AEE2C1");
  }

  #[test]
  fn codes_are_stable_and_distinct() {
    assert_eq!(reference_code(42), reference_code(42));
    assert_ne!(reference_code(42), reference_code(43));
    assert_eq!(reference_code(1).len(), 8);
  }
}
