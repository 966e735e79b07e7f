//! Stable cross-store identifiers

use crate::error::ValidationError;

/// Prefix shared by every commit-derived `memory_id`.
pub const MEMORY_ID_PREFIX: &str = "git_";

/// Number of hash characters kept in a `memory_id`.
pub const MEMORY_ID_HASH_LEN: usize = 16;

/// Derives the `memory_id` used as primary/merge key in every store.
///
/// Format: `"git_" + hash[..16]`. The result depends on nothing but the
/// hash, so re-deriving it for the same commit always yields the same key.
///
/// ```
/// use devtrail_core::derive_id;
/// let id = derive_id("abcdef1234567890abcdef1234567890abcdef12").unwrap();
/// assert_eq!(id, "git_abcdef1234567890");
/// ```
pub fn derive_id(hash: &str) -> Result<String, ValidationError> {
    let prefix = hash
        .get(..MEMORY_ID_HASH_LEN)
        .ok_or_else(|| ValidationError::HashTooShort {
            hash: hash.to_string(),
            required: MEMORY_ID_HASH_LEN,
        })?;

    if !prefix.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(ValidationError::HashNotHex(hash.to_string()));
    }

    Ok(format!("{}{}", MEMORY_ID_PREFIX, prefix))
}

/// Checks that `memory_id` is the one `hash` derives to.
pub fn verify_id(hash: &str, memory_id: &str) -> Result<(), ValidationError> {
    let expected = derive_id(hash)?;
    if expected != memory_id {
        return Err(ValidationError::MemoryIdMismatch {
            expected,
            found: memory_id.to_string(),
        });
    }
    Ok(())
}
