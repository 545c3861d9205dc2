//! SHA-256 digests for unauthenticated callers.
//!
//! Callers are identified by a digest over the identifying headers they send
//! plus their session id, if any. Each field is length-prefixed before
//! hashing, so two different inputs never produce the same byte stream.
//! Sign-in codes are stored as their digest, never in plain text.

use sha2::{Digest, Sha256};

/// The client-supplied values a fingerprint is derived from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FingerprintInput<'a> {
    pub user_agent: &'a str,
    pub accept_language: &'a str,
    pub session_id: Option<&'a str>,
}

fn update_field(hasher: &mut Sha256, value: &str) {
    hasher.update((value.len() as u64).to_be_bytes());
    hasher.update(value.as_bytes());
}

/// Compute the stable hex fingerprint for a request.
pub fn request_fingerprint(input: &FingerprintInput<'_>) -> String {
    let mut hasher = Sha256::new();
    update_field(&mut hasher, input.user_agent);
    update_field(&mut hasher, input.accept_language);
    match input.session_id {
        Some(session_id) => {
            hasher.update([1u8]);
            update_field(&mut hasher, session_id);
        }
        None => hasher.update([0u8]),
    }
    format!("{:x}", hasher.finalize())
}

/// Hex digest under which a sign-in code is stored and looked up.
pub fn sign_in_code_digest(code: &str) -> String {
    format!("{:x}", Sha256::digest(code.as_bytes()))
}

/// Compose the counting-service key `"<namespace>:<action>:<fingerprint>"`.
pub fn rate_limit_key(namespace: &str, action: &str, fingerprint: &str) -> String {
    format!("{namespace}:{action}:{fingerprint}")
}
