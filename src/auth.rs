//! Submission verification
//!
//! Every score submission carries a hash computed from the leaderboard id,
//! the entrant name, the score and a secret shared with the submitting
//! application. This keeps casual clients from forging scores by replaying
//! edited requests. It is not an authentication scheme: there is one secret
//! for every client and nothing prevents replaying a captured request.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::debug;

/// Digest used to derive submission tokens
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenDigest {
    /// Hex MD5, what deployed game clients compute
    #[default]
    Md5,
    Sha256,
}

/// Computes and checks submission tokens with a process-wide secret
#[derive(Debug, Clone)]
pub struct SubmissionAuthenticator {
    secret: String,
    digest: TokenDigest,
}

impl SubmissionAuthenticator {
    pub fn new(secret: impl Into<String>, digest: TokenDigest) -> Self {
        Self {
            secret: secret.into(),
            digest,
        }
    }

    /// Token for `(leaderboard_id, name, score)` as lowercase hex
    pub fn compute_token(&self, leaderboard_id: &str, name: &str, score: i64) -> String {
        compute_token(&self.secret, self.digest, leaderboard_id, name, score)
    }

    /// Exact comparison against a freshly computed token
    pub fn verify(&self, leaderboard_id: &str, name: &str, score: i64, token: &str) -> bool {
        let expected = self.compute_token(leaderboard_id, name, score);
        if expected != token {
            debug!(leaderboard_id, "Submission token mismatch");
            return false;
        }
        true
    }
}

/// Hash of `secret ‖ leaderboard_id ‖ name ‖ score` in the given digest
pub fn compute_token(
    secret: &str,
    digest: TokenDigest,
    leaderboard_id: &str,
    name: &str,
    score: i64,
) -> String {
    let message = format!("{}{}{}{}", secret, leaderboard_id, name, score);
    match digest {
        TokenDigest::Md5 => format!("{:x}", md5::compute(message.as_bytes())),
        TokenDigest::Sha256 => hex::encode(Sha256::digest(message.as_bytes())),
    }
}
