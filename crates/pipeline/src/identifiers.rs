//! Newtype domain identifiers.
//!
//! Every domain concept that has an identity is represented as a distinct newtype
//! wrapping a primitive. This prevents accidentally interchanging, for example,
//! a [`UserLogin`] with a raw head SHA string that has not been validated yet.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Macro for String-wrapped newtypes.
// Generates: struct, new() returning Option<Self>, as_str(), Display.
// ---------------------------------------------------------------------------
macro_rules! string_id {
    (
        $(#[$attr:meta])*
        $name:ident
    ) => {
        $(#[$attr])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(String);

        impl $name {
            /// Creates a new identifier, returning `None` if the value is empty.
            pub fn new(value: impl Into<String>) -> Option<Self> {
                let v = value.into();
                if v.is_empty() { None } else { Some(Self(v)) }
            }

            /// Returns the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

// ---------------------------------------------------------------------------
// Identifiers — GitHub-integer-backed
// ---------------------------------------------------------------------------

/// Identifies a GitHub Pull Request by the number GitHub assigned to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PullRequestNumber(u64);

impl PullRequestNumber {
    /// Creates a new identifier from a raw integer.
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    /// Parses a request path of the form `/<digits>`.
    ///
    /// Returns `None` for anything else: a missing leading slash, an empty
    /// digit run, non-ASCII-digit characters (including signs and `+`), or a
    /// number that does not fit in a `u64`.
    pub fn from_path(path: &str) -> Option<Self> {
        let digits = path.strip_prefix('/')?;
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        digits.parse().ok().map(Self)
    }

    /// Returns the underlying integer value.
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for PullRequestNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Identifiers — UUID-backed (internally generated)
// ---------------------------------------------------------------------------

/// Identifies one inbound trigger request.
///
/// Generated fresh for every request; recorded on the request span so all
/// activity from a single request (fetch, build steps, publish) can be
/// correlated in the logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestId(Uuid);

impl RequestId {
    /// Generates a new random request identifier.
    pub fn new_random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the underlying [`Uuid`].
    pub fn as_uuid(self) -> Uuid {
        self.0
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Identifiers — String-backed (Git / GitHub names)
// ---------------------------------------------------------------------------

/// A Git commit SHA (40-character lowercase hex string).
///
/// Unlike the other string identifiers this one is validated on construction;
/// a value of this type is always safe to use as a directory name and as a
/// `git checkout` argument.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CommitSha(String);

impl CommitSha {
    /// Length of a full SHA-1 commit hash in hex characters.
    pub const LEN: usize = 40;

    /// Creates a [`CommitSha`], returning `None` unless `value` is exactly
    /// 40 characters from `[0-9a-f]`.
    pub fn parse(value: &str) -> Option<Self> {
        let well_formed = value.len() == Self::LEN
            && value
                .bytes()
                .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));
        well_formed.then(|| Self(value.to_owned()))
    }

    /// Returns the SHA as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CommitSha {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

string_id! {
    /// A GitHub account login (e.g. `"illicitonion"`).
    UserLogin
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pull_request_number_parses_digit_paths() {
        assert_eq!(
            PullRequestNumber::from_path("/42"),
            Some(PullRequestNumber::new(42))
        );
        assert_eq!(
            PullRequestNumber::from_path("/007"),
            Some(PullRequestNumber::new(7))
        );
    }

    #[test]
    fn pull_request_number_rejects_other_paths() {
        for path in [
            "", "/", "42", "/42/", "/4a", "/+1", "/-1", "//1", "/1/2", "/٣",
            "/99999999999999999999999",
        ] {
            assert_eq!(PullRequestNumber::from_path(path), None, "path {path:?}");
        }
    }

    #[test]
    fn commit_sha_accepts_lowercase_hex_of_full_length() {
        let sha = "0123456789abcdef0123456789abcdef01234567";
        assert_eq!(CommitSha::parse(sha).map(|s| s.to_string()), Some(sha.into()));
    }

    #[test]
    fn commit_sha_rejects_malformed_values() {
        for value in [
            "",
            "abc",
            "0123456789ABCDEF0123456789abcdef01234567",
            "0123456789abcdef0123456789abcdef0123456",
            "0123456789abcdef0123456789abcdef012345678",
            "0123456789abcdeg0123456789abcdef01234567",
            "../../../../../../../../../../../../etc/x",
        ] {
            assert!(CommitSha::parse(value).is_none(), "value {value:?}");
        }
    }

    #[test]
    fn user_login_rejects_empty() {
        assert!(UserLogin::new("").is_none());
        assert_eq!(UserLogin::new("octocat").unwrap().as_str(), "octocat");
    }
}
