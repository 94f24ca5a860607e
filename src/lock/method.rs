use std::fmt;
use std::str::FromStr;

use super::LockError;

/// Remote lock method identifiers.
///
/// The string forms are part of the wire protocol and must not change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LockMethod {
    AcquireShared,
    AcquireExclusive,
    ReleaseShared,
    ReleaseExclusive,
    ForceRelease,
    CheckExpired,
}

impl LockMethod {
    pub const ALL: [LockMethod; 6] = [
        LockMethod::AcquireShared,
        LockMethod::AcquireExclusive,
        LockMethod::ReleaseShared,
        LockMethod::ReleaseExclusive,
        LockMethod::ForceRelease,
        LockMethod::CheckExpired,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            LockMethod::AcquireShared => "acquire-shared",
            LockMethod::AcquireExclusive => "acquire-exclusive",
            LockMethod::ReleaseShared => "release-shared",
            LockMethod::ReleaseExclusive => "release-exclusive",
            LockMethod::ForceRelease => "force-release",
            LockMethod::CheckExpired => "check-expired",
        }
    }
}

impl fmt::Display for LockMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LockMethod {
    type Err = LockError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LockMethod::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| LockError::Decode(format!("unknown lock method: {}", s)))
    }
}
