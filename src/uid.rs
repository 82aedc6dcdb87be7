//! UID types and identifier allocation
//!
//! A UID name is a short lowercase hex string (5 characters by default).
//! Names are drawn from the OS random source and checked against the store;
//! on collision a new candidate is drawn, up to a fixed number of attempts.

use crate::{Error, Result};
use rand::RngCore;
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};

/// Default length of an allocated name, in hex characters
pub const DEFAULT_NAME_LENGTH: usize = 5;

/// Longest name the allocator will produce; matches the `varchar(100)` column
/// used by existing deployments
pub const MAX_NAME_LENGTH: usize = 100;

/// Default number of candidates tried before giving up
pub const DEFAULT_MAX_ATTEMPTS: u32 = 32;

/// A synchronization bucket identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Uid {
    /// Serial row id, assigned by the database
    pub id: i64,
    /// Unique short hex name handed to clients
    pub name: String,
    /// Whether records under this UID are visible
    pub status: bool,
}

impl Uid {
    /// True when records under this UID are visible to reads and pushes
    pub fn is_enabled(&self) -> bool {
        self.status
    }
}

impl std::fmt::Display for Uid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = if self.status { "enabled" } else { "disabled" };
        write!(f, "{} ({})", self.name, state)
    }
}

/// One row of the identifier listing: a UID and how many records it owns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UidSummary {
    pub name: String,
    pub status: bool,
    pub count: usize,
}

/// Source of candidate names for [`NameAllocator`].
pub trait NameSource: Send {
    /// Produce a candidate name of exactly `length` characters
    fn generate(&mut self, length: usize) -> Result<String>;
}

/// Cryptographically random lowercase hex names.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomHex;

impl NameSource for RandomHex {
    fn generate(&mut self, length: usize) -> Result<String> {
        random_hex(length)
    }
}

/// Generate `length` random lowercase hex characters.
///
/// Draws `ceil(length / 2)` bytes from the OS random source and truncates the
/// encoding to the requested length. Lengths above [`MAX_NAME_LENGTH`] are
/// rejected.
pub fn random_hex(length: usize) -> Result<String> {
    check_length(length)?;
    let mut bytes = vec![0u8; length.div_ceil(2)];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|e| Error::Entropy(e.to_string()))?;

    let mut hex = hex::encode(&bytes);
    hex.truncate(length);
    Ok(hex)
}

fn check_length(length: usize) -> Result<()> {
    if length == 0 {
        return Err(Error::InvalidConfig("id_length must be at least 1".to_string()));
    }
    if length > MAX_NAME_LENGTH {
        return Err(Error::InvalidConfig(format!(
            "id_length must be at most {}, got {}",
            MAX_NAME_LENGTH, length
        )));
    }
    Ok(())
}

/// Allocates names that are not yet taken, with a bounded number of retries.
pub struct NameAllocator {
    source: Box<dyn NameSource>,
    length: usize,
    max_attempts: u32,
}

impl NameAllocator {
    /// Create an allocator drawing candidates from `source`
    pub fn new(source: impl NameSource + 'static, length: usize, max_attempts: u32) -> Result<Self> {
        check_length(length)?;
        if max_attempts == 0 {
            return Err(Error::InvalidConfig("max_attempts must be at least 1".to_string()));
        }
        Ok(Self {
            source: Box::new(source),
            length,
            max_attempts,
        })
    }

    /// Length of every name this allocator hands out
    pub fn length(&self) -> usize {
        self.length
    }

    /// Candidates drawn before allocation gives up
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Draw candidates until `exists` reports one as free.
    ///
    /// Fails with [`Error::NamespaceExhausted`] once `max_attempts` candidates
    /// have all collided.
    pub fn allocate<F>(&mut self, mut exists: F) -> Result<String>
    where
        F: FnMut(&str) -> Result<bool>,
    {
        for attempt in 1..=self.max_attempts {
            let candidate = self.source.generate(self.length)?;
            if !exists(&candidate)? {
                return Ok(candidate);
            }
            tracing::debug!("Name collision on {} (attempt {}/{})", candidate, attempt, self.max_attempts);
        }

        tracing::warn!(
            "Gave up allocating a name of length {} after {} attempts",
            self.length,
            self.max_attempts
        );
        Err(Error::NamespaceExhausted {
            attempts: self.max_attempts,
            length: self.length,
        })
    }
}

impl Default for NameAllocator {
    fn default() -> Self {
        Self {
            source: Box::new(RandomHex),
            length: DEFAULT_NAME_LENGTH,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

impl std::fmt::Debug for NameAllocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NameAllocator")
            .field("length", &self.length)
            .field("max_attempts", &self.max_attempts)
            .finish()
    }
}

/// Replays a fixed list of names, repeating the last one once exhausted.
#[cfg(test)]
pub(crate) struct ScriptedNames {
    names: Vec<String>,
    next: usize,
}

#[cfg(test)]
impl ScriptedNames {
    pub(crate) fn new(names: &[&str]) -> Self {
        Self {
            names: names.iter().map(|s| s.to_string()).collect(),
            next: 0,
        }
    }
}

#[cfg(test)]
impl NameSource for ScriptedNames {
    fn generate(&mut self, _length: usize) -> Result<String> {
        let idx = self.next.min(self.names.len() - 1);
        self.next += 1;
        Ok(self.names[idx].clone())
    }
}
