//! Opaque identifier generation for route sets, routes and runs.
//!
//! Ids are `<millis base36><random base36>`: roughly time ordered, unique
//! enough for a single user's history, and never parsed back.

use chrono::Utc;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// Source of fresh opaque ids.
pub trait IdSource {
    fn next_id(&mut self) -> String;
}

/// Deterministic `<prefix>-<n>` ids, used by tests and previews.
#[derive(Debug, Clone)]
pub struct SequentialIds {
    prefix: String,
    next: u64,
}

impl SequentialIds {
    #[must_use]
    pub fn new(prefix: &str) -> Self {
        Self {
            prefix: prefix.to_string(),
            next: 0,
        }
    }
}

impl Default for SequentialIds {
    fn default() -> Self {
        Self::new("route")
    }
}

impl IdSource for SequentialIds {
    fn next_id(&mut self) -> String {
        let id = format!("{}-{}", self.prefix, self.next);
        self.next += 1;
        id
    }
}

/// Time-prefixed random ids.
#[derive(Debug, Clone)]
pub struct RandomIds {
    rng: SmallRng,
}

impl RandomIds {
    /// Seed from OS entropy.
    #[must_use]
    pub fn new() -> Self {
        Self {
            rng: SmallRng::from_entropy(),
        }
    }

    /// Fixed seed for reproducible sequences.
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
        }
    }
}

impl Default for RandomIds {
    fn default() -> Self {
        Self::new()
    }
}

impl IdSource for RandomIds {
    fn next_id(&mut self) -> String {
        let millis = u64::try_from(Utc::now().timestamp_millis()).unwrap_or_default();
        let entropy: u64 = self.rng.r#gen();
        format!("{}{}", to_base36(millis), to_base36(entropy))
    }
}

fn to_base36(mut value: u64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if value == 0 {
        return "0".to_string();
    }
    let mut buf = Vec::with_capacity(13);
    while value > 0 {
        buf.push(DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    buf.reverse();
    String::from_utf8(buf).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn sequential_ids_count_up() {
        let mut ids = SequentialIds::new("r");
        assert_eq!(ids.next_id(), "r-0");
        assert_eq!(ids.next_id(), "r-1");
    }

    #[test]
    fn base36_encodes_known_values() {
        assert_eq!(to_base36(0), "0");
        assert_eq!(to_base36(35), "z");
        assert_eq!(to_base36(36), "10");
    }

    #[test]
    fn random_ids_do_not_collide() {
        let mut ids = RandomIds::seeded(7);
        let seen: HashSet<String> = (0..500).map(|_| ids.next_id()).collect();
        assert_eq!(seen.len(), 500);
        assert!(seen.iter().all(|id| id.chars().all(|c| c.is_ascii_alphanumeric())));
    }
}
