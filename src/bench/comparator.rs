//! Multiset Comparator - order-insensitive bucket equality
//!
//! Both sides must be normalized (sorted) first. Equality is then a
//! position-by-position match, which is exactly multiset equality per client.

use std::fmt;

use crate::core_types::{BucketSet, ClientId};

/// First difference found between expected and actual buckets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mismatch {
    ClientCount {
        expected: u32,
        actual: u32,
    },
    Count {
        client: ClientId,
        expected: usize,
        actual: usize,
    },
    Payload {
        client: ClientId,
        position: usize,
        expected: String,
        actual: String,
    },
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mismatch::ClientCount { expected, actual } => {
                write!(f, "expected {} clients, output covers {}", expected, actual)
            }
            Mismatch::Count {
                client,
                expected,
                actual,
            } => write!(
                f,
                "client {} should receive {} messages but received {}",
                client, expected, actual
            ),
            Mismatch::Payload {
                client,
                position,
                expected,
                actual,
            } => write!(
                f,
                "client {} sorted message #{} differs\n  expected: {}\n  got:      {}",
                client,
                position + 1,
                expected,
                actual
            ),
        }
    }
}

/// Locate the first client whose bucket differs.
///
/// Counts are checked before contents, so a dropped message is reported as
/// a count difference rather than a shifted payload.
pub fn first_mismatch(expected: &BucketSet, actual: &BucketSet) -> Option<Mismatch> {
    if expected.client_count() != actual.client_count() {
        return Some(Mismatch::ClientCount {
            expected: expected.client_count(),
            actual: actual.client_count(),
        });
    }

    for (client, want) in expected.iter() {
        let got = actual.bucket(client);
        if want.len() != got.len() {
            return Some(Mismatch::Count {
                client,
                expected: want.len(),
                actual: got.len(),
            });
        }
        if let Some((position, (w, g))) = want
            .iter()
            .zip(got.iter())
            .enumerate()
            .find(|(_, (w, g))| w != g)
        {
            return Some(Mismatch::Payload {
                client,
                position,
                expected: w.clone(),
                actual: g.clone(),
            });
        }
    }
    None
}

/// Multiset equality of two normalized bucket sets.
pub fn compare(expected: &BucketSet, actual: &BucketSet) -> bool {
    first_mismatch(expected, actual).is_none()
}
