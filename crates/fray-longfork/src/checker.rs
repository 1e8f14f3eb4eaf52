use std::collections::{BTreeMap, BTreeSet, HashMap};

use fray_core::operation::HistoryEntry;
use thiserror::Error;
use tracing::warn;

use crate::{LongForkRequest, LongForkResponse};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LongForkError {
    #[error("key {0} was written more than once")]
    MultipleWrites(u64),
}

/// A single successful read, keyed by its sorted key tuple so readings over
/// the same key-group land in the same bucket.
struct Reading {
    values: BTreeMap<u64, u64>,
}

impl Reading {
    /// The set of writes this reading observed as committed (a nonzero
    /// value at that key), per spec §4.5's "write `i` is visible to read
    /// `r`" definition.
    fn visible(&self) -> BTreeSet<u64> {
        self.values
            .iter()
            .filter(|(_, &v)| v != 0)
            .map(|(&k, _)| k)
            .collect()
    }
}

/// Checks a completed long-fork history for the anomaly described in spec
/// §4.5: two reads over the same key-group whose visible-write sets are
/// mutually inconsistent (neither a subset of the other), or two reads
/// disagreeing on a key's nonzero value.
///
/// Returns `Ok(true)` if no fork is found, `Ok(false)` if one is, and
/// `Err` if the history itself is malformed (the same key written twice).
pub fn check_long_fork(
    history: &[HistoryEntry<LongForkRequest, LongForkResponse>],
) -> Result<bool, LongForkError> {
    let mut calls: HashMap<u64, LongForkRequest> = HashMap::new();
    let mut written_keys: BTreeSet<u64> = BTreeSet::new();
    let mut buckets: BTreeMap<Vec<u64>, Vec<Reading>> = BTreeMap::new();

    for entry in history {
        match entry {
            HistoryEntry::Call { id, value } => {
                calls.insert(*id, value.clone());
            }
            HistoryEntry::Return { id, value } => {
                let Some(request) = calls.remove(id) else {
                    continue;
                };
                match request {
                    LongForkRequest::Write { key } => {
                        if value.ok && !value.unknown {
                            if !written_keys.insert(key) {
                                return Err(LongForkError::MultipleWrites(key));
                            }
                        }
                    }
                    LongForkRequest::Read { keys } => {
                        if value.unknown || !value.ok {
                            continue;
                        }
                        let mut sorted_keys = keys.clone();
                        sorted_keys.sort_unstable();
                        let values: BTreeMap<u64, u64> =
                            keys.iter().copied().zip(value.values.iter().copied()).collect();
                        buckets.entry(sorted_keys).or_default().push(Reading { values });
                    }
                }
            }
        }
    }

    for (group, readings) in &buckets {
        for i in 0..readings.len() {
            for j in (i + 1)..readings.len() {
                let a = &readings[i];
                let b = &readings[j];

                for (&key, &va) in &a.values {
                    if let Some(&vb) = b.values.get(&key) {
                        if va != 0 && vb != 0 && va != vb {
                            warn!(?group, key, va, vb, "disagreeing nonzero read values");
                            return Ok(false);
                        }
                    }
                }

                let visible_a = a.visible();
                let visible_b = b.visible();
                let only_a = !visible_a.is_subset(&visible_b);
                let only_b = !visible_b.is_subset(&visible_a);
                if only_a && only_b {
                    warn!(?group, "long fork detected");
                    return Ok(false);
                }
            }
        }
    }

    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(id: u64, value: LongForkRequest) -> HistoryEntry<LongForkRequest, LongForkResponse> {
        HistoryEntry::Call { id, value }
    }

    fn ret(id: u64, value: LongForkResponse) -> HistoryEntry<LongForkRequest, LongForkResponse> {
        HistoryEntry::Return { id, value }
    }

    fn read(keys: Vec<u64>) -> LongForkRequest {
        LongForkRequest::Read { keys }
    }

    #[test]
    fn prefix_relation_reads_are_not_a_fork() {
        let history = vec![
            call(0, read(vec![1, 2, 0])),
            call(1, read(vec![0, 1, 2])),
            call(2, read(vec![2, 1, 0])),
            ret(2, LongForkResponse::read(vec![2, 1, 0], vec![1, 1, 1])),
            ret(1, LongForkResponse::read(vec![0, 1, 2], vec![0, 0, 1])),
            ret(0, LongForkResponse::read(vec![1, 2, 0], vec![0, 1, 1])),
            call(3, read(vec![5, 4, 3])),
            call(4, read(vec![4, 3, 5])),
            call(5, read(vec![3, 4, 5])),
            call(6, read(vec![5, 3, 4])),
            ret(5, LongForkResponse::read(vec![3, 4, 5], vec![0, 0, 0])),
            ret(3, LongForkResponse::read(vec![5, 4, 3], vec![0, 0, 1])),
            ret(4, LongForkResponse::read(vec![4, 3, 5], vec![0, 1, 1])),
            ret(6, LongForkResponse::read(vec![5, 3, 4], vec![1, 1, 1])),
        ];
        assert_eq!(check_long_fork(&history), Ok(true));
    }

    #[test]
    fn crossing_visibility_sets_is_a_fork() {
        let history = vec![
            call(0, read(vec![1, 2, 0])),
            call(1, read(vec![0, 1, 2])),
            call(2, read(vec![2, 1, 0])),
            ret(2, LongForkResponse::read(vec![2, 1, 0], vec![1, 1, 1])),
            ret(1, LongForkResponse::read(vec![0, 1, 2], vec![0, 0, 1])),
            ret(0, LongForkResponse::read(vec![1, 2, 0], vec![1, 0, 0])),
        ];
        assert_eq!(check_long_fork(&history), Ok(false));
    }

    #[test]
    fn duplicate_successful_write_to_same_key_is_an_error() {
        let history = vec![
            call(0, LongForkRequest::Write { key: 7 }),
            call(1, LongForkRequest::Write { key: 7 }),
            ret(0, LongForkResponse::write_ok()),
            ret(1, LongForkResponse::write_ok()),
        ];
        assert_eq!(
            check_long_fork(&history),
            Err(LongForkError::MultipleWrites(7))
        );
    }
}
