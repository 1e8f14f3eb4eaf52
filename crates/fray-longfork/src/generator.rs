use std::collections::HashMap;
use std::sync::Mutex;

use rand::seq::SliceRandom;
use rand::Rng;

use crate::LongForkRequest;

/// Cross-worker coordination state for the long-fork workload: a
/// monotonic key allocator plus a map of "worker -> key it just wrote,
/// still waiting to be read back". Ported from the package-level `lfState`
/// in `original_source/db/tidb/long_fork.go`; guarded by a mutex rather
/// than Go's ad hoc `sync.Mutex` field, per spec §5's shared-state model.
#[derive(Default)]
pub struct LongForkState {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    next_key: u64,
    workers: HashMap<String, u64>,
}

impl LongForkState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Produces the next request for `node`: read back the key this node
    /// just wrote (if any), else with 50% odds read another worker's
    /// pending write, else allocate and write a fresh key. `group_size`
    /// keys are read together, all sharing the key's "group" (its value
    /// modulo `group_size`), per `makeKeysInGroup`.
    pub fn next_request<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        node: &str,
        group_size: u64,
    ) -> LongForkRequest {
        let mut inner = self.inner.lock().expect("long-fork state mutex poisoned");

        if let Some(key) = inner.workers.remove(node) {
            return LongForkRequest::Read { keys: keys_in_group(rng, group_size, key) };
        }

        if !inner.workers.is_empty() && rng.gen_bool(0.5) {
            let others: Vec<u64> = inner.workers.values().copied().collect();
            let key = *others.choose(rng).expect("non-empty others");
            return LongForkRequest::Read { keys: keys_in_group(rng, group_size, key) };
        }

        let key = inner.next_key;
        inner.next_key += 1;
        inner.workers.insert(node.to_string(), key);
        LongForkRequest::Write { key }
    }
}

fn keys_in_group<R: Rng + ?Sized>(rng: &mut R, group_size: u64, key: u64) -> Vec<u64> {
    let lower = key - key % group_size;
    let mut offsets: Vec<u64> = (0..group_size).collect();
    offsets.shuffle(rng);
    offsets.into_iter().map(|offset| lower + offset).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn keys_in_group_share_a_common_base() {
        let mut rng = StdRng::seed_from_u64(1);
        let keys = keys_in_group(&mut rng, 10, 23);
        let mut sorted = keys.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, vec![20, 21, 22, 23, 24, 25, 26, 27, 28, 29]);
    }

    #[test]
    fn worker_reads_back_its_own_write() {
        let state = LongForkState::new();
        let mut rng = StdRng::seed_from_u64(2);
        let req = state.next_request(&mut rng, "n1", 10);
        assert!(matches!(req, LongForkRequest::Write { .. }));
        let req = state.next_request(&mut rng, "n1", 10);
        assert!(matches!(req, LongForkRequest::Read { .. }));
    }
}
