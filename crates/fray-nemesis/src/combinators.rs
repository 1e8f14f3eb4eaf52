use std::time::Duration;

use rand::Rng;

/// Sleeps `Uniform[0, 2*dt]` before calling `gen`, giving the resulting
/// stream of calls a mean inter-call delay of `dt`. Ported from `Stagger`
/// in `original_source/pkg/generator/gen.go`; `gen` is async here rather
/// than a closure invoked after a blocking `time.Sleep`, since a worker
/// task must stay cancellable while it waits.
pub async fn stagger<R, F, T>(dt: Duration, rng: &mut R, gen: F) -> T
where
    R: Rng + ?Sized,
    F: FnOnce() -> T,
{
    let bound_millis = (2 * dt).as_millis().max(1) as u64;
    let delay = Duration::from_millis(rng.gen_range(0..bound_millis));
    tokio::time::sleep(delay).await;
    gen()
}

/// Binds the first `k1` logical threads to one generator, the next `k2` to
/// another, and so on, with any remainder falling through to `default`.
/// The source has no direct analogue captured in the retrieved pack excerpt
/// (spec §4.8); modeled here as an ordered list of `(count, value)` bands
/// looked up by thread index, matching how `Stagger` is a thin wrapper
/// rather than a stateful object — `Reserve` needs no state either, just a
/// deterministic band lookup.
pub struct Reserve<T> {
    bands: Vec<(usize, T)>,
    default: T,
}

impl<T> Reserve<T> {
    pub fn new(default: T, bands: Vec<(usize, T)>) -> Self {
        Self { bands, default }
    }

    /// Resolves the generator bound to a worker identified by `proc`
    /// modulo `node_count`, per spec §4.8's thread-index derivation.
    pub fn resolve(&self, proc: i64, node_count: usize) -> &T {
        if node_count == 0 {
            return &self.default;
        }
        let thread_index = proc.rem_euclid(node_count as i64) as usize;
        let mut offset = 0usize;
        for (count, value) in &self.bands {
            if thread_index < offset + count {
                return value;
            }
            offset += count;
        }
        &self.default
    }
}
