use rand::seq::SliceRandom;
use rand::RngCore;

/// Which subset of the node list a nemesis generator should target for one
/// dispatch cycle, per spec §4.7.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    /// Exactly 1 node, uniform.
    Random,
    /// `floor(n/2) - 1` nodes (may be zero).
    Minor,
    /// `floor(n/2) + 1` nodes.
    Major,
    /// All `n` nodes.
    All,
}

impl Selection {
    fn count(&self, n: usize) -> usize {
        match self {
            Selection::Random => 1.min(n),
            Selection::Minor => (n / 2).saturating_sub(1),
            Selection::Major => (n / 2 + 1).min(n),
            Selection::All => n,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Selection::Random => "random",
            Selection::Minor => "minor",
            Selection::Major => "major",
            Selection::All => "all",
        }
    }
}

/// Picks the indices this selection targets out of `n` nodes: a
/// Fisher-Yates shuffle of `0..n`, taking the first `count` entries.
pub fn select_indices(n: usize, selection: Selection, rng: &mut dyn RngCore) -> Vec<usize> {
    let count = selection.count(n);
    let mut indices: Vec<usize> = (0..n).collect();
    indices.shuffle(rng);
    indices.truncate(count);
    indices
}
