use std::time::Duration;

use fray_core::operation::NemesisOperation;
use rand::{Rng, RngCore};
use tracing::debug;

use crate::selection::{select_indices, Selection};

const MIN_RUN_TIME: Duration = Duration::from_secs(1);
const MAX_RUN_TIME: Duration = Duration::from_secs(10);

fn random_run_time(rng: &mut dyn RngCore) -> Duration {
    Duration::from_millis(rng.gen_range(MIN_RUN_TIME.as_millis()..=MAX_RUN_TIME.as_millis()) as u64)
}

/// Produces one [`NemesisOperation`] slot per node for a dispatch cycle;
/// `None` at a position means that node is left untouched this cycle.
/// Ported from `randomKillGenerator`/`allKillGenerator` in
/// `original_source/pkg/nemesis/generator.go`, generalized over
/// [`Selection`] instead of one struct per subset size.
pub trait NemesisGenerator: Send + Sync {
    fn name(&self) -> String;

    fn generate(&self, nodes: &[String], rng: &mut dyn RngCore) -> Vec<Option<NemesisOperation>>;
}

/// Stops the database process on the selected nodes, then restarts it.
/// `invoke = stop-db`, `recover = start-db`.
pub struct KillGenerator {
    db: String,
    selection: Selection,
}

impl KillGenerator {
    pub fn new(db: impl Into<String>, selection: Selection) -> Self {
        Self { db: db.into(), selection }
    }
}

impl NemesisGenerator for KillGenerator {
    fn name(&self) -> String {
        format!("{}_kill", self.selection.label())
    }

    fn generate(&self, nodes: &[String], rng: &mut dyn RngCore) -> Vec<Option<NemesisOperation>> {
        let targets = select_indices(nodes.len(), self.selection, rng);
        debug!(generator = %self.name(), ?targets, "selected nemesis targets");
        let mut ops = vec![None; nodes.len()];
        for index in targets {
            ops[index] = Some(NemesisOperation::new(
                "kill",
                vec![self.db.clone()],
                vec![self.db.clone()],
                random_run_time(rng),
            ));
        }
        ops
    }
}

/// Partitions the selected nodes away from the rest of the cluster, then
/// heals the partition. `invoke = drop (iptables DROP between the two
/// sides)`, `recover = heal`.
pub struct DropGenerator {
    selection: Selection,
}

impl DropGenerator {
    pub fn new(selection: Selection) -> Self {
        Self { selection }
    }
}

impl NemesisGenerator for DropGenerator {
    fn name(&self) -> String {
        format!("{}_drop", self.selection.label())
    }

    fn generate(&self, nodes: &[String], rng: &mut dyn RngCore) -> Vec<Option<NemesisOperation>> {
        let targets = select_indices(nodes.len(), self.selection, rng);
        debug!(generator = %self.name(), ?targets, "selected nemesis targets");
        let other_side: Vec<String> = nodes
            .iter()
            .enumerate()
            .filter(|(i, _)| !targets.contains(i))
            .map(|(_, n)| n.clone())
            .collect();
        let run_time = random_run_time(rng);
        let mut ops = vec![None; nodes.len()];
        for index in targets {
            ops[index] = Some(NemesisOperation::new(
                "drop",
                other_side.clone(),
                Vec::new(),
                run_time,
            ));
        }
        ops
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn nodes(n: usize) -> Vec<String> {
        (1..=n).map(|i| format!("n{i}")).collect()
    }

    #[test]
    fn kill_generator_targets_exactly_the_selection_size() {
        let gen = KillGenerator::new("db", Selection::Major);
        let mut rng = StdRng::seed_from_u64(3);
        let ops = gen.generate(&nodes(5), &mut rng);
        assert_eq!(ops.iter().filter(|o| o.is_some()).count(), 3);
    }

    #[test]
    fn drop_generator_lists_the_other_side_as_args() {
        let gen = DropGenerator::new(Selection::Random);
        let mut rng = StdRng::seed_from_u64(3);
        let ns = nodes(5);
        let ops = gen.generate(&ns, &mut rng);
        let (targeted_index, op) = ops
            .iter()
            .enumerate()
            .find_map(|(i, o)| o.as_ref().map(|op| (i, op)))
            .expect("exactly one target");
        assert!(!op.invoke_args.contains(&ns[targeted_index]));
        assert_eq!(op.invoke_args.len(), 4);
    }

    #[test]
    fn run_time_is_within_one_to_ten_seconds() {
        let mut rng = StdRng::seed_from_u64(9);
        for _ in 0..100 {
            let rt = random_run_time(&mut rng);
            assert!(rt >= MIN_RUN_TIME && rt <= MAX_RUN_TIME);
        }
    }
}
