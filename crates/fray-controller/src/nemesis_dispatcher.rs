use std::sync::Arc;

use fray_core::operation::NemesisOperation;
use fray_core::CancelToken;
use fray_nemesis::NemesisGenerator;
use fray_registry::Registry;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, error};

/// Round-robins the configured nemesis generators for the lifetime of the
/// whole run (started once, before the first round, and left running across
/// every round), dispatching one [`NemesisOperation`] per node per cycle and
/// waiting for every targeted node's fault to recover before starting the
/// next generator's cycle.
///
/// Ported from `dispatchNemesis`/`onNemesisLoop` in
/// `original_source/pkg/control/control.go`; the original drives the same
/// generator against the cluster in an unbroken `for` loop until its
/// `context.Context` is cancelled, which this mirrors with `run_token`.
pub(crate) async fn run(
    nodes: Vec<String>,
    registry: Arc<Registry>,
    generators: Vec<Box<dyn NemesisGenerator>>,
    run_token: CancelToken,
) {
    if generators.is_empty() {
        return;
    }

    debug!("begin to run nemesis");
    let mut rng = StdRng::from_entropy();

    'cycles: loop {
        for generator in &generators {
            if run_token.is_cancelled() {
                break 'cycles;
            }

            let ops = generator.generate(&nodes, &mut rng);
            debug!(generator = %generator.name(), "dispatching nemesis cycle");

            let mut handles = Vec::new();
            for (index, op) in ops.into_iter().enumerate() {
                let Some(op) = op else { continue };
                let node = nodes[index].clone();
                let registry = registry.clone();
                let run_token = run_token.clone();
                handles.push(tokio::spawn(async move {
                    run_one(&registry, &node, op, &run_token).await;
                }));
            }
            for handle in handles {
                let _ = handle.await;
            }
        }
    }
    debug!("stop running nemesis");
}

async fn run_one(registry: &Registry, node: &str, op: NemesisOperation, run_token: &CancelToken) {
    let nemesis = match registry.get_nemesis(&op.name) {
        Ok(nemesis) => nemesis,
        Err(err) => {
            error!(nemesis = %op.name, %err, "no such nemesis registered");
            return;
        }
    };

    debug!(node, nemesis = %op.name, invoke_args = ?op.invoke_args, "start nemesis");
    if let Err(err) = nemesis.start(node, &op.invoke_args) {
        error!(node, nemesis = %op.name, %err, "nemesis start failed");
    }

    tokio::select! {
        _ = tokio::time::sleep(op.run_time) => {}
        _ = run_token.cancelled() => {}
    }

    debug!(node, nemesis = %op.name, recover_args = ?op.recover_args, "stop nemesis");
    if let Err(err) = nemesis.stop(node, &op.recover_args) {
        error!(node, nemesis = %op.name, %err, "nemesis stop failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fray_core::nemesis::Nemesis;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct CountingNemesis {
        name: String,
        starts: Arc<AtomicUsize>,
        stops: Arc<AtomicUsize>,
    }

    impl Nemesis for CountingNemesis {
        fn name(&self) -> &str {
            &self.name
        }

        fn start(&self, _node: &str, _args: &[String]) -> anyhow::Result<()> {
            self.starts.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn stop(&self, _node: &str, _args: &[String]) -> anyhow::Result<()> {
            self.stops.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct OneShotGenerator {
        dispatched: Arc<AtomicUsize>,
    }

    impl NemesisGenerator for OneShotGenerator {
        fn name(&self) -> String {
            "one-shot".to_string()
        }

        fn generate(
            &self,
            nodes: &[String],
            _rng: &mut dyn rand::RngCore,
        ) -> Vec<Option<NemesisOperation>> {
            self.dispatched.fetch_add(1, Ordering::SeqCst);
            vec![
                Some(NemesisOperation::new(
                    "counting",
                    vec![],
                    vec![],
                    Duration::from_millis(1),
                ));
                nodes.len()
            ]
        }
    }

    #[tokio::test]
    async fn dispatches_until_cancelled_and_always_recovers() {
        let starts = Arc::new(AtomicUsize::new(0));
        let stops = Arc::new(AtomicUsize::new(0));
        let dispatched = Arc::new(AtomicUsize::new(0));

        let mut registry = Registry::new();
        registry
            .register_nemesis(Arc::new(CountingNemesis {
                name: "counting".to_string(),
                starts: starts.clone(),
                stops: stops.clone(),
            }))
            .unwrap();

        let run_token = CancelToken::new();
        let nodes = vec!["n1".to_string(), "n2".to_string()];
        let registry = Arc::new(registry);
        let generators: Vec<Box<dyn NemesisGenerator>> =
            vec![Box::new(OneShotGenerator { dispatched: dispatched.clone() })];

        let handle = tokio::spawn(run(nodes, registry, generators, run_token.clone()));
        tokio::time::sleep(Duration::from_millis(20)).await;
        run_token.cancel();
        handle.await.unwrap();

        assert!(dispatched.load(Ordering::SeqCst) > 0);
        assert_eq!(starts.load(Ordering::SeqCst), stops.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn empty_generator_list_returns_immediately() {
        let registry = Arc::new(Registry::new());
        let run_token = CancelToken::new();
        run(vec!["n1".to_string()], registry, Vec::new(), run_token).await;
    }
}
