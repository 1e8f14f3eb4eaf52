use anyhow::Result;

/// Injects and recovers a fault against one node of the cluster. The
/// controller's nemesis dispatcher round-robins across the nodes,
/// `start`ing a fault, sleeping, then `stop`ping it before moving to the
/// next dispatch cycle.
pub trait Nemesis: Send + Sync {
    fn name(&self) -> &str;

    fn start(&self, node: &str, args: &[String]) -> Result<()>;

    fn stop(&self, node: &str, args: &[String]) -> Result<()>;
}

/// A nemesis that does nothing; the default registration and the fixture
/// used by scenarios that only need to exercise the controller's dispatch
/// loop, not a real fault.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopNemesis;

impl Nemesis for NoopNemesis {
    fn name(&self) -> &str {
        "noop"
    }

    fn start(&self, _node: &str, _args: &[String]) -> Result<()> {
        Ok(())
    }

    fn stop(&self, _node: &str, _args: &[String]) -> Result<()> {
        Ok(())
    }
}
