use anyhow::Result;

/// Sets up and tears down the database under test on one node.
pub trait Db: Send + Sync {
    fn name(&self) -> &str;

    fn set_up(&self, node: &str) -> Result<()>;

    fn tear_down(&self, node: &str) -> Result<()>;
}

/// A `Db` that does nothing; the default registration in `fray-registry`
/// and the fixture `fray-testkit` drives in smoke tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopDb;

impl Db for NoopDb {
    fn name(&self) -> &str {
        "noop"
    }

    fn set_up(&self, _node: &str) -> Result<()> {
        Ok(())
    }

    fn tear_down(&self, _node: &str) -> Result<()> {
        Ok(())
    }
}
