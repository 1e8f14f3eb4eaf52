use std::sync::Mutex;

use fray_core::nemesis::Nemesis;

/// Records every `start`/`stop` call it receives instead of touching a real
/// cluster — lets a scenario test assert the nemesis dispatcher actually
/// ran without depending on timing.
pub struct ScriptedNemesis {
    name: String,
    events: Mutex<Vec<String>>,
}

impl ScriptedNemesis {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), events: Mutex::new(Vec::new()) }
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().expect("scripted nemesis mutex poisoned").clone()
    }
}

impl Nemesis for ScriptedNemesis {
    fn name(&self) -> &str {
        &self.name
    }

    fn start(&self, node: &str, args: &[String]) -> anyhow::Result<()> {
        self.events
            .lock()
            .expect("scripted nemesis mutex poisoned")
            .push(format!("start:{node}:{args:?}"));
        Ok(())
    }

    fn stop(&self, node: &str, args: &[String]) -> anyhow::Result<()> {
        self.events
            .lock()
            .expect("scripted nemesis mutex poisoned")
            .push(format!("stop:{node}:{args:?}"));
        Ok(())
    }
}
