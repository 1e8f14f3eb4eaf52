use fray_core::model::Model;

/// A model with no state and no requests: `step` always admits, `equal`
/// always holds. Ported from `NoopModel` in `original_source/pkg/core`,
/// used the way `fray-core::db::NoopDb` and `fray-core::nemesis::NoopNemesis`
/// are used — a harmless default `Model` for a workload that has none of
/// its own, or for exercising `fray-checker`'s search on a trivial input.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopModel;

impl Model for NoopModel {
    type State = ();
    type Request = ();
    type Response = ();

    fn init(&self) -> Self::State {}

    fn step(&self, _state: &(), _input: &(), _output: &()) -> Option<Self::State> {
        Some(())
    }

    fn equal(&self, _a: &(), _b: &()) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_step_is_admissible() {
        let model = NoopModel;
        assert_eq!(model.step(&(), &(), &()), Some(()));
    }
}
