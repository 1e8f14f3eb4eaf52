/// A sequential specification for a workload: given a state and a
/// `call`/`return` pair, says whether that transition is admissible and,
/// if so, what state it leaves behind.
///
/// Kept generic over associated types rather than `Box<dyn Any>` so each
/// workload (`fray-bank`, `fray-longfork`, `fray-models`'s register) gets
/// its own concrete `Request`/`Response`/`State` triple and the checker
/// never downcasts.
pub trait Model: Clone {
    type State: Clone;
    type Request: Clone;
    type Response: Clone;

    /// The state a fresh run of this workload starts in.
    fn init(&self) -> Self::State;

    /// Returns the successor state if `(input, output)` is a legal
    /// transition from `state`, or `None` if it is not — the Rust
    /// equivalent of Porcupine's `(bool, state)` step return.
    fn step(
        &self,
        state: &Self::State,
        input: &Self::Request,
        output: &Self::Response,
    ) -> Option<Self::State>;

    /// Equivalence used to collapse states reached by different
    /// linearizations during the search. Defaults to structural equality;
    /// override when two syntactically different states represent the
    /// same observable history (the checker's memoization depends on this
    /// being a true equivalence, not just `==` on the wire encoding).
    fn equal(&self, a: &Self::State, b: &Self::State) -> bool;
}
