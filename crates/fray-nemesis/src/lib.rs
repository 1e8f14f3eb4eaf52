//! Nemesis generators and selection policy (spec §4.7) plus the `Stagger`
//! and `Reserve` request-timing combinators (spec §4.8).
//!
//! Grounded in `original_source/pkg/nemesis/generator.go`
//! (`randomKillGenerator`, `allKillGenerator`) and `pkg/generator/gen.go`
//! (`Stagger`).

pub mod combinators;
pub mod generators;
pub mod selection;

pub use combinators::{stagger, Reserve};
pub use generators::{DropGenerator, KillGenerator, NemesisGenerator};
pub use selection::Selection;
