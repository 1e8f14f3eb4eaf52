//! Sequential specifications ("models" in the Porcupine sense) used by
//! [`fray_checker::check`]. Each model is a small, pure `(init, step, equal)`
//! triple over its own request/response/state types — no shared `dyn Any`.

pub mod cas_register;
pub mod noop;
pub mod register;

pub use cas_register::{CasRegisterModel, CasRegisterParser, CasRegisterRequest, CasRegisterResponse};
pub use noop::NoopModel;
pub use register::{RegisterModel, RegisterParser, RegisterRequest, RegisterResponse};
