//! System Definitions.
//!
//! Tipos e códigos de erro compartilhados entre o escalonador e o kernel
//! hospedeiro.

pub mod error;
pub mod types;

pub use error::Errno;
pub use types::{CpuId, Pid};
