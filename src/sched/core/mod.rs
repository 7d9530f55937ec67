//! Núcleo hospedeiro do escalonador
//!
//! O mínimo de um escalonador multi-classe: runqueue por CPU, tabela de
//! CPUs, o contrato `SchedClass`, a cadeia de classes, a classe idle e o
//! dispatcher.

pub mod chain;
pub mod class;
pub mod cpu;
pub mod debug;
pub mod idle;
pub mod runqueue;
pub mod scheduler;

pub use chain::ClassChain;
pub use class::{DequeueFlags, EnqueueFlags, Pick, SchedClass, WakeFlags};
pub use cpu::{CpuMask, CpuSlot, Cpus, CPUS};
pub use idle::{IdleClass, IDLE_CLASS};
pub use runqueue::{Rq, RqGuard};
pub use scheduler::{init, Scheduler};
