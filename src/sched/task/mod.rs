//! Task management module
//!
//! A `Task` pertence ao kernel hospedeiro; o escalonador só guarda handles
//! (`TaskRef`) e mexe nos campos de escalonamento com o lock da runqueue
//! correspondente adquirido.

pub mod accounting;
pub mod entity;
pub mod policy;
pub mod wakee;

pub use accounting::ExecStats;
pub use entity::{Task, TaskRef};
pub use policy::{class_for, ClassKind, SchedPolicy};
pub use wakee::WakeeStats;
