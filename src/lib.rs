//! Forge Oppsched Library.
//!
//! Classe de escalonamento oportunista do Forge: roda tarefas de fundo
//! apenas quando o sistema está ocioso ou pouco carregado.
//!
//! Define a estrutura hierárquica do subsistema:
//! - `klib`  : log, rate limit e framework de self-test
//! - `sync`  : Spinlock (com double lock ordenado) e atômicos
//! - `sys`   : tipos fundamentais e códigos de erro
//! - `sched` : núcleo hospedeiro (Rq, CPUs, cadeia de classes) e a classe oportunista

#![cfg_attr(not(test), no_std)]

// Habilitar alocação dinâmica (necessário para VecDeque/Arc/Vec)
extern crate alloc;

// --- Utilitários (precisam vir primeiro por causa dos macros) ---
#[macro_use]
pub mod klib; // Logging, RateLimit, TestCase

// --- Primitivas ---
pub mod sync; // Spinlock, AtomicCounter
pub mod sys; // Pid, CpuId, Errno

// --- Subsistema ---
pub mod sched; // Escalonador multi-classe + classe oportunista

pub use sched::core::{Cpus, Rq, Scheduler};
pub use sched::opportunistic::OpportunisticClass;
pub use sched::task::{Task, TaskRef};
pub use sys::{CpuId, Errno, Pid};
