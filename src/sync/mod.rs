//! # Synchronization Primitives
//!
//! Primitivas de sincronização usadas pelo escalonador em ambiente SMP.
//!
//! ## Hierarquia de Uso
//!
//! ```text
//! Spinlock    → Seções críticas curtas (não pode dormir). Lock de runqueue.
//! AtomicFlag  → Estado publicado sem lock (CPU online)
//! AtomicCounter → Contadores globais (PIDs)
//! ```
//!
//! ## Regras
//!
//! - **Spinlock**: Único lock do hot path. Nunca dormir segurando um.
//! - **Ordem de Lock**: Locks de runqueue SEMPRE em ordem crescente de CPU.
//!   Use `SpinlockGuard::double_lock` em vez de dois `lock()` soltos.

// =============================================================================
// PRIMITIVAS BÁSICAS
// =============================================================================

/// Operações atômicas
pub mod atomic;

/// Spinlock (busy-wait, não dorme)
pub mod spinlock;

// =============================================================================
// RE-EXPORTS
// =============================================================================

pub use atomic::{AtomicCounter, AtomicFlag};
pub use spinlock::{Spinlock, SpinlockGuard};
