//! Entidade oportunista embutida em cada `Task`

use core::sync::atomic::{AtomicU32, Ordering};

use crate::sched::config::OPP_QUANTUM;
use crate::sys::CpuId;

/// Valor de `queued_on` quando a tarefa não está em nenhuma fila
const NOT_QUEUED: u32 = u32::MAX;

/// Estado de escalonamento da classe oportunista.
///
/// Escrito apenas com o lock da runqueue dona da tarefa adquirido. O link
/// (`queued_on`) é o que garante que a tarefa está em no máximo uma fila.
#[derive(Debug)]
pub struct OppEntity {
    /// Ticks restantes da fatia atual
    remaining: AtomicU32,
    /// CPU cuja fila contém a tarefa
    queued_on: AtomicU32,
}

impl OppEntity {
    pub const fn new() -> Self {
        Self {
            remaining: AtomicU32::new(OPP_QUANTUM),
            queued_on: AtomicU32::new(NOT_QUEUED),
        }
    }

    pub fn remaining(&self) -> u32 {
        self.remaining.load(Ordering::Relaxed)
    }

    pub fn reset_quantum(&self) {
        self.remaining.store(OPP_QUANTUM, Ordering::Relaxed);
    }

    /// Consome um tick. Retorna quantos sobram (nunca passa de zero).
    pub fn tick(&self) -> u32 {
        let left = self.remaining().saturating_sub(1);
        self.remaining.store(left, Ordering::Relaxed);
        left
    }

    /// Fila que contém a tarefa, se alguma
    pub fn queued_on(&self) -> Option<CpuId> {
        match self.queued_on.load(Ordering::Relaxed) {
            NOT_QUEUED => None,
            cpu => Some(CpuId::new(cpu)),
        }
    }

    pub fn is_queued(&self) -> bool {
        self.queued_on().is_some()
    }

    pub(super) fn link(&self, cpu: CpuId) {
        self.queued_on.store(cpu.as_u32(), Ordering::Relaxed);
    }

    pub(super) fn unlink(&self) {
        self.queued_on.store(NOT_QUEUED, Ordering::Relaxed);
    }
}

impl Default for OppEntity {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tick_saturates_at_zero() {
        let e = OppEntity::new();
        for expected in (0..OPP_QUANTUM).rev() {
            assert_eq!(e.tick(), expected);
        }
        assert_eq!(e.tick(), 0);
        e.reset_quantum();
        assert_eq!(e.remaining(), OPP_QUANTUM);
    }

    #[test]
    fn link_records_owner_cpu() {
        let e = OppEntity::new();
        assert_eq!(e.queued_on(), None);
        e.link(CpuId::new(4));
        assert_eq!(e.queued_on(), Some(CpuId::new(4)));
        e.unlink();
        assert!(!e.is_queued());
    }
}
