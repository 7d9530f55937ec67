//! Contabilidade de Recursos (Accounting)
//!
//! Rastreia o tempo de CPU consumido por cada tarefa. Os campos são atômicos
//! apenas para poderem ser lidos sem lock (estatísticas); toda escrita
//! acontece com o lock da runqueue da tarefa adquirido.

use core::sync::atomic::{AtomicU64, Ordering};

/// Estatísticas de execução de uma tarefa
#[derive(Debug, Default)]
pub struct ExecStats {
    /// Timestamp (relógio da runqueue, ns) do início da fatia atual.
    /// 0 depois de uma migração: a próxima escolha recalcula a base.
    exec_start: AtomicU64,

    /// Tempo total de CPU consumido (ns)
    sum_exec_runtime: AtomicU64,

    /// Maior delta contabilizado de uma vez
    exec_max: AtomicU64,

    /// Quantas vezes a tarefa trocou de CPU
    nr_migrations: AtomicU64,
}

impl ExecStats {
    pub const fn new() -> Self {
        Self {
            exec_start: AtomicU64::new(0),
            sum_exec_runtime: AtomicU64::new(0),
            exec_max: AtomicU64::new(0),
            nr_migrations: AtomicU64::new(0),
        }
    }

    pub fn exec_start(&self) -> u64 {
        self.exec_start.load(Ordering::Relaxed)
    }

    /// Registra o início da execução (chamado quando a task ganha a CPU)
    pub fn set_exec_start(&self, now: u64) {
        self.exec_start.store(now, Ordering::Relaxed);
    }

    pub fn sum_exec_runtime(&self) -> u64 {
        self.sum_exec_runtime.load(Ordering::Relaxed)
    }

    pub fn exec_max(&self) -> u64 {
        self.exec_max.load(Ordering::Relaxed)
    }

    pub fn nr_migrations(&self) -> u64 {
        self.nr_migrations.load(Ordering::Relaxed)
    }

    /// Contabiliza `delta` ns executados e abre nova fatia em `now`.
    pub fn charge(&self, delta: u64, now: u64) {
        self.exec_max.fetch_max(delta, Ordering::Relaxed);
        self.sum_exec_runtime.fetch_add(delta, Ordering::Relaxed);
        self.exec_start.store(now, Ordering::Relaxed);
    }

    pub(crate) fn note_migration(&self) {
        self.nr_migrations.fetch_add(1, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn charge_accumulates_and_tracks_peak() {
        let s = ExecStats::new();
        s.set_exec_start(100);
        s.charge(50, 150);
        s.charge(20, 170);
        assert_eq!(s.sum_exec_runtime(), 70);
        assert_eq!(s.exec_max(), 50);
        assert_eq!(s.exec_start(), 170);
    }
}
