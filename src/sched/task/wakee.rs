//! Wakee flips: quantas tarefas diferentes uma tarefa acorda.
//!
//! Uma tarefa que alterna entre muitos "acordados" diferentes tem contador
//! alto; o contador cai pela metade a cada `WAKEE_DECAY_TICKS` jiffies.
//! É só estatística (consumida por heurísticas de wake-affine), sem efeito
//! nas filas.

use core::sync::atomic::{AtomicU32, AtomicU64, Ordering};

use crate::sched::config::WAKEE_DECAY_TICKS;
use crate::sys::Pid;

/// Pid "nenhum" para `last_wakee`
const NO_WAKEE: u32 = u32::MAX;

#[derive(Debug)]
pub struct WakeeStats {
    last_wakee: AtomicU32,
    flips: AtomicU32,
    decay_ts: AtomicU64,
}

impl WakeeStats {
    pub const fn new() -> Self {
        Self {
            last_wakee: AtomicU32::new(NO_WAKEE),
            flips: AtomicU32::new(0),
            decay_ts: AtomicU64::new(0),
        }
    }

    pub fn flips(&self) -> u32 {
        self.flips.load(Ordering::Relaxed)
    }

    pub fn last_wakee(&self) -> Option<Pid> {
        match self.last_wakee.load(Ordering::Relaxed) {
            NO_WAKEE => None,
            raw => Some(Pid::new(raw)),
        }
    }

    /// Registra que o dono destas estatísticas acordou `wakee` em `jiffies`.
    pub fn record(&self, wakee: Pid, jiffies: u64) {
        // Decaimento grosseiro: perder um pouco na borda da janela não importa.
        if jiffies > self.decay_ts.load(Ordering::Relaxed) + WAKEE_DECAY_TICKS {
            let flips = self.flips.load(Ordering::Relaxed);
            self.flips.store(flips >> 1, Ordering::Relaxed);
            self.decay_ts.store(jiffies, Ordering::Relaxed);
        }

        if self.last_wakee.swap(wakee.as_u32(), Ordering::Relaxed) != wakee.as_u32() {
            self.flips.fetch_add(1, Ordering::Relaxed);
        }
    }
}

impl Default for WakeeStats {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flips_count_distinct_wakees_and_decay() {
        let w = WakeeStats::new();
        w.record(Pid::new(10), 1);
        w.record(Pid::new(10), 2);
        w.record(Pid::new(11), 3);
        w.record(Pid::new(12), 4);
        assert_eq!(w.flips(), 3);
        assert_eq!(w.last_wakee(), Some(Pid::new(12)));

        // Passou da janela: 3 >> 1 = 1, depois +1 pelo wakee novo
        w.record(Pid::new(13), 4 + WAKEE_DECAY_TICKS + 1);
        assert_eq!(w.flips(), 2);
    }
}
