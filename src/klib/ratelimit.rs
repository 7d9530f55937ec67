//! Rate limit para diagnósticos do hot path.
//!
//! Permite até `burst` eventos por janela de `interval` unidades de tempo
//! (a mesma base do relógio passado em `allow`). Eventos excedentes são
//! contados em `missed` e descartados.
//!
//! Lock-free: pode ser consultado de qualquer CPU ao mesmo tempo. As corridas
//! entre CPUs só afetam a exatidão do limite, nunca a segurança.

use core::sync::atomic::{AtomicU32, AtomicU64, Ordering};

pub struct RateLimit {
    interval: u64,
    burst: u32,
    /// Início da janela atual + 1 (0 = nenhuma janela aberta ainda)
    window: AtomicU64,
    printed: AtomicU32,
    missed: AtomicU32,
}

impl RateLimit {
    /// `interval == 0` desliga o limite (tudo passa).
    pub const fn new(interval: u64, burst: u32) -> Self {
        Self {
            interval,
            burst,
            window: AtomicU64::new(0),
            printed: AtomicU32::new(0),
            missed: AtomicU32::new(0),
        }
    }

    /// Retorna true se o evento em `now` pode ser emitido.
    pub fn allow(&self, now: u64) -> bool {
        if self.interval == 0 {
            return true;
        }

        let window = self.window.load(Ordering::Relaxed);
        let expired = match window.checked_sub(1) {
            None => true,
            // Relógio voltou no tempo? Abre janela nova.
            Some(start) if now < start => true,
            Some(start) => now - start >= self.interval,
        };

        if expired
            && self
                .window
                .compare_exchange(
                    window,
                    now.saturating_add(1),
                    Ordering::AcqRel,
                    Ordering::Relaxed,
                )
                .is_ok()
        {
            self.printed.store(0, Ordering::Relaxed);
        }

        if self.printed.fetch_add(1, Ordering::Relaxed) < self.burst {
            true
        } else {
            self.missed.fetch_add(1, Ordering::Relaxed);
            false
        }
    }

    /// Eventos descartados desde a criação
    pub fn missed(&self) -> u32 {
        self.missed.load(Ordering::Relaxed)
    }
}
