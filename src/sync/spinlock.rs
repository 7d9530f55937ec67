//! Spinlock - bloqueio com busy-wait

use core::cell::UnsafeCell;
use core::ops::{Deref, DerefMut};
use core::sync::atomic::{AtomicBool, Ordering};

/// Spinlock - usa busy-wait, NÃO pode dormir
///
/// # Quando usar
///
/// - Seções críticas MUITO curtas
/// - Lock de runqueue (segurado pelo núcleo em todos os hooks de classe)
///
/// # Interrupções
///
/// Diferente do spinlock do kernel, este NÃO mexe em interrupções: quem
/// chama os hooks do escalonador (tick, dispatch) já está com elas
/// desabilitadas.
pub struct Spinlock<T> {
    locked: AtomicBool,
    data: UnsafeCell<T>,
}

// SAFETY: Spinlock protege acesso com lock atômico
unsafe impl<T: Send> Send for Spinlock<T> {}
unsafe impl<T: Send> Sync for Spinlock<T> {}

impl<T> Spinlock<T> {
    /// Cria novo spinlock
    pub const fn new(data: T) -> Self {
        Self {
            locked: AtomicBool::new(false),
            data: UnsafeCell::new(data),
        }
    }

    /// Adquire o lock
    pub fn lock(&self) -> SpinlockGuard<'_, T> {
        self.raw_lock();
        SpinlockGuard { lock: self }
    }

    /// Tenta adquirir sem bloquear
    pub fn try_lock(&self) -> Option<SpinlockGuard<'_, T>> {
        if self
            .locked
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_ok()
        {
            Some(SpinlockGuard { lock: self })
        } else {
            None
        }
    }

    /// Estado instantâneo (apenas para diagnóstico)
    pub fn is_locked(&self) -> bool {
        self.locked.load(Ordering::Relaxed)
    }

    fn raw_lock(&self) {
        // Spin até conseguir o lock
        while self
            .locked
            .compare_exchange_weak(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            // Hint para CPU que estamos em spin loop
            while self.locked.load(Ordering::Relaxed) {
                core::hint::spin_loop();
            }
        }
    }

    fn raw_unlock(&self) {
        self.locked.store(false, Ordering::Release);
    }
}

/// Guard do spinlock - libera ao sair do escopo
pub struct SpinlockGuard<'a, T> {
    lock: &'a Spinlock<T>,
}

impl<'a, T> SpinlockGuard<'a, T> {
    /// Adquire `other` mantendo `this`, respeitando a ordem global de locks.
    ///
    /// A ordem é dada por `this_order`/`other_order` (índice da CPU no caso das
    /// runqueues): o lock de menor ordem é sempre adquirido primeiro. Se
    /// `other` precede `this` e não está livre, `this` é solto, `other` é
    /// adquirido e `this` é readquirido em seguida.
    ///
    /// Retorna o guard de `other` e `true` se `this` foi solto no meio do
    /// caminho (o estado protegido por `this` pode ter mudado).
    ///
    /// `this_order` e `other_order` precisam ser diferentes.
    pub fn double_lock<'b, U>(
        this: &mut Self,
        this_order: usize,
        other: &'b Spinlock<U>,
        other_order: usize,
    ) -> (SpinlockGuard<'b, U>, bool) {
        debug_assert_ne!(this_order, other_order);

        if other_order > this_order {
            return (other.lock(), false);
        }

        // Caminho rápido: other livre, a ordem não importa
        if let Some(guard) = other.try_lock() {
            return (guard, false);
        }

        // `this` está emprestado mutavelmente durante toda a janela: nenhuma
        // referência para os dados de `this` sobrevive com o lock solto.
        this.lock.raw_unlock();
        let guard = other.lock();
        this.lock.raw_lock();
        (guard, true)
    }
}

impl<T> Deref for SpinlockGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        // SAFETY: Lock está adquirido
        unsafe { &*self.lock.data.get() }
    }
}

impl<T> DerefMut for SpinlockGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        // SAFETY: Lock está adquirido
        unsafe { &mut *self.lock.data.get() }
    }
}

impl<T> Drop for SpinlockGuard<'_, T> {
    fn drop(&mut self) {
        self.lock.raw_unlock();
    }
}
