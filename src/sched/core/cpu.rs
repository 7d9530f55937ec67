//! Tabela de CPUs
//!
//! Um slot por CPU possível, criado uma vez. Bring-up/teardown só mudam o
//! estado online e validam a runqueue; nada é realocado.

use core::sync::atomic::{AtomicU32, AtomicU64, AtomicU8, Ordering};

use spin::Lazy;

use super::runqueue::{Rq, RqGuard};
use crate::sched::config::MAX_CPUS;
use crate::sched::task::ClassKind;
use crate::sync::{AtomicFlag, Spinlock};
use crate::sys::{CpuId, Errno};

/// Conjunto de CPUs (bit N = CPU N)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CpuMask(u64);

impl CpuMask {
    pub const NONE: CpuMask = CpuMask(0);
    pub const ALL: CpuMask = CpuMask(u64::MAX);

    pub const fn from_bits(bits: u64) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u64 {
        self.0
    }

    pub const fn of(cpu: CpuId) -> Self {
        Self(1 << cpu.as_u32())
    }

    pub const fn contains(self, cpu: CpuId) -> bool {
        cpu.index() < 64 && self.0 & (1 << cpu.as_u32()) != 0
    }

    pub const fn with(self, cpu: CpuId) -> Self {
        Self(self.0 | Self::of(cpu).0)
    }
}

/// Estado de uma CPU
pub struct CpuSlot {
    id: CpuId,
    online: AtomicFlag,
    /// Classe da tarefa em execução, publicada para leitura sem lock
    /// (admissão). Pode estar levemente atrasada.
    curr_class: AtomicU8,
    rq: Spinlock<Rq>,
}

impl CpuSlot {
    fn new(id: CpuId) -> Self {
        Self {
            id,
            online: AtomicFlag::new(false),
            curr_class: AtomicU8::new(ClassKind::None as u8),
            rq: Spinlock::new(Rq::new(id)),
        }
    }

    pub fn id(&self) -> CpuId {
        self.id
    }

    pub fn is_online(&self) -> bool {
        self.online.get()
    }

    pub fn rq(&self) -> &Spinlock<Rq> {
        &self.rq
    }

    pub fn lock_rq(&self) -> RqGuard<'_> {
        self.rq.lock()
    }

    pub fn curr_class(&self) -> ClassKind {
        ClassKind::from_u8(self.curr_class.load(Ordering::Acquire))
    }

    pub(crate) fn publish_curr(&self, kind: ClassKind) {
        self.curr_class.store(kind as u8, Ordering::Release);
    }
}

/// Tabela de CPUs do sistema
pub struct Cpus {
    slots: [CpuSlot; MAX_CPUS],
    /// Maior id online + 1
    nr_cpu_ids: AtomicU32,
    /// Ticks desde o boot (avançado pelo tick da BSP)
    jiffies: AtomicU64,
}

impl Cpus {
    pub fn new() -> Self {
        Self {
            slots: core::array::from_fn(|i| CpuSlot::new(CpuId::new(i as u32))),
            nr_cpu_ids: AtomicU32::new(0),
            jiffies: AtomicU64::new(0),
        }
    }

    pub fn slot(&self, cpu: CpuId) -> Option<&CpuSlot> {
        self.slots.get(cpu.index())
    }

    /// Slot de uma CPU online
    pub fn online_slot(&self, cpu: CpuId) -> Result<&CpuSlot, Errno> {
        match self.slot(cpu) {
            Some(slot) if slot.is_online() => Ok(slot),
            _ => Err(Errno::ENODEV),
        }
    }

    /// Lock da runqueue de `cpu`. `cpu` precisa ser < MAX_CPUS.
    pub fn rq(&self, cpu: CpuId) -> &Spinlock<Rq> {
        &self.slots[cpu.index()].rq
    }

    /// Todas as CPUs possíveis, em ordem crescente
    pub fn possible(&self) -> impl Iterator<Item = &CpuSlot> {
        self.slots.iter()
    }

    /// CPUs online, em ordem crescente de id
    pub fn online(&self) -> impl Iterator<Item = CpuId> + '_ {
        self.slots.iter().filter(|s| s.is_online()).map(|s| s.id)
    }

    pub fn is_online(&self, cpu: CpuId) -> bool {
        self.slot(cpu).map_or(false, |s| s.is_online())
    }

    pub fn nr_online(&self) -> usize {
        self.online().count()
    }

    /// Tamanho do espaço de ids (maior id online + 1)
    pub fn nr_cpu_ids(&self) -> u32 {
        self.nr_cpu_ids.load(Ordering::Acquire)
    }

    pub fn jiffies(&self) -> u64 {
        self.jiffies.load(Ordering::Relaxed)
    }

    pub(crate) fn tick_jiffies(&self) -> u64 {
        self.jiffies.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Coloca a CPU online. A runqueue começa vazia, sem tarefa corrente.
    pub fn bringup(&self, cpu: CpuId) -> Result<(), Errno> {
        let slot = self.slot(cpu).ok_or(Errno::ENODEV)?;

        let mut rq = slot.rq.lock();
        if slot.online.test_and_set() {
            return Err(Errno::EALREADY);
        }
        rq.set_curr(None);
        slot.publish_curr(ClassKind::None);
        drop(rq);

        self.recompute_nr_cpu_ids();
        crate::kinfo!("(Sched) CPU online:", cpu.as_u32());
        Ok(())
    }

    /// Tira a CPU do ar. Recusado enquanto houver tarefas enfileiradas.
    pub fn teardown(&self, cpu: CpuId) -> Result<(), Errno> {
        let slot = self.online_slot(cpu)?;

        let mut rq = slot.rq.lock();
        if rq.nr_running() > 0 || !rq.opp().is_empty() {
            crate::kwarn!("(Sched) teardown recusado, tarefas na CPU:", cpu.as_u32());
            return Err(Errno::EBUSY);
        }
        slot.online.set(false);
        rq.set_curr(None);
        slot.publish_curr(ClassKind::None);
        drop(rq);

        self.recompute_nr_cpu_ids();
        crate::kinfo!("(Sched) CPU offline:", cpu.as_u32());
        Ok(())
    }

    fn recompute_nr_cpu_ids(&self) {
        let nr = self.online().last().map_or(0, |c| c.as_u32() + 1);
        self.nr_cpu_ids.store(nr, Ordering::Release);
    }
}

impl Default for Cpus {
    fn default() -> Self {
        Self::new()
    }
}

/// Tabela global do kernel
pub static CPUS: Lazy<Cpus> = Lazy::new(Cpus::new);
