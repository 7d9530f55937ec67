//! Contrato entre o núcleo e as classes de escalonamento
//!
//! Todo hook que recebe `rq` é chamado com o lock daquela runqueue
//! adquirido pelo núcleo. Hooks sem `rq` (fork, dead, select, migrate,
//! waking) não dependem de lock de runqueue.

use bitflags::bitflags;

use super::cpu::{CpuMask, Cpus};
use super::runqueue::{Rq, RqGuard};
use crate::sched::task::{ClassKind, TaskRef};
use crate::sys::CpuId;

bitflags! {
    /// Motivo de um enqueue
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct EnqueueFlags: u32 {
        /// Tarefa acordou
        const WAKEUP   = 1 << 0;
        /// Volta depois de um dequeue SAVE (troca de política)
        const RESTORE  = 1 << 1;
        /// Chegou por migração
        const MIGRATED = 1 << 2;
        /// Primeira vez runnable (fork)
        const NEW      = 1 << 3;
    }
}

bitflags! {
    /// Motivo de um dequeue
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct DequeueFlags: u32 {
        /// Tarefa vai dormir (ou morreu)
        const SLEEP     = 1 << 0;
        /// Troca de política: haverá um enqueue RESTORE em seguida
        const SAVE      = 1 << 1;
        /// Saindo por migração
        const MIGRATING = 1 << 2;
    }
}

bitflags! {
    /// Contexto de um wakeup
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct WakeFlags: u32 {
        const FORK     = 1 << 0;
        const SYNC     = 1 << 1;
        const MIGRATED = 1 << 2;
    }
}

/// Resultado de `pick_next_task`
#[derive(Debug)]
pub enum Pick {
    /// Rodar esta tarefa
    Task(TaskRef),
    /// O estado das filas mudou (ex.: tarefa puxada de outra CPU).
    /// O núcleo recomeça a escolha do topo da cadeia.
    Retry,
    /// Nada desta classe para rodar aqui
    Empty,
}

/// Uma classe de escalonamento.
///
/// Os hooks com implementação padrão são opcionais; uma classe só
/// sobrescreve o que usa.
pub trait SchedClass: Sync {
    /// Posição na cadeia
    fn kind(&self) -> ClassKind;

    fn name(&self) -> &'static str {
        self.kind().name()
    }

    fn enqueue_task(&self, rq: &mut Rq, p: &TaskRef, flags: EnqueueFlags);

    fn dequeue_task(&self, rq: &mut Rq, p: &TaskRef, flags: DequeueFlags);

    fn yield_task(&self, _rq: &mut Rq) {}

    /// Retorna true se a CPU deve reescalonar em favor de `p`
    fn yield_to_task(&self, _rq: &mut Rq, _p: &TaskRef) -> bool {
        false
    }

    /// `p` ficou runnable e é da mesma classe que a corrente
    fn check_preempt_curr(&self, _rq: &mut Rq, _p: &TaskRef, _flags: WakeFlags) {}

    /// Recebe o guard (e não só a `Rq`) porque uma classe pode precisar
    /// soltar e readquirir o lock local para travar outra runqueue.
    fn pick_next_task(&self, cpus: &Cpus, rq: &mut RqGuard<'_>) -> Pick;

    /// `prev` está deixando a CPU (continua runnable ou não)
    fn put_prev_task(&self, _rq: &mut Rq, _prev: &TaskRef) {}

    /// A corrente passou a ser desta classe sem passar por `pick`
    fn set_curr_task(&self, _rq: &mut Rq) {}

    fn task_tick(&self, _rq: &mut Rq, _curr: &TaskRef, _queued: bool) {}

    fn task_fork(&self, _p: &TaskRef) {}

    fn task_dead(&self, _p: &TaskRef) {}

    /// CPU onde `p` deve ficar runnable
    fn select_task_rq(&self, _cpus: &Cpus, _p: &TaskRef, prev_cpu: CpuId, _flags: WakeFlags) -> CpuId {
        prev_cpu
    }

    /// Chamado antes de `p` trocar de CPU
    fn migrate_task_rq(&self, _p: &TaskRef, _new_cpu: CpuId) {}

    fn rq_online(&self, _rq: &mut Rq) {}

    fn rq_offline(&self, _rq: &mut Rq) {}

    fn set_cpus_allowed(&self, _p: &TaskRef, _mask: CpuMask) {}

    /// `waker` está acordando `p` (chamado antes de escolher a CPU)
    fn task_waking(&self, _waker: Option<&TaskRef>, _p: &TaskRef, _jiffies: u64) {}

    fn task_woken(&self, _rq: &mut Rq, _p: &TaskRef) {}

    fn prio_changed(&self, _rq: &mut Rq, _p: &TaskRef, _old_prio: i32) {}

    fn switched_from(&self, _rq: &mut Rq, _p: &TaskRef) {}

    fn switched_to(&self, _rq: &mut Rq, _p: &TaskRef) {}

    /// Fatia de tempo (em ticks) de `p`; 0 = sem fatia fixa
    fn get_rr_interval(&self, _rq: &Rq, _p: &TaskRef) -> u32 {
        0
    }

    /// Contabiliza o tempo da tarefa corrente até agora
    fn update_curr(&self, _rq: &mut Rq) {}
}
