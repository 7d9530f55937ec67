//! Runqueue por CPU
//!
//! Estado local de uma CPU protegido pelo seu lock: relógio, tarefa
//! corrente, pedido de reescalonamento e as filas das classes que guardam
//! estado por CPU (aqui, só a oportunista).

use alloc::sync::Arc;

use super::class::{DequeueFlags, EnqueueFlags, SchedClass, WakeFlags};
use crate::sched::opportunistic::OppRq;
use crate::sched::task::{Task, TaskRef};
use crate::sync::SpinlockGuard;
use crate::sys::CpuId;

pub type RqGuard<'a> = SpinlockGuard<'a, Rq>;

pub struct Rq {
    cpu: CpuId,
    /// Relógio de tarefas (ns), avançado pelo tick
    clock_task: u64,
    curr: Option<TaskRef>,
    idle: TaskRef,
    need_resched: bool,
    /// Tarefas enfileiradas em qualquer classe
    nr_running: usize,
    pub(crate) opp: OppRq,
}

impl Rq {
    pub fn new(cpu: CpuId) -> Self {
        Self {
            cpu,
            clock_task: 0,
            curr: None,
            idle: Task::new_idle(cpu),
            need_resched: false,
            nr_running: 0,
            opp: OppRq::new(cpu),
        }
    }

    pub fn cpu(&self) -> CpuId {
        self.cpu
    }

    pub fn clock_task(&self) -> u64 {
        self.clock_task
    }

    /// Avança o relógio. O valor pode voltar no tempo (fonte instável); as
    /// classes tratam delta <= 0 como "nada a contabilizar".
    pub fn update_clock(&mut self, now: u64) {
        self.clock_task = now;
    }

    pub fn curr(&self) -> Option<&TaskRef> {
        self.curr.as_ref()
    }

    pub fn is_curr(&self, p: &TaskRef) -> bool {
        self.curr.as_ref().map_or(false, |c| Arc::ptr_eq(c, p))
    }

    pub(crate) fn set_curr(&mut self, p: Option<TaskRef>) {
        self.curr = p;
    }

    pub fn idle(&self) -> &TaskRef {
        &self.idle
    }

    /// Pede que a CPU chame `schedule` na próxima oportunidade
    pub fn resched_curr(&mut self) {
        self.need_resched = true;
    }

    pub fn need_resched(&self) -> bool {
        self.need_resched
    }

    pub(crate) fn clear_resched(&mut self) {
        self.need_resched = false;
    }

    pub fn nr_running(&self) -> usize {
        self.nr_running
    }

    pub fn opp(&self) -> &OppRq {
        &self.opp
    }
}

// =============================================================================
// OPERAÇÕES GENÉRICAS (usadas pelo dispatcher e pelo balanceador)
// =============================================================================

/// Torna `p` runnable em `rq` pela sua classe
pub fn activate_task(rq: &mut Rq, class: &dyn SchedClass, p: &TaskRef, flags: EnqueueFlags) {
    if p.on_rq() {
        crate::kwarn!("(Sched) activate de tarefa ja runnable, PID:", p.pid().as_u32());
        return;
    }
    class.enqueue_task(rq, p, flags);
    p.set_on_rq(true);
    rq.nr_running += 1;
}

/// Retira `p` de `rq`
pub fn deactivate_task(rq: &mut Rq, class: &dyn SchedClass, p: &TaskRef, flags: DequeueFlags) {
    if !p.on_rq() {
        return;
    }
    class.dequeue_task(rq, p, flags);
    p.set_on_rq(false);
    rq.nr_running = rq.nr_running.saturating_sub(1);
}

/// Troca a CPU dona de `p`. Quem chama segura o lock das duas runqueues
/// (ou a tarefa não está em nenhuma).
pub fn set_task_cpu(class: &dyn SchedClass, p: &TaskRef, new_cpu: CpuId) {
    if p.cpu() == new_cpu {
        return;
    }
    class.migrate_task_rq(p, new_cpu);
    p.set_cpu(new_cpu);
    p.stats.note_migration();
}

/// `p` acabou de ficar runnable em `rq`: preempta a corrente se for de uma
/// classe mais importante. Na mesma classe, quem decide é a classe.
pub fn check_preempt_curr(rq: &mut Rq, class: &dyn SchedClass, p: &TaskRef, flags: WakeFlags) {
    let curr_kind = match rq.curr() {
        Some(curr) => curr.class(),
        None => {
            rq.resched_curr();
            return;
        }
    };

    let kind = p.class();
    if kind == curr_kind {
        class.check_preempt_curr(rq, p, flags);
    } else if kind.outranks(curr_kind) {
        rq.resched_curr();
    }
}
