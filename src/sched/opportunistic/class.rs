//! Classe oportunista: implementação de `SchedClass`

use alloc::sync::Arc;

use super::{accounting, admission, balance};
use crate::klib::RateLimit;
use crate::sched::config::{DIAG_RATELIMIT_BURST, DIAG_RATELIMIT_INTERVAL, OPP_QUANTUM};
use crate::sched::core::runqueue::check_preempt_curr;
use crate::sched::core::{
    CpuMask, Cpus, DequeueFlags, EnqueueFlags, Pick, Rq, RqGuard, SchedClass, WakeFlags,
};
use crate::sched::task::{ClassKind, TaskRef};
use crate::sys::CpuId;

/// Classe oportunista.
///
/// Sem estado próprio além do rate limit dos traces: filas e contadores
/// vivem em cada `Rq`, e o estado por tarefa em `Task::opp`.
pub struct OpportunisticClass {
    diag: RateLimit,
}

impl OpportunisticClass {
    pub const fn new() -> Self {
        Self {
            diag: RateLimit::new(DIAG_RATELIMIT_INTERVAL, DIAG_RATELIMIT_BURST),
        }
    }

    /// Rate limit dos traces do hot path
    pub(super) fn trace_allowed(&self, now: u64) -> bool {
        cfg!(feature = "log_trace") && self.diag.allow(now)
    }
}

impl Default for OpportunisticClass {
    fn default() -> Self {
        Self::new()
    }
}

/// Instância usada pelo kernel
pub static OPP_CLASS: OpportunisticClass = OpportunisticClass::new();

impl SchedClass for OpportunisticClass {
    fn kind(&self) -> ClassKind {
        ClassKind::Opportunistic
    }

    fn enqueue_task(&self, rq: &mut Rq, p: &TaskRef, _flags: EnqueueFlags) {
        if rq.opp.enqueue(p) && self.trace_allowed(rq.clock_task()) {
            crate::ktrace!("(Opp) enqueue PID:", p.pid().as_u32());
        }
    }

    fn dequeue_task(&self, rq: &mut Rq, p: &TaskRef, _flags: DequeueFlags) {
        accounting::update_curr(rq);
        if rq.opp.remove(p) && self.trace_allowed(rq.clock_task()) {
            crate::ktrace!("(Opp) dequeue PID:", p.pid().as_u32());
        }
    }

    fn yield_task(&self, _rq: &mut Rq) {}

    fn yield_to_task(&self, _rq: &mut Rq, _p: &TaskRef) -> bool {
        true
    }

    // Sem preempção dentro da classe: a corrente roda até o fim da fatia
    fn check_preempt_curr(&self, _rq: &mut Rq, _p: &TaskRef, _flags: WakeFlags) {}

    fn pick_next_task(&self, cpus: &Cpus, rq: &mut RqGuard<'_>) -> Pick {
        if rq.opp.is_empty() {
            if !admission::should_run(cpus) {
                rq.opp.stats.admission_denied += 1;
                return Pick::Empty;
            }
            if balance::pull_task(self, cpus, rq) {
                return Pick::Retry;
            }
            return Pick::Empty;
        }

        if !admission::should_run(cpus) {
            rq.opp.stats.admission_denied += 1;
            return Pick::Empty;
        }

        let now = rq.clock_task();
        let next = match rq.opp.head() {
            Some(p) => Arc::clone(p),
            None => return Pick::Empty,
        };
        next.stats.set_exec_start(now);
        rq.opp.stats.picks += 1;

        if self.trace_allowed(now) {
            crate::ktrace!("(Opp) pick PID:", next.pid().as_u32());
        }
        Pick::Task(next)
    }

    fn put_prev_task(&self, rq: &mut Rq, _prev: &TaskRef) {
        accounting::update_curr(rq);
    }

    fn set_curr_task(&self, rq: &mut Rq) {
        let now = rq.clock_task();
        if let Some(curr) = rq.curr() {
            curr.stats.set_exec_start(now);
        }
    }

    fn task_tick(&self, rq: &mut Rq, curr: &TaskRef, _queued: bool) {
        accounting::task_tick(rq, curr);
    }

    fn task_fork(&self, _p: &TaskRef) {}

    fn task_dead(&self, _p: &TaskRef) {}

    /// Round-robin entre CPUs, sem olhar carga nem afinidade
    fn select_task_rq(&self, cpus: &Cpus, _p: &TaskRef, prev_cpu: CpuId, _flags: WakeFlags) -> CpuId {
        match cpus.nr_cpu_ids() {
            0 => prev_cpu,
            nr => CpuId::new((prev_cpu.as_u32() + 1) % nr),
        }
    }

    /// A base de tempo da CPU nova não tem relação com a antiga
    fn migrate_task_rq(&self, p: &TaskRef, _new_cpu: CpuId) {
        p.stats.set_exec_start(0);
    }

    fn rq_online(&self, rq: &mut Rq) {
        crate::kdebug!("(Opp) runqueue online:", rq.cpu().as_u32());
    }

    fn rq_offline(&self, rq: &mut Rq) {
        crate::kdebug!("(Opp) runqueue offline:", rq.cpu().as_u32());
    }

    fn set_cpus_allowed(&self, _p: &TaskRef, _mask: CpuMask) {}

    fn task_waking(&self, waker: Option<&TaskRef>, p: &TaskRef, jiffies: u64) {
        if let Some(waker) = waker {
            waker.wakee.record(p.pid(), jiffies);
        }
    }

    fn task_woken(&self, _rq: &mut Rq, _p: &TaskRef) {}

    fn prio_changed(&self, _rq: &mut Rq, _p: &TaskRef, _old_prio: i32) {}

    fn switched_from(&self, _rq: &mut Rq, _p: &TaskRef) {}

    fn switched_to(&self, rq: &mut Rq, p: &TaskRef) {
        if rq.is_curr(p) {
            rq.resched_curr();
        } else {
            check_preempt_curr(rq, self, p, WakeFlags::empty());
        }
    }

    fn get_rr_interval(&self, _rq: &Rq, _p: &TaskRef) -> u32 {
        OPP_QUANTUM
    }

    fn update_curr(&self, rq: &mut Rq) {
        accounting::update_curr(rq);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sched::task::{SchedPolicy, Task};

    fn online(n: u32) -> Cpus {
        let cpus = Cpus::new();
        for cpu in 0..n {
            cpus.bringup(CpuId::new(cpu)).unwrap();
        }
        cpus
    }

    #[test]
    fn select_cpu_wraps_round_robin() {
        let cpus = online(4);
        let p = Task::new("bg", SchedPolicy::Opportunistic);
        let class = OpportunisticClass::new();
        let pick = |prev| class.select_task_rq(&cpus, &p, CpuId::new(prev), WakeFlags::empty());
        assert_eq!(pick(0), CpuId::new(1));
        assert_eq!(pick(2), CpuId::new(3));
        assert_eq!(pick(3), CpuId::new(0));
    }

    #[test]
    fn thin_hooks() {
        let cpus = online(1);
        let class = OpportunisticClass::new();
        let p = Task::new("bg", SchedPolicy::Opportunistic);
        let mut rq = cpus.rq(CpuId::BSP).lock();

        assert_eq!(class.get_rr_interval(&rq, &p), OPP_QUANTUM);
        assert!(class.yield_to_task(&mut rq, &p));

        p.stats.set_exec_start(77);
        class.migrate_task_rq(&p, CpuId::new(1));
        assert_eq!(p.stats.exec_start(), 0);

        let waker = Task::new("waker", SchedPolicy::Normal);
        class.task_waking(Some(&waker), &p, 1);
        assert_eq!(waker.wakee.last_wakee(), Some(p.pid()));
        assert_eq!(waker.wakee.flips(), 1);
    }

    #[test]
    fn pick_sets_exec_start_and_keeps_head_queued() {
        let cpus = online(1);
        let class = OpportunisticClass::new();
        let (t1, t2) = (
            Task::new("t1", SchedPolicy::Opportunistic),
            Task::new("t2", SchedPolicy::Opportunistic),
        );

        let mut rq = cpus.rq(CpuId::BSP).lock();
        rq.update_clock(4_242);
        class.enqueue_task(&mut rq, &t1, EnqueueFlags::NEW);
        class.enqueue_task(&mut rq, &t2, EnqueueFlags::NEW);

        match class.pick_next_task(&cpus, &mut rq) {
            Pick::Task(p) => assert!(Arc::ptr_eq(&p, &t1)),
            other => panic!("esperava t1, veio {:?}", other),
        }
        assert_eq!(t1.stats.exec_start(), 4_242);
        assert_eq!(rq.opp().len(), 2);
        assert_eq!(rq.opp().stats.picks, 1);
    }

    #[test]
    fn empty_queue_without_peers_is_empty() {
        let cpus = online(2);
        let class = OpportunisticClass::new();
        let mut rq = cpus.rq(CpuId::BSP).lock();
        assert!(matches!(class.pick_next_task(&cpus, &mut rq), Pick::Empty));
        assert_eq!(rq.opp().stats.pulls, 0);
    }

    #[test]
    fn switched_to_reschedules_curr() {
        let cpus = online(1);
        let class = OpportunisticClass::new();
        let p = Task::new("p", SchedPolicy::Opportunistic);
        let mut rq = cpus.rq(CpuId::BSP).lock();
        rq.set_curr(Some(Arc::clone(&p)));
        class.switched_to(&mut rq, &p);
        assert!(rq.need_resched());
    }
}
