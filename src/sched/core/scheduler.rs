//! # Dispatcher (núcleo hospedeiro)
//!
//! Dirige as classes nos pontos do ciclo de vida de uma tarefa: criação,
//! wakeup, sono, escolha da próxima tarefa, tick, troca de política,
//! migração e saída.
//!
//! ## Escolha da próxima tarefa
//!
//! `schedule` consulta a cadeia do topo para baixo. Uma classe pode
//! devolver `Pick::Retry` depois de mudar as filas (pull da oportunista):
//! a consulta recomeça do topo, porque uma classe acima pode ter ganho
//! trabalho enquanto o lock local esteve solto.
//!
//! ## Locks
//!
//! Toda chamada de hook acontece com o lock da runqueue envolvida
//! adquirido aqui. Operações em duas CPUs usam `SpinlockGuard::double_lock`.

use alloc::sync::Arc;
use alloc::vec::Vec;

use super::chain::ClassChain;
use super::class::{DequeueFlags, EnqueueFlags, Pick, SchedClass, WakeFlags};
use super::cpu::{CpuMask, CpuSlot, Cpus, CPUS};
use super::debug;
use super::idle::IDLE_CLASS;
use super::runqueue::{self, check_preempt_curr, set_task_cpu, Rq, RqGuard};
use crate::sched::config::MAX_CPUS;
use crate::sched::opportunistic::{OppStats, OPP_CLASS};
use crate::sched::task::{class_for, SchedPolicy, Task, TaskRef};
use crate::sync::SpinlockGuard;
use crate::sys::{CpuId, Errno};

/// Limite de recomeços de uma escolha. Cada Retry da oportunista move uma
/// tarefa para a fila local, então na prática basta um.
const MAX_PICK_RETRIES: usize = MAX_CPUS;

pub struct Scheduler<'a> {
    cpus: &'a Cpus,
    chain: ClassChain<'a>,
}

impl<'a> Scheduler<'a> {
    pub fn new(cpus: &'a Cpus, chain: ClassChain<'a>) -> Self {
        Self { cpus, chain }
    }

    pub fn cpus(&self) -> &'a Cpus {
        self.cpus
    }

    pub fn chain(&self) -> &ClassChain<'a> {
        &self.chain
    }

    fn class_of(&self, p: &TaskRef) -> Result<&'a dyn SchedClass, Errno> {
        self.chain.class_of(p.class()).ok_or(Errno::EINVAL)
    }

    /// Trava a runqueue dona de `p`. Revalida depois do lock: um pull pode
    /// ter mudado a CPU da tarefa entre a leitura e a aquisição.
    fn task_rq_lock(&self, p: &TaskRef) -> Result<(&'a CpuSlot, RqGuard<'a>), Errno> {
        loop {
            let cpu = p.cpu();
            let slot = self.cpus.slot(cpu).ok_or(Errno::ENODEV)?;
            let rq = slot.lock_rq();
            if p.cpu() == cpu {
                return Ok((slot, rq));
            }
        }
    }

    /// CPU escolhida pela classe, ou a primeira online dentro da afinidade
    /// de `p` se ela estiver fora
    fn fallback_cpu(&self, p: &TaskRef, cpu: CpuId) -> Result<CpuId, Errno> {
        let allowed = p.cpus_allowed();
        if self.cpus.is_online(cpu) && allowed.contains(cpu) {
            return Ok(cpu);
        }
        self.cpus
            .online()
            .find(|&c| allowed.contains(c))
            .ok_or(Errno::ENODEV)
    }

    // =========================================================================
    // CPUS
    // =========================================================================

    pub fn bringup_cpu(&self, cpu: CpuId) -> Result<(), Errno> {
        self.cpus.bringup(cpu)?;
        let mut rq = self.cpus.rq(cpu).lock();
        for class in self.chain.iter() {
            class.rq_online(&mut rq);
        }
        Ok(())
    }

    /// Recusado com `EBUSY` enquanto houver tarefas na CPU
    pub fn teardown_cpu(&self, cpu: CpuId) -> Result<(), Errno> {
        self.cpus.teardown(cpu)?;
        let mut rq = self.cpus.rq(cpu).lock();
        for class in self.chain.iter() {
            class.rq_offline(&mut rq);
        }
        Ok(())
    }

    // =========================================================================
    // CICLO DE VIDA
    // =========================================================================

    /// Cria um filho de `parent` com a mesma política e prioridade.
    /// O filho ainda não está runnable: ver `wake_up_new_task`.
    pub fn fork_task(&self, parent: &TaskRef, name: &str) -> Result<TaskRef, Errno> {
        let class = self.class_of(parent)?;
        let child = Task::new(name, parent.policy());
        child.set_sched(parent.policy(), parent.prio());
        child.set_cpu(parent.cpu());
        child.set_cpus_allowed(parent.cpus_allowed());
        class.task_fork(&child);
        Ok(child)
    }

    /// Primeira ativação de uma tarefa. Retorna a CPU escolhida.
    pub fn wake_up_new_task(&self, p: &TaskRef) -> Result<CpuId, Errno> {
        self.wake_task(p, None, WakeFlags::FORK, EnqueueFlags::NEW)
    }

    /// Acorda `p` (por `waker`, se houver). Retorna a CPU escolhida.
    pub fn activate_task(&self, p: &TaskRef, waker: Option<&TaskRef>) -> Result<CpuId, Errno> {
        self.wake_task(p, waker, WakeFlags::empty(), EnqueueFlags::WAKEUP)
    }

    /// Coloca `p` (fora de fila) na CPU escolhida pela classe.
    ///
    /// Se `p` ainda é a corrente da sua CPU (dormiu e foi acordada antes do
    /// próximo `schedule` de lá), volta para a mesma CPU: uma tarefa nunca
    /// é corrente em duas CPUs.
    fn wake_task(
        &self,
        p: &TaskRef,
        waker: Option<&TaskRef>,
        wake: WakeFlags,
        enq: EnqueueFlags,
    ) -> Result<CpuId, Errno> {
        let class = self.class_of(p)?;

        loop {
            let (_slot, mut rq) = self.task_rq_lock(p)?;
            if p.is_dead() {
                return Err(Errno::ESRCH);
            }
            if p.on_rq() {
                return Err(Errno::EALREADY);
            }

            let src = rq.cpu();
            let target = if rq.is_curr(p) {
                src
            } else {
                let hint = class.select_task_rq(self.cpus, p, src, wake);
                self.fallback_cpu(p, hint)?
            };

            if target == src {
                class.task_waking(waker, p, self.cpus.jiffies());
                enqueue_woken(&mut rq, class, p, wake, enq);
                return Ok(src);
            }

            let dest_slot = self.cpus.online_slot(target)?;
            let (mut dest_rq, relocked) =
                SpinlockGuard::double_lock(&mut rq, src.index(), dest_slot.rq(), target.index());
            // Lock de origem solto no meio: outro wakeup ou uma migração
            // pode ter mexido em `p`
            if relocked && (p.cpu() != src || p.on_rq() || rq.is_curr(p)) {
                continue;
            }

            class.task_waking(waker, p, self.cpus.jiffies());
            set_task_cpu(class, p, target);
            enqueue_woken(&mut dest_rq, class, p, wake, enq);
            return Ok(target);
        }
    }

    /// `p` vai dormir
    pub fn deactivate_task(&self, p: &TaskRef) -> Result<(), Errno> {
        let (_slot, mut rq) = self.task_rq_lock(p)?;
        if !p.on_rq() {
            return Err(Errno::EINVAL);
        }

        let class = self.class_of(p)?;
        runqueue::deactivate_task(&mut rq, class, p, DequeueFlags::SLEEP);
        if rq.is_curr(p) {
            rq.resched_curr();
        }
        Ok(())
    }

    /// `p` terminou. Sai da fila e não pode mais ser acordada.
    pub fn task_exit(&self, p: &TaskRef) -> Result<(), Errno> {
        let class = self.class_of(p)?;
        let (_slot, mut rq) = self.task_rq_lock(p)?;
        if !p.mark_dead() {
            return Err(Errno::ESRCH);
        }

        if p.on_rq() {
            runqueue::deactivate_task(&mut rq, class, p, DequeueFlags::SLEEP);
        }
        if rq.is_curr(p) {
            rq.resched_curr();
        }
        class.task_dead(p);
        Ok(())
    }

    // =========================================================================
    // ESCOLHA E TICK
    // =========================================================================

    /// Escolhe e instala a próxima tarefa de `cpu`
    pub fn schedule(&self, cpu: CpuId) -> Result<TaskRef, Errno> {
        let slot = self.cpus.online_slot(cpu)?;
        let mut rq = slot.lock_rq();

        if let Some(prev) = rq.curr().cloned() {
            if let Some(class) = self.chain.class_of(prev.class()) {
                class.put_prev_task(&mut rq, &prev);
            }
        }

        let next = self.pick_next(&mut rq);
        slot.publish_curr(next.class());
        rq.set_curr(Some(Arc::clone(&next)));
        rq.clear_resched();
        Ok(next)
    }

    fn pick_next(&self, rq: &mut RqGuard<'a>) -> TaskRef {
        let mut retries = 0;

        'restart: loop {
            for class in self.chain.iter() {
                match class.pick_next_task(self.cpus, rq) {
                    Pick::Task(p) => return p,
                    Pick::Retry if retries < MAX_PICK_RETRIES => {
                        retries += 1;
                        continue 'restart;
                    }
                    Pick::Retry => {
                        crate::kwarn!("(Sched) limite de retry na escolha, CPU:", rq.cpu().as_u32());
                    }
                    Pick::Empty => {}
                }
            }
            return Arc::clone(rq.idle());
        }
    }

    /// Tick do timer em `cpu` no instante `now` (ns). Retorna se a CPU
    /// precisa chamar `schedule`.
    pub fn scheduler_tick(&self, cpu: CpuId, now: u64) -> Result<bool, Errno> {
        let slot = self.cpus.online_slot(cpu)?;
        if cpu == CpuId::BSP {
            self.cpus.tick_jiffies();
        }

        let mut rq = slot.lock_rq();
        rq.update_clock(now);
        if let Some(curr) = rq.curr().cloned() {
            if let Some(class) = self.chain.class_of(curr.class()) {
                class.task_tick(&mut rq, &curr, curr.on_rq());
            }
        }
        Ok(rq.need_resched())
    }

    /// A corrente de `cpu` cede a CPU
    pub fn yield_current(&self, cpu: CpuId) -> Result<(), Errno> {
        let slot = self.cpus.online_slot(cpu)?;
        let mut rq = slot.lock_rq();
        if let Some(curr) = rq.curr().cloned() {
            if let Some(class) = self.chain.class_of(curr.class()) {
                class.yield_task(&mut rq);
            }
        }
        rq.resched_curr();
        Ok(())
    }

    /// A corrente da CPU de `p` cede a vez para `p` (mesma classe apenas).
    pub fn yield_to(&self, p: &TaskRef) -> Result<bool, Errno> {
        let class = self.class_of(p)?;
        let (_slot, mut rq) = self.task_rq_lock(p)?;
        if !p.on_rq() || rq.curr().map_or(true, |c| c.class() != p.class()) {
            return Ok(false);
        }

        let yielded = class.yield_to_task(&mut rq, p);
        if yielded {
            rq.resched_curr();
        }
        Ok(yielded)
    }

    // =========================================================================
    // POLÍTICA E AFINIDADE
    // =========================================================================

    /// Troca política e prioridade (`None` = padrão da política).
    ///
    /// A tarefa sai da classe antiga (SAVE) e entra na nova (RESTORE) sem
    /// deixar de ser runnable.
    pub fn set_scheduler(&self, p: &TaskRef, policy: SchedPolicy, prio: Option<i32>) -> Result<(), Errno> {
        if policy == SchedPolicy::Idle {
            return Err(Errno::EPERM);
        }
        let prio = prio.unwrap_or(policy.default_prio());
        if !policy.accepts_prio(prio) {
            return Err(Errno::EINVAL);
        }
        if p.is_dead() {
            return Err(Errno::ESRCH);
        }

        let new_class = self.chain.class_of(class_for(prio)).ok_or(Errno::EINVAL)?;
        let (slot, mut rq) = self.task_rq_lock(p)?;
        let old_class = self.class_of(p)?;
        let old_prio = p.prio();
        let queued = p.on_rq();
        let running = rq.is_curr(p);

        if queued {
            old_class.dequeue_task(&mut rq, p, DequeueFlags::SAVE);
        }
        if running {
            old_class.put_prev_task(&mut rq, p);
        }

        p.set_sched(policy, prio);

        if running {
            new_class.set_curr_task(&mut rq);
            slot.publish_curr(new_class.kind());
        }
        if queued {
            new_class.enqueue_task(&mut rq, p, EnqueueFlags::RESTORE);
        }

        if old_class.kind() != new_class.kind() {
            old_class.switched_from(&mut rq, p);
            new_class.switched_to(&mut rq, p);
        } else if old_prio != prio {
            new_class.prio_changed(&mut rq, p, old_prio);
        }

        crate::kinfo!("(Sched) politica alterada, PID:", p.pid().as_u32());
        Ok(())
    }

    /// Afinidade. A máscara precisa conter ao menos uma CPU online.
    pub fn set_cpus_allowed(&self, p: &TaskRef, mask: CpuMask) -> Result<(), Errno> {
        if !self.cpus.online().any(|cpu| mask.contains(cpu)) {
            return Err(Errno::EINVAL);
        }
        let class = self.class_of(p)?;
        let (_slot, _rq) = self.task_rq_lock(p)?;
        class.set_cpus_allowed(p, mask);
        p.set_cpus_allowed(mask);
        Ok(())
    }

    /// Move `p` para `dest`. A tarefa corrente de uma CPU não pode ser
    /// movida (`EBUSY`); `dest` fora da afinidade dá `EINVAL`.
    pub fn migrate_task(&self, p: &TaskRef, dest: CpuId) -> Result<(), Errno> {
        let dest_slot = self.cpus.online_slot(dest)?;
        if !p.cpus_allowed().contains(dest) {
            return Err(Errno::EINVAL);
        }
        let class = self.class_of(p)?;
        let (_src_slot, mut src_rq) = self.task_rq_lock(p)?;
        let src = src_rq.cpu();
        if src == dest {
            return Ok(());
        }
        if src_rq.is_curr(p) {
            return Err(Errno::EBUSY);
        }

        let (mut dest_rq, relocked) =
            SpinlockGuard::double_lock(&mut src_rq, src.index(), dest_slot.rq(), dest.index());
        if relocked && (p.cpu() != src || src_rq.is_curr(p)) {
            return Err(Errno::EBUSY);
        }

        if p.on_rq() {
            runqueue::deactivate_task(&mut src_rq, class, p, DequeueFlags::MIGRATING);
            set_task_cpu(class, p, dest);
            runqueue::activate_task(&mut dest_rq, class, p, EnqueueFlags::MIGRATED);
            check_preempt_curr(&mut dest_rq, class, p, WakeFlags::MIGRATED);
        } else {
            set_task_cpu(class, p, dest);
        }
        Ok(())
    }

    // =========================================================================
    // CONSULTAS
    // =========================================================================

    /// Fatia de tempo de `p`, em ticks (0 = sem fatia fixa)
    pub fn rr_interval(&self, p: &TaskRef) -> Result<u32, Errno> {
        let class = self.class_of(p)?;
        let (_slot, rq) = self.task_rq_lock(p)?;
        Ok(class.get_rr_interval(&rq, p))
    }

    pub fn curr(&self, cpu: CpuId) -> Option<TaskRef> {
        let slot = self.cpus.slot(cpu)?;
        let rq = slot.lock_rq();
        rq.curr().cloned()
    }

    /// Contadores da classe oportunista de `cpu`
    pub fn opp_stats(&self, cpu: CpuId) -> Result<OppStats, Errno> {
        let slot = self.cpus.slot(cpu).ok_or(Errno::ENODEV)?;
        let rq = slot.lock_rq();
        Ok(rq.opp().stats)
    }

    /// Despeja o estado das runqueues no log (nível debug)
    pub fn dump_state(&self) {
        debug::dump_rqs(self.cpus);
    }
}

fn enqueue_woken(rq: &mut Rq, class: &dyn SchedClass, p: &TaskRef, wake: WakeFlags, enq: EnqueueFlags) {
    runqueue::activate_task(rq, class, p, enq);
    check_preempt_curr(rq, class, p, wake);
    class.task_woken(rq, p);
}

/// Monta o escalonador do kernel sobre a tabela global `CPUS` e coloca a
/// BSP online. `classes` são as classes acima da oportunista (Rt, Fair).
pub fn init(classes: &[&'static dyn SchedClass]) -> Result<Scheduler<'static>, Errno> {
    let mut all: Vec<&'static dyn SchedClass> = classes.to_vec();
    all.push(&OPP_CLASS);
    all.push(&IDLE_CLASS);

    let sched = Scheduler::new(&*CPUS, ClassChain::new(&all)?);
    match sched.bringup_cpu(CpuId::BSP) {
        Ok(()) | Err(Errno::EALREADY) => {}
        Err(e) => return Err(e),
    }

    crate::kinfo!("(Sched) Escalonador pronto. Classes:", sched.chain().len());
    Ok(sched)
}
