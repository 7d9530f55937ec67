//! Task Control Block (visão do escalonador)

use alloc::sync::Arc;
use core::sync::atomic::{AtomicI32, AtomicU32, AtomicU64, AtomicU8, Ordering};

use super::accounting::ExecStats;
use super::policy::{class_for, ClassKind, SchedPolicy};
use super::wakee::WakeeStats;
use crate::sched::core::CpuMask;
use crate::sched::opportunistic::OppEntity;
use crate::sync::{AtomicCounter, AtomicFlag};
use crate::sys::{CpuId, Pid};

/// Pid counter (0 = kernel, 1 = init)
static NEXT_PID: AtomicCounter = AtomicCounter::new(2);

/// Handle compartilhado. O kernel é dono do tempo de vida; runqueues só
/// guardam clones do handle.
pub type TaskRef = Arc<Task>;

/// Thread Control Block
///
/// Campos mutáveis são atômicos para permitir leitura sem lock (admissão,
/// estatísticas). Escritas acontecem sob o lock da runqueue da tarefa.
pub struct Task {
    /// ID único
    pid: Pid,
    /// Nome (debug)
    name: [u8; 16],
    /// Prioridade efetiva. Define a classe ativa (ver `class_for`).
    prio: AtomicI32,
    /// Política pedida pelo usuário
    policy: AtomicU8,
    /// CPU cuja runqueue é dona da tarefa
    cpu: AtomicU32,
    /// Máscara de afinidade (guardada, não imposta pela classe oportunista)
    cpus_allowed: AtomicU64,
    /// Enfileirada em alguma classe (runnable)
    on_rq: AtomicFlag,
    /// Terminou; não pode mais ser acordada
    dead: AtomicFlag,
    /// Tempo de CPU
    pub stats: ExecStats,
    /// Entidade da classe oportunista
    pub opp: OppEntity,
    /// Estatísticas de wakeup (quando esta tarefa acorda outras)
    pub wakee: WakeeStats,
}

impl Task {
    /// Cria nova task com a prioridade padrão da política, na CPU 0.
    pub fn new(name: &str, policy: SchedPolicy) -> TaskRef {
        let pid = Pid::new(NEXT_PID.inc() as u32);
        Arc::new(Self::build(pid, name, policy, CpuId::BSP))
    }

    /// Task idle de uma CPU. Nunca entra em runqueue; a classe idle a
    /// devolve quando nada mais pode rodar.
    pub fn new_idle(cpu: CpuId) -> TaskRef {
        Arc::new(Self::build(Pid::KERNEL, "idle", SchedPolicy::Idle, cpu))
    }

    fn build(pid: Pid, name: &str, policy: SchedPolicy, cpu: CpuId) -> Self {
        // Preparar buffer de nome
        let mut name_buf = [0u8; 16];
        let bytes = name.as_bytes();
        let len = bytes.len().min(15);
        name_buf[..len].copy_from_slice(&bytes[..len]);

        Self {
            pid,
            name: name_buf,
            prio: AtomicI32::new(policy.default_prio()),
            policy: AtomicU8::new(policy as u8),
            cpu: AtomicU32::new(cpu.as_u32()),
            cpus_allowed: AtomicU64::new(CpuMask::ALL.bits()),
            on_rq: AtomicFlag::new(false),
            dead: AtomicFlag::new(false),
            stats: ExecStats::new(),
            opp: OppEntity::new(),
            wakee: WakeeStats::new(),
        }
    }

    pub fn pid(&self) -> Pid {
        self.pid
    }

    pub fn name(&self) -> &str {
        let len = self.name.iter().position(|&b| b == 0).unwrap_or(self.name.len());
        core::str::from_utf8(&self.name[..len]).unwrap_or("?")
    }

    pub fn prio(&self) -> i32 {
        self.prio.load(Ordering::Relaxed)
    }

    pub fn policy(&self) -> SchedPolicy {
        SchedPolicy::from_u8(self.policy.load(Ordering::Relaxed)).unwrap_or_default()
    }

    /// Classe ativa (derivada da prioridade efetiva)
    pub fn class(&self) -> ClassKind {
        class_for(self.prio())
    }

    /// Retorna se a tarefa é gerenciada pela classe oportunista
    pub fn is_opportunistic(&self) -> bool {
        self.class() == ClassKind::Opportunistic
    }

    pub fn cpu(&self) -> CpuId {
        CpuId::new(self.cpu.load(Ordering::Relaxed))
    }

    pub fn cpus_allowed(&self) -> CpuMask {
        CpuMask::from_bits(self.cpus_allowed.load(Ordering::Relaxed))
    }

    pub fn on_rq(&self) -> bool {
        self.on_rq.get()
    }

    pub fn is_dead(&self) -> bool {
        self.dead.get()
    }

    pub(crate) fn set_sched(&self, policy: SchedPolicy, prio: i32) {
        self.policy.store(policy as u8, Ordering::Relaxed);
        self.prio.store(prio, Ordering::Relaxed);
    }

    pub(crate) fn set_cpu(&self, cpu: CpuId) {
        self.cpu.store(cpu.as_u32(), Ordering::Relaxed);
    }

    pub(crate) fn set_cpus_allowed(&self, mask: CpuMask) {
        self.cpus_allowed.store(mask.bits(), Ordering::Relaxed);
    }

    pub(crate) fn set_on_rq(&self, on_rq: bool) {
        self.on_rq.set(on_rq);
    }

    /// Marca como morta. Retorna false se já estava.
    pub(crate) fn mark_dead(&self) -> bool {
        !self.dead.test_and_set()
    }
}

impl core::fmt::Debug for Task {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Task")
            .field("pid", &self.pid.as_u32())
            .field("name", &self.name())
            .field("prio", &self.prio())
            .field("cpu", &self.cpu().as_u32())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sched::config::{DEFAULT_PRIO, OPP_PRIO};

    #[test]
    fn new_task_takes_policy_defaults() {
        let t = Task::new("backup-indexer-long-name", SchedPolicy::Opportunistic);
        assert_eq!(t.prio(), OPP_PRIO);
        assert!(t.is_opportunistic());
        assert_eq!(t.name(), "backup-indexer-");
        assert!(t.pid().as_u32() >= 2);
        assert!(!t.on_rq());

        let n = Task::new("shell", SchedPolicy::Normal);
        assert_eq!(n.prio(), DEFAULT_PRIO);
        assert_eq!(n.class(), ClassKind::Fair);
        assert_ne!(n.pid(), t.pid());
    }

    #[test]
    fn idle_task_belongs_to_idle_class() {
        let idle = Task::new_idle(CpuId::new(3));
        assert_eq!(idle.class(), ClassKind::Idle);
        assert_eq!(idle.cpu(), CpuId::new(3));
        assert_eq!(idle.pid(), Pid::KERNEL);
    }

    #[test]
    fn mark_dead_only_once() {
        let t = Task::new("t", SchedPolicy::Normal);
        assert!(t.mark_dead());
        assert!(!t.mark_dead());
        assert!(t.is_dead());
    }
}
