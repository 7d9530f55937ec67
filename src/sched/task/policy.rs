//! Políticas e classes de escalonamento

use crate::sched::config::{is_opp_prio, DEFAULT_PRIO, DEFAULT_RT_PRIO, IDLE_PRIO, MAX_PRIO, MAX_RT_PRIO, OPP_PRIO};

/// Políticas de escalonamento suportadas (numeração de `sched_setscheduler`)
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedPolicy {
    /// Tempo compartilhado - Padrão para processos normais
    Normal = 0,
    /// First-In First-Out - Realtime
    Fifo = 1,
    /// Round Robin - Realtime
    RoundRobin = 2,
    /// Lote (CPU-bound, sem interatividade)
    Batch = 3,
    /// Reservada para a task idle de cada CPU
    Idle = 5,
    /// Tarefa de fundo: só roda com o sistema ocioso
    Opportunistic = 7,
}

impl SchedPolicy {
    pub const fn from_u8(raw: u8) -> Option<Self> {
        match raw {
            0 => Some(Self::Normal),
            1 => Some(Self::Fifo),
            2 => Some(Self::RoundRobin),
            3 => Some(Self::Batch),
            5 => Some(Self::Idle),
            7 => Some(Self::Opportunistic),
            _ => None,
        }
    }

    /// Prioridade usada quando a tarefa é criada com esta política
    pub const fn default_prio(self) -> i32 {
        match self {
            Self::Normal | Self::Batch => DEFAULT_PRIO,
            Self::Fifo | Self::RoundRobin => DEFAULT_RT_PRIO,
            Self::Idle => IDLE_PRIO,
            Self::Opportunistic => OPP_PRIO,
        }
    }

    /// Verifica se `prio` é válida para a política
    pub const fn accepts_prio(self, prio: i32) -> bool {
        match self {
            Self::Fifo | Self::RoundRobin => prio >= 0 && prio < MAX_RT_PRIO,
            Self::Normal | Self::Batch => prio >= MAX_RT_PRIO && prio < MAX_PRIO,
            Self::Idle => prio == IDLE_PRIO,
            Self::Opportunistic => is_opp_prio(prio),
        }
    }
}

impl Default for SchedPolicy {
    fn default() -> Self {
        Self::Normal
    }
}

/// Classe de escalonamento ativa de uma tarefa (ou de uma CPU, para
/// o que está rodando nela).
///
/// A ordem dos discriminantes é a ordem da cadeia: menor = consultada antes.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ClassKind {
    Rt = 0,
    Fair = 1,
    Opportunistic = 2,
    Idle = 3,
    /// Nada rodando (CPU offline ou ainda sem escolha)
    None = 4,
}

impl ClassKind {
    pub const fn from_u8(raw: u8) -> Self {
        match raw {
            0 => Self::Rt,
            1 => Self::Fair,
            2 => Self::Opportunistic,
            3 => Self::Idle,
            _ => Self::None,
        }
    }

    /// `self` preempta tarefas de `other`?
    pub fn outranks(self, other: ClassKind) -> bool {
        self < other
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Rt => "rt",
            Self::Fair => "fair",
            Self::Opportunistic => "opportunistic",
            Self::Idle => "idle",
            Self::None => "none",
        }
    }
}

/// Classe derivada da prioridade (como `rt_prio()` / `opp_prio()` no núcleo)
pub const fn class_for(prio: i32) -> ClassKind {
    if prio < MAX_RT_PRIO {
        ClassKind::Rt
    } else if prio == IDLE_PRIO {
        ClassKind::Idle
    } else if is_opp_prio(prio) {
        ClassKind::Opportunistic
    } else {
        ClassKind::Fair
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prio_maps_to_class() {
        assert_eq!(class_for(0), ClassKind::Rt);
        assert_eq!(class_for(99), ClassKind::Rt);
        assert_eq!(class_for(120), ClassKind::Fair);
        assert_eq!(class_for(IDLE_PRIO), ClassKind::Idle);
        assert_eq!(class_for(OPP_PRIO), ClassKind::Opportunistic);
    }

    #[test]
    fn default_prio_is_accepted_by_its_policy() {
        for policy in [
            SchedPolicy::Normal,
            SchedPolicy::Fifo,
            SchedPolicy::RoundRobin,
            SchedPolicy::Batch,
            SchedPolicy::Idle,
            SchedPolicy::Opportunistic,
        ] {
            assert!(policy.accepts_prio(policy.default_prio()));
            assert_eq!(SchedPolicy::from_u8(policy as u8), Some(policy));
        }
        assert!(!SchedPolicy::Opportunistic.accepts_prio(DEFAULT_PRIO));
        assert!(!SchedPolicy::Normal.accepts_prio(OPP_PRIO));
    }

    #[test]
    fn chain_order() {
        assert!(ClassKind::Rt.outranks(ClassKind::Fair));
        assert!(ClassKind::Fair.outranks(ClassKind::Opportunistic));
        assert!(ClassKind::Opportunistic.outranks(ClassKind::Idle));
        assert!(ClassKind::Idle.outranks(ClassKind::None));
        assert!(!ClassKind::Opportunistic.outranks(ClassKind::Opportunistic));
    }
}
