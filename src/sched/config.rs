//! Constantes de configuração do Scheduler

// =============================================================================
// CLASSE OPORTUNISTA
// =============================================================================

/// Quantum (em ticks) de uma tarefa oportunista antes da rotação
pub const OPP_QUANTUM: u32 = 25;

/// Admissão: tarefas oportunistas só rodam enquanto
/// `oportunistas_rodando + importantes_rodando < OPP_ADMISSION_THRESHOLD`
pub const OPP_ADMISSION_THRESHOLD: usize = 5;

// =============================================================================
// PRIORIDADES (mesma escala do Linux: menor = mais importante)
// =============================================================================

/// Prioridades [0, MAX_RT_PRIO) são de tempo real
pub const MAX_RT_PRIO: i32 = 100;

/// Prioridade padrão para processos de usuário (nice 0)
pub const DEFAULT_PRIO: i32 = 120;

/// Prioridade padrão de tempo real
pub const DEFAULT_RT_PRIO: i32 = 50;

/// Fim da faixa normal. Também é a prioridade da task idle.
pub const MAX_PRIO: i32 = 140;

/// Prioridade da task Idle
pub const IDLE_PRIO: i32 = MAX_PRIO;

/// Prioridade que marca uma tarefa como oportunista (abaixo até da idle na escala)
pub const OPP_PRIO: i32 = 141;

// =============================================================================
// TOPOLOGIA E TEMPO
// =============================================================================

/// Número máximo de CPUs suportadas
pub const MAX_CPUS: usize = 32;

/// Frequência do Tick (Ticks por segundo)
pub const HZ: u64 = 100;

/// Período de decaimento dos wakee flips (em jiffies)
pub const WAKEE_DECAY_TICKS: u64 = HZ;

// =============================================================================
// DIAGNÓSTICO
// =============================================================================

/// Janela do rate limit dos traces do hot path (ns no relógio da runqueue)
pub const DIAG_RATELIMIT_INTERVAL: u64 = 5_000_000_000;

/// Linhas permitidas por janela
pub const DIAG_RATELIMIT_BURST: u32 = 10;

/// Retorna true se a prioridade é a de tarefas oportunistas
#[inline]
pub const fn is_opp_prio(prio: i32) -> bool {
    prio == OPP_PRIO
}
