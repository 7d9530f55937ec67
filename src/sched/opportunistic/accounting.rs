//! Contabilidade de tempo e rotação por quantum

use crate::sched::core::Rq;
use crate::sched::task::{ClassKind, SchedPolicy, TaskRef};

/// Contabiliza o tempo da corrente, se ela for oportunista.
///
/// Delta <= 0 (relógio voltou, ou a tarefa acabou de migrar com
/// `exec_start` zerado no futuro) é ignorado em silêncio.
pub fn update_curr(rq: &mut Rq) {
    let curr = match rq.curr() {
        Some(curr) if curr.class() == ClassKind::Opportunistic => curr,
        _ => return,
    };

    let now = rq.clock_task();
    let delta = now.wrapping_sub(curr.stats.exec_start()) as i64;
    if delta <= 0 {
        return;
    }

    curr.stats.charge(delta as u64, now);
}

/// Tick com uma tarefa oportunista na CPU.
///
/// Ao esgotar a fatia a tarefa vai para o fim da fila local e a CPU é
/// marcada para reescalonar.
pub fn task_tick(rq: &mut Rq, curr: &TaskRef) -> bool {
    update_curr(rq);

    if curr.policy() != SchedPolicy::Opportunistic {
        return false;
    }

    if curr.opp.tick() > 0 {
        return false;
    }

    // Fora da fila local (dormiu e ainda é a corrente): nada a rotacionar,
    // o próximo enqueue recarrega a fatia
    if !rq.opp.contains(curr) {
        return false;
    }

    curr.opp.reset_quantum();
    rq.opp.requeue_tail(curr);
    rq.opp.stats.rotations += 1;
    rq.resched_curr();
    true
}
