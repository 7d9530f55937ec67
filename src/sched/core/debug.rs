//! Ferramentas de Debug para o Scheduler

use super::cpu::Cpus;

/// Imprime o estado de todas as runqueues online.
///
/// Usa `try_lock`: pode ser chamado de qualquer contexto (inclusive com
/// um lock de runqueue adquirido) sem risco de deadlock.
pub fn dump_rqs(cpus: &Cpus) {
    crate::kdebug!("--- [DEBUG] RUNQUEUES ---");

    for slot in cpus.possible().filter(|s| s.is_online()) {
        crate::kdebug!("  - CPU:", slot.id().as_u32());
        crate::kdebug!("    Classe corrente:", slot.curr_class() as u8);

        let rq = match slot.rq().try_lock() {
            Some(rq) => rq,
            None => {
                crate::kdebug!("    [Locked]");
                continue;
            }
        };

        match rq.curr() {
            Some(curr) => crate::kdebug!("    Running PID:", curr.pid().as_u32()),
            None => crate::kdebug!("    Running: None"),
        }
        crate::kdebug!("    nr_running:", rq.nr_running());

        let opp = rq.opp();
        crate::kdebug!("    Fila oportunista:", opp.len());
        for task in opp.iter() {
            crate::kdebug!("      -> PID:", task.pid().as_u32());
        }
        crate::kdebug!("    picks:", opp.stats.picks);
        crate::kdebug!("    pulls:", opp.stats.pulls);
        crate::kdebug!("    rotations:", opp.stats.rotations);
        crate::kdebug!("    admission_denied:", opp.stats.admission_denied);
        if opp.stats.invariant_violations > 0 {
            crate::kwarn!("    invariant_violations:", opp.stats.invariant_violations);
        }
    }

    crate::kdebug!("--- [DEBUG] FIM ---");
}
