//! Balanceamento por roubo de trabalho (pull)
//!
//! Uma CPU com a fila oportunista vazia tenta puxar UMA tarefa de outra
//! CPU. Só a segunda entrada da fila de origem é candidata: a cabeça é a
//! tarefa corrente (ou a próxima) de lá, e uma fila com uma tarefa só
//! nunca é esvaziada.
//!
//! Os dois locks são adquiridos em ordem crescente de CPU via
//! `SpinlockGuard::double_lock`. O lock da origem é solto ao fim de cada
//! iteração (guard); o lock local continua com quem chamou.

use alloc::sync::Arc;

use super::class::OpportunisticClass;
use crate::sched::core::runqueue::{activate_task, deactivate_task, set_task_cpu};
use crate::sched::core::{Cpus, DequeueFlags, EnqueueFlags, RqGuard};
use crate::sync::SpinlockGuard;

/// Tenta puxar uma tarefa para `this_rq`. Retorna true se puxou, ou se a
/// fila local deixou de estar vazia enquanto o lock local esteve solto.
///
/// Pré-condição: fila local vazia e admissão concedida. Percorre as outras
/// CPUs online em ordem crescente e para na primeira que cede uma tarefa.
pub fn pull_task(class: &OpportunisticClass, cpus: &Cpus, this_rq: &mut RqGuard<'_>) -> bool {
    let this_cpu = this_rq.cpu();

    for src_cpu in cpus.online() {
        if src_cpu == this_cpu {
            continue;
        }

        let (mut src_rq, relocked) =
            SpinlockGuard::double_lock(&mut *this_rq, this_cpu.index(), cpus.rq(src_cpu), src_cpu.index());

        // O lock local foi solto no meio: se a fila local ganhou tarefa, a
        // pré-condição caiu e quem chamou refaz a escolha
        if relocked && !this_rq.opp.is_empty() {
            return true;
        }

        let p = match src_rq.opp.second() {
            Some(p) => Arc::clone(p),
            None => continue,
        };

        // Nunca roubar a tarefa que está rodando lá
        if src_rq.is_curr(&p) {
            crate::kerror!("(Opp) pull recusado: candidata e a corrente da origem, PID:", p.pid().as_u32());
            this_rq.opp.stats.invariant_violations += 1;
            continue;
        }

        // A candidata precisa estar ligada à fila de onde sai
        if p.opp.queued_on() != Some(src_cpu) || !p.on_rq() {
            crate::kerror!("(Opp) pull recusado: candidata fora da fila de origem, PID:", p.pid().as_u32());
            this_rq.opp.stats.invariant_violations += 1;
            continue;
        }

        deactivate_task(&mut src_rq, class, &p, DequeueFlags::MIGRATING);
        set_task_cpu(class, &p, this_cpu);
        activate_task(this_rq, class, &p, EnqueueFlags::MIGRATED);
        this_rq.opp.stats.pulls += 1;

        if class.trace_allowed(this_rq.clock_task()) {
            crate::ktrace!("(Opp) pull de CPU:", src_cpu.as_u32());
            crate::ktrace!("(Opp) pull PID:", p.pid().as_u32());
        }
        return true;
    }

    false
}
