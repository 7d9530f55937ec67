//! Fila oportunista por CPU

use alloc::collections::VecDeque;
use alloc::sync::Arc;

use crate::sched::task::TaskRef;
use crate::sys::CpuId;

/// Contadores da classe em uma CPU (diagnóstico)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OppStats {
    pub enqueues: u64,
    pub dequeues: u64,
    /// Tarefas devolvidas ao núcleo
    pub picks: u64,
    /// Tarefas puxadas de outras CPUs
    pub pulls: u64,
    /// Fatias esgotadas (tarefa foi para o fim da fila)
    pub rotations: u64,
    /// Escolhas negadas pela admissão global
    pub admission_denied: u64,
    /// Inconsistências detectadas (a operação foi recusada)
    pub invariant_violations: u64,
}

/// Fila FIFO de tarefas oportunistas de uma CPU.
///
/// Só é tocada com o lock da `Rq` que a contém. A tarefa em execução
/// continua na fila (normalmente na cabeça) até ser rotacionada ou sair.
pub struct OppRq {
    cpu: CpuId,
    queue: VecDeque<TaskRef>,
    pub stats: OppStats,
}

impl OppRq {
    pub const fn new(cpu: CpuId) -> Self {
        Self {
            cpu,
            queue: VecDeque::new(),
            stats: OppStats {
                enqueues: 0,
                dequeues: 0,
                picks: 0,
                pulls: 0,
                rotations: 0,
                admission_denied: 0,
                invariant_violations: 0,
            },
        }
    }

    /// Reinicia a fatia e coloca no fim da fila.
    ///
    /// Recusa (retorna false) tarefa que já está ligada a alguma fila.
    pub fn enqueue(&mut self, p: &TaskRef) -> bool {
        if let Some(owner) = p.opp.queued_on() {
            crate::kwarn!("(Opp) enqueue de tarefa ja enfileirada, PID:", p.pid().as_u32());
            crate::kwarn!("(Opp) fila dona:", owner.as_u32());
            self.stats.invariant_violations += 1;
            return false;
        }

        p.opp.reset_quantum();
        p.opp.link(self.cpu);
        self.queue.push_back(Arc::clone(p));
        self.stats.enqueues += 1;
        true
    }

    /// Remove a tarefa de onde estiver (cabeça ou meio). Retorna false se
    /// ela não está nesta fila.
    pub fn remove(&mut self, p: &TaskRef) -> bool {
        if p.opp.queued_on() != Some(self.cpu) {
            return false;
        }

        match self.queue.iter().position(|t| Arc::ptr_eq(t, p)) {
            Some(idx) => {
                self.queue.remove(idx);
                p.opp.unlink();
                self.stats.dequeues += 1;
                true
            }
            None => {
                // Link aponta para cá mas a fila não tem a tarefa
                crate::kerror!("(Opp) link sem entrada na fila, PID:", p.pid().as_u32());
                self.stats.invariant_violations += 1;
                p.opp.unlink();
                false
            }
        }
    }

    /// Move a tarefa para o fim (rotação). A fatia é reiniciada por quem chama.
    pub fn requeue_tail(&mut self, p: &TaskRef) {
        if let Some(idx) = self.queue.iter().position(|t| Arc::ptr_eq(t, p)) {
            if let Some(task) = self.queue.remove(idx) {
                self.queue.push_back(task);
            }
        }
    }

    pub fn head(&self) -> Option<&TaskRef> {
        self.queue.front()
    }

    /// Segunda entrada da fila. Só o balanceador usa: a cabeça é (ou vai
    /// ser) a tarefa em execução da CPU dona.
    pub fn second(&self) -> Option<&TaskRef> {
        self.queue.get(1)
    }

    /// O(1) pelo link da entidade
    pub fn contains(&self, p: &TaskRef) -> bool {
        p.opp.queued_on() == Some(self.cpu)
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TaskRef> {
        self.queue.iter()
    }
}
