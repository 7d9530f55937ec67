//! Classe Idle - fallback permanente
//!
//! Cada `Rq` tem sua idle task, que nunca entra em fila. Esta classe é a
//! última da cadeia e sempre devolve a idle task da CPU.

use alloc::sync::Arc;

use super::class::{DequeueFlags, EnqueueFlags, Pick, SchedClass};
use super::cpu::Cpus;
use super::runqueue::{Rq, RqGuard};
use crate::sched::task::{ClassKind, TaskRef};

pub struct IdleClass;

pub static IDLE_CLASS: IdleClass = IdleClass;

impl SchedClass for IdleClass {
    fn kind(&self) -> ClassKind {
        ClassKind::Idle
    }

    fn enqueue_task(&self, _rq: &mut Rq, p: &TaskRef, _flags: EnqueueFlags) {
        crate::kwarn!("(Idle) enqueue na classe idle ignorado, PID:", p.pid().as_u32());
    }

    fn dequeue_task(&self, _rq: &mut Rq, p: &TaskRef, _flags: DequeueFlags) {
        crate::kwarn!("(Idle) dequeue na classe idle ignorado, PID:", p.pid().as_u32());
    }

    fn pick_next_task(&self, _cpus: &Cpus, rq: &mut RqGuard<'_>) -> Pick {
        Pick::Task(Arc::clone(rq.idle()))
    }
}
