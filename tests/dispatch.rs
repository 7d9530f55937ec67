//! Dispatcher ponta a ponta: classe oportunista junto de uma classe Fair
//! mínima e da idle, dirigidas só pela API pública.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::thread;

use oppsched::sched::config::{MAX_CPUS, OPP_QUANTUM};
use oppsched::sched::core::{
    ClassChain, CpuMask, Cpus, DequeueFlags, EnqueueFlags, Pick, Rq, RqGuard, SchedClass,
    Scheduler, IDLE_CLASS,
};
use oppsched::sched::opportunistic::OPP_CLASS;
use oppsched::sched::task::{ClassKind, SchedPolicy, Task, TaskRef};
use oppsched::{CpuId, Errno};

/// FIFO por CPU; a corrente fica na cabeça
struct FifoClass {
    queues: Mutex<Vec<VecDeque<TaskRef>>>,
}

impl FifoClass {
    fn new() -> Self {
        Self {
            queues: Mutex::new((0..MAX_CPUS).map(|_| VecDeque::new()).collect()),
        }
    }
}

impl SchedClass for FifoClass {
    fn kind(&self) -> ClassKind {
        ClassKind::Fair
    }

    fn enqueue_task(&self, rq: &mut Rq, p: &TaskRef, _flags: EnqueueFlags) {
        self.queues.lock().unwrap()[rq.cpu().index()].push_back(Arc::clone(p));
    }

    fn dequeue_task(&self, rq: &mut Rq, p: &TaskRef, _flags: DequeueFlags) {
        self.queues.lock().unwrap()[rq.cpu().index()].retain(|t| !Arc::ptr_eq(t, p));
    }

    fn pick_next_task(&self, _cpus: &Cpus, rq: &mut RqGuard<'_>) -> Pick {
        match self.queues.lock().unwrap()[rq.cpu().index()].front() {
            Some(p) => Pick::Task(Arc::clone(p)),
            None => Pick::Empty,
        }
    }
}

fn cpu(n: u32) -> CpuId {
    CpuId::new(n)
}

fn setup<'a>(cpus: &'a Cpus, fair: &'a FifoClass, nr: u32) -> Scheduler<'a> {
    let chain = ClassChain::new(&[&OPP_CLASS, fair, &IDLE_CLASS]).unwrap();
    let sched = Scheduler::new(cpus, chain);
    for n in 0..nr {
        sched.bringup_cpu(cpu(n)).unwrap();
    }
    sched
}

fn opp(sched: &Scheduler<'_>, name: &str, on: u32) -> TaskRef {
    let p = Task::new(name, SchedPolicy::Opportunistic);
    sched.wake_up_new_task(&p).unwrap();
    sched.migrate_task(&p, cpu(on)).unwrap();
    p
}

fn fair_task(sched: &Scheduler<'_>, name: &str, on: u32) -> TaskRef {
    let p = Task::new(name, SchedPolicy::Normal);
    sched.migrate_task(&p, cpu(on)).unwrap();
    sched.wake_up_new_task(&p).unwrap();
    p
}

#[test]
fn fair_wakeup_preempts_opportunistic() {
    let cpus = Cpus::new();
    let fair = FifoClass::new();
    let sched = setup(&cpus, &fair, 1);

    let bg = opp(&sched, "bg", 0);
    assert!(Arc::ptr_eq(&sched.schedule(cpu(0)).unwrap(), &bg));
    assert_eq!(cpus.slot(cpu(0)).unwrap().curr_class(), ClassKind::Opportunistic);
    assert!(!cpus.rq(cpu(0)).lock().need_resched());

    let shell = fair_task(&sched, "shell", 0);
    assert!(cpus.rq(cpu(0)).lock().need_resched());
    assert!(Arc::ptr_eq(&sched.schedule(cpu(0)).unwrap(), &shell));
    // A oportunista espera na fila
    assert!(bg.on_rq());
    assert_eq!(bg.opp.queued_on(), Some(cpu(0)));

    sched.deactivate_task(&shell).unwrap();
    assert!(Arc::ptr_eq(&sched.schedule(cpu(0)).unwrap(), &bg));
}

#[test]
fn running_task_switches_class() {
    let cpus = Cpus::new();
    let fair = FifoClass::new();
    let sched = setup(&cpus, &fair, 1);

    let p = fair_task(&sched, "p", 0);
    assert!(Arc::ptr_eq(&sched.schedule(cpu(0)).unwrap(), &p));
    sched.scheduler_tick(cpu(0), 7_000).unwrap();

    sched.set_scheduler(&p, SchedPolicy::Opportunistic, None).unwrap();
    assert!(p.is_opportunistic());
    assert_eq!(p.stats.exec_start(), 7_000);
    assert_eq!(cpus.slot(cpu(0)).unwrap().curr_class(), ClassKind::Opportunistic);
    {
        let rq = cpus.rq(cpu(0)).lock();
        assert!(rq.need_resched());
        assert!(rq.opp().contains(&p));
    }
    assert_eq!(sched.rr_interval(&p), Ok(OPP_QUANTUM));

    sched.set_scheduler(&p, SchedPolicy::Normal, None).unwrap();
    assert!(!p.opp.is_queued());
    assert!(p.on_rq());
    assert_eq!(sched.rr_interval(&p), Ok(0));
    assert!(Arc::ptr_eq(&sched.schedule(cpu(0)).unwrap(), &p));
}

#[test]
fn clock_going_backwards_is_not_charged() {
    let cpus = Cpus::new();
    let fair = FifoClass::new();
    let sched = setup(&cpus, &fair, 1);

    let bg = opp(&sched, "bg", 0);
    sched.schedule(cpu(0)).unwrap();

    sched.scheduler_tick(cpu(0), 10_000_000).unwrap();
    assert_eq!(bg.stats.sum_exec_runtime(), 10_000_000);

    sched.scheduler_tick(cpu(0), 5_000_000).unwrap();
    assert_eq!(bg.stats.sum_exec_runtime(), 10_000_000);
    assert_eq!(bg.stats.exec_start(), 10_000_000);

    sched.scheduler_tick(cpu(0), 20_000_000).unwrap();
    assert_eq!(bg.stats.sum_exec_runtime(), 20_000_000);
    assert_eq!(bg.stats.exec_max(), 10_000_000);
}

#[test]
fn wakeups_walk_cpus_round_robin() {
    let cpus = Cpus::new();
    let fair = FifoClass::new();
    let sched = setup(&cpus, &fair, 3);

    let p = Task::new("bg", SchedPolicy::Opportunistic);
    assert_eq!(sched.wake_up_new_task(&p), Ok(cpu(1)));
    sched.deactivate_task(&p).unwrap();
    assert_eq!(sched.activate_task(&p, None), Ok(cpu(2)));
    sched.deactivate_task(&p).unwrap();
    assert_eq!(sched.activate_task(&p, None), Ok(cpu(0)));
    assert_eq!(p.stats.exec_start(), 0);
}

#[test]
fn woken_while_still_current_stays_on_its_cpu() {
    let cpus = Cpus::new();
    let fair = FifoClass::new();
    let sched = setup(&cpus, &fair, 2);

    let t = opp(&sched, "bg", 0);
    assert!(Arc::ptr_eq(&sched.schedule(cpu(0)).unwrap(), &t));

    // Dorme e acorda antes do próximo schedule da CPU 0
    sched.deactivate_task(&t).unwrap();
    assert_eq!(sched.activate_task(&t, None), Ok(cpu(0)));
    assert_eq!(t.cpu(), cpu(0));
    assert!(cpus.rq(cpu(0)).lock().opp().contains(&t));

    // A CPU 1 não pode pegar a mesma tarefa
    let other = sched.schedule(cpu(1)).unwrap();
    assert!(!Arc::ptr_eq(&other, &t));
    assert!(!cpus.rq(cpu(1)).lock().opp().contains(&t));

    sched.scheduler_tick(cpu(0), 1_000).unwrap();
    assert_eq!(t.opp.remaining(), OPP_QUANTUM - 1);
    assert!(Arc::ptr_eq(&sched.schedule(cpu(0)).unwrap(), &t));
}

#[test]
fn offline_target_falls_back_to_first_online() {
    let cpus = Cpus::new();
    let fair = FifoClass::new();
    let sched = setup(&cpus, &fair, 3);
    sched.teardown_cpu(cpu(1)).unwrap();
    assert_eq!(cpus.nr_cpu_ids(), 3);

    let p = Task::new("bg", SchedPolicy::Opportunistic);
    assert_eq!(sched.wake_up_new_task(&p), Ok(cpu(0)));

    let pinned = Task::new("pinned", SchedPolicy::Opportunistic);
    sched.set_cpus_allowed(&pinned, CpuMask::of(cpu(2))).unwrap();
    assert_eq!(sched.wake_up_new_task(&pinned), Ok(cpu(2)));
}

#[test]
fn cpu_management_errors() {
    let cpus = Cpus::new();
    let fair = FifoClass::new();
    let sched = setup(&cpus, &fair, 2);

    assert_eq!(sched.bringup_cpu(cpu(1)), Err(Errno::EALREADY));
    assert_eq!(sched.bringup_cpu(cpu(MAX_CPUS as u32)), Err(Errno::ENODEV));
    assert_eq!(sched.teardown_cpu(cpu(5)), Err(Errno::ENODEV));

    let bg = opp(&sched, "bg", 1);
    assert_eq!(sched.teardown_cpu(cpu(1)), Err(Errno::EBUSY));
    sched.task_exit(&bg).unwrap();
    assert_eq!(sched.teardown_cpu(cpu(1)), Ok(()));
    assert_eq!(sched.schedule(cpu(1)).err(), Some(Errno::ENODEV));
}

#[test]
fn fork_inherits_class() {
    let cpus = Cpus::new();
    let fair = FifoClass::new();
    let sched = setup(&cpus, &fair, 1);

    let parent = opp(&sched, "parent", 0);
    let child = sched.fork_task(&parent, "child").unwrap();
    assert!(child.is_opportunistic());
    assert!(!child.on_rq());
    assert_ne!(child.pid(), parent.pid());
    assert_eq!(sched.rr_interval(&child), Ok(OPP_QUANTUM));

    sched.wake_up_new_task(&child).unwrap();
    assert!(cpus.rq(cpu(0)).lock().opp().contains(&child));
}

#[test]
fn yield_to_and_yield_current() {
    let cpus = Cpus::new();
    let fair = FifoClass::new();
    let sched = setup(&cpus, &fair, 1);

    let t1 = opp(&sched, "t1", 0);
    let t2 = opp(&sched, "t2", 0);
    sched.schedule(cpu(0)).unwrap();
    assert!(!cpus.rq(cpu(0)).lock().need_resched());

    assert_eq!(sched.yield_to(&t2), Ok(true));
    assert!(cpus.rq(cpu(0)).lock().need_resched());

    sched.schedule(cpu(0)).unwrap();
    sched.yield_current(cpu(0)).unwrap();
    assert!(cpus.rq(cpu(0)).lock().need_resched());

    // Classe diferente da corrente: nada feito
    let f = fair_task(&sched, "f", 0);
    sched.schedule(cpu(0)).unwrap();
    assert_eq!(sched.yield_to(&t1), Ok(false));
    assert!(f.on_rq());
}

#[test]
fn affinity_and_migration() {
    let cpus = Cpus::new();
    let fair = FifoClass::new();
    let sched = setup(&cpus, &fair, 2);

    let t1 = opp(&sched, "t1", 0);
    assert_eq!(sched.set_cpus_allowed(&t1, CpuMask::NONE), Err(Errno::EINVAL));
    assert_eq!(sched.set_cpus_allowed(&t1, CpuMask::of(cpu(1))), Ok(()));
    assert_eq!(t1.cpus_allowed(), CpuMask::of(cpu(1)));

    sched.schedule(cpu(0)).unwrap();
    assert_eq!(sched.migrate_task(&t1, cpu(1)), Err(Errno::EBUSY));
    assert_eq!(sched.migrate_task(&t1, cpu(9)), Err(Errno::ENODEV));
    assert_eq!(sched.migrate_task(&t1, cpu(0)), Err(Errno::EINVAL));

    let t2 = opp(&sched, "t2", 0);
    sched.migrate_task(&t2, cpu(1)).unwrap();
    assert_eq!(t2.cpu(), cpu(1));
    assert!(cpus.rq(cpu(1)).lock().opp().contains(&t2));
    assert!(!cpus.rq(cpu(0)).lock().opp().contains(&t2));
}

#[test]
fn waker_records_wakee_flips() {
    let cpus = Cpus::new();
    let fair = FifoClass::new();
    let sched = setup(&cpus, &fair, 2);

    let waker = fair_task(&sched, "waker", 0);
    let a = Task::new("a", SchedPolicy::Opportunistic);
    let b = Task::new("b", SchedPolicy::Opportunistic);
    sched.activate_task(&a, Some(&waker)).unwrap();
    sched.activate_task(&b, Some(&waker)).unwrap();
    assert_eq!(waker.wakee.flips(), 2);
    assert_eq!(waker.wakee.last_wakee(), Some(b.pid()));
}

#[test]
fn two_cpus_pulling_from_each_other() {
    const TASKS: usize = 6;
    const ROUNDS: usize = 2_000;

    let cpus = Cpus::new();
    let fair = FifoClass::new();
    let sched = setup(&cpus, &fair, 2);

    let tasks: Vec<TaskRef> = (0..TASKS)
        .map(|i| opp(&sched, "bg", (i % 2) as u32))
        .collect();

    thread::scope(|s| {
        for me in 0..2u32 {
            let sched = &sched;
            s.spawn(move || {
                for round in 0..ROUNDS {
                    let next = match sched.schedule(cpu(me)) {
                        Ok(next) => next,
                        Err(_) => continue,
                    };
                    if let Some(there) = sched.curr(cpu(1 - me)) {
                        assert!(!Arc::ptr_eq(&there, &next), "corrente nas duas CPUs");
                    }
                    // Metade das voltas: a corrente dorme, sai da CPU e acorda
                    // na outra, esvaziando a fila local e forçando pulls
                    if next.is_opportunistic() && round % 2 == 0 && sched.deactivate_task(&next).is_ok() {
                        let _ = sched.schedule(cpu(me));
                        let _ = sched.activate_task(&next, None);
                    }
                }
            });
        }
    });

    let mut queued = 0;
    for n in 0..2 {
        let rq = cpus.rq(cpu(n)).lock();
        queued += rq.opp().len();
        for t in rq.opp().iter() {
            assert_eq!(t.opp.queued_on(), Some(cpu(n)));
            assert_eq!(t.cpu(), cpu(n));
        }
    }
    assert_eq!(queued, tasks.iter().filter(|t| t.on_rq()).count());
    assert_eq!(queued, TASKS);
}
