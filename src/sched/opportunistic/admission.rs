//! Admissão global
//!
//! Tarefas oportunistas só podem ser escolhidas enquanto o sistema inteiro
//! tem menos de `OPP_ADMISSION_THRESHOLD` CPUs ocupadas (por tarefas
//! oportunistas ou "importantes"). Lê a classe publicada de cada CPU sem
//! pegar locks; um valor levemente atrasado é aceitável.

use crate::sched::config::OPP_ADMISSION_THRESHOLD;
use crate::sched::core::Cpus;
use crate::sched::task::ClassKind;

/// Contagem instantânea de CPUs ocupadas. Nunca guardada entre decisões.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Busyness {
    pub opportunistic_running: usize,
    pub important_running: usize,
}

impl Busyness {
    pub fn snapshot(cpus: &Cpus) -> Self {
        let mut b = Self::default();
        for slot in cpus.possible() {
            match slot.curr_class() {
                ClassKind::Opportunistic => b.opportunistic_running += 1,
                // Idle ou nada rodando (offline, nunca escalonada)
                ClassKind::Idle | ClassKind::None => {}
                ClassKind::Rt | ClassKind::Fair => b.important_running += 1,
            }
        }
        b
    }

    pub fn busy(&self) -> usize {
        self.opportunistic_running + self.important_running
    }

    pub fn admits(&self) -> bool {
        self.busy() < OPP_ADMISSION_THRESHOLD
    }
}

/// Tarefas oportunistas podem rodar agora?
pub fn should_run(cpus: &Cpus) -> bool {
    Busyness::snapshot(cpus).admits()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sys::CpuId;

    fn publish(cpus: &Cpus, cpu: u32, kind: ClassKind) {
        if let Some(slot) = cpus.slot(CpuId::new(cpu)) {
            slot.publish_curr(kind);
        }
    }

    #[test]
    fn idle_machine_admits() {
        let cpus = Cpus::new();
        assert_eq!(Busyness::snapshot(&cpus), Busyness::default());
        assert!(should_run(&cpus));
    }

    #[test]
    fn idle_and_empty_cpus_count_as_neither() {
        let cpus = Cpus::new();
        for cpu in 0..8 {
            publish(&cpus, cpu, ClassKind::Idle);
        }
        assert_eq!(Busyness::snapshot(&cpus).busy(), 0);
    }

    #[test]
    fn threshold_counts_both_kinds() {
        let cpus = Cpus::new();
        publish(&cpus, 0, ClassKind::Fair);
        publish(&cpus, 1, ClassKind::Rt);
        publish(&cpus, 2, ClassKind::Opportunistic);
        publish(&cpus, 3, ClassKind::Opportunistic);
        let b = Busyness::snapshot(&cpus);
        assert_eq!(b.important_running, 2);
        assert_eq!(b.opportunistic_running, 2);
        assert!(b.admits());

        publish(&cpus, 4, ClassKind::Fair);
        assert!(!should_run(&cpus));

        publish(&cpus, 4, ClassKind::Idle);
        assert!(should_run(&cpus));
    }
}
