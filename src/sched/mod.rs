//! # Multitasking & Scheduler Subsystem
//!
//! O módulo `sched` contém duas camadas:
//!
//! 1. **Núcleo hospedeiro (`sched::core`)**: a parte mínima do escalonador
//!    multi-classe que a classe oportunista precisa. Runqueue por CPU (`Rq`),
//!    tabela de CPUs (`Cpus`) com bring-up/teardown, o trait `SchedClass`, a
//!    cadeia ordenada de classes e o dispatcher (`Scheduler`).
//! 2. **Classe oportunista (`sched::opportunistic`)**: tarefas de fundo que
//!    só rodam quando o sistema está ocioso ou pouco carregado.
//!
//! ## 🏗️ Ordem das classes
//!
//! ```text
//! Rt  →  Fair  →  Opportunistic  →  Idle
//! ```
//!
//! Uma classe só é consultada quando todas as anteriores não têm nada para
//! rodar naquele núcleo. A oportunista ainda consulta a **admissão global**:
//! se o sistema já tem tarefas "de verdade" suficientes rodando, ela devolve
//! nada mesmo com a fila cheia.
//!
//! ## 🔒 Locks
//!
//! Todo hook de classe roda com o lock da runqueue local adquirido pelo
//! núcleo. O único lugar que adquire um segundo lock de runqueue é o
//! balanceador (`opportunistic::balance`), sempre em ordem crescente de CPU.

pub mod config;
pub mod core;
pub mod opportunistic;
pub mod task;
