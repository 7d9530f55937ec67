//! # Classe de Escalonamento Oportunista
//!
//! Tarefas de fundo (indexação, backup, computação voluntária) que só
//! devem usar CPU que ninguém mais quer.
//!
//! ## Regras
//!
//! - **Fila por CPU**: FIFO, a tarefa corrente continua na cabeça.
//! - **Fatia fixa**: `OPP_QUANTUM` ticks; ao esgotar, vai para o fim da fila.
//! - **Admissão global**: com `OPP_ADMISSION_THRESHOLD` ou mais CPUs ocupadas
//!   no sistema, nenhuma tarefa oportunista é escolhida (elas esperam na
//!   fila, não são removidas).
//! - **Roubo de trabalho**: CPU com fila vazia puxa a segunda tarefa de
//!   outra CPU e devolve `Pick::Retry` ao núcleo.
//!
//! ## Componentes
//!
//! | Arquivo         | Responsabilidade                          |
//! |-----------------|-------------------------------------------|
//! | `entity.rs`     | Estado por tarefa (fatia, link de fila)   |
//! | `runqueue.rs`   | Fila por CPU e contadores                 |
//! | `admission.rs`  | Contagem global de CPUs ocupadas          |
//! | `accounting.rs` | Tempo de CPU e rotação por quantum        |
//! | `balance.rs`    | Pull entre CPUs com lock ordenado         |
//! | `class.rs`      | Os hooks de `SchedClass`                  |

pub mod accounting;
pub mod admission;
pub mod balance;
pub mod class;
pub mod entity;
pub mod runqueue;

pub use admission::{should_run, Busyness};
pub use class::{OpportunisticClass, OPP_CLASS};
pub use entity::OppEntity;
pub use runqueue::{OppRq, OppStats};
