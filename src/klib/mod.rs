//! Kernel Library (KLib).
//!
//! Utilitários agnósticos de hardware para uso interno do escalonador.
//! Funciona como uma extensão da `core` library.

#[macro_use]
pub mod logging;
pub mod ratelimit;
pub mod test_framework;

pub use logging::{Level, LogSink};
pub use ratelimit::RateLimit;
