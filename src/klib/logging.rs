// =============================================================================
// KERNEL LOGGING SYSTEM - ZERO OVERHEAD
// =============================================================================
//
// Sistema de logging do escalonador com custo ZERO quando desligado.
//
// ARQUITETURA:
// - Usa features do Cargo para compile-time filtering
// - Com feature "no_logs", TODOS os macros viram expressões vazias
// - SEM core::fmt - Apenas strings literais + um valor hex opcional
// - SEM alocação
// - A saída vai para um `LogSink` registrado pelo kernel hospedeiro
//   (serial, ring buffer, captura de testes...). Sem sink, descarta.
//
// NÍVEIS DE LOG (do mais crítico ao menos):
// - ERROR: Violações de invariante (a operação é recusada)
// - WARN:  Situações suspeitas mas recuperáveis
// - INFO:  Fluxo normal (bring-up de CPU, troca de política)
// - DEBUG: Informações de debugging
// - TRACE: Cada decisão do hot path (enqueue/dequeue/pick/pull)
//
// FEATURES:
// - no_logs:   Remove 100% dos logs
// - log_error: Apenas ERROR, WARN
// - log_info:  ERROR, WARN, INFO, DEBUG (padrão)
// - log_trace: Todos os níveis
//
// COMO USAR:
//   kinfo!("(Opp) CPU online");              // Apenas string
//   kinfo!("(Opp) CPU=", cpu.as_u32());      // String + hex
//
// ATENÇÃO: o sink é chamado com o lock do sink adquirido. Um sink que loga
// (direta ou indiretamente) vai travar o sistema.
//
// =============================================================================

use spin::Mutex;

// =============================================================================
// PREFIXOS COM CORES ANSI
// =============================================================================

pub const P_ERROR: &str = "\x1b[1;31m[ERRO]\x1b[0m ";
pub const P_WARN: &str = "\x1b[1;33m[WARN]\x1b[0m ";
pub const P_INFO: &str = "\x1b[32m[INFO]\x1b[0m ";
pub const P_DEBUG: &str = "\x1b[36m[DEBG]\x1b[0m ";
pub const P_TRACE: &str = "\x1b[35m[TRAC]\x1b[0m ";
pub const P_OK: &str = "\x1b[32m[OK]\x1b[0m ";
pub const P_FAIL: &str = "\x1b[1;31m[FAIL]\x1b[0m ";

/// Nível de uma linha de log
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
    Ok,
    Fail,
}

impl Level {
    /// Prefixo colorido para terminais ANSI
    pub const fn prefix(self) -> &'static str {
        match self {
            Level::Error => P_ERROR,
            Level::Warn => P_WARN,
            Level::Info => P_INFO,
            Level::Debug => P_DEBUG,
            Level::Trace => P_TRACE,
            Level::Ok => P_OK,
            Level::Fail => P_FAIL,
        }
    }
}

/// Destino das linhas de log.
///
/// Cada chamada recebe uma linha completa: a mensagem e, opcionalmente,
/// um valor que deve ser impresso em hexadecimal logo após ela.
pub trait LogSink: Sync {
    fn write_line(&self, level: Level, msg: &str, val: Option<u64>);
}

static SINK: Mutex<Option<&'static dyn LogSink>> = Mutex::new(None);

/// Registra o sink global. Substitui o anterior, se houver.
pub fn set_sink(sink: &'static dyn LogSink) {
    *SINK.lock() = Some(sink);
}

/// Remove o sink global (logs passam a ser descartados).
pub fn clear_sink() {
    *SINK.lock() = None;
}

/// Emite uma linha. Usado pelos macros; não chamar diretamente.
#[doc(hidden)]
pub fn emit(level: Level, msg: &str, val: Option<u64>) {
    let sink = SINK.lock();
    if let Some(sink) = *sink {
        sink.write_line(level, msg, val);
    }
}

// =============================================================================
// MACROS DE LOG - NÍVEL ERROR
// =============================================================================

#[cfg(not(feature = "no_logs"))]
#[macro_export]
macro_rules! kerror {
    ($msg:expr) => {{
        $crate::klib::logging::emit($crate::klib::logging::Level::Error, $msg, None);
    }};
    ($msg:expr, $val:expr) => {{
        $crate::klib::logging::emit(
            $crate::klib::logging::Level::Error,
            $msg,
            Some($val as u64),
        );
    }};
}

#[cfg(feature = "no_logs")]
#[macro_export]
macro_rules! kerror {
    ($($t:tt)*) => {{}};
}

// =============================================================================
// MACROS DE LOG - NÍVEL WARN
// =============================================================================

#[cfg(not(feature = "no_logs"))]
#[macro_export]
macro_rules! kwarn {
    ($msg:expr) => {{
        $crate::klib::logging::emit($crate::klib::logging::Level::Warn, $msg, None);
    }};
    ($msg:expr, $val:expr) => {{
        $crate::klib::logging::emit(
            $crate::klib::logging::Level::Warn,
            $msg,
            Some($val as u64),
        );
    }};
}

#[cfg(feature = "no_logs")]
#[macro_export]
macro_rules! kwarn {
    ($($t:tt)*) => {{}};
}

// =============================================================================
// MACROS DE LOG - NÍVEL INFO
// =============================================================================

#[cfg(not(any(feature = "no_logs", feature = "log_error")))]
#[macro_export]
macro_rules! kinfo {
    ($msg:expr) => {{
        $crate::klib::logging::emit($crate::klib::logging::Level::Info, $msg, None);
    }};
    ($msg:expr, $val:expr) => {{
        $crate::klib::logging::emit(
            $crate::klib::logging::Level::Info,
            $msg,
            Some($val as u64),
        );
    }};
}

#[cfg(any(feature = "no_logs", feature = "log_error"))]
#[macro_export]
macro_rules! kinfo {
    ($($t:tt)*) => {{}};
}

// =============================================================================
// MACROS DE LOG - NÍVEL DEBUG
// =============================================================================

#[cfg(any(feature = "log_trace", feature = "log_debug", feature = "log_info"))]
#[macro_export]
macro_rules! kdebug {
    ($msg:expr) => {{
        $crate::klib::logging::emit($crate::klib::logging::Level::Debug, $msg, None);
    }};
    ($msg:expr, $val:expr) => {{
        $crate::klib::logging::emit(
            $crate::klib::logging::Level::Debug,
            $msg,
            Some($val as u64),
        );
    }};
}

#[cfg(not(any(feature = "log_trace", feature = "log_debug", feature = "log_info")))]
#[macro_export]
macro_rules! kdebug {
    ($($t:tt)*) => {{}};
}

// =============================================================================
// MACROS DE LOG - NÍVEL TRACE
// =============================================================================
//
// ktrace! - Ativo apenas com log_trace. É o único nível usado dentro do
// hot path do escalonador, e mesmo assim atrás de um RateLimit.
//

#[cfg(feature = "log_trace")]
#[macro_export]
macro_rules! ktrace {
    ($msg:expr) => {{
        $crate::klib::logging::emit($crate::klib::logging::Level::Trace, $msg, None);
    }};
    ($msg:expr, $val:expr) => {{
        $crate::klib::logging::emit(
            $crate::klib::logging::Level::Trace,
            $msg,
            Some($val as u64),
        );
    }};
}

#[cfg(not(feature = "log_trace"))]
#[macro_export]
macro_rules! ktrace {
    ($($t:tt)*) => {{}};
}

// =============================================================================
// MACROS DE STATUS (OK/FAIL)
// =============================================================================

/// kok! - Log de sucesso (prefixo verde [OK]).
#[cfg(not(feature = "no_logs"))]
#[macro_export]
macro_rules! kok {
    ($msg:expr) => {{
        $crate::klib::logging::emit($crate::klib::logging::Level::Ok, $msg, None);
    }};
}

#[cfg(feature = "no_logs")]
#[macro_export]
macro_rules! kok {
    ($($t:tt)*) => {{}};
}

/// kfail! - Log de falha (prefixo vermelho [FAIL]).
#[cfg(not(feature = "no_logs"))]
#[macro_export]
macro_rules! kfail {
    ($msg:expr) => {{
        $crate::klib::logging::emit($crate::klib::logging::Level::Fail, $msg, None);
    }};
}

#[cfg(feature = "no_logs")]
#[macro_export]
macro_rules! kfail {
    ($($t:tt)*) => {{}};
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex as StdMutex;
    use std::vec::Vec;

    struct Capture(StdMutex<Vec<(Level, &'static str, Option<u64>)>>);

    impl LogSink for Capture {
        fn write_line(&self, level: Level, msg: &str, val: Option<u64>) {
            // Só guardamos as linhas deste teste (outros testes podem logar em paralelo).
            if msg.starts_with("(LogTest)") {
                let msg: &'static str = if msg.ends_with("valor=") {
                    "(LogTest) valor="
                } else {
                    "(LogTest) erro"
                };
                self.0.lock().unwrap().push((level, msg, val));
            }
        }
    }

    static CAPTURE: Capture = Capture(StdMutex::new(Vec::new()));

    #[test]
    fn prefixes_follow_levels() {
        assert_eq!(Level::Error.prefix(), P_ERROR);
        assert_eq!(Level::Trace.prefix(), P_TRACE);
        assert!(Level::Error < Level::Trace);
    }

    #[test]
    #[cfg(not(feature = "no_logs"))]
    fn sink_receives_whole_lines() {
        set_sink(&CAPTURE);
        crate::kerror!("(LogTest) erro");
        crate::kwarn!("(LogTest) valor=", 0x2a_u32);
        clear_sink();
        // Depois do clear nada mais chega.
        crate::kerror!("(LogTest) erro");

        let lines = CAPTURE.0.lock().unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], (Level::Error, "(LogTest) erro", None));
        assert_eq!(lines[1], (Level::Warn, "(LogTest) valor=", Some(0x2a)));
    }
}
