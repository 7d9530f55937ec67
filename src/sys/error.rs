//! # Standard Error Codes (Errno)
//!
//! Códigos de erro das chamadas de gerência do escalonador (bring-up e
//! teardown de CPU, troca de política). Os hooks do hot path NUNCA retornam
//! erro: falhas viram "nenhuma task" e o núcleo cai para a próxima classe.
//!
//! Segue a numeração POSIX/Linux. Valores negativos são usados em retornos
//! estilo syscall (isize).

#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Errno {
    EPERM = 1,     // Operation not permitted
    ESRCH = 3,     // No such process
    EBUSY = 16,    // Device or resource busy
    ENODEV = 19,   // No such device
    EINVAL = 22,   // Invalid argument
    EALREADY = 114, // Operation already in progress
}

impl Errno {
    pub fn as_usize(self) -> usize {
        self as usize
    }

    pub fn as_isize(self) -> isize {
        -(self as i32) as isize
    }

    /// Nome curto, para logs
    pub const fn name(self) -> &'static str {
        match self {
            Errno::EPERM => "EPERM",
            Errno::ESRCH => "ESRCH",
            Errno::EBUSY => "EBUSY",
            Errno::ENODEV => "ENODEV",
            Errno::EINVAL => "EINVAL",
            Errno::EALREADY => "EALREADY",
        }
    }
}

impl core::fmt::Display for Errno {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}
