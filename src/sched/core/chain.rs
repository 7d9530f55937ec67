//! Cadeia de classes
//!
//! Lista ordenada de classes, consultada do topo (Rt) para baixo (Idle).
//! Cada `ClassKind` aparece no máximo uma vez.

use alloc::vec::Vec;

use super::class::SchedClass;
use crate::sched::task::ClassKind;
use crate::sys::Errno;

pub struct ClassChain<'a> {
    classes: Vec<&'a dyn SchedClass>,
}

impl<'a> ClassChain<'a> {
    /// Monta a cadeia na ordem de `ClassKind`, independente da ordem de
    /// `classes`. Classe repetida ou `ClassKind::None` é `EINVAL`.
    pub fn new(classes: &[&'a dyn SchedClass]) -> Result<Self, Errno> {
        let mut sorted: Vec<&'a dyn SchedClass> = classes.to_vec();
        sorted.sort_by_key(|c| c.kind());

        for pair in sorted.windows(2) {
            if pair[0].kind() == pair[1].kind() {
                crate::kerror!("(Sched) classe repetida na cadeia:", pair[0].kind() as u8);
                return Err(Errno::EINVAL);
            }
        }
        if sorted.iter().any(|c| c.kind() == ClassKind::None) {
            return Err(Errno::EINVAL);
        }

        Ok(Self { classes: sorted })
    }

    /// Classes em ordem de consulta
    pub fn iter(&self) -> impl Iterator<Item = &'a dyn SchedClass> + '_ {
        self.classes.iter().copied()
    }

    pub fn class_of(&self, kind: ClassKind) -> Option<&'a dyn SchedClass> {
        self.iter().find(|c| c.kind() == kind)
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}
