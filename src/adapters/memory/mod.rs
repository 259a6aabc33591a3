//! In-memory store adapters
//!
//! Implement [`PhiStore`](crate::adapters::database::PhiStore) and
//! [`GeneralStore`](crate::adapters::database::GeneralStore) over process
//! memory. Each store has an availability switch so tests can simulate an
//! outage of one store while the other stays up.

mod general;
mod phi;

pub use general::InMemoryGeneralStore;
pub use phi::InMemoryPhiStore;

use crate::domain::{Result, StorageError};
use std::sync::atomic::{AtomicBool, Ordering};

/// Availability switch shared by the memory stores
#[derive(Debug)]
pub(crate) struct Availability {
    name: &'static str,
    up: AtomicBool,
}

impl Availability {
    pub(crate) fn new(name: &'static str) -> Self {
        Self {
            name,
            up: AtomicBool::new(true),
        }
    }

    pub(crate) fn set(&self, available: bool) {
        self.up.store(available, Ordering::SeqCst);
    }

    pub(crate) fn check(&self) -> Result<()> {
        if self.up.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(StorageError::Unavailable(format!("{} is offline", self.name)).into())
        }
    }
}
