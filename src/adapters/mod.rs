//! Store integrations for PhiGate.
//!
//! - [`database`] - Store traits and the factory that builds them
//! - [`postgresql`] - PostgreSQL implementation of both stores and the audit sink
//! - [`memory`] - In-memory implementation with outage simulation
//!
//! # Design Pattern
//!
//! Adapters follow the **Adapter Pattern** so the router and the retention
//! enforcer only ever see [`database::PhiStore`] and [`database::GeneralStore`].
//! Feature code never receives a store handle directly.
//!
//! ```rust
//! use phigate::adapters::database::PhiStore;
//! use phigate::adapters::memory::InMemoryPhiStore;
//!
//! # async fn example() -> phigate::domain::Result<()> {
//! let store = InMemoryPhiStore::new();
//! store.test_connection().await?;
//!
//! store.set_available(false);
//! assert!(store.test_connection().await.is_err());
//! # Ok(())
//! # }
//! ```

pub mod database;
pub mod memory;
pub mod postgresql;
