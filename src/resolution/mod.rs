//! # Data Resolution Pipeline
//!
//! Turns a block spec and scope into a [`ResolvedDataset`](crate::models::ResolvedDataset).
//! Live provider data is preferred; the last live snapshot covers provider
//! failures and public viewers; synthetic demo data covers everything else.
//!
//! The provider client, snapshot persistence and authentication are
//! supplied by the host through the traits in [`providers`].

pub mod debounce;
pub mod providers;
pub mod resolver;
pub mod shaping;
pub mod snapshot;
pub mod synthetic;

pub use debounce::ResolutionTrigger;
pub use providers::{
    AuthenticationContext, ProviderQueryExecutor, ResolutionContext, SnapshotStore,
    StaticAuthentication, UnavailableExecutor,
};
pub use resolver::{BlockResolver, ResolutionTier};
pub use shaping::shape_rows;
pub use snapshot::InMemorySnapshotStore;
pub use synthetic::SyntheticGenerator;
