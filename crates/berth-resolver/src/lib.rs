//! # Berth Resolver
//!
//! Dependency resolution for the Berth registry: compute an install
//! plan for a root entity's transitive dependencies against semver
//! range constraints.
//!
//! ## Key Properties
//!
//! - **Bounded**: worklist traversal with an explicit depth counter;
//!   no unbounded recursion, no runaway graphs
//! - **Best-effort on conflicts**: an unsatisfiable range is reported
//!   and skipped, not fatal
//! - **Strict on cycles**: a cyclic id-level graph fails with
//!   [`ResolveError::DependencyCycle`] and returns no partial plan
//! - **Advisory interface gaps**: `missing` never blocks unless the
//!   caller opts in via [`ResolverConfig::missing_blocks`]
//!
//! Resolution results may be cached in a [`ResolutionCache`]; each
//! entry remembers the package ids it read and is dropped on the next
//! write to any of them.

pub mod cache;
pub mod error;
pub mod resolver;

pub use cache::{ResolutionCache, TouchTracker};
pub use error::{ResolveError, Result};
pub use resolver::{
    DependencyProvider, EntityMeta, PlanEntry, Resolution, Resolver, ResolverConfig,
};
