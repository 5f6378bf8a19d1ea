//! Dependency resolution over the store's version and metadata views.
//!
//! The resolver never writes. It walks a semver-constrained dependency
//! graph breadth-first with an explicit worklist and depth counter,
//! selects the highest satisfying version per edge, degrades version
//! conflicts to a best-effort plan, and refuses cyclic graphs outright.

use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use berth_core::{highest_satisfying, parse_range, Dependency};
use berth_store::{Backing, EntityStore, StoreError};

use crate::error::{ResolveError, Result};

/// Version-and-dependency view of one stored entity.
#[derive(Debug, Clone, Default)]
pub struct EntityMeta {
    pub dependencies: Vec<Dependency>,
    pub provides: Vec<String>,
    pub requires: Vec<String>,
}

/// Read-only repository surface the resolver walks.
#[async_trait]
pub trait DependencyProvider: Send + Sync {
    /// All known versions of a package, any order. Empty when unknown.
    async fn versions_of(&self, id: &str) -> Result<Vec<String>>;

    /// Dependency/interface view of one entity, `None` when unknown.
    async fn entity_meta(&self, id: &str, version: &str) -> Result<Option<EntityMeta>>;
}

#[async_trait]
impl<B: Backing> DependencyProvider for EntityStore<B> {
    async fn versions_of(&self, id: &str) -> Result<Vec<String>> {
        match self.list_versions(id).await {
            Ok(versions) => Ok(versions),
            Err(StoreError::NotFound(_)) => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn entity_meta(&self, id: &str, version: &str) -> Result<Option<EntityMeta>> {
        match self.get(id, version).await {
            Ok(record) => Ok(Some(EntityMeta {
                dependencies: record.entity.dependencies().to_vec(),
                provides: record.entity.provides().to_vec(),
                requires: record.entity.requires().to_vec(),
            })),
            Err(StoreError::NotFound(_)) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

/// Bounds and policy for one resolver instance.
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Maximum traversal depth before resolution aborts.
    pub max_depth: usize,
    /// Whether a non-empty `missing` set fails resolution instead of
    /// being reported advisorily.
    pub missing_blocks: bool,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            max_depth: 32,
            missing_blocks: false,
        }
    }
}

/// One `(id, version)` pair in an install plan.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlanEntry {
    pub id: String,
    pub version: String,
}

impl PlanEntry {
    pub fn new(id: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            version: version.into(),
        }
    }
}

/// The outcome of resolving one root.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    /// Install plan in resolution order, root first.
    pub plan: Vec<PlanEntry>,
    /// Interface tags provided by the planned (and installed) entities.
    pub satisfies: Vec<String>,
    /// Required interface tags nothing in the plan provides. Advisory
    /// unless the blocking policy is enabled.
    pub missing: Vec<String>,
    /// Human-readable version-conflict reports; the plan omits the
    /// conflicting packages instead of aborting.
    pub conflicts: Vec<String>,
}

/// The dependency resolver.
pub struct Resolver {
    config: ResolverConfig,
}

impl Resolver {
    pub fn new(config: ResolverConfig) -> Self {
        Self { config }
    }

    /// Compute an install plan for `root` against the provider, given an
    /// optional already-installed set.
    pub async fn resolve<P: DependencyProvider>(
        &self,
        provider: &P,
        root_id: &str,
        root_version: &str,
        installed: &[PlanEntry],
    ) -> Result<Resolution> {
        let root_meta = provider
            .entity_meta(root_id, root_version)
            .await?
            .ok_or_else(|| ResolveError::RootNotFound(format!("{root_id}@{root_version}")))?;

        // A cyclic id-level graph has no linear install order; refuse it
        // before building any plan.
        self.check_cycles(provider, root_id).await?;

        let mut metas: HashMap<(String, String), EntityMeta> = HashMap::new();
        metas.insert(
            (root_id.to_string(), root_version.to_string()),
            root_meta,
        );

        // Installed entities are treated as already planned: they are not
        // re-planned or expanded, but their interfaces still count.
        let mut visited: HashSet<(String, String)> = installed
            .iter()
            .map(|entry| (entry.id.clone(), entry.version.clone()))
            .collect();
        let mut visited_edges: HashSet<(String, String)> = HashSet::new();

        let mut plan = vec![PlanEntry::new(root_id, root_version)];
        let mut conflicts: Vec<String> = Vec::new();
        let mut queue: VecDeque<(String, String, usize)> = VecDeque::new();

        visited.insert((root_id.to_string(), root_version.to_string()));
        queue.push_back((root_id.to_string(), root_version.to_string(), 0));

        while let Some((id, version, depth)) = queue.pop_front() {
            let meta = match metas.get(&(id.clone(), version.clone())) {
                Some(meta) => meta.clone(),
                None => match provider.entity_meta(&id, &version).await? {
                    Some(meta) => {
                        metas.insert((id.clone(), version.clone()), meta.clone());
                        meta
                    }
                    None => continue,
                },
            };

            if !meta.dependencies.is_empty() && depth + 1 > self.config.max_depth {
                return Err(ResolveError::DepthExceeded(self.config.max_depth));
            }

            for dep in &meta.dependencies {
                let edge = (dep.id.clone(), dep.range.clone());
                if !visited_edges.insert(edge) {
                    continue;
                }

                let selected = match parse_range(&dep.range) {
                    Ok(req) => {
                        let available = provider.versions_of(&dep.id).await?;
                        highest_satisfying(&available, &req)
                    }
                    Err(_) => None,
                };
                let Some(selected) = selected else {
                    conflicts.push(format!("no compatible version for {}@{}", dep.id, dep.range));
                    continue;
                };

                let selected = selected.to_string();
                if !visited.insert((dep.id.clone(), selected.clone())) {
                    continue;
                }
                plan.push(PlanEntry::new(&dep.id, &selected));
                queue.push_back((dep.id.clone(), selected, depth + 1));
            }
        }

        // Interface satisfaction over the final plan plus installed set.
        let mut satisfies: BTreeSet<String> = BTreeSet::new();
        let mut required: BTreeSet<String> = BTreeSet::new();
        for entry in plan.iter().chain(installed.iter()) {
            let key = (entry.id.clone(), entry.version.clone());
            let meta = match metas.get(&key) {
                Some(meta) => Some(meta.clone()),
                None => provider.entity_meta(&entry.id, &entry.version).await?,
            };
            if let Some(meta) = meta {
                satisfies.extend(meta.provides.iter().cloned());
                required.extend(meta.requires.iter().cloned());
            }
        }
        let missing: Vec<String> = required.difference(&satisfies).cloned().collect();

        if self.config.missing_blocks && !missing.is_empty() {
            return Err(ResolveError::MissingInterfaces(missing));
        }

        tracing::debug!(
            root_id,
            root_version,
            planned = plan.len(),
            conflicts = conflicts.len(),
            missing = missing.len(),
            "resolved dependency graph"
        );

        Ok(Resolution {
            plan,
            satisfies: satisfies.into_iter().collect(),
            missing,
            conflicts,
        })
    }

    /// Depth-first walk of the id-level graph (ignoring versions) with an
    /// explicit stack; any id re-entered while still on the stack is a
    /// cycle.
    async fn check_cycles<P: DependencyProvider>(
        &self,
        provider: &P,
        root_id: &str,
    ) -> Result<()> {
        let mut dep_ids_cache: HashMap<String, Vec<String>> = HashMap::new();

        let mut on_stack: HashSet<String> = HashSet::new();
        let mut done: HashSet<String> = HashSet::new();
        // Each frame: (id, children, next child index).
        let mut stack: Vec<(String, Vec<String>, usize)> = Vec::new();

        let children = dependency_ids(provider, root_id, &mut dep_ids_cache).await?;
        on_stack.insert(root_id.to_string());
        stack.push((root_id.to_string(), children, 0));

        loop {
            let next_child = {
                let Some(frame) = stack.last_mut() else { break };
                if frame.2 < frame.1.len() {
                    let child = frame.1[frame.2].clone();
                    frame.2 += 1;
                    Some(child)
                } else {
                    None
                }
            };

            match next_child {
                Some(child) => {
                    if on_stack.contains(&child) {
                        return Err(ResolveError::DependencyCycle(child));
                    }
                    if done.contains(&child) {
                        continue;
                    }
                    let grandchildren =
                        dependency_ids(provider, &child, &mut dep_ids_cache).await?;
                    on_stack.insert(child.clone());
                    stack.push((child, grandchildren, 0));
                }
                None => {
                    if let Some((id, _, _)) = stack.pop() {
                        on_stack.remove(&id);
                        done.insert(id);
                    }
                }
            }
        }

        Ok(())
    }
}

/// Union of dependency ids across every known version of a package.
async fn dependency_ids<P: DependencyProvider>(
    provider: &P,
    id: &str,
    cache: &mut HashMap<String, Vec<String>>,
) -> Result<Vec<String>> {
    if let Some(ids) = cache.get(id) {
        return Ok(ids.clone());
    }
    let mut ids: BTreeSet<String> = BTreeSet::new();
    for version in provider.versions_of(id).await? {
        if let Some(meta) = provider.entity_meta(id, &version).await? {
            ids.extend(meta.dependencies.iter().map(|dep| dep.id.clone()));
        }
    }
    let ids: Vec<String> = ids.into_iter().collect();
    cache.insert(id.to_string(), ids.clone());
    Ok(ids)
}
