// crates/siteboot-core/src/runtime/registry.rs
// ============================================================================
// Module: Siteboot Site Registry
// Description: Host-name routing table and site directory index.
// Purpose: Resolve the site for an inbound host with wait-free reads.
// Dependencies: arc-swap, crate::core, crate::events, crate::interfaces
// ============================================================================

//! ## Overview
//! The registry publishes immutable [`SiteSnapshot`] values. A refresh reads
//! every site descriptor, builds a fresh routing table and directory index
//! off to the side, then swaps the whole snapshot in with a single pointer
//! store. Readers load the current pointer and never observe a partially
//! built table.
//!
//! Routing rules:
//! - The root site owns the empty key; a later root replaces an earlier one.
//! - Every other site claims each of its domains only if the domain is still
//!   free; the first site in store order wins a collision.
//! - Lookups are exact on the normalized host and fall back to the root site.
//!
//! Writers take a publish lock across generation assignment, build and
//! store, so generations are published in increasing order. A refresh also
//! holds it while reading the store. Readers never take it.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::PoisonError;

use arc_swap::ArcSwap;

use crate::core::site::DIRECTORY_DELIMITER;
use crate::core::site::SiteDescriptor;
use crate::core::site::normalize_host;
use crate::events::SiteEvent;
use crate::events::SiteEventKind;
use crate::events::SiteEventSink;
use crate::interfaces::SiteStore;
use crate::interfaces::StoreError;

// ============================================================================
// SECTION: Snapshot
// ============================================================================

/// A routing key that was already claimed when a later site asked for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainCollision {
    /// Contested routing key (empty for the root key).
    pub domain: String,
    /// Directory of the site that owns the key in the snapshot.
    pub kept_site_dir: String,
    /// Directory of the site that lost the key.
    pub dropped_site_dir: String,
}

/// Immutable routing state published by the registry.
///
/// # Invariants
/// - At most one entry per routing key.
/// - `directory_index` starts and ends with `|` and never contains a
///   directory that itself contains `|`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteSnapshot {
    /// Monotonic snapshot generation; zero for the initial empty snapshot.
    generation: u64,
    /// Routing key to site.
    routes: BTreeMap<String, Arc<SiteDescriptor>>,
    /// `|`-delimited site directory names.
    directory_index: String,
    /// Sites in store order.
    sites: Vec<Arc<SiteDescriptor>>,
    /// Collisions encountered while building.
    collisions: Vec<DomainCollision>,
    /// Directories excluded from the index.
    rejected_directories: Vec<String>,
}

impl SiteSnapshot {
    /// Returns the empty snapshot published before any refresh.
    #[must_use]
    pub fn empty() -> Self {
        Self::build(0, Vec::new())
    }

    /// Builds a snapshot from sites in store order.
    #[must_use]
    pub fn build(generation: u64, sites: Vec<SiteDescriptor>) -> Self {
        let mut routes: BTreeMap<String, Arc<SiteDescriptor>> = BTreeMap::new();
        let mut directory_index = String::from(DIRECTORY_DELIMITER);
        let mut collisions = Vec::new();
        let mut rejected_directories = Vec::new();
        let mut published = Vec::with_capacity(sites.len());
        for site in sites {
            let site = Arc::new(site);
            if site.site_dir.contains(DIRECTORY_DELIMITER) {
                rejected_directories.push(site.site_dir.clone());
            } else {
                directory_index.push_str(&site.site_dir);
                directory_index.push(DIRECTORY_DELIMITER);
            }
            if site.is_root {
                if let Some(previous) = routes.insert(String::new(), Arc::clone(&site)) {
                    collisions.push(DomainCollision {
                        domain: String::new(),
                        kept_site_dir: site.site_dir.clone(),
                        dropped_site_dir: previous.site_dir.clone(),
                    });
                }
            } else {
                for domain in site.domains() {
                    match routes.entry(domain) {
                        Entry::Vacant(slot) => {
                            slot.insert(Arc::clone(&site));
                        }
                        Entry::Occupied(slot) => collisions.push(DomainCollision {
                            domain: slot.key().clone(),
                            kept_site_dir: slot.get().site_dir.clone(),
                            dropped_site_dir: site.site_dir.clone(),
                        }),
                    }
                }
            }
            published.push(site);
        }
        Self {
            generation,
            routes,
            directory_index,
            sites: published,
            collisions,
            rejected_directories,
        }
    }

    /// Returns the snapshot generation.
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// Returns the routing table.
    #[must_use]
    pub const fn routes(&self) -> &BTreeMap<String, Arc<SiteDescriptor>> {
        &self.routes
    }

    /// Returns the `|`-delimited directory index.
    #[must_use]
    pub fn directory_index(&self) -> &str {
        &self.directory_index
    }

    /// Returns every site in store order.
    #[must_use]
    pub fn sites(&self) -> &[Arc<SiteDescriptor>] {
        &self.sites
    }

    /// Returns collisions recorded while building.
    #[must_use]
    pub fn collisions(&self) -> &[DomainCollision] {
        &self.collisions
    }

    /// Returns directories excluded from the index.
    #[must_use]
    pub fn rejected_directories(&self) -> &[String] {
        &self.rejected_directories
    }

    /// Returns the root site, if one is registered.
    #[must_use]
    pub fn root(&self) -> Option<&Arc<SiteDescriptor>> {
        self.routes.get("")
    }

    /// Exact lookup on the normalized host, without root fallback.
    #[must_use]
    pub fn lookup(&self, host: &str) -> Option<&Arc<SiteDescriptor>> {
        self.routes.get(&normalize_host(host))
    }

    /// Resolves `host` to its site, falling back to the root site.
    #[must_use]
    pub fn resolve(&self, host: &str) -> Option<&Arc<SiteDescriptor>> {
        self.lookup(host).or_else(|| self.root())
    }

    /// Returns true when `site_dir` is an indexed site directory.
    #[must_use]
    pub fn contains_directory(&self, site_dir: &str) -> bool {
        if site_dir.contains(DIRECTORY_DELIMITER) {
            return false;
        }
        let needle = format!("{DIRECTORY_DELIMITER}{site_dir}{DIRECTORY_DELIMITER}");
        self.directory_index.contains(&needle)
    }
}

impl Default for SiteSnapshot {
    fn default() -> Self {
        Self::empty()
    }
}

// ============================================================================
// SECTION: Registry
// ============================================================================

/// Atomically swappable site routing state.
///
/// # Invariants
/// - Published snapshots are never mutated.
/// - The published generation only increases; the last publish holds the
///   highest generation issued.
pub struct SiteRegistry {
    /// Currently published snapshot.
    current: ArcSwap<SiteSnapshot>,
    /// Last published generation; serializes writers.
    publish_lock: Mutex<u64>,
}

impl SiteRegistry {
    /// Creates a registry holding the empty snapshot.
    #[must_use]
    pub fn new() -> Self {
        Self {
            current: ArcSwap::from_pointee(SiteSnapshot::empty()),
            publish_lock: Mutex::new(0),
        }
    }

    /// Returns the currently published snapshot.
    #[must_use]
    pub fn snapshot(&self) -> Arc<SiteSnapshot> {
        self.current.load_full()
    }

    /// Builds and publishes a snapshot from `sites`.
    pub fn publish(
        &self,
        sites: Vec<SiteDescriptor>,
        events: &dyn SiteEventSink,
    ) -> Arc<SiteSnapshot> {
        let mut last = self.writer();
        self.publish_locked(&mut last, sites, events)
    }

    /// Reads every site from `store` and publishes a new snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when sites cannot be read; the previous snapshot
    /// stays published.
    pub fn refresh<S: SiteStore + ?Sized>(
        &self,
        store: &S,
        events: &dyn SiteEventSink,
    ) -> Result<Arc<SiteSnapshot>, StoreError> {
        let mut last = self.writer();
        let sites = store.all_sites()?;
        Ok(self.publish_locked(&mut last, sites, events))
    }

    /// Takes the publish lock, which holds the last published generation.
    fn writer(&self) -> MutexGuard<'_, u64> {
        self.publish_lock.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Builds, stores and reports the next generation while the lock is held.
    fn publish_locked(
        &self,
        last: &mut u64,
        sites: Vec<SiteDescriptor>,
        events: &dyn SiteEventSink,
    ) -> Arc<SiteSnapshot> {
        let generation = *last + 1;
        let snapshot = Arc::new(SiteSnapshot::build(generation, sites));
        for collision in snapshot.collisions() {
            events.record(
                &SiteEvent::new(SiteEventKind::DomainCollision)
                    .with_domain(&collision.domain)
                    .with_site_dir(&collision.dropped_site_dir)
                    .with_detail(format!("kept by {}", collision.kept_site_dir)),
            );
        }
        for site_dir in snapshot.rejected_directories() {
            events.record(&SiteEvent::new(SiteEventKind::DirectoryRejected).with_site_dir(site_dir));
        }
        self.current.store(Arc::clone(&snapshot));
        *last = generation;
        events.record(
            &SiteEvent::new(SiteEventKind::RegistryRefreshed)
                .with_count(snapshot.sites().len())
                .with_detail(format!("generation {generation}")),
        );
        snapshot
    }

    /// Resolves `host` against the current snapshot.
    #[must_use]
    pub fn resolve(&self, host: &str) -> Option<Arc<SiteDescriptor>> {
        self.current.load().resolve(host).cloned()
    }

    /// Returns true when `site_dir` is indexed in the current snapshot.
    #[must_use]
    pub fn is_registered_site_directory(&self, site_dir: &str) -> bool {
        self.current.load().contains_directory(site_dir)
    }
}

impl Default for SiteRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
