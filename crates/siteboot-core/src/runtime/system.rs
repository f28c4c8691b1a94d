// crates/siteboot-core/src/runtime/system.rs
// ============================================================================
// Module: Siteboot Site System
// Description: Owned installation state, site registry and installer wiring.
// Purpose: Expose the operations consumed by the request-handling layer.
// Dependencies: crate::core, crate::events, crate::interfaces, crate::runtime
// ============================================================================

//! ## Overview
//! [`SiteSystem`] owns one persistence handle, the installation flag and the
//! site registry for the lifetime of the process. Request handlers call
//! [`SiteSystem::check_installed`] and [`SiteSystem::resolve_site_by_host`];
//! administrative flows call [`SiteSystem::install_database`] and
//! [`SiteSystem::sync_database`].
//!
//! `check_installed` is a composition of [`SiteSystem::is_installed`] and
//! [`SiteSystem::refresh_site_registry`]: whenever installed state is (or
//! remains) true, the check also rebuilds the routing table. Callers that
//! only need the flag should use `is_installed`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use crate::core::catalog::SystemCatalog;
use crate::core::site::SiteDescriptor;
use crate::core::version::VersionInfo;
use crate::events::SiteEvent;
use crate::events::SiteEventKind;
use crate::events::SiteEventSink;
use crate::interfaces::Persistence;
use crate::interfaces::StoreError;
use crate::runtime::install_state::InstallationState;
use crate::runtime::installer::InstallError;
use crate::runtime::installer::InstallReport;
use crate::runtime::installer::Installer;
use crate::runtime::installer::SyncReport;
use crate::runtime::registry::SiteRegistry;
use crate::runtime::registry::SiteSnapshot;

// ============================================================================
// SECTION: Site System
// ============================================================================

/// Installation state machine plus site routing for one persistence backend.
///
/// # Invariants
/// - Once [`SiteSystem::is_installed`] returns true it never returns false.
/// - Published registry snapshots are immutable.
pub struct SiteSystem<P: Persistence> {
    /// Persistence collaborator.
    persistence: Arc<P>,
    /// Target schema.
    catalog: SystemCatalog,
    /// Version metadata.
    versions: VersionInfo,
    /// Installed flag.
    state: InstallationState,
    /// Site routing state.
    registry: SiteRegistry,
    /// Event sink.
    events: Arc<dyn SiteEventSink>,
}

impl<P: Persistence> SiteSystem<P> {
    /// Creates a system over `persistence`.
    #[must_use]
    pub fn new(
        persistence: Arc<P>,
        catalog: SystemCatalog,
        versions: VersionInfo,
        events: Arc<dyn SiteEventSink>,
    ) -> Self {
        Self {
            persistence,
            catalog,
            versions,
            state: InstallationState::new(),
            registry: SiteRegistry::new(),
            events,
        }
    }

    /// Returns the persistence handle.
    #[must_use]
    pub const fn persistence(&self) -> &Arc<P> {
        &self.persistence
    }

    /// Returns the system catalog.
    #[must_use]
    pub const fn catalog(&self) -> &SystemCatalog {
        &self.catalog
    }

    /// Returns read-only version metadata.
    #[must_use]
    pub const fn versions(&self) -> &VersionInfo {
        &self.versions
    }

    /// Returns an installer borrowing this system's components.
    #[must_use]
    pub fn installer(&self) -> Installer<'_, P> {
        Installer::new(
            self.persistence.as_ref(),
            &self.catalog,
            &self.versions,
            &self.state,
            &self.registry,
            self.events.as_ref(),
        )
    }

    /// Returns the installed flag, reading the persisted marker only until
    /// installation is confirmed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the persisted marker cannot be read.
    pub fn is_installed(&self) -> Result<bool, StoreError> {
        let was_installed = self.state.cached();
        let installed = self.state.is_installed(self.persistence.as_ref())?;
        if installed && !was_installed {
            self.events.record(&SiteEvent::new(SiteEventKind::InstallConfirmed));
        }
        Ok(installed)
    }

    /// Rebuilds the routing table and directory index from the store.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when sites cannot be read.
    pub fn refresh_site_registry(&self) -> Result<Arc<SiteSnapshot>, StoreError> {
        self.registry.refresh(self.persistence.as_ref(), self.events.as_ref())
    }

    /// Returns the installed flag and, when installed, refreshes the registry.
    ///
    /// A `false` result is a normal outcome until an install or sync succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the marker or the site list cannot be read.
    pub fn check_installed(&self) -> Result<bool, StoreError> {
        if !self.is_installed()? {
            return Ok(false);
        }
        self.refresh_site_registry()?;
        Ok(true)
    }

    /// Returns the currently published registry snapshot.
    #[must_use]
    pub fn current_snapshot(&self) -> Arc<SiteSnapshot> {
        self.registry.snapshot()
    }

    /// Resolves `host` to its site, falling back to the root site.
    #[must_use]
    pub fn resolve_site_by_host(&self, host: &str) -> Option<Arc<SiteDescriptor>> {
        self.registry.resolve(host)
    }

    /// Returns true when `site_dir` is a registered site directory.
    #[must_use]
    pub fn is_registered_site_directory(&self, site_dir: &str) -> bool {
        self.registry.is_registered_site_directory(site_dir)
    }

    /// Syncs the database and creates the bootstrap administrator.
    ///
    /// # Errors
    ///
    /// See [`Installer::install_database`].
    pub fn install_database(
        &self,
        admin_name: &str,
        admin_password: &str,
    ) -> Result<InstallReport, InstallError> {
        self.installer().install_database(admin_name, admin_password)
    }

    /// Syncs the database schema and version stamp.
    ///
    /// # Errors
    ///
    /// See [`Installer::sync_database`].
    pub fn sync_database(&self) -> Result<SyncReport, InstallError> {
        self.installer().sync_database()
    }

    /// Returns true when a sync should run.
    ///
    /// # Errors
    ///
    /// See [`Installer::is_need_update`].
    pub fn is_need_update(&self) -> Result<bool, StoreError> {
        self.installer().is_need_update()
    }
}
