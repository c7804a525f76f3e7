//! Version-aware handle provider
//!
//! Every public operation enters here. The provider classifies the
//! identifier and version situation, consults the version history tracker,
//! issues commands to the handle resolver, and keeps descriptive metadata in
//! sync. It holds no state of its own beyond its collaborators.
//!
//! Handle layout for a work `X` with versions `1..=n`:
//!
//! - `X` resolves to the object of version `n`
//! - `X.k` resolves to the object of version `k`, created lazily for `k = 1`

use crate::config::ProviderConfig;
use crate::errors::{IdentifierError, Result};
use crate::metadata::MetadataSynchronizer;
use crate::resolution::{handle_from_url, matches_scheme};
use crate::resolver::HandleResolver;
use crate::versioning::VersionHistoryTracker;
use anyhow::{anyhow, Context};
use handle_types::{
    Capability, ContentObject, Handle, HistoryId, IdentifierScheme, ObjectId, Version,
};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Outcome of minting inside an existing version history.
pub(crate) struct HistoryMint {
    /// `canonical.<version>` bound to the minted object.
    pub handle: Handle,
    pub canonical: Handle,
    pub previous: Version,
}

pub struct VersionedHandleProvider {
    pub(crate) config: ProviderConfig,
    pub(crate) resolver: Arc<dyn HandleResolver>,
    pub(crate) history: Arc<dyn VersionHistoryTracker>,
    pub(crate) metadata: Arc<dyn MetadataSynchronizer>,
}

impl VersionedHandleProvider {
    pub fn new(
        config: ProviderConfig,
        resolver: Arc<dyn HandleResolver>,
        history: Arc<dyn VersionHistoryTracker>,
        metadata: Arc<dyn MetadataSynchronizer>,
    ) -> Self {
        Self {
            config,
            resolver,
            history,
            metadata,
        }
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    /// Naming authority for freshly minted handles.
    pub fn prefix(&self) -> &str {
        &self.config.prefix
    }

    /// Only handles are served by this provider.
    pub fn supports_scheme(&self, scheme: IdentifierScheme) -> bool {
        scheme == IdentifierScheme::Handle
    }

    /// Whether `identifier` looks like something this provider can serve.
    pub fn supports(&self, identifier: &str) -> bool {
        if matches_scheme(identifier, &self.config.supported_schemes) {
            return true;
        }
        handle_from_url(identifier).is_some()
    }

    /// Return the object's handle, minting one if it has none.
    ///
    /// Inside a version history the new versioned handle is minted and the
    /// canonical handle is moved to the object.
    pub fn mint(&self, object: &ContentObject) -> Result<Handle> {
        self.mint_inner(object)
            .map_err(|err| self.fatal(object, "mint", err))
    }

    /// Mint and synchronize descriptive metadata for a newly created object.
    pub fn register(&self, object: &ContentObject) -> Result<Handle> {
        self.register_inner(object)
            .map_err(|err| self.fatal(object, "register", err))
    }

    /// Bind `identifier` to `object` exactly as given.
    pub fn reserve(&self, object: &ContentObject, identifier: &Handle) -> Result<()> {
        self.resolver
            .create_with(object.id, identifier, false)
            .with_context(|| format!("reserving {identifier}"))
            .map_err(|err| self.fatal(object, "reserve", err))?;
        info!(object = %object.id, handle = %identifier, "reserved handle");
        Ok(())
    }

    /// Object bound to `identifier`; resolver failures are logged and read as absent.
    pub fn resolve(&self, identifier: &Handle) -> Option<ObjectId> {
        match self.resolver.resolve(identifier) {
            Ok(found) => found,
            Err(err) => {
                error!(
                    handle = %identifier,
                    error = ?err,
                    "error while resolving handle to object"
                );
                None
            }
        }
    }

    /// Handle currently bound to `object`.
    pub fn lookup(&self, object: &ContentObject) -> Result<Handle> {
        match self.resolver.find_bound_identifier(object.id) {
            Ok(Some(handle)) => Ok(handle),
            Ok(None) => Err(IdentifierError::NotFound { object: object.id }),
            Err(source) => {
                error!(object = %object.id, error = ?source, "error while looking up handle");
                Err(IdentifierError::NotResolvable {
                    object: object.id,
                    source,
                })
            }
        }
    }

    /// Move the canonical handle off an object that is being removed.
    ///
    /// Only the latest version of a history with more than one version
    /// triggers a repoint; the removed version keeps its own handle.
    pub fn delete(&self, object: &ContentObject) -> Result<()> {
        if object.capability() != Capability::Versionable {
            return Ok(());
        }

        self.delete_inner(object).map_err(|err| {
            error!(object = %object.id, error = ?err, "error while moving canonical handle");
            IdentifierError::deletion(object.id, err)
        })
    }

    /// Same as [`delete`](Self::delete); the identifier itself is not revoked.
    pub fn delete_identifier(&self, object: &ContentObject, identifier: &Handle) -> Result<()> {
        debug!(object = %object.id, handle = %identifier, "delete requested for handle");
        self.delete(object)
    }

    fn mint_inner(&self, object: &ContentObject) -> anyhow::Result<Handle> {
        if let Some(existing) = self
            .resolver
            .find_bound_identifier(object.id)
            .context("looking up existing handle")?
        {
            return Ok(existing);
        }

        if let Some(history) = self.history_of(object)? {
            if let Some(minted) = self.mint_from_history(object.id, history)? {
                self.promote_canonical(object.id, &minted.canonical, Some(&minted.previous))?;
                return Ok(minted.handle);
            }
        }

        let handle = self
            .resolver
            .create(object.id)
            .context("creating new handle")?;
        info!(object = %object.id, handle = %handle, "minted handle");
        Ok(handle)
    }

    fn register_inner(&self, object: &ContentObject) -> anyhow::Result<Handle> {
        let handle = self.mint_inner(object)?;
        if object.capability() != Capability::Versionable {
            return Ok(handle);
        }

        if let Some(history) = self.history.find_by_object(object.id)? {
            let version = self.version_record(history, object.id)?;
            let previous = self.history.previous(history, &version)?;

            // The object may already carry its versioned handle (reserved or
            // minted earlier), in which case mint did not promote it.
            let is_latest = self
                .history
                .latest(history)?
                .is_some_and(|latest| latest.object == object.id);
            if is_latest {
                self.promote_canonical(object.id, &handle.canonical(), previous.as_ref())?;
            }

            if let Some(previous) = previous {
                if self.history.is_first(history, &previous)? {
                    let first = handle.canonical().with_version(previous.number);
                    self.metadata
                        .set_descriptive_uri(previous.object, &self.config.url_for(&first))
                        .context("rewriting first version descriptive URI")?;
                }
            }
        }

        self.populate_descriptive_uri(object.id)?;
        Ok(handle)
    }

    fn delete_inner(&self, object: &ContentObject) -> anyhow::Result<()> {
        let Some(history) = self.history.find_by_object(object.id)? else {
            return Ok(());
        };
        let Some(latest) = self.history.latest(history)? else {
            return Ok(());
        };
        if latest.object != object.id || self.history.versions(history)?.len() < 2 {
            return Ok(());
        }

        let previous = self
            .history
            .previous(history, &latest)?
            .ok_or_else(|| anyhow!("{history} has no version before {}", latest.number))?;
        let canonical = self
            .resolver
            .find_bound_identifier(previous.object)?
            .ok_or_else(|| anyhow!("version {} of {history} has no handle", previous.number))?
            .canonical();

        self.resolver.repoint(&canonical, previous.object)?;
        info!(
            handle = %canonical,
            object = %previous.object,
            version = previous.number,
            "canonical handle moved to previous version"
        );
        Ok(())
    }

    /// Versioned handle for `object` derived from its predecessor.
    ///
    /// Returns `None` when the object has no predecessor in the history.
    pub(crate) fn mint_from_history(
        &self,
        object: ObjectId,
        history: HistoryId,
    ) -> anyhow::Result<Option<HistoryMint>> {
        let version = self.version_record(history, object)?;
        let Some(previous) = self.history.previous(history, &version)? else {
            return Ok(None);
        };

        let canonical = match self.resolver.find_bound_identifier(previous.object)? {
            Some(handle) => handle.canonical(),
            None => {
                // Work created before versioned handles were enabled.
                let handle = self.resolver.create(previous.object)?;
                warn!(
                    object = %previous.object,
                    handle = %handle,
                    "previous version had no handle; minted canonical for legacy work"
                );
                handle
            }
        };

        if self.history.is_first(history, &previous)? {
            let first = canonical.with_version(previous.number);
            if self.resolver.resolve(&first)?.is_none() {
                self.resolver.create_with(previous.object, &first, true)?;
                info!(
                    object = %previous.object,
                    handle = %first,
                    "backfilled first version handle"
                );
            }
        }

        let handle = canonical.with_version(version.number);
        match self.resolver.resolve(&handle)? {
            // Left behind by a version discarded before it was archived.
            Some(stale) if stale != object => {
                warn!(
                    handle = %handle,
                    stale = %stale,
                    object = %object,
                    "repointing orphaned version handle"
                );
                self.resolver.repoint(&handle, object)?;
            }
            Some(_) => {}
            None => self.resolver.create_with(object, &handle, false)?,
        }
        info!(
            object = %object,
            handle = %handle,
            version = version.number,
            "minted version handle"
        );

        Ok(Some(HistoryMint {
            handle,
            canonical,
            previous,
        }))
    }

    /// Point `canonical` at the latest version `object`.
    ///
    /// A previous version left without any handle gets `canonical.<number>`,
    /// unless that handle already belongs to another object.
    fn promote_canonical(
        &self,
        object: ObjectId,
        canonical: &Handle,
        previous: Option<&Version>,
    ) -> anyhow::Result<()> {
        if self.resolver.resolve(canonical)? != Some(object) {
            self.resolver.repoint(canonical, object)?;
            info!(
                handle = %canonical,
                object = %object,
                "canonical handle moved to latest version"
            );
        }

        let Some(previous) = previous else {
            return Ok(());
        };
        if self.resolver.find_bound_identifier(previous.object)?.is_some() {
            return Ok(());
        }
        let handle = canonical.with_version(previous.number);
        match self.resolver.resolve(&handle)? {
            None => {
                self.resolver.create_with(previous.object, &handle, false)?;
                info!(
                    object = %previous.object,
                    handle = %handle,
                    "assigned versioned handle to legacy version"
                );
            }
            Some(owner) => {
                warn!(
                    object = %previous.object,
                    handle = %handle,
                    owner = %owner,
                    "previous version left without handle; versioned handle already taken"
                );
            }
        }
        Ok(())
    }

    /// Add the canonical URL as descriptive URI unless already present.
    pub(crate) fn populate_descriptive_uri(&self, object: ObjectId) -> anyhow::Result<()> {
        let Some(handle) = self.resolver.find_bound_identifier(object)? else {
            return Ok(());
        };
        let uri = self.config.canonical_url(&handle);
        if !self.metadata.descriptive_uris(object)?.contains(&uri) {
            self.metadata.add_descriptive_uri(object, &uri)?;
            debug!(object = %object, uri = %uri, "added descriptive URI");
        }
        Ok(())
    }

    fn history_of(&self, object: &ContentObject) -> anyhow::Result<Option<HistoryId>> {
        match object.capability() {
            Capability::Versionable => self.history.find_by_object(object.id),
            Capability::Identifiable => Ok(None),
        }
    }

    fn version_record(&self, history: HistoryId, object: ObjectId) -> anyhow::Result<Version> {
        self.history
            .find_version(history, object)?
            .ok_or_else(|| anyhow!("object {object} has no version record in {history}"))
    }

    pub(crate) fn fatal(
        &self,
        object: &ContentObject,
        operation: &'static str,
        err: anyhow::Error,
    ) -> IdentifierError {
        error!(
            operation,
            object = %object.id,
            error = ?err,
            "error while attempting to create handle"
        );
        IdentifierError::fatal(object.id, err)
    }
}
