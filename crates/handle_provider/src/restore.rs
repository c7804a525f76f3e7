//! Registration of caller-supplied handles (archive import and restore)
//!
//! A supplied handle is classified once:
//!
//! | handle   | history of what it resolves to | action                       |
//! |----------|--------------------------------|------------------------------|
//! | `X`      | exists                         | restore as version latest+1  |
//! | `X.N`    | exists                         | restore as version N         |
//! | `X.N`    | none, or `X` unbound           | restore as canonical         |
//! | `X`      | none                           | plain registration           |

use crate::errors::Result;
use crate::provider::VersionedHandleProvider;
use anyhow::{anyhow, Context};
use chrono::Utc;
use handle_types::{Capability, ContentObject, Handle, HistoryId};
use tracing::{debug, info};

/// Summary recorded on versions rebuilt from an archive.
pub const RESTORE_SUMMARY: &str = "Restoring from AIP Service";

impl VersionedHandleProvider {
    /// Bind a supplied handle, rebuilding version history where it implies one.
    pub fn register_identifier(&self, object: &ContentObject, identifier: &Handle) -> Result<()> {
        self.register_identifier_inner(object, identifier)
            .map_err(|err| self.fatal(object, "register_identifier", err))
    }

    fn register_identifier_inner(
        &self,
        object: &ContentObject,
        identifier: &Handle,
    ) -> anyhow::Result<()> {
        if object.capability() != Capability::Versionable {
            return self.register_plain(object, identifier);
        }

        let parsed = identifier.parse();
        match parsed.version {
            Some(number) => match self.history_behind(&parsed.canonical)? {
                Some(history) => {
                    let canonical = &parsed.canonical;
                    self.restore_as_version(object, identifier, number, canonical, history)
                }
                None => self.restore_as_canonical(object, identifier, number, &parsed.canonical),
            },
            None => match self.history_behind(identifier)? {
                // Restoring the latest version, which was archived under the canonical handle.
                Some(history) => {
                    let latest = self.history.latest(history)?.map_or(0, |v| v.number);
                    let number = latest
                        .checked_add(1)
                        .ok_or_else(|| anyhow!("{history} has no version number left"))?;
                    let versioned = identifier.with_version(number);
                    debug!(
                        handle = %identifier,
                        versioned = %versioned,
                        "resurrecting latest version"
                    );
                    self.restore_as_version(object, &versioned, number, identifier, history)
                }
                None => self.register_plain(object, identifier),
            },
        }
    }

    /// History of the object `handle` currently resolves to.
    fn history_behind(&self, handle: &Handle) -> anyhow::Result<Option<HistoryId>> {
        let current = self
            .resolver
            .resolve(handle)
            .with_context(|| format!("resolving {handle}"))?;
        match current {
            Some(current) => self.history.find_by_object(current),
            None => Ok(None),
        }
    }

    /// Reinsert `object` as version `number` of an existing history.
    fn restore_as_version(
        &self,
        object: &ContentObject,
        identifier: &Handle,
        number: u32,
        canonical: &Handle,
        history: HistoryId,
    ) -> anyhow::Result<()> {
        self.bind_restored(object, identifier)?;

        let latest = self.history.latest(history)?;
        self.history
            .create_version(history, object.id, RESTORE_SUMMARY, Utc::now(), number)
            .with_context(|| format!("restoring version {number} into {history}"))?;
        info!(object = %object.id, handle = %identifier, version = number, "restored version");

        if latest.map_or(true, |latest| number >= latest.number) {
            self.resolver.repoint(canonical, object.id)?;
            info!(
                handle = %canonical,
                object = %object.id,
                "canonical handle moved to restored latest version"
            );
        }
        Ok(())
    }

    /// Start a new history with `object` as version `number` and point `canonical` at it.
    fn restore_as_canonical(
        &self,
        object: &ContentObject,
        identifier: &Handle,
        number: u32,
        canonical: &Handle,
    ) -> anyhow::Result<()> {
        self.bind_restored(object, identifier)?;

        let history = self.history.create()?;
        self.history
            .create_version(history, object.id, RESTORE_SUMMARY, Utc::now(), number)
            .with_context(|| format!("restoring version {number} into new {history}"))?;

        self.resolver.repoint(canonical, object.id)?;
        info!(
            object = %object.id,
            handle = %identifier,
            canonical = %canonical,
            %history,
            "restored version as canonical"
        );
        Ok(())
    }

    /// Take over `identifier` for the restored object.
    fn bind_restored(&self, object: &ContentObject, identifier: &Handle) -> anyhow::Result<()> {
        self.resolver
            .create_with(object.id, identifier, true)
            .with_context(|| format!("binding restored handle {identifier}"))?;
        self.populate_descriptive_uri(object.id)
    }

    fn register_plain(&self, object: &ContentObject, identifier: &Handle) -> anyhow::Result<()> {
        self.resolver
            .create_with(object.id, identifier, false)
            .with_context(|| format!("binding handle {identifier}"))?;
        if object.capability() == Capability::Versionable {
            self.populate_descriptive_uri(object.id)?;
        }
        info!(object = %object.id, handle = %identifier, "registered handle");
        Ok(())
    }
}
