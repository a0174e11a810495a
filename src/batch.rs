//! Batch variation rendering.
//!
//! The core of the `render` command: for each `<app>.<model>.<field>`
//! identifier, resolve the field against the catalog, walk the populated
//! records as a lazy single-pass sequence, and render each source file's
//! variations through [`render_variations`](crate::render::render_variations).
//!
//! The field's render policy is snapshotted once per batch. A predicate
//! policy is invoked per rendition request with that request's parameters;
//! a file whose predicate declines is skipped but still reported as
//! processed, so progress output is unaffected by policy decisions.
//!
//! A missing source file aborts the run unless `ignore_missing` is set, in
//! which case the file is skipped and counted. Identifier parse failures
//! abort before any resolution; resolution failures propagate as-is.

use crate::catalog::{Catalog, FieldPath, FieldPathError, RegistryError};
use crate::field::RenderPolicy;
use crate::progress::{ProgressMode, Reporter};
use crate::render::{RenderError, RenditionRequest, render_variations};
use crate::storage::Storage;
use log::debug;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BatchError {
    #[error(transparent)]
    FieldPath(#[from] FieldPathError),
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error(
        "source file {0:?} was not found, terminating; \
         use -i/--ignore-missing to skip missing sources"
    )]
    MissingSource(String),
    #[error(transparent)]
    Render(RenderError),
}

/// Flags for one `render` invocation. Replace and ignore-missing are
/// orthogonal.
#[derive(Debug, Clone, Copy, Default)]
pub struct RenderOptions {
    /// Rewrite variation files that already exist.
    pub replace: bool,
    /// Skip files whose source is absent instead of aborting.
    pub ignore_missing: bool,
    /// Force plain per-file progress lines.
    pub no_progress: bool,
}

impl RenderOptions {
    fn progress_mode(&self) -> ProgressMode {
        if self.no_progress {
            ProgressMode::Disabled
        } else {
            ProgressMode::Auto
        }
    }
}

/// Outcome counts for a run, printed as the closing summary line.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct RenderStats {
    /// Files reported to progress output.
    pub processed: u32,
    /// Variation files written.
    pub written: u32,
    /// Files skipped by the render policy.
    pub declined: u32,
    /// Missing source files skipped under ignore-missing.
    pub missing: u32,
}

impl fmt::Display for RenderStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} variations written across {} files",
            self.written, self.processed
        )?;
        if self.declined > 0 {
            write!(f, ", {} files declined by render policy", self.declined)?;
        }
        if self.missing > 0 {
            write!(f, ", {} missing sources skipped", self.missing)?;
        }
        Ok(())
    }
}

/// Render all variations for the given field identifiers.
///
/// Identifiers are handled in order; the first failure aborts the whole
/// run and later identifiers are not attempted.
pub fn render_field_paths(
    catalog: &Catalog,
    storage: &Arc<dyn Storage>,
    field_paths: &[String],
    options: &RenderOptions,
) -> Result<RenderStats, BatchError> {
    let mut stats = RenderStats::default();

    for raw in field_paths {
        let path = FieldPath::parse(raw)?;
        let resolved = catalog.resolve(&path)?;

        // One policy snapshot per batch, applied uniformly to every record.
        let policy = resolved.entry.render.clone();
        let count = resolved.count();
        debug!("{path}: {count} records");

        let reporter = Reporter::start(options.progress_mode(), count as u64);
        for file_name in resolved.source_files() {
            let request = RenditionRequest {
                file_name,
                variations: &resolved.entry.variations,
                replace: options.replace,
                storage: storage.as_ref(),
            };
            render_one(&request, &policy, options, &mut stats)?;
            stats.processed += 1;
            reporter.file_done(file_name);
        }
        reporter.finish();
    }

    Ok(stats)
}

/// Process one rendition request against the batch's policy snapshot.
fn render_one(
    request: &RenditionRequest<'_>,
    policy: &RenderPolicy,
    options: &RenderOptions,
    stats: &mut RenderStats,
) -> Result<(), BatchError> {
    if !policy.should_render(request) {
        debug!("{}: declined by render policy", request.file_name);
        stats.declined += 1;
        return Ok(());
    }
    match render_variations(request) {
        Ok(written) => {
            stats.written += written as u32;
            Ok(())
        }
        Err(RenderError::MissingSource(name)) => {
            if options.ignore_missing {
                debug!("{name}: source missing, skipped");
                stats.missing += 1;
                Ok(())
            } else {
                Err(BatchError::MissingSource(name))
            }
        }
        Err(e) => Err(BatchError::Render(e)),
    }
}
