//! Vendor override resolution.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use tracing::debug;

use crate::error::{ResolveError, ResolveResult};
use crate::locator::ScriptsByName;
use crate::script::MigrationScript;

/// Vendor key for scripts without a vendor directory.
pub const DEFAULT_VENDOR: &str = "default";

/// Effective scripts grouped by version directory.
pub type ScriptsByVersionDir = BTreeMap<String, Vec<MigrationScript>>;

/// Picks one effective script per file name for the target vendor.
#[derive(Debug, Clone, Copy, Default)]
pub struct VendorResolver;

impl VendorResolver {
    /// Resolve each file name group to its effective script.
    ///
    /// The script registered for `target_vendor` wins, then the vendor-agnostic
    /// one. A group with neither contributes nothing.
    pub fn resolve(
        &self,
        grouped: ScriptsByName,
        target_vendor: Option<&str>,
    ) -> ResolveResult<ScriptsByVersionDir> {
        let mut by_version_dir = ScriptsByVersionDir::new();

        for (name, candidates) in grouped {
            let by_vendor = index_by_vendor(candidates)?;
            match pick_effective(by_vendor, target_vendor) {
                Some(script) => {
                    if script.vendor.is_some() {
                        debug!("Using vendor script {} for '{}'", script, name);
                    }
                    by_version_dir
                        .entry(script.version_dir.clone())
                        .or_default()
                        .push(script);
                }
                None => debug!(
                    "No script named '{}' applies to vendor {:?}, skipping",
                    name, target_vendor
                ),
            }
        }

        Ok(by_version_dir)
    }
}

fn vendor_key(script: &MigrationScript) -> &str {
    script.vendor.as_deref().unwrap_or(DEFAULT_VENDOR)
}

/// Build `vendor -> script`, rejecting a second script for the same vendor.
fn index_by_vendor(
    candidates: Vec<MigrationScript>,
) -> ResolveResult<BTreeMap<String, MigrationScript>> {
    let mut by_vendor = BTreeMap::new();
    for candidate in candidates {
        match by_vendor.entry(vendor_key(&candidate).to_string()) {
            Entry::Vacant(slot) => {
                slot.insert(candidate);
            }
            Entry::Occupied(slot) => {
                return Err(ResolveError::DuplicateVendorScript {
                    name: candidate.file_name.clone(),
                    vendor: slot.key().clone(),
                    script: candidate.to_string(),
                    previous: slot.get().to_string(),
                });
            }
        }
    }
    Ok(by_vendor)
}

fn pick_effective(
    mut by_vendor: BTreeMap<String, MigrationScript>,
    target_vendor: Option<&str>,
) -> Option<MigrationScript> {
    target_vendor
        .and_then(|vendor| by_vendor.remove(vendor))
        .or_else(|| by_vendor.remove(DEFAULT_VENDOR))
}
