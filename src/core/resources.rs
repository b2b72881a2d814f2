//=========================================================================
// Resource Directory Registry
//=========================================================================
//
// Reference-counted load/release of named asset directories.
//
// A directory is loaded through the host exactly when its count rises
// from zero and released exactly when it returns to zero. Image
// directories additionally record the sub-asset names the fetch
// produced, because releasing one means releasing each named sub-asset
// rather than the directory handle itself.
//
// The registry is a cheap handle over shared state, like the event bus:
// progress callbacks and hooks running inside a fetch may re-enter it
// for the same path. Those callers resolve immediately; their reference
// is held pending and folded into the durable count when the fetch
// settles (dropped if it fails). A failed load leaves the path absent.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use log::{debug, info, warn};
use thiserror::Error;

//=== Internal Dependencies ===============================================

use crate::host::ShellHost;

//=== Asset Kind ==========================================================

/// Asset kind inferred from a directory path's first segment, used as a
/// fetch hint for the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    /// `Prefab/...`: instantiable template content.
    Template,
    /// `Texture/...Atlas...`: a packed sprite atlas.
    Atlas,
    /// Other `Texture/...`: loose images with addressable sub-assets.
    Image,
    /// `Spine/...`: skeletal animation data.
    Skeletal,
    /// `Json/...`: structured data documents.
    Data,
    /// Anything else; fetched untyped.
    Unknown,
}

impl AssetKind {
    pub fn infer(path: &str) -> AssetKind {
        match path.split('/').next().unwrap_or("") {
            "Prefab" => AssetKind::Template,
            "Texture" if path.contains("Atlas") => AssetKind::Atlas,
            "Texture" => AssetKind::Image,
            "Spine" => AssetKind::Skeletal,
            "Json" => AssetKind::Data,
            _ => AssetKind::Unknown,
        }
    }
}

//=== Errors ==============================================================

#[derive(Debug, Error)]
pub enum ResourceError {
    #[error("failed to fetch directory '{path}'")]
    Fetch {
        path: String,
        #[source]
        source: anyhow::Error,
    },
}

//=== Registry ============================================================

#[derive(Default)]
struct RegistryInner {
    /// Durable reference counts; a path is present iff its count is > 0.
    ref_counts: HashMap<String, usize>,
    /// Sub-asset names recorded for image directories.
    sub_assets: HashMap<String, Vec<String>>,
    /// References taken while a fetch for the path is still running.
    pending: HashMap<String, usize>,
}

/// Reference-counted registry of loaded asset directories.
///
/// Cloning yields another handle to the same counts; the registry never
/// holds its interior borrow across a host call, which is what makes
/// re-entry from progress callbacks and event handlers sound.
#[derive(Clone, Default)]
pub struct ResourceRegistry {
    inner: Rc<RefCell<RegistryInner>>,
}

impl ResourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    //--- Loading ----------------------------------------------------------

    /// Loads `path`, incrementing its reference count.
    ///
    /// Already-resident paths (count > 0) increment and return without
    /// touching the host. A path whose fetch is still in flight resolves
    /// immediately as well; that reference is folded in when the fetch
    /// settles. Otherwise the host fetch runs here, and the durable count
    /// becomes 1 only if it succeeds.
    pub fn load(
        &self,
        host: &mut dyn ShellHost,
        path: &str,
        on_progress: &mut dyn FnMut(f32),
    ) -> Result<(), ResourceError> {
        {
            let mut inner = self.inner.borrow_mut();
            if let Some(count) = inner.ref_counts.get_mut(path) {
                if *count > 0 {
                    *count += 1;
                    debug!("directory '{path}' already resident, count {count}");
                    return Ok(());
                }
            }
            if let Some(pending) = inner.pending.get_mut(path) {
                *pending += 1;
                debug!("directory '{path}' fetch in flight, pending ref recorded");
                return Ok(());
            }
            inner.pending.insert(path.to_string(), 0);
        }

        let kind = AssetKind::infer(path);
        debug!("fetching directory '{path}' as {kind:?}");
        let fetched = host.fetch_directory(path, kind, on_progress);

        let mut inner = self.inner.borrow_mut();
        let pending = inner.pending.remove(path).unwrap_or(0);
        match fetched {
            Ok(result) => {
                inner.ref_counts.insert(path.to_string(), 1 + pending);
                if kind == AssetKind::Image {
                    inner.sub_assets.insert(path.to_string(), result.sub_assets);
                }
                Ok(())
            }
            Err(source) => {
                if pending > 0 {
                    warn!("dropping {pending} pending reference(s) to failed directory '{path}'");
                }
                Err(ResourceError::Fetch { path: path.to_string(), source })
            }
        }
    }

    /// Loads each path in order, blending progress so every directory
    /// contributes an equal share of the overall signal.
    ///
    /// On a mid-sequence failure the successfully loaded prefix is
    /// released before the error propagates; a failed composite load
    /// leaves no references behind.
    pub fn load_many(
        &self,
        host: &mut dyn ShellHost,
        paths: &[String],
        mut on_progress: impl FnMut(f32),
    ) -> Result<(), ResourceError> {
        if paths.is_empty() {
            return Ok(());
        }
        let total = paths.len() as f32;
        for (index, path) in paths.iter().enumerate() {
            let base = index as f32;
            let loaded = self.load(host, path, &mut |fraction| {
                on_progress((base + fraction) / total);
            });
            if let Err(err) = loaded {
                for prefix_path in &paths[..index] {
                    self.release(host, prefix_path);
                }
                return Err(err);
            }
        }
        Ok(())
    }

    //--- Releasing --------------------------------------------------------

    /// Decrements `path`'s reference count, releasing the underlying
    /// asset(s) through the host when it reaches zero.
    ///
    /// Releasing a path that was never loaded, or whose count is already
    /// zero, is a logged no-op.
    pub fn release(&self, host: &mut dyn ShellHost, path: &str) {
        let subs = {
            let mut inner = self.inner.borrow_mut();
            match inner.ref_counts.get_mut(path) {
                None | Some(0) => {
                    debug!("release of unloaded directory '{path}' ignored");
                    return;
                }
                Some(count) => {
                    *count -= 1;
                    if *count > 0 {
                        debug!("directory '{path}' released, count {count}");
                        return;
                    }
                }
            }
            inner.ref_counts.remove(path);
            inner.sub_assets.remove(path)
        };

        match subs {
            Some(names) => {
                debug!("releasing {} sub-asset(s) of '{path}'", names.len());
                for name in names {
                    host.release_asset(&format!("{path}/{name}"));
                }
            }
            None => host.release_asset(path),
        }
    }

    /// Releases each path in order.
    pub fn release_many(&self, host: &mut dyn ShellHost, paths: &[String]) {
        for path in paths {
            self.release(host, path);
        }
    }

    //--- Queries ----------------------------------------------------------

    /// True iff the path's reference count is greater than zero.
    pub fn is_loaded(&self, path: &str) -> bool {
        self.ref_count(path) > 0
    }

    pub fn ref_count(&self, path: &str) -> usize {
        self.inner.borrow().ref_counts.get(path).copied().unwrap_or(0)
    }

    /// Logs every directory with a non-zero reference count.
    pub fn dump(&self) {
        let inner = self.inner.borrow();
        let mut entries: Vec<(&String, &usize)> =
            inner.ref_counts.iter().filter(|(_, count)| **count > 0).collect();
        entries.sort();
        info!("{} resident directory(ies)", entries.len());
        for (path, count) in entries {
            info!("  {path} x{count}");
        }
    }
}

//=========================================================================
// Tests
//=========================================================================
