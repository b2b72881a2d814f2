//=========================================================================
// Shell Host Interface
//=========================================================================
//
// Contract between the shell core and the rendering/asset host.
//
// The shell never touches a renderer, tween engine, or asset pipeline
// directly. Everything visual is reached through this trait: template
// resolution, instantiation, parenting, visibility, directory fetches,
// and the open/close transition and sound effects a view delegates.
//
//=========================================================================

//=== External Dependencies ===============================================

use anyhow::Result as HostResult;

//=== Internal Dependencies ===============================================

use crate::core::resources::AssetKind;

//=== Handle Types ========================================================

/// Opaque reference to instantiable visual content, produced by
/// [`ShellHost::resolve_template`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TemplateRef(pub u64);

/// Opaque handle to a mounted visual instance (or container node).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VisualId(pub u64);

//=== Fetch Result ========================================================

/// Outcome of a successful directory fetch.
#[derive(Debug, Clone, Default)]
pub struct FetchResult {
    /// Individually addressable sub-asset names produced by the directory.
    ///
    /// Only populated for image directories; releasing one of those must
    /// release each named sub-asset rather than a single handle.
    pub sub_assets: Vec<String>,
}

//=== Transition Kind =====================================================

/// Which delegated visual transition to run on a view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiTransition {
    Open,
    Close,
}

//=== ShellHost ===========================================================

/// Collaborator contract implemented by the embedding application.
///
/// All methods run on the single logical shell thread. Fallible methods
/// report failures as [`anyhow::Error`]; the shell wraps them with the
/// operation that was in flight and applies its own fail-open policy.
pub trait ShellHost {
    /// Resolves a template handle to instantiable content.
    ///
    /// Returns `None` when the handle is unknown; the shell treats that
    /// as a configuration error and drops the requesting operation.
    fn resolve_template(&mut self, handle: &str) -> Option<TemplateRef>;

    /// Instantiates a visual from resolved template content.
    fn instantiate(&mut self, template: TemplateRef) -> HostResult<VisualId>;

    /// Destroys a visual and everything under it.
    fn destroy(&mut self, visual: VisualId);

    /// Reparents a visual under a container node.
    fn set_parent(&mut self, visual: VisualId, container: VisualId);

    /// Toggles a visual's visibility.
    fn set_active(&mut self, visual: VisualId, active: bool);

    /// Fetches a named asset directory.
    ///
    /// `on_progress` is reported in `0.0..=1.0` for this directory alone;
    /// blending across a batch is the registry's job. The returned
    /// [`FetchResult`] carries sub-asset names when `kind` asks for them.
    fn fetch_directory(
        &mut self,
        path: &str,
        kind: AssetKind,
        on_progress: &mut dyn FnMut(f32),
    ) -> HostResult<FetchResult>;

    /// Releases a previously fetched directory handle or a single
    /// sub-asset by name.
    fn release_asset(&mut self, name: &str);

    /// Plays the delegated open/close transition for a view's visual.
    fn play_transition(&mut self, visual: VisualId, transition: UiTransition);

    /// Plays a one-shot sound effect by URL.
    fn play_effect(&mut self, url: &str);

    /// Hints that now is a good moment to collect garbage. Called once at
    /// the end of every scene transition, success or failure.
    fn request_garbage_collect(&mut self) {}
}
