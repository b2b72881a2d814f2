//=========================================================================
// UI System
//=========================================================================
//
// Layered views over the active scene: descriptors, the view content
// trait, and the serialized stack manager.
//
// Views open through a FIFO creation queue (one at a time, in request
// order) and stack in creation order. Full-screen views cull everything
// beneath them; closing the topmost view hands focus back to the new
// top.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::fmt;

use serde_json::Value;

//=== Internal Dependencies ===============================================

use crate::core::context::ShellContext;

//=== Module Declarations =================================================

mod stack;

//=== Public API ==========================================================

pub use stack::{UiError, UiStackManager};

//=== View Identity =======================================================

/// Identifies a registered view template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ViewName(pub &'static str);

impl fmt::Display for ViewName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// Identifies one live view instance on the stack. Two openings of the
/// same `ViewName` get distinct ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UiId(pub(crate) u64);

//=== View Descriptor =====================================================

/// Immutable description of a view: its resources, its template, and
/// the two stacking flags.
///
/// `full_screen` views cover the whole display and let the manager
/// deactivate everything beneath them. `hide_ui` marks a view as
/// eligible for that culling; views with it unset are left alone.
#[derive(Debug, Clone)]
pub struct UiDescriptor {
    pub name: ViewName,
    pub res_dirs: Vec<String>,
    pub template: String,
    pub full_screen: bool,
    pub hide_ui: bool,
}

impl UiDescriptor {
    pub fn new(name: ViewName, res_dirs: Vec<String>, template: impl Into<String>) -> Self {
        Self {
            name,
            res_dirs,
            template: template.into(),
            full_screen: false,
            hide_ui: true,
        }
    }

    pub fn full_screen(mut self, full_screen: bool) -> Self {
        self.full_screen = full_screen;
        self
    }

    pub fn hide_ui(mut self, hide_ui: bool) -> Self {
        self.hide_ui = hide_ui;
        self
    }
}

//=== View Trait ==========================================================

/// Lifecycle hooks implemented by view content.
///
/// Only `init` may fail; a failing `init` aborts that one opening and
/// the manager keeps draining its queue.
pub trait UiView {
    /// Called after the visual is mounted, with the opener's payload.
    fn init(&mut self, _ctx: &mut ShellContext<'_>, _data: Option<&Value>) -> anyhow::Result<()> {
        Ok(())
    }

    /// Called before the open transition plays.
    fn on_open_start(&mut self, _ctx: &mut ShellContext<'_>) {}

    /// Called after the open transition completes.
    fn on_open_end(&mut self, _ctx: &mut ShellContext<'_>) {}

    /// Called when the view starts closing, before its close transition.
    fn on_close_start(&mut self, _ctx: &mut ShellContext<'_>) {}

    /// Called after the close transition, just before teardown.
    fn on_close_end(&mut self, _ctx: &mut ShellContext<'_>) {}

    /// Called when the view becomes the topmost entry again.
    fn on_focus(&mut self, _ctx: &mut ShellContext<'_>) {}

    /// Called when another view opens above this one.
    fn on_lost_focus(&mut self, _ctx: &mut ShellContext<'_>) {}

    /// Instance-level override of the descriptor's `full_screen` flag.
    fn full_screen_override(&self) -> Option<bool> {
        None
    }

    /// Instance-level override of the descriptor's `hide_ui` flag.
    fn hide_ui_override(&self) -> Option<bool> {
        None
    }

    /// Sound effect to play when the view opens.
    fn open_effect(&self) -> Option<&str> {
        None
    }

    /// Sound effect to play when the view closes.
    fn close_effect(&self) -> Option<&str> {
        None
    }
}

/// Produces a fresh content instance for each opening of the view.
pub type ViewFactory = Box<dyn Fn() -> Box<dyn UiView>>;
