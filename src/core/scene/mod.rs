//=========================================================================
// Scene System
//=========================================================================
//
// Full-screen scene lifecycle: descriptors, the content trait, and the
// single-flight transition coordinator.
//
// Flow:
//   goto_scene() → diff directories → load → instantiate → enter hooks
//                → switch notification → exit hooks on the old scene
//                → release the old scene's directories
//
//=========================================================================

//=== External Dependencies ===============================================

use std::fmt;

use serde_json::Value;

//=== Internal Dependencies ===============================================

use crate::core::context::ShellContext;

//=== Module Declarations =================================================

mod coordinator;

//=== Public API ==========================================================

pub use coordinator::{SceneCoordinator, TransitionError, TransitionPhase};

//=== Scene Identity ======================================================

/// Identifies a registered scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SceneId(pub &'static str);

impl fmt::Display for SceneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

//=== Scene Descriptor ====================================================

/// Immutable description of a scene: the resource directories it needs
/// beyond the shared baseline and the template its root visual is
/// instantiated from.
#[derive(Debug, Clone)]
pub struct SceneDescriptor {
    pub id: SceneId,
    pub res_dirs: Vec<String>,
    pub template: String,
}

impl SceneDescriptor {
    pub fn new(id: SceneId, res_dirs: Vec<String>, template: impl Into<String>) -> Self {
        Self { id, res_dirs, template: template.into() }
    }
}

//=== Scene Trait =========================================================

/// Lifecycle hooks implemented by scene content.
///
/// All hooks have default empty implementations; the `will_*` pair may
/// fail, which the coordinator reports through its fail-open policy.
pub trait Scene {
    /// Called after the scene's visual is mounted, before the loading
    /// display completes.
    fn will_enter(
        &mut self,
        _ctx: &mut ShellContext<'_>,
        _params: Option<&Value>,
    ) -> anyhow::Result<()> {
        Ok(())
    }

    /// Called once the scene is fully entered.
    fn did_enter(&mut self, _ctx: &mut ShellContext<'_>, _params: Option<&Value>) {}

    /// Called on the outgoing scene before its visual is destroyed.
    fn will_exit(&mut self, _ctx: &mut ShellContext<'_>) -> anyhow::Result<()> {
        Ok(())
    }

    /// Called on the outgoing scene after `will_exit`, still before the
    /// visual is destroyed.
    fn did_exit(&mut self, _ctx: &mut ShellContext<'_>) {}
}

/// Produces a fresh content instance for each time the scene is entered.
pub type SceneFactory = Box<dyn Fn() -> Box<dyn Scene>>;
