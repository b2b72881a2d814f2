//=========================================================================
// Prelude
//=========================================================================
//
// Convenience module that re-exports commonly used types and traits.
//
// Usage:
//   use vessel_shell::prelude::*;
//
//=========================================================================

//=== Public API ==========================================================

// Shell facade
pub use crate::framework::{Shell, ShellBuilder};

// Host contract
pub use crate::host::{ShellHost, VisualId};

// Scene system
pub use crate::core::scene::{Scene, SceneDescriptor, SceneId, TransitionError};

// UI system
pub use crate::core::ui::{UiDescriptor, UiId, UiView, ViewName};

// Event bus
pub use crate::core::events::{Event, EventBus, EventKind};

// Hook surface
pub use crate::core::ShellContext;
