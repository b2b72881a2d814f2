//=========================================================================
// Core Systems
//
// The orchestration subsystems behind the shell facade.
//
// Layout:
// - events:    closed-enum publish/subscribe bus
// - resources: reference-counted directory registry
// - scene:     single-flight scene transition coordinator
// - ui:        serialized, focus-aware view stack
// - context:   the limited surface handed to lifecycle hooks, plus the
//              deferred command queue the facade drains
//
// Notes:
// Everything here runs on one logical thread. Re-entrancy from hooks
// and event handlers is absorbed by shared handles (bus, registry) and
// by deferring mutating hook requests onto the command queue instead
// of calling back into an exclusively borrowed manager.
//
//=========================================================================

pub(crate) mod context;
pub mod events;
pub mod resources;
pub mod scene;
pub mod ui;

pub use context::ShellContext;

#[cfg(test)]
pub(crate) mod test_support;
