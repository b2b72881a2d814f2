//=========================================================================
// Vessel Shell — Library Root
//
// This crate defines the public API surface of the shell.
//
// Responsibilities:
// - Expose the shell facade (`Shell`, `ShellBuilder`)
// - Expose the host contract the embedding application implements
// - Provide clean separation between the high-level facade and the
//   orchestration subsystems (events, resources, scenes, views)
//
// Typical usage:
// ```no_run
// use vessel_shell::prelude::*;
// # use vessel_shell::core::resources::AssetKind;
// # use vessel_shell::host::{FetchResult, TemplateRef, UiTransition};
// # struct MyHost;
// # impl ShellHost for MyHost {
// #     fn resolve_template(&mut self, _: &str) -> Option<TemplateRef> { None }
// #     fn instantiate(&mut self, _: TemplateRef) -> anyhow::Result<VisualId> { Ok(VisualId(0)) }
// #     fn destroy(&mut self, _: VisualId) {}
// #     fn set_parent(&mut self, _: VisualId, _: VisualId) {}
// #     fn set_active(&mut self, _: VisualId, _: bool) {}
// #     fn fetch_directory(
// #         &mut self,
// #         _: &str,
// #         _: AssetKind,
// #         _: &mut dyn FnMut(f32),
// #     ) -> anyhow::Result<FetchResult> { Ok(FetchResult::default()) }
// #     fn release_asset(&mut self, _: &str) {}
// #     fn play_transition(&mut self, _: VisualId, _: UiTransition) {}
// #     fn play_effect(&mut self, _: &str) {}
// # }
//
// let mut shell = ShellBuilder::new(Box::new(MyHost))
//     .scene_root(VisualId(1))
//     .ui_root(VisualId(2))
//     .build();
// ```
//
//=========================================================================

//--- Public Modules ------------------------------------------------------
//
// `core` contains the orchestration subsystems (events, resources,
// scenes, views). It is exposed publicly so scene and view content can
// name the types its hooks receive, but normal application code mostly
// uses the top-level `Shell` facade.
//
// `host` defines the contract the embedding application implements to
// give the shell a renderer and asset pipeline.
//
pub mod core;
pub mod host;
pub mod prelude;

//--- Internal Modules ----------------------------------------------------
//
// `framework` defines the facade and its builder.
//
mod framework;

//--- Public Exports ------------------------------------------------------
//
// Re-exports the facade as the main entry point for applications, so
// users can simply `use vessel_shell::{Shell, ShellBuilder};` without
// knowing the internal module structure.
//
pub use framework::{Shell, ShellBuilder};
