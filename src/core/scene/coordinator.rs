//=========================================================================
// Scene Transition Coordinator
//=========================================================================
//
// Single-flight state machine for full-screen scene replacement.
//
// States:
//   Idle → Preparing → LoadingResources → Instantiating → EnteringNew
//        → NotifyingSwitch → ExitingOld → ReleasingOld → Idle
//
// At most one transition runs at a time; a request while one is in
// flight is rejected, not queued, and a request for the already-active
// scene is rejected before anything is mutated. The epilogue always
// runs: whatever happens in the body, the coordinator returns to Idle,
// publishes the ended events, and hints the host to collect garbage.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::collections::HashMap;

use log::{debug, error, info, warn};
use serde_json::Value;
use thiserror::Error;

//=== Internal Dependencies ===============================================

use crate::core::context::CoreServices;
use crate::core::events::Event;
use crate::core::resources::ResourceError;
use crate::host::VisualId;
use super::{Scene, SceneDescriptor, SceneFactory, SceneId};

//=== Errors ==============================================================

#[derive(Debug, Error)]
pub enum TransitionError {
    #[error("a transition to '{0}' is already in progress")]
    AlreadyTransitioning(SceneId),

    #[error("scene '{0}' is already active")]
    AlreadyActive(SceneId),

    #[error("scene '{0}' is not registered")]
    UnknownScene(SceneId),

    #[error("template '{template}' for scene '{id}' could not be resolved")]
    MissingTemplate { id: SceneId, template: String },

    #[error("instantiation failed for scene '{id}'")]
    Instantiate {
        id: SceneId,
        #[source]
        source: anyhow::Error,
    },

    #[error("{hook} failed for scene '{id}'")]
    Hook {
        id: SceneId,
        hook: &'static str,
        #[source]
        source: anyhow::Error,
    },

    #[error(transparent)]
    Resource(#[from] ResourceError),
}

//=== Transition Phase ====================================================

/// Where a running transition currently is; `Idle` between transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionPhase {
    Idle,
    Preparing,
    LoadingResources,
    Instantiating,
    EnteringNew,
    NotifyingSwitch,
    ExitingOld,
    ReleasingOld,
}

//=== Coordinator =========================================================

struct RegisteredScene {
    descriptor: SceneDescriptor,
    factory: SceneFactory,
}

struct ActiveScene {
    id: SceneId,
    visual: VisualId,
    instance: Box<dyn Scene>,
    res_dirs: Vec<String>,
}

/// Sequences scene replacement: resource diffing, instantiation,
/// lifecycle hooks, and release of what the outgoing scene no longer
/// shares with the incoming one.
pub struct SceneCoordinator {
    scenes: HashMap<SceneId, RegisteredScene>,
    scene_root: Option<VisualId>,
    current: Option<ActiveScene>,
    going: Option<SceneId>,
    phase: TransitionPhase,
}

impl SceneCoordinator {
    pub fn new() -> Self {
        Self {
            scenes: HashMap::new(),
            scene_root: None,
            current: None,
            going: None,
            phase: TransitionPhase::Idle,
        }
    }

    //--- Registration -----------------------------------------------------

    /// Registers a scene descriptor with the factory producing its
    /// content instance.
    pub fn register(&mut self, descriptor: SceneDescriptor, factory: SceneFactory) {
        let id = descriptor.id;
        if self.scenes.insert(id, RegisteredScene { descriptor, factory }).is_some() {
            warn!("scene '{id}' was already registered and has been replaced");
        }
    }

    /// Sets the container every scene root visual is parented under.
    pub fn set_scene_root(&mut self, root: VisualId) {
        self.scene_root = Some(root);
    }

    //--- Transition -------------------------------------------------------

    /// Replaces the active scene with `id`.
    ///
    /// Rejections (a transition already in flight, the scene already
    /// active, an unregistered id) mutate nothing. A body failure is
    /// logged, partially created visuals are torn down, and the error is
    /// returned; the coordinator itself is back in `Idle` either way.
    pub fn goto_scene(
        &mut self,
        services: &mut CoreServices<'_>,
        id: SceneId,
        params: Option<Value>,
    ) -> Result<(), TransitionError> {
        if let Some(going) = self.going {
            warn!("scene '{going}' is going now, request for '{id}' rejected");
            return Err(TransitionError::AlreadyTransitioning(going));
        }
        if self.current.as_ref().map(|c| c.id) == Some(id) {
            warn!("scene '{id}' is running now, request rejected");
            return Err(TransitionError::AlreadyActive(id));
        }
        if !self.scenes.contains_key(&id) {
            warn!("scene '{id}' is not registered, request rejected");
            return Err(TransitionError::UnknownScene(id));
        }

        self.going = Some(id);
        let reason = format!("gotoScene:{id}");
        services.events.publish(&Event::BlockInputShow { reason: reason.clone() });

        let result = self.run_transition(services, id, params);
        if let Err(err) = &result {
            error!("transition to '{id}' failed: {err:#}");
        }

        // Epilogue: always return to Idle, even on failure.
        self.going = None;
        self.phase = TransitionPhase::Idle;
        services.events.publish(&Event::LoadingFinished);
        services.events.publish(&Event::SceneSwitchEnded);
        services.events.publish(&Event::BlockInputHide { reason });
        services.host.request_garbage_collect();
        result
    }

    fn run_transition(
        &mut self,
        services: &mut CoreServices<'_>,
        id: SceneId,
        params: Option<Value>,
    ) -> Result<(), TransitionError> {
        self.phase = TransitionPhase::Preparing;
        let registered = self
            .scenes
            .get(&id)
            .ok_or(TransitionError::UnknownScene(id))?;
        let descriptor = registered.descriptor.clone();
        let current_dirs: &[String] =
            self.current.as_ref().map(|c| c.res_dirs.as_slice()).unwrap_or(&[]);
        let need_release = difference(current_dirs, &descriptor.res_dirs);
        let need_load = difference(&descriptor.res_dirs, current_dirs);
        debug!(
            "transition to '{id}': load {} dir(s), release {} dir(s)",
            need_load.len(),
            need_release.len()
        );

        self.phase = TransitionPhase::LoadingResources;
        let stage = format!("gotoScene:{id}");
        let progress_events = services.events.clone();
        let progress_stage = stage.clone();
        services.resources.load_many(services.host, &need_load, move |fraction| {
            progress_events.publish(&Event::LoadingProgress {
                stage: progress_stage.clone(),
                fraction,
            });
        })?;

        self.phase = TransitionPhase::Instantiating;
        let template = services
            .host
            .resolve_template(&descriptor.template)
            .ok_or_else(|| TransitionError::MissingTemplate {
                id,
                template: descriptor.template.clone(),
            })?;
        let visual = services
            .host
            .instantiate(template)
            .map_err(|source| TransitionError::Instantiate { id, source })?;
        match self.scene_root {
            Some(root) => services.host.set_parent(visual, root),
            None => warn!("no scene root configured, '{id}' left unparented"),
        }
        let mut instance = (self.scenes[&id].factory)();

        services.events.publish(&Event::LoadingAutoProgress);

        self.phase = TransitionPhase::EnteringNew;
        let entered = {
            let mut ctx = services.hook_context(None);
            instance.will_enter(&mut ctx, params.as_ref())
        };
        if let Err(source) = entered {
            services.host.destroy(visual);
            return Err(TransitionError::Hook { id, hook: "will_enter", source });
        }
        services.events.publish(&Event::LoadingProgress { stage, fraction: 1.0 });
        {
            let mut ctx = services.hook_context(None);
            instance.did_enter(&mut ctx, params.as_ref());
        }

        self.phase = TransitionPhase::NotifyingSwitch;
        services.events.publish(&Event::SceneSwitch {
            from: self.current.as_ref().map(|c| c.id),
            to: id,
        });

        self.phase = TransitionPhase::ExitingOld;
        if let Some(mut old) = self.current.take() {
            let mut ctx = services.hook_context(None);
            // Exit hooks are best-effort on the way out; a failing hook on
            // the dying scene must not fail the transition itself.
            if let Err(err) = old.instance.will_exit(&mut ctx) {
                warn!("will_exit failed for scene '{}': {err:#}", old.id);
            }
            old.instance.did_exit(&mut ctx);
            services.host.destroy(old.visual);
        }

        self.phase = TransitionPhase::ReleasingOld;
        services.resources.release_many(services.host, &need_release);

        self.current = Some(ActiveScene {
            id,
            visual,
            instance,
            res_dirs: descriptor.res_dirs,
        });
        info!("scene '{id}' is now active");
        Ok(())
    }

    //--- Visibility -------------------------------------------------------

    /// Hides the active scene's visual without tearing it down.
    pub fn hide_scene(&mut self, services: &mut CoreServices<'_>) {
        match &self.current {
            Some(current) => services.host.set_active(current.visual, false),
            None => warn!("hide_scene with no active scene"),
        }
    }

    /// Restores the active scene's visual.
    pub fn show_scene(&mut self, services: &mut CoreServices<'_>) {
        match &self.current {
            Some(current) => services.host.set_active(current.visual, true),
            None => warn!("show_scene with no active scene"),
        }
    }

    //--- Queries ----------------------------------------------------------

    pub fn current_scene_id(&self) -> Option<SceneId> {
        self.current.as_ref().map(|c| c.id)
    }

    /// The in-flight target if a transition is running, otherwise the
    /// active scene. Answers "what scene is this shell heading for".
    pub fn pending_scene_id(&self) -> Option<SceneId> {
        self.going.or(self.current_scene_id())
    }

    pub fn is_transitioning(&self) -> bool {
        self.going.is_some()
    }

    pub fn phase(&self) -> TransitionPhase {
        self.phase
    }
}

impl Default for SceneCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

/// Elements of `a` absent from `b`, preserving `a`'s order.
fn difference(a: &[String], b: &[String]) -> Vec<String> {
    a.iter().filter(|item| !b.contains(item)).cloned().collect()
}

//=========================================================================
// Tests
//=========================================================================
