//=========================================================================
// Shell Facade
//
// Main entry point and service container for the shell.
//
// Architecture:
// ```text
//     ShellBuilder  ──build()──>  Shell
//         │                        ├─ EventBus
//         ├─ scene_root()          ├─ ResourceRegistry
//         ├─ ui_root()             ├─ SceneCoordinator
//         ├─ register_scene()      ├─ UiStackManager
//         └─ register_view()       └─ CommandQueue (hook requests)
// ```
//
// Every public mutating operation drains the command queue before
// returning, so requests made by lifecycle hooks and event handlers
// run at a clean boundary rather than re-entering a borrowed manager.
//
//=========================================================================

//=== Standard Library Imports ============================================

use std::cell::RefCell;
use std::rc::Rc;

//=== External Crates =====================================================

use log::{error, info};
use serde_json::Value;

//=== Internal Modules ====================================================

use crate::core::context::{CommandQueue, CoreServices, ShellCommand};
use crate::core::events::{Event, EventBus, EventKind};
use crate::core::resources::ResourceRegistry;
use crate::core::scene::{SceneCoordinator, SceneDescriptor, SceneFactory, SceneId, TransitionError};
use crate::core::ui::{UiDescriptor, UiError, UiId, UiStackManager, ViewFactory, ViewName};
use crate::host::{ShellHost, VisualId};

//=== Input Block State ===================================================

/// Reference-counted input-block bookkeeping fed by the bus.
///
/// Orchestration publishes `BlockInputShow`/`BlockInputHide` pairs
/// around every multi-step operation; the facade counts them so the
/// embedding application has one query to poll.
#[derive(Default)]
struct BlockState {
    refs: usize,
    reasons: Vec<String>,
}

//=== ShellBuilder ========================================================

/// Builder for configuring and constructing a [`Shell`].
///
/// Scenes and views are registered up front; the container hands each
/// subsystem its collaborators on `build()`.
///
/// # Examples
///
/// ```no_run
/// use vessel_shell::ShellBuilder;
/// use vessel_shell::core::resources::AssetKind;
/// use vessel_shell::core::scene::{Scene, SceneDescriptor, SceneId};
/// use vessel_shell::host::{FetchResult, ShellHost, TemplateRef, UiTransition, VisualId};
///
/// struct Headless;
/// impl ShellHost for Headless {
///     fn resolve_template(&mut self, _: &str) -> Option<TemplateRef> { Some(TemplateRef(0)) }
///     fn instantiate(&mut self, _: TemplateRef) -> anyhow::Result<VisualId> { Ok(VisualId(0)) }
///     fn destroy(&mut self, _: VisualId) {}
///     fn set_parent(&mut self, _: VisualId, _: VisualId) {}
///     fn set_active(&mut self, _: VisualId, _: bool) {}
///     fn fetch_directory(
///         &mut self,
///         _: &str,
///         _: AssetKind,
///         _: &mut dyn FnMut(f32),
///     ) -> anyhow::Result<FetchResult> { Ok(FetchResult::default()) }
///     fn release_asset(&mut self, _: &str) {}
///     fn play_transition(&mut self, _: VisualId, _: UiTransition) {}
///     fn play_effect(&mut self, _: &str) {}
/// }
///
/// struct Login;
/// impl Scene for Login {}
///
/// const LOGIN: SceneId = SceneId("SCENE_LOGIN");
///
/// let mut shell = ShellBuilder::new(Box::new(Headless))
///     .scene_root(VisualId(1))
///     .ui_root(VisualId(2))
///     .register_scene(
///         SceneDescriptor::new(LOGIN, vec!["Prefab/Scene/Login".into()], "Prefab/Scene/Login"),
///         Box::new(|| Box::new(Login)),
///     )
///     .build();
///
/// let _ = shell.goto_scene(LOGIN, None);
/// ```
pub struct ShellBuilder {
    host: Box<dyn ShellHost>,
    scene_root: Option<VisualId>,
    ui_root: Option<VisualId>,
    scenes: Vec<(SceneDescriptor, SceneFactory)>,
    views: Vec<(UiDescriptor, ViewFactory)>,
}

impl ShellBuilder {
    /// Creates a builder around the embedding application's host.
    pub fn new(host: Box<dyn ShellHost>) -> Self {
        Self {
            host,
            scene_root: None,
            ui_root: None,
            scenes: Vec::new(),
            views: Vec::new(),
        }
    }

    /// Sets the container node scene visuals mount under.
    pub fn scene_root(mut self, root: VisualId) -> Self {
        self.scene_root = Some(root);
        self
    }

    /// Sets the container node view visuals mount under.
    pub fn ui_root(mut self, root: VisualId) -> Self {
        self.ui_root = Some(root);
        self
    }

    /// Registers a scene.
    pub fn register_scene(mut self, descriptor: SceneDescriptor, factory: SceneFactory) -> Self {
        self.scenes.push((descriptor, factory));
        self
    }

    /// Registers a view.
    pub fn register_view(mut self, descriptor: UiDescriptor, factory: ViewFactory) -> Self {
        self.views.push((descriptor, factory));
        self
    }

    /// Builds the shell, wiring subsystems together and subscribing the
    /// facade's own input-block bookkeeping to the bus.
    pub fn build(self) -> Shell {
        info!(
            "Building shell ({} scene(s), {} view(s))",
            self.scenes.len(),
            self.views.len()
        );

        let events = EventBus::new();
        let mut scenes = SceneCoordinator::new();
        if let Some(root) = self.scene_root {
            scenes.set_scene_root(root);
        }
        for (descriptor, factory) in self.scenes {
            scenes.register(descriptor, factory);
        }

        let mut ui = UiStackManager::new();
        if let Some(root) = self.ui_root {
            ui.set_ui_root(root);
        }
        for (descriptor, factory) in self.views {
            ui.register(descriptor, factory);
        }

        let block = Rc::new(RefCell::new(BlockState::default()));
        let owner = events.allocate_owner();
        let on_show = Rc::clone(&block);
        events.subscribe(EventKind::BlockInputShow, owner, move |event| {
            if let Event::BlockInputShow { reason } = event {
                let mut state = on_show.borrow_mut();
                state.refs += 1;
                state.reasons.push(reason.clone());
            }
        });
        let on_hide = Rc::clone(&block);
        events.subscribe(EventKind::BlockInputHide, owner, move |event| {
            if let Event::BlockInputHide { reason } = event {
                let mut state = on_hide.borrow_mut();
                state.refs = state.refs.saturating_sub(1);
                if let Some(index) = state.reasons.iter().position(|r| r == reason) {
                    state.reasons.remove(index);
                }
            }
        });

        Shell {
            host: self.host,
            events,
            resources: ResourceRegistry::new(),
            scenes,
            ui,
            commands: CommandQueue::default(),
            block,
        }
    }
}

//=== Shell ===============================================================

/// Shell runtime: the service container over scene, UI, resource, and
/// event orchestration.
///
/// Create via [`ShellBuilder`]. All operations run synchronously on the
/// caller's thread; lifecycle hooks that want to mutate the shell queue
/// their requests through [`crate::core::ShellContext`] and the facade
/// drains them before the triggering operation returns.
pub struct Shell {
    host: Box<dyn ShellHost>,
    events: EventBus,
    resources: ResourceRegistry,
    scenes: SceneCoordinator,
    ui: UiStackManager,
    commands: CommandQueue,
    block: Rc<RefCell<BlockState>>,
}

impl Shell {
    //--- Scene Operations -------------------------------------------------

    /// Replaces the active scene. See [`SceneCoordinator::goto_scene`].
    pub fn goto_scene(&mut self, id: SceneId, params: Option<Value>) -> Result<(), TransitionError> {
        let result = {
            let (mut services, scenes, _) = self.split();
            scenes.goto_scene(&mut services, id, params)
        };
        self.pump();
        result
    }

    /// Hides the active scene's visual.
    pub fn hide_scene(&mut self) {
        let (mut services, scenes, _) = self.split();
        scenes.hide_scene(&mut services);
    }

    /// Restores the active scene's visual.
    pub fn show_scene(&mut self) {
        let (mut services, scenes, _) = self.split();
        scenes.show_scene(&mut services);
    }

    //--- UI Operations ----------------------------------------------------

    /// Opens a view above the current stack. See [`UiStackManager::open`].
    pub fn open_ui(&mut self, name: ViewName, data: Option<Value>) -> Result<(), UiError> {
        let result = {
            let (mut services, _, ui) = self.split();
            ui.open(&mut services, name, data)
        };
        self.pump();
        result
    }

    /// Closes one view instance.
    pub fn close_ui(&mut self, id: UiId) {
        {
            let (mut services, _, ui) = self.split();
            ui.close(&mut services, id);
        }
        self.pump();
    }

    /// Closes every stacked view.
    pub fn close_all_ui(&mut self) {
        {
            let (mut services, _, ui) = self.split();
            ui.close_all(&mut services);
        }
        self.pump();
    }

    /// Deactivates every view except the topmost one.
    pub fn hide_all_ui(&mut self) {
        let (mut services, _, ui) = self.split();
        ui.hide_all(&mut services);
    }

    /// Reactivates every view.
    pub fn show_all_ui(&mut self) {
        let (mut services, _, ui) = self.split();
        ui.show_all(&mut services);
    }

    //--- Queries ----------------------------------------------------------

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn resources(&self) -> &ResourceRegistry {
        &self.resources
    }

    pub fn current_scene(&self) -> Option<SceneId> {
        self.scenes.current_scene_id()
    }

    pub fn is_transitioning(&self) -> bool {
        self.scenes.is_transitioning()
    }

    /// The topmost live instance of `name`, if any.
    pub fn find_ui(&self, name: ViewName) -> Option<UiId> {
        self.ui.find(name)
    }

    pub fn has_any_ui(&self) -> bool {
        self.ui.has_any()
    }

    /// Whether any block reason is outstanding; the embedding
    /// application polls this to gate input delivery.
    pub fn is_input_blocked(&self) -> bool {
        self.block.borrow().refs > 0
    }

    /// Outstanding block reasons, in publication order.
    pub fn block_reasons(&self) -> Vec<String> {
        self.block.borrow().reasons.clone()
    }

    //--- Command Pump -----------------------------------------------------

    /// Drains hook-deferred requests until the queue is empty.
    ///
    /// Commands run with the full service set, so a drained command can
    /// queue further commands; the loop keeps going until quiescent.
    fn pump(&mut self) {
        while let Some(command) = self.commands.pop() {
            let (mut services, scenes, ui) = self.split();
            match command {
                ShellCommand::GotoScene { id, params } => {
                    if let Err(err) = scenes.goto_scene(&mut services, id, params) {
                        error!("deferred scene transition failed: {err:#}");
                    }
                }
                ShellCommand::OpenUi { name, data } => {
                    if let Err(err) = ui.open(&mut services, name, data) {
                        error!("deferred ui open failed: {err:#}");
                    }
                }
                ShellCommand::CloseUi { id } => ui.close(&mut services, id),
                ShellCommand::CloseAllUi => ui.close_all(&mut services),
                ShellCommand::HideAllUi => ui.hide_all(&mut services),
                ShellCommand::ShowAllUi => ui.show_all(&mut services),
            }
        }
    }

    /// Splits the container into the service set plus the two managers,
    /// so a manager can run against services built from the remaining
    /// fields.
    fn split(&mut self) -> (CoreServices<'_>, &mut SceneCoordinator, &mut UiStackManager) {
        (
            CoreServices {
                host: self.host.as_mut(),
                resources: &self.resources,
                events: &self.events,
                commands: &mut self.commands,
            },
            &mut self.scenes,
            &mut self.ui,
        )
    }
}

//=========================================================================
// Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::context::ShellContext;
    use crate::core::scene::Scene;
    use crate::core::test_support::{record_events, HookLog, MockHost, RecordingScene, RecordingView};
    use crate::core::ui::UiView;

    const LOGIN: SceneId = SceneId("SCENE_LOGIN");
    const LOBBY: SceneId = SceneId("SCENE_LOBBY");
    const MAIN: ViewName = ViewName("UIMain");
    const BAG: ViewName = ViewName("UIBag");

    fn scene_descriptor(id: SceneId, dirs: &[&str]) -> SceneDescriptor {
        SceneDescriptor::new(
            id,
            dirs.iter().map(|d| d.to_string()).collect(),
            format!("Prefab/Scene/{id}"),
        )
    }

    fn view_descriptor(name: ViewName, dirs: &[&str]) -> UiDescriptor {
        UiDescriptor::new(
            name,
            dirs.iter().map(|d| d.to_string()).collect(),
            format!("Prefab/UI/{name}"),
        )
    }

    fn basic_shell(hooks: &HookLog) -> Shell {
        let scene_log = hooks.clone();
        let lobby_log = hooks.clone();
        let main_log = hooks.clone();
        let bag_log = hooks.clone();
        ShellBuilder::new(Box::new(MockHost::new()))
            .scene_root(VisualId(1))
            .ui_root(VisualId(2))
            .register_scene(
                scene_descriptor(LOGIN, &["Prefab/Scene/Login"]),
                Box::new(move || Box::new(RecordingScene::new(LOGIN, scene_log.clone()))),
            )
            .register_scene(
                scene_descriptor(LOBBY, &["Prefab/Scene/Lobby"]),
                Box::new(move || Box::new(RecordingScene::new(LOBBY, lobby_log.clone()))),
            )
            .register_view(
                view_descriptor(MAIN, &["Prefab/UI/Main"]),
                Box::new(move || Box::new(RecordingView::new(MAIN, main_log.clone()))),
            )
            .register_view(
                view_descriptor(BAG, &[]).full_screen(true),
                Box::new(move || Box::new(RecordingView::new(BAG, bag_log.clone()))),
            )
            .build()
    }

    #[test]
    fn transition_unblocks_input_when_it_settles() {
        let hooks = HookLog::default();
        let mut shell = basic_shell(&hooks);
        let seen = record_events(shell.events());

        shell.goto_scene(LOGIN, None).unwrap();

        assert_eq!(shell.current_scene(), Some(LOGIN));
        assert!(!shell.is_input_blocked(), "block refs return to zero");
        assert!(shell.block_reasons().is_empty());

        let kinds = seen.kinds();
        let show = kinds.iter().position(|k| *k == EventKind::BlockInputShow).unwrap();
        let ended = kinds.iter().position(|k| *k == EventKind::SceneSwitchEnded).unwrap();
        let hide = kinds.iter().position(|k| *k == EventKind::BlockInputHide).unwrap();
        assert!(show < ended && ended < hide, "input stays blocked through the whole transition");
    }

    #[test]
    fn failed_transition_still_unblocks_input() {
        let hooks = HookLog::default();
        let mut shell = basic_shell(&hooks);

        let err = shell.goto_scene(SceneId("SCENE_NOWHERE"), None);
        assert!(err.is_err());
        assert!(!shell.is_input_blocked());
    }

    #[test]
    fn ui_flow_through_the_facade() {
        let hooks = HookLog::default();
        let mut shell = basic_shell(&hooks);

        shell.goto_scene(LOGIN, None).unwrap();
        shell.open_ui(MAIN, None).unwrap();
        shell.open_ui(BAG, None).unwrap();
        assert!(shell.has_any_ui());
        assert!(shell.find_ui(MAIN).is_some());
        assert!(shell.find_ui(BAG).is_some());

        let bag_id = shell.find_ui(BAG).unwrap();
        shell.close_ui(bag_id);
        assert!(shell.find_ui(BAG).is_none());
        assert!(shell.find_ui(MAIN).is_some());

        shell.close_all_ui();
        assert!(!shell.has_any_ui());
        assert!(!shell.is_input_blocked());
    }

    // Scene content that immediately forwards to another scene, the way
    // a splash scene hands off once its checks pass.
    struct ForwardingScene {
        next: SceneId,
    }

    impl Scene for ForwardingScene {
        fn did_enter(&mut self, ctx: &mut ShellContext<'_>, _params: Option<&Value>) {
            ctx.goto_scene(self.next, None);
        }
    }

    #[test]
    fn scene_hook_can_request_the_next_transition() {
        let hooks = HookLog::default();
        let lobby_log = hooks.clone();
        let mut shell = ShellBuilder::new(Box::new(MockHost::new()))
            .scene_root(VisualId(1))
            .register_scene(
                scene_descriptor(LOGIN, &[]),
                Box::new(|| Box::new(ForwardingScene { next: LOBBY })),
            )
            .register_scene(
                scene_descriptor(LOBBY, &[]),
                Box::new(move || Box::new(RecordingScene::new(LOBBY, lobby_log.clone()))),
            )
            .build();

        shell.goto_scene(LOGIN, None).unwrap();

        // The deferred request ran at the boundary: the first transition
        // fully settled, then the second one took over.
        assert_eq!(shell.current_scene(), Some(LOBBY));
        assert!(!shell.is_transitioning());
        assert_eq!(hooks.take(), vec!["SCENE_LOBBY.will_enter", "SCENE_LOBBY.did_enter"]);
    }

    struct SelfClosingView;

    impl UiView for SelfClosingView {
        fn on_open_end(&mut self, ctx: &mut ShellContext<'_>) {
            ctx.close_self();
        }
    }

    #[test]
    fn view_hook_can_close_its_own_instance() {
        let mut shell = ShellBuilder::new(Box::new(MockHost::new()))
            .ui_root(VisualId(2))
            .register_view(
                view_descriptor(MAIN, &[]),
                Box::new(|| Box::new(SelfClosingView)),
            )
            .build();
        let seen = record_events(shell.events());

        shell.open_ui(MAIN, None).unwrap();

        assert!(!shell.has_any_ui(), "the deferred close ran before open_ui returned");
        assert!(seen.find(EventKind::LastUiDestroyed).is_some());
    }

    #[test]
    fn scene_visibility_toggles_route_to_the_host() {
        let hooks = HookLog::default();
        let mut shell = basic_shell(&hooks);
        shell.goto_scene(LOGIN, None).unwrap();
        // No panic and no state change; the host interaction itself is
        // covered by the coordinator tests.
        shell.hide_scene();
        shell.show_scene();
        assert_eq!(shell.current_scene(), Some(LOGIN));
    }

    #[test]
    fn block_reasons_balance_across_overlapping_sources() {
        let hooks = HookLog::default();
        let shell = basic_shell(&hooks);

        shell.events().publish(&Event::BlockInputShow { reason: "netRequest".into() });
        shell.events().publish(&Event::BlockInputShow { reason: "cutscene".into() });
        assert!(shell.is_input_blocked());
        assert_eq!(shell.block_reasons(), vec!["netRequest", "cutscene"]);

        shell.events().publish(&Event::BlockInputHide { reason: "netRequest".into() });
        assert!(shell.is_input_blocked(), "one reason still outstanding");
        assert_eq!(shell.block_reasons(), vec!["cutscene"]);

        shell.events().publish(&Event::BlockInputHide { reason: "cutscene".into() });
        assert!(!shell.is_input_blocked());
    }

    #[test]
    fn hide_and_show_all_ui_route_to_the_stack() {
        let hooks = HookLog::default();
        let mut shell = basic_shell(&hooks);
        shell.open_ui(MAIN, None).unwrap();
        shell.hide_all_ui();
        shell.show_all_ui();
        assert!(shell.find_ui(MAIN).is_some());
    }
}
