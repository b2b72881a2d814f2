//=========================================================================
// Test Support
//=========================================================================
//
// Shared doubles for the core test suites: a scriptable host, hook
// recorders for scenes and views, and an event tap.
//
//=========================================================================

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use anyhow::anyhow;
use serde_json::Value;

use crate::core::context::ShellContext;
use crate::core::events::{Event, EventBus, EventKind};
use crate::core::resources::AssetKind;
use crate::core::scene::{Scene, SceneId};
use crate::core::ui::{UiView, ViewName};
use crate::host::{FetchResult, ShellHost, TemplateRef, UiTransition, VisualId};

//=== MockHost ============================================================

/// Scriptable [`ShellHost`] recording every call.
///
/// Fetches report progress `0.5` then `1.0` per directory unless told
/// to fail; visual ids are allocated from `100` upward so they never
/// collide with hand-picked container ids in tests.
pub struct MockHost {
    pub instantiated: Vec<VisualId>,
    pub destroyed: Vec<VisualId>,
    pub parented: Vec<(VisualId, VisualId)>,
    pub activations: Vec<(VisualId, bool)>,
    pub released: Vec<String>,
    pub transitions: Vec<(VisualId, UiTransition)>,
    pub effects: Vec<String>,
    pub gc_hints: usize,
    fetch_counts: HashMap<String, usize>,
    sub_assets: HashMap<String, Vec<String>>,
    failing: HashSet<String>,
    failing_after_progress: HashSet<String>,
    missing_templates: HashSet<String>,
    next_visual: u64,
    next_template: u64,
}

impl MockHost {
    pub fn new() -> Self {
        Self {
            instantiated: Vec::new(),
            destroyed: Vec::new(),
            parented: Vec::new(),
            activations: Vec::new(),
            released: Vec::new(),
            transitions: Vec::new(),
            effects: Vec::new(),
            gc_hints: 0,
            fetch_counts: HashMap::new(),
            sub_assets: HashMap::new(),
            failing: HashSet::new(),
            failing_after_progress: HashSet::new(),
            missing_templates: HashSet::new(),
            next_visual: 100,
            next_template: 0,
        }
    }

    /// How many times `path` was fetched, re-entrant attempts included.
    pub fn fetches(&self, path: &str) -> usize {
        self.fetch_counts.get(path).copied().unwrap_or(0)
    }

    /// Scripts the sub-asset names the next fetch of `path` returns.
    pub fn set_sub_assets(&mut self, path: &str, names: &[&str]) {
        self.sub_assets
            .insert(path.to_string(), names.iter().map(|n| n.to_string()).collect());
    }

    /// Makes fetches of `path` fail before any progress is reported.
    pub fn fail_fetch(&mut self, path: &str) {
        self.failing.insert(path.to_string());
    }

    /// Makes fetches of `path` fail after one progress tick.
    pub fn fail_fetch_after_progress(&mut self, path: &str) {
        self.failing_after_progress.insert(path.to_string());
    }

    /// Makes `resolve_template` return `None` for `handle`.
    pub fn missing_template(&mut self, handle: &str) {
        self.missing_templates.insert(handle.to_string());
    }
}

impl Default for MockHost {
    fn default() -> Self {
        Self::new()
    }
}

impl ShellHost for MockHost {
    fn resolve_template(&mut self, handle: &str) -> Option<TemplateRef> {
        if self.missing_templates.contains(handle) {
            return None;
        }
        self.next_template += 1;
        Some(TemplateRef(self.next_template))
    }

    fn instantiate(&mut self, _template: TemplateRef) -> anyhow::Result<VisualId> {
        self.next_visual += 1;
        let visual = VisualId(self.next_visual);
        self.instantiated.push(visual);
        Ok(visual)
    }

    fn destroy(&mut self, visual: VisualId) {
        self.destroyed.push(visual);
    }

    fn set_parent(&mut self, visual: VisualId, container: VisualId) {
        self.parented.push((visual, container));
    }

    fn set_active(&mut self, visual: VisualId, active: bool) {
        self.activations.push((visual, active));
    }

    fn fetch_directory(
        &mut self,
        path: &str,
        _kind: AssetKind,
        on_progress: &mut dyn FnMut(f32),
    ) -> anyhow::Result<FetchResult> {
        *self.fetch_counts.entry(path.to_string()).or_insert(0) += 1;
        if self.failing.contains(path) {
            return Err(anyhow!("scripted fetch failure for '{path}'"));
        }
        on_progress(0.5);
        if self.failing_after_progress.contains(path) {
            return Err(anyhow!("scripted late fetch failure for '{path}'"));
        }
        on_progress(1.0);
        Ok(FetchResult {
            sub_assets: self.sub_assets.get(path).cloned().unwrap_or_default(),
        })
    }

    fn release_asset(&mut self, name: &str) {
        self.released.push(name.to_string());
    }

    fn play_transition(&mut self, visual: VisualId, transition: UiTransition) {
        self.transitions.push((visual, transition));
    }

    fn play_effect(&mut self, url: &str) {
        self.effects.push(url.to_string());
    }

    fn request_garbage_collect(&mut self) {
        self.gc_hints += 1;
    }
}

//=== Hook Recording ======================================================

/// Shared append-only log of lifecycle hook invocations.
#[derive(Clone, Default)]
pub struct HookLog {
    entries: Rc<RefCell<Vec<String>>>,
}

impl HookLog {
    pub fn push(&self, entry: impl Into<String>) {
        self.entries.borrow_mut().push(entry.into());
    }

    /// Drains and returns everything logged so far.
    pub fn take(&self) -> Vec<String> {
        self.entries.borrow_mut().drain(..).collect()
    }
}

/// Scene double that records its hooks into a [`HookLog`].
pub struct RecordingScene {
    id: SceneId,
    log: HookLog,
    fail_enter: bool,
}

impl RecordingScene {
    pub fn new(id: SceneId, log: HookLog) -> Self {
        Self { id, log, fail_enter: false }
    }

    pub fn failing_enter(id: SceneId, log: HookLog) -> Self {
        Self { id, log, fail_enter: true }
    }
}

impl Scene for RecordingScene {
    fn will_enter(
        &mut self,
        _ctx: &mut ShellContext<'_>,
        _params: Option<&Value>,
    ) -> anyhow::Result<()> {
        self.log.push(format!("{}.will_enter", self.id));
        if self.fail_enter {
            return Err(anyhow!("scripted will_enter failure"));
        }
        Ok(())
    }

    fn did_enter(&mut self, _ctx: &mut ShellContext<'_>, _params: Option<&Value>) {
        self.log.push(format!("{}.did_enter", self.id));
    }

    fn will_exit(&mut self, _ctx: &mut ShellContext<'_>) -> anyhow::Result<()> {
        self.log.push(format!("{}.will_exit", self.id));
        Ok(())
    }

    fn did_exit(&mut self, _ctx: &mut ShellContext<'_>) {
        self.log.push(format!("{}.did_exit", self.id));
    }
}

/// View double that records its hooks into a [`HookLog`].
pub struct RecordingView {
    name: ViewName,
    log: HookLog,
    fail_init: bool,
}

impl RecordingView {
    pub fn new(name: ViewName, log: HookLog) -> Self {
        Self { name, log, fail_init: false }
    }

    pub fn failing_init(name: ViewName, log: HookLog) -> Self {
        Self { name, log, fail_init: true }
    }
}

impl UiView for RecordingView {
    fn init(&mut self, _ctx: &mut ShellContext<'_>, _data: Option<&Value>) -> anyhow::Result<()> {
        self.log.push(format!("{}.init", self.name));
        if self.fail_init {
            return Err(anyhow!("scripted init failure"));
        }
        Ok(())
    }

    fn on_open_start(&mut self, _ctx: &mut ShellContext<'_>) {
        self.log.push(format!("{}.on_open_start", self.name));
    }

    fn on_open_end(&mut self, _ctx: &mut ShellContext<'_>) {
        self.log.push(format!("{}.on_open_end", self.name));
    }

    fn on_close_start(&mut self, _ctx: &mut ShellContext<'_>) {
        self.log.push(format!("{}.on_close_start", self.name));
    }

    fn on_close_end(&mut self, _ctx: &mut ShellContext<'_>) {
        self.log.push(format!("{}.on_close_end", self.name));
    }

    fn on_focus(&mut self, _ctx: &mut ShellContext<'_>) {
        self.log.push(format!("{}.on_focus", self.name));
    }

    fn on_lost_focus(&mut self, _ctx: &mut ShellContext<'_>) {
        self.log.push(format!("{}.on_lost_focus", self.name));
    }
}

//=== Event Tap ===========================================================

/// Everything published on a bus after [`record_events`] was called.
pub struct SeenEvents {
    events: Rc<RefCell<Vec<Event>>>,
}

impl SeenEvents {
    /// Kinds in publication order.
    pub fn kinds(&self) -> Vec<EventKind> {
        self.events.borrow().iter().map(Event::kind).collect()
    }

    /// The first recorded event of `kind`, if any.
    pub fn find(&self, kind: EventKind) -> Option<Event> {
        self.events.borrow().iter().find(|e| e.kind() == kind).cloned()
    }

    /// Every recorded event of `kind`, in order.
    pub fn all(&self, kind: EventKind) -> Vec<Event> {
        self.events
            .borrow()
            .iter()
            .filter(|e| e.kind() == kind)
            .cloned()
            .collect()
    }
}

/// Taps every kind on `bus`, recording publications from now on.
pub fn record_events(bus: &EventBus) -> SeenEvents {
    let events: Rc<RefCell<Vec<Event>>> = Rc::new(RefCell::new(Vec::new()));
    let owner = bus.allocate_owner();
    for kind in EventKind::ALL {
        let sink = Rc::clone(&events);
        bus.subscribe(kind, owner, move |event| {
            sink.borrow_mut().push(event.clone());
        });
    }
    SeenEvents { events }
}
