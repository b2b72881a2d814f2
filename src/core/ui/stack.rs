//=========================================================================
// UI Stack Manager
//=========================================================================
//
// Serialized creation and stacked lifecycle for layered views.
//
// Open requests enter a FIFO queue and are created strictly one at a
// time; a failure for one request is logged and the queue keeps
// draining. Live views form a stack in creation order. Full-screen
// views cull culling-eligible views beneath them so occluded layers
// stop rendering, and closing the topmost view hands focus to the new
// top.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::collections::{HashMap, VecDeque};

use log::{debug, error, info, warn};
use serde_json::Value;
use thiserror::Error;

//=== Internal Dependencies ===============================================

use crate::core::context::CoreServices;
use crate::core::events::Event;
use crate::core::resources::ResourceError;
use crate::host::{UiTransition, VisualId};
use super::{UiDescriptor, UiId, UiView, ViewFactory, ViewName};

//=== Errors ==============================================================

#[derive(Debug, Error)]
pub enum UiError {
    #[error("view '{0}' is not registered")]
    UnknownView(ViewName),

    #[error("template '{template}' for view '{name}' could not be resolved")]
    MissingTemplate { name: ViewName, template: String },

    #[error("instantiation failed for view '{name}'")]
    Instantiate {
        name: ViewName,
        #[source]
        source: anyhow::Error,
    },

    #[error("init failed for view '{name}'")]
    Init {
        name: ViewName,
        #[source]
        source: anyhow::Error,
    },

    #[error(transparent)]
    Resource(#[from] ResourceError),
}

//=== Stack Entries =======================================================

struct RegisteredView {
    descriptor: UiDescriptor,
    factory: ViewFactory,
}

struct PendingCreate {
    name: ViewName,
    data: Option<Value>,
}

struct UiEntry {
    id: UiId,
    name: ViewName,
    visual: VisualId,
    view: Box<dyn UiView>,
    res_dirs: Vec<String>,
    desc_full_screen: bool,
    desc_hide_ui: bool,
    /// Whether this entry incremented the full-screen counter, so the
    /// decrement on close mirrors exactly one increment.
    counted_full_screen: bool,
    closing: bool,
    has_focus: bool,
}

impl UiEntry {
    fn is_full_screen(&self) -> bool {
        self.view.full_screen_override().unwrap_or(self.desc_full_screen)
    }

    fn is_hide_ui(&self) -> bool {
        self.view.hide_ui_override().unwrap_or(self.desc_hide_ui)
    }
}

//=== Manager =============================================================

/// Owns the view registry, the serialized creation queue, and the live
/// stack.
pub struct UiStackManager {
    views: HashMap<ViewName, RegisteredView>,
    ui_root: Option<VisualId>,
    stack: Vec<UiEntry>,
    queue: VecDeque<PendingCreate>,
    creating: bool,
    full_screen_refs: usize,
    next_id: u64,
}

impl UiStackManager {
    pub fn new() -> Self {
        Self {
            views: HashMap::new(),
            ui_root: None,
            stack: Vec::new(),
            queue: VecDeque::new(),
            creating: false,
            full_screen_refs: 0,
            next_id: 0,
        }
    }

    //--- Registration -----------------------------------------------------

    /// Registers a view descriptor with the factory producing its
    /// content instance.
    pub fn register(&mut self, descriptor: UiDescriptor, factory: ViewFactory) {
        let name = descriptor.name;
        if self.views.insert(name, RegisteredView { descriptor, factory }).is_some() {
            warn!("view '{name}' was already registered and has been replaced");
        }
    }

    /// Sets the container every view root visual is parented under.
    pub fn set_ui_root(&mut self, root: VisualId) {
        self.ui_root = Some(root);
    }

    //--- Opening ----------------------------------------------------------

    /// Requests `name` to open above the current stack.
    ///
    /// The request is queued; if no creation is running the queue drains
    /// immediately, otherwise it drains when the running creation
    /// finishes. Creation failures for queued entries are logged and the
    /// backlog keeps draining.
    pub fn open(
        &mut self,
        services: &mut CoreServices<'_>,
        name: ViewName,
        data: Option<Value>,
    ) -> Result<(), UiError> {
        if !self.views.contains_key(&name) {
            warn!("view '{name}' is not registered, open rejected");
            return Err(UiError::UnknownView(name));
        }
        self.queue.push_back(PendingCreate { name, data });
        if !self.creating {
            self.drain_queue(services);
        }
        Ok(())
    }

    fn drain_queue(&mut self, services: &mut CoreServices<'_>) {
        self.creating = true;
        while let Some(pending) = self.queue.pop_front() {
            if let Err(err) = self.create_one(services, pending) {
                error!("ui creation failed: {err:#}");
            }
        }
        self.creating = false;
    }

    fn create_one(
        &mut self,
        services: &mut CoreServices<'_>,
        pending: PendingCreate,
    ) -> Result<UiId, UiError> {
        let name = pending.name;
        let registered = self
            .views
            .get(&name)
            .ok_or(UiError::UnknownView(name))?;
        let descriptor = registered.descriptor.clone();

        let reason = format!("createUI:{name}");
        services.events.publish(&Event::BlockInputShow { reason: reason.clone() });
        let result = self.mount_view(services, name, descriptor, pending.data);
        services.events.publish(&Event::BlockInputHide { reason });
        result
    }

    fn mount_view(
        &mut self,
        services: &mut CoreServices<'_>,
        name: ViewName,
        descriptor: UiDescriptor,
        data: Option<Value>,
    ) -> Result<UiId, UiError> {
        services.resources.load_many(services.host, &descriptor.res_dirs, |_| {})?;

        let release_dirs = |services: &mut CoreServices<'_>, dirs: &[String]| {
            services.resources.release_many(services.host, dirs);
        };

        let template = match services.host.resolve_template(&descriptor.template) {
            Some(template) => template,
            None => {
                release_dirs(services, &descriptor.res_dirs);
                return Err(UiError::MissingTemplate { name, template: descriptor.template });
            }
        };
        let visual = match services.host.instantiate(template) {
            Ok(visual) => visual,
            Err(source) => {
                release_dirs(services, &descriptor.res_dirs);
                return Err(UiError::Instantiate { name, source });
            }
        };
        match self.ui_root {
            Some(root) => services.host.set_parent(visual, root),
            None => warn!("no ui root configured, '{name}' left unparented"),
        }

        // The previous top loses focus before the newcomer joins.
        if let Some(top) = self.stack.last_mut() {
            if top.has_focus {
                top.has_focus = false;
                let mut ctx = services.hook_context(Some(top.id));
                top.view.on_lost_focus(&mut ctx);
            }
        }

        self.next_id += 1;
        let id = UiId(self.next_id);
        let view = (self.views[&name].factory)();
        self.stack.push(UiEntry {
            id,
            name,
            visual,
            view,
            res_dirs: descriptor.res_dirs,
            desc_full_screen: descriptor.full_screen,
            desc_hide_ui: descriptor.hide_ui,
            counted_full_screen: false,
            closing: false,
            has_focus: false,
        });

        let init_result = {
            let index = self.stack.len() - 1;
            let entry = &mut self.stack[index];
            let mut ctx = services.hook_context(Some(id));
            entry.view.init(&mut ctx, data.as_ref())
        };
        if let Err(source) = init_result {
            let entry = self.stack.pop().expect("entry pushed above");
            services.host.destroy(entry.visual);
            release_dirs(services, &entry.res_dirs);
            // The previous top already lost focus to the failed entry;
            // hand it back, the same way close does.
            if let Some(top) = self.stack.last_mut() {
                top.has_focus = true;
                let mut ctx = services.hook_context(Some(top.id));
                top.view.on_focus(&mut ctx);
            }
            return Err(UiError::Init { name, source });
        }

        {
            let index = self.stack.len() - 1;
            let entry = &mut self.stack[index];
            {
                let mut ctx = services.hook_context(Some(id));
                entry.view.on_open_start(&mut ctx);
            }
            if let Some(effect) = entry.view.open_effect() {
                services.host.play_effect(effect);
            }
            services.host.play_transition(entry.visual, UiTransition::Open);
            {
                let mut ctx = services.hook_context(Some(id));
                entry.view.on_open_end(&mut ctx);
            }
            entry.has_focus = true;
        }

        let index = self.stack.len() - 1;
        if self.stack[index].is_full_screen() {
            self.stack[index].counted_full_screen = true;
            self.full_screen_refs += 1;
            self.update_visibility(services);
        }
        info!("view '{name}' opened as {id:?}");
        Ok(id)
    }

    //--- Closing ----------------------------------------------------------

    /// Closes the instance `id`: close hooks, transition, teardown,
    /// resource release, and focus handoff to the new top.
    ///
    /// Closing an id that is already closing, or that is not on the
    /// stack, is a no-op.
    pub fn close(&mut self, services: &mut CoreServices<'_>, id: UiId) {
        let Some(index) = self.stack.iter().position(|entry| entry.id == id) else {
            debug!("close for {id:?} ignored, not on the stack");
            return;
        };
        if self.stack[index].closing {
            debug!("close for {id:?} ignored, already closing");
            return;
        }

        {
            let entry = &mut self.stack[index];
            entry.closing = true;
            entry.has_focus = false;
            {
                let mut ctx = services.hook_context(Some(id));
                entry.view.on_close_start(&mut ctx);
            }
            if let Some(effect) = entry.view.close_effect() {
                services.host.play_effect(effect);
            }
            services.host.play_transition(entry.visual, UiTransition::Close);
            {
                let mut ctx = services.hook_context(Some(id));
                entry.view.on_close_end(&mut ctx);
            }
        }

        let entry = self.stack.remove(index);
        let was_top = index == self.stack.len();
        if entry.counted_full_screen {
            self.full_screen_refs = self.full_screen_refs.saturating_sub(1);
            self.update_visibility(services);
        }
        services.host.destroy(entry.visual);

        if was_top {
            if let Some(top) = self.stack.last_mut() {
                top.has_focus = true;
                let mut ctx = services.hook_context(Some(top.id));
                top.view.on_focus(&mut ctx);
            }
        }

        services.resources.release_many(services.host, &entry.res_dirs);
        info!("view '{}' closed", entry.name);

        if self.stack.is_empty() {
            services.events.publish(&Event::LastUiDestroyed);
        }
    }

    /// Closes every stacked view, bottom first.
    pub fn close_all(&mut self, services: &mut CoreServices<'_>) {
        while let Some(id) = self.stack.iter().find(|e| !e.closing).map(|e| e.id) {
            self.close(services, id);
        }
    }

    //--- Bulk Visibility --------------------------------------------------

    /// Deactivates every view except the topmost one.
    pub fn hide_all(&mut self, services: &mut CoreServices<'_>) {
        let last = self.stack.len().saturating_sub(1);
        for (index, entry) in self.stack.iter().enumerate() {
            services.host.set_active(entry.visual, index == last);
        }
    }

    /// Reactivates every view.
    pub fn show_all(&mut self, services: &mut CoreServices<'_>) {
        for entry in &self.stack {
            services.host.set_active(entry.visual, true);
        }
    }

    /// Applies full-screen culling: below the topmost non-closing
    /// full-screen view, every culling-eligible view is deactivated;
    /// at and above it they are reactivated. Views that opted out of
    /// culling are left untouched.
    fn update_visibility(&mut self, services: &mut CoreServices<'_>) {
        let mut first_full: Option<usize> = None;
        for index in (0..self.stack.len()).rev() {
            let entry = &self.stack[index];
            match first_full {
                None => {
                    if entry.is_full_screen() && !entry.closing {
                        first_full = Some(index);
                    }
                    if entry.is_hide_ui() {
                        services.host.set_active(entry.visual, true);
                    }
                }
                Some(_) => {
                    if entry.is_hide_ui() && !entry.closing {
                        services.host.set_active(entry.visual, false);
                    }
                }
            }
        }
    }

    //--- Queries ----------------------------------------------------------

    /// The topmost live instance of `name`, if any.
    pub fn find(&self, name: ViewName) -> Option<UiId> {
        self.stack.iter().rev().find(|e| e.name == name && !e.closing).map(|e| e.id)
    }

    pub fn has_any(&self) -> bool {
        !self.stack.is_empty()
    }

    pub fn len(&self) -> usize {
        self.stack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    pub fn is_creating(&self) -> bool {
        self.creating
    }

    pub fn full_screen_refs(&self) -> usize {
        self.full_screen_refs
    }
}

impl Default for UiStackManager {
    fn default() -> Self {
        Self::new()
    }
}

//=========================================================================
// Tests
//=========================================================================
