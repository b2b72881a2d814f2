//=========================================================================
// Shell Context
//=========================================================================
//
// What content hooks see, and how their requests get back in.
//
// Scene and UI hooks never call the managers directly: they publish
// events immediately and enqueue lifecycle requests (open, close, scene
// change) as commands. The shell pumps the command queue after every
// public operation, which keeps hook re-entrancy sound under exclusive
// ownership while preserving strict FIFO / single-flight ordering.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::collections::VecDeque;

use log::warn;
use serde_json::Value;

//=== Internal Dependencies ===============================================

use crate::core::events::{Event, EventBus};
use crate::core::resources::ResourceRegistry;
use crate::core::scene::SceneId;
use crate::core::ui::{UiId, ViewName};
use crate::host::ShellHost;

//=== Commands ============================================================

/// A deferred request issued by a content hook.
#[derive(Debug, Clone)]
pub(crate) enum ShellCommand {
    GotoScene { id: SceneId, params: Option<Value> },
    OpenUi { name: ViewName, data: Option<Value> },
    CloseUi { id: UiId },
    CloseAllUi,
    HideAllUi,
    ShowAllUi,
}

/// FIFO queue of deferred requests, drained by the shell at operation
/// boundaries.
#[derive(Default)]
pub(crate) struct CommandQueue {
    items: VecDeque<ShellCommand>,
}

impl CommandQueue {
    pub fn push(&mut self, command: ShellCommand) {
        self.items.push_back(command);
    }

    pub fn pop(&mut self) -> Option<ShellCommand> {
        self.items.pop_front()
    }
}

//=== Core Services =======================================================

/// Borrowed collaborator bundle threaded through the managers for one
/// operation: the host, the shared registries, and the command queue.
pub(crate) struct CoreServices<'a> {
    pub host: &'a mut dyn ShellHost,
    pub resources: &'a ResourceRegistry,
    pub events: &'a EventBus,
    pub commands: &'a mut CommandQueue,
}

impl CoreServices<'_> {
    /// Builds the context handed to a content hook. While the context is
    /// alive the host is unreachable; hooks only observe and enqueue.
    pub fn hook_context(&mut self, current_ui: Option<UiId>) -> ShellContext<'_> {
        ShellContext { events: self.events, commands: self.commands, current_ui }
    }
}

//=== Shell Context =======================================================

/// The surface a scene or view hook runs against.
pub struct ShellContext<'a> {
    events: &'a EventBus,
    commands: &'a mut CommandQueue,
    current_ui: Option<UiId>,
}

impl ShellContext<'_> {
    /// Publishes an event synchronously, inline.
    pub fn publish(&self, event: &Event) {
        self.events.publish(event);
    }

    /// The event bus, for hooks that want to subscribe (clone the handle
    /// to keep it past the hook's lifetime).
    pub fn events(&self) -> &EventBus {
        self.events
    }

    /// The UI instance whose hook is currently running, if any.
    pub fn current_ui(&self) -> Option<UiId> {
        self.current_ui
    }

    //--- Deferred Requests ------------------------------------------------

    /// Requests a scene transition once the current operation settles.
    pub fn goto_scene(&mut self, id: SceneId, params: Option<Value>) {
        self.commands.push(ShellCommand::GotoScene { id, params });
    }

    /// Requests a UI open once the current operation settles.
    pub fn open_ui(&mut self, name: ViewName, data: Option<Value>) {
        self.commands.push(ShellCommand::OpenUi { name, data });
    }

    /// Requests a UI close once the current operation settles.
    pub fn close_ui(&mut self, id: UiId) {
        self.commands.push(ShellCommand::CloseUi { id });
    }

    /// Requests the close of the instance whose hook is running.
    ///
    /// Outside a UI hook there is no "self" to close; the request is
    /// dropped with a warning.
    pub fn close_self(&mut self) {
        match self.current_ui {
            Some(id) => self.commands.push(ShellCommand::CloseUi { id }),
            None => warn!("close_self outside a UI hook, request dropped"),
        }
    }

    /// Requests the close of every stacked instance.
    pub fn close_all_ui(&mut self) {
        self.commands.push(ShellCommand::CloseAllUi);
    }

    pub fn hide_all_ui(&mut self) {
        self.commands.push(ShellCommand::HideAllUi);
    }

    pub fn show_all_ui(&mut self) {
        self.commands.push(ShellCommand::ShowAllUi);
    }
}
