//! Session state and the command lifecycle
//!
//! A session owns the registry, the selection and the history ring, and
//! tracks at most one outstanding command:
//!
//! ```text
//! Idle --begin--> Resolving --begin_apply--> Applying --finish--> Idle(succeeded)
//!   \--begin (canned phrase)--------------->/            \------> Idle(failed)
//! ```
//!
//! Every outstanding command carries a ticket. A response that arrives with
//! any other ticket is stale and is dropped without touching the registry.
//! The session itself never awaits; [`Controller`] drives the network legs
//! and only locks the session between them.

pub mod controller;

use tokio::sync::broadcast;
use uuid::Uuid;

use crate::command::executor::{ActionExecutor, ExecutionReport, MutationOutcome};
use crate::command::plan::ActionPlan;
use crate::command::resolver::{resolve, RemoteCommand, Resolution};
use crate::core::config::TabmateConfig;
use crate::core::error::{ErrorKind, Result, TabError};
use crate::core::types::{Tab, TabId};
use crate::history::{suggestions, CommandHistory, CommandRecord, Suggestion};
use crate::history::{DEFAULT_HISTORY_LIMIT, DEFAULT_MAX_SUGGESTIONS};
use crate::tabs::grouping::{group_by_category, TabGroup};
use crate::tabs::registry::TabRegistry;

pub use controller::{Controller, SubmitOutcome};

/// Identifies one outstanding command
pub type Ticket = u64;

const EVENT_CAPACITY: usize = 64;

const CLOSE_SELECTED_TEXT: &str = "close selected tabs";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdleStatus {
    Ready,
    Succeeded,
    Failed(ErrorKind),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Idle(IdleStatus),
    Resolving(Ticket),
    Applying(Ticket),
}

impl Lifecycle {
    pub fn is_busy(&self) -> bool {
        !matches!(self, Lifecycle::Idle(_))
    }

    pub fn ticket(&self) -> Option<Ticket> {
        match self {
            Lifecycle::Resolving(t) | Lifecycle::Applying(t) => Some(*t),
            Lifecycle::Idle(_) => None,
        }
    }
}

/// Notifications for presentation layers
#[derive(Debug, Clone)]
pub enum SessionEvent {
    TabsChanged,
    StateChanged(Lifecycle),
    CommandRecorded(CommandRecord),
}

/// Canned command ready to be forwarded and committed
#[derive(Debug, Clone)]
pub struct LocalRequest {
    pub ticket: Ticket,
    pub plan: ActionPlan,
    /// Registry snapshot the plan was built from
    pub tabs: Vec<Tab>,
}

/// Free-text command awaiting the interpreter
#[derive(Debug, Clone)]
pub struct RemoteRequest {
    pub ticket: Ticket,
    pub command: RemoteCommand,
}

/// What [`Session::begin`] started
#[derive(Debug, Clone)]
pub enum Begun {
    Nothing,
    Local(LocalRequest),
    Remote(RemoteRequest),
}

pub struct Session {
    id: Uuid,
    registry: TabRegistry,
    selection: Vec<TabId>,
    history: CommandHistory,
    state: Lifecycle,
    next_ticket: Ticket,
    pending_text: Option<String>,
    voice: bool,
    max_suggestions: usize,
    events: broadcast::Sender<SessionEvent>,
}

impl Default for Session {
    fn default() -> Self {
        Self::with_limits(DEFAULT_HISTORY_LIMIT, DEFAULT_MAX_SUGGESTIONS)
    }
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &TabmateConfig) -> Self {
        Self::with_limits(config.history_limit, config.max_suggestions)
    }

    fn with_limits(history_limit: usize, max_suggestions: usize) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            id: Uuid::new_v4(),
            registry: TabRegistry::new(),
            selection: Vec::new(),
            history: CommandHistory::new(history_limit),
            state: Lifecycle::Idle(IdleStatus::Ready),
            next_ticket: 1,
            pending_text: None,
            voice: false,
            max_suggestions,
            events,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn tabs(&self) -> &[Tab] {
        self.registry.list()
    }

    pub fn registry(&self) -> &TabRegistry {
        &self.registry
    }

    pub fn groups(&self) -> Vec<TabGroup<'_>> {
        group_by_category(self.registry.list())
    }

    pub fn suggestions(&self) -> Vec<Suggestion> {
        suggestions(self.registry.list(), self.max_suggestions)
    }

    pub fn history(&self) -> &CommandHistory {
        &self.history
    }

    pub fn state(&self) -> Lifecycle {
        self.state
    }

    pub fn selection(&self) -> &[TabId] {
        &self.selection
    }

    pub fn voice_enabled(&self) -> bool {
        self.voice
    }

    /// Flip the voice-input flag. No transcription happens here.
    pub fn toggle_voice(&mut self) -> bool {
        self.voice = !self.voice;
        self.voice
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Replace the tab set outside of a command, e.g. after a refresh
    pub fn load_tabs(&mut self, tabs: Vec<Tab>) -> Result<()> {
        if self.state.is_busy() {
            return Err(TabError::Busy);
        }
        ActionExecutor::apply_replacement(&mut self.registry, &mut self.selection, tabs);
        self.emit(SessionEvent::TabsChanged);
        Ok(())
    }

    /// Select or deselect a tab; returns whether it is now selected
    pub fn toggle_selection(&mut self, id: &TabId) -> Result<bool> {
        if !self.registry.contains(id) {
            return Err(TabError::NotFound(id.clone()));
        }
        if let Some(pos) = self.selection.iter().position(|s| s == id) {
            self.selection.remove(pos);
            Ok(false)
        } else {
            self.selection.push(id.clone());
            Ok(true)
        }
    }

    /// Start a command
    pub fn begin(&mut self, text: &str) -> Result<Begun> {
        self.ensure_idle()?;

        match resolve(text, self.registry.list()) {
            Resolution::Empty => Ok(Begun::Nothing),
            Resolution::Local(plan) => Ok(Begun::Local(self.start_local(text.trim(), plan))),
            Resolution::Remote(command) => {
                let ticket = self.issue_ticket(text.trim());
                self.set_state(Lifecycle::Resolving(ticket));
                tracing::info!(ticket, command = %command.command, "Resolving command");
                Ok(Begun::Remote(RemoteRequest { ticket, command }))
            }
        }
    }

    /// Start closing every selected tab
    pub fn close_selected(&mut self) -> Result<Begun> {
        self.ensure_idle()?;
        if self.selection.is_empty() {
            return Ok(Begun::Nothing);
        }
        let plan = ActionPlan::close_all(&self.selection);
        Ok(Begun::Local(self.start_local(CLOSE_SELECTED_TEXT, plan)))
    }

    /// Commit a canned command once its bridge outcomes are known
    pub fn finish_local(
        &mut self,
        ticket: Ticket,
        plan: ActionPlan,
        outcomes: Vec<MutationOutcome>,
    ) -> Result<ExecutionReport> {
        self.check_ticket(ticket)?;

        let report = ActionExecutor::commit(&mut self.registry, plan, outcomes);
        self.selection.retain(|id| self.registry.contains(id));
        self.emit(SessionEvent::TabsChanged);

        let text = self.pending_text.take().unwrap_or_default();
        self.record(CommandRecord::success(text, report.summary()));
        self.set_state(Lifecycle::Idle(IdleStatus::Succeeded));
        Ok(report)
    }

    /// Move an outstanding interpreter command into Applying
    pub fn begin_apply(&mut self, ticket: Ticket) -> Result<()> {
        match self.state {
            Lifecycle::Resolving(t) if t == ticket => {
                self.set_state(Lifecycle::Applying(ticket));
                Ok(())
            }
            Lifecycle::Applying(t) if t == ticket => Ok(()),
            _ => Err(TabError::StaleResponse(ticket)),
        }
    }

    /// Settle an interpreter command with its response
    ///
    /// On success the registry is replaced wholesale. On failure the
    /// registry is untouched and the error is recorded and returned.
    pub fn finish_remote(&mut self, ticket: Ticket, result: Result<Vec<Tab>>) -> Result<usize> {
        if let Err(e) = self.check_ticket(ticket) {
            tracing::warn!(ticket, "Discarding stale interpreter response");
            return Err(e);
        }

        match result {
            Ok(tabs) => {
                self.begin_apply(ticket)?;
                let text = self.pending_text.take().unwrap_or_default();
                let count = tabs.len();
                ActionExecutor::apply_replacement(&mut self.registry, &mut self.selection, tabs);
                self.emit(SessionEvent::TabsChanged);
                self.record(CommandRecord::success(text, format!("{} tabs after update", count)));
                self.set_state(Lifecycle::Idle(IdleStatus::Succeeded));
                Ok(count)
            }
            Err(e) => Err(self.fail_command(ticket, e)),
        }
    }

    /// Settle the outstanding command as failed without touching the registry
    ///
    /// Returns `err`, or `StaleResponse` when `ticket` is no longer current.
    pub fn fail_command(&mut self, ticket: Ticket, err: TabError) -> TabError {
        if let Err(stale) = self.check_ticket(ticket) {
            tracing::warn!(ticket, error = %err, "Discarding failure of a stale command");
            return stale;
        }
        let text = self.pending_text.take().unwrap_or_default();
        tracing::warn!(ticket, error = %err, "Command failed");
        self.record(CommandRecord::failure(text, &err));
        self.set_state(Lifecycle::Idle(IdleStatus::Failed(err.kind())));
        err
    }

    /// Give up on the outstanding command; its late response will be dropped
    pub fn abandon(&mut self) -> Option<Ticket> {
        let ticket = self.state.ticket()?;
        let text = self.pending_text.take().unwrap_or_default();
        tracing::info!(ticket, "Command abandoned");
        self.record(CommandRecord::failure(text, &TabError::Cancelled));
        self.set_state(Lifecycle::Idle(IdleStatus::Failed(ErrorKind::Cancelled)));
        Some(ticket)
    }

    fn start_local(&mut self, text: &str, plan: ActionPlan) -> LocalRequest {
        let ticket = self.issue_ticket(text);
        self.set_state(Lifecycle::Applying(ticket));
        tracing::info!(ticket, mutations = plan.len(), "Applying canned command");
        LocalRequest {
            ticket,
            plan,
            tabs: self.registry.list().to_vec(),
        }
    }

    fn ensure_idle(&self) -> Result<()> {
        if self.state.is_busy() {
            tracing::debug!(state = ?self.state, "Rejecting command while busy");
            return Err(TabError::Busy);
        }
        Ok(())
    }

    fn check_ticket(&self, ticket: Ticket) -> Result<()> {
        match self.state.ticket() {
            Some(t) if t == ticket => Ok(()),
            _ => Err(TabError::StaleResponse(ticket)),
        }
    }

    fn issue_ticket(&mut self, text: &str) -> Ticket {
        let ticket = self.next_ticket;
        self.next_ticket += 1;
        self.pending_text = Some(text.to_string());
        ticket
    }

    fn set_state(&mut self, state: Lifecycle) {
        self.state = state;
        self.emit(SessionEvent::StateChanged(state));
    }

    fn record(&mut self, record: CommandRecord) {
        self.history.record(record.clone());
        self.emit(SessionEvent::CommandRecorded(record));
    }

    fn emit(&self, event: SessionEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }
}
