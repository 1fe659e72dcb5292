//! Action execution - applies plans and replacement tab sets
//!
//! Incremental plans run in two phases. [`ActionExecutor::dispatch`] forwards
//! closes and groups to the bridge using a snapshot of the tabs, and
//! [`ActionExecutor::commit`] folds the bridge outcomes into the registry. The
//! split lets callers release the session between the network round trips and
//! the registry update. A failure on one tab never stops the rest of the plan.

use crate::bridge::TabControl;
use crate::command::plan::{ActionPlan, TabMutation};
use crate::core::types::{Tab, TabId};
use crate::tabs::registry::TabRegistry;

/// What the bridge said about one mutation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationOutcome {
    /// Browser closed the tab
    Closed,
    Grouped { group_id: u64, tab_count: usize },
    /// Not forwarded; applies to the registry only
    LocalOnly,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupReport {
    pub label: String,
    /// Browser group id, `None` when no bridge was involved
    pub group_id: Option<u64>,
    pub tab_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedMutation {
    pub id: TabId,
    pub reason: String,
}

/// Result of applying an incremental plan
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionReport {
    pub closed: Vec<TabId>,
    pub recategorized: Vec<TabId>,
    pub groups: Vec<GroupReport>,
    pub failed: Vec<FailedMutation>,
}

impl ExecutionReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn failed_ids(&self) -> Vec<&TabId> {
        self.failed.iter().map(|f| &f.id).collect()
    }

    /// One-line description for history records
    pub fn summary(&self) -> String {
        let mut parts = Vec::new();
        if !self.closed.is_empty() {
            parts.push(format!("closed {} tab(s)", self.closed.len()));
        }
        if !self.recategorized.is_empty() {
            parts.push(format!("recategorized {} tab(s)", self.recategorized.len()));
        }
        if !self.groups.is_empty() {
            parts.push(format!("created {} group(s)", self.groups.len()));
        }
        if !self.failed.is_empty() {
            parts.push(format!("{} failed", self.failed.len()));
        }
        if parts.is_empty() {
            "nothing to do".to_string()
        } else {
            parts.join(", ")
        }
    }
}

/// Applies action plans and replacement sets to the registry
pub struct ActionExecutor;

impl ActionExecutor {
    /// Replace the registry contents with `tabs`, keeping selection for ids that survive
    pub fn apply_replacement(registry: &mut TabRegistry, selection: &mut Vec<TabId>, tabs: Vec<Tab>) {
        registry.upsert(tabs);
        selection.retain(|id| registry.contains(id));
    }

    /// Forward bridge-visible mutations; one outcome per mutation, in plan order
    pub async fn dispatch(
        plan: &ActionPlan,
        tabs: &[Tab],
        bridge: Option<&dyn TabControl>,
    ) -> Vec<MutationOutcome> {
        let mut outcomes = Vec::with_capacity(plan.len());

        for mutation in plan.mutations() {
            let outcome = match (mutation, bridge) {
                (_, None) | (TabMutation::SetCategory(..), _) => MutationOutcome::LocalOnly,
                (TabMutation::Close(id), Some(_)) if !tabs.iter().any(|t| &t.id == id) => {
                    MutationOutcome::Failed(format!("Tab not found: {}", id))
                }
                (TabMutation::Close(id), Some(bridge)) => {
                    // By id, so other tabs sharing the URL stay open
                    match bridge.close_tab_ids(std::slice::from_ref(id)).await {
                        Ok(0) => MutationOutcome::Failed("no browser tab matched".into()),
                        Ok(_) => MutationOutcome::Closed,
                        Err(e) => {
                            tracing::warn!(id = %id, error = %e, "Bridge close failed");
                            MutationOutcome::Failed(e.to_string())
                        }
                    }
                }
                (TabMutation::Group { ids, label }, Some(bridge)) => {
                    match bridge.group_tabs(ids, label).await {
                        Ok(result) => MutationOutcome::Grouped {
                            group_id: result.group_id,
                            tab_count: result.tab_count,
                        },
                        Err(e) => {
                            tracing::warn!(label = %label, error = %e, "Bridge group failed");
                            MutationOutcome::Failed(e.to_string())
                        }
                    }
                }
            };
            outcomes.push(outcome);
        }

        outcomes
    }

    /// Apply the plan to the registry given the bridge outcomes from [`Self::dispatch`]
    pub fn commit(
        registry: &mut TabRegistry,
        plan: ActionPlan,
        outcomes: Vec<MutationOutcome>,
    ) -> ExecutionReport {
        let mut report = ExecutionReport::default();
        let mut outcomes = outcomes.into_iter();

        for mutation in plan {
            let outcome = outcomes.next().unwrap_or(MutationOutcome::LocalOnly);
            match mutation {
                TabMutation::Close(id) => commit_close(registry, id, outcome, &mut report),
                TabMutation::SetCategory(id, category) => {
                    match registry.set_category(&id, category) {
                        Ok(()) => report.recategorized.push(id),
                        Err(e) => report.failed.push(FailedMutation {
                            id,
                            reason: e.to_string(),
                        }),
                    }
                }
                TabMutation::Group { ids, label } => match outcome {
                    MutationOutcome::Grouped {
                        group_id,
                        tab_count,
                    } => report.groups.push(GroupReport {
                        label,
                        group_id: Some(group_id),
                        tab_count,
                    }),
                    MutationOutcome::Failed(reason) => {
                        report.failed.extend(ids.into_iter().map(|id| FailedMutation {
                            id,
                            reason: reason.clone(),
                        }))
                    }
                    _ => report.groups.push(GroupReport {
                        label,
                        group_id: None,
                        tab_count: ids.len(),
                    }),
                },
            }
        }

        if !report.is_clean() {
            tracing::info!(failed = report.failed.len(), "Plan applied partially");
        }
        report
    }

    /// Dispatch and commit in one go
    pub async fn apply(
        registry: &mut TabRegistry,
        plan: ActionPlan,
        bridge: Option<&dyn TabControl>,
    ) -> ExecutionReport {
        let snapshot = registry.list().to_vec();
        let outcomes = Self::dispatch(&plan, &snapshot, bridge).await;
        Self::commit(registry, plan, outcomes)
    }
}

fn commit_close(
    registry: &mut TabRegistry,
    id: TabId,
    outcome: MutationOutcome,
    report: &mut ExecutionReport,
) {
    match outcome {
        MutationOutcome::Failed(reason) => report.failed.push(FailedMutation { id, reason }),
        MutationOutcome::Closed => {
            registry.remove(std::slice::from_ref(&id));
            if !report.closed.contains(&id) {
                report.closed.push(id);
            }
        }
        _ => {
            if registry.contains(&id) {
                registry.remove(std::slice::from_ref(&id));
                report.closed.push(id);
            } else if !report.closed.contains(&id) {
                report.failed.push(FailedMutation {
                    reason: format!("Tab not found: {}", id),
                    id,
                });
            }
        }
    }
}
