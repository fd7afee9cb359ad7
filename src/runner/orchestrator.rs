use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::error::ActionPlanError;
use crate::model::{ActingUser, CreateActionPlanPayload, Diagnostic, NewActionPlan};
use crate::store::ActionPlanStore;
use crate::transform::{
    HeadroomFormula, IdentifierRemapper, ScoreCalculator, ScoringFormula, Tier, TierPlan,
};

use super::persist::{persist_tier, AssociationShortfall, PartialWriteHook, WriteLedger};
use super::retry::retry_read;
use super::tags::{distinct_tag_names, TagMap, TagResolver};

/// Canonical ids written for one tier, in write order
#[derive(Debug, Clone, Serialize)]
pub struct TierReport {
    pub tier: Tier,
    pub task_ids: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreationReport {
    pub action_plan_id: String,
    pub diagnostic_id: String,
    pub plan_name: String,
    pub tiers: Vec<TierReport>,
    pub tags: TagMap,
    pub shortfalls: Vec<AssociationShortfall>,
    pub duration_ms: u64,
}

impl CreationReport {
    pub fn task_count(&self) -> usize {
        self.tiers.iter().map(|t| t.task_ids.len()).sum()
    }

    pub fn tier(&self, tier: Tier) -> &[String] {
        self.tiers
            .iter()
            .find(|t| t.tier == tier)
            .map(|t| t.task_ids.as_slice())
            .unwrap_or_default()
    }
}

/// Validates, transforms and persists one action plan per call
pub struct ActionPlanOrchestrator {
    store: Arc<dyn ActionPlanStore>,
    config: Config,
    formula: Arc<dyn ScoringFormula>,
    partial_write_hook: Option<Arc<dyn PartialWriteHook>>,
}

impl ActionPlanOrchestrator {
    pub fn new(store: Arc<dyn ActionPlanStore>, config: Config) -> Self {
        let formula = Arc::new(HeadroomFormula {
            max_score: config.scoring.max_score,
        });
        Self {
            store,
            config,
            formula,
            partial_write_hook: None,
        }
    }

    pub fn with_formula(mut self, formula: Arc<dyn ScoringFormula>) -> Self {
        self.formula = formula;
        self
    }

    pub fn with_partial_write_hook(mut self, hook: Arc<dyn PartialWriteHook>) -> Self {
        self.partial_write_hook = Some(hook);
        self
    }

    /// Create the plan and its tasks; returns the new action plan id
    pub async fn create_action_plan(
        &self,
        diagnostic_id: &str,
        payload: &CreateActionPlanPayload,
        user: &ActingUser,
    ) -> Result<String, ActionPlanError> {
        let report = self.execute(diagnostic_id, payload, user).await?;
        Ok(report.action_plan_id)
    }

    /// Same as [`create_action_plan`](Self::create_action_plan), returning
    /// everything that was written.
    ///
    /// Nothing is written unless all preconditions hold. Once the plan row
    /// exists, a failure leaves already-written rows in place; the optional
    /// [`PartialWriteHook`] is told what they are.
    pub async fn execute(
        &self,
        diagnostic_id: &str,
        payload: &CreateActionPlanPayload,
        user: &ActingUser,
    ) -> Result<CreationReport, ActionPlanError> {
        let start = Instant::now();
        let diagnostic = self.check_preconditions(diagnostic_id, user).await?;

        let ledger = WriteLedger::new();
        match self.write_plan(&diagnostic, payload, user, &ledger).await {
            Ok(mut report) => {
                report.duration_ms = start.elapsed().as_millis() as u64;
                info!(
                    "Created action plan {} with {} tasks and {} tags in {}ms",
                    report.action_plan_id,
                    report.task_count(),
                    report.tags.len(),
                    report.duration_ms
                );
                Ok(report)
            }
            Err(e) => {
                let written = ledger.snapshot();
                if !written.is_empty() {
                    error!(
                        "Action plan {:?} left partially written ({} tasks, {} new tags): {}",
                        written.action_plan_id,
                        written.task_ids.len(),
                        written.created_tag_ids.len(),
                        e
                    );
                    if let Some(hook) = &self.partial_write_hook {
                        hook.on_partial_write(&written, &e).await;
                    }
                }
                Err(e)
            }
        }
    }

    /// Run preconditions and the transformation without writing anything
    pub async fn plan(
        &self,
        diagnostic_id: &str,
        payload: &CreateActionPlanPayload,
        user: &ActingUser,
    ) -> Result<TierPlan, ActionPlanError> {
        let diagnostic = self.check_preconditions(diagnostic_id, user).await?;
        self.transform(payload, &diagnostic).await
    }

    /// Fail-fast checks, in order: id present, diagnostic exists, same
    /// partner, answers complete.
    pub async fn check_preconditions(
        &self,
        diagnostic_id: &str,
        user: &ActingUser,
    ) -> Result<Diagnostic, ActionPlanError> {
        if diagnostic_id.is_empty() {
            warn!("Rejected action plan: empty diagnostic id");
            return Err(ActionPlanError::NotFound(diagnostic_id.to_string()));
        }

        let store = self.store.as_ref();
        let diagnostic = retry_read(&self.config.retry, move || {
            store.fetch_diagnostic(diagnostic_id)
        })
        .await?
        .ok_or_else(|| {
            warn!("Rejected action plan: diagnostic {} not found", diagnostic_id);
            ActionPlanError::NotFound(diagnostic_id.to_string())
        })?;

        if diagnostic.partner_id != user.partner_id {
            warn!(
                "Rejected action plan: user {} of partner {} on diagnostic {}",
                user.user_id, user.partner_id, diagnostic_id
            );
            return Err(ActionPlanError::Unauthorized {
                diagnostic_id: diagnostic_id.to_string(),
                partner_id: user.partner_id.clone(),
            });
        }

        if !diagnostic.status.is_answers_complete() {
            warn!(
                "Rejected action plan: diagnostic {} is {}",
                diagnostic_id, diagnostic.status
            );
            return Err(ActionPlanError::NotReady {
                diagnostic_id: diagnostic_id.to_string(),
                status: diagnostic.status,
            });
        }

        Ok(diagnostic)
    }

    async fn transform(
        &self,
        payload: &CreateActionPlanPayload,
        diagnostic: &Diagnostic,
    ) -> Result<TierPlan, ActionPlanError> {
        let mut tasks = IdentifierRemapper::new().remap(&payload.tasks);

        ScoreCalculator::new(
            self.store.as_ref(),
            self.formula.as_ref(),
            self.config.template_lookup,
            &self.config.retry,
        )
        .apply(&mut tasks, &diagnostic.indicator_scores)
        .await?;

        let plan = TierPlan::partition(tasks);
        for nested in plan.nested_references() {
            warn!(
                "Task {} references {} in the same {} tier; its write may precede the target",
                nested.task_id, nested.referenced_id, nested.tier
            );
        }
        Ok(plan)
    }

    async fn write_plan(
        &self,
        diagnostic: &Diagnostic,
        payload: &CreateActionPlanPayload,
        user: &ActingUser,
        ledger: &WriteLedger,
    ) -> Result<CreationReport, ActionPlanError> {
        let store = self.store.as_ref();

        let action_plan_id = store
            .create_action_plan(&NewActionPlan {
                diagnostic_id: diagnostic.id.clone(),
                partner_id: diagnostic.partner_id.clone(),
                customer_id: diagnostic.customer_id.clone(),
                name: payload.name.clone(),
                start_date: payload.start_date,
                end_date: payload.end_date,
            })
            .await?;
        ledger.record_plan(&action_plan_id);
        info!(
            "Created action plan {} for diagnostic {} via {} store",
            action_plan_id,
            diagnostic.id,
            store.name()
        );

        let plan = self.transform(payload, diagnostic).await?;

        let names = distinct_tag_names(payload.tasks.iter().map(|t| t.tags.as_slice()));
        let tags = if names.is_empty() {
            TagMap::new()
        } else {
            TagResolver::new(store, &self.config.retry)
                .resolve_tags(&names, &user.partner_id, ledger)
                .await?
        };

        let mut tiers = Vec::new();
        let mut shortfalls = Vec::new();
        for (tier, tasks) in plan.tiers() {
            if tasks.is_empty() {
                continue;
            }
            info!("Persisting {} {} tasks", tasks.len(), tier);

            let writes = persist_tier(
                store,
                tasks,
                &action_plan_id,
                &tags,
                ledger,
                self.config.strict_association_counts,
            )
            .await?;

            let mut task_ids = Vec::with_capacity(writes.len());
            for write in writes {
                task_ids.push(write.task_id);
                shortfalls.extend(write.shortfalls);
            }
            tiers.push(TierReport { tier, task_ids });
        }

        Ok(CreationReport {
            action_plan_id,
            diagnostic_id: diagnostic.id.clone(),
            plan_name: payload.name.clone(),
            tiers,
            tags,
            shortfalls,
            duration_ms: 0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TemplateLookup;
    use crate::error::{ErrorKind, StoreError};
    use crate::model::{
        DiagnosticStatus, NewTag, NewTask, SuggestedTask, TaskAssignee, TaskTagLink,
    };
    use crate::runner::{AssociationKind, WrittenRows};
    use crate::store::{InMemoryStore, StoreSnapshot, TagRow};
    use crate::testing::{answered_diagnostic, plan_payload, task_payload};
    use async_trait::async_trait;
    use std::sync::Mutex;

    fn seeded_snapshot() -> StoreSnapshot {
        StoreSnapshot {
            diagnostics: vec![answered_diagnostic("diag-1", "partner-1", &[("gov", 10.0)])],
            suggested_tasks: vec![SuggestedTask {
                id: "tpl-half".into(),
                score_increase_coefficient: 0.5,
            }],
            ..Default::default()
        }
    }

    fn user() -> ActingUser {
        ActingUser {
            user_id: "user-1".into(),
            partner_id: "partner-1".into(),
        }
    }

    fn test_config() -> Config {
        let mut config = Config::default();
        config.retry.backoff_base_ms = 1;
        config
    }

    fn chain_payload() -> CreateActionPlanPayload {
        let a = task_payload("A");
        let mut b = task_payload("B");
        b.original_task_id = Some("A".into());
        let mut c = task_payload("C");
        c.parent_task_id = Some("B".into());
        // submitted out of dependency order on purpose
        plan_payload(vec![c, b, a])
    }

    /// Wraps the in-memory store with failure injection and a write trace
    #[derive(Default)]
    struct FaultyStore {
        inner: InMemoryStore,
        fail_task_named: Option<String>,
        drop_one_assignee_row: bool,
        events: Mutex<Vec<String>>,
    }

    impl FaultyStore {
        fn new(snapshot: StoreSnapshot) -> Self {
            Self {
                inner: InMemoryStore::from_snapshot(snapshot),
                ..Default::default()
            }
        }

        fn events(&self) -> Vec<String> {
            self.events.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ActionPlanStore for FaultyStore {
        fn name(&self) -> &'static str {
            "faulty"
        }

        async fn fetch_diagnostic(&self, id: &str) -> Result<Option<Diagnostic>, StoreError> {
            self.inner.fetch_diagnostic(id).await
        }

        async fn fetch_suggested_tasks(
            &self,
            ids: &[String],
        ) -> Result<Vec<SuggestedTask>, StoreError> {
            self.inner.fetch_suggested_tasks(ids).await
        }

        async fn find_tag(
            &self,
            name: &str,
            partner_id: &str,
        ) -> Result<Option<String>, StoreError> {
            self.inner.find_tag(name, partner_id).await
        }

        async fn create_action_plan(&self, plan: &NewActionPlan) -> Result<String, StoreError> {
            self.inner.create_action_plan(plan).await
        }

        async fn create_task(&self, task: &NewTask) -> Result<String, StoreError> {
            self.events.lock().unwrap().push(format!("start {}", task.name));
            tokio::task::yield_now().await;
            if self.fail_task_named.as_deref() == Some(task.name.as_str()) {
                return Err(StoreError::Connection("write timed out".into()));
            }
            let id = self.inner.create_task(task).await?;
            self.events.lock().unwrap().push(format!("end {}", task.name));
            Ok(id)
        }

        async fn create_tag(&self, tag: &NewTag) -> Result<String, StoreError> {
            self.inner.create_tag(tag).await
        }

        async fn create_task_assignees(&self, rows: &[TaskAssignee]) -> Result<u64, StoreError> {
            let affected = self.inner.create_task_assignees(rows).await?;
            if self.drop_one_assignee_row {
                return Ok(affected.saturating_sub(1));
            }
            Ok(affected)
        }

        async fn create_task_tags(&self, rows: &[TaskTagLink]) -> Result<u64, StoreError> {
            self.inner.create_task_tags(rows).await
        }
    }

    #[derive(Default)]
    struct RecordingHook {
        calls: Mutex<Vec<(WrittenRows, String)>>,
    }

    #[async_trait]
    impl PartialWriteHook for RecordingHook {
        async fn on_partial_write(&self, written: &WrittenRows, error: &ActionPlanError) {
            self.calls
                .lock()
                .unwrap()
                .push((written.clone(), error.to_string()));
        }
    }

    #[tokio::test]
    async fn test_chain_is_persisted_tier_by_tier() {
        let store = Arc::new(InMemoryStore::from_snapshot(seeded_snapshot()));
        let orchestrator = ActionPlanOrchestrator::new(store.clone(), test_config());

        let report = orchestrator
            .execute("diag-1", &chain_payload(), &user())
            .await
            .unwrap();

        let snapshot = store.snapshot().unwrap();
        assert_eq!(snapshot.action_plans.len(), 1);
        assert_eq!(snapshot.action_plans[0].id, report.action_plan_id);
        assert_eq!(snapshot.action_plans[0].plan.partner_id, "partner-1");
        assert_eq!(snapshot.action_plans[0].plan.customer_id, "customer-1");

        let names: Vec<_> = snapshot.tasks.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["task A", "task B", "task C"]);

        let (a, b, c) = (&snapshot.tasks[0], &snapshot.tasks[1], &snapshot.tasks[2]);
        assert_ne!(a.id, "A");
        assert_eq!(b.original_task_id.as_ref(), Some(&a.id));
        assert_eq!(c.parent_task_id.as_ref(), Some(&b.id));
        assert!(snapshot
            .tasks
            .iter()
            .all(|t| t.action_plan_id == report.action_plan_id));

        assert_eq!(report.tier(Tier::Independent), [a.id.clone()]);
        assert_eq!(report.tier(Tier::Derived), [b.id.clone()]);
        assert_eq!(report.tier(Tier::Subtask), [c.id.clone()]);
    }

    #[tokio::test]
    async fn test_tiers_are_separated_by_a_barrier() {
        let roots: Vec<_> = (0..4).map(|i| task_payload(&format!("root{}", i))).collect();
        let mut tasks = roots.clone();
        for i in 0..4 {
            let mut derived = task_payload(&format!("derived{}", i));
            derived.original_task_id = Some(format!("root{}", i));
            tasks.insert(0, derived);
        }
        let store = Arc::new(FaultyStore::new(seeded_snapshot()));
        let orchestrator = ActionPlanOrchestrator::new(store.clone(), test_config());

        orchestrator
            .execute("diag-1", &plan_payload(tasks), &user())
            .await
            .unwrap();

        let events = store.events();
        let last_root_end = events
            .iter()
            .rposition(|e| e.starts_with("end task root"))
            .unwrap();
        let first_derived_start = events
            .iter()
            .position(|e| e.starts_with("start task derived"))
            .unwrap();
        assert!(last_root_end < first_derived_start, "{:?}", events);

        // writes inside a tier overlap
        let first_root_end = events
            .iter()
            .position(|e| e.starts_with("end task root"))
            .unwrap();
        let starts_before_first_end = events[..first_root_end]
            .iter()
            .filter(|e| e.starts_with("start"))
            .count();
        assert!(starts_before_first_end > 1, "{:?}", events);
    }

    #[tokio::test]
    async fn test_shared_tag_is_created_once() {
        let mut first = task_payload("1");
        first.tags = vec!["urgent".into(), "q1".into()];
        let mut second = task_payload("2");
        second.tags = vec!["urgent".into()];

        let store = Arc::new(InMemoryStore::from_snapshot(seeded_snapshot()));
        let orchestrator = ActionPlanOrchestrator::new(store.clone(), test_config());
        let report = orchestrator
            .execute("diag-1", &plan_payload(vec![first, second]), &user())
            .await
            .unwrap();

        let snapshot = store.snapshot().unwrap();
        let urgent: Vec<_> = snapshot.tags.iter().filter(|t| t.name == "urgent").collect();
        assert_eq!(urgent.len(), 1);
        assert_eq!(urgent[0].partner_id, "partner-1");
        assert_eq!(report.tags["urgent"].id, urgent[0].id);

        let urgent_links: Vec<_> = snapshot
            .task_tags
            .iter()
            .filter(|l| l.tag_id == urgent[0].id)
            .collect();
        assert_eq!(urgent_links.len(), 2);
        assert_ne!(urgent_links[0].task_id, urgent_links[1].task_id);
        assert_eq!(snapshot.task_tags.len(), 3);
    }

    #[tokio::test]
    async fn test_existing_tag_is_reused() {
        let mut snapshot = seeded_snapshot();
        snapshot.tags.push(TagRow {
            id: "tag-urgent".into(),
            name: "urgent".into(),
            partner_id: "partner-1".into(),
        });
        let mut task = task_payload("1");
        task.tags = vec!["urgent".into()];

        let store = Arc::new(InMemoryStore::from_snapshot(snapshot));
        let orchestrator = ActionPlanOrchestrator::new(store.clone(), test_config());
        let report = orchestrator
            .execute("diag-1", &plan_payload(vec![task]), &user())
            .await
            .unwrap();

        assert!(!report.tags["urgent"].created);
        let snapshot = store.snapshot().unwrap();
        assert_eq!(snapshot.tags.len(), 1);
        assert_eq!(snapshot.task_tags[0].tag_id, "tag-urgent");
    }

    #[tokio::test]
    async fn test_assignees_are_linked() {
        let mut task = task_payload("1");
        task.assignee = vec!["u-1".into(), "u-2".into()];
        let store = Arc::new(InMemoryStore::from_snapshot(seeded_snapshot()));
        let orchestrator = ActionPlanOrchestrator::new(store.clone(), test_config());

        let report = orchestrator
            .execute("diag-1", &plan_payload(vec![task, task_payload("2")]), &user())
            .await
            .unwrap();

        let snapshot = store.snapshot().unwrap();
        assert_eq!(snapshot.task_assignees.len(), 2);
        assert!(snapshot
            .task_assignees
            .iter()
            .all(|a| a.task_id == report.tier(Tier::Independent)[0]));
        assert!(report.shortfalls.is_empty());
    }

    #[tokio::test]
    async fn test_score_increase_is_persisted() {
        let mut templated = task_payload("1");
        templated.suggested_task_id = Some("tpl-half".into());
        let plain = task_payload("2");

        for lookup in [TemplateLookup::PerTask, TemplateLookup::Batched] {
            let store = Arc::new(InMemoryStore::from_snapshot(seeded_snapshot()));
            let mut config = test_config();
            config.template_lookup = lookup;
            let orchestrator = ActionPlanOrchestrator::new(store.clone(), config);

            orchestrator
                .execute(
                    "diag-1",
                    &plan_payload(vec![templated.clone(), plain.clone()]),
                    &user(),
                )
                .await
                .unwrap();

            let snapshot = store.snapshot().unwrap();
            let by_name = |name: &str| {
                snapshot
                    .tasks
                    .iter()
                    .find(|t| t.name == name)
                    .cloned()
                    .unwrap()
            };
            let templated_row = by_name("task 1");
            assert_eq!(templated_row.score_increase, 45.0, "{}", lookup);
            assert_eq!(templated_row.suggested_task_id.as_deref(), Some("tpl-half"));
            assert_eq!(by_name("task 2").score_increase, 0.0, "{}", lookup);
        }
    }

    #[tokio::test]
    async fn test_preconditions_reject_without_writes() {
        let mut snapshot = seeded_snapshot();
        let mut pending = answered_diagnostic("diag-pending", "partner-1", &[]);
        pending.status = DiagnosticStatus::InProgress;
        snapshot.diagnostics.push(pending);

        let store = Arc::new(InMemoryStore::from_snapshot(snapshot));
        let orchestrator = ActionPlanOrchestrator::new(store.clone(), test_config());
        let payload = chain_payload();

        let err = orchestrator.execute("", &payload, &user()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        let err = orchestrator
            .execute("diag-missing", &payload, &user())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        let outsider = ActingUser {
            user_id: "user-9".into(),
            partner_id: "partner-9".into(),
        };
        let err = orchestrator
            .execute("diag-1", &payload, &outsider)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthorized);

        let err = orchestrator
            .execute("diag-pending", &payload, &user())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotReady);

        assert_eq!(store.write_count(), 0);
    }

    #[tokio::test]
    async fn test_partner_checked_before_status() {
        let mut snapshot = seeded_snapshot();
        snapshot.diagnostics[0].status = DiagnosticStatus::Created;
        let store = Arc::new(InMemoryStore::from_snapshot(snapshot));
        let orchestrator = ActionPlanOrchestrator::new(store, test_config());

        let outsider = ActingUser {
            user_id: "user-9".into(),
            partner_id: "partner-9".into(),
        };
        let err = orchestrator
            .execute("diag-1", &chain_payload(), &outsider)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthorized);
    }

    #[tokio::test]
    async fn test_dry_run_plans_without_writes() {
        let store = Arc::new(InMemoryStore::from_snapshot(seeded_snapshot()));
        let orchestrator = ActionPlanOrchestrator::new(store.clone(), test_config());

        let plan = orchestrator
            .plan("diag-1", &chain_payload(), &user())
            .await
            .unwrap();

        assert_eq!(plan.len(), 3);
        assert_eq!(plan.independent[0].name, "task A");
        assert_eq!(store.write_count(), 0);
    }

    #[tokio::test]
    async fn test_later_tier_failure_keeps_earlier_rows() {
        let mut sibling = task_payload("D");
        sibling.parent_task_id = Some("A".into());
        let mut payload = chain_payload();
        payload.tasks.push(sibling);

        let mut store = FaultyStore::new(seeded_snapshot());
        store.fail_task_named = Some("task C".into());
        let store = Arc::new(store);
        let hook = Arc::new(RecordingHook::default());
        let orchestrator = ActionPlanOrchestrator::new(store.clone(), test_config())
            .with_partial_write_hook(hook.clone());

        let err = orchestrator
            .execute("diag-1", &payload, &user())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Other);
        assert!(matches!(err, ActionPlanError::Store(StoreError::Connection(_))));

        let snapshot = store.inner.snapshot().unwrap();
        assert_eq!(snapshot.action_plans.len(), 1);
        let names: Vec<_> = snapshot.tasks.iter().map(|t| t.name.as_str()).collect();
        // the failing sub-task does not cancel its sibling
        assert_eq!(names, vec!["task A", "task B", "task D"]);

        let calls = hook.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        let (written, message) = &calls[0];
        assert_eq!(
            written.action_plan_id.as_deref(),
            Some(snapshot.action_plans[0].id.as_str())
        );
        assert_eq!(written.task_ids.len(), 3);
        assert!(message.contains("write timed out"));
    }

    #[tokio::test]
    async fn test_association_shortfall_is_reported() {
        let mut task = task_payload("1");
        task.assignee = vec!["u-1".into(), "u-2".into()];

        let mut store = FaultyStore::new(seeded_snapshot());
        store.drop_one_assignee_row = true;
        let orchestrator = ActionPlanOrchestrator::new(Arc::new(store), test_config());

        let report = orchestrator
            .execute("diag-1", &plan_payload(vec![task]), &user())
            .await
            .unwrap();

        assert_eq!(report.shortfalls.len(), 1);
        assert_eq!(report.shortfalls[0].kind, AssociationKind::Assignee);
        assert_eq!(report.shortfalls[0].submitted, 2);
        assert_eq!(report.shortfalls[0].affected, 1);
    }

    #[tokio::test]
    async fn test_strict_mode_escalates_shortfall() {
        let mut task = task_payload("1");
        task.assignee = vec!["u-1".into(), "u-2".into()];

        let mut store = FaultyStore::new(seeded_snapshot());
        store.drop_one_assignee_row = true;
        let mut config = test_config();
        config.strict_association_counts = true;
        let orchestrator = ActionPlanOrchestrator::new(Arc::new(store), config);

        let err = orchestrator
            .execute("diag-1", &plan_payload(vec![task]), &user())
            .await
            .unwrap_err();
        assert!(matches!(err, ActionPlanError::AssociationShortfall { .. }));
    }

    #[tokio::test]
    async fn test_self_referencing_task_is_written_independently() {
        let store = Arc::new(InMemoryStore::from_snapshot(seeded_snapshot()));
        let orchestrator = ActionPlanOrchestrator::new(store.clone(), test_config());

        let mut task = task_payload("a");
        task.original_task_id = Some("a".into());
        task.parent_task_id = Some("a".into());

        let report = orchestrator
            .execute("diag-1", &plan_payload(vec![task]), &user())
            .await
            .unwrap();

        let snapshot = store.snapshot().unwrap();
        assert_eq!(snapshot.tasks.len(), 1);
        assert!(snapshot.tasks[0].original_task_id.is_none());
        assert!(snapshot.tasks[0].parent_task_id.is_none());
        assert_eq!(report.tier(Tier::Independent), [snapshot.tasks[0].id.clone()]);
        assert!(report.tier(Tier::Derived).is_empty());
    }

    #[tokio::test]
    async fn test_empty_task_list_creates_plan_only() {
        let store = Arc::new(InMemoryStore::from_snapshot(seeded_snapshot()));
        let orchestrator = ActionPlanOrchestrator::new(store.clone(), test_config());

        let id = orchestrator
            .create_action_plan("diag-1", &plan_payload(Vec::new()), &user())
            .await
            .unwrap();

        let snapshot = store.snapshot().unwrap();
        assert_eq!(snapshot.action_plans[0].id, id);
        assert!(snapshot.tasks.is_empty());
        assert_eq!(store.write_count(), 1);
    }
}
