//! Score increase per task, from suggested-task coefficients and the
//! diagnostic's aggregate indicator scores.

use futures::future::try_join_all;
use std::collections::{HashMap, HashSet};
use tracing::debug;

use crate::config::{RetryConfig, TemplateLookup};
use crate::error::StoreError;
use crate::model::{IndicatorScore, PlannedTask};
use crate::runner::retry_read;
use crate::store::ActionPlanStore;

/// Combines a template coefficient with an indicator value.
///
/// Either input may be absent; implementations must return a defined
/// "no increase" value in that case instead of failing.
pub trait ScoringFormula: Send + Sync {
    fn score_increase(&self, coefficient: Option<f64>, indicator_value: Option<f64>) -> f64;
}

/// `coefficient * (max_score - indicator_value)`, never negative
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeadroomFormula {
    pub max_score: f64,
}

impl ScoringFormula for HeadroomFormula {
    fn score_increase(&self, coefficient: Option<f64>, indicator_value: Option<f64>) -> f64 {
        match (coefficient, indicator_value) {
            (Some(coefficient), Some(value)) => (coefficient * (self.max_score - value)).max(0.0),
            _ => 0.0,
        }
    }
}

pub struct ScoreCalculator<'a> {
    store: &'a dyn ActionPlanStore,
    formula: &'a dyn ScoringFormula,
    lookup: TemplateLookup,
    retry: &'a RetryConfig,
}

impl<'a> ScoreCalculator<'a> {
    pub fn new(
        store: &'a dyn ActionPlanStore,
        formula: &'a dyn ScoringFormula,
        lookup: TemplateLookup,
        retry: &'a RetryConfig,
    ) -> Self {
        Self {
            store,
            formula,
            lookup,
            retry,
        }
    }

    /// Fill `score_increase` on every task
    pub async fn apply(
        &self,
        tasks: &mut [PlannedTask],
        indicator_scores: &[IndicatorScore],
    ) -> Result<(), StoreError> {
        let coefficients = self.coefficients(tasks).await?;
        let values: HashMap<&str, f64> = indicator_scores
            .iter()
            .map(|s| (s.indicator_id.as_str(), s.value))
            .collect();

        for (task, coefficient) in tasks.iter_mut().zip(coefficients) {
            let value = values.get(task.indicator_id.as_str()).copied();
            task.score_increase = self.formula.score_increase(coefficient, value);
        }
        Ok(())
    }

    /// Template coefficient per task, in task order
    pub async fn coefficients(&self, tasks: &[PlannedTask]) -> Result<Vec<Option<f64>>, StoreError> {
        match self.lookup {
            TemplateLookup::PerTask => {
                try_join_all(
                    tasks
                        .iter()
                        .map(|task| self.lookup_one(task.suggested_task_id.as_deref())),
                )
                .await
            }
            TemplateLookup::Batched => self.lookup_batched(tasks).await,
        }
    }

    async fn lookup_one(&self, suggested_task_id: Option<&str>) -> Result<Option<f64>, StoreError> {
        let Some(id) = suggested_task_id else {
            return Ok(None);
        };
        let ids = [id.to_string()];
        let ids = &ids[..];
        let store = self.store;
        let templates = retry_read(self.retry, move || store.fetch_suggested_tasks(ids)).await?;

        let coefficient = templates.first().map(|t| t.score_increase_coefficient);
        if coefficient.is_none() {
            debug!("Suggested task '{}' not found; no score increase", id);
        }
        Ok(coefficient)
    }

    async fn lookup_batched(&self, tasks: &[PlannedTask]) -> Result<Vec<Option<f64>>, StoreError> {
        let mut seen = HashSet::new();
        let ids: Vec<String> = tasks
            .iter()
            .filter_map(|t| t.suggested_task_id.clone())
            .filter(|id| seen.insert(id.clone()))
            .collect();

        let coefficients: HashMap<String, f64> = if ids.is_empty() {
            HashMap::new()
        } else {
            let store = self.store;
            let ids = &ids;
            retry_read(self.retry, move || store.fetch_suggested_tasks(ids))
                .await?
                .into_iter()
                .map(|t| (t.id, t.score_increase_coefficient))
                .collect()
        };
        debug!(
            "Fetched {} of {} suggested tasks in one lookup",
            coefficients.len(),
            ids.len()
        );

        Ok(tasks
            .iter()
            .map(|t| {
                t.suggested_task_id
                    .as_ref()
                    .and_then(|id| coefficients.get(id).copied())
            })
            .collect())
    }
}
