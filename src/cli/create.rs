use crate::cli::CreateArgs;
use crate::config::Config;
use crate::model::{ActingUser, CreateActionPlanPayload};
use crate::output::write_creation_report;
use crate::runner::ActionPlanOrchestrator;
use crate::store::InMemoryStore;
use crate::transform::TierPlan;
use anyhow::Context;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

pub async fn execute(args: CreateArgs) -> anyhow::Result<()> {
    let mut config = match &args.config {
        Some(path) => {
            info!("Loading config from {:?}", path);
            Config::load(path)?
        }
        None => Config::default(),
    };

    // Apply CLI overrides
    if let Some(report_dir) = args.report_dir.clone() {
        config.report_dir = report_dir;
    }
    if args.strict {
        config.strict_association_counts = true;
    }

    config.validate()?;

    let payload = load_payload(&args.payload)?;
    let store = Arc::new(InMemoryStore::load(&args.store)?);
    let user = ActingUser {
        user_id: args.user.clone(),
        partner_id: args.partner.clone(),
    };

    let report_dir = config.report_dir.clone();
    let orchestrator = ActionPlanOrchestrator::new(store.clone(), config);

    if args.dry_run {
        info!("DRY RUN - nothing will be written");
        let plan = orchestrator
            .plan(&args.diagnostic, &payload, &user)
            .await?;
        print_tier_plan(&payload.name, &plan);
        return Ok(());
    }

    let result = orchestrator
        .execute(&args.diagnostic, &payload, &user)
        .await;

    // Rows written before a failure stay in the store, so persist them either way
    if store.write_count() > 0 {
        store
            .save(&args.store)
            .with_context(|| format!("saving store snapshot to {:?}", args.store))?;
    }

    let report = result?;
    if !report.shortfalls.is_empty() {
        warn!(
            "{} association inserts reported fewer rows than submitted",
            report.shortfalls.len()
        );
    }

    match write_creation_report(&report_dir, &report) {
        Ok(path) => info!("Report written to {:?}", path),
        Err(e) => warn!("Failed to write report: {}", e),
    }

    println!("{}", report.action_plan_id);
    Ok(())
}

fn load_payload(path: &Path) -> anyhow::Result<CreateActionPlanPayload> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading payload {:?}", path))?;
    let payload = serde_json::from_str(&content)
        .with_context(|| format!("parsing payload {:?}", path))?;
    Ok(payload)
}

fn print_tier_plan(name: &str, plan: &TierPlan) {
    println!("\n=== Action Plan: {} ===\n", name);
    println!("Tasks: {}", plan.len());

    for (tier, tasks) in plan.tiers() {
        println!("\n{} ({}):", tier, tasks.len());
        for task in tasks {
            let link = match (&task.original_task_id, &task.parent_task_id) {
                (_, Some(parent)) => format!(" -> parent {}", parent),
                (Some(original), None) => format!(" -> original {}", original),
                (None, None) => String::new(),
            };
            println!(
                "  - {} {} [score +{:.2}]{}",
                task.id, task.name, task.score_increase, link
            );
        }
    }

    let nested = plan.nested_references();
    if !nested.is_empty() {
        println!("\nSame-tier references (written concurrently):");
        for reference in nested {
            println!(
                "  - {} -> {} ({})",
                reference.task_id, reference.referenced_id, reference.tier
            );
        }
    }
    println!();
}
