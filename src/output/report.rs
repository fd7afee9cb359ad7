use crate::error::OutputError;
use crate::runner::CreationReport;
use std::fs;
use std::path::{Path, PathBuf};

/// Write `<plan_id>.md` and `<plan_id>.json` for a created action plan.
///
/// Returns the markdown path.
pub fn write_creation_report(
    report_dir: &Path,
    report: &CreationReport,
) -> Result<PathBuf, OutputError> {
    fs::create_dir_all(report_dir).map_err(OutputError::CreateDir)?;

    let md_path = report_dir.join(format!("{}.md", report.action_plan_id));
    fs::write(&md_path, render_markdown(report)).map_err(OutputError::WriteReport)?;

    let json_path = report_dir.join(format!("{}.json", report.action_plan_id));
    let json = serde_json::to_string_pretty(report)?;
    fs::write(&json_path, json).map_err(OutputError::WriteReport)?;

    Ok(md_path)
}

fn render_markdown(report: &CreationReport) -> String {
    let mut content = String::new();

    content.push_str(&format!("# {}\n\n", report.plan_name));

    content.push_str("| Metric | Value |\n");
    content.push_str("|--------|-------|\n");
    content.push_str(&format!("| Action Plan | `{}` |\n", report.action_plan_id));
    content.push_str(&format!("| Diagnostic | `{}` |\n", report.diagnostic_id));
    content.push_str(&format!(
        "| Duration | {:.1}s |\n",
        report.duration_ms as f64 / 1000.0
    ));
    content.push_str(&format!("| Tasks | {} |\n", report.task_count()));
    for tier in &report.tiers {
        content.push_str(&format!("| {} | {} |\n", tier.tier, tier.task_ids.len()));
    }
    content.push_str("\n---\n\n");

    content.push_str("## Tasks\n\n");
    if report.tiers.is_empty() {
        content.push_str("*No tasks*\n\n");
    }
    for tier in &report.tiers {
        content.push_str(&format!("### {}\n\n", tier.tier));
        for id in &tier.task_ids {
            content.push_str(&format!("- `{}`\n", id));
        }
        content.push('\n');
    }

    if !report.tags.is_empty() {
        content.push_str("## Tags\n\n");
        for (name, tag) in &report.tags {
            let origin = if tag.created { "created" } else { "reused" };
            content.push_str(&format!("- **{}** `{}` ({})\n", name, tag.id, origin));
        }
        content.push('\n');
    }

    if !report.shortfalls.is_empty() {
        content.push_str("## Association Shortfalls\n\n");
        for shortfall in &report.shortfalls {
            content.push_str(&format!(
                "- ⚠️ task `{}`: {} of {} {} rows written\n",
                shortfall.task_id, shortfall.affected, shortfall.submitted, shortfall.kind
            ));
        }
        content.push('\n');
    }

    content
}
