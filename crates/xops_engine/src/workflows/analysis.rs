use std::path::{Path, PathBuf};

use serde::Serialize;
use xops_core::{render_tutorial_plan, render_viral_report, TutorialPlan, ViralReport};
use xops_logging::xops_info;

use super::{output_id, WorkflowError};
use crate::paths::WorkspacePaths;
use crate::persist::write_file;
use crate::store::load_capture;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TutorialResult {
    pub capture: PathBuf,
    pub output: PathBuf,
    pub steps: usize,
    pub commands: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ViralResult {
    pub capture: PathBuf,
    pub out_json: PathBuf,
    pub out_md: PathBuf,
}

/// Action plan for a tutorial-style capture, written to
/// `data/action-plans/<id>.md` unless `output` is given.
pub fn write_tutorial_plan(
    paths: &WorkspacePaths,
    capture_path: &Path,
    output: Option<&Path>,
) -> Result<TutorialResult, WorkflowError> {
    let record = load_capture(capture_path)?;
    let plan = TutorialPlan::from_record(&record);
    let target = match output {
        Some(path) => path.to_path_buf(),
        None => paths
            .action_plans_dir()
            .join(format!("{}.md", output_id(&record, capture_path))),
    };
    let output = write_file(&target, render_tutorial_plan(&record, &plan))?;
    xops_info!(
        "Tutorial plan with {} steps and {} commands at {:?}",
        plan.steps.len(),
        plan.commands.len(),
        output
    );
    Ok(TutorialResult {
        capture: capture_path.to_path_buf(),
        output,
        steps: plan.steps.len(),
        commands: plan.commands.len(),
    })
}

/// Structure report as JSON and markdown. `output` is a path prefix; the
/// default is `data/structure/<id>`.
pub fn write_viral_report(
    paths: &WorkspacePaths,
    capture_path: &Path,
    output: Option<&Path>,
) -> Result<ViralResult, WorkflowError> {
    let record = load_capture(capture_path)?;
    let report = ViralReport::from_record(&record);
    let base = match output {
        Some(path) => path.to_path_buf(),
        None => paths.structure_dir().join(output_id(&record, capture_path)),
    };

    let json = serde_json::to_string_pretty(&report)?;
    let out_json = write_file(&base.with_extension("json"), format!("{json}\n"))?;
    let out_md = write_file(&base.with_extension("md"), render_viral_report(&report))?;
    xops_info!("Viral report ({} hook) at {:?}", report.hook_type, out_md);
    Ok(ViralResult {
        capture: capture_path.to_path_buf(),
        out_json,
        out_md,
    })
}
