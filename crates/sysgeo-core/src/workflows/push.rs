use super::error::WorkflowError;
use super::progress::{Progress, ProgressReporter};
use crate::connector::onshape::OnshapeConnector;
use crate::connector::url::DocumentRef;
use crate::connector::writeback::{InsertedInstance, TransformMode};
use crate::core::models::assembly::Assembly;
use std::collections::BTreeMap;
use tracing::{info, instrument, warn};

/// Where a pushed assembly goes and which Onshape element backs each component type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushPlan {
    /// Workspace assembly element that receives the instances.
    pub target: DocumentRef,
    /// Source assembly element per component `type_id`.
    pub sources: BTreeMap<i64, DocumentRef>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushedComponent {
    pub component: String,
    pub instance: InsertedInstance,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PushReport {
    pub pushed: Vec<PushedComponent>,
    /// Components left out because their type has no source element.
    pub skipped: Vec<String>,
}

/// Recreates an assembly inside an Onshape workspace element.
///
/// Every non-root component whose `type_id` has a source in `plan` is inserted as a top-level
/// instance of the target and then moved to the component's world pose. Components are visited
/// depth first, so the instance order in Onshape follows the tree.
///
/// # Arguments
///
/// * `connector` - Configured Onshape connector (credentials, transport).
/// * `assembly` - The tree to push; usually read back from SysML text.
/// * `plan` - Target element and the source element of each component type.
/// * `reporter` - Receives one phase and a message per pushed component.
///
/// # Errors
///
/// Returns [`WorkflowError::Connector`] as soon as an insertion or transform fails. Instances
/// created before the failure stay in the target.
#[instrument(skip_all, name = "push_workflow", fields(target = %plan.target))]
pub fn run(
    connector: &OnshapeConnector,
    assembly: &Assembly,
    plan: &PushPlan,
    reporter: &ProgressReporter,
) -> Result<PushReport, WorkflowError> {
    reporter.report(Progress::PhaseStart { name: "Pushing" });
    let mut report = PushReport::default();

    for (_, id) in assembly.depth_first().skip(1) {
        let Some(component) = assembly.component(id) else {
            continue;
        };
        let Some(source) = component.type_id.and_then(|t| plan.sources.get(&t)) else {
            warn!(
                component = component.name(),
                type_id = ?component.type_id,
                "No source element for component type, skipping"
            );
            report.skipped.push(component.name().to_string());
            continue;
        };

        let world = assembly.world_pose(id)?;
        let instance = connector.insert_assembly(&plan.target, source)?;
        connector.transform_occurrences(
            &plan.target,
            &[vec![instance.id.clone()]],
            &world,
            TransformMode::Absolute,
        )?;
        reporter.report(Progress::Message(format!(
            "Placed '{}' as '{}'",
            component.name(),
            instance.name
        )));
        report.pushed.push(PushedComponent {
            component: component.name().to_string(),
            instance,
        });
    }

    reporter.report(Progress::PhaseFinish);
    info!(
        pushed = report.pushed.len(),
        skipped = report.skipped.len(),
        "Pushed assembly '{}'",
        assembly.name()
    );
    Ok(report)
}
