use super::error::WorkflowError;
use super::progress::{Progress, ProgressReporter};
use crate::connector::onshape::OnshapeConnector;
use crate::connector::url::DocumentRef;
use crate::core::io::sysml::config::ExportConfig;
use crate::core::io::sysml::writer;
use crate::core::models::assembly::Assembly;
use tracing::{info, instrument};

/// Where the exported assembly comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssemblySource {
    /// An Onshape document URL pointing at an assembly element.
    Url(String),
    Document(DocumentRef),
}

#[derive(Debug, Clone)]
pub struct ExportResult {
    pub assembly: Assembly,
    /// The rendered SysML v2 text.
    pub text: String,
}

/// Fetches an assembly from Onshape and renders it as SysML v2 text.
///
/// # Arguments
///
/// * `connector` - Configured Onshape connector (credentials, transport).
/// * `source` - URL or explicit document reference of the assembly element.
/// * `config` - Export settings for the SysML writer.
/// * `reporter` - Receives a phase event for fetching and one for exporting.
///
/// # Return
///
/// The fetched assembly together with its textual rendering.
///
/// # Errors
///
/// Returns [`WorkflowError::Connector`] if the fetch fails and [`WorkflowError::Export`] if the
/// tree cannot be rendered.
#[instrument(skip_all, name = "export_workflow")]
pub fn run(
    connector: &OnshapeConnector,
    source: &AssemblySource,
    config: &ExportConfig,
    reporter: &ProgressReporter,
) -> Result<ExportResult, WorkflowError> {
    reporter.report(Progress::PhaseStart { name: "Fetching" });
    let assembly = match source {
        AssemblySource::Url(url) => connector.fetch_assembly_from_url(url)?,
        AssemblySource::Document(document) => connector.fetch_assembly_at(document)?,
    };
    reporter.report(Progress::PhaseFinish);
    info!(components = assembly.len(), "Fetched assembly '{}'", assembly.name());

    reporter.report(Progress::PhaseStart { name: "Exporting" });
    let text = writer::export(&assembly, config)?;
    reporter.report(Progress::PhaseFinish);
    info!(bytes = text.len(), "Rendered SysML v2 text");

    Ok(ExportResult { assembly, text })
}
