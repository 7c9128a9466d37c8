use super::error::WorkflowError;
use super::export::ExportResult;
use super::progress::{Progress, ProgressReporter};
use crate::core::io::sysml::config::ExportConfig;
use crate::core::io::sysml::{reader, writer};
use tracing::{info, instrument};

/// Parses SysML text produced by this crate and renders it again with `output` settings.
///
/// `input` must describe the layout of the source text (package, definition and context
/// names, pose frame and angle unit); the attribute style is detected.
///
/// # Errors
///
/// Returns [`WorkflowError::Sysml`] if the source cannot be parsed and
/// [`WorkflowError::Export`] if the result cannot be rendered.
#[instrument(skip_all, name = "convert_workflow")]
pub fn run(
    source: &str,
    input: &ExportConfig,
    output: &ExportConfig,
    reporter: &ProgressReporter,
) -> Result<ExportResult, WorkflowError> {
    reporter.report(Progress::PhaseStart { name: "Parsing" });
    let assembly = reader::parse(source, input)?;
    reporter.report(Progress::PhaseFinish);
    info!(components = assembly.len(), "Parsed assembly '{}'", assembly.name());

    let detached = assembly.detached().len();
    if detached > 0 {
        reporter.report(Progress::Message(format!(
            "{detached} detached component(s) will not be exported"
        )));
    }

    reporter.report(Progress::PhaseStart { name: "Exporting" });
    let text = writer::export(&assembly, output)?;
    reporter.report(Progress::PhaseFinish);

    Ok(ExportResult { assembly, text })
}
