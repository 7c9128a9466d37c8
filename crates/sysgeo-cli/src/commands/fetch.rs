use crate::cli::FetchArgs;
use crate::config::PartialAppConfig;
use crate::error::{CliError, Result};
use crate::utils::output::write_text;
use crate::utils::progress::CliProgressHandler;
use sysgeo::connector::onshape::OnshapeConnector;
use sysgeo::connector::url::DocumentRef;
use sysgeo::workflows::export::{self, AssemblySource};
use sysgeo::workflows::progress::ProgressReporter;
use tracing::info;

pub fn run(args: FetchArgs) -> Result<()> {
    let app_config = PartialAppConfig::load(args.export.config.as_deref())?;
    info!("Merging configuration from file and CLI arguments...");
    let export_config = app_config.export_config(&args.export)?;
    let mut connector_config = app_config.connector_config(&args.onshape, &args.export.set_values)?;
    if let Some(name) = &args.root_name {
        connector_config = connector_config.with_root_name(name.clone());
    }

    let source = source_from_args(&args)?;
    let connector = OnshapeConnector::new(connector_config)?;

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    info!("Invoking the export workflow...");
    let result = export::run(&connector, &source, &export_config, &reporter)?;

    write_text(&result.text, args.output.as_deref())?;
    if let Some(path) = &args.output {
        println!(
            "✓ Exported {} component(s) to: {}",
            result.assembly.len(),
            path.display()
        );
    }
    Ok(())
}

fn source_from_args(args: &FetchArgs) -> Result<AssemblySource> {
    let source = &args.source;
    if let Some(url) = &source.url {
        return Ok(AssemblySource::Url(url.clone()));
    }
    match (&source.document, &source.workspace, &source.element) {
        (Some(did), Some(wid), Some(eid)) => Ok(AssemblySource::Document(
            DocumentRef::workspace(did.as_str(), wid.as_str(), eid.as_str()),
        )),
        _ => Err(CliError::Argument(
            "Either --url or all of --document, --workspace and --element are required."
                .to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Commands};
    use clap::Parser;

    fn parse(args: &[&str]) -> FetchArgs {
        match Cli::parse_from(args).command {
            Commands::Fetch(args) => args,
            _ => panic!("Expected 'fetch' subcommand"),
        }
    }

    #[test]
    fn url_source_is_passed_through() {
        let args = parse(&[
            "sysgeo",
            "fetch",
            "--url",
            "https://cad.onshape.com/documents/d/w/w/e/e",
        ]);
        assert_eq!(
            source_from_args(&args).unwrap(),
            AssemblySource::Url("https://cad.onshape.com/documents/d/w/w/e/e".to_string())
        );
    }

    #[test]
    fn explicit_ids_form_a_workspace_reference() {
        let args = parse(&[
            "sysgeo", "fetch", "--document", "d1", "--workspace", "w1", "--element", "e1",
        ]);
        assert_eq!(
            source_from_args(&args).unwrap(),
            AssemblySource::Document(DocumentRef::workspace("d1", "w1", "e1"))
        );
    }

    #[test]
    fn incomplete_ids_are_rejected_by_the_parser() {
        let result = Cli::try_parse_from(["sysgeo", "fetch", "--document", "d1"]);
        assert!(result.is_err());
        let result = Cli::try_parse_from(["sysgeo", "fetch"]);
        assert!(result.is_err());
    }
}
