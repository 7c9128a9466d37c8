use crate::cli::ConvertArgs;
use crate::config::PartialAppConfig;
use crate::error::{CliError, Result};
use crate::utils::output::write_text;
use crate::utils::progress::CliProgressHandler;
use sysgeo::workflows::convert;
use sysgeo::workflows::progress::ProgressReporter;
use tracing::info;

pub fn run(args: ConvertArgs) -> Result<()> {
    let app_config = PartialAppConfig::load(args.export.config.as_deref())?;
    let input_config = app_config.input_config(&args.layout)?;
    let output_config = app_config.export_config(&args.export)?;

    info!("Loading input model from {:?}", &args.input);
    let source = std::fs::read_to_string(&args.input).map_err(|e| CliError::FileParsing {
        path: args.input.clone(),
        source: e.into(),
    })?;

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());
    let result = convert::run(&source, &input_config, &output_config, &reporter)?;

    write_text(&result.text, args.output.as_deref())?;
    if let Some(path) = &args.output {
        println!(
            "✓ Converted {} component(s) to: {}",
            result.assembly.len(),
            path.display()
        );
    }
    Ok(())
}
