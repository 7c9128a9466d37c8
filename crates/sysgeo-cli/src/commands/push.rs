use crate::cli::PushArgs;
use crate::config::PartialAppConfig;
use crate::error::{CliError, Result};
use crate::utils::progress::CliProgressHandler;
use sysgeo::connector::onshape::OnshapeConnector;
use sysgeo::connector::url::{DocumentRef, WvmKind};
use sysgeo::core::io::sysml::SysmlFile;
use sysgeo::core::io::traits::AssemblyFile;
use sysgeo::workflows::progress::ProgressReporter;
use sysgeo::workflows::push;
use tracing::{info, warn};

pub fn run(args: PushArgs) -> Result<()> {
    let app_config = PartialAppConfig::load(args.config.as_deref())?;
    let input_config = app_config.input_config(&args.layout)?;
    let connector_config = app_config.connector_config(&args.onshape, &args.set_values)?;
    let mut plan = app_config.push_plan(&args)?;
    require_workspace(&plan.target)?;

    info!("Loading input model from {:?}", &args.input);
    let assembly = SysmlFile::read_from_path(&args.input, &input_config).map_err(|e| {
        CliError::FileParsing {
            path: args.input.clone(),
            source: e.into(),
        }
    })?;

    let connector = OnshapeConnector::new(connector_config)?;
    if let Some(name) = &args.new_assembly {
        let target = &plan.target;
        plan.target = connector.create_assembly(&target.document_id, &target.wvm_id, name)?;
        println!("✓ Created assembly '{}': {}", name, plan.target);
    }

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    info!("Invoking the push workflow...");
    let report = push::run(&connector, &assembly, &plan, &reporter)?;

    println!(
        "✓ Pushed {} component(s) to: {}",
        report.pushed.len(),
        plan.target
    );
    if !report.skipped.is_empty() {
        warn!(
            "{} component(s) had no source for their type: {}",
            report.skipped.len(),
            report.skipped.join(", ")
        );
    }
    Ok(())
}

fn require_workspace(target: &DocumentRef) -> Result<()> {
    if target.wvm == WvmKind::Workspace {
        Ok(())
    } else {
        Err(CliError::Argument(format!(
            "Push target {} is not a workspace; versions cannot be edited.",
            target
        )))
    }
}
