use crate::cli::InspectArgs;
use crate::config::PartialAppConfig;
use crate::error::{CliError, Result};
use std::fmt::Write as _;
use sysgeo::core::io::sysml::SysmlFile;
use sysgeo::core::io::sysml::config::ExportConfig;
use sysgeo::core::io::traits::AssemblyFile;
use sysgeo::core::models::assembly::Assembly;
use sysgeo::core::models::pose::Pose;
use tracing::info;

pub fn run(args: InspectArgs) -> Result<()> {
    let app_config = PartialAppConfig::load(args.export.config.as_deref())?;
    let config = app_config.export_config(&args.export)?;

    info!("Loading model from {:?}", &args.input);
    let assembly =
        SysmlFile::read_from_path(&args.input, &config).map_err(|e| CliError::FileParsing {
            path: args.input.clone(),
            source: e.into(),
        })?;

    print!("{}", render_tree(&assembly, &config)?);
    Ok(())
}

/// One line per component, indented by depth, with local and world translation and rotation.
/// Angles use the Euler convention and unit of `config`.
pub fn render_tree(assembly: &Assembly, config: &ExportConfig) -> Result<String> {
    let mut out = String::new();
    let write_err = |e: std::fmt::Error| CliError::Other(e.into());

    writeln!(
        out,
        "{} ({} component(s), angles {} in {})",
        assembly.name(),
        assembly.len(),
        config.euler_convention.code(),
        config.angle_unit
    )
    .map_err(write_err)?;

    for (depth, id) in assembly.depth_first() {
        let Some(component) = assembly.component(id) else {
            continue;
        };
        let world = assembly
            .world_pose(id)
            .map_err(|e| CliError::Other(e.into()))?;
        writeln!(
            out,
            "{}{} [{}]  local {}  world {}",
            "  ".repeat(depth),
            component.name(),
            component.kind,
            describe_pose(component.pose(), config),
            describe_pose(&world, config)
        )
        .map_err(write_err)?;
    }

    let detached = assembly.detached();
    if !detached.is_empty() {
        writeln!(out, "{} detached component(s) not shown", detached.len()).map_err(write_err)?;
    }
    Ok(out)
}

fn describe_pose(pose: &Pose, config: &ExportConfig) -> String {
    let t = pose.translation();
    let angles = pose
        .euler_angles(config.euler_convention)
        .map(|a| config.angle_unit.from_radians(a));
    format!(
        "t=({:.6}, {:.6}, {:.6}) r=({:.6}, {:.6}, {:.6})",
        t.x, t.y, t.z, angles[0], angles[1], angles[2]
    )
}
