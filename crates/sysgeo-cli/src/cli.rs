use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    version,
    about = "SysGeo CLI - Export CAD assemblies from Onshape as SysML v2 textual models, re-export or inspect existing models, and push them back.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch an Onshape assembly element and export it as SysML v2 text.
    Fetch(FetchArgs),
    /// Re-export an existing SysML file with different export settings.
    Convert(ConvertArgs),
    /// Print the component tree of a SysML file with local and world poses.
    Inspect(InspectArgs),
    /// Recreate a SysML model inside an Onshape assembly from per-type source assemblies.
    Push(PushArgs),
}

/// Arguments for the `fetch` subcommand.
#[derive(Args, Debug)]
pub struct FetchArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Path for the output SysML file. Writes to standard output when omitted.
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    #[command(flatten)]
    pub export: ExportOverrides,

    #[command(flatten)]
    pub onshape: OnshapeArgs,

    /// Name of the root component holding the top-level occurrences.
    #[arg(long, value_name = "NAME")]
    pub root_name: Option<String>,
}

/// Connection settings shared by the subcommands that talk to Onshape.
#[derive(Args, Debug, Clone, Default)]
pub struct OnshapeArgs {
    /// Read API keys from this file before searching for `.env` files.
    #[arg(long, value_name = "PATH")]
    pub env_file: Option<PathBuf>,

    /// Request authentication scheme: 'hmac' (signed requests) or 'basic'.
    #[arg(long, value_name = "SCHEME")]
    pub auth: Option<String>,

    /// Override the Onshape base URL (e.g., an enterprise domain).
    #[arg(long, value_name = "URL")]
    pub base_url: Option<String>,

    /// HTTP timeout in seconds.
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,
}

/// Which Onshape element to fetch: a document URL or its three ids.
#[derive(Args, Debug, Clone)]
#[group(required = true, multiple = true)]
pub struct SourceArgs {
    /// Onshape document URL pointing at an assembly tab.
    #[arg(long, value_name = "URL", conflicts_with_all = ["document", "workspace", "element"])]
    pub url: Option<String>,

    /// Document id.
    #[arg(long, value_name = "ID", requires_all = ["workspace", "element"])]
    pub document: Option<String>,

    /// Workspace id.
    #[arg(long, value_name = "ID", requires_all = ["document", "element"])]
    pub workspace: Option<String>,

    /// Element id of the assembly tab.
    #[arg(long, value_name = "ID", requires_all = ["document", "workspace"])]
    pub element: Option<String>,
}

/// Export settings shared by the subcommands. Each flag overrides the configuration file.
#[derive(Args, Debug, Clone, Default)]
pub struct ExportOverrides {
    /// Path to a configuration file in TOML format.
    /// Defaults to the per-user config file when it exists.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Reference frame of the written poses: 'local' or 'world'.
    #[arg(long, value_name = "FRAME")]
    pub frame: Option<String>,

    /// Name of the enclosing SysML package.
    #[arg(long, value_name = "NAME")]
    pub package: Option<String>,

    /// Euler axis convention for rotations (e.g., 'sxyz', 'rzyx').
    #[arg(long, value_name = "AXES")]
    pub euler: Option<String>,

    /// Write angles in degrees instead of radians.
    #[arg(long)]
    pub degrees: bool,

    /// Pose attribute layout: 'scalar' (tx, ty, ...) or 'vector' (location, rotation).
    #[arg(long, value_name = "STYLE")]
    pub style: Option<String>,

    /// Fixed number of decimal places for numbers.
    #[arg(long, value_name = "INT")]
    pub precision: Option<usize>,

    /// Omit the part definitions and write only the part tree.
    #[arg(long)]
    pub no_definitions: bool,

    /// Set a specific configuration value, overriding the config file.
    /// Can be used multiple times. Example: -S export.package-name=Robot
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,
}

/// Arguments for the `convert` subcommand.
#[derive(Args, Debug)]
pub struct ConvertArgs {
    /// Path to the input SysML file.
    #[arg(required = true, value_name = "PATH")]
    pub input: PathBuf,

    /// Path for the output SysML file. Writes to standard output when omitted.
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    #[command(flatten)]
    pub layout: InputLayout,

    #[command(flatten)]
    pub export: ExportOverrides,
}

/// How the input file was written, when it differs from the configuration file.
#[derive(Args, Debug, Clone, Default)]
pub struct InputLayout {
    /// Reference frame of the poses in the input file.
    #[arg(long, value_name = "FRAME")]
    pub input_frame: Option<String>,

    /// Euler axis convention of the input file.
    #[arg(long, value_name = "AXES")]
    pub input_euler: Option<String>,

    /// Angles in the input file are in degrees.
    #[arg(long)]
    pub input_degrees: bool,
}

/// Arguments for the `inspect` subcommand.
#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Path to the SysML file.
    #[arg(required = true, value_name = "PATH")]
    pub input: PathBuf,

    #[command(flatten)]
    pub export: ExportOverrides,
}

/// Arguments for the `push` subcommand.
#[derive(Args, Debug)]
pub struct PushArgs {
    /// Path to the input SysML file.
    #[arg(required = true, value_name = "PATH")]
    pub input: PathBuf,

    /// Onshape URL of the workspace assembly tab that receives the instances.
    #[arg(long, value_name = "URL")]
    pub target: Option<String>,

    /// Source assembly for one component type, as TYPE_ID=URL.
    /// Can be used multiple times; overrides `[push.sources]` in the config file.
    #[arg(long = "source", value_name = "TYPE_ID=URL")]
    pub sources: Vec<String>,

    /// Create a new assembly tab with this name next to the target and push into it instead.
    #[arg(long, value_name = "NAME")]
    pub new_assembly: Option<String>,

    #[command(flatten)]
    pub layout: InputLayout,

    #[command(flatten)]
    pub onshape: OnshapeArgs,

    /// Path to a configuration file in TOML format.
    /// Defaults to the per-user config file when it exists.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Set a specific configuration value, overriding the config file.
    /// Can be used multiple times. Example: -S push.sources.7=https://...
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,
}
