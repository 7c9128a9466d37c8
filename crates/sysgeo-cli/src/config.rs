use crate::cli::{ExportOverrides, InputLayout, OnshapeArgs, PushArgs};
use crate::error::{CliError, Result};
use directories::ProjectDirs;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use sysgeo::connector::credentials::{ChainResolver, DotenvSearch, EnvCredentials};
use sysgeo::connector::credentials::{DEFAULT_ACCESS_VAR, DEFAULT_SECRET_VAR};
use sysgeo::connector::onshape::ConnectorConfig;
use sysgeo::connector::signing::AuthScheme;
use sysgeo::connector::url::{DocumentRef, parse_onshape_url};
use sysgeo::core::io::sysml::config::{
    AttributeStyle, ExportConfig, ExportConfigBuilder, PoseFrame,
};
use sysgeo::core::transforms::euler::{AngleUnit, EulerConvention};
use sysgeo::workflows::push::PushPlan;
use tracing::debug;

const CONFIG_FILE_NAME: &str = "config.toml";

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct PartialExportConfig {
    package_name: Option<String>,
    definition_name: Option<String>,
    context_name: Option<String>,
    pose_frame: Option<String>,
    attribute_style: Option<String>,
    euler_convention: Option<String>,
    angle_unit: Option<String>,
    decimal_places: Option<usize>,
    include_definitions: Option<bool>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct PartialOnshapeConfig {
    base_url: Option<String>,
    api_version: Option<String>,
    auth_scheme: Option<String>,
    timeout_secs: Option<u64>,
    root_name: Option<String>,
    env_file: Option<PathBuf>,
    access_key_var: Option<String>,
    secret_key_var: Option<String>,
    include_mate_features: Option<bool>,
    include_mate_connectors: Option<bool>,
    include_non_solids: Option<bool>,
}

/// The `[push]` section. Source keys are component type ids, values Onshape URLs.
#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct PartialPushConfig {
    target: Option<String>,
    #[serde(default)]
    sources: BTreeMap<String, String>,
}

/// Settings read from a TOML file, every value optional. Command-line flags are merged on top.
#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields)]
pub struct PartialAppConfig {
    export: Option<PartialExportConfig>,
    onshape: Option<PartialOnshapeConfig>,
    push: Option<PartialPushConfig>,
}

impl PartialAppConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }

    /// Loads the explicit file if given, otherwise the per-user file when it exists.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }
        match default_config_path() {
            Some(path) if path.is_file() => Self::from_file(&path),
            _ => {
                debug!("No configuration file found, using built-in defaults.");
                Ok(Self::default())
            }
        }
    }

    /// Builds the writer settings from the file, `-S` overrides and flags, in that precedence.
    pub fn export_config(&self, overrides: &ExportOverrides) -> Result<ExportConfig> {
        let mut merged = self.clone();
        merged.apply_set_values(&overrides.set_values)?;
        let file = merged.export.unwrap_or_default();

        let mut builder = Self::export_builder(&file)?;
        if let Some(frame) = &overrides.frame {
            builder = builder.pose_frame(parse_option(frame, "--frame")?);
        }
        if let Some(package) = &overrides.package {
            builder = builder.package_name(package.clone());
        }
        if let Some(euler) = &overrides.euler {
            builder = builder.euler_convention(parse_convention(euler)?);
        }
        if overrides.degrees {
            builder = builder.angle_unit(AngleUnit::Degrees);
        }
        if let Some(style) = &overrides.style {
            builder = builder.attribute_style(parse_option(style, "--style")?);
        }
        if let Some(places) = overrides.precision {
            builder = builder.decimal_places(places);
        }
        if overrides.no_definitions {
            builder = builder.include_definitions(false);
        }

        builder.build().map_err(|e| CliError::Config(e.to_string()))
    }

    /// Builds the settings describing an existing file: the configuration file's `[export]`
    /// section with the `--input-*` flags on top.
    pub fn input_config(&self, layout: &InputLayout) -> Result<ExportConfig> {
        let file = self.export.clone().unwrap_or_default();
        let mut builder = Self::export_builder(&file)?;
        if let Some(frame) = &layout.input_frame {
            builder = builder.pose_frame(parse_option(frame, "--input-frame")?);
        }
        if let Some(euler) = &layout.input_euler {
            builder = builder.euler_convention(parse_convention(euler)?);
        }
        if layout.input_degrees {
            builder = builder.angle_unit(AngleUnit::Degrees);
        }
        builder.build().map_err(|e| CliError::Config(e.to_string()))
    }

    fn export_builder(file: &PartialExportConfig) -> Result<ExportConfigBuilder> {
        let mut builder = ExportConfigBuilder::new();
        if let Some(name) = &file.package_name {
            builder = builder.package_name(name.clone());
        }
        if let Some(name) = &file.definition_name {
            builder = builder.definition_name(name.clone());
        }
        if let Some(name) = &file.context_name {
            builder = builder.context_name(name.clone());
        }
        if let Some(frame) = &file.pose_frame {
            builder = builder.pose_frame(parse_option::<PoseFrame>(frame, "export.pose-frame")?);
        }
        if let Some(style) = &file.attribute_style {
            builder = builder
                .attribute_style(parse_option::<AttributeStyle>(style, "export.attribute-style")?);
        }
        if let Some(convention) = &file.euler_convention {
            builder = builder.euler_convention(parse_convention(convention)?);
        }
        if let Some(unit) = &file.angle_unit {
            builder = builder.angle_unit(parse_option::<AngleUnit>(unit, "export.angle-unit")?);
        }
        if let Some(places) = file.decimal_places {
            builder = builder.decimal_places(places);
        }
        if let Some(include) = file.include_definitions {
            builder = builder.include_definitions(include);
        }
        Ok(builder)
    }

    /// Builds the connector settings. Credentials come from the environment first, then from
    /// key files (`--env-file` or `onshape.env-file` before the upward `.env` search).
    pub fn connector_config(
        &self,
        args: &OnshapeArgs,
        set_values: &[String],
    ) -> Result<ConnectorConfig> {
        let mut merged = self.clone();
        merged.apply_set_values(set_values)?;
        let file = merged.onshape.unwrap_or_default();

        let access_var = file
            .access_key_var
            .clone()
            .unwrap_or_else(|| DEFAULT_ACCESS_VAR.to_string());
        let secret_var = file
            .secret_key_var
            .clone()
            .unwrap_or_else(|| DEFAULT_SECRET_VAR.to_string());

        let mut dotenv = DotenvSearch::from_current_dir().keys(&access_var, &secret_var);
        if let Some(path) = args.env_file.as_ref().or(file.env_file.as_ref()) {
            dotenv = dotenv.override_file(path.clone());
        }
        let resolver = ChainResolver::new()
            .with(EnvCredentials::new(access_var, secret_var))
            .with(dotenv);

        let mut config = ConnectorConfig::new(resolver)
            .include_mate_features(file.include_mate_features.unwrap_or(false))
            .include_mate_connectors(file.include_mate_connectors.unwrap_or(false))
            .include_non_solids(file.include_non_solids.unwrap_or(false));

        if let Some(url) = args.base_url.as_ref().or(file.base_url.as_ref()) {
            config = config.with_base_url(url.clone());
        }
        if let Some(version) = &file.api_version {
            config = config.with_api_version(version.clone());
        }
        if let Some(scheme) = args.auth.as_ref().or(file.auth_scheme.as_ref()) {
            config = config.with_auth_scheme(parse_option::<AuthScheme>(scheme, "--auth")?);
        }
        if let Some(secs) = args.timeout.or(file.timeout_secs) {
            config = config.with_timeout(Duration::from_secs(secs));
        }
        if let Some(name) = &file.root_name {
            config = config.with_root_name(name.clone());
        }
        Ok(config)
    }

    /// Builds the push target and type sources: the `[push]` section, then `-S` overrides, then
    /// `--target` and `--source` flags.
    pub fn push_plan(&self, args: &PushArgs) -> Result<PushPlan> {
        let mut merged = self.clone();
        merged.apply_set_values(&args.set_values)?;
        let mut file = merged.push.unwrap_or_default();

        for entry in &args.sources {
            let (type_id, url) = entry.split_once('=').ok_or_else(|| {
                CliError::Argument(format!("Invalid --source '{entry}'. Expected TYPE_ID=URL."))
            })?;
            file.sources.insert(type_id.trim().to_string(), url.trim().to_string());
        }

        let target = args.target.as_ref().or(file.target.as_ref()).ok_or_else(|| {
            CliError::Argument("No push target. Use --target or set push.target.".to_string())
        })?;
        let sources = file
            .sources
            .iter()
            .map(|(type_id, url)| -> Result<(i64, DocumentRef)> {
                Ok((parse_type_id(type_id)?, parse_onshape_url(url)?))
            })
            .collect::<Result<BTreeMap<_, _>>>()?;

        Ok(PushPlan {
            target: parse_onshape_url(target)?,
            sources,
        })
    }

    fn apply_set_values(&mut self, set_values: &[String]) -> Result<()> {
        for kv_pair in set_values {
            let (key, value) = kv_pair.split_once('=').ok_or_else(|| {
                CliError::Config(format!(
                    "Invalid --set format: '{}'. Expected KEY=VALUE.",
                    kv_pair
                ))
            })?;
            let key = key.trim();
            let value = value.trim().to_string();

            let parse_bool = |v: &str| {
                v.parse::<bool>().map_err(|_| {
                    CliError::Config(format!("Invalid boolean value for {}: {}", key, v))
                })
            };
            let parse_int = |v: &str| {
                v.parse::<u64>().map_err(|_| {
                    CliError::Config(format!("Invalid integer value for {}: {}", key, v))
                })
            };

            if let Some(field) = key.strip_prefix("export.") {
                let export = self.export.get_or_insert_with(Default::default);
                match field {
                    "package-name" => export.package_name = Some(value),
                    "definition-name" => export.definition_name = Some(value),
                    "context-name" => export.context_name = Some(value),
                    "pose-frame" => export.pose_frame = Some(value),
                    "attribute-style" => export.attribute_style = Some(value),
                    "euler-convention" => export.euler_convention = Some(value),
                    "angle-unit" => export.angle_unit = Some(value),
                    "decimal-places" => export.decimal_places = Some(parse_int(&value)? as usize),
                    "include-definitions" => {
                        export.include_definitions = Some(parse_bool(&value)?)
                    }
                    _ => return Err(unsupported_key(key)),
                }
            } else if let Some(field) = key.strip_prefix("onshape.") {
                let onshape = self.onshape.get_or_insert_with(Default::default);
                match field {
                    "base-url" => onshape.base_url = Some(value),
                    "api-version" => onshape.api_version = Some(value),
                    "auth-scheme" => onshape.auth_scheme = Some(value),
                    "timeout-secs" => onshape.timeout_secs = Some(parse_int(&value)?),
                    "root-name" => onshape.root_name = Some(value),
                    "env-file" => onshape.env_file = Some(PathBuf::from(value)),
                    "access-key-var" => onshape.access_key_var = Some(value),
                    "secret-key-var" => onshape.secret_key_var = Some(value),
                    "include-mate-features" => {
                        onshape.include_mate_features = Some(parse_bool(&value)?)
                    }
                    "include-mate-connectors" => {
                        onshape.include_mate_connectors = Some(parse_bool(&value)?)
                    }
                    "include-non-solids" => {
                        onshape.include_non_solids = Some(parse_bool(&value)?)
                    }
                    _ => return Err(unsupported_key(key)),
                }
            } else if let Some(field) = key.strip_prefix("push.") {
                let push = self.push.get_or_insert_with(Default::default);
                match field {
                    "target" => push.target = Some(value),
                    _ => match field.strip_prefix("sources.") {
                        Some(type_id) if !type_id.is_empty() => {
                            push.sources.insert(type_id.to_string(), value);
                        }
                        _ => return Err(unsupported_key(key)),
                    },
                }
            } else {
                return Err(unsupported_key(key));
            }
        }
        Ok(())
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    ProjectDirs::from("org", "sysgeo", "sysgeo")
        .map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
}

fn unsupported_key(key: &str) -> CliError {
    CliError::Config(format!("Unsupported configuration key for --set: '{}'", key))
}

fn parse_option<T>(value: &str, name: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value
        .parse()
        .map_err(|e| CliError::Config(format!("Invalid value for {}: {}", name, e)))
}

fn parse_type_id(value: &str) -> Result<i64> {
    value
        .parse()
        .map_err(|_| CliError::Config(format!("Invalid component type id '{}'", value)))
}

fn parse_convention(value: &str) -> Result<EulerConvention> {
    EulerConvention::parse(value).map_err(|e| CliError::Config(e.to_string()))
}
