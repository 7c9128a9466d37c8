use crate::core::transforms::euler::{AngleUnit, EulerConvention};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub const DEFAULT_PACKAGE_NAME: &str = "MyStructure";
pub const DEFAULT_DEFINITION_NAME: &str = "Component";
pub const DEFAULT_CONTEXT_NAME: &str = "Context";

/// Largest number of decimal places that still carries information for an `f64`.
pub const MAX_DECIMAL_PLACES: usize = 17;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ConfigError {
    #[error("Invalid value for parameter '{name}': {reason}")]
    InvalidParameter { name: &'static str, reason: String },
}

/// Reference frame of the pose attributes written for each component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PoseFrame {
    /// Relative to the parent component.
    #[default]
    Local,
    /// Relative to the assembly root's frame.
    World,
}

/// Layout of the pose attributes inside a part usage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AttributeStyle {
    /// Six scalar attributes: `tx`, `ty`, `tz`, `rx`, `ry`, `rz`.
    #[default]
    Scalar,
    /// Two tuple attributes: `location = (x, y, z)` and `rotation = (a, b, c)`.
    Vector,
}

#[derive(Debug, Error)]
#[error("Invalid value '{value}' for {what}")]
pub struct ParseOptionError {
    what: &'static str,
    value: String,
}

impl FromStr for PoseFrame {
    type Err = ParseOptionError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "local" => Ok(PoseFrame::Local),
            "world" | "global" => Ok(PoseFrame::World),
            _ => Err(ParseOptionError {
                what: "pose frame",
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for PoseFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PoseFrame::Local => "local",
            PoseFrame::World => "world",
        })
    }
}

impl FromStr for AttributeStyle {
    type Err = ParseOptionError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "scalar" => Ok(AttributeStyle::Scalar),
            "vector" => Ok(AttributeStyle::Vector),
            _ => Err(ParseOptionError {
                what: "attribute style",
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for AttributeStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AttributeStyle::Scalar => "scalar",
            AttributeStyle::Vector => "vector",
        })
    }
}

/// Settings shared by the SysML writer and reader.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportConfig {
    pub package_name: String,
    pub definition_name: String,
    pub context_name: String,
    pub pose_frame: PoseFrame,
    pub attribute_style: AttributeStyle,
    pub euler_convention: EulerConvention,
    pub angle_unit: AngleUnit,
    /// Fixed number of decimals; `None` writes the shortest text that round-trips.
    pub decimal_places: Option<usize>,
    /// Whether to emit the component and context part definitions around the tree.
    pub include_definitions: bool,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            package_name: DEFAULT_PACKAGE_NAME.to_string(),
            definition_name: DEFAULT_DEFINITION_NAME.to_string(),
            context_name: DEFAULT_CONTEXT_NAME.to_string(),
            pose_frame: PoseFrame::default(),
            attribute_style: AttributeStyle::default(),
            euler_convention: EulerConvention::default(),
            angle_unit: AngleUnit::default(),
            decimal_places: None,
            include_definitions: true,
        }
    }
}

#[derive(Default)]
pub struct ExportConfigBuilder {
    package_name: Option<String>,
    definition_name: Option<String>,
    context_name: Option<String>,
    pose_frame: Option<PoseFrame>,
    attribute_style: Option<AttributeStyle>,
    euler_convention: Option<EulerConvention>,
    angle_unit: Option<AngleUnit>,
    decimal_places: Option<usize>,
    include_definitions: Option<bool>,
}

impl ExportConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn package_name(mut self, name: impl Into<String>) -> Self {
        self.package_name = Some(name.into());
        self
    }
    pub fn definition_name(mut self, name: impl Into<String>) -> Self {
        self.definition_name = Some(name.into());
        self
    }
    pub fn context_name(mut self, name: impl Into<String>) -> Self {
        self.context_name = Some(name.into());
        self
    }
    pub fn pose_frame(mut self, frame: PoseFrame) -> Self {
        self.pose_frame = Some(frame);
        self
    }
    pub fn attribute_style(mut self, style: AttributeStyle) -> Self {
        self.attribute_style = Some(style);
        self
    }
    pub fn euler_convention(mut self, convention: EulerConvention) -> Self {
        self.euler_convention = Some(convention);
        self
    }
    pub fn angle_unit(mut self, unit: AngleUnit) -> Self {
        self.angle_unit = Some(unit);
        self
    }
    pub fn decimal_places(mut self, places: usize) -> Self {
        self.decimal_places = Some(places);
        self
    }
    pub fn include_definitions(mut self, include: bool) -> Self {
        self.include_definitions = Some(include);
        self
    }

    pub fn build(self) -> Result<ExportConfig, ConfigError> {
        let defaults = ExportConfig::default();
        let config = ExportConfig {
            package_name: non_empty("package_name", self.package_name, defaults.package_name)?,
            definition_name: non_empty(
                "definition_name",
                self.definition_name,
                defaults.definition_name,
            )?,
            context_name: non_empty("context_name", self.context_name, defaults.context_name)?,
            pose_frame: self.pose_frame.unwrap_or(defaults.pose_frame),
            attribute_style: self.attribute_style.unwrap_or(defaults.attribute_style),
            euler_convention: self.euler_convention.unwrap_or(defaults.euler_convention),
            angle_unit: self.angle_unit.unwrap_or(defaults.angle_unit),
            decimal_places: self.decimal_places,
            include_definitions: self
                .include_definitions
                .unwrap_or(defaults.include_definitions),
        };
        if let Some(places) = config.decimal_places {
            if places > MAX_DECIMAL_PLACES {
                return Err(ConfigError::InvalidParameter {
                    name: "decimal_places",
                    reason: format!("must be at most {MAX_DECIMAL_PLACES}, got {places}"),
                });
            }
        }
        Ok(config)
    }
}

fn non_empty(
    name: &'static str,
    value: Option<String>,
    default: String,
) -> Result<String, ConfigError> {
    match value {
        Some(v) if v.trim().is_empty() => Err(ConfigError::InvalidParameter {
            name,
            reason: "must not be empty".to_string(),
        }),
        Some(v) => Ok(v),
        None => Ok(default),
    }
}
