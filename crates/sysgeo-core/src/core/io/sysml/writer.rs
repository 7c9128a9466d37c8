use super::config::{AttributeStyle, ExportConfig, PoseFrame};
use super::error::ExportError;
use super::names::{format_name, format_string};
use crate::core::models::assembly::Assembly;
use crate::core::models::component::Component;
use crate::core::models::ids::ComponentId;
use crate::core::models::pose::Pose;
use crate::core::transforms::provider::{NalgebraTransforms, TransformProvider};
use std::collections::HashSet;
use std::fmt::Write;

const INDENT: &str = "    ";

pub(crate) const SCALAR_ATTRIBUTES: [&str; 6] = ["tx", "ty", "tz", "rx", "ry", "rz"];
pub(crate) const LOCATION_ATTRIBUTE: &str = "location";
pub(crate) const ROTATION_ATTRIBUTE: &str = "rotation";
pub(crate) const TYPE_ID_ATTRIBUTE: &str = "typeID";
pub(crate) const EXTERNAL_ID_ATTRIBUTE: &str = "ID";
pub(crate) const CHILDREN_FEATURE: &str = "children";

/// Serializes the whole tree reachable from the assembly root.
///
/// # Errors
///
/// Returns [`ExportError::DanglingReference`] if a child id does not resolve to a component
/// owned by the referring node.
pub fn export(assembly: &Assembly, config: &ExportConfig) -> Result<String, ExportError> {
    export_with(assembly, assembly.root(), config, &NalgebraTransforms)
}

/// Serializes the subtree rooted at `start`, which must be reachable from the assembly root.
///
/// # Errors
///
/// Returns [`ExportError::Unreachable`] if `start` is detached or unknown, in addition to the
/// errors of [`export`].
pub fn export_subtree(
    assembly: &Assembly,
    start: ComponentId,
    config: &ExportConfig,
) -> Result<String, ExportError> {
    export_with(assembly, start, config, &NalgebraTransforms)
}

/// Serializes a subtree using a specific [`TransformProvider`] for the angle conversion.
pub fn export_with(
    assembly: &Assembly,
    start: ComponentId,
    config: &ExportConfig,
    provider: &dyn TransformProvider,
) -> Result<String, ExportError> {
    if !assembly.is_reachable(start) {
        return Err(ExportError::Unreachable(start));
    }
    let start_pose = match config.pose_frame {
        PoseFrame::Local => None,
        PoseFrame::World => {
            let parent_world = match assembly.parent(start) {
                Some(parent) => assembly
                    .world_pose(parent)
                    .map_err(|_| ExportError::Unreachable(start))?,
                None => Pose::identity(),
            };
            Some(parent_world)
        }
    };

    let mut writer = SysmlWriter {
        assembly,
        config,
        provider,
        out: String::new(),
        visited: HashSet::new(),
    };
    writer.document(start, start_pose)?;
    Ok(writer.out)
}

enum Step<'a> {
    Open {
        id: ComponentId,
        parent: Option<(ComponentId, &'a str)>,
        parent_world: Option<Pose>,
        depth: usize,
    },
    Close {
        depth: usize,
    },
}

struct SysmlWriter<'a> {
    assembly: &'a Assembly,
    config: &'a ExportConfig,
    provider: &'a dyn TransformProvider,
    out: String,
    visited: HashSet<ComponentId>,
}

impl<'a> SysmlWriter<'a> {
    fn document(
        &mut self,
        start: ComponentId,
        parent_world: Option<Pose>,
    ) -> Result<(), ExportError> {
        let config = self.config;
        writeln!(self.out, "package {} {{", format_name(&config.package_name))?;
        if config.include_definitions {
            self.component_definition()?;
            writeln!(self.out)?;
            writeln!(
                self.out,
                "{INDENT}part def {} {{",
                format_name(&config.context_name)
            )?;
            self.part(start, parent_world, 2)?;
            writeln!(self.out, "{INDENT}}}")?;
        } else {
            self.part(start, parent_world, 1)?;
        }
        writeln!(self.out, "}}")?;
        Ok(())
    }

    fn component_definition(&mut self) -> Result<(), ExportError> {
        let definition = format_name(&self.config.definition_name);
        writeln!(self.out, "{INDENT}part def {definition} {{")?;
        let attributes: &[&str] = match self.config.attribute_style {
            AttributeStyle::Scalar => &SCALAR_ATTRIBUTES,
            AttributeStyle::Vector => &[LOCATION_ATTRIBUTE, ROTATION_ATTRIBUTE],
        };
        for name in attributes
            .iter()
            .chain([TYPE_ID_ATTRIBUTE, EXTERNAL_ID_ATTRIBUTE].iter())
        {
            writeln!(self.out, "{INDENT}{INDENT}attribute {name};")?;
        }
        writeln!(
            self.out,
            "{INDENT}{INDENT}part {CHILDREN_FEATURE} : {definition}[0..*];"
        )?;
        writeln!(self.out, "{INDENT}}}")?;
        Ok(())
    }

    /// Writes the part usage for `start` and everything below it.
    ///
    /// The walk keeps its own stack so that the depth of the tree is not bounded by the call
    /// stack.
    fn part(
        &mut self,
        start: ComponentId,
        parent_world: Option<Pose>,
        depth: usize,
    ) -> Result<(), ExportError> {
        let mut stack = vec![Step::Open {
            id: start,
            parent: None,
            parent_world,
            depth,
        }];
        while let Some(step) = stack.pop() {
            match step {
                Step::Close { depth } => {
                    writeln!(self.out, "{}}}", INDENT.repeat(depth))?;
                }
                Step::Open {
                    id,
                    parent,
                    parent_world,
                    depth,
                } => {
                    let (component, world) = self.open(id, parent, parent_world, depth)?;
                    stack.push(Step::Close { depth });
                    for &child in component.children().iter().rev() {
                        stack.push(Step::Open {
                            id: child,
                            parent: Some((id, component.name())),
                            parent_world: world,
                            depth: depth + 1,
                        });
                    }
                }
            }
        }
        Ok(())
    }

    /// Writes the opening line and attributes of one part usage. Returns the component and,
    /// in world frame, its world pose for the children.
    fn open(
        &mut self,
        id: ComponentId,
        parent: Option<(ComponentId, &str)>,
        parent_world: Option<Pose>,
        depth: usize,
    ) -> Result<(&'a Component, Option<Pose>), ExportError> {
        let assembly = self.assembly;
        let dangling = || ExportError::DanglingReference {
            parent: parent.map(|(_, name)| name.to_string()).unwrap_or_default(),
            child: id,
        };
        let component = match assembly.component(id) {
            Some(c) if parent.is_none_or(|(p, _)| c.parent() == Some(p)) => c,
            _ => return Err(dangling()),
        };
        if !self.visited.insert(id) {
            return Err(dangling());
        }

        let pad = INDENT.repeat(depth);
        let name = format_name(component.name());
        let definition = format_name(&self.config.definition_name);
        if parent.is_some() && self.config.include_definitions {
            writeln!(self.out, "{pad}part {name} subsets {CHILDREN_FEATURE} {{")?;
        } else {
            writeln!(self.out, "{pad}part {name} : {definition} {{")?;
        }

        let (pose, world) = match parent_world {
            None => (*component.pose(), None),
            Some(parent_world) => {
                let world = parent_world.compose(component.pose());
                (world, Some(world))
            }
        };
        self.attributes(component, &pose, depth + 1)?;
        Ok((component, world))
    }

    fn attributes(
        &mut self,
        component: &Component,
        pose: &Pose,
        depth: usize,
    ) -> Result<(), ExportError> {
        let translation = pose.translation();
        let radians = self
            .provider
            .rotation_to_euler(&pose.rotation(), self.config.euler_convention);
        let unit = self.config.angle_unit;
        let angles = radians.map(|a| unit.from_radians(a));

        if translation.iter().chain(angles.iter()).any(|v| !v.is_finite()) {
            return Err(ExportError::NonFinite {
                component: component.name().to_string(),
            });
        }

        let pad = INDENT.repeat(depth);
        let places = self.config.decimal_places;
        match self.config.attribute_style {
            AttributeStyle::Scalar => {
                let values = [
                    translation.x,
                    translation.y,
                    translation.z,
                    angles[0],
                    angles[1],
                    angles[2],
                ];
                for (name, value) in SCALAR_ATTRIBUTES.iter().zip(values) {
                    writeln!(
                        self.out,
                        "{pad}attribute :>> {name} = {};",
                        format_number(value, places)
                    )?;
                }
            }
            AttributeStyle::Vector => {
                writeln!(
                    self.out,
                    "{pad}attribute :>> {LOCATION_ATTRIBUTE} = {};",
                    format_tuple(translation.iter().copied(), places)
                )?;
                writeln!(
                    self.out,
                    "{pad}attribute :>> {ROTATION_ATTRIBUTE} = {};",
                    format_tuple(angles.iter().copied(), places)
                )?;
            }
        }
        if let Some(type_id) = component.type_id {
            writeln!(self.out, "{pad}attribute :>> {TYPE_ID_ATTRIBUTE} = {type_id};")?;
        }
        if let Some(external_id) = &component.external_id {
            writeln!(
                self.out,
                "{pad}attribute :>> {EXTERNAL_ID_ATTRIBUTE} = {};",
                format_string(external_id)
            )?;
        }
        Ok(())
    }
}

/// Formats a real literal.
///
/// Without `decimal_places` the shortest text that parses back to the same `f64` is used, so
/// integral values keep a trailing `.0`. Negative zero is written as `0.0`.
pub fn format_number(value: f64, decimal_places: Option<usize>) -> String {
    let value = if value == 0.0 { 0.0 } else { value };
    let text = match decimal_places {
        Some(places) => format!("{value:.places$}"),
        None => format!("{value:?}"),
    };
    match text.strip_prefix('-') {
        Some(unsigned) if unsigned.chars().all(|c| c == '0' || c == '.') => unsigned.to_string(),
        _ => text,
    }
}

fn format_tuple(values: impl Iterator<Item = f64>, places: Option<usize>) -> String {
    let parts: Vec<String> = values.map(|v| format_number(v, places)).collect();
    format!("({})", parts.join(", "))
}
