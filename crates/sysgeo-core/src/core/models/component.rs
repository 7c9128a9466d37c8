use super::ids::ComponentId;
use super::pose::Pose;
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// What a component stands for in the source CAD system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ComponentKind {
    Part,
    Assembly,
    #[default]
    Other,
}

/// Unrecognized kinds map to [`ComponentKind::Other`], so parsing never fails.
impl FromStr for ComponentKind {
    type Err = Infallible;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "part" => Ok(ComponentKind::Part),
            "assembly" => Ok(ComponentKind::Assembly),
            _ => Ok(ComponentKind::Other),
        }
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                ComponentKind::Part => "Part",
                ComponentKind::Assembly => "Assembly",
                ComponentKind::Other => "Other",
            }
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Component {
    pub(crate) name: String,
    pub(crate) pose: Pose,                 // Pose relative to the parent
    pub(crate) parent: Option<ComponentId>, // None for the root and detached components
    pub(crate) children: Vec<ComponentId>, // Insertion order
    pub kind: ComponentKind,
    pub type_id: Option<i64>,
    pub external_id: Option<String>,
}

impl Component {
    pub(crate) fn new(name: &str, pose: Pose) -> Self {
        Self {
            name: name.to_string(),
            pose,
            parent: None,
            children: Vec::new(),
            kind: ComponentKind::default(),
            type_id: None,
            external_id: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The pose of this component relative to its parent.
    pub fn pose(&self) -> &Pose {
        &self.pose
    }

    pub fn parent(&self) -> Option<ComponentId> {
        self.parent
    }

    pub fn children(&self) -> &[ComponentId] {
        &self.children
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_component_has_no_relations() {
        let component = Component::new("bracket", Pose::identity());
        assert_eq!(component.name(), "bracket");
        assert!(component.parent().is_none());
        assert!(component.children().is_empty());
        assert_eq!(component.kind, ComponentKind::Other);
        assert!(component.type_id.is_none());
    }

    #[test]
    fn component_kind_parses_case_insensitively() {
        assert_eq!("Part".parse::<ComponentKind>().unwrap(), ComponentKind::Part);
        assert_eq!(
            "ASSEMBLY".parse::<ComponentKind>().unwrap(),
            ComponentKind::Assembly
        );
        assert_eq!(
            "composite".parse::<ComponentKind>().unwrap(),
            ComponentKind::Other
        );
        assert_eq!(ComponentKind::Assembly.to_string(), "Assembly");
    }

    #[test]
    fn empty_kind_is_other_without_an_error_path() {
        let Ok(kind) = "".parse::<ComponentKind>();
        assert_eq!(kind, ComponentKind::Other);
    }
}
