//! The subset of the Onshape assembly definition response the connector reads.
//!
//! Unknown fields are ignored so that API additions do not break decoding.

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct AssemblyDefinition {
    pub root_assembly: RootAssembly,
    #[serde(default)]
    pub sub_assemblies: Vec<SubAssembly>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct RootAssembly {
    #[serde(default)]
    pub instances: Vec<Instance>,
    #[serde(default)]
    pub occurrences: Vec<Occurrence>,
    #[serde(default)]
    pub document_id: Option<String>,
    #[serde(default)]
    pub element_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct SubAssembly {
    #[serde(default)]
    pub instances: Vec<Instance>,
    #[serde(default)]
    pub document_id: Option<String>,
    #[serde(default)]
    pub element_id: Option<String>,
    #[serde(default)]
    pub configuration: Option<String>,
}

impl SubAssembly {
    /// Whether this definition is the one an assembly instance points at.
    pub fn defines(&self, instance: &Instance) -> bool {
        self.document_id == instance.document_id
            && self.element_id == instance.element_id
            && same_configuration(&self.configuration, &instance.configuration)
    }
}

fn same_configuration(a: &Option<String>, b: &Option<String>) -> bool {
    let normalize = |c: &Option<String>| c.clone().filter(|s| !s.is_empty() && s != "default");
    normalize(a) == normalize(b)
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Instance {
    pub id: String,
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub document_id: Option<String>,
    #[serde(default)]
    pub element_id: Option<String>,
    #[serde(default)]
    pub configuration: Option<String>,
    #[serde(default)]
    pub suppressed: bool,
}

impl Instance {
    pub fn is_assembly(&self) -> bool {
        self.kind.eq_ignore_ascii_case("assembly")
    }
}

/// A placed instance. `path` lists instance ids from the top level down; `transform` holds
/// 16 values of the row-major 4x4 world transform.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Occurrence {
    pub path: Vec<String>,
    pub transform: Vec<f64>,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default)]
    pub fixed: bool,
    /// Nested occurrences whose transforms are relative to this one.
    #[serde(default)]
    pub child_occurrences: Vec<Occurrence>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_minimal_response_and_ignores_unknown_fields() {
        let json = r#"{
            "rootAssembly": {
                "instances": [
                    {"id": "i1", "name": "Base", "type": "Part", "partId": "JHD"}
                ],
                "occurrences": [
                    {"path": ["i1"], "transform": [1,0,0,0, 0,1,0,0, 0,0,1,0, 0,0,0,1], "fixed": true}
                ],
                "fullConfiguration": "default"
            },
            "parts": []
        }"#;
        let definition: AssemblyDefinition = serde_json::from_str(json).unwrap();
        assert!(definition.sub_assemblies.is_empty());
        assert_eq!(definition.root_assembly.instances[0].kind, "Part");
        assert!(definition.root_assembly.occurrences[0].fixed);
        assert_eq!(definition.root_assembly.occurrences[0].transform.len(), 16);
    }

    #[test]
    fn sub_assembly_matches_on_document_element_and_configuration() {
        let instance = Instance {
            id: "a".into(),
            name: "Wheel".into(),
            kind: "Assembly".into(),
            document_id: Some("d".into()),
            element_id: Some("e".into()),
            configuration: Some("default".into()),
            suppressed: false,
        };
        let mut sub = SubAssembly {
            instances: Vec::new(),
            document_id: Some("d".into()),
            element_id: Some("e".into()),
            configuration: None,
        };
        assert!(instance.is_assembly());
        assert!(sub.defines(&instance));

        sub.configuration = Some("size=2".into());
        assert!(!sub.defines(&instance));
    }
}
