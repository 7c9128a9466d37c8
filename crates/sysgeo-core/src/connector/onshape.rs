use super::credentials::{ChainResolver, CredentialResolver};
use super::error::ConnectorError;
use super::models::{AssemblyDefinition, Instance, Occurrence, SubAssembly};
use super::signing::{self, AuthScheme};
use super::transport::{
    ApiRequest, ApiResponse, DEFAULT_TIMEOUT, HttpTransport, Method, Transport,
};
use super::url::{DocumentRef, parse_onshape_url};
use crate::core::models::assembly::Assembly;
use crate::core::models::component::ComponentKind;
use crate::core::models::ids::ComponentId;
use crate::core::models::pose::Pose;
use crate::core::transforms::provider::{NalgebraTransforms, TransformProvider};
use chrono::Utc;
use nalgebra::{IsometryMatrix3, Matrix4, Translation3};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

pub const DEFAULT_BASE_URL: &str = "https://cad.onshape.com";
pub const DEFAULT_API_VERSION: &str = "v11";
pub const DEFAULT_ROOT_NAME: &str = "root";

/// Scale and shear below this deviation are treated as numerical noise.
const RIGID_TOLERANCE: f64 = 1e-6;

/// Everything the connector needs to talk to Onshape. Credentials are an explicit resolver
/// rather than ambient process state.
#[derive(Debug)]
pub struct ConnectorConfig {
    pub credentials: Box<dyn CredentialResolver>,
    pub base_url: String,
    pub api_version: String,
    pub include_mate_features: bool,
    pub include_mate_connectors: bool,
    pub include_non_solids: bool,
    pub auth_scheme: AuthScheme,
    pub timeout: Duration,
    /// Name of the root component that holds the top-level occurrences.
    pub root_name: String,
}

impl Default for ConnectorConfig {
    fn default() -> Self {
        Self::new(ChainResolver::default_chain())
    }
}

impl ConnectorConfig {
    pub fn new(credentials: impl CredentialResolver + 'static) -> Self {
        Self {
            credentials: Box::new(credentials),
            base_url: DEFAULT_BASE_URL.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
            include_mate_features: false,
            include_mate_connectors: false,
            include_non_solids: false,
            auth_scheme: AuthScheme::default(),
            timeout: DEFAULT_TIMEOUT,
            root_name: DEFAULT_ROOT_NAME.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = version.into();
        self
    }

    pub fn with_auth_scheme(mut self, scheme: AuthScheme) -> Self {
        self.auth_scheme = scheme;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_root_name(mut self, name: impl Into<String>) -> Self {
        self.root_name = name.into();
        self
    }

    pub fn include_mate_features(mut self, include: bool) -> Self {
        self.include_mate_features = include;
        self
    }

    pub fn include_mate_connectors(mut self, include: bool) -> Self {
        self.include_mate_connectors = include;
        self
    }

    pub fn include_non_solids(mut self, include: bool) -> Self {
        self.include_non_solids = include;
        self
    }

    fn query(&self) -> String {
        format!(
            "includeMateFeatures={}&includeMateConnectors={}&includeNonSolids={}",
            self.include_mate_features, self.include_mate_connectors, self.include_non_solids
        )
    }
}

/// Reads Onshape assembly elements into [`Assembly`] values and writes placements back.
pub struct OnshapeConnector {
    config: ConnectorConfig,
    transport: Box<dyn Transport>,
    transforms: Box<dyn TransformProvider>,
}

impl OnshapeConnector {
    /// Creates a connector backed by the blocking HTTP client.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectorError::Transport`] if the HTTP client cannot be built.
    pub fn new(config: ConnectorConfig) -> Result<Self, ConnectorError> {
        let transport = HttpTransport::new(config.timeout)?;
        Ok(Self::with_transport(config, transport))
    }

    pub fn with_transport(config: ConnectorConfig, transport: impl Transport + 'static) -> Self {
        Self {
            config,
            transport: Box::new(transport),
            transforms: Box::new(NalgebraTransforms),
        }
    }

    /// Replaces the transform backend used to decompose occurrence matrices.
    pub fn with_transforms(mut self, transforms: impl TransformProvider + 'static) -> Self {
        self.transforms = Box::new(transforms);
        self
    }

    pub fn config(&self) -> &ConnectorConfig {
        &self.config
    }

    /// Fetches an assembly element from a workspace.
    pub fn fetch_assembly(
        &self,
        document_id: &str,
        workspace_id: &str,
        element_id: &str,
    ) -> Result<Assembly, ConnectorError> {
        self.fetch_assembly_at(&DocumentRef::workspace(document_id, workspace_id, element_id))
    }

    /// Fetches the assembly element an Onshape document URL points at.
    pub fn fetch_assembly_from_url(&self, url: &str) -> Result<Assembly, ConnectorError> {
        let document = parse_onshape_url(url)?;
        self.fetch_assembly_at(&document)
    }

    /// Fetches an assembly element and builds the component tree from its occurrences.
    ///
    /// Top-level occurrences become children of a root component named after
    /// [`ConnectorConfig::root_name`]; each component's local pose is chosen so that its world
    /// pose equals the transform reported by Onshape.
    ///
    /// # Errors
    ///
    /// * [`ConnectorError::Authentication`] if credentials cannot be resolved (no request is
    ///   sent) or the API rejects them.
    /// * [`ConnectorError::NotFound`] for a 404 response.
    /// * [`ConnectorError::Upstream`] for any other non-2xx response.
    /// * [`ConnectorError::MalformedResponse`] if an occurrence refers to an unknown instance or
    ///   its parent occurrence is missing.
    /// * [`ConnectorError::Model`] if the tree cannot be built, e.g. duplicate sibling names.
    #[instrument(skip_all, name = "fetch_assembly", fields(document = %document))]
    pub fn fetch_assembly_at(&self, document: &DocumentRef) -> Result<Assembly, ConnectorError> {
        info!("Requesting assembly definition");
        let definition = self.definition(document)?;

        let mut assembly = self.build_assembly(&definition)?;
        assembly.set_metadata("onshape.document", &document.to_string());
        info!(components = assembly.len(), "Assembly built from Onshape occurrences");
        Ok(assembly)
    }

    /// Fetches and decodes the raw assembly definition of an element.
    pub(crate) fn definition(
        &self,
        document: &DocumentRef,
    ) -> Result<AssemblyDefinition, ConnectorError> {
        let path = self.api_path(&format!("assemblies/{}", document.api_path()));
        let response = self.send(Method::Get, path, self.config.query(), None)?;
        let body = check_status(response, &document.to_string())?;
        Ok(serde_json::from_str(&body)?)
    }

    pub(crate) fn api_path(&self, endpoint: &str) -> String {
        format!("/api/{}/{endpoint}", self.config.api_version)
    }

    /// Signs and sends one request. Credentials are resolved first, so a missing key pair
    /// fails before anything reaches the transport.
    pub(crate) fn send(
        &self,
        method: Method,
        path: String,
        query: String,
        body: Option<String>,
    ) -> Result<ApiResponse, ConnectorError> {
        let credentials = self.config.credentials.resolve()?;
        let headers = signing::auth_headers(
            self.config.auth_scheme,
            &credentials,
            method.as_str(),
            &path,
            &query,
            Utc::now(),
            &signing::generate_nonce(),
        )?;
        let request = ApiRequest {
            method,
            base_url: self.config.base_url.clone(),
            path,
            query,
            headers,
            body,
        };
        self.transport.send(&request)
    }

    fn build_assembly(&self, definition: &AssemblyDefinition) -> Result<Assembly, ConnectorError> {
        let root_name = &self.config.root_name;
        let mut assembly = Assembly::new(root_name, root_name, Pose::identity());
        let index = InstanceIndex::new(definition);

        let mut occurrences = Vec::new();
        flatten_occurrences(
            &definition.root_assembly.occurrences,
            &Matrix4::identity(),
            &mut occurrences,
        )?;
        occurrences.sort_by_key(|(path, _)| path.len());

        let mut placed: HashMap<Vec<String>, (ComponentId, Pose)> = HashMap::new();
        placed.insert(Vec::new(), (assembly.root(), Pose::identity()));

        for (path, world_matrix) in occurrences {
            let Some((last, parent_path)) = path.split_last() else {
                return Err(ConnectorError::MalformedResponse(
                    "occurrence with an empty path".to_string(),
                ));
            };
            let (parent_id, parent_world) = placed.get(parent_path).cloned().ok_or_else(|| {
                ConnectorError::MalformedResponse(format!(
                    "occurrence {} has no parent occurrence",
                    path.join("/")
                ))
            })?;
            let instance = index.resolve(&path).ok_or_else(|| {
                ConnectorError::MalformedResponse(format!(
                    "occurrence {} refers to unknown instance '{last}'",
                    path.join("/")
                ))
            })?;

            let world = self.world_pose(&world_matrix, &instance.name)?;
            let local = parent_world.inverse().compose(&world);
            let id = assembly.create_component(&instance.name, local, Some(parent_id))?;
            if let Some(component) = assembly.component_mut(id) {
                let Ok(kind) = instance.kind.parse::<ComponentKind>();
                component.kind = kind;
                component.external_id = Some(instance.id.clone());
            }
            debug!(
                name = %instance.name,
                kind = %instance.kind,
                depth = path.len(),
                "Placed occurrence"
            );
            placed.insert(path, (id, world));
        }

        Ok(assembly)
    }

    fn world_pose(&self, matrix: &Matrix4<f64>, name: &str) -> Result<Pose, ConnectorError> {
        let parts = self.transforms.decompose(matrix)?;
        if !parts.is_rigid(RIGID_TOLERANCE) {
            warn!(
                component = name,
                scale = ?parts.scale,
                shear = ?parts.shear,
                "Dropping scale and shear from occurrence transform"
            );
        }
        Ok(Pose::from_isometry(IsometryMatrix3::from_parts(
            Translation3::from(parts.translation),
            parts.rotation,
        ))?)
    }
}

pub(crate) fn check_status(response: ApiResponse, target: &str) -> Result<String, ConnectorError> {
    match response.status {
        _ if response.is_success() => Ok(response.body),
        401 | 403 => Err(ConnectorError::Authentication(format!(
            "Onshape rejected the credentials (status {}): {}",
            response.status, response.body
        ))),
        404 => Err(ConnectorError::NotFound(target.to_string())),
        status => Err(ConnectorError::Upstream {
            status,
            body: response.body,
        }),
    }
}

/// Collects `(path, world transform)` pairs, composing nested occurrences onto their parent.
pub(crate) fn flatten_occurrences(
    occurrences: &[Occurrence],
    parent: &Matrix4<f64>,
    out: &mut Vec<(Vec<String>, Matrix4<f64>)>,
) -> Result<(), ConnectorError> {
    for occurrence in occurrences {
        if occurrence.transform.len() != 16 {
            return Err(ConnectorError::MalformedResponse(format!(
                "occurrence {} has a transform of {} values, expected 16",
                occurrence.path.join("/"),
                occurrence.transform.len()
            )));
        }
        let world = parent * Matrix4::from_row_slice(&occurrence.transform);
        out.push((occurrence.path.clone(), world));
        flatten_occurrences(&occurrence.child_occurrences, &world, out)?;
    }
    Ok(())
}

/// Instance lookup along occurrence paths.
pub(crate) struct InstanceIndex<'a> {
    root: &'a [Instance],
    sub_assemblies: &'a [SubAssembly],
    by_id: HashMap<&'a str, &'a Instance>,
}

impl<'a> InstanceIndex<'a> {
    pub(crate) fn new(definition: &'a AssemblyDefinition) -> Self {
        let by_id = definition
            .root_assembly
            .instances
            .iter()
            .chain(definition.sub_assemblies.iter().flat_map(|s| s.instances.iter()))
            .map(|instance| (instance.id.as_str(), instance))
            .collect();
        Self {
            root: &definition.root_assembly.instances,
            sub_assemblies: &definition.sub_assemblies,
            by_id,
        }
    }

    /// Walks the path through the root and sub-assembly instance tables, falling back to a flat
    /// lookup of the last id when the walk cannot be completed.
    pub(crate) fn resolve(&self, path: &[String]) -> Option<&'a Instance> {
        self.walk(path)
            .or_else(|| path.last().and_then(|id| self.by_id.get(id.as_str()).copied()))
    }

    fn walk(&self, path: &[String]) -> Option<&'a Instance> {
        let mut table = self.root;
        let mut found = None;
        for (depth, id) in path.iter().enumerate() {
            let instance = table.iter().find(|i| &i.id == id)?;
            found = Some(instance);
            if depth + 1 < path.len() {
                if !instance.is_assembly() {
                    return None;
                }
                table = &self.sub_assemblies.iter().find(|s| s.defines(instance))?.instances;
            }
        }
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connector::credentials::{
        Credentials, DEFAULT_ACCESS_VAR, DEFAULT_SECRET_VAR, DotenvSearch, EnvCredentials,
        PartialCredentials, StaticCredentials,
    };
    use crate::connector::transport::fake::FakeTransport;
    use nalgebra::Vector3;
    use serial_test::serial;
    use tempfile::tempdir;

    #[derive(Debug)]
    struct NoCredentials;

    impl CredentialResolver for NoCredentials {
        fn lookup(&self) -> PartialCredentials {
            PartialCredentials::default()
        }

        fn describe(&self) -> String {
            "nowhere".to_string()
        }
    }

    fn config() -> ConnectorConfig {
        ConnectorConfig::new(StaticCredentials(Credentials::new("access", "secret")))
    }

    const NESTED: &str = r#"{
        "rootAssembly": {
            "instances": [
                {"id": "p1", "name": "Base", "type": "Part"},
                {"id": "a1", "name": "Arm", "type": "Assembly", "documentId": "d", "elementId": "e2", "configuration": "default"}
            ],
            "occurrences": [
                {"path": ["a1", "p2"], "transform": [1,0,0,1, 0,1,0,2, 0,0,1,0, 0,0,0,1]},
                {"path": ["p1"], "transform": [1,0,0,0, 0,1,0,0, 0,0,1,0, 0,0,0,1]},
                {"path": ["a1"], "transform": [0,-1,0,1, 1,0,0,0, 0,0,1,0, 0,0,0,1]}
            ]
        },
        "subAssemblies": [
            {
                "documentId": "d",
                "elementId": "e2",
                "configuration": "default",
                "instances": [{"id": "p2", "name": "Link", "type": "Part"}]
            }
        ]
    }"#;

    #[test]
    fn builds_tree_whose_world_poses_match_the_occurrences() {
        let transport = FakeTransport::new(200, NESTED);
        let connector = OnshapeConnector::with_transport(config(), transport.clone());
        let assembly = connector.fetch_assembly("d", "w", "e").unwrap();

        assert_eq!(assembly.len(), 4);
        let root = assembly.root();
        let names: Vec<&str> = assembly
            .children(root)
            .unwrap()
            .iter()
            .map(|id| assembly.component(*id).unwrap().name())
            .collect();
        assert_eq!(names, ["Base", "Arm"]);

        let arm = assembly.find_by_path(&["Arm"]).unwrap();
        let link = assembly.find_by_path(&["Arm", "Link"]).unwrap();
        assert_eq!(assembly.component(arm).unwrap().kind, ComponentKind::Assembly);
        assert_eq!(
            assembly.component(link).unwrap().external_id.as_deref(),
            Some("p2")
        );

        let link_local = assembly.component(link).unwrap().pose().translation();
        assert!((link_local - Vector3::new(2.0, 0.0, 0.0)).norm() < 1e-9);
        let link_world = assembly.world_pose(link).unwrap();
        assert!((link_world.translation() - Vector3::new(1.0, 2.0, 0.0)).norm() < 1e-9);
        assert!(link_world.rotation().angle() < 1e-9);

        let requests = transport.requests.borrow();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].path, "/api/v11/assemblies/d/d/w/w/e/e");
        assert_eq!(
            requests[0].query,
            "includeMateFeatures=false&includeMateConnectors=false&includeNonSolids=false"
        );
        assert!(
            requests[0]
                .headers
                .iter()
                .any(|(k, v)| k == "Authorization" && v.starts_with("On access:HmacSHA256:"))
        );
    }

    #[test]
    fn two_top_level_occurrences_become_root_children() {
        let body = r#"{
            "rootAssembly": {
                "instances": [
                    {"id": "i1", "name": "Plate", "type": "Part"},
                    {"id": "i2", "name": "Bolt", "type": "Part"}
                ],
                "occurrences": [
                    {"path": ["i1"], "transform": [1,0,0,0, 0,1,0,0, 0,0,1,0, 0,0,0,1]},
                    {"path": ["i2"], "transform": [1,0,0,0.5, 0,1,0,0, 0,0,1,0.25, 0,0,0,1]}
                ]
            }
        }"#;
        let connector = OnshapeConnector::with_transport(
            config().with_root_name("Fixture"),
            FakeTransport::new(200, body),
        );
        let assembly = connector
            .fetch_assembly_from_url("https://cad.onshape.com/documents/d/v/v1/e/e")
            .unwrap();

        assert_eq!(assembly.component(assembly.root()).unwrap().name(), "Fixture");
        assert_eq!(assembly.children(assembly.root()).unwrap().len(), 2);
        let bolt = assembly.find_by_path(&["Bolt"]).unwrap();
        let pose = assembly.world_pose(bolt).unwrap();
        assert!((pose.translation() - Vector3::new(0.5, 0.0, 0.25)).norm() < 1e-12);
        assert_eq!(
            assembly.metadata().get("onshape.document").map(String::as_str),
            Some("/documents/d/v/v1/e/e")
        );
    }

    #[test]
    fn missing_credentials_fail_before_any_request() {
        let transport = FakeTransport::new(200, NESTED);
        let config = ConnectorConfig::new(NoCredentials);
        let connector = OnshapeConnector::with_transport(config, transport.clone());
        let result = connector.fetch_assembly("d", "w", "e");
        assert!(matches!(result, Err(ConnectorError::Authentication(_))));
        assert!(transport.requests.borrow().is_empty());
    }

    #[test]
    #[serial]
    fn empty_environment_and_key_file_search_fail_before_any_request() {
        let dir = tempdir().unwrap();
        let start = dir.path().join("project");
        std::fs::create_dir(&start).unwrap();
        // SAFETY: serialized with the other tests that touch the environment.
        unsafe {
            std::env::remove_var(DEFAULT_ACCESS_VAR);
            std::env::remove_var(DEFAULT_SECRET_VAR);
        }
        let resolver = ChainResolver::new()
            .with(EnvCredentials::new(DEFAULT_ACCESS_VAR, DEFAULT_SECRET_VAR))
            .with(DotenvSearch::new(&start).ceiling(dir.path()));

        let transport = FakeTransport::new(200, NESTED);
        let connector =
            OnshapeConnector::with_transport(ConnectorConfig::new(resolver), transport.clone());
        let result = connector.fetch_assembly("d", "w", "e");
        assert!(matches!(result, Err(ConnectorError::Authentication(_))));
        assert!(transport.requests.borrow().is_empty());
    }

    #[test]
    fn status_codes_map_to_errors() {
        let fetch = |status| {
            OnshapeConnector::with_transport(config(), FakeTransport::new(status, "nope"))
                .fetch_assembly("d", "w", "e")
        };
        assert!(matches!(fetch(401), Err(ConnectorError::Authentication(_))));
        assert!(matches!(fetch(403), Err(ConnectorError::Authentication(_))));
        assert!(matches!(fetch(404), Err(ConnectorError::NotFound(_))));
        assert!(matches!(
            fetch(500),
            Err(ConnectorError::Upstream { status: 500, .. })
        ));
    }

    #[test]
    fn unknown_instance_and_orphan_occurrences_are_malformed() {
        let unknown = r#"{"rootAssembly": {"instances": [],
            "occurrences": [{"path": ["x"], "transform": [1,0,0,0, 0,1,0,0, 0,0,1,0, 0,0,0,1]}]}}"#;
        let orphan = r#"{"rootAssembly": {"instances": [{"id": "x", "name": "X", "type": "Part"}],
            "occurrences": [{"path": ["gone", "x"], "transform": [1,0,0,0, 0,1,0,0, 0,0,1,0, 0,0,0,1]}]}}"#;
        for body in [unknown, orphan] {
            let result = OnshapeConnector::with_transport(config(), FakeTransport::new(200, body))
                .fetch_assembly("d", "w", "e");
            assert!(matches!(result, Err(ConnectorError::MalformedResponse(_))));
        }
    }

    #[test]
    fn duplicate_sibling_names_surface_as_model_errors() {
        let body = r#"{"rootAssembly": {
            "instances": [
                {"id": "i1", "name": "Same", "type": "Part"},
                {"id": "i2", "name": "Same", "type": "Part"}
            ],
            "occurrences": [
                {"path": ["i1"], "transform": [1,0,0,0, 0,1,0,0, 0,0,1,0, 0,0,0,1]},
                {"path": ["i2"], "transform": [1,0,0,0, 0,1,0,0, 0,0,1,0, 0,0,0,1]}
            ]}}"#;
        let result = OnshapeConnector::with_transport(config(), FakeTransport::new(200, body))
            .fetch_assembly("d", "w", "e");
        assert!(matches!(result, Err(ConnectorError::Model(_))));
    }

    #[test]
    fn scaled_transform_keeps_only_rotation_and_translation() {
        let body = r#"{"rootAssembly": {
            "instances": [{"id": "i1", "name": "Scaled", "type": "Part"}],
            "occurrences": [
                {"path": ["i1"], "transform": [2,0,0,3, 0,2,0,0, 0,0,2,0, 0,0,0,1]}
            ]}}"#;
        let assembly = OnshapeConnector::with_transport(config(), FakeTransport::new(200, body))
            .fetch_assembly("d", "w", "e")
            .unwrap();
        let id = assembly.find_by_path(&["Scaled"]).unwrap();
        let pose = assembly.world_pose(id).unwrap();
        assert!((pose.translation() - Vector3::new(3.0, 0.0, 0.0)).norm() < 1e-12);
        assert!(pose.rotation().angle() < 1e-9);
    }

    #[test]
    fn nested_child_occurrences_compose_onto_their_parent() {
        let body = r#"{"rootAssembly": {
            "instances": [
                {"id": "a", "name": "Sub", "type": "Assembly"},
                {"id": "b", "name": "Leaf", "type": "Part"}
            ],
            "occurrences": [
                {"path": ["a"], "transform": [1,0,0,1, 0,1,0,0, 0,0,1,0, 0,0,0,1],
                 "childOccurrences": [
                    {"path": ["a", "b"], "transform": [1,0,0,0, 0,1,0,1, 0,0,1,0, 0,0,0,1]}
                 ]}
            ]}}"#;
        let assembly = OnshapeConnector::with_transport(config(), FakeTransport::new(200, body))
            .fetch_assembly("d", "w", "e")
            .unwrap();
        let leaf = assembly.find_by_path(&["Sub", "Leaf"]).unwrap();
        let world = assembly.world_pose(leaf).unwrap();
        assert!((world.translation() - Vector3::new(1.0, 1.0, 0.0)).norm() < 1e-12);
    }
}
