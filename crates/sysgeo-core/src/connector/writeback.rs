//! Writing assemblies back into Onshape: new assembly tabs, instance insertion and occurrence
//! transforms. Every edit targets a workspace; versions and microversions are read-only.

use super::error::ConnectorError;
use super::onshape::{InstanceIndex, OnshapeConnector, check_status, flatten_occurrences};
use super::transport::Method;
use super::url::{DocumentRef, WvmKind};
use crate::core::models::pose::Pose;
use nalgebra::Matrix4;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

/// How a transform is applied to the selected occurrences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TransformMode {
    /// Replaces the occurrence's world transform.
    #[default]
    Absolute,
    /// Composes the transform onto the current placement.
    Relative,
}

/// A top-level instance created by [`OnshapeConnector::insert_assembly`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertedInstance {
    /// Instance id, which is also the occurrence path of a top-level instance.
    pub id: String,
    pub name: String,
    /// Element the instance was inserted from, if Onshape reported it.
    pub element_id: Option<String>,
}

#[derive(Serialize)]
struct CreateAssemblyBody<'a> {
    name: &'a str,
}

#[derive(Deserialize)]
struct CreatedElement {
    id: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InstanceBody<'a> {
    document_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    version_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    microversion_id: Option<&'a str>,
    element_id: &'a str,
    is_assembly: bool,
}

impl<'a> InstanceBody<'a> {
    fn assembly(source: &'a DocumentRef) -> Self {
        let pinned = |kind| (source.wvm == kind).then_some(source.wvm_id.as_str());
        Self {
            document_id: &source.document_id,
            version_id: pinned(WvmKind::Version),
            microversion_id: pinned(WvmKind::Microversion),
            element_id: &source.element_id,
            is_assembly: true,
        }
    }
}

#[derive(Serialize)]
struct OccurrencePath<'a> {
    path: &'a [String],
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TransformBody<'a> {
    is_relative: bool,
    occurrences: Vec<OccurrencePath<'a>>,
    transform: Vec<f64>,
}

/// The 16 values of a homogeneous matrix in row-major order.
fn row_major(matrix: &Matrix4<f64>) -> Vec<f64> {
    (0..4)
        .flat_map(|row| (0..4).map(move |col| matrix[(row, col)]))
        .collect()
}

fn require_workspace(target: &DocumentRef) -> Result<(), ConnectorError> {
    match target.wvm {
        WvmKind::Workspace => Ok(()),
        _ => Err(ConnectorError::InvalidUrl {
            url: target.to_string(),
            reason: "assemblies can only be edited in a workspace".to_string(),
        }),
    }
}

impl OnshapeConnector {
    /// Creates an empty assembly tab in a workspace and returns a reference to it.
    ///
    /// # Errors
    ///
    /// Returns the same status errors as a fetch, and [`ConnectorError::Decode`] if the reply
    /// carries no element id.
    #[instrument(skip(self))]
    pub fn create_assembly(
        &self,
        document_id: &str,
        workspace_id: &str,
        name: &str,
    ) -> Result<DocumentRef, ConnectorError> {
        let path = self.api_path(&format!("assemblies/d/{document_id}/w/{workspace_id}"));
        let body = serde_json::to_string(&CreateAssemblyBody { name })?;
        let response = self.send(Method::Post, path, String::new(), Some(body))?;
        let workspace = format!("/documents/{document_id}/w/{workspace_id}");
        let reply = check_status(response, &workspace)?;
        let created: CreatedElement = serde_json::from_str(&reply)?;
        info!(element = %created.id, "Created assembly");
        Ok(DocumentRef::workspace(document_id, workspace_id, created.id))
    }

    /// Inserts the assembly element `source` as a new top-level instance of `target`.
    ///
    /// A source at a version or microversion is inserted pinned to it; a workspace source
    /// tracks the workspace. The new instance is read back from the target definition, where
    /// Onshape appends it after the existing top-level instances.
    ///
    /// # Errors
    ///
    /// * [`ConnectorError::InvalidUrl`] if `target` is not a workspace.
    /// * [`ConnectorError::MalformedResponse`] if the target has no top-level instance after the
    ///   insertion.
    /// * Status errors as for a fetch.
    #[instrument(skip_all, fields(target = %target, source = %source))]
    pub fn insert_assembly(
        &self,
        target: &DocumentRef,
        source: &DocumentRef,
    ) -> Result<InsertedInstance, ConnectorError> {
        require_workspace(target)?;
        let path = self.api_path(&format!("assemblies/{}/instances", target.api_path()));
        let body = serde_json::to_string(&InstanceBody::assembly(source))?;
        let response = self.send(Method::Post, path, String::new(), Some(body))?;
        check_status(response, &target.to_string())?;

        let definition = self.definition(target)?;
        let last = definition.root_assembly.instances.last().ok_or_else(|| {
            ConnectorError::MalformedResponse(format!(
                "{target} has no top-level instance after inserting {source}"
            ))
        })?;
        debug!(instance = %last.id, name = %last.name, "Inserted instance");
        Ok(InsertedInstance {
            id: last.id.clone(),
            name: last.name.clone(),
            element_id: last.element_id.clone(),
        })
    }

    /// Applies `pose` to the occurrences at `paths`. Nothing is sent when `paths` is empty.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectorError::InvalidUrl`] if `target` is not a workspace, and status errors
    /// as for a fetch.
    #[instrument(skip_all, fields(target = %target, occurrences = paths.len(), ?mode))]
    pub fn transform_occurrences(
        &self,
        target: &DocumentRef,
        paths: &[Vec<String>],
        pose: &Pose,
        mode: TransformMode,
    ) -> Result<(), ConnectorError> {
        require_workspace(target)?;
        if paths.is_empty() {
            debug!("No occurrences to transform");
            return Ok(());
        }
        let body = TransformBody {
            is_relative: mode == TransformMode::Relative,
            occurrences: paths.iter().map(|path| OccurrencePath { path }).collect(),
            transform: row_major(&pose.to_homogeneous()),
        };
        let endpoint = format!("assemblies/{}/occurrencetransforms", target.api_path());
        let body = serde_json::to_string(&body)?;
        let path = self.api_path(&endpoint);
        let response = self.send(Method::Post, path, String::new(), Some(body))?;
        check_status(response, &target.to_string())?;
        Ok(())
    }

    /// Transforms the occurrence whose instance is called `name` and returns its path.
    ///
    /// Parts are matched before assemblies and shallower occurrences before deeper ones.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectorError::NotFound`] if no occurrence carries the name, plus the errors
    /// of [`transform_occurrences`](Self::transform_occurrences).
    #[instrument(skip(self, pose))]
    pub fn transform_by_name(
        &self,
        target: &DocumentRef,
        name: &str,
        pose: &Pose,
        mode: TransformMode,
    ) -> Result<Vec<String>, ConnectorError> {
        require_workspace(target)?;
        let definition = self.definition(target)?;
        let index = InstanceIndex::new(&definition);

        let mut occurrences = Vec::new();
        flatten_occurrences(
            &definition.root_assembly.occurrences,
            &Matrix4::identity(),
            &mut occurrences,
        )?;
        occurrences.sort_by_key(|(path, _)| path.len());

        let named: Vec<_> = occurrences
            .into_iter()
            .filter_map(|(path, _)| {
                let instance = index.resolve(&path)?;
                (instance.name == name).then_some((path, instance.is_assembly()))
            })
            .collect();
        let path = named
            .iter()
            .find(|(_, is_assembly)| !is_assembly)
            .or_else(|| named.first())
            .map(|(path, _)| path.clone())
            .ok_or_else(|| ConnectorError::NotFound(format!("{target}: occurrence '{name}'")))?;

        self.transform_occurrences(target, std::slice::from_ref(&path), pose, mode)?;
        Ok(path)
    }
}
