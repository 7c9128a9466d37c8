use super::component::Component;
use super::error::ModelError;
use super::ids::ComponentId;
use super::pose::Pose;
use nalgebra::{Matrix3, Vector3};
use slotmap::SlotMap;
use std::collections::BTreeMap;

/// A hierarchy of components rooted at a single designated root.
///
/// Every component lives in an arena owned by the assembly and is addressed by a
/// [`ComponentId`]. Ownership edges form a strict tree: each component has at most one parent,
/// and no component is its own ancestor. Components created without a parent are *detached*:
/// they stay in the arena, invisible to traversals from the root, until attached.
///
/// Every mutating operation validates its preconditions first and leaves the assembly
/// untouched when it fails.
#[derive(Debug, Clone)]
pub struct Assembly {
    name: String,
    metadata: BTreeMap<String, String>,
    pub(crate) components: SlotMap<ComponentId, Component>,
    root: ComponentId,
}

impl Assembly {
    /// Creates an assembly holding only its root component.
    ///
    /// # Arguments
    ///
    /// * `name` - The name of the assembly itself.
    /// * `root_name` - The name of the root component.
    /// * `root_pose` - The pose of the root, which is also its world pose.
    pub fn new(name: &str, root_name: &str, root_pose: Pose) -> Self {
        let mut components = SlotMap::with_key();
        let root = components.insert(Component::new(root_name, root_pose));
        Self {
            name: name.to_string(),
            metadata: BTreeMap::new(),
            components,
            root,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn root(&self) -> ComponentId {
        self.root
    }

    pub fn metadata(&self) -> &BTreeMap<String, String> {
        &self.metadata
    }

    pub fn set_metadata(&mut self, key: &str, value: &str) {
        self.metadata.insert(key.to_string(), value.to_string());
    }

    /// Number of components in the arena, detached ones included.
    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    pub fn component(&self, id: ComponentId) -> Option<&Component> {
        self.components.get(id)
    }

    /// Mutable access to a component's metadata.
    ///
    /// Structural fields (name, pose, parent, children) are only changed through the assembly
    /// operations, which keep the tree consistent.
    pub fn component_mut(&mut self, id: ComponentId) -> Option<&mut Component> {
        self.components.get_mut(id)
    }

    pub fn components_iter(&self) -> impl Iterator<Item = (ComponentId, &Component)> {
        self.components.iter()
    }

    pub fn children(&self, id: ComponentId) -> Option<&[ComponentId]> {
        self.components.get(id).map(|c| c.children.as_slice())
    }

    pub fn parent(&self, id: ComponentId) -> Option<ComponentId> {
        self.components.get(id).and_then(|c| c.parent)
    }

    /// Finds the direct child of `parent` with the given name.
    pub fn find_child(&self, parent: ComponentId, name: &str) -> Option<ComponentId> {
        self.components
            .get(parent)?
            .children
            .iter()
            .copied()
            .find(|&child| {
                self.components
                    .get(child)
                    .is_some_and(|c| c.name == name)
            })
    }

    /// Resolves a path of child names starting below the root.
    ///
    /// An empty path resolves to the root itself.
    pub fn find_by_path<S: AsRef<str>>(&self, path: &[S]) -> Option<ComponentId> {
        path.iter()
            .try_fold(self.root, |current, name| self.find_child(current, name.as_ref()))
    }

    /// Iterates over the ancestors of `id`, nearest first. The component itself is not included.
    pub fn ancestors(&self, id: ComponentId) -> impl Iterator<Item = ComponentId> + '_ {
        std::iter::successors(self.parent(id), move |&current| self.parent(current))
    }

    /// Returns `true` if `id` is the root or one of its descendants.
    pub fn is_reachable(&self, id: ComponentId) -> bool {
        if !self.components.contains_key(id) {
            return false;
        }
        id == self.root || self.ancestors(id).any(|a| a == self.root)
    }

    /// Returns the top-level detached components, in arena order.
    pub fn detached(&self) -> Vec<ComponentId> {
        self.components
            .iter()
            .filter(|(id, c)| *id != self.root && c.parent.is_none())
            .map(|(id, _)| id)
            .collect()
    }

    /// Pre-order traversal from the root, yielding `(depth, id)` with children in insertion
    /// order.
    pub fn depth_first(&self) -> DepthFirst<'_> {
        self.depth_first_from(self.root)
    }

    /// Pre-order traversal of the subtree rooted at `start`.
    pub fn depth_first_from(&self, start: ComponentId) -> DepthFirst<'_> {
        DepthFirst {
            assembly: self,
            stack: vec![(0, start)],
        }
    }

    /// Creates a component and, if `parent` is given, attaches it under that parent.
    ///
    /// # Arguments
    ///
    /// * `name` - Name of the component, unique among its siblings.
    /// * `pose` - Pose relative to the parent.
    /// * `parent` - The owning component, or `None` to create a detached component.
    ///
    /// # Errors
    ///
    /// * [`ModelError::ComponentNotFound`] if `parent` is not in the assembly.
    /// * [`ModelError::DuplicateName`] if `parent` already has a child called `name`.
    pub fn create_component(
        &mut self,
        name: &str,
        pose: Pose,
        parent: Option<ComponentId>,
    ) -> Result<ComponentId, ModelError> {
        if let Some(parent_id) = parent {
            self.check_unique_child_name(parent_id, name)?;
        }

        let id = self.components.insert(Component::new(name, pose));
        if let Some(parent_id) = parent {
            self.link(parent_id, id);
        }
        Ok(id)
    }

    /// Like [`create_component`](Self::create_component), validating a raw rotation matrix.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidPose`] if `rotation` is not a proper orthonormal matrix, in
    /// addition to the errors of `create_component`. Nothing is created on failure.
    pub fn create_component_with_rotation(
        &mut self,
        name: &str,
        translation: Vector3<f64>,
        rotation: Matrix3<f64>,
        parent: Option<ComponentId>,
    ) -> Result<ComponentId, ModelError> {
        let pose = Pose::from_parts(translation, rotation)?;
        self.create_component(name, pose, parent)
    }

    /// Makes `child` a child of `parent`, appended after the existing children.
    ///
    /// # Errors
    ///
    /// * [`ModelError::ComponentNotFound`] if either id is unknown.
    /// * [`ModelError::Cycle`] if `child` is `parent` or one of its ancestors.
    /// * [`ModelError::AlreadyOwned`] if `child` already has a parent or is the root.
    /// * [`ModelError::DuplicateName`] if `parent` already has a child with the same name.
    pub fn attach(&mut self, parent: ComponentId, child: ComponentId) -> Result<(), ModelError> {
        let parent_component = self
            .components
            .get(parent)
            .ok_or(ModelError::ComponentNotFound(parent))?;
        let child_component = self
            .components
            .get(child)
            .ok_or(ModelError::ComponentNotFound(child))?;

        if child == parent || self.ancestors(parent).any(|a| a == child) {
            return Err(ModelError::Cycle { parent, child });
        }
        if child == self.root || child_component.parent.is_some() {
            return Err(ModelError::AlreadyOwned {
                name: child_component.name.clone(),
            });
        }
        if parent_component
            .children
            .iter()
            .any(|&c| self.components.get(c).is_some_and(|s| s.name == child_component.name))
        {
            return Err(ModelError::DuplicateName {
                name: child_component.name.clone(),
            });
        }

        self.link(parent, child);
        Ok(())
    }

    /// Removes the ownership edge above `child`, leaving it and its subtree detached.
    ///
    /// # Errors
    ///
    /// * [`ModelError::ComponentNotFound`] if `child` is unknown.
    /// * [`ModelError::NotAttached`] if `child` has no parent.
    pub fn detach(&mut self, child: ComponentId) -> Result<(), ModelError> {
        let component = self
            .components
            .get_mut(child)
            .ok_or(ModelError::ComponentNotFound(child))?;
        let parent = component.parent.take().ok_or_else(|| ModelError::NotAttached {
            name: component.name.clone(),
        })?;
        if let Some(parent_component) = self.components.get_mut(parent) {
            parent_component.children.retain(|&c| c != child);
        }
        Ok(())
    }

    /// Replaces the local pose of a component.
    pub fn set_pose(&mut self, id: ComponentId, pose: Pose) -> Result<(), ModelError> {
        let component = self
            .components
            .get_mut(id)
            .ok_or(ModelError::ComponentNotFound(id))?;
        component.pose = pose;
        Ok(())
    }

    /// Removes a component together with its whole subtree.
    ///
    /// # Return
    ///
    /// The number of components removed.
    ///
    /// # Errors
    ///
    /// * [`ModelError::RootRemoval`] if `id` is the root.
    /// * [`ModelError::ComponentNotFound`] if `id` is unknown.
    pub fn remove(&mut self, id: ComponentId) -> Result<usize, ModelError> {
        if id == self.root {
            return Err(ModelError::RootRemoval);
        }
        if !self.components.contains_key(id) {
            return Err(ModelError::ComponentNotFound(id));
        }
        if self.parent(id).is_some() {
            self.detach(id)?;
        }

        let subtree: Vec<ComponentId> = self.depth_first_from(id).map(|(_, c)| c).collect();
        for component in &subtree {
            self.components.remove(*component);
        }
        Ok(subtree.len())
    }

    /// Computes the pose of a component in the reference frame of its topmost ancestor.
    ///
    /// Local poses are composed from the top down (`parent ∘ local`). For the root, or for a
    /// detached component without a parent, this is the local pose.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::ComponentNotFound`] if `id` or any ancestor is missing.
    pub fn world_pose(&self, id: ComponentId) -> Result<Pose, ModelError> {
        let component = self
            .components
            .get(id)
            .ok_or(ModelError::ComponentNotFound(id))?;
        let mut pose = component.pose;
        let mut current = component.parent;
        while let Some(parent_id) = current {
            let parent = self
                .components
                .get(parent_id)
                .ok_or(ModelError::ComponentNotFound(parent_id))?;
            pose = parent.pose.compose(&pose);
            current = parent.parent;
        }
        Ok(pose)
    }

    fn check_unique_child_name(&self, parent: ComponentId, name: &str) -> Result<(), ModelError> {
        if !self.components.contains_key(parent) {
            return Err(ModelError::ComponentNotFound(parent));
        }
        if self.find_child(parent, name).is_some() {
            return Err(ModelError::DuplicateName {
                name: name.to_string(),
            });
        }
        Ok(())
    }

    fn link(&mut self, parent: ComponentId, child: ComponentId) {
        if let Some(component) = self.components.get_mut(child) {
            component.parent = Some(parent);
        }
        if let Some(component) = self.components.get_mut(parent) {
            component.children.push(child);
        }
    }
}

/// Pre-order iterator over a subtree, see [`Assembly::depth_first`].
pub struct DepthFirst<'a> {
    assembly: &'a Assembly,
    stack: Vec<(usize, ComponentId)>,
}

impl Iterator for DepthFirst<'_> {
    type Item = (usize, ComponentId);

    fn next(&mut self) -> Option<Self::Item> {
        let (depth, id) = self.stack.pop()?;
        if let Some(component) = self.assembly.components.get(id) {
            self.stack
                .extend(component.children.iter().rev().map(|&c| (depth + 1, c)));
        }
        Some((depth, id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::transforms::euler::EulerConvention;
    use nalgebra::{IsometryMatrix3, Rotation3, Translation3};

    const TOLERANCE: f64 = 1e-12;

    fn translation(x: f64, y: f64, z: f64) -> Pose {
        Pose::from_translation(Vector3::new(x, y, z))
    }

    fn chain() -> (Assembly, ComponentId, ComponentId, ComponentId) {
        let mut assembly = Assembly::new("test", "root", translation(0.0, 0.0, 0.0));
        let root = assembly.root();
        let child = assembly
            .create_component("child", translation(1.0, 0.0, 0.0), Some(root))
            .unwrap();
        let grandchild = assembly
            .create_component("grandchild", translation(0.0, 1.0, 0.0), Some(child))
            .unwrap();
        (assembly, root, child, grandchild)
    }

    #[test]
    fn world_pose_of_root_equals_local_pose() {
        let root_pose = Pose::from_euler(
            Vector3::new(3.0, -1.0, 2.0),
            [0.1, 0.2, 0.3],
            EulerConvention::sxyz(),
        )
        .unwrap();
        let assembly = Assembly::new("a", "root", root_pose);
        let world = assembly.world_pose(assembly.root()).unwrap();
        assert_eq!(world, root_pose);
    }

    #[test]
    fn grandchild_world_translation_accumulates_along_chain() {
        let (assembly, _, _, grandchild) = chain();
        let world = assembly.world_pose(grandchild).unwrap();
        assert!((world.translation() - Vector3::new(1.0, 1.0, 0.0)).norm() < TOLERANCE);
        assert!(world.approx_eq(&translation(1.0, 1.0, 0.0), TOLERANCE));
    }

    #[test]
    fn world_pose_composes_parent_world_with_local_pose() {
        let mut assembly = Assembly::new("a", "A", translation(0.5, 0.0, 0.0));
        let a = assembly.root();
        let rotated =
            Pose::from_euler(Vector3::new(0.0, 2.0, 0.0), [0.0, 0.0, 0.7], EulerConvention::sxyz())
                .unwrap();
        let b = assembly.create_component("B", rotated, Some(a)).unwrap();
        let c_local =
            Pose::from_euler(Vector3::new(1.0, 0.0, 3.0), [0.4, 0.0, 0.0], EulerConvention::sxyz())
                .unwrap();
        let c = assembly.create_component("C", c_local, Some(b)).unwrap();

        let expected = assembly.world_pose(b).unwrap().compose(&c_local);
        assert!(assembly.world_pose(c).unwrap().approx_eq(&expected, TOLERANCE));
    }

    #[test]
    fn invalid_rotation_creates_nothing() {
        let mut assembly = Assembly::new("a", "root", Pose::identity());
        let root = assembly.root();
        let skewed = Matrix3::new(1.0, 0.5, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0);
        let result =
            assembly.create_component_with_rotation("bad", Vector3::zeros(), skewed, Some(root));
        assert!(matches!(result, Err(ModelError::InvalidPose(_))));
        assert_eq!(assembly.len(), 1);
        assert!(assembly.children(root).unwrap().is_empty());
    }

    #[test]
    fn invalid_isometry_creates_nothing() {
        let mut assembly = Assembly::new("a", "root", Pose::identity());
        let root = assembly.root();
        let skewed = Rotation3::from_matrix_unchecked(Matrix3::new(
            1.0, 0.5, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0,
        ));
        let isometry = IsometryMatrix3::from_parts(Translation3::new(f64::NAN, 0.0, 0.0), skewed);
        let result = Pose::from_isometry(isometry)
            .and_then(|pose| assembly.create_component("bad", pose, Some(root)));
        assert!(matches!(result, Err(ModelError::InvalidPose(_))));
        assert_eq!(assembly.len(), 1);
        assert!(assembly.find_child(root, "bad").is_none());
    }

    #[test]
    fn duplicate_sibling_name_is_rejected() {
        let (mut assembly, root, _, _) = chain();
        let result = assembly.create_component("child", Pose::identity(), Some(root));
        assert_eq!(
            result,
            Err(ModelError::DuplicateName {
                name: "child".to_string()
            })
        );
        assert_eq!(assembly.len(), 3);
    }

    #[test]
    fn same_name_is_allowed_under_different_parents() {
        let (mut assembly, root, child, _) = chain();
        assembly
            .create_component("bolt", Pose::identity(), Some(root))
            .unwrap();
        assert!(
            assembly
                .create_component("bolt", Pose::identity(), Some(child))
                .is_ok()
        );
    }

    #[test]
    fn attaching_under_own_descendant_is_a_cycle() {
        let (mut assembly, _, child, grandchild) = chain();
        let result = assembly.attach(grandchild, child);
        assert_eq!(
            result,
            Err(ModelError::Cycle {
                parent: grandchild,
                child
            })
        );
        assert_eq!(assembly.parent(child), Some(assembly.root()));
        assert!(assembly.children(grandchild).unwrap().is_empty());
    }

    #[test]
    fn attaching_component_to_itself_is_a_cycle() {
        let mut assembly = Assembly::new("a", "root", Pose::identity());
        let loose = assembly
            .create_component("loose", Pose::identity(), None)
            .unwrap();
        assert!(matches!(
            assembly.attach(loose, loose),
            Err(ModelError::Cycle { .. })
        ));
    }

    #[test]
    fn attaching_owned_component_or_root_fails() {
        let (mut assembly, root, child, _) = chain();
        let other = assembly
            .create_component("other", Pose::identity(), None)
            .unwrap();
        assert!(matches!(
            assembly.attach(other, child),
            Err(ModelError::AlreadyOwned { .. })
        ));
        assert!(matches!(
            assembly.attach(other, root),
            Err(ModelError::AlreadyOwned { .. })
        ));
    }

    #[test]
    fn detached_component_becomes_reachable_after_attach() {
        let (mut assembly, root, _, _) = chain();
        let loose = assembly
            .create_component("loose", translation(0.0, 0.0, 5.0), None)
            .unwrap();
        assert!(!assembly.is_reachable(loose));
        assert_eq!(assembly.detached(), vec![loose]);

        assembly.attach(root, loose).unwrap();
        assert!(assembly.is_reachable(loose));
        assert!(assembly.detached().is_empty());
        assert_eq!(assembly.children(root).unwrap().last(), Some(&loose));
    }

    #[test]
    fn attach_rejects_duplicate_sibling_name() {
        let (mut assembly, root, _, _) = chain();
        let clash = assembly
            .create_component("child", Pose::identity(), None)
            .unwrap();
        assert!(matches!(
            assembly.attach(root, clash),
            Err(ModelError::DuplicateName { .. })
        ));
        assert!(assembly.parent(clash).is_none());
    }

    #[test]
    fn detach_then_reattach_elsewhere() {
        let (mut assembly, root, child, grandchild) = chain();
        assembly.detach(grandchild).unwrap();
        assert!(assembly.children(child).unwrap().is_empty());
        assert!(!assembly.is_reachable(grandchild));
        assert!(matches!(
            assembly.detach(grandchild),
            Err(ModelError::NotAttached { .. })
        ));

        assembly.attach(root, grandchild).unwrap();
        assert_eq!(assembly.parent(grandchild), Some(root));
    }

    #[test]
    fn remove_drops_whole_subtree() {
        let (mut assembly, root, child, grandchild) = chain();
        assert_eq!(assembly.remove(root), Err(ModelError::RootRemoval));
        assert_eq!(assembly.remove(child), Ok(2));
        assert_eq!(assembly.len(), 1);
        assert!(assembly.component(grandchild).is_none());
        assert!(assembly.children(root).unwrap().is_empty());
    }

    #[test]
    fn depth_first_visits_in_insertion_order() {
        let (mut assembly, root, child, _) = chain();
        assembly
            .create_component("second", Pose::identity(), Some(root))
            .unwrap();
        assembly
            .create_component("nested", Pose::identity(), Some(child))
            .unwrap();

        let names: Vec<(usize, &str)> = assembly
            .depth_first()
            .map(|(depth, id)| (depth, assembly.component(id).unwrap().name()))
            .collect();
        assert_eq!(
            names,
            vec![
                (0, "root"),
                (1, "child"),
                (2, "grandchild"),
                (2, "nested"),
                (1, "second"),
            ]
        );
    }

    #[test]
    fn find_by_path_walks_child_names() {
        let (assembly, root, _, grandchild) = chain();
        assert_eq!(assembly.find_by_path::<&str>(&[]), Some(root));
        assert_eq!(
            assembly.find_by_path(&["child", "grandchild"]),
            Some(grandchild)
        );
        assert_eq!(assembly.find_by_path(&["grandchild"]), None);
    }

    #[test]
    fn ancestors_are_listed_nearest_first() {
        let (assembly, root, child, grandchild) = chain();
        let ancestors: Vec<_> = assembly.ancestors(grandchild).collect();
        assert_eq!(ancestors, vec![child, root]);
        assert_eq!(assembly.ancestors(root).count(), 0);
    }

    #[test]
    fn unknown_parent_is_reported() {
        let (mut assembly, _, child, _) = chain();
        assembly.remove(child).unwrap();
        assert_eq!(
            assembly.create_component("orphan", Pose::identity(), Some(child)),
            Err(ModelError::ComponentNotFound(child))
        );
    }
}
