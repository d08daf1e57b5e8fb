//! Instantiation boundary: turning placement decisions into host instances.
use std::collections::HashSet;

use glam::{Quat, Vec3};

use crate::error::{Error, Result};

/// Identifier of a reusable template (prefab, mesh, scene) known to the host.
pub type TemplateRef = String;

/// Identifier of the parent that owns spawned instances, usually a volume id.
pub type ParentId = String;

/// Opaque handle of a spawned instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstanceHandle(pub u64);

/// World-space transform of a placed instance.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct InstanceTransform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

/// [`InstanceTransform`] expressed in `mint` types for hosts that do not use `glam`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MintTransform {
    pub position: mint::Vector3<f32>,
    pub rotation: mint::Quaternion<f32>,
    pub scale: mint::Vector3<f32>,
}

impl InstanceTransform {
    pub fn new(position: Vec3, rotation: Quat, scale: Vec3) -> Self {
        Self {
            position,
            rotation,
            scale,
        }
    }

    pub fn to_mint(&self) -> MintTransform {
        MintTransform {
            position: self.position.into(),
            rotation: self.rotation.into(),
            scale: self.scale.into(),
        }
    }
}

/// Creates and destroys instances on behalf of volumes.
pub trait Instantiator {
    /// Returns false if `template` exists but cannot be instantiated.
    fn is_spawnable(&self, _template: &str) -> bool {
        true
    }

    fn spawn(
        &mut self,
        template: &str,
        transform: &InstanceTransform,
        parent: &str,
    ) -> Result<InstanceHandle>;

    /// Destroys every instance spawned under `parent`.
    fn destroy_all_children_of(&mut self, parent: &str);

    /// Handles and transforms of the instances under `parent`, in spawn order.
    fn child_transforms(&self, _parent: &str) -> Vec<(InstanceHandle, InstanceTransform)> {
        Vec::new()
    }

    /// Moves an existing instance.
    fn set_transform(&mut self, handle: InstanceHandle, _transform: &InstanceTransform) -> Result<()> {
        Err(Error::UnknownInstance { handle: handle.0 })
    }
}

/// A spawned instance recorded by [`VecInstantiator`].
#[derive(Clone, Debug, PartialEq)]
pub struct SpawnedInstance {
    pub handle: InstanceHandle,
    pub template: TemplateRef,
    pub parent: ParentId,
    pub transform: InstanceTransform,
}

/// An instantiator that keeps all instances in a `Vec`.
#[derive(Default, Debug)]
pub struct VecInstantiator {
    instances: Vec<SpawnedInstance>,
    unspawnable: HashSet<TemplateRef>,
    next_handle: u64,
}

impl VecInstantiator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks a template as present but not instantiable.
    pub fn with_unspawnable(mut self, template: impl Into<TemplateRef>) -> Self {
        self.unspawnable.insert(template.into());
        self
    }

    pub fn instances(&self) -> &[SpawnedInstance] {
        &self.instances
    }

    pub fn children_of<'a>(
        &'a self,
        parent: &'a str,
    ) -> impl Iterator<Item = &'a SpawnedInstance> + 'a {
        self.instances.iter().filter(move |i| i.parent == parent)
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }
}

impl Instantiator for VecInstantiator {
    fn is_spawnable(&self, template: &str) -> bool {
        !self.unspawnable.contains(template)
    }

    fn spawn(
        &mut self,
        template: &str,
        transform: &InstanceTransform,
        parent: &str,
    ) -> Result<InstanceHandle> {
        if !self.is_spawnable(template) {
            return Err(Error::NotSpawnable {
                id: template.to_owned(),
            });
        }
        let handle = InstanceHandle(self.next_handle);
        self.next_handle += 1;
        self.instances.push(SpawnedInstance {
            handle,
            template: template.to_owned(),
            parent: parent.to_owned(),
            transform: *transform,
        });
        Ok(handle)
    }

    fn destroy_all_children_of(&mut self, parent: &str) {
        self.instances.retain(|i| i.parent != parent);
    }

    fn child_transforms(&self, parent: &str) -> Vec<(InstanceHandle, InstanceTransform)> {
        self.children_of(parent)
            .map(|i| (i.handle, i.transform))
            .collect()
    }

    fn set_transform(&mut self, handle: InstanceHandle, transform: &InstanceTransform) -> Result<()> {
        let instance = self
            .instances
            .iter_mut()
            .find(|i| i.handle == handle)
            .ok_or(Error::UnknownInstance { handle: handle.0 })?;
        instance.transform = *transform;
        Ok(())
    }
}
