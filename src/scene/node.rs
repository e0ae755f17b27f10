//! Components attached to scene nodes.

use hecs::Entity;

use crate::material::{GeometryId, MaterialId};

/// What a node is. The payload lives in a kind-specific component.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// Pure transform; also the kind of the root.
    Group,
    /// Has a [`MeshNode`] and [`Shadows`].
    Mesh,
    /// Has a [`Light`](crate::Light).
    Light,
    /// Mirrors the pose of the active camera.
    Camera,
    /// Has a [`DirectionalLightHelper`](super::DirectionalLightHelper).
    Helper,
}

/// Tree bookkeeping present on every node.
#[derive(Clone, Debug)]
pub struct Node {
    pub name: String,
    pub kind: NodeKind,
    /// Hidden nodes are skipped by the renderer, along with their subtree.
    pub visible: bool,
    pub(crate) parent: Option<Entity>,
    pub(crate) children: Vec<Entity>,
}

impl Node {
    pub(crate) fn new(name: impl Into<String>, kind: NodeKind, parent: Option<Entity>) -> Self {
        Self {
            name: name.into(),
            kind,
            visible: true,
            parent,
            children: Vec::new(),
        }
    }
}

/// Geometry and material of a mesh node.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MeshNode {
    pub geometry: GeometryId,
    pub material: MaterialId,
}

/// Shadow participation of a mesh.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Shadows {
    /// Drawn into shadow maps.
    pub cast: bool,
    /// Darkened by shadow maps.
    pub receive: bool,
}

impl Shadows {
    pub const CAST: Shadows = Shadows {
        cast: true,
        receive: false,
    };
    pub const RECEIVE: Shadows = Shadows {
        cast: false,
        receive: true,
    };
}
