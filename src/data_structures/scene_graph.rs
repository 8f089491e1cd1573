//! Scene graph and hierarchical scene organization.
//!
//! The graph is a tree of boxed [`SceneNode`]s below a [`Scene`] root. Nodes
//! carry a local transform whose translation is a shared [`Position`] handle:
//! two nodes may hold the same handle, in which case moving one moves the
//! other. World transforms are recomputed top-down before every frame and
//! written into each renderable's instance buffer.

use std::{cell::Cell, rc::Rc};

use cgmath::{One, Vector3, Zero};
use wgpu::util::DeviceExt;

use crate::{
    config::Colour,
    data_structures::{
        edges::EdgesGeometry,
        geometry::Geometry,
        instance::{Instance, InstanceRaw},
        model::GpuMesh,
    },
    pipelines::basic::{MaterialUniform, mk_uniform_bind_group},
    render::{Instanced, Render},
};

/// A reference-counted, interior-mutable position.
///
/// Cloning the handle aliases it; use [`Position::detached`] for an
/// independent copy.
#[derive(Clone, Debug)]
pub struct Position(Rc<Cell<Vector3<f32>>>);

impl Position {
    pub fn new(value: Vector3<f32>) -> Self {
        Self(Rc::new(Cell::new(value)))
    }

    pub fn get(&self) -> Vector3<f32> {
        self.0.get()
    }

    pub fn set(&self, value: Vector3<f32>) {
        self.0.set(value);
    }

    pub fn update(&self, f: impl FnOnce(&mut Vector3<f32>)) {
        let mut value = self.0.get();
        f(&mut value);
        self.0.set(value);
    }

    /// A new handle with the same value that shares nothing with `self`.
    pub fn detached(&self) -> Self {
        Self::new(self.get())
    }

    /// Whether both handles point at the same storage.
    pub fn ptr_eq(&self, other: &Position) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::new(Vector3::zero())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeKind {
    Group,
    Mesh,
    LineSegments,
}

/// Surface material of a triangle mesh: a single colour, diffuse only.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MeshMaterial {
    pub colour: Colour,
    pub flat_shading: bool,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LineMaterial {
    pub colour: Colour,
    pub linewidth: f32,
}

/// State shared by every node: name, local transform, cached world transform
/// and children.
pub struct NodeCore {
    pub name: String,
    pub position: Position,
    pub rotation: cgmath::Quaternion<f32>,
    pub scale: Vector3<f32>,
    world: Instance,
    children: Vec<Box<dyn SceneNode>>,
}

impl NodeCore {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            position: Position::default(),
            rotation: cgmath::Quaternion::one(),
            scale: Vector3::new(1.0, 1.0, 1.0),
            world: Instance::default(),
            children: Vec::new(),
        }
    }
}

/// GPU resources of a renderable node, created by [`SceneNode::upload`].
pub struct NodeBuffers {
    pub mesh: GpuMesh,
    pub instance_buffer: wgpu::Buffer,
    pub material_buffer: wgpu::Buffer,
    pub material_bind_group: wgpu::BindGroup,
}

impl NodeBuffers {
    fn new(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        mesh: GpuMesh,
        material: MaterialUniform,
        world: &Instance,
    ) -> Self {
        let instance_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} Instance Buffer", mesh.name)),
            contents: bytemuck::cast_slice(&[world.to_raw()]),
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        });
        let material_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} Material Buffer", mesh.name)),
            contents: bytemuck::cast_slice(&[material]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let material_bind_group = mk_uniform_bind_group(device, layout, &material_buffer);
        Self {
            mesh,
            instance_buffer,
            material_buffer,
            material_bind_group,
        }
    }

    fn write_instance(&self, queue: &wgpu::Queue, world: &Instance) {
        let raw: [InstanceRaw; 1] = [world.to_raw()];
        queue.write_buffer(&self.instance_buffer, 0, bytemuck::cast_slice(&raw));
    }

    fn instanced(&self) -> Instanced<'_> {
        Instanced {
            mesh: &self.mesh,
            instance: &self.instance_buffer,
            material: &self.material_bind_group,
            amount: 1,
        }
    }
}

pub trait SceneNode {
    fn core(&self) -> &NodeCore;

    fn core_mut(&mut self) -> &mut NodeCore;

    fn kind(&self) -> NodeKind;

    /// Create vertex, instance and material buffers for this node and its children.
    fn upload(&mut self, device: &wgpu::Device, material_layout: &wgpu::BindGroupLayout);

    /// Write the current world transform of this node and its children to the GPU.
    fn write_to_buffers(&self, queue: &wgpu::Queue);

    fn get_render(&self) -> Render<'_>;

    fn geometry(&self) -> Option<&Geometry> {
        None
    }

    fn name(&self) -> &str {
        &self.core().name
    }

    fn position(&self) -> &Position {
        &self.core().position
    }

    fn local_transform(&self) -> Instance {
        let core = self.core();
        Instance {
            position: core.position.get(),
            rotation: core.rotation,
            scale: core.scale,
        }
    }

    fn world_transform(&self) -> &Instance {
        &self.core().world
    }

    fn get_children(&self) -> &Vec<Box<dyn SceneNode>> {
        &self.core().children
    }

    fn get_children_mut(&mut self) -> &mut Vec<Box<dyn SceneNode>> {
        &mut self.core_mut().children
    }

    fn add_child(&mut self, child: Box<dyn SceneNode>) {
        self.core_mut().children.push(child);
    }

    fn update_world_transforms(&mut self, parents_world_transform: &Instance) {
        let world = parents_world_transform * &self.local_transform();
        for child in self.get_children_mut().iter_mut() {
            child.update_world_transforms(&world);
        }
        self.core_mut().world = world;
    }
}

fn children_render(core: &NodeCore) -> Vec<Render<'_>> {
    core.children.iter().map(|child| child.get_render()).collect()
}

fn upload_children(core: &mut NodeCore, device: &wgpu::Device, layout: &wgpu::BindGroupLayout) {
    core.children
        .iter_mut()
        .for_each(|child| child.upload(device, layout));
}

fn write_children(core: &NodeCore, queue: &wgpu::Queue) {
    core.children
        .iter()
        .for_each(|child| child.write_to_buffers(queue));
}

/// A transform node without geometry of its own.
pub struct Group {
    core: NodeCore,
}

impl Group {
    pub fn new(name: &str) -> Self {
        Self {
            core: NodeCore::new(name),
        }
    }
}

impl SceneNode for Group {
    fn core(&self) -> &NodeCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut NodeCore {
        &mut self.core
    }

    fn kind(&self) -> NodeKind {
        NodeKind::Group
    }

    fn upload(&mut self, device: &wgpu::Device, material_layout: &wgpu::BindGroupLayout) {
        upload_children(&mut self.core, device, material_layout);
    }

    fn write_to_buffers(&self, queue: &wgpu::Queue) {
        write_children(&self.core, queue);
    }

    fn get_render(&self) -> Render<'_> {
        Render::Composed(children_render(&self.core))
    }
}

/// A triangle mesh drawn with a [`MeshMaterial`].
pub struct Mesh {
    core: NodeCore,
    geometry: Geometry,
    pub material: MeshMaterial,
    buffers: Option<NodeBuffers>,
}

impl Mesh {
    pub fn new(name: &str, geometry: Geometry, material: MeshMaterial) -> Self {
        Self {
            core: NodeCore::new(name),
            geometry,
            material,
            buffers: None,
        }
    }
}

impl SceneNode for Mesh {
    fn core(&self) -> &NodeCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut NodeCore {
        &mut self.core
    }

    fn kind(&self) -> NodeKind {
        NodeKind::Mesh
    }

    fn geometry(&self) -> Option<&Geometry> {
        Some(&self.geometry)
    }

    fn upload(&mut self, device: &wgpu::Device, material_layout: &wgpu::BindGroupLayout) {
        let mesh = GpuMesh::from_geometry(device, &self.core.name, &self.geometry);
        self.buffers = Some(NodeBuffers::new(
            device,
            material_layout,
            mesh,
            MaterialUniform::for_mesh(&self.material),
            &self.core.world,
        ));
        upload_children(&mut self.core, device, material_layout);
    }

    fn write_to_buffers(&self, queue: &wgpu::Queue) {
        if let Some(buffers) = &self.buffers {
            buffers.write_instance(queue, &self.core.world);
        }
        write_children(&self.core, queue);
    }

    fn get_render(&self) -> Render<'_> {
        let own = match &self.buffers {
            Some(buffers) => Render::Mesh(buffers.instanced()),
            None => Render::None,
        };
        let mut renders = vec![own];
        renders.extend(children_render(&self.core));
        Render::Composed(renders)
    }
}

/// A set of independent line segments, used for the mesh outline.
pub struct LineSegments {
    core: NodeCore,
    edges: EdgesGeometry,
    pub material: LineMaterial,
    buffers: Option<NodeBuffers>,
}

impl LineSegments {
    pub fn new(name: &str, edges: EdgesGeometry, material: LineMaterial) -> Self {
        if material.linewidth != 1.0 {
            log::warn!(
                "line width {} requested for {}, but only 1 is supported",
                material.linewidth,
                name
            );
        }
        Self {
            core: NodeCore::new(name),
            edges,
            material,
            buffers: None,
        }
    }

    pub fn edges(&self) -> &EdgesGeometry {
        &self.edges
    }
}

impl SceneNode for LineSegments {
    fn core(&self) -> &NodeCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut NodeCore {
        &mut self.core
    }

    fn kind(&self) -> NodeKind {
        NodeKind::LineSegments
    }

    fn upload(&mut self, device: &wgpu::Device, material_layout: &wgpu::BindGroupLayout) {
        let mesh = GpuMesh::from_edges(device, &self.core.name, &self.edges);
        self.buffers = Some(NodeBuffers::new(
            device,
            material_layout,
            mesh,
            MaterialUniform::for_lines(&self.material),
            &self.core.world,
        ));
        upload_children(&mut self.core, device, material_layout);
    }

    fn write_to_buffers(&self, queue: &wgpu::Queue) {
        if let Some(buffers) = &self.buffers {
            buffers.write_instance(queue, &self.core.world);
        }
        write_children(&self.core, queue);
    }

    fn get_render(&self) -> Render<'_> {
        let own = match &self.buffers {
            Some(buffers) => Render::Lines(buffers.instanced()),
            None => Render::None,
        };
        let mut renders = vec![own];
        renders.extend(children_render(&self.core));
        Render::Composed(renders)
    }
}

/// Root of the scene graph. The root itself carries no transform.
#[derive(Default)]
pub struct Scene {
    children: Vec<Box<dyn SceneNode>>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, node: Box<dyn SceneNode>) {
        self.children.push(node);
    }

    pub fn children(&self) -> &Vec<Box<dyn SceneNode>> {
        &self.children
    }

    pub fn children_mut(&mut self) -> &mut Vec<Box<dyn SceneNode>> {
        &mut self.children
    }

    /// Depth-first search for the first node called `name`.
    pub fn get_object_by_name(&self, name: &str) -> Option<&dyn SceneNode> {
        find_by_name(&self.children, name)
    }

    pub fn update_world_transforms(&mut self) {
        let root = Instance::default();
        for child in self.children.iter_mut() {
            child.update_world_transforms(&root);
        }
    }

    pub fn upload(&mut self, device: &wgpu::Device, material_layout: &wgpu::BindGroupLayout) {
        for child in self.children.iter_mut() {
            child.upload(device, material_layout);
        }
    }

    pub fn write_to_buffers(&self, queue: &wgpu::Queue) {
        for child in &self.children {
            child.write_to_buffers(queue);
        }
    }

    pub fn get_render(&self) -> Render<'_> {
        Render::Composed(self.children.iter().map(|c| c.get_render()).collect())
    }
}

impl std::fmt::Debug for Scene {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.children.iter().map(|c| c.name()).collect();
        f.debug_struct("Scene").field("children", &names).finish()
    }
}

fn find_by_name<'a>(nodes: &'a [Box<dyn SceneNode>], name: &str) -> Option<&'a dyn SceneNode> {
    for node in nodes {
        if node.name() == name {
            return Some(&**node);
        }
        if let Some(found) = find_by_name(node.get_children(), name) {
            return Some(found);
        }
    }
    None
}
