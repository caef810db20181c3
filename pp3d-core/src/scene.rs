/// Scene objects with cached world-space bounding volumes.
use std::fmt;

use nalgebra::{Matrix4, Point3, Vector3};
use tracing::debug;

use crate::bounds::{BoundingVolume, VolumeKind};
use crate::geometry::{Face, Mesh};
use crate::picking::{pick_nearest, Pickable};
use crate::ray::Ray;
use crate::transform::Transform;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(pub u32);

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What the core needs from an object to build its bounding volume
pub trait WorldGeometry {
    fn world_transform(&self) -> Matrix4<f64>;
    fn world_points(&self) -> Vec<Point3<f64>>;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ObjectKind {
    /// Bounded by a box around its faces
    Mesh,
    /// Bounded by a sphere of the object's size, e.g. a light
    Marker,
}

#[derive(Debug, Clone)]
pub struct SceneObject {
    id: ObjectId,
    name: String,
    kind: ObjectKind,
    mesh: Mesh,
    location: Point3<f64>,
    size: f64,
    bounds: BoundingVolume,
}

impl SceneObject {
    /// `mesh` is in model space and scaled by `size` when placed.
    pub fn new(
        id: ObjectId,
        name: impl Into<String>,
        kind: ObjectKind,
        mesh: Mesh,
        location: Point3<f64>,
        size: f64,
    ) -> Self {
        let mut object = Self {
            id,
            name: name.into(),
            kind,
            mesh,
            location,
            size,
            bounds: BoundingVolume::around_point(&location, size, VolumeKind::Sphere),
        };
        object.bounds = object.compute_bounds();
        object
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ObjectKind {
        self.kind
    }

    pub fn location(&self) -> Point3<f64> {
        self.location
    }

    pub fn size(&self) -> f64 {
        self.size
    }

    pub fn bounds(&self) -> &BoundingVolume {
        &self.bounds
    }

    pub fn set_location(&mut self, location: Point3<f64>) {
        self.location = location;
        self.bounds = self.compute_bounds();
        debug!(id = %self.id, ?location, "object moved");
    }

    pub fn translate(&mut self, offset: &Vector3<f64>) {
        self.set_location(self.location + offset);
    }

    pub fn world_faces(&self) -> Vec<Face> {
        let model = self.world_transform();
        self.mesh.faces.iter().map(|f| f.transformed(&model)).collect()
    }

    fn compute_bounds(&self) -> BoundingVolume {
        match self.kind {
            ObjectKind::Marker => BoundingVolume::around_point(&self.location, self.size, VolumeKind::Sphere),
            ObjectKind::Mesh => BoundingVolume::from_points(&self.world_points(), VolumeKind::AxisAlignedBox)
                .unwrap_or_else(|| {
                    BoundingVolume::around_point(&self.location, 0.0, VolumeKind::AxisAlignedBox)
                }),
        }
    }
}

impl WorldGeometry for SceneObject {
    fn world_transform(&self) -> Matrix4<f64> {
        Transform::model(&self.location, self.size)
    }

    fn world_points(&self) -> Vec<Point3<f64>> {
        let model = self.world_transform();
        self.mesh
            .faces
            .iter()
            .flat_map(|f| f.points.iter())
            .map(|p| model.transform_point(p))
            .collect()
    }
}

impl Pickable for SceneObject {
    fn bounding_volume(&self) -> &BoundingVolume {
        &self.bounds
    }
}

/// A flat list of objects with stable ids
#[derive(Debug, Clone, Default)]
pub struct Scene {
    objects: Vec<SceneObject>,
    next_id: u32,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(
        &mut self,
        name: impl Into<String>,
        kind: ObjectKind,
        mesh: Mesh,
        location: Point3<f64>,
        size: f64,
    ) -> ObjectId {
        let id = ObjectId(self.next_id);
        self.next_id += 1;
        self.objects.push(SceneObject::new(id, name, kind, mesh, location, size));
        id
    }

    /// A cube of edge length `size`
    pub fn add_cube(&mut self, name: impl Into<String>, location: Point3<f64>, size: f64) -> ObjectId {
        self.add(name, ObjectKind::Mesh, Mesh::cube(1.0), location, size)
    }

    pub fn objects(&self) -> &[SceneObject] {
        &self.objects
    }

    pub fn get(&self, id: ObjectId) -> Option<&SceneObject> {
        self.objects.iter().find(|o| o.id == id)
    }

    pub fn get_mut(&mut self, id: ObjectId) -> Option<&mut SceneObject> {
        self.objects.iter_mut().find(|o| o.id == id)
    }

    /// Nearest object along the ray
    pub fn pick(&self, ray: &Ray) -> Option<ObjectId> {
        let picked = pick_nearest(ray, &self.objects).map(SceneObject::id);
        debug!(?picked, "scene pick");
        picked
    }

    /// World-space faces of every object, tagged with the owning id
    pub fn world_faces(&self) -> Vec<(ObjectId, Face)> {
        self.objects
            .iter()
            .flat_map(|o| o.world_faces().into_iter().map(move |f| (o.id, f)))
            .collect()
    }
}
