//! # Object Picking System
//!
//! Mouse ray-casting against scene objects.
//!
//! ## How it works
//!
//! 1. **Mouse to Ray**: pointer pixels become normalized device coordinates
//!    (`x = 2px/w - 1`, `y = 1 - 2py/h`) and are unprojected through the
//!    inverse view-projection into a world-space ray.
//! 2. **Broad phase**: the ray is tested against each object's world AABB.
//! 3. **Narrow phase**: surviving objects are tested triangle by triangle
//!    (Möller–Trumbore) in object-local space.
//! 4. **Selection**: the nearest hit by world distance wins.
//!
//! Hover highlighting on top of the picker lives in [`highlight`].

pub mod highlight;

pub use highlight::{HoverHighlighter, HoverInfo};

use cgmath::{InnerSpace, Matrix4, SquareMatrix, Vector3, Vector4};

use crate::gfx::camera::{camera_utils::Camera, OrbitCamera};
use crate::gfx::scene::Object;

const EPSILON: f32 = 1e-7;

/// A 3D ray for intersection testing
#[derive(Debug, Clone, Copy)]
pub struct Ray {
    pub origin: Vector3<f32>,
    /// Unit length.
    pub direction: Vector3<f32>,
}

impl Ray {
    pub fn new(origin: Vector3<f32>, direction: Vector3<f32>) -> Self {
        Self {
            origin,
            direction: direction.normalize(),
        }
    }
}

/// Axis-aligned bounding box.
///
/// An empty box has `min > max` on every axis and never intersects.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vector3<f32>,
    pub max: Vector3<f32>,
}

impl Aabb {
    pub fn new(min: Vector3<f32>, max: Vector3<f32>) -> Self {
        Self { min, max }
    }

    pub fn empty() -> Self {
        Self::new(
            Vector3::new(f32::MAX, f32::MAX, f32::MAX),
            Vector3::new(f32::MIN, f32::MIN, f32::MIN),
        )
    }

    pub fn from_points(points: impl IntoIterator<Item = Vector3<f32>>) -> Self {
        points.into_iter().fold(Self::empty(), |mut aabb, p| {
            aabb.min = Vector3::new(aabb.min.x.min(p.x), aabb.min.y.min(p.y), aabb.min.z.min(p.z));
            aabb.max = Vector3::new(aabb.max.x.max(p.x), aabb.max.y.max(p.y), aabb.max.z.max(p.z));
            aabb
        })
    }

    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    pub fn union(&self, other: &Aabb) -> Aabb {
        Self::from_points([self.min, self.max, other.min, other.max])
    }

    /// Slab test. Returns the entry distance, which is zero when the origin
    /// is inside the box. No triangle of the box's contents can be nearer.
    pub fn intersect_ray(&self, ray: &Ray) -> Option<f32> {
        if self.is_empty() {
            return None;
        }

        let mut t_near = f32::NEG_INFINITY;
        let mut t_far = f32::INFINITY;
        for axis in 0..3 {
            let origin = ray.origin[axis];
            let direction = ray.direction[axis];
            if direction.abs() < EPSILON {
                // Parallel to this slab: must already be inside it
                if origin < self.min[axis] || origin > self.max[axis] {
                    return None;
                }
                continue;
            }
            let t1 = (self.min[axis] - origin) / direction;
            let t2 = (self.max[axis] - origin) / direction;
            t_near = t_near.max(t1.min(t2));
            t_far = t_far.min(t1.max(t2));
        }

        if t_near <= t_far && t_far >= 0.0 {
            Some(t_near.max(0.0))
        } else {
            None
        }
    }

    /// Bounds of the eight transformed corners.
    pub fn transformed(&self, matrix: &Matrix4<f32>) -> Self {
        if self.is_empty() {
            return *self;
        }
        let (lo, hi) = (self.min, self.max);
        let corners = [
            Vector3::new(lo.x, lo.y, lo.z),
            Vector3::new(hi.x, lo.y, lo.z),
            Vector3::new(lo.x, hi.y, lo.z),
            Vector3::new(lo.x, lo.y, hi.z),
            Vector3::new(hi.x, hi.y, lo.z),
            Vector3::new(hi.x, lo.y, hi.z),
            Vector3::new(lo.x, hi.y, hi.z),
            Vector3::new(hi.x, hi.y, hi.z),
        ];
        Self::from_points(corners.iter().map(|c| (matrix * c.extend(1.0)).truncate()))
    }
}

/// Möller–Trumbore ray/triangle test, both faces.
///
/// `direction` need not be normalized; the returned `t` is in units of it.
pub fn intersect_triangle(
    origin: Vector3<f32>,
    direction: Vector3<f32>,
    triangle: &[Vector3<f32>; 3],
) -> Option<f32> {
    let [a, b, c] = *triangle;
    let edge1 = b - a;
    let edge2 = c - a;
    let p = direction.cross(edge2);
    let det = edge1.dot(p);
    if det.abs() < EPSILON {
        return None;
    }

    let inv_det = 1.0 / det;
    let s = origin - a;
    let u = s.dot(p) * inv_det;
    if !(0.0..=1.0).contains(&u) {
        return None;
    }

    let q = s.cross(edge1);
    let v = direction.dot(q) * inv_det;
    if v < 0.0 || u + v > 1.0 {
        return None;
    }

    let t = edge2.dot(q) * inv_det;
    (t > EPSILON).then_some(t)
}

/// Result of an object picking operation
#[derive(Debug, Clone, PartialEq)]
pub struct PickResult {
    pub object_index: usize,
    /// World-space distance from the ray origin to the hit.
    pub distance: f32,
    pub point: Vector3<f32>,
}

/// Object picker for 3D mouse selection
#[derive(Debug, Default)]
pub struct ObjectPicker;

impl ObjectPicker {
    pub fn new() -> Self {
        Self
    }

    /// Convert screen coordinates to a world-space ray
    pub fn screen_to_ray(
        &self,
        screen_pos: (f32, f32),
        screen_size: (f32, f32),
        camera: &OrbitCamera,
    ) -> Ray {
        let (mouse_x, mouse_y) = screen_pos;
        let (screen_width, screen_height) = (screen_size.0.max(1.0), screen_size.1.max(1.0));

        let ndc_x = (2.0 * mouse_x) / screen_width - 1.0;
        let ndc_y = 1.0 - (2.0 * mouse_y) / screen_height;

        let inv_view_proj = camera
            .build_view_projection_matrix()
            .invert()
            .unwrap_or_else(Matrix4::identity);

        // wgpu clip space: depth 0 is the near plane, 1 the far plane
        let unproject = |depth: f32| {
            let world = inv_view_proj * Vector4::new(ndc_x, ndc_y, depth, 1.0);
            world.truncate() / world.w
        };
        let near = unproject(0.0);
        let far = unproject(1.0);

        Ray::new(camera.eye, far - near)
    }

    /// Nearest hit among visible, pickable objects.
    pub fn pick(&self, ray: &Ray, objects: &[Object]) -> Option<PickResult> {
        let mut closest: Option<PickResult> = None;

        for (index, object) in objects.iter().enumerate() {
            if !object.visible || !object.pickable {
                continue;
            }
            let Some(bounds) = object.world_bounds() else {
                continue;
            };
            let Some(entry) = bounds.intersect_ray(ray) else {
                continue;
            };
            if closest.as_ref().is_some_and(|c| entry > c.distance) {
                continue;
            }

            if let Some(hit) = Self::intersect_object(ray, object) {
                if closest.as_ref().is_none_or(|c| hit.0 < c.distance) {
                    closest = Some(PickResult {
                        object_index: index,
                        distance: hit.0,
                        point: hit.1,
                    });
                }
            }
        }

        closest
    }

    /// Convenience: ray from pointer pixels, then [`Self::pick`].
    pub fn pick_at(
        &self,
        screen_pos: (f32, f32),
        screen_size: (f32, f32),
        camera: &OrbitCamera,
        objects: &[Object],
    ) -> Option<PickResult> {
        let ray = self.screen_to_ray(screen_pos, screen_size, camera);
        self.pick(&ray, objects)
    }

    /// Nearest triangle hit on `object` as (world distance, world point).
    fn intersect_object(ray: &Ray, object: &Object) -> Option<(f32, Vector3<f32>)> {
        let inverse = object.transform.invert()?;
        let local_origin = (inverse * ray.origin.extend(1.0)).truncate();
        let local_direction = (inverse * ray.direction.extend(0.0)).truncate();

        let mut nearest: Option<(f32, Vector3<f32>)> = None;
        for mesh in &object.meshes {
            for triangle in mesh.triangles() {
                let Some(t) = intersect_triangle(local_origin, local_direction, &triangle) else {
                    continue;
                };
                let local_point = local_origin + local_direction * t;
                let world_point = (object.transform * local_point.extend(1.0)).truncate();
                let distance = (world_point - ray.origin).magnitude();
                if nearest.is_none_or(|(best, _)| distance < best) {
                    nearest = Some((distance, world_point));
                }
            }
        }
        nearest
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::geometry::primitives;
    use crate::gfx::scene::Mesh;
    use cgmath::Zero;
    use rand::Rng;

    fn unit_tri() -> [Vector3<f32>; 3] {
        [
            Vector3::new(-1.0, -1.0, 0.0),
            Vector3::new(1.0, -1.0, 0.0),
            Vector3::new(0.0, 1.0, 0.0),
        ]
    }

    #[test]
    fn aabb_from_points() {
        let aabb = Aabb::from_points([
            Vector3::new(0.0, 0.0, 0.0),
            Vector3::new(1.0, 1.0, 1.0),
            Vector3::new(-1.0, -1.0, -1.0),
        ]);
        assert_eq!(aabb.min, Vector3::new(-1.0, -1.0, -1.0));
        assert_eq!(aabb.max, Vector3::new(1.0, 1.0, 1.0));
        assert!(Aabb::from_points(std::iter::empty()).is_empty());
    }

    #[test]
    fn ray_aabb_intersection() {
        let aabb = Aabb::new(Vector3::new(-1.0, -1.0, -1.0), Vector3::new(1.0, 1.0, 1.0));

        let hit = Ray::new(Vector3::new(0.0, 0.0, -5.0), Vector3::new(0.0, 0.0, 1.0));
        assert_eq!(aabb.intersect_ray(&hit), Some(4.0));

        let miss = Ray::new(Vector3::new(5.0, 0.0, -5.0), Vector3::new(0.0, 0.0, 1.0));
        assert!(aabb.intersect_ray(&miss).is_none());

        let behind = Ray::new(Vector3::new(0.0, 0.0, 5.0), Vector3::new(0.0, 0.0, 1.0));
        assert!(aabb.intersect_ray(&behind).is_none());

        let inside = Ray::new(Vector3::zero(), Vector3::new(1.0, 0.0, 0.0));
        assert_eq!(aabb.intersect_ray(&inside), Some(0.0));
    }

    #[test]
    fn triangle_hits_from_both_sides() {
        let tri = unit_tri();
        let front = intersect_triangle(Vector3::new(0.0, 0.0, 3.0), -Vector3::unit_z(), &tri);
        let back = intersect_triangle(Vector3::new(0.0, 0.0, -2.0), Vector3::unit_z(), &tri);
        assert!((front.unwrap() - 3.0).abs() < 1e-6);
        assert!((back.unwrap() - 2.0).abs() < 1e-6);

        // Outside the edges, parallel and behind the origin
        assert!(intersect_triangle(Vector3::new(2.0, 0.0, 3.0), -Vector3::unit_z(), &tri).is_none());
        assert!(intersect_triangle(Vector3::new(0.0, 0.0, 3.0), Vector3::unit_x(), &tri).is_none());
        assert!(intersect_triangle(Vector3::new(0.0, 0.0, 3.0), Vector3::unit_z(), &tri).is_none());
    }

    #[test]
    fn random_rays_through_interior_always_hit() {
        let tri = unit_tri();
        let mut rng = rand::rng();
        for _ in 0..500 {
            // Barycentric point strictly inside
            let mut u: f32 = rng.random_range(0.01..0.98);
            let mut v: f32 = rng.random_range(0.01..0.98);
            if u + v > 0.98 {
                u = 0.98 - u;
                v = 0.98 - v;
            }
            let target = tri[0] + (tri[1] - tri[0]) * u + (tri[2] - tri[0]) * v;
            let origin = Vector3::new(
                rng.random_range(-10.0..10.0),
                rng.random_range(-10.0..10.0),
                rng.random_range(1.0..10.0),
            );
            let direction = target - origin;
            let t = intersect_triangle(origin, direction, &tri).expect("interior point missed");
            assert!((t - 1.0).abs() < 1e-3);
        }
    }

    fn camera_looking_down_z() -> OrbitCamera {
        let mut camera = OrbitCamera::from_position(Vector3::new(0.0, 0.0, 10.0), Vector3::zero(), 50.0);
        camera.resize_projection(800, 600);
        camera
    }

    #[test]
    fn center_pixel_ray_points_at_target() {
        let camera = camera_looking_down_z();
        let ray = ObjectPicker::new().screen_to_ray((400.0, 300.0), (800.0, 600.0), &camera);
        assert!((ray.origin - camera.eye).magnitude() < 1e-4);
        assert!((ray.direction - Vector3::new(0.0, 0.0, -1.0)).magnitude() < 1e-3);

        // Top-left pixel points up and left
        let corner = ObjectPicker::new().screen_to_ray((0.0, 0.0), (800.0, 600.0), &camera);
        assert!(corner.direction.x < 0.0 && corner.direction.y > 0.0);
    }

    fn quad_at(z: f32, name: &str) -> Object {
        Object::new(vec![primitives::plane(2.0, 2.0, 1.0)])
            .with_name(name)
            .with_transform(
                Matrix4::from_translation(Vector3::new(0.0, 0.0, z))
                    * Matrix4::from_angle_x(cgmath::Deg(90.0)),
            )
    }

    #[test]
    fn pick_returns_nearest_pickable_visible_object() {
        let camera = camera_looking_down_z();
        let picker = ObjectPicker::new();
        let mut objects = vec![quad_at(-5.0, "far"), quad_at(2.0, "near"), quad_at(0.0, "mid")];

        let hit = picker
            .pick_at((400.0, 300.0), (800.0, 600.0), &camera, &objects)
            .unwrap();
        assert_eq!(objects[hit.object_index].name, "near");
        assert!((hit.distance - 8.0).abs() < 1e-3);
        assert!((hit.point - Vector3::new(0.0, 0.0, 2.0)).magnitude() < 1e-3);

        objects[1].pickable = false;
        objects[2].visible = false;
        let hit = picker
            .pick_at((400.0, 300.0), (800.0, 600.0), &camera, &objects)
            .unwrap();
        assert_eq!(objects[hit.object_index].name, "far");

        // Pointing into empty sky
        assert!(picker
            .pick_at((0.0, 0.0), (800.0, 600.0), &camera, &objects)
            .is_none());
    }

    #[test]
    fn camera_inside_bounds_still_finds_nearer_object() {
        let ray = Ray::new(Vector3::zero(), -Vector3::unit_z());
        let sofa = quad_at(-5.0, "sofa");
        // A wall just ahead, plus a side panel that stretches the bounds
        // from behind the origin to well past the sofa.
        let wall = Mesh::from_flat(
            &[-1.0, -1.0, -2.0, 1.0, -1.0, -2.0, 0.0, 1.0, -2.0],
            &[],
            &[],
            vec![0, 1, 2],
        );
        let side = Mesh::from_flat(
            &[3.0, -1.0, 5.0, 3.0, 1.0, 5.0, 3.0, 0.0, -10.0],
            &[],
            &[],
            vec![0, 1, 2],
        );
        let room = Object::new(vec![wall, side]).with_name("room");
        let objects = [sofa, room];
        assert!(objects[1]
            .world_bounds()
            .is_some_and(|b| b.min.z < 0.0 && b.max.z > 0.0));

        let hit = ObjectPicker::new().pick(&ray, &objects).unwrap();
        assert_eq!(objects[hit.object_index].name, "room");
        assert!((hit.distance - 2.0).abs() < 1e-4);
    }

    #[test]
    fn scaled_object_reports_world_distance() {
        let camera = camera_looking_down_z();
        let object = Object::new(vec![primitives::plane(2.0, 2.0, 1.0)]).with_transform(
            Matrix4::from_scale(3.0) * Matrix4::from_angle_x(cgmath::Deg(90.0)),
        );
        let ray = Ray::new(camera.eye, -Vector3::unit_z());
        let hit = ObjectPicker::new().pick(&ray, &[object]).unwrap();
        assert!((hit.distance - 10.0).abs() < 1e-3);
    }
}
