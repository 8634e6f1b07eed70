use super::camera_utils::{Camera, CameraUniform};
use cgmath::*;

#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: cgmath::Matrix4<f32> = cgmath::Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.5,
    0.0, 0.0, 0.0, 1.0,
);

/// Y-up orbit camera: the eye sits on a sphere of radius `distance` around
/// `target`, positioned by `yaw` (around +Y, zero looking down -Z) and `pitch`.
#[derive(Debug, Clone, Copy)]
pub struct OrbitCamera {
    pub distance: f32,
    pub pitch: f32,
    pub yaw: f32,
    pub eye: Vector3<f32>,
    pub target: Vector3<f32>,
    pub up: Vector3<f32>,
    pub bounds: OrbitCameraBounds,
    pub aspect: f32,
    pub fovy: Rad<f32>,
    pub znear: f32,
    pub zfar: f32,
    pub uniform: CameraUniform,
    home: (Vector3<f32>, Vector3<f32>),
}

impl Camera for OrbitCamera {
    fn build_view_projection_matrix(&self) -> Matrix4<f32> {
        let eye = Point3::from_vec(self.eye);
        let target = Point3::from_vec(self.target);
        let view = Matrix4::look_at_rh(eye, target, self.up);
        let proj =
            OPENGL_TO_WGPU_MATRIX * perspective(self.fovy, self.aspect, self.znear, self.zfar);
        proj * view
    }
}

impl OrbitCamera {
    pub fn new(distance: f32, pitch: f32, yaw: f32, target: Vector3<f32>, aspect: f32) -> Self {
        let mut camera = Self {
            distance,
            pitch,
            yaw,
            eye: Vector3::zero(), // Will be auto-calculted in `update()` nevertheless.
            target,
            up: Vector3::unit_y(),
            bounds: OrbitCameraBounds::default(),
            aspect,
            fovy: Rad(std::f32::consts::PI / 4.0),
            znear: 0.1,
            zfar: 2000.0,
            uniform: CameraUniform::default(),
            home: (Vector3::zero(), target),
        };
        camera.update();
        camera.home = (camera.eye, camera.target);
        camera
    }

    /// Places the eye at `eye` orbiting `target`, with a vertical field of
    /// view in degrees. The pose becomes the camera's reset position.
    pub fn from_position(eye: Vector3<f32>, target: Vector3<f32>, fov_degrees: f32) -> Self {
        let mut camera = Self::new(1.0, 0.0, 0.0, target, 1.0);
        camera.fovy = Deg(fov_degrees).into();
        camera.bounds.max_distance = None;
        camera.set_eye(eye);
        camera.home = (camera.eye, camera.target);
        camera
    }

    pub fn reset_to_default(&mut self) {
        let (eye, target) = self.home;
        self.target = target;
        self.set_eye(eye);
    }

    /// Moves the eye to `eye` and re-derives distance, yaw and pitch so that
    /// subsequent orbiting continues smoothly from there.
    pub fn set_eye(&mut self, eye: Vector3<f32>) {
        let offset = eye - self.target;
        let distance = offset.magnitude();
        if distance <= f32::EPSILON {
            return;
        }
        self.distance = distance;
        self.pitch = (offset.y / distance).clamp(-1.0, 1.0).asin();
        self.yaw = offset.x.atan2(offset.z);
        self.eye = eye;
    }

    /// Puts the eye at `eye` facing `direction`, keeping the current orbit
    /// distance for the new target.
    pub fn look_from(&mut self, eye: Vector3<f32>, direction: Vector3<f32>) {
        if direction.magnitude2() <= f32::EPSILON {
            self.translate(eye - self.eye);
            return;
        }
        self.target = eye + direction.normalize() * self.distance;
        self.set_eye(eye);
    }

    /// Moves eye and target together.
    pub fn translate(&mut self, delta: Vector3<f32>) {
        self.eye += delta;
        self.target += delta;
    }

    /// View direction flattened onto the ground plane.
    pub fn horizontal_forward(&self) -> Vector3<f32> {
        let forward = self.target - self.eye;
        let flat = Vector3::new(forward.x, 0.0, forward.z);
        if flat.magnitude2() <= f32::EPSILON {
            Vector3::new(-self.yaw.sin(), 0.0, -self.yaw.cos())
        } else {
            flat.normalize()
        }
    }

    pub fn set_distance(&mut self, distance: f32) {
        self.distance = distance.clamp(
            self.bounds.min_distance.unwrap_or(f32::EPSILON),
            self.bounds.max_distance.unwrap_or(f32::MAX),
        );
        self.update();
    }

    pub fn add_distance(&mut self, delta: f32) {
        let corrected_zoom = f32::log10(self.distance.max(1.1)) * delta;
        self.set_distance(self.distance + corrected_zoom);
    }

    pub fn set_pitch(&mut self, pitch: f32) {
        self.pitch = pitch.clamp(self.bounds.min_pitch, self.bounds.max_pitch);
        self.update();
    }

    pub fn add_pitch(&mut self, delta: f32) {
        self.set_pitch(self.pitch + delta);
    }

    pub fn set_yaw(&mut self, yaw: f32) {
        let mut bounded_yaw = yaw;
        if let Some(min_yaw) = self.bounds.min_yaw {
            bounded_yaw = bounded_yaw.max(min_yaw);
        }
        if let Some(max_yaw) = self.bounds.max_yaw {
            bounded_yaw = bounded_yaw.min(max_yaw);
        }
        self.yaw = bounded_yaw;
        self.update();
    }

    pub fn add_yaw(&mut self, delta: f32) {
        self.set_yaw(self.yaw + delta);
    }

    /// Pans the camera relative to the current view direction
    /// delta.0 = horizontal pan (left/right relative to camera view)
    /// delta.1 = vertical pan (up/down relative to camera view)
    pub fn pan(&mut self, delta: (f32, f32)) {
        let forward = (self.target - self.eye).normalize();
        let right = forward.cross(self.up).normalize();
        let up = right.cross(forward).normalize();

        // Scale by distance for consistent feel at all zoom levels
        let pan_scale = self.distance * 0.1;

        let movement = right * delta.0 * pan_scale + up * delta.1 * pan_scale;
        self.translate(movement);
    }

    /// Updates the camera after changing `distance`, `pitch` or `yaw`.
    fn update(&mut self) {
        self.eye =
            calculate_cartesian_eye_position(self.pitch, self.yaw, self.distance, self.target);
    }

    pub fn resize_projection(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.aspect = width as f32 / height as f32;
    }

    pub fn update_view_proj(&mut self) {
        let view_proj = self.build_view_projection_matrix();
        self.uniform.view_position = [self.eye.x, self.eye.y, self.eye.z, 1.0];
        self.uniform.view_proj = view_proj.into();
        self.uniform.inv_view_proj = view_proj
            .invert()
            .unwrap_or_else(Matrix4::identity)
            .into();
    }

    /// Projects a world-space point to window pixels. Returns `None` for
    /// points behind the camera.
    pub fn project_to_screen(
        &self,
        point: Vector3<f32>,
        viewport: (f32, f32),
    ) -> Option<[f32; 2]> {
        let clip = self.build_view_projection_matrix() * point.extend(1.0);
        if clip.w <= f32::EPSILON {
            return None;
        }
        let ndc_x = clip.x / clip.w;
        let ndc_y = clip.y / clip.w;
        Some([
            (ndc_x + 1.0) * 0.5 * viewport.0,
            (1.0 - ndc_y) * 0.5 * viewport.1,
        ])
    }
}

#[derive(Debug, Clone, Copy)]
pub struct OrbitCameraBounds {
    pub min_distance: Option<f32>,
    pub max_distance: Option<f32>,
    pub min_pitch: f32,
    pub max_pitch: f32,
    pub min_yaw: Option<f32>,
    pub max_yaw: Option<f32>,
}

impl Default for OrbitCameraBounds {
    fn default() -> Self {
        Self {
            min_distance: Some(0.05),
            max_distance: Some(16.0),
            min_pitch: -std::f32::consts::FRAC_PI_2 + 0.01,
            max_pitch: std::f32::consts::FRAC_PI_2 - 0.01,
            min_yaw: None,
            max_yaw: None,
        }
    }
}

fn calculate_cartesian_eye_position(
    pitch: f32,
    yaw: f32,
    distance: f32,
    target: Vector3<f32>,
) -> Vector3<f32> {
    Vector3::new(
        distance * yaw.sin() * pitch.cos(),
        distance * pitch.sin(),
        distance * yaw.cos() * pitch.cos(),
    ) + target
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Vector3<f32>, b: Vector3<f32>) -> bool {
        (a - b).magnitude() < 1e-3
    }

    #[test]
    fn from_position_reproduces_eye() {
        let eye = Vector3::new(0.0, 2.0, 50.0);
        let camera = OrbitCamera::from_position(eye, Vector3::zero(), 50.0);
        assert!(close(camera.eye, eye));
        assert!((camera.distance - eye.magnitude()).abs() < 1e-3);

        // Re-deriving the eye from the spherical coordinates lands in the same place
        let rebuilt = calculate_cartesian_eye_position(
            camera.pitch,
            camera.yaw,
            camera.distance,
            camera.target,
        );
        assert!(close(rebuilt, eye));
    }

    #[test]
    fn look_from_faces_direction_and_keeps_distance() {
        let mut camera =
            OrbitCamera::from_position(Vector3::new(90.0, 2.0, 80.0), Vector3::zero(), 50.0);
        let distance = camera.distance;
        camera.look_from(Vector3::new(0.0, 2.0, 0.0), Vector3::new(1.0, 0.0, 0.0));

        assert!(close(camera.eye, Vector3::new(0.0, 2.0, 0.0)));
        assert!((camera.distance - distance).abs() < 1e-3);
        let forward = (camera.target - camera.eye).normalize();
        assert!(close(forward, Vector3::unit_x()));
    }

    #[test]
    fn projects_target_to_viewport_center() {
        let camera =
            OrbitCamera::from_position(Vector3::new(0.0, 0.0, 10.0), Vector3::zero(), 60.0);
        let pixel = camera
            .project_to_screen(Vector3::zero(), (800.0, 600.0))
            .unwrap();
        assert!((pixel[0] - 400.0).abs() < 1e-2);
        assert!((pixel[1] - 300.0).abs() < 1e-2);

        // Behind the camera
        assert!(camera
            .project_to_screen(Vector3::new(0.0, 0.0, 20.0), (800.0, 600.0))
            .is_none());
    }

    #[test]
    fn reset_returns_home() {
        let home = Vector3::new(0.0, 2.0, 50.0);
        let mut camera = OrbitCamera::from_position(home, Vector3::zero(), 50.0);
        camera.add_yaw(1.0);
        camera.pan((3.0, -2.0));
        camera.reset_to_default();
        assert!(close(camera.eye, home));
        assert!(close(camera.target, Vector3::zero()));
    }

    #[test]
    fn horizontal_forward_ignores_height() {
        let camera =
            OrbitCamera::from_position(Vector3::new(0.0, 10.0, 10.0), Vector3::zero(), 50.0);
        let forward = camera.horizontal_forward();
        assert!(close(forward, Vector3::new(0.0, 0.0, -1.0)));
    }
}
