/// Orbit camera and projection utilities
use nalgebra::{Matrix4, Point3, Vector3};

use crate::geometry::Bounds;

const MAX_PITCH: f32 = std::f32::consts::FRAC_PI_2 - 0.05;

/// Projection mode for rendering
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProjectionMode {
    Orthographic,
    Perspective,
}

/// Camera orbiting a target point
#[derive(Debug, Clone)]
pub struct Camera {
    pub target: Point3<f32>,
    pub distance: f32,
    /// Angle around the vertical, radians
    pub yaw: f32,
    /// Elevation above the horizontal plane, radians
    pub pitch: f32,
    pub up: Vector3<f32>,
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    /// Radius of the scene the clip planes must keep in view
    pub radius: f32,
    pub mode: ProjectionMode,
}

impl Camera {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            target: Point3::origin(),
            distance: 5.0,
            yaw: 0.6,
            pitch: 0.35,
            up: Vector3::new(0.0, 1.0, 0.0),
            fov: std::f32::consts::PI / 4.0, // 45 degrees
            aspect: width as f32 / height.max(1) as f32,
            near: 0.05,
            far: 85.0,
            radius: 20.0,
            mode: ProjectionMode::Perspective,
        }
    }

    pub fn position(&self) -> Point3<f32> {
        let (sin_yaw, cos_yaw) = self.yaw.sin_cos();
        let (sin_pitch, cos_pitch) = self.pitch.sin_cos();
        self.target
            + Vector3::new(cos_pitch * sin_yaw, sin_pitch, cos_pitch * cos_yaw) * self.distance
    }

    pub fn set_viewport(&mut self, width: u32, height: u32) {
        self.aspect = width as f32 / height.max(1) as f32;
    }

    pub fn orbit(&mut self, yaw: f32, pitch: f32) {
        self.yaw += yaw;
        self.pitch = (self.pitch + pitch).clamp(-MAX_PITCH, MAX_PITCH);
    }

    pub fn zoom(&mut self, factor: f32) {
        self.distance = (self.distance * factor).max(self.radius * 1e-2);
        self.update_clip_planes();
    }

    pub fn toggle_mode(&mut self) {
        self.mode = match self.mode {
            ProjectionMode::Perspective => ProjectionMode::Orthographic,
            ProjectionMode::Orthographic => ProjectionMode::Perspective,
        };
    }

    /// Aim at the center of `bounds` from far enough to see all of it
    pub fn fit(&mut self, bounds: &Bounds) {
        let radius = (bounds.extent().norm() / 2.0).max(1e-3);
        self.target = bounds.center();
        self.radius = radius;
        self.distance = radius / (self.fov / 2.0).sin() * 1.1;
        self.update_clip_planes();
    }

    fn update_clip_planes(&mut self) {
        self.near = self.distance * 0.01;
        self.far = self.distance + self.radius * 4.0;
    }

    /// Create the view matrix (camera transformation)
    pub fn view_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(&self.position(), &self.target, &self.up)
    }

    /// Create the projection matrix
    pub fn projection_matrix(&self) -> Matrix4<f32> {
        match self.mode {
            ProjectionMode::Perspective => {
                Matrix4::new_perspective(self.aspect, self.fov, self.near, self.far)
            }
            ProjectionMode::Orthographic => {
                let height = 2.0 * self.distance * (self.fov / 2.0).tan();
                let width = height * self.aspect;
                Matrix4::new_orthographic(
                    -width / 2.0,
                    width / 2.0,
                    -height / 2.0,
                    height / 2.0,
                    self.near,
                    self.far,
                )
            }
        }
    }

    pub fn view_projection(&self) -> Matrix4<f32> {
        self.projection_matrix() * self.view_matrix()
    }

    /// Project a world-space point to screen space as `(x, y, depth)`.
    ///
    /// `view_projection` is passed in so callers can compute it once per frame.
    pub fn project_to_screen(
        view_projection: &Matrix4<f32>,
        point: &Point3<f32>,
        width: u32,
        height: u32,
    ) -> Option<(f32, f32, f32)> {
        // transform_point performs the perspective divide
        let ndc = view_projection.transform_point(point);

        if !(-1.0..=1.0).contains(&ndc.z) {
            return None;
        }
        if ndc.x < -1.0 || ndc.x > 1.0 || ndc.y < -1.0 || ndc.y > 1.0 {
            return None;
        }

        let screen_x = (ndc.x + 1.0) * 0.5 * width as f32;
        let screen_y = (1.0 - ndc.y) * 0.5 * height as f32;

        Some((screen_x, screen_y, ndc.z))
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(800, 600)
    }
}
