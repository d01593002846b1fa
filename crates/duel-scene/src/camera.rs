//! Orbit camera over the field plane and inverse-projection picking.
//!
//! The field lies in the world `z = 0` plane, +x to the right and +y away from
//! the near player. The camera orbits the origin in the `x = 0` plane:
//! `angle` is the elevation above the field, so `0` looks across it and
//! `π/2` looks straight down.

use std::f32::consts::FRAC_PI_2;

use glam::{Mat4, Vec2, Vec3, Vec4Swizzles};

use crate::config::CameraConfig;

pub const MIN_RADIUS: f32 = 1.0;
pub const MAX_RADIUS: f32 = 50.0;

#[derive(Debug, Clone)]
pub struct Camera {
    radius: f32,
    angle: f32,
    xoffset: f32,
    yoffset: f32,
    fovy: f32,
    near: f32,
    far: f32,
    viewport: Vec2,

    // Derived in `update_params`.
    mvp: Mat4,
    cameray: f32,
    cameraz: f32,
    scrx: f32,
    scry: f32,
}

impl Camera {
    pub fn new(config: &CameraConfig, width: f32, height: f32) -> Self {
        let mut camera = Self {
            radius: config.radius.clamp(MIN_RADIUS, MAX_RADIUS),
            angle: config.angle.clamp(0.0, FRAC_PI_2),
            xoffset: config.xoffset,
            yoffset: config.yoffset,
            fovy: config.fovy,
            near: config.near,
            far: config.far,
            viewport: Vec2::new(width.max(1.0), height.max(1.0)),
            mvp: Mat4::IDENTITY,
            cameray: 0.0,
            cameraz: 0.0,
            scrx: 0.0,
            scry: 0.0,
        };
        camera.update_params();
        camera
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn angle(&self) -> f32 {
        self.angle
    }

    /// Pan offset in normalized device units.
    pub fn offset(&self) -> Vec2 {
        Vec2::new(self.xoffset, self.yoffset)
    }

    pub fn viewport(&self) -> Vec2 {
        self.viewport
    }

    /// Current view-projection, pan included.
    pub fn mvp(&self) -> Mat4 {
        self.mvp
    }

    /// Applies a full pose at once (used to reset to the configured camera).
    pub fn apply(&mut self, config: &CameraConfig) {
        self.radius = config.radius.clamp(MIN_RADIUS, MAX_RADIUS);
        self.angle = config.angle.clamp(0.0, FRAC_PI_2);
        self.xoffset = config.xoffset;
        self.yoffset = config.yoffset;
        self.fovy = config.fovy;
        self.near = config.near;
        self.far = config.far;
        self.update_params();
    }

    pub fn set_viewport(&mut self, width: f32, height: f32) {
        self.viewport = Vec2::new(width.max(1.0), height.max(1.0));
        self.update_params();
    }

    pub fn set_radius(&mut self, radius: f32) {
        self.radius = radius.clamp(MIN_RADIUS, MAX_RADIUS);
        self.update_params();
    }

    pub fn set_angle(&mut self, angle: f32) {
        self.angle = angle.clamp(0.0, FRAC_PI_2);
        self.update_params();
    }

    pub fn set_offset(&mut self, xoffset: f32, yoffset: f32) {
        self.xoffset = xoffset;
        self.yoffset = yoffset;
        self.update_params();
    }

    /// Shifts the pan offset by a delta in normalized device units.
    pub fn pan_by(&mut self, dx: f32, dy: f32) {
        self.set_offset(self.xoffset + dx, self.yoffset + dy);
    }

    /// Recomputes the matrix and the picking auxiliaries from the inputs.
    ///
    /// Every setter calls this, so derived state never lags the inputs.
    pub fn update_params(&mut self) {
        let (sin, cos) = self.angle.sin_cos();
        let eye = Vec3::new(0.0, -self.radius * cos, self.radius * sin);
        // Orbit tangent as up vector: stays valid at the straight-down pose.
        let up = Vec3::new(0.0, sin, cos);
        let view = Mat4::look_at_rh(eye, Vec3::ZERO, up);

        let aspect = self.viewport.x / self.viewport.y;
        let projection = Mat4::perspective_rh(self.fovy, aspect, self.near, self.far);
        let pan = Mat4::from_translation(Vec3::new(self.xoffset, self.yoffset, 0.0));

        self.mvp = pan * projection * view;
        self.cameray = self.radius * cos;
        self.cameraz = self.radius * sin;
        self.scry = 2.0 * (self.fovy * 0.5).tan() * self.near;
        self.scrx = self.scry * aspect;
    }

    /// Projects a world point to pixel coordinates (top-left origin).
    ///
    /// `None` when the point is behind the camera.
    pub fn project(&self, point: Vec3) -> Option<Vec2> {
        let clip = self.mvp * point.extend(1.0);
        if clip.w <= f32::EPSILON {
            return None;
        }
        let ndc = clip.xy() / clip.w;
        Some(Vec2::new(
            (ndc.x + 1.0) * 0.5 * self.viewport.x,
            (1.0 - ndc.y) * 0.5 * self.viewport.y,
        ))
    }

    /// Intersects the ray under pixel `(px, py)` with the field plane.
    ///
    /// The pixel is mapped to the near plane, then the orbit geometry is
    /// inverted: the ray's depression below the horizon gives the ground `y`,
    /// and similar triangles between the near-plane and ground distances give
    /// `x`. `None` when the ray does not descend to the plane.
    pub fn unproject_ground(&self, px: f32, py: f32) -> Option<Vec2> {
        let x = px / self.viewport.x * 2.0 - 1.0 - self.xoffset;
        let y = 1.0 - py / self.viewport.y * 2.0 - self.yoffset;
        let projx = self.scrx * 0.5 * x;
        let projy = self.scry * 0.5 * y;

        let depression = self.angle - (projy / self.near).atan();
        if depression <= f32::EPSILON {
            return None;
        }

        let ground_y = -self.cameray + self.cameraz / depression.tan();
        let near_dist = (self.near * self.near + projy * projy).sqrt();
        let ground_dist = (self.cameraz * self.cameraz + (self.cameray + ground_y).powi(2)).sqrt();
        let ground_x = projx * ground_dist / near_dist;

        let hit = Vec2::new(ground_x, ground_y);
        hit.is_finite().then_some(hit)
    }
}
