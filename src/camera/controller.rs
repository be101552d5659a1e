use std::f32::consts::PI;

use glam::{Vec2, Vec3};

use crate::camera::core::Camera;
use crate::options::CameraOptions;

/// Keeps the polar angle off the exact poles, where the view basis
/// degenerates.
const POLAR_EPSILON: f32 = 1e-4;
/// Pending motion below this is considered settled.
const SETTLE_EPSILON: f32 = 1e-5;
/// Eye displacement below this does not count as movement.
const MOVE_EPSILON: f32 = 1e-3;
/// Smallest zoom factor a single gesture may apply.
const MIN_ZOOM_STEP: f32 = 0.1;

/// Eye position relative to the orbit target in spherical coordinates.
///
/// `polar` is measured from +Y, `azimuth` around +Y starting at +Z.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Spherical {
    radius: f32,
    polar: f32,
    azimuth: f32,
}

impl Spherical {
    fn from_offset(offset: Vec3) -> Self {
        let radius = offset.length();
        if radius <= f32::EPSILON {
            return Self {
                radius: 0.0,
                polar: 0.0,
                azimuth: 0.0,
            };
        }
        Self {
            radius,
            polar: (offset.y / radius).clamp(-1.0, 1.0).acos(),
            azimuth: offset.x.atan2(offset.z),
        }
    }

    fn to_offset(self) -> Vec3 {
        let sin_polar = self.polar.sin();
        Vec3::new(
            self.radius * sin_polar * self.azimuth.sin(),
            self.radius * self.polar.cos(),
            self.radius * sin_polar * self.azimuth.cos(),
        )
    }
}

/// Damped orbit controls around a target point.
///
/// Input methods ([`rotate`](Self::rotate), [`pan`](Self::pan),
/// [`zoom`](Self::zoom)) only accumulate motion; [`update`](Self::update)
/// integrates one damping step per frame and writes the camera. Distance,
/// polar angle and (optionally) azimuth are clamped so the camera cannot
/// pass under the ground plane or collapse onto the target.
#[derive(Debug, Clone)]
pub struct OrbitControls {
    target: Vec3,
    rotate_delta: Vec2,
    pan_delta: Vec2,
    zoom_scale: f32,
    damping_factor: f32,
    min_distance: f32,
    max_distance: f32,
    max_polar: f32,
    azimuth_range: Option<(f32, f32)>,
    rotate_speed: f32,
    pan_speed: f32,
    zoom_speed: f32,
    released: bool,
}

impl OrbitControls {
    /// Controls targeting the origin, configured from `options`.
    #[must_use]
    pub fn new(options: &CameraOptions) -> Self {
        let azimuth_range = options.azimuth_range.map(|[lo, hi]| {
            let (lo, hi) = (lo.to_radians(), hi.to_radians());
            (lo.min(hi), lo.max(hi))
        });
        Self {
            target: Vec3::ZERO,
            rotate_delta: Vec2::ZERO,
            pan_delta: Vec2::ZERO,
            zoom_scale: 1.0,
            damping_factor: options.damping_factor.clamp(0.0, 1.0),
            min_distance: options.min_distance.max(0.0),
            max_distance: options.max_distance.max(options.min_distance),
            max_polar: options.max_polar_angle.to_radians().clamp(0.0, PI),
            azimuth_range,
            rotate_speed: options.rotate_speed,
            pan_speed: options.pan_speed,
            zoom_speed: options.zoom_speed,
            released: false,
        }
    }

    /// Current orbit target.
    #[must_use]
    pub fn target(&self) -> Vec3 {
        self.target
    }

    /// Whether [`release`](Self::release) has been called.
    #[must_use]
    pub fn is_released(&self) -> bool {
        self.released
    }

    /// Place the camera at `eye` looking at `target`, discarding any
    /// pending motion. The placement is clamped on the next
    /// [`update`](Self::update).
    pub fn reset(&mut self, camera: &mut Camera, eye: Vec3, target: Vec3) {
        self.target = target;
        self.rotate_delta = Vec2::ZERO;
        self.pan_delta = Vec2::ZERO;
        self.zoom_scale = 1.0;
        camera.eye = eye;
        camera.target = target;
        camera.up = Vec3::Y;
    }

    /// Queue an orbit by a screen-space drag delta in pixels.
    pub fn rotate(&mut self, delta: Vec2) {
        if self.released {
            return;
        }
        self.rotate_delta += -delta * self.rotate_speed * 0.01;
    }

    /// Queue a pan by a screen-space drag delta in pixels.
    pub fn pan(&mut self, delta: Vec2) {
        if self.released {
            return;
        }
        self.pan_delta += delta * self.pan_speed;
    }

    /// Queue a zoom; positive `delta` moves toward the target.
    pub fn zoom(&mut self, delta: f32) {
        if self.released {
            return;
        }
        let step = (1.0 - delta * self.zoom_speed).max(MIN_ZOOM_STEP);
        self.zoom_scale *= step;
    }

    /// Integrate one damping step and write the result into `camera`.
    ///
    /// Returns `true` if the camera moved.
    pub fn update(&mut self, camera: &mut Camera) -> bool {
        if self.released {
            return false;
        }
        let before = camera.eye;
        let step = if self.damping_factor > 0.0 {
            self.damping_factor
        } else {
            1.0
        };

        let mut spherical = Spherical::from_offset(camera.eye - self.target);
        spherical.azimuth += self.rotate_delta.x * step;
        spherical.polar += self.rotate_delta.y * step;
        self.rotate_delta *= 1.0 - step;

        if let Some((lo, hi)) = self.azimuth_range {
            spherical.azimuth = wrap_angle(spherical.azimuth).clamp(lo, hi);
        }
        let max_polar = self.max_polar.min(PI - POLAR_EPSILON);
        spherical.polar =
            spherical.polar.clamp(POLAR_EPSILON, max_polar.max(POLAR_EPSILON));

        spherical.radius = (spherical.radius * self.zoom_scale)
            .clamp(self.min_distance, self.max_distance);
        self.zoom_scale = 1.0;

        // Pan along the camera's screen axes, scaled by distance so the
        // drag speed feels constant at any zoom.
        let forward = (camera.target - camera.eye).normalize_or(Vec3::NEG_Z);
        let right = forward.cross(Vec3::Y).normalize_or(Vec3::X);
        let up = right.cross(forward);
        let pan = self.pan_delta * step * spherical.radius * 0.001;
        self.target += -right * pan.x + up * pan.y;
        self.pan_delta *= 1.0 - step;

        if self.rotate_delta.length() < SETTLE_EPSILON {
            self.rotate_delta = Vec2::ZERO;
        }
        if self.pan_delta.length() < SETTLE_EPSILON {
            self.pan_delta = Vec2::ZERO;
        }

        camera.eye = self.target + spherical.to_offset();
        camera.target = self.target;
        camera.up = Vec3::Y;
        camera.eye.distance(before) > MOVE_EPSILON
    }

    /// Stop responding to input and drop pending motion. Idempotent.
    pub fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        self.rotate_delta = Vec2::ZERO;
        self.pan_delta = Vec2::ZERO;
        self.zoom_scale = 1.0;
        log::debug!("orbit controls released");
    }
}

/// Wrap an angle into `(-PI, PI]`.
fn wrap_angle(angle: f32) -> f32 {
    let wrapped = (angle + PI).rem_euclid(2.0 * PI) - PI;
    if wrapped <= -PI {
        wrapped + 2.0 * PI
    } else {
        wrapped
    }
}
