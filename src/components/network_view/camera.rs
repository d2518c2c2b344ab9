//! Orbit camera for the 3D view.
//!
//! Spherical coordinates around a target point, eased toward their goals
//! each frame. Projection is a plain pinhole model onto the canvas; there is
//! no GPU pipeline, so the camera also does the screen-space math for
//! drawing and picking.

use std::f64::consts::PI;

use super::geometry::{Ray, Vec3};

/// A world point mapped onto the canvas.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Projected {
	pub x: f64,
	pub y: f64,
	/// Distance along the view direction; larger is farther.
	pub depth: f64,
	/// Pixels per world unit at this depth.
	pub scale: f64,
}

/// Orbit-style perspective camera.
#[derive(Clone, Debug)]
pub struct OrbitCamera {
	pub target: Vec3,
	/// Vertical field of view in degrees.
	pub fov: f64,
	pub near: f64,
	pub distance: f64,
	/// Azimuth around the Y axis.
	pub theta: f64,
	/// Polar angle from +Y.
	pub phi: f64,
	pub min_distance: f64,
	pub max_distance: f64,
	/// Fraction of the remaining motion applied per frame.
	pub damping: f64,

	goal_distance: f64,
	goal_theta: f64,
	goal_phi: f64,
}

impl Default for OrbitCamera {
	fn default() -> Self {
		Self::looking_from(Vec3::new(0.0, 50.0, 300.0), Vec3::ZERO)
	}
}

impl OrbitCamera {
	/// Camera at `position` looking at `target`.
	pub fn looking_from(position: Vec3, target: Vec3) -> Self {
		let offset = position - target;
		let distance = offset.length().max(1e-6);
		let phi = (offset.y / distance).clamp(-1.0, 1.0).acos();
		let theta = offset.x.atan2(offset.z);
		Self {
			target,
			fov: 60.0,
			near: 0.1,
			distance,
			theta,
			phi,
			min_distance: 50.0,
			max_distance: 500.0,
			damping: 0.05,
			goal_distance: distance,
			goal_theta: theta,
			goal_phi: phi,
		}
	}

	pub fn position(&self) -> Vec3 {
		let sin_phi = self.phi.sin();
		self.target
			+ Vec3::new(
				self.distance * sin_phi * self.theta.sin(),
				self.distance * self.phi.cos(),
				self.distance * sin_phi * self.theta.cos(),
			)
	}

	/// Queue a rotation by screen-drag deltas in radians.
	pub fn orbit(&mut self, d_theta: f64, d_phi: f64) {
		self.goal_theta += d_theta;
		self.goal_phi = (self.goal_phi + d_phi).clamp(0.05, PI - 0.05);
	}

	/// Queue a dolly by `factor` (< 1 moves closer).
	pub fn zoom(&mut self, factor: f64) {
		self.goal_distance =
			(self.goal_distance * factor).clamp(self.min_distance, self.max_distance);
	}

	/// Ease toward the queued goals. Returns true while still moving.
	pub fn update(&mut self) -> bool {
		const EPSILON: f64 = 1e-4;
		let mut moving = false;
		for (value, goal) in [
			(&mut self.distance, self.goal_distance),
			(&mut self.theta, self.goal_theta),
			(&mut self.phi, self.goal_phi),
		] {
			if (*value - goal).abs() > EPSILON {
				*value += (goal - *value) * self.damping;
				moving = true;
			} else {
				*value = goal;
			}
		}
		moving
	}

	/// Jump straight to the queued goals.
	pub fn settle(&mut self) {
		self.distance = self.goal_distance;
		self.theta = self.goal_theta;
		self.phi = self.goal_phi;
	}

	fn basis(&self) -> (Vec3, Vec3, Vec3) {
		let forward = (self.target - self.position()).normalize();
		let right = forward.cross(Vec3::UP).normalize();
		let up = right.cross(forward);
		(forward, right, up)
	}

	fn focal_length(&self, height: f64) -> f64 {
		(height / 2.0) / (self.fov.to_radians() / 2.0).tan()
	}

	/// Map `point` to canvas pixels. `None` when it is behind the camera.
	pub fn project(&self, point: Vec3, width: f64, height: f64) -> Option<Projected> {
		let (forward, right, up) = self.basis();
		let d = point - self.position();
		let depth = d.dot(forward);
		if depth <= self.near {
			return None;
		}
		let scale = self.focal_length(height) / depth;
		Some(Projected {
			x: width / 2.0 + d.dot(right) * scale,
			y: height / 2.0 - d.dot(up) * scale,
			depth,
			scale,
		})
	}

	/// World-space ray through canvas pixel `(px, py)`.
	pub fn ray_through(&self, px: f64, py: f64, width: f64, height: f64) -> Ray {
		let (forward, right, up) = self.basis();
		let direction = forward * self.focal_length(height)
			+ right * (px - width / 2.0)
			+ up * (height / 2.0 - py);
		Ray {
			origin: self.position(),
			direction: direction.normalize(),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn starts_at_fixed_vantage_point() {
		let cam = OrbitCamera::default();
		let p = cam.position();
		assert!((p.x - 0.0).abs() < 1e-9);
		assert!((p.y - 50.0).abs() < 1e-9);
		assert!((p.z - 300.0).abs() < 1e-9);
	}

	#[test]
	fn target_projects_to_canvas_center() {
		let cam = OrbitCamera::default();
		let p = cam.project(Vec3::ZERO, 800.0, 600.0).unwrap();
		assert!((p.x - 400.0).abs() < 1e-9);
		assert!((p.y - 300.0).abs() < 1e-9);
		assert!(cam.project(Vec3::new(0.0, 60.0, 400.0), 800.0, 600.0).is_none());
	}

	#[test]
	fn ray_through_projection_hits_the_point() {
		let cam = OrbitCamera::default();
		let point = Vec3::new(40.0, -20.0, 10.0);
		let p = cam.project(point, 800.0, 600.0).unwrap();
		let ray = cam.ray_through(p.x, p.y, 800.0, 600.0);
		assert!(ray.intersect_sphere(point, 0.5).is_some());
	}

	#[test]
	fn zoom_is_clamped_and_eased() {
		let mut cam = OrbitCamera::default();
		cam.zoom(0.01);
		assert!(cam.update());
		assert!(cam.distance > 50.0);
		cam.settle();
		assert_eq!(cam.distance, 50.0);
		cam.zoom(100.0);
		cam.settle();
		assert_eq!(cam.distance, 500.0);
		assert!(!cam.update());
	}
}
