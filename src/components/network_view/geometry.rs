//! Small 3D vector and ray helpers for the 3D layout and camera.

use std::ops::{Add, Mul, Sub};

/// A point or direction in 3D world space.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Vec3 {
	pub x: f64,
	pub y: f64,
	pub z: f64,
}

impl Vec3 {
	pub const ZERO: Vec3 = Vec3::new(0.0, 0.0, 0.0);
	pub const UP: Vec3 = Vec3::new(0.0, 1.0, 0.0);

	pub const fn new(x: f64, y: f64, z: f64) -> Self {
		Self { x, y, z }
	}

	pub fn dot(self, other: Vec3) -> f64 {
		self.x * other.x + self.y * other.y + self.z * other.z
	}

	pub fn cross(self, other: Vec3) -> Vec3 {
		Vec3::new(
			self.y * other.z - self.z * other.y,
			self.z * other.x - self.x * other.z,
			self.x * other.y - self.y * other.x,
		)
	}

	pub fn length(self) -> f64 {
		self.dot(self).sqrt()
	}

	/// Unit vector in the same direction; the zero vector stays zero.
	pub fn normalize(self) -> Vec3 {
		let len = self.length();
		if len < 1e-12 { Vec3::ZERO } else { self * (1.0 / len) }
	}

	pub fn is_finite(self) -> bool {
		self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
	}
}

impl Add for Vec3 {
	type Output = Vec3;
	fn add(self, o: Vec3) -> Vec3 {
		Vec3::new(self.x + o.x, self.y + o.y, self.z + o.z)
	}
}

impl Sub for Vec3 {
	type Output = Vec3;
	fn sub(self, o: Vec3) -> Vec3 {
		Vec3::new(self.x - o.x, self.y - o.y, self.z - o.z)
	}
}

impl Mul<f64> for Vec3 {
	type Output = Vec3;
	fn mul(self, s: f64) -> Vec3 {
		Vec3::new(self.x * s, self.y * s, self.z * s)
	}
}

/// A half-line from `origin` along the unit vector `direction`.
#[derive(Clone, Copy, Debug)]
pub struct Ray {
	pub origin: Vec3,
	pub direction: Vec3,
}

impl Ray {
	/// Distance along the ray to the nearest intersection with a sphere.
	pub fn intersect_sphere(&self, center: Vec3, radius: f64) -> Option<f64> {
		let oc = self.origin - center;
		let b = oc.dot(self.direction);
		let c = oc.dot(oc) - radius * radius;
		let disc = b * b - c;
		if disc < 0.0 {
			return None;
		}
		let sqrt_disc = disc.sqrt();
		let near = -b - sqrt_disc;
		if near >= 0.0 {
			return Some(near);
		}
		// Origin inside the sphere.
		let far = -b + sqrt_disc;
		(far >= 0.0).then_some(far)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn ray_hits_sphere_front_face() {
		let ray = Ray {
			origin: Vec3::new(0.0, 0.0, 10.0),
			direction: Vec3::new(0.0, 0.0, -1.0),
		};
		assert_eq!(ray.intersect_sphere(Vec3::ZERO, 2.0), Some(8.0));
		assert_eq!(ray.intersect_sphere(Vec3::new(5.0, 0.0, 0.0), 2.0), None);
	}

	#[test]
	fn ray_behind_origin_misses() {
		let ray = Ray {
			origin: Vec3::new(0.0, 0.0, 10.0),
			direction: Vec3::new(0.0, 0.0, 1.0),
		};
		assert_eq!(ray.intersect_sphere(Vec3::ZERO, 2.0), None);
	}

	#[test]
	fn cross_product_is_right_handed() {
		let x = Vec3::new(1.0, 0.0, 0.0);
		assert_eq!(x.cross(Vec3::UP), Vec3::new(0.0, 0.0, 1.0));
		assert_eq!(Vec3::ZERO.normalize(), Vec3::ZERO);
	}
}
