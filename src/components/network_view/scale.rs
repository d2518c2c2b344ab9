//! Node sizing and zoom-dependent scaling for the 2D view.
//!
//! # Coordinate Spaces
//!
//! - **World-space**: The coordinate system of the layout. Values in world-space
//!   scale proportionally with zoom (appear larger when zoomed in).
//! - **Screen-space**: Pixel coordinates on the canvas. Values in screen-space
//!   remain constant regardless of zoom level.
//!
//! Node radii grow with `sqrt(degree)` so hubs stay recognisable without
//! swallowing the canvas.

/// Defines how a visual property scales with zoom level.
#[derive(Clone, Debug)]
#[allow(
	dead_code,
	reason = "World variant completes the API for users customizing ScaleConfig"
)]
pub enum ScaleBehavior {
	/// Constant world-space size. Appears larger when zoomed in.
	World,
	/// Constant screen-space size (pixels). Unaffected by zoom.
	Screen,
	/// World-space scaling, clamped to min/max screen-space bounds.
	Clamped { min_screen: f64, max_screen: f64 },
}

impl ScaleBehavior {
	/// Compute the world-space value for a given base value and zoom level.
	pub fn apply(&self, base: f64, k: f64) -> f64 {
		match self {
			ScaleBehavior::World => base,
			ScaleBehavior::Screen => base / k,
			ScaleBehavior::Clamped {
				min_screen,
				max_screen,
			} => {
				// screen_size = world_size * k
				let min_world = min_screen / k;
				let max_world = max_screen / k;
				base.clamp(min_world, max_world)
			}
		}
	}
}

/// Degree-driven node radius: `sqrt(degree) * per_sqrt_degree + base`.
#[derive(Clone, Debug)]
pub struct NodeSizing {
	pub per_sqrt_degree: f64,
	pub base: f64,
}

impl NodeSizing {
	pub fn radius(&self, degree: u32) -> f64 {
		(degree as f64).sqrt() * self.per_sqrt_degree + self.base
	}
}

/// Configuration for node visual scaling.
#[derive(Clone, Debug)]
pub struct NodeScaleConfig {
	pub sizing: NodeSizing,
	/// How the rendered radius reacts to zoom.
	pub radius_behavior: ScaleBehavior,
	/// Extra pick tolerance around a node, in screen pixels.
	pub hit_slop: f64,
}

/// Configuration for edge visual scaling.
#[derive(Clone, Debug)]
pub struct EdgeScaleConfig {
	/// Base line width in screen pixels.
	pub line_width: f64,
	/// Width multiplier for edges incident to the focused node.
	pub emphasized_width: f64,
}

/// Configuration for the focus ring.
#[derive(Clone, Debug)]
pub struct RingScaleConfig {
	/// Ring offset from node edge in screen pixels.
	pub offset: f64,
}

/// Complete scale configuration for all graph elements.
#[derive(Clone, Debug)]
pub struct ScaleConfig {
	pub node: NodeScaleConfig,
	pub edge: EdgeScaleConfig,
	pub ring: RingScaleConfig,
	/// Allowed zoom range for the 2D view.
	pub zoom_range: (f64, f64),
}

impl Default for ScaleConfig {
	fn default() -> Self {
		Self {
			node: NodeScaleConfig {
				sizing: NodeSizing {
					per_sqrt_degree: 1.2,
					base: 5.0,
				},
				radius_behavior: ScaleBehavior::Clamped {
					min_screen: 2.0,
					max_screen: f64::INFINITY,
				},
				hit_slop: 2.0,
			},
			edge: EdgeScaleConfig {
				line_width: 1.5,
				emphasized_width: 1.6,
			},
			ring: RingScaleConfig { offset: 2.0 },
			zoom_range: (0.1, 10.0),
		}
	}
}

/// Pre-computed scale values for a specific zoom level.
///
/// Create this once per frame and pass it to rendering functions.
/// All sizes are in world-space (ready to use after canvas transform).
#[derive(Clone, Debug)]
pub struct ScaledValues {
	/// Current zoom level.
	pub k: f64,
	/// Edge line width in world-space.
	pub edge_line_width: f64,
	/// Pick tolerance in world-space.
	pub hit_slop: f64,
	/// Focus ring width in world-space.
	pub ring_width: f64,
	/// Focus ring offset in world-space.
	pub ring_offset: f64,
}

impl ScaledValues {
	/// Compute scaled values from configuration and current zoom level.
	pub fn new(config: &ScaleConfig, ring_width: f64, k: f64) -> Self {
		Self {
			k,
			edge_line_width: config.edge.line_width / k,
			hit_slop: config.node.hit_slop / k,
			ring_width: ring_width / k,
			ring_offset: config.ring.offset / k,
		}
	}

	/// World-space radius for a node of the given base radius.
	pub fn node_radius(&self, config: &ScaleConfig, base: f64) -> f64 {
		config.node.radius_behavior.apply(base, self.k)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn radius_grows_with_sqrt_degree() {
		let sizing = ScaleConfig::default().node.sizing;
		assert_eq!(sizing.radius(0), 5.0);
		assert!((sizing.radius(4) - 7.4).abs() < 1e-9);
		assert!((sizing.radius(100) - 17.0).abs() < 1e-9);
	}

	#[test]
	fn clamped_radius_keeps_minimum_screen_size() {
		let config = ScaleConfig::default();
		let far = ScaledValues::new(&config, 1.5, 0.1);
		// 5 world units at k = 0.1 would be 0.5 px; clamped to 2 px.
		assert!((far.node_radius(&config, 5.0) * 0.1 - 2.0).abs() < 1e-9);
		let near = ScaledValues::new(&config, 1.5, 2.0);
		assert_eq!(near.node_radius(&config, 5.0), 5.0);
	}

	#[test]
	fn screen_space_widths_shrink_in_world_space_when_zoomed() {
		let config = ScaleConfig::default();
		let values = ScaledValues::new(&config, 1.5, 2.0);
		assert_eq!(values.edge_line_width, 0.75);
		assert_eq!(values.ring_width, 0.75);
	}
}
