//! Visual theming for the network views.
//!
//! Colors for infection status, edges, background and the three emphasis
//! tiers used while a node is focused.

/// RGBA color representation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
	pub r: u8,
	pub g: u8,
	pub b: u8,
	pub a: f64,
}

impl Color {
	pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
		Self { r, g, b, a: 1.0 }
	}

	pub const fn rgba(r: u8, g: u8, b: u8, a: f64) -> Self {
		Self { r, g, b, a }
	}

	/// Build from a packed `0xRRGGBB` value.
	pub const fn hex(rgb: u32) -> Self {
		Self::rgb((rgb >> 16) as u8, (rgb >> 8) as u8, rgb as u8)
	}

	/// Parse `#RRGGBB`. Anything else yields `None`.
	pub fn parse(css: &str) -> Option<Self> {
		let digits = css.strip_prefix('#')?;
		if digits.len() != 6 {
			return None;
		}
		u32::from_str_radix(digits, 16).ok().map(Self::hex)
	}

	pub fn with_alpha(self, a: f64) -> Self {
		Self { a, ..self }
	}

	/// Lighten the color by a factor (0.0 = unchanged, 1.0 = white)
	pub fn lighten(self, factor: f64) -> Self {
		let f = factor.clamp(0.0, 1.0);
		Self {
			r: (self.r as f64 + (255.0 - self.r as f64) * f) as u8,
			g: (self.g as f64 + (255.0 - self.g as f64) * f) as u8,
			b: (self.b as f64 + (255.0 - self.b as f64) * f) as u8,
			a: self.a,
		}
	}

	/// Darken the color by a factor (0.0 = unchanged, 1.0 = black)
	pub fn darken(self, factor: f64) -> Self {
		let f = 1.0 - factor.clamp(0.0, 1.0);
		Self {
			r: (self.r as f64 * f) as u8,
			g: (self.g as f64 * f) as u8,
			b: (self.b as f64 * f) as u8,
			a: self.a,
		}
	}

	/// Linear interpolation between two colors
	pub fn lerp(self, other: Color, t: f64) -> Self {
		let t = t.clamp(0.0, 1.0);
		Self {
			r: (self.r as f64 * (1.0 - t) + other.r as f64 * t) as u8,
			g: (self.g as f64 * (1.0 - t) + other.g as f64 * t) as u8,
			b: (self.b as f64 * (1.0 - t) + other.b as f64 * t) as u8,
			a: self.a * (1.0 - t) + other.a * t,
		}
	}

	/// Add `other * intensity` channel-wise, saturating at white.
	pub fn add_light(self, other: Color, intensity: f64) -> Self {
		let mix = |a: u8, b: u8| (a as f64 + b as f64 * intensity).min(255.0) as u8;
		Self {
			r: mix(self.r, other.r),
			g: mix(self.g, other.g),
			b: mix(self.b, other.b),
			a: self.a,
		}
	}

	pub fn to_css(self) -> String {
		if (self.a - 1.0).abs() < 0.001 {
			format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
		} else {
			format!("rgba({}, {}, {}, {})", self.r, self.g, self.b, self.a)
		}
	}
}

/// Node fill colors by infection status.
#[derive(Clone, Debug)]
pub struct StatusPalette {
	pub healthy: Color,
	pub infected: Color,
}

impl StatusPalette {
	pub fn color(&self, infected: bool) -> Color {
		if infected { self.infected } else { self.healthy }
	}
}

/// Background style configuration.
#[derive(Clone, Debug)]
pub struct BackgroundStyle {
	/// Primary background color
	pub color: Color,
	/// Secondary color for the radial gradient center
	pub color_secondary: Color,
	/// Vignette intensity (0.0 = none, 1.0 = strong)
	pub vignette: f64,
	/// 3D fog starts fading primitives at this camera distance...
	pub fog_near: f64,
	/// ...and they reach the background color here.
	pub fog_far: f64,
}

/// Edge visual style at rest.
#[derive(Clone, Debug)]
pub struct EdgeStyle {
	pub color: Color,
	pub opacity: f64,
}

/// Node shading.
#[derive(Clone, Debug)]
pub struct NodeStyle {
	/// Whether nodes have an inner gradient (fake specular highlight)
	pub use_gradient: bool,
	/// Highlight strength of the gradient, 0..1
	pub shininess: f64,
	/// Stroke width around the focus ring in screen pixels
	pub ring_width: f64,
}

/// Visual treatment of one emphasized node tier.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NodeEmphasis {
	pub color: Color,
	pub emissive: Color,
	pub emissive_intensity: f64,
	pub scale: f64,
}

/// Colors and factors applied while a node is focused.
#[derive(Clone, Debug)]
pub struct EmphasisStyle {
	pub focused: NodeEmphasis,
	pub neighbor: NodeEmphasis,
	pub incident_edge: Color,
	pub incident_edge_opacity: f64,
	/// Opacity of everything outside the focus neighborhood.
	pub dimmed_opacity: f64,
}

/// Complete visual theme.
#[derive(Clone, Debug)]
pub struct Theme {
	pub name: &'static str,
	pub background: BackgroundStyle,
	pub status: StatusPalette,
	pub edge: EdgeStyle,
	pub node: NodeStyle,
	pub emphasis: EmphasisStyle,
}

impl Theme {
	/// Dark slate theme with green/red status colors (default)
	pub fn default_theme() -> Self {
		Self {
			name: "default",
			background: BackgroundStyle {
				color: Color::hex(0x1a202c),
				color_secondary: Color::hex(0x232a38),
				vignette: 0.15,
				fog_near: 400.0,
				fog_far: 1000.0,
			},
			status: StatusPalette {
				healthy: Color::hex(0x48bb78),
				infected: Color::hex(0xf56565),
			},
			edge: EdgeStyle {
				color: Color::hex(0x353d4f),
				opacity: 0.3,
			},
			node: NodeStyle {
				use_gradient: true,
				shininess: 0.4,
				ring_width: 1.5,
			},
			emphasis: EmphasisStyle {
				focused: NodeEmphasis {
					color: Color::hex(0x006400),
					emissive: Color::hex(0x00ff00),
					emissive_intensity: 1.2,
					scale: 1.6,
				},
				neighbor: NodeEmphasis {
					color: Color::hex(0xffff00),
					emissive: Color::hex(0xffff00),
					emissive_intensity: 1.0,
					scale: 1.3,
				},
				incident_edge: Color::hex(0xffd700),
				incident_edge_opacity: 0.95,
				dimmed_opacity: 0.08,
			},
		}
	}
}

impl Default for Theme {
	fn default() -> Self {
		Self::default_theme()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_hex_colors() {
		assert_eq!(Color::parse("#48bb78"), Some(Color::rgb(0x48, 0xbb, 0x78)));
		assert_eq!(Color::parse("48bb78"), None);
		assert_eq!(Color::parse("#fff"), None);
		assert_eq!(Color::hex(0xf56565).to_css(), "#f56565");
	}

	#[test]
	fn translucent_colors_render_as_rgba() {
		assert_eq!(Color::rgb(1, 2, 3).with_alpha(0.5).to_css(), "rgba(1, 2, 3, 0.5)");
	}

	#[test]
	fn added_light_saturates() {
		let c = Color::hex(0x006400).add_light(Color::hex(0x00ff00), 1.2);
		assert_eq!((c.r, c.g, c.b), (0, 255, 0));
	}
}
