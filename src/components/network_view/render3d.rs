//! Canvas rendering for the 3D view.
//!
//! Primitives are projected through the orbit camera and painted back to
//! front. Fog blends far primitives toward the background color; emphasized
//! nodes get an emissive halo.

use std::f64::consts::PI;

use wasm_bindgen::JsValue;
use web_sys::CanvasRenderingContext2d;

use super::camera::Projected;
use super::highlight::{EdgeTier, NodeAppearance};
use super::render::{draw_background, draw_vignette};
use super::scene3d::{Scene3D, fog_factor};
use super::theme::{Color, Theme};

enum Primitive {
	Edge {
		from: Projected,
		to: Projected,
		color: Color,
		opacity: f64,
		emphasized: bool,
	},
	Ball {
		at: Projected,
		radius: f64,
		look: NodeAppearance,
	},
}

impl Primitive {
	fn depth(&self) -> f64 {
		match self {
			Primitive::Edge { from, to, .. } => (from.depth + to.depth) / 2.0,
			Primitive::Ball { at, .. } => at.depth,
		}
	}
}

/// Renders the complete scene to the canvas.
pub fn render(scene: &Scene3D, ctx: &CanvasRenderingContext2d, theme: &Theme) -> Result<(), JsValue> {
	let (w, h) = (scene.width, scene.height);
	draw_background(w, h, ctx, theme)?;

	let projected: Vec<Option<Projected>> = scene
		.balls()
		.iter()
		.map(|b| scene.camera.project(b.center, w, h))
		.collect();

	let mut primitives = Vec::with_capacity(scene.balls().len() + scene.edge_ends().len());
	for (i, &(a, b)) in scene.edge_ends().iter().enumerate() {
		let (Some(from), Some(to)) = (projected[a], projected[b]) else {
			continue;
		};
		let (color, opacity, emphasized) = match scene.style.edges.get(i) {
			Some(look) => (look.color, look.opacity, look.tier == EdgeTier::Incident),
			None => (theme.edge.color, theme.edge.opacity, false),
		};
		primitives.push(Primitive::Edge {
			from,
			to,
			color,
			opacity,
			emphasized,
		});
	}
	for (i, at) in projected.iter().enumerate() {
		let (Some(at), Some(look)) = (at, scene.style.nodes.get(i)) else {
			continue;
		};
		primitives.push(Primitive::Ball {
			at: *at,
			radius: scene.display_radius(i) * at.scale,
			look: *look,
		});
	}
	primitives.sort_by(|a, b| b.depth().total_cmp(&a.depth()));

	let fog = |depth: f64| {
		fog_factor(depth, theme.background.fog_near, theme.background.fog_far)
	};
	for primitive in &primitives {
		match primitive {
			Primitive::Edge {
				from,
				to,
				color,
				opacity,
				emphasized,
			} => {
				let f = fog((from.depth + to.depth) / 2.0);
				let shade = color.lerp(theme.background.color, f);
				ctx.set_stroke_style_str(&shade.with_alpha(opacity * (1.0 - f)).to_css());
				ctx.set_line_width(if *emphasized { 1.6 } else { 1.0 });
				ctx.begin_path();
				ctx.move_to(from.x, from.y);
				ctx.line_to(to.x, to.y);
				ctx.stroke();
			}
			Primitive::Ball { at, radius, look } => {
				draw_ball(ctx, at, *radius, look, fog(at.depth), theme)?;
			}
		}
	}

	if theme.background.vignette > 0.0 {
		draw_vignette(w, h, ctx, theme)?;
	}
	Ok(())
}

fn draw_ball(
	ctx: &CanvasRenderingContext2d,
	at: &Projected,
	radius: f64,
	look: &NodeAppearance,
	fog: f64,
	theme: &Theme,
) -> Result<(), JsValue> {
	if radius < 0.25 {
		return Ok(());
	}
	let lit = look.color.add_light(look.emissive, look.emissive_intensity * 0.3);
	let base = lit.lerp(theme.background.color, fog);
	let alpha = look.opacity * (1.0 - fog * 0.5);

	if look.emissive_intensity > 0.0 {
		let halo = radius * (1.5 + 0.5 * look.emissive_intensity);
		let gradient = ctx.create_radial_gradient(at.x, at.y, radius * 0.8, at.x, at.y, halo)?;
		let glow = look.emissive.with_alpha((0.45 * look.emissive_intensity).min(0.7) * alpha);
		gradient.add_color_stop(0.0, &glow.to_css())?;
		gradient.add_color_stop(1.0, "rgba(0, 0, 0, 0)")?;
		ctx.begin_path();
		ctx.arc(at.x, at.y, halo, 0.0, 2.0 * PI)?;
		#[allow(deprecated)]
		ctx.set_fill_style(&gradient);
		ctx.fill();
	}

	// Specular spot up and to the left.
	let gradient = ctx.create_radial_gradient(
		at.x - radius * 0.35,
		at.y - radius * 0.35,
		radius * 0.1,
		at.x,
		at.y,
		radius,
	)?;
	gradient.add_color_stop(0.0, &base.lighten(theme.node.shininess + 0.2).to_css())?;
	gradient.add_color_stop(0.5, &base.to_css())?;
	gradient.add_color_stop(1.0, &base.darken(0.45).to_css())?;

	ctx.set_global_alpha(alpha);
	ctx.begin_path();
	ctx.arc(at.x, at.y, radius, 0.0, 2.0 * PI)?;
	#[allow(deprecated)]
	ctx.set_fill_style(&gradient);
	ctx.fill();
	ctx.set_global_alpha(1.0);
	Ok(())
}
