//! Canvas rendering for the 2D view.
//!
//! Rendering uses multiple passes for correct z-ordering:
//! 1. Background (screen space)
//! 2. Edges, dimmed first and incident edges on top (world space)
//! 3. Nodes by emphasis tier: dimmed and baseline, then neighbors, then the
//!    focused node with its glow and ring
//! 4. Vignette (screen space)

use std::f64::consts::PI;

use wasm_bindgen::JsValue;
use web_sys::CanvasRenderingContext2d;

use super::highlight::{EdgeTier, NodeAppearance, NodeTier};
use super::scene2d::{PlacedNode, Scene2D};
use super::theme::{Color, Theme};

/// Renders the complete scene to the canvas.
pub fn render(scene: &Scene2D, ctx: &CanvasRenderingContext2d, theme: &Theme) -> Result<(), JsValue> {
	draw_background(scene.width, scene.height, ctx, theme)?;

	let placed = scene.placed();

	ctx.save();
	ctx.translate(scene.transform.x, scene.transform.y)?;
	ctx.scale(scene.transform.k, scene.transform.k)?;

	draw_edges(scene, &placed, ctx, theme);
	draw_nodes(scene, &placed, ctx, theme)?;

	ctx.restore();

	if theme.background.vignette > 0.0 {
		draw_vignette(scene.width, scene.height, ctx, theme)?;
	}
	Ok(())
}

pub(crate) fn draw_background(
	width: f64,
	height: f64,
	ctx: &CanvasRenderingContext2d,
	theme: &Theme,
) -> Result<(), JsValue> {
	let gradient = ctx.create_radial_gradient(
		width / 2.0,
		height / 2.0,
		0.0,
		width / 2.0,
		height / 2.0,
		width.max(height) * 0.8,
	)?;
	gradient.add_color_stop(0.0, &theme.background.color_secondary.to_css())?;
	gradient.add_color_stop(1.0, &theme.background.color.to_css())?;

	#[allow(deprecated)]
	ctx.set_fill_style(&gradient);
	ctx.fill_rect(0.0, 0.0, width, height);
	Ok(())
}

pub(crate) fn draw_vignette(
	width: f64,
	height: f64,
	ctx: &CanvasRenderingContext2d,
	theme: &Theme,
) -> Result<(), JsValue> {
	let gradient = ctx.create_radial_gradient(
		width / 2.0,
		height / 2.0,
		width.min(height) * 0.3,
		width / 2.0,
		height / 2.0,
		width.max(height) * 0.7,
	)?;
	gradient.add_color_stop(0.0, "rgba(0, 0, 0, 0)")?;
	gradient.add_color_stop(1.0, &format!("rgba(0, 0, 0, {})", theme.background.vignette))?;

	#[allow(deprecated)]
	ctx.set_fill_style(&gradient);
	ctx.fill_rect(0.0, 0.0, width, height);
	Ok(())
}

fn draw_edges(scene: &Scene2D, placed: &[PlacedNode], ctx: &CanvasRenderingContext2d, theme: &Theme) {
	let scaled = scene.scaled();
	let mut by_index: Vec<Option<&PlacedNode>> = vec![None; scene.sprites().len()];
	for p in placed {
		by_index[p.index] = Some(p);
	}
	let at = |i: usize| by_index.get(i).copied().flatten();

	for incident_pass in [false, true] {
		for (edge_idx, &(a, b)) in scene.edge_ends().iter().enumerate() {
			let look = scene.style.edges.get(edge_idx);
			let tier = look.map_or(EdgeTier::Baseline, |l| l.tier);
			if (tier == EdgeTier::Incident) != incident_pass {
				continue;
			}
			let (Some(p1), Some(p2)) = (at(a), at(b)) else {
				continue;
			};
			let (color, opacity) = look.map_or((theme.edge.color, theme.edge.opacity), |l| {
				(l.color, l.opacity)
			});
			let width = if incident_pass {
				scaled.edge_line_width * scene.config.edge.emphasized_width
			} else {
				scaled.edge_line_width
			};

			ctx.set_stroke_style_str(&color.with_alpha(opacity * color.a).to_css());
			ctx.set_line_width(width);
			ctx.begin_path();
			ctx.move_to(p1.x, p1.y);
			ctx.line_to(p2.x, p2.y);
			ctx.stroke();
		}
	}
}

fn tier_rank(tier: NodeTier) -> u8 {
	match tier {
		NodeTier::Dimmed => 0,
		NodeTier::Baseline => 1,
		NodeTier::Neighbor => 2,
		NodeTier::Focused => 3,
	}
}

fn draw_nodes(
	scene: &Scene2D,
	placed: &[PlacedNode],
	ctx: &CanvasRenderingContext2d,
	theme: &Theme,
) -> Result<(), JsValue> {
	let scaled = scene.scaled();
	let fallback = NodeAppearance {
		color: theme.status.healthy,
		emissive: Color::rgb(0, 0, 0),
		emissive_intensity: 0.0,
		opacity: 1.0,
		scale: 1.0,
		tier: NodeTier::Baseline,
	};

	let mut order: Vec<(&PlacedNode, NodeAppearance)> = placed
		.iter()
		.map(|p| (p, scene.style.nodes.get(p.index).copied().unwrap_or(fallback)))
		.collect();
	order.sort_by_key(|(_, look)| tier_rank(look.tier));

	for (node, look) in order {
		if look.emissive_intensity > 0.0 {
			draw_node_glow(ctx, node, &look)?;
		}
		draw_node(ctx, node, &look, theme)?;
		if look.tier == NodeTier::Focused {
			ctx.begin_path();
			ctx.arc(node.x, node.y, node.radius + scaled.ring_offset, 0.0, 2.0 * PI)?;
			ctx.set_stroke_style_str("rgba(255, 255, 255, 0.8)");
			ctx.set_line_width(scaled.ring_width);
			ctx.stroke();
		}
	}
	Ok(())
}

fn draw_node_glow(
	ctx: &CanvasRenderingContext2d,
	node: &PlacedNode,
	look: &NodeAppearance,
) -> Result<(), JsValue> {
	let glow_radius = node.radius * (1.6 + look.emissive_intensity);
	let alpha = (0.35 * look.emissive_intensity).min(0.6) * look.opacity;

	let gradient = ctx.create_radial_gradient(node.x, node.y, node.radius * 0.5, node.x, node.y, glow_radius)?;
	gradient.add_color_stop(0.0, &look.emissive.with_alpha(alpha).to_css())?;
	gradient.add_color_stop(1.0, "rgba(0, 0, 0, 0)")?;

	ctx.begin_path();
	ctx.arc(node.x, node.y, glow_radius, 0.0, 2.0 * PI)?;
	#[allow(deprecated)]
	ctx.set_fill_style(&gradient);
	ctx.fill();
	Ok(())
}

fn draw_node(
	ctx: &CanvasRenderingContext2d,
	node: &PlacedNode,
	look: &NodeAppearance,
	theme: &Theme,
) -> Result<(), JsValue> {
	let (x, y, radius) = (node.x, node.y, node.radius);
	let base = look.color.add_light(look.emissive, look.emissive_intensity * 0.25);

	ctx.set_global_alpha(look.opacity);
	ctx.begin_path();
	ctx.arc(x, y, radius, 0.0, 2.0 * PI)?;
	if theme.node.use_gradient {
		let gradient = ctx.create_radial_gradient(x - radius * 0.3, y - radius * 0.3, 0.0, x, y, radius)?;
		gradient.add_color_stop(0.0, &base.lighten(theme.node.shininess).to_css())?;
		gradient.add_color_stop(0.7, &base.to_css())?;
		gradient.add_color_stop(1.0, &base.darken(0.2).to_css())?;
		#[allow(deprecated)]
		ctx.set_fill_style(&gradient);
	} else {
		ctx.set_fill_style_str(&base.to_css());
	}
	ctx.fill();
	ctx.set_global_alpha(1.0);
	Ok(())
}
