//! Deterministic procedural sprite synthesis.
//!
//! Draws a simple shaded creature whose proportions come from the prompt
//! seed, whose colours come from the theme, and whose pose varies across
//! frames according to the action. Output depends only on the generation spec and
//! seed, and always contains exactly `frame_count` frames at the requested
//! resolution.

use std::f32::consts::{PI, TAU};

use image::RgbaImage;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::Result;
use crate::prompt::CompiledPrompt;
use crate::types::{Colour, GenerationSpec, RawFrame, ViewAngle};

/// Base body colour for a theme.
pub fn theme_colour(theme: &str) -> Colour {
    match theme {
        "fire" => Colour::rgb(226, 88, 34),
        "water" => Colour::rgb(40, 120, 210),
        "ice" => Colour::rgb(150, 210, 240),
        "nature" => Colour::rgb(70, 160, 60),
        "shadow" => Colour::rgb(80, 50, 110),
        "light" => Colour::rgb(250, 220, 120),
        "electric" => Colour::rgb(240, 210, 40),
        "poison" => Colour::rgb(140, 200, 50),
        "metal" => Colour::rgb(150, 155, 165),
        "earth" => Colour::rgb(150, 110, 70),
        _ => Colour::rgb(190, 140, 100),
    }
}

/// Per-seed body plan shared by every frame of a batch.
#[derive(Debug, Clone)]
struct BodyPlan {
    body_rx: f32,
    body_ry: f32,
    head_r: f32,
    leg_len: f32,
    base: Colour,
    accent: Colour,
    crest: bool,
}

impl BodyPlan {
    fn new(spec: &GenerationSpec, rng: &mut StdRng) -> Self {
        let res = spec.resolution();
        let w = res.width as f32;
        let h = res.height as f32;
        let base = theme_colour(spec.theme());

        Self {
            body_rx: w * rng.random_range(0.22..0.30),
            body_ry: h * rng.random_range(0.16..0.22),
            head_r: w.min(h) * rng.random_range(0.13..0.18),
            leg_len: h * rng.random_range(0.08..0.12),
            base,
            accent: base.shade(rng.random_range(35.0..55.0)),
            crest: matches!(spec.theme(), "fire" | "electric" | "light") || rng.random_bool(0.3),
        }
    }
}

/// Pose offsets for one frame.
#[derive(Debug, Clone, Copy, Default)]
struct Pose {
    bob: f32,
    stretch: f32,
    lean: f32,
    stride: f32,
}

fn pose(action: &str, index: usize, frames: u32, h: f32) -> Pose {
    if frames <= 1 {
        return Pose::default();
    }
    let t = index as f32 / frames as f32 * TAU;

    match action {
        "idle" => Pose {
            bob: t.sin() * h * 0.02,
            stretch: t.sin() * 0.05,
            ..Pose::default()
        },
        "walk" | "run" => Pose {
            bob: t.sin().abs() * h * -0.03,
            stride: t.sin(),
            ..Pose::default()
        },
        "attack" => Pose {
            lean: (t / 2.0).sin(),
            stretch: -(t / 2.0).sin() * 0.05,
            ..Pose::default()
        },
        "jump" => Pose {
            bob: -(index as f32 / (frames - 1) as f32 * PI).sin() * h * 0.12,
            stretch: (t).cos() * 0.08,
            ..Pose::default()
        },
        "hurt" | "death" => Pose {
            lean: -(index as f32 / frames as f32),
            stretch: -(index as f32 / frames as f32) * 0.2,
            ..Pose::default()
        },
        _ => Pose {
            stretch: t.sin() * 0.08,
            ..Pose::default()
        },
    }
}

/// The never-failing, seed-driven generator.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProceduralStrategy;

impl ProceduralStrategy {
    pub fn generate(&self, spec: &GenerationSpec, prompt: &CompiledPrompt) -> Result<Vec<RawFrame>> {
        let mut rng = StdRng::seed_from_u64(prompt.seed);
        let plan = BodyPlan::new(spec, &mut rng);

        let frames = (0..spec.frame_count() as usize)
            .map(|index| {
                let mut frame_rng = StdRng::seed_from_u64(prompt.seed.wrapping_add(index as u64 + 1));
                let image = draw_frame(spec, &plan, index, &mut frame_rng);
                RawFrame::new(index, image)
            })
            .collect();

        Ok(frames)
    }
}

fn draw_frame(spec: &GenerationSpec, plan: &BodyPlan, index: usize, rng: &mut StdRng) -> RgbaImage {
    let res = spec.resolution();
    let (w, h) = (res.width as f32, res.height as f32);
    let pose = pose(spec.action(), index, spec.frame_count(), h);
    let smooth = !spec.style().is_pixel_art();

    let mut canvas = RgbaImage::new(res.width, res.height);
    if !spec.constraints().require_transparency {
        let backdrop = plan.base.shade(-70.0);
        for pixel in canvas.pixels_mut() {
            *pixel = backdrop.into();
        }
    }

    let ground = h * 0.9;
    let body_ry = plan.body_ry * (1.0 + pose.stretch);
    let body_cx = w / 2.0 + pose.lean * w * 0.06;
    let body_cy = ground - plan.leg_len - body_ry + pose.bob;

    let mut mask = vec![false; (res.width * res.height) as usize];

    // legs
    if spec.view() != ViewAngle::TopDown {
        let leg_w = (plan.body_rx * 0.25).max(1.0);
        for (side, phase) in [(-0.5f32, 1.0f32), (0.5, -1.0)] {
            let x = body_cx + side * plan.body_rx + pose.stride * phase * w * 0.05;
            fill_rect(&mut canvas, &mut mask, x - leg_w / 2.0, body_cy, leg_w, ground - body_cy, plan.base.shade(-25.0));
        }
    }

    // body
    fill_ellipse(&mut canvas, &mut mask, body_cx, body_cy, plan.body_rx, body_ry, plan, smooth);

    // head
    let (head_dx, head_dy) = match spec.view() {
        ViewAngle::Side => (plan.body_rx * 0.7, -body_ry * 0.9),
        ViewAngle::ThreeQuarter => (plan.body_rx * 0.35, -body_ry * 1.0),
        _ => (0.0, -body_ry * 1.1),
    };
    let head_cx = body_cx + head_dx + pose.lean * w * 0.04;
    let head_cy = body_cy + head_dy;
    fill_ellipse(&mut canvas, &mut mask, head_cx, head_cy, plan.head_r, plan.head_r, plan, smooth);

    // crest: flickers per frame
    if plan.crest {
        let tips = 3;
        for tip in 0..tips {
            let offset = (tip as f32 - 1.0) * plan.head_r * 0.6;
            let height = plan.head_r * rng.random_range(0.6..1.1);
            let x = head_cx + offset;
            let top = head_cy - plan.head_r - height;
            fill_rect(&mut canvas, &mut mask, x - 1.0, top, 2.0_f32.max(plan.head_r * 0.25), height + 1.0, plan.accent);
        }
    }

    outline(&mut canvas, &mask, plan.base.shade(-60.0), spec.constraints().require_transparency);

    // eyes drawn after the outline so they stay visible
    let eye_r = (plan.head_r * 0.18).max(0.5);
    let eyes: &[f32] = match spec.view() {
        ViewAngle::Back | ViewAngle::TopDown => &[],
        ViewAngle::Side => &[0.45],
        ViewAngle::ThreeQuarter => &[0.0, 0.55],
        _ => &[-0.4, 0.4],
    };
    for dx in eyes {
        let ex = head_cx + dx * plan.head_r;
        let ey = head_cy - plan.head_r * 0.1;
        fill_rect(&mut canvas, &mut mask, ex - eye_r, ey - eye_r, eye_r * 2.0, eye_r * 2.0, Colour::WHITE);
        fill_rect(&mut canvas, &mut mask, ex - eye_r / 2.0, ey - eye_r / 2.0, eye_r, eye_r, Colour::BLACK);
    }

    canvas
}

fn fill_rect(
    canvas: &mut RgbaImage,
    mask: &mut [bool],
    x: f32,
    y: f32,
    w: f32,
    h: f32,
    colour: Colour,
) {
    let (cw, ch) = canvas.dimensions();
    let x0 = x.floor().max(0.0) as u32;
    let y0 = y.floor().max(0.0) as u32;
    let x1 = ((x + w).ceil().max(0.0) as u32).min(cw);
    let y1 = ((y + h).ceil().max(0.0) as u32).min(ch);

    for py in y0..y1 {
        for px in x0..x1 {
            canvas.put_pixel(px, py, colour.into());
            mask[(py * cw + px) as usize] = true;
        }
    }
}

/// Fill an ellipse lit from the upper left.
///
/// Pixel-art output uses four hard shade bands; other styles blend
/// continuously between the darkest and lightest shade.
#[allow(clippy::too_many_arguments)]
fn fill_ellipse(
    canvas: &mut RgbaImage,
    mask: &mut [bool],
    cx: f32,
    cy: f32,
    rx: f32,
    ry: f32,
    plan: &BodyPlan,
    smooth: bool,
) {
    let (cw, ch) = canvas.dimensions();
    let rx = rx.max(1.0);
    let ry = ry.max(1.0);
    let x0 = (cx - rx).floor().max(0.0) as u32;
    let y0 = (cy - ry).floor().max(0.0) as u32;
    let x1 = ((cx + rx).ceil().max(0.0) as u32).min(cw);
    let y1 = ((cy + ry).ceil().max(0.0) as u32).min(ch);

    let shades = [
        plan.base.shade(40.0),
        plan.base.shade(15.0),
        plan.base,
        plan.base.shade(-30.0),
    ];

    for py in y0..y1 {
        for px in x0..x1 {
            let nx = (px as f32 + 0.5 - cx) / rx;
            let ny = (py as f32 + 0.5 - cy) / ry;
            if nx * nx + ny * ny > 1.0 {
                continue;
            }
            // distance from the highlight at (-0.4, -0.4), 0..~1.4
            let light = (((nx + 0.4).powi(2) + (ny + 0.4).powi(2)).sqrt() / 1.4).clamp(0.0, 1.0);
            let colour = if smooth {
                lerp(shades[0], shades[3], light)
            } else {
                shades[((light * shades.len() as f32) as usize).min(shades.len() - 1)]
            };
            canvas.put_pixel(px, py, colour.into());
            mask[(py * cw + px) as usize] = true;
        }
    }
}

fn lerp(a: Colour, b: Colour, t: f32) -> Colour {
    let mix = |x: u8, y: u8| (x as f32 + (y as f32 - x as f32) * t).round() as u8;
    Colour::new(mix(a.r, b.r), mix(a.g, b.g), mix(a.b, b.b), mix(a.a, b.a))
}

/// Recolour every drawn pixel that touches an undrawn one.
fn outline(canvas: &mut RgbaImage, mask: &[bool], colour: Colour, edge_counts: bool) {
    let (w, h) = canvas.dimensions();
    let drawn = |x: i64, y: i64| {
        if x < 0 || y < 0 || x >= w as i64 || y >= h as i64 {
            return !edge_counts;
        }
        mask[(y as u32 * w + x as u32) as usize]
    };

    let mut edges = Vec::new();
    for y in 0..h as i64 {
        for x in 0..w as i64 {
            if !drawn(x, y) {
                continue;
            }
            if !drawn(x - 1, y) || !drawn(x + 1, y) || !drawn(x, y - 1) || !drawn(x, y + 1) {
                edges.push((x as u32, y as u32));
            }
        }
    }
    for (x, y) in edges {
        canvas.put_pixel(x, y, colour.into());
    }
}
