use std::collections::HashMap;
use std::path::Path;

use glam::{Vec2, Vec3Swizzles};
use image::{Rgb, RgbImage};
use terrain_scatter::prelude::*;

/// How instances of one template are drawn.
#[derive(Clone, Copy, Debug)]
pub struct MarkerStyle {
    pub color: [u8; 3],
    /// Radius in pixels at scale 1.
    pub radius: f32,
}

/// Top-down rendering of a heightfield and the instances placed on it.
#[derive(Clone, Debug)]
pub struct RenderConfig {
    pub image_size: (u32, u32),
    /// World-space (x, z) of the image's top-left corner.
    pub domain_min: Vec2,
    pub domain_extent: Vec2,
    /// Heights mapped to the darkest and brightest ground shade.
    pub height_range: Vec2,
    /// Ground at or below this height is drawn as water.
    pub water_level: Option<f32>,
    pub water_color: [u8; 3],
    styles: HashMap<String, MarkerStyle>,
    default_style: MarkerStyle,
}

impl RenderConfig {
    pub fn new(image_size: (u32, u32), domain_min: Vec2, domain_extent: Vec2) -> Self {
        Self {
            image_size,
            domain_min,
            domain_extent,
            height_range: Vec2::new(-20.0, 20.0),
            water_level: None,
            water_color: [70, 110, 170],
            styles: HashMap::new(),
            default_style: MarkerStyle {
                color: [255, 0, 255],
                radius: 3.0,
            },
        }
    }

    pub fn with_height_range(mut self, min: f32, max: f32) -> Self {
        self.height_range = Vec2::new(min, max);
        self
    }

    pub fn with_water_level(mut self, level: f32) -> Self {
        self.water_level = Some(level);
        self
    }

    pub fn set_style(&mut self, template: impl Into<String>, style: MarkerStyle) -> &mut Self {
        self.styles.insert(template.into(), style);
        self
    }

    fn style(&self, template: &str) -> MarkerStyle {
        self.styles
            .get(template)
            .copied()
            .unwrap_or(self.default_style)
    }

    fn to_world(&self, px: u32, py: u32) -> Vec2 {
        let (w, h) = self.image_size;
        let uv = Vec2::new(
            (px as f32 + 0.5) / w as f32,
            (py as f32 + 0.5) / h as f32,
        );
        self.domain_min + uv * self.domain_extent
    }

    fn to_pixel(&self, world: Vec2) -> Vec2 {
        let (w, h) = self.image_size;
        (world - self.domain_min) / self.domain_extent * Vec2::new(w as f32, h as f32)
    }
}

fn shade(ground: &Heightfield, config: &RenderConfig, world: Vec2) -> [u8; 3] {
    let Some(height) = ground.height_at(world) else {
        return [0, 0, 0];
    };
    if config.water_level.is_some_and(|level| height <= level) {
        return config.water_color;
    }
    let t = ((height - config.height_range.x) / (config.height_range.y - config.height_range.x))
        .clamp(0.0, 1.0);
    let light = ground
        .normal_at(world)
        .map(|n| n.dot(glam::Vec3::new(-0.4, 0.8, -0.4).normalize()).max(0.0))
        .unwrap_or(1.0);
    let base = 90.0 + 140.0 * t;
    let v = (base * (0.55 + 0.45 * light)).clamp(0.0, 255.0);
    [(v * 0.85) as u8, v as u8, (v * 0.7) as u8]
}

fn draw_disk(img: &mut RgbImage, center: Vec2, radius: f32, color: [u8; 3]) {
    let (w, h) = img.dimensions();
    let r = radius.max(1.0);
    let x0 = (center.x - r).floor().max(0.0) as u32;
    let y0 = (center.y - r).floor().max(0.0) as u32;
    let x1 = ((center.x + r).ceil().max(0.0) as u32).min(w.saturating_sub(1));
    let y1 = ((center.y + r).ceil().max(0.0) as u32).min(h.saturating_sub(1));
    for y in y0..=y1 {
        for x in x0..=x1 {
            let d = Vec2::new(x as f32 + 0.5, y as f32 + 0.5).distance(center);
            if d <= r {
                img.put_pixel(x, y, Rgb(color));
            }
        }
    }
}

/// Renders the ground, the optional grounded points and every instance to a PNG.
pub fn render_to_png(
    ground: &Heightfield,
    instances: &[SpawnedInstance],
    points: &[PlacementPoint],
    config: &RenderConfig,
    path: impl AsRef<Path>,
) -> anyhow::Result<()> {
    let (w, h) = config.image_size;
    let mut img = RgbImage::new(w, h);
    for py in 0..h {
        for px in 0..w {
            let color = shade(ground, config, config.to_world(px, py));
            img.put_pixel(px, py, Rgb(color));
        }
    }

    for point in points {
        draw_disk(&mut img, config.to_pixel(point.position.xz()), 1.5, [30, 30, 30]);
    }

    let mut sorted: Vec<&SpawnedInstance> = instances.iter().collect();
    sorted.sort_by(|a, b| a.transform.scale.x.total_cmp(&b.transform.scale.x));
    for instance in sorted {
        let style = config.style(&instance.template);
        let radius = style.radius * instance.transform.scale.x.max(0.3);
        draw_disk(
            &mut img,
            config.to_pixel(instance.transform.position.xz()),
            radius,
            style.color,
        );
    }

    img.save(path.as_ref())?;
    println!("wrote {}", path.as_ref().display());
    Ok(())
}
