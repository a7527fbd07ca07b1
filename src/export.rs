//! Map export: render the loaded region off-screen and write PNGs.
//!
//! The export path drives the exact same `draw_map` call as the window, so
//! what you see is what you get. A flattened image covers every layer;
//! `export_layers` additionally writes one image per populated layer.

use std::path::{Path, PathBuf};

use image::RgbaImage;

use crate::geometry::Vec2;
use crate::render::{Camera, CaptureRenderer, Color, Renderer};
use crate::session::EditorSession;

const BACKGROUND: Color = [18, 18, 22, 255];

#[derive(Clone, Copy, Debug)]
pub struct ExportOptions {
    /// Pixels per world tile.
    pub scale: f32,
    /// World-unit padding around the map bounds.
    pub padding: f32,
    /// Hard cap on either output dimension; the scale shrinks to fit.
    pub max_dimension: u32,
}

impl Default for ExportOptions {
    fn default() -> Self {
        ExportOptions {
            scale: 4.0,
            padding: 20.0,
            max_dimension: 16384,
        }
    }
}

/// Render the session's map into an image, or `None` when nothing is
/// loaded.
pub fn render_map(session: &EditorSession, opts: &ExportOptions) -> Option<RgbaImage> {
    let bounds = session.map_bounds(opts.padding)?;

    let mut scale = opts.scale.max(0.25);
    let longest = bounds.width.max(bounds.height);
    if longest * scale > opts.max_dimension as f32 {
        scale = opts.max_dimension as f32 / longest;
    }

    let width = (bounds.width * scale).ceil().max(1.0) as u32;
    let height = (bounds.height * scale).ceil().max(1.0) as u32;
    let camera = Camera {
        position: Vec2::new(bounds.x, bounds.y),
        scale,
    };

    let mut renderer = CaptureRenderer::new(width, height);
    renderer.clear(BACKGROUND);
    session.draw_map(&mut renderer, &camera);
    Some(renderer.into_image())
}

/// Export the flattened map to `path`.
pub fn export_png(
    session: &EditorSession,
    path: &Path,
    opts: &ExportOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    let image = render_map(session, opts).ok_or("no region loaded, nothing to export")?;
    image.save(path)?;
    println!(
        "Exported {}x{} map to {}",
        image.width(),
        image.height(),
        path.display()
    );
    Ok(())
}

/// Export one image per populated layer next to `path`, suffixed
/// `-layer<N>`. Returns the written paths.
pub fn export_layers(
    session: &mut EditorSession,
    path: &Path,
    opts: &ExportOptions,
) -> Result<Vec<PathBuf>, Box<dyn std::error::Error>> {
    let layers: Vec<i32> = {
        let Some(region) = &session.region else {
            return Err("no region loaded, nothing to export".into());
        };
        let mut layers: Vec<i32> = region.rooms.iter().map(|r| r.layer).collect();
        layers.sort_unstable();
        layers.dedup();
        layers
    };

    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "map".to_string());
    let previous_layer = session.active_layer;

    let mut written = Vec::new();
    for layer in layers {
        // The active layer is drawn undimmed; everything else recedes.
        session.active_layer = layer;
        let Some(image) = render_map(session, opts) else { continue };
        let layer_path = path.with_file_name(format!("{stem}-layer{layer}.png"));
        image.save(&layer_path)?;
        written.push(layer_path);
    }
    session.active_layer = previous_layer;
    println!("Exported {} layer image(s)", written.len());
    Ok(written)
}
