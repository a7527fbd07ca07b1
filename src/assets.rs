//! Icon assets. Every drawable icon is declared in one explicit manifest
//! table; lookups go by logical name, and unknown names fall back to a
//! placeholder instead of failing.

use crate::geometry::Vec2;
use crate::render::{Color, Renderer};

/// How an icon is rasterized from primitives.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IconShape {
    Square,
    Diamond,
    /// Square outline with a hollow center.
    Frame,
    /// Two crossed bars.
    Cross,
}

/// One manifest entry.
#[derive(Clone, Copy, Debug)]
pub struct IconAsset {
    pub name: &'static str,
    pub shape: IconShape,
    pub color: Color,
    /// Icon extent in screen pixels at scale 1.
    pub size: f32,
}

/// The complete icon set. Adding an icon means adding a row here; nothing
/// is discovered at runtime.
pub const MANIFEST: [IconAsset; 7] = [
    IconAsset {
        name: "shelter",
        shape: IconShape::Diamond,
        color: [255, 255, 255, 255],
        size: 10.0,
    },
    IconAsset {
        name: "gate",
        shape: IconShape::Frame,
        color: [255, 220, 120, 255],
        size: 12.0,
    },
    IconAsset {
        name: "karma_flower",
        shape: IconShape::Cross,
        color: [250, 230, 160, 255],
        size: 8.0,
    },
    IconAsset {
        name: "swarm_room",
        shape: IconShape::Diamond,
        color: [120, 200, 255, 255],
        size: 8.0,
    },
    IconAsset {
        name: "scavenger_trader",
        shape: IconShape::Cross,
        color: [220, 160, 90, 255],
        size: 9.0,
    },
    IconAsset {
        name: "creature_den",
        shape: IconShape::Square,
        color: [180, 180, 180, 255],
        size: 6.0,
    },
    IconAsset {
        name: "placeholder",
        shape: IconShape::Frame,
        color: [255, 0, 255, 255],
        size: 8.0,
    },
];

/// Look an icon up by logical name; unknown names get the placeholder.
pub fn icon(name: &str) -> &'static IconAsset {
    MANIFEST
        .iter()
        .find(|a| a.name == name)
        .unwrap_or(&MANIFEST[MANIFEST.len() - 1])
}

/// Draw an icon centered on a screen point.
pub fn draw_icon(renderer: &mut dyn Renderer, center: Vec2, asset: &IconAsset, scale: f32) {
    let size = asset.size * scale.max(0.5);
    match asset.shape {
        IconShape::Square => {
            renderer.fill_rotated_rect(center, Vec2::new(size, size), 0.0, asset.color);
        }
        IconShape::Diamond => {
            renderer.fill_rotated_rect(
                center,
                Vec2::new(size, size),
                std::f32::consts::FRAC_PI_4,
                asset.color,
            );
        }
        IconShape::Frame => {
            let thickness = (size / 5.0).max(1.0);
            let offset = size / 2.0 - thickness / 2.0;
            for (dx, dy, w, h) in [
                (0.0, -offset, size, thickness),
                (0.0, offset, size, thickness),
                (-offset, 0.0, thickness, size),
                (offset, 0.0, thickness, size),
            ] {
                renderer.fill_rotated_rect(
                    center + Vec2::new(dx, dy),
                    Vec2::new(w, h),
                    0.0,
                    asset.color,
                );
            }
        }
        IconShape::Cross => {
            let thickness = (size / 3.0).max(1.0);
            renderer.fill_rotated_rect(center, Vec2::new(size, thickness), 0.0, asset.color);
            renderer.fill_rotated_rect(center, Vec2::new(thickness, size), 0.0, asset.color);
        }
    }
}
