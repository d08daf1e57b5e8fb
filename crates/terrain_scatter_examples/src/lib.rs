#![forbid(unsafe_code)]

mod rendering;
mod terrain;

pub use rendering::{render_to_png, MarkerStyle, RenderConfig};
pub use terrain::{hills, print_stats, TerrainConfig};
