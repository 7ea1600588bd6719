//! Frame composition: surfaces, the CPU rasterizer, subtitles and the draw-loop handle.

/// `vello_cpu` raster surface.
pub mod cpu;
/// Draw-loop scheduling handle.
pub mod draw_loop;
/// Frame renderer and rendered frame type.
pub mod frame;
/// Caption box overlay.
pub mod subtitle;
/// Drawing target capability.
pub mod surface;
