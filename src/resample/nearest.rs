use super::{scale, source_coord, Resampler};
use crate::frame::FrameView;
use crate::raster::Raster;

/// Nearest-neighbor resize with pixel-center alignment.
pub struct Nearest;

/// Source index for destination index `d`, rounded half to even and clamped.
fn nearest_index(d: usize, scale: f64, len: usize) -> usize {
    let s = source_coord(d, scale).round_ties_even();
    s.clamp(0.0, (len - 1) as f64) as usize
}

impl Resampler for Nearest {
    fn name(&self) -> &'static str {
        "nearest"
    }

    fn resample(&self, view: &FrameView<'_>, dst: &mut Raster) {
        let scale_x = scale(view.width(), dst.width());
        let scale_y = scale(view.height(), dst.height());
        let columns: Vec<usize> = (0..dst.width() as usize)
            .map(|dx| nearest_index(dx, scale_x, view.width()) * 3)
            .collect();

        let stride = dst.stride();
        for (dy, dst_row) in dst.data_mut().chunks_mut(stride).enumerate() {
            let src_row = view.row(nearest_index(dy, scale_y, view.height()));
            for (dst_px, &sx) in dst_row.chunks_exact_mut(3).zip(&columns) {
                dst_px.copy_from_slice(&src_row[sx..sx + 3]);
            }
        }
    }
}
