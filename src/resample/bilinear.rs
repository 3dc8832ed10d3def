use super::{scale, source_coord, Resampler};
use crate::frame::FrameView;
use crate::raster::Raster;

/// Bilinear resize over the 2x2 neighborhood below each mapped center.
pub struct Bilinear;

/// Lower/upper source indices and the weight of the upper one.
#[derive(Clone, Copy, Debug, PartialEq)]
struct Tap {
    lo: usize,
    hi: usize,
    weight: f64,
}

fn bilinear_tap(d: usize, scale: f64, len: usize) -> Tap {
    let s = source_coord(d, scale);
    let last = len as isize - 1;
    let mut lo = s.floor() as isize;
    let mut weight = s - lo as f64;
    let mut hi = lo + 1;

    if lo < 0 {
        lo = 0;
        hi = 0;
        weight = 0.0;
    }
    if hi > last {
        hi = last;
        lo = lo.min(hi);
    }
    Tap {
        lo: lo as usize,
        hi: hi as usize,
        weight,
    }
}

/// Round half up by truncation, then clamp.
#[inline]
fn to_channel(value: f64) -> u8 {
    ((value + 0.5) as i32).clamp(0, 255) as u8
}

impl Resampler for Bilinear {
    fn name(&self) -> &'static str {
        "bilinear"
    }

    fn resample(&self, view: &FrameView<'_>, dst: &mut Raster) {
        let scale_x = scale(view.width(), dst.width());
        let scale_y = scale(view.height(), dst.height());
        let columns: Vec<Tap> = (0..dst.width() as usize)
            .map(|dx| bilinear_tap(dx, scale_x, view.width()))
            .collect();

        let stride = dst.stride();
        for (dy, dst_row) in dst.data_mut().chunks_mut(stride).enumerate() {
            let rows = bilinear_tap(dy, scale_y, view.height());
            let row0 = view.row(rows.lo);
            let row1 = view.row(rows.hi);
            let wy = rows.weight;

            for (dst_px, column) in dst_row.chunks_exact_mut(3).zip(&columns) {
                let wx = column.weight;
                let k00 = (1.0 - wx) * (1.0 - wy);
                let k10 = wx * (1.0 - wy);
                let k01 = (1.0 - wx) * wy;
                let k11 = wx * wy;

                let x0 = column.lo * 3;
                let x1 = column.hi * 3;
                for c in 0..3 {
                    let value = row0[x0 + c] as f64 * k00
                        + row0[x1 + c] as f64 * k10
                        + row1[x0 + c] as f64 * k01
                        + row1[x1 + c] as f64 * k11;
                    dst_px[c] = to_channel(value);
                }
            }
        }
    }
}
