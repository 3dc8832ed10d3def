use super::{scale, source_coord, Resampler};
use crate::frame::FrameView;
use crate::raster::Raster;

const B: f64 = 1.0 / 3.0;
const C: f64 = 1.0 / 3.0;

/// Mitchell–Netravali cubic kernel with B = C = 1/3.
pub fn mitchell_netravali(x: f64) -> f64 {
    let x = x.abs();
    if x < 1.0 {
        ((12.0 - 9.0 * B - 6.0 * C) * x * x * x + (-18.0 + 12.0 * B + 6.0 * C) * x * x
            + (6.0 - 2.0 * B))
            / 6.0
    } else if x < 2.0 {
        ((-B - 6.0 * C) * x * x * x
            + (6.0 * B + 30.0 * C) * x * x
            + (-12.0 * B - 48.0 * C) * x
            + (8.0 * B + 24.0 * C))
            / 6.0
    } else {
        0.0
    }
}

/// Four clamped source indices `floor(s) - 1 ..= floor(s) + 2` and their weights.
#[derive(Clone, Copy, Debug)]
struct CubicTaps {
    index: [usize; 4],
    weight: [f64; 4],
}

fn cubic_taps(d: usize, scale: f64, len: usize) -> CubicTaps {
    let s = source_coord(d, scale);
    let base = s.floor();
    let f = s - base;
    let base = base as isize;
    let last = len as isize - 1;

    let mut index = [0usize; 4];
    for (i, slot) in index.iter_mut().enumerate() {
        *slot = (base - 1 + i as isize).clamp(0, last) as usize;
    }
    CubicTaps {
        index,
        weight: [
            mitchell_netravali(1.0 + f),
            mitchell_netravali(f),
            mitchell_netravali(1.0 - f),
            mitchell_netravali(2.0 - f),
        ],
    }
}

#[inline]
fn to_channel(value: f64) -> u8 {
    value.round_ties_even().clamp(0.0, 255.0) as u8
}

/// Separable bicubic resize over a clamp-to-edge 4x4 neighborhood.
pub struct Bicubic;

impl Resampler for Bicubic {
    fn name(&self) -> &'static str {
        "bicubic"
    }

    fn resample(&self, view: &FrameView<'_>, dst: &mut Raster) {
        let scale_x = scale(view.width(), dst.width());
        let scale_y = scale(view.height(), dst.height());
        let columns: Vec<CubicTaps> = (0..dst.width() as usize)
            .map(|dx| cubic_taps(dx, scale_x, view.width()))
            .collect();

        let stride = dst.stride();
        for (dy, dst_row) in dst.data_mut().chunks_mut(stride).enumerate() {
            let rows = cubic_taps(dy, scale_y, view.height());
            let src_rows = rows.index.map(|y| view.row(y));

            for (dst_px, column) in dst_row.chunks_exact_mut(3).zip(&columns) {
                let mut acc = [0.0f64; 3];
                for (src_row, wy) in src_rows.iter().zip(rows.weight) {
                    let mut horizontal = [0.0f64; 3];
                    for (&x, wx) in column.index.iter().zip(column.weight) {
                        let px = &src_row[x * 3..x * 3 + 3];
                        for c in 0..3 {
                            horizontal[c] += px[c] as f64 * wx;
                        }
                    }
                    for c in 0..3 {
                        acc[c] += horizontal[c] * wy;
                    }
                }
                for c in 0..3 {
                    dst_px[c] = to_channel(acc[c]);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resample::test_support::frame_from_fn;
    use crate::resample::{resample_view, ResizeFilter};

    #[test]
    fn kernel_values_at_integer_offsets() {
        assert!((mitchell_netravali(0.0) - 8.0 / 9.0).abs() < 1e-12);
        assert!((mitchell_netravali(1.0) - 1.0 / 18.0).abs() < 1e-12);
        assert!((mitchell_netravali(-1.0) - 1.0 / 18.0).abs() < 1e-12);
        assert_eq!(mitchell_netravali(2.0), 0.0);
        assert_eq!(mitchell_netravali(3.5), 0.0);
    }

    #[test]
    fn weights_sum_to_one() {
        for step in 0..=20 {
            let f = step as f64 / 20.0;
            let sum: f64 = [1.0 + f, f, 1.0 - f, 2.0 - f]
                .iter()
                .map(|&x| mitchell_netravali(x))
                .sum();
            assert!((sum - 1.0).abs() < 1e-12, "sum {sum} at f={f}");
        }
    }

    #[test]
    fn taps_clamp_to_edge() {
        let taps = cubic_taps(0, 1.0, 3);
        assert_eq!(taps.index, [0, 0, 1, 2]);
        let taps = cubic_taps(2, 1.0, 3);
        assert_eq!(taps.index, [1, 2, 2, 2]);
    }

    #[test]
    fn identity_on_uniform_frame() {
        let (geometry, data) = frame_from_fn(5, 5, |_, _| [12, 200, 255]);
        let view = FrameView::new(geometry, &data).unwrap();
        let raster = resample_view(&view, 5, 5, ResizeFilter::Bicubic).unwrap();
        for y in 0..5 {
            for x in 0..5 {
                assert_eq!(raster.pixel(x, y), [12, 200, 255]);
            }
        }
    }

    #[test]
    fn identity_blends_neighbors_with_mitchell_weights() {
        // single bright column: B = 1/3 makes the kernel smooth rather than interpolating
        let (geometry, data) = frame_from_fn(5, 1, |x, _| [if x == 2 { 180 } else { 0 }, 0, 0]);
        let view = FrameView::new(geometry, &data).unwrap();
        let raster = resample_view(&view, 5, 1, ResizeFilter::Bicubic).unwrap();
        let row: Vec<u8> = (0..5).map(|x| raster.pixel(x, 0)[0]).collect();
        assert_eq!(row, vec![0, 10, 160, 10, 0]);
    }

    #[test]
    fn horizontal_gradient_keeps_orientation() {
        let (geometry, data) = frame_from_fn(2, 8, |_, y| [0, 0, y as u8 * 30]);
        let view = FrameView::new(geometry, &data).unwrap();
        let raster = resample_view(&view, 2, 4, ResizeFilter::Bicubic).unwrap();
        let column: Vec<u8> = (0..4).map(|y| raster.pixel(0, y)[2]).collect();
        assert!(column.windows(2).all(|pair| pair[0] < pair[1]), "{column:?}");
    }
}
