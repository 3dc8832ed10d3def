use crate::error::{invalid, Result};
use crate::frame::{FrameGeometry, FrameView};
use crate::raster::Raster;

/// Reject factors that do not evenly divide both frame dimensions.
pub fn check_block_factor(geometry: FrameGeometry, n: u32) -> Result<()> {
    if n == 0 {
        return Err(invalid("block factor must be positive"));
    }
    if geometry.width() % n != 0 || geometry.height() % n != 0 {
        return Err(invalid(format!(
            "block factor {n} does not divide {}x{}",
            geometry.width(),
            geometry.height()
        )));
    }
    Ok(())
}

/// Exact box filter: each destination pixel is the mean of one `n x n` source block.
///
/// Channel means round half up: `(sum + area / 2) / area`.
pub fn downscale_by_block(view: &FrameView<'_>, n: u32) -> Result<Raster> {
    view.require_rgb24()?;
    check_block_factor(view.geometry(), n)?;

    let n = n as usize;
    let out_width = view.width() / n;
    let out_height = view.height() / n;
    let mut raster = Raster::new(out_width as u32, out_height as u32)?;

    let area = (n * n) as u64;
    let half = area / 2;
    let block_bytes = n * 3;
    let stride = raster.stride();

    for (oy, dst_row) in raster.data_mut().chunks_mut(stride).enumerate() {
        for (ox, dst_px) in dst_row.chunks_exact_mut(3).take(out_width).enumerate() {
            let mut sums = [0u64; 3];
            let left = ox * block_bytes;
            for ky in 0..n {
                let src = &view.row(oy * n + ky)[left..left + block_bytes];
                for px in src.chunks_exact(3) {
                    sums[0] += px[0] as u64;
                    sums[1] += px[1] as u64;
                    sums[2] += px[2] as u64;
                }
            }
            for (channel, sum) in dst_px.iter_mut().zip(sums) {
                *channel = ((sum + half) / area) as u8;
            }
        }
    }
    Ok(raster)
}
