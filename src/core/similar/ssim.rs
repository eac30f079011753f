//! Structural similarity over 8-bit grayscale images.
//!
//! Uniform 7x7 window, sample covariance, K1 = 0.01, K2 = 0.03 and a data
//! range of 255. Only windows that lie fully inside the image are averaged.
//! Window sums are kept with a separable sliding box, so memory grows with
//! the image width only.

use crate::error::HashError;
use image::GrayImage;

/// Side of the square window
pub const WINDOW: usize = 7;

const K1: f64 = 0.01;
const K2: f64 = 0.03;
const DATA_RANGE: f64 = 255.0;

/// Running sums for one window: a, b, a², b², ab
type Sums = [u64; 5];

/// Mean SSIM of two equally sized grayscale images, in 0..=1 (can dip below 0).
pub fn ssim(a: &GrayImage, b: &GrayImage) -> Result<f64, HashError> {
    if a.dimensions() != b.dimensions() {
        return Err(HashError::ComputationFailed(format!(
            "SSIM needs equal sizes, got {:?} and {:?}",
            a.dimensions(),
            b.dimensions()
        )));
    }

    let width = a.width() as usize;
    let height = a.height() as usize;

    if width < WINDOW || height < WINDOW {
        return Err(HashError::ComputationFailed(format!(
            "image {}x{} is smaller than the {}x{} SSIM window",
            width, height, WINDOW, WINDOW
        )));
    }

    let out_width = width - WINDOW + 1;
    let pixels_a = a.as_raw();
    let pixels_b = b.as_raw();

    // Horizontal sums of the last WINDOW rows, plus their vertical totals.
    let mut ring: Vec<Sums> = vec![[0; 5]; WINDOW * out_width];
    let mut columns: Vec<Sums> = vec![[0; 5]; out_width];

    let mut total = 0.0;
    let mut count = 0usize;

    for y in 0..height {
        let slot = (y % WINDOW) * out_width;
        let row_a = &pixels_a[y * width..(y + 1) * width];
        let row_b = &pixels_b[y * width..(y + 1) * width];
        let mut run: Sums = [0; 5];

        for x in 0..width {
            add(&mut run, row_a[x], row_b[x]);
            if x >= WINDOW {
                sub(&mut run, row_a[x - WINDOW], row_b[x - WINDOW]);
            }

            if x + 1 >= WINDOW {
                let ox = x + 1 - WINDOW;
                let expired = ring[slot + ox];
                for k in 0..5 {
                    columns[ox][k] = columns[ox][k] - expired[k] + run[k];
                }
                ring[slot + ox] = run;
            }
        }

        if y + 1 >= WINDOW {
            for sums in &columns {
                total += window_ssim(sums);
                count += 1;
            }
        }
    }

    Ok(total / count as f64)
}

fn add(sums: &mut Sums, a: u8, b: u8) {
    let (a, b) = (a as u64, b as u64);
    sums[0] += a;
    sums[1] += b;
    sums[2] += a * a;
    sums[3] += b * b;
    sums[4] += a * b;
}

fn sub(sums: &mut Sums, a: u8, b: u8) {
    let (a, b) = (a as u64, b as u64);
    sums[0] -= a;
    sums[1] -= b;
    sums[2] -= a * a;
    sums[3] -= b * b;
    sums[4] -= a * b;
}

fn window_ssim(sums: &Sums) -> f64 {
    let n = (WINDOW * WINDOW) as f64;
    let cov_norm = n / (n - 1.0);
    let c1 = (K1 * DATA_RANGE).powi(2);
    let c2 = (K2 * DATA_RANGE).powi(2);

    let mean_a = sums[0] as f64 / n;
    let mean_b = sums[1] as f64 / n;
    let var_a = cov_norm * (sums[2] as f64 / n - mean_a * mean_a);
    let var_b = cov_norm * (sums[3] as f64 / n - mean_b * mean_b);
    let cov = cov_norm * (sums[4] as f64 / n - mean_a * mean_b);

    ((2.0 * mean_a * mean_b + c1) * (2.0 * cov + c2))
        / ((mean_a * mean_a + mean_b * mean_b + c1) * (var_a + var_b + c2))
}
