//! Optimal-scale fitting.
//!
//! Given a target size in pixels, find the largest scale (pixels per user
//! unit) at which everything fits. The wrinkle is that items with pixel
//! extents occupy a fixed number of pixels regardless of scale, so the
//! occupied width
//!
//! ```text
//! w(ppu) = max_i(ppu*ref_hi[i] + px_hi[i]) - min_i(ppu*ref_lo[i] - px_lo[i])
//! ```
//!
//! is piecewise linear in ppu, not proportional to it. We enumerate the
//! scales at which the active max/min item changes (each is a pairwise
//! crossing), solve the linear equation on every interval, and keep the
//! largest root.

use crate::item::CanvasItem;

/// Occupied size in pixels along one axis at scale `ppu`.
pub(crate) fn pix_size(
    ppu: f64,
    px_lo: &[f64],
    ref_lo: &[f64],
    px_hi: &[f64],
    ref_hi: &[f64],
) -> f64 {
    let mut max_hi = f64::NEG_INFINITY;
    let mut min_lo = f64::INFINITY;
    for i in 0..px_lo.len() {
        max_hi = max_hi.max(ppu * ref_hi[i] + px_hi[i]);
        min_lo = min_lo.min(ppu * ref_lo[i] - px_lo[i]);
    }
    max_hi - min_lo
}

/// Largest ppu at which the items occupy exactly `target` pixels along
/// one axis. Returns 0.0 when no positive solution exists (for example
/// when the fixed pixel parts alone already exceed the target).
pub(crate) fn optimal_ppu(
    target: f64,
    px_lo: &[f64],
    ref_lo: &[f64],
    px_hi: &[f64],
    ref_hi: &[f64],
) -> f64 {
    let n = px_lo.len();
    debug_assert!(n > 0 && ref_lo.len() == n && px_hi.len() == n && ref_hi.len() == n);

    let mut max_ref_hi = f64::NEG_INFINITY;
    let mut min_ref_lo = f64::INFINITY;
    let mut i_max = 0;
    let mut i_min = 0;

    // Scales at which the slope of w(ppu) changes: where two items swap
    // roles as the extreme one on either side.
    let mut critical = Vec::with_capacity(n * (n - 1) + 1);
    critical.push(0.0);

    for i in 0..n {
        if ref_hi[i] > max_ref_hi {
            max_ref_hi = ref_hi[i];
            i_max = i;
        }
        if ref_lo[i] < min_ref_lo {
            min_ref_lo = ref_lo[i];
            i_min = i;
        }
        for j in i + 1..n {
            // ppu*ref_lo[i] - px_lo[i] == ppu*ref_lo[j] - px_lo[j]
            if ref_lo[i] != ref_lo[j] {
                let ppu = (px_lo[i] - px_lo[j]) / (ref_lo[i] - ref_lo[j]);
                if ppu > 0.0 {
                    critical.push(ppu);
                }
            }
            // ppu*ref_hi[i] + px_hi[i] == ppu*ref_hi[j] + px_hi[j]
            if ref_hi[i] != ref_hi[j] {
                let ppu = (px_hi[j] - px_hi[i]) / (ref_hi[i] - ref_hi[j]);
                if ppu > 0.0 {
                    critical.push(ppu);
                }
            }
        }
    }
    critical.sort_by(f64::total_cmp);

    // w is linear between consecutive critical scales, so a sign change
    // of w - target brackets a root we can find by interpolation.
    let mut best = 0.0_f64;
    for pair in critical.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        let wa = pix_size(a, px_lo, ref_lo, px_hi, ref_hi);
        let wb = pix_size(b, px_lo, ref_lo, px_hi, ref_hi);
        if (wa - target) * (wb - target) <= 0.0 {
            let ppu = if (wb - wa).abs() < f64::EPSILON {
                b
            } else {
                a + (target - wa) * (b - a) / (wb - wa)
            };
            if ppu >= a && ppu <= b && ppu > best {
                best = ppu;
            }
        }
    }

    // Beyond the last critical scale only the extreme reference points
    // matter:  target = ppu*(ref_hi[i_max] - ref_lo[i_min]) + fixed part.
    let denom = max_ref_hi - min_ref_lo;
    if denom > 0.0 {
        let ppu = (target - px_hi[i_max] - px_lo[i_min]) / denom;
        if critical.last().is_some_and(|&last| ppu > last) && ppu > best {
            best = ppu;
        }
    }

    best
}

/// Per-axis extent data gathered from items.
struct AxisData {
    px_lo: Vec<f64>,
    ref_lo: Vec<f64>,
    px_hi: Vec<f64>,
    ref_hi: Vec<f64>,
}

/// The ppu that makes the given items exactly fill a `xsize` by `ysize`
/// pixel target, taking the smaller of the per-axis answers so both fit.
/// Returns 1.0 when there are no items or no positive solution.
pub(crate) fn filled_ppu<'a>(
    items: impl Iterator<Item = &'a dyn CanvasItem>,
    xsize: f64,
    ysize: f64,
) -> f64 {
    let mut x = AxisData {
        px_lo: Vec::new(),
        ref_lo: Vec::new(),
        px_hi: Vec::new(),
        ref_hi: Vec::new(),
    };
    let mut y = AxisData {
        px_lo: Vec::new(),
        ref_lo: Vec::new(),
        px_hi: Vec::new(),
        ref_hi: Vec::new(),
    };
    for item in items {
        let bb = item.bare_bbox();
        if bb.is_empty() {
            continue;
        }
        let ext = item.pixel_extents();
        x.ref_lo.push(bb.min().x);
        x.ref_hi.push(bb.max().x);
        x.px_lo.push(ext.left);
        x.px_hi.push(ext.right);
        y.ref_lo.push(bb.min().y);
        y.ref_hi.push(bb.max().y);
        y.px_lo.push(ext.down);
        y.px_hi.push(ext.up);
    }
    if x.ref_lo.is_empty() {
        return 1.0;
    }
    let ppu_x = optimal_ppu(xsize, &x.px_lo, &x.ref_lo, &x.px_hi, &x.ref_hi);
    let ppu_y = optimal_ppu(ysize, &y.px_lo, &y.ref_lo, &y.px_hi, &y.ref_hi);
    let ppu = ppu_x.min(ppu_y);
    if ppu > 0.0 && ppu.is_finite() {
        ppu
    } else {
        1.0
    }
}
