//! Spatial operations on NHWC tensors: finite differences, channel concat, pooling

use super::{nhwc, result_of};
use crate::autograd::{BackwardOp, Tensor};
use ndarray::Array1;
use std::rc::Rc;

/// Spatial axis of an NHWC tensor
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SpatialAxis {
    /// Vertical (rows)
    Height,
    /// Horizontal (columns)
    Width,
}

/// Forward finite difference along a spatial axis
///
/// For `Height`, `out[b, y, x, c] = in[b, y + 1, x, c] - in[b, y, x, c]` and the
/// output has one row fewer than the input; an axis of length 0 or 1 yields an
/// empty tensor.
pub fn spatial_diff(input: &Tensor, axis: SpatialAxis) -> Tensor {
    let (n, h, w, c) = nhwc(input, "spatial_diff");
    let (oh, ow, step) = match axis {
        SpatialAxis::Height => (h.saturating_sub(1), w, w * c),
        SpatialAxis::Width => (h, w.saturating_sub(1), c),
    };

    let pairs: Vec<(usize, usize)> = (0..n)
        .flat_map(|b| (0..oh).map(move |y| (b, y)))
        .flat_map(|(b, y)| (0..ow).map(move |x| (b, y, x)))
        .flat_map(|(b, y, x)| {
            let base = ((b * h + y) * w + x) * c;
            (0..c).map(move |ch| (base + ch, base + ch + step))
        })
        .collect();

    let x = input.data();
    let data: Array1<f32> = pairs.iter().map(|&(lo, hi)| x[hi] - x[lo]).collect();
    drop(x);

    result_of(data, vec![n, oh, ow, c], &[input], || {
        Rc::new(SpatialDiffBackward { input: input.clone(), pairs })
    })
}

struct SpatialDiffBackward {
    input: Tensor,
    pairs: Vec<(usize, usize)>,
}

impl BackwardOp for SpatialDiffBackward {
    fn inputs(&self) -> Vec<Tensor> {
        vec![self.input.clone()]
    }

    fn backward(&self, grad: &Array1<f32>) -> Vec<Option<Array1<f32>>> {
        let mut gi = Array1::zeros(self.input.len());
        for (g, &(lo, hi)) in grad.iter().zip(&self.pairs) {
            gi[hi] += g;
            gi[lo] -= g;
        }
        vec![Some(gi)]
    }
}

/// Concatenate two NHWC tensors along the channel axis
pub fn concat_channels(a: &Tensor, b: &Tensor) -> Tensor {
    let (n, h, w, ca) = nhwc(a, "concat_channels");
    let (bn, bh, bw, cb) = nhwc(b, "concat_channels");
    assert_eq!((n, h, w), (bn, bh, bw), "concat_channels: batch and spatial dims must match");

    let pixels = n * h * w;
    let mut data = Vec::with_capacity(pixels * (ca + cb));
    {
        let ad = a.data();
        let bd = b.data();
        for p in 0..pixels {
            data.extend(ad.iter().skip(p * ca).take(ca));
            data.extend(bd.iter().skip(p * cb).take(cb));
        }
    }

    result_of(Array1::from(data), vec![n, h, w, ca + cb], &[a, b], || {
        Rc::new(ConcatBackward { a: a.clone(), b: b.clone(), ca, cb })
    })
}

struct ConcatBackward {
    a: Tensor,
    b: Tensor,
    ca: usize,
    cb: usize,
}

impl BackwardOp for ConcatBackward {
    fn inputs(&self) -> Vec<Tensor> {
        vec![self.a.clone(), self.b.clone()]
    }

    fn backward(&self, grad: &Array1<f32>) -> Vec<Option<Array1<f32>>> {
        let c = self.ca + self.cb;
        let (ga, gb): (Vec<(usize, f32)>, Vec<(usize, f32)>) =
            grad.iter().enumerate().map(|(i, &g)| (i % c, g)).partition(|&(ch, _)| ch < self.ca);
        vec![
            Some(ga.into_iter().map(|(_, g)| g).collect()),
            Some(gb.into_iter().map(|(_, g)| g).collect()),
        ]
    }
}

/// Average over the spatial axes: `[n, h, w, c]` → `[n, 1, 1, c]`
pub fn global_avg_pool(input: &Tensor) -> Tensor {
    let (n, h, w, c) = nhwc(input, "global_avg_pool");
    let area = h * w;
    let factor = if area == 0 { 0.0 } else { 1.0 / area as f32 };

    let mut out = Array1::zeros(n * c);
    for (i, v) in input.data().iter().enumerate() {
        let b = i / (area * c).max(1);
        out[b * c + i % c] += v * factor;
    }

    result_of(out, vec![n, 1, 1, c], &[input], || {
        Rc::new(PoolBackward { input: input.clone(), area, channels: c, factor })
    })
}

struct PoolBackward {
    input: Tensor,
    area: usize,
    channels: usize,
    factor: f32,
}

impl BackwardOp for PoolBackward {
    fn inputs(&self) -> Vec<Tensor> {
        vec![self.input.clone()]
    }

    fn backward(&self, grad: &Array1<f32>) -> Vec<Option<Array1<f32>>> {
        let c = self.channels;
        let per_example = (self.area * c).max(1);
        let gi = (0..self.input.len())
            .map(|i| grad[(i / per_example) * c + i % c] * self.factor)
            .collect();
        vec![Some(gi)]
    }
}
