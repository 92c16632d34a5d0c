//! 2-D convolution and per-channel bias

use super::{nhwc, result_of};
use crate::autograd::{BackwardOp, Tensor};
use ndarray::Array1;
use std::rc::Rc;

/// Geometry of a stride-1, SAME-padded convolution
#[derive(Clone, Copy)]
struct ConvGeometry {
    n: usize,
    h: usize,
    w: usize,
    cin: usize,
    kh: usize,
    kw: usize,
    cout: usize,
    pad_top: usize,
    pad_left: usize,
}

impl ConvGeometry {
    /// Visit every (input index, kernel index, output index) triple
    fn for_each(&self, mut f: impl FnMut(usize, usize, usize)) {
        let g = *self;
        for b in 0..g.n {
            for y in 0..g.h {
                for x in 0..g.w {
                    let out_base = ((b * g.h + y) * g.w + x) * g.cout;
                    for i in 0..g.kh {
                        let Some(iy) = (y + i).checked_sub(g.pad_top).filter(|&v| v < g.h) else {
                            continue;
                        };
                        for j in 0..g.kw {
                            let Some(ix) = (x + j).checked_sub(g.pad_left).filter(|&v| v < g.w)
                            else {
                                continue;
                            };
                            let in_base = ((b * g.h + iy) * g.w + ix) * g.cin;
                            let k_base = (i * g.kw + j) * g.cin * g.cout;
                            for ci in 0..g.cin {
                                for co in 0..g.cout {
                                    f(in_base + ci, k_base + ci * g.cout + co, out_base + co);
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}

/// Convolve an NHWC input with an HWIO kernel, stride 1, SAME padding
///
/// # Panics
///
/// Panics if the input is not rank 4, the kernel is not rank 4, or the
/// channel counts disagree.
pub fn conv2d(input: &Tensor, kernel: &Tensor) -> Tensor {
    let (n, h, w, cin) = nhwc(input, "conv2d");
    let (kh, kw, kcin, cout) = match *kernel.shape() {
        [kh, kw, ci, co] => (kh, kw, ci, co),
        ref other => panic!("conv2d expects an HWIO kernel, got shape {other:?}"),
    };
    assert_eq!(cin, kcin, "conv2d: input has {cin} channels, kernel expects {kcin}");

    let geometry =
        ConvGeometry { n, h, w, cin, kh, kw, cout, pad_top: (kh - 1) / 2, pad_left: (kw - 1) / 2 };
    let x = input.to_vec();
    let k = kernel.to_vec();
    let mut out = vec![0.0f32; n * h * w * cout];
    geometry.for_each(|xi, ki, oi| out[oi] += x[xi] * k[ki]);

    result_of(Array1::from(out), vec![n, h, w, cout], &[input, kernel], || {
        Rc::new(Conv2dBackward {
            input: input.clone(),
            kernel: kernel.clone(),
            input_data: x,
            kernel_data: k,
            geometry,
        })
    })
}

struct Conv2dBackward {
    input: Tensor,
    kernel: Tensor,
    input_data: Vec<f32>,
    kernel_data: Vec<f32>,
    geometry: ConvGeometry,
}

impl BackwardOp for Conv2dBackward {
    fn inputs(&self) -> Vec<Tensor> {
        vec![self.input.clone(), self.kernel.clone()]
    }

    fn backward(&self, grad: &Array1<f32>) -> Vec<Option<Array1<f32>>> {
        let g = grad.to_vec();
        let grad_input = self.input.requires_grad().then(|| {
            let mut gi = vec![0.0f32; self.input_data.len()];
            self.geometry.for_each(|xi, ki, oi| gi[xi] += g[oi] * self.kernel_data[ki]);
            Array1::from(gi)
        });
        let grad_kernel = self.kernel.requires_grad().then(|| {
            let mut gk = vec![0.0f32; self.kernel_data.len()];
            self.geometry.for_each(|xi, ki, oi| gk[ki] += g[oi] * self.input_data[xi]);
            Array1::from(gk)
        });
        vec![grad_input, grad_kernel]
    }
}

/// Add a per-channel bias to an NHWC tensor
pub fn bias_add(input: &Tensor, bias: &Tensor) -> Tensor {
    let (_, _, _, c) = nhwc(input, "bias_add");
    assert_eq!(bias.shape(), &[c], "bias_add: bias must have one value per channel");

    let b = bias.to_vec();
    let mut data = input.data().clone();
    for (i, v) in data.iter_mut().enumerate() {
        *v += b[i % c];
    }
    result_of(data, input.shape().to_vec(), &[input, bias], || {
        Rc::new(BiasAddBackward { input: input.clone(), bias: bias.clone(), channels: c })
    })
}

struct BiasAddBackward {
    input: Tensor,
    bias: Tensor,
    channels: usize,
}

impl BackwardOp for BiasAddBackward {
    fn inputs(&self) -> Vec<Tensor> {
        vec![self.input.clone(), self.bias.clone()]
    }

    fn backward(&self, grad: &Array1<f32>) -> Vec<Option<Array1<f32>>> {
        let mut grad_bias = Array1::zeros(self.channels);
        for (i, g) in grad.iter().enumerate() {
            grad_bias[i % self.channels] += g;
        }
        vec![Some(grad.clone()), Some(grad_bias)]
    }
}
