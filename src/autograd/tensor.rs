//! Shaped tensor with shared storage and an optional backward edge

use super::BackwardOp;
use ndarray::Array1;
use std::cell::{Ref, RefCell};
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicUsize, Ordering};

static NEXT_ID: AtomicUsize = AtomicUsize::new(0);

/// Identity of a tensor node in the computational graph
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TensorId(usize);

impl TensorId {
    fn next() -> Self {
        Self(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

struct Inner {
    id: TensorId,
    data: RefCell<Array1<f32>>,
    shape: Vec<usize>,
    requires_grad: bool,
    backward_op: Option<Rc<dyn BackwardOp>>,
}

/// Tensor with row-major `f32` storage and an explicit shape
///
/// Cloning a tensor is cheap and shares storage: a parameter held by a network
/// and the same parameter captured by a graph node see the same values, so an
/// optimizer update through one handle is visible through all of them.
///
/// Image batches use the NHWC layout `[batch, height, width, channels]`.
#[derive(Clone)]
pub struct Tensor {
    inner: Rc<Inner>,
}

impl Tensor {
    /// Create a 1-D tensor from an array
    pub fn new(data: Array1<f32>, requires_grad: bool) -> Self {
        let shape = vec![data.len()];
        Self::build(data, shape, requires_grad, None)
    }

    /// Create a 1-D tensor from a vector
    pub fn from_vec(data: Vec<f32>, requires_grad: bool) -> Self {
        Self::new(Array1::from(data), requires_grad)
    }

    /// Create a tensor with an explicit shape
    ///
    /// # Panics
    ///
    /// Panics if the number of elements does not match the shape.
    pub fn from_shape_vec(shape: &[usize], data: Vec<f32>, requires_grad: bool) -> Self {
        assert_eq!(
            shape.iter().product::<usize>(),
            data.len(),
            "shape {shape:?} does not match {} elements",
            data.len()
        );
        Self::build(Array1::from(data), shape.to_vec(), requires_grad, None)
    }

    /// Create a zero-filled tensor
    pub fn zeros(shape: &[usize], requires_grad: bool) -> Self {
        let n: usize = shape.iter().product();
        Self::build(Array1::zeros(n), shape.to_vec(), requires_grad, None)
    }

    /// Create a scalar constant
    pub fn scalar(value: f32) -> Self {
        Self::build(Array1::from(vec![value]), vec![1], false, None)
    }

    /// Create the result of a differentiable operation
    pub(crate) fn from_op(data: Array1<f32>, shape: Vec<usize>, op: Rc<dyn BackwardOp>) -> Self {
        Self::build(data, shape, true, Some(op))
    }

    /// Create a constant with a given shape from raw storage
    pub(crate) fn constant(data: Array1<f32>, shape: Vec<usize>) -> Self {
        Self::build(data, shape, false, None)
    }

    fn build(
        data: Array1<f32>,
        shape: Vec<usize>,
        requires_grad: bool,
        backward_op: Option<Rc<dyn BackwardOp>>,
    ) -> Self {
        debug_assert_eq!(shape.iter().product::<usize>(), data.len());
        Self {
            inner: Rc::new(Inner {
                id: TensorId::next(),
                data: RefCell::new(data),
                shape,
                requires_grad,
                backward_op,
            }),
        }
    }

    /// Node identity
    pub fn id(&self) -> TensorId {
        self.inner.id
    }

    /// Borrow the flat storage
    pub fn data(&self) -> Ref<'_, Array1<f32>> {
        self.inner.data.borrow()
    }

    /// Copy the flat storage into a vector
    pub fn to_vec(&self) -> Vec<f32> {
        self.inner.data.borrow().to_vec()
    }

    /// Replace the stored values, keeping the shape
    ///
    /// # Panics
    ///
    /// Panics if the element count changes.
    pub fn set_data(&self, data: Array1<f32>) {
        assert_eq!(data.len(), self.len(), "set_data cannot change the element count");
        *self.inner.data.borrow_mut() = data;
    }

    /// Shape of the tensor
    pub fn shape(&self) -> &[usize] {
        &self.inner.shape
    }

    /// Number of elements
    pub fn len(&self) -> usize {
        self.inner.data.borrow().len()
    }

    /// True when the tensor holds no elements
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Value of a single-element tensor
    ///
    /// # Panics
    ///
    /// Panics if the tensor does not hold exactly one element.
    pub fn item(&self) -> f32 {
        let data = self.data();
        assert_eq!(data.len(), 1, "item() requires a single-element tensor");
        data[0]
    }

    /// Whether gradients flow to this tensor
    pub fn requires_grad(&self) -> bool {
        self.inner.requires_grad
    }

    /// Operation that produced this tensor, if it is differentiable
    pub fn backward_op(&self) -> Option<Rc<dyn BackwardOp>> {
        self.inner.backward_op.clone()
    }

    /// Copy of this tensor cut off from the graph
    pub fn detach(&self) -> Self {
        Self::constant(self.data().clone(), self.shape().to_vec())
    }

    /// True when any element is NaN
    pub fn has_nan(&self) -> bool {
        self.data().iter().any(|v| v.is_nan())
    }
}

impl fmt::Debug for Tensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tensor")
            .field("id", &self.inner.id)
            .field("shape", &self.inner.shape)
            .field("requires_grad", &self.inner.requires_grad)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clone_shares_storage() {
        let a = Tensor::from_vec(vec![1.0, 2.0], true);
        let b = a.clone();
        a.set_data(Array1::from(vec![3.0, 4.0]));
        assert_eq!(b.to_vec(), vec![3.0, 4.0]);
        assert_eq!(a.id(), b.id());
    }

    #[test]
    fn test_detach_copies() {
        let a = Tensor::from_shape_vec(&[1, 2], vec![1.0, 2.0], true);
        let d = a.detach();
        a.set_data(Array1::from(vec![0.0, 0.0]));
        assert_eq!(d.to_vec(), vec![1.0, 2.0]);
        assert_eq!(d.shape(), &[1, 2]);
        assert!(!d.requires_grad());
        assert_ne!(a.id(), d.id());
    }

    #[test]
    #[should_panic(expected = "does not match")]
    fn test_shape_mismatch_panics() {
        let _ = Tensor::from_shape_vec(&[2, 2], vec![1.0], false);
    }

    #[test]
    fn test_scalar_item() {
        assert_eq!(Tensor::scalar(2.5).item(), 2.5);
    }

    #[test]
    fn test_has_nan() {
        assert!(Tensor::from_vec(vec![1.0, f32::NAN], false).has_nan());
        assert!(!Tensor::zeros(&[3], false).has_nan());
    }
}
