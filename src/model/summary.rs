//! Tagged scalar, histogram and image summaries
//!
//! JSON has no NaN or infinity: serde_json writes them as `null`, and every
//! float here reads `null` back as NaN so a diverged run stays readable.

use crate::autograd::Tensor;
use serde::{Deserialize, Deserializer, Serialize};

fn nullable_f32<'de, D: Deserializer<'de>>(d: D) -> Result<f32, D::Error> {
    Ok(Option::<f32>::deserialize(d)?.unwrap_or(f32::NAN))
}

fn nullable_f32s<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<f32>, D::Error> {
    let values = Vec::<Option<f32>>::deserialize(d)?;
    Ok(values.into_iter().map(|v| v.unwrap_or(f32::NAN)).collect())
}

/// Distribution statistics of a tensor
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Histogram {
    #[serde(deserialize_with = "nullable_f32")]
    pub min: f32,
    #[serde(deserialize_with = "nullable_f32")]
    pub max: f32,
    #[serde(deserialize_with = "nullable_f32")]
    pub mean: f32,
    #[serde(deserialize_with = "nullable_f32")]
    pub std: f32,
    pub count: usize,
}

impl Histogram {
    /// Population statistics; all zero for an empty slice
    pub fn from_values(values: &[f32]) -> Self {
        if values.is_empty() {
            return Self { min: 0.0, max: 0.0, mean: 0.0, std: 0.0, count: 0 };
        }
        let n = values.len() as f32;
        let mean = values.iter().sum::<f32>() / n;
        let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f32>() / n;
        Self {
            min: values.iter().copied().fold(f32::INFINITY, f32::min),
            max: values.iter().copied().fold(f32::NEG_INFINITY, f32::max),
            mean,
            std: var.sqrt(),
            count: values.len(),
        }
    }
}

/// One single-channel image, row-major
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Image {
    pub height: usize,
    pub width: usize,
    #[serde(deserialize_with = "nullable_f32s")]
    pub pixels: Vec<f32>,
}

impl Image {
    /// First channel of the first example of an NHWC batch
    ///
    /// Anything that is not a non-empty rank-4 tensor gives an empty image.
    pub fn first_of_batch(tensor: &Tensor) -> Self {
        let &[n, h, w, c] = tensor.shape() else {
            return Self { height: 0, width: 0, pixels: Vec::new() };
        };
        if n == 0 || c == 0 {
            return Self { height: 0, width: 0, pixels: Vec::new() };
        }
        let data = tensor.data();
        let pixels = (0..h * w).map(|i| data[i * c]).collect();
        Self { height: h, width: w, pixels }
    }
}

/// Value recorded under a tag
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SummaryValue {
    Scalar(#[serde(deserialize_with = "nullable_f32")] f32),
    Histogram(Histogram),
    Image(Image),
}

/// Ordered collection of tagged values emitted by one step
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    values: Vec<(String, SummaryValue)>,
}

impl Summary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the value of a scalar tensor
    pub fn scalar(&mut self, tag: impl Into<String>, value: f32) {
        self.values.push((tag.into(), SummaryValue::Scalar(value)));
    }

    /// Record the distribution of a tensor's values
    pub fn histogram(&mut self, tag: impl Into<String>, tensor: &Tensor) {
        let stats = Histogram::from_values(&tensor.to_vec());
        self.values.push((tag.into(), SummaryValue::Histogram(stats)));
    }

    /// Record the first slice of an NHWC batch
    pub fn image(&mut self, tag: impl Into<String>, tensor: &Tensor) {
        self.values.push((tag.into(), SummaryValue::Image(Image::first_of_batch(tensor))));
    }

    /// Concatenate summaries, keeping their order
    pub fn merge(summaries: impl IntoIterator<Item = Summary>) -> Self {
        Self { values: summaries.into_iter().flat_map(|s| s.values).collect() }
    }

    pub fn get(&self, tag: &str) -> Option<&SummaryValue> {
        self.values.iter().find(|(t, _)| t == tag).map(|(_, v)| v)
    }

    /// Scalar recorded under `tag`
    pub fn get_scalar(&self, tag: &str) -> Option<f32> {
        match self.get(tag)? {
            SummaryValue::Scalar(v) => Some(*v),
            SummaryValue::Histogram(_) | SummaryValue::Image(_) => None,
        }
    }

    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.values.iter().map(|(t, _)| t.as_str())
    }

    pub fn values(&self) -> &[(String, SummaryValue)] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
