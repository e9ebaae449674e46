//! Stream processing.
//!
//! Values saved by `Measure`/`Save` instructions are collected per stream in
//! program order. A [`StreamSpec`] describes how the runtime reduces one such
//! stream into a named array:
//!
//! ```text
//!   counts ──→ AverageChunks(n_avg) ──→ Buffer([seqs, depths]) ──→ save("res")
//!   state  ──→ BooleanToInt ──→ Buffer([n_v, n_t]) ──→ Average ──→ save("state")
//! ```
//!
//! The stream is a sequence of *items*: scalars until a `Buffer` stage groups
//! them into fixed-shape arrays. `save` keeps the last item, `save_all` keeps
//! every item stacked along a new leading axis.

use ndarray::{ArrayD, Axis, IxDyn};
use serde::{Deserialize, Serialize};

use crate::error::{RuntimeError, RuntimeResult};

/// One stage of a stream pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "stage", content = "arg", rename_all = "snake_case")]
pub enum StreamStage {
    /// Map every non-zero value to 1 and zero to 0.
    BooleanToInt,
    /// Replace each run of `n` consecutive scalars by its mean.
    AverageChunks(usize),
    /// Group consecutive items into arrays of the given shape.
    Buffer(Vec<usize>),
    /// Average all items into a single item.
    Average,
}

/// How the final items are kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SaveMode {
    /// Keep only the last item.
    Last,
    /// Keep all items, stacked along a new leading axis.
    All,
}

/// Description of how a saved stream is reduced to a named result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamSpec {
    source: String,
    stages: Vec<StreamStage>,
    name: String,
    mode: SaveMode,
}

/// Intermediate representation while a pipeline runs.
enum Items {
    Scalars(Vec<f64>),
    Arrays {
        shape: Vec<usize>,
        items: Vec<ArrayD<f64>>,
    },
}

impl StreamSpec {
    /// Start a pipeline reading from the stream `source`.
    ///
    /// The result name defaults to the source name until `save`/`save_all`
    /// is called.
    pub fn new(source: impl Into<String>) -> Self {
        let source = source.into();
        Self {
            name: source.clone(),
            source,
            stages: Vec::new(),
            mode: SaveMode::Last,
        }
    }

    #[must_use]
    pub fn boolean_to_int(mut self) -> Self {
        self.stages.push(StreamStage::BooleanToInt);
        self
    }

    /// Equivalent of `buffer(n).map(average)`.
    #[must_use]
    pub fn average_chunks(mut self, n: usize) -> Self {
        self.stages.push(StreamStage::AverageChunks(n));
        self
    }

    #[must_use]
    pub fn buffer(mut self, shape: &[usize]) -> Self {
        self.stages.push(StreamStage::Buffer(shape.to_vec()));
        self
    }

    #[must_use]
    pub fn average(mut self) -> Self {
        self.stages.push(StreamStage::Average);
        self
    }

    /// Keep the last item under `name`.
    #[must_use]
    pub fn save(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self.mode = SaveMode::Last;
        self
    }

    /// Keep every item under `name`.
    #[must_use]
    pub fn save_all(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self.mode = SaveMode::All;
        self
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn stages(&self) -> &[StreamStage] {
        &self.stages
    }

    pub fn mode(&self) -> SaveMode {
        self.mode
    }

    /// Run the pipeline over the values saved to the source stream.
    pub fn process(&self, values: &[f64]) -> RuntimeResult<ArrayD<f64>> {
        let mut items = Items::Scalars(values.to_vec());
        for stage in &self.stages {
            items = self.apply(stage, items)?;
        }
        self.finish(items)
    }

    fn apply(&self, stage: &StreamStage, items: Items) -> RuntimeResult<Items> {
        match (stage, items) {
            (StreamStage::BooleanToInt, Items::Scalars(values)) => Ok(Items::Scalars(
                values
                    .into_iter()
                    .map(|v| if v != 0.0 { 1.0 } else { 0.0 })
                    .collect(),
            )),
            (StreamStage::BooleanToInt, Items::Arrays { shape, items }) => Ok(Items::Arrays {
                shape,
                items: items
                    .into_iter()
                    .map(|a| a.mapv(|v| if v != 0.0 { 1.0 } else { 0.0 }))
                    .collect(),
            }),
            (StreamStage::AverageChunks(n), Items::Scalars(values)) => {
                if *n == 0 || values.len() % n != 0 {
                    return Err(self.error(format!(
                        "{} values cannot be averaged in chunks of {n}",
                        values.len()
                    )));
                }
                Ok(Items::Scalars(
                    values
                        .chunks(*n)
                        .map(|c| c.iter().sum::<f64>() / *n as f64)
                        .collect(),
                ))
            }
            (StreamStage::AverageChunks(_), Items::Arrays { .. }) => {
                Err(self.error("chunk averaging applies to scalars only".into()))
            }
            (StreamStage::Buffer(shape), Items::Scalars(values)) => {
                let size: usize = shape.iter().product();
                if size == 0 || values.len() % size != 0 {
                    return Err(self.error(format!(
                        "{} values do not fill buffers of shape {shape:?}",
                        values.len()
                    )));
                }
                let items = values
                    .chunks(size)
                    .map(|chunk| ArrayD::from_shape_vec(IxDyn(shape), chunk.to_vec()))
                    .collect::<Result<Vec<_>, _>>()
                    .map_err(|e| self.error(e.to_string()))?;
                Ok(Items::Arrays {
                    shape: shape.clone(),
                    items,
                })
            }
            (StreamStage::Buffer(_), Items::Arrays { .. }) => {
                Err(self.error("nested buffers are not supported".into()))
            }
            (StreamStage::Average, Items::Scalars(values)) => {
                if values.is_empty() {
                    return Err(self.error("cannot average an empty stream".into()));
                }
                let mean = values.iter().sum::<f64>() / values.len() as f64;
                Ok(Items::Scalars(vec![mean]))
            }
            (StreamStage::Average, Items::Arrays { shape, items }) => {
                let count = items.len();
                let mut acc = ArrayD::<f64>::zeros(IxDyn(&shape));
                for item in &items {
                    acc = acc + item;
                }
                if count == 0 {
                    return Err(self.error("cannot average an empty stream".into()));
                }
                Ok(Items::Arrays {
                    shape,
                    items: vec![acc / count as f64],
                })
            }
        }
    }

    fn finish(&self, items: Items) -> RuntimeResult<ArrayD<f64>> {
        match (self.mode, items) {
            (SaveMode::Last, Items::Scalars(values)) => values
                .last()
                .map(|v| ArrayD::from_elem(IxDyn(&[]), *v))
                .ok_or_else(|| self.error("no values saved".into())),
            (SaveMode::All, Items::Scalars(values)) => {
                ArrayD::from_shape_vec(IxDyn(&[values.len()]), values)
                    .map_err(|e| self.error(e.to_string()))
            }
            (SaveMode::Last, Items::Arrays { items, .. }) => items
                .into_iter()
                .last()
                .ok_or_else(|| self.error("no buffers filled".into())),
            (SaveMode::All, Items::Arrays { items, .. }) => {
                if items.is_empty() {
                    return Err(self.error("no buffers filled".into()));
                }
                let views: Vec<_> = items.iter().map(ArrayD::view).collect();
                ndarray::stack(Axis(0), &views).map_err(|e| self.error(e.to_string()))
            }
        }
    }

    fn error(&self, reason: String) -> RuntimeError {
        RuntimeError::Stream {
            stream: self.name.clone(),
            reason,
        }
    }
}
