//! Named result arrays produced by stream processing.

use std::collections::BTreeMap;

use ndarray::{Array1, Array2, ArrayD, Ix1, Ix2};
use serde::{Deserialize, Serialize};

use crate::error::{RuntimeError, RuntimeResult};

/// Results of a completed job, keyed by the stream output name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultHandles {
    arrays: BTreeMap<String, ArrayD<f64>>,
    /// Wall-clock execution time, if the runtime measured it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub execution_time_ms: Option<u64>,
}

impl ResultHandles {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, array: ArrayD<f64>) {
        self.arrays.insert(name.into(), array);
    }

    /// Set the execution time.
    #[must_use]
    pub fn with_execution_time(mut self, ms: u64) -> Self {
        self.execution_time_ms = Some(ms);
        self
    }

    /// Fetch a result by name.
    pub fn get(&self, name: &str) -> RuntimeResult<&ArrayD<f64>> {
        self.arrays
            .get(name)
            .ok_or_else(|| RuntimeError::MissingResult(name.to_string()))
    }

    /// Fetch a one-dimensional result.
    pub fn fetch_1d(&self, name: &str) -> RuntimeResult<Array1<f64>> {
        self.get(name)?
            .clone()
            .into_dimensionality::<Ix1>()
            .map_err(|e| RuntimeError::Stream {
                stream: name.to_string(),
                reason: e.to_string(),
            })
    }

    /// Fetch a two-dimensional result.
    pub fn fetch_2d(&self, name: &str) -> RuntimeResult<Array2<f64>> {
        self.get(name)?
            .clone()
            .into_dimensionality::<Ix2>()
            .map_err(|e| RuntimeError::Stream {
                stream: name.to_string(),
                reason: e.to_string(),
            })
    }

    /// Names of all available results, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.arrays.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.arrays.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arrays.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::IxDyn;

    #[test]
    fn test_fetch_2d() {
        let mut handles = ResultHandles::new();
        handles.insert("res", ArrayD::zeros(IxDyn(&[2, 5])));

        let res = handles.fetch_2d("res").unwrap();
        assert_eq!(res.dim(), (2, 5));
        assert!(handles.fetch_1d("res").is_err());
    }

    #[test]
    fn test_missing_result() {
        let handles = ResultHandles::new();
        assert!(matches!(
            handles.get("res"),
            Err(RuntimeError::MissingResult(name)) if name == "res"
        ));
    }

    #[test]
    fn test_serialize_roundtrip() {
        let mut handles = ResultHandles::new().with_execution_time(12);
        handles.insert("t", ArrayD::from_shape_vec(IxDyn(&[3]), vec![0.0, 1.0, 2.0]).unwrap());

        let json = serde_json::to_string(&handles).unwrap();
        let back: ResultHandles = serde_json::from_str(&json).unwrap();
        assert_eq!(back, handles);
        assert_eq!(back.names().collect::<Vec<_>>(), vec!["t"]);
    }
}
