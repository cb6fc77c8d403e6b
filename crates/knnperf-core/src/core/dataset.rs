// Dweve KNNPerf - k-NN Performance Tool
//
// Copyright (c) 2025 Dweve IP B.V. and individual contributors.
//
// SPDX-License-Identifier: Apache-2.0
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE file at the
// root of this repository or at: http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Vector datasets used by the tests.

use crate::error::{PerfError, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Train/test vector sets.
///
/// `train` vectors are ingested into the index, `test` vectors are issued
/// as queries.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Dataset {
    /// Vectors to index.
    pub train: Vec<Vec<f32>>,
    /// Vectors to query with.
    #[serde(default)]
    pub test: Vec<Vec<f32>>,
}

impl Dataset {
    /// Creates a dataset and checks its shape.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `train` is empty or the vectors do
    /// not share one dimension.
    pub fn new(train: Vec<Vec<f32>>, test: Vec<Vec<f32>>) -> Result<Self> {
        let dataset = Self { train, test };
        dataset.validate()?;
        Ok(dataset)
    }

    /// Loads a dataset file in the given format.
    ///
    /// `json` is always available. `hdf5` reads the `train` and `test`
    /// datasets of an ann-benchmarks style file and needs the `hdf5`
    /// feature.
    pub fn load(path: &Path, format: &str) -> Result<Self> {
        match format {
            "json" => {
                let content =
                    fs::read_to_string(path).map_err(|e| PerfError::io_error(path, e))?;
                Self::from_json_str(&content)
            }
            #[cfg(feature = "hdf5")]
            "hdf5" => Self::from_hdf5(path),
            #[cfg(not(feature = "hdf5"))]
            "hdf5" => Err(PerfError::configuration(
                "dataset_format `hdf5` requires knnperf to be built with the `hdf5` feature",
            )),
            other => Err(PerfError::configuration(format!(
                "Unsupported dataset_format `{}`. Supported formats: json, hdf5",
                other
            ))),
        }
    }

    #[cfg(feature = "hdf5")]
    fn from_hdf5(path: &Path) -> Result<Self> {
        let invalid = |e: hdf5::Error| {
            PerfError::configuration(format!("Invalid hdf5 dataset '{}': {}", path.display(), e))
        };
        let file = hdf5::File::open(path).map_err(invalid)?;
        let train = read_matrix(&file, "train").map_err(invalid)?;
        let test = if file.link_exists("test") {
            read_matrix(&file, "test").map_err(invalid)?
        } else {
            Vec::new()
        };
        Self::new(train, test)
    }

    /// Parses a `{"train": [[..]], "test": [[..]]}` document.
    pub fn from_json_str(content: &str) -> Result<Self> {
        let dataset: Dataset = serde_json::from_str(content)
            .map_err(|e| PerfError::configuration(format!("Invalid dataset: {}", e)))?;
        dataset.validate()?;
        Ok(dataset)
    }

    /// Returns the dimension shared by every vector.
    pub fn dimension(&self) -> usize {
        self.train.first().map_or(0, Vec::len)
    }

    fn validate(&self) -> Result<()> {
        let dimension = self.dimension();
        if dimension == 0 {
            return Err(PerfError::configuration(
                "Invalid dataset: `train` must contain at least one non-empty vector",
            ));
        }

        let sets = [("train", &self.train), ("test", &self.test)];
        for (name, vectors) in sets {
            if let Some(position) = vectors.iter().position(|v| v.len() != dimension) {
                return Err(PerfError::configuration(format!(
                    "Invalid dataset: {}[{}] has dimension {}, expected {}",
                    name,
                    position,
                    vectors[position].len(),
                    dimension
                )));
            }
        }
        Ok(())
    }
}

/// Reads a two dimensional float dataset as one vector per row.
#[cfg(feature = "hdf5")]
fn read_matrix(file: &hdf5::File, name: &str) -> hdf5::Result<Vec<Vec<f32>>> {
    let dataset = file.dataset(name)?;
    let shape = dataset.shape();
    if shape.len() != 2 {
        return Err(format!("`{}` must be two dimensional, found shape {:?}", name, shape).into());
    }
    let values = dataset.read_raw::<f32>()?;
    Ok(values.chunks(shape[1].max(1)).map(<[f32]>::to_vec).collect())
}
