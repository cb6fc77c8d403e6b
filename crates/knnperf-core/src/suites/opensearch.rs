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

//! Index and query tests against a search cluster.

use crate::adapters::SearchEngine;
use crate::core::config::OpenSearchConfig;
use crate::core::dataset::Dataset;
use crate::core::measure::Measure;
use crate::error::Result;
use crate::harness::lifecycle::PerfTest;
use crate::harness::step::{Step, StepResult};
use serde_json::{json, Value};
use tracing::warn;

/// Cluster setting controlling k-NN graph build parallelism.
pub const INDEX_THREAD_QTY_SETTING: &str = "knn.algo_param.index_thread_qty";

/// Partitions `vectors` into newline-delimited bulk request bodies.
///
/// Partitions take the first `bulk_size` vectors, then the next, and so on;
/// the last one may be shorter. Each vector becomes an index action line
/// followed by a document line holding the vector under `field`.
pub fn bulk_transform(
    index: &str,
    field: &str,
    vectors: &[Vec<f32>],
    bulk_size: usize,
) -> Result<Vec<String>> {
    let action = serde_json::to_string(&json!({ "index": { "_index": index } }))?;

    vectors
        .chunks(bulk_size.max(1))
        .map(|partition| {
            let mut body = String::new();
            for vector in partition {
                let document = serde_json::to_string(&json!({ field: vector }))?;
                body.push_str(&action);
                body.push('\n');
                body.push_str(&document);
                body.push('\n');
            }
            Ok(body)
        })
        .collect()
}

/// Search body for a k-NN query of `vector` on `field`.
pub fn query_body(field: &str, vector: &[f32], k: usize) -> Value {
    json!({
        "size": k,
        "query": {
            "knn": {
                field: {
                    "vector": vector,
                    "k": k
                }
            }
        }
    })
}

/// Cluster handle and index bookkeeping shared by both tests.
struct Fixture<'a, E> {
    engine: E,
    config: &'a OpenSearchConfig,
    dataset: &'a Dataset,
    measures: &'a [Measure],
    bulk_bodies: Vec<String>,
    index_created: bool,
}

impl<'a, E: SearchEngine> Fixture<'a, E> {
    fn new(
        engine: E,
        config: &'a OpenSearchConfig,
        dataset: &'a Dataset,
        measures: &'a [Measure],
    ) -> Self {
        Self {
            engine,
            config,
            dataset,
            measures,
            bulk_bodies: Vec::new(),
            index_created: false,
        }
    }

    fn prepare(&mut self) -> Result<()> {
        let settings = json!({
            "transient": { INDEX_THREAD_QTY_SETTING: self.config.index_thread_qty }
        });
        self.engine.put_cluster_settings(&settings)?;
        self.bulk_bodies = bulk_transform(
            &self.config.index_name,
            &self.config.field_name,
            &self.dataset.train,
            self.config.bulk_size,
        )?;
        Ok(())
    }

    fn create_index(&mut self) -> Result<Value> {
        let response = self
            .engine
            .create_index(&self.config.index_name, &self.config.index_spec)?;
        self.index_created = true;
        Ok(response)
    }

    fn drop_index(&mut self) -> Result<()> {
        if self.index_created {
            self.engine.delete_index(&self.config.index_name)?;
            self.index_created = false;
        }
        Ok(())
    }
}

fn check_bulk(response: Value) -> Value {
    if response.get("errors").and_then(Value::as_bool) == Some(true) {
        warn!("bulk response reported item errors");
    }
    response
}

/// Creates an index, bulk ingests the train vectors and refreshes.
pub struct OpenSearchIndexTest<'a, E> {
    fixture: Fixture<'a, E>,
}

impl<'a, E: SearchEngine> OpenSearchIndexTest<'a, E> {
    /// Creates the test around an engine handle.
    pub fn new(
        engine: E,
        config: &'a OpenSearchConfig,
        dataset: &'a Dataset,
        measures: &'a [Measure],
    ) -> Self {
        Self {
            fixture: Fixture::new(engine, config, dataset, measures),
        }
    }
}

impl<E: SearchEngine> PerfTest for OpenSearchIndexTest<'_, E> {
    fn name(&self) -> &str {
        "opensearch_index"
    }

    fn setup(&mut self) -> Result<()> {
        self.fixture.prepare()
    }

    fn run_steps(&mut self) -> Result<Vec<StepResult>> {
        let fixture = &mut self.fixture;
        let mut results = Vec::with_capacity(fixture.bulk_bodies.len() + 2);

        let create_index = Step::new("create_index", fixture.measures)?;
        results.push(create_index.execute(|| fixture.create_index())?);

        let bulk_add = Step::new("bulk_add", fixture.measures)?;
        for body in &fixture.bulk_bodies {
            let engine = &mut fixture.engine;
            results.push(bulk_add.execute(|| engine.bulk(body).map(check_bulk))?);
        }

        let index = fixture.config.index_name.as_str();
        let engine = &mut fixture.engine;
        let refresh_index = Step::new("refresh_index", fixture.measures)?;
        results.push(refresh_index.execute(|| engine.refresh(index))?);
        Ok(results)
    }

    fn cleanup(&mut self) -> Result<()> {
        self.fixture.drop_index()
    }
}

/// Runs k-NN queries for every test vector against a prepared index.
pub struct OpenSearchQueryTest<'a, E> {
    fixture: Fixture<'a, E>,
}

impl<'a, E: SearchEngine> OpenSearchQueryTest<'a, E> {
    /// Creates the test around an engine handle.
    pub fn new(
        engine: E,
        config: &'a OpenSearchConfig,
        dataset: &'a Dataset,
        measures: &'a [Measure],
    ) -> Self {
        Self {
            fixture: Fixture::new(engine, config, dataset, measures),
        }
    }
}

impl<E: SearchEngine> PerfTest for OpenSearchQueryTest<'_, E> {
    fn name(&self) -> &str {
        "opensearch_query"
    }

    fn setup(&mut self) -> Result<()> {
        let fixture = &mut self.fixture;
        fixture.prepare()?;
        fixture.create_index()?;
        for body in &fixture.bulk_bodies {
            check_bulk(fixture.engine.bulk(body)?);
        }
        fixture.engine.refresh(&fixture.config.index_name)?;
        Ok(())
    }

    fn run_steps(&mut self) -> Result<Vec<StepResult>> {
        let fixture = &mut self.fixture;
        let config = fixture.config;
        let dataset = fixture.dataset;
        let step = Step::new("query_index", fixture.measures)?;

        dataset
            .test
            .iter()
            .map(|vector| {
                let body = query_body(&config.field_name, vector, config.k);
                let engine = &mut fixture.engine;
                step.execute(|| engine.search(&config.index_name, &body))
            })
            .collect()
    }

    fn cleanup(&mut self) -> Result<()> {
        self.fixture.drop_index()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PerfError;
    use crate::harness::lifecycle::TestExecution;

    #[derive(Default)]
    struct FakeEngine {
        calls: Vec<String>,
        bulk_bodies: Vec<String>,
        searches: Vec<Value>,
        fail_search: bool,
    }

    impl SearchEngine for FakeEngine {
        fn put_cluster_settings(&mut self, settings: &Value) -> Result<Value> {
            self.calls.push(format!("settings {}", settings));
            Ok(json!({"acknowledged": true}))
        }

        fn create_index(&mut self, index: &str, _body: &Value) -> Result<Value> {
            self.calls.push(format!("create {}", index));
            Ok(json!({"acknowledged": true}))
        }

        fn bulk(&mut self, ndjson: &str) -> Result<Value> {
            self.calls.push("bulk".to_string());
            self.bulk_bodies.push(ndjson.to_string());
            Ok(json!({"took": 7, "errors": false}))
        }

        fn refresh(&mut self, index: &str) -> Result<Value> {
            self.calls.push(format!("refresh {}", index));
            Ok(json!({"_shards": {"total": 1}}))
        }

        fn search(&mut self, _index: &str, body: &Value) -> Result<Value> {
            self.calls.push("search".to_string());
            if self.fail_search {
                return Err(PerfError::adapter("opensearch", "search rejected"));
            }
            self.searches.push(body.clone());
            Ok(json!({"took": 3, "hits": {"hits": []}}))
        }

        fn delete_index(&mut self, index: &str) -> Result<Value> {
            self.calls.push(format!("delete {}", index));
            Ok(json!({"acknowledged": true}))
        }
    }

    fn dataset() -> Dataset {
        Dataset::new(
            vec![vec![1.0, 0.0], vec![0.0, 1.0], vec![1.0, 1.0]],
            vec![vec![0.5, 0.5], vec![0.0, 0.0]],
        )
        .unwrap()
    }

    fn config() -> OpenSearchConfig {
        OpenSearchConfig {
            index_name: "vectors".to_string(),
            bulk_size: 2,
            k: 3,
            ..OpenSearchConfig::default()
        }
    }

    #[test]
    fn test_bulk_transform_partitions() {
        let vectors = vec![vec![1.0], vec![2.0], vec![3.0]];
        let bodies = bulk_transform("idx", "v", &vectors, 2).unwrap();

        assert_eq!(bodies.len(), 2);
        assert_eq!(
            bodies[0],
            "{\"index\":{\"_index\":\"idx\"}}\n{\"v\":[1.0]}\n{\"index\":{\"_index\":\"idx\"}}\n{\"v\":[2.0]}\n"
        );
        assert_eq!(bodies[1], "{\"index\":{\"_index\":\"idx\"}}\n{\"v\":[3.0]}\n");
    }

    #[test]
    fn test_bulk_transform_empty() {
        assert!(bulk_transform("idx", "v", &[], 10).unwrap().is_empty());
    }

    #[test]
    fn test_query_body_shape() {
        let body = query_body("test_vector", &[1.0, 2.0], 5);
        assert_eq!(
            body,
            json!({
                "size": 5,
                "query": {"knn": {"test_vector": {"vector": [1.0, 2.0], "k": 5}}}
            })
        );
    }

    #[test]
    fn test_index_test_steps() {
        let config = config();
        let dataset = dataset();
        let test = OpenSearchIndexTest::new(FakeEngine::default(), &config, &dataset, &[Measure::Took]);
        let mut execution = TestExecution::new(test, &[Measure::Took]);

        let aggregate = execution.execute().unwrap();
        let engine = &execution.test().fixture.engine;

        assert_eq!(
            engine.calls,
            vec![
                format!("settings {}", json!({"transient": {INDEX_THREAD_QTY_SETTING: 1}})),
                "create vectors".to_string(),
                "bulk".to_string(),
                "bulk".to_string(),
                "refresh vectors".to_string(),
                "delete vectors".to_string(),
            ]
        );
        assert_eq!(engine.bulk_bodies[1].lines().count(), 2);
        // Native bulk timings are kept.
        assert_eq!(aggregate.get("bulk_add_took_total"), Some(14.0));
        assert!(aggregate.contains_key("create_index_took_total"));
        assert!(aggregate.contains_key("refresh_index_took_p50"));
    }

    #[test]
    fn test_query_test_steps() {
        let config = config();
        let dataset = dataset();
        let test = OpenSearchQueryTest::new(FakeEngine::default(), &config, &dataset, &[Measure::Took]);
        let mut execution = TestExecution::new(test, &[Measure::Took]);

        let aggregate = execution.execute().unwrap();
        let engine = &execution.test().fixture.engine;

        assert_eq!(engine.searches.len(), 2);
        assert_eq!(engine.searches[0]["size"], json!(3));
        assert_eq!(aggregate.get("query_index_took_total"), Some(6.0));
        assert_eq!(aggregate.get("test_took"), Some(6.0));
        assert!(!aggregate.contains_key("bulk_add_took_total"));
        assert_eq!(engine.calls.last().map(String::as_str), Some("delete vectors"));
    }

    #[test]
    fn test_index_dropped_after_failed_query() {
        let config = config();
        let dataset = dataset();
        let engine = FakeEngine {
            fail_search: true,
            ..FakeEngine::default()
        };
        let test = OpenSearchQueryTest::new(engine, &config, &dataset, &[Measure::Took]);
        let mut execution = TestExecution::new(test, &[Measure::Took]);

        let err = execution.execute().unwrap_err();
        assert_eq!(err, PerfError::adapter("opensearch", "search rejected"));
        let calls = &execution.test().fixture.engine.calls;
        assert_eq!(calls.last().map(String::as_str), Some("delete vectors"));
    }

    #[test]
    fn test_no_delete_without_index() {
        let config = config();
        let dataset = dataset();
        let mut test = OpenSearchIndexTest::new(FakeEngine::default(), &config, &dataset, &[]);
        test.cleanup().unwrap();
        assert!(test.fixture.engine.calls.is_empty());
    }
}
