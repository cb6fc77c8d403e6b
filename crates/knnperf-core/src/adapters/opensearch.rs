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

//! Blocking HTTP client for an OpenSearch cluster.

use crate::adapters::SearchEngine;
use crate::core::config::OpenSearchConfig;
use crate::error::{PerfError, Result};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

const SERVICE: &str = "opensearch";

/// Content type required by the `_bulk` endpoint.
pub const NDJSON_CONTENT_TYPE: &str = "application/x-ndjson";

/// [`SearchEngine`] backed by the OpenSearch REST API.
#[derive(Debug)]
pub struct OpenSearchClient {
    agent: ureq::Agent,
    endpoint: String,
}

impl OpenSearchClient {
    /// Creates a client for `endpoint` with a per-request timeout.
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        let endpoint = endpoint.into().trim_end_matches('/').to_string();
        Self { agent, endpoint }
    }

    /// Creates a client from a service configuration.
    pub fn from_config(config: &OpenSearchConfig) -> Self {
        Self::new(&config.endpoint, Duration::from_secs(config.timeout_secs))
    }

    /// Base URL requests are sent to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.endpoint, path.trim_start_matches('/'))
    }

    fn send(&self, method: &str, path: &str, body: Option<&Value>) -> Result<Value> {
        let url = self.url(path);
        debug!(method, url = %url, "sending request");
        let request = self.agent.request(method, &url);
        let response = match body {
            Some(body) => request.send_json(body),
            None => request.call(),
        };
        read_response(response)
    }
}

fn read_response(response: std::result::Result<ureq::Response, ureq::Error>) -> Result<Value> {
    match response {
        Ok(response) => response
            .into_json()
            .map_err(|e| PerfError::adapter(SERVICE, format!("invalid JSON response: {}", e))),
        Err(ureq::Error::Status(code, response)) => {
            let body = response.into_string().unwrap_or_default();
            Err(PerfError::adapter(
                SERVICE,
                format!("request failed with status {}: {}", code, body),
            ))
        }
        Err(ureq::Error::Transport(transport)) => {
            Err(PerfError::adapter(SERVICE, transport.to_string()))
        }
    }
}

impl SearchEngine for OpenSearchClient {
    fn put_cluster_settings(&mut self, settings: &Value) -> Result<Value> {
        self.send("PUT", "_cluster/settings", Some(settings))
    }

    fn create_index(&mut self, index: &str, body: &Value) -> Result<Value> {
        self.send("PUT", index, Some(body))
    }

    fn bulk(&mut self, ndjson: &str) -> Result<Value> {
        let url = self.url("_bulk");
        debug!(url = %url, bytes = ndjson.len(), "sending bulk request");
        let response = self
            .agent
            .post(&url)
            .set("Content-Type", NDJSON_CONTENT_TYPE)
            .send_string(ndjson);
        read_response(response)
    }

    fn refresh(&mut self, index: &str) -> Result<Value> {
        self.send("POST", &format!("{}/_refresh", index), None)
    }

    fn search(&mut self, index: &str, body: &Value) -> Result<Value> {
        self.send("POST", &format!("{}/_search", index), Some(body))
    }

    fn delete_index(&mut self, index: &str) -> Result<Value> {
        self.send("DELETE", index, None)
    }
}
