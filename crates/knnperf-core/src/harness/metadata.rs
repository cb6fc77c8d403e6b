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

//! Host and run metadata attached to every tool result.

use serde::{Deserialize, Serialize};
use sysinfo::System;

/// Timestamp layout used in tool results.
pub const DATE_FORMAT: &str = "%m/%d/%Y %H:%M:%S";

/// Description of the test and the machine it ran on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunMetadata {
    /// Configured test name.
    pub test_name: String,
    /// Configured numeric test identifier.
    pub test_id: u32,
    /// Local time the result was produced.
    pub date: String,
    /// Name and version of this tool.
    pub tool_version: String,
    /// Operating system and architecture.
    pub os_version: String,
    /// Processor brand and logical core count.
    pub processor: String,
    /// Used, available and total memory in bytes.
    pub memory: String,
}

impl RunMetadata {
    /// Collects metadata for the named test from the current host.
    pub fn collect(test_name: impl Into<String>, test_id: u32) -> Self {
        let mut system = System::new();
        system.refresh_memory();
        system.refresh_cpu_all();

        let os_version = format!(
            "{}-{}",
            System::long_os_version().unwrap_or_else(|| std::env::consts::OS.to_string()),
            std::env::consts::ARCH
        );

        let cores = match system.cpus().len() {
            0 => std::thread::available_parallelism().map_or(1, |n| n.get()),
            n => n,
        };
        let brand = system
            .cpus()
            .first()
            .map(|cpu| cpu.brand().trim().to_string())
            .filter(|brand| !brand.is_empty())
            .unwrap_or_else(|| std::env::consts::ARCH.to_string());

        Self {
            test_name: test_name.into(),
            test_id,
            date: chrono::Local::now().format(DATE_FORMAT).to_string(),
            tool_version: format!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")),
            os_version,
            processor: format!("{}, {} cores", brand, cores),
            memory: format!(
                "{} (used) / {} (available) / {} (total)",
                system.used_memory(),
                system.available_memory(),
                system.total_memory()
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collect_fills_every_field() {
        let metadata = RunMetadata::collect("index-test", 3);

        assert_eq!(metadata.test_name, "index-test");
        assert_eq!(metadata.test_id, 3);
        assert!(chrono::NaiveDateTime::parse_from_str(&metadata.date, DATE_FORMAT).is_ok());
        assert!(metadata.tool_version.starts_with("knnperf-core "));
        assert!(metadata.os_version.ends_with(std::env::consts::ARCH));
        assert!(metadata.processor.ends_with(" cores"));
        assert!(metadata.memory.contains("(available)"));
    }
}
