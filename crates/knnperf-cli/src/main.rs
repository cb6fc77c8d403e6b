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

//! KNNPerf Command Line Interface

use clap::Parser;
use knnperf_cli::cli::Commands;
use std::process::ExitCode;
use tracing::error;
use tracing_subscriber::EnvFilter;

/// KNNPerf - k-NN performance tool
///
/// Runs profiled index and query tests against OpenSearch or an embedded
/// flat index, and diffs the resulting reports.
///
/// # Examples
///
/// ```bash
/// # Run a test and write the report
/// knnperf test tool.yml result.json
///
/// # Compare two reports
/// knnperf diff base.json changed.json --metadata
/// ```
#[derive(Parser)]
#[command(name = "knnperf")]
#[command(author, version, about = "KNNPerf - k-NN performance tool", long_about = None)]
struct Cli {
    /// Log debug output (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

fn init_logging(verbose: bool) {
    let directive = if verbose {
        "knnperf=debug"
    } else {
        "knnperf=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command.execute() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "command failed");
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
