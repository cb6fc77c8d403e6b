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

//! CLI command definitions and argument parsing.

use crate::commands;
use crate::error::CliError;
use clap::Subcommand;

/// Top-level CLI commands.
///
/// # Examples
///
/// ```no_run
/// use clap::Parser;
/// use knnperf_cli::cli::Commands;
///
/// #[derive(Parser)]
/// struct Cli {
///     #[command(subcommand)]
///     command: Commands,
/// }
/// ```
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a performance test
    ///
    /// Loads the tool configuration, runs the selected test `num_runs` times
    /// and writes the averaged result with host metadata to OUTPUT.
    Test {
        /// Tool configuration file (YAML)
        #[arg(value_name = "CONFIG")]
        config: String,

        /// Result file to write (JSON)
        #[arg(value_name = "OUTPUT")]
        output: String,

        /// Write JSON on a single line
        #[arg(long)]
        compact: bool,
    },

    /// Diff two result documents
    ///
    /// Validates that both documents hold the same numeric `results` keys
    /// and prints `changed - base` for every key.
    Diff {
        /// Reference result document (JSON)
        #[arg(value_name = "BASE")]
        base: String,

        /// Result document compared against BASE (JSON)
        #[arg(value_name = "CHANGED")]
        changed: String,

        /// Include both `metadata` mappings in the output
        #[arg(short, long)]
        metadata: bool,

        /// Output file path (defaults to stdout)
        #[arg(short, long)]
        output: Option<String>,

        /// Write JSON on a single line
        #[arg(long)]
        compact: bool,
    },
}

impl Commands {
    /// Execute the command with the provided arguments.
    ///
    /// # Errors
    ///
    /// Returns `Err` if configuration loading, a test run, diff validation
    /// or file I/O fails.
    pub fn execute(self) -> Result<(), CliError> {
        match self {
            Commands::Test {
                config,
                output,
                compact,
            } => commands::run_test(&config, &output, compact),
            Commands::Diff {
                base,
                changed,
                metadata,
                output,
                compact,
            } => commands::diff(&base, &changed, metadata, output.as_deref(), compact),
        }
    }
}
