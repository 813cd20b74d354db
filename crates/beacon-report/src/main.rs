// Copyright 2025 RISC Zero, Inc.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.


use std::io;

use anyhow::Result;
use beacon_report::{commands::Command, config::GlobalConfig};
use clap::Parser;
use tracing_subscriber::EnvFilter;

/// Arguments of the beacon-report CLI.
#[derive(Parser, Debug)]
#[clap(
    author,
    version,
    about = "Reports over beacon chain validator data",
    arg_required_else_help = true
)]
struct MainArgs {
    /// Subcommand to run
    #[command(subcommand)]
    command: Command,

    #[command(flatten, next_help_heading = "Global Options")]
    config: GlobalConfig,
}

fn main() -> Result<()> {
    let args = MainArgs::parse();

    let filter = EnvFilter::builder()
        .with_default_directive(args.config.log_level.into())
        .from_env_lossy();

    if args.config.log_json {
        tracing_subscriber::fmt()
            .with_writer(io::stderr)
            .with_ansi(false)
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_writer(io::stderr).with_env_filter(filter).init();
    }

    args.command.run(&args.config)
}
