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


//! Reports over already-fetched beacon chain validator data.
//!
//! Each subcommand reads one JSON API response from a file or standard input, runs it through
//! [beacon_rewards] and prints a human readable report on standard output. Logs go to standard
//! error.

pub mod commands;
pub mod config;
pub mod display;
pub mod input;
