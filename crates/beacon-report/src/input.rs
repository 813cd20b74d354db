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


use std::{
    fs,
    io::{self, Read},
    path::PathBuf,
};

use anyhow::{Context, Result};
use clap::Args;
use serde_json::Value;

/// Source of the JSON document a report is computed from.
#[derive(Args, Clone, Debug)]
pub struct InputArgs {
    /// Path to a JSON API response, or `-` to read standard input.
    #[clap(default_value = "-")]
    pub input: PathBuf,
}

impl InputArgs {
    pub fn is_stdin(&self) -> bool {
        self.input.as_os_str() == "-"
    }

    /// Read and parse the document.
    pub fn load(&self) -> Result<Value> {
        let text = if self.is_stdin() {
            let mut text = String::new();
            io::stdin().read_to_string(&mut text).context("failed to read standard input")?;
            text
        } else {
            fs::read_to_string(&self.input)
                .with_context(|| format!("failed to read {}", self.input.display()))?
        };
        tracing::debug!("Read {} bytes of input", text.len());
        serde_json::from_str(&text).with_context(|| format!("{} is not valid JSON", self.name()))
    }

    fn name(&self) -> String {
        if self.is_stdin() {
            "standard input".to_string()
        } else {
            self.input.display().to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn loads_a_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"data": [1, 2]}}"#).unwrap();
        let input = InputArgs { input: file.path().to_path_buf() };
        assert!(!input.is_stdin());
        assert_eq!(input.load().unwrap()["data"][1], 2);
    }

    #[test]
    fn reports_invalid_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        let err = InputArgs { input: file.path().to_path_buf() }.load().unwrap_err();
        assert!(err.to_string().contains("is not valid JSON"));
    }
}
