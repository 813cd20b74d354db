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

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

pub use alloy_chains::NamedChain;

/// Protocol constants of a beacon chain network.
///
/// Every component of this crate takes its constants from a [ChainSpec] rather than from
/// literals, so a test network can be described by overriding the relevant fields.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Builder, Serialize, Deserialize)]
#[builder(default, build_fn(validate = "Self::validate"))]
pub struct ChainSpec {
    /// Unix timestamp of epoch 0, slot 0.
    pub genesis_timestamp: i64,
    /// Duration of a slot in seconds.
    pub seconds_per_slot: u64,
    /// Number of slots grouped into an epoch.
    pub slots_per_epoch: u64,
    /// Approximate number of epochs per day, used for rate extrapolation.
    pub epochs_per_day: u64,
    /// Approximate number of epochs per year (~365.25 days), used for annualization.
    pub epochs_per_year: u64,
    /// Divisor applied to the active validator count to derive the churn limit.
    pub churn_limit_quotient: u64,
    /// Lower bound of the per-epoch churn limit.
    pub min_per_epoch_churn_limit: u64,
}

impl ChainSpec {
    /// Create a new [ChainSpecBuilder], starting from the mainnet constants.
    pub fn builder() -> ChainSpecBuilder {
        Default::default()
    }

    /// Lookup the [ChainSpec] for a named chain.
    pub const fn from_chain(chain: NamedChain) -> Option<ChainSpec> {
        match chain {
            NamedChain::Mainnet => Some(MAINNET),
            NamedChain::Sepolia => Some(SEPOLIA),
            NamedChain::Holesky => Some(HOLESKY),
            _ => None,
        }
    }

    /// Lookup the [ChainSpec] by its execution layer chain ID.
    pub fn from_chain_id(chain_id: impl Into<u64>) -> Option<ChainSpec> {
        let chain = NamedChain::try_from(chain_id.into()).ok()?;
        Self::from_chain(chain)
    }

    /// Duration of an epoch in seconds.
    pub const fn seconds_per_epoch(&self) -> u64 {
        self.seconds_per_slot * self.slots_per_epoch
    }

    /// Nominal day length implied by [Self::epochs_per_day].
    pub const fn seconds_per_day(&self) -> u64 {
        self.epochs_per_day * self.seconds_per_epoch()
    }
}

impl ChainSpecBuilder {
    fn validate(&self) -> Result<(), String> {
        if self.seconds_per_slot == Some(0) {
            return Err("seconds_per_slot must be non-zero".into());
        }
        if self.slots_per_epoch == Some(0) {
            return Err("slots_per_epoch must be non-zero".into());
        }
        Ok(())
    }
}

impl Default for ChainSpec {
    fn default() -> Self {
        MAINNET
    }
}

/// [ChainSpec] for Ethereum mainnet (genesis Dec 1, 2020, 12:00:23 UTC).
pub const MAINNET: ChainSpec = ChainSpec {
    genesis_timestamp: 1606824023,
    seconds_per_slot: 12,
    slots_per_epoch: 32,
    epochs_per_day: 225,
    epochs_per_year: 82125,
    churn_limit_quotient: 65536,
    min_per_epoch_churn_limit: 4,
};

/// [ChainSpec] for the Sepolia testnet.
pub const SEPOLIA: ChainSpec = ChainSpec { genesis_timestamp: 1655733600, ..MAINNET };

/// [ChainSpec] for the Holesky testnet.
pub const HOLESKY: ChainSpec = ChainSpec { genesis_timestamp: 1695902400, ..MAINNET };

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mainnet_constants() {
        assert_eq!(MAINNET.seconds_per_epoch(), 384);
        assert_eq!(MAINNET.seconds_per_day(), 86400);
        assert_eq!(MAINNET.epochs_per_year, 82125);
        assert_eq!(ChainSpec::default(), MAINNET);
    }

    #[test]
    fn lookup_by_chain() {
        assert_eq!(ChainSpec::from_chain_id(1u64), Some(MAINNET));
        assert_eq!(ChainSpec::from_chain(NamedChain::Sepolia), Some(SEPOLIA));
        assert_eq!(ChainSpec::from_chain_id(17000u64), Some(HOLESKY));
        assert_eq!(ChainSpec::from_chain(NamedChain::Base), None);
    }

    #[test]
    fn builder_overrides_single_constant() {
        let spec = ChainSpec::builder().genesis_timestamp(0).build().unwrap();
        assert_eq!(spec.genesis_timestamp, 0);
        assert_eq!(spec.slots_per_epoch, MAINNET.slots_per_epoch);
    }

    #[test]
    fn builder_rejects_zero_lengths() {
        assert!(ChainSpec::builder().slots_per_epoch(0).build().is_err());
        assert!(ChainSpec::builder().seconds_per_slot(0).build().is_err());
    }
}
