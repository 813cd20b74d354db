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


use anyhow::{Context, Result};
use beacon_rewards::{ChainSpec, NamedChain};
use clap::{Args, ValueEnum};
use tracing::level_filters::LevelFilter;

/// Common configuration options for all commands
#[derive(Args, Debug, Clone)]
pub struct GlobalConfig {
    /// Log level (error, warn, info, debug, trace)
    #[clap(long, env = "LOG_LEVEL", global = true, default_value = "info")]
    pub log_level: LevelFilter,

    /// Emit logs as JSON lines.
    #[clap(long, env = "LOG_JSON", global = true, default_value_t = false)]
    pub log_json: bool,

    /// Protocol constants of the chain the input data comes from.
    #[clap(flatten, next_help_heading = "Chain Constants")]
    pub chain: ChainArgs,
}

impl GlobalConfig {
    /// Resolve the [ChainSpec] selected by [Self::chain].
    pub fn chain_spec(&self) -> Result<ChainSpec> {
        self.chain.chain_spec()
    }
}

/// Beacon chain networks with known constants.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Network {
    Mainnet,
    Sepolia,
    Holesky,
}

impl From<Network> for NamedChain {
    fn from(network: Network) -> Self {
        match network {
            Network::Mainnet => NamedChain::Mainnet,
            Network::Sepolia => NamedChain::Sepolia,
            Network::Holesky => NamedChain::Holesky,
        }
    }
}

/// Network selection with optional overrides of single constants.
#[derive(Args, Debug, Clone)]
pub struct ChainArgs {
    /// Network whose constants are used.
    #[clap(long, env = "BEACON_NETWORK", global = true, value_enum, default_value = "mainnet")]
    pub network: Network,

    /// Override the genesis timestamp (Unix seconds).
    #[clap(long, env = "GENESIS_TIMESTAMP", global = true)]
    pub genesis_timestamp: Option<i64>,

    /// Override the slot duration in seconds.
    #[clap(long, env = "SECONDS_PER_SLOT", global = true)]
    pub seconds_per_slot: Option<u64>,

    /// Override the number of slots per epoch.
    #[clap(long, env = "SLOTS_PER_EPOCH", global = true)]
    pub slots_per_epoch: Option<u64>,
}

impl ChainArgs {
    pub fn chain_spec(&self) -> Result<ChainSpec> {
        let base = ChainSpec::from_chain(self.network.into())
            .with_context(|| format!("no chain constants known for {:?}", self.network))?;
        // Unset builder fields fall back to mainnet, so carry every value of the base over.
        ChainSpec::builder()
            .genesis_timestamp(self.genesis_timestamp.unwrap_or(base.genesis_timestamp))
            .seconds_per_slot(self.seconds_per_slot.unwrap_or(base.seconds_per_slot))
            .slots_per_epoch(self.slots_per_epoch.unwrap_or(base.slots_per_epoch))
            .epochs_per_day(base.epochs_per_day)
            .epochs_per_year(base.epochs_per_year)
            .churn_limit_quotient(base.churn_limit_quotient)
            .min_per_epoch_churn_limit(base.min_per_epoch_churn_limit)
            .build()
            .context("invalid chain constants")
    }
}

#[cfg(test)]
mod tests {
    use beacon_rewards::{MAINNET, SEPOLIA};

    use super::*;

    fn args(network: Network) -> ChainArgs {
        ChainArgs { network, genesis_timestamp: None, seconds_per_slot: None, slots_per_epoch: None }
    }

    #[test]
    fn named_networks() {
        assert_eq!(args(Network::Mainnet).chain_spec().unwrap(), MAINNET);
        assert_eq!(args(Network::Sepolia).chain_spec().unwrap(), SEPOLIA);
    }

    #[test]
    fn overrides_keep_the_selected_network() {
        let spec = ChainArgs { slots_per_epoch: Some(8), ..args(Network::Sepolia) }
            .chain_spec()
            .unwrap();
        assert_eq!(spec.genesis_timestamp, SEPOLIA.genesis_timestamp);
        assert_eq!(spec.slots_per_epoch, 8);
    }

    #[test]
    fn zero_slot_duration_is_rejected() {
        let err = ChainArgs { seconds_per_slot: Some(0), ..args(Network::Mainnet) }
            .chain_spec()
            .unwrap_err();
        assert!(format!("{err:#}").contains("seconds_per_slot"));
    }
}
