// Copyright (C) 2026  Caprica Software Limited
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

//! Player configuration.
//!
//! This module manages the player configuration file.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub const CONFIG_NAME: &str = "liteplayer";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct PlayerConfig {
    pub version: u32,
    /// Name of the thread that runs all listeners.
    pub dispatcher_thread_name: String,
    /// Fallback `tracing` filter when `RUST_LOG` is not set.
    pub log_filter: String,
    /// Remaining time, in milliseconds, at which the engine reports
    /// NearlyCompleted.
    pub nearly_completed_ms: i32,
    /// Extra options passed to the engine when a session is created.
    pub engine_options: BTreeMap<String, String>,
    pub default_source: Option<String>,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            version: 1,
            dispatcher_thread_name: "liteplayer-events".to_string(),
            log_filter: "liteplayer=info".to_string(),
            nearly_completed_ms: 5000,
            engine_options: BTreeMap::new(),
            default_source: None,
        }
    }
}

pub fn load_config(name: Option<&str>) -> PlayerConfig {
    confy::load(name.unwrap_or(CONFIG_NAME), None).unwrap_or_default()
}

pub fn save_config(name: Option<&str>, cfg: &PlayerConfig) -> Result<(), confy::ConfyError> {
    confy::store(name.unwrap_or(CONFIG_NAME), None, cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_name_the_dispatcher_thread() {
        let cfg = PlayerConfig::default();
        assert_eq!(cfg.dispatcher_thread_name, "liteplayer-events");
        assert_eq!(cfg.nearly_completed_ms, 5000);
        assert!(cfg.default_source.is_none());
    }
}
