use bundlecp_api::AccessRuleKind;
use bundlecp_jobs::RuntimeConfig;
use serde::{Deserialize, Serialize};

use crate::classpath::source::SourceConvention;

pub const MAX_CONCURRENCY_ENV: &str = "BUNDLECP_MAX_CONCURRENCY";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpdaterConfig {
    /// Projects updated in parallel at most.
    pub max_concurrent_updates: usize,
    /// Tried in order; the first existing candidate becomes the default
    /// source attachment.
    pub source_conventions: Vec<SourceConvention>,
    /// Kind of the trailing `**/*` rule on bundles that export packages.
    /// `None` turns access rules off.
    pub access_rule_fallback: Option<AccessRuleKind>,
    /// First Java release whose execution environment is modular.
    pub modular_environment_floor: u32,
}

impl Default for UpdaterConfig {
    fn default() -> Self {
        Self {
            max_concurrent_updates: RuntimeConfig::default().max_in_flight,
            source_conventions: SourceConvention::DEFAULTS.to_vec(),
            access_rule_fallback: Some(AccessRuleKind::Discouraged),
            modular_environment_floor: 9,
        }
    }
}

impl UpdaterConfig {
    /// Defaults, with `BUNDLECP_MAX_CONCURRENCY` applied when set and valid.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(raw) = std::env::var(MAX_CONCURRENCY_ENV) {
            match raw.trim().parse::<usize>() {
                Ok(n) if n > 0 => config.max_concurrent_updates = n,
                _ => tracing::warn!("Ignoring invalid {}={:?}", MAX_CONCURRENCY_ENV, raw),
            }
        }
        config
    }

    pub fn runtime_config(&self) -> RuntimeConfig {
        RuntimeConfig {
            max_in_flight: self.max_concurrent_updates.max(1),
        }
    }
}
