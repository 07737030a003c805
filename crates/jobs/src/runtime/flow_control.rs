use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::error::JobError;
use crate::types::RuntimeConfig;

#[derive(Clone)]
pub struct FlowControlConfig {
    pub max_in_flight: usize,
}

impl Default for FlowControlConfig {
    fn default() -> Self {
        Self::from(&RuntimeConfig::default())
    }
}

impl From<&RuntimeConfig> for FlowControlConfig {
    fn from(value: &RuntimeConfig) -> Self {
        Self {
            max_in_flight: value.max_in_flight,
        }
    }
}

#[derive(Clone)]
pub struct FlowController {
    in_flight: Arc<Semaphore>,
}

impl FlowController {
    pub fn new(config: &FlowControlConfig) -> Self {
        Self {
            in_flight: Arc::new(Semaphore::new(config.max_in_flight.max(1))),
        }
    }

    pub async fn acquire_in_flight(&self) -> Result<OwnedSemaphorePermit, JobError> {
        self.in_flight
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| JobError::Execution("in-flight flow controller closed".to_string()))
    }

    pub fn available(&self) -> usize {
        self.in_flight.available_permits()
    }
}
