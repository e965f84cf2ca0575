use log::debug;
use std::time::Duration;

use crate::utils::{DirshareError, Result};

/// Client for the external timestamp microservice. Every directory request
/// carries a timestamp token fetched from here; if the service is down the
/// whole operation fails, the same as any other send failure.
pub struct TimeService {
    client: reqwest::Client,
    url: String,
}

impl TimeService {
    pub fn new(url: String) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(5))
            .build()
            .map_err(|e| DirshareError::TimeService(e.to_string()))?;

        Ok(Self { client, url })
    }

    /// Fetches the current formatted date/time string.
    pub async fn now(&self) -> Result<String> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| DirshareError::TimeService(e.to_string()))?;

        if !response.status().is_success() {
            return Err(DirshareError::TimeService(format!(
                "service returned {}",
                response.status()
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| DirshareError::TimeService(e.to_string()))?;

        let stamp = body.trim().to_string();
        if stamp.is_empty() {
            return Err(DirshareError::TimeService("empty response body".to_string()));
        }

        debug!("time service returned {:?}", stamp);
        Ok(stamp)
    }
}
