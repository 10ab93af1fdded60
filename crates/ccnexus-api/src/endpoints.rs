// Host admin operations
//
// One method per host command or query. Positions are zero-based indexes
// into the host's endpoint list as of the caller's last read.

use tracing::debug;

use crate::client::HostClient;
use crate::error::Error;
use crate::models::{ConfigResponse, EndpointPayload, PortPayload, StatsResponse, TogglePayload};

impl HostClient {
    /// Fetch the listen port and the ordered endpoint list.
    ///
    /// `GET /api/config`
    pub async fn get_config(&self) -> Result<ConfigResponse, Error> {
        let url = self.api_url("config")?;
        self.get(url).await
    }

    /// Fetch aggregate and per-endpoint usage counters.
    ///
    /// `GET /api/stats`
    pub async fn get_stats(&self) -> Result<StatsResponse, Error> {
        let url = self.api_url("stats")?;
        self.get(url).await
    }

    /// Append an endpoint to the list.
    ///
    /// `POST /api/endpoints`
    pub async fn add_endpoint(&self, endpoint: &EndpointPayload<'_>) -> Result<(), Error> {
        let url = self.api_url("endpoints")?;
        debug!(name = endpoint.name, "POST {}", url);
        self.command(self.http().post(url).json(endpoint)).await
    }

    /// Replace the endpoint at `position`.
    ///
    /// `PUT /api/endpoints/{position}`
    pub async fn update_endpoint(
        &self,
        position: usize,
        endpoint: &EndpointPayload<'_>,
    ) -> Result<(), Error> {
        let url = self.api_url(&format!("endpoints/{position}"))?;
        debug!(name = endpoint.name, "PUT {}", url);
        self.command(self.http().put(url).json(endpoint)).await
    }

    /// Remove the endpoint at `position`.
    ///
    /// `DELETE /api/endpoints/{position}`
    pub async fn remove_endpoint(&self, position: usize) -> Result<(), Error> {
        let url = self.api_url(&format!("endpoints/{position}"))?;
        debug!("DELETE {}", url);
        self.command(self.http().delete(url)).await
    }

    /// Enable or disable the endpoint at `position`.
    ///
    /// `POST /api/endpoints/{position}/toggle`
    pub async fn toggle_endpoint(&self, position: usize, enabled: bool) -> Result<(), Error> {
        let url = self.api_url(&format!("endpoints/{position}/toggle"))?;
        debug!(enabled, "POST {}", url);
        self.command(self.http().post(url).json(&TogglePayload { enabled }))
            .await
    }

    /// Change the proxy listen port. The host applies it on its next restart.
    ///
    /// `PUT /api/port`
    pub async fn update_port(&self, port: u16) -> Result<(), Error> {
        let url = self.api_url("port")?;
        debug!(port, "PUT {}", url);
        self.command(self.http().put(url).json(&PortPayload { port }))
            .await
    }
}
