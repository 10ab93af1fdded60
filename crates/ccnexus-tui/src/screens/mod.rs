//! Screen implementations. Each screen is a top-level Component.

pub mod endpoints;
pub mod usage;

use crate::component::Component;
use crate::screen::ScreenId;

/// Create screen components for the tab bar.
pub fn create_screens() -> Vec<(ScreenId, Box<dyn Component>)> {
    vec![
        (
            ScreenId::Endpoints,
            Box::new(endpoints::EndpointsScreen::new()),
        ),
        (ScreenId::Usage, Box::new(usage::UsageScreen::new())),
    ]
}

#[cfg(test)]
pub(crate) mod fixtures {
    use std::collections::HashMap;

    use chrono::Utc;
    use secrecy::SecretString;

    use ccnexus_core::{
        DirectorySnapshot, DisplayModel, Endpoint, EndpointStats, TelemetrySnapshot, reconcile,
    };

    fn endpoint(name: &str, url: &str, key: &str, enabled: bool) -> Endpoint {
        Endpoint {
            name: name.into(),
            api_url: url.into(),
            api_key: SecretString::from(key.to_owned()),
            enabled,
        }
    }

    /// A enabled with traffic, B disabled with a little.
    pub fn model() -> DisplayModel {
        let directory = DirectorySnapshot {
            version: 1,
            port: 3000,
            endpoints: vec![
                endpoint("A", "https://a.example", "sk-abcdef1234", true),
                endpoint("B", "https://b.example", "sk-b", false),
            ],
            fetched_at: Utc::now(),
        };
        let telemetry = TelemetrySnapshot {
            total_requests: 13,
            endpoints: HashMap::from([
                (
                    "A".to_owned(),
                    EndpointStats {
                        requests: 10,
                        errors: 1,
                        input_tokens: 500,
                        output_tokens: 1500,
                    },
                ),
                (
                    "B".to_owned(),
                    EndpointStats {
                        requests: 3,
                        errors: 0,
                        input_tokens: 100,
                        output_tokens: 200,
                    },
                ),
            ]),
            fetched_at: Utc::now(),
        };
        reconcile(&directory, Some(&telemetry))
    }

    /// Enabled endpoints with the given names and no telemetry.
    pub fn model_with(names: &[&str]) -> DisplayModel {
        let directory = DirectorySnapshot {
            version: 2,
            port: 3000,
            endpoints: names
                .iter()
                .map(|name| endpoint(name, "https://x.example", "sk-xxxxxxxx", true))
                .collect(),
            fetched_at: Utc::now(),
        };
        reconcile(&directory, None)
    }
}
