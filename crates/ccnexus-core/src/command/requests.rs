// ── Command request types ──
//
// Input types for mutations, with the client-side validation that runs
// before anything is queued for the host.

use std::fmt;
use std::str::FromStr;

use secrecy::{ExposeSecret, SecretString};

use ccnexus_api::EndpointPayload;

use crate::error::CoreError;

/// Fields of an endpoint as entered in an add or edit form.
#[derive(Debug, Clone)]
pub struct EndpointForm {
    pub name: String,
    pub api_url: String,
    pub api_key: SecretString,
}

impl EndpointForm {
    pub fn new(
        name: impl Into<String>,
        api_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            api_url: api_url.into(),
            api_key: SecretString::from(api_key.into()),
        }
    }

    /// Trim every field and reject the form if any is left empty.
    pub fn validate(&self) -> Result<Self, CoreError> {
        let name = required("name", &self.name)?;
        let api_url = required("apiUrl", &self.api_url)?;
        let api_key = required("apiKey", self.api_key.expose_secret())?;
        Ok(Self {
            name,
            api_url,
            api_key: SecretString::from(api_key),
        })
    }

    pub(crate) fn payload(&self) -> EndpointPayload<'_> {
        EndpointPayload {
            name: &self.name,
            api_url: &self.api_url,
            api_key: self.api_key.expose_secret(),
        }
    }
}

fn required(field: &str, value: &str) -> Result<String, CoreError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(CoreError::validation(field, "must not be empty"));
    }
    Ok(trimmed.to_owned())
}

/// Check a requested listen port and narrow it to `u16`.
pub fn validate_port(port: u32) -> Result<u16, CoreError> {
    u16::try_from(port)
        .ok()
        .filter(|p| *p >= 1)
        .ok_or_else(|| CoreError::validation("port", format!("{port} is not between 1 and 65535")))
}

/// How a user names an endpoint on the command line: by position or by
/// name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EndpointSelector {
    Index(usize),
    Name(String),
}

impl FromStr for EndpointSelector {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(CoreError::validation("endpoint", "must not be empty"));
        }
        Ok(s.parse::<usize>()
            .map_or_else(|_| Self::Name(s.to_owned()), Self::Index))
    }
}

impl fmt::Display for EndpointSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Index(i) => write!(f, "#{i}"),
            Self::Name(name) => write!(f, "'{name}'"),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn validate_trims_fields() {
        let form = EndpointForm::new("  A ", " https://a.example\n", "\tsk-1 ")
            .validate()
            .unwrap();
        assert_eq!(form.name, "A");
        assert_eq!(form.api_url, "https://a.example");
        assert_eq!(form.api_key.expose_secret(), "sk-1");
    }

    #[test]
    fn blank_fields_are_rejected() {
        for (form, field) in [
            (EndpointForm::new("", "url", "key"), "name"),
            (EndpointForm::new("A", "   ", "key"), "apiUrl"),
            (EndpointForm::new("A", "url", " "), "apiKey"),
        ] {
            match form.validate() {
                Err(CoreError::Validation { field: f, .. }) => assert_eq!(f, field),
                other => panic!("expected validation error for {field}, got {other:?}"),
            }
        }
    }

    #[test]
    fn port_bounds() {
        assert!(validate_port(0).is_err());
        assert_eq!(validate_port(1).unwrap(), 1);
        assert_eq!(validate_port(65_535).unwrap(), 65_535);
        assert!(validate_port(65_536).is_err());
    }

    #[test]
    fn selector_parses_index_or_name() {
        assert_eq!("2".parse::<EndpointSelector>().unwrap(), EndpointSelector::Index(2));
        assert_eq!(
            "primary".parse::<EndpointSelector>().unwrap(),
            EndpointSelector::Name("primary".into())
        );
        assert!("  ".parse::<EndpointSelector>().is_err());
    }
}
