//! REST API plumbing shared by every resource fetcher

mod client;
mod credentials;

pub use client::{ApiClient, Payload};
pub use credentials::{CredentialsProvider, Session, SessionStore, StaticToken};

#[cfg(test)]
pub(crate) use credentials::fake_jwt;

/// Serde helpers for the backend's loosely typed JSON
pub(crate) mod serde_ext {
    use serde::{Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(i64),
    }

    /// Record ids arrive as numbers or strings depending on the endpoint
    pub fn id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
        Ok(match RawId::deserialize(deserializer)? {
            RawId::Text(s) => s,
            RawId::Number(n) => n.to_string(),
        })
    }

    /// Numbers that sometimes arrive as strings (Postgres numerics)
    pub fn lenient_f64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(f64),
            Text(String),
            Null(()),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Number(n) => Ok(n),
            Raw::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
            Raw::Null(()) => Ok(0.0),
        }
    }
}
