use rst_common::standard::async_trait::async_trait;
use rst_common::standard::chrono::serde::ts_seconds;
use rst_common::standard::chrono::{DateTime, Utc};
use rst_common::standard::serde::{self, Deserialize, Serialize};
use rst_common::standard::uuid::Uuid;
use rst_common::with_errors::thiserror::{self, Error};

use crate::identity::connection::types::CorrelationId;
use crate::identity::connection::ConnectionRecord;

pub const INVITATION_QUERY_PARAM: &str = "oob";

/// `InvitationError` provides all specific error types relate with out-of-band invitations
#[derive(Debug, PartialEq, Error, Clone)]
pub enum InvitationError {
    #[error("invalid invitation url: {0}")]
    InvalidUrl(String),

    #[error("invitation not found: {0}")]
    InvitationNotFound(String),

    #[error("no connection record from out-of-band invitation")]
    NoConnectionRecord,

    #[error("source unavailable: {0}")]
    SourceUnavailable(String),
}

/// `OutOfBandInvitation` is a self-contained invitation one agent issues and another
/// consumes to bootstrap a connection
///
/// Its `id` is the correlation id carried by every connection record the
/// invitation produces
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(crate = "self::serde")]
pub struct OutOfBandInvitation {
    id: CorrelationId,
    label: String,
    url: String,

    #[serde(with = "ts_seconds")]
    created_at: DateTime<Utc>,
}

impl OutOfBandInvitation {
    pub fn new(label: String, domain: &str) -> Self {
        let id = Uuid::new_v4().to_string();
        let url = InvitationUrl::build(domain, &id);

        Self {
            id: CorrelationId::new(id),
            label,
            url,
            created_at: Utc::now(),
        }
    }

    pub fn correlation_id(&self) -> &CorrelationId {
        &self.id
    }

    pub fn get_label(&self) -> &str {
        &self.label
    }

    pub fn get_url(&self) -> &str {
        &self.url
    }

    pub fn get_created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// `InvitationUrl` encodes an invitation id as a shareable url
///
/// ```text
/// http://localhost:3002?oob=<invitation_id>
/// ```
pub struct InvitationUrl;

impl InvitationUrl {
    pub fn build(domain: &str, id: &str) -> String {
        format!(
            "{}?{}={}",
            domain.trim_end_matches('/'),
            INVITATION_QUERY_PARAM,
            id
        )
    }

    pub fn parse(url: &str) -> Result<CorrelationId, InvitationError> {
        let (_, query) = url
            .split_once('?')
            .ok_or_else(|| InvitationError::InvalidUrl(format!("missing query: {}", url)))?;

        let id = query
            .split('&')
            .filter_map(|pair| pair.split_once('='))
            .find(|(key, _)| *key == INVITATION_QUERY_PARAM)
            .map(|(_, value)| value.trim())
            .filter(|value| !value.is_empty())
            .ok_or_else(|| {
                InvitationError::InvalidUrl(format!(
                    "missing {} parameter: {}",
                    INVITATION_QUERY_PARAM, url
                ))
            })?;

        Ok(CorrelationId::from(id))
    }
}

/// `InviterBuilder` is the issuing side of the external agent framework
#[async_trait]
pub trait InviterBuilder: Clone + Send + Sync {
    async fn create_invitation(&self, domain: &str)
        -> Result<OutOfBandInvitation, InvitationError>;
}

/// `InviteeBuilder` is the receiving side of the external agent framework
///
/// Receiving an invitation starts the framework's own handshake. The framework may
/// not create any connection record for it, in which case `None` is returned
#[async_trait]
pub trait InviteeBuilder: Clone + Send + Sync {
    async fn receive_invitation(
        &self,
        url: &str,
    ) -> Result<Option<ConnectionRecord>, InvitationError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use table_test::table_test;

    #[test]
    fn test_build_url() {
        let table = vec![
            (
                ("http://localhost:3002", "inv-1"),
                "http://localhost:3002?oob=inv-1".to_string(),
            ),
            (
                ("http://localhost:3002/", "inv-2"),
                "http://localhost:3002?oob=inv-2".to_string(),
            ),
        ];

        for (validator, input, expected) in table_test!(table) {
            let (domain, id) = input;
            validator
                .given(&format!("{:?}", input))
                .when("build invitation url")
                .then("query carries the invitation id")
                .assert_eq(expected, InvitationUrl::build(domain, id));
        }
    }

    #[test]
    fn test_parse_url() {
        let parsed = InvitationUrl::parse("http://localhost:3002?c_i=x&oob=inv-1");
        assert!(!parsed.is_err());
        assert_eq!(parsed.unwrap().as_str(), "inv-1");
    }

    #[test]
    fn test_parse_url_errors() {
        let table = vec![
            "http://localhost:3002",
            "http://localhost:3002?c_i=x",
            "http://localhost:3002?oob=",
            "http://localhost:3002?oob=  ",
        ];

        for url in table {
            let parsed = InvitationUrl::parse(url);
            assert!(parsed.is_err());
            assert!(matches!(parsed.unwrap_err(), InvitationError::InvalidUrl(_)))
        }
    }

    #[test]
    fn test_new_invitation() {
        let invitation = OutOfBandInvitation::new("faber".to_string(), "http://localhost:3002");
        assert!(!invitation.correlation_id().is_empty());
        assert_eq!(invitation.get_label(), "faber");

        let parsed = InvitationUrl::parse(invitation.get_url());
        assert!(!parsed.is_err());
        assert_eq!(&parsed.unwrap(), invitation.correlation_id());
    }
}
