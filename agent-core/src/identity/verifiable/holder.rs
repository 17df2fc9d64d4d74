use rst_common::with_logging::log::{debug, info};

use crate::identity::connection::ConnectionRecord;

use super::issuer::ensure_connected;
use super::types::{
    CredentialExchangeRecord, HolderFrameworkBuilder, MessengerBuilder, ProofExchangeRecord,
    VerifiableError,
};

/// `Holder` drives the holder side of the demo: accepting credential offers and
/// answering proof requests
pub struct Holder<TFramework, TMessenger>
where
    TFramework: HolderFrameworkBuilder,
    TMessenger: MessengerBuilder,
{
    framework: TFramework,
    messenger: TMessenger,
}

impl<TFramework, TMessenger> Holder<TFramework, TMessenger>
where
    TFramework: HolderFrameworkBuilder,
    TMessenger: MessengerBuilder,
{
    pub fn new(framework: TFramework, messenger: TMessenger) -> Self {
        Self {
            framework,
            messenger,
        }
    }

    /// `accept_credential_offer` creates the link secret the first time it is needed
    pub async fn accept_credential_offer(
        &self,
        record: &CredentialExchangeRecord,
    ) -> Result<CredentialExchangeRecord, VerifiableError> {
        let link_secrets = self.framework.link_secret_ids().await?;
        if link_secrets.is_empty() {
            let link_secret = self.framework.create_link_secret().await?;
            debug!(
                "[holder:accept_credential_offer] link secret created: {}",
                link_secret
            );
        }

        let accepted = self.framework.accept_offer(&record.id).await?;
        info!(
            "[holder:accept_credential_offer] credential offer accepted: {}",
            accepted.id
        );

        Ok(accepted)
    }

    pub async fn accept_proof_request(
        &self,
        record: &ProofExchangeRecord,
    ) -> Result<ProofExchangeRecord, VerifiableError> {
        let selected = self
            .framework
            .select_credentials_for_request(&record.id)
            .await?;

        let accepted = self.framework.accept_request(&record.id, &selected).await?;
        info!(
            "[holder:accept_proof_request] proof request accepted: {}",
            accepted.id
        );

        Ok(accepted)
    }

    pub async fn send_message(
        &self,
        connection: &ConnectionRecord,
        message: &str,
    ) -> Result<(), VerifiableError> {
        ensure_connected(connection)?;
        self.messenger
            .send_message(connection.get_id(), message)
            .await
    }
}
