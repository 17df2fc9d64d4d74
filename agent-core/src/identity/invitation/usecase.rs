use rst_common::with_logging::log::{debug, info};

use crate::identity::connection::ConnectionRecord;

use super::types::{InvitationError, InviteeBuilder, InviterBuilder, OutOfBandInvitation};

/// `Usecase` brackets the connection rendezvous on both sides of an invitation
///
/// The inviter issues an [`OutOfBandInvitation`] and later waits on its correlation id,
/// the invitee hands the invitation url to its own framework
pub struct Usecase<TInviter, TInvitee>
where
    TInviter: InviterBuilder,
    TInvitee: InviteeBuilder,
{
    inviter: TInviter,
    invitee: TInvitee,
}

impl<TInviter, TInvitee> Usecase<TInviter, TInvitee>
where
    TInviter: InviterBuilder,
    TInvitee: InviteeBuilder,
{
    pub fn new(inviter: TInviter, invitee: TInvitee) -> Self {
        Self { inviter, invitee }
    }

    pub async fn invite(&self, domain: &str) -> Result<OutOfBandInvitation, InvitationError> {
        let invitation = self.inviter.create_invitation(domain).await?;
        info!(
            "[invitation:invite] connection link: {}",
            invitation.get_url()
        );

        Ok(invitation)
    }

    pub async fn accept(&self, url: &str) -> Result<ConnectionRecord, InvitationError> {
        debug!("[invitation:accept] receiving invitation: {}", url);

        let record = self
            .invitee
            .receive_invitation(url)
            .await?
            .ok_or(InvitationError::NoConnectionRecord)?;

        info!(
            "[invitation:accept] connection record created: {} | state: {:?}",
            record.get_id(),
            record.get_state()
        );

        Ok(record)
    }
}
