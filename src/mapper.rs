use auth_domain::{AuthError, CredentialSummary, IssuedToken};
use chrono::Utc;
use prost_types::Timestamp;
use tonic::codegen::Bytes;
use tonic::{Code, Status};

use crate::envelope::{self, Envelope};
use crate::proto_stub::auth::protobuf::{CredentialSummaryMessage, SessionTokenMessage};

impl From<CredentialSummary> for CredentialSummaryMessage {
    fn from(summary: CredentialSummary) -> Self {
        CredentialSummaryMessage {
            username: summary.username,
            created_at: Some(summary.created_at.to_timestamp()),
        }
    }
}

impl From<IssuedToken> for SessionTokenMessage {
    fn from(issued: IssuedToken) -> Self {
        SessionTokenMessage {
            token: issued.token,
            expires_at: Some(issued.expires_at.to_timestamp()),
        }
    }
}

pub trait ToTimestamp {
    fn to_timestamp(&self) -> Timestamp;
}

impl ToTimestamp for chrono::DateTime<Utc> {
    fn to_timestamp(&self) -> Timestamp {
        Timestamp {
            seconds: self.timestamp(),
            nanos: self.timestamp_subsec_nanos() as i32,
        }
    }
}

pub trait IntoStatus {
    fn into_status(self) -> Status;
}

fn code_for(status_code: u16) -> Code {
    match status_code {
        envelope::STATUS_UNPROCESSABLE => Code::InvalidArgument,
        envelope::STATUS_CONFLICT => Code::AlreadyExists,
        envelope::STATUS_UNAUTHORIZED => Code::Unauthenticated,
        envelope::STATUS_UNAVAILABLE => Code::Unavailable,
        _ => Code::Internal,
    }
}

impl IntoStatus for AuthError {
    fn into_status(self) -> Status {
        match &self {
            AuthError::Internal(_) => tracing::error!("Request failed: {}", self),
            AuthError::TransientStore(_) => tracing::warn!("Request failed: {}", self),
            _ => tracing::debug!("Request rejected: {}", self),
        }

        let envelope = Envelope::failure(&self);
        Status::with_details(
            code_for(envelope.status_code),
            envelope.message.clone(),
            Bytes::from(envelope.to_json()),
        )
    }
}
