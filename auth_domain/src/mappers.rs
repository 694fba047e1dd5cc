use crate::models::CredentialSummary;
use auth_data::entities::CredentialEntity;

pub fn credential_entity_to_summary(credential: CredentialEntity) -> CredentialSummary {
    CredentialSummary {
        username: credential.username,
        created_at: credential.created_at,
    }
}
