use tonic::metadata::MetadataMap;
use tonic::{Request, Response, Status};
use tracing::{info_span, Instrument, Span};
use uuid::Uuid;

use crate::envelope::{STATUS_CREATED, STATUS_OK};
use crate::mapper::IntoStatus;
use crate::proto_stub::auth::protobuf::auth_grpc_service_server::AuthGrpcService;
use crate::proto_stub::auth::protobuf::{
    EmptyData, LoginRequest, LoginResponse, LogoutRequest, LogoutResponse, RegisterRequest,
    RegisterResponse, TokenSubjectMessage, ValidateTokenRequest, ValidateTokenResponse,
};
use auth_domain::error::AuthError;
use auth_domain::service::AuthService;

const AUTHORIZATION: &str = "authorization";

pub struct AuthGrpcServiceImpl {
    auth_service: Box<dyn AuthService + Send + Sync>,
}

impl AuthGrpcServiceImpl {
    pub fn new(auth_service: Box<dyn AuthService + Send + Sync>) -> Self {
        Self { auth_service }
    }
}

fn request_span(rpc: &'static str) -> Span {
    info_span!("rpc", method = rpc, request_id = %Uuid::new_v4())
}

/// Token presented in the `authorization` metadata, raw or as `Bearer <token>`
fn presented_token(metadata: &MetadataMap) -> Result<String, AuthError> {
    let value = metadata
        .get(AUTHORIZATION)
        .ok_or(AuthError::MissingToken)?
        .to_str()
        .map_err(|_| AuthError::InvalidToken)?
        .trim();

    let mut parts = value.splitn(2, char::is_whitespace);
    let token = match (parts.next(), parts.next()) {
        (Some(scheme), rest) if scheme.eq_ignore_ascii_case("bearer") => rest.unwrap_or("").trim(),
        _ => value,
    };

    if token.is_empty() {
        return Err(AuthError::MissingToken);
    }
    Ok(token.to_string())
}

#[tonic::async_trait]
impl AuthGrpcService for AuthGrpcServiceImpl {
    async fn register(
        &self,
        request: Request<RegisterRequest>,
    ) -> Result<Response<RegisterResponse>, Status> {
        let req = request.into_inner();

        async move {
            let summary = self
                .auth_service
                .register(&req.username, &req.password)
                .await
                .map_err(|e| e.into_status())?;

            Ok(Response::new(RegisterResponse {
                success: true,
                status_code: STATUS_CREATED as i32,
                message: "User registered successfully".to_string(),
                data: Some(summary.into()),
            }))
        }
        .instrument(request_span("register"))
        .await
    }

    async fn login(
        &self,
        request: Request<LoginRequest>,
    ) -> Result<Response<LoginResponse>, Status> {
        let req = request.into_inner();

        async move {
            let issued = self
                .auth_service
                .login(&req.username, &req.password)
                .await
                .map_err(|e| e.into_status())?;

            Ok(Response::new(LoginResponse {
                success: true,
                status_code: STATUS_OK as i32,
                message: "Logged in successfully".to_string(),
                data: Some(issued.into()),
            }))
        }
        .instrument(request_span("login"))
        .await
    }

    async fn logout(
        &self,
        request: Request<LogoutRequest>,
    ) -> Result<Response<LogoutResponse>, Status> {
        async move {
            let token = presented_token(request.metadata()).map_err(|e| e.into_status())?;

            self.auth_service
                .logout(&token)
                .await
                .map_err(|e| e.into_status())?;

            Ok(Response::new(LogoutResponse {
                success: true,
                status_code: STATUS_OK as i32,
                message: "Logged out successfully".to_string(),
                data: Some(EmptyData {}),
            }))
        }
        .instrument(request_span("logout"))
        .await
    }

    async fn validate_token(
        &self,
        request: Request<ValidateTokenRequest>,
    ) -> Result<Response<ValidateTokenResponse>, Status> {
        async move {
            let token = presented_token(request.metadata()).map_err(|e| e.into_status())?;

            let subject = self
                .auth_service
                .validate_token(&token)
                .await
                .map_err(|e| e.into_status())?;

            Ok(Response::new(ValidateTokenResponse {
                success: true,
                status_code: STATUS_OK as i32,
                message: "Token is valid".to_string(),
                data: Some(TokenSubjectMessage { subject }),
            }))
        }
        .instrument(request_span("validate_token"))
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::Envelope;
    use auth_data::memory::{InMemoryCredentialRepository, InMemoryTokenRepository};
    use auth_domain::hashing_service::Pbkdf2HashingService;
    use auth_domain::token_service::{JwtTokenService, TokenConfig};
    use auth_domain::{AuthServiceImpl, PasswordPolicy};
    use jsonwebtoken::Algorithm;
    use std::num::NonZeroU32;
    use std::sync::Arc;
    use tonic::Code;

    fn setup() -> AuthGrpcServiceImpl {
        let token_service = Arc::new(JwtTokenService::new(
            TokenConfig::new(
                "secret-secret-secret-secret-secret".to_owned(),
                vec!["audience".to_owned()],
                "issuer".to_owned(),
                Algorithm::HS256,
                chrono::Duration::hours(1),
            ),
            Arc::new(InMemoryTokenRepository::new()),
        ));
        let auth_service = AuthServiceImpl::new(
            Arc::new(InMemoryCredentialRepository::new()),
            token_service,
            Arc::new(Pbkdf2HashingService::new(16, NonZeroU32::new(1_000).unwrap())),
            PasswordPolicy::default(),
        );

        AuthGrpcServiceImpl::new(Box::new(auth_service))
    }

    fn credentials(username: &str, password: &str) -> (String, String) {
        (username.to_string(), password.to_string())
    }

    async fn register(
        service: &AuthGrpcServiceImpl,
        username: &str,
        password: &str,
    ) -> Result<RegisterResponse, Status> {
        let (username, password) = credentials(username, password);
        service
            .register(Request::new(RegisterRequest { username, password }))
            .await
            .map(Response::into_inner)
    }

    async fn login(
        service: &AuthGrpcServiceImpl,
        username: &str,
        password: &str,
    ) -> Result<LoginResponse, Status> {
        let (username, password) = credentials(username, password);
        service
            .login(Request::new(LoginRequest { username, password }))
            .await
            .map(Response::into_inner)
    }

    async fn logout(
        service: &AuthGrpcServiceImpl,
        authorization: Option<&str>,
    ) -> Result<LogoutResponse, Status> {
        let mut request = Request::new(LogoutRequest {});
        if let Some(value) = authorization {
            request
                .metadata_mut()
                .insert(AUTHORIZATION, value.parse().unwrap());
        }
        service.logout(request).await.map(Response::into_inner)
    }

    fn envelope_of(status: &Status) -> Envelope {
        serde_json::from_slice(status.details()).expect("details hold an envelope")
    }

    #[tokio::test]
    async fn test_register_login_logout_scenario() {
        let service = setup();

        let registered = register(&service, "alice@example.com", "Abc12345!")
            .await
            .unwrap();
        assert!(registered.success);
        assert_eq!(registered.status_code, 201);
        assert_eq!(registered.data.unwrap().username, "alice@example.com");

        let logged_in = login(&service, "alice@example.com", "Abc12345!")
            .await
            .unwrap();
        assert_eq!(logged_in.status_code, 200);
        let token = logged_in.data.unwrap().token;
        assert!(!token.is_empty());

        let logged_out = logout(&service, Some(&token)).await.unwrap();
        assert!(logged_out.success);
        assert_eq!(logged_out.status_code, 200);
        assert_eq!(logged_out.message, "Logged out successfully");
        assert_eq!(logged_out.data, Some(EmptyData {}));

        let again = logout(&service, Some(&token)).await.unwrap_err();
        assert_eq!(again.code(), Code::Unauthenticated);
        let envelope = envelope_of(&again);
        assert_eq!(envelope.status_code, 401);
        assert_eq!(envelope.data["error"], "InvalidToken");
    }

    #[tokio::test]
    async fn test_register_rejects_weak_password() {
        let service = setup();

        let status = register(&service, "bob@example.com", "short")
            .await
            .unwrap_err();

        assert_eq!(status.code(), Code::InvalidArgument);
        let envelope = envelope_of(&status);
        assert_eq!(envelope.status_code, 422);
        assert_eq!(envelope.data["error"], "ValidationError");
    }

    #[tokio::test]
    async fn test_register_duplicate() {
        let service = setup();
        register(&service, "alice@example.com", "Abc12345!")
            .await
            .unwrap();

        let status = register(&service, "alice@example.com", "Xyz98765#")
            .await
            .unwrap_err();

        assert_eq!(status.code(), Code::AlreadyExists);
        assert_eq!(envelope_of(&status).status_code, 409);
    }

    #[tokio::test]
    async fn test_login_unknown_user() {
        let service = setup();

        let status = login(&service, "unknown@example.com", "anything")
            .await
            .unwrap_err();

        assert_eq!(status.code(), Code::Unauthenticated);
        let envelope = envelope_of(&status);
        assert_eq!(envelope.status_code, 401);
        assert_eq!(envelope.data["error"], "InvalidCredentials");
    }

    #[tokio::test]
    async fn test_logout_without_token() {
        let service = setup();

        let missing = logout(&service, None).await.unwrap_err();
        assert_eq!(missing.code(), Code::Unauthenticated);
        assert_eq!(envelope_of(&missing).data["error"], "MissingToken");

        let empty = logout(&service, Some("Bearer ")).await.unwrap_err();
        assert_eq!(envelope_of(&empty).data["error"], "MissingToken");
    }

    #[tokio::test]
    async fn test_bearer_prefix_and_validate() {
        let service = setup();
        register(&service, "alice@example.com", "Abc12345!")
            .await
            .unwrap();
        let token = login(&service, "alice@example.com", "Abc12345!")
            .await
            .unwrap()
            .data
            .unwrap()
            .token;

        let mut request = Request::new(ValidateTokenRequest {});
        request
            .metadata_mut()
            .insert(AUTHORIZATION, format!("Bearer {}", token).parse().unwrap());
        let validated = service.validate_token(request).await.unwrap().into_inner();
        assert_eq!(validated.data.unwrap().subject, "alice@example.com");

        let header = format!("bearer {}", token);
        assert!(logout(&service, Some(&header)).await.is_ok());
    }

    #[test]
    fn test_presented_token_parsing() {
        let mut metadata = MetadataMap::new();
        assert!(matches!(
            presented_token(&metadata),
            Err(AuthError::MissingToken)
        ));

        metadata.insert(AUTHORIZATION, "abc.def.ghi".parse().unwrap());
        assert_eq!(presented_token(&metadata).unwrap(), "abc.def.ghi");

        metadata.insert(AUTHORIZATION, "Bearer  abc.def.ghi ".parse().unwrap());
        assert_eq!(presented_token(&metadata).unwrap(), "abc.def.ghi");
    }
}
