//! Auth gate: an ordered pipeline of capability checks run before a controller.
//!
//! Endpoints declare their requirement with a [`Gate`]. The type parameter tracks how far
//! the chain has been built, so `authorize` is only reachable after `verify`:
//!
//! ```ignore
//! Gate::public()                          // no checks
//! Gate::verify()                          // bearer token must verify
//! Gate::verify().authorize(&[Role::Admin]) // ...and the role must be in the allow-set
//! ```
//!
//! Each stage either passes or short-circuits with an [`AuthError`], which the error
//! envelope turns into a 401/403 response. A verified [`Principal`] is inserted into the
//! request extensions for downstream handlers.

use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use std::marker::PhantomData;
use std::sync::Arc;

use crate::auth::{AuthError, JwtKeys, Principal, Role};
use crate::error::ApiError;

const NO_TOKEN: &str = "Not authorized, no token";

/// Gate state markers
#[derive(Debug, Clone, Copy)]
pub struct Open;
#[derive(Debug, Clone, Copy)]
pub struct Verified;
#[derive(Debug, Clone, Copy)]
pub struct Authorized;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stage {
    Verify,
    Authorize(Vec<Role>),
}

/// Access requirement for one endpoint
#[derive(Debug, Clone)]
pub struct Gate<S> {
    stages: Vec<Stage>,
    _state: PhantomData<S>,
}

impl Gate<Open> {
    pub fn public() -> Self {
        Gate {
            stages: Vec::new(),
            _state: PhantomData,
        }
    }

    pub fn verify() -> Gate<Verified> {
        Gate {
            stages: vec![Stage::Verify],
            _state: PhantomData,
        }
    }
}

impl Gate<Verified> {
    pub fn authorize(mut self, roles: &[Role]) -> Gate<Authorized> {
        self.stages.push(Stage::Authorize(roles.to_vec()));
        Gate {
            stages: self.stages,
            _state: PhantomData,
        }
    }
}

impl<S> Gate<S> {
    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn is_public(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn into_pipeline(self, keys: Arc<JwtKeys>) -> Pipeline {
        Pipeline {
            stages: self.stages.into(),
            keys,
        }
    }
}

/// A gate bound to the signing keys, ready to run as middleware state
#[derive(Clone)]
pub struct Pipeline {
    stages: Arc<[Stage]>,
    keys: Arc<JwtKeys>,
}

impl Pipeline {
    /// Run every stage in order. Returns the verified principal, if a Verify stage ran.
    pub fn check(&self, headers: &HeaderMap) -> Result<Option<Principal>, AuthError> {
        let mut principal: Option<Principal> = None;

        for stage in self.stages.iter() {
            match stage {
                Stage::Verify => {
                    let token = bearer_token(headers)?;
                    principal = Some(self.keys.verify(token)?);
                }
                Stage::Authorize(roles) => {
                    let current = principal.as_ref().ok_or(AuthError::Unauthenticated(NO_TOKEN))?;
                    current.authorize(roles)?;
                }
            }
        }

        Ok(principal)
    }
}

/// Middleware entry point; see [`Pipeline::check`]
pub async fn enforce(
    State(pipeline): State<Pipeline>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    match pipeline.check(request.headers()) {
        Ok(Some(principal)) => {
            tracing::debug!("{} {} as {} ({})", request.method(), request.uri().path(), principal.id, principal.role);
            request.extensions_mut().insert(principal);
        }
        Ok(None) => {}
        Err(e) => {
            tracing::debug!("{} {} rejected: {}", request.method(), request.uri().path(), e);
            return Err(e.into());
        }
    }

    Ok(next.run(request).await)
}

/// Extract the token from `Authorization: Bearer <token>`. Any other shape counts as no token.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let missing = AuthError::Unauthenticated(NO_TOKEN);

    let value = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| missing.clone())?;

    match value.trim().split_once(' ') {
        Some((scheme, token)) if scheme.eq_ignore_ascii_case("bearer") && !token.trim().is_empty() => {
            Ok(token.trim())
        }
        _ => Err(missing),
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Principal
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Principal>()
            .cloned()
            .ok_or_else(|| ApiError::unauthorized(NO_TOKEN))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use std::time::Duration;

    fn keys() -> Arc<JwtKeys> {
        Arc::new(JwtKeys::new("gate-secret", Duration::from_secs(600)))
    }

    fn headers(authorization: Option<&str>) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Some(value) = authorization {
            headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        }
        headers
    }

    #[test]
    fn extracts_bearer_tokens() {
        assert_eq!(bearer_token(&headers(Some("Bearer abc.def"))).unwrap(), "abc.def");
        assert_eq!(bearer_token(&headers(Some("bearer   abc"))).unwrap(), "abc");
        assert!(bearer_token(&headers(None)).is_err());
        assert!(bearer_token(&headers(Some("Bearer"))).is_err());
        assert!(bearer_token(&headers(Some("Bearer    "))).is_err());
        assert_eq!(
            bearer_token(&headers(Some("Basic dXNlcjpwYXNz"))),
            Err(AuthError::Unauthenticated(NO_TOKEN))
        );
    }

    #[test]
    fn builder_orders_stages() {
        assert!(Gate::public().is_public());
        assert_eq!(Gate::verify().stages(), &[Stage::Verify]);
        assert_eq!(
            Gate::verify().authorize(&[Role::Admin]).stages(),
            &[Stage::Verify, Stage::Authorize(vec![Role::Admin])]
        );
    }

    #[test]
    fn public_pipeline_passes_without_token() {
        let pipeline = Gate::public().into_pipeline(keys());
        assert_eq!(pipeline.check(&headers(None)), Ok(None));
    }

    #[test]
    fn verify_requires_token() {
        let pipeline = Gate::verify().into_pipeline(keys());
        assert_eq!(
            pipeline.check(&headers(None)),
            Err(AuthError::Unauthenticated(NO_TOKEN))
        );
        assert_eq!(
            pipeline.check(&headers(Some("Bearer junk"))),
            Err(AuthError::InvalidToken)
        );
    }

    #[test]
    fn authorize_short_circuits_on_role() {
        let keys = keys();
        let pipeline = Gate::verify().authorize(&[Role::Admin]).into_pipeline(keys.clone());

        let user = keys.issue(&Principal::new("u1", Role::User)).unwrap();
        assert_eq!(
            pipeline.check(&headers(Some(&format!("Bearer {}", user)))),
            Err(AuthError::Forbidden { role: Role::User })
        );

        let admin = Principal::new("a1", Role::Admin);
        let token = keys.issue(&admin).unwrap();
        assert_eq!(
            pipeline.check(&headers(Some(&format!("Bearer {}", token)))),
            Ok(Some(admin))
        );
    }
}
