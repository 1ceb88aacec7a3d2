//! Static route table.
//!
//! Route groups are registered through [`AppBuilder`], and [`AppBuilder::finish`] is the only
//! way to obtain a servable `Router`. `finish` always installs the terminal stages: the 404
//! fallback, request tracing, CORS, and panic-to-500 translation as the outermost layer.

use axum::{
    handler::Handler,
    http::{HeaderValue, Method, Uri},
    middleware::from_fn_with_state,
    response::{IntoResponse, Response},
    routing::{self, MethodRouter},
    Extension, Router,
};
use std::any::Any;
use std::sync::Arc;
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{AllowOrigin, Any as AnyOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::auth::{JwtKeys, Role};
use crate::error::ApiError;
use crate::handlers::resources::{self, Collection};
use crate::handlers::{protected, public};
use crate::middleware::gate::{self, Gate};
use crate::state::AppState;

const ADMIN: &[Role] = &[Role::Admin];

/// Build the complete application router
pub fn build(state: AppState) -> Router {
    app(state).finish()
}

/// The route table, before the terminal stages are attached
pub fn app(state: AppState) -> AppBuilder {
    use public::auth;

    AppBuilder::new(state)
        .group("", |g| g.get("/", Gate::public(), public::root))
        .group("/api/health", |g| g.get("/", Gate::public(), public::health))
        .group("/api/auth", |g| {
            g.post("/register", Gate::public(), auth::register_post)
                .post("/login", Gate::public(), auth::login_post)
                .get("/me", Gate::verify(), protected::auth::me_get)
        })
        .group("/api/users", |g| {
            g.get("/", Gate::verify().authorize(ADMIN), protected::users_get)
        })
        .resource_group("/api/temples", Collection("temples"), catalogue)
        .resource_group("/api/services", Collection("services"), catalogue)
        .resource_group("/api/content", Collection("content"), catalogue)
        .resource_group("/api/bookings", Collection("bookings"), member_records)
        .resource_group("/api/subscriptions", Collection("subscriptions"), member_records)
}

/// Publicly readable, admin-maintained
fn catalogue(g: RouteGroup) -> RouteGroup {
    g.get("/", Gate::public(), resources::list)
        .get("/:id", Gate::public(), resources::get_one)
        .post("/", Gate::verify().authorize(ADMIN), resources::create)
        .put("/:id", Gate::verify().authorize(ADMIN), resources::update)
        .delete("/:id", Gate::verify().authorize(ADMIN), resources::remove)
}

/// Signed-in users create and read; admins amend and cancel
fn member_records(g: RouteGroup) -> RouteGroup {
    g.get("/", Gate::verify(), resources::list)
        .get("/:id", Gate::verify(), resources::get_one)
        .post("/", Gate::verify(), resources::create)
        .put("/:id", Gate::verify().authorize(ADMIN), resources::update)
        .delete("/:id", Gate::verify().authorize(ADMIN), resources::remove)
}

pub struct AppBuilder {
    state: AppState,
    router: Router<AppState>,
    routes: Vec<String>,
}

impl AppBuilder {
    pub fn new(state: AppState) -> Self {
        Self {
            state,
            router: Router::new(),
            routes: Vec::new(),
        }
    }

    /// Mount a group of endpoints under `prefix`
    pub fn group(self, prefix: &'static str, build: impl FnOnce(RouteGroup) -> RouteGroup) -> Self {
        self.mount(prefix, None, build)
    }

    /// Mount a group whose handlers operate on `collection`
    pub fn resource_group(
        self,
        prefix: &'static str,
        collection: Collection,
        build: impl FnOnce(RouteGroup) -> RouteGroup,
    ) -> Self {
        self.mount(prefix, Some(collection), build)
    }

    fn mount(
        mut self,
        prefix: &'static str,
        collection: Option<Collection>,
        build: impl FnOnce(RouteGroup) -> RouteGroup,
    ) -> Self {
        let group = build(RouteGroup {
            prefix,
            keys: self.state.keys.clone(),
            collection,
            paths: Vec::new(),
            routes: Vec::new(),
        });

        for (path, methods) in group.paths {
            let methods = methods.fallback(method_not_allowed);
            // `/api/users/` reaches the same endpoints as `/api/users`
            if path != "/" {
                self.router = self.router.route(&format!("{}/", path), methods.clone());
            }
            self.router = self.router.route(&path, methods);
        }
        self.routes.extend(group.routes);
        self
    }

    /// `METHOD /path` for every registered endpoint, in registration order
    pub fn available_routes(&self) -> &[String] {
        &self.routes
    }

    pub fn finish(self) -> Router {
        let available: Arc<[String]> = self.routes.into();
        let cors = cors_layer(&self.state.config.security.cors_origins);

        self.router
            .fallback(move |uri: Uri| {
                let available = available.clone();
                async move {
                    let path = uri.path_and_query().map(|p| p.as_str()).unwrap_or("/").to_string();
                    tracing::debug!("No route for {}", path);
                    ApiError::route_not_found(path, available.to_vec())
                }
            })
            .with_state(self.state)
            .layer(cors)
            .layer(TraceLayer::new_for_http())
            .layer(CatchPanicLayer::custom(panic_response))
    }
}

/// Endpoints sharing a path prefix (and optionally a collection)
pub struct RouteGroup {
    prefix: &'static str,
    keys: Arc<JwtKeys>,
    collection: Option<Collection>,
    paths: Vec<(String, MethodRouter<AppState>)>,
    routes: Vec<String>,
}

impl RouteGroup {
    pub fn get<H, T, S>(self, path: &str, gate: Gate<S>, handler: H) -> Self
    where
        H: Handler<T, AppState>,
        T: 'static,
    {
        self.endpoint("GET", path, gate, routing::get(handler))
    }

    pub fn post<H, T, S>(self, path: &str, gate: Gate<S>, handler: H) -> Self
    where
        H: Handler<T, AppState>,
        T: 'static,
    {
        self.endpoint("POST", path, gate, routing::post(handler))
    }

    pub fn put<H, T, S>(self, path: &str, gate: Gate<S>, handler: H) -> Self
    where
        H: Handler<T, AppState>,
        T: 'static,
    {
        self.endpoint("PUT", path, gate, routing::put(handler))
    }

    pub fn delete<H, T, S>(self, path: &str, gate: Gate<S>, handler: H) -> Self
    where
        H: Handler<T, AppState>,
        T: 'static,
    {
        self.endpoint("DELETE", path, gate, routing::delete(handler))
    }

    fn endpoint<S>(
        mut self,
        method: &'static str,
        path: &str,
        gate: Gate<S>,
        mut route: MethodRouter<AppState>,
    ) -> Self {
        let full_path = join_path(self.prefix, path);

        if let Some(collection) = self.collection {
            route = route.layer(Extension(collection));
        }
        if !gate.is_public() {
            let pipeline = gate.into_pipeline(self.keys.clone());
            route = route.route_layer(from_fn_with_state(pipeline, gate::enforce));
        }

        self.routes.push(format!("{} {}", method, full_path));
        match self.paths.iter().position(|(path, _)| *path == full_path) {
            Some(idx) => {
                let (path, existing) = self.paths.swap_remove(idx);
                self.paths.push((path, existing.merge(route)));
            }
            None => self.paths.push((full_path, route)),
        }
        self
    }
}

/// Known path, unsupported method
async fn method_not_allowed(method: Method, uri: Uri) -> ApiError {
    ApiError::method_not_allowed(method.as_str(), uri.path())
}

fn join_path(prefix: &str, path: &str) -> String {
    match (prefix, path) {
        ("", "/") => "/".to_string(),
        (prefix, "/") => prefix.to_string(),
        (prefix, path) => format!("{}{}", prefix, path),
    }
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|o| o == "*") {
        return CorsLayer::permissive();
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods(AnyOrigin)
        .allow_headers(AnyOrigin)
}

/// Terminal translation for panics: log the payload, answer with a generic 500 envelope
fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic payload".to_string()
    };
    tracing::error!("Request handler panicked: {}", detail);

    ApiError::internal_server_error("Internal server error").into_response()
}
