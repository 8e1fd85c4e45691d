//! Demo server: signs users in with Facebook and remembers them in a private cookie.

use std::time::Duration;

use app_core::config::Config;
use app_core::middleware::request_response_logger;
use app_core::oauth::OAuth2Options;
use axum::extract::Extension;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router, middleware, routing};
use base64::Engine as _;
use base64::engine::general_purpose;
use dmv::FacebookLogin;
use tokio::signal;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_cookies::{Cookie, CookieManagerLayer, Cookies, Key};
use tower_http::timeout::TimeoutLayer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

const SESSION_COOKIE: &str = "uid";
const LOGIN_PATH: &str = "/auth/facebook";

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(fmt::layer().json().with_target(true).with_file(true).with_line_number(true))
        .init();

    if let Err(err) = run().await {
        panic!("❌ Application failed to start: {err}");
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::builder("config/config.yaml").build()?;

    let facebook = dmv::new(dmv::Dependency {
        options: facebook_options(&config)?,
        profile_url: config.get("oauth.facebook.profile_url").ok(),
    })?;

    let cookie_key = Key::try_from(general_purpose::STANDARD.decode(config.get::<String>("session.secret")?)?.as_slice())?;
    let timeout = Duration::from_secs(config.get_or("server.timeout_secs", 30));

    let app = app(facebook, cookie_key, timeout)?;

    let server_address = config.get_or("server.address", "127.0.0.1:8080".to_string());
    let listener = tokio::net::TcpListener::bind(&server_address).await?;

    tracing::info!("🚀 listening on {}", listener.local_addr()?);

    let (shutdown_tx, _) = broadcast::channel(1);
    spawn_shutdown_listener(shutdown_tx.clone());

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_tx.subscribe().recv().await.ok();
            tracing::info!("🛑 Server is shutting down gracefully...");
        })
        .await?;

    Ok(())
}

fn facebook_options(config: &Config) -> Result<OAuth2Options, app_core::config::ConfigError> {
    let options: OAuth2Options = config.get("oauth.facebook")?;
    if options.scopes.is_empty() {
        return Ok(options.with_scopes(["email"]));
    }
    Ok(options)
}

fn app(facebook: dmv::FacebookState, cookie_key: Key, timeout: Duration) -> Result<Router, dmv::RouteError> {
    let app = Router::new()
        .merge(dmv::create_router(facebook, LOGIN_PATH, on_facebook_callback)?)
        .route("/", routing::get(home))
        .fallback(|| async { (StatusCode::NOT_FOUND, Json(serde_json::json!({"message": "Endpoint not found"}))) })
        .layer(
            ServiceBuilder::new()
                .layer(middleware::from_fn(request_response_logger))
                .layer(CookieManagerLayer::new())
                .layer(Extension(cookie_key))
                .layer(TimeoutLayer::new(timeout)),
        );

    Ok(app)
}

async fn home(Extension(key): Extension<Key>, cookies: Cookies) -> Response {
    match cookies.private(&key).get(SESSION_COOKIE) {
        Some(uid) => format!("Welcome, Facebook user {}.", uid.value()).into_response(),
        None => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
            format!(r#"<a href="{LOGIN_PATH}">Log in with Facebook</a>"#),
        )
            .into_response(),
    }
}

async fn on_facebook_callback(Extension(key): Extension<Key>, cookies: Cookies, login: FacebookLogin) -> Response {
    let Some(profile) = login.verified_profile() else {
        for err in &login.errors {
            tracing::warn!(error = %err, "Facebook login failed");
        }
        return (StatusCode::INTERNAL_SERVER_ERROR, "OAuth failure").into_response();
    };

    tracing::info!(user_id = %profile.id, "Facebook login succeeded");

    let mut cookie = Cookie::new(SESSION_COOKIE, profile.id.clone());
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookies.private(&key).add(cookie);

    (StatusCode::FOUND, [(header::LOCATION, "/")]).into_response()
}

fn spawn_shutdown_listener(shutdown_tx: broadcast::Sender<()>) {
    tokio::spawn(async move {
        let ctrl_c = async {
            if let Err(err) = signal::ctrl_c().await {
                tracing::error!("Failed to listen for Ctrl+C: {err}");
                std::future::pending::<()>().await;
            }
        };

        #[cfg(unix)]
        let terminate = async {
            match signal::unix::signal(signal::unix::SignalKind::terminate()) {
                Ok(mut sigterm) => {
                    sigterm.recv().await;
                },
                Err(err) => {
                    tracing::error!("Failed to install SIGTERM handler: {err}");
                    std::future::pending::<()>().await;
                },
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => { tracing::info!("🔻 Received SIGINT (Ctrl+C)")},
            _ = terminate => { tracing::info!("🔻 Received SIGTERM")},
        }

        if shutdown_tx.send(()).is_err() {
            tracing::error!("Failed to send shutdown signal");
        }
    });
}
