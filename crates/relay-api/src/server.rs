//! HTTP API Server
//!
//! Builds the application context and the axum router, and runs the server.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{Router, extract::DefaultBodyLimit};
use http::{HeaderValue, Method};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use relay_core::{AllowList, Config, ReplyStore, ServerConfig};
use relay_telephony::{ExotelClient, TwilioSmsClient};
use relay_whatsapp::{MessageSender, WebhookState, WhatsAppClient, create_webhook_router};

use crate::routes::routes;

/// JSON request bodies above this size are rejected
pub const BODY_LIMIT_BYTES: usize = 1024 * 1024;

/// Limit for media uploads, which bypass the JSON limit
pub const MEDIA_BODY_LIMIT_BYTES: usize = 16 * 1024 * 1024;

/// Shared application context.
///
/// Created once at startup; clones share the same stores. Nothing needs
/// tearing down since nothing is persisted.
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<Config>,
    pub sender: Arc<dyn MessageSender>,
    pub whatsapp: Arc<WhatsAppClient>,
    pub allow_list: AllowList,
    pub replies: ReplyStore,
    pub exotel: Arc<ExotelClient>,
    pub twilio: Arc<TwilioSmsClient>,
}

impl AppContext {
    /// Context talking to the real WhatsApp Cloud API
    pub fn new(config: Config) -> Self {
        let whatsapp = Arc::new(WhatsAppClient::new(&config.whatsapp));
        let mut ctx = Self::with_sender(config, whatsapp.clone());
        ctx.whatsapp = whatsapp;
        ctx
    }

    /// Context with a caller-supplied outbound sender. Media uploads still
    /// go to the configured Graph API.
    pub fn with_sender(config: Config, sender: Arc<dyn MessageSender>) -> Self {
        Self {
            whatsapp: Arc::new(WhatsAppClient::new(&config.whatsapp)),
            exotel: Arc::new(ExotelClient::new(&config.exotel)),
            twilio: Arc::new(TwilioSmsClient::new(&config.twilio)),
            config: Arc::new(config),
            sender,
            allow_list: AllowList::new(),
            replies: ReplyStore::new(),
        }
    }

    /// State for the webhook routes, sharing this context's stores
    pub fn webhook_state(&self) -> WebhookState {
        WebhookState {
            sender: Arc::clone(&self.sender),
            allow_list: self.allow_list.clone(),
            replies: self.replies.clone(),
            config: Arc::new(self.config.whatsapp.clone()),
        }
    }
}

/// CORS for the admin console: GET and POST from the configured origin
fn cors_layer(server: &ServerConfig) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    match server.allowed_origin.as_deref() {
        None | Some("*") => cors.allow_origin(Any),
        Some(origin) => match HeaderValue::from_str(origin) {
            Ok(value) => cors.allow_origin(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin {:?}, allowing any", origin);
                cors.allow_origin(Any)
            }
        },
    }
}

/// Build the full application router
pub fn build_app(ctx: AppContext) -> Router {
    let static_dir = PathBuf::from(&ctx.config.server.static_dir);
    let console = ServeDir::new(&static_dir).fallback(ServeFile::new(static_dir.join("index.html")));
    let cors = cors_layer(&ctx.config.server);
    let webhook = create_webhook_router(ctx.webhook_state());

    Router::new()
        .merge(routes().with_state(ctx))
        .merge(webhook)
        .fallback_service(console)
        .layer(DefaultBodyLimit::max(BODY_LIMIT_BYTES))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Start the HTTP server
pub async fn start_server(config: Config) -> anyhow::Result<()> {
    let port = config.server.port;
    let app = build_app(AppContext::new(config));

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("HTTP server listening on http://{}", addr);
    info!("Webhook URL: http://localhost:{}/webhook", port);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
