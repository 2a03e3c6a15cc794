//! Route definitions
//!
//! Defines the relay's JSON API. The webhook routes live in
//! `relay_whatsapp` and are merged in by the server.

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};

use crate::handlers::{
    health, make_call, rsvp_status, send_location, send_media, send_messages, send_otp,
    send_sms, send_template, upload_media,
};
use crate::server::{AppContext, MEDIA_BODY_LIMIT_BYTES};

/// Create the API router
pub fn routes() -> Router<AppContext> {
    Router::new()
        // Health check
        .route("/health", get(health))
        // WhatsApp dispatch
        .route("/api/send-messages", post(send_messages))
        .route("/api/send-template", post(send_template))
        .route("/api/send-otp", post(send_otp))
        .route("/api/send-location", post(send_location))
        .route("/api/send-media", post(send_media))
        .route(
            "/api/upload-media",
            post(upload_media).layer(DefaultBodyLimit::max(MEDIA_BODY_LIMIT_BYTES)),
        )
        .route("/api/rsvp-status", get(rsvp_status))
        // Voice and SMS
        .route("/api/make-call", post(make_call))
        .route("/send-sms", post(send_sms))
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode};
    use serde_json::{Value, json};
    use tower::ServiceExt;
    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use relay_core::Config;
    use relay_whatsapp::{
        MessageSender, OutboundMessage, SendReceipt, WhatsAppError, Result as WaResult,
    };

    use crate::server::{AppContext, build_app};

    /// Fake provider: records sends, fails for the listed numbers
    #[derive(Default)]
    struct FakeSender {
        sent: Mutex<Vec<(String, OutboundMessage)>>,
        failing: Vec<String>,
    }

    impl FakeSender {
        fn failing(numbers: &[&str]) -> Self {
            Self {
                failing: numbers.iter().map(|n| n.to_string()).collect(),
                ..Self::default()
            }
        }

        fn recipients(&self) -> Vec<String> {
            self.sent.lock().unwrap().iter().map(|(to, _)| to.clone()).collect()
        }
    }

    #[async_trait::async_trait]
    impl MessageSender for FakeSender {
        async fn send(&self, to: &str, message: &OutboundMessage) -> WaResult<SendReceipt> {
            self.sent
                .lock()
                .unwrap()
                .push((to.to_string(), message.clone()));
            if self.failing.iter().any(|n| n == to) {
                return Err(WhatsAppError::Api {
                    status: 400,
                    body: json!({"error": {"message": "Invalid recipient"}}),
                });
            }
            Ok(SendReceipt {
                message_id: Some(format!("wamid.{to}")),
            })
        }
    }

    fn test_config() -> Config {
        let mut config = Config::default();
        config.whatsapp.verify_token = "s3cret".to_string();
        config.server.static_dir = "/nonexistent-console".to_string();
        config
    }

    fn context(sender: Arc<FakeSender>) -> AppContext {
        AppContext::with_sender(test_config(), sender)
    }

    async fn request_json(app: axum::Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if body.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body).unwrap()
        };
        (status, json)
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::post(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::get(uri).body(Body::empty()).unwrap()
    }

    // --- Bulk dispatch ---

    #[tokio::test]
    async fn test_send_messages_partial_failure() {
        let sender = Arc::new(FakeSender::failing(&["15550102"]));
        let ctx = context(sender.clone());
        let app = build_app(ctx.clone());

        let (status, body) = request_json(
            app,
            post_json(
                "/api/send-messages",
                json!({
                    "message": "Hi",
                    "phoneNumbers": ["+1 555 0101", "+1 555 0102", "+1 555 0103"]
                }),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["sent"], 3);
        assert_eq!(body["autoReplyEnabledFor"], json!(["15550101", "15550103"]));

        let results = body["results"].as_array().unwrap();
        assert_eq!(results[0], json!({"number": "15550101", "success": true, "messageId": "wamid.15550101"}));
        assert_eq!(results[1]["number"], "15550102");
        assert_eq!(results[1]["success"], false);
        assert_eq!(results[1]["error"]["error"]["message"], "Invalid recipient");
        assert_eq!(results[2]["success"], true);

        assert!(!ctx.allow_list.contains("15550102").await);
        assert_eq!(sender.recipients(), vec!["15550101", "15550102", "15550103"]);
    }

    #[tokio::test]
    async fn test_send_messages_skips_blank_numbers() {
        let sender = Arc::new(FakeSender::default());
        let app = build_app(context(sender.clone()));

        let (status, body) = request_json(
            app,
            post_json(
                "/api/send-messages",
                json!({"message": "Hi", "phoneNumbers": ["  ", 42, "15550100"]}),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["sent"], 1);
        assert_eq!(sender.recipients(), vec!["15550100"]);
    }

    #[tokio::test]
    async fn test_send_messages_preview_flag() {
        let sender = Arc::new(FakeSender::default());
        let app = build_app(context(sender.clone()));

        let (status, _) = request_json(
            app,
            post_json(
                "/api/send-messages",
                json!({"message": "https://example.com", "phoneNumbers": ["1"], "previewUrl": true}),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            sender.sent.lock().unwrap()[0].1,
            OutboundMessage::text_with_preview("https://example.com", Some(true))
        );
    }

    #[tokio::test]
    async fn test_send_messages_validation() {
        let sender = Arc::new(FakeSender::default());
        let app = build_app(context(sender.clone()));

        for payload in [
            json!({"phoneNumbers": ["15550100"]}),
            json!({"message": "", "phoneNumbers": ["15550100"]}),
            json!({"message": 7, "phoneNumbers": ["15550100"]}),
            json!({"message": "Hi"}),
            json!({"message": "Hi", "phoneNumbers": []}),
            json!({"message": "Hi", "phoneNumbers": "15550100"}),
        ] {
            let (status, body) =
                request_json(app.clone(), post_json("/api/send-messages", payload.clone())).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "payload {payload}");
            assert!(body["error"].is_string());
        }

        let malformed = Request::post("/api/send-messages")
            .header("content-type", "application/json")
            .body(Body::from("{"))
            .unwrap();
        let (status, _) = request_json(app, malformed).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        assert!(sender.recipients().is_empty());
    }

    #[tokio::test]
    async fn test_send_template_does_not_enable_auto_reply() {
        let sender = Arc::new(FakeSender::default());
        let ctx = context(sender.clone());
        let app = build_app(ctx.clone());

        let (status, body) = request_json(
            app,
            post_json(
                "/api/send-template",
                json!({
                    "phoneNumbers": ["+91 98765 43210"],
                    "template": {
                        "name": "google_map_template",
                        "components": [{"type": "header", "parameters": [{
                            "type": "location",
                            "location": {"latitude": 12.97, "longitude": 77.59,
                                         "name": "Venue", "address": "MG Road"}
                        }]}]
                    }
                }),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["results"][0]["number"], "919876543210");
        assert!(ctx.allow_list.is_empty().await);

        let sent = sender.sent.lock().unwrap();
        let OutboundMessage::Template { template } = &sent[0].1 else {
            panic!("expected a template message");
        };
        assert_eq!(template.name, "google_map_template");
        assert_eq!(template.language.code, "en");
        assert_eq!(template.components.len(), 1);
    }

    #[tokio::test]
    async fn test_send_template_validation() {
        let app = build_app(context(Arc::default()));

        for payload in [
            json!({"phoneNumbers": ["1"]}),
            json!({"phoneNumbers": ["1"], "template": {"name": ""}}),
            json!({"phoneNumbers": ["1"], "template": {"name": "x", "components": [{"type": "footer"}]}}),
            json!({"template": {"name": "x"}}),
        ] {
            let (status, _) =
                request_json(app.clone(), post_json("/api/send-template", payload.clone())).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "payload {payload}");
        }
    }

    fn sent_template(sender: &FakeSender, index: usize) -> Value {
        let sent = sender.sent.lock().unwrap();
        let OutboundMessage::Template { template } = &sent[index].1 else {
            panic!("expected a template message");
        };
        serde_json::to_value(template).unwrap()
    }

    // --- Console template sends ---

    #[tokio::test]
    async fn test_send_otp() {
        let sender = Arc::new(FakeSender::default());
        let ctx = context(sender.clone());
        let app = build_app(ctx.clone());

        let (status, body) = request_json(
            app,
            post_json(
                "/api/send-otp",
                json!({"phoneNumber": "+12015553931", "code": "482910"}),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["sent"], 1);
        assert_eq!(body["results"][0]["number"], "12015553931");
        assert_eq!(
            sent_template(&sender, 0),
            json!({
                "name": "calibrecueauth",
                "language": {"code": "en"},
                "components": [
                    {"type": "body", "parameters": [{"type": "text", "text": "482910"}]},
                    {"type": "button", "sub_type": "url", "index": 0,
                     "parameters": [{"type": "text", "text": "482910"}]}
                ]
            })
        );
        assert!(ctx.allow_list.is_empty().await);
    }

    #[tokio::test]
    async fn test_send_otp_validation() {
        let sender = Arc::new(FakeSender::default());
        let app = build_app(context(sender.clone()));

        for payload in [
            json!({"phoneNumber": "12015553931", "code": "123456"}),
            json!({"phoneNumber": "+1 201 555 3931", "code": "123456"}),
            json!({"phoneNumber": "+12015553931"}),
            json!({"phoneNumber": "+12015553931", "code": "12ab"}),
        ] {
            let (status, _) =
                request_json(app.clone(), post_json("/api/send-otp", payload.clone())).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "payload {payload}");
        }
        assert!(sender.recipients().is_empty());
    }

    #[tokio::test]
    async fn test_send_location() {
        let sender = Arc::new(FakeSender::failing(&["15550102"]));
        let app = build_app(context(sender.clone()));

        let (status, body) = request_json(
            app,
            post_json(
                "/api/send-location",
                json!({
                    "phoneNumbers": ["15550101", "15550102"],
                    "location": {"latitude": 12.97, "longitude": 77.59,
                                 "name": "Venue", "address": "MG Road"}
                }),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["results"][0]["success"], true);
        assert_eq!(body["results"][1]["success"], false);

        let template = sent_template(&sender, 1);
        assert_eq!(template["name"], "google_map_template");
        assert_eq!(
            template["components"][0]["parameters"][0]["location"]["address"],
            "MG Road"
        );
    }

    #[tokio::test]
    async fn test_send_location_validation() {
        let app = build_app(context(Arc::default()));

        for payload in [
            json!({"phoneNumbers": ["1"]}),
            json!({"phoneNumbers": ["1"], "location": {"latitude": "north"}}),
            json!({"location": {"latitude": 1.0, "longitude": 2.0, "name": "a", "address": "b"}}),
        ] {
            let (status, _) =
                request_json(app.clone(), post_json("/api/send-location", payload.clone())).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "payload {payload}");
        }
    }

    #[tokio::test]
    async fn test_send_media_defaults_per_kind() {
        let sender = Arc::new(FakeSender::default());
        let app = build_app(context(sender.clone()));

        let (status, _) = request_json(
            app.clone(),
            post_json(
                "/api/send-media",
                json!({"phoneNumbers": ["15550101"], "mediaType": "document", "mediaId": "m-1"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = request_json(
            app,
            post_json(
                "/api/send-media",
                json!({
                    "phoneNumbers": ["15550101"], "mediaType": "image", "mediaId": "m-2",
                    "templateName": "spring_sale", "languageCode": "en_US"
                }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let document = sent_template(&sender, 0);
        assert_eq!(document["name"], "order_invoice1");
        assert_eq!(
            document["components"][0]["parameters"][0],
            json!({"type": "document", "document": {"id": "m-1", "filename": "Invoice.pdf"}})
        );

        let image = sent_template(&sender, 1);
        assert_eq!(image["name"], "spring_sale");
        assert_eq!(image["language"]["code"], "en_US");
        assert_eq!(
            image["components"][0]["parameters"][0],
            json!({"type": "image", "image": {"id": "m-2"}})
        );
    }

    #[tokio::test]
    async fn test_send_media_validation() {
        let app = build_app(context(Arc::default()));

        for payload in [
            json!({"phoneNumbers": ["1"], "mediaType": "image"}),
            json!({"phoneNumbers": ["1"], "mediaType": "video", "mediaId": "m"}),
            json!({"mediaType": "image", "mediaId": "m"}),
        ] {
            let (status, _) =
                request_json(app.clone(), post_json("/api/send-media", payload.clone())).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "payload {payload}");
        }
    }

    // --- Media upload ---

    const BOUNDARY: &str = "relay-upload-boundary";

    fn upload_request(media_type: Option<&str>, file: Option<(&str, &str, &[u8])>) -> Request<Body> {
        let mut body = Vec::new();
        if let Some(kind) = media_type {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"mediaType\"\r\n\r\n{kind}\r\n"
                )
                .as_bytes(),
            );
        }
        if let Some((filename, content_type, data)) = file {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\nContent-Type: {content_type}\r\n\r\n"
                )
                .as_bytes(),
            );
            body.extend_from_slice(data);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

        Request::post("/api/upload-media")
            .header(
                "content-type",
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    fn graph_context(server: &MockServer, sender: Arc<FakeSender>) -> AppContext {
        let mut config = test_config();
        config.whatsapp.base_url = server.uri();
        config.whatsapp.phone_number_id = "1234".to_string();
        config.whatsapp.access_token = "EAAB-token".to_string();
        AppContext::with_sender(config, sender)
    }

    #[tokio::test]
    async fn test_upload_then_send_media() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v22.0/1234/media"))
            .and(header("authorization", "Bearer EAAB-token"))
            .and(body_string_contains("filename=\"invoice.pdf\""))
            .and(body_string_contains("application/pdf"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "media-7"})))
            .expect(1)
            .mount(&server)
            .await;

        let sender = Arc::new(FakeSender::default());
        let app = build_app(graph_context(&server, sender.clone()));

        let (status, body) = request_json(
            app.clone(),
            upload_request(None, Some(("invoice.pdf", "application/pdf", &b"%PDF-1.4"[..]))),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({"success": true, "mediaId": "media-7", "mediaType": "document"})
        );

        let (status, _) = request_json(
            app,
            post_json(
                "/api/send-media",
                json!({
                    "phoneNumbers": ["15550101"],
                    "mediaType": body["mediaType"],
                    "mediaId": body["mediaId"],
                    "filename": "invoice.pdf"
                }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            sent_template(&sender, 0)["components"][0]["parameters"][0]["document"],
            json!({"id": "media-7", "filename": "invoice.pdf"})
        );
    }

    #[tokio::test]
    async fn test_upload_declared_kind_and_large_file() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v22.0/1234/media"))
            .and(body_string_contains("image/jpeg"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "media-8"})))
            .expect(1)
            .mount(&server)
            .await;

        let app = build_app(graph_context(&server, Arc::default()));
        let photo = vec![7u8; 2 * 1024 * 1024];

        let (status, body) = request_json(
            app,
            upload_request(
                Some("image"),
                Some(("photo.jpg", "application/octet-stream", photo.as_slice())),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["mediaType"], "image");
        assert_eq!(body["mediaId"], "media-8");
    }

    #[tokio::test]
    async fn test_upload_rejection_is_relayed() {
        let server = MockServer::start().await;
        let error_body = json!({"error": {"message": "Invalid OAuth access token", "code": 190}});
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_json(error_body.clone()))
            .mount(&server)
            .await;

        let app = build_app(graph_context(&server, Arc::default()));
        let (status, body) = request_json(
            app,
            upload_request(None, Some(("photo.png", "image/png", &b"png"[..]))),
        )
        .await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, error_body);
    }

    #[tokio::test]
    async fn test_upload_validation() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "x"})))
            .expect(0)
            .mount(&server)
            .await;

        let app = build_app(graph_context(&server, Arc::default()));

        let (status, _) = request_json(app.clone(), upload_request(Some("image"), None)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = request_json(
            app.clone(),
            upload_request(Some("video"), Some(("a.mp4", "video/mp4", &b"x"[..]))),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = request_json(app, post_json("/api/upload-media", json!({}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    // --- Reply status and end-to-end flow ---

    #[tokio::test]
    async fn test_rsvp_status_starts_empty() {
        let app = build_app(context(Arc::default()));
        let (status, body) = request_json(app, get("/api/rsvp-status")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"rsvpResponses": {}}));
    }

    #[tokio::test]
    async fn test_dispatch_then_reply_flow() {
        let sender = Arc::new(FakeSender::default());
        let ctx = context(sender.clone());
        let app = build_app(ctx.clone());

        let (status, _) = request_json(
            app.clone(),
            post_json(
                "/api/send-messages",
                json!({"message": "Hi", "phoneNumbers": ["+1 555 0100"]}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(sender.recipients(), vec!["15550100"]);
        assert!(ctx.allow_list.contains("15550100").await);

        let event = json!({
            "object": "whatsapp_business_account",
            "entry": [{"id": "1", "changes": [{"field": "messages", "value": {
                "messages": [{"from": "15550100", "id": "wamid.in", "type": "text",
                              "text": {"body": "Yes"}}]
            }}]}]
        });
        let (status, body) = request_json(app.clone(), post_json("/webhook", event)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"status": "EVENT_RECEIVED"}));

        // one dispatch plus exactly one acknowledgement
        assert_eq!(sender.recipients(), vec!["15550100", "15550100"]);

        let (_, body) = request_json(app, get("/api/rsvp-status")).await;
        assert_eq!(body, json!({"rsvpResponses": {"15550100": "Yes"}}));
    }

    #[tokio::test]
    async fn test_reply_from_stranger_is_not_recorded() {
        let sender = Arc::new(FakeSender::default());
        let app = build_app(context(sender.clone()));

        let event = json!({
            "object": "whatsapp_business_account",
            "entry": [{"changes": [{"value": {"messages": [
                {"from": "15550999", "button": {"payload": "YES"}}
            ]}}]}]
        });
        let (status, _) = request_json(app.clone(), post_json("/webhook", event)).await;
        assert_eq!(status, StatusCode::OK);

        let (_, body) = request_json(app, get("/api/rsvp-status")).await;
        assert_eq!(body, json!({"rsvpResponses": {}}));
        assert!(sender.recipients().is_empty());
    }

    #[tokio::test]
    async fn test_webhook_verification_route() {
        let app = build_app(context(Arc::default()));

        let response = app
            .clone()
            .oneshot(get("/webhook?hub.mode=subscribe&hub.verify_token=s3cret&hub.challenge=123"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"123");

        let response = app
            .oneshot(get("/webhook?hub.mode=subscribe&hub.verify_token=wrong&hub.challenge=123"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    // --- Exotel ---

    fn call_payload() -> Value {
        json!({
            "username": "key", "password": "secret",
            "fromNumber": "09876543210", "toNumber": "01234567890", "callerId": "08047000000"
        })
    }

    #[tokio::test]
    async fn test_make_call_relays_provider_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/Accounts/acme/Calls/connect"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"Call": {"Sid": "c-1"}})))
            .expect(1)
            .mount(&server)
            .await;

        let mut config = test_config();
        config.exotel.account_sid = "acme".to_string();
        config.exotel.base_url = server.uri();
        let app = build_app(AppContext::with_sender(config, Arc::new(FakeSender::default())));

        let (status, body) = request_json(app, post_json("/api/make-call", call_payload())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"Call": {"Sid": "c-1"}}));
    }

    #[tokio::test]
    async fn test_make_call_relays_provider_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(403).set_body_json(json!({"RestException": {"Status": 403}})))
            .mount(&server)
            .await;

        let mut config = test_config();
        config.exotel.base_url = server.uri();
        let app = build_app(AppContext::with_sender(config, Arc::new(FakeSender::default())));

        let (status, body) = request_json(app, post_json("/api/make-call", call_payload())).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["RestException"]["Status"], 403);
    }

    #[tokio::test]
    async fn test_make_call_missing_fields() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let mut config = test_config();
        config.exotel.base_url = server.uri();
        let app = build_app(AppContext::with_sender(config, Arc::new(FakeSender::default())));

        let mut payload = call_payload();
        payload["callerId"] = json!("");
        let (status, body) = request_json(app, post_json("/api/make-call", payload)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({"error": "Missing fields"}));
    }

    // --- Twilio ---

    fn sms_payload() -> Value {
        json!({
            "to": "+15550100", "from": "+15550199", "body": "Hello",
            "accountSid": "AC123", "authToken": "token123"
        })
    }

    #[tokio::test]
    async fn test_send_sms() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/2010-04-01/Accounts/AC123/Messages.json"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({"sid": "SM1"})))
            .expect(1)
            .mount(&server)
            .await;

        let mut config = test_config();
        config.twilio.base_url = server.uri();
        let app = build_app(AppContext::with_sender(config, Arc::new(FakeSender::default())));

        let (status, body) = request_json(app, post_json("/send-sms", sms_payload())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"success": true, "sid": "SM1"}));
    }

    #[tokio::test]
    async fn test_send_sms_failure_shape() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "code": 20003, "message": "Authenticate", "status": 401
            })))
            .mount(&server)
            .await;

        let mut config = test_config();
        config.twilio.base_url = server.uri();
        let app = build_app(AppContext::with_sender(config, Arc::new(FakeSender::default())));

        let (status, body) = request_json(app, post_json("/send-sms", sms_payload())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({"error": "Authenticate", "code": 20003, "status": 401}));
    }

    #[tokio::test]
    async fn test_send_sms_missing_parameters() {
        let app = build_app(context(Arc::default()));
        let mut payload = sms_payload();
        payload.as_object_mut().unwrap().remove("authToken");

        let (status, body) = request_json(app, post_json("/send-sms", payload)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({"error": "Missing parameters"}));
    }
}
