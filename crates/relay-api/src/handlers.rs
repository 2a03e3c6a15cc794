//! HTTP API handlers
//!
//! Request handlers for bulk dispatch, reply status, calls and SMS.

use axum::{
    Json,
    extract::{
        Multipart, State, multipart::MultipartRejection, rejection::JsonRejection,
    },
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{debug, error, info};

use relay_core::is_e164;
use relay_telephony::{CallRequest, SmsFailure, SmsRequest};
use relay_whatsapp::{
    Component, DispatchResult, Location, MediaKind, OutboundMessage, Template, dispatch,
};

use crate::error::{ApiError, Result};
use crate::server::AppContext;

// ============================================================================
// Request/Response types
// ============================================================================

/// Bulk text dispatch payload.
///
/// Fields are loosely typed so that wrong types are reported as validation
/// errors instead of extractor rejections.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessagesRequest {
    #[serde(default)]
    pub message: Option<Value>,
    #[serde(default)]
    pub phone_numbers: Option<Value>,
    /// Explicit link preview setting; provider default when absent
    #[serde(default)]
    pub preview_url: Option<bool>,
}

/// Bulk dispatch response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessagesResponse {
    pub success: bool,
    pub sent: usize,
    pub auto_reply_enabled_for: Vec<String>,
    pub results: Vec<DispatchResult>,
}

/// Template as posted by the console
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplatePayload {
    pub name: String,
    #[serde(default = "default_language")]
    pub language_code: String,
    #[serde(default)]
    pub components: Vec<Component>,
}

fn default_language() -> String {
    "en".to_string()
}

/// Authentication template: code in the body and in the copy-code button
pub const OTP_TEMPLATE: &str = "calibrecueauth";
/// Template with a location header
pub const LOCATION_TEMPLATE: &str = "google_map_template";
/// Template with an image header
pub const IMAGE_TEMPLATE: &str = "promo_image_offer";
/// Template with a document header
pub const DOCUMENT_TEMPLATE: &str = "order_invoice1";
/// Name shown for a document header when none is given
pub const DEFAULT_DOCUMENT_FILENAME: &str = "Invoice.pdf";

/// Bulk template dispatch payload
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendTemplateRequest {
    #[serde(default)]
    pub template: Option<Value>,
    #[serde(default)]
    pub phone_numbers: Option<Value>,
}

#[derive(Debug, Serialize)]
pub struct SendTemplateResponse {
    pub success: bool,
    pub sent: usize,
    pub results: Vec<DispatchResult>,
}

/// One-time code delivered through the authentication template
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendOtpRequest {
    pub phone_number: Option<String>,
    pub code: Option<String>,
    pub template_name: Option<String>,
    pub language_code: Option<String>,
}

/// Map pin template sent to many numbers
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendLocationRequest {
    #[serde(default)]
    pub phone_numbers: Option<Value>,
    #[serde(default)]
    pub location: Option<Value>,
    pub template_name: Option<String>,
    pub language_code: Option<String>,
}

/// Template with an uploaded image or document header
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMediaRequest {
    #[serde(default)]
    pub phone_numbers: Option<Value>,
    pub media_type: Option<MediaKind>,
    pub media_id: Option<String>,
    pub filename: Option<String>,
    pub template_name: Option<String>,
    pub language_code: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadMediaResponse {
    pub success: bool,
    pub media_id: String,
    pub media_type: MediaKind,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RsvpStatusResponse {
    pub rsvp_responses: BTreeMap<String, String>,
}

/// Exotel click-to-call payload
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MakeCallRequest {
    pub username: Option<String>,
    pub password: Option<String>,
    pub from_number: Option<String>,
    pub to_number: Option<String>,
    pub caller_id: Option<String>,
}

/// Twilio SMS payload, credentials included
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendSmsRequest {
    pub to: Option<String>,
    pub from: Option<String>,
    pub body: Option<String>,
    pub account_sid: Option<String>,
    pub auth_token: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SendSmsResponse {
    pub success: bool,
    pub sid: String,
}

// ============================================================================
// Validation helpers
// ============================================================================

fn parse_body<T>(payload: std::result::Result<Json<T>, JsonRejection>) -> Result<T> {
    payload
        .map(|Json(body)| body)
        .map_err(|e| ApiError::Validation(e.body_text()))
}

/// Non-empty array of numbers; non-string entries become empty strings and
/// are skipped later by normalization
fn phone_numbers(value: Option<Value>) -> Result<Vec<String>> {
    match value {
        Some(Value::Array(items)) if !items.is_empty() => Ok(items
            .into_iter()
            .map(|item| match item {
                Value::String(s) => s,
                _ => String::new(),
            })
            .collect()),
        _ => Err(ApiError::Validation(
            "phoneNumbers must be a non-empty array".to_string(),
        )),
    }
}

fn required(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

fn template_for(name: Option<String>, default_name: &str, language: Option<String>) -> Template {
    Template::new(
        required(name).unwrap_or_else(|| default_name.to_string()),
        required(language).unwrap_or_else(default_language),
    )
}

/// Send a template to every number without granting auto-replies
async fn dispatch_template(
    ctx: &AppContext,
    numbers: &[String],
    template: Template,
) -> SendTemplateResponse {
    let results = dispatch(
        ctx.sender.as_ref(),
        numbers,
        &OutboundMessage::template(template),
        None,
    )
    .await;

    SendTemplateResponse {
        success: true,
        sent: results.len(),
        results,
    }
}

// ============================================================================
// Handler functions
// ============================================================================

/// Health check endpoint
pub async fn health() -> &'static str {
    "OK"
}

/// Send a text to every number and enable auto-replies for the ones reached
pub async fn send_messages(
    State(ctx): State<AppContext>,
    payload: std::result::Result<Json<SendMessagesRequest>, JsonRejection>,
) -> Result<Json<SendMessagesResponse>> {
    let req = parse_body(payload)?;

    let message = match req.message {
        Some(Value::String(s)) if !s.is_empty() => s,
        _ => return Err(ApiError::Validation("Message is required".to_string())),
    };
    let numbers = phone_numbers(req.phone_numbers)?;
    debug!("Bulk text dispatch to {} numbers", numbers.len());

    let results = dispatch(
        ctx.sender.as_ref(),
        &numbers,
        &OutboundMessage::text_with_preview(message, req.preview_url),
        Some(&ctx.allow_list),
    )
    .await;

    Ok(Json(SendMessagesResponse {
        success: true,
        sent: results.len(),
        auto_reply_enabled_for: ctx.allow_list.snapshot().await,
        results,
    }))
}

/// Send a template to every number. Does not enable auto-replies.
pub async fn send_template(
    State(ctx): State<AppContext>,
    payload: std::result::Result<Json<SendTemplateRequest>, JsonRejection>,
) -> Result<Json<SendTemplateResponse>> {
    let req = parse_body(payload)?;

    let payload: TemplatePayload = req
        .template
        .ok_or_else(|| ApiError::Validation("template is required".to_string()))
        .and_then(|value| {
            serde_json::from_value(value)
                .map_err(|e| ApiError::Validation(format!("Invalid template: {}", e)))
        })?;
    if payload.name.trim().is_empty() {
        return Err(ApiError::Validation("template.name is required".to_string()));
    }
    let numbers = phone_numbers(req.phone_numbers)?;

    let mut template = Template::new(payload.name, payload.language_code);
    template.components = payload.components;

    Ok(Json(dispatch_template(&ctx, &numbers, template).await))
}

/// Send a one-time code to a single E.164 number
pub async fn send_otp(
    State(ctx): State<AppContext>,
    payload: std::result::Result<Json<SendOtpRequest>, JsonRejection>,
) -> Result<Json<SendTemplateResponse>> {
    let req = parse_body(payload)?;

    let phone_number = req.phone_number.unwrap_or_default();
    if !is_e164(&phone_number) {
        return Err(ApiError::Validation(
            "phoneNumber must be in E.164 format (e.g. +12015553931)".to_string(),
        ));
    }
    let code = match required(req.code) {
        Some(code) if code.bytes().all(|b| b.is_ascii_digit()) => code,
        _ => return Err(ApiError::Validation("code must be numeric".to_string())),
    };

    let template = template_for(req.template_name, OTP_TEMPLATE, req.language_code)
        .with_body_text([code.clone()])
        .with_url_button(0, code);

    Ok(Json(dispatch_template(&ctx, &[phone_number], template).await))
}

/// Send a location header template to every number
pub async fn send_location(
    State(ctx): State<AppContext>,
    payload: std::result::Result<Json<SendLocationRequest>, JsonRejection>,
) -> Result<Json<SendTemplateResponse>> {
    let req = parse_body(payload)?;

    let location: Location = req
        .location
        .ok_or_else(|| ApiError::Validation("location is required".to_string()))
        .and_then(|value| {
            serde_json::from_value(value)
                .map_err(|e| ApiError::Validation(format!("Invalid location: {}", e)))
        })?;
    let numbers = phone_numbers(req.phone_numbers)?;

    let template = template_for(req.template_name, LOCATION_TEMPLATE, req.language_code)
        .with_location_header(location);

    Ok(Json(dispatch_template(&ctx, &numbers, template).await))
}

/// Send an image or document header template to every number
pub async fn send_media(
    State(ctx): State<AppContext>,
    payload: std::result::Result<Json<SendMediaRequest>, JsonRejection>,
) -> Result<Json<SendTemplateResponse>> {
    let req = parse_body(payload)?;

    let Some(media_id) = required(req.media_id) else {
        return Err(ApiError::Validation("mediaId is required".to_string()));
    };
    let kind = req.media_type.unwrap_or(MediaKind::Document);
    let numbers = phone_numbers(req.phone_numbers)?;

    let (default_name, filename) = match kind {
        MediaKind::Image => (IMAGE_TEMPLATE, None),
        MediaKind::Document => (
            DOCUMENT_TEMPLATE,
            Some(required(req.filename).unwrap_or_else(|| DEFAULT_DOCUMENT_FILENAME.to_string())),
        ),
    };
    let template = template_for(req.template_name, default_name, req.language_code)
        .with_media_header(kind, media_id, filename);

    Ok(Json(dispatch_template(&ctx, &numbers, template).await))
}

/// Store an uploaded file with the provider and return its media id.
///
/// Expects a `file` part and an optional `mediaType` part (`image` or
/// `document`); the kind is otherwise taken from the file's content type.
pub async fn upload_media(
    State(ctx): State<AppContext>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadMediaResponse>> {
    let mut multipart = multipart.map_err(|e| ApiError::Validation(e.body_text()))?;

    let mut declared: Option<MediaKind> = None;
    let mut file: Option<(Vec<u8>, Option<String>, String)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::Validation(e.body_text()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                let content_type = field.content_type().map(str::to_string);
                let filename = field.file_name().unwrap_or("upload").to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::Validation(e.body_text()))?;
                file = Some((data.to_vec(), content_type, filename));
            }
            "mediaType" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ApiError::Validation(e.body_text()))?;
                declared = Some(
                    serde_json::from_value(Value::String(text.trim().to_string())).map_err(
                        |_| ApiError::Validation("mediaType must be image or document".to_string()),
                    )?,
                );
            }
            _ => {}
        }
    }

    let Some((data, content_type, filename)) = file.filter(|(data, _, _)| !data.is_empty()) else {
        return Err(ApiError::Validation("file is required".to_string()));
    };

    // the provider does not accept octet-stream
    let content_type = content_type.filter(|mime| mime != "application/octet-stream");
    let kind = declared.unwrap_or_else(|| {
        content_type
            .as_deref()
            .map(MediaKind::from_mime)
            .unwrap_or(MediaKind::Document)
    });
    let mime_type = content_type.unwrap_or_else(|| kind.default_mime().to_string());

    let media_id = ctx.whatsapp.upload_media(data, &mime_type, &filename).await?;
    info!("Uploaded {} as media {}", filename, media_id);

    Ok(Json(UploadMediaResponse {
        success: true,
        media_id,
        media_type: kind,
    }))
}

/// Latest reply per number
pub async fn rsvp_status(State(ctx): State<AppContext>) -> Json<RsvpStatusResponse> {
    Json(RsvpStatusResponse {
        rsvp_responses: ctx.replies.all().await,
    })
}

/// Connect a call through Exotel and relay its answer
pub async fn make_call(
    State(ctx): State<AppContext>,
    payload: std::result::Result<Json<MakeCallRequest>, JsonRejection>,
) -> Result<Json<Value>> {
    let req = parse_body(payload)?;

    let (Some(username), Some(password), Some(from), Some(to), Some(caller_id)) = (
        required(req.username),
        required(req.password),
        required(req.from_number),
        required(req.to_number),
        required(req.caller_id),
    ) else {
        return Err(ApiError::Validation("Missing fields".to_string()));
    };

    let call = CallRequest {
        username,
        password,
        from,
        to,
        caller_id,
    };
    let body = ctx.exotel.connect_call(&call).await?;
    info!("Call requested from {} to {}", call.from, call.to);

    Ok(Json(body))
}

/// Send one SMS through Twilio
pub async fn send_sms(
    State(ctx): State<AppContext>,
    payload: std::result::Result<Json<SendSmsRequest>, JsonRejection>,
) -> Result<Json<SendSmsResponse>> {
    let req = parse_body(payload)?;

    let (Some(to), Some(from), Some(body), Some(account_sid), Some(auth_token)) = (
        required(req.to),
        required(req.from),
        required(req.body),
        required(req.account_sid),
        required(req.auth_token),
    ) else {
        return Err(ApiError::Validation("Missing parameters".to_string()));
    };

    let sms = SmsRequest {
        account_sid,
        auth_token,
        to,
        from,
        body,
    };

    match ctx.twilio.send_sms(&sms).await {
        Ok(sid) => Ok(Json(SendSmsResponse { success: true, sid })),
        Err(e) => {
            error!("Twilio error: {}", e);
            Err(ApiError::Upstream {
                status: 500,
                body: serde_json::to_value(SmsFailure::from(&e)).unwrap_or_default(),
            })
        }
    }
}
