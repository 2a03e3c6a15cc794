//! Outbound message shapes for the Graph `/messages` endpoint

use serde::{Deserialize, Serialize};

/// Message body, serialized next to `to` and `messaging_product`.
///
/// The variant name becomes the `type` field.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum OutboundMessage {
    Text { text: TextBody },
    Template { template: Template },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextBody {
    pub body: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview_url: Option<bool>,
}

impl OutboundMessage {
    /// Plain text message
    pub fn text(body: impl Into<String>) -> Self {
        Self::text_with_preview(body, None)
    }

    /// Plain text message; `Some` switches link previews on or off explicitly
    pub fn text_with_preview(body: impl Into<String>, preview_url: Option<bool>) -> Self {
        OutboundMessage::Text {
            text: TextBody {
                body: body.into(),
                preview_url,
            },
        }
    }

    pub fn template(template: Template) -> Self {
        OutboundMessage::Template { template }
    }

    /// Short label for logs
    pub fn kind(&self) -> &'static str {
        match self {
            OutboundMessage::Text { .. } => "text",
            OutboundMessage::Template { .. } => "template",
        }
    }
}

/// Pre-approved message template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    pub name: String,
    pub language: Language,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub components: Vec<Component>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Language {
    pub code: String,
}

/// Template component with its variable values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Component {
    Header {
        parameters: Vec<Parameter>,
    },
    Body {
        parameters: Vec<Parameter>,
    },
    Button {
        sub_type: String,
        index: u32,
        parameters: Vec<Parameter>,
    },
}

/// A single template variable
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Parameter {
    Text { text: String },
    Location { location: Location },
    Image { image: MediaRef },
    Document { document: MediaRef },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
    pub name: String,
    pub address: String,
}

/// Reference to media previously uploaded to the Graph API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaRef {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Document,
}

impl MediaKind {
    /// Content type assumed when an upload does not name one
    pub fn default_mime(self) -> &'static str {
        match self {
            MediaKind::Image => "image/jpeg",
            MediaKind::Document => "application/pdf",
        }
    }

    /// Kind implied by a content type; anything but an image is a document
    pub fn from_mime(mime: &str) -> Self {
        if mime.starts_with("image/") {
            MediaKind::Image
        } else {
            MediaKind::Document
        }
    }
}

impl Template {
    pub fn new(name: impl Into<String>, language_code: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            language: Language {
                code: language_code.into(),
            },
            components: Vec::new(),
        }
    }

    /// Body component filled with text variables, in order
    pub fn with_body_text<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let parameters = values
            .into_iter()
            .map(|text| Parameter::Text { text: text.into() })
            .collect();
        self.components.push(Component::Body { parameters });
        self
    }

    /// Header showing a map pin
    pub fn with_location_header(mut self, location: Location) -> Self {
        self.components.push(Component::Header {
            parameters: vec![Parameter::Location { location }],
        });
        self
    }

    /// Header showing uploaded media; `filename` only applies to documents
    pub fn with_media_header(
        mut self,
        kind: MediaKind,
        media_id: impl Into<String>,
        filename: Option<String>,
    ) -> Self {
        let id = media_id.into();
        let parameter = match kind {
            MediaKind::Image => Parameter::Image {
                image: MediaRef { id, filename: None },
            },
            MediaKind::Document => Parameter::Document {
                document: MediaRef { id, filename },
            },
        };
        self.components.push(Component::Header {
            parameters: vec![parameter],
        });
        self
    }

    /// Dynamic suffix for a URL button
    pub fn with_url_button(mut self, index: u32, text: impl Into<String>) -> Self {
        self.components.push(Component::Button {
            sub_type: "url".to_string(),
            index,
            parameters: vec![Parameter::Text { text: text.into() }],
        });
        self
    }
}
