use serde::{Deserialize, Serialize};

/// Contact form submission from the public site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactForm {
    /// Sender name.
    pub name: String,
    /// Reply address.
    pub email: String,
    /// Optional organisation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization: Option<String>,
    /// Free text.
    pub message: String,
}

/// Acknowledgement returned for every accepted contact form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactAck {
    /// Always `success`.
    pub status: String,
    /// Human-readable confirmation.
    pub message: String,
}

impl ContactAck {
    /// The fixed acknowledgement. The form itself is not stored.
    #[must_use]
    pub fn received() -> Self {
        Self {
            status: "success".into(),
            message: "Contact form submitted".into(),
        }
    }
}

/// Body returned by the report endpoint when PDF rendering is unavailable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportUnavailable {
    /// Machine-readable code.
    pub error: String,
    /// Explanation.
    pub message: String,
}

impl ReportUnavailable {
    /// PDF export is not built into this server.
    #[must_use]
    pub fn pdf_disabled() -> Self {
        Self {
            error: "pdf_disabled".into(),
            message: "PDF report generation is not available on this server".into(),
        }
    }
}
