use crate::catalog_loader::CatalogError;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AppErrorKind {
    System,
    Catalog,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppErrorPayload {
    pub kind: AppErrorKind,
    pub message: String,
    pub detail: Option<String>,
    pub recoverable: bool,
}

/// User-facing error: a Swedish message for the card UI plus the technical
/// detail for the log.
#[derive(Debug, Clone)]
pub struct AppError {
    kind: AppErrorKind,
    message: String,
    detail: Option<String>,
    recoverable: bool,
}

impl AppError {
    pub fn new(kind: AppErrorKind, message: impl Into<String>, recoverable: bool) -> Self {
        Self {
            kind,
            message: message.into(),
            detail: None,
            recoverable,
        }
    }

    pub fn with_detail(
        kind: AppErrorKind,
        message: impl Into<String>,
        detail: impl Into<String>,
        recoverable: bool,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            detail: Some(detail.into()),
            recoverable,
        }
    }

    pub fn system(message: impl Into<String>) -> Self {
        Self::new(AppErrorKind::System, message, true)
    }

    pub fn kind(&self) -> AppErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn detail(&self) -> Option<&str> {
        self.detail.as_deref()
    }

    pub fn is_recoverable(&self) -> bool {
        self.recoverable
    }

    pub fn payload(&self) -> AppErrorPayload {
        AppErrorPayload {
            kind: self.kind,
            message: self.message.clone(),
            detail: self.detail.clone(),
            recoverable: self.recoverable,
        }
    }
}

impl From<&CatalogError> for AppError {
    fn from(error: &CatalogError) -> Self {
        let message = match error {
            CatalogError::Io(_) => "Kunde inte ladda övningarna",
            CatalogError::Parse(_) => "Övningslistan är skadad",
            CatalogError::DuplicateId(_) => "Övningslistan innehåller dubbletter",
        };
        // A failed catalog stays failed for the session.
        Self::with_detail(AppErrorKind::Catalog, message, error.to_string(), false)
    }
}

impl From<CatalogError> for AppError {
    fn from(error: CatalogError) -> Self {
        Self::from(&error)
    }
}
