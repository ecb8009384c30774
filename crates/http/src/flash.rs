//! Flash messages carried across redirects.
//!
//! Write endpoints redirect with `?flash=<kind>&notice=<code>`; the next
//! rendered page resolves the code to its human-readable message. The
//! message is one-time by construction since it lives only in the redirect
//! URL.

use std::fmt;

use axum::response::Redirect;
use serde::{Deserialize, Serialize};

/// Outcome class of a flash message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashKind {
    Success,
    Error,
}

impl fmt::Display for FlashKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => f.write_str("success"),
            Self::Error => f.write_str("error"),
        }
    }
}

/// Machine-readable notice codes; kept short so they travel in a query
/// string without escaping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Notice {
    Created,
    Updated,
    Deleted,
    Missing,
    StoreFailed,
}

impl Notice {
    pub fn message(self) -> &'static str {
        match self {
            Self::Created => "Book created.",
            Self::Updated => "Book updated.",
            Self::Deleted => "Book deleted.",
            Self::Missing => "That book no longer exists.",
            Self::StoreFailed => "The catalog could not save your changes.",
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created => f.write_str("created"),
            Self::Updated => f.write_str("updated"),
            Self::Deleted => f.write_str("deleted"),
            Self::Missing => f.write_str("missing"),
            Self::StoreFailed => f.write_str("store_failed"),
        }
    }
}

/// A resolved flash message, ready to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Flash {
    pub kind: FlashKind,
    pub message: &'static str,
}

impl Flash {
    pub fn resolve(kind: Option<FlashKind>, notice: Option<Notice>) -> Option<Self> {
        match (kind, notice) {
            (Some(kind), Some(notice)) => Some(Self {
                kind,
                message: notice.message(),
            }),
            _ => None,
        }
    }
}

/// Redirect to `to` with the flash pair appended as query parameters.
pub fn redirect_with_flash(to: &str, kind: FlashKind, notice: Notice) -> Redirect {
    Redirect::to(&format!("{to}?flash={kind}&notice={notice}"))
}
