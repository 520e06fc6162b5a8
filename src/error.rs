use reqwest::StatusCode;
use serde::Serialize;

pub type Result<T, E = SiteError> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum SiteError {
    /// Upstream refused the replayed credential, or the session expired.
    /// The only signal is a redirect away from the requested page.
    #[error("login rejected by {site}: expected {expected}, landed on {landed}")]
    Auth {
        site: String,
        expected: String,
        landed: String,
    },

    #[error("shelf {shelf_id} is not logged in")]
    NotAuthenticated { shelf_id: String },

    #[error("unexpected upstream shape in {context}: {reason}")]
    Extraction { context: String, reason: String },

    #[error("request to {url} failed: {detail}")]
    Transport {
        url: String,
        detail: String,
        #[source]
        source: Option<reqwest::Error>,
    },

    #[error("invalid {field}: {reason}")]
    Validation { field: &'static str, reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Auth,
    NotAuthenticated,
    Extraction,
    Transport,
    Validation,
}

/// What the boundary layer hands to its clients instead of a raw error chain.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ErrorBody {
    pub code: ErrorKind,
    pub status: u16,
    pub message: String,
}

impl SiteError {
    pub fn extraction(context: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Extraction {
            context: context.into(),
            reason: reason.into(),
        }
    }

    pub fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Validation {
            field,
            reason: reason.into(),
        }
    }

    pub fn transport(url: impl Into<String>, source: reqwest::Error) -> Self {
        let detail = if source.is_timeout() {
            "timed out".to_owned()
        } else if source.is_connect() {
            "connection failed".to_owned()
        } else {
            source.to_string()
        };
        Self::Transport {
            url: url.into(),
            detail,
            source: Some(source),
        }
    }

    pub fn upstream_status(url: impl Into<String>, status: StatusCode) -> Self {
        Self::Transport {
            url: url.into(),
            detail: format!("upstream returned {status}"),
            source: None,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Auth { .. } => ErrorKind::Auth,
            Self::NotAuthenticated { .. } => ErrorKind::NotAuthenticated,
            Self::Extraction { .. } => ErrorKind::Extraction,
            Self::Transport { .. } => ErrorKind::Transport,
            Self::Validation { .. } => ErrorKind::Validation,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self.kind() {
            ErrorKind::Auth => StatusCode::UNAUTHORIZED,
            ErrorKind::NotAuthenticated => StatusCode::FORBIDDEN,
            ErrorKind::Extraction => StatusCode::BAD_GATEWAY,
            ErrorKind::Transport => StatusCode::SERVICE_UNAVAILABLE,
            ErrorKind::Validation => StatusCode::BAD_REQUEST,
        }
    }

    pub fn to_body(&self) -> ErrorBody {
        ErrorBody {
            code: self.kind(),
            status: self.status().as_u16(),
            message: self.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    fn one_of_each() -> Vec<SiteError> {
        vec![
            SiteError::Auth {
                site: "https://example.test/".to_owned(),
                expected: "https://example.test/user/favobook".to_owned(),
                landed: "https://example.test/user/login".to_owned(),
            },
            SiteError::NotAuthenticated {
                shelf_id: "7".to_owned(),
            },
            SiteError::extraction("wallet", "missing div.Top"),
            SiteError::upstream_status("https://example.test/", StatusCode::INTERNAL_SERVER_ERROR),
            SiteError::validation("keyword", "must not be empty"),
        ]
    }

    #[test]
    fn every_kind_maps_to_a_distinct_status() {
        let errors = one_of_each();
        let statuses = errors.iter().map(SiteError::status).collect::<HashSet<_>>();
        assert_eq!(statuses.len(), errors.len());
    }

    #[test]
    fn body_carries_kind_and_message() {
        let body = SiteError::validation("page", "must be >= 1").to_body();
        assert_eq!(body.code, ErrorKind::Validation);
        assert_eq!(body.status, 400);
        assert_eq!(body.message, "invalid page: must be >= 1");

        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["code"], "validation");
    }

    #[test]
    fn upstream_status_is_a_transport_error() {
        let err = SiteError::upstream_status("https://example.test/x", StatusCode::BAD_GATEWAY);
        assert_eq!(err.kind(), ErrorKind::Transport);
        assert!(err.to_string().contains("502"));
    }
}
