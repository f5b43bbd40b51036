use thiserror::Error;

/// Failures talking to the CMS.
#[derive(Error, Debug)]
pub enum CmsError {
    #[error("request to CMS failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("CMS responded with status {status}: {body}")]
    Status { status: u16, body: String },
}

impl CmsError {
    pub fn status(&self) -> Option<u16> {
        match self {
            CmsError::Request(e) => e.status().map(|s| s.as_u16()),
            CmsError::Status { status, .. } => Some(*status),
        }
    }
}

#[test]
fn test_status_error_display() {
    let err = CmsError::Status {
        status: 403,
        body: "forbidden".to_string(),
    };
    assert_eq!(err.to_string(), "CMS responded with status 403: forbidden");
    assert_eq!(err.status(), Some(403));
}
