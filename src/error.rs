use thiserror::Error;

/// Failures talking to the CRM API, classified by how the UI reacts.
#[derive(Debug, Error)]
pub enum ApiError {
    /// 401: the session is gone; credentials are cleared.
    #[error("session expired or token rejected")]
    Unauthorized,
    /// Other 4xx responses carry a message meant for the user.
    #[error("{message}")]
    Rejected { status: u16, message: String },
    #[error("server error ({status})")]
    Server { status: u16 },
    #[error("network error: {0}")]
    Transport(String),
    #[error("unexpected response: {0}")]
    Decode(String),
}

impl ApiError {
    /// Text for the footer. Unexpected failures collapse to a generic line;
    /// the detail goes to the log.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Unauthorized => {
                "Session expired. Run `contactdesk auth` to sign in again".to_string()
            }
            ApiError::Rejected { message, .. } => message.clone(),
            ApiError::Server { .. } | ApiError::Transport(_) | ApiError::Decode(_) => {
                "Request failed, please try again".to_string()
            }
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized)
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ApiError::Decode(err.to_string())
        } else {
            ApiError::Transport(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_message_hides_internal_failures() {
        let rejected = ApiError::Rejected {
            status: 422,
            message: "Email already in use".into(),
        };
        assert_eq!(rejected.user_message(), "Email already in use");
        assert_eq!(
            ApiError::Server { status: 502 }.user_message(),
            "Request failed, please try again"
        );
        assert_eq!(
            ApiError::Decode("missing field `id`".into()).user_message(),
            "Request failed, please try again"
        );
        assert!(ApiError::Unauthorized.is_unauthorized());
    }
}
