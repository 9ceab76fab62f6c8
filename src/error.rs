/// Everything that can go wrong between reading the config file and the
/// stack reaching a terminal state.
///
/// Provider messages are passed through unmodified so the user sees exactly
/// what CloudFormation reported.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Config file {0} not found")]
    ConfigNotFound(String),

    #[error("Failed to parse config: {0}")]
    ConfigParse(String),

    #[error("Missing config key {0}")]
    MissingKey(&'static str),

    #[error("Stack \"{name}\" is busy ({status}), try again once the current operation settles")]
    StackBusy { name: String, status: String },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("CloudFormation error: {0}")]
    Provider(String),
}

/// Map AWS service error metadata onto the local taxonomy.
pub fn classify(code: Option<&str>, message: String) -> Error {
    match code {
        Some("ValidationError") => Error::Validation(message),
        Some("AccessDenied") | Some("AccessDeniedException") => Error::PermissionDenied(message),
        _ => Error::Provider(message),
    }
}

#[cfg(test)]
mod tests {
    use super::{classify, Error};

    #[test]
    fn classifies_validation_errors() {
        let error = classify(Some("ValidationError"), "bad template".into());
        assert!(matches!(error, Error::Validation(_)));
    }

    #[test]
    fn classifies_access_denied() {
        let error = classify(Some("AccessDenied"), "not allowed".into());
        assert!(matches!(error, Error::PermissionDenied(_)));
    }

    #[test]
    fn unknown_codes_fall_through_to_provider() {
        let error = classify(Some("Throttling"), "slow down".into());
        assert!(matches!(error, Error::Provider(_)));

        let error = classify(None, "no metadata".into());
        assert!(matches!(error, Error::Provider(_)));
    }
}
