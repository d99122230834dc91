use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthzError {
    #[error("user is not authenticated")]
    NotAuthenticated,
    #[error("access denied")]
    AccessDenied,
    #[error("character {ch:?} is not part of the alphabet")]
    InvalidCharacter { ch: char },
    #[error("encoded value overflows 64 bits: {0}")]
    ValueOverflow(String),
    #[error("invalid alphabet: {0}")]
    InvalidAlphabet(String),
    #[error("malformed permissions claim: {0}")]
    MalformedPermissions(String),
}

pub type AuthzResult<T> = Result<T, AuthzError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_variants() {
        let errors = vec![
            AuthzError::NotAuthenticated,
            AuthzError::AccessDenied,
            AuthzError::InvalidCharacter { ch: '.' },
            AuthzError::ValueOverflow("zzzzzzzzzzzz".to_string()),
            AuthzError::InvalidAlphabet("too small".to_string()),
            AuthzError::MalformedPermissions("not an object".to_string()),
        ];

        for error in errors {
            let rendered = error.to_string();
            assert!(!rendered.is_empty());
        }
    }
}
