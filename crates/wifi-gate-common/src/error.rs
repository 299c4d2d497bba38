//! Error taxonomy shared by the verification flow and the HTTP layer.

use thiserror::Error;

/// Every failure a client of the gate can observe.
///
/// The `Display` text is the message sent to the client, except for
/// [`GateError::Internal`] whose detail stays server-side.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GateError {
    /// Malformed or missing request data
    #[error("{0}")]
    InvalidInput(String),

    /// No verification record for the phone number
    #[error("Verificação não encontrada. Solicite um novo código.")]
    NotFound,

    /// The record has used up all of its attempts
    #[error("Número máximo de tentativas excedido. Solicite um novo código.")]
    AttemptsExceeded,

    /// Submitted code does not match
    #[error("Código inválido. Restam {remaining} tentativas.")]
    CodeMismatch { remaining: u32 },

    /// Bad signature or malformed token
    #[error("Token inválido")]
    InvalidToken,

    /// Token is past its expiry
    #[error("Token expirado")]
    ExpiredToken,

    /// Unknown `action` selector
    #[error("Ação inválida")]
    InvalidAction,

    /// Anything but POST
    #[error("Método não permitido")]
    MethodNotAllowed,

    /// Unexpected failure (store, signing, delivery)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl GateError {
    /// Returns the HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidInput(_) => 400,
            Self::NotFound => 404,
            Self::AttemptsExceeded => 403,
            Self::CodeMismatch { .. } => 401,
            Self::InvalidToken => 401,
            Self::ExpiredToken => 401,
            Self::InvalidAction => 400,
            Self::MethodNotAllowed => 405,
            Self::Internal(_) => 500,
        }
    }

    /// Message safe to hand to the client
    pub fn client_message(&self) -> String {
        match self {
            Self::Internal(_) => "Erro interno do servidor".to_string(),
            other => other.to_string(),
        }
    }
}
