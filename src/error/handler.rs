use thiserror::Error;

pub type HandlerResult = Result<(), HandlerError>;

/// Ошибка, которую возвращает обработчик подписки.
///
/// Хаб не повторяет вызов и не передаёт ошибку издателю: она только
/// учитывается в статистике доставки.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("handler was cancelled")]
    Cancelled,

    #[error("unexpected payload type, expected {expected}")]
    PayloadType { expected: &'static str },

    #[error("handler failed: {0}")]
    Failed(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl HandlerError {
    pub fn failed(msg: impl Into<String>) -> Self {
        Self::Failed(msg.into())
    }
}
