use thiserror::Error;

/// Ошибки сигналинга. Ошибки разбора и нарушения порядка операций
/// оставляют состояние сессии нетронутым; фатальная ошибка движка
/// переводит сессию в терминальное состояние.
#[derive(Debug, Error)]
pub enum SignalError {
    /// Полезная нагрузка не разобрана как корректные структурные данные
    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    /// Операция вызвана в неправильном состоянии или роли
    #[error("negotiation error: {0}")]
    NegotiationError(String),

    /// Движок отказался принять кандидат; сессия продолжает работу
    #[error("candidate rejected by engine: {0}")]
    CandidateRejected(String),

    /// Локальный захват аудио/видео недоступен или запрещён
    #[error("local media unavailable: {0}")]
    DeviceUnavailable(String),

    /// Невосстановимая ошибка транспортного движка
    #[error("transport engine failure: {0}")]
    EngineFatal(String),
}

impl SignalError {
    /// Фатальные ошибки переводят сессию в терминальное состояние,
    /// остальные восстанавливаются на границе вызова
    pub fn is_fatal(&self) -> bool {
        matches!(self, SignalError::EngineFatal(_))
    }
}
