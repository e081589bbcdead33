use crate::error::SignalError;
use crate::peer::types::{IceCandidate, SessionDescription};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::mpsc;
use webrtc::track::track_local::TrackLocal;

/// События транспортного движка. Кандидаты приходят асинхронно и без
/// гарантий порядка; уведомление об удалённом медиапотоке — ровно одно
/// на успешную негоциацию.
#[derive(Debug, Clone)]
pub enum EngineEvent {
    /// Обнаружен локальный кандидат
    CandidateDiscovered(IceCandidate),
    /// Удалённый медиапоток доступен
    RemoteMediaAvailable(RemoteTrack),
    /// Движок завершил негоциацию, медиапоток пошёл
    NegotiationComplete,
    /// Невосстановимая ошибка движка
    Fatal(String),
}

/// Дескриптор удалённой дорожки для слоя UI; сами данные дорожки
/// читаются напрямую из разделяемого хэндла движка
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteTrack {
    pub id: String,
    pub kind: String,
}

pub type EngineEvents = mpsc::UnboundedReceiver<EngineEvent>;

/// Контракт транспортного движка. Каждый вызов — точка приостановки:
/// должен завершиться до следующей операции над той же сессией.
#[async_trait]
pub trait TransportEngine: Send + Sync {
    /// Передаёт движку локальную дорожку захвата
    async fn attach_media_track(
        &self,
        track: Arc<dyn TrackLocal + Send + Sync>,
    ) -> Result<(), SignalError>;

    async fn create_offer(&self) -> Result<SessionDescription, SignalError>;

    async fn create_answer(&self) -> Result<SessionDescription, SignalError>;

    /// Не идемпотентен: повторный вызов с конфликтующим содержимым — ошибка
    async fn set_local_description(&self, desc: SessionDescription) -> Result<(), SignalError>;

    /// Не идемпотентен: повторный вызов с конфликтующим содержимым — ошибка
    async fn set_remote_description(&self, desc: SessionDescription) -> Result<(), SignalError>;

    /// Отказ движка пробрасывается как CandidateRejected, не глотается
    async fn add_ice_candidate(&self, candidate: IceCandidate) -> Result<(), SignalError>;

    /// Освобождает ресурсы движка
    async fn close(&self) -> Result<(), SignalError>;
}
