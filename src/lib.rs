//! Ручной сигналинг для прямого аудио/видео соединения двух пиров.
//!
//! Описания и кандидаты передаются между сторонами по внешнему каналу
//! (копипаста, QR); крейт отвечает за порядок и валидацию их применения,
//! сам транспорт делегирован движку за трейтом [`TransportEngine`].

pub mod config;
pub mod error;
pub mod peer;
pub mod session;
pub mod signaling;
mod utils;

pub use error::SignalError;
pub use peer::{
    ConnectionBundle, DescriptionKind, EngineEvent, EngineEvents, IceCandidate, LocalMedia,
    MediaSource, PeerEngine, RemoteTrack, SdpPayload, ServerConfig, SessionDescription,
    StaticMediaSource, TransportEngine,
};
pub use session::{
    CandidateDisposition, NegotiationRole, SessionEvent, SessionState, SignalingSession,
};
