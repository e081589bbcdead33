pub mod connection;
pub mod engine;
pub mod media;
pub mod types;

pub use connection::PeerEngine;
pub use engine::{EngineEvent, EngineEvents, RemoteTrack, TransportEngine};
pub use media::{LocalMedia, MediaSource, StaticMediaSource};
pub use types::{
    ConnectionBundle, DescriptionKind, IceCandidate, SdpPayload, ServerConfig, SessionDescription,
};
