use crate::config;
use crate::error::SignalError;
use crate::peer::engine::{EngineEvent, EngineEvents, RemoteTrack, TransportEngine};
use crate::peer::types::{DescriptionKind, IceCandidate, SessionDescription};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::MediaEngine;
use webrtc::api::APIBuilder;
use webrtc::ice_transport::ice_candidate::{RTCIceCandidate, RTCIceCandidateInit};
use webrtc::interceptor::registry::Registry;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::peer_connection::sdp::sdp_type::RTCSdpType;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::track::track_local::TrackLocal;

/// Транспортный движок поверх RTCPeerConnection. Колбэки webrtc
/// переливаются в канал событий; негоциацией управляет сессия.
pub struct PeerEngine {
    pc: Arc<RTCPeerConnection>,
}

impl PeerEngine {
    /// Создаёт peer connection с настроенными ICE серверами и каналом событий
    pub async fn new() -> Result<(Arc<Self>, EngineEvents), SignalError> {
        let mut media_engine = MediaEngine::default();
        media_engine
            .register_default_codecs()
            .map_err(|e| SignalError::EngineFatal(format!("codec registration failed: {e}")))?;

        let registry = register_default_interceptors(Registry::new(), &mut media_engine)
            .map_err(|e| SignalError::EngineFatal(format!("interceptor setup failed: {e}")))?;

        let api = APIBuilder::new()
            .with_media_engine(media_engine)
            .with_interceptor_registry(registry)
            .build();

        let pc = Arc::new(
            api.new_peer_connection(config::rtc_config())
                .await
                .map_err(|e| SignalError::EngineFatal(format!("peer connection failed: {e}")))?,
        );

        let (tx, rx) = mpsc::unbounded_channel();

        // сбор локальных кандидатов (trickle ICE)
        let cand_tx = tx.clone();
        pc.on_ice_candidate(Box::new(move |cand: Option<RTCIceCandidate>| {
            let tx = cand_tx.clone();
            Box::pin(async move {
                match cand {
                    Some(c) => match c.to_json() {
                        Ok(init) => {
                            let _ = tx.send(EngineEvent::CandidateDiscovered(IceCandidate {
                                candidate: init.candidate,
                                sdp_mid: init.sdp_mid,
                                sdp_mline_index: init.sdp_mline_index,
                                username_fragment: init.username_fragment,
                            }));
                        }
                        Err(e) => log::warn!("failed to serialize local candidate: {e}"),
                    },
                    // cand == None означает конец сбора
                    None => log::debug!("ICE candidate gathering completed"),
                }
            })
        }));

        // удалённый медиапоток: одно уведомление на негоциацию,
        // дальнейшие дорожки того же потока не анонсируются повторно
        let track_tx = tx.clone();
        let media_announced = Arc::new(AtomicBool::new(false));
        pc.on_track(Box::new(move |track, _receiver, _transceiver| {
            let tx = track_tx.clone();
            let announced = media_announced.clone();
            Box::pin(async move {
                if announced.swap(true, Ordering::SeqCst) {
                    log::debug!("additional remote track {} ({})", track.id(), track.kind());
                    return;
                }
                let _ = tx.send(EngineEvent::RemoteMediaAvailable(RemoteTrack {
                    id: track.id(),
                    kind: track.kind().to_string(),
                }));
            })
        }));

        let state_tx = tx;
        pc.on_peer_connection_state_change(Box::new(move |st: RTCPeerConnectionState| {
            let tx = state_tx.clone();
            Box::pin(async move {
                match st {
                    RTCPeerConnectionState::Connected => {
                        let _ = tx.send(EngineEvent::NegotiationComplete);
                    }
                    RTCPeerConnectionState::Failed => {
                        let _ = tx.send(EngineEvent::Fatal("peer connection failed".into()));
                    }
                    _ => log::debug!("peer connection state: {st:?}"),
                }
            })
        }));

        Ok((Arc::new(Self { pc }), rx))
    }

    /// Разделяемый хэндл для чтения входящих дорожек слоем UI
    pub fn peer_connection(&self) -> Arc<RTCPeerConnection> {
        self.pc.clone()
    }
}

fn to_rtc(desc: &SessionDescription) -> Result<RTCSessionDescription, SignalError> {
    let rtc = match desc.kind {
        DescriptionKind::Offer => RTCSessionDescription::offer(desc.body.clone()),
        DescriptionKind::Answer => RTCSessionDescription::answer(desc.body.clone()),
    };
    rtc.map_err(|e| SignalError::NegotiationError(format!("engine rejected description: {e}")))
}

fn from_rtc(desc: RTCSessionDescription) -> Result<SessionDescription, SignalError> {
    let kind = match desc.sdp_type {
        RTCSdpType::Offer => DescriptionKind::Offer,
        RTCSdpType::Answer => DescriptionKind::Answer,
        other => {
            return Err(SignalError::NegotiationError(format!(
                "unsupported SDP type: {other}"
            )))
        }
    };
    Ok(SessionDescription {
        kind,
        body: desc.sdp,
    })
}

#[async_trait]
impl TransportEngine for PeerEngine {
    async fn attach_media_track(
        &self,
        track: Arc<dyn TrackLocal + Send + Sync>,
    ) -> Result<(), SignalError> {
        self.pc
            .add_track(track)
            .await
            .map(|_| ())
            .map_err(|e| SignalError::EngineFatal(format!("failed to attach track: {e}")))
    }

    async fn create_offer(&self) -> Result<SessionDescription, SignalError> {
        let offer = self
            .pc
            .create_offer(None)
            .await
            .map_err(|e| SignalError::NegotiationError(format!("create_offer failed: {e}")))?;
        from_rtc(offer)
    }

    async fn create_answer(&self) -> Result<SessionDescription, SignalError> {
        let answer = self
            .pc
            .create_answer(None)
            .await
            .map_err(|e| SignalError::NegotiationError(format!("create_answer failed: {e}")))?;
        from_rtc(answer)
    }

    async fn set_local_description(&self, desc: SessionDescription) -> Result<(), SignalError> {
        self.pc
            .set_local_description(to_rtc(&desc)?)
            .await
            .map_err(|e| {
                SignalError::NegotiationError(format!("set_local_description failed: {e}"))
            })
    }

    async fn set_remote_description(&self, desc: SessionDescription) -> Result<(), SignalError> {
        self.pc
            .set_remote_description(to_rtc(&desc)?)
            .await
            .map_err(|e| {
                SignalError::NegotiationError(format!("set_remote_description failed: {e}"))
            })
    }

    async fn add_ice_candidate(&self, candidate: IceCandidate) -> Result<(), SignalError> {
        let init = RTCIceCandidateInit {
            candidate: candidate.candidate,
            sdp_mid: candidate.sdp_mid,
            sdp_mline_index: candidate.sdp_mline_index,
            username_fragment: candidate.username_fragment,
        };

        self.pc
            .add_ice_candidate(init)
            .await
            .map_err(|e| SignalError::CandidateRejected(e.to_string()))
    }

    async fn close(&self) -> Result<(), SignalError> {
        self.pc
            .close()
            .await
            .map_err(|e| SignalError::EngineFatal(format!("close failed: {e}")))
    }
}
