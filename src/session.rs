//! Машина состояний сигналинга одной попытки вызова.
//!
//! Сессия создаётся на одну попытку соединения и не переиспользуется:
//! после close() или фатальной ошибки движка нужен новый экземпляр.
//! Кандидаты, пришедшие раньше удалённого описания, буферизуются и
//! применяются строго в порядке поступления после его установки.

use crate::error::SignalError;
use crate::peer::engine::{EngineEvent, RemoteTrack, TransportEngine};
use crate::peer::media::MediaSource;
use crate::peer::types::{
    ConnectionBundle, DescriptionKind, IceCandidate, SdpPayload, SessionDescription,
};
use crate::signaling;
use crate::utils::random_id;
use std::sync::Arc;

/// Роль стороны: инициатор создаёт offer, отвечающий — answer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NegotiationRole {
    Initiator,
    Responder,
}

/// Состояния негоциации; Failed — терминальное, достижимо из любого
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    LocalDescriptionCreated,
    RemoteDescriptionApplied,
    Negotiated,
    Failed,
}

/// Судьба переданного кандидата: применён сразу или отложен до
/// установки удалённого описания
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateDisposition {
    Applied,
    Buffered,
}

/// Событие для слоя UI / внешнего потребителя
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// Локальный кандидат, сериализованный для внешнего канала
    LocalCandidate(String),
    /// Удалённый медиапоток доступен
    RemoteMedia(RemoteTrack),
    /// Негоциация завершена, медиапоток пошёл
    Negotiated,
    /// Сессия завершилась фатально
    Failed(String),
}

/// Сессия сигналинга. Все операции берут &mut self: эксклюзивное
/// заимствование сериализует мутирующие вызовы, двух одновременных
/// операций над одной сессией не существует.
pub struct SignalingSession {
    role: NegotiationRole,
    state: SessionState,
    engine: Arc<dyn TransportEngine>,
    media_attached: bool,
    local_description: Option<SessionDescription>,
    remote_description: Option<SessionDescription>,
    pending_remote_candidates: Vec<IceCandidate>,
    local_candidates: Vec<IceCandidate>,
}

impl SignalingSession {
    /// Создаёт сессию на одну попытку вызова; движком сессия не владеет
    pub fn new(role: NegotiationRole, engine: Arc<dyn TransportEngine>) -> Self {
        Self {
            role,
            state: SessionState::Idle,
            engine,
            media_attached: false,
            local_description: None,
            remote_description: None,
            pending_remote_candidates: Vec::new(),
            local_candidates: Vec::new(),
        }
    }

    pub fn role(&self) -> NegotiationRole {
        self.role
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn local_description(&self) -> Option<&SessionDescription> {
        self.local_description.as_ref()
    }

    pub fn remote_description(&self) -> Option<&SessionDescription> {
        self.remote_description.as_ref()
    }

    fn ensure_active(&self) -> Result<(), SignalError> {
        match self.state {
            SessionState::Failed => Err(SignalError::NegotiationError(
                "session is terminated".into(),
            )),
            _ => Ok(()),
        }
    }

    // ========== ЛОКАЛЬНАЯ СТОРОНА ==========

    /// Открывает источник захвата и передаёт дорожки движку.
    /// Отказ устройства фатален для старта, но состояние не трогает:
    /// повторная попытка возможна только с новым согласием пользователя.
    pub async fn start_local_stream(&mut self, source: &dyn MediaSource) -> Result<(), SignalError> {
        self.ensure_active()?;
        let media = source.open()?;
        for track in media.tracks {
            self.engine.attach_media_track(track).await?;
        }
        self.media_attached = true;
        Ok(())
    }

    /// Инициатор: создаёт offer и применяет его локально
    pub async fn create_offer(&mut self) -> Result<SessionDescription, SignalError> {
        self.ensure_active()?;
        if self.role != NegotiationRole::Initiator {
            return Err(SignalError::NegotiationError(
                "only the initiator creates an offer".into(),
            ));
        }
        if self.state != SessionState::Idle || self.local_description.is_some() {
            return Err(SignalError::NegotiationError(
                "local description already created".into(),
            ));
        }
        if !self.media_attached {
            return Err(SignalError::NegotiationError(
                "local media must be attached before creating an offer".into(),
            ));
        }

        let offer = self.engine.create_offer().await?;
        self.engine.set_local_description(offer.clone()).await?;
        self.local_description = Some(offer.clone());
        self.state = SessionState::LocalDescriptionCreated;
        Ok(offer)
    }

    /// Отвечающий: создаёт answer на применённый удалённый offer
    pub async fn create_answer(&mut self) -> Result<SessionDescription, SignalError> {
        self.ensure_active()?;
        if self.role != NegotiationRole::Responder {
            return Err(SignalError::NegotiationError(
                "only the responder creates an answer".into(),
            ));
        }
        match self.remote_description {
            Some(ref desc) if desc.kind == DescriptionKind::Offer => {}
            _ => {
                return Err(SignalError::NegotiationError(
                    "no remote offer has been applied".into(),
                ))
            }
        }
        if self.local_description.is_some() {
            return Err(SignalError::NegotiationError(
                "local description already created".into(),
            ));
        }

        let answer = self.engine.create_answer().await?;
        self.engine.set_local_description(answer.clone()).await?;
        self.local_description = Some(answer.clone());
        Ok(answer)
    }

    // ========== УДАЛЁННАЯ СТОРОНА ==========

    /// Применяет удалённое описание из текста внешнего канала.
    /// Для отвечающего, получившего offer, answer создаётся как явное
    /// продолжение этой же операции и возвращается вызывающему.
    pub async fn set_remote_description(
        &mut self,
        payload: &str,
    ) -> Result<Option<SessionDescription>, SignalError> {
        let desc = signaling::parse_description(payload)?;
        self.apply_remote(desc).await
    }

    async fn apply_remote(
        &mut self,
        desc: SessionDescription,
    ) -> Result<Option<SessionDescription>, SignalError> {
        self.ensure_active()?;
        if let Some(ref existing) = self.remote_description {
            return Err(SignalError::NegotiationError(format!(
                "a remote {} is already active; a new session is required to renegotiate",
                existing.kind
            )));
        }
        match (self.role, desc.kind) {
            (NegotiationRole::Responder, DescriptionKind::Offer) => {}
            (NegotiationRole::Initiator, DescriptionKind::Answer) => {
                if self.local_description.is_none() {
                    return Err(SignalError::NegotiationError(
                        "answer received before a local offer was created".into(),
                    ));
                }
            }
            (NegotiationRole::Initiator, DescriptionKind::Offer) => {
                return Err(SignalError::NegotiationError(
                    "initiator cannot accept a remote offer".into(),
                ))
            }
            (NegotiationRole::Responder, DescriptionKind::Answer) => {
                return Err(SignalError::NegotiationError(
                    "responder cannot accept a remote answer".into(),
                ))
            }
        }

        self.engine.set_remote_description(desc.clone()).await?;
        self.remote_description = Some(desc.clone());
        self.state = SessionState::RemoteDescriptionApplied;

        self.flush_pending_candidates().await;

        if self.role == NegotiationRole::Responder && desc.kind == DescriptionKind::Offer {
            let answer = self.create_answer().await?;
            return Ok(Some(answer));
        }
        Ok(None)
    }

    /// Отложенные кандидаты уходят движку строго в порядке поступления;
    /// отказ по отдельному кандидату не прерывает остальные
    async fn flush_pending_candidates(&mut self) {
        let pending = std::mem::take(&mut self.pending_remote_candidates);
        for candidate in pending {
            if let Err(e) = self.engine.add_ice_candidate(candidate).await {
                log::warn!("buffered candidate rejected: {e}");
            }
        }
    }

    /// Применяет кандидат сразу, если удалённое описание уже активно,
    /// иначе буферизует до его установки
    pub async fn add_ice_candidate(
        &mut self,
        candidate: IceCandidate,
    ) -> Result<CandidateDisposition, SignalError> {
        self.ensure_active()?;
        match self.state {
            SessionState::RemoteDescriptionApplied | SessionState::Negotiated => {
                self.engine.add_ice_candidate(candidate).await?;
                Ok(CandidateDisposition::Applied)
            }
            _ => {
                self.pending_remote_candidates.push(candidate);
                Ok(CandidateDisposition::Buffered)
            }
        }
    }

    /// Разбирает многострочный блок кандидатов: каждая непустая строка —
    /// отдельный кандидат, битая строка даёт свой результат и не
    /// прерывает обработку остальных
    pub async fn add_parsed_ice_candidates(
        &mut self,
        block: &str,
    ) -> Vec<Result<CandidateDisposition, SignalError>> {
        let mut results = Vec::new();
        for line in block.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let outcome = match signaling::parse_candidate(line) {
                Ok(candidate) => self.add_ice_candidate(candidate).await,
                Err(e) => {
                    log::warn!("skipping malformed candidate line: {e}");
                    Err(e)
                }
            };
            results.push(outcome);
        }
        results
    }

    // ========== СОБЫТИЯ ДВИЖКА ==========

    /// Обрабатывает событие движка. События, догнавшие терминальную
    /// сессию, отбрасываются без ошибки.
    pub async fn handle_engine_event(&mut self, event: EngineEvent) -> Option<SessionEvent> {
        if self.state == SessionState::Failed {
            return None;
        }
        match event {
            EngineEvent::CandidateDiscovered(candidate) => {
                self.local_candidates.push(candidate.clone());
                Some(SessionEvent::LocalCandidate(signaling::serialize_candidate(
                    &candidate,
                )))
            }
            EngineEvent::RemoteMediaAvailable(track) => Some(SessionEvent::RemoteMedia(track)),
            EngineEvent::NegotiationComplete => {
                if self.state == SessionState::RemoteDescriptionApplied {
                    self.state = SessionState::Negotiated;
                    Some(SessionEvent::Negotiated)
                } else {
                    log::debug!("negotiation-complete ignored in state {:?}", self.state);
                    None
                }
            }
            EngineEvent::Fatal(reason) => {
                self.fail(&reason).await;
                Some(SessionEvent::Failed(reason))
            }
        }
    }

    // ========== ПАКЕТНЫЙ ОБМЕН ==========

    /// Упаковывает локальное описание и собранные кандидаты в один блоб
    pub fn export_bundle(&self) -> Result<String, SignalError> {
        let desc = self.local_description.clone().ok_or_else(|| {
            SignalError::NegotiationError("no local description to export".into())
        })?;
        let bundle = ConnectionBundle {
            sdp_payload: SdpPayload {
                sdp: desc,
                id: random_id(),
                ts: chrono::Utc::now().timestamp(),
            },
            ice_candidates: self.local_candidates.clone(),
        };
        Ok(signaling::encode_bundle(&bundle))
    }

    /// Применяет пакет удалённой стороны: описание через обычный путь,
    /// затем все кандидаты пакета (отказы не фатальны)
    pub async fn apply_remote_bundle(
        &mut self,
        encoded: &str,
    ) -> Result<Option<SessionDescription>, SignalError> {
        let bundle = signaling::decode_bundle(encoded)?;
        let answer = self.apply_remote(bundle.sdp_payload.sdp).await?;
        for candidate in bundle.ice_candidates {
            if let Err(e) = self.add_ice_candidate(candidate).await {
                log::warn!("bundled candidate rejected: {e}");
            }
        }
        Ok(answer)
    }

    // ========== ЗАВЕРШЕНИЕ ==========

    async fn fail(&mut self, reason: &str) {
        log::warn!("session terminated: {reason}");
        self.state = SessionState::Failed;
        self.pending_remote_candidates.clear();
        if let Err(e) = self.engine.close().await {
            log::warn!("engine close failed: {e}");
        }
    }

    /// Завершает сессию: буфер кандидатов отбрасывается, движок
    /// освобождается, дальнейшие операции невозможны
    pub async fn close(&mut self) {
        if self.state == SessionState::Failed {
            return;
        }
        self.fail("closed by caller").await;
    }
}
