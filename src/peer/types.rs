use serde::{Deserialize, Serialize};
use std::fmt;

/// Вид описания сессии; первый применённый remote фиксирует форму обмена
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DescriptionKind {
    Offer,
    Answer,
}

impl fmt::Display for DescriptionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DescriptionKind::Offer => write!(f, "offer"),
            DescriptionKind::Answer => write!(f, "answer"),
        }
    }
}

/// Описание сессии для обмена по внешнему каналу.
/// Тело SDP передаётся как есть и семантически не интерпретируется.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct SessionDescription {
    #[serde(rename = "type")]
    pub kind: DescriptionKind,
    #[serde(rename = "sdp", default)]
    pub body: String,
}

/// ICE кандидат — непрозрачный дескриптор одного сетевого пути.
/// Все поля опциональны: проверяется только структурная корректность JSON.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
#[serde(default)]
pub struct IceCandidate {
    pub candidate: String,
    #[serde(rename = "sdpMid")]
    pub sdp_mid: Option<String>,
    #[serde(rename = "sdpMLineIndex")]
    pub sdp_mline_index: Option<u16>,
    #[serde(rename = "usernameFragment")]
    pub username_fragment: Option<String>,
}

/// Полезная нагрузка SDP с метаданными
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct SdpPayload {
    pub sdp: SessionDescription,
    pub id: String,
    pub ts: i64,
}

/// Полный пакет соединения с SDP и кандидатами
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ConnectionBundle {
    pub sdp_payload: SdpPayload,
    pub ice_candidates: Vec<IceCandidate>,
}

/// Конфигурация ICE сервера
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ServerConfig {
    pub id: String,
    pub r#type: String, // 'stun' or 'turn'
    pub url: String,
    pub username: Option<String>,
    pub credential: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn description_wire_keys_match_browser_json() {
        let desc = SessionDescription {
            kind: DescriptionKind::Answer,
            body: "v=0\r\n".into(),
        };
        let json = serde_json::to_string(&desc).unwrap();
        assert!(json.contains("\"type\":\"answer\""));
        assert!(json.contains("\"sdp\":"));
    }

    #[test]
    fn candidate_wire_keys_match_browser_json() {
        let cand = IceCandidate {
            candidate: "candidate:1 1 UDP 2122252543 192.168.1.1 12345 typ host".into(),
            sdp_mid: Some("0".into()),
            sdp_mline_index: Some(0),
            username_fragment: None,
        };
        let json = serde_json::to_string(&cand).unwrap();
        assert!(json.contains("\"sdpMid\""));
        assert!(json.contains("\"sdpMLineIndex\""));
    }

    #[test]
    fn candidate_accepts_any_json_object() {
        let cand: IceCandidate = serde_json::from_str("{\"valid\":1}").unwrap();
        assert_eq!(cand, IceCandidate::default());
    }
}
