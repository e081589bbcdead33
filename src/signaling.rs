//! Разбор и сериализация сигнальных сообщений внешнего канала.
//!
//! Формат рассчитан на ручную передачу человеком: описание — один JSON
//! с опциональной меткой "Offer:"/"Answer:", кандидаты — по одному JSON
//! на строку. Для передачи одним блобом (QR) есть компактный формат:
//! JSON → gzip → base64.

use crate::error::SignalError;
use crate::peer::types::{ConnectionBundle, IceCandidate, SessionDescription};
use base64::{engine::general_purpose, Engine as _};
use flate2::{read::GzDecoder, write::GzEncoder, Compression};
use std::io::{Read, Write};

/// Срезает опциональную метку "Offer:"/"Answer:" в начале полезной нагрузки.
/// Регистр не учитывается, окружающие пробелы допустимы.
fn strip_label(payload: &str) -> &str {
    let trimmed = payload.trim();
    for label in ["offer:", "answer:"] {
        if let Some(head) = trimmed.get(..label.len()) {
            if head.eq_ignore_ascii_case(label) {
                return trimmed[label.len()..].trim_start();
            }
        }
    }
    trimmed
}

/// Разбирает описание сессии из текста внешнего канала
pub fn parse_description(payload: &str) -> Result<SessionDescription, SignalError> {
    let body = strip_label(payload);
    serde_json::from_str(body)
        .map_err(|e| SignalError::MalformedPayload(format!("invalid session description: {e}")))
}

/// Сериализует описание сессии в одну строку JSON
pub fn serialize_description(desc: &SessionDescription) -> String {
    serde_json::to_string(desc).unwrap()
}

/// Разбирает один кандидат из одной строки блока
pub fn parse_candidate(line: &str) -> Result<IceCandidate, SignalError> {
    serde_json::from_str(line.trim())
        .map_err(|e| SignalError::MalformedPayload(format!("invalid ICE candidate: {e}")))
}

/// Сериализует кандидат в одну строку JSON
pub fn serialize_candidate(candidate: &IceCandidate) -> String {
    serde_json::to_string(candidate).unwrap()
}

/// Кодирует пакет соединения: JSON → gzip → base64
pub fn encode_bundle(bundle: &ConnectionBundle) -> String {
    let json = serde_json::to_vec(bundle).unwrap();
    let mut gz = GzEncoder::new(Vec::new(), Compression::fast());
    gz.write_all(&json).unwrap();
    let compressed = gz.finish().unwrap();
    general_purpose::STANDARD.encode(compressed)
}

/// Декодирует пакет соединения; любая стадия отказа — MalformedPayload
pub fn decode_bundle(encoded: &str) -> Result<ConnectionBundle, SignalError> {
    let compressed = general_purpose::STANDARD
        .decode(encoded.trim())
        .map_err(|e| SignalError::MalformedPayload(format!("invalid base64: {e}")))?;

    let mut gz = GzDecoder::new(&compressed[..]);
    let mut json = Vec::new();
    gz.read_to_end(&mut json)
        .map_err(|e| SignalError::MalformedPayload(format!("invalid gzip stream: {e}")))?;

    serde_json::from_slice(&json)
        .map_err(|e| SignalError::MalformedPayload(format!("invalid bundle JSON: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::peer::types::{DescriptionKind, SdpPayload};

    fn answer() -> SessionDescription {
        SessionDescription {
            kind: DescriptionKind::Answer,
            body: "v=0\r\no=- 123 1 IN IP4 0.0.0.0\r\n".into(),
        }
    }

    #[test]
    fn strips_answer_label_with_whitespace() {
        let desc =
            parse_description("Answer:   {\"type\":\"answer\",\"sdp\":\"v=0\\r\\n\"}").unwrap();
        assert_eq!(desc.kind, DescriptionKind::Answer);
        assert_eq!(desc.body, "v=0\r\n");
    }

    #[test]
    fn label_match_is_case_insensitive() {
        let desc = parse_description("  oFFeR: {\"type\":\"offer\",\"sdp\":\"x\"}  ").unwrap();
        assert_eq!(desc.kind, DescriptionKind::Offer);
    }

    #[test]
    fn unlabeled_description_parses() {
        let desc = parse_description("{\"type\":\"offer\",\"sdp\":\"x\"}").unwrap();
        assert_eq!(desc.kind, DescriptionKind::Offer);
    }

    #[test]
    fn description_round_trips() {
        let original = answer();
        let parsed = parse_description(&serialize_description(&original)).unwrap();
        assert_eq!(parsed, original);
    }

    #[test]
    fn labeled_serialized_description_round_trips() {
        let original = answer();
        let labeled = format!("Answer: {}", serialize_description(&original));
        assert_eq!(parse_description(&labeled).unwrap(), original);
    }

    #[test]
    fn garbage_description_is_malformed() {
        let err = parse_description("Offer: not json at all").unwrap_err();
        assert!(matches!(err, SignalError::MalformedPayload(_)));
    }

    #[test]
    fn description_without_type_is_malformed() {
        let err = parse_description("{\"sdp\":\"v=0\"}").unwrap_err();
        assert!(matches!(err, SignalError::MalformedPayload(_)));
    }

    #[test]
    fn candidate_round_trips() {
        let original = IceCandidate {
            candidate: "candidate:1 1 UDP 2122252543 192.168.1.1 12345 typ host".into(),
            sdp_mid: Some("0".into()),
            sdp_mline_index: Some(0),
            username_fragment: Some("abc123".into()),
        };
        let parsed = parse_candidate(&serialize_candidate(&original)).unwrap();
        assert_eq!(parsed, original);
    }

    #[test]
    fn unknown_fields_do_not_fail_candidate_parse() {
        assert!(parse_candidate("{\"valid\":1}").is_ok());
    }

    #[test]
    fn bad_candidate_line_is_malformed() {
        assert!(matches!(
            parse_candidate("bad").unwrap_err(),
            SignalError::MalformedPayload(_)
        ));
    }

    #[test]
    fn bundle_round_trips() {
        let bundle = ConnectionBundle {
            sdp_payload: SdpPayload {
                sdp: answer(),
                id: "deadbeefdeadbeef".into(),
                ts: 1_700_000_000,
            },
            ice_candidates: vec![
                IceCandidate {
                    candidate: "candidate:1 1 UDP 1 10.0.0.1 1000 typ host".into(),
                    ..Default::default()
                },
                IceCandidate {
                    candidate: "candidate:2 1 UDP 2 10.0.0.2 2000 typ srflx".into(),
                    ..Default::default()
                },
            ],
        };

        let decoded = decode_bundle(&encode_bundle(&bundle)).unwrap();
        assert_eq!(decoded, bundle);
    }

    #[test]
    fn bundle_rejects_bad_base64() {
        assert!(matches!(
            decode_bundle("%%%not-base64%%%").unwrap_err(),
            SignalError::MalformedPayload(_)
        ));
    }

    #[test]
    fn bundle_rejects_plain_base64_without_gzip() {
        let encoded = general_purpose::STANDARD.encode(b"{\"not\":\"gzipped\"}");
        assert!(matches!(
            decode_bundle(&encoded).unwrap_err(),
            SignalError::MalformedPayload(_)
        ));
    }
}
