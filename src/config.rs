use crate::error::SignalError;
use crate::peer::types::ServerConfig;
use crate::utils::add_ice_url_scheme;
use once_cell::sync::Lazy;
use std::sync::Mutex;
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::policy::bundle_policy::RTCBundlePolicy;
use webrtc::peer_connection::policy::rtcp_mux_policy::RTCRtcpMuxPolicy;

/// Глобальное хранилище для пользовательских ICE серверов
static USER_ICE_SERVERS: Lazy<Mutex<Option<Vec<ServerConfig>>>> = Lazy::new(|| Mutex::new(None));

/// Устанавливает пользовательские ICE серверы после валидации
pub fn set_ice_servers(servers: Vec<ServerConfig>) -> Result<(), SignalError> {
    for server in &servers {
        if server.url.is_empty() {
            return Err(SignalError::MalformedPayload(
                "ICE server URL cannot be empty".into(),
            ));
        }
        if server.r#type == "turn" && (server.username.is_none() || server.credential.is_none()) {
            return Err(SignalError::MalformedPayload(
                "TURN servers require username and credential".into(),
            ));
        }
    }

    *USER_ICE_SERVERS.lock().unwrap() = Some(servers);
    Ok(())
}

/// Получает пользовательские ICE серверы, возвращает дефолтные если не установлены
pub fn get_ice_servers() -> Vec<ServerConfig> {
    USER_ICE_SERVERS.lock().unwrap().clone().unwrap_or_else(|| {
        vec![ServerConfig {
            id: "default-stun".into(),
            r#type: "stun".into(),
            url: "stun:stun.l.google.com:19302".into(),
            username: None,
            credential: None,
        }]
    })
}

/// Создает конфигурацию для peer connection
pub(crate) fn rtc_config() -> RTCConfiguration {
    let custom_servers = USER_ICE_SERVERS.lock().unwrap().clone();

    let ice_servers = if let Some(servers) = custom_servers {
        ice_servers_from(servers)
    } else {
        vec![RTCIceServer {
            urls: vec![
                "stun:stun.l.google.com:19302".into(),
                "stun:stun1.l.google.com:19302".into(),
            ],
            ..Default::default()
        }]
    };

    RTCConfiguration {
        ice_servers,
        ice_candidate_pool_size: 10,
        bundle_policy: RTCBundlePolicy::MaxBundle,
        rtcp_mux_policy: RTCRtcpMuxPolicy::Require,
        ..Default::default()
    }
}

fn ice_servers_from(servers: Vec<ServerConfig>) -> Vec<RTCIceServer> {
    servers
        .into_iter()
        .map(|config| {
            let url = add_ice_url_scheme(&config);

            RTCIceServer {
                urls: vec![url],
                username: config.username.unwrap_or_default(),
                credential: config.credential.unwrap_or_default(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn turn(username: Option<&str>, credential: Option<&str>) -> ServerConfig {
        ServerConfig {
            id: "turn-1".into(),
            r#type: "turn".into(),
            url: "turn.example.com:3478".into(),
            username: username.map(Into::into),
            credential: credential.map(Into::into),
        }
    }

    #[test]
    fn rejects_empty_url() {
        let server = ServerConfig {
            id: "bad".into(),
            r#type: "stun".into(),
            url: String::new(),
            username: None,
            credential: None,
        };
        let err = set_ice_servers(vec![server]).unwrap_err();
        assert!(matches!(err, SignalError::MalformedPayload(_)));
    }

    #[test]
    fn rejects_turn_without_credentials() {
        let err = set_ice_servers(vec![turn(Some("user"), None)]).unwrap_err();
        assert!(matches!(err, SignalError::MalformedPayload(_)));
    }

    #[test]
    fn accepts_and_returns_custom_servers() {
        // глобальное состояние: проверяем установку и чтение в одном тесте
        set_ice_servers(vec![turn(Some("user"), Some("secret"))]).unwrap();
        let servers = get_ice_servers();
        assert_eq!(servers.len(), 1);
        assert_eq!(servers[0].id, "turn-1");

        let config = rtc_config();
        assert_eq!(config.ice_servers.len(), 1);
        assert_eq!(config.ice_servers[0].urls[0], "turn:turn.example.com:3478");
        assert_eq!(config.ice_servers[0].username, "user");
    }
}
