use crate::peer::types::ServerConfig;
use rand::Rng;

pub fn random_id() -> String {
    hex::encode(rand::rng().random::<[u8; 8]>())
}

// Функция для добавления схемы протокола к URL ICE сервера, если она отсутствует
pub fn add_ice_url_scheme(config: &ServerConfig) -> String {
    // Если url уже начинается с "turn:" или "stun:", возвращаем как есть
    if config.url.starts_with("turn:") || config.url.starts_with("stun:") {
        config.url.clone()
    } else {
        // В зависимости от типа сервера добавляем нужную схему
        let scheme = if config.r#type == "turn" {
            "turn:"
        } else {
            "stun:"
        };
        format!("{}{}", scheme, config.url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn server(r#type: &str, url: &str) -> ServerConfig {
        ServerConfig {
            id: "test".into(),
            r#type: r#type.into(),
            url: url.into(),
            username: None,
            credential: None,
        }
    }

    #[test]
    fn keeps_existing_scheme() {
        assert_eq!(
            add_ice_url_scheme(&server("stun", "stun:stun.l.google.com:19302")),
            "stun:stun.l.google.com:19302"
        );
    }

    #[test]
    fn adds_scheme_by_server_type() {
        assert_eq!(
            add_ice_url_scheme(&server("turn", "turn.example.com:3478")),
            "turn:turn.example.com:3478"
        );
        assert_eq!(
            add_ice_url_scheme(&server("stun", "stun.example.com")),
            "stun:stun.example.com"
        );
    }

    #[test]
    fn random_ids_are_unique_hex() {
        let a = random_id();
        let b = random_id();
        assert_eq!(a.len(), 16);
        assert_ne!(a, b);
    }
}
