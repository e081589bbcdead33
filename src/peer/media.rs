use crate::error::SignalError;
use std::sync::Arc;
use webrtc::track::track_local::TrackLocal;

/// Локальные дорожки, готовые к передаче транспортному движку
pub struct LocalMedia {
    pub tracks: Vec<Arc<dyn TrackLocal + Send + Sync>>,
}

/// Источник локального захвата аудио/видео. Захват устройств — внешняя
/// забота; сессия видит только результат открытия.
pub trait MediaSource: Send + Sync {
    /// Открывает источник; DeviceUnavailable если устройств нет или доступ запрещён
    fn open(&self) -> Result<LocalMedia, SignalError>;
}

/// Источник на заранее подготовленных дорожках (генератор, файл, тесты)
pub struct StaticMediaSource {
    tracks: Vec<Arc<dyn TrackLocal + Send + Sync>>,
}

impl StaticMediaSource {
    pub fn new(tracks: Vec<Arc<dyn TrackLocal + Send + Sync>>) -> Self {
        Self { tracks }
    }
}

impl MediaSource for StaticMediaSource {
    fn open(&self) -> Result<LocalMedia, SignalError> {
        if self.tracks.is_empty() {
            return Err(SignalError::DeviceUnavailable(
                "no capture tracks configured".into(),
            ));
        }
        Ok(LocalMedia {
            tracks: self.tracks.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_source_reports_device_unavailable() {
        let source = StaticMediaSource::new(Vec::new());
        assert!(matches!(
            source.open().unwrap_err(),
            SignalError::DeviceUnavailable(_)
        ));
    }
}
