use super::{types::Config, ConfigError};

const MAX_JITTER_SECS: u64 = 24 * 60 * 60;

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Scheduler tick interval is not 0, jitter stays under a day and target
///   hours are valid hours of day
/// - Track extensions are not empty
/// - Selected searcher / torrent client backends have their settings block
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    if config.scheduler.tick_interval_ms == 0 {
        return Err(ConfigError::ValidationError(
            "scheduler.tick_interval_ms cannot be 0".to_string(),
        ));
    }

    if config.scheduler.jitter_max_secs > MAX_JITTER_SECS {
        return Err(ConfigError::ValidationError(format!(
            "scheduler.jitter_max_secs cannot exceed {}, got {}",
            MAX_JITTER_SECS, config.scheduler.jitter_max_secs
        )));
    }

    let hours = &config.scheduler.target_hours;
    for (name, hour) in [("tv_show", hours.tv_show), ("game", hours.game)] {
        if hour > 23 {
            return Err(ConfigError::ValidationError(format!(
                "scheduler.target_hours.{} must be between 0 and 23, got {}",
                name, hour
            )));
        }
    }

    let tracks = &config.tracks;
    for (name, ext) in [
        ("video_extension", &tracks.video_extension),
        ("audio_extension", &tracks.audio_extension),
        ("subtitle_extension", &tracks.subtitle_extension),
    ] {
        if ext.trim().is_empty() {
            return Err(ConfigError::ValidationError(format!(
                "tracks.{} cannot be empty",
                name
            )));
        }
    }

    if let Some(searcher) = &config.searcher {
        if searcher.jackett.is_none() {
            return Err(ConfigError::ValidationError(
                "searcher.backend = \"jackett\" requires a [searcher.jackett] section".to_string(),
            ));
        }
    }

    if let Some(client) = &config.torrent_client {
        if client.qbittorrent.is_none() {
            return Err(ConfigError::ValidationError(
                "torrent_client.backend = \"qbittorrent\" requires a [torrent_client.qbittorrent] section"
                    .to_string(),
            ));
        }
    }

    Ok(())
}
