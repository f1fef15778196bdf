use std::path::Path;

use thiserror::Error;
use tracing::{info, warn};

use crate::config::RadioConfig;
use crate::protocol::{LiveState, RadioStation};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid station file: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("station file has no stations")]
    Empty,
}

/// The collective's own stations, used when no override file exists.
pub fn builtin_stations() -> Vec<RadioStation> {
    vec![
        RadioStation {
            id: 1,
            name: "Radio Taller".to_string(),
            description: "La voz de los talleres: clases abiertas, entrevistas y música local."
                .to_string(),
            genre: "Comunitaria".to_string(),
            stream_url: "https://stream.zeno.fm/f3wvbbqmdg8uv".to_string(),
            accent: "#ff5f5f".to_string(),
            listeners: "1.2k".to_string(),
            current_program: "Mañanas de barrio".to_string(),
            next_program: "Cerámica en voz alta".to_string(),
            live_state: LiveState::Live,
        },
        RadioStation {
            id: 2,
            name: "Cumbia Patio".to_string(),
            description: "Cumbias, porros y champeta para pintar murales.".to_string(),
            genre: "Tropical".to_string(),
            stream_url: "https://stream.zeno.fm/0r0xa792kwzuv".to_string(),
            accent: "#ffb850".to_string(),
            listeners: "860".to_string(),
            current_program: "Patio sonoro".to_string(),
            next_program: "Picó de medianoche".to_string(),
            live_state: LiveState::Live,
        },
        RadioStation {
            id: 3,
            name: "Archivo Vivo".to_string(),
            description: "Conciertos grabados en la casa cultural.".to_string(),
            genre: "Conciertos".to_string(),
            stream_url: "https://ice1.somafm.com/groovesalad-128-mp3".to_string(),
            accent: "#7864c8".to_string(),
            listeners: "430".to_string(),
            current_program: "Sesión acústica 2023".to_string(),
            next_program: "Festival de fanzines".to_string(),
            live_state: LiveState::Recorded,
        },
        RadioStation {
            id: 4,
            name: "Lo-fi Estudio".to_string(),
            description: "Ritmos tranquilos para estudiar y dibujar.".to_string(),
            genre: "Lo-fi".to_string(),
            stream_url: "https://ice1.somafm.com/fluid-128-mp3".to_string(),
            accent: "#50c878".to_string(),
            listeners: "2.4k".to_string(),
            current_program: "Bocetos nocturnos".to_string(),
            next_program: "Café y acuarela".to_string(),
            live_state: LiveState::Recorded,
        },
    ]
}

/// Station catalog: `stations.toml`, else `stations.m3u`, else the
/// built-in list.  A broken override is logged and skipped.
pub fn load_stations(config: &RadioConfig) -> Vec<RadioStation> {
    if config.stations_toml.exists() {
        match load_stations_from_toml(&config.stations_toml) {
            Ok(s) => {
                info!(
                    "Loaded {} stations from {}",
                    s.len(),
                    config.stations_toml.display()
                );
                return s;
            }
            Err(e) => warn!("Ignoring {}: {}", config.stations_toml.display(), e),
        }
    }

    if config.stations_m3u.exists() {
        match load_stations_from_m3u(&config.stations_m3u) {
            Ok(s) => {
                info!(
                    "Loaded {} stations from {}",
                    s.len(),
                    config.stations_m3u.display()
                );
                return s;
            }
            Err(e) => warn!("Ignoring {}: {}", config.stations_m3u.display(), e),
        }
    }

    builtin_stations()
}

fn read(path: &Path) -> Result<String, CatalogError> {
    std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
        path: path.display().to_string(),
        source,
    })
}

pub fn load_stations_from_m3u(path: &Path) -> Result<Vec<RadioStation>, CatalogError> {
    parse_m3u_from_str(&read(path)?)
}

/// Extended M3U: `#EXTINF:-1,Name` lines name the URL that follows.
pub fn parse_m3u_from_str(content: &str) -> Result<Vec<RadioStation>, CatalogError> {
    let mut stations = Vec::new();
    let mut pending_name: Option<String> = None;

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(rest) = line.strip_prefix("#EXTINF:") {
            if let Some(comma_idx) = rest.find(',') {
                pending_name = Some(rest[comma_idx + 1..].trim().to_string());
            }
            continue;
        }

        if line.starts_with('#') {
            continue;
        }

        let url = line.to_string();
        let name = pending_name.take().unwrap_or_else(|| url.clone());

        stations.push(RadioStation {
            id: stations.len() as u32 + 1,
            name,
            stream_url: url,
            ..RadioStation::default()
        });
    }

    if stations.is_empty() {
        return Err(CatalogError::Empty);
    }
    Ok(stations)
}

// ── TOML station loader ───────────────────────────────────────────────────────

/// Matches the `[[station]]` tables.  Kept apart from `RadioStation` so the
/// file format can omit ids and use friendlier field names.
#[derive(Debug, serde::Deserialize)]
struct TomlStationFile {
    station: Vec<TomlStation>,
}

#[derive(Debug, serde::Deserialize)]
struct TomlStation {
    #[serde(default)]
    id: Option<u32>,
    name: String,
    url: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    genre: String,
    #[serde(default)]
    accent: String,
    #[serde(default)]
    listeners: String,
    #[serde(default)]
    now: String,
    #[serde(default)]
    next: String,
    #[serde(default)]
    recorded: bool,
}

pub fn load_stations_from_toml(path: &Path) -> Result<Vec<RadioStation>, CatalogError> {
    parse_stations_from_toml_str(&read(path)?)
}

pub fn parse_stations_from_toml_str(content: &str) -> Result<Vec<RadioStation>, CatalogError> {
    let file: TomlStationFile = toml::from_str(content)?;
    if file.station.is_empty() {
        return Err(CatalogError::Empty);
    }
    let stations = file
        .station
        .into_iter()
        .enumerate()
        .map(|(i, s)| RadioStation {
            id: s.id.unwrap_or(i as u32 + 1),
            name: s.name,
            description: s.description,
            genre: s.genre,
            stream_url: s.url,
            accent: s.accent,
            listeners: s.listeners,
            current_program: s.now,
            next_program: s.next,
            live_state: if s.recorded {
                LiveState::Recorded
            } else {
                LiveState::Live
            },
        })
        .collect();
    Ok(stations)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_catalog_is_usable() {
        let stations = builtin_stations();
        assert!(stations.len() >= 2);
        for s in &stations {
            assert!(s.stream_url.starts_with("https://"), "{}", s.name);
        }
        let ids: std::collections::HashSet<u32> = stations.iter().map(|s| s.id).collect();
        assert_eq!(ids.len(), stations.len());
    }

    #[test]
    fn test_parse_m3u() {
        let m3u = "#EXTM3U\n#EXTINF:-1,Radio Uno\nhttps://a.example/uno\n\nhttps://b.example/dos\n";
        let stations = parse_m3u_from_str(m3u).unwrap();
        assert_eq!(stations.len(), 2);
        assert_eq!(stations[0].name, "Radio Uno");
        assert_eq!(stations[1].name, "https://b.example/dos");
        assert_eq!(stations[1].id, 2);
    }

    #[test]
    fn test_empty_m3u_is_an_error() {
        assert!(matches!(
            parse_m3u_from_str("#EXTM3U\n"),
            Err(CatalogError::Empty)
        ));
    }

    #[test]
    fn test_parse_toml() {
        let toml = r#"
[[station]]
name = "Patio"
url = "https://a.example/patio"
genre = "Tropical"
now = "Mañana"

[[station]]
id = 9
name = "Archivo"
url = "https://a.example/archivo"
recorded = true
"#;
        let stations = parse_stations_from_toml_str(toml).unwrap();
        assert_eq!(stations[0].id, 1);
        assert_eq!(stations[0].current_program, "Mañana");
        assert_eq!(stations[0].live_state, LiveState::Live);
        assert_eq!(stations[1].id, 9);
        assert_eq!(stations[1].live_state, LiveState::Recorded);
    }

    #[test]
    fn test_load_prefers_toml_then_m3u_then_builtin() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = RadioConfig {
            stations_toml: dir.path().join("stations.toml"),
            stations_m3u: dir.path().join("stations.m3u"),
            ..RadioConfig::default()
        };
        assert_eq!(load_stations(&config), builtin_stations());

        std::fs::write(&config.stations_m3u, "https://m3u.example/one\n").unwrap();
        assert_eq!(load_stations(&config)[0].stream_url, "https://m3u.example/one");

        std::fs::write(&config.stations_toml, "not = [valid").unwrap();
        assert_eq!(load_stations(&config)[0].stream_url, "https://m3u.example/one");

        std::fs::write(
            &config.stations_toml,
            "[[station]]\nname = \"T\"\nurl = \"https://toml.example/t\"\n",
        )
        .unwrap();
        assert_eq!(load_stations(&config)[0].stream_url, "https://toml.example/t");

        config.stations_toml = dir.path().join("missing.toml");
        config.stations_m3u = dir.path().join("missing.m3u");
        assert_eq!(load_stations(&config).len(), builtin_stations().len());
    }
}
