use std::env;

const DEFAULT_GEOCODER_URL: &str = "https://nominatim.openstreetmap.org/search";
const DEFAULT_GEOCODER_USER_AGENT: &str = "GarageMatch/1.0 (contact@example.com)";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub cors_origin: Option<String>,
    pub photos: PhotoSettings,
    pub search: SearchSettings,
    pub geocoder: GeocoderSettings,
}

/// Limits applied by photo ingestion.
#[derive(Debug, Clone)]
pub struct PhotoSettings {
    pub max_width: u32,
    pub quality: u8,
    pub max_upload_bytes: usize,
}

impl Default for PhotoSettings {
    fn default() -> Self {
        Self {
            max_width: 1600,
            quality: 80,
            max_upload_bytes: 10 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SearchSettings {
    /// Serve placeholder garages when a search matches nothing.
    pub demo_fallback: bool,
}

#[derive(Debug, Clone)]
pub struct GeocoderSettings {
    pub url: String,
    pub user_agent: String,
    pub country_codes: Option<String>,
    pub timeout_secs: u64,
}

impl Default for GeocoderSettings {
    fn default() -> Self {
        Self {
            url: DEFAULT_GEOCODER_URL.to_string(),
            user_agent: DEFAULT_GEOCODER_USER_AGENT.to_string(),
            country_codes: Some("nl".to_string()),
            timeout_secs: 10,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL")?;
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = parse_var("APP_PORT").unwrap_or(3000);
        let cors_origin = env::var("CORS_ORIGIN").ok().filter(|v| !v.trim().is_empty());

        let photo_defaults = PhotoSettings::default();
        let photos = PhotoSettings {
            max_width: parse_var("PHOTO_MAX_WIDTH").unwrap_or(photo_defaults.max_width),
            quality: parse_var::<u8>("PHOTO_QUALITY")
                .unwrap_or(photo_defaults.quality)
                .clamp(1, 100),
            max_upload_bytes: parse_var("PHOTO_MAX_UPLOAD_BYTES")
                .unwrap_or(photo_defaults.max_upload_bytes),
        };

        let search = SearchSettings {
            demo_fallback: parse_var("SEARCH_DEMO_FALLBACK").unwrap_or(false),
        };

        let geocoder_defaults = GeocoderSettings::default();
        let geocoder = GeocoderSettings {
            url: env::var("GEOCODER_URL").unwrap_or(geocoder_defaults.url),
            user_agent: env::var("GEOCODER_USER_AGENT").unwrap_or(geocoder_defaults.user_agent),
            country_codes: match env::var("GEOCODER_COUNTRY_CODES") {
                Ok(codes) if codes.trim().is_empty() => None,
                Ok(codes) => Some(codes),
                Err(_) => geocoder_defaults.country_codes,
            },
            timeout_secs: parse_var("GEOCODER_TIMEOUT_SECS")
                .unwrap_or(geocoder_defaults.timeout_secs),
        };

        Ok(Self {
            port,
            database_url,
            host,
            cors_origin,
            photos,
            search,
            geocoder,
        })
    }
}

fn parse_var<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.trim().parse::<T>().ok())
}
