use std::path::{Path, PathBuf};

use meridian_engine::loader::{LoadMode, LoaderConfig, ShapefileRequest};
use meridian_engine::time::DEFAULT_UPDATE_RATE;
use meridian_engine::window::RuntimeConfig;
use winit::dpi::LogicalSize;

pub const DATA_DIR_VAR: &str = "MERIDIAN_DATA_DIR";
pub const SINGLE_THREADED_VAR: &str = "MERIDIAN_SINGLE_THREADED";
pub const UPDATE_RATE_VAR: &str = "MERIDIAN_UPDATE_RATE";

/// Viewer settings, read from the environment.
#[derive(Debug, Clone)]
pub struct ViewerConfig {
    /// Directory holding the shapefiles and icons.
    pub data_dir: PathBuf,
    pub loader: LoaderConfig,
    pub runtime: RuntimeConfig,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            loader: LoaderConfig::default(),
            runtime: RuntimeConfig {
                title: "Meridian".to_string(),
                initial_size: LogicalSize::new(1280.0, 720.0),
                update_rate: Some(DEFAULT_UPDATE_RATE),
            },
        }
    }
}

impl ViewerConfig {
    pub fn from_env() -> Self {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    /// Builds the config from a variable lookup; unset or invalid values keep defaults.
    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(dir) = var(DATA_DIR_VAR).filter(|d| !d.is_empty()) {
            config.data_dir = PathBuf::from(dir);
        }

        if let Some(flag) = var(SINGLE_THREADED_VAR)
            && parse_flag(&flag)
        {
            config.loader.mode = LoadMode::Inline;
        }

        if let Some(rate) = var(UPDATE_RATE_VAR) {
            match rate.trim().parse::<f64>() {
                Ok(hz) if hz.is_finite() && hz >= 0.0 => {
                    config.runtime.update_rate = (hz > 0.0).then_some(hz);
                }
                _ => log::warn!("ignoring {UPDATE_RATE_VAR}={rate:?}: expected a rate in Hz"),
            }
        }

        config
    }

    /// The layers loaded at startup, in request order.
    pub fn requests(&self) -> Vec<ShapefileRequest> {
        let path = |name: &str| data_path(&self.data_dir, name);
        vec![
            ShapefileRequest::polygon(path("110m_admin_0_countries.shp")),
            ShapefileRequest::polyline(path("110m_admin_1_states_provinces_lines_shp.shp")),
            ShapefileRequest::point(path("airprtx020.shp"), path("paper-plane--arrow.png")),
            ShapefileRequest::point(path("amtrakx020.shp"), path("car-red.png")),
            ShapefileRequest::point(path("110m_populated_places_simple.shp"), path("032.png")),
        ]
    }
}

fn data_path(dir: &Path, name: &str) -> String {
    dir.join(name).to_string_lossy().into_owned()
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use meridian_shapefile::ShapeType;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> ViewerConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ViewerConfig::from_vars(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_without_environment() {
        let c = config(&[]);
        assert_eq!(c.data_dir, PathBuf::from("data"));
        assert_eq!(c.loader.mode, LoadMode::Threaded);
        assert_eq!(c.runtime.update_rate, Some(30.0));
    }

    #[test]
    fn single_threaded_flag_selects_inline_loading() {
        assert_eq!(config(&[(SINGLE_THREADED_VAR, "1")]).loader.mode, LoadMode::Inline);
        assert_eq!(config(&[(SINGLE_THREADED_VAR, "TRUE")]).loader.mode, LoadMode::Inline);
        assert_eq!(config(&[(SINGLE_THREADED_VAR, "0")]).loader.mode, LoadMode::Threaded);
    }

    #[test]
    fn update_rate_parsing() {
        assert_eq!(config(&[(UPDATE_RATE_VAR, "60")]).runtime.update_rate, Some(60.0));
        assert_eq!(config(&[(UPDATE_RATE_VAR, "0")]).runtime.update_rate, None);
        assert_eq!(config(&[(UPDATE_RATE_VAR, "fast")]).runtime.update_rate, Some(30.0));
        assert_eq!(config(&[(UPDATE_RATE_VAR, "-1")]).runtime.update_rate, Some(30.0));
    }

    #[test]
    fn startup_requests_resolve_against_data_dir() {
        let c = config(&[(DATA_DIR_VAR, "/srv/maps")]);
        let requests = c.requests();

        let types: Vec<_> = requests.iter().map(|r| r.shape_type()).collect();
        assert_eq!(
            types,
            [
                ShapeType::Polygon,
                ShapeType::PolyLine,
                ShapeType::Point,
                ShapeType::Point,
                ShapeType::Point
            ]
        );

        let countries = Path::new("/srv/maps").join("110m_admin_0_countries.shp");
        assert_eq!(requests[0].path(), countries.to_str().unwrap());
        assert_eq!(requests[0].icon_path(), None);
        assert!(requests[2].icon_path().unwrap().ends_with("paper-plane--arrow.png"));
        assert!(requests[4].icon_path().unwrap().ends_with("032.png"));
    }
}
