//! Daemon configuration

use netscope_common::MergeOptions;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Daemon configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DaemonConfig {
    /// Store directory path
    pub store_path: PathBuf,

    /// Network-management controller we read topology from
    pub controller: ControllerConfig,

    /// HTTP surface for the renderer and operators
    pub http: HttpConfig,

    /// Layout persistence
    pub layout: LayoutConfig,

    /// Graph merge behaviour
    pub merge: MergeOptions,

    /// Renderer configuration, passed through untouched
    pub render: serde_json::Value,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            store_path: netscope_common::default_store_path(),
            controller: ControllerConfig::default(),
            http: HttpConfig::default(),
            layout: LayoutConfig::default(),
            merge: MergeOptions::default(),
            render: default_render_config(),
        }
    }
}

/// Controller connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// Base URL of the controller REST API
    pub base_url: String,

    /// Bearer token sent with every request
    pub token: Option<String>,

    /// Event stream URL; derived from `base_url` when unset
    pub push_url: Option<String>,

    /// Listen for push notifications at all
    pub enable_push: bool,

    /// Per-request timeout for snapshot fetches
    pub request_timeout_secs: u64,

    /// Delay before reconnecting a dropped event stream
    pub reconnect_delay_secs: u64,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:27182".to_string(),
            token: None,
            push_url: None,
            enable_push: true,
            request_timeout_secs: 10,
            reconnect_delay_secs: 5,
        }
    }
}

impl ControllerConfig {
    /// Snapshot endpoint
    pub fn topology_url(&self) -> String {
        format!("{}/api/v1/topology", self.base_url.trim_end_matches('/'))
    }

    /// Event stream endpoint
    pub fn push_url(&self) -> String {
        if let Some(url) = &self.push_url {
            return url.clone();
        }
        let base = self.base_url.trim_end_matches('/');
        let ws_base = if let Some(rest) = base.strip_prefix("https://") {
            format!("wss://{}", rest)
        } else if let Some(rest) = base.strip_prefix("http://") {
            format!("ws://{}", rest)
        } else {
            base.to_string()
        };
        format!("{}/api/v1/ws", ws_base)
    }
}

/// HTTP surface settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Listen address
    pub listen: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            listen: "127.0.0.1:6090".to_string(),
        }
    }
}

/// Layout persistence settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Path to the layout database; defaults to `<store>/layout.db`
    pub db_path: Option<PathBuf>,

    /// Session the layout is stored under
    pub session: String,

    /// Keep layouts in memory only
    pub ephemeral: bool,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            db_path: None,
            session: "default".to_string(),
            ephemeral: false,
        }
    }
}

/// Settings the console's graph view has always used
fn default_render_config() -> serde_json::Value {
    serde_json::json!({
        "directed": false,
        "automaticRearrangeAfterDropNode": true,
        "nodeHighlightBehavior": true,
        "highlightOpacity": 0.9,
        "highlightDegree": 0,
        "initialZoom": 4,
        "focusZoom": 3,
        "maxZoom": 12,
        "minZoom": 0.05,
        "panAndZoom": false,
        "staticGraph": false,
        "staticGraphWithDragAndDrop": true,
        "node": {
            "color": "lightgreen",
            "size": 200,
            "highlightStrokeColor": "blue",
            "labelPosition": "bottom",
            "symbolType": "square",
            "fontSize": 5,
            "highlightFontSize": 5
        },
        "link": {
            "fontSize": 4.5,
            "mouseCursor": "pointer",
            "opacity": 1,
            "renderLabel": true,
            "semanticStrokeWidth": true,
            "strokeWidth": 1,
            "type": "STRAIGHT"
        }
    })
}

impl DaemonConfig {
    /// Load configuration from file
    pub fn load(path: &std::path::Path) -> anyhow::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Self = toml::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to file
    pub fn save(&self, path: &std::path::Path) -> anyhow::Result<()> {
        let content = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the layout database path
    pub fn db_path(&self) -> PathBuf {
        self.layout
            .db_path
            .clone()
            .unwrap_or_else(|| self.store_path.join("layout.db"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use netscope_common::EmptyIdPolicy;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = DaemonConfig::load(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.http.listen, "127.0.0.1:6090");
        assert_eq!(config.merge.empty_ids, EmptyIdPolicy::Skip);
        assert_eq!(config.render["node"]["symbolType"], "square");
    }

    #[test]
    fn test_partial_file_overrides_sections() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
            [controller]
            base_url = "https://nms.example:8443/"
            token = "secret"

            [layout]
            session = "noc-wall"

            [merge]
            empty_ids = "include"
            blocked_link_color = "red"

            [merge.images.models]
            EHG9508 = "EHG9508.png"

            [render]
            directed = true
            "#,
        )
        .unwrap();

        let config = DaemonConfig::load(&path).unwrap();
        assert_eq!(config.controller.topology_url(), "https://nms.example:8443/api/v1/topology");
        assert_eq!(config.controller.push_url(), "wss://nms.example:8443/api/v1/ws");
        assert_eq!(config.controller.request_timeout_secs, 10);
        assert_eq!(config.layout.session, "noc-wall");
        assert_eq!(config.merge.empty_ids, EmptyIdPolicy::Include);
        assert_eq!(config.merge.blocked_link_color, "red");
        assert_eq!(config.merge.images.resolve("EHG9508"), "/assets/images/EHG9508.png");
        assert_eq!(config.render["directed"], true);
    }

    #[test]
    fn test_save_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = DaemonConfig::default();
        config.controller.push_url = Some("ws://10.0.0.1/api/v1/ws".to_string());
        config.save(&path).unwrap();

        let loaded = DaemonConfig::load(&path).unwrap();
        assert_eq!(loaded.controller.push_url(), "ws://10.0.0.1/api/v1/ws");
        assert_eq!(loaded.db_path(), config.db_path());
        assert_eq!(loaded.merge, config.merge);
    }
}
