use std::sync::{Arc, OnceLock};
use std::time::Duration;

use config::{Config, ConfigError, File, FileFormat};
use serde::Deserialize;

static SETTINGS: OnceLock<Arc<Settings>> = OnceLock::new();

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    /// Process and application name, e.g. "MarginNote 3".
    pub name: String,
    /// URL scheme used for `open location`, e.g. "marginnote3app".
    pub url_scheme: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            name: "MarginNote 3".into(),
            url_scheme: "marginnote3app".into(),
        }
    }
}

impl AppSettings {
    pub fn notebook_url(&self, id: &str) -> String {
        format!("{}://notebook/{id}", self.url_scheme)
    }
}

/// Launch behaviour: MarginNote may show a dialog on start that needs a
/// Return keystroke to dismiss.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AlertSettings {
    pub skip_alert: bool,
    /// Seconds to wait after launch before sending the keystroke.
    pub waiting_time: f64,
}

impl Default for AlertSettings {
    fn default() -> Self {
        Self {
            skip_alert: false,
            waiting_time: 1.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PollSettings {
    pub interval_ms: u64,
    pub max_attempts: u32,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval_ms: 100,
            max_attempts: 600,
        }
    }
}

impl PollSettings {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct InterpreterSettings {
    pub command: String,
}

impl Default for InterpreterSettings {
    fn default() -> Self {
        Self {
            command: "osascript".into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    pub level: String,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: "info".into(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub app: AppSettings,
    pub alert: AlertSettings,
    pub poll: PollSettings,
    pub interpreter: InterpreterSettings,
    pub log: LogSettings,
}

impl Settings {
    pub fn load() -> Result<Arc<Self>, ConfigError> {
        let env = std::env::var("MNCTL_ENV").unwrap_or_else(|_| "local".into());
        let config_dir = std::env::var("MNCTL_CONFIG_DIR").unwrap_or_else(|_| "config".into());
        Self::load_from(&config_dir, &env, None)
    }

    /// Layers, lowest first: `<dir>/default.toml`, `<dir>/<env>.toml`, then
    /// `MNCTL__SECTION__KEY` variables. `vars` replaces the process
    /// environment when given.
    pub fn load_from(
        config_dir: &str,
        env: &str,
        vars: Option<config::Map<String, String>>,
    ) -> Result<Arc<Self>, ConfigError> {
        // The binary is usually launched from a palette host with an arbitrary
        // working directory, so every file layer is optional.
        let config = Config::builder()
            .add_source(
                File::new(&format!("{config_dir}/default"), FileFormat::Toml).required(false),
            )
            .add_source(File::new(&format!("{config_dir}/{env}"), FileFormat::Toml).required(false))
            .add_source(
                config::Environment::with_prefix("MNCTL")
                    .separator("__")
                    .try_parsing(true)
                    .source(vars),
            )
            .build()?;

        let settings = config.try_deserialize::<Settings>()?;
        Ok(Arc::new(settings))
    }

    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.app.name.trim().is_empty() {
            errors.push("app.name must not be empty".to_string());
        }
        if self.app.url_scheme.trim().is_empty() {
            errors.push("app.url_scheme must not be empty".to_string());
        }
        if !self.alert.waiting_time.is_finite() || self.alert.waiting_time < 0.0 {
            errors.push(format!(
                "alert.waiting_time must be a non-negative number of seconds, got {}",
                self.alert.waiting_time
            ));
        }
        if self.poll.interval_ms == 0 {
            errors.push("poll.interval_ms must be greater than 0".to_string());
        }
        if self.poll.max_attempts == 0 {
            errors.push("poll.max_attempts must be greater than 0".to_string());
        }
        if self.interpreter.command.trim().is_empty() {
            errors.push("interpreter.command must not be empty".to_string());
        }
        errors
    }
}

pub fn get_settings() -> &'static Arc<Settings> {
    SETTINGS.get().expect("settings not initialised")
}

pub fn init_settings(settings: Arc<Settings>) {
    SETTINGS
        .set(settings)
        .expect("init_settings called more than once");
}
