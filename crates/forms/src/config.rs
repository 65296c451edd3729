use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

use crate::errors::Result;
use crate::field_types::REQUIRED_MESSAGE;

/// Prefix for environment overrides, e.g. `FORMS_VALIDATION_DEBOUNCE_MS=50`.
pub const ENV_PREFIX: &str = "FORMS";

const DEFAULT_DEBOUNCE_MS: u64 = 300;

/// Tunables shared by every form a controller manages.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct FormConfig {
    /// Quiet period before a field's validator runs.
    #[serde(default = "default_debounce_ms")]
    pub validation_debounce_ms: u64,
    /// Message attached to required fields that are left empty on collect.
    #[serde(default = "default_required_message")]
    pub required_message: String,
}

fn default_debounce_ms() -> u64 {
    DEFAULT_DEBOUNCE_MS
}

fn default_required_message() -> String {
    REQUIRED_MESSAGE.to_string()
}

impl Default for FormConfig {
    fn default() -> Self {
        Self {
            validation_debounce_ms: default_debounce_ms(),
            required_message: default_required_message(),
        }
    }
}

impl FormConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.validation_debounce_ms)
    }

    pub fn with_debounce(mut self, delay: Duration) -> Self {
        self.validation_debounce_ms = delay.as_millis() as u64;
        self
    }

    /// Layer defaults, optional `forms.json5`/`forms.toml` files from `dir` and
    /// `FORMS_*` environment variables, later sources winning.
    pub fn load(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let mut builder = config::Config::builder()
            .set_default("validation_debounce_ms", DEFAULT_DEBOUNCE_MS)?
            .set_default("required_message", REQUIRED_MESSAGE)?;

        let config_files = [
            ("forms.json5", config::FileFormat::Json5),
            ("forms.toml", config::FileFormat::Toml),
        ];
        for (file, format) in &config_files {
            let path = dir.join(file);
            if path.exists() {
                debug!(path = %path.display(), "loading form config file");
            }
            builder = builder.add_source(config::File::from(path).format(*format).required(false));
        }
        builder = builder.add_source(config::Environment::with_prefix(ENV_PREFIX));

        Ok(builder.build()?.try_deserialize()?)
    }
}
