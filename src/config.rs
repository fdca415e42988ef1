use anyhow::{anyhow, Result};
use std::io::{IsTerminal, Write};
use std::path::PathBuf;
use tokio::io::AsyncReadExt;

const CONFIG_PATH_REL_HOME: &str = ".config/guildgraph/config.toml";

/// Tool configuration.  Everything has a default, so running without a config
/// file is fine; the token can also come from the environment or a prompt.
#[derive(Default, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: General,
    pub graph: GraphSettings,
}

#[derive(serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct General {
    /// Account token.  Optional here; see `Config::resolve_token`.
    pub discord_token: Option<String>,
    /// Where the rendered dashboard is written.  Regenerated every run.
    pub output_path: PathBuf,
}

/// Presentation tuning for the rendered graph.  Guild node size is
/// `size_base * member_count ^ size_exponent`; the exponent keeps growth flat
/// for large guilds.
#[derive(serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct GraphSettings {
    pub size_base: f64,
    pub size_exponent: f64,
    pub background: String,
    pub font_color: String,
}

impl Default for General {
    fn default() -> Self {
        Self {
            discord_token: None,
            output_path: PathBuf::from("mutual_guilds.html"),
        }
    }
}

impl Default for GraphSettings {
    fn default() -> Self {
        Self {
            size_base: 105.0,
            size_exponent: 0.1,
            background: "#222222".to_string(),
            font_color: "white".to_string(),
        }
    }
}

impl Config {
    fn config_path() -> Result<PathBuf> {
        dirs::home_dir()
            .map(|p| p.join(CONFIG_PATH_REL_HOME))
            .ok_or(anyhow!("Could not find home directory"))
    }

    pub async fn load() -> Result<Self> {
        let path = Self::config_path()?;

        let mut file = match tokio::fs::File::open(&path).await {
            Ok(file) => file,
            // No config file is not an error; everything has a default.
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(anyhow!(
                    "Could not open configuration at `{}`: {}",
                    path.to_string_lossy(),
                    e
                ));
            }
        };

        let mut contents = String::new();
        file.read_to_string(&mut contents).await.map_err(|e| {
            anyhow!(
                "Could not read configuration at `{}`: {}",
                path.to_string_lossy(),
                e
            )
        })?;

        let config: Config = toml::from_str(&contents).map_err(|e| {
            anyhow!(
                "Could not parse configuration at `{}`: {}",
                path.to_string_lossy(),
                e
            )
        })?;

        Ok(config)
    }

    /// Resolve the account token: config file, then the `DISCORD_TOKEN`
    /// environment variable, then an interactive prompt.  Failing all three
    /// halts the run before any network activity.
    pub fn resolve_token(&self) -> Result<String> {
        if let Some(token) = &self.general.discord_token {
            if !token.is_empty() {
                return Ok(token.clone());
            }
        }

        if let Ok(token) = std::env::var("DISCORD_TOKEN") {
            if !token.is_empty() {
                return Ok(token);
            }
        }

        if std::io::stdin().is_terminal() {
            print!("Enter your token: ");
            std::io::stdout().flush()?;
            let mut line = String::new();
            std::io::stdin().read_line(&mut line)?;
            let token = line.trim();
            if !token.is_empty() {
                return Ok(token.to_string());
            }
        }

        Err(anyhow!(
            "No token provided.  Set `discord_token` in the config file, \
             export DISCORD_TOKEN, or enter one at the prompt."
        ))
    }
}
