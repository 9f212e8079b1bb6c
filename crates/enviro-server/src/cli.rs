use std::path::PathBuf;

use clap::Parser;
use enviro_core::Config;
use enviro_core::config::ConfigError;

#[derive(Parser, Debug)]
#[command(name = "enviro-server")]
#[command(about = "Sample environmental sensors, save per-interval averages and serve them over HTTP")]
pub struct Args {
    /// TOML config file; missing keys take their defaults
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Directory aggregate files are written to and served from
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Address to bind the HTTP server to
    #[arg(long)]
    pub host: Option<String>,

    #[arg(long)]
    pub port: Option<u16>,

    /// Do not start the HTTP server
    #[arg(long)]
    pub no_server: bool,

    /// Do not start the sampler
    #[arg(long)]
    pub no_sampler: bool,

    /// Make every Nth simulated particulate read fail
    #[arg(long)]
    pub pm_fault_every: Option<u32>,
}

impl Args {
    /// Command-line values win over the config file.
    pub fn apply(&self, config: &mut Config) {
        if let Some(dir) = &self.data_dir {
            config.storage.data_dir = dir.clone();
        }
        if let Some(host) = &self.host {
            config.server.host = host.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if self.no_server {
            config.server.enabled = false;
        }
        if self.no_sampler {
            config.sampling.enabled = false;
        }
    }

    /// Load the config file (if any), apply overrides and validate.
    pub async fn resolve_config(&self) -> Result<Config, ConfigError> {
        let mut config = match &self.config {
            Some(path) => Config::load(path).await?,
            None => Config::default(),
        };
        self.apply(&mut config);
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_defaults_without_arguments() {
        let args = Args::try_parse_from(["enviro-server"]).unwrap();
        let config = args.resolve_config().await.unwrap();

        assert_eq!(config, Config::default());
    }

    #[tokio::test]
    async fn test_overrides_beat_config_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("enviro.toml");
        std::fs::write(
            &path,
            "[server]\nport = 8080\nhost = \"127.0.0.1\"\n\n[storage]\ndata_dir = \"/var/lib/enviro\"\n",
        )
        .unwrap();

        let args = Args::try_parse_from([
            "enviro-server",
            "--config",
            path.to_str().unwrap(),
            "--port",
            "9000",
            "--no-sampler",
        ])
        .unwrap();
        let config = args.resolve_config().await.unwrap();

        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.storage.data_dir, PathBuf::from("/var/lib/enviro"));
        assert!(!config.sampling.enabled);
        assert!(config.server.enabled);
    }

    #[tokio::test]
    async fn test_disabling_everything_is_rejected() {
        let args = Args::try_parse_from(["enviro-server", "--no-sampler", "--no-server"]).unwrap();
        assert!(matches!(args.resolve_config().await, Err(ConfigError::Invalid(_))));
    }
}
