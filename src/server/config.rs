use clap::Parser;
use std::path::PathBuf;

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8000;

/// Local static file server that tolerates clients hanging up mid-transfer.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct ServerConfig {
    /// Host interface to bind
    #[arg(long, default_value = DEFAULT_HOST)]
    pub host: String,

    /// Port to listen on
    #[arg(long, default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Directory to serve (default: the directory containing this executable)
    #[arg(long)]
    pub directory: Option<PathBuf>,
}

impl ServerConfig {
    /// The directory to serve, falling back to the executable's own folder.
    pub fn root_directory(&self) -> std::io::Result<PathBuf> {
        match &self.directory {
            Some(dir) => Ok(dir.clone()),
            None => {
                let exe = std::env::current_exe()?;
                Ok(exe
                    .parent()
                    .map(|p| p.to_path_buf())
                    .unwrap_or_else(|| PathBuf::from(".")))
            }
        }
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            directory: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults_match_cli_defaults() {
        let parsed = ServerConfig::parse_from(["static-devserver"]);
        assert_eq!(parsed.host, "127.0.0.1");
        assert_eq!(parsed.port, 8000);
        assert_eq!(parsed.directory, None);
        assert_eq!(parsed.address(), ServerConfig::default().address());
    }

    #[test]
    fn flags_override_defaults() {
        let parsed = ServerConfig::parse_from([
            "static-devserver",
            "--host",
            "0.0.0.0",
            "--port",
            "9000",
            "--directory",
            "/srv/www",
        ]);
        assert_eq!(parsed.address(), "0.0.0.0:9000");
        assert_eq!(parsed.root_directory().unwrap(), PathBuf::from("/srv/www"));
    }

    #[test]
    fn root_defaults_to_executable_folder() {
        let config = ServerConfig::default();
        let exe = std::env::current_exe().unwrap();
        assert_eq!(config.root_directory().unwrap(), exe.parent().unwrap().to_path_buf());
    }

    #[test]
    fn rejects_non_numeric_port() {
        let parsed = ServerConfig::try_parse_from(["static-devserver", "--port", "http"]);
        assert!(parsed.is_err());
    }
}
