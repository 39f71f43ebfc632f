use std::path::PathBuf;

use clap::Parser;

/// Turn repository details into git setup commands and a README.
#[derive(Debug, Parser)]
#[command(name = "repo-guide", version, about)]
pub struct Cli {
    /// Load configuration from this file instead of the default location
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Override the generative model for this session
    #[arg(long, value_name = "NAME")]
    pub model: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_no_args() {
        let cli = Cli::try_parse_from(["repo-guide"]).unwrap();
        assert!(cli.config.is_none());
        assert!(cli.model.is_none());
    }

    #[test]
    fn test_parse_overrides() {
        let cli = Cli::try_parse_from([
            "repo-guide",
            "--config",
            "/tmp/guide.toml",
            "--model",
            "gemini-2.5-pro",
        ])
        .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/guide.toml")));
        assert_eq!(cli.model.as_deref(), Some("gemini-2.5-pro"));
    }
}
