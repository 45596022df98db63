//! Command line [`Args`].

use clap::Parser;

/// Server of the rental marketplace.
#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Path to the TOML configuration file, which may be absent.
    #[arg(short, long, env = "CONF_FILE", default_value = "config.toml")]
    pub config: String,
}

impl Args {
    /// Reads [`Args`] from the command line and the environment.
    ///
    /// # Errors
    ///
    /// If the command line is malformed, or `--help`/`--version` is requested.
    pub fn parse() -> Result<Self, clap::Error> {
        Self::try_parse()
    }
}

#[cfg(test)]
mod spec {
    use clap::Parser as _;

    use super::Args;

    #[test]
    fn defaults_config_path() {
        let args = Args::try_parse_from(["application"]).unwrap();

        assert_eq!(args.config, "config.toml");
    }

    #[test]
    fn accepts_config_path() {
        let args =
            Args::try_parse_from(["application", "-c", "prod.toml"]).unwrap();

        assert_eq!(args.config, "prod.toml");
    }
}
