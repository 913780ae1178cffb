use clap::Parser;
use std::path::PathBuf;

use crate::bootstrap::ConfigSource;
use crate::session::Settings;

/// Mail filtering driven by a Lua configuration
#[derive(Debug, Parser)]
#[command(name = "imapfilter")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Configuration file, or `-` to read it from standard input
    #[arg(short, long, value_name = "PATH", env = "IMAPFILTER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Run this Lua code instead of a configuration file
    #[arg(short = 'e', long = "execute", value_name = "CODE")]
    pub oneline: Option<String>,

    /// Enter interactive mode after the configuration has run
    #[arg(short, long)]
    pub interactive: bool,

    /// Report what would be done without changing anything
    #[arg(short = 'n', long = "dry-run")]
    pub dryrun: bool,

    /// Configuration home directory
    #[arg(long, value_name = "DIR", env = "IMAPFILTER_HOME")]
    pub home: Option<PathBuf>,

    /// Load the bootstrap fragments from this directory
    #[arg(long, value_name = "DIR", env = "IMAPFILTER_SHARE")]
    pub share_dir: Option<PathBuf>,

    /// Log more (debug level)
    #[arg(short, long, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Log only errors
    #[arg(short, long)]
    pub quiet: bool,
}

impl Cli {
    /// `$IMAPFILTER_HOME`, else `~/.imapfilter`
    pub fn home_dir(&self) -> Option<PathBuf> {
        self.home
            .clone()
            .or_else(|| home::home_dir().map(|home| home.join(".imapfilter")))
    }

    pub fn settings(&self) -> Settings {
        let home = self.home_dir();
        let source = match (&self.oneline, &self.config) {
            (Some(code), _) => ConfigSource::Inline(code.clone()),
            (None, Some(path)) => ConfigSource::from_path(path.clone()),
            (None, None) => ConfigSource::File(
                home.clone()
                    .unwrap_or_else(|| PathBuf::from("."))
                    .join("config.lua"),
            ),
        };

        Settings {
            source,
            interactive: self.interactive,
            dryrun: self.dryrun,
            home,
            share_dir: self.share_dir.clone(),
        }
    }

    /// Default log directive when `RUST_LOG` is unset
    pub fn log_level(&self) -> tracing::Level {
        if self.verbose {
            tracing::Level::DEBUG
        } else if self.quiet {
            tracing::Level::ERROR
        } else {
            tracing::Level::WARN
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("imapfilter").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn inline_code_wins_over_config_path() {
        let cli = parse(&["-c", "other.lua", "-e", "x = 1"]);
        assert_eq!(cli.settings().source, ConfigSource::Inline("x = 1".into()));
    }

    #[test]
    fn dash_config_means_stdin() {
        let cli = parse(&["-c", "-", "-i", "-n"]);
        let settings = cli.settings();
        assert_eq!(settings.source, ConfigSource::Stdin);
        assert!(settings.interactive);
        assert!(settings.dryrun);
    }

    #[test]
    fn default_config_lives_in_home() {
        let cli = parse(&["--home", "/srv/filters"]);
        assert_eq!(
            cli.settings().source,
            ConfigSource::File(PathBuf::from("/srv/filters/config.lua"))
        );
        assert_eq!(cli.settings().home, Some(PathBuf::from("/srv/filters")));
    }

    #[test]
    fn verbosity_flags_conflict() {
        let args = ["imapfilter", "-v", "-q"];
        assert!(Cli::try_parse_from(args).is_err());
        assert_eq!(parse(&["-v"]).log_level(), tracing::Level::DEBUG);
        assert_eq!(parse(&["-q"]).log_level(), tracing::Level::ERROR);
    }
}
