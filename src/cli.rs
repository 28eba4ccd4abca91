use clap::{Parser, Subcommand, ValueEnum};

fn get_version() -> &'static str {
    const BASE_VERSION: &str = env!("CARGO_PKG_VERSION");

    // Release builds sit on a tag
    if let Some(tag) = option_env!("IR_GIT_TAG") {
        return tag;
    }

    let commit = option_env!("IR_GIT_COMMIT").unwrap_or("unknown");
    let branch = option_env!("IR_GIT_BRANCH").unwrap_or("unknown");

    // Leaked once at startup
    let version = format!("v{}-{} ({})", BASE_VERSION, commit, branch);
    Box::leak(version.into_boxed_str())
}

#[derive(Parser)]
#[command(name = "ir")]
#[command(about = "Install and upgrade single-binary tools from GitHub/GitLab releases")]
#[command(version = get_version(), propagate_version = true)]
pub struct Cli {
    /// Increase verbosity (use multiple times for more detail)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Reduce output to errors only
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Install a GitHub/GitLab release, cli tool
    #[command(
        after_help = "Examples:\n  ir get https://github.com/sharkdp/bat\n  ir get https://github.com/cli/cli -n gh -t v2.40.0\n  ir get https://gitlab.com/owner/tool -y"
    )]
    Get {
        /// Repository URL (e.g., 'https://github.com/owner/repo')
        url: String,
        /// Install a specific tag instead of the latest release
        #[arg(short, long)]
        tag: Option<String>,
        /// Name to install the tool under (defaults to the repository name)
        #[arg(short, long)]
        name: Option<String>,
        /// Extra words that should appear in the asset name
        #[arg(short, long = "keyword")]
        keywords: Vec<String>,
        /// Approve without prompt
        #[arg(short = 'y', long)]
        approve: bool,
    },

    /// Upgrade all installed tools that are not on hold
    Upgrade {
        /// Reinstall even when the version is unchanged
        #[arg(short = 'F', long)]
        force: bool,
        /// Skip the confirmation prompt
        #[arg(short = 'y', long)]
        skip_prompt: bool,
    },

    /// List installed tools
    Ls {
        /// Only list tools whose updates are on hold
        #[arg(long)]
        hold: bool,
    },

    /// Remove an installed tool
    Rm {
        /// Tool name as shown by `ir ls`
        name: String,
    },

    /// Keep a tool's updates on hold
    Hold {
        /// Tool name as shown by `ir ls`
        name: String,
        /// Release the hold instead
        #[arg(long)]
        unset: bool,
    },

    /// Set or show configuration
    Config {
        /// GitHub token, avoids API rate limiting
        #[arg(long)]
        token: Option<String>,
        /// GitLab token
        #[arg(long)]
        gitlab_token: Option<String>,
        /// Install path for binaries
        #[arg(long)]
        path: Option<String>,
        /// Include pre-releases when installing and upgrading
        #[arg(long)]
        pre_release: Option<bool>,
    },

    /// Show the stored state of installed tools
    State {
        /// Output format
        #[arg(long, value_enum, default_value_t = StateFormat::Json)]
        format: StateFormat,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StateFormat {
    Json,
    Yaml,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_shape() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_get() {
        let cli = Cli::try_parse_from([
            "ir", "-v", "get", "https://github.com/cli/cli", "-n", "gh", "-k", "musl", "-y",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 1);
        match cli.command {
            Commands::Get {
                url,
                name,
                keywords,
                approve,
                tag,
            } => {
                assert_eq!(url, "https://github.com/cli/cli");
                assert_eq!(name.as_deref(), Some("gh"));
                assert_eq!(keywords, vec!["musl"]);
                assert!(approve);
                assert!(tag.is_none());
            }
            _ => panic!("expected get"),
        }
    }

    #[test]
    fn test_parse_config_pre_release() {
        let cli = Cli::try_parse_from(["ir", "config", "--pre-release", "true"]).unwrap();
        match cli.command {
            Commands::Config { pre_release, .. } => assert_eq!(pre_release, Some(true)),
            _ => panic!("expected config"),
        }
    }
}
