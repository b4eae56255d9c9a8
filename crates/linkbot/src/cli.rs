use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "linkbot")]
#[command(author, version, about = "Telegram bot that links Telegram accounts to website profiles", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Run the bot (long polling)
    Run,

    /// Print the unique code for a chat id
    Code {
        /// Telegram chat id
        #[arg(allow_hyphen_values = true)]
        chat_id: i64,
    },

    /// Show the stored profile for a chat id
    Lookup {
        /// Telegram chat id
        #[arg(allow_hyphen_values = true)]
        chat_id: i64,
    },
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_no_subcommand_defaults_to_none() {
        let cli = Cli::try_parse_from(["linkbot"]).unwrap();
        assert_eq!(cli.command, None);
    }

    #[test]
    fn test_code_subcommand() {
        let cli = Cli::try_parse_from(["linkbot", "code", "42"]).unwrap();
        assert_eq!(cli.command, Some(Commands::Code { chat_id: 42 }));
    }

    #[test]
    fn test_lookup_accepts_group_ids() {
        let cli = Cli::try_parse_from(["linkbot", "lookup", "-1001234567890"]).unwrap();
        assert_eq!(cli.command, Some(Commands::Lookup { chat_id: -1001234567890 }));
    }

    #[test]
    fn test_code_rejects_non_numeric() {
        assert!(Cli::try_parse_from(["linkbot", "code", "abc"]).is_err());
    }
}
