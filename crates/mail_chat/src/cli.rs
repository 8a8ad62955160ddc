use std::path::PathBuf;

use clap::{Parser, Subcommand};
use mail_backend::{CategoryId, EmailId, DEFAULT_EMAIL_LIMIT};

use crate::config::{ConfigOverrides, CONFIG_PATH_ENV_VAR};

#[derive(Debug, Parser)]
#[command(name = "mail-chat")]
#[command(about = "Ask questions about stored email, or manage the mailbox", long_about = None)]
pub struct Cli {
    /// JSON config file
    #[arg(long = "config", env = CONFIG_PATH_ENV_VAR, global = true)]
    pub config_path: Option<PathBuf>,

    /// Backend to use (http or mock)
    #[arg(long, global = true)]
    pub backend: Option<String>,

    /// Base URL of the mail-assistant API
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Request timeout in seconds
    #[arg(long, global = true)]
    pub timeout_secs: Option<u64>,

    /// Without a subcommand the interactive chat starts
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Commands {
    /// Ask one question and print the answer with its sources
    Ask { question: String },

    /// Submit an email for categorization and summarization
    Ingest {
        #[arg(long)]
        sender: Option<String>,
        #[arg(long)]
        subject: Option<String>,
        /// File holding the email body; stdin when omitted
        file: Option<PathBuf>,
    },

    /// List stored emails, newest first
    Emails {
        #[arg(long)]
        category: Option<String>,
        #[arg(long, default_value_t = DEFAULT_EMAIL_LIMIT)]
        limit: u32,
        #[arg(long, default_value_t = 0)]
        offset: u32,
    },

    /// Show one stored email
    Email { id: EmailId },

    /// List categories
    Categories,

    /// Move an email to another category
    Recategorize { id: EmailId, category: String },

    /// Delete a stored email
    Delete { id: EmailId },

    /// Create a category
    CategoryAdd {
        name: String,
        #[arg(long)]
        description: Option<String>,
    },

    /// Rename a category; its emails keep their old category label
    CategoryRename { id: CategoryId, name: String },

    /// Delete a category and move its emails to '미분류'
    CategoryDelete { id: CategoryId },
}

impl Cli {
    pub fn config_overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            config_path: self.config_path.clone(),
            backend: self.backend.clone(),
            base_url: self.base_url.clone(),
            timeout_secs: self.timeout_secs,
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn no_subcommand_means_interactive_chat() {
        let cli = Cli::try_parse_from(["mail-chat", "--backend", "mock"]).expect("parse");
        assert_eq!(cli.command, None);
        assert_eq!(cli.config_overrides().backend.as_deref(), Some("mock"));
    }

    #[test]
    fn global_flags_follow_subcommands() {
        let cli = Cli::try_parse_from([
            "mail-chat",
            "emails",
            "--category",
            "일정",
            "--timeout-secs",
            "5",
        ])
        .expect("parse");
        assert_eq!(
            cli.command,
            Some(Commands::Emails {
                category: Some("일정".to_string()),
                limit: DEFAULT_EMAIL_LIMIT,
                offset: 0,
            })
        );
        assert_eq!(cli.timeout_secs, Some(5));
    }

    #[test]
    fn ingest_accepts_optional_file() {
        let cli = Cli::try_parse_from(["mail-chat", "ingest", "--sender", "kim", "mail.txt"])
            .expect("parse");
        assert_eq!(
            cli.command,
            Some(Commands::Ingest {
                sender: Some("kim".to_string()),
                subject: None,
                file: Some(PathBuf::from("mail.txt")),
            })
        );
    }

    #[test]
    fn category_subcommands_use_kebab_case_names() {
        let cli = Cli::try_parse_from([
            "mail-chat",
            "category-add",
            "교육",
            "--description",
            "사내 교육",
        ])
        .expect("parse");
        assert_eq!(
            cli.command,
            Some(Commands::CategoryAdd {
                name: "교육".to_string(),
                description: Some("사내 교육".to_string()),
            })
        );

        let cli = Cli::try_parse_from(["mail-chat", "category-rename", "7", "연수"]).expect("parse");
        assert_eq!(
            cli.command,
            Some(Commands::CategoryRename {
                id: 7,
                name: "연수".to_string(),
            })
        );

        let cli = Cli::try_parse_from(["mail-chat", "category-delete", "7"]).expect("parse");
        assert_eq!(cli.command, Some(Commands::CategoryDelete { id: 7 }));
    }

    #[test]
    fn email_id_must_be_numeric() {
        assert!(Cli::try_parse_from(["mail-chat", "email", "abc"]).is_err());
    }
}
