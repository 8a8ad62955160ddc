use mail_backend::EmailId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlashCommand {
    Help,
    Examples,
    Example(usize),
    Categories,
    Emails { category: Option<String> },
    Email(EmailId),
    Quit,
    /// A known command with missing or malformed arguments.
    Usage(&'static str),
    Unknown(String),
}

pub const HELP_USAGE: &str = "/help";
pub const EXAMPLE_USAGE: &str = "/example <번호>";
pub const EMAILS_USAGE: &str = "/emails [카테고리]";
pub const EMAIL_USAGE: &str = "/email <메일 ID>";

pub fn parse_slash_command(input: &str) -> Option<SlashCommand> {
    let trimmed = input.trim();
    if !trimmed.starts_with('/') {
        return None;
    }

    let (command, rest) = match trimmed.split_once(char::is_whitespace) {
        Some((command, rest)) => (command, rest.trim()),
        None => (trimmed, ""),
    };

    let parsed = match command {
        "/help" => SlashCommand::Help,
        "/examples" => SlashCommand::Examples,
        "/example" => match rest.parse::<usize>() {
            Ok(number) => SlashCommand::Example(number),
            Err(_) => SlashCommand::Usage(EXAMPLE_USAGE),
        },
        "/categories" => SlashCommand::Categories,
        "/emails" => SlashCommand::Emails {
            category: (!rest.is_empty()).then(|| rest.to_string()),
        },
        "/email" => match rest.parse::<EmailId>() {
            Ok(id) => SlashCommand::Email(id),
            Err(_) => SlashCommand::Usage(EMAIL_USAGE),
        },
        "/quit" => SlashCommand::Quit,
        _ => SlashCommand::Unknown(command.to_string()),
    };

    Some(parsed)
}
