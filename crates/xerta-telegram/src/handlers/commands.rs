use xerta_core::commands::BotCommand;

/// Split `/cmd@botname args` into a lowercase command name, the bot mention
/// (if any) and the rest.
pub(crate) fn parse_command(text: &str) -> (String, Option<String>, String) {
    let mut parts = text.trim().splitn(2, char::is_whitespace);
    let first = parts.next().unwrap_or("").trim();
    let rest = parts.next().unwrap_or("").trim().to_string();

    let mut name = first.trim_start_matches('/').splitn(2, '@');
    let cmd = name.next().unwrap_or("").to_lowercase();
    let mention = name.next().map(str::to_string);

    (cmd, mention, rest)
}

/// Which handler a text message goes to.
///
/// Slash commands the bot doesn't know, or that are addressed to another bot
/// (`/joke@other_bot`), are dropped (`None`); any other text is a plain
/// message. `bot_username` is compared without the leading `@` and ignoring
/// case.
pub(crate) fn route(text: &str, bot_username: &str) -> Option<BotCommand> {
    if text.trim_start().starts_with('/') {
        let (cmd, mention, _args) = parse_command(text);
        if let Some(mention) = mention {
            if !mention.eq_ignore_ascii_case(bot_username.trim_start_matches('@')) {
                return None;
            }
        }
        return BotCommand::from_name(&cmd);
    }
    Some(BotCommand::Message)
}
