use teloxide::{
    adaptors::Throttle,
    macros::BotCommands,
    prelude::Requester,
    types::BotCommand,
    Bot,
};

use crate::error::HandlerResult;

#[derive(BotCommands, Clone, Debug, PartialEq, Eq)]
#[command(rename_rule = "lowercase")]
pub enum Command {
    Start,
    Help,
    Movies,
    Series,
    Addmovie,
    Addserie,
    Stop,
    Status,
}

impl Command {
    pub fn user_commands() -> Vec<BotCommand> {
        vec![
            BotCommand::new("help", t!("commands.description.help")),
            BotCommand::new("movies", t!("commands.description.movies")),
            BotCommand::new("series", t!("commands.description.series")),
            BotCommand::new("addmovie", t!("commands.description.addmovie")),
            BotCommand::new("addserie", t!("commands.description.addserie")),
            BotCommand::new("stop", t!("commands.description.stop")),
            BotCommand::new("status", t!("commands.description.status")),
        ]
    }
}

pub async fn setup_user_commands(bot: &Throttle<Bot>) -> HandlerResult<()> {
    bot.delete_my_commands().await?;
    bot.set_my_commands(Command::user_commands()).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use teloxide::utils::command::BotCommands as _;

    use super::*;

    #[test]
    fn test_parse_commands() {
        assert_eq!(Command::parse("/addmovie", "telarr_bot").ok(), Some(Command::Addmovie));
        assert_eq!(Command::parse("/series", "telarr_bot").ok(), Some(Command::Series));
        assert!(Command::parse("/language", "telarr_bot").is_err());
    }

    #[test]
    fn test_every_command_is_registered() {
        let registered: Vec<String> = Command::user_commands().into_iter().map(|c| c.command).collect();
        for name in ["movies", "series", "addmovie", "addserie", "stop", "status", "help"] {
            assert!(registered.iter().any(|c| c == name), "{} missing", name);
        }
    }
}
