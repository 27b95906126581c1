use teloxide::{
    types::{ChatId, UserId},
    utils::html::escape,
};

use super::{FlowError, SessionEngine};
use crate::{
    catalog::MediaKind,
    command::Command,
    gateway::Keyboard,
    handler::get_list_keyboard,
    presenter::{self, status, with_footer, PageNav},
    session::ActionKind,
};

impl SessionEngine {
    pub(super) async fn on_command(&self, user: UserId, chat: ChatId, command: Command) -> Result<(), FlowError> {
        info!("User {} sent command {:?}", user, command);
        self.store.set_pending_action(user, None);

        match command {
            Command::Start | Command::Help => {
                self.gateway
                    .send_text(chat, &t!("commands.help"), Keyboard::RemoveReply)
                    .await?;
            }
            Command::Movies => self.send_library_list(chat, MediaKind::Movie).await?,
            Command::Series => self.send_library_list(chat, MediaKind::Series).await?,
            Command::Addmovie => self.start_lookup(user, chat, MediaKind::Movie).await?,
            Command::Addserie => self.start_lookup(user, chat, MediaKind::Series).await?,
            Command::Stop => {
                self.store.clear(user);
                self.gateway
                    .send_text(chat, &t!("commands.stop"), Keyboard::RemoveReply)
                    .await?;
            }
            Command::Status => self.send_service_status(chat).await?,
        }

        Ok(())
    }

    pub(super) async fn on_unknown_command(&self, user: UserId, chat: ChatId) -> Result<(), FlowError> {
        debug!("User {} sent an unknown command", user);
        self.store.set_pending_action(user, None);
        self.gateway
            .send_text(chat, &t!("commands.unknown_command"), Keyboard::None)
            .await?;
        Ok(())
    }

    /// Sends page 1 of the library list.
    pub(super) async fn send_library_list(&self, chat: ChatId, kind: MediaKind) -> Result<(), FlowError> {
        let items = self.sorted_library(kind).await?;
        if items.is_empty() {
            self.gateway
                .send_text(chat, &empty_library_text(kind), Keyboard::None)
                .await?;
            return Ok(());
        }

        let pages = presenter::list_pages(kind, &items, self.settings.page_budget);
        let total = pages.len();
        let first = pages.first().ok_or(FlowError::NotFound)?;

        self.gateway
            .send_text(
                chat,
                &with_footer(first, 1, total),
                get_list_keyboard(kind, PageNav::new(1, total)).into(),
            )
            .await?;
        Ok(())
    }

    /// Enters the lookup flow; any earlier candidates are dropped.
    pub(super) async fn start_lookup(&self, user: UserId, chat: ChatId, kind: MediaKind) -> Result<(), FlowError> {
        self.store.clear_working_set(user);
        self.store
            .set_pending_action(user, Some(ActionKind::LookupMediaToAdd(kind)));

        let prompt = match kind {
            MediaKind::Movie => t!("messages.add.prompt.movie"),
            MediaKind::Series => t!("messages.add.prompt.serie"),
        };
        self.gateway.send_text(chat, &prompt, Keyboard::RemoveReply).await?;
        Ok(())
    }

    async fn send_service_status(&self, chat: ChatId) -> Result<(), FlowError> {
        let mut text = t!("commands.status.header").to_string();

        for kind in [MediaKind::Movie, MediaKind::Series] {
            let catalog = self.catalog(kind);
            let service = match catalog.system_status().await {
                Ok(service) => service,
                Err(e) => {
                    warn!("Status of the {} catalog is unavailable: {}", kind, e);
                    text.push_str(&format!(
                        "\n{} {}",
                        kind.icon(),
                        t!("commands.status.unreachable", plural = kind.plural())
                    ));
                    continue;
                }
            };

            text.push_str(&format!(
                "\n{} <b>{}</b> {} ({})",
                kind.icon(),
                escape(&service.name),
                escape(&service.version),
                escape(&service.mode)
            ));

            match catalog.disk_space().await {
                Ok(disks) => {
                    for disk in disks {
                        text.push_str(&format!(
                            "\n    💾 <code>{}</code> {}",
                            escape(&disk.path),
                            status::disk_usage(&disk)
                        ));
                    }
                }
                Err(e) => {
                    warn!("Disk usage of the {} catalog is unavailable: {}", kind, e);
                    text.push_str(&format!("\n    💾 {}", t!("commands.status.disk_unavailable")));
                }
            }
        }

        self.gateway.send_text(chat, &text, Keyboard::None).await?;
        Ok(())
    }
}

fn empty_library_text(kind: MediaKind) -> String {
    match kind {
        MediaKind::Movie => t!("messages.list.empty.movie").to_string(),
        MediaKind::Series => t!("messages.list.empty.serie").to_string(),
    }
}
