mod telegram;

pub use telegram::TelegramGateway;

use async_trait::async_trait;
use teloxide::types::{
    ChatId, InlineKeyboardMarkup, KeyboardMarkup, KeyboardRemove, MessageId, ReplyMarkup,
};

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("telegram request failed: {0}")]
    Request(#[from] teloxide::RequestError),
    #[error("invalid image reference: {0}")]
    InvalidImage(String),
}

/// Keyboard attached to a new message.
#[derive(Debug, Clone, PartialEq)]
pub enum Keyboard {
    None,
    Inline(InlineKeyboardMarkup),
    Reply(KeyboardMarkup),
    RemoveReply,
}

impl Keyboard {
    pub fn into_reply_markup(self) -> Option<ReplyMarkup> {
        match self {
            Keyboard::None => None,
            Keyboard::Inline(markup) => Some(ReplyMarkup::InlineKeyboard(markup)),
            Keyboard::Reply(markup) => Some(ReplyMarkup::Keyboard(markup)),
            Keyboard::RemoveReply => Some(ReplyMarkup::KeyboardRemove(KeyboardRemove::new())),
        }
    }

    pub fn inline(&self) -> Option<&InlineKeyboardMarkup> {
        match self {
            Keyboard::Inline(markup) => Some(markup),
            _ => None,
        }
    }
}

impl From<InlineKeyboardMarkup> for Keyboard {
    fn from(markup: InlineKeyboardMarkup) -> Self {
        Keyboard::Inline(markup)
    }
}

impl From<KeyboardMarkup> for Keyboard {
    fn from(markup: KeyboardMarkup) -> Self {
        Keyboard::Reply(markup)
    }
}

/// Outbound side of the chat transport. Texts are HTML.
///
/// Edits take an inline keyboard only; passing `None` removes the current one.
#[async_trait]
pub trait MessagingGateway: Send + Sync {
    async fn send_text(&self, chat: ChatId, text: &str, keyboard: Keyboard) -> Result<MessageId, GatewayError>;

    async fn send_photo(
        &self,
        chat: ChatId,
        image_ref: &str,
        caption: &str,
        keyboard: Keyboard,
    ) -> Result<MessageId, GatewayError>;

    async fn edit_text(
        &self,
        chat: ChatId,
        message: MessageId,
        text: &str,
        keyboard: Option<InlineKeyboardMarkup>,
    ) -> Result<(), GatewayError>;

    /// Replaces the photo when `image_ref` is given, otherwise only the caption.
    async fn edit_photo_caption(
        &self,
        chat: ChatId,
        message: MessageId,
        image_ref: Option<&str>,
        caption: &str,
        keyboard: Option<InlineKeyboardMarkup>,
    ) -> Result<(), GatewayError>;

    /// Swaps only the inline keyboard; `None` removes it.
    async fn edit_keyboard(
        &self,
        chat: ChatId,
        message: MessageId,
        keyboard: Option<InlineKeyboardMarkup>,
    ) -> Result<(), GatewayError>;

    async fn delete_message(&self, chat: ChatId, message: MessageId) -> Result<(), GatewayError>;
}
