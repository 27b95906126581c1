use async_trait::async_trait;
use teloxide::{
    adaptors::Throttle,
    payloads::{
        EditMessageCaptionSetters, EditMessageMediaSetters, EditMessageReplyMarkupSetters, EditMessageTextSetters,
        SendMessageSetters, SendPhotoSetters,
    },
    prelude::Requester,
    types::{
        ChatId, InlineKeyboardMarkup, InputFile, InputMedia, InputMediaPhoto, MessageId, ParseMode,
    },
    Bot,
};
use url::Url;

use super::{GatewayError, Keyboard, MessagingGateway};

#[derive(Clone)]
pub struct TelegramGateway {
    bot: Throttle<Bot>,
}

impl TelegramGateway {
    pub fn new(bot: Throttle<Bot>) -> Self {
        Self { bot }
    }

    fn image_url(image_ref: &str) -> Result<Url, GatewayError> {
        Url::parse(image_ref).map_err(|_| GatewayError::InvalidImage(image_ref.to_string()))
    }
}

#[async_trait]
impl MessagingGateway for TelegramGateway {
    async fn send_text(&self, chat: ChatId, text: &str, keyboard: Keyboard) -> Result<MessageId, GatewayError> {
        let request = self.bot.send_message(chat, text).parse_mode(ParseMode::Html);
        let message = match keyboard.into_reply_markup() {
            Some(markup) => request.reply_markup(markup).await?,
            None => request.await?,
        };
        Ok(message.id)
    }

    async fn send_photo(
        &self,
        chat: ChatId,
        image_ref: &str,
        caption: &str,
        keyboard: Keyboard,
    ) -> Result<MessageId, GatewayError> {
        let url = match Self::image_url(image_ref) {
            Ok(url) => url,
            Err(e) => {
                warn!("{}, sending text instead", e);
                return self.send_text(chat, caption, keyboard).await;
            }
        };

        let request = self
            .bot
            .send_photo(chat, InputFile::url(url))
            .caption(caption)
            .parse_mode(ParseMode::Html);
        let message = match keyboard.into_reply_markup() {
            Some(markup) => request.reply_markup(markup).await?,
            None => request.await?,
        };
        Ok(message.id)
    }

    async fn edit_text(
        &self,
        chat: ChatId,
        message: MessageId,
        text: &str,
        keyboard: Option<InlineKeyboardMarkup>,
    ) -> Result<(), GatewayError> {
        let request = self
            .bot
            .edit_message_text(chat, message, text)
            .parse_mode(ParseMode::Html);
        match keyboard {
            Some(markup) => request.reply_markup(markup).await?,
            None => request.await?,
        };
        Ok(())
    }

    async fn edit_photo_caption(
        &self,
        chat: ChatId,
        message: MessageId,
        image_ref: Option<&str>,
        caption: &str,
        keyboard: Option<InlineKeyboardMarkup>,
    ) -> Result<(), GatewayError> {
        let url = image_ref.map(Self::image_url).transpose()?;

        match url {
            Some(url) => {
                let media = InputMedia::Photo(
                    InputMediaPhoto::new(InputFile::url(url))
                        .caption(caption)
                        .parse_mode(ParseMode::Html),
                );
                let request = self.bot.edit_message_media(chat, message, media);
                match keyboard {
                    Some(markup) => request.reply_markup(markup).await?,
                    None => request.await?,
                };
            }
            None => {
                let request = self
                    .bot
                    .edit_message_caption(chat, message)
                    .caption(caption)
                    .parse_mode(ParseMode::Html);
                match keyboard {
                    Some(markup) => request.reply_markup(markup).await?,
                    None => request.await?,
                };
            }
        }

        Ok(())
    }

    async fn edit_keyboard(
        &self,
        chat: ChatId,
        message: MessageId,
        keyboard: Option<InlineKeyboardMarkup>,
    ) -> Result<(), GatewayError> {
        let request = self.bot.edit_message_reply_markup(chat, message);
        match keyboard {
            Some(markup) => request.reply_markup(markup).await?,
            None => request.await?,
        };
        Ok(())
    }

    async fn delete_message(&self, chat: ChatId, message: MessageId) -> Result<(), GatewayError> {
        self.bot.delete_message(chat, message).await?;
        Ok(())
    }
}
