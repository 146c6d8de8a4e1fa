//! Telegram photo intake: picks the largest rendition of a photo, downloads it,
//! and turns the message into a [`PhotoDelivered`] event.

use anyhow::{Context, Result};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use photodrop_core::{ConversationId, ImageIdentity, PhotoDelivered, Uploader};
use teloxide::net::Download;
use teloxide::prelude::*;
use teloxide::types::{PhotoSize, User};
use tracing::debug;

/// Largest rendition by pixel area.
pub fn largest_photo(sizes: &[PhotoSize]) -> Option<&PhotoSize> {
    sizes
        .iter()
        .max_by_key(|p| u64::from(p.width) * u64::from(p.height))
}

pub fn uploader(user: &User) -> Uploader {
    Uploader {
        id: user.id.0,
        username: user.username.clone(),
    }
}

/// Identity of the photo in `msg`, known before anything is downloaded.
///
/// The unique file id is stable across re-sends of the same picture, unlike
/// the download id.
pub fn photo_identity(msg: &Message) -> Option<ImageIdentity> {
    let photo = msg.photo().and_then(largest_photo)?;
    Some(ImageIdentity::new(photo.file.unique_id.to_string()))
}

/// Download the photo in `msg`. `None` if the message carries no photo.
pub async fn photo_delivery(
    bot: &Bot,
    msg: &Message,
    received_at: DateTime<Utc>,
) -> Result<Option<PhotoDelivered>> {
    let Some(photo) = msg.photo().and_then(largest_photo) else {
        return Ok(None);
    };

    let file = bot
        .get_file(photo.file.id.clone())
        .await
        .context("get_file failed")?;
    let mut buf = Vec::with_capacity(photo.file.size as usize);
    bot.download_file(&file.path, &mut buf)
        .await
        .context("photo download failed")?;
    debug!(chat = msg.chat.id.0, bytes = buf.len(), "Photo downloaded");

    let user = msg.from.as_ref().map(uploader).unwrap_or(Uploader {
        id: 0,
        username: None,
    });

    Ok(Some(PhotoDelivered {
        conversation: ConversationId(msg.chat.id.0),
        group_id: msg.media_group_id().map(|g| g.to_string()),
        identity: ImageIdentity::new(photo.file.unique_id.to_string()),
        bytes: Bytes::from(buf),
        user,
        received_at,
    }))
}
