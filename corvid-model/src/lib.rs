//! Domain models and identifier primitives shared across the Corvid crates.
//!
//! This crate mirrors the reference implementation's `model` crate layout:
//! one file per entity, grouped into `channel`, `guild`, `user`, `gateway`
//! and `application` modules, with [`id::Id`] used for every identifier
//! field instead of a bare integer.

pub mod application;
pub mod channel;
pub mod gateway;
pub mod guild;
pub mod id;
pub mod nullable;
pub mod user;
pub mod util;

pub use id::{
    marker::{
        ApplicationMarker, AttachmentMarker, ChannelMarker, EmojiMarker, GuildMarker,
        InteractionMarker, MessageMarker, RoleMarker, UserMarker, WebhookMarker,
    },
    Id,
};
pub use nullable::Nullable;
pub use util::Timestamp;

/// Identifier of an application (bot).
pub type ApplicationId = Id<ApplicationMarker>;
/// Identifier of a message attachment.
pub type AttachmentId = Id<AttachmentMarker>;
/// Identifier of a channel.
pub type ChannelId = Id<ChannelMarker>;
/// Identifier of a custom emoji.
pub type EmojiId = Id<EmojiMarker>;
/// Identifier of a guild.
pub type GuildId = Id<GuildMarker>;
/// Identifier of an interaction.
pub type InteractionId = Id<InteractionMarker>;
/// Identifier of a message.
pub type MessageId = Id<MessageMarker>;
/// Identifier of a role.
pub type RoleId = Id<RoleMarker>;
/// Identifier of a user.
pub type UserId = Id<UserMarker>;
/// Identifier of a webhook.
pub type WebhookId = Id<WebhookMarker>;
