//! Marker types denoting what kind of entity an [`Id`] refers to.
//!
//! [`Id`]: super::Id

/// Marker for an application identifier.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ApplicationMarker;

/// Marker for an attachment identifier.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct AttachmentMarker;

/// Marker for a channel identifier.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ChannelMarker;

/// Marker for an emoji identifier.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct EmojiMarker;

/// Marker for a guild identifier.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct GuildMarker;

/// Marker for an interaction identifier.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct InteractionMarker;

/// Marker for a message identifier.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct MessageMarker;

/// Marker for a role identifier.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct RoleMarker;

/// Marker for a user identifier.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct UserMarker;

/// Marker for a webhook identifier.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct WebhookMarker;

/// Associates a marker type with the mention prefix the platform uses for it,
/// if any. Markers without a textual mention form (e.g. attachments) leave
/// this `None`.
pub trait Marker {
    /// Prefix emitted by [`super::Id::mention`], e.g. `"@"` for users.
    const MENTION_PREFIX: Option<&'static str>;
}

macro_rules! impl_marker {
    ($ty:ty, $prefix:expr) => {
        impl Marker for $ty {
            const MENTION_PREFIX: Option<&'static str> = $prefix;
        }
    };
}

impl_marker!(ApplicationMarker, None);
impl_marker!(AttachmentMarker, None);
impl_marker!(ChannelMarker, Some("#"));
impl_marker!(EmojiMarker, Some(":"));
impl_marker!(GuildMarker, None);
impl_marker!(InteractionMarker, None);
impl_marker!(MessageMarker, None);
impl_marker!(RoleMarker, Some("&"));
impl_marker!(UserMarker, Some("@"));
impl_marker!(WebhookMarker, None);
