mod channel;
mod emoji;
mod guild;
mod member;
mod message;
mod presence;
mod reaction;
mod role;
mod voice_state;

use crate::{config::ResourceType, Cabinet, UpdateCabinet};
use corvid_model::gateway::event::Ready;

impl UpdateCabinet for Ready {
    fn update(&self, cabinet: &Cabinet) {
        cabinet.clear();

        if cabinet.wants(ResourceType::USER) {
            cabinet.set_me(self.user.clone());
        }

        if cabinet.wants(ResourceType::GUILD) {
            for guild in &self.guilds {
                cabinet.unavailable_guilds.insert(guild.id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::Cabinet;
    use corvid_model::{
        gateway::event::{Ready, UnavailableGuild},
        user::User,
        GuildId, UserId,
    };

    fn sample_user() -> User {
        User {
            id: UserId::new(1),
            username: "corvid".into(),
            discriminator: "0001".into(),
            avatar: None,
            bot: Some(true),
            system: None,
            public_flags: None,
        }
    }

    #[test]
    fn ready_resets_and_installs_current_user_and_unavailable_guilds() {
        let cabinet = Cabinet::new();

        cabinet.update(&Ready {
            session_id: "abc".into(),
            user: sample_user(),
            guilds: vec![UnavailableGuild {
                id: GuildId::new(2),
                unavailable: true,
            }],
        });

        assert_eq!(cabinet.me().unwrap().id, UserId::new(1));
        assert!(cabinet.guild_unavailable(GuildId::new(2)));
    }
}
