use crate::{config::ResourceType, model::CachedMember, Cabinet, UpdateCabinet};
use corvid_model::gateway::event::{GuildMemberRemove, MemberAdd, MemberUpdate};

impl UpdateCabinet for MemberAdd {
    fn update(&self, cabinet: &Cabinet) {
        if !cabinet.wants(ResourceType::MEMBER) {
            return;
        }

        cabinet
            .guild_members
            .entry(self.guild_id)
            .or_default()
            .insert(self.member.user_id);

        cabinet.members.insert(
            (self.guild_id, self.member.user_id),
            CachedMember::from_member(self.guild_id, &self.member),
        );
    }
}

impl UpdateCabinet for MemberUpdate {
    fn update(&self, cabinet: &Cabinet) {
        if !cabinet.wants(ResourceType::MEMBER) {
            return;
        }

        if let Some(mut member) = cabinet.members.get_mut(&(self.guild_id, self.user_id)) {
            self.nick.clone().merge_into(&mut member.nick);

            if let Some(roles) = &self.roles {
                member.roles = roles.clone();
            }
        }
    }
}

impl UpdateCabinet for GuildMemberRemove {
    fn update(&self, cabinet: &Cabinet) {
        if !cabinet.wants(ResourceType::MEMBER) {
            return;
        }

        cabinet.members.remove(&(self.guild_id, self.user_id));

        if let Some(mut members) = cabinet.guild_members.get_mut(&self.guild_id) {
            members.remove(&self.user_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::Cabinet;
    use corvid_model::{
        gateway::event::{GuildMemberRemove, MemberAdd, MemberUpdate},
        guild::Member,
        nullable::Nullable,
        GuildId, Timestamp, UserId,
    };
    use std::str::FromStr;

    fn add() -> MemberAdd {
        MemberAdd {
            guild_id: GuildId::new(1),
            member: Member {
                user_id: UserId::new(2),
                nick: None,
                roles: Vec::new(),
                joined_at: Timestamp::from_str("2024-01-01T00:00:00Z").unwrap(),
                deaf: false,
                mute: false,
                pending: false,
            },
        }
    }

    #[test]
    fn member_add_indexes_under_its_guild() {
        let cabinet = Cabinet::new();
        cabinet.update(&add());

        assert!(cabinet.member(GuildId::new(1), UserId::new(2)).is_some());
        assert!(cabinet
            .guild_members(GuildId::new(1))
            .unwrap()
            .contains(&UserId::new(2)));
    }

    #[test]
    fn member_update_sets_nick_without_touching_other_fields() {
        let cabinet = Cabinet::new();
        cabinet.update(&add());

        cabinet.update(&MemberUpdate {
            guild_id: GuildId::new(1),
            user_id: UserId::new(2),
            nick: Nullable::Value("raven".into()),
            roles: None,
        });

        let member = cabinet.member(GuildId::new(1), UserId::new(2)).unwrap();
        assert_eq!(member.nick.as_deref(), Some("raven"));
    }

    #[test]
    fn member_remove_cascades_out_of_the_guild_index() {
        let cabinet = Cabinet::new();
        cabinet.update(&add());

        cabinet.update(&GuildMemberRemove {
            guild_id: GuildId::new(1),
            user_id: UserId::new(2),
        });

        assert!(cabinet.member(GuildId::new(1), UserId::new(2)).is_none());
        assert!(!cabinet
            .guild_members(GuildId::new(1))
            .unwrap()
            .contains(&UserId::new(2)));
    }
}
