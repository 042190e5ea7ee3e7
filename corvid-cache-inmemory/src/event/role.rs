use crate::{config::ResourceType, Cabinet, GuildResource, UpdateCabinet};
use corvid_model::gateway::event::{GuildRoleDelete, GuildRoleEvent};

impl Cabinet {
    pub(crate) fn cache_role(&self, event: &GuildRoleEvent) {
        if !self.wants(ResourceType::ROLE) {
            return;
        }

        self.guild_roles
            .entry(event.guild_id)
            .or_default()
            .insert(event.role.id);

        self.roles.insert(
            event.role.id,
            GuildResource {
                guild_id: event.guild_id,
                value: event.role.clone(),
            },
        );
    }
}

impl UpdateCabinet for GuildRoleDelete {
    fn update(&self, cabinet: &Cabinet) {
        if !cabinet.wants(ResourceType::ROLE) {
            return;
        }

        cabinet.roles.remove(&self.role_id);

        if let Some(mut roles) = cabinet.guild_roles.get_mut(&self.guild_id) {
            roles.remove(&self.role_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::Cabinet;
    use corvid_model::{
        gateway::event::{GuildRoleDelete, GuildRoleEvent},
        guild::Role,
        GuildId, RoleId,
    };

    fn event() -> GuildRoleEvent {
        GuildRoleEvent {
            guild_id: GuildId::new(1),
            role: Role {
                id: RoleId::new(2),
                name: "mods".into(),
                color: 0,
                hoist: true,
                position: 1,
                permissions: "0".into(),
                managed: false,
                mentionable: true,
            },
        }
    }

    #[test]
    fn role_create_indexes_under_its_guild() {
        let cabinet = Cabinet::new();
        cabinet.cache_role(&event());

        assert!(cabinet.role(RoleId::new(2)).is_some());
        assert!(cabinet
            .guild_roles(GuildId::new(1))
            .unwrap()
            .contains(&RoleId::new(2)));
    }

    #[test]
    fn role_delete_removes_it_from_the_guild_index() {
        let cabinet = Cabinet::new();
        cabinet.cache_role(&event());

        cabinet.update(&GuildRoleDelete {
            guild_id: GuildId::new(1),
            role_id: RoleId::new(2),
        });

        assert!(cabinet.role(RoleId::new(2)).is_none());
        assert!(!cabinet
            .guild_roles(GuildId::new(1))
            .unwrap()
            .contains(&RoleId::new(2)));
    }
}
