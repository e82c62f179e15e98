use crate::{jwt::SessionData, schema::UserRole};

const ACTION_TABLE: &[(UserRole, &[ActionType])] = &[
    (
        UserRole::User,
        &[
            ActionType::CreateRecipes,
            ActionType::CreateIngredients,
            ActionType::ManageOwnRecipes,
            ActionType::ManageOwnComments,
            ActionType::ManageOwnLikes,
            ActionType::ManageOwnCart,
            ActionType::ManageOwnSearchHistory,
            ActionType::ManageOwnChatHistory,
            ActionType::ManageOwnProfile,
        ],
    ),
    (
        UserRole::Admin,
        &[
            ActionType::CreateRecipes,
            ActionType::CreateIngredients,
            ActionType::ManageOwnRecipes,
            ActionType::ManageOwnComments,
            ActionType::ManageOwnLikes,
            ActionType::ManageOwnCart,
            ActionType::ManageOwnSearchHistory,
            ActionType::ManageOwnChatHistory,
            ActionType::ManageOwnProfile,
            ActionType::ManageIngredients,
            ActionType::ManageUsers,
            ActionType::ManageAllRecipes,
            ActionType::ManageAllComments,
        ],
    ),
];

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub enum ActionType {
    CreateRecipes,
    CreateIngredients,

    ManageOwnRecipes,
    ManageOwnComments,
    ManageOwnLikes,
    ManageOwnCart,
    ManageOwnSearchHistory,
    ManageOwnChatHistory,
    ManageOwnProfile,

    ManageUsers,
    ManageIngredients,
    ManageAllRecipes,
    ManageAllComments,
}

impl ActionType {
    pub fn authenticate(self, session: &SessionData) -> bool {
        let role = &session.role;

        ACTION_TABLE
            .iter()
            .find_map(|(uid, actions)| {
                if role != uid {
                    return None;
                }

                Some(actions.contains(&self))
            })
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jwt::JwtSessionData;

    fn session(role: UserRole) -> SessionData {
        JwtSessionData::new(1, "maria".to_string(), role).into()
    }

    #[test]
    fn regular_users_manage_their_own_content_only() {
        let session = session(UserRole::User);

        assert!(ActionType::CreateRecipes.authenticate(&session));
        assert!(ActionType::ManageOwnRecipes.authenticate(&session));
        assert!(!ActionType::ManageAllRecipes.authenticate(&session));
        assert!(!ActionType::ManageUsers.authenticate(&session));
    }

    #[test]
    fn admins_carry_every_action() {
        let session = session(UserRole::Admin);

        assert!(ActionType::CreateRecipes.authenticate(&session));
        assert!(ActionType::ManageAllRecipes.authenticate(&session));
        assert!(ActionType::ManageUsers.authenticate(&session));
    }
}
