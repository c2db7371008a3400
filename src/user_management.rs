use crate::entity::users::{
    ActiveModel as UserActiveModel, Column, Entity as Users, Model as User, UserRole,
};
use crate::jwt::Claims;
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use uuid::Uuid;

fn role_from_claims(claims: &Claims) -> UserRole {
    match claims.role.as_deref() {
        Some("organizer") => UserRole::Organizer,
        Some("team_admin") => UserRole::TeamAdmin,
        _ => UserRole::Viewer,
    }
}

pub async fn ensure_user_exists(
    db: &DatabaseConnection,
    claims: &Claims,
) -> Result<User, sea_orm::DbErr> {
    // First, try to find user by external_id
    let existing_user = Users::find()
        .filter(Column::ExternalId.eq(&claims.sub))
        .one(db)
        .await?;

    let role = role_from_claims(claims);

    match existing_user {
        Some(user) => {
            // Keep role and team binding in sync with the token issuer.
            if user.role != role || user.team_id != claims.team_id {
                let mut model: UserActiveModel = user.into();
                model.role = Set(role);
                model.team_id = Set(claims.team_id);
                model.updated_at = Set(Utc::now().into());
                let user = model.update(db).await?;
                return Ok(user);
            }
            Ok(user)
        }
        None => {
            // User doesn't exist, create a new one
            let new_user = UserActiveModel {
                id: Set(Uuid::new_v4()),
                external_id: Set(claims.sub.clone()),
                email: Set(claims.email.clone()),
                display_name: Set(None), // We can set this later if needed
                role: Set(role),
                team_id: Set(claims.team_id),
                created_at: Set(Utc::now().into()),
                updated_at: Set(Utc::now().into()),
            };

            let user = new_user.insert(db).await?;
            Ok(user)
        }
    }
}
