//! Admin user management command.

use sliceworks_api::db::users::UserRepository;
use sliceworks_api::services::password::hash_password;
use sliceworks_core::{Email, Role, RoleSet};

use super::{CommandError, connect};

/// Create an admin user.
pub async fn create_user(email: &str, name: &str, password: &str) -> Result<(), CommandError> {
    let email = Email::parse(email).map_err(|e| CommandError::InvalidInput(e.to_string()))?;
    let password_hash =
        hash_password(password).map_err(|e| CommandError::InvalidInput(e.to_string()))?;

    let pool = connect().await?;
    let users = UserRepository::new(&pool);

    let mut roles = RoleSet::single(Role::Admin);
    roles.insert(Role::Diner);

    let user = users.create(name, &email, &password_hash, roles).await?;

    tracing::info!(user_id = %user.id, email = %user.email, "admin user created");
    Ok(())
}
