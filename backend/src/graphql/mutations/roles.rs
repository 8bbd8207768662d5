//! Roles and course memberships

use super::prelude::*;

#[derive(Default)]
pub struct RoleMutations;

#[Object]
impl RoleMutations {
    #[graphql(guard = "AdminGuard")]
    async fn create_role(&self, ctx: &Context<'_>, input: CreateRoleInput) -> Result<RoleResult> {
        require_non_empty("name", &input.name)?;
        let db = ctx.data_unchecked::<Database>();

        let created = db
            .roles()
            .create(CreateRole {
                name: input.name,
                permissions: input.permissions,
                parent_role_id: input.parent_role_id,
            })
            .await;

        match created {
            Ok(record) => Ok(RoleResult::ok(Role::from(record))),
            Err(e) => Ok(RoleResult::failure(e.to_string())),
        }
    }

    #[graphql(guard = "AdminGuard")]
    async fn update_role(
        &self,
        ctx: &Context<'_>,
        id: String,
        input: UpdateRoleInput,
    ) -> Result<RoleResult> {
        let parent_role_id = nullable_update(input.parent_role_id);
        if matches!(&parent_role_id, Some(Some(parent)) if *parent == id) {
            return Err(bad_input("A role cannot be its own parent"));
        }

        let db = ctx.data_unchecked::<Database>();
        let updated = db
            .roles()
            .update(
                &id,
                UpdateRole {
                    name: input.name,
                    permissions: input.permissions,
                    parent_role_id,
                    active: input.active,
                },
            )
            .await;

        match updated {
            Ok(Some(record)) => Ok(RoleResult::ok(Role::from(record))),
            Ok(None) => Err(not_found("Role", &id)),
            Err(e) => Ok(RoleResult::failure(e.to_string())),
        }
    }

    /// Enroll a user in a course with a role
    async fn create_user_role(
        &self,
        ctx: &Context<'_>,
        input: CreateUserRoleInput,
    ) -> Result<UserRoleResult> {
        require_course_permission(ctx, &input.course_id, Permission::ManageUsers).await?;
        let db = ctx.data_unchecked::<Database>();

        if db.users().get_by_id(&input.user_id).await.map_err(internal)?.is_none() {
            return Err(not_found("User", &input.user_id));
        }
        if db.roles().get(&input.role_id).await.map_err(internal)?.is_none() {
            return Err(not_found("Role", &input.role_id));
        }

        let created = db
            .user_roles()
            .create(CreateUserRole {
                user_id: input.user_id,
                course_id: input.course_id,
                role_id: input.role_id,
            })
            .await;

        match created {
            Ok(record) => Ok(UserRoleResult::ok(UserRole::from(record))),
            Err(e) => Ok(UserRoleResult::failure(e.to_string())),
        }
    }

    async fn update_user_role(
        &self,
        ctx: &Context<'_>,
        id: String,
        input: UpdateUserRoleInput,
    ) -> Result<UserRoleResult> {
        ctx.auth_user()?;
        let db = ctx.data_unchecked::<Database>();

        let existing = db
            .user_roles()
            .get(&id)
            .await
            .map_err(internal)?
            .ok_or_else(|| not_found("User role", &id))?;
        require_course_permission(ctx, &existing.course_id, Permission::ManageUsers).await?;

        let updated = db
            .user_roles()
            .update(
                &id,
                UpdateUserRole {
                    role_id: input.role_id,
                    active: input.active,
                },
            )
            .await;

        match updated {
            Ok(Some(record)) => Ok(UserRoleResult::ok(UserRole::from(record))),
            Ok(None) => Err(not_found("User role", &id)),
            Err(e) => Ok(UserRoleResult::failure(e.to_string())),
        }
    }
}
