//! Group management
//!
//! A student belongs to at most one active group per course; adding them to
//! a second one is rejected in the payload.

use super::prelude::*;

#[derive(Default)]
pub struct GroupMutations;

async fn load_group(db: &Database, id: &str) -> Result<GroupRecord> {
    db.groups()
        .get(id)
        .await
        .map_err(internal)?
        .ok_or_else(|| not_found("Group", id))
}

async fn group_with_participants(db: &Database, record: GroupRecord) -> Result<Group> {
    let participants = db.groups().list_participants(&record.id).await.map_err(internal)?;
    Ok(Group::new(record, participants))
}

/// Name of the other group the user already belongs to in the course, if any
async fn conflicting_group(
    db: &Database,
    user_id: &str,
    course_id: &str,
    group_id: Option<&str>,
) -> Result<Option<String>> {
    let existing = db
        .groups()
        .find_for_user_in_course(user_id, course_id)
        .await
        .map_err(internal)?;

    Ok(existing
        .filter(|g| Some(g.id.as_str()) != group_id)
        .map(|g| g.name))
}

#[Object]
impl GroupMutations {
    async fn create_group(&self, ctx: &Context<'_>, input: CreateGroupInput) -> Result<GroupResult> {
        require_course_permission(ctx, &input.course_id, Permission::ManageGroups).await?;
        require_non_empty("name", &input.name)?;
        let db = ctx.data_unchecked::<Database>();

        for user_id in &input.user_ids {
            validate_id(user_id)?;
            if db.users().get_by_id(user_id).await.map_err(internal)?.is_none() {
                return Err(bad_input(format!("Unknown user {}", user_id)));
            }
            if let Some(name) = conflicting_group(db, user_id, &input.course_id, None).await? {
                return Ok(GroupResult::failure(format!(
                    "User {} already belongs to group {}",
                    user_id, name
                )));
            }
        }

        let record = match db
            .groups()
            .create(CreateGroup {
                course_id: input.course_id,
                name: input.name,
            })
            .await
        {
            Ok(record) => record,
            Err(e) => return Ok(GroupResult::failure(e.to_string())),
        };

        for user_id in &input.user_ids {
            db.groups()
                .add_participant(&record.id, user_id)
                .await
                .map_err(internal)?;
        }

        tracing::info!(
            group_id = %record.id,
            course_id = %record.course_id,
            participants = input.user_ids.len(),
            "Group created"
        );

        Ok(GroupResult::ok(group_with_participants(db, record).await?))
    }

    async fn update_group(
        &self,
        ctx: &Context<'_>,
        id: String,
        input: UpdateGroupInput,
    ) -> Result<GroupResult> {
        ctx.auth_user()?;
        let db = ctx.data_unchecked::<Database>();
        let existing = load_group(db, &id).await?;
        require_course_permission(ctx, &existing.course_id, Permission::ManageGroups).await?;

        let updated = db
            .groups()
            .update(
                &id,
                UpdateGroup {
                    name: input.name,
                    active: input.active,
                },
            )
            .await;

        match updated {
            Ok(Some(record)) => Ok(GroupResult::ok(group_with_participants(db, record).await?)),
            Ok(None) => Err(not_found("Group", &id)),
            Err(e) => Ok(GroupResult::failure(e.to_string())),
        }
    }

    async fn add_group_participant(
        &self,
        ctx: &Context<'_>,
        group_id: String,
        user_id: String,
    ) -> Result<GroupResult> {
        ctx.auth_user()?;
        let db = ctx.data_unchecked::<Database>();
        let group = load_group(db, &group_id).await?;
        require_course_permission(ctx, &group.course_id, Permission::ManageGroups).await?;

        if db.users().get_by_id(&user_id).await.map_err(internal)?.is_none() {
            return Err(not_found("User", &user_id));
        }
        if let Some(name) = conflicting_group(db, &user_id, &group.course_id, Some(&group.id)).await? {
            return Ok(GroupResult::failure(format!(
                "User {} already belongs to group {}",
                user_id, name
            )));
        }

        if let Err(e) = db.groups().add_participant(&group.id, &user_id).await {
            return Ok(GroupResult::failure(e.to_string()));
        }

        Ok(GroupResult::ok(group_with_participants(db, group).await?))
    }

    async fn remove_group_participant(
        &self,
        ctx: &Context<'_>,
        group_id: String,
        user_id: String,
    ) -> Result<GroupResult> {
        ctx.auth_user()?;
        let db = ctx.data_unchecked::<Database>();
        let group = load_group(db, &group_id).await?;
        require_course_permission(ctx, &group.course_id, Permission::ManageGroups).await?;

        let removed = db
            .groups()
            .remove_participant(&group.id, &user_id)
            .await
            .map_err(internal)?;
        if !removed {
            return Ok(GroupResult::failure("User is not a participant of this group"));
        }

        Ok(GroupResult::ok(group_with_participants(db, group).await?))
    }
}
