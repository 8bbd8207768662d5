use super::prelude::*;

#[derive(Default)]
pub struct SubjectMutations;

#[Object]
impl SubjectMutations {
    #[graphql(guard = "AdminGuard")]
    async fn create_subject(
        &self,
        ctx: &Context<'_>,
        input: CreateSubjectInput,
    ) -> Result<SubjectResult> {
        require_non_empty("code", &input.code)?;
        require_non_empty("name", &input.name)?;
        let db = ctx.data_unchecked::<Database>();

        match db
            .subjects()
            .create(CreateSubject {
                code: input.code.trim().to_string(),
                name: input.name,
            })
            .await
        {
            Ok(record) => Ok(SubjectResult::ok(Subject::from(record))),
            Err(e) => Ok(SubjectResult::failure(e.to_string())),
        }
    }

    #[graphql(guard = "AdminGuard")]
    async fn update_subject(
        &self,
        ctx: &Context<'_>,
        id: String,
        input: UpdateSubjectInput,
    ) -> Result<SubjectResult> {
        let db = ctx.data_unchecked::<Database>();

        let updated = db
            .subjects()
            .update(
                &id,
                UpdateSubject {
                    code: input.code,
                    name: input.name,
                    active: input.active,
                },
            )
            .await;

        match updated {
            Ok(Some(record)) => Ok(SubjectResult::ok(Subject::from(record))),
            Ok(None) => Err(not_found("Subject", &id)),
            Err(e) => Ok(SubjectResult::failure(e.to_string())),
        }
    }
}
