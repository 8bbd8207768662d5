use super::prelude::*;

#[derive(Default)]
pub struct SubjectQueries;

#[Object]
impl SubjectQueries {
    /// List subjects, optionally only active or inactive ones
    #[graphql(guard = "AuthGuard")]
    async fn subjects(&self, ctx: &Context<'_>, active: Option<bool>) -> Result<Vec<Subject>> {
        let db = ctx.data_unchecked::<Database>();
        let records = db.subjects().list(active).await.map_err(internal)?;
        Ok(records.into_iter().map(Subject::from).collect())
    }

    #[graphql(guard = "AuthGuard")]
    async fn subject(&self, ctx: &Context<'_>, id: String) -> Result<Option<Subject>> {
        let db = ctx.data_unchecked::<Database>();
        let record = db.subjects().get(&id).await.map_err(internal)?;
        Ok(record.map(Subject::from))
    }
}
