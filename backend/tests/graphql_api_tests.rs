//! End-to-end GraphQL tests against an in-memory database and a fake GitHub

mod common;

use std::sync::Arc;

use async_graphql::Request;
use chrono::{Duration, Utc};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use teachhub::db::{
    CreateAssignment, CreateCourse, CreateRole, CreateSubject, CreateUser, CreateUserRole,
    Database, Permission, UpdateUser, UserRecord,
};
use teachhub::graphql::{AuthUser, TeachHubSchema, build_schema};
use teachhub::services::{AuthConfig, AuthService, GithubClient};

use common::FakeGithub;

struct TestApp {
    db: Database,
    schema: TeachHubSchema,
    github: Arc<FakeGithub>,
    course_id: String,
    admin: UserRecord,
    professor: UserRecord,
    student: UserRecord,
    other_student: UserRecord,
}

impl TestApp {
    async fn new() -> Self {
        Self::with_github(FakeGithub::new()).await
    }

    async fn with_github(github: FakeGithub) -> Self {
        let db = Database::in_memory().await.unwrap();
        let github = Arc::new(github);
        let client: Arc<dyn GithubClient> = github.clone();
        let auth = AuthService::new(
            db.clone(),
            client.clone(),
            AuthConfig {
                jwt_secret: "test-secret".to_string(),
                token_lifetime: 3600,
            },
        );
        let schema = build_schema(db.clone(), client, auth);

        let subject = db
            .subjects()
            .create(CreateSubject {
                code: "7541".to_string(),
                name: "Algoritmos II".to_string(),
            })
            .await
            .unwrap();
        let course = db
            .courses()
            .create(CreateCourse {
                name: "Algo II - Buchwald".to_string(),
                year: 2026,
                period: 2,
                subject_id: subject.id,
                organization: Some("fiuba-algo2".to_string()),
            })
            .await
            .unwrap();

        let admin = create_user(&db, "root", true).await;
        let professor = create_user(&db, "prof", false).await;
        let student = create_user(&db, "alice", false).await;
        let other_student = create_user(&db, "bob", false).await;

        let professor_role = create_role(
            &db,
            "Profesor",
            vec![
                Permission::ViewCourse,
                Permission::ManageAssignments,
                Permission::ManageGroups,
                Permission::ViewAllSubmissions,
                Permission::SetReview,
                Permission::ManageRepositories,
            ],
        )
        .await;
        let student_role = create_role(
            &db,
            "Alumno",
            vec![Permission::ViewCourse, Permission::SubmitAssignment],
        )
        .await;

        enroll(&db, &professor.id, &course.id, &professor_role).await;
        enroll(&db, &student.id, &course.id, &student_role).await;
        enroll(&db, &other_student.id, &course.id, &student_role).await;

        Self {
            db,
            schema,
            github,
            course_id: course.id,
            admin,
            professor,
            student,
            other_student,
        }
    }

    async fn execute(&self, query: &str, caller: Option<&UserRecord>) -> Value {
        let mut request = Request::new(query);
        if let Some(user) = caller {
            request = request.data(AuthUser {
                user_id: user.id.clone(),
                github_id: user.github_id.clone(),
                is_admin: user.is_admin,
            });
        }
        let response = self.schema.execute(request).await;
        serde_json::to_value(&response).unwrap()
    }

    async fn assignment(&self, end_date: chrono::DateTime<Utc>, allow_late: bool) -> String {
        self.db
            .assignments()
            .create(CreateAssignment {
                course_id: self.course_id.clone(),
                title: "TP1".to_string(),
                description: None,
                link: None,
                start_date: Some((end_date - Duration::days(14)).to_rfc3339()),
                end_date: Some(end_date.to_rfc3339()),
                allow_late_submissions: allow_late,
                is_group: false,
            })
            .await
            .unwrap()
            .id
    }
}

async fn create_user(db: &Database, github_id: &str, is_admin: bool) -> UserRecord {
    db.users()
        .create(CreateUser {
            name: github_id.to_string(),
            last_name: "Test".to_string(),
            file: None,
            github_id: github_id.to_string(),
            notification_email: None,
            is_admin,
        })
        .await
        .unwrap()
}

async fn create_role(db: &Database, name: &str, permissions: Vec<Permission>) -> String {
    db.roles()
        .create(CreateRole {
            name: name.to_string(),
            permissions,
            parent_role_id: None,
        })
        .await
        .unwrap()
        .id
}

async fn enroll(db: &Database, user_id: &str, course_id: &str, role_id: &str) {
    db.user_roles()
        .create(CreateUserRole {
            user_id: user_id.to_string(),
            course_id: course_id.to_string(),
            role_id: role_id.to_string(),
        })
        .await
        .unwrap();
}

fn error_code(response: &Value) -> &str {
    response["errors"][0]["extensions"]["code"]
        .as_str()
        .unwrap_or_else(|| panic!("expected an error, got {}", response))
}

#[tokio::test]
async fn test_unauthenticated_request_rejected() {
    let app = TestApp::new().await;

    let response = app.execute("{ subjects { id } }", None).await;
    assert_eq!(error_code(&response), "UNAUTHORIZED");

    let response = app.execute("{ me { id } }", None).await;
    assert_eq!(error_code(&response), "UNAUTHORIZED");
}

#[tokio::test]
async fn test_me_returns_caller() {
    let app = TestApp::new().await;

    let response = app.execute("{ me { id githubId isAdmin } }", Some(&app.student)).await;
    assert_eq!(
        response["data"]["me"],
        json!({ "id": app.student.id, "githubId": "alice", "isAdmin": false })
    );
}

#[tokio::test]
async fn test_missing_course_permission_forbidden() {
    let app = TestApp::new().await;
    let query = format!(
        r#"mutation {{ createAssignment(input: {{ courseId: "{}", title: "TP2" }}) {{ success }} }}"#,
        app.course_id
    );

    let response = app.execute(&query, Some(&app.student)).await;
    assert_eq!(error_code(&response), "FORBIDDEN");

    let response = app.execute(&query, Some(&app.professor)).await;
    assert_eq!(response["data"]["createAssignment"]["success"], json!(true));
}

#[tokio::test]
async fn test_admin_only_mutation_forbidden_for_members() {
    let app = TestApp::new().await;
    let query = r#"mutation { createSubject(input: { code: "9999", name: "X" }) { success } }"#;

    let response = app.execute(query, Some(&app.professor)).await;
    assert_eq!(error_code(&response), "FORBIDDEN");

    let response = app.execute(query, Some(&app.admin)).await;
    assert_eq!(response["data"]["createSubject"]["success"], json!(true));
}

#[tokio::test]
async fn test_assignment_dates_validated() {
    let app = TestApp::new().await;
    let query = format!(
        r#"mutation {{ createAssignment(input: {{
            courseId: "{}", title: "TP2",
            startDate: "2026-05-10T00:00:00Z", endDate: "2026-05-01T00:00:00Z"
        }}) {{ success }} }}"#,
        app.course_id
    );

    let response = app.execute(&query, Some(&app.professor)).await;
    assert_eq!(error_code(&response), "BAD_USER_INPUT");
}

#[tokio::test]
async fn test_late_submission_rejected() {
    let app = TestApp::new().await;
    let assignment_id = app.assignment(Utc::now() - Duration::days(1), false).await;
    let query = format!(
        r#"mutation {{ createSubmission(input: {{
            assignmentId: "{}", pullRequestUrl: "https://github.com/fiuba-algo2/tp1-alice/pull/1"
        }}) {{ success error submission {{ id }} }} }}"#,
        assignment_id
    );

    let response = app.execute(&query, Some(&app.student)).await;
    let payload = &response["data"]["createSubmission"];
    assert_eq!(payload["success"], json!(false));
    assert_eq!(payload["submission"], Value::Null);
    assert!(payload["error"].as_str().unwrap().contains("deadline"));
}

#[tokio::test]
async fn test_late_submission_allowed_when_enabled() {
    let app = TestApp::new().await;
    let assignment_id = app.assignment(Utc::now() - Duration::days(1), true).await;
    let query = format!(
        r#"mutation {{ createSubmission(input: {{
            assignmentId: "{}", pullRequestUrl: "https://github.com/fiuba-algo2/tp1-alice/pull/1"
        }}) {{ success }} }}"#,
        assignment_id
    );

    let response = app.execute(&query, Some(&app.student)).await;
    assert_eq!(response["data"]["createSubmission"]["success"], json!(true));
}

#[tokio::test]
async fn test_submit_resubmit_and_review() {
    let app = TestApp::new().await;
    let assignment_id = app.assignment(Utc::now() + Duration::days(7), false).await;
    let submit = format!(
        r#"mutation {{ createSubmission(input: {{
            assignmentId: "{}", pullRequestUrl: "https://github.com/fiuba-algo2/tp1-alice/pull/1"
        }}) {{ success error submission {{ id submitterUserId }} }} }}"#,
        assignment_id
    );

    let response = app.execute(&submit, Some(&app.student)).await;
    let payload = &response["data"]["createSubmission"];
    assert_eq!(payload["success"], json!(true));
    assert_eq!(payload["submission"]["submitterUserId"], json!(app.student.id));
    let submission_id = payload["submission"]["id"].as_str().unwrap().to_string();

    // Second hand-in must go through resubmit
    let response = app.execute(&submit, Some(&app.student)).await;
    assert_eq!(response["data"]["createSubmission"]["success"], json!(false));

    // Students only see their own submissions
    let list = format!(r#"{{ submissions(assignmentId: "{}") {{ id }} }}"#, assignment_id);
    let response = app.execute(&list, Some(&app.other_student)).await;
    assert_eq!(response["data"]["submissions"], json!([]));
    let response = app.execute(&list, Some(&app.professor)).await;
    assert_eq!(response["data"]["submissions"], json!([{ "id": submission_id }]));

    let review = format!(
        r#"mutation {{ createReview(input: {{ submissionId: "{}", grade: 4, revisionRequested: true }}) {{
            success review {{ id grade reviewedAgainAt }}
        }} }}"#,
        submission_id
    );
    let response = app.execute(&review, Some(&app.student)).await;
    assert_eq!(error_code(&response), "FORBIDDEN");

    let response = app.execute(&review, Some(&app.professor)).await;
    let payload = &response["data"]["createReview"];
    assert_eq!(payload["success"], json!(true));
    assert_eq!(payload["review"]["grade"], json!(4));
    assert_eq!(payload["review"]["reviewedAgainAt"], Value::Null);
    let review_id = payload["review"]["id"].as_str().unwrap().to_string();

    let resubmit = format!(
        r#"mutation {{ resubmit(id: "{}") {{ success submission {{ submittedAgainAt }} }} }}"#,
        submission_id
    );
    let response = app.execute(&resubmit, Some(&app.other_student)).await;
    assert_eq!(error_code(&response), "FORBIDDEN");

    let response = app.execute(&resubmit, Some(&app.student)).await;
    assert_eq!(response["data"]["resubmit"]["success"], json!(true));
    assert!(response["data"]["resubmit"]["submission"]["submittedAgainAt"].is_string());

    let update = format!(
        r#"mutation {{ updateReview(id: "{}", input: {{ grade: 8, revisionRequested: false }}) {{
            success review {{ grade revisionRequested reviewedAgainAt }}
        }} }}"#,
        review_id
    );
    let response = app.execute(&update, Some(&app.professor)).await;
    let payload = &response["data"]["updateReview"]["review"];
    assert_eq!(payload["grade"], json!(8));
    assert_eq!(payload["revisionRequested"], json!(false));
    assert!(payload["reviewedAgainAt"].is_string());
}

#[tokio::test]
async fn test_grade_out_of_range_rejected() {
    let app = TestApp::new().await;
    let assignment_id = app.assignment(Utc::now() + Duration::days(7), false).await;
    let submit = format!(
        r#"mutation {{ createSubmission(input: {{
            assignmentId: "{}", pullRequestUrl: "https://github.com/fiuba-algo2/tp1-alice/pull/1"
        }}) {{ submission {{ id }} }} }}"#,
        assignment_id
    );
    let response = app.execute(&submit, Some(&app.student)).await;
    let submission_id = response["data"]["createSubmission"]["submission"]["id"]
        .as_str()
        .unwrap()
        .to_string();

    let review = format!(
        r#"mutation {{ createReview(input: {{ submissionId: "{}", grade: 11 }}) {{ success }} }}"#,
        submission_id
    );
    let response = app.execute(&review, Some(&app.professor)).await;
    assert_eq!(error_code(&response), "BAD_USER_INPUT");
}

#[tokio::test]
async fn test_group_assignment_requires_group() {
    let app = TestApp::new().await;
    let assignment_id = app
        .db
        .assignments()
        .create(CreateAssignment {
            course_id: app.course_id.clone(),
            title: "TP2".to_string(),
            description: None,
            link: None,
            start_date: None,
            end_date: None,
            allow_late_submissions: false,
            is_group: true,
        })
        .await
        .unwrap()
        .id;
    let submit = format!(
        r#"mutation {{ createSubmission(input: {{
            assignmentId: "{}", pullRequestUrl: "https://github.com/fiuba-algo2/tp2-g1/pull/3"
        }}) {{ success error submission {{ submitterGroupId }} }} }}"#,
        assignment_id
    );

    let response = app.execute(&submit, Some(&app.student)).await;
    assert_eq!(response["data"]["createSubmission"]["success"], json!(false));

    let create_group = format!(
        r#"mutation {{ createGroup(input: {{ courseId: "{}", name: "Grupo 1", userIds: ["{}", "{}"] }}) {{
            success group {{ id participants {{ userId }} }}
        }} }}"#,
        app.course_id, app.student.id, app.other_student.id
    );
    let response = app.execute(&create_group, Some(&app.professor)).await;
    let group = &response["data"]["createGroup"]["group"];
    assert_eq!(group["participants"].as_array().unwrap().len(), 2);
    let group_id = group["id"].as_str().unwrap().to_string();

    let response = app.execute(&submit, Some(&app.student)).await;
    let payload = &response["data"]["createSubmission"];
    assert_eq!(payload["success"], json!(true));
    assert_eq!(payload["submission"]["submitterGroupId"], json!(group_id));

    // The group already handed it in
    let response = app.execute(&submit, Some(&app.other_student)).await;
    assert_eq!(response["data"]["createSubmission"]["success"], json!(false));
}

#[tokio::test]
async fn test_create_repositories_persists_created() {
    let app = TestApp::with_github(FakeGithub::new().fail_create("tp-bob")).await;
    let query = format!(
        r#"mutation {{ createRepositories(input: {{
            courseId: "{course}",
            adminIds: ["{prof}"],
            repositories: [
                {{ name: "tp-alice", studentIds: ["{alice}"] }},
                {{ name: "tp-bob", studentIds: ["{bob}"] }}
            ]
        }}) {{
            success error
            successful {{ name status remoteId }}
            partiallyFailed {{ name }}
            failed {{ name status remoteId }}
            repositories {{ name userIds courseId }}
        }} }}"#,
        course = app.course_id,
        prof = app.professor.id,
        alice = app.student.id,
        bob = app.other_student.id,
    );

    let response = app.execute(&query, Some(&app.professor)).await;
    let payload = &response["data"]["createRepositories"];

    assert_eq!(payload["success"], json!(false));
    assert!(payload["error"].is_string());
    assert_eq!(payload["successful"][0]["name"], json!("tp-alice"));
    assert_eq!(payload["successful"][0]["status"], json!("CREATED"));
    assert_eq!(payload["partiallyFailed"], json!([]));
    assert_eq!(
        payload["failed"],
        json!([{ "name": "tp-bob", "status": "FAILED_ON_CREATE", "remoteId": null }])
    );
    assert_eq!(
        payload["repositories"],
        json!([{ "name": "tp-alice", "userIds": [app.student.id], "courseId": app.course_id }])
    );

    // Collaborators were resolved to GitHub logins
    let mut logins: Vec<String> = app
        .github
        .collaborators_of("tp-alice")
        .into_iter()
        .map(|(login, _)| login)
        .collect();
    logins.sort();
    assert_eq!(logins, vec!["alice".to_string(), "prof".to_string()]);

    let stored = app.db.repositories().list_by_course(&app.course_id).await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].name, "tp-alice");
}

#[tokio::test]
async fn test_create_repositories_persists_partially_failed() {
    let app = TestApp::with_github(FakeGithub::new().fail_collaborator("tp-alice", "alice")).await;
    let query = format!(
        r#"mutation {{ createRepositories(input: {{
            courseId: "{course}",
            adminIds: ["{prof}"],
            repositories: [{{ name: "tp-alice", studentIds: ["{alice}"] }}]
        }}) {{
            success error
            successful {{ name }}
            partiallyFailed {{ name status failedCollaboratorUsernames }}
            repositories {{ name userIds }}
        }} }}"#,
        course = app.course_id,
        prof = app.professor.id,
        alice = app.student.id,
    );

    let response = app.execute(&query, Some(&app.professor)).await;
    let payload = &response["data"]["createRepositories"];

    assert_eq!(payload["success"], json!(false));
    assert!(payload["error"].is_string());
    assert_eq!(payload["successful"], json!([]));
    assert_eq!(
        payload["partiallyFailed"],
        json!([{
            "name": "tp-alice",
            "status": "CREATED_FAILED_ADDING_COLLABORATOR",
            "failedCollaboratorUsernames": ["alice"]
        }])
    );
    assert_eq!(
        payload["repositories"],
        json!([{ "name": "tp-alice", "userIds": [app.student.id] }])
    );

    let stored = app.db.repositories().list_by_course(&app.course_id).await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(
        app.db.repositories().list_user_ids(&stored[0].id).await.unwrap(),
        vec![app.student.id.clone()]
    );
}

#[tokio::test]
async fn test_create_repositories_rejects_inactive_users() {
    let app = TestApp::new().await;
    app.db
        .users()
        .update(
            &app.other_student.id,
            UpdateUser {
                active: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    let query = format!(
        r#"mutation {{ createRepositories(input: {{
            courseId: "{}",
            repositories: [{{ name: "tp-bob", studentIds: ["{}"] }}]
        }}) {{ success }} }}"#,
        app.course_id, app.other_student.id
    );

    let response = app.execute(&query, Some(&app.professor)).await;
    assert_eq!(error_code(&response), "BAD_USER_INPUT");
    assert!(app.github.calls().is_empty());
}

#[tokio::test]
async fn test_create_repositories_rejects_unknown_users() {
    let app = TestApp::new().await;
    let query = format!(
        r#"mutation {{ createRepositories(input: {{
            courseId: "{}",
            repositories: [{{ name: "tp-ghost", studentIds: ["no-such-user"] }}]
        }}) {{ success }} }}"#,
        app.course_id
    );

    let response = app.execute(&query, Some(&app.professor)).await;
    assert_eq!(error_code(&response), "BAD_USER_INPUT");
    assert!(app.github.calls().is_empty());

    let response = app.execute(&query, Some(&app.student)).await;
    assert_eq!(error_code(&response), "FORBIDDEN");
}

#[tokio::test]
async fn test_register_then_login_through_oauth() {
    let app = TestApp::new().await;
    let register = r#"mutation { register(code: "ada", input: { name: "Ada", lastName: "Lovelace" }) {
        success error session { token user { githubId } }
    } }"#;

    let response = app.execute(register, None).await;
    let payload = &response["data"]["register"];
    assert_eq!(payload["success"], json!(true));
    assert_eq!(payload["session"]["user"]["githubId"], json!("ada"));

    let response = app.execute(register, None).await;
    assert_eq!(response["data"]["register"]["success"], json!(false));

    let response = app
        .execute(r#"mutation { login(code: "ada") { success session { token } } }"#, None)
        .await;
    assert_eq!(response["data"]["login"]["success"], json!(true));
    assert!(response["data"]["login"]["session"]["token"].is_string());

    let response = app
        .execute(r#"mutation { login(code: "nobody") { success error } }"#, None)
        .await;
    assert_eq!(response["data"]["login"]["success"], json!(false));
}
