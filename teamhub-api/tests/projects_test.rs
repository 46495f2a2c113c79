//! Project lifecycle, membership cascades, and status transitions over HTTP.

mod common;

use axum::http::{Method, StatusCode};
use common::TestApp;
use serde_json::json;

async fn team_with_project(app: &TestApp, admin: &str) -> (i64, i64) {
    let team = app.create_team(admin, "crew").await;
    let (status, project) = app
        .post(
            &format!("/api/teams/{}/projects", team),
            admin,
            json!({ "name": "work" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    (team, project["id"].as_i64().expect("project has an id"))
}

#[tokio::test]
async fn test_new_projects_wait_for_schedule() {
    let app = TestApp::new();
    let admin = app.admin_session().await;
    let team = app.create_team(&admin, "t").await;

    let (status, body) = app
        .post(
            &format!("/api/teams/{}/projects", team),
            &admin,
            json!({ "name": "fresh" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "WAIT_FOR_SCHEDULE");
}

#[tokio::test]
async fn test_plain_members_cannot_create_projects() {
    let app = TestApp::new();
    let admin = app.admin_session().await;
    let (id, user) = app.setup_user(&admin, "plain").await;
    let team = app.create_team(&admin, "t").await;
    app.add_to_team(&admin, team, id).await;

    let (status, _) = app
        .post(
            &format!("/api/teams/{}/projects", team),
            &user,
            json!({ "name": "denied" }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_adding_a_project_member_pulls_them_into_the_team() {
    let app = TestApp::new();
    let admin = app.admin_session().await;
    let (id, user) = app.setup_user(&admin, "pulled").await;
    let (team, project) = team_with_project(&app, &admin).await;

    let (status, _) = app
        .post(&format!("/api/projects/{}/users", project), &admin, json!({ "id": id }))
        .await;
    assert_eq!(status, StatusCode::OK);

    // Now a member of both
    let (_, body) = app.get("/api/me/teams", &user).await;
    assert_eq!(body["total"], 1);
    assert_eq!(body["list"][0]["id"].as_i64(), Some(team));
    let (_, body) = app.get("/api/me/projects", &user).await;
    assert_eq!(body["total"], 1);

    // Leaving the project keeps the team membership
    let (status, _) = app
        .delete(&format!("/api/me/projects/{}", project), &user)
        .await;
    assert_eq!(status, StatusCode::OK);
    let (_, body) = app.get("/api/me/projects", &user).await;
    assert_eq!(body["total"], 0);
    let (_, body) = app.get("/api/me/teams", &user).await;
    assert_eq!(body["total"], 1);
}

#[tokio::test]
async fn test_patch_document_drives_the_status() {
    let app = TestApp::new();
    let admin = app.admin_session().await;
    let (_, project) = team_with_project(&app, &admin).await;

    let (status, body, _) = app
        .request(
            Method::PATCH,
            &format!("/api/projects/{}", project),
            Some(&admin),
            Some(json!([
                { "op": "replace", "path": "/status", "value": "IN_PROGRESS" },
                { "op": "replace", "path": "/desc", "value": "under way" }
            ])),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "IN_PROGRESS");
    assert_eq!(body["desc"], "under way");

    let (status, _, _) = app
        .request(
            Method::PATCH,
            &format!("/api/projects/{}", project),
            Some(&admin),
            Some(json!([{ "op": "replace", "path": "/status", "value": "DONE_ISH" }])),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_project_visibility_follows_membership_and_leadership() {
    let app = TestApp::new();
    let admin = app.admin_session().await;
    let (leader_id, leader) = app.setup_user(&admin, "leader").await;
    let (bystander_id, bystander) = app.setup_user(&admin, "bystander").await;
    let (team, project) = team_with_project(&app, &admin).await;
    app.add_to_team(&admin, team, leader_id).await;
    app.add_to_team(&admin, team, bystander_id).await;
    app.request(
        Method::PATCH,
        &format!("/api/teams/{}", team),
        Some(&admin),
        Some(json!([{ "op": "replace", "path": "/leader", "value": { "id": leader_id } }])),
    )
    .await;

    // Leader of the owning team sees it without being a member
    let (status, _) = app.get(&format!("/api/projects/{}", project), &leader).await;
    assert_eq!(status, StatusCode::OK);

    // A plain teammate outside the project does not
    let (status, _) = app.get(&format!("/api/projects/{}", project), &bystander).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // part_in splits the team's project list accordingly
    let (_, body) = app
        .get(&format!("/api/teams/{}/projects?part_in=false", team), &bystander)
        .await;
    assert_eq!(body["total"], 1);
    let (_, body) = app
        .get(&format!("/api/teams/{}/projects?part_in=true", team), &bystander)
        .await;
    assert_eq!(body["total"], 0);
}

#[tokio::test]
async fn test_put_updates_fields_in_place() {
    let app = TestApp::new();
    let admin = app.admin_session().await;
    let (_, project) = team_with_project(&app, &admin).await;

    let (status, body, _) = app
        .request(
            Method::PUT,
            &format!("/api/projects/{}", project),
            Some(&admin),
            Some(json!({ "name": "renamed", "status": "FINISHED" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "renamed");
    assert_eq!(body["status"], "FINISHED");
}

#[tokio::test]
async fn test_removing_a_member_needs_standing() {
    let app = TestApp::new();
    let admin = app.admin_session().await;
    let (a_id, a) = app.setup_user(&admin, "member_a").await;
    let (b_id, _) = app.setup_user(&admin, "member_b").await;
    let (_, project) = team_with_project(&app, &admin).await;
    for id in [a_id, b_id] {
        app.post(&format!("/api/projects/{}/users", project), &admin, json!({ "id": id }))
            .await;
    }

    // A plain member cannot remove someone else
    let (status, _) = app
        .delete(&format!("/api/projects/{}/users/{}", project, b_id), &a)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // But admin can
    let (status, _) = app
        .delete(&format!("/api/projects/{}/users/{}", project, b_id), &admin)
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = app.get(&format!("/api/projects/{}/users", project), &admin).await;
    assert_eq!(body["total"], 1);
    assert_eq!(body["list"][0]["username"], "member_a");
}
