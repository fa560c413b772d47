//! Integration tests per gli endpoints dei gruppi
//!
//! Test per:
//! - GET /groups e POST /groups
//! - POST /groups/{id}/join e POST /groups/{id}/leave
//! - POST/DELETE /groups/{id}/members/{user_id} (operazioni riservate all'admin)
//! - DELETE /groups/{id}
//! - GET/POST /groups/{id}/messages

mod common;

#[cfg(test)]
mod group_tests {
    use super::common::*;
    use axum_test::http::HeaderName;
    use serde_json::json;
    use sqlx::MySqlPool;

    // ============================================================
    // Test per POST /groups - create_group
    // ============================================================

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users")))]
    async fn test_create_group_creator_becomes_admin_and_member(
        pool: MySqlPool,
    ) -> sqlx::Result<()> {
        let state = create_test_state(pool);
        let server = create_test_server(state.clone());
        let token = create_test_jwt(1, "alice@example.com");

        let response = server
            .post("/groups")
            .add_header(
                HeaderName::from_static("authorization"),
                format!("Bearer {}", token),
            )
            .json(&json!({ "name": "Study" }))
            .await;

        response.assert_status_ok();
        let group: serde_json::Value = response.json();
        assert_eq!(group["name"], "Study");
        assert_eq!(group["admin_id"], 1);
        assert_eq!(group["members"], json!([1]));

        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users")))]
    async fn test_create_group_rejects_empty_name(pool: MySqlPool) -> sqlx::Result<()> {
        let state = create_test_state(pool);
        let server = create_test_server(state.clone());
        let token = create_test_jwt(1, "alice@example.com");

        let response = server
            .post("/groups")
            .add_header(
                HeaderName::from_static("authorization"),
                format!("Bearer {}", token),
            )
            .json(&json!({ "name": "   " }))
            .await;

        response.assert_status_bad_request();
        Ok(())
    }

    // ============================================================
    // Test per GET /groups - list_groups
    // ============================================================

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users", "groups")))]
    async fn test_list_groups_with_members(pool: MySqlPool) -> sqlx::Result<()> {
        let state = create_test_state(pool);
        let server = create_test_server(state.clone());
        let token = create_test_jwt(4, "dave@example.com");

        let response = server
            .get("/groups")
            .add_header(
                HeaderName::from_static("authorization"),
                format!("Bearer {}", token),
            )
            .await;

        response.assert_status_ok();
        let groups: Vec<serde_json::Value> = response.json();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0]["name"], "Study");
        assert_eq!(groups[0]["members"], json!([1, 2]));
        assert_eq!(groups[1]["members"], json!([3]));

        Ok(())
    }

    // ============================================================
    // Test per POST /groups/{id}/join e /leave
    // ============================================================

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users", "groups")))]
    async fn test_join_group_then_access(pool: MySqlPool) -> sqlx::Result<()> {
        let state = create_test_state(pool);
        let server = create_test_server(state.clone());
        let token = create_test_jwt(3, "charlie@example.com");

        // prima del join l'accesso al dettaglio è negato
        let response = server
            .get("/groups/1")
            .add_header(
                HeaderName::from_static("authorization"),
                format!("Bearer {}", token),
            )
            .await;
        response.assert_status_forbidden();

        let response = server
            .post("/groups/1/join")
            .add_header(
                HeaderName::from_static("authorization"),
                format!("Bearer {}", token),
            )
            .await;
        response.assert_status_ok();

        // dopo il join il dettaglio è accessibile e i membri includono Charlie
        let response = server
            .get("/groups/1")
            .add_header(
                HeaderName::from_static("authorization"),
                format!("Bearer {}", token),
            )
            .await;
        response.assert_status_ok();
        let group: serde_json::Value = response.json();
        assert_eq!(group["members"], json!([1, 2, 3]));

        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users", "groups")))]
    async fn test_join_twice_is_noop(pool: MySqlPool) -> sqlx::Result<()> {
        let state = create_test_state(pool);
        let server = create_test_server(state.clone());
        let token = create_test_jwt(3, "charlie@example.com");

        for _ in 0..2 {
            let response = server
                .post("/groups/1/join")
                .add_header(
                    HeaderName::from_static("authorization"),
                    format!("Bearer {}", token),
                )
                .await;
            response.assert_status_ok();
        }

        let response = server
            .get("/groups/1")
            .add_header(
                HeaderName::from_static("authorization"),
                format!("Bearer {}", token),
            )
            .await;
        let group: serde_json::Value = response.json();
        assert_eq!(group["members"], json!([1, 2, 3]));

        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users", "groups")))]
    async fn test_join_unknown_group(pool: MySqlPool) -> sqlx::Result<()> {
        let state = create_test_state(pool);
        let server = create_test_server(state.clone());
        let token = create_test_jwt(3, "charlie@example.com");

        let response = server
            .post("/groups/999/join")
            .add_header(
                HeaderName::from_static("authorization"),
                format!("Bearer {}", token),
            )
            .await;

        response.assert_status_not_found();
        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users", "groups")))]
    async fn test_member_can_leave_group(pool: MySqlPool) -> sqlx::Result<()> {
        let state = create_test_state(pool);
        let server = create_test_server(state.clone());
        let token = create_test_jwt(2, "bob@example.com");

        let response = server
            .post("/groups/1/leave")
            .add_header(
                HeaderName::from_static("authorization"),
                format!("Bearer {}", token),
            )
            .await;
        response.assert_status_ok();

        // dopo l'uscita Bob non è più membro
        let response = server
            .get("/groups/1")
            .add_header(
                HeaderName::from_static("authorization"),
                format!("Bearer {}", token),
            )
            .await;
        response.assert_status_forbidden();

        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users", "groups")))]
    async fn test_admin_cannot_leave_group(pool: MySqlPool) -> sqlx::Result<()> {
        let state = create_test_state(pool);
        let server = create_test_server(state.clone());
        let token = create_test_jwt(1, "alice@example.com");

        let response = server
            .post("/groups/1/leave")
            .add_header(
                HeaderName::from_static("authorization"),
                format!("Bearer {}", token),
            )
            .await;

        response.assert_status_conflict();
        Ok(())
    }

    // ============================================================
    // Test per POST/DELETE /groups/{id}/members/{user_id}
    // ============================================================

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users", "groups")))]
    async fn test_admin_can_add_member(pool: MySqlPool) -> sqlx::Result<()> {
        let state = create_test_state(pool);
        let server = create_test_server(state.clone());
        let admin_token = create_test_jwt(1, "alice@example.com");

        let response = server
            .post("/groups/1/members/4")
            .add_header(
                HeaderName::from_static("authorization"),
                format!("Bearer {}", admin_token),
            )
            .await;
        response.assert_status_ok();

        let response = server
            .get("/groups/1")
            .add_header(
                HeaderName::from_static("authorization"),
                format!("Bearer {}", admin_token),
            )
            .await;
        let group: serde_json::Value = response.json();
        assert_eq!(group["members"], json!([1, 2, 4]));

        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users", "groups")))]
    async fn test_non_admin_cannot_add_member(pool: MySqlPool) -> sqlx::Result<()> {
        let state = create_test_state(pool);
        let server = create_test_server(state.clone());
        // Bob è membro del gruppo 1 ma non admin
        let token = create_test_jwt(2, "bob@example.com");

        let response = server
            .post("/groups/1/members/4")
            .add_header(
                HeaderName::from_static("authorization"),
                format!("Bearer {}", token),
            )
            .await;

        response.assert_status_forbidden();
        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users", "groups")))]
    async fn test_add_unknown_member(pool: MySqlPool) -> sqlx::Result<()> {
        let state = create_test_state(pool);
        let server = create_test_server(state.clone());
        let admin_token = create_test_jwt(1, "alice@example.com");

        let response = server
            .post("/groups/1/members/999")
            .add_header(
                HeaderName::from_static("authorization"),
                format!("Bearer {}", admin_token),
            )
            .await;

        response.assert_status_not_found();
        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users", "groups")))]
    async fn test_admin_can_remove_member(pool: MySqlPool) -> sqlx::Result<()> {
        let state = create_test_state(pool);
        let server = create_test_server(state.clone());
        let admin_token = create_test_jwt(1, "alice@example.com");

        let response = server
            .delete("/groups/1/members/2")
            .add_header(
                HeaderName::from_static("authorization"),
                format!("Bearer {}", admin_token),
            )
            .await;
        response.assert_status_ok();

        let response = server
            .get("/groups/1")
            .add_header(
                HeaderName::from_static("authorization"),
                format!("Bearer {}", admin_token),
            )
            .await;
        let group: serde_json::Value = response.json();
        assert_eq!(group["members"], json!([1]));

        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users", "groups")))]
    async fn test_non_admin_cannot_remove_member(pool: MySqlPool) -> sqlx::Result<()> {
        let state = create_test_state(pool);
        let server = create_test_server(state.clone());
        let token = create_test_jwt(2, "bob@example.com");

        let response = server
            .delete("/groups/1/members/1")
            .add_header(
                HeaderName::from_static("authorization"),
                format!("Bearer {}", token),
            )
            .await;

        response.assert_status_forbidden();
        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users", "groups")))]
    async fn test_admin_cannot_remove_self(pool: MySqlPool) -> sqlx::Result<()> {
        let state = create_test_state(pool);
        let server = create_test_server(state.clone());
        let admin_token = create_test_jwt(1, "alice@example.com");

        let response = server
            .delete("/groups/1/members/1")
            .add_header(
                HeaderName::from_static("authorization"),
                format!("Bearer {}", admin_token),
            )
            .await;

        response.assert_status_forbidden();

        // l'admin è ancora tra i membri
        let response = server
            .get("/groups/1")
            .add_header(
                HeaderName::from_static("authorization"),
                format!("Bearer {}", admin_token),
            )
            .await;
        let group: serde_json::Value = response.json();
        assert_eq!(group["members"], json!([1, 2]));

        Ok(())
    }

    // ============================================================
    // Test per DELETE /groups/{id} - delete_group
    // ============================================================

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users", "groups")))]
    async fn test_admin_can_delete_group(pool: MySqlPool) -> sqlx::Result<()> {
        let state = create_test_state(pool);
        let server = create_test_server(state.clone());
        let admin_token = create_test_jwt(1, "alice@example.com");

        let response = server
            .delete("/groups/1")
            .add_header(
                HeaderName::from_static("authorization"),
                format!("Bearer {}", admin_token),
            )
            .await;
        response.assert_status_ok();

        // il gruppo non è più risolvibile
        let response = server
            .get("/groups/1")
            .add_header(
                HeaderName::from_static("authorization"),
                format!("Bearer {}", admin_token),
            )
            .await;
        response.assert_status_not_found();

        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users", "groups")))]
    async fn test_non_admin_cannot_delete_group(pool: MySqlPool) -> sqlx::Result<()> {
        let state = create_test_state(pool);
        let server = create_test_server(state.clone());
        let token = create_test_jwt(2, "bob@example.com");

        let response = server
            .delete("/groups/1")
            .add_header(
                HeaderName::from_static("authorization"),
                format!("Bearer {}", token),
            )
            .await;

        response.assert_status_forbidden();
        Ok(())
    }

    // ============================================================
    // Test per GET/POST /groups/{id}/messages
    // ============================================================

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users", "groups")))]
    async fn test_group_message_flow(pool: MySqlPool) -> sqlx::Result<()> {
        let state = create_test_state(pool);
        let server = create_test_server(state.clone());
        let alice_token = create_test_jwt(1, "alice@example.com");
        let bob_token = create_test_jwt(2, "bob@example.com");

        let response = server
            .post("/groups/1/messages")
            .add_header(
                HeaderName::from_static("authorization"),
                format!("Bearer {}", alice_token),
            )
            .json(&json!({ "content": "meeting at 5" }))
            .await;
        response.assert_status_ok();

        let response = server
            .get("/groups/1/messages")
            .add_header(
                HeaderName::from_static("authorization"),
                format!("Bearer {}", bob_token),
            )
            .await;
        response.assert_status_ok();
        let messages: Vec<serde_json::Value> = response.json();
        // il fixture contiene già un messaggio di Bob nel gruppo 1
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0]["content"], "see you at the library");
        assert_eq!(messages[1]["content"], "meeting at 5");
        assert_eq!(messages[1]["sender_id"], 1);

        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("users", "groups")))]
    async fn test_non_member_cannot_read_group_messages(pool: MySqlPool) -> sqlx::Result<()> {
        let state = create_test_state(pool);
        let server = create_test_server(state.clone());
        let token = create_test_jwt(4, "dave@example.com");

        let response = server
            .get("/groups/1/messages")
            .add_header(
                HeaderName::from_static("authorization"),
                format!("Bearer {}", token),
            )
            .await;

        response.assert_status_forbidden();
        Ok(())
    }
}
