// tests/moderation_tests.rs

mod common;

use common::spawn_app;
use serde_json::{Value, json};

#[tokio::test]
async fn listing_images_round_trip() {
    let app = spawn_app().await;
    let seller = app.register("seller").await;

    let response = app
        .post(
            "/api/marketplace",
            Some(&seller.token),
            json!({
                "title": "Concrete mixer",
                "description": "Barely used, 180 l",
                "category": "equipment",
                "price": 90000,
                "listing_type": "rent",
                "location": "Shymkent",
                "images": ["a.png", "b.png"]
            }),
        )
        .await;
    assert_eq!(response.status().as_u16(), 201);
    let created: Value = response.json().await.unwrap();
    let id = created["id"].as_i64().unwrap();

    let fetched: Value = app
        .get(&format!("/api/marketplace/{}", id), Some(&seller.token))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(fetched["images"], json!(["a.png", "b.png"]));

    // Legacy rows may hold doubly encoded JSON; reads still produce a flat array.
    sqlx::query("UPDATE marketplace_listings SET images = ? WHERE id = ?")
        .bind(r#""[\"a.png\",\"b.png\"]""#)
        .bind(id)
        .execute(&app.pool)
        .await
        .unwrap();
    let fetched: Value = app
        .get(&format!("/api/marketplace/{}", id), Some(&seller.token))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(fetched["images"], json!(["a.png", "b.png"]));
}

#[tokio::test]
async fn unapproved_listings_stay_out_of_public_results() {
    let app = spawn_app().await;
    let admin = app.register_admin().await;
    let seller = app.register("seller").await;

    let mut ids = Vec::new();
    for title in ["Bricks", "Scaffolding", "Drill"] {
        let body: Value = app
            .post(
                "/api/marketplace",
                Some(&seller.token),
                json!({
                    "title": title,
                    "description": "For sale",
                    "category": "materials",
                    "price": 100,
                    "listing_type": "sell",
                    "location": "Almaty"
                }),
            )
            .await
            .json()
            .await
            .unwrap();
        ids.push(body["id"].as_i64().unwrap());
    }

    app.approve(&admin, "marketplace", ids[0]).await;
    let response = app
        .post(
            &format!("/api/admin/moderation/marketplace/{}/reject", ids[1]),
            Some(&admin.token),
            json!({ "comment": "Duplicate ad" }),
        )
        .await;
    assert_eq!(response.status().as_u16(), 200);
    let outcome: Value = response.json().await.unwrap();
    assert_eq!(outcome["moderation_status"], "rejected");
    assert_eq!(outcome["moderation_comment"], "Duplicate ad");
    assert_eq!(outcome["moderated_by"].as_i64(), Some(admin.id));

    let public: Vec<Value> = app.get("/api/marketplace", None).await.json().await.unwrap();
    assert_eq!(public.len(), 1);
    assert!(public.iter().all(|l| l["moderation_status"] == "approved"));

    let ignored: Vec<Value> = app
        .get("/api/marketplace?showAll=true", Some(&seller.token))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(ignored.len(), 1);

    let all: Vec<Value> = app
        .get("/api/marketplace?showAll=true", Some(&admin.token))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(all.len(), 3);

    let queue: Vec<Value> = app
        .get("/api/admin/moderation/marketplace", Some(&admin.token))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(queue.len(), 1);
    assert_eq!(queue[0]["id"].as_i64(), Some(ids[2]));
}

#[tokio::test]
async fn moderation_of_missing_entity_is_404() {
    let app = spawn_app().await;
    let admin = app.register_admin().await;

    let response = app
        .post("/api/admin/moderation/crews/777/approve", Some(&admin.token), json!({}))
        .await;
    assert_eq!(response.status().as_u16(), 404);

    let response = app
        .post("/api/admin/moderation/widgets/1/approve", Some(&admin.token), json!({}))
        .await;
    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn non_admin_cannot_moderate() {
    let app = spawn_app().await;
    let owner = app.register("owner").await;
    let tender_id = app.create_tender(&owner, "Self approval").await;

    let response = app
        .post(
            &format!("/api/admin/moderation/tenders/{}/approve", tender_id),
            Some(&owner.token),
            json!({}),
        )
        .await;
    assert_eq!(response.status().as_u16(), 403);
}

#[tokio::test]
async fn specialist_directory_flow() {
    let app = spawn_app().await;
    let admin = app.register_admin().await;
    let pro = app.register("pro").await;

    let response = app
        .post(
            "/api/specialists",
            Some(&pro.token),
            json!({
                "name": "Daniyar Electric",
                "specializations": ["electrician", "lighting"],
                "experience_years": 8,
                "description": "Wiring and panels",
                "location": "Almaty",
                "hourly_rate": 5000
            }),
        )
        .await;
    assert_eq!(response.status().as_u16(), 201);
    let created: Value = response.json().await.unwrap();
    let id = created["id"].as_i64().unwrap();
    assert_eq!(created["moderation_status"], "pending");

    let public: Vec<Value> = app.get("/api/specialists", None).await.json().await.unwrap();
    assert!(public.is_empty());

    app.approve(&admin, "specialists", id).await;

    let by_skill: Vec<Value> = app
        .get("/api/specialists?specialization=lighting", None)
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(by_skill.len(), 1);
    assert_eq!(by_skill[0]["specializations"], json!(["electrician", "lighting"]));

    let other_skill: Vec<Value> = app
        .get("/api/specialists?specialization=light", None)
        .await
        .json()
        .await
        .unwrap();
    assert!(other_skill.is_empty());

    // Edits keep the moderation state.
    let updated: Value = app
        .put(
            &format!("/api/specialists/{}", id),
            Some(&pro.token),
            json!({ "hourly_rate": 6000 }),
        )
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(updated["hourly_rate"].as_i64(), Some(6000));
    assert_eq!(updated["moderation_status"], "approved");

    assert_eq!(
        app.delete(&format!("/api/specialists/{}", id), Some(&pro.token))
            .await
            .status()
            .as_u16(),
        204
    );
}

#[tokio::test]
async fn crew_crud_and_visibility() {
    let app = spawn_app().await;
    let lead = app.register("lead").await;
    let stranger = app.register("stranger").await;

    let response = app
        .post(
            "/api/crews",
            Some(&lead.token),
            json!({
                "name": "Roof Masters",
                "specializations": ["roofing"],
                "members_count": 5,
                "description": "Metal and soft roofs",
                "location": "Karaganda"
            }),
        )
        .await;
    assert_eq!(response.status().as_u16(), 201);
    let crew: Value = response.json().await.unwrap();
    let path = format!("/api/crews/{}", crew["id"].as_i64().unwrap());

    assert_eq!(app.get(&path, Some(&stranger.token)).await.status().as_u16(), 404);
    assert_eq!(app.get(&path, Some(&lead.token)).await.status().as_u16(), 200);

    let mine: Vec<Value> = app
        .get(&format!("/api/crews?user_id={}", lead.id), Some(&lead.token))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(mine.len(), 1);

    let forbidden = app.put(&path, Some(&stranger.token), json!({ "members_count": 2 })).await;
    assert_eq!(forbidden.status().as_u16(), 403);

    let missing_skills = app
        .post(
            "/api/crews",
            Some(&lead.token),
            json!({
                "name": "Nobody",
                "specializations": [],
                "members_count": 1,
                "description": "x",
                "location": "y"
            }),
        )
        .await;
    assert_eq!(missing_skills.status().as_u16(), 400);
}
