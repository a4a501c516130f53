// tests/tender_bid_tests.rs

mod common;

use common::{spawn_app, spawn_app_on_file};
use serde_json::{Value, json};

#[tokio::test]
async fn end_to_end_tender_bid_flow() {
    let app = spawn_app().await;
    let admin = app.register_admin().await;
    let a = app.register("alice").await;
    let b = app.register("bob").await;

    // A creates a tender: pending and invisible to the public list.
    let tender_id = app.create_tender(&a, "Kitchen renovation").await;
    let tender: Value = app
        .get(&format!("/api/tenders/{}", tender_id), Some(&a.token))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(tender["moderation_status"], "pending");
    assert_eq!(tender["status"], "open");

    let public: Vec<Value> = app.get("/api/tenders", None).await.json().await.unwrap();
    assert!(public.iter().all(|t| t["id"].as_i64() != Some(tender_id)));

    // Admin approves: now visible.
    app.approve(&admin, "tenders", tender_id).await;
    let public: Vec<Value> = app.get("/api/tenders", None).await.json().await.unwrap();
    assert!(public.iter().any(|t| t["id"].as_i64() == Some(tender_id)));

    // B bids with one document: pending, A is notified.
    let bid_id = app.create_bid(&b, tender_id, 120000).await;
    assert_eq!(app.count_notifications(a.id, "tender_bid").await, 1);

    // A approves the bid.
    let response = app
        .post(
            &format!("/api/tenders/bids/{}/approve", bid_id),
            Some(&a.token),
            json!({}),
        )
        .await;
    assert_eq!(response.status().as_u16(), 200);
    let bid: Value = response.json().await.unwrap();
    assert_eq!(bid["status"], "approved");
    assert_eq!(bid["is_accepted"], true);

    assert_eq!(app.count_notifications(b.id, "bid_approved").await, 1);
    let notifications: Vec<Value> = app
        .get("/api/notifications", Some(&b.token))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0]["type"], "bid_approved");
    assert_eq!(notifications[0]["related_id"].as_i64(), Some(bid_id));
}

#[tokio::test]
async fn owner_cannot_bid_on_own_tender() {
    let app = spawn_app().await;
    let owner = app.register("owner").await;
    let tender_id = app.create_tender(&owner, "Fence").await;

    let response = app
        .post(
            &format!("/api/tenders/{}/bids", tender_id),
            Some(&owner.token),
            json!({
                "amount": 1000,
                "description": "Self bid",
                "timeframe": 3,
                "documents": ["doc.pdf"]
            }),
        )
        .await;

    assert_eq!(response.status().as_u16(), 403);
}

#[tokio::test]
async fn bid_without_documents_is_rejected() {
    let app = spawn_app().await;
    let owner = app.register("owner").await;
    let bidder = app.register("bidder").await;
    let tender_id = app.create_tender(&owner, "Plumbing").await;

    for body in [
        json!({ "amount": 1000, "description": "No docs", "timeframe": 3, "documents": [] }),
        json!({ "amount": 1000, "description": "Missing docs", "timeframe": 3 }),
    ] {
        let response = app
            .post(
                &format!("/api/tenders/{}/bids", tender_id),
                Some(&bidder.token),
                body,
            )
            .await;
        assert_eq!(response.status().as_u16(), 400);
    }

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tender_bids")
        .fetch_one(&app.pool)
        .await
        .unwrap();
    assert_eq!(count, 0);
    assert_eq!(app.count_notifications(owner.id, "tender_bid").await, 0);
}

#[tokio::test]
async fn bid_on_missing_tender_is_404() {
    let app = spawn_app().await;
    let bidder = app.register("bidder").await;

    let response = app
        .post(
            "/api/tenders/424242/bids",
            Some(&bidder.token),
            json!({ "amount": 10, "description": "x", "timeframe": 1, "documents": ["a.pdf"] }),
        )
        .await;

    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn reject_with_reason_notifies_bidder() {
    let app = spawn_app().await;
    let owner = app.register("owner").await;
    let bidder = app.register("bidder").await;
    let tender_id = app.create_tender(&owner, "Tiling").await;
    let bid_id = app.create_bid(&bidder, tender_id, 5000).await;

    let response = app
        .post(
            &format!("/api/tenders/bids/{}/reject", bid_id),
            Some(&owner.token),
            json!({ "reason": "Budget too high" }),
        )
        .await;
    assert_eq!(response.status().as_u16(), 200);
    let bid: Value = response.json().await.unwrap();
    assert_eq!(bid["status"], "rejected");
    assert_eq!(bid["rejection_reason"], "Budget too high");

    let message: String = sqlx::query_scalar(
        "SELECT message FROM notifications WHERE user_id = ? AND type = 'bid_rejected'",
    )
    .bind(bidder.id)
    .fetch_one(&app.pool)
    .await
    .unwrap();
    assert!(message.contains("Budget too high"));
}

#[tokio::test]
async fn reject_without_body_is_allowed() {
    let app = spawn_app().await;
    let owner = app.register("owner").await;
    let bidder = app.register("bidder").await;
    let tender_id = app.create_tender(&owner, "Painting").await;
    let bid_id = app.create_bid(&bidder, tender_id, 700).await;

    let response = app
        .client
        .post(app.url(&format!("/api/tenders/bids/{}/reject", bid_id)))
        .bearer_auth(&owner.token)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 200);
    let bid: Value = response.json().await.unwrap();
    assert_eq!(bid["status"], "rejected");
    assert!(bid["rejection_reason"].is_null());
}

#[tokio::test]
async fn decided_bids_are_final() {
    let app = spawn_app().await;
    let owner = app.register("owner").await;
    let bidder = app.register("bidder").await;
    let tender_id = app.create_tender(&owner, "Windows").await;
    let bid_id = app.create_bid(&bidder, tender_id, 900).await;

    let approve = format!("/api/tenders/bids/{}/approve", bid_id);
    let reject = format!("/api/tenders/bids/{}/reject", bid_id);

    assert_eq!(
        app.post(&approve, Some(&owner.token), json!({})).await.status().as_u16(),
        200
    );
    assert_eq!(
        app.post(&approve, Some(&owner.token), json!({})).await.status().as_u16(),
        409
    );
    assert_eq!(
        app.post(&reject, Some(&owner.token), json!({ "reason": "changed my mind" }))
            .await
            .status()
            .as_u16(),
        409
    );

    assert_eq!(app.count_notifications(bidder.id, "bid_approved").await, 1);
    assert_eq!(app.count_notifications(bidder.id, "bid_rejected").await, 0);
}

#[tokio::test]
async fn concurrent_decisions_on_one_bid_conflict() {
    let app = spawn_app_on_file().await;
    let owner = app.register("owner").await;
    let bidder = app.register("bidder").await;
    let tender_id = app.create_tender(&owner, "Facade").await;

    for _ in 0..5 {
        let bid_id = app.create_bid(&bidder, tender_id, 700).await;
        let approve = format!("/api/tenders/bids/{}/approve", bid_id);
        let reject = format!("/api/tenders/bids/{}/reject", bid_id);

        let (first, second) = tokio::join!(
            app.post(&approve, Some(&owner.token), json!({})),
            app.post(&reject, Some(&owner.token), json!({ "reason": "too slow" })),
        );
        let mut statuses = [first.status().as_u16(), second.status().as_u16()];
        statuses.sort();
        assert!(
            statuses == [200, 409],
            "unexpected statuses {:?} for bid {}",
            statuses,
            bid_id
        );

        if first.status().as_u16() == 200 {
            // This bid won; later approvals must conflict, so stop here.
            break;
        }
    }

    let decided = app.count_notifications(bidder.id, "bid_approved").await
        + app.count_notifications(bidder.id, "bid_rejected").await;
    let decided_bids: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM tender_bids WHERE status != 'pending'")
            .fetch_one(&app.pool)
            .await
            .unwrap();
    assert_eq!(decided, decided_bids);
}

#[tokio::test]
async fn only_one_bid_can_be_approved() {
    let app = spawn_app().await;
    let owner = app.register("owner").await;
    let first = app.register("first").await;
    let second = app.register("second").await;
    let tender_id = app.create_tender(&owner, "Flooring").await;
    let first_bid = app.create_bid(&first, tender_id, 100).await;
    let second_bid = app.create_bid(&second, tender_id, 200).await;

    let ok = app
        .post(
            &format!("/api/tenders/bids/{}/approve", first_bid),
            Some(&owner.token),
            json!({}),
        )
        .await;
    assert_eq!(ok.status().as_u16(), 200);

    let conflict = app
        .post(
            &format!("/api/tenders/bids/{}/approve", second_bid),
            Some(&owner.token),
            json!({}),
        )
        .await;
    assert_eq!(conflict.status().as_u16(), 409);
}

#[tokio::test]
async fn only_tender_owner_decides() {
    let app = spawn_app().await;
    let owner = app.register("owner").await;
    let bidder = app.register("bidder").await;
    let stranger = app.register("stranger").await;
    let tender_id = app.create_tender(&owner, "Doors").await;
    let bid_id = app.create_bid(&bidder, tender_id, 300).await;

    let response = app
        .post(
            &format!("/api/tenders/bids/{}/approve", bid_id),
            Some(&stranger.token),
            json!({}),
        )
        .await;
    assert_eq!(response.status().as_u16(), 403);

    let response = app
        .post("/api/tenders/bids/999999/approve", Some(&owner.token), json!({}))
        .await;
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn non_owner_sees_only_own_bids() {
    let app = spawn_app().await;
    let owner = app.register("owner").await;
    let b1 = app.register("b1").await;
    let b2 = app.register("b2").await;
    let tender_id = app.create_tender(&owner, "Facade").await;
    app.create_bid(&b1, tender_id, 100).await;
    app.create_bid(&b2, tender_id, 200).await;

    let path = format!("/api/tenders/{}/bids", tender_id);

    let mine: Vec<Value> = app.get(&path, Some(&b1.token)).await.json().await.unwrap();
    assert_eq!(mine.len(), 1);
    assert!(mine.iter().all(|b| b["user_id"].as_i64() == Some(b1.id)));

    let all: Vec<Value> = app.get(&path, Some(&owner.token)).await.json().await.unwrap();
    assert_eq!(all.len(), 2);

    let my_bids: Vec<Value> = app
        .get("/api/tenders/bids/my", Some(&b2.token))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(my_bids.len(), 1);
    assert_eq!(my_bids[0]["tender_title"], "Facade");
}

#[tokio::test]
async fn tender_filters_and_owner_view() {
    let app = spawn_app().await;
    let admin = app.register_admin().await;
    let owner = app.register("owner").await;
    let approved = app.create_tender(&owner, "Approved roof").await;
    let _pending = app.create_tender(&owner, "Pending roof").await;
    app.approve(&admin, "tenders", approved).await;

    // Public list ignores show_all from non-admins.
    let list: Vec<Value> = app
        .get("/api/tenders?show_all=true", Some(&owner.token))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(list.len(), 1);

    // Owner filtering by their own id sees everything they own.
    let mine: Vec<Value> = app
        .get(&format!("/api/tenders?user_id={}", owner.id), Some(&owner.token))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(mine.len(), 2);

    // Admin with showAll sees everything.
    let all: Vec<Value> = app
        .get("/api/tenders?showAll=true", Some(&admin.token))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(all.len(), 2);

    let search: Vec<Value> = app
        .get("/api/tenders?search=Approved&min_budget=1000", None)
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(search.len(), 1);
}

#[tokio::test]
async fn pending_tender_is_hidden_from_strangers() {
    let app = spawn_app().await;
    let owner = app.register("owner").await;
    let stranger = app.register("stranger").await;
    let tender_id = app.create_tender(&owner, "Hidden").await;

    let path = format!("/api/tenders/{}", tender_id);
    assert_eq!(app.get(&path, None).await.status().as_u16(), 404);
    assert_eq!(app.get(&path, Some(&stranger.token)).await.status().as_u16(), 404);
    assert_eq!(app.get(&path, Some(&owner.token)).await.status().as_u16(), 200);
}

#[tokio::test]
async fn update_and_delete_tender() {
    let app = spawn_app().await;
    let owner = app.register("owner").await;
    let bidder = app.register("bidder").await;
    let tender_id = app.create_tender(&owner, "Garage").await;
    app.create_bid(&bidder, tender_id, 50).await;

    let path = format!("/api/tenders/{}", tender_id);

    let forbidden = app.put(&path, Some(&bidder.token), json!({ "title": "Mine now" })).await;
    assert_eq!(forbidden.status().as_u16(), 403);

    let updated: Value = app
        .put(&path, Some(&owner.token), json!({ "title": "Garage roof", "status": "in_progress" }))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(updated["title"], "Garage roof");
    assert_eq!(updated["status"], "in_progress");
    assert_eq!(updated["moderation_status"], "pending");

    assert_eq!(app.delete(&path, Some(&owner.token)).await.status().as_u16(), 204);
    assert_eq!(app.get(&path, Some(&owner.token)).await.status().as_u16(), 404);

    let bids: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tender_bids WHERE tender_id = ?")
        .bind(tender_id)
        .fetch_one(&app.pool)
        .await
        .unwrap();
    assert_eq!(bids, 0);
}
