//! Integration tests for GPR records and work sessions.

use assert_matches::assert_matches;
use sitedesk_core::error::CoreError;
use sitedesk_db::models::customer::CreateCustomer;
use sitedesk_db::models::gpr::{CreateGprRecord, UpdateGprRecord};
use sitedesk_db::models::project_object::CreateProjectObject;
use sitedesk_db::models::user::CreateUser;
use sitedesk_db::repositories::{
    CustomerRepo, GprRepo, ProjectObjectRepo, UserRepo, WeeklyReportRepo, WorkSessionRepo,
};
use sitedesk_db::StoreError;
use sqlx::PgPool;

async fn seed_owner(pool: &PgPool) -> (i64, i64) {
    let customer = CustomerRepo::create(
        pool,
        &CreateCustomer {
            customer_code: "C-1".to_string(),
            name: "City roads".to_string(),
            contact_info: None,
        },
    )
    .await
    .unwrap();
    let object = ProjectObjectRepo::create(
        pool,
        &CreateProjectObject {
            object_code: "OBJ-1".to_string(),
            name: "Ring road".to_string(),
            location: None,
            description: None,
        },
    )
    .await
    .unwrap();
    (customer.id, object.id)
}

async fn seed_user(pool: &PgPool) -> i64 {
    UserRepo::create(
        pool,
        &CreateUser {
            username: "worker".to_string(),
            email: None,
            password_hash: "hash".to_string(),
            full_name: None,
            position: None,
            department: None,
            is_admin: false,
        },
    )
    .await
    .unwrap()
    .id
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_gpr_derived_columns(pool: PgPool) {
    let (customer_id, object_id) = seed_owner(&pool).await;
    let record = GprRepo::create(
        &pool,
        &CreateGprRecord {
            customer_id,
            object_id,
            work_type: "hp".to_string(),
            volume_plan: 3.0,
            volume_fact: 1.0,
            daily_data: None,
        },
    )
    .await
    .unwrap();
    assert_eq!(record.volume_remainder, 2.0);
    assert_eq!(record.progress, 33.33);
    assert_eq!(record.daily_data, serde_json::json!({}));

    let updated = GprRepo::update(
        &pool,
        record.id,
        &UpdateGprRecord {
            volume_fact: Some(3.0),
            ..Default::default()
        },
    )
    .await
    .unwrap()
    .unwrap();
    assert_eq!(updated.volume_remainder, 0.0);
    assert_eq!(updated.progress, 100.0);

    assert_matches!(
        GprRepo::update(
            &pool,
            record.id,
            &UpdateGprRecord {
                volume_plan: Some(-1.0),
                ..Default::default()
            },
        )
        .await,
        Err(StoreError::Core(CoreError::Validation(_)))
    );
    assert!(GprRepo::update(&pool, 9999, &UpdateGprRecord::default()).await.unwrap().is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_weekly_report_latest_wins(pool: PgPool) {
    let week = chrono::NaiveDate::from_ymd_opt(2024, 1, 8).unwrap();
    WeeklyReportRepo::create(&pool, week, &serde_json::json!({"v": 1}), "admin")
        .await
        .unwrap();
    let second = WeeklyReportRepo::create(&pool, week, &serde_json::json!({"v": 2}), "admin")
        .await
        .unwrap();
    let latest = WeeklyReportRepo::find_latest_for_week(&pool, week).await.unwrap().unwrap();
    assert_eq!(latest.id, second.id);

    let other = chrono::NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
    assert!(WeeklyReportRepo::find_latest_for_week(&pool, other).await.unwrap().is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_single_active_work_session(pool: PgPool) {
    let user_id = seed_user(&pool).await;

    assert_matches!(
        WorkSessionRepo::end(&pool, user_id).await,
        Err(StoreError::Core(CoreError::Conflict(_)))
    );

    let session = WorkSessionRepo::start(&pool, user_id).await.unwrap();
    assert!(session.is_active);
    assert!(session.end_time.is_none());

    assert_matches!(
        WorkSessionRepo::start(&pool, user_id).await,
        Err(StoreError::Core(CoreError::Conflict(_)))
    );

    let ended = WorkSessionRepo::end(&pool, user_id).await.unwrap();
    assert_eq!(ended.id, session.id);
    assert!(!ended.is_active);
    assert!(ended.end_time.is_some());
    assert!(WorkSessionRepo::find_active(&pool, user_id).await.unwrap().is_none());

    WorkSessionRepo::start(&pool, user_id).await.unwrap();
    let sessions = WorkSessionRepo::list_for_user(&pool, user_id, 10).await.unwrap();
    assert_eq!(sessions.len(), 2);
    assert!(sessions[0].is_active);
}
