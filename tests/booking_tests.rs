use std::sync::Arc;

use booker::config::{Config, SecurityConfig};
use booker::db::Store;
use booker::services::{
    BookingError, BookingOutcome, BookingService, SeaOrmBookingService, ValidationError,
};
use chrono::{DateTime, Duration, TimeZone, Utc};

fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2030, 6, 1, 12, 0, 0).unwrap()
}

async fn setup(security: SecurityConfig) -> (Store, SeaOrmBookingService, i32, i32) {
    let store = Store::new("sqlite::memory:").await.unwrap();
    let alice = store
        .create_user("alice", "alicepass1", false, &security)
        .await
        .unwrap();
    let bob = store
        .create_user("bob", "bobpass12", false, &security)
        .await
        .unwrap();

    let config = Config {
        security,
        ..Config::default()
    };
    let service = SeaOrmBookingService::new(store.clone(), Arc::new(config));
    (store, service, alice.id, bob.id)
}

#[tokio::test]
async fn test_book_open_slot() {
    let (store, service, alice, _) = setup(SecurityConfig::default()).await;
    let now = fixed_now();
    let slot = store
        .create_appointment(now + Duration::days(1))
        .await
        .unwrap();

    let outcome = service
        .book(slot.id, alice, Some("see you"), now)
        .await
        .unwrap();
    assert_eq!(outcome, BookingOutcome::Booked);

    let stored = store.get_appointment(slot.id).await.unwrap().unwrap();
    assert_eq!(stored.user_id, Some(alice));
    assert_eq!(stored.msg_text.as_deref(), Some("see you"));
    assert_eq!(stored.book_date, now);
}

#[tokio::test]
async fn test_book_past_slot_is_rejected() {
    let (store, service, alice, _) = setup(SecurityConfig::default()).await;
    let now = fixed_now();
    let slot = store
        .create_appointment(now - Duration::hours(1))
        .await
        .unwrap();

    let outcome = service.book(slot.id, alice, None, now).await.unwrap();
    assert_eq!(outcome, BookingOutcome::InPast);

    let stored = store.get_appointment(slot.id).await.unwrap().unwrap();
    assert_eq!(stored.user_id, None);
}

#[tokio::test]
async fn test_slot_starting_now_is_not_bookable() {
    let (store, service, alice, _) = setup(SecurityConfig::default()).await;
    let now = fixed_now();
    let slot = store.create_appointment(now).await.unwrap();

    let outcome = service.book(slot.id, alice, None, now).await.unwrap();
    assert_eq!(outcome, BookingOutcome::InPast);
}

#[tokio::test]
async fn test_booked_slot_keeps_first_owner() {
    let (store, service, alice, bob) = setup(SecurityConfig::default()).await;
    let now = fixed_now();
    let slot = store
        .create_appointment(now + Duration::days(2))
        .await
        .unwrap();

    service.book(slot.id, alice, Some("first"), now).await.unwrap();
    let outcome = service.book(slot.id, bob, Some("second"), now).await.unwrap();
    assert_eq!(outcome, BookingOutcome::AlreadyBooked);

    let stored = store.get_appointment(slot.id).await.unwrap().unwrap();
    assert_eq!(stored.user_id, Some(alice));
    assert_eq!(stored.msg_text.as_deref(), Some("first"));
}

#[tokio::test]
async fn test_unknown_slot() {
    let (_, service, alice, _) = setup(SecurityConfig::default()).await;
    let result = service.book(999, alice, None, fixed_now()).await;
    assert!(matches!(result, Err(BookingError::NotFound(999))));
}

#[tokio::test]
async fn test_note_is_stored_verbatim_by_default() {
    let (store, service, alice, _) = setup(SecurityConfig::default()).await;
    let now = fixed_now();
    let slot = store
        .create_appointment(now + Duration::days(1))
        .await
        .unwrap();

    let note = "<b>bold</b> & 'quoted'";
    service.book(slot.id, alice, Some(note), now).await.unwrap();

    let stored = store.get_appointment(slot.id).await.unwrap().unwrap();
    assert_eq!(stored.msg_text.as_deref(), Some(note));
}

#[tokio::test]
async fn test_note_validation_when_enabled() {
    let security = SecurityConfig {
        validate_booking_note: true,
        ..SecurityConfig::default()
    };
    let (store, service, alice, _) = setup(security).await;
    let now = fixed_now();
    let slot = store
        .create_appointment(now + Duration::days(1))
        .await
        .unwrap();

    let result = service.book(slot.id, alice, Some("<script>"), now).await;
    assert!(matches!(
        result,
        Err(BookingError::Validation(ValidationError::InvalidCharacters { field: "Note" }))
    ));

    let stored = store.get_appointment(slot.id).await.unwrap().unwrap();
    assert_eq!(stored.user_id, None);

    let outcome = service
        .book(slot.id, alice, Some("Plain note, fine!"), now)
        .await
        .unwrap();
    assert_eq!(outcome, BookingOutcome::Booked);
}

#[tokio::test]
async fn test_home_listing_order_and_filters() {
    let (store, service, alice, bob) = setup(SecurityConfig::default()).await;
    let now = fixed_now();

    let later = store
        .create_appointment(now + Duration::days(3))
        .await
        .unwrap();
    let sooner = store
        .create_appointment(now + Duration::days(1))
        .await
        .unwrap();
    let past = store
        .create_appointment(now - Duration::days(1))
        .await
        .unwrap();
    let mine_a = store
        .create_appointment(now + Duration::days(5))
        .await
        .unwrap();
    let mine_b = store
        .create_appointment(now + Duration::days(6))
        .await
        .unwrap();
    let bobs = store
        .create_appointment(now + Duration::days(7))
        .await
        .unwrap();

    service.book(mine_a.id, alice, None, now).await.unwrap();
    service.book(mine_b.id, alice, None, now).await.unwrap();
    service.book(bobs.id, bob, None, now).await.unwrap();

    let home = service.home(alice, now).await.unwrap();

    let available: Vec<i32> = home.available.iter().map(|a| a.id).collect();
    assert_eq!(available, vec![sooner.id, later.id]);
    assert!(!available.contains(&past.id));

    let mine: Vec<i32> = home.mine.iter().map(|a| a.id).collect();
    assert_eq!(mine, vec![mine_b.id, mine_a.id]);
}

#[tokio::test]
async fn test_roster_shows_owners() {
    let (store, service, alice, _) = setup(SecurityConfig::default()).await;
    let now = fixed_now();
    let first = store
        .create_appointment(now + Duration::days(1))
        .await
        .unwrap();
    let second = store
        .create_appointment(now + Duration::days(2))
        .await
        .unwrap();
    service.book(second.id, alice, None, now).await.unwrap();

    let roster = service.roster(now).await.unwrap();
    assert_eq!(roster.len(), 2);
    assert_eq!(roster[0].id, first.id);
    assert!(roster[0].summary.ends_with("(not booked yet)"));
    assert_eq!(roster[1].owner.as_deref(), Some("alice"));
    assert!(roster[1].summary.ends_with("(booked for alice)"));
}

#[tokio::test]
async fn test_delete_appointment() {
    let (store, service, _, _) = setup(SecurityConfig::default()).await;
    let slot = store
        .create_appointment(fixed_now() + Duration::days(1))
        .await
        .unwrap();

    service.delete_appointment(slot.id).await.unwrap();
    assert!(store.get_appointment(slot.id).await.unwrap().is_none());
    assert!(matches!(
        service.delete_appointment(slot.id).await,
        Err(BookingError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_concurrent_bookings_have_one_winner() {
    let path = std::env::temp_dir().join(format!("booker-race-{}.db", uuid::Uuid::new_v4()));
    let url = format!("sqlite:{}", path.display());

    let security = SecurityConfig::default();
    let store = Store::new(&url).await.unwrap();
    let mut users = Vec::new();
    for name in ["racer1", "racer2", "racer3", "racer4"] {
        users.push(
            store
                .create_user(name, "racerpass1", false, &security)
                .await
                .unwrap()
                .id,
        );
    }

    let now = Utc::now();
    let slot = store
        .create_appointment(now + Duration::days(1))
        .await
        .unwrap();

    let service = Arc::new(SeaOrmBookingService::new(
        store.clone(),
        Arc::new(Config::default()),
    ));

    let handles: Vec<_> = users
        .iter()
        .map(|&user_id| {
            let service = service.clone();
            tokio::spawn(async move { service.book(slot.id, user_id, None, now).await })
        })
        .collect();

    let mut booked = 0;
    let mut rejected = 0;
    for handle in handles {
        match handle.await.unwrap().unwrap() {
            BookingOutcome::Booked => booked += 1,
            BookingOutcome::AlreadyBooked => rejected += 1,
            BookingOutcome::InPast => panic!("slot is in the future"),
        }
    }

    assert_eq!(booked, 1);
    assert_eq!(rejected, 3);

    let stored = store.get_appointment(slot.id).await.unwrap().unwrap();
    assert!(stored.user_id.is_some_and(|owner| users.contains(&owner)));

    drop(store);
    let _ = std::fs::remove_file(&path);
}
