use chrono::NaiveDate;
use rust_decimal::Decimal;
use tempfile::TempDir;
use tokio::net::TcpListener;

use eventhub_server::client::purchase::{CardDetails, PayerDetails, PurchaseFlow, PurchaseStep};
use eventhub_server::client::{ApiClient, ErrorKind};
use eventhub_server::config::Config;
use eventhub_server::models::{EventInput, PageParams, ProfileUpdate};
use eventhub_server::routes::create_routes;
use eventhub_server::state::AppState;

async fn spawn_server() -> (String, TempDir) {
    let uploads = TempDir::new().unwrap();
    let app = create_routes(AppState::in_memory(Config::for_testing(uploads.path())));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{addr}"), uploads)
}

fn demo_event() -> EventInput {
    EventInput {
        title: "Demo".into(),
        description: "An evening of demos".into(),
        organized_by: Some("Demo Club".into()),
        event_date: NaiveDate::from_ymd_opt(2030, 1, 1),
        event_time: Some("18:00".into()),
        location: Some("Hall A".into()),
        ticket_price: Some(Decimal::new(1500, 2)),
    }
}

#[tokio::test]
async fn test_purchase_lands_in_wallet() {
    let (base_url, _uploads) = spawn_server().await;
    let client = ApiClient::new(base_url).unwrap();

    client
        .register("Alice", "alice@x.com", "password123")
        .await
        .unwrap();
    let session = client.login("alice@x.com", "password123").await.unwrap();
    assert_eq!(session.profile().name, "Alice");

    let event = client.create_event(&session, &demo_event()).await.unwrap();
    let liked = client.like_event(event.id).await.unwrap();
    assert_eq!(liked.likes, 1);

    let mut flow = PurchaseFlow::start(event.clone(), session.profile().clone());
    flow.review_order().unwrap();
    flow.accept_terms(true).unwrap();
    flow.proceed_to_payment().unwrap();

    let payer = PayerDetails {
        name: "Alice".into(),
        email: "alice@x.com".into(),
        contact_no: "5550100123".into(),
    };
    let card = CardDetails {
        name_on_card: "ALICE".into(),
        card_number: "4242424242424242".into(),
        expiry_date: "12/30".into(),
        cvv: "123".into(),
    };
    let ticket = client
        .purchase(&session, &mut flow, &payer, &card)
        .await
        .unwrap();
    assert_eq!(flow.step(), PurchaseStep::Issued);
    assert_eq!(ticket.details.event_name, "Demo");
    assert_eq!(ticket.details.ticket_price, Decimal::new(1500, 2));

    let wallet = client.wallet(&session).await.unwrap();
    assert_eq!(wallet.len(), 1);
    assert_eq!(wallet[0].id, ticket.id);

    let page = client.list_events(PageParams::default()).await.unwrap();
    assert_eq!(page.total, 1);
}

#[tokio::test]
async fn test_session_lifecycle() {
    let (base_url, _uploads) = spawn_server().await;
    let client = ApiClient::new(base_url).unwrap();

    client
        .register("Alice", "alice@x.com", "password123")
        .await
        .unwrap();

    let err = client
        .login("alice@x.com", "wrong-password")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Auth);
    let err = client.login("nobody@x.com", "password123").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    let mut session = client.login("alice@x.com", "password123").await.unwrap();
    let update = ProfileUpdate {
        name: Some("Alice Smith".into()),
        email: None,
    };
    client.update_profile(&mut session, &update).await.unwrap();
    assert_eq!(session.profile().name, "Alice Smith");

    let resumed = client
        .resume(session.token().to_string())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(resumed.user_id(), session.user_id());
    assert!(client.resume("garbage".into()).await.unwrap().is_none());

    client.logout(session).await.unwrap();
}

#[tokio::test]
async fn test_foreign_event_cannot_be_deleted() {
    let (base_url, _uploads) = spawn_server().await;
    let client = ApiClient::new(base_url).unwrap();

    client.register("Alice", "alice@x.com", "password123").await.unwrap();
    client.register("Bob", "bob@x.com", "password123").await.unwrap();
    let alice = client.login("alice@x.com", "password123").await.unwrap();
    let bob = client.login("bob@x.com", "password123").await.unwrap();

    let event = client
        .create_event_with_image(&alice, &demo_event(), "poster.png", b"png-bytes".to_vec())
        .await
        .unwrap();
    assert!(event.image.starts_with("/uploads/"));

    let err = client.delete_event(&bob, event.id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);

    client.delete_event(&alice, event.id).await.unwrap();
    let err = client.get_event(event.id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}
