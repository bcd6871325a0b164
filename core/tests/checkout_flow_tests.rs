// tests/checkout_flow_tests.rs
mod common;

use checkout_core::reconcile::reconciler::UNCONFIRMED_MESSAGE;
use checkout_core::{
  CheckoutError, CheckoutOrchestrator, GatewayReply, OrderReconciler, OrderStore, PaymentGatewayClient, PaymentStatus,
  ReconcileReport, ReconciliationQueue, Verdict,
};
use common::*;
use serial_test::serial;
use std::sync::Arc;
use uuid::Uuid;

async fn reconcile_next(harness: &mut Harness) -> ReconcileReport {
  let envelope = harness.replies.try_recv().expect("a processor reply should have been queued");
  let reconciler = OrderReconciler::new(harness.store_dyn(), clock());
  reconciler
    .reconcile_reply(envelope.order_id, &envelope.body)
    .await
    .expect("reconciliation should succeed")
}

#[tokio::test]
#[serial]
async fn test_order_is_pending_right_after_submission() {
  setup_tracing();
  let harness = Harness::new(StubTransport::approving());
  let order_id = Uuid::new_v4();

  let receipt = harness
    .orchestrator
    .submit_payment(valid_request(order_id), &checkout_core::Guest)
    .await
    .unwrap();

  assert_eq!(receipt.order_id, order_id.to_string());
  assert_eq!(receipt.status, PaymentStatus::Pending);
  assert_eq!(harness.status_of(order_id).await, PaymentStatus::Pending);
  assert_eq!(harness.transport.sent_count(), 1);

  let order = harness.store.read(order_id).await.unwrap();
  assert_eq!(order.payment_method, "credit_card");
  assert_eq!(order.shipping_address, "1 Main St, Austin, TX, 78701");
  assert_eq!(order.billing_address, order.shipping_address);
  assert!(order.user_id.is_none());
  let items = harness.store.line_items(order_id).await.unwrap();
  assert_eq!(items.len(), 1);
  assert_eq!(items[0].product_id, "sku-1001");
}

#[tokio::test]
#[serial]
async fn test_missing_required_fields_write_nothing() {
  setup_tracing();
  let cases: [(fn(&mut checkout_core::PaymentRequest), &str); 5] = [
    (|r| r.card_number = None, "cardNumber"),
    (|r| r.cvv = Some("   ".to_string()), "cvv"),
    (|r| r.amount = None, "amount"),
    (|r| r.shipping_address = None, "shippingAddress"),
    (|r| r.email = None, "email"),
  ];

  for (mutate, expected_field) in cases {
    let harness = Harness::new(StubTransport::approving());
    let mut request = valid_request(Uuid::new_v4());
    mutate(&mut request);

    let err = harness
      .orchestrator
      .submit_payment(request, &checkout_core::Guest)
      .await
      .unwrap_err();
    match err {
      CheckoutError::Validation { field, .. } => assert_eq!(field, expected_field),
      other => panic!("expected a validation error for {}, got {:?}", expected_field, other),
    }
    assert_eq!(harness.store.write_count(), 0);
    assert!(harness.store.is_empty());
    assert_eq!(harness.transport.sent_count(), 0);
  }
}

#[tokio::test]
#[serial]
async fn test_card_number_whitespace_is_stripped_before_transmission() {
  setup_tracing();
  let harness = Harness::new(StubTransport::approving());
  let order_id = Uuid::new_v4();
  let mut request = valid_request(order_id);
  request.card_number = Some("4111 1111 1111 1111".to_string());

  harness.orchestrator.submit_payment(request, &checkout_core::Guest).await.unwrap();

  let form = harness.transport.last_form().unwrap();
  assert_eq!(form.get("CardNo"), Some("4111111111111111"));
  assert_eq!(form.get("ExpMonth"), Some("09"));
  assert_eq!(form.get("ExpYear"), Some("31"));
  assert_eq!(form.get("Total"), Some("129.99"));
  assert_eq!(form.get("Postback.OrderID"), Some(order_id.to_string().as_str()));
}

#[tokio::test]
#[serial]
async fn test_expiry_in_current_month_is_accepted_and_last_month_rejected() {
  setup_tracing();
  let harness = Harness::new(StubTransport::approving());

  let mut current = valid_request(Uuid::new_v4());
  current.expiry_month = Some("10".to_string());
  current.expiry_year = Some("26".to_string());
  assert!(harness.orchestrator.submit_payment(current, &checkout_core::Guest).await.is_ok());

  let mut expired = valid_request(Uuid::new_v4());
  expired.expiry_month = Some("09".to_string());
  expired.expiry_year = Some("2026".to_string());
  let err = harness
    .orchestrator
    .submit_payment(expired, &checkout_core::Guest)
    .await
    .unwrap_err();
  assert!(err.is_validation());
  assert_eq!(harness.store.len(), 1);
}

#[tokio::test]
#[serial]
async fn test_scenario_a_json_approval_settles_paid() {
  setup_tracing();
  let mut harness = Harness::new(StubTransport::approving());
  let order_id = Uuid::new_v4();

  harness
    .orchestrator
    .submit_payment(valid_request(order_id), &checkout_core::Guest)
    .await
    .unwrap();
  let report = reconcile_next(&mut harness).await;

  assert_eq!(report.verdict, Verdict::Approved);
  assert!(report.applied());
  let order = harness.store.read(order_id).await.unwrap();
  assert_eq!(order.payment_status, PaymentStatus::Paid);
  assert_eq!(
    order.response_message.as_deref(),
    Some("Your payment has been processed successfully.")
  );
}

#[tokio::test]
#[serial]
async fn test_scenario_b_html_error_page_settles_failed_with_message() {
  setup_tracing();
  let mut harness = Harness::new(StubTransport::with_body(
    r#"<html><head><title>Error</title></head><body>Transaction refused: "Invalid card number"</body></html>"#,
  ));
  let order_id = Uuid::new_v4();

  harness
    .orchestrator
    .submit_payment(valid_request(order_id), &checkout_core::Guest)
    .await
    .unwrap();
  let report = reconcile_next(&mut harness).await;

  assert_eq!(report.verdict, Verdict::Rejected);
  let order = harness.store.read(order_id).await.unwrap();
  assert_eq!(order.payment_status, PaymentStatus::Failed);
  assert_eq!(order.response_message.as_deref(), Some("Invalid card number"));
  let blob = order.payment_processor_response.unwrap();
  assert_eq!(blob["error_message"], "Invalid card number");
}

#[tokio::test]
#[serial]
async fn test_scenario_c_delimited_decline_settles_failed() {
  setup_tracing();
  let transport = StubTransport::replying(|form| {
    Ok(GatewayReply {
      status: 200,
      body: format!(
        "Success=N;Postback.OrderID={};RespText=Card Declined",
        form.get("Postback.OrderID").unwrap_or_default()
      ),
    })
  });
  let mut harness = Harness::new(transport);
  let order_id = Uuid::new_v4();

  harness
    .orchestrator
    .submit_payment(valid_request(order_id), &checkout_core::Guest)
    .await
    .unwrap();
  let report = reconcile_next(&mut harness).await;

  assert_eq!(report.verdict, Verdict::Declined);
  let order = harness.store.read(order_id).await.unwrap();
  assert_eq!(order.payment_status, PaymentStatus::Failed);
  assert_eq!(order.response_message.as_deref(), Some("Card Declined"));
}

#[tokio::test]
#[serial]
async fn test_scenario_d_mismatched_echo_is_a_protocol_error() {
  setup_tracing();
  let stranger = Uuid::new_v4();
  let transport = StubTransport::replying(move |_| {
    Ok(GatewayReply {
      status: 200,
      body: format!(r#"{{"Success":"N","RespText":"DECLINED","Postback.OrderID":"{}"}}"#, stranger),
    })
  });
  let mut harness = Harness::new(transport);
  let order_id = Uuid::new_v4();

  harness
    .orchestrator
    .submit_payment(valid_request(order_id), &checkout_core::Guest)
    .await
    .unwrap();
  let report = reconcile_next(&mut harness).await;

  assert_eq!(report.verdict, Verdict::Mismatch);
  assert_ne!(report.verdict, Verdict::Declined);
  let order = harness.store.read(order_id).await.unwrap();
  assert_eq!(order.payment_status, PaymentStatus::Failed);
  assert_eq!(order.response_message.as_deref(), Some(UNCONFIRMED_MESSAGE));
  let blob = order.payment_processor_response.unwrap();
  assert_eq!(blob["verdict"], "mismatch");
  assert_eq!(blob["approved"], false);
  assert!(blob["raw_response"].as_str().unwrap().contains(&stranger.to_string()));
}

#[tokio::test]
#[serial]
async fn test_unreachable_gateway_still_returns_pending() {
  setup_tracing();
  let mut harness = Harness::new(StubTransport::unreachable());
  let order_id = Uuid::new_v4();

  let receipt = harness
    .orchestrator
    .submit_payment(valid_request(order_id), &checkout_core::Guest)
    .await
    .unwrap();

  assert_eq!(receipt.status, PaymentStatus::Pending);
  assert_eq!(harness.status_of(order_id).await, PaymentStatus::Pending);
  assert!(harness.replies.try_recv().is_err());
}

#[tokio::test]
#[serial]
async fn test_store_failure_aborts_before_the_gateway_call() {
  setup_tracing();
  let harness = Harness::new(StubTransport::approving());
  harness.store.set_unavailable(Some("database offline"));

  let err = harness
    .orchestrator
    .submit_payment(valid_request(Uuid::new_v4()), &checkout_core::Guest)
    .await
    .unwrap_err();

  assert!(matches!(err, CheckoutError::StoreUnavailable(_)));
  assert_eq!(harness.transport.sent_count(), 0);
}

#[tokio::test]
#[serial]
async fn test_reused_order_id_fails_at_the_store() {
  setup_tracing();
  let harness = Harness::new(StubTransport::approving());
  let order_id = Uuid::new_v4();

  harness
    .orchestrator
    .submit_payment(valid_request(order_id), &checkout_core::Guest)
    .await
    .unwrap();
  let err = harness
    .orchestrator
    .submit_payment(valid_request(order_id), &checkout_core::Guest)
    .await
    .unwrap_err();

  assert!(matches!(err, CheckoutError::DuplicateOrder(id) if id == order_id.to_string()));
  assert_eq!(harness.transport.sent_count(), 1);
}

#[tokio::test]
#[serial]
async fn test_signed_in_user_is_recorded_on_the_order() {
  setup_tracing();
  let harness = Harness::new(StubTransport::approving());
  let order_id = Uuid::new_v4();
  let user_id = Uuid::new_v4();

  harness
    .orchestrator
    .submit_payment(valid_request(order_id), &Some(user_id))
    .await
    .unwrap();

  assert_eq!(harness.store.read(order_id).await.unwrap().user_id, Some(user_id));
}

#[tokio::test]
#[serial]
async fn test_reconciliation_queue_settles_orders_in_the_background() {
  setup_tracing();
  let store = Arc::new(checkout_core::InMemoryOrderStore::new());
  let reconciler = Arc::new(OrderReconciler::new(store.clone(), clock()));
  let queue = ReconciliationQueue::start(reconciler, 8);
  let orchestrator = CheckoutOrchestrator::new(
    store.clone(),
    PaymentGatewayClient::new(StubTransport::approving(), credentials()),
    queue.sender(),
    clock(),
  );

  let order_ids: Vec<Uuid> = (0..3).map(|_| Uuid::new_v4()).collect();
  for order_id in &order_ids {
    orchestrator
      .submit_payment(valid_request(*order_id), &checkout_core::Guest)
      .await
      .unwrap();
  }
  drop(orchestrator);

  assert_eq!(queue.shutdown().await, 3);
  for order_id in order_ids {
    assert_eq!(store.read(order_id).await.unwrap().payment_status, PaymentStatus::Paid);
  }
}

#[tokio::test]
#[serial]
async fn test_full_reconciliation_queue_does_not_hold_up_submission() {
  setup_tracing();
  let mut harness = Harness::with_queue_capacity(StubTransport::approving(), 1);
  let first = Uuid::new_v4();
  let second = Uuid::new_v4();

  harness
    .orchestrator
    .submit_payment(valid_request(first), &checkout_core::Guest)
    .await
    .unwrap();

  let receipt = tokio::time::timeout(
    std::time::Duration::from_secs(2),
    harness
      .orchestrator
      .submit_payment(valid_request(second), &checkout_core::Guest),
  )
  .await
  .expect("submission should not wait for queue space")
  .unwrap();

  assert_eq!(receipt.status, PaymentStatus::Pending);
  assert_eq!(harness.status_of(second).await, PaymentStatus::Pending);
  assert_eq!(harness.transport.sent_count(), 2);
  assert_eq!(harness.replies.try_recv().unwrap().order_id, first);
  assert!(harness.replies.try_recv().is_err());
}
