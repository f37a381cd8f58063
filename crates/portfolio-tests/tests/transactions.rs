//! Transaction ledger integration tests: recording, inventory rules,
//! summaries, listing and the delete escape hatch.

use portfolio_client::{CreateTransactionRequest, Error, TransactionType};
use portfolio_tests::{create_test_client, unique_symbol};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn buy(symbol: &str, price: Decimal, quantity: i64) -> CreateTransactionRequest {
    CreateTransactionRequest {
        symbol: symbol.to_string(),
        transaction_type: TransactionType::Buy,
        price,
        quantity,
        transaction_date: None,
    }
}

fn sell(symbol: &str, price: Decimal, quantity: i64) -> CreateTransactionRequest {
    CreateTransactionRequest {
        symbol: symbol.to_string(),
        transaction_type: TransactionType::Sell,
        price,
        quantity,
        transaction_date: None,
    }
}

#[tokio::test]
async fn test_buy_creates_position_and_returns_transaction() {
    let client = create_test_client().expect("Failed to create client");
    let symbol = unique_symbol("TBUY");

    let tx = client
        .create_transaction(&buy(&symbol, dec!(100), 10))
        .await
        .expect("Failed to record buy");

    assert_eq!(tx.symbol, symbol);
    assert_eq!(tx.transaction_type, TransactionType::Buy);
    assert_eq!(tx.price, dec!(100));
    assert_eq!(tx.quantity, 10);
    assert!(tx.id > 0);

    let position = client
        .get_position(&symbol)
        .await
        .expect("Position should exist after first buy");
    assert_eq!(position.quantity, 10);
    assert_eq!(position.average_cost, dec!(100));
}

#[tokio::test]
async fn test_repeated_buys_weighted_average() {
    let client = create_test_client().expect("Failed to create client");
    let symbol = unique_symbol("TAVG");

    client
        .create_transaction(&buy(&symbol, dec!(100), 10))
        .await
        .expect("first buy");
    client
        .create_transaction(&buy(&symbol, dec!(150), 5))
        .await
        .expect("second buy");

    let position = client.get_position(&symbol).await.expect("position");
    assert_eq!(position.quantity, 15);
    assert_eq!(position.average_cost.round_dp(2), dec!(116.67));
}

#[tokio::test]
async fn test_sell_decrements_quantity_keeps_average() {
    let client = create_test_client().expect("Failed to create client");
    let symbol = unique_symbol("TSEL");

    client
        .create_transaction(&buy(&symbol, dec!(100), 10))
        .await
        .expect("buy");
    client
        .create_transaction(&sell(&symbol, dec!(110), 5))
        .await
        .expect("sell");

    let position = client.get_position(&symbol).await.expect("position");
    assert_eq!(position.quantity, 5);
    assert_eq!(position.average_cost, dec!(100));
}

#[tokio::test]
async fn test_oversell_rejected_with_available_quantity() {
    let client = create_test_client().expect("Failed to create client");
    let symbol = unique_symbol("TOVR");

    client
        .create_transaction(&buy(&symbol, dec!(100), 3))
        .await
        .expect("buy");

    let err = client
        .create_transaction(&sell(&symbol, dec!(110), 10))
        .await
        .expect_err("oversell must fail");

    match &err {
        Error::Api { status, message } => {
            assert_eq!(*status, 400);
            assert!(message.contains("Only 3 shares available"), "got: {message}");
        }
        other => panic!("unexpected error: {other:?}"),
    }

    // The failed sell must not have mutated the position.
    let position = client.get_position(&symbol).await.expect("position");
    assert_eq!(position.quantity, 3);
}

#[tokio::test]
async fn test_sell_without_position_rejected() {
    let client = create_test_client().expect("Failed to create client");
    let symbol = unique_symbol("TNOP");

    let err = client
        .create_transaction(&sell(&symbol, dec!(50), 5))
        .await
        .expect_err("sell with no position must fail");

    match &err {
        Error::Api { status, message } => {
            assert_eq!(*status, 400);
            assert!(message.contains("No portfolio found"), "got: {message}");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_non_positive_price_rejected() {
    let client = create_test_client().expect("Failed to create client");
    let symbol = unique_symbol("TVAL");

    let err = client
        .create_transaction(&buy(&symbol, dec!(0), 5))
        .await
        .expect_err("zero price must fail");

    match &err {
        Error::Api { status, .. } => assert_eq!(*status, 422),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_non_positive_quantity_rejected() {
    let client = create_test_client().expect("Failed to create client");
    let symbol = unique_symbol("TQTY");

    let err = client
        .create_transaction(&buy(&symbol, dec!(10), 0))
        .await
        .expect_err("zero quantity must fail");

    match &err {
        Error::Api { status, .. } => assert_eq!(*status, 422),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_summary_totals_and_average() {
    let client = create_test_client().expect("Failed to create client");
    let symbol = unique_symbol("TSUM");

    client
        .create_transaction(&buy(&symbol, dec!(100), 10))
        .await
        .expect("buy one");
    client
        .create_transaction(&buy(&symbol, dec!(150), 5))
        .await
        .expect("buy two");
    client
        .create_transaction(&sell(&symbol, dec!(170), 4))
        .await
        .expect("sell");

    let summary = client
        .get_transaction_summary(&symbol)
        .await
        .expect("summary");

    assert_eq!(summary.total_bought, 15);
    assert_eq!(summary.total_sold, 4);
    assert_eq!(summary.current_quantity, 11);
    assert_eq!(summary.average_buy_price.round_dp(2), dec!(116.67));
    assert_eq!(summary.total_transactions, 3);

    // Summary is a pure read: a second call returns the same numbers.
    let again = client
        .get_transaction_summary(&symbol)
        .await
        .expect("summary again");
    assert_eq!(again.current_quantity, summary.current_quantity);
    assert_eq!(again.average_buy_price, summary.average_buy_price);
}

#[tokio::test]
async fn test_summary_unknown_symbol_not_found() {
    let client = create_test_client().expect("Failed to create client");
    let symbol = unique_symbol("TMISS");

    let err = client
        .get_transaction_summary(&symbol)
        .await
        .expect_err("summary for unseen symbol must 404");

    assert!(matches!(err, Error::NotFound(_)));
}

#[tokio::test]
async fn test_list_filters_and_order() {
    let client = create_test_client().expect("Failed to create client");
    let symbol = unique_symbol("TLST");

    client
        .create_transaction(&buy(&symbol, dec!(100), 10))
        .await
        .expect("buy");
    client
        .create_transaction(&sell(&symbol, dec!(120), 2))
        .await
        .expect("sell");

    let all = client
        .list_transactions(Some(&symbol), None, None)
        .await
        .expect("list");
    assert_eq!(all.len(), 2);
    // Newest first.
    assert!(all[0].transaction_date >= all[1].transaction_date);
    assert_eq!(all[0].transaction_type, TransactionType::Sell);

    let buys = client
        .list_transactions(Some(&symbol), Some(TransactionType::Buy), None)
        .await
        .expect("list buys");
    assert_eq!(buys.len(), 1);
    assert_eq!(buys[0].transaction_type, TransactionType::Buy);
}

#[tokio::test]
async fn test_list_limit_out_of_range_rejected() {
    let client = create_test_client().expect("Failed to create client");

    let err = client
        .list_transactions(None, None, Some(0))
        .await
        .expect_err("limit 0 must fail");
    match &err {
        Error::Api { status, .. } => assert_eq!(*status, 422),
        other => panic!("unexpected error: {other:?}"),
    }

    let err = client
        .list_transactions(None, None, Some(501))
        .await
        .expect_err("limit 501 must fail");
    match &err {
        Error::Api { status, .. } => assert_eq!(*status, 422),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_get_transaction_by_id() {
    let client = create_test_client().expect("Failed to create client");
    let symbol = unique_symbol("TGET");

    let created = client
        .create_transaction(&buy(&symbol, dec!(42), 7))
        .await
        .expect("buy");

    let fetched = client
        .get_transaction(created.id)
        .await
        .expect("get by id");
    assert_eq!(fetched.id, created.id);
    assert_eq!(fetched.symbol, symbol);
    assert_eq!(fetched.quantity, 7);
}

#[tokio::test]
async fn test_delete_transaction_leaves_position_untouched() {
    let client = create_test_client().expect("Failed to create client");
    let symbol = unique_symbol("TDEL");

    let tx = client
        .create_transaction(&buy(&symbol, dec!(100), 10))
        .await
        .expect("buy");

    client
        .delete_transaction(tx.id)
        .await
        .expect("delete should succeed");

    // The transaction log no longer knows the symbol...
    let err = client
        .get_transaction_summary(&symbol)
        .await
        .expect_err("summary should 404 after delete");
    assert!(matches!(err, Error::NotFound(_)));

    // ...but the position still carries the stale aggregate. This drift is
    // the documented behavior of the delete escape hatch.
    let position = client.get_position(&symbol).await.expect("position");
    assert_eq!(position.quantity, 10);
    assert_eq!(position.average_cost, dec!(100));
}

#[tokio::test]
async fn test_delete_unknown_transaction_not_found() {
    let client = create_test_client().expect("Failed to create client");

    let err = client
        .delete_transaction(i64::MAX)
        .await
        .expect_err("deleting a missing id must 404");
    assert!(matches!(err, Error::NotFound(_)));
}
