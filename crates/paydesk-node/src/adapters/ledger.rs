//! Ledger that appends rows through a sheet webhook.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use paydesk_tracker::{FreeSaleRow, LedgerPort, ProductSaleRow};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, error};

const TIMESTAMP_FORMAT: &str = "%d.%m.%Y %H:%M:%S";

/// Sheet a row is appended to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Sheet {
    FreeSales,
    ProductSales,
}

/// Body posted to the webhook: one row of cell values in column order.
#[derive(Debug, Serialize)]
struct AppendRow {
    sheet: Sheet,
    values: Vec<Value>,
}

/// Appends sales to a spreadsheet through an HTTP endpoint.
#[derive(Clone)]
pub struct WebhookLedger {
    client: reqwest::Client,
    url: String,
}

impl WebhookLedger {
    pub fn new(url: impl Into<String>, timeout: Duration) -> reqwest::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    async fn post(&self, body: AppendRow) -> bool {
        let sheet = body.sheet;
        match self.client.post(&self.url).json(&body).send().await {
            Ok(response) if response.status().is_success() => {
                debug!(sheet = ?sheet, "Ledger row appended");
                true
            }
            Ok(response) => {
                error!(sheet = ?sheet, status = %response.status(), "Ledger rejected row");
                false
            }
            Err(e) => {
                error!(sheet = ?sheet, error = %e, "Ledger write failed");
                false
            }
        }
    }
}

fn cell_amount(amount: Decimal) -> Value {
    amount
        .to_f64()
        .map(Value::from)
        .unwrap_or_else(|| Value::from(amount.to_string()))
}

fn cell_timestamp(timestamp: DateTime<Utc>) -> Value {
    Value::from(timestamp.format(TIMESTAMP_FORMAT).to_string())
}

fn free_sale_values(row: &FreeSaleRow) -> Vec<Value> {
    vec![
        json!(row.service_name),
        json!(row.client_login),
        json!(row.comment),
        cell_amount(row.amount),
        json!(row.manager),
        json!(row.order_id.to_string()),
        cell_timestamp(row.timestamp),
    ]
}

fn product_sale_values(row: &ProductSaleRow) -> Vec<Value> {
    vec![
        json!(row.game_title),
        json!(row.console),
        json!(row.slot),
        json!(row.account_login),
        json!(row.comment),
        cell_amount(row.amount),
        json!(row.manager),
        json!(row.order_id.to_string()),
        cell_timestamp(row.timestamp),
    ]
}

#[async_trait]
impl LedgerPort for WebhookLedger {
    async fn append_free_sale(&self, row: &FreeSaleRow) -> bool {
        self.post(AppendRow {
            sheet: Sheet::FreeSales,
            values: free_sale_values(row),
        })
        .await
    }

    async fn append_product_sale(&self, row: &ProductSaleRow) -> bool {
        self.post(AppendRow {
            sheet: Sheet::ProductSales,
            values: product_sale_values(row),
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::State;
    use axum::http::StatusCode;
    use axum::routing::post;
    use axum::{Json, Router};
    use chrono::TimeZone;
    use rust_decimal_macros::dec;
    use std::sync::{Arc, Mutex};
    use uuid::Uuid;

    #[derive(Clone)]
    struct Sink {
        rows: Arc<Mutex<Vec<Value>>>,
        status: StatusCode,
    }

    async fn append(State(sink): State<Sink>, Json(body): Json<Value>) -> StatusCode {
        sink.rows.lock().unwrap().push(body);
        sink.status
    }

    async fn serve(status: StatusCode) -> (String, Arc<Mutex<Vec<Value>>>) {
        let rows = Arc::new(Mutex::new(Vec::new()));
        let app = Router::new().route("/append", post(append)).with_state(Sink {
            rows: rows.clone(),
            status,
        });
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{}/append", addr), rows)
    }

    fn product_row() -> ProductSaleRow {
        ProductSaleRow {
            game_title: "Elden Ring".into(),
            console: "PS5".into(),
            slot: "П3".into(),
            account_login: "player@example.com".into(),
            comment: "lead".into(),
            amount: dec!(2400.50),
            manager: "@seller".into(),
            order_id: Uuid::nil(),
            timestamp: Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_product_row_is_posted_in_column_order() {
        let (url, rows) = serve(StatusCode::OK).await;
        let ledger = WebhookLedger::new(url, Duration::from_secs(5)).unwrap();

        assert!(ledger.append_product_sale(&product_row()).await);

        let rows = rows.lock().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["sheet"], "product_sales");
        let values = rows[0]["values"].as_array().unwrap();
        assert_eq!(values.len(), 9);
        assert_eq!(values[0], "Elden Ring");
        assert_eq!(values[2], "П3");
        assert_eq!(values[5].as_f64(), Some(2400.5));
        assert_eq!(values[6], "@seller");
        assert_eq!(values[8], "09.03.2024 14:05:07");
    }

    #[tokio::test]
    async fn test_rejected_or_unreachable_write_returns_false() {
        let (url, _rows) = serve(StatusCode::INTERNAL_SERVER_ERROR).await;
        let ledger = WebhookLedger::new(url, Duration::from_secs(5)).unwrap();
        assert!(!ledger.append_product_sale(&product_row()).await);

        let ledger = WebhookLedger::new("http://127.0.0.1:1/append", Duration::from_secs(1)).unwrap();
        assert!(!ledger.append_product_sale(&product_row()).await);
    }
}
