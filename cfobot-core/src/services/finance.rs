//! Finance service - answers finance questions across entities
//!
//! Each query fans out to every entity in scope concurrently. One entity
//! failing never affects another: its slot comes back empty and renders as
//! "not available".

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use chrono::{Local, NaiveDate};
use futures::future::join_all;
use futures::FutureExt;
use log::{debug, warn};

use crate::config::CashSource;
use crate::domain::dates::first_of_month;
use crate::domain::result::Result;
use crate::domain::{Entity, EntityScope, Intent, LineItem, MonetaryTotal, Query};
use crate::ports::{endpoints, LedgerApi};
use crate::services::aggregate::{render_aging, render_invoices, render_totals, EntityResult};
use crate::services::aging::{classify, AgingReport};
use crate::services::extract::{has_more_pages, outstanding_invoices, TotalReport};

/// Invoices requested per page
pub const INVOICE_PAGE_SIZE: u32 = 200;

/// Upper bound on pages fetched for one invoice listing
pub const MAX_INVOICE_PAGES: u32 = 10;

type Params = Vec<(String, String)>;

pub struct FinanceService {
    ledger: Arc<dyn LedgerApi>,
    entities: Vec<Entity>,
    cash_source: CashSource,
}

impl FinanceService {
    pub fn new(ledger: Arc<dyn LedgerApi>, entities: Vec<Entity>, cash_source: CashSource) -> Self {
        Self {
            ledger,
            entities,
            cash_source,
        }
    }

    /// Configured entities, in presentation order
    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn cash_source(&self) -> CashSource {
        self.cash_source
    }

    /// Cash on hand per entity, from the configured source
    pub async fn cash_balances(
        &self,
        scope: EntityScope,
        as_of: Option<NaiveDate>,
    ) -> Vec<EntityResult<MonetaryTotal>> {
        self.cash_balances_from(scope, as_of, self.cash_source).await
    }

    /// Cash on hand per entity from an explicit source
    ///
    /// Account and bank-account lists only know today's balance, so an as-of
    /// date switches them to the balance sheet on that date.
    pub async fn cash_balances_from(
        &self,
        scope: EntityScope,
        as_of: Option<NaiveDate>,
        source: CashSource,
    ) -> Vec<EntityResult<MonetaryTotal>> {
        let source = match as_of {
            Some(_) if source.is_current_only() => {
                debug!("As-of date given, reading cash from the balance sheet");
                CashSource::BalanceSheet
            }
            _ => source,
        };

        let report = source.report();
        let params = match (source, as_of) {
            (CashSource::BalanceSheet, Some(date)) => vec![param("date", date)],
            (CashSource::CashFlow, _) => {
                let to = as_of.unwrap_or_else(|| Local::now().date_naive());
                period_params(first_of_month(to), to)
            }
            _ => Vec::new(),
        };

        self.per_entity(scope, "cash balance", |entity| {
            self.fetch_total(entity, report, &params)
        })
        .await
    }

    /// Outstanding invoices per entity, across all pages
    pub async fn outstanding_invoices(&self, scope: EntityScope) -> Vec<EntityResult<Vec<LineItem>>> {
        self.per_entity(scope, "invoices", |entity| self.fetch_invoices(entity))
            .await
    }

    /// Aging of outstanding invoices against `reference_date`
    pub async fn invoice_aging(
        &self,
        scope: EntityScope,
        reference_date: NaiveDate,
    ) -> Vec<EntityResult<AgingReport>> {
        self.outstanding_invoices(scope)
            .await
            .into_iter()
            .map(|result| {
                let report = result.value.map(|items| classify(&items, reference_date));
                EntityResult::new(result.entity, report)
            })
            .collect()
    }

    /// Net profit (or loss) per entity over `from..=to`
    pub async fn profit_and_loss(
        &self,
        scope: EntityScope,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Vec<EntityResult<MonetaryTotal>> {
        let params = period_params(from, to);
        self.per_entity(scope, "P&L", |entity| {
            self.fetch_total(entity, TotalReport::ProfitAndLoss, &params)
        })
        .await
    }

    /// Route a chat message; `None` when it is not a finance question
    pub async fn handle(&self, text: &str, today: NaiveDate) -> Option<String> {
        let query = Query::parse(text, today)?;
        Some(self.answer(&query, today).await)
    }

    /// Chat reply for a routed query
    ///
    /// Never fails. Every entity in scope gets a line, failed ones as
    /// "not available"; a panic while building the reply becomes the
    /// "unable to fetch" apology.
    pub async fn answer(&self, query: &Query, today: NaiveDate) -> String {
        match AssertUnwindSafe(self.build_reply(query, today))
            .catch_unwind()
            .await
        {
            Ok(reply) => reply,
            Err(_) => {
                warn!("Building the {} reply panicked", query.intent);
                unavailable_reply(query.intent)
            }
        }
    }

    async fn build_reply(&self, query: &Query, today: NaiveDate) -> String {
        debug!(
            "Answering {} for {:?} (reference date {:?})",
            query.intent, query.scope, query.reference_date
        );

        match query.intent {
            Intent::CashBalance => {
                let results = self.cash_balances(query.scope, query.reference_date).await;
                let header = query
                    .reference_date
                    .map(|date| format!("Cash balance as of {}", date))
                    .unwrap_or_default();
                render_totals("🏦", &header, &results)
            }
            Intent::Invoices => {
                let results = self.outstanding_invoices(query.scope).await;
                render_invoices(&results)
            }
            Intent::OverdueInvoices => {
                let reference_date = query.reference_date_or(today);
                let results = self.invoice_aging(query.scope, reference_date).await;
                render_aging(reference_date, &results)
            }
            Intent::ProfitAndLoss => {
                let to = query.reference_date_or(today);
                let from = first_of_month(to);
                let results = self.profit_and_loss(query.scope, from, to).await;
                let header = format!("P&L {} to {}", from, to);
                render_totals("📊", &header, &results)
            }
        }
    }

    async fn per_entity<'a, T, F, Fut>(
        &'a self,
        scope: EntityScope,
        subject: &str,
        fetch: F,
    ) -> Vec<EntityResult<T>>
    where
        F: Fn(&'a Entity) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let selected = scope.select(&self.entities);
        let outcomes = join_all(selected.iter().map(|&entity| fetch(entity))).await;

        selected
            .into_iter()
            .zip(outcomes)
            .map(|(entity, outcome)| {
                let value = match outcome {
                    Ok(value) => Some(value),
                    Err(e) => {
                        warn!("{} unavailable for {}: {}", subject, entity.code, e);
                        None
                    }
                };
                EntityResult::new(entity.clone(), value)
            })
            .collect()
    }

    async fn fetch_total(
        &self,
        entity: &Entity,
        report: TotalReport,
        params: &[(String, String)],
    ) -> Result<MonetaryTotal> {
        let tree = self.ledger.call(entity, report.endpoint(), params).await?;
        let amount = report.extract(&tree);
        Ok(MonetaryTotal::new(entity.code, amount, entity.currency.code.clone()))
    }

    async fn fetch_invoices(&self, entity: &Entity) -> Result<Vec<LineItem>> {
        let mut items = Vec::new();

        for page in 1..=MAX_INVOICE_PAGES {
            let params = vec![param("page", page), param("per_page", INVOICE_PAGE_SIZE)];
            let tree = self.ledger.call(entity, endpoints::INVOICES, &params).await?;
            items.extend(outstanding_invoices(&tree));

            if !has_more_pages(&tree) {
                return Ok(items);
            }
        }

        warn!(
            "Invoice listing for {} truncated after {} pages",
            entity.code, MAX_INVOICE_PAGES
        );
        Ok(items)
    }
}

/// `⚠️ Unable to fetch <subject> right now.`
pub fn unavailable_reply(intent: Intent) -> String {
    format!("⚠️ Unable to fetch {} right now.", intent.subject())
}

fn param(name: &str, value: impl ToString) -> (String, String) {
    (name.to_string(), value.to_string())
}

fn period_params(from: NaiveDate, to: NaiveDate) -> Params {
    vec![param("from_date", from), param("to_date", to)]
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use rust_decimal::Decimal;
    use serde_json::{json, Value as JsonValue};

    use super::*;
    use crate::domain::result::Error;
    use crate::domain::EntityCode;

    /// Canned responses keyed by (org id, endpoint); records every call
    #[derive(Default)]
    struct StubLedger {
        responses: HashMap<(String, String), Vec<JsonValue>>,
        failures: HashMap<String, u16>,
        calls: Mutex<Vec<(String, String, Params)>>,
    }

    impl StubLedger {
        fn respond(mut self, org: &str, endpoint: &str, body: JsonValue) -> Self {
            self.responses
                .entry((org.to_string(), endpoint.to_string()))
                .or_default()
                .push(body);
            self
        }

        fn fail(mut self, org: &str, status: u16) -> Self {
            self.failures.insert(org.to_string(), status);
            self
        }

        fn calls(&self) -> Vec<(String, String, Params)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl LedgerApi for StubLedger {
        async fn call(
            &self,
            entity: &Entity,
            endpoint: &str,
            params: &[(String, String)],
        ) -> Result<JsonValue> {
            let index = {
                let mut calls = self.calls.lock().unwrap();
                let index = calls
                    .iter()
                    .filter(|(org, ep, _)| *org == entity.org_id && ep == endpoint)
                    .count();
                calls.push((entity.org_id.clone(), endpoint.to_string(), params.to_vec()));
                index
            };

            if let Some(status) = self.failures.get(&entity.org_id) {
                return Err(Error::ledger_api(*status, "boom"));
            }

            let pages = self
                .responses
                .get(&(entity.org_id.clone(), endpoint.to_string()))
                .ok_or_else(|| Error::ledger_api(404, "no such endpoint"))?;
            Ok(pages[index.min(pages.len() - 1)].clone())
        }
    }

    fn entities() -> Vec<Entity> {
        vec![
            Entity::new(EntityCode::Kk, "kk-org"),
            Entity::new(EntityCode::Pt, "pt-org"),
        ]
    }

    fn service(ledger: Arc<StubLedger>, source: CashSource) -> FinanceService {
        FinanceService::new(ledger, entities(), source)
    }

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn bank_accounts(balance: i64) -> JsonValue {
        json!({ "code": 0, "bankaccounts": [
            { "account_type": "bank", "is_active": true, "bcy_balance": balance }
        ]})
    }

    #[tokio::test]
    async fn test_one_entity_failing_keeps_the_other() {
        let ledger = Arc::new(
            StubLedger::default()
                .fail("kk-org", 500)
                .respond("pt-org", endpoints::BANK_ACCOUNTS, bank_accounts(2000)),
        );
        let service = service(ledger, CashSource::BankAccounts);

        let reply = service
            .answer(&Query::new(Intent::CashBalance), d(2024, 1, 10))
            .await;

        assert_eq!(reply, "🏦 KK: not available\n🏦 PT: Rp 2.000");
    }

    #[tokio::test]
    async fn test_all_entities_failing_still_lists_each_entity() {
        let ledger = Arc::new(StubLedger::default().fail("kk-org", 500).fail("pt-org", 502));
        let service = service(ledger, CashSource::BankAccounts);

        let reply = service
            .answer(&Query::new(Intent::ProfitAndLoss), d(2024, 1, 10))
            .await;
        assert_eq!(
            reply,
            "P&L 2024-01-01 to 2024-01-10\n📊 KK: not available\n📊 PT: not available"
        );

        let reply = service
            .answer(&Query::new(Intent::CashBalance), d(2024, 1, 10))
            .await;
        assert_eq!(reply, "🏦 KK: not available\n🏦 PT: not available");
    }

    #[tokio::test]
    async fn test_cash_flow_source_reads_month_to_date() {
        let statement = json!({ "footer": { "closing_balance": 900 } });
        let ledger = Arc::new(
            StubLedger::default()
                .respond("kk-org", endpoints::CASH_FLOW, statement.clone())
                .respond("pt-org", endpoints::CASH_FLOW, statement),
        );
        let service = service(ledger.clone(), CashSource::CashFlow);

        let results = service
            .cash_balances(EntityScope::Only(EntityCode::Kk), Some(d(2024, 3, 20)))
            .await;

        assert_eq!(results[0].value.as_ref().unwrap().amount, Decimal::from(900));
        let calls = ledger.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].1, endpoints::CASH_FLOW);
        assert_eq!(
            calls[0].2,
            vec![
                ("from_date".to_string(), "2024-03-01".to_string()),
                ("to_date".to_string(), "2024-03-20".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_cash_flow_source_without_date_ends_today() {
        let statement = json!({ "footer": { "closing_balance": 900 } });
        let ledger = Arc::new(StubLedger::default().respond("pt-org", endpoints::CASH_FLOW, statement));
        let service = service(ledger.clone(), CashSource::BankAccounts);

        let today = Local::now().date_naive();
        let results = service
            .cash_balances_from(EntityScope::Only(EntityCode::Pt), None, CashSource::CashFlow)
            .await;

        assert!(results[0].is_available());
        let calls = ledger.calls();
        assert_eq!(calls[0].1, endpoints::CASH_FLOW);
        assert_eq!(
            calls[0].2,
            vec![
                ("from_date".to_string(), first_of_month(today).to_string()),
                ("to_date".to_string(), today.to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_scope_limits_calls() {
        let ledger = Arc::new(
            StubLedger::default().respond("pt-org", endpoints::BANK_ACCOUNTS, bank_accounts(5)),
        );
        let service = service(ledger.clone(), CashSource::BankAccounts);

        let results = service
            .cash_balances(EntityScope::Only(EntityCode::Pt), None)
            .await;

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].value.as_ref().unwrap().amount, Decimal::from(5));
        assert!(ledger.calls().iter().all(|(org, _, _)| org == "pt-org"));
    }

    #[tokio::test]
    async fn test_as_of_date_switches_to_balance_sheet() {
        let sheet = json!({ "balance_sheet": [
            { "name": "Cash", "account_type": "cash", "bcy_amount": 700 }
        ]});
        let ledger = Arc::new(
            StubLedger::default()
                .respond("kk-org", endpoints::BALANCE_SHEET, sheet.clone())
                .respond("pt-org", endpoints::BALANCE_SHEET, sheet),
        );
        let service = service(ledger.clone(), CashSource::BankAccounts);

        let results = service
            .cash_balances(EntityScope::All, Some(d(2023, 12, 31)))
            .await;

        assert!(results.iter().all(|r| r.value.as_ref().unwrap().amount == Decimal::from(700)));
        let calls = ledger.calls();
        assert!(calls.iter().all(|(_, ep, _)| ep == endpoints::BALANCE_SHEET));
        assert_eq!(
            calls[0].2,
            vec![("date".to_string(), "2023-12-31".to_string())]
        );
    }

    #[tokio::test]
    async fn test_pnl_period_runs_from_first_of_month() {
        let pnl = json!({ "profit_and_loss": [
            { "name": "Net Profit/Loss", "total": -1500 }
        ]});
        let ledger = Arc::new(
            StubLedger::default()
                .respond("kk-org", endpoints::PROFIT_AND_LOSS, pnl.clone())
                .respond("pt-org", endpoints::PROFIT_AND_LOSS, pnl),
        );
        let service = service(ledger.clone(), CashSource::BankAccounts);

        let reply = service
            .answer(&Query::new(Intent::ProfitAndLoss), d(2024, 2, 15))
            .await;

        assert!(reply.starts_with("P&L 2024-02-01 to 2024-02-15"));
        assert!(reply.contains("📊 KK: -¥1,500"));
        assert_eq!(
            ledger.calls()[0].2,
            vec![
                ("from_date".to_string(), "2024-02-01".to_string()),
                ("to_date".to_string(), "2024-02-15".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_invoice_listing_follows_pages() {
        let page_one = json!({
            "invoices": [{ "invoice_id": "1", "status": "sent", "balance": 100 }],
            "page_context": { "page": 1, "has_more_page": true }
        });
        let page_two = json!({
            "invoices": [{ "invoice_id": "2", "status": "overdue", "balance": 50 }],
            "page_context": { "page": 2, "has_more_page": false }
        });
        let ledger = Arc::new(
            StubLedger::default()
                .respond("kk-org", endpoints::INVOICES, page_one)
                .respond("kk-org", endpoints::INVOICES, page_two),
        );
        let service = service(ledger.clone(), CashSource::BankAccounts);

        let results = service
            .outstanding_invoices(EntityScope::Only(EntityCode::Kk))
            .await;

        let items = results[0].value.as_ref().unwrap();
        assert_eq!(items.len(), 2);
        let pages: Vec<_> = ledger.calls().into_iter().map(|(_, _, p)| p[0].1.clone()).collect();
        assert_eq!(pages, vec!["1", "2"]);
    }

    #[tokio::test]
    async fn test_invoice_listing_stops_at_page_cap() {
        let endless = json!({
            "invoices": [{ "invoice_id": "x", "status": "sent", "balance": 1 }],
            "page_context": { "has_more_page": true }
        });
        let ledger = Arc::new(StubLedger::default().respond("kk-org", endpoints::INVOICES, endless));
        let service = service(ledger.clone(), CashSource::BankAccounts);

        let results = service
            .outstanding_invoices(EntityScope::Only(EntityCode::Kk))
            .await;

        assert_eq!(results[0].value.as_ref().unwrap().len(), MAX_INVOICE_PAGES as usize);
        assert_eq!(ledger.calls().len(), MAX_INVOICE_PAGES as usize);
    }

    #[tokio::test]
    async fn test_overdue_answer_uses_reference_date() {
        let invoices = json!({ "invoices": [
            { "invoice_id": "1", "invoice_number": "INV-1", "customer_name": "Acme",
              "status": "sent", "due_date": "2024-01-01", "balance": 500 }
        ]});
        let ledger = Arc::new(
            StubLedger::default()
                .respond("kk-org", endpoints::INVOICES, invoices)
                .fail("pt-org", 500),
        );
        let service = service(ledger, CashSource::BankAccounts);

        let reply = service
            .handle("overdue invoices kk as of 2024-01-10", d(2024, 3, 1))
            .await
            .unwrap();

        assert!(reply.starts_with("⏰ Invoice aging as of 2024-01-10"));
        assert!(reply.contains("overdue ¥500"));
        assert!(!reply.contains("PT"));
    }

    #[tokio::test]
    async fn test_unrelated_message_is_not_handled() {
        let service = service(Arc::new(StubLedger::default()), CashSource::BankAccounts);
        assert!(service.handle("good morning", d(2024, 1, 1)).await.is_none());
    }
}
