//! Store wiring and the request-level operations the handlers call.
//!
//! Each operation loads what it needs from the collections, runs the domain
//! validation or report function and writes back. There are no cross-record
//! transactions; every write touches one document.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;

use loomworks_core::{
    DateRange, Entity, ExpenseId, ExportLogId, PowerloomEntryId, ProductId, ProductionRecordId, WorkerId,
};
use loomworks_expenses::{Expense, ExpenseFilter, ExpensePatch, NewExpense};
use loomworks_infra::store::postgres;
use loomworks_infra::{
    Document, DocumentStore, InMemoryDocumentStore, InMemoryHealth, PostgresDocumentStore, PostgresHealth, StoreError,
    StoreHealth, StoreStatus,
};
use loomworks_production::{
    NewPowerloomProduction, NewProductionRecord, PowerloomFilter, PowerloomProduction, ProductionFilter,
    ProductionRecord, ProductionRecordPatch,
};
use loomworks_products::{NewProduct, Product, ProductPatch};
use loomworks_reports::{
    compute_salary_report, expense_stats, production_stats, weekly_profit, ExpenseStats, ExportLog, ExportMatrix,
    FinancialSummary, NewExportLog, ProductionStats, RevenueSetting, SalaryPolicy, SalaryReport,
    WeeklyProfitPoint, TOTAL_REVENUE_KEY,
};
use loomworks_workers::{NewWorker, SalaryBasis, Worker, WorkerPatch, WorkerRole};

use super::dto::{ExportLogView, PowerloomView, ProductionRecordView, WorkerSalaryView};
use super::errors::{ApiError, ApiResult};
use crate::config::ApiConfig;

pub struct AppServices {
    pub workers: Arc<dyn DocumentStore<Worker>>,
    pub products: Arc<dyn DocumentStore<Product>>,
    pub expenses: Arc<dyn DocumentStore<Expense>>,
    pub powerloom: Arc<dyn DocumentStore<PowerloomProduction>>,
    pub production: Arc<dyn DocumentStore<ProductionRecord>>,
    pub export_logs: Arc<dyn DocumentStore<ExportLog>>,
    pub settings: Arc<dyn DocumentStore<RevenueSetting>>,
    pub health: Arc<dyn StoreHealth>,
    pub salary_policy: SalaryPolicy,
}

/// Pick the backend from config: Postgres when `DATABASE_URL` is set,
/// in-memory otherwise.
pub async fn build_services(config: &ApiConfig) -> Result<AppServices, StoreError> {
    let Some(url) = config.database_url.as_deref() else {
        tracing::warn!("DATABASE_URL not set; using in-memory store (data is lost on restart)");
        return Ok(AppServices::in_memory(config.salary_policy));
    };

    let pool = postgres::connect(url, config.database_max_connections).await?;
    tracing::info!(max_connections = config.database_max_connections, "connected to postgres");

    let pool = Arc::new(pool);
    Ok(AppServices {
        workers: Arc::new(PostgresDocumentStore::shared(pool.clone())),
        products: Arc::new(PostgresDocumentStore::shared(pool.clone())),
        expenses: Arc::new(PostgresDocumentStore::shared(pool.clone())),
        powerloom: Arc::new(PostgresDocumentStore::shared(pool.clone())),
        production: Arc::new(PostgresDocumentStore::shared(pool.clone())),
        export_logs: Arc::new(PostgresDocumentStore::shared(pool.clone())),
        settings: Arc::new(PostgresDocumentStore::shared(pool.clone())),
        health: Arc::new(PostgresHealth::new(pool)),
        salary_policy: config.salary_policy,
    })
}

async fn find<D>(store: &dyn DocumentStore<D>, key: impl ToString) -> ApiResult<D>
where
    D: Document + Entity,
{
    store
        .get(&key.to_string())
        .await?
        .ok_or(ApiError::NotFound(D::KIND))
}

fn by_id<K, V>(items: Vec<V>, key: impl Fn(&V) -> K) -> HashMap<K, V>
where
    K: std::hash::Hash + Eq,
{
    items.into_iter().map(|v| (key(&v), v)).collect()
}

impl AppServices {
    pub fn in_memory(salary_policy: SalaryPolicy) -> Self {
        Self {
            workers: Arc::new(InMemoryDocumentStore::new()),
            products: Arc::new(InMemoryDocumentStore::new()),
            expenses: Arc::new(InMemoryDocumentStore::new()),
            powerloom: Arc::new(InMemoryDocumentStore::new()),
            production: Arc::new(InMemoryDocumentStore::new()),
            export_logs: Arc::new(InMemoryDocumentStore::new()),
            settings: Arc::new(InMemoryDocumentStore::new()),
            health: Arc::new(InMemoryHealth),
            salary_policy,
        }
    }

    pub async fn store_status(&self) -> StoreStatus {
        self.health.status().await
    }

    async fn worker_directory(&self) -> ApiResult<HashMap<WorkerId, Worker>> {
        Ok(by_id(self.workers.list().await?, |w| w.id))
    }

    // ---------- workers ----------

    /// Active workers by name.
    pub async fn list_workers(&self) -> ApiResult<Vec<Worker>> {
        let mut workers: Vec<Worker> = self.workers.list().await?.into_iter().filter(|w| w.is_active).collect();
        workers.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(workers)
    }

    pub async fn get_worker(&self, id: WorkerId) -> ApiResult<Worker> {
        find(self.workers.as_ref(), id).await
    }

    pub async fn create_worker(&self, input: NewWorker) -> ApiResult<Worker> {
        let worker = Worker::create(WorkerId::new(), input, Utc::now())?;
        let worker = self.workers.insert(worker).await?;
        tracing::info!(worker_id = %worker.id, role = worker.role.as_str(), "worker created");
        Ok(worker)
    }

    pub async fn update_worker(&self, id: WorkerId, patch: WorkerPatch) -> ApiResult<Worker> {
        let mut worker = self.get_worker(id).await?;
        worker.apply_patch(patch, Utc::now())?;
        self.workers
            .replace(worker)
            .await?
            .ok_or(ApiError::NotFound(Worker::KIND))
    }

    pub async fn deactivate_worker(&self, id: WorkerId) -> ApiResult<Worker> {
        let mut worker = self.get_worker(id).await?;
        worker.deactivate(Utc::now());
        let worker = self
            .workers
            .replace(worker)
            .await?
            .ok_or(ApiError::NotFound(Worker::KIND))?;
        tracing::info!(worker_id = %worker.id, "worker deactivated");
        Ok(worker)
    }

    /// Production-based report for loom operators, the stored flat amount
    /// for everyone else.
    pub async fn worker_salary(&self, id: WorkerId, range: DateRange) -> ApiResult<WorkerSalaryView> {
        let worker = self.get_worker(id).await?;
        Ok(match worker.salary_basis() {
            SalaryBasis::Production => WorkerSalaryView::Production {
                report: self.salary_report_for(&worker, range).await?,
            },
            SalaryBasis::Fixed(amount) => WorkerSalaryView::Fixed { amount },
        })
    }

    // ---------- products ----------

    /// Active products by name.
    pub async fn list_products(&self) -> ApiResult<Vec<Product>> {
        let mut products: Vec<Product> = self.products.list().await?.into_iter().filter(|p| p.is_active).collect();
        products.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(products)
    }

    pub async fn get_product(&self, id: ProductId) -> ApiResult<Product> {
        find(self.products.as_ref(), id).await
    }

    pub async fn create_product(&self, input: NewProduct) -> ApiResult<Product> {
        let product = Product::create(ProductId::new(), input, Utc::now())?;
        let product = self.products.insert(product).await?;
        tracing::info!(product_id = %product.id, name = %product.name, "product created");
        Ok(product)
    }

    pub async fn update_product(&self, id: ProductId, patch: ProductPatch) -> ApiResult<Product> {
        let mut product = self.get_product(id).await?;
        product.apply_patch(patch, Utc::now())?;
        self.products
            .replace(product)
            .await?
            .ok_or(ApiError::NotFound(Product::KIND))
    }

    pub async fn deactivate_product(&self, id: ProductId) -> ApiResult<Product> {
        let mut product = self.get_product(id).await?;
        product.deactivate(Utc::now());
        self.products
            .replace(product)
            .await?
            .ok_or(ApiError::NotFound(Product::KIND))
    }

    // ---------- expenses ----------

    /// Matching expenses newest first, plus their summed amount.
    pub async fn list_expenses(&self, filter: &ExpenseFilter) -> ApiResult<(Vec<Expense>, Decimal)> {
        let mut expenses: Vec<Expense> = self
            .expenses
            .list()
            .await?
            .into_iter()
            .filter(|e| filter.matches(e))
            .collect();
        Expense::sort_newest_first(&mut expenses);
        let total = expenses.iter().map(|e| e.amount).sum();
        Ok((expenses, total))
    }

    pub async fn get_expense(&self, id: ExpenseId) -> ApiResult<Expense> {
        find(self.expenses.as_ref(), id).await
    }

    pub async fn create_expense(&self, input: NewExpense) -> ApiResult<Expense> {
        let expense = Expense::create(ExpenseId::new(), input, Utc::now())?;
        Ok(self.expenses.insert(expense).await?)
    }

    pub async fn update_expense(&self, id: ExpenseId, patch: ExpensePatch) -> ApiResult<Expense> {
        let mut expense = self.get_expense(id).await?;
        expense.apply_patch(patch, Utc::now())?;
        self.expenses
            .replace(expense)
            .await?
            .ok_or(ApiError::NotFound(Expense::KIND))
    }

    pub async fn delete_expense(&self, id: ExpenseId) -> ApiResult<Expense> {
        self.expenses
            .remove(&id.to_string())
            .await?
            .ok_or(ApiError::NotFound(Expense::KIND))
    }

    pub async fn expense_summary(&self, range: DateRange) -> ApiResult<ExpenseStats> {
        let expenses = self.expenses.list().await?;
        Ok(expense_stats(expenses.iter().filter(|e| range.contains(e.date)))?)
    }

    // ---------- shift production records ----------

    /// Matching records newest first with their quantity and wastage totals.
    pub async fn list_production(
        &self,
        filter: &ProductionFilter,
    ) -> ApiResult<(Vec<ProductionRecordView>, Decimal, Decimal)> {
        let mut records: Vec<ProductionRecord> = self
            .production
            .list()
            .await?
            .into_iter()
            .filter(|r| filter.matches(r))
            .collect();
        ProductionRecord::sort_newest_first(&mut records);

        let total_quantity = records.iter().map(|r| r.quantity_produced).sum();
        let total_wastage = records.iter().map(|r| r.wastage).sum();
        let workers = self.worker_directory().await?;
        let views = records
            .into_iter()
            .map(|r| ProductionRecordView::populate(r, &workers))
            .collect();
        Ok((views, total_quantity, total_wastage))
    }

    pub async fn get_production(&self, id: ProductionRecordId) -> ApiResult<ProductionRecordView> {
        let record = find(self.production.as_ref(), id).await?;
        self.populate_production(record).await
    }

    pub async fn create_production(&self, input: NewProductionRecord) -> ApiResult<ProductionRecordView> {
        let record = ProductionRecord::create(ProductionRecordId::new(), input, Utc::now())?;
        let record = self.production.insert(record).await?;
        self.populate_production(record).await
    }

    pub async fn update_production(
        &self,
        id: ProductionRecordId,
        patch: ProductionRecordPatch,
    ) -> ApiResult<ProductionRecordView> {
        let mut record = find(self.production.as_ref(), id).await?;
        record.apply_patch(patch, Utc::now())?;
        let record = self
            .production
            .replace(record)
            .await?
            .ok_or(ApiError::NotFound(ProductionRecord::KIND))?;
        self.populate_production(record).await
    }

    pub async fn delete_production(&self, id: ProductionRecordId) -> ApiResult<ProductionRecord> {
        self.production
            .remove(&id.to_string())
            .await?
            .ok_or(ApiError::NotFound(ProductionRecord::KIND))
    }

    pub async fn production_summary(&self, range: DateRange) -> ApiResult<ProductionStats> {
        let records = self.production.list().await?;
        let workers = self.workers.list().await?;
        Ok(production_stats(
            records.iter().filter(|r| range.contains(r.date)),
            &workers,
        )?)
    }

    async fn populate_production(&self, record: ProductionRecord) -> ApiResult<ProductionRecordView> {
        let worker = self.workers.get(&record.worker.to_string()).await?;
        let directory: HashMap<WorkerId, Worker> = worker.into_iter().map(|w| (w.id, w)).collect();
        Ok(ProductionRecordView::populate(record, &directory))
    }

    // ---------- powerloom production ----------

    pub async fn list_powerloom(&self, filter: PowerloomFilter) -> ApiResult<Vec<PowerloomView>> {
        let mut entries: Vec<PowerloomProduction> = self
            .powerloom
            .list()
            .await?
            .into_iter()
            .filter(|e| filter.matches(e))
            .collect();
        PowerloomProduction::sort_chronologically(&mut entries);

        let workers = self.worker_directory().await?;
        let products = by_id(self.products.list().await?, |p| p.id);
        Ok(entries
            .into_iter()
            .map(|e| PowerloomView::populate(e, &workers, &products))
            .collect())
    }

    pub async fn create_powerloom(&self, input: NewPowerloomProduction) -> ApiResult<PowerloomView> {
        let entry = PowerloomProduction::create(PowerloomEntryId::new(), input, Utc::now())?;
        let entry = self.powerloom.insert(entry).await?;
        tracing::info!(
            entry_id = %entry.id,
            loom = entry.loom_number.as_u8(),
            machines = entry.machines.len(),
            "powerloom production recorded"
        );

        let workers = self.worker_directory().await?;
        let products = by_id(self.products.list().await?, |p| p.id);
        Ok(PowerloomView::populate(entry, &workers, &products))
    }

    /// Remove every powerloom entry on every loom.
    pub async fn delete_all_powerloom(&self) -> ApiResult<u64> {
        let deleted = self.powerloom.remove_all().await?;
        tracing::warn!(deleted, "all powerloom production deleted");
        Ok(deleted)
    }

    // ---------- salary ----------

    async fn salary_report_for(&self, worker: &Worker, range: DateRange) -> ApiResult<SalaryReport> {
        let entries = self.powerloom.list().await?;
        let products = self.products.list().await?;
        Ok(compute_salary_report(
            &entries,
            &products,
            worker.id,
            range,
            self.salary_policy,
        )?)
    }

    async fn loom_operator(&self, id: WorkerId) -> ApiResult<Worker> {
        let worker = self.get_worker(id).await?;
        if worker.role != WorkerRole::LoomOperator {
            return Err(ApiError::Validation(format!(
                "{} is a {}, not a Loom Operator",
                worker.name,
                worker.role.as_str()
            )));
        }
        Ok(worker)
    }

    pub async fn loom_operator_salary(&self, id: WorkerId, range: DateRange) -> ApiResult<SalaryReport> {
        let worker = self.loom_operator(id).await?;
        self.salary_report_for(&worker, range).await
    }

    /// Cross-tab matrix for a loom operator. Pure read; nothing is logged.
    pub async fn salary_matrix(&self, id: WorkerId, range: DateRange) -> ApiResult<ExportMatrix> {
        let worker = self.loom_operator(id).await?;
        let report = self.salary_report_for(&worker, range).await?;
        Ok(ExportMatrix::build(&report, worker.name, Utc::now().date_naive()))
    }

    /// Build the matrix and append the export log entry for it.
    pub async fn export_salary(&self, id: WorkerId, range: DateRange) -> ApiResult<(ExportMatrix, ExportLogView)> {
        let matrix = self.salary_matrix(id, range).await?;
        let log = ExportLog::for_export(ExportLogId::new(), id, &matrix, Utc::now());
        let log = self.export_logs.insert(log).await?;
        tracing::info!(worker_id = %id, salary = %log.salary, "salary exported");

        let view = self.populate_export_log(log).await?;
        Ok((matrix, view))
    }

    // ---------- export logs ----------

    /// Oldest first, optionally for one worker.
    pub async fn list_export_logs(&self, worker: Option<WorkerId>) -> ApiResult<Vec<ExportLogView>> {
        let mut logs: Vec<ExportLog> = self
            .export_logs
            .list()
            .await?
            .into_iter()
            .filter(|l| worker.is_none_or(|w| l.worker == w))
            .collect();
        ExportLog::sort_oldest_first(&mut logs);

        let workers = self.worker_directory().await?;
        Ok(logs
            .into_iter()
            .map(|l| ExportLogView::populate(l, &workers))
            .collect())
    }

    pub async fn create_export_log(&self, input: NewExportLog) -> ApiResult<ExportLogView> {
        let log = ExportLog::create(ExportLogId::new(), input, Utc::now())?;
        // The worker must exist even though the log only stores its id.
        self.get_worker(log.worker).await?;
        let log = self.export_logs.insert(log).await?;
        self.populate_export_log(log).await
    }

    async fn populate_export_log(&self, log: ExportLog) -> ApiResult<ExportLogView> {
        let worker = self.workers.get(&log.worker.to_string()).await?;
        let directory: HashMap<WorkerId, Worker> = worker.into_iter().map(|w| (w.id, w)).collect();
        Ok(ExportLogView::populate(log, &directory))
    }

    // ---------- settings / profit ----------

    /// Stored revenue, 0 when never set.
    pub async fn total_revenue(&self) -> ApiResult<Decimal> {
        Ok(self
            .settings
            .get(TOTAL_REVENUE_KEY)
            .await?
            .map(|s| s.value)
            .unwrap_or(Decimal::ZERO))
    }

    pub async fn set_total_revenue(&self, value: Decimal) -> ApiResult<Decimal> {
        let setting = RevenueSetting::total_revenue(value, Utc::now()).map_err(|e| ApiError::BadRequest {
            error: "Invalid value",
            message: e.to_string(),
        })?;
        let stored = self.settings.upsert(setting).await?;
        tracing::info!(value = %stored.value, "total revenue updated");
        Ok(stored.value)
    }

    pub async fn weekly_profit(&self) -> ApiResult<Vec<WeeklyProfitPoint>> {
        let expenses = self.expenses.list().await?;
        let revenue = self.total_revenue().await?;
        Ok(weekly_profit(&expenses, revenue)?)
    }

    pub async fn financial_summary(&self) -> ApiResult<FinancialSummary> {
        let expenses = self.expenses.list().await?;
        let revenue = self.total_revenue().await?;
        Ok(FinancialSummary::compute(&expenses, revenue)?)
    }
}
