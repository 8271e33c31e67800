use async_trait::async_trait;
use diesel::prelude::*;
use diesel::r2d2::{self, Pool};
use diesel::sqlite::SqliteConnection;
use log::debug;
use std::sync::Arc;

use ledgerlink_core::errors::Result;
use ledgerlink_core::ledger::{InvoiceLink, LedgerRepositoryTrait, LocalPayment, LocalSale};

use super::model::{PaymentDB, SaleDB};
use crate::db::{get_connection, WriteHandle};
use crate::errors::StorageError;
use crate::schema::{payments, sales};

/// Reads sales and payments and writes back invoice link fields.
///
/// Link updates are read-modify-write jobs on the writer actor, so a fill
/// never races another fill of the same row.
pub struct LedgerRepository {
    pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
    writer: WriteHandle,
}

impl LedgerRepository {
    pub fn new(
        pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
        writer: WriteHandle,
    ) -> Self {
        Self { pool, writer }
    }

    /// Inserts a sale. Used by seeding and tests; the CRUD side owns these rows.
    pub async fn insert_sale(&self, sale: LocalSale) -> Result<()> {
        self.writer
            .exec(move |conn| {
                diesel::insert_into(sales::table)
                    .values(SaleDB::from(sale))
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(())
            })
            .await
    }

    /// Inserts a payment. Used by seeding and tests.
    pub async fn insert_payment(&self, payment: LocalPayment) -> Result<()> {
        self.writer
            .exec(move |conn| {
                diesel::insert_into(payments::table)
                    .values(PaymentDB::from(payment))
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(())
            })
            .await
    }
}

fn load_sale(conn: &mut SqliteConnection, sale_id: &str) -> Result<Option<SaleDB>> {
    let row = sales::table
        .find(sale_id)
        .select(SaleDB::as_select())
        .first::<SaleDB>(conn)
        .optional()
        .map_err(StorageError::from)?;
    Ok(row)
}

fn load_payment(conn: &mut SqliteConnection, payment_id: &str) -> Result<Option<PaymentDB>> {
    let row = payments::table
        .find(payment_id)
        .select(PaymentDB::as_select())
        .first::<PaymentDB>(conn)
        .optional()
        .map_err(StorageError::from)?;
    Ok(row)
}

#[async_trait]
impl LedgerRepositoryTrait for LedgerRepository {
    fn list_sales(&self, organization_id: &str) -> Result<Vec<LocalSale>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = sales::table
            .filter(sales::organization_id.eq(organization_id))
            .order(sales::id.asc())
            .select(SaleDB::as_select())
            .load::<SaleDB>(&mut conn)
            .map_err(StorageError::from)?;
        Ok(rows.into_iter().map(LocalSale::from).collect())
    }

    fn list_payments(&self, organization_id: &str) -> Result<Vec<LocalPayment>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = payments::table
            .filter(payments::organization_id.eq(organization_id))
            .order(payments::id.asc())
            .select(PaymentDB::as_select())
            .load::<PaymentDB>(&mut conn)
            .map_err(StorageError::from)?;
        Ok(rows.into_iter().map(LocalPayment::from).collect())
    }

    fn get_sale(&self, organization_id: &str, sale_id: &str) -> Result<Option<LocalSale>> {
        let mut conn = get_connection(&self.pool)?;
        let row = sales::table
            .filter(sales::id.eq(sale_id))
            .filter(sales::organization_id.eq(organization_id))
            .select(SaleDB::as_select())
            .first::<SaleDB>(&mut conn)
            .optional()
            .map_err(StorageError::from)?;
        Ok(row.map(LocalSale::from))
    }

    fn get_payment(
        &self,
        organization_id: &str,
        payment_id: &str,
    ) -> Result<Option<LocalPayment>> {
        let mut conn = get_connection(&self.pool)?;
        let row = payments::table
            .filter(payments::id.eq(payment_id))
            .filter(payments::organization_id.eq(organization_id))
            .select(PaymentDB::as_select())
            .first::<PaymentDB>(&mut conn)
            .optional()
            .map_err(StorageError::from)?;
        Ok(row.map(LocalPayment::from))
    }

    async fn link_sale_invoice(&self, sale_id: &str, link: InvoiceLink) -> Result<()> {
        let sale_id = sale_id.to_string();
        self.writer
            .exec(move |conn| {
                let Some(mut sale) = load_sale(conn, &sale_id)? else {
                    debug!("Sale {} vanished before link write-back", sale_id);
                    return Ok(());
                };
                if sale.fill_link(&link) {
                    diesel::update(sales::table.find(&sale_id))
                        .set(&sale)
                        .execute(conn)
                        .map_err(StorageError::from)?;
                }
                Ok(())
            })
            .await
    }

    async fn link_payment_invoice(&self, payment_id: &str, link: InvoiceLink) -> Result<()> {
        let payment_id = payment_id.to_string();
        self.writer
            .exec(move |conn| {
                let Some(mut payment) = load_payment(conn, &payment_id)? else {
                    debug!("Payment {} vanished before link write-back", payment_id);
                    return Ok(());
                };
                if payment.fill_link(&link) {
                    diesel::update(payments::table.find(&payment_id))
                        .set(&payment)
                        .execute(conn)
                        .map_err(StorageError::from)?;
                }
                Ok(())
            })
            .await
    }

    async fn link_sale_credit_note(
        &self,
        sale_id: &str,
        credit_note_external_id: &str,
    ) -> Result<()> {
        let sale_id = sale_id.to_string();
        let credit_note_external_id = credit_note_external_id.to_string();
        self.writer
            .exec(move |conn| {
                let Some(mut sale) = load_sale(conn, &sale_id)? else {
                    return Ok(());
                };
                if sale.fill_credit_note(&credit_note_external_id) {
                    diesel::update(sales::table.find(&sale_id))
                        .set(&sale)
                        .execute(conn)
                        .map_err(StorageError::from)?;
                }
                Ok(())
            })
            .await
    }

    async fn clear_invoice_links(
        &self,
        organization_id: &str,
        sale_id: Option<&str>,
        payment_id: Option<&str>,
    ) -> Result<()> {
        let organization_id = organization_id.to_string();
        let sale_id = sale_id.map(str::to_string);
        let payment_id = payment_id.map(str::to_string);

        // One job so the sale and payment are cleared in the same transaction
        self.writer
            .exec(move |conn| {
                if let Some(sale_id) = sale_id {
                    if let Some(mut sale) = load_sale(conn, &sale_id)?
                        .filter(|s| s.organization_id == organization_id)
                    {
                        sale.clear_link();
                        diesel::update(sales::table.find(&sale_id))
                            .set(&sale)
                            .execute(conn)
                            .map_err(StorageError::from)?;
                    }
                }
                if let Some(payment_id) = payment_id {
                    if let Some(mut payment) = load_payment(conn, &payment_id)?
                        .filter(|p| p.organization_id == organization_id)
                    {
                        payment.clear_link();
                        diesel::update(payments::table.find(&payment_id))
                            .set(&payment)
                            .execute(conn)
                            .map_err(StorageError::from)?;
                    }
                }
                Ok(())
            })
            .await
    }
}
