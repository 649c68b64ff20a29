//! Write-side seam used by ingestion.
//!
//! [`PgStore`] is the production implementation; tests drive the same ingestion code
//! through an in-memory store.

use diesel::pg::upsert::excluded;
use diesel::prelude::*;

use crate::core::shared::schema::statistics::{customer_data, data_upload_logs, transaction_data};

use super::error::IngestError;
use super::storage::{
    get_or_create_branch, get_or_create_master, NewCustomerData, NewDataUploadLog,
    NewTransactionData,
};
use super::types::MasterKind;

pub trait StatisticsStore {
    /// Id of the branch with `code`, creating it with `name` when absent.
    fn branch_id(&mut self, code: &str, name: &str) -> Result<i32, IngestError>;

    /// Id of the named master entry, creating it when absent.
    fn master_id(&mut self, kind: MasterKind, name: &str) -> Result<i32, IngestError>;

    /// Insert, or overwrite the count of the row sharing the same natural key.
    fn upsert_customer_data(&mut self, row: &NewCustomerData) -> Result<(), IngestError>;

    /// Insert, or overwrite count and amount of the row sharing the same natural key.
    fn upsert_transaction_data(&mut self, row: &NewTransactionData) -> Result<(), IngestError>;

    fn record_upload(&mut self, log: &NewDataUploadLog) -> Result<(), IngestError>;

    /// Runs `work` so that either all of its writes persist or none do.
    fn atomically(
        &mut self,
        work: &mut dyn FnMut(&mut dyn StatisticsStore) -> Result<usize, IngestError>,
    ) -> Result<usize, IngestError>;
}

pub struct PgStore<'a> {
    conn: &'a mut PgConnection,
}

impl<'a> PgStore<'a> {
    pub fn new(conn: &'a mut PgConnection) -> Self {
        Self { conn }
    }
}

impl StatisticsStore for PgStore<'_> {
    fn branch_id(&mut self, code: &str, name: &str) -> Result<i32, IngestError> {
        Ok(get_or_create_branch(self.conn, code, name)?)
    }

    fn master_id(&mut self, kind: MasterKind, name: &str) -> Result<i32, IngestError> {
        Ok(get_or_create_master(self.conn, kind, name)?)
    }

    fn upsert_customer_data(&mut self, row: &NewCustomerData) -> Result<(), IngestError> {
        diesel::insert_into(customer_data::table)
            .values(row)
            .on_conflict((
                customer_data::branch_id,
                customer_data::customer_category_id,
                customer_data::service_type_id,
                customer_data::status,
                customer_data::month_year,
            ))
            .do_update()
            .set((
                customer_data::number_of_customers
                    .eq(excluded(customer_data::number_of_customers)),
                customer_data::updated_at.eq(diesel::dsl::now),
            ))
            .execute(self.conn)?;
        Ok(())
    }

    fn upsert_transaction_data(&mut self, row: &NewTransactionData) -> Result<(), IngestError> {
        diesel::insert_into(transaction_data::table)
            .values(row)
            .on_conflict((
                transaction_data::month_year,
                transaction_data::range_of_transactions,
                transaction_data::instrument_type_id,
                transaction_data::transaction_type_id,
                transaction_data::geographical_location_id,
                transaction_data::channel_used_id,
            ))
            .do_update()
            .set((
                transaction_data::number_of_transactions
                    .eq(excluded(transaction_data::number_of_transactions)),
                transaction_data::amount.eq(excluded(transaction_data::amount)),
                transaction_data::updated_at.eq(diesel::dsl::now),
            ))
            .execute(self.conn)?;
        Ok(())
    }

    fn record_upload(&mut self, log: &NewDataUploadLog) -> Result<(), IngestError> {
        diesel::insert_into(data_upload_logs::table)
            .values(log)
            .execute(self.conn)?;
        Ok(())
    }

    fn atomically(
        &mut self,
        work: &mut dyn FnMut(&mut dyn StatisticsStore) -> Result<usize, IngestError>,
    ) -> Result<usize, IngestError> {
        self.conn
            .transaction(|conn| work(&mut PgStore::new(conn)))
    }
}
