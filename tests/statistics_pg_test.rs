//! Runs against the database in `DATABASE_URL`; skipped when none is reachable.
//! Every test works inside a transaction that is rolled back.

#[cfg(test)]
mod statistics_pg_tests {
    use bankstats::shared::schema::{
        branches, customer_data, data_upload_logs, total_transactions, total_users,
        transaction_data,
    };
    use bankstats::shared::utils::{run_migrations, DbPool};
    use bankstats::shared::{CustomerStatus, DataType, UploadStatus};
    use bankstats::statistics::ingest::{process_upload, UploadRequest, MAX_FILE_NAME_CHARS};
    use bankstats::statistics::queries::{
        chart_data, customer_table, insert_total_transaction, insert_total_user,
        total_transaction_list, total_transaction_summary, total_user_list, total_user_summary,
        transaction_table,
    };
    use bankstats::statistics::storage::{
        get_or_create_master, NewTotalTransaction, NewTotalUser,
    };
    use bankstats::statistics::types::{MasterKind, TransactionSummaryFilter, UserSummaryFilter};
    use bankstats::statistics::PgStore;
    use bigdecimal::BigDecimal;
    use chrono::NaiveDate;
    use diesel::prelude::*;
    use diesel::r2d2::{ConnectionManager, Pool};
    use std::str::FromStr;
    use std::sync::Mutex;
    use std::time::Duration;
    use uuid::Uuid;

    static MIGRATION_LOCK: Mutex<()> = Mutex::new(());

    fn pool() -> Option<DbPool> {
        let Ok(url) = std::env::var("DATABASE_URL") else {
            println!("Skipping test - DATABASE_URL not set");
            return None;
        };
        let pool = match Pool::builder()
            .max_size(1)
            .connection_timeout(Duration::from_secs(3))
            .build(ConnectionManager::<PgConnection>::new(url))
        {
            Ok(pool) => pool,
            Err(_) => {
                println!("Skipping test - Cannot connect to PostgreSQL");
                return None;
            }
        };
        let _guard = MIGRATION_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        if let Err(e) = run_migrations(&pool) {
            println!("Skipping test - migrations failed: {}", e);
            return None;
        }
        Some(pool)
    }

    /// Empties the fact and log tables; the surrounding test transaction restores them.
    fn clear_facts(conn: &mut PgConnection) {
        diesel::delete(customer_data::table).execute(conn).unwrap();
        diesel::delete(transaction_data::table).execute(conn).unwrap();
        diesel::delete(total_users::table).execute(conn).unwrap();
        diesel::delete(total_transactions::table).execute(conn).unwrap();
        diesel::delete(data_upload_logs::table).execute(conn).unwrap();
    }

    fn unique_tag() -> String {
        Uuid::new_v4().simple().to_string()[..8].to_string()
    }

    fn month() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()
    }

    fn month_of(m: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, m, 1).unwrap()
    }

    fn upload(
        conn: &mut PgConnection,
        data_type: DataType,
        month: NaiveDate,
        file_name: &str,
        csv: &str,
    ) -> UploadStatus {
        let request = UploadRequest {
            data_type,
            month,
            file_name: file_name.to_string(),
            contents: csv.as_bytes().to_vec(),
        };
        process_upload(&mut PgStore::new(conn), &request)
            .unwrap()
            .status
    }

    struct TransactionMasters {
        range: i32,
        instrument: i32,
        location: i32,
        channel: i32,
    }

    impl TransactionMasters {
        fn create(conn: &mut PgConnection, tag: &str) -> Self {
            let mut id =
                |kind: MasterKind| get_or_create_master(conn, kind, &format!("{tag}-{}", kind.slug())).unwrap();
            Self {
                range: id(MasterKind::TransactionRange),
                instrument: id(MasterKind::InstrumentType),
                location: id(MasterKind::GeographicalLocation),
                channel: id(MasterKind::ChannelUsed),
            }
        }

        fn rollup(
            &self,
            fiscal_year: &str,
            month_year: NaiveDate,
            transaction_type_id: i32,
            count: i32,
            amount: &str,
        ) -> NewTotalTransaction {
            NewTotalTransaction {
                fiscal_year: fiscal_year.to_string(),
                month_year,
                transaction_range_id: self.range,
                transaction_type_id,
                instrument_type_id: self.instrument,
                geographical_location_id: self.location,
                channel_used_id: self.channel,
                number_of_transactions: count,
                amount: BigDecimal::from_str(amount).unwrap(),
            }
        }
    }

    fn user_rollup(
        month_year: NaiveDate,
        service_type_id: i32,
        status: CustomerStatus,
        count: i32,
    ) -> NewTotalUser {
        NewTotalUser {
            fiscal_year: "2081/82".to_string(),
            month_year,
            service_type_id,
            status,
            count,
        }
    }

    fn customer_csv(tag: &str, count: i32) -> String {
        format!(
            "Branch code,Branch name,Categorization of customers,Mobile Banking,Status,Number of customers\n\
             {tag}-B1,Branch One,{tag}-Retail,{tag}-Mobile,Active,{count}\n\
             {tag}-B1,Branch One,{tag}-Retail,{tag}-Mobile,INACTIVE,4\n"
        )
    }

    fn customer_rows_for(conn: &mut PgConnection, tag: &str) -> Vec<(String, i32)> {
        customer_data::table
            .inner_join(branches::table)
            .filter(branches::code.eq(format!("{tag}-B1")))
            .select((customer_data::status, customer_data::number_of_customers))
            .order(customer_data::status.asc())
            .load(conn)
            .unwrap()
    }

    #[test]
    fn test_reupload_is_idempotent() {
        let Some(pool) = pool() else { return };
        let mut conn = pool.get().unwrap();
        conn.begin_test_transaction().unwrap();
        let tag = unique_tag();

        for count in [10, 12] {
            let status = upload(
                &mut conn,
                DataType::Customer,
                month(),
                "customers.csv",
                &customer_csv(&tag, count),
            );
            assert_eq!(status, UploadStatus::Success);
        }

        let rows = customer_rows_for(&mut conn, &tag);
        assert_eq!(
            rows,
            vec![("ACTIVE".to_string(), 12), ("INACTIVE".to_string(), 4)]
        );
    }

    #[test]
    fn test_missing_column_persists_nothing() {
        let Some(pool) = pool() else { return };
        let mut conn = pool.get().unwrap();
        conn.begin_test_transaction().unwrap();
        let tag = unique_tag();

        let csv = customer_csv(&tag, 10).replace(",Number of customers", ",Customers");
        let request = UploadRequest {
            data_type: DataType::Customer,
            month: month(),
            file_name: "broken.csv".to_string(),
            contents: csv.into_bytes(),
        };
        let outcome = process_upload(&mut PgStore::new(&mut conn), &request).unwrap();
        assert_eq!(outcome.status, UploadStatus::Failed);
        assert!(outcome
            .error_message
            .unwrap()
            .contains("Number of customers"));
        assert!(customer_rows_for(&mut conn, &tag).is_empty());
    }

    #[test]
    fn test_long_file_name_still_gets_an_audit_row() {
        let Some(pool) = pool() else { return };
        let mut conn = pool.get().unwrap();
        conn.begin_test_transaction().unwrap();
        clear_facts(&mut conn);
        let tag = unique_tag();

        let file_name = format!("{}.csv", "x".repeat(400));
        let status = upload(
            &mut conn,
            DataType::Customer,
            month(),
            &file_name,
            &customer_csv(&tag, 10),
        );
        assert_eq!(status, UploadStatus::Success);

        let logged: Vec<(String, String)> = data_upload_logs::table
            .select((data_upload_logs::file_name, data_upload_logs::status))
            .load(&mut conn)
            .unwrap();
        assert_eq!(logged.len(), 1);
        assert_eq!(logged[0].0.chars().count(), MAX_FILE_NAME_CHARS);
        assert_eq!(logged[0].1, "SUCCESS");
    }

    #[test]
    fn test_negative_count_is_rejected_by_schema() {
        let Some(pool) = pool() else { return };
        let mut conn = pool.get().unwrap();
        conn.begin_test_transaction().unwrap();
        let service =
            get_or_create_master(&mut conn, MasterKind::ServiceType, "schema-check").unwrap();

        let result = diesel::insert_into(total_users::table)
            .values(&user_rollup(month(), service, CustomerStatus::Active, -1))
            .execute(&mut conn);
        assert!(result.is_err());
    }

    #[test]
    fn test_summaries_match_row_sums() {
        let Some(pool) = pool() else { return };
        let mut conn = pool.get().unwrap();
        conn.begin_test_transaction().unwrap();
        let tag = unique_tag();
        let fiscal_year = format!("T{}", &tag[..6]);

        let masters = TransactionMasters::create(&mut conn, &tag);
        let deposit =
            get_or_create_master(&mut conn, MasterKind::TransactionType, &format!("{tag}-deposit"))
                .unwrap();
        let service =
            get_or_create_master(&mut conn, MasterKind::ServiceType, &format!("{tag}-sms")).unwrap();

        for (count, amount) in [(3, "100.25"), (7, "50.50"), (40, "1000.00")] {
            insert_total_transaction(
                &mut conn,
                &masters.rollup(&fiscal_year, month(), deposit, count, amount),
            )
            .unwrap();
        }

        let filter = TransactionSummaryFilter {
            transaction_type_id: Some(deposit),
            max_transactions: Some(10),
            ..Default::default()
        };
        let summary = total_transaction_summary(&mut conn, &filter, None).unwrap();
        assert_eq!(summary.totals.total_transactions, 10);
        assert_eq!(
            summary.totals.total_amount,
            BigDecimal::from_str("150.75").unwrap()
        );
        assert_eq!(summary.page.info.total_items, 2);

        for (status, count) in [
            (CustomerStatus::Active, 30),
            (CustomerStatus::Active, 5),
            (CustomerStatus::Inactive, 2),
        ] {
            let mut row = user_rollup(month(), service, status, count);
            row.fiscal_year = fiscal_year.clone();
            insert_total_user(&mut conn, &row).unwrap();
        }

        let filter = UserSummaryFilter {
            fiscal_year: Some(fiscal_year.clone()),
            month: Some(month()),
        };
        let summary = total_user_summary(&mut conn, &filter, None).unwrap();
        assert_eq!(summary.page.items.len(), 1);
        assert_eq!(summary.page.items[0].service_type, format!("{tag}-sms"));
        assert_eq!(summary.page.items[0].active_count, 35);
        assert_eq!(summary.page.items[0].inactive_count, 2);
    }

    #[test]
    fn test_total_user_list_filters_by_status() {
        let Some(pool) = pool() else { return };
        let mut conn = pool.get().unwrap();
        conn.begin_test_transaction().unwrap();
        clear_facts(&mut conn);
        let tag = unique_tag();
        let service =
            get_or_create_master(&mut conn, MasterKind::ServiceType, &format!("{tag}-atm")).unwrap();

        for (status, count) in [
            (CustomerStatus::Active, 9),
            (CustomerStatus::Active, 8),
            (CustomerStatus::Inactive, 1),
        ] {
            insert_total_user(&mut conn, &user_rollup(month(), service, status, count)).unwrap();
        }

        let inactive = total_user_list(&mut conn, Some(CustomerStatus::Inactive), None).unwrap();
        assert_eq!(inactive.page.info.total_items, 1);
        assert_eq!(inactive.page.items[0].status, CustomerStatus::Inactive);
        assert_eq!(inactive.page.items[0].service_type, format!("{tag}-atm"));
        assert_eq!(inactive.page.items[0].count, 1);

        let all = total_user_list(&mut conn, None, None).unwrap();
        assert_eq!(all.page.info.total_items, 3);
    }

    #[test]
    fn test_total_transaction_list_filters_by_type() {
        let Some(pool) = pool() else { return };
        let mut conn = pool.get().unwrap();
        conn.begin_test_transaction().unwrap();
        clear_facts(&mut conn);
        let tag = unique_tag();
        let masters = TransactionMasters::create(&mut conn, &tag);
        let mut kind = |name: &str| {
            get_or_create_master(&mut conn, MasterKind::TransactionType, &format!("{tag}-{name}"))
                .unwrap()
        };
        let deposit = kind("deposit");
        let withdrawal = kind("withdrawal");

        for (type_id, count) in [(deposit, 4), (deposit, 6), (withdrawal, 2)] {
            insert_total_transaction(
                &mut conn,
                &masters.rollup("2081/82", month(), type_id, count, "10.00"),
            )
            .unwrap();
        }

        let list = total_transaction_list(&mut conn, Some(withdrawal), None).unwrap();
        assert_eq!(list.page.info.total_items, 1);
        assert_eq!(list.page.items[0].transaction_type, format!("{tag}-withdrawal"));
        assert_eq!(list.page.items[0].number_of_transactions, 2);
        assert_eq!(list.transaction_type_id, Some(withdrawal));
        assert!(list.transaction_types.iter().any(|t| t.id == deposit));
        assert!(list.transaction_types.iter().any(|t| t.id == withdrawal));

        let all = total_transaction_list(&mut conn, None, None).unwrap();
        assert_eq!(all.page.info.total_items, 3);
    }

    #[test]
    fn test_chart_data_groups_by_month_and_service() {
        let Some(pool) = pool() else { return };
        let mut conn = pool.get().unwrap();
        conn.begin_test_transaction().unwrap();
        clear_facts(&mut conn);
        let tag = unique_tag();
        let mut service = |name: &str| {
            get_or_create_master(&mut conn, MasterKind::ServiceType, &format!("{tag}-{name}"))
                .unwrap()
        };
        let mobile = service("mobile");
        let internet = service("internet");

        for row in [
            user_rollup(month_of(2), mobile, CustomerStatus::Active, 3),
            user_rollup(month_of(1), internet, CustomerStatus::Active, 10),
            user_rollup(month_of(1), internet, CustomerStatus::Inactive, 5),
        ] {
            insert_total_user(&mut conn, &row).unwrap();
        }

        let masters = TransactionMasters::create(&mut conn, &tag);
        let deposit =
            get_or_create_master(&mut conn, MasterKind::TransactionType, &format!("{tag}-deposit"))
                .unwrap();
        for (m, amount) in [(1, "100.50"), (1, "50.00"), (3, "25.25")] {
            insert_total_transaction(
                &mut conn,
                &masters.rollup("2081/82", month_of(m), deposit, 1, amount),
            )
            .unwrap();
        }

        let chart = chart_data(&mut conn).unwrap();
        let customers = chart.monthly_customers;
        assert_eq!(customers.labels, vec!["Jan 2025", "Feb 2025"]);
        assert_eq!(customers.datasets.len(), 2);
        assert_eq!(customers.datasets[0].label, format!("{tag}-internet"));
        assert_eq!(customers.datasets[0].data, vec![15, 0]);
        assert_eq!(customers.datasets[1].label, format!("{tag}-mobile"));
        assert_eq!(customers.datasets[1].data, vec![0, 3]);

        let transactions = chart.monthly_transactions;
        assert_eq!(transactions.labels, vec!["Jan 2025", "Mar 2025"]);
        assert_eq!(transactions.datasets[0].data, vec![150.5, 25.25]);
    }

    #[test]
    fn test_detail_tables_are_newest_month_first() {
        let Some(pool) = pool() else { return };
        let mut conn = pool.get().unwrap();
        conn.begin_test_transaction().unwrap();
        clear_facts(&mut conn);
        let tag = unique_tag();

        let january = format!(
            "Branch code,Branch name,Categorization of customers,Mobile Banking,Status,Number of customers\n\
             {tag}-B2,Second,{tag}-Retail,{tag}-Mobile,ACTIVE,1\n\
             {tag}-B1,First,{tag}-Retail,{tag}-Mobile,ACTIVE,2\n"
        );
        let february = format!(
            "Branch code,Branch name,Categorization of customers,Mobile Banking,Status,Number of customers\n\
             {tag}-B2,Second,{tag}-Retail,{tag}-Mobile,ACTIVE,3\n"
        );
        assert_eq!(
            upload(&mut conn, DataType::Customer, month_of(1), "jan.csv", &january),
            UploadStatus::Success
        );
        assert_eq!(
            upload(&mut conn, DataType::Customer, month_of(2), "feb.csv", &february),
            UploadStatus::Success
        );

        let customers = customer_table(&mut conn, None).unwrap();
        let order: Vec<(NaiveDate, String)> = customers
            .items
            .iter()
            .map(|r| (r.month_year, r.branch_code.clone()))
            .collect();
        assert_eq!(
            order,
            vec![
                (month_of(2), format!("{tag}-B2")),
                (month_of(1), format!("{tag}-B1")),
                (month_of(1), format!("{tag}-B2")),
            ]
        );
        assert_eq!(customers.items[1].branch_name, "First");
        assert_eq!(customers.items[1].customer_category, format!("{tag}-Retail"));

        let header = "Form of instrument,Type of transaction,Geographical location,Channel used,Range of transactions,Number of transactions,Amount";
        let january = format!(
            "{header}\n\
             Cheque,{tag}-Deposit,Kathmandu,Branch,b-range,1,10\n\
             Cheque,{tag}-Deposit,Kathmandu,Branch,a-range,2,20\n"
        );
        let march = format!("{header}\nCard,{tag}-Deposit,Pokhara,ATM,c-range,3,30\n");
        assert_eq!(
            upload(&mut conn, DataType::Transaction, month_of(1), "jan.csv", &january),
            UploadStatus::Success
        );
        assert_eq!(
            upload(&mut conn, DataType::Transaction, month_of(3), "mar.csv", &march),
            UploadStatus::Success
        );

        let transactions = transaction_table(&mut conn, None).unwrap();
        let ranges: Vec<&str> = transactions
            .items
            .iter()
            .map(|r| r.range_of_transactions.as_str())
            .collect();
        assert_eq!(ranges, vec!["c-range", "a-range", "b-range"]);
        assert_eq!(transactions.items[0].transaction_type, format!("{tag}-Deposit"));
        assert_eq!(transactions.items[0].channel_used, "ATM");
    }

    #[test]
    fn test_out_of_range_page_returns_last_page() {
        let Some(pool) = pool() else { return };
        let mut conn = pool.get().unwrap();
        conn.begin_test_transaction().unwrap();
        clear_facts(&mut conn);
        let tag = unique_tag();
        let service =
            get_or_create_master(&mut conn, MasterKind::ServiceType, &format!("{tag}-pos")).unwrap();

        for count in 0..12 {
            insert_total_user(
                &mut conn,
                &user_rollup(month(), service, CustomerStatus::Active, count),
            )
            .unwrap();
        }

        let last = total_user_list(&mut conn, None, Some("99")).unwrap();
        assert_eq!(last.page.info.number, 2);
        assert_eq!(last.page.info.total_pages, 2);
        assert_eq!(last.page.items.len(), 2);

        let first = total_user_list(&mut conn, None, Some("abc")).unwrap();
        assert_eq!(first.page.info.number, 1);
        assert_eq!(first.page.items.len(), 10);

        let empty = customer_table(&mut conn, Some("5")).unwrap();
        assert_eq!(empty.info.number, 1);
        assert_eq!(empty.info.total_pages, 1);
        assert!(empty.items.is_empty());
    }
}
