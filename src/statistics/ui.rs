use bigdecimal::BigDecimal;
use chrono::NaiveDate;

use crate::shared::{CustomerStatus, DataType};
use crate::web::flash::{Flash, FlashLevel};

use super::pagination::{Page, PageInfo};
use super::storage::{DbDataUploadLog, DbMaster};
use super::types::{
    CustomerDataView, DashboardOverview, DataTable, MasterListing, TotalTransactionList,
    TotalUserList, TransactionDataView, TransactionSummary, UserSummary,
};

/// Per-request chrome shared by every page.
#[derive(Debug, Clone, Default)]
pub struct PageContext {
    pub username: Option<String>,
    pub flash: Option<Flash>,
}

pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

const STYLE: &str = r#"
        * { box-sizing: border-box; margin: 0; padding: 0; }
        body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; background: #f8f9fc; color: #3a3b45; }
        .topbar { display: flex; align-items: center; gap: 20px; padding: 14px 24px; background: #4e73df; color: white; }
        .topbar a { color: rgba(255,255,255,0.85); text-decoration: none; font-size: 14px; }
        .topbar a.active, .topbar a:hover { color: white; font-weight: 600; }
        .topbar .brand { font-weight: 700; font-size: 18px; margin-right: 12px; }
        .topbar .user { margin-left: auto; font-size: 13px; }
        .container { max-width: 1400px; margin: 0 auto; padding: 24px; }
        h1 { font-size: 24px; margin-bottom: 20px; color: #1a1a1a; }
        h2 { font-size: 18px; margin: 24px 0 12px; }
        .cards { display: grid; grid-template-columns: repeat(auto-fill, minmax(240px, 1fr)); gap: 16px; margin-bottom: 24px; }
        .card { background: white; border-radius: 8px; padding: 20px; box-shadow: 0 2px 8px rgba(0,0,0,0.06); }
        .card .label { font-size: 12px; text-transform: uppercase; color: #858796; }
        .card .value { font-size: 26px; font-weight: 700; margin-top: 6px; }
        table { width: 100%; border-collapse: collapse; background: white; box-shadow: 0 2px 8px rgba(0,0,0,0.06); }
        th, td { padding: 10px 12px; border-bottom: 1px solid #e3e6f0; text-align: left; font-size: 14px; }
        th { background: #f1f3f9; font-weight: 600; }
        td.num { text-align: right; font-variant-numeric: tabular-nums; }
        .flash { padding: 12px 16px; border-radius: 6px; margin-bottom: 16px; }
        .flash-success { background: #d4edda; color: #155724; }
        .flash-error { background: #f8d7da; color: #721c24; }
        form.filters { display: flex; flex-wrap: wrap; gap: 12px; align-items: flex-end; margin-bottom: 16px; }
        label { display: block; font-size: 13px; margin-bottom: 4px; }
        input, select { padding: 8px 10px; border: 1px solid #d1d3e2; border-radius: 6px; font-size: 14px; }
        .btn { padding: 9px 18px; border: none; border-radius: 6px; cursor: pointer; font-size: 14px; background: #4e73df; color: white; text-decoration: none; }
        .tabs { display: flex; gap: 4px; margin-bottom: 16px; }
        .tabs a { padding: 8px 16px; border-radius: 6px; text-decoration: none; color: #4e73df; }
        .tabs a.active { background: #4e73df; color: white; }
        .pagination { display: flex; gap: 8px; align-items: center; margin-top: 16px; font-size: 14px; }
        .pagination a { color: #4e73df; text-decoration: none; }
        .status-SUCCESS { color: #1cc88a; font-weight: 600; }
        .status-FAILED { color: #e74a3b; font-weight: 600; }
        .status-PARTIAL { color: #f6c23e; font-weight: 600; }
        .empty { padding: 24px; text-align: center; color: #858796; }
        .charts { display: grid; grid-template-columns: repeat(auto-fit, minmax(420px, 1fr)); gap: 16px; }
"#;

const NAV: [(&str, &str); 7] = [
    ("/", "Dashboard"),
    ("/master-parameters", "Master Parameters"),
    ("/data-upload", "Upload"),
    ("/data-tables", "Data Tables"),
    ("/total-users", "Total Users"),
    ("/total-transactions", "Total Transactions"),
    ("/total-transactions/summary", "Transaction Summary"),
];

pub fn layout(title: &str, active: &str, ctx: &PageContext, body: &str) -> String {
    let nav: String = NAV
        .iter()
        .map(|(href, label)| {
            let class = if *href == active { " class=\"active\"" } else { "" };
            format!(r#"<a href="{href}"{class}>{label}</a>"#)
        })
        .collect();
    let user = ctx
        .username
        .as_deref()
        .map(|name| {
            format!(
                r#"<span class="user">{} · <a href="/logout">Logout</a></span>"#,
                html_escape(name)
            )
        })
        .unwrap_or_default();

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title} · Bank Statistics</title>
    <style>{STYLE}</style>
</head>
<body>
    <nav class="topbar"><span class="brand">Bank Statistics</span>{nav}{user}</nav>
    <div class="container">
        {flash}
        <h1>{title}</h1>
        {body}
    </div>
</body>
</html>"#,
        title = html_escape(title),
        flash = render_flash(ctx.flash.as_ref()),
    )
}

fn render_flash(flash: Option<&Flash>) -> String {
    match flash {
        Some(flash) => {
            let class = match flash.level {
                FlashLevel::Success => "flash-success",
                FlashLevel::Error => "flash-error",
            };
            format!(
                r#"<div class="flash {class}">{}</div>"#,
                html_escape(&flash.message)
            )
        }
        None => String::new(),
    }
}

fn month_cell(month: NaiveDate) -> String {
    month.format("%Y-%m").to_string()
}

fn amount_cell(amount: &BigDecimal) -> String {
    amount.with_scale(2).to_string()
}

fn empty_row(columns: usize, message: &str) -> String {
    format!(r#"<tr><td colspan="{columns}" class="empty">{message}</td></tr>"#)
}

/// Previous/next links that keep the other query parameters.
pub fn render_pagination(info: &PageInfo, path: &str, params: &[(&str, String)]) -> String {
    if info.total_pages <= 1 {
        return String::new();
    }
    let link = |page: i64, text: &str| {
        let mut query: Vec<String> = params
            .iter()
            .filter(|(_, value)| !value.is_empty())
            .map(|(key, value)| format!("{key}={}", urlencoding::encode(value)))
            .collect();
        query.push(format!("page={page}"));
        format!(
            r#"<a href="{path}?{}">{text}</a>"#,
            html_escape(&query.join("&"))
        )
    };

    let mut out = String::from(r#"<div class="pagination">"#);
    if info.has_previous() {
        out.push_str(&link(1, "&laquo; first"));
        out.push_str(&link(info.number - 1, "previous"));
    }
    out.push_str(&format!(
        "<span>Page {} of {}</span>",
        info.number, info.total_pages
    ));
    if info.has_next() {
        out.push_str(&link(info.number + 1, "next"));
        out.push_str(&link(info.total_pages, "last &raquo;"));
    }
    out.push_str("</div>");
    out
}

fn master_options(entries: &[DbMaster], selected: Option<i32>) -> String {
    let mut out = String::from(r#"<option value="">All</option>"#);
    for entry in entries {
        let sel = if Some(entry.id) == selected { " selected" } else { "" };
        out.push_str(&format!(
            r#"<option value="{}"{sel}>{}</option>"#,
            entry.id,
            html_escape(&entry.name)
        ));
    }
    out
}

fn upload_log_rows(logs: &[DbDataUploadLog]) -> String {
    if logs.is_empty() {
        return empty_row(6, "No uploads yet.");
    }
    logs.iter()
        .map(|log| {
            format!(
                r#"<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td class="num">{}</td><td class="status-{}">{}</td></tr>"#,
                log.upload_date.format("%Y-%m-%d %H:%M"),
                month_cell(log.month_year),
                log.data_type.label(),
                html_escape(&log.file_name),
                log.records_uploaded,
                log.status,
                log.status,
            )
        })
        .collect()
}

// ============================================================================
// Pages
// ============================================================================

pub fn render_home(overview: &DashboardOverview, ctx: &PageContext) -> String {
    let counts = &overview.counts;
    let body = format!(
        r#"<div class="cards">
            <div class="card"><div class="label">Branches</div><div class="value">{}</div></div>
            <div class="card"><div class="label">Customer Records</div><div class="value">{}</div></div>
            <div class="card"><div class="label">Transaction Records</div><div class="value">{}</div></div>
        </div>
        <div class="charts">
            <div class="card"><canvas id="customersChart"></canvas></div>
            <div class="card"><canvas id="transactionsChart"></canvas></div>
        </div>
        <h2>Recent Uploads</h2>
        <table>
            <thead><tr><th>Uploaded</th><th>Month</th><th>Type</th><th>File</th><th>Records</th><th>Status</th></tr></thead>
            <tbody>{}</tbody>
        </table>
        <script src="https://cdn.jsdelivr.net/npm/chart.js"></script>
        <script>
            fetch('/api/dashboard-data')
                .then(r => r.json())
                .then(data => {{
                    new Chart(document.getElementById('customersChart'), {{
                        type: 'line',
                        data: data.monthly_customers,
                        options: {{ plugins: {{ title: {{ display: true, text: 'Monthly Users by Service' }} }} }}
                    }});
                    new Chart(document.getElementById('transactionsChart'), {{
                        type: 'line',
                        data: data.monthly_transactions,
                        options: {{ plugins: {{ title: {{ display: true, text: 'Monthly Transaction Amount' }} }} }}
                    }});
                }});
        </script>"#,
        counts.total_branches,
        counts.total_customer_records,
        counts.total_transaction_records,
        upload_log_rows(&overview.recent_uploads),
    );
    layout("Dashboard", "/", ctx, &body)
}

pub fn render_master_listing(listing: &MasterListing, ctx: &PageContext) -> String {
    let mut body = String::from("<h2>Branches</h2><table><thead><tr><th>Code</th><th>Name</th></tr></thead><tbody>");
    if listing.branches.is_empty() {
        body.push_str(&empty_row(2, "No branches yet."));
    }
    for branch in &listing.branches {
        body.push_str(&format!(
            "<tr><td>{}</td><td>{}</td></tr>",
            html_escape(&branch.code),
            html_escape(&branch.name)
        ));
    }
    body.push_str("</tbody></table>");

    for group in &listing.groups {
        body.push_str(&format!(
            "<h2>{}</h2><table><thead><tr><th>ID</th><th>Name</th></tr></thead><tbody>",
            group.kind.label()
        ));
        if group.entries.is_empty() {
            body.push_str(&empty_row(2, "None yet."));
        }
        for entry in &group.entries {
            body.push_str(&format!(
                "<tr><td>{}</td><td>{}</td></tr>",
                entry.id,
                html_escape(&entry.name)
            ));
        }
        body.push_str("</tbody></table>");
    }
    layout("Master Parameters", "/master-parameters", ctx, &body)
}

pub fn render_upload_form(ctx: &PageContext) -> String {
    let options: String = [DataType::Customer, DataType::Transaction]
        .iter()
        .map(|t| format!(r#"<option value="{}">{}</option>"#, t, t.label()))
        .collect();
    let body = format!(
        r#"<div class="card">
            <form method="post" action="/data-upload" enctype="multipart/form-data">
                <p><label for="data_type">Data type</label>
                <select id="data_type" name="data_type" required><option value="">Select…</option>{options}</select></p><br>
                <p><label for="month_year">Month</label>
                <input id="month_year" type="month" name="month_year" placeholder="YYYY-MM" required></p><br>
                <p><label for="data_file">CSV file</label>
                <input id="data_file" type="file" name="data_file" accept=".csv,text/csv" required></p><br>
                <button class="btn" type="submit">Upload</button>
            </form>
        </div>"#
    );
    layout("Data Upload", "/data-upload", ctx, &body)
}

fn customer_rows(page: &Page<CustomerDataView>) -> String {
    if page.items.is_empty() {
        return empty_row(7, "No customer data uploaded yet.");
    }
    page.items
        .iter()
        .map(|row| {
            format!(
                r#"<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td class="num">{}</td></tr>"#,
                month_cell(row.month_year),
                html_escape(&row.branch_code),
                html_escape(&row.branch_name),
                html_escape(&row.customer_category),
                html_escape(&row.service_type),
                row.status.label(),
                row.number_of_customers,
            )
        })
        .collect()
}

fn transaction_rows(page: &Page<TransactionDataView>) -> String {
    if page.items.is_empty() {
        return empty_row(8, "No transaction data uploaded yet.");
    }
    page.items
        .iter()
        .map(|row| {
            format!(
                r#"<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td class="num">{}</td><td class="num">{}</td></tr>"#,
                month_cell(row.month_year),
                html_escape(&row.range_of_transactions),
                html_escape(&row.instrument_type),
                html_escape(&row.transaction_type),
                html_escape(&row.geographical_location),
                html_escape(&row.channel_used),
                row.number_of_transactions,
                amount_cell(&row.amount),
            )
        })
        .collect()
}

pub enum DataTablePage {
    Customer(Page<CustomerDataView>),
    Transaction(Page<TransactionDataView>),
}

pub fn render_data_tables(data: &DataTablePage, ctx: &PageContext) -> String {
    let (table, head, rows, info) = match data {
        DataTablePage::Customer(page) => (
            DataTable::Customer,
            "<th>Month</th><th>Branch Code</th><th>Branch Name</th><th>Category</th><th>Service</th><th>Status</th><th>Customers</th>",
            customer_rows(page),
            &page.info,
        ),
        DataTablePage::Transaction(page) => (
            DataTable::Transaction,
            "<th>Month</th><th>Range</th><th>Instrument</th><th>Type</th><th>Location</th><th>Channel</th><th>Transactions</th><th>Amount</th>",
            transaction_rows(page),
            &page.info,
        ),
    };
    let tab = |t: DataTable, value: &str, label: &str| {
        let class = if t == table { r#" class="active""# } else { "" };
        format!(r#"<a href="/data-tables?type={value}"{class}>{label}</a>"#)
    };
    let type_param = match table {
        DataTable::Customer => "customer",
        DataTable::Transaction => "transaction",
    };
    let body = format!(
        r#"<div class="tabs">{}{}</div>
        <table><thead><tr>{head}</tr></thead><tbody>{rows}</tbody></table>
        {}"#,
        tab(DataTable::Customer, "customer", "Customer Data"),
        tab(DataTable::Transaction, "transaction", "Transaction Data"),
        render_pagination(info, "/data-tables", &[("type", type_param.to_string())]),
    );
    layout("Data Tables", "/data-tables", ctx, &body)
}

pub fn render_total_user_list(list: &TotalUserList, ctx: &PageContext) -> String {
    let status_options: String = [CustomerStatus::Active, CustomerStatus::Inactive]
        .iter()
        .map(|s| {
            let sel = if Some(*s) == list.status { " selected" } else { "" };
            format!(r#"<option value="{}"{sel}>{}</option>"#, s, s.label())
        })
        .collect();
    let rows: String = if list.page.items.is_empty() {
        empty_row(5, "No records found.")
    } else {
        list.page
            .items
            .iter()
            .map(|row| {
                format!(
                    r#"<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td class="num">{}</td></tr>"#,
                    html_escape(&row.fiscal_year),
                    month_cell(row.month_year),
                    html_escape(&row.service_type),
                    row.status.label(),
                    row.count,
                )
            })
            .collect()
    };
    let status_param = list.status.map(|s| s.to_string()).unwrap_or_default();
    let body = format!(
        r#"<form class="filters" method="get">
            <div><label for="status">Status</label><select id="status" name="status"><option value="">All</option>{status_options}</select></div>
            <button class="btn" type="submit">Filter</button>
            <a class="btn" href="/total-users/summary">Summary</a>
        </form>
        <table>
            <thead><tr><th>Fiscal Year</th><th>Month</th><th>Service</th><th>Status</th><th>Count</th></tr></thead>
            <tbody>{rows}</tbody>
        </table>
        {}"#,
        render_pagination(&list.page.info, "/total-users", &[("status", status_param)]),
    );
    layout("Total Users", "/total-users", ctx, &body)
}

fn total_transaction_rows(page: &Page<super::types::TotalTransactionView>) -> String {
    if page.items.is_empty() {
        return empty_row(9, "No records found.");
    }
    page.items
        .iter()
        .map(|row| {
            format!(
                r#"<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td class="num">{}</td><td class="num">{}</td></tr>"#,
                html_escape(&row.fiscal_year),
                month_cell(row.month_year),
                html_escape(&row.transaction_range),
                html_escape(&row.transaction_type),
                html_escape(&row.instrument_type),
                html_escape(&row.geographical_location),
                html_escape(&row.channel_used),
                row.number_of_transactions,
                amount_cell(&row.amount),
            )
        })
        .collect()
}

const TOTAL_TRANSACTION_HEAD: &str = "<th>Fiscal Year</th><th>Month</th><th>Range</th><th>Type</th><th>Instrument</th><th>Location</th><th>Channel</th><th>Transactions</th><th>Amount</th>";

pub fn render_total_transaction_list(list: &TotalTransactionList, ctx: &PageContext) -> String {
    let type_param = list
        .transaction_type_id
        .map(|id| id.to_string())
        .unwrap_or_default();
    let body = format!(
        r#"<form class="filters" method="get">
            <div><label for="transaction_type">Transaction type</label><select id="transaction_type" name="transaction_type">{}</select></div>
            <button class="btn" type="submit">Filter</button>
        </form>
        <table>
            <thead><tr>{TOTAL_TRANSACTION_HEAD}</tr></thead>
            <tbody>{}</tbody>
        </table>
        {}"#,
        master_options(&list.transaction_types, list.transaction_type_id),
        total_transaction_rows(&list.page),
        render_pagination(
            &list.page.info,
            "/total-transactions",
            &[("transaction_type", type_param)]
        ),
    );
    layout("Total Transactions", "/total-transactions", ctx, &body)
}

pub fn render_user_summary(summary: &UserSummary, ctx: &PageContext) -> String {
    let fiscal_year = summary.filter.fiscal_year.clone().unwrap_or_default();
    let month = summary.filter.month.map(month_cell).unwrap_or_default();
    let rows: String = if summary.page.items.is_empty() {
        empty_row(4, "No records found.")
    } else {
        summary
            .page
            .items
            .iter()
            .map(|row| {
                format!(
                    r#"<tr><td>{}</td><td>{}</td><td class="num">{}</td><td class="num">{}</td></tr>"#,
                    month_cell(row.month_year),
                    html_escape(&row.service_type),
                    row.active_count,
                    row.inactive_count,
                )
            })
            .collect()
    };
    let body = format!(
        r#"<form class="filters" method="get">
            <div><label for="fiscal_year">Fiscal year</label><input id="fiscal_year" name="fiscal_year" value="{}"></div>
            <div><label for="month_year">Month</label><input id="month_year" type="month" name="month_year" value="{}"></div>
            <button class="btn" type="submit">Filter</button>
        </form>
        <table>
            <thead><tr><th>Month</th><th>Service</th><th>Active</th><th>Inactive</th></tr></thead>
            <tbody>{rows}</tbody>
        </table>
        {}"#,
        html_escape(&fiscal_year),
        month,
        render_pagination(
            &summary.page.info,
            "/total-users/summary",
            &[("fiscal_year", fiscal_year.clone()), ("month_year", month.clone())]
        ),
    );
    layout("Total User Summary", "/total-users", ctx, &body)
}

pub fn render_transaction_summary(summary: &TransactionSummary, ctx: &PageContext) -> String {
    let filter = &summary.filter;
    let options = &summary.options;
    let number = |value: Option<i32>| value.map(|v| v.to_string()).unwrap_or_default();
    let select = |name: &str, label: &str, entries: &[DbMaster], selected: Option<i32>| {
        format!(
            r#"<div><label for="{name}">{label}</label><select id="{name}" name="{name}">{}</select></div>"#,
            master_options(entries, selected)
        )
    };
    let params = [
        ("transaction_range", number(filter.transaction_range_id)),
        ("type_of_transaction", number(filter.transaction_type_id)),
        ("form_of_instrument", number(filter.instrument_type_id)),
        ("geographical_location", number(filter.geographical_location_id)),
        ("channel_used", number(filter.channel_used_id)),
        ("min_transactions", number(filter.min_transactions)),
        ("max_transactions", number(filter.max_transactions)),
    ];
    let body = format!(
        r#"<form class="filters" method="get">
            {}{}{}{}{}
            <div><label for="min_transactions">Min transactions</label><input id="min_transactions" name="min_transactions" type="number" min="0" value="{}"></div>
            <div><label for="max_transactions">Max transactions</label><input id="max_transactions" name="max_transactions" type="number" min="0" value="{}"></div>
            <button class="btn" type="submit">Filter</button>
        </form>
        <div class="cards">
            <div class="card"><div class="label">Total Transactions</div><div class="value">{}</div></div>
            <div class="card"><div class="label">Total Amount</div><div class="value">{}</div></div>
        </div>
        <table>
            <thead><tr>{TOTAL_TRANSACTION_HEAD}</tr></thead>
            <tbody>{}</tbody>
        </table>
        {}"#,
        select("transaction_range", "Range", &options.transaction_ranges, filter.transaction_range_id),
        select("type_of_transaction", "Type", &options.transaction_types, filter.transaction_type_id),
        select("form_of_instrument", "Instrument", &options.instrument_types, filter.instrument_type_id),
        select(
            "geographical_location",
            "Location",
            &options.geographical_locations,
            filter.geographical_location_id
        ),
        select("channel_used", "Channel", &options.channels_used, filter.channel_used_id),
        params[5].1,
        params[6].1,
        summary.totals.total_transactions,
        amount_cell(&summary.totals.total_amount),
        total_transaction_rows(&summary.page),
        render_pagination(&summary.page.info, "/total-transactions/summary", &params),
    );
    layout(
        "Total Transaction Summary",
        "/total-transactions/summary",
        ctx,
        &body,
    )
}

pub fn render_login(error: Option<&str>, username: &str) -> String {
    let error = error
        .map(|e| format!(r#"<div class="flash flash-error">{}</div>"#, html_escape(e)))
        .unwrap_or_default();
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Login · Bank Statistics</title>
    <style>{STYLE}
        .login {{ max-width: 380px; margin: 10vh auto; }}
        .login input {{ width: 100%; margin-bottom: 14px; }}
        .login .btn {{ width: 100%; }}
    </style>
</head>
<body>
    <div class="login card">
        <h1>Sign in</h1>
        {error}
        <form method="post" action="/login">
            <label for="username">Username</label>
            <input id="username" name="username" value="{}" autofocus required>
            <label for="password">Password</label>
            <input id="password" type="password" name="password" required>
            <button class="btn" type="submit">Login</button>
        </form>
    </div>
</body>
</html>"#,
        html_escape(username)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_html_escape() {
        assert_eq!(
            html_escape(r#"<b>"A&B"</b>"#),
            "&lt;b&gt;&quot;A&amp;B&quot;&lt;/b&gt;"
        );
    }

    #[test]
    fn test_pagination_keeps_filters() {
        let info = PageInfo::resolve(Some("2"), 35, 10);
        let html = render_pagination(
            &info,
            "/total-users",
            &[("status", "ACTIVE".to_string()), ("empty", String::new())],
        );
        assert!(html.contains("Page 2 of 4"));
        assert!(html.contains("/total-users?status=ACTIVE&amp;page=3"));
        assert!(html.contains("/total-users?status=ACTIVE&amp;page=1"));
        assert!(!html.contains("empty="));
    }

    #[test]
    fn test_single_page_has_no_navigation() {
        let info = PageInfo::resolve(None, 3, 10);
        assert!(render_pagination(&info, "/data-tables", &[]).is_empty());
    }

    #[test]
    fn test_layout_escapes_flash_and_user() {
        let ctx = PageContext {
            username: Some("<admin>".to_string()),
            flash: Some(Flash::error("Upload failed: <bad>")),
        };
        let html = layout("Upload", "/data-upload", &ctx, "");
        assert!(html.contains("&lt;admin&gt;"));
        assert!(html.contains("Upload failed: &lt;bad&gt;"));
        assert!(html.contains(r#"<a href="/data-upload" class="active">"#));
    }

    #[test]
    fn test_login_page_shows_error() {
        let html = render_login(Some("Invalid username or password."), "teller");
        assert!(html.contains("Invalid username or password."));
        assert!(html.contains(r#"value="teller""#));
    }
}
