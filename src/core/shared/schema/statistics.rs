diesel::table! {
    branches (id) {
        id -> Int4,
        code -> Varchar,
        name -> Varchar,
    }
}

diesel::table! {
    customer_categories (id) {
        id -> Int4,
        name -> Varchar,
    }
}

diesel::table! {
    service_types (id) {
        id -> Int4,
        name -> Varchar,
    }
}

diesel::table! {
    transaction_ranges (id) {
        id -> Int4,
        name -> Varchar,
    }
}

diesel::table! {
    transaction_types (id) {
        id -> Int4,
        name -> Varchar,
    }
}

diesel::table! {
    instrument_types (id) {
        id -> Int4,
        name -> Varchar,
    }
}

diesel::table! {
    geographical_locations (id) {
        id -> Int4,
        name -> Varchar,
    }
}

diesel::table! {
    channels_used (id) {
        id -> Int4,
        name -> Varchar,
    }
}

diesel::table! {
    customer_data (id) {
        id -> Int8,
        branch_id -> Int4,
        customer_category_id -> Int4,
        service_type_id -> Int4,
        status -> Varchar,
        number_of_customers -> Int4,
        month_year -> Date,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    transaction_data (id) {
        id -> Int8,
        month_year -> Date,
        range_of_transactions -> Varchar,
        instrument_type_id -> Int4,
        transaction_type_id -> Int4,
        geographical_location_id -> Int4,
        channel_used_id -> Int4,
        number_of_transactions -> Int4,
        amount -> Numeric,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    total_users (id) {
        id -> Int8,
        fiscal_year -> Varchar,
        month_year -> Date,
        service_type_id -> Int4,
        status -> Varchar,
        count -> Int4,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    total_transactions (id) {
        id -> Int8,
        fiscal_year -> Varchar,
        month_year -> Date,
        transaction_range_id -> Int4,
        transaction_type_id -> Int4,
        instrument_type_id -> Int4,
        geographical_location_id -> Int4,
        channel_used_id -> Int4,
        number_of_transactions -> Int4,
        amount -> Numeric,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    data_upload_logs (id) {
        id -> Int8,
        upload_date -> Timestamptz,
        month_year -> Date,
        data_type -> Varchar,
        file_name -> Varchar,
        records_uploaded -> Int4,
        status -> Varchar,
        error_message -> Nullable<Text>,
    }
}

diesel::joinable!(customer_data -> branches (branch_id));
diesel::joinable!(customer_data -> customer_categories (customer_category_id));
diesel::joinable!(customer_data -> service_types (service_type_id));
diesel::joinable!(transaction_data -> instrument_types (instrument_type_id));
diesel::joinable!(transaction_data -> transaction_types (transaction_type_id));
diesel::joinable!(transaction_data -> geographical_locations (geographical_location_id));
diesel::joinable!(transaction_data -> channels_used (channel_used_id));
diesel::joinable!(total_users -> service_types (service_type_id));
diesel::joinable!(total_transactions -> transaction_ranges (transaction_range_id));
diesel::joinable!(total_transactions -> transaction_types (transaction_type_id));
diesel::joinable!(total_transactions -> instrument_types (instrument_type_id));
diesel::joinable!(total_transactions -> geographical_locations (geographical_location_id));
diesel::joinable!(total_transactions -> channels_used (channel_used_id));

diesel::allow_tables_to_appear_in_same_query!(
    branches,
    customer_categories,
    service_types,
    transaction_ranges,
    transaction_types,
    instrument_types,
    geographical_locations,
    channels_used,
    customer_data,
    transaction_data,
    total_users,
    total_transactions,
    data_upload_logs,
);

diesel::allow_columns_to_appear_in_same_group_by_clause!(
    total_users::month_year,
    service_types::name,
);
