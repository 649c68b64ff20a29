diesel::table! {
    users (id) {
        id -> Uuid,
        username -> Varchar,
        password_hash -> Text,
        is_active -> Bool,
        created_at -> Timestamptz,
    }
}
