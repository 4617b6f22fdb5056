diesel::table! {
    profiles (user_id) {
        user_id -> Text,
        tenant_id -> Nullable<Text>,
        company_id -> Nullable<Uuid>,
        role -> Text,
        primary_site_id -> Nullable<Uuid>,
        primary_value_stream_id -> Nullable<Uuid>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    companies (id) {
        id -> Uuid,
        tenant_id -> Text,
        name -> Text,
        description -> Nullable<Text>,
        industry -> Nullable<Text>,
        created_by -> Nullable<Text>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    sites (id) {
        id -> Uuid,
        tenant_id -> Text,
        name -> Text,
        location -> Nullable<Text>,
        address -> Nullable<Text>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    value_streams (id) {
        id -> Uuid,
        site_id -> Uuid,
        tenant_id -> Text,
        name -> Text,
        description -> Nullable<Text>,
        target_cycle_time -> Nullable<Text>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    contacts (id) {
        id -> Uuid,
        owner_id -> Text,
        name -> Text,
        email -> Nullable<Text>,
        phone -> Nullable<Text>,
        notes -> Nullable<Text>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::joinable!(profiles -> companies (company_id));
diesel::joinable!(value_streams -> sites (site_id));

diesel::allow_tables_to_appear_in_same_query!(profiles, companies, sites, value_streams, contacts);
