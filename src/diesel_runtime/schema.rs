// Mirrors migrations/2025-01-01-000000_create_messaging/up.sql

diesel::table! {
    telecom_numbers (name) {
        name -> Text,
        phone_number -> Text,
        status -> Bool,
    }
}

diesel::table! {
    businesses (name) {
        name -> Text,
        business_name -> Nullable<Text>,
        telecom_number -> Nullable<Text>,
    }
}

diesel::table! {
    message_logs (name) {
        name -> Text,
        business -> Text,
        twilio_phone_number -> Text,
        phone_number -> Text,
        sms_content -> Text,
        actual_content -> Text,
        status -> Text,
        direction -> Text,
        call_id -> Nullable<Text>,
        fail_reason -> Text,
        twilio_message_sid -> Text,
        extra_data -> Text,
        created_at -> Timestamp,
    }
}

diesel::table! {
    error_logs (name) {
        name -> Text,
        title -> Text,
        message -> Text,
        created_at -> Timestamp,
    }
}

diesel::allow_tables_to_appear_in_same_query!(
    telecom_numbers,
    businesses,
    message_logs,
    error_logs,
);
