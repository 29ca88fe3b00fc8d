//! Database schema definitions for Diesel.

diesel::table! {
    users (id) {
        id -> Integer,
        email -> Text,
        name -> Text,
        password_hash -> Text,
        is_staff -> Bool,
        is_active -> Bool,
        api_token -> Nullable<Text>,
        created_at -> Timestamp,
        updated_at -> Timestamp,
    }
}

diesel::table! {
    dj_profiles (id) {
        id -> Integer,
        user_id -> Nullable<Integer>,
        name -> Text,
        image -> Nullable<Text>,
        image_name -> Nullable<Text>,
        is_active -> Bool,
        created_at -> Timestamp,
        updated_at -> Timestamp,
    }
}

diesel::table! {
    locations (id) {
        id -> Integer,
        name -> Text,
        latitude -> Double,
        longitude -> Double,
        is_active -> Bool,
        created_at -> Timestamp,
        updated_at -> Timestamp,
    }
}

diesel::table! {
    events (id) {
        id -> Integer,
        name -> Text,
        dj_id -> Integer,
        location_id -> Integer,
        start_at -> Timestamp,
        end_at -> Timestamp,
        image -> Nullable<Text>,
        image_name -> Nullable<Text>,
        is_active -> Bool,
        created_at -> Timestamp,
        updated_at -> Timestamp,
    }
}

diesel::table! {
    songs (id) {
        id -> Integer,
        artist -> Text,
        name -> Text,
        spotify_url -> Text,
        image_url -> Text,
        is_active -> Bool,
        created_at -> Timestamp,
        updated_at -> Timestamp,
    }
}

diesel::table! {
    song_requests (id) {
        id -> Integer,
        song_id -> Integer,
        user_id -> Integer,
        dj_id -> Integer,
        event_id -> Integer,
        status -> Text,
        last_status_timestamp -> Timestamp,
        is_active -> Bool,
        created_at -> Timestamp,
        updated_at -> Timestamp,
    }
}

diesel::joinable!(dj_profiles -> users (user_id));
diesel::joinable!(events -> users (dj_id));
diesel::joinable!(events -> locations (location_id));
diesel::joinable!(song_requests -> songs (song_id));
diesel::joinable!(song_requests -> events (event_id));

diesel::allow_tables_to_appear_in_same_query!(
    users,
    dj_profiles,
    locations,
    events,
    songs,
    song_requests,
);
