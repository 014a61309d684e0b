//! Diesel schema for user persistence.

diesel::table! {
    /// Registered users.
    users (id) {
        /// User identifier (UUID text).
        id -> Text,
        /// Unique, case-sensitive username.
        username -> Text,
        /// Optional email address.
        email -> Nullable<Text>,
        /// Role name.
        role -> Text,
        /// RFC 3339 registration timestamp.
        created_at -> Text,
    }
}
