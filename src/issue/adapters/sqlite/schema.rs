//! Diesel schema for issue persistence.

diesel::table! {
    /// Reported facility issues.
    issues (id) {
        /// Issue identifier (UUID text).
        id -> Text,
        /// Short summary.
        title -> Text,
        /// Full description.
        description -> Text,
        /// Free-text location.
        location -> Text,
        /// Current lifecycle status.
        status -> Text,
        /// Urgency.
        priority -> Text,
        /// Category.
        issue_type -> Text,
        /// Map latitude.
        latitude -> Nullable<Double>,
        /// Map longitude.
        longitude -> Nullable<Double>,
        /// Floorplan pin x offset.
        pin_x -> Nullable<Double>,
        /// Floorplan pin y offset.
        pin_y -> Nullable<Double>,
        /// Whether the pin marks an interior position.
        is_interior_pin -> Nullable<Bool>,
        /// Reporting user identifier.
        reported_by_id -> Text,
        /// Reporting user display name.
        reported_by_name -> Text,
        /// Estimated repair cost.
        estimated_cost -> Double,
        /// Final repair cost.
        final_cost -> Nullable<Double>,
        /// Identifier of the user who last fixed the issue.
        fixed_by_id -> Nullable<Text>,
        /// Display name of the user who last fixed the issue.
        fixed_by_name -> Nullable<Text>,
        /// RFC 3339 timestamp of the latest fix.
        fixed_at -> Nullable<Text>,
        /// Whole minutes from creation to the latest fix.
        time_to_fix -> Nullable<BigInt>,
        /// RFC 3339 creation timestamp.
        created_at -> Text,
        /// RFC 3339 latest modification timestamp.
        updated_at -> Text,
    }
}

diesel::table! {
    /// Append-only status transition log.
    status_history (id) {
        /// Record identifier.
        id -> Text,
        /// Owning issue.
        issue_id -> Text,
        /// Status before the transition.
        old_status -> Text,
        /// Status after the transition.
        new_status -> Text,
        /// Acting user identifier.
        changed_by_id -> Nullable<Text>,
        /// Acting user display name.
        changed_by_name -> Nullable<Text>,
        /// Free-text note.
        notes -> Nullable<Text>,
        /// RFC 3339 transition timestamp.
        created_at -> Text,
    }
}

diesel::table! {
    /// Discussion entries on issues.
    comments (id) {
        /// Comment identifier.
        id -> Text,
        /// Commented issue.
        issue_id -> Text,
        /// Author identifier.
        user_id -> Text,
        /// Author display name.
        user_name -> Text,
        /// Comment body.
        content -> Text,
        /// RFC 3339 creation timestamp.
        created_at -> Text,
    }
}

diesel::table! {
    /// Uploaded image references.
    images (id) {
        /// Image identifier.
        id -> Text,
        /// Owning issue.
        issue_id -> Text,
        /// Stored file name.
        filename -> Text,
        /// RFC 3339 upload timestamp.
        created_at -> Text,
    }
}

diesel::joinable!(status_history -> issues (issue_id));
diesel::joinable!(comments -> issues (issue_id));
diesel::joinable!(images -> issues (issue_id));

diesel::allow_tables_to_appear_in_same_query!(issues, status_history, comments, images);
