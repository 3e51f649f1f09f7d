//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match the migrations exactly; regenerate with
//! `diesel print-schema` after a migration changes the schema.

diesel::table! {
    /// Registered user accounts.
    users (id) {
        /// Primary key: UUID v4 identifier.
        id -> Uuid,
        /// Unique login name (max 150 characters).
        #[max_length = 150]
        username -> Varchar,
        /// Argon2id PHC string for the account password.
        password_hash -> Text,
        /// Record creation timestamp.
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// API tokens, one per user, issued at registration.
    auth_tokens (token) {
        /// Primary key: 40 lowercase hex characters.
        #[max_length = 40]
        token -> Varchar,
        /// Owning user.
        user_id -> Uuid,
        /// Token issuance timestamp.
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Courses offered by teachers.
    courses (id) {
        /// Primary key: UUID v4 identifier.
        id -> Uuid,
        /// Unique course name (max 255 characters).
        #[max_length = 255]
        name -> Varchar,
        /// Free-text course introduction.
        introduction -> Text,
        /// Owning teacher (references `users.id`).
        teacher_id -> Uuid,
        /// Price in minor units (cents); listing orders by this column.
        price_cents -> Int8,
        /// Record creation timestamp.
        created_at -> Timestamptz,
        /// Last modification timestamp, refreshed on every update.
        updated_at -> Timestamptz,
    }
}

diesel::joinable!(auth_tokens -> users (user_id));
diesel::joinable!(courses -> users (teacher_id));

diesel::allow_tables_to_appear_in_same_query!(auth_tokens, courses, users);
