//! Diesel schema for order lifecycle persistence.

diesel::table! {
    /// Agents and administrators.
    users (id) {
        /// Agent identifier.
        id -> Uuid,
        /// Display name.
        name -> Text,
        /// Sign-in PIN.
        #[max_length = 6]
        pin -> Varchar,
        /// `agent` or `admin`.
        #[max_length = 20]
        role -> Varchar,
        /// Whether the user may receive work.
        active -> Bool,
        /// Creation timestamp.
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Source-system stores.
    stores (id) {
        /// Store identifier.
        id -> Uuid,
        /// Unique display name.
        name -> Text,
        /// Source-system handle, such as a shop subdomain.
        handle -> Text,
        /// Whether orders should be pulled for the store.
        active -> Bool,
        /// Creation timestamp.
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Orders and abandoned carts awaiting or past confirmation.
    orders (id) {
        /// Internal order identifier.
        id -> Uuid,
        /// Source-assigned identifier.
        external_id -> Text,
        /// Owning store.
        store_id -> Nullable<Uuid>,
        /// Lead kind.
        #[max_length = 20]
        source -> Varchar,
        /// Ingested customer name.
        customer_name -> Text,
        /// Ingested phone number.
        phone -> Text,
        /// Ingested address.
        address -> Text,
        /// Ingested postal code.
        postal_code -> Text,
        /// Product description.
        product_name -> Text,
        /// Unit price.
        unit_price -> Float8,
        /// Ordered quantity.
        quantity -> Int4,
        /// Source-reported order timestamp.
        ordered_at -> Nullable<Timestamptz>,
        /// Corrected customer name.
        edited_customer_name -> Nullable<Text>,
        /// Corrected phone number.
        edited_phone -> Nullable<Text>,
        /// Corrected address.
        edited_address -> Nullable<Text>,
        /// Corrected postal code.
        edited_postal_code -> Nullable<Text>,
        /// Correction timestamp.
        edited_at -> Nullable<Timestamptz>,
        /// Lifecycle status.
        #[max_length = 20]
        status -> Varchar,
        /// Last disposition label.
        #[max_length = 50]
        final_status -> Nullable<Varchar>,
        /// Number of recorded call attempts.
        attempts -> Int4,
        /// Assigned agent.
        assigned_to -> Nullable<Uuid>,
        /// Assignment timestamp.
        assigned_at -> Nullable<Timestamptz>,
        /// Completion timestamp.
        completed_at -> Nullable<Timestamptz>,
        /// Last successful push to the source system.
        synced_at -> Nullable<Timestamptz>,
        /// Optimistic concurrency revision.
        version -> Int8,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last update timestamp.
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Append-only call attempts.
    call_logs (id) {
        /// Call log identifier.
        id -> Uuid,
        /// Called order.
        order_id -> Uuid,
        /// Calling agent.
        agent_id -> Uuid,
        /// Number dialed.
        phone_dialed -> Text,
        /// Dial start.
        started_at -> Nullable<Timestamptz>,
        /// Call end.
        ended_at -> Nullable<Timestamptz>,
        /// Talk time in seconds.
        duration_secs -> Int4,
        /// Disposition label.
        #[max_length = 50]
        disposition -> Varchar,
        /// Agent notes.
        notes -> Nullable<Text>,
        /// Creation timestamp.
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Daily store-to-agent assignments.
    store_assignments (id) {
        /// Assignment identifier.
        id -> Uuid,
        /// Assigned store.
        store_id -> Uuid,
        /// Assigned agent.
        agent_id -> Uuid,
        /// Calendar day the assignment covers.
        assigned_date -> Date,
        /// Creation timestamp.
        created_at -> Timestamptz,
    }
}

diesel::joinable!(call_logs -> orders (order_id));
diesel::joinable!(orders -> stores (store_id));
diesel::joinable!(store_assignments -> stores (store_id));

diesel::allow_tables_to_appear_in_same_query!(users, stores, orders, call_logs, store_assignments);
