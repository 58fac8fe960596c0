table! {
    exchange_user (id) {
        id -> Text,
        email -> Text,
        name -> Text,
        role -> Integer,
        company_name -> Nullable<Text>,
        tax_id -> Nullable<Text>,
        location -> Nullable<Text>,
        is_verified -> Bool,
        is_active -> Bool,
        created_at -> Timestamp,
        updated_at -> Timestamp,
    }
}

table! {
    exchange_material (id) {
        id -> Text,
        owner_id -> Text,
        name -> Text,
        category -> Text,
        quantity -> Double,
        unit -> Text,
        location -> Text,
        price -> Double,
        description -> Text,
        images -> Text,
        status -> Integer,
        created_at -> Timestamp,
        updated_at -> Timestamp,
    }
}

table! {
    exchange_request (id) {
        id -> Text,
        material_id -> Text,
        requester_id -> Text,
        owner_id -> Text,
        quantity -> Double,
        message -> Text,
        status -> Integer,
        created_at -> Timestamp,
        updated_at -> Timestamp,
    }
}

table! {
    exchange_transaction (id) {
        id -> Text,
        request_id -> Text,
        amount -> Double,
        status -> Integer,
        payment_method -> Text,
        transaction_reference -> Nullable<Text>,
        created_at -> Timestamp,
        updated_at -> Timestamp,
        completed_at -> Nullable<Timestamp>,
    }
}

joinable!(exchange_material -> exchange_user (owner_id));
joinable!(exchange_request -> exchange_material (material_id));
joinable!(exchange_transaction -> exchange_request (request_id));

allow_tables_to_appear_in_same_query!(
    exchange_user,
    exchange_material,
    exchange_request,
    exchange_transaction,
);
