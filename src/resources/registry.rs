use crate::permission::EntityType;
use crate::query::{QuerySpec, SortDirection};

use super::{ColumnKind, ResourceSpec, SlugSource};

use ColumnKind::*;

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];

pub static RESOURCES: [ResourceSpec; 10] = [
    ResourceSpec {
        entity: EntityType::MarketplaceAds,
        table: "marketplace_ads",
        columns: &[
            ("supplier_id", Integer),
            ("category_id", Integer),
            ("title", Text),
            ("slug", Text),
            ("short_desc", Text),
            ("description", Text),
            ("price", Decimal),
            ("location", Text),
            ("image", Text),
            ("gallery", Json),
            ("status", Text),
            ("featured", Boolean),
            ("expires_at", Timestamp),
        ],
        required: &["title", "short_desc"],
        query: QuerySpec {
            searchable: &["title", "short_desc", "description", "location"],
            filterable: &["status", "category_id"],
            sortable: &["title", "price", "created_at", "updated_at", "expires_at"],
            date_column: Some("created_at"),
            default_sort: ("created_at", SortDirection::Desc),
        },
        slug: Some(SlugSource { column: "slug", from: "title" }),
        email_columns: &[],
        image_columns: &["image"],
        image_extensions: IMAGE_EXTENSIONS,
        date_range: None,
    },
    ResourceSpec {
        entity: EntityType::Awards,
        table: "awards",
        columns: &[
            ("category_id", Integer),
            ("name", Text),
            ("slug", Text),
            ("country", Text),
            ("summary", Text),
            ("cover_image", Text),
            ("status", Text),
            ("start_date", Date),
            ("end_date", Date),
        ],
        required: &["name", "country", "summary"],
        query: QuerySpec {
            searchable: &["name", "summary", "country"],
            filterable: &["status", "category_id"],
            sortable: &["name", "country", "start_date", "end_date", "created_at"],
            date_column: Some("start_date"),
            default_sort: ("created_at", SortDirection::Desc),
        },
        slug: Some(SlugSource { column: "slug", from: "name" }),
        email_columns: &[],
        image_columns: &["cover_image"],
        image_extensions: IMAGE_EXTENSIONS,
        date_range: Some(("start_date", "end_date")),
    },
    ResourceSpec {
        entity: EntityType::Nominations,
        table: "nominations",
        columns: &[
            ("award_id", Integer),
            ("user_id", Integer),
            ("supplier_id", Integer),
            ("nominee_name", Text),
            ("nominee_email", Text),
            ("reason", Text),
            ("status", Text),
        ],
        required: &["award_id", "nominee_name", "nominee_email"],
        query: QuerySpec {
            searchable: &["nominee_name", "reason"],
            filterable: &["status"],
            sortable: &["nominee_name", "created_at"],
            date_column: Some("created_at"),
            default_sort: ("created_at", SortDirection::Desc),
        },
        slug: None,
        email_columns: &["nominee_email"],
        image_columns: &[],
        image_extensions: IMAGE_EXTENSIONS,
        date_range: None,
    },
    ResourceSpec {
        entity: EntityType::Tickets,
        table: "tickets",
        columns: &[
            ("user_id", Integer),
            ("supplier_id", Integer),
            ("event_name", Text),
            ("quantity", Integer),
            ("total_amount", Decimal),
            ("status", Text),
            ("purchased_at", Timestamp),
        ],
        required: &["event_name", "quantity"],
        query: QuerySpec {
            searchable: &["event_name"],
            filterable: &["status"],
            sortable: &["event_name", "purchased_at", "created_at"],
            date_column: Some("created_at"),
            default_sort: ("created_at", SortDirection::Desc),
        },
        slug: None,
        email_columns: &[],
        image_columns: &[],
        image_extensions: IMAGE_EXTENSIONS,
        date_range: None,
    },
    ResourceSpec {
        entity: EntityType::Subscriptions,
        table: "subscriptions",
        columns: &[
            ("supplier_id", Integer),
            ("plan", Text),
            ("status", Text),
            ("amount", Decimal),
            ("starts_at", Timestamp),
            ("ends_at", Timestamp),
        ],
        required: &["supplier_id", "plan"],
        query: QuerySpec {
            searchable: &["plan"],
            filterable: &["status"],
            sortable: &["plan", "starts_at", "ends_at", "created_at"],
            date_column: Some("created_at"),
            default_sort: ("created_at", SortDirection::Desc),
        },
        slug: None,
        email_columns: &[],
        image_columns: &[],
        image_extensions: IMAGE_EXTENSIONS,
        date_range: Some(("starts_at", "ends_at")),
    },
    ResourceSpec {
        entity: EntityType::Payments,
        table: "payments",
        columns: &[
            ("supplier_id", Integer),
            ("subscription_id", Integer),
            ("amount", Decimal),
            ("currency", Text),
            ("status", Text),
            ("provider_reference", Text),
            ("paid_at", Timestamp),
        ],
        required: &["supplier_id", "amount", "currency"],
        query: QuerySpec {
            searchable: &["provider_reference"],
            filterable: &["status"],
            sortable: &["amount", "paid_at", "created_at"],
            date_column: Some("created_at"),
            default_sort: ("created_at", SortDirection::Desc),
        },
        slug: None,
        email_columns: &[],
        image_columns: &[],
        image_extensions: IMAGE_EXTENSIONS,
        date_range: None,
    },
    ResourceSpec {
        entity: EntityType::Requests,
        table: "requests",
        columns: &[
            ("user_id", Integer),
            ("supplier_id", Integer),
            ("name", Text),
            ("email", Text),
            ("phone", Text),
            ("message", Text),
            ("status", Text),
        ],
        required: &["name", "email", "message"],
        query: QuerySpec {
            searchable: &["name", "email", "message"],
            filterable: &["status"],
            sortable: &["name", "created_at"],
            date_column: Some("created_at"),
            default_sort: ("created_at", SortDirection::Desc),
        },
        slug: None,
        email_columns: &["email"],
        image_columns: &[],
        image_extensions: IMAGE_EXTENSIONS,
        date_range: None,
    },
    ResourceSpec {
        entity: EntityType::Categories,
        table: "categories",
        columns: &[
            ("parent_id", Integer),
            ("name", Text),
            ("slug", Text),
            ("description", Text),
        ],
        required: &["name"],
        query: QuerySpec {
            searchable: &["name", "description"],
            filterable: &[],
            sortable: &["name", "created_at"],
            date_column: None,
            default_sort: ("name", SortDirection::Asc),
        },
        slug: Some(SlugSource { column: "slug", from: "name" }),
        email_columns: &[],
        image_columns: &[],
        image_extensions: IMAGE_EXTENSIONS,
        date_range: None,
    },
    ResourceSpec {
        entity: EntityType::Articles,
        table: "articles",
        columns: &[
            ("category_id", Integer),
            ("title", Text),
            ("slug", Text),
            ("excerpt", Text),
            ("body", Text),
            ("cover_image", Text),
            ("author", Text),
            ("status", Text),
            ("published_at", Timestamp),
        ],
        required: &["title", "body"],
        query: QuerySpec {
            searchable: &["title", "excerpt", "author"],
            filterable: &["status", "category_id"],
            sortable: &["title", "published_at", "created_at"],
            date_column: Some("published_at"),
            default_sort: ("published_at", SortDirection::Desc),
        },
        slug: Some(SlugSource { column: "slug", from: "title" }),
        email_columns: &[],
        image_columns: &["cover_image"],
        image_extensions: IMAGE_EXTENSIONS,
        date_range: None,
    },
    ResourceSpec {
        entity: EntityType::Suppliers,
        table: "suppliers",
        columns: &[
            ("user_id", Integer),
            ("category_id", Integer),
            ("name", Text),
            ("slug", Text),
            ("email", Text),
            ("phone", Text),
            ("website", Text),
            ("country", Text),
            ("description", Text),
            ("logo", Text),
            ("status", Text),
        ],
        required: &["name", "email"],
        query: QuerySpec {
            searchable: &["name", "description", "country"],
            filterable: &["status", "category_id"],
            sortable: &["name", "country", "created_at"],
            date_column: Some("created_at"),
            default_sort: ("name", SortDirection::Asc),
        },
        slug: Some(SlugSource { column: "slug", from: "name" }),
        email_columns: &["email"],
        image_columns: &["logo"],
        image_extensions: IMAGE_EXTENSIONS,
        date_range: None,
    },
];
