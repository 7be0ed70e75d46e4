//! Role-based allow/deny decisions for resource actions.
//!
//! The evaluator is a pure function of the caller, the action, the entity
//! type, and (optionally) the row being touched. Ownership is always exact
//! equality on `supplier_id` or `user_id`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

use crate::query::{Scope, SqlValue};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Supplier,
    #[serde(alias = "user")]
    Public,
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "supplier" => Ok(Role::Supplier),
            "public" | "user" => Ok(Role::Public),
            other => Err(format!("unknown role: {}", other)),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Role::Admin => "admin",
            Role::Supplier => "supplier",
            Role::Public => "public",
        })
    }
}

/// Authenticated caller, resolved per request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub id: i64,
    pub role: Role,
    pub supplier_id: Option<i64>,
}

impl Actor {
    pub fn admin(id: i64) -> Self {
        Self { id, role: Role::Admin, supplier_id: None }
    }

    pub fn supplier(id: i64, supplier_id: i64) -> Self {
        Self { id, role: Role::Supplier, supplier_id: Some(supplier_id) }
    }

    pub fn public(id: i64) -> Self {
        Self { id, role: Role::Public, supplier_id: None }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Create,
    Read,
    Update,
    Delete,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Create => "create",
            Action::Read => "read",
            Action::Update => "update",
            Action::Delete => "delete",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    MarketplaceAds,
    Awards,
    Nominations,
    Tickets,
    Subscriptions,
    Payments,
    Requests,
    Categories,
    Articles,
    Suppliers,
}

impl EntityType {
    pub const ALL: [EntityType; 10] = [
        EntityType::MarketplaceAds,
        EntityType::Awards,
        EntityType::Nominations,
        EntityType::Tickets,
        EntityType::Subscriptions,
        EntityType::Payments,
        EntityType::Requests,
        EntityType::Categories,
        EntityType::Articles,
        EntityType::Suppliers,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::MarketplaceAds => "marketplace_ads",
            EntityType::Awards => "awards",
            EntityType::Nominations => "nominations",
            EntityType::Tickets => "tickets",
            EntityType::Subscriptions => "subscriptions",
            EntityType::Payments => "payments",
            EntityType::Requests => "requests",
            EntityType::Categories => "categories",
            EntityType::Articles => "articles",
            EntityType::Suppliers => "suppliers",
        }
    }

    /// Rows a supplier may only read when they carry its `supplier_id`.
    fn supplier_scoped(&self) -> bool {
        matches!(
            self,
            EntityType::Subscriptions | EntityType::Payments | EntityType::Nominations | EntityType::Tickets
        )
    }

    /// Rows a public user may create and read when they carry its `user_id`.
    fn user_owned(&self) -> bool {
        matches!(self, EntityType::Nominations | EntityType::Tickets | EntityType::Requests)
    }
}

impl FromStr for EntityType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EntityType::ALL
            .into_iter()
            .find(|e| e.as_str() == s)
            .ok_or_else(|| format!("unknown entity type: {}", s))
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub const SUPPLIER_KEY: &str = "supplier_id";
pub const USER_KEY: &str = "user_id";

/// Decide whether `actor` may perform `action` on `entity`.
///
/// `data` is the row being touched: the stored row for read/update/delete,
/// the incoming row for create. When it is absent (list endpoints), the
/// decision is made for the entity type and the caller must apply
/// [`read_scope`] to the query.
pub fn allow(actor: Option<&Actor>, action: Action, entity: EntityType, data: Option<&Map<String, Value>>) -> bool {
    let Some(actor) = actor else {
        return false;
    };

    match actor.role {
        Role::Admin => true,
        Role::Supplier => supplier_allows(actor, action, entity, data),
        Role::Public => public_allows(actor, action, entity, data),
    }
}

fn supplier_allows(actor: &Actor, action: Action, entity: EntityType, data: Option<&Map<String, Value>>) -> bool {
    match entity {
        EntityType::MarketplaceAds => match action {
            // the marketplace is browsable by every supplier
            Action::Read => true,
            _ => data.is_some_and(|row| owns(row, SUPPLIER_KEY, actor.supplier_id)),
        },
        EntityType::Awards => action == Action::Read,
        e if e.supplier_scoped() => {
            action == Action::Read && data.map_or(true, |row| owns(row, SUPPLIER_KEY, actor.supplier_id))
        }
        _ => action == Action::Read,
    }
}

fn public_allows(actor: &Actor, action: Action, entity: EntityType, data: Option<&Map<String, Value>>) -> bool {
    match entity {
        EntityType::Awards => action == Action::Read,
        e if e.user_owned() => match action {
            Action::Read => data.map_or(true, |row| owns(row, USER_KEY, Some(actor.id))),
            Action::Create => data.is_some_and(|row| owns(row, USER_KEY, Some(actor.id))),
            Action::Update | Action::Delete => false,
        },
        _ => action == Action::Read,
    }
}

fn owns(row: &Map<String, Value>, key: &str, owner: Option<i64>) -> bool {
    match (row.get(key), owner) {
        (Some(value), Some(owner)) => value.as_i64() == Some(owner),
        _ => false,
    }
}

/// Ownership filter a list query must carry for this caller, if any.
pub fn read_scope(actor: &Actor, entity: EntityType) -> Option<Scope> {
    match actor.role {
        Role::Admin => None,
        Role::Supplier if entity.supplier_scoped() => Some(Scope {
            column: SUPPLIER_KEY,
            // a supplier account without a supplier id owns nothing
            value: actor.supplier_id.map_or(SqlValue::Null, SqlValue::Int),
        }),
        Role::Public if entity.user_owned() => Some(Scope {
            column: USER_KEY,
            value: SqlValue::Int(actor.id),
        }),
        _ => None,
    }
}

/// Owner column and value to stamp onto a new row when the payload omits it.
pub fn owner_default(actor: &Actor, entity: EntityType) -> Option<(&'static str, i64)> {
    match actor.role {
        Role::Supplier if entity == EntityType::MarketplaceAds => actor.supplier_id.map(|id| (SUPPLIER_KEY, id)),
        Role::Public if entity.user_owned() => Some((USER_KEY, actor.id)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(v: Value) -> Map<String, Value> {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn no_actor_is_denied_everything() {
        for entity in EntityType::ALL {
            for action in [Action::Create, Action::Read, Action::Update, Action::Delete] {
                assert!(!allow(None, action, entity, None));
            }
        }
    }

    #[test]
    fn admin_is_allowed_everything() {
        let admin = Actor::admin(1);
        for entity in EntityType::ALL {
            for action in [Action::Create, Action::Read, Action::Update, Action::Delete] {
                assert!(allow(Some(&admin), action, entity, None));
            }
        }
    }

    #[test]
    fn supplier_controls_own_ads_only() {
        let supplier = Actor::supplier(10, 5);
        let own = row(json!({ "supplier_id": 5 }));
        let other = row(json!({ "supplier_id": 6 }));

        assert!(allow(Some(&supplier), Action::Update, EntityType::MarketplaceAds, Some(&own)));
        assert!(!allow(Some(&supplier), Action::Update, EntityType::MarketplaceAds, Some(&other)));
        assert!(allow(Some(&supplier), Action::Create, EntityType::MarketplaceAds, Some(&own)));
        assert!(allow(Some(&supplier), Action::Delete, EntityType::MarketplaceAds, Some(&own)));
        assert!(!allow(Some(&supplier), Action::Delete, EntityType::MarketplaceAds, Some(&other)));
        assert!(!allow(Some(&supplier), Action::Update, EntityType::MarketplaceAds, None));
        assert!(allow(Some(&supplier), Action::Read, EntityType::MarketplaceAds, Some(&other)));
    }

    #[test]
    fn ownership_is_exact_equality() {
        let supplier = Actor::supplier(10, 5);
        let stringly = row(json!({ "supplier_id": "5" }));
        let missing = row(json!({ "title": "x" }));
        assert!(!allow(Some(&supplier), Action::Update, EntityType::MarketplaceAds, Some(&stringly)));
        assert!(!allow(Some(&supplier), Action::Update, EntityType::MarketplaceAds, Some(&missing)));
    }

    #[test]
    fn supplier_reads_scoped_rows() {
        let supplier = Actor::supplier(10, 5);
        let own = row(json!({ "supplier_id": 5 }));
        let other = row(json!({ "supplier_id": 9 }));

        for entity in [EntityType::Subscriptions, EntityType::Payments, EntityType::Nominations, EntityType::Tickets] {
            assert!(allow(Some(&supplier), Action::Read, entity, None));
            assert!(allow(Some(&supplier), Action::Read, entity, Some(&own)));
            assert!(!allow(Some(&supplier), Action::Read, entity, Some(&other)));
            assert!(!allow(Some(&supplier), Action::Update, entity, Some(&own)));
            assert_eq!(
                read_scope(&supplier, entity),
                Some(Scope { column: "supplier_id", value: SqlValue::Int(5) })
            );
        }
    }

    #[test]
    fn supplier_is_read_only_elsewhere() {
        let supplier = Actor::supplier(10, 5);
        for entity in [EntityType::Awards, EntityType::Categories, EntityType::Articles, EntityType::Suppliers] {
            assert!(allow(Some(&supplier), Action::Read, entity, None));
            assert!(!allow(Some(&supplier), Action::Create, entity, None));
            assert!(!allow(Some(&supplier), Action::Delete, entity, None));
            assert_eq!(read_scope(&supplier, entity), None);
        }
    }

    #[test]
    fn public_reads_awards_but_cannot_change_them() {
        let user = Actor::public(42);
        assert!(allow(Some(&user), Action::Read, EntityType::Awards, None));
        assert!(!allow(Some(&user), Action::Update, EntityType::Awards, None));
        assert!(!allow(Some(&user), Action::Create, EntityType::Awards, None));
    }

    #[test]
    fn public_creates_and_reads_own_rows() {
        let user = Actor::public(42);
        let own = row(json!({ "user_id": 42 }));
        let other = row(json!({ "user_id": 43 }));

        for entity in [EntityType::Nominations, EntityType::Tickets, EntityType::Requests] {
            assert!(allow(Some(&user), Action::Create, entity, Some(&own)));
            assert!(!allow(Some(&user), Action::Create, entity, Some(&other)));
            assert!(allow(Some(&user), Action::Read, entity, Some(&own)));
            assert!(!allow(Some(&user), Action::Read, entity, Some(&other)));
            assert!(!allow(Some(&user), Action::Update, entity, Some(&own)));
            assert!(!allow(Some(&user), Action::Delete, entity, Some(&own)));
            assert_eq!(
                read_scope(&user, entity),
                Some(Scope { column: "user_id", value: SqlValue::Int(42) })
            );
        }
    }

    #[test]
    fn public_is_read_only_elsewhere() {
        let user = Actor::public(42);
        assert!(allow(Some(&user), Action::Read, EntityType::MarketplaceAds, None));
        assert!(!allow(Some(&user), Action::Create, EntityType::MarketplaceAds, None));
        assert!(!allow(Some(&user), Action::Update, EntityType::Articles, None));
    }

    #[test]
    fn owner_defaults_follow_role() {
        assert_eq!(
            owner_default(&Actor::supplier(1, 5), EntityType::MarketplaceAds),
            Some(("supplier_id", 5))
        );
        assert_eq!(owner_default(&Actor::public(7), EntityType::Tickets), Some(("user_id", 7)));
        assert_eq!(owner_default(&Actor::admin(1), EntityType::Tickets), None);
        assert_eq!(owner_default(&Actor::public(7), EntityType::Awards), None);
    }

    #[test]
    fn names_round_trip() {
        for entity in EntityType::ALL {
            assert_eq!(entity.as_str().parse::<EntityType>(), Ok(entity));
        }
        assert!("users".parse::<EntityType>().is_err());
        assert_eq!("supplier".parse::<Role>(), Ok(Role::Supplier));
        assert!("root".parse::<Role>().is_err());
    }
}
