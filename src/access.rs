//! Listen/manage gates for Bible-scoped operations.
//!
//! A user reaches a Bible through their auth identity: no identity means no
//! access at all. Manage requires a manage grant. Listen is satisfied by
//! either a listen grant or a manage grant.

use std::collections::BTreeSet;

use crate::error::{Error, Result};
use crate::store::Store;
use crate::types::{AuthIdentity, Bible, Capability, User};

fn resolve_auth(store: &dyn Store, user: &User) -> Result<AuthIdentity> {
    store
        .get_auth_for_user(user.id)?
        .ok_or(Error::Forbidden("No auth record"))
}

/// Returns the user's auth identity if they hold a manage grant on the Bible.
pub fn ensure_manage(store: &dyn Store, user: &User, bible_id: i64) -> Result<AuthIdentity> {
    let auth = resolve_auth(store, user)?;
    if !store.has_grant(auth.id, bible_id, Capability::Manage)? {
        return Err(Error::Forbidden("No manage access"));
    }
    Ok(auth)
}

/// Returns the user's auth identity if they hold a listen or manage grant on
/// the Bible.
pub fn ensure_listen(store: &dyn Store, user: &User, bible_id: i64) -> Result<AuthIdentity> {
    let auth = resolve_auth(store, user)?;
    let listen = store.has_grant(auth.id, bible_id, Capability::Listen)?;
    if !listen && !store.has_grant(auth.id, bible_id, Capability::Manage)? {
        return Err(Error::Forbidden("No listen access"));
    }
    Ok(auth)
}

/// Every Bible the user can at least listen to. Empty without an auth identity.
pub fn accessible_bibles(store: &dyn Store, user: &User) -> Result<Vec<Bible>> {
    let Some(auth) = store.get_auth_for_user(user.id)? else {
        return Ok(Vec::new());
    };

    let mut ids = BTreeSet::new();
    for capability in Capability::ALL {
        ids.extend(store.list_granted_bible_ids(auth.id, capability)?);
    }

    let ids: Vec<i64> = ids.into_iter().collect();
    store.list_bibles_by_ids(&ids)
}

/// Grants both manage and listen, as registration does for the default Bible.
pub fn grant_default_access(store: &dyn Store, auth: &AuthIdentity, bible_id: i64) -> Result<()> {
    for capability in Capability::ALL {
        store.add_grant(auth.id, bible_id, capability)?;
        tracing::debug!("Granted {capability} on bible {bible_id} to auth {}", auth.id);
    }
    Ok(())
}
