//! Remote vault driver: a flat two-level model behind the tree contract
//!
//! The remote service knows only vaults and the items inside them. The
//! driver presents that as root → one group per vault → entries, and maps
//! item fields onto values. Transport, authentication and wire encoding
//! belong to the [`RemoteClient`] implementation, which is an external
//! collaborator; an in-memory double ships here for tests and local use.
//!
//! Item detail is re-fetched per access, so enumerating many entries in one
//! pass costs one lookup each. That changes cost, never correctness.

use std::cell::RefCell;
use std::collections::HashMap;

use tracing::debug;
use uuid::Uuid;

use super::{Backend, BackendError, BackendResult, StoreVersion};
use crate::models::{Entry, Group, Value, ValueKind};

/// A vault as listed by the remote service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteVaultInfo {
    pub id: String,
    pub name: String,
}

/// An item summary as returned by a vault listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteItemSummary {
    pub id: String,
    pub title: String,
}

/// One field of a remote item
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteField {
    pub name: String,
    pub value: String,
    /// Concealed fields map to protected, not-searchable values
    pub concealed: bool,
    /// Multiline fields map to long-string values
    pub multiline: bool,
}

/// Full item detail
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteItem {
    pub id: String,
    pub title: String,
    pub fields: Vec<RemoteField>,
}

/// The wire client the driver consumes.
///
/// Implementations own their transport, authentication and deadlines; the
/// driver treats every call as synchronous.
pub trait RemoteClient {
    fn vaults(&self) -> BackendResult<Vec<RemoteVaultInfo>>;
    fn items(&self, vault_id: &str) -> BackendResult<Vec<RemoteItemSummary>>;
    fn item(&self, vault_id: &str, item_id: &str) -> BackendResult<RemoteItem>;
    fn put_item(&self, vault_id: &str, item: &RemoteItem) -> BackendResult<()>;
    fn delete_item(&self, vault_id: &str, item_id: &str) -> BackendResult<()>;
}

/// Driver adapting a [`RemoteClient`] to the tree contract
pub struct RemoteBackend {
    client: Box<dyn RemoteClient>,
    /// Stable UUIDs for service ids that are not themselves UUIDs
    assigned: RefCell<HashMap<String, Uuid>>,
}

impl RemoteBackend {
    pub fn new(client: Box<dyn RemoteClient>) -> Self {
        Self {
            client,
            assigned: RefCell::new(HashMap::new()),
        }
    }

    /// A stable UUID for a service-side id: the id itself when it parses as
    /// a UUID, otherwise one assigned once and remembered for the session
    fn uuid_for(&self, service_id: &str) -> Uuid {
        if let Ok(uuid) = Uuid::parse_str(service_id) {
            return uuid;
        }
        *self
            .assigned
            .borrow_mut()
            .entry(service_id.to_string())
            .or_insert_with(Uuid::new_v4)
    }

    /// Reverse of [`Self::uuid_for`] against a set of candidate ids
    fn service_id_for<'a>(&self, uuid: Uuid, candidates: &'a [String]) -> Option<&'a str> {
        let assigned = self.assigned.borrow();
        candidates
            .iter()
            .find(|id| match Uuid::parse_str(id) {
                Ok(parsed) => parsed == uuid,
                Err(_) => assigned.get(*id) == Some(&uuid),
            })
            .map(|id| id.as_str())
    }

    fn item_to_entry(&self, item: &RemoteItem) -> Entry {
        let mut values = vec![Value::string("Title", item.title.clone())];
        for field in &item.fields {
            let value = if field.multiline {
                Value::long_string(field.name.clone(), field.value.clone())
            } else {
                Value::string(field.name.clone(), field.value.clone())
            };
            let value = if field.concealed {
                value.with_protected(true).with_searchable(false)
            } else {
                value
            };
            values.push(value);
        }
        Entry::from_parts(self.uuid_for(&item.id), values)
    }

    fn entry_to_item(entry: &Entry) -> BackendResult<RemoteItem> {
        let mut fields = Vec::new();
        for value in entry.values() {
            if value.name_matches("Title") {
                continue;
            }
            if value.kind() == ValueKind::Binary {
                return Err(BackendError::Unsupported {
                    message: format!(
                        "the remote vault cannot hold binary value '{}'",
                        value.name()
                    ),
                });
            }
            fields.push(RemoteField {
                name: value.name().to_string(),
                value: value.content_str().into_owned(),
                concealed: value.is_protected(),
                multiline: value.kind() == ValueKind::LongString,
            });
        }
        Ok(RemoteItem {
            id: entry.uuid_string(),
            title: entry.title(),
            fields,
        })
    }
}

impl Backend for RemoteBackend {
    fn init(&mut self) -> BackendResult<()> {
        let vaults = self.client.vaults()?;
        debug!(vaults = vaults.len(), "remote vault service reachable");
        Ok(())
    }

    fn root(&self) -> BackendResult<Group> {
        let mut root = Group::new_root();
        for vault in self.client.vaults()? {
            let mut entries = Vec::new();
            for summary in self.client.items(&vault.id)? {
                // Full detail is a second lookup per item.
                let item = self.client.item(&vault.id, &summary.id)?;
                entries.push(self.item_to_entry(&item));
            }
            let group = Group::from_parts(
                self.uuid_for(&vault.id),
                vault.name.clone(),
                false,
                Vec::new(),
                entries,
            );
            root.add_subgroup(group)
                .map_err(|_| BackendError::Remote {
                    message: format!("duplicate vault name '{}'", vault.name),
                })?;
        }
        Ok(root)
    }

    fn save(&mut self, root: &Group) -> BackendResult<()> {
        if !root.entries().is_empty() {
            return Err(BackendError::Unsupported {
                message: "the remote vault cannot hold entries outside a vault group".to_string(),
            });
        }

        let vaults = self.client.vaults()?;
        let vault_ids: Vec<String> = vaults.iter().map(|v| v.id.clone()).collect();

        // Vaults cannot be deleted or renamed through the service; a tree
        // that dropped or renamed one cannot be persisted faithfully and
        // must not be reported as saved.
        for vault in &vaults {
            let uuid = self.uuid_for(&vault.id);
            match root.groups().iter().find(|g| g.uuid() == uuid) {
                Some(group) if group.name() == vault.name => {}
                Some(group) => {
                    return Err(BackendError::Unsupported {
                        message: format!(
                            "vaults cannot be renamed through the service ('{}' is now '{}')",
                            vault.name,
                            group.name()
                        ),
                    })
                }
                None => {
                    return Err(BackendError::Unsupported {
                        message: format!(
                            "vaults cannot be removed through the service ('{}')",
                            vault.name
                        ),
                    })
                }
            }
        }

        for group in root.groups() {
            if !group.groups().is_empty() {
                return Err(BackendError::Unsupported {
                    message: format!(
                        "the remote vault is flat; group '{}' cannot hold subgroups",
                        group.name()
                    ),
                });
            }

            let vault_id = self
                .service_id_for(group.uuid(), &vault_ids)
                .ok_or_else(|| BackendError::Unsupported {
                    message: format!("vaults cannot be created through the service ('{}')", group.name()),
                })?
                .to_string();

            let existing = self.client.items(&vault_id)?;
            let mut keep: Vec<String> = Vec::with_capacity(group.entries().len());
            for entry in group.entries() {
                let mut item = Self::entry_to_item(entry)?;
                // Reuse the service id when the entry maps back to one.
                let existing_ids: Vec<String> =
                    existing.iter().map(|s| s.id.clone()).collect();
                if let Some(id) = self.service_id_for(entry.uuid(), &existing_ids) {
                    item.id = id.to_string();
                }
                self.client.put_item(&vault_id, &item)?;
                keep.push(item.id.clone());
            }
            for summary in &existing {
                if !keep.contains(&summary.id) {
                    self.client.delete_item(&vault_id, &summary.id)?;
                }
            }
        }
        Ok(())
    }

    fn version(&self) -> StoreVersion {
        StoreVersion::Remote
    }

    /// The service has no database-level binaries pool
    fn binary(&self, _id: u64, _name: &str) -> BackendResult<Option<Value>> {
        Ok(None)
    }

    /// No local store file exists, so there is nothing to mark; the
    /// advisory lock is a no-op for this driver
    fn lock(&mut self, _force: bool) -> BackendResult<()> {
        Ok(())
    }

    fn unlock(&mut self) -> BackendResult<()> {
        Ok(())
    }

    fn locked(&self) -> bool {
        false
    }
}

/// In-memory [`RemoteClient`] double: a vault service without the wire
#[derive(Debug, Default)]
pub struct MemoryRemoteClient {
    vaults: std::sync::Mutex<Vec<(RemoteVaultInfo, Vec<RemoteItem>)>>,
}

impl MemoryRemoteClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a vault, returning its service id
    pub fn add_vault(&self, name: &str) -> String {
        let id = Uuid::new_v4().to_string();
        self.vaults.lock().unwrap().push((
            RemoteVaultInfo {
                id: id.clone(),
                name: name.to_string(),
            },
            Vec::new(),
        ));
        id
    }

    /// Seed an item directly, bypassing the driver
    pub fn seed_item(&self, vault_id: &str, item: RemoteItem) {
        let mut vaults = self.vaults.lock().unwrap();
        if let Some((_, items)) = vaults.iter_mut().find(|(v, _)| v.id == vault_id) {
            items.push(item);
        }
    }
}

impl RemoteClient for MemoryRemoteClient {
    fn vaults(&self) -> BackendResult<Vec<RemoteVaultInfo>> {
        Ok(self
            .vaults
            .lock()
            .unwrap()
            .iter()
            .map(|(v, _)| v.clone())
            .collect())
    }

    fn items(&self, vault_id: &str) -> BackendResult<Vec<RemoteItemSummary>> {
        let vaults = self.vaults.lock().unwrap();
        let (_, items) = vaults
            .iter()
            .find(|(v, _)| v.id == vault_id)
            .ok_or_else(|| BackendError::Remote {
                message: format!("unknown vault '{vault_id}'"),
            })?;
        Ok(items
            .iter()
            .map(|i| RemoteItemSummary {
                id: i.id.clone(),
                title: i.title.clone(),
            })
            .collect())
    }

    fn item(&self, vault_id: &str, item_id: &str) -> BackendResult<RemoteItem> {
        let vaults = self.vaults.lock().unwrap();
        let (_, items) = vaults
            .iter()
            .find(|(v, _)| v.id == vault_id)
            .ok_or_else(|| BackendError::Remote {
                message: format!("unknown vault '{vault_id}'"),
            })?;
        items
            .iter()
            .find(|i| i.id == item_id)
            .cloned()
            .ok_or_else(|| BackendError::Remote {
                message: format!("unknown item '{item_id}'"),
            })
    }

    fn put_item(&self, vault_id: &str, item: &RemoteItem) -> BackendResult<()> {
        let mut vaults = self.vaults.lock().unwrap();
        let (_, items) = vaults
            .iter_mut()
            .find(|(v, _)| v.id == vault_id)
            .ok_or_else(|| BackendError::Remote {
                message: format!("unknown vault '{vault_id}'"),
            })?;
        match items.iter_mut().find(|i| i.id == item.id) {
            Some(slot) => *slot = item.clone(),
            None => items.push(item.clone()),
        }
        Ok(())
    }

    fn delete_item(&self, vault_id: &str, item_id: &str) -> BackendResult<()> {
        let mut vaults = self.vaults.lock().unwrap();
        let (_, items) = vaults
            .iter_mut()
            .find(|(v, _)| v.id == vault_id)
            .ok_or_else(|| BackendError::Remote {
                message: format!("unknown vault '{vault_id}'"),
            })?;
        items.retain(|i| i.id != item_id);
        Ok(())
    }
}
