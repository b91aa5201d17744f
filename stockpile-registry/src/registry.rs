use std::{num::NonZeroU32, sync::Arc};

use rustc_hash::FxHashMap;
use serde::Deserialize;
use thiserror::Error;

use crate::{ItemKind, KindKey, RegistryExt};

/// Errors raised while building a [`KindRegistry`].
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Another kind already owns this hashed identity.
    #[error("kind `{key}` collides with already registered kind `{existing}`")]
    DuplicateKind {
        /// The rejected key.
        key: String,
        /// The key already in the registry.
        existing: String,
    },
    /// The registry was frozen before this kind was registered.
    #[error("cannot register kind `{key}` after the registry is frozen")]
    Frozen {
        /// The rejected key.
        key: String,
    },
    /// A manifest entry declared a max stack size of zero.
    #[error("kind `{key}` must have a max stack size of at least 1")]
    InvalidMaxStackSize {
        /// The rejected key.
        key: String,
    },
    /// The manifest could not be parsed.
    #[error("invalid kind manifest: {0}")]
    Manifest(#[from] serde_json5::Error),
}

/// One kind declared in a manifest.
#[derive(Debug, Clone, Deserialize)]
pub struct ManifestEntry {
    /// The string identity.
    pub key: String,
    /// The intrinsic max stack size.
    pub max_stack_size: u32,
}

/// A list of kinds to register, usually loaded from a JSON5 file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct KindManifest {
    /// Kinds in registration order.
    pub kinds: Vec<ManifestEntry>,
}

/// Resolves kind identities to kinds.
///
/// Owned by the host and passed to whatever needs to resolve kinds, so that
/// tests and separate worlds can each have their own.
#[derive(Debug)]
pub struct KindRegistry {
    kinds: Vec<Arc<ItemKind>>,
    by_hash: FxHashMap<u64, usize>,
    allows_registering: bool,
}

impl Default for KindRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl KindRegistry {
    /// Creates an empty registry that accepts registrations.
    #[must_use]
    pub fn new() -> Self {
        Self {
            kinds: Vec::new(),
            by_hash: FxHashMap::default(),
            allows_registering: true,
        }
    }

    /// Builds a registry from a JSON5 manifest.
    pub fn from_json5(source: &str) -> Result<Self, RegistryError> {
        let manifest: KindManifest = serde_json5::from_str(source)?;
        let mut registry = Self::new();
        registry.register_manifest(manifest)?;
        Ok(registry)
    }

    /// Registers every entry of a manifest, stopping at the first failure.
    pub fn register_manifest(&mut self, manifest: KindManifest) -> Result<(), RegistryError> {
        let count = manifest.kinds.len();
        for entry in manifest.kinds {
            let Some(max_stack_size) = NonZeroU32::new(entry.max_stack_size) else {
                return Err(RegistryError::InvalidMaxStackSize { key: entry.key });
            };
            self.register(ItemKind::new(KindKey::new(entry.key), max_stack_size))?;
        }
        log::debug!("Registered {count} item kinds from manifest");
        Ok(())
    }

    /// Registers a kind and returns the shared handle stacks should use.
    pub fn register(&mut self, kind: ItemKind) -> Result<Arc<ItemKind>, RegistryError> {
        if !self.allows_registering {
            return Err(RegistryError::Frozen {
                key: kind.key().name().to_owned(),
            });
        }

        let hashed = kind.key().hashed();
        if let Some(&existing) = self.by_hash.get(&hashed) {
            return Err(RegistryError::DuplicateKind {
                key: kind.key().name().to_owned(),
                existing: self.kinds[existing].key().name().to_owned(),
            });
        }

        let kind = Arc::new(kind);
        self.by_hash.insert(hashed, self.kinds.len());
        self.kinds.push(kind.clone());
        Ok(kind)
    }

    /// Looks a kind up by its string identity.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Arc<ItemKind>> {
        self.get_hashed(KindKey::hash_name(name))
    }

    /// Looks a kind up by its hashed identity.
    #[must_use]
    pub fn get_hashed(&self, hashed: u64) -> Option<&Arc<ItemKind>> {
        self.by_hash.get(&hashed).map(|&index| &self.kinds[index])
    }

    /// Returns the number of registered kinds.
    #[must_use]
    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    /// Returns whether nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }

    /// Iterates kinds in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<ItemKind>> {
        self.kinds.iter()
    }
}

impl RegistryExt for KindRegistry {
    fn freeze(&mut self) {
        self.allows_registering = false;
    }

    fn is_frozen(&self) -> bool {
        !self.allows_registering
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kind(name: &'static str, max: u32) -> ItemKind {
        ItemKind::new(KindKey::new_static(name), NonZeroU32::new(max).unwrap())
    }

    #[test]
    fn test_register_and_resolve() {
        let mut registry = KindRegistry::new();
        let wood = registry.register(kind("stockpile:wood", 64)).unwrap();

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("stockpile:wood"), Some(&wood));
        assert_eq!(registry.get_hashed(wood.key().hashed()), Some(&wood));
        assert!(registry.get("stockpile:stone").is_none());
    }

    #[test]
    fn test_duplicate_identity_is_rejected() {
        let mut registry = KindRegistry::new();
        registry.register(kind("stockpile:wood", 64)).unwrap();

        let err = registry.register(kind("stockpile:wood", 16)).unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateKind { .. }));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("stockpile:wood").unwrap().max_stack_size(), 64);
    }

    #[test]
    fn test_frozen_registry_rejects() {
        let mut registry = KindRegistry::new();
        registry.freeze();
        assert!(registry.is_frozen());

        let err = registry.register(kind("stockpile:wood", 64)).unwrap_err();
        assert!(matches!(err, RegistryError::Frozen { .. }));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_separate_registries_are_independent() {
        let mut first = KindRegistry::new();
        let second = KindRegistry::new();
        first.register(kind("stockpile:wood", 64)).unwrap();

        assert!(first.get("stockpile:wood").is_some());
        assert!(second.get("stockpile:wood").is_none());
    }

    #[test]
    fn test_from_json5() {
        let registry = KindRegistry::from_json5(
            r#"{
                // trailing commas and comments are fine
                kinds: [
                    { key: "stockpile:wood", max_stack_size: 64 },
                    { key: "stockpile:sword", max_stack_size: 1 },
                ],
            }"#,
        )
        .unwrap();

        let names: Vec<_> = registry.iter().map(|k| k.key().name()).collect();
        assert_eq!(names, ["stockpile:wood", "stockpile:sword"]);
        assert_eq!(registry.get("stockpile:sword").unwrap().max_stack_size(), 1);
    }

    #[test]
    fn test_manifest_rejects_zero_max() {
        let err = KindRegistry::from_json5(r#"{ kinds: [{ key: "stockpile:air", max_stack_size: 0 }] }"#)
            .unwrap_err();
        assert!(matches!(err, RegistryError::InvalidMaxStackSize { .. }));
    }

    #[test]
    fn test_manifest_parse_error() {
        let err = KindRegistry::from_json5("{ kinds: [ nope ] }").unwrap_err();
        assert!(matches!(err, RegistryError::Manifest(_)));
    }
}
