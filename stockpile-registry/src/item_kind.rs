use std::{
    borrow::Cow,
    fmt::{self, Display},
    hash::{Hash, Hasher},
    num::NonZeroU32,
};

/// The identity of an item kind.
///
/// The string form is what humans and manifests use; the hashed form is what
/// goes over the wire. Two keys are the same kind iff their hashes match.
#[derive(Debug, Clone)]
pub struct KindKey {
    name: Cow<'static, str>,
    hashed: u64,
}

impl KindKey {
    /// Creates a key from a static name.
    #[must_use]
    pub fn new_static(name: &'static str) -> Self {
        Self {
            hashed: Self::hash_name(name),
            name: Cow::Borrowed(name),
        }
    }

    /// Creates a key from an owned name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        let name: String = name.into();
        Self {
            hashed: Self::hash_name(&name),
            name: Cow::Owned(name),
        }
    }

    /// Stable 64 bit hash of a kind name: the first 8 bytes of its MD5 digest.
    #[must_use]
    pub fn hash_name(name: &str) -> u64 {
        let digest = md5::compute(name.as_bytes());
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&digest[..8]);
        u64::from_le_bytes(bytes)
    }

    /// Returns the string identity.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the hashed identity.
    #[must_use]
    pub const fn hashed(&self) -> u64 {
        self.hashed
    }
}

impl PartialEq for KindKey {
    fn eq(&self, other: &Self) -> bool {
        self.hashed == other.hashed
    }
}

impl Eq for KindKey {}

impl Hash for KindKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.hashed.hash(state);
    }
}

impl Display for KindKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Immutable description of an item type.
///
/// Equality only looks at the key.
#[derive(Debug, Clone)]
pub struct ItemKind {
    key: KindKey,
    max_stack_size: NonZeroU32,
}

impl ItemKind {
    /// Creates a new item kind.
    #[must_use]
    pub const fn new(key: KindKey, max_stack_size: NonZeroU32) -> Self {
        Self {
            key,
            max_stack_size,
        }
    }

    /// Returns the identity of this kind.
    #[must_use]
    pub const fn key(&self) -> &KindKey {
        &self.key
    }

    /// How many of this kind fit in one slot, unless the slot overrides it.
    #[must_use]
    pub const fn max_stack_size(&self) -> u32 {
        self.max_stack_size.get()
    }
}

impl PartialEq for ItemKind {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for ItemKind {}

impl Hash for ItemKind {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

impl Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.key, f)
    }
}
