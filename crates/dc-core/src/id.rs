use lasso::{Spur, ThreadedRodeo};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::sync::LazyLock;
use std::sync::atomic::{AtomicU64, Ordering};

/// Interner shared by every `EdgeId`. Interned strings live for the rest
/// of the process, so lookups of host-supplied ids go through
/// `EdgeId::lookup`, which never adds an entry.
static INTERNER: LazyLock<ThreadedRodeo> = LazyLock::new(ThreadedRodeo::default);

/// Integer identifier of a diagram node. Unique within one graph store.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u32);

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Interned edge identifier, e.g. `edge-1-2`.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct EdgeId(Spur);

impl EdgeId {
    /// Intern a string as an EdgeId, or return the existing one.
    pub fn intern(s: &str) -> Self {
        EdgeId(INTERNER.get_or_intern(s))
    }

    /// The id for `s` if it was ever interned. An id that was never
    /// interned cannot name any edge.
    pub fn lookup(s: &str) -> Option<Self> {
        INTERNER.get(s).map(EdgeId)
    }

    /// Resolve back to a string slice.
    pub fn as_str(&self) -> &str {
        INTERNER.resolve(&self.0)
    }

    /// Deterministic id for an edge created by a connection gesture.
    pub fn for_pair(source: NodeId, target: NodeId) -> Self {
        Self::intern(&format!("edge-{}-{}", source.0, target.0))
    }
}

impl fmt::Debug for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.as_str())
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for EdgeId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for EdgeId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(EdgeId::intern(&s))
    }
}

/// Identifier of a drawing object on the annotation overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectId(pub u64);

static OBJECT_COUNTER: AtomicU64 = AtomicU64::new(1);

impl ObjectId {
    /// Generate a process-unique object id.
    pub fn next() -> Self {
        ObjectId(OBJECT_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Bump the generator past `self` so restored ids never collide with new ones.
    pub fn reserve(self) {
        OBJECT_COUNTER.fetch_max(self.0 + 1, Ordering::Relaxed);
    }
}
