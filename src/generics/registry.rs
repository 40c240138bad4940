use std::any::Any;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

use super::key::{ClosingArguments, OpenTypeKey, TypeIdentity};

/// Type-erased instance produced by a [`Factory`] or an activator.
pub type Instance = Box<dyn Any + Send + Sync>;

type BuildFn = dyn Fn() -> Instance + Send + Sync;

/// Zero-argument constructor for one closed generic type.
///
/// `closed_type` names the concrete type being built; the instance handed out
/// is whatever service handle the factory wraps it in (usually an
/// `Arc<dyn Trait>`).
#[derive(Clone)]
pub struct Factory {
    closed: TypeIdentity,
    build: Arc<BuildFn>,
}

impl Factory {
    /// Build a factory for closed type `T` that hands out `S`.
    ///
    /// ```rust,ignore
    /// let factory = Factory::new::<MyProcessor<Req>, _, _>(|| {
    ///     Arc::new(MyProcessor::<Req>::default()) as Arc<dyn PreProcessor<Req>>
    /// });
    /// ```
    pub fn new<T, S, F>(build: F) -> Self
    where
        T: ?Sized + 'static,
        S: Any + Send + Sync,
        F: Fn() -> S + Send + Sync + 'static,
    {
        Self {
            closed: TypeIdentity::of::<T>(),
            build: Arc::new(move || Box::new(build()) as Instance),
        }
    }

    pub fn closed_type(&self) -> TypeIdentity {
        self.closed
    }

    pub fn invoke(&self) -> Instance {
        (self.build)()
    }
}

impl fmt::Debug for Factory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Factory").field("closed", &self.closed).finish()
    }
}

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("duplicate registration for {key} closed over {args}")]
    Duplicate { key: OpenTypeKey, args: ClosingArguments },

    #[error("{key} expects {expected} closing argument(s), got {actual}")]
    ArityMismatch {
        key: OpenTypeKey,
        expected: usize,
        actual: usize,
    },
}

/// Single-writer side of the registry. Populate it once at startup, then
/// [`freeze`](RegistryBuilder::freeze) it.
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    entries: HashMap<OpenTypeKey, HashMap<ClosingArguments, Factory>>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a mapping. Duplicates are rejected and the first registration
    /// is kept.
    pub fn register(
        &mut self,
        key: OpenTypeKey,
        args: ClosingArguments,
        factory: Factory,
    ) -> Result<(), RegistryError> {
        if args.len() != key.arity() {
            return Err(RegistryError::ArityMismatch {
                expected: key.arity(),
                actual: args.len(),
                key,
            });
        }

        let closed = self.entries.entry(key.clone()).or_default();
        if closed.contains_key(&args) {
            return Err(RegistryError::Duplicate { key, args });
        }

        tracing::debug!(
            template = %key,
            args = %args,
            closed_type = %factory.closed_type(),
            "Registered closed generic factory"
        );
        closed.insert(args, factory);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn freeze(self) -> GenericTypeRegistry {
        let registry = GenericTypeRegistry {
            entries: self.entries,
        };
        tracing::info!(entries = registry.len(), "Generic type registry frozen");
        registry
    }
}

/// Read-only (open template, closing arguments) -> factory table.
#[derive(Debug, Default)]
pub struct GenericTypeRegistry {
    entries: HashMap<OpenTypeKey, HashMap<ClosingArguments, Factory>>,
}

impl GenericTypeRegistry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    pub fn try_resolve(&self, key: &OpenTypeKey, args: &ClosingArguments) -> Option<&Factory> {
        self.entries.get(key).and_then(|closed| closed.get(args))
    }

    pub fn contains(&self, key: &OpenTypeKey, args: &ClosingArguments) -> bool {
        self.try_resolve(key, args).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All entries, sorted by template then closing arguments for stable
    /// listings.
    pub fn entries(&self) -> Vec<RegistryEntry<'_>> {
        let sorted: BTreeMap<&OpenTypeKey, &HashMap<ClosingArguments, Factory>> =
            self.entries.iter().collect();

        let mut out = Vec::with_capacity(self.len());
        for (key, closed) in sorted {
            let mut rows: Vec<_> = closed
                .iter()
                .map(|(args, factory)| RegistryEntry { key, args, factory })
                .collect();
            rows.sort_by_key(|entry| entry.args.to_string());
            out.extend(rows);
        }
        out
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RegistryEntry<'a> {
    pub key: &'a OpenTypeKey,
    pub args: &'a ClosingArguments,
    pub factory: &'a Factory,
}
