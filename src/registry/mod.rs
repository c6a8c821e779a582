//! Process-scoped registry owning the four lazily populated caches: schema
//! handles, proxy types, converters and parsers.
//!
//! Registries are ordinary values and can be passed around explicitly;
//! [`SchemaRegistry::global`] offers one shared instance for code that wants
//! process scope.

pub(crate) mod cache;

use crate::config::MapperConfig;
use crate::convert::ConverterRegistry;
use crate::core::Result;
use crate::parse::ParserRegistry;
use crate::proxy::{Proxy, ProxySynthesizer, ProxyType};
use crate::reflect::{ClassDescriptor, Document};
use crate::schema::{Handle, HandleBuilder};
use cache::TypeCache;
use lazy_static::lazy_static;
use log::info;
use std::any::{Any, TypeId, type_name};
use std::sync::Arc;
use tracing::info_span;

lazy_static! {
    static ref GLOBAL_REGISTRY: SchemaRegistry = SchemaRegistry::new();
}

/// Cache sizes of a registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistryStats {
    pub handles: usize,
    pub proxy_types: usize,
    pub converters: usize,
    pub resolved_parsers: usize,
}

pub struct SchemaRegistry {
    config: MapperConfig,
    handles: TypeCache<Arc<dyn Any + Send + Sync>>,
    converters: ConverterRegistry,
    parsers: ParserRegistry,
    proxies: ProxySynthesizer,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::with_config(MapperConfig::default())
    }

    pub fn with_config(config: MapperConfig) -> Self {
        let proxies = ProxySynthesizer::new(config.proxy_name_prefix.clone());
        Self {
            config,
            handles: TypeCache::new(),
            converters: ConverterRegistry::new(),
            parsers: ParserRegistry::new(),
            proxies,
        }
    }

    /// The shared process-wide registry with default configuration.
    pub fn global() -> &'static SchemaRegistry {
        &GLOBAL_REGISTRY
    }

    pub fn config(&self) -> &MapperConfig {
        &self.config
    }

    pub fn converters(&self) -> &ConverterRegistry {
        &self.converters
    }

    pub fn parsers(&self) -> &ParserRegistry {
        &self.parsers
    }

    pub fn proxies(&self) -> &ProxySynthesizer {
        &self.proxies
    }

    /// The compiled handle for a derived document type.
    pub fn handle<E: Document>(&self) -> Result<Arc<Handle<E>>> {
        self.handle_with(E::descriptor)
    }

    /// The compiled handle for `E`, described by `describe` on first use.
    ///
    /// Later calls return the cached handle and never call `describe`.
    pub fn handle_with<E, F>(&self, describe: F) -> Result<Arc<Handle<E>>>
    where
        E: 'static,
        F: FnOnce() -> ClassDescriptor<E>,
    {
        let erased = self.handles.get_or_try_init(TypeId::of::<E>(), || {
            let class = describe();
            let _span = info_span!("compile_handle", type_name = class.name()).entered();
            let handle = HandleBuilder::new(&self.config, &self.converters, &self.parsers)
                .build(&class)?;
            info!(
                "Registered document type '{}' as collection '{}'",
                handle.type_name(),
                handle.collection_name()
            );
            Ok(Arc::new(handle) as Arc<dyn Any + Send + Sync>)
        })?;

        Ok(erased.downcast::<Handle<E>>().unwrap_or_else(|_| {
            panic!("handle cache entry for '{}' holds another type", type_name::<E>())
        }))
    }

    /// The proxy type for `E`, compiling its handle first if needed.
    pub fn proxy_type<E: Document>(&self) -> Result<Arc<ProxyType<E>>> {
        let handle = self.handle::<E>()?;
        self.proxies.proxy_type(handle)
    }

    /// Wraps an existing instance in `E`'s proxy type.
    pub fn create_proxy<E: Document>(&self, instance: E) -> Result<Proxy<E>> {
        let handle = self.handle::<E>()?;
        self.proxies.create_proxy(handle, instance)
    }

    pub fn unwrap<E: Document>(&self, proxy: Proxy<E>) -> E {
        self.proxies.unwrap(proxy)
    }

    pub fn stats(&self) -> Result<RegistryStats> {
        Ok(RegistryStats {
            handles: self.handles.len()?,
            proxy_types: self.proxies.len()?,
            converters: self.converters.len()?,
            resolved_parsers: self.parsers.resolved_count()?,
        })
    }
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        Self::new()
    }
}
