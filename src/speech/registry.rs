//! Engine registry
//!
//! Engines are registered explicitly, in order. Selection by slug reports
//! unknown, unavailable and ambiguous slugs as distinct errors.

use crate::speech::backends::baidu::{self, BaiduEngine};
use crate::speech::backends::logging::{self, LogEngine};
use crate::speech::engine::{Engine, EngineContext};
use crate::{Result, VsayError};
use log::{debug, info};

/// Availability check run before an engine is constructed
pub type AvailabilityCheck = fn(&EngineContext) -> bool;

/// Engine constructor
pub type EngineBuilder = fn(&EngineContext) -> Result<Box<dyn Engine>>;

/// A registered engine variant
#[derive(Clone, Copy)]
pub struct EngineDescriptor {
    pub slug: &'static str,
    pub is_available: AvailabilityCheck,
    pub build: EngineBuilder,
}

impl EngineDescriptor {
    pub fn new(slug: &'static str, is_available: AvailabilityCheck, build: EngineBuilder) -> Self {
        Self {
            slug,
            is_available,
            build,
        }
    }
}

impl std::fmt::Debug for EngineDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineDescriptor")
            .field("slug", &self.slug)
            .finish()
    }
}

/// Ordered set of known engine variants
#[derive(Debug, Default)]
pub struct EngineRegistry {
    engines: Vec<EngineDescriptor>,
}

impl EngineRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an engine variant after those already registered
    pub fn register(&mut self, descriptor: EngineDescriptor) -> &mut Self {
        debug!("Registering TTS engine '{}'", descriptor.slug);
        self.engines.push(descriptor);
        self
    }

    /// Every registered variant, in registration order
    pub fn descriptors(&self) -> &[EngineDescriptor] {
        &self.engines
    }

    /// Variants whose availability check passes, in registration order
    pub fn list_available(&self, ctx: &EngineContext) -> Vec<&EngineDescriptor> {
        self.engines
            .iter()
            .filter(|e| (e.is_available)(ctx))
            .collect()
    }

    /// Variants whose availability check fails, in registration order
    pub fn list_unavailable(&self, ctx: &EngineContext) -> Vec<&EngineDescriptor> {
        self.engines
            .iter()
            .filter(|e| !(e.is_available)(ctx))
            .collect()
    }

    /// Construct the engine registered under `slug`
    pub fn select_by_slug(&self, slug: &str, ctx: &EngineContext) -> Result<Box<dyn Engine>> {
        if slug.trim().is_empty() {
            return Err(VsayError::Config("Invalid empty TTS engine slug".to_string()));
        }

        let matches: Vec<&EngineDescriptor> =
            self.engines.iter().filter(|e| e.slug == slug).collect();

        let descriptor = match matches.as_slice() {
            [] => return Err(VsayError::NotFound(slug.to_string())),
            [one] => *one,
            _ => return Err(VsayError::AmbiguousSlug(slug.to_string())),
        };

        if !(descriptor.is_available)(ctx) {
            return Err(VsayError::Unavailable(slug.to_string()));
        }

        info!("Using TTS engine '{}'", slug);
        (descriptor.build)(ctx)
    }
}

/// Registry with every built-in engine
pub fn default_registry() -> EngineRegistry {
    let mut registry = EngineRegistry::new();
    registry
        .register(EngineDescriptor::new(logging::SLUG, LogEngine::probe, LogEngine::build))
        .register(EngineDescriptor::new(
            logging::LEGACY_SLUG,
            LogEngine::probe,
            LogEngine::build,
        ))
        .register(EngineDescriptor::new(baidu::SLUG, BaiduEngine::probe, BaiduEngine::build));
    registry
}
