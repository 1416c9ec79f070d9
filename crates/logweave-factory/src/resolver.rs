//! Channel resolution: the entry point that turns channel names into loggers.

use crate::builder::ComponentBuilder;
use crate::session::ResolutionSession;
use logweave_core::{ConfigDocument, ConfigLocator};
use logweave_handlers::{ComponentRegistry, ErrorHandlerRegistrar, Logger, PanicHookRegistrar};
use logweave_types::config::DEFAULT_CHANNEL;
use logweave_types::{ChannelSpec, LogweaveError, Result, Section};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Builds loggers for channel names from a configuration document.
///
/// Loggers are memoized per session: asking for the same channel twice
/// returns the same `Arc`. Channels without an entry fall back to `other`,
/// and the synthesized entry is stored in the document.
pub struct LoggerFactory {
    document: ConfigDocument,
    registry: ComponentRegistry,
    error_handlers: Box<dyn ErrorHandlerRegistrar>,
    session: ResolutionSession,
}

impl LoggerFactory {
    /// Create a factory over a document with the standard registry.
    pub fn new(document: ConfigDocument) -> Self {
        Self {
            document,
            registry: ComponentRegistry::standard(),
            error_handlers: Box::new(PanicHookRegistrar::new()),
            session: ResolutionSession::new(),
        }
    }

    /// Load the document from a YAML file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::new(ConfigDocument::load(path)?))
    }

    /// Load the document via a locator (environment override, site file,
    /// distributed default).
    pub fn from_locator(locator: &ConfigLocator) -> Result<Self> {
        Ok(Self::new(locator.load()?))
    }

    /// Use a different component registry.
    pub fn with_registry(mut self, registry: ComponentRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Use a different process error handler registrar.
    pub fn with_error_handler_registrar(mut self, registrar: Box<dyn ErrorHandlerRegistrar>) -> Self {
        self.error_handlers = registrar;
        self
    }

    /// The configuration document, including synthesized channel entries.
    pub fn document(&self) -> &ConfigDocument {
        &self.document
    }

    /// The component registry.
    pub fn registry(&self) -> &ComponentRegistry {
        &self.registry
    }

    /// Forget every logger built so far. Synthesized channel entries stay.
    pub fn reset_session(&mut self) {
        debug!("Resetting logger session ({} loggers)", self.session.len());
        self.session = ResolutionSession::new();
    }

    /// Logger for a channel; `None` or an empty name means `default`.
    pub fn get_logger(&mut self, name: Option<&str>) -> Result<Arc<Logger>> {
        let channel = match name {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => DEFAULT_CHANNEL.to_string(),
        };

        self.resolve(&channel).map_err(|source| LogweaveError::Resolution {
            channel: channel.clone(),
            snapshot: self.document.snapshot(),
            source: Box::new(source),
        })
    }

    fn resolve(&mut self, channel: &str) -> Result<Arc<Logger>> {
        if let Some(logger) = self.session.lookup(channel) {
            return Ok(logger);
        }

        self.session.begin(channel)?;
        match self.build(channel) {
            Ok(logger) => {
                self.session.complete(channel, Arc::clone(&logger));
                info!(
                    "Resolved channel '{}' ({} handlers, {} processors)",
                    channel,
                    logger.handlers().len(),
                    logger.processors().len()
                );
                Ok(logger)
            }
            Err(e) => {
                self.session.abandon(channel);
                debug!("Resolution of channel '{}' failed: {}", channel, e);
                Err(e)
            }
        }
    }

    fn build(&mut self, channel: &str) -> Result<Arc<Logger>> {
        let spec = self.channel_spec(channel)?;

        let mut logger = match &spec.extends {
            Some(parent) => {
                debug!("Channel '{}' extends '{}'", channel, parent);
                self.resolve(parent)?.with_name(channel)
            }
            None => Logger::new(channel),
        };

        if let Some(microseconds) = spec.use_microseconds {
            logger.use_microsecond_timestamps(microseconds);
        }

        let mut builder = ComponentBuilder::new(&self.document, &self.registry);
        for reference in spec.component_refs(channel, Section::Handlers)? {
            logger.push_handler(builder.build_handler(&reference)?);
        }
        for reference in spec.component_refs(channel, Section::Processors)? {
            logger.push_processor(builder.build_processor(&reference)?);
        }

        let logger = Arc::new(logger);
        if let Some(options) = spec.error_handler_options() {
            debug!("Registering process error handler for channel '{}'", channel);
            self.error_handlers.register(&logger, &options)?;
        }

        Ok(logger)
    }

    fn channel_spec(&mut self, channel: &str) -> Result<ChannelSpec> {
        if let Some(value) = self.document.channel(channel) {
            return ChannelSpec::from_value(channel, value);
        }

        let spec = ChannelSpec::fallback(channel);
        if channel == DEFAULT_CHANNEL {
            warn!("No 'default' channel configured, using an empty logger");
        } else {
            debug!("Channel '{}' not configured, falling back to {:?}", channel, spec.extends);
        }
        self.document.insert_channel(channel, &spec)?;
        Ok(spec)
    }
}
