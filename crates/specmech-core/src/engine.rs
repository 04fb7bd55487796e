//! Protocol engine
//!
//! Turns one framed inbound sentence into the actions a session must carry
//! out. The engine owns no I/O: the session loop writes what it is told to
//! write and runs what it is told to run, in order.
//!
//! ## Pipeline
//!
//! ```text
//! bytes ─> parse_sentence ─> RebootGate ─> Dispatcher ─> Vec<SessionAction>
//!              │                  │
//!              └─ FrameError      └─ wake prompt
//! ```
//!
//! ## Design
//!
//! - Action-based: `handle` is synchronous and never waits on an actuator
//! - Shared: one engine per deployment, cloned into every session
//! - Detached completion: timed work runs on its own task, so a dropped
//!   connection never strands a door half-open

use std::sync::Arc;

use specmech_proto::{Inbound, ParserOptions, ReplyComposer, parse_sentence};

use crate::{
    config::ProtocolConfig,
    device::{DeviceRegistry, DeviceSeeds},
    dispatcher::{Dispatcher, Operation},
    env::Environment,
    gate::{GateState, RebootGate},
};

/// Actions returned by the engine for a session to execute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionAction {
    /// Write these bytes to the client.
    Send(String),
    /// Run timed work and wait for it before the next action.
    Perform(Operation),
    /// Close the connection without a reply.
    Close,
}

struct Inner<E>
where
    E: Environment,
{
    config: Arc<ProtocolConfig>,
    parser: ParserOptions,
    composer: ReplyComposer,
    gate: Arc<RebootGate>,
    dispatcher: Dispatcher<E>,
}

/// Command protocol engine shared by every session of one controller.
pub struct ProtocolEngine<E>
where
    E: Environment,
{
    inner: Arc<Inner<E>>,
}

impl<E> Clone for ProtocolEngine<E>
where
    E: Environment,
{
    fn clone(&self) -> Self {
        Self { inner: Arc::clone(&self.inner) }
    }
}

impl<E> ProtocolEngine<E>
where
    E: Environment,
{
    /// Build an engine with fresh devices. The controller boots now and
    /// starts awaiting the wake sentence.
    pub fn new(env: E, config: ProtocolConfig, seeds: &DeviceSeeds) -> Self {
        let registry = Arc::new(DeviceRegistry::new(seeds, env.wall_clock()));
        Self::with_registry(env, config, registry)
    }

    /// Build an engine over an existing registry.
    pub fn with_registry(env: E, config: ProtocolConfig, registry: Arc<DeviceRegistry>) -> Self {
        let parser = config.parser_options();
        let composer = config.composer();
        let config = Arc::new(config);
        let gate = Arc::new(RebootGate::new());
        let dispatcher =
            Dispatcher::new(env, Arc::clone(&config), registry, Arc::clone(&gate));

        Self { inner: Arc::new(Inner { config, parser, composer, gate, dispatcher }) }
    }

    /// Deployment configuration.
    pub fn config(&self) -> &ProtocolConfig {
        &self.inner.config
    }

    /// Shared device registry.
    pub fn registry(&self) -> &Arc<DeviceRegistry> {
        self.inner.dispatcher.registry()
    }

    /// Reboot gate.
    pub fn gate(&self) -> &RebootGate {
        &self.inner.gate
    }

    /// Reply composer of this deployment.
    pub fn composer(&self) -> &ReplyComposer {
        &self.inner.composer
    }

    /// Plan the reply to one framed sentence, terminator included.
    ///
    /// Never touches a device for malformed input or while the gate is
    /// closed.
    pub fn handle(&self, raw: &[u8]) -> Vec<SessionAction> {
        let inner = &*self.inner;
        let parsed = parse_sentence(raw, &inner.parser);

        match (inner.gate.state(), parsed) {
            (_, Ok(Inbound::Quit)) => {
                tracing::debug!("client quit");
                vec![SessionAction::Close]
            },
            (GateState::AwaitingWake, Ok(Inbound::Wake)) => {
                inner.gate.wake();
                tracing::info!("controller woken");
                vec![SessionAction::Send(inner.composer.ack(None))]
            },
            (GateState::AwaitingWake, other) => {
                tracing::warn!(
                    input = %raw.escape_ascii(),
                    parsed = other.is_ok(),
                    "rejected: awaiting wake"
                );
                vec![SessionAction::Send(inner.composer.wake_prompt())]
            },
            (GateState::Operational, Ok(Inbound::Wake)) => {
                tracing::warn!("wake sentence while operational");
                vec![SessionAction::Send(inner.composer.error())]
            },
            (GateState::Operational, Ok(Inbound::Command(command))) => {
                tracing::debug!(
                    verb = %command.verb.as_char(),
                    object = ?command.object,
                    command_id = command.command_id.as_deref(),
                    "dispatch"
                );
                inner.dispatcher.dispatch(&command)
            },
            (GateState::Operational, Err(error)) => {
                tracing::warn!(input = %raw.escape_ascii(), %error, "framing error");
                vec![SessionAction::Send(inner.composer.error())]
            },
        }
    }

    /// Run timed work to completion on a detached task.
    ///
    /// The work finishes even if the caller is dropped mid-await.
    pub async fn perform(&self, operation: Operation) {
        let dispatcher = self.inner.dispatcher.clone();
        let task = tokio::spawn(async move { dispatcher.perform(operation).await });

        if let Err(error) = task.await {
            tracing::error!(?operation, %error, "operation task failed");
        }
    }
}
