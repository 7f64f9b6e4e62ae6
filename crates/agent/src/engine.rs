//! `Agent`: one value per configured agent, dispatching to its architecture.

use crate::architecture::Architecture;
use crate::patterns::{BdiAgent, LatAgent, OodaAgent, RaiseAgent, ReactAgent, RewooAgent};
use crate::run::AgentProfile;
use harkaam_core::agent::AgentResult;
use harkaam_core::error::AgentError;
use harkaam_core::memory::Memory;
use serde_json::{Map, Value};
use std::sync::Arc;

#[derive(Debug, Clone)]
pub enum Agent {
    React(ReactAgent),
    Ooda(OodaAgent),
    Bdi(BdiAgent),
    Lat(LatAgent),
    Raise(RaiseAgent),
    Rewoo(RewooAgent),
}

impl Agent {
    pub fn architecture(&self) -> Architecture {
        match self {
            Agent::React(_) => Architecture::React,
            Agent::Ooda(_) => Architecture::Ooda,
            Agent::Bdi(_) => Architecture::Bdi,
            Agent::Lat(_) => Architecture::Lat,
            Agent::Raise(_) => Architecture::Raise,
            Agent::Rewoo(_) => Architecture::Rewoo,
        }
    }

    pub fn profile(&self) -> &AgentProfile {
        match self {
            Agent::React(a) => a.profile(),
            Agent::Ooda(a) => a.profile(),
            Agent::Bdi(a) => a.profile(),
            Agent::Lat(a) => a.profile(),
            Agent::Raise(a) => a.profile(),
            Agent::Rewoo(a) => a.profile(),
        }
    }

    pub fn id(&self) -> &str {
        &self.profile().id
    }

    pub fn name(&self) -> &str {
        &self.profile().name
    }

    /// The agent's own memory, used by `run` and `run_with_context`.
    pub fn memory(&self) -> Arc<dyn Memory> {
        self.profile().memory.clone()
    }

    /// Solve `task` with an empty run context.
    pub async fn run(&self, task: &str) -> Result<AgentResult, AgentError> {
        self.run_with_context(task, Map::new()).await
    }

    /// Solve `task` with caller-supplied facts seeded into the run context.
    pub async fn run_with_context(&self, task: &str, context: Map<String, Value>) -> Result<AgentResult, AgentError> {
        self.run_in(task, context, self.memory()).await
    }

    /// Like `run_with_context`, but writing to `memory` instead of the
    /// agent's own store. Workflow nodes use this so each node keeps an
    /// isolated memory even when several nodes share one agent.
    pub async fn run_in(
        &self,
        task: &str,
        context: Map<String, Value>,
        memory: Arc<dyn Memory>,
    ) -> Result<AgentResult, AgentError> {
        let task = task.trim();
        if task.is_empty() {
            return Err(AgentError::InvalidTask("task must not be empty".into()));
        }
        match self {
            Agent::React(a) => a.execute(task, context, memory).await,
            Agent::Ooda(a) => a.execute(task, context, memory).await,
            Agent::Bdi(a) => a.execute(task, context, memory).await,
            Agent::Lat(a) => a.execute(task, context, memory).await,
            Agent::Raise(a) => a.execute(task, context, memory).await,
            Agent::Rewoo(a) => a.execute(task, context, memory).await,
        }
    }
}
