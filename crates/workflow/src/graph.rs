//! `WorkflowGraph`: a DAG of agent nodes and the scheduler that runs it.
//!
//! Nodes become ready once every dependency has an entry in the results
//! map. Ready nodes start in insertion order and run concurrently, up to
//! `max_parallel` at a time. A node whose agent fails never gets an entry,
//! so its dependents stall and the execution reports both.

use crate::node::{INPUT_KEY, NodeOutput, NodeSpec, WorkflowResults};
use futures::StreamExt;
use futures::stream::FuturesUnordered;
use harkaam_config::WorkflowConfig;
use harkaam_core::error::WorkflowError;
use harkaam_core::memory::Memory;
use harkaam_memory::InMemoryStore;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Debug)]
pub struct WorkflowGraph {
    id: String,
    name: String,
    nodes: Vec<NodeSpec>,
    index: HashMap<String, usize>,
    /// 0 means no limit.
    max_parallel: usize,
}

impl WorkflowGraph {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            nodes: Vec::new(),
            index: HashMap::new(),
            max_parallel: 0,
        }
    }

    pub fn with_max_parallel(mut self, max_parallel: usize) -> Self {
        self.max_parallel = max_parallel;
        self
    }

    pub fn with_config(self, config: &WorkflowConfig) -> Self {
        self.with_max_parallel(config.max_parallel_nodes)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: &str) -> Option<&NodeSpec> {
        self.index.get(id).map(|&i| &self.nodes[i])
    }

    /// Node ids in insertion order.
    pub fn node_ids(&self) -> Vec<&str> {
        self.nodes.iter().map(|n| n.id.as_str()).collect()
    }

    // ── Construction ──────────────────────────────────────────────────

    /// Add a node whose dependencies are already in the graph.
    pub fn add_node(&mut self, spec: NodeSpec) -> Result<String, WorkflowError> {
        if spec.id == INPUT_KEY || self.index.contains_key(&spec.id) {
            return Err(WorkflowError::DuplicateNode(spec.id));
        }
        for dep in &spec.dependencies {
            if *dep == spec.id {
                return Err(WorkflowError::CyclicDependency {
                    node: spec.id.clone(),
                    dependency: dep.clone(),
                });
            }
            if !self.index.contains_key(dep) {
                return Err(WorkflowError::UnknownDependency {
                    node: spec.id.clone(),
                    dependency: dep.clone(),
                });
            }
        }

        let id = spec.id.clone();
        debug!(workflow = %self.name, node = %id, name = %spec.name, deps = spec.dependencies.len(), "Node added");
        self.index.insert(id.clone(), self.nodes.len());
        self.nodes.push(spec);
        Ok(id)
    }

    /// Make `node` wait for `dependency`. Rejects the edge if `dependency`
    /// already depends on `node`, directly or transitively.
    pub fn add_dependency(&mut self, node: &str, dependency: &str) -> Result<(), WorkflowError> {
        let Some(&position) = self.index.get(node) else {
            return Err(WorkflowError::UnknownNode(node.to_string()));
        };
        if !self.index.contains_key(dependency) {
            return Err(WorkflowError::UnknownDependency {
                node: node.to_string(),
                dependency: dependency.to_string(),
            });
        }
        if node == dependency || self.depends_on(dependency, node) {
            return Err(WorkflowError::CyclicDependency {
                node: node.to_string(),
                dependency: dependency.to_string(),
            });
        }

        let deps = &mut self.nodes[position].dependencies;
        if !deps.iter().any(|d| d == dependency) {
            deps.push(dependency.to_string());
        }
        Ok(())
    }

    /// Whether `from` reaches `target` by following dependency edges.
    fn depends_on(&self, from: &str, target: &str) -> bool {
        let mut stack = vec![from];
        let mut seen = HashSet::new();
        while let Some(id) = stack.pop() {
            if id == target {
                return true;
            }
            if !seen.insert(id) {
                continue;
            }
            if let Some(node) = self.node(id) {
                stack.extend(node.dependencies.iter().map(String::as_str));
            }
        }
        false
    }

    /// A dependency-respecting order; ties keep insertion order.
    pub fn topological_order(&self) -> Result<Vec<String>, WorkflowError> {
        let mut remaining: Vec<usize> = self.nodes.iter().map(|n| n.dependencies.len()).collect();
        let mut placed = vec![false; self.nodes.len()];
        let mut order = Vec::with_capacity(self.nodes.len());

        while order.len() < self.nodes.len() {
            let Some(next) = (0..self.nodes.len()).find(|&i| !placed[i] && remaining[i] == 0) else {
                let stuck = self.nodes.iter().zip(&placed).find(|(_, done)| !**done).map(|(node, _)| node);
                return Err(WorkflowError::CyclicDependency {
                    node: stuck.map(|n| n.id.clone()).unwrap_or_default(),
                    dependency: stuck.and_then(|n| n.dependencies.first().cloned()).unwrap_or_default(),
                });
            };
            placed[next] = true;
            let id = &self.nodes[next].id;
            for (i, node) in self.nodes.iter().enumerate() {
                if !placed[i] && node.dependencies.iter().any(|d| d == id) {
                    remaining[i] -= 1;
                }
            }
            order.push(id.clone());
        }
        Ok(order)
    }

    // ── Execution ─────────────────────────────────────────────────────

    fn has_capacity(&self, running: usize) -> bool {
        self.max_parallel == 0 || running < self.max_parallel
    }

    /// Run every node and return the results map, which also holds
    /// `initial_input` under [`INPUT_KEY`].
    pub async fn execute(&self, initial_input: Value) -> Result<WorkflowResults, WorkflowError> {
        self.topological_order()?;
        info!(workflow = %self.name, nodes = self.nodes.len(), max_parallel = self.max_parallel, "Workflow starting");

        let mut results = WorkflowResults::new();
        results.insert(INPUT_KEY.to_string(), NodeOutput::Input(initial_input));

        let mut pending: Vec<&NodeSpec> = self.nodes.iter().collect();
        let mut failed: Vec<(String, String)> = Vec::new();
        let mut running = FuturesUnordered::new();

        loop {
            while self.has_capacity(running.len()) {
                let Some(position) = pending.iter().position(|node| node.is_ready(&results)) else {
                    break;
                };
                let node = pending.remove(position);

                if !node.should_run(&results) {
                    info!(workflow = %self.name, node = %node.id, "Condition false, skipping node");
                    results.insert(node.id.clone(), NodeOutput::Skipped);
                    continue;
                }

                let context = node.input_for(&results);
                let task = node.task();
                let memory: Arc<dyn Memory> = match &node.memory {
                    Some(memory) => memory.clone(),
                    None => Arc::new(InMemoryStore::new()),
                };
                info!(workflow = %self.name, node = %node.id, agent = %node.agent.name(), "Node starting");
                running.push(async move {
                    let outcome = node.agent.run_in(&task, context, memory).await;
                    (node, outcome)
                });
            }

            let Some((node, outcome)) = running.next().await else {
                break;
            };
            match outcome {
                Ok(result) => {
                    info!(workflow = %self.name, node = %node.id, steps = result.final_state.step_count, "Node finished");
                    results.insert(node.id.clone(), node.output_from(result));
                }
                Err(e) => {
                    warn!(workflow = %self.name, node = %node.id, error = %e, "Node failed");
                    failed.push((node.id.clone(), e.to_string()));
                }
            }
        }

        if !failed.is_empty() || !pending.is_empty() {
            let stalled: Vec<String> = pending.iter().map(|node| node.id.clone()).collect();
            warn!(workflow = %self.name, failed = failed.len(), stalled = stalled.len(), "Workflow did not complete");
            return Err(WorkflowError::Execution { failed, stalled });
        }

        info!(workflow = %self.name, results = results.len(), "Workflow complete");
        Ok(results)
    }
}
