//! Shared test helpers for pattern tests.

use crate::llm::LlmClient;
use crate::run::AgentProfile;
use harkaam_core::error::ProviderError;
use harkaam_core::provider::{Provider, ProviderRequest, ProviderResponse};
use harkaam_core::tool::ToolRegistry;
use harkaam_memory::InMemoryStore;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// A mock provider that returns a sequence of scripted responses.
///
/// Each call to `complete` returns the next response in the queue.
/// Panics if more calls are made than responses provided.
pub struct SequentialMockProvider {
    responses: Mutex<Vec<ProviderResponse>>,
    call_count: Mutex<usize>,
}

impl SequentialMockProvider {
    pub fn new(responses: Vec<ProviderResponse>) -> Self {
        Self {
            responses: Mutex::new(responses),
            call_count: Mutex::new(0),
        }
    }

    /// Script plain text responses, returned in order.
    pub fn from_texts(texts: &[&str]) -> Self {
        Self::new(texts.iter().map(|t| make_text_response(t)).collect())
    }

    pub fn call_count(&self) -> usize {
        *self.call_count.lock().unwrap()
    }
}

#[async_trait::async_trait]
impl Provider for SequentialMockProvider {
    fn name(&self) -> &str {
        "sequential_mock"
    }

    async fn complete(&self, _request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let mut count = self.call_count.lock().unwrap();
        let responses = self.responses.lock().unwrap();

        if *count >= responses.len() {
            panic!(
                "SequentialMockProvider: no more responses (call #{}, have {})",
                *count,
                responses.len()
            );
        }

        let response = responses[*count].clone();
        *count += 1;
        Ok(response)
    }
}

type ResponderFn = dyn Fn(&ProviderRequest) -> Result<String, ProviderError> + Send + Sync;

/// A provider whose reply is computed from the request, so concurrent
/// callers (LAT siblings, ReWOO workers) get stable answers regardless of
/// call order.
pub struct FnProvider {
    func: Box<ResponderFn>,
    calls: AtomicUsize,
}

impl FnProvider {
    pub fn new<F>(func: F) -> Self
    where
        F: Fn(&ProviderRequest) -> Result<String, ProviderError> + Send + Sync + 'static,
    {
        Self {
            func: Box::new(func),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl Provider for FnProvider {
    fn name(&self) -> &str {
        "fn_mock"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        (self.func)(&request).map(|text| make_text_response(&text))
    }
}

/// A provider that always fails with a network error.
pub fn failing_provider() -> FnProvider {
    FnProvider::new(|_| Err(ProviderError::Network("connection refused".into())))
}

/// The user prompt of a request.
pub fn user_prompt(request: &ProviderRequest) -> &str {
    request.user_prompt()
}

/// Create a simple text response.
pub fn make_text_response(text: &str) -> ProviderResponse {
    ProviderResponse::text("mock-model", text).with_usage(10, 5)
}

/// A profile with the calculator tool and a fresh in-memory store.
pub fn test_profile(provider: Arc<dyn Provider>) -> AgentProfile {
    let mut tools = ToolRegistry::new();
    tools.register(Arc::new(harkaam_tools::CalculatorTool));
    AgentProfile {
        id: "test-agent".into(),
        name: "Test Agent".into(),
        description: "an agent under test".into(),
        system_prompt: None,
        llm: LlmClient::new(provider, "mock-model"),
        tools: Arc::new(tools),
        memory: Arc::new(InMemoryStore::new()),
        verbose: false,
        max_iterations: 5,
    }
}
