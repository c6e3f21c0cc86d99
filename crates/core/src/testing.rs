//! Scripted collaborators for unit and engine tests.

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use crate::state::{SearchHit, SearchResult};
use crate::tools::{
    CollaboratorError, Collaborators, GenerationRequest, PageFetcher, TextGenerator, WebSearch,
};

type Responder = dyn Fn(&GenerationRequest) -> Result<String, CollaboratorError> + Send + Sync;

/// Text generator answering through a closure and recording every request
pub struct ScriptedLlm {
    responder: Box<Responder>,
    calls: Mutex<Vec<GenerationRequest>>,
}

impl ScriptedLlm {
    pub fn new(
        responder: impl Fn(&GenerationRequest) -> Result<String, CollaboratorError>
            + Send
            + Sync
            + 'static,
    ) -> Self {
        Self {
            responder: Box::new(responder),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn always(text: &str) -> Self {
        let text = text.to_string();
        Self::new(move |_| Ok(text.clone()))
    }

    pub fn failing() -> Self {
        Self::new(|_| Err(CollaboratorError::transport("llm", "connection refused")))
    }

    pub fn calls(&self) -> Vec<GenerationRequest> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextGenerator for ScriptedLlm {
    async fn generate(&self, request: GenerationRequest) -> Result<String, CollaboratorError> {
        let answer = (self.responder)(&request);
        self.calls.lock().unwrap().push(request);
        answer
    }
}

/// Search returning `per_query` numbered hits for every query
pub struct FakeSearch {
    per_query: usize,
    failing_queries: HashSet<String>,
    fail_all: bool,
    queries: Mutex<Vec<String>>,
}

impl FakeSearch {
    pub fn new(per_query: usize) -> Self {
        Self {
            per_query,
            failing_queries: HashSet::new(),
            fail_all: false,
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail_all: true,
            ..Self::new(0)
        }
    }

    pub fn failing_on(mut self, query: &str) -> Self {
        self.failing_queries.insert(query.to_string());
        self
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl WebSearch for FakeSearch {
    async fn search(&self, query: &str) -> Result<Vec<SearchResult>, CollaboratorError> {
        self.queries.lock().unwrap().push(query.to_string());
        if self.fail_all || self.failing_queries.contains(query) {
            return Err(CollaboratorError::transport("search", "503 Service Unavailable"));
        }
        Ok((0..self.per_query)
            .map(|i| {
                SearchResult::Hit(SearchHit::new(
                    format!("{} #{}", query, i),
                    format!("snippet {}", i),
                    format!("https://example.test/{}/{}", query.replace(' ', "-"), i),
                ))
            })
            .collect())
    }
}

/// Fetcher echoing the URL as page text, failing on chosen URLs
pub struct FakeFetcher {
    failing_urls: HashSet<String>,
    fail_all: bool,
    page_len: usize,
    fetched: Mutex<Vec<String>>,
}

impl FakeFetcher {
    pub fn new() -> Self {
        Self {
            failing_urls: HashSet::new(),
            fail_all: false,
            page_len: 0,
            fetched: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail_all: true,
            ..Self::new()
        }
    }

    pub fn failing_on(mut self, url: &str) -> Self {
        self.failing_urls.insert(url.to_string());
        self
    }

    /// Pad every page to `len` characters
    pub fn with_page_len(mut self, len: usize) -> Self {
        self.page_len = len;
        self
    }

    pub fn fetched(&self) -> Vec<String> {
        self.fetched.lock().unwrap().clone()
    }
}

#[async_trait]
impl PageFetcher for FakeFetcher {
    async fn fetch(&self, url: &str) -> Result<String, CollaboratorError> {
        self.fetched.lock().unwrap().push(url.to_string());
        if self.fail_all || self.failing_urls.contains(url) {
            return Err(CollaboratorError::fetch(url, "HTTP 404 Not Found"));
        }
        let mut text = format!("page at {}", url);
        if text.len() < self.page_len {
            text.push_str(&"x".repeat(self.page_len - text.len()));
        }
        Ok(text)
    }
}

/// Bundle fakes into ports
pub fn ports(
    llm: Arc<ScriptedLlm>,
    search: Arc<FakeSearch>,
    fetcher: Arc<FakeFetcher>,
) -> Collaborators {
    Collaborators::new(llm, search, fetcher)
}

/// Ports where every collaborator call fails
pub fn failing_ports() -> Collaborators {
    ports(
        Arc::new(ScriptedLlm::failing()),
        Arc::new(FakeSearch::failing()),
        Arc::new(FakeFetcher::failing()),
    )
}

/// `n` structured hits with distinct links
pub fn hits(n: usize) -> Vec<SearchResult> {
    (0..n)
        .map(|i| {
            SearchResult::Hit(SearchHit::new(
                format!("Source {}", i),
                format!("snippet {}", i),
                format!("https://source.test/{}", i),
            ))
        })
        .collect()
}
