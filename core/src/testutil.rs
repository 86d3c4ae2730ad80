//! Spy engines and documents shared by the core test suites

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

use crate::traits::{Document, DocumentGenerator, EngineError, GeneratorError, Query, SearchEngine};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TestDoc {
    pub id: u64,
}

impl Document for TestDoc {
    fn id(&self) -> u64 {
        self.id
    }
}

/// One recorded call on a [`SpyEngine`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Clear,
    Insert(Vec<u64>),
    Wait(usize),
    Execute(Query),
}

#[derive(Debug, Clone, Copy)]
pub enum ClearBehavior {
    Ok,
    NotFound,
    Fail,
}

pub struct SpyEngine {
    name: String,
    supported: Vec<Query>,
    clear: ClearBehavior,
    fail_inserts: bool,
    fail_wait: bool,
    fail_every: Option<usize>,
    panic_on_execute: bool,
    delay: Option<Duration>,
    calls: Mutex<Vec<Call>>,
    executed: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl SpyEngine {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            supported: vec![Query::SingleWord, Query::PhraseMatch],
            clear: ClearBehavior::Ok,
            fail_inserts: false,
            fail_wait: false,
            fail_every: None,
            panic_on_execute: false,
            delay: None,
            calls: Mutex::new(Vec::new()),
            executed: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    pub fn with_supported(mut self, supported: &[Query]) -> Self {
        self.supported = supported.to_vec();
        self
    }

    pub fn with_clear(mut self, clear: ClearBehavior) -> Self {
        self.clear = clear;
        self
    }

    pub fn with_failing_inserts(mut self) -> Self {
        self.fail_inserts = true;
        self
    }

    pub fn with_failing_wait(mut self) -> Self {
        self.fail_wait = true;
        self
    }

    /// Every `n`th execute call (1-based) fails
    pub fn with_fail_every(mut self, n: usize) -> Self {
        self.fail_every = Some(n);
        self
    }

    /// Every execute call panics
    pub fn with_panicking_execute(mut self) -> Self {
        self.panic_on_execute = true;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn insert_calls(&self) -> Vec<Vec<u64>> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Insert(ids) => Some(ids),
                _ => None,
            })
            .collect()
    }

    pub fn executed(&self) -> usize {
        self.executed.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn status(&self, status: u16) -> EngineError {
        EngineError::Status {
            engine: self.name.clone(),
            status,
            body: "simulated".to_string(),
        }
    }
}

#[async_trait]
impl SearchEngine<TestDoc> for SpyEngine {
    fn name(&self) -> &str {
        &self.name
    }

    fn supported_queries(&self) -> &[Query] {
        &self.supported
    }

    async fn clear(&self) -> Result<(), EngineError> {
        self.record(Call::Clear);
        match self.clear {
            ClearBehavior::Ok => Ok(()),
            ClearBehavior::NotFound => Err(EngineError::IndexNotFound(self.name.clone())),
            ClearBehavior::Fail => Err(self.status(500)),
        }
    }

    async fn insert_batch(&self, docs: &[TestDoc]) -> Result<(), EngineError> {
        self.record(Call::Insert(docs.iter().map(|d| d.id).collect()));
        if self.fail_inserts {
            return Err(self.status(503));
        }
        Ok(())
    }

    async fn wait_until_indexed(&self, expected: usize) -> Result<(), EngineError> {
        self.record(Call::Wait(expected));
        if self.fail_wait {
            return Err(EngineError::IndexTimeout {
                expected,
                visible: 0,
                waited: Duration::from_secs(1),
            });
        }
        Ok(())
    }

    async fn execute(&self, query: Query) -> Result<(), EngineError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        let count = self.executed.fetch_add(1, Ordering::SeqCst) + 1;
        self.record(Call::Execute(query));

        if self.panic_on_execute {
            panic!("{} crashed while executing {}", self.name, query);
        }

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if let Some(n) = self.fail_every {
            if count % n == 0 {
                return Err(self.status(500));
            }
        }
        Ok(())
    }
}

/// Generator producing `TestDoc`s with ids 1..=count
pub struct CountingGenerator {
    pub default_count: usize,
    pub calls: usize,
    pub fail: bool,
}

impl CountingGenerator {
    pub fn new(default_count: usize) -> Self {
        Self {
            default_count,
            calls: 0,
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new(0)
        }
    }
}

impl DocumentGenerator<TestDoc> for CountingGenerator {
    fn name(&self) -> &str {
        "counting"
    }

    fn generate(&mut self, count: Option<usize>) -> Result<Vec<TestDoc>, GeneratorError> {
        self.calls += 1;
        if self.fail {
            return Err(GeneratorError::Parse("simulated".into()));
        }
        let n = count.unwrap_or(self.default_count);
        Ok((1..=n as u64).map(|id| TestDoc { id }).collect())
    }
}
