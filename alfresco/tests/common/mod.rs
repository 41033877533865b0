//! In-memory container runtime recording every start and stop.

use alfresco_testcontainers::{
    AlfrescoContainer, ContainerRuntime, ContainerSpec, FixtureError, FixtureResult,
    RunningContainer,
};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Started(String),
    Stopped(String),
}

#[derive(Debug, Default)]
struct State {
    events: Vec<Event>,
    specs: HashMap<String, ContainerSpec>,
    start_failures: HashMap<String, FixtureError>,
    stop_failures: HashSet<String>,
    next_port: u16,
}

#[derive(Debug, Clone, Default)]
pub struct FakeRuntime {
    state: Arc<Mutex<State>>,
}

impl FakeRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_start(&self, container: &str, error: FixtureError) {
        self.state
            .lock()
            .unwrap()
            .start_failures
            .insert(container.to_string(), error);
    }

    pub fn fail_stop(&self, container: &str) {
        self.state
            .lock()
            .unwrap()
            .stop_failures
            .insert(container.to_string());
    }

    pub fn events(&self) -> Vec<Event> {
        self.state.lock().unwrap().events.clone()
    }

    pub fn spec(&self, container: &str) -> Option<ContainerSpec> {
        self.state.lock().unwrap().specs.get(container).cloned()
    }

    /// Fixture for `version` wired to this runtime.
    pub fn alfresco(&self, version: &str) -> AlfrescoContainer {
        AlfrescoContainer::builder()
            .version(version)
            .runtime(Arc::new(self.clone()))
            .build()
            .expect("valid fixture")
    }
}

#[async_trait]
impl ContainerRuntime for FakeRuntime {
    async fn start(&self, spec: &ContainerSpec) -> FixtureResult<Box<dyn RunningContainer>> {
        let mut state = self.state.lock().unwrap();
        if let Some(error) = state.start_failures.get(spec.name()) {
            return Err(error.clone());
        }

        let mut ports = HashMap::new();
        for port in spec.exposed_ports() {
            state.next_port += 1;
            ports.insert(*port, 32000 + state.next_port);
        }
        state.events.push(Event::Started(spec.name().to_string()));
        state.specs.insert(spec.name().to_string(), spec.clone());

        Ok(Box::new(FakeContainer {
            name: spec.name().to_string(),
            id: format!("fake-{}", spec.name()),
            ports,
            state: Arc::clone(&self.state),
        }))
    }
}

#[derive(Debug)]
struct FakeContainer {
    name: String,
    id: String,
    ports: HashMap<u16, u16>,
    state: Arc<Mutex<State>>,
}

#[async_trait]
impl RunningContainer for FakeContainer {
    fn id(&self) -> &str {
        &self.id
    }

    async fn host(&self) -> FixtureResult<String> {
        Ok("127.0.0.1".to_string())
    }

    async fn mapped_port(&self, port: u16) -> FixtureResult<u16> {
        self.ports
            .get(&port)
            .copied()
            .ok_or_else(|| FixtureError::runtime(format!("map port {port}"), "not exposed"))
    }

    async fn stop(&mut self) -> FixtureResult<()> {
        let mut state = self.state.lock().unwrap();
        state.events.push(Event::Stopped(self.name.clone()));
        if state.stop_failures.contains(&self.name) {
            return Err(FixtureError::runtime(
                format!("stop {}", self.name),
                "daemon unreachable",
            ));
        }
        Ok(())
    }
}

pub fn started(name: &str) -> Event {
    Event::Started(name.to_string())
}

pub fn stopped(name: &str) -> Event {
    Event::Stopped(name.to_string())
}
