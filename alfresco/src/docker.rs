//! [`ContainerRuntime`] backed by `testcontainers`.
//!
//! Docker network aliases are not exposed by `testcontainers`, so they are
//! emulated: once a container with aliases is up, its address on the shared
//! network is recorded, and every container started later on the same
//! network gets `alias -> address` host entries.

use crate::probe::{LogStream, ReadinessProbe};
use crate::runtime::{ContainerRuntime, RunningContainer};
use crate::spec::ContainerSpec;
use async_trait::async_trait;
use dashmap::DashMap;
use errors::{FixtureError, FixtureResult};
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;
use testcontainers::core::error::WaitContainerError;
use testcontainers::core::logs::LogSource;
use testcontainers::core::wait::{HttpWaitStrategy, LogWaitStrategy};
use testcontainers::core::{ContainerPort, Host, WaitFor};
use testcontainers::runners::AsyncRunner;
use testcontainers::{
    ContainerAsync, ContainerRequest, GenericImage, ImageExt, TestcontainersError
};

/// Used when a spec carries no readiness probe.
const DEFAULT_STARTUP_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
struct NetworkHost {
    alias: String,
    address: IpAddr,
    container_id: String
}

type HostRegistry = Arc<DashMap<String, Vec<NetworkHost>>>;

/// Runs containers on the local Docker daemon.
///
/// Creating a `DockerRuntime` does not contact Docker; the daemon is reached
/// on the first [`ContainerRuntime::start`].
#[derive(Debug, Clone, Default)]
pub struct DockerRuntime {
    hosts: HostRegistry
}

impl DockerRuntime {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the request for `spec`. The startup timeout covers readiness
    /// only; image pull and container creation are not counted.
    fn request_for(&self, spec: &ContainerSpec) -> ContainerRequest<GenericImage> {
        let image = spec.image();
        let mut generic = GenericImage::new(image.unversioned(), image.tag().to_string());
        for port in spec.exposed_ports() {
            generic = generic.with_exposed_port(ContainerPort::Tcp(*port));
        }
        for condition in wait_conditions(spec.readiness()) {
            generic = generic.with_wait_for(condition);
        }

        let mut request = generic.with_startup_timeout(startup_timeout(spec));
        for (key, value) in spec.env().iter() {
            request = request.with_env_var(key, value);
        }

        if let Some(network) = spec.network() {
            request = request.with_network(network.name());
            if let Some(alias) = spec.network_aliases().first() {
                request = request.with_container_name(format!("{}-{alias}", network.name()));
            }
            for (alias, address) in self.known_hosts(network.name()) {
                request = request.with_host(alias, Host::Addr(address));
            }
        }

        request
    }

    /// Aliases registered on `network` so far.
    fn known_hosts(&self, network: &str) -> Vec<(String, IpAddr)> {
        self.hosts
            .get(network)
            .map(|known| {
                known
                    .iter()
                    .map(|host| (host.alias.clone(), host.address))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Points `aliases` on `network` at `address`, replacing earlier owners.
    fn record_aliases(
        &self,
        network: &str,
        aliases: &[String],
        address: IpAddr,
        container_id: &str
    ) {
        let mut entry = self.hosts.entry(network.to_string()).or_default();
        for alias in aliases {
            entry.retain(|host| host.alias != *alias);
            entry.push(NetworkHost {
                alias: alias.clone(),
                address,
                container_id: container_id.to_string()
            });
        }
    }

    async fn register_aliases(
        &self,
        spec: &ContainerSpec,
        container: &ContainerAsync<GenericImage>
    ) -> FixtureResult<()> {
        let Some(network) = spec.network() else {
            return Ok(());
        };
        if spec.network_aliases().is_empty() {
            return Ok(());
        }

        let address = container
            .get_bridge_ip_address()
            .await
            .map_err(|e| FixtureError::runtime(format!("resolve address of {}", spec.name()), e))?;
        self.record_aliases(network.name(), spec.network_aliases(), address, container.id());

        tracing::debug!(
            container = spec.name(),
            network = network.name(),
            %address,
            "Registered network aliases"
        );
        Ok(())
    }
}

#[async_trait]
impl ContainerRuntime for DockerRuntime {
    async fn start(&self, spec: &ContainerSpec) -> FixtureResult<Box<dyn RunningContainer>> {
        let request = self.request_for(spec);

        tracing::info!(
            container = spec.name(),
            image = %spec.image(),
            timeout_secs = startup_timeout(spec).as_secs(),
            "Starting container"
        );

        let container = request.start().await.map_err(|e| start_error(spec, e))?;

        self.register_aliases(spec, &container).await?;

        let id = container.id().to_string();
        tracing::info!(container = spec.name(), id = %id, "Container ready");

        Ok(Box::new(DockerContainer {
            name: spec.name().to_string(),
            id,
            network: spec.network().map(|n| n.name().to_string()),
            container: Some(container),
            hosts: Arc::clone(&self.hosts)
        }))
    }
}

fn startup_timeout(spec: &ContainerSpec) -> Duration {
    spec.readiness()
        .map_or(DEFAULT_STARTUP_TIMEOUT, ReadinessProbe::timeout)
}

/// Ready conditions `testcontainers` evaluates once the container runs.
fn wait_conditions(probe: Option<&ReadinessProbe>) -> Vec<WaitFor> {
    match probe {
        Some(ReadinessProbe::Http {
            port, path, status, ..
        }) => vec![WaitFor::http(
            HttpWaitStrategy::new(path.clone())
                .with_port(ContainerPort::Tcp(*port))
                .with_expected_status_code(*status)
        )],
        Some(ReadinessProbe::LogMessages { messages, .. }) => messages
            .iter()
            .map(|(stream, message)| {
                WaitFor::log(LogWaitStrategy::new(log_source(*stream), message))
            })
            .collect(),
        None => Vec::new()
    }
}

fn log_source(stream: LogStream) -> LogSource {
    match stream {
        LogStream::Stdout => LogSource::StdOut,
        LogStream::Stderr => LogSource::StdErr,
        LogStream::Either => LogSource::BothStd
    }
}

fn start_error(spec: &ContainerSpec, error: TestcontainersError) -> FixtureError {
    match error {
        TestcontainersError::WaitContainer(WaitContainerError::StartupTimeout) => {
            FixtureError::StartupTimeout {
                container: spec.name().to_string(),
                timeout_secs: startup_timeout(spec).as_secs()
            }
        }
        other => FixtureError::runtime(format!("start {}", spec.name()), other)
    }
}

/// A container started by [`DockerRuntime`].
#[derive(Debug)]
pub struct DockerContainer {
    name: String,
    id: String,
    network: Option<String>,
    container: Option<ContainerAsync<GenericImage>>,
    hosts: HostRegistry
}

impl DockerContainer {
    fn live(&self) -> FixtureResult<&ContainerAsync<GenericImage>> {
        self.container
            .as_ref()
            .ok_or_else(|| FixtureError::NotStarted {
                container: self.name.clone()
            })
    }

    fn forget_aliases(&self) {
        if let Some(network) = &self.network {
            if let Some(mut known) = self.hosts.get_mut(network) {
                known.retain(|host| host.container_id != self.id);
            }
            self.hosts.remove_if(network, |_, known| known.is_empty());
        }
    }
}

#[async_trait]
impl RunningContainer for DockerContainer {
    fn id(&self) -> &str {
        &self.id
    }

    async fn host(&self) -> FixtureResult<String> {
        let host = self
            .live()?
            .get_host()
            .await
            .map_err(|e| FixtureError::runtime(format!("resolve host of {}", self.name), e))?;
        Ok(host.to_string())
    }

    async fn mapped_port(&self, port: u16) -> FixtureResult<u16> {
        self.live()?
            .get_host_port_ipv4(ContainerPort::Tcp(port))
            .await
            .map_err(|e| FixtureError::runtime(format!("map port {port} of {}", self.name), e))
    }

    async fn stop(&mut self) -> FixtureResult<()> {
        let Some(container) = self.container.take() else {
            return Ok(());
        };
        self.forget_aliases();

        tracing::info!(container = %self.name, id = %self.id, "Stopping container");
        container
            .stop()
            .await
            .map_err(|e| FixtureError::runtime(format!("stop {}", self.name), e))?;
        container
            .rm()
            .await
            .map_err(|e| FixtureError::runtime(format!("remove {}", self.name), e))
    }
}

impl Drop for DockerContainer {
    fn drop(&mut self) {
        if self.container.is_some() {
            self.forget_aliases();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::ImageReference;
    use crate::network::SharedNetwork;
    use std::collections::BTreeMap;

    fn address(ip: &str) -> IpAddr {
        ip.parse().unwrap()
    }

    fn repository_spec(network: &SharedNetwork) -> ContainerSpec {
        let image =
            ImageReference::parse("alfresco/alfresco-content-repository-community:23.2.1").unwrap();
        ContainerSpec::new("alfresco", image)
            .with_exposed_port(8080)
            .with_env_var("JAVA_OPTS", "-Dcsrf.filter.enabled=false")
            .with_network(network.clone(), "alfresco")
            .with_readiness(ReadinessProbe::http_ok(8080, "/ready", Duration::from_secs(180)))
    }

    fn host_entries(request: &ContainerRequest<GenericImage>) -> BTreeMap<String, String> {
        request
            .hosts()
            .map(|(alias, host)| (alias.into_owned(), host.to_string()))
            .collect()
    }

    fn detached(id: &str, network: &str, hosts: &HostRegistry) -> DockerContainer {
        DockerContainer {
            name: id.to_string(),
            id: id.to_string(),
            network: Some(network.to_string()),
            container: None,
            hosts: Arc::clone(hosts)
        }
    }

    #[test]
    fn test_runtime_construction_is_offline() {
        let runtime = DockerRuntime::new();
        assert!(runtime.hosts.is_empty());
    }

    #[test]
    fn test_request_carries_network_env_and_timeout() {
        let runtime = DockerRuntime::new();
        let network = SharedNetwork::named("stack");
        let request = runtime.request_for(&repository_spec(&network));

        assert_eq!(request.network().as_deref(), Some("stack"));
        assert_eq!(request.container_name().as_deref(), Some("stack-alfresco"));
        assert_eq!(request.startup_timeout(), Some(Duration::from_secs(180)));
        assert!(request.expose_ports().contains(&ContainerPort::Tcp(8080)));

        let env: Vec<_> = request
            .env_vars()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert_eq!(
            env,
            vec![("JAVA_OPTS".to_string(), "-Dcsrf.filter.enabled=false".to_string())]
        );

        let conditions = request.ready_conditions();
        assert_eq!(conditions.len(), 1);
        assert!(matches!(conditions[0], WaitFor::Http(_)));
    }

    #[test]
    fn test_request_gets_hosts_registered_on_its_network() {
        let runtime = DockerRuntime::new();
        runtime.record_aliases("stack", &["postgres".to_string()], address("172.18.0.2"), "pg");
        runtime.record_aliases("stack", &["activemq".to_string()], address("172.18.0.3"), "mq");
        runtime.record_aliases("other", &["postgres".to_string()], address("172.19.0.2"), "pg2");

        let request = runtime.request_for(&repository_spec(&SharedNetwork::named("stack")));

        let expected: BTreeMap<String, String> = [
            ("activemq".to_string(), "172.18.0.3".to_string()),
            ("postgres".to_string(), "172.18.0.2".to_string()),
        ]
        .into_iter()
        .collect();
        assert_eq!(host_entries(&request), expected);
    }

    #[test]
    fn test_request_without_network_has_no_hosts() {
        let runtime = DockerRuntime::new();
        runtime.record_aliases("stack", &["postgres".to_string()], address("172.18.0.2"), "pg");

        let image = ImageReference::parse("postgres:15.6").unwrap();
        let request = runtime.request_for(&ContainerSpec::new("postgres", image));

        assert!(request.network().is_none());
        assert!(host_entries(&request).is_empty());
        assert_eq!(request.startup_timeout(), Some(DEFAULT_STARTUP_TIMEOUT));
        assert!(request.ready_conditions().is_empty());
    }

    #[test]
    fn test_recording_an_alias_again_replaces_its_address() {
        let runtime = DockerRuntime::new();
        runtime.record_aliases("stack", &["postgres".to_string()], address("172.18.0.2"), "old");
        runtime.record_aliases("stack", &["postgres".to_string()], address("172.18.0.9"), "new");

        assert_eq!(
            runtime.known_hosts("stack"),
            vec![("postgres".to_string(), address("172.18.0.9"))]
        );
        assert!(runtime.known_hosts("missing").is_empty());
    }

    #[test]
    fn test_log_readiness_becomes_one_condition_per_message() {
        let probe = ReadinessProbe::log_messages(
            [
                (LogStream::Stderr, "ready to accept connections"),
                (LogStream::Stdout, "ready to accept connections"),
            ],
            Duration::from_secs(120)
        );
        let conditions = wait_conditions(Some(&probe));
        assert_eq!(conditions.len(), 2);
        assert!(conditions.iter().all(|c| matches!(c, WaitFor::Log(_))));
        assert!(wait_conditions(None).is_empty());
    }

    #[test]
    fn test_log_streams_map_to_sources() {
        assert!(matches!(log_source(LogStream::Stdout), LogSource::StdOut));
        assert!(matches!(log_source(LogStream::Stderr), LogSource::StdErr));
        assert!(matches!(log_source(LogStream::Either), LogSource::BothStd));
    }

    #[test]
    fn test_readiness_timeout_maps_to_startup_timeout() {
        let spec = repository_spec(&SharedNetwork::named("stack"));
        let err = start_error(
            &spec,
            TestcontainersError::WaitContainer(WaitContainerError::StartupTimeout)
        );
        assert_eq!(
            err,
            FixtureError::StartupTimeout {
                container: "alfresco".to_string(),
                timeout_secs: 180
            }
        );
    }

    #[test]
    fn test_other_start_failures_map_to_runtime_errors() {
        let spec = repository_spec(&SharedNetwork::named("stack"));
        let err = start_error(
            &spec,
            TestcontainersError::WaitContainer(WaitContainerError::StateUnavailable)
        );
        assert!(!err.is_startup_timeout());
        assert!(matches!(
            err,
            FixtureError::Runtime { ref operation, .. } if operation == "start alfresco"
        ));
    }

    #[test]
    fn test_forget_aliases_only_drops_own_entries() {
        let runtime = DockerRuntime::new();
        runtime.record_aliases("stack", &["postgres".to_string()], address("172.18.0.2"), "pg");
        runtime.record_aliases("stack", &["activemq".to_string()], address("172.18.0.3"), "mq");
        detached("pg", "stack", &runtime.hosts).forget_aliases();

        assert_eq!(
            runtime.known_hosts("stack"),
            vec![("activemq".to_string(), address("172.18.0.3"))]
        );
    }

    #[test]
    fn test_forget_last_alias_removes_network_entry() {
        let runtime = DockerRuntime::new();
        runtime.record_aliases("stack", &["postgres".to_string()], address("172.18.0.2"), "pg");
        detached("pg", "stack", &runtime.hosts).forget_aliases();
        assert!(runtime.hosts.get("stack").is_none());
    }

    #[tokio::test]
    async fn test_detached_container_reports_not_started() {
        let hosts = HostRegistry::default();
        let mut container = detached("pg", "stack", &hosts);
        assert!(matches!(
            container.mapped_port(5432).await,
            Err(FixtureError::NotStarted { .. })
        ));
        assert!(container.stop().await.is_ok());
    }
}
