//! Alfresco Community repository fixtures for integration tests.
//!
//! Starts the repository, its PostgreSQL database and, on request, an
//! ActiveMQ broker as throwaway Docker containers on a private network:
//! - [`AlfrescoContainer`] (port 8080, ready once the probe endpoint answers 200)
//! - [`PostgresContainer`] (alias `postgres`, created automatically)
//! - [`ActiveMqContainer`] (alias `activemq`, only with messaging enabled)
//!
//! Containers not stopped explicitly are removed when their fixture is
//! dropped.

pub mod activemq;
pub mod client;
pub mod container;
pub mod docker;
pub mod image;
mod lifecycle;
pub mod logging;
pub mod network;
pub mod postgres;
pub mod probe;
pub mod runtime;
pub mod spec;

pub use activemq::ActiveMqContainer;
pub use client::{ServerInfo, fetch_server_info, fetch_server_version};
pub use container::{AlfrescoContainer, AlfrescoContainerBuilder, JAVA_OPTS, JAVA_TOOL_OPTIONS};
pub use docker::{DockerContainer, DockerRuntime};
pub use errors::{FixtureError, FixtureResult};
pub use image::ImageReference;
pub use lifecycle::LifecycleState;
pub use logging::init_test_tracing;
pub use network::SharedNetwork;
pub use postgres::PostgresContainer;
pub use probe::{LogStream, ReadinessProbe};
pub use runtime::{ContainerRuntime, RunningContainer};
pub use spec::{ContainerSpec, EnvVars};
