//! Docker client wrapper.
//!
//! Thin pass-through around `bollard`: every method translates already
//! validated parameters into a Docker API call and hands back an opaque
//! result. The one piece of real logic is [`DockerClient::build_create_config`],
//! which maps a compiled [`ContainerSpec`] onto bollard's create-container
//! types.

use crate::error::Result;
use bollard::container::{
    Config, CreateContainerOptions, InspectContainerOptions, ListContainersOptions, LogsOptions,
    RemoveContainerOptions, StartContainerOptions, StopContainerOptions,
};
use bollard::image::{CreateImageOptions, ListImagesOptions, RemoveImageOptions};
use bollard::models::{self, HostConfig, PortBinding, RestartPolicyNameEnum};
use bollard::network::{CreateNetworkOptions, ListNetworksOptions};
use bollard::volume::{CreateVolumeOptions, ListVolumesOptions, RemoveVolumeOptions};
use bollard::{Docker, API_DEFAULT_VERSION};
use dockhand_spec::{compile, ContainerRequest, ContainerSpec, RestartPolicy};
use futures::StreamExt;
use serde::Serialize;
use std::collections::HashMap;

/// Connection timeout for the Docker daemon, in seconds.
const CONNECT_TIMEOUT_SECS: u64 = 30;

/// Outcome of a successful container run.
#[derive(Debug, Clone, Serialize)]
pub struct RunOutcome {
    /// Container ID assigned by the daemon.
    pub id: String,
    /// Daemon warnings, if any.
    pub warnings: Vec<String>,
}

/// Summary of one container, as reported by the daemon.
#[derive(Debug, Clone, Serialize)]
pub struct ContainerInfo {
    pub id: String,
    pub names: Vec<String>,
    pub image: String,
    pub state: String,
    pub status: String,
}

/// Summary of one image.
#[derive(Debug, Clone, Serialize)]
pub struct ImageInfo {
    pub id: String,
    pub tags: Vec<String>,
    pub size: i64,
}

/// Summary of one network.
#[derive(Debug, Clone, Serialize)]
pub struct NetworkInfo {
    pub id: String,
    pub name: String,
    pub driver: String,
}

/// Summary of one volume.
#[derive(Debug, Clone, Serialize)]
pub struct VolumeInfo {
    pub name: String,
    pub driver: String,
    pub mountpoint: String,
}

/// Daemon version report.
#[derive(Debug, Clone, Serialize)]
pub struct VersionInfo {
    pub version: String,
    pub api_version: String,
    pub os: String,
    pub arch: String,
}

/// Client for the Docker daemon.
#[derive(Clone)]
pub struct DockerClient {
    docker: Docker,
}

impl DockerClient {
    /// Connect to the Docker daemon.
    ///
    /// `host` may be a `tcp://`/`http://` address, a `unix://` socket URI, or
    /// a bare socket path; `None` uses the platform defaults.
    pub fn connect(host: Option<&str>) -> Result<Self> {
        let docker = match host {
            Some(h) if h.starts_with("tcp://") || h.starts_with("http://") => {
                tracing::debug!(host = %h, "Connecting to Docker over HTTP");
                Docker::connect_with_http(h, CONNECT_TIMEOUT_SECS, API_DEFAULT_VERSION)?
            }
            Some(h) => {
                let path = h.strip_prefix("unix://").unwrap_or(h);
                tracing::debug!(path = %path, "Connecting to Docker over unix socket");
                Docker::connect_with_socket(path, CONNECT_TIMEOUT_SECS, API_DEFAULT_VERSION)?
            }
            None => {
                tracing::debug!("Connecting to Docker with local defaults");
                Docker::connect_with_local_defaults()?
            }
        };
        Ok(Self { docker })
    }

    /// Check daemon reachability.
    pub async fn ping(&self) -> Result<()> {
        self.docker.ping().await?;
        Ok(())
    }

    // ========================================================================
    // Containers
    // ========================================================================

    /// Compile a request, create the container, and start it.
    ///
    /// Validation failures surface as [`EngineError::Validation`] carrying
    /// every problem found; nothing reaches the daemon in that case.
    pub async fn run_container(&self, request: &ContainerRequest) -> Result<RunOutcome> {
        let spec = compile(request)?;
        tracing::info!(
            image = %spec.image,
            name = spec.name.as_deref().unwrap_or(""),
            ports = spec.ports.len(),
            "Running container"
        );

        let config = Self::build_create_config(&spec);
        let options = spec.name.as_ref().map(|name| CreateContainerOptions {
            name: name.clone(),
            platform: None,
        });

        let created = self.docker.create_container(options, config).await?;
        if !created.warnings.is_empty() {
            tracing::warn!(
                container_id = %created.id,
                warnings = ?created.warnings,
                "Daemon reported warnings on create"
            );
        }

        self.docker
            .start_container(&created.id, None::<StartContainerOptions<String>>)
            .await?;
        tracing::info!(container_id = %created.id, "Container started");

        Ok(RunOutcome {
            id: created.id,
            warnings: created.warnings,
        })
    }

    /// List containers, optionally including stopped ones.
    pub async fn list_containers(&self, all: bool) -> Result<Vec<ContainerInfo>> {
        tracing::debug!(all, "Listing containers");
        let summaries = self
            .docker
            .list_containers(Some(ListContainersOptions::<String> {
                all,
                ..Default::default()
            }))
            .await?;

        Ok(summaries
            .into_iter()
            .map(|c| ContainerInfo {
                id: c.id.unwrap_or_default(),
                names: c.names.unwrap_or_default(),
                image: c.image.unwrap_or_default(),
                state: c.state.unwrap_or_default(),
                status: c.status.unwrap_or_default(),
            })
            .collect())
    }

    /// Stop a container, waiting up to `timeout_secs` before killing it.
    pub async fn stop_container(&self, id: &str, timeout_secs: Option<i64>) -> Result<()> {
        tracing::info!(container_id = %id, ?timeout_secs, "Stopping container");
        let options = timeout_secs.map(|t| StopContainerOptions { t });
        self.docker.stop_container(id, options).await?;
        Ok(())
    }

    /// Remove a container.
    pub async fn remove_container(&self, id: &str, force: bool) -> Result<()> {
        tracing::info!(container_id = %id, force, "Removing container");
        self.docker
            .remove_container(
                id,
                Some(RemoveContainerOptions {
                    force,
                    ..Default::default()
                }),
            )
            .await?;
        Ok(())
    }

    /// Inspect a container, returning the daemon's full report.
    pub async fn inspect_container(&self, id: &str) -> Result<serde_json::Value> {
        tracing::debug!(container_id = %id, "Inspecting container");
        let response = self
            .docker
            .inspect_container(id, None::<InspectContainerOptions>)
            .await?;
        Ok(serde_json::to_value(response)?)
    }

    /// Fetch container logs (stdout + stderr), bounded by `tail` lines.
    pub async fn container_logs(&self, id: &str, tail: Option<u32>) -> Result<String> {
        tracing::debug!(container_id = %id, ?tail, "Fetching logs");
        let mut stream = self.docker.logs(
            id,
            Some(LogsOptions::<String> {
                stdout: true,
                stderr: true,
                tail: tail.map_or_else(|| "all".to_string(), |n| n.to_string()),
                ..Default::default()
            }),
        );

        let mut out = String::new();
        while let Some(chunk) = stream.next().await {
            out.push_str(&chunk?.to_string());
        }
        Ok(out)
    }

    // ========================================================================
    // Images
    // ========================================================================

    /// Pull an image, draining the progress stream.
    pub async fn pull_image(&self, image: &str) -> Result<()> {
        tracing::info!(image = %image, "Pulling image");
        let mut stream = self.docker.create_image(
            Some(CreateImageOptions {
                from_image: image.to_string(),
                ..Default::default()
            }),
            None,
            None,
        );

        while let Some(progress) = stream.next().await {
            let info = progress?;
            if let Some(status) = info.status {
                tracing::debug!(image = %image, status = %status, "Pull progress");
            }
        }
        tracing::info!(image = %image, "Image pulled");
        Ok(())
    }

    /// List local images.
    pub async fn list_images(&self) -> Result<Vec<ImageInfo>> {
        tracing::debug!("Listing images");
        let images = self
            .docker
            .list_images(Some(ListImagesOptions::<String> {
                all: false,
                ..Default::default()
            }))
            .await?;

        Ok(images
            .into_iter()
            .map(|i| ImageInfo {
                id: i.id,
                tags: i.repo_tags,
                size: i.size,
            })
            .collect())
    }

    /// Remove a local image.
    pub async fn remove_image(&self, image: &str, force: bool) -> Result<()> {
        tracing::info!(image = %image, force, "Removing image");
        self.docker
            .remove_image(
                image,
                Some(RemoveImageOptions {
                    force,
                    ..Default::default()
                }),
                None,
            )
            .await?;
        Ok(())
    }

    // ========================================================================
    // Networks
    // ========================================================================

    /// Create a network with the given driver (default `bridge`).
    pub async fn create_network(&self, name: &str, driver: Option<&str>) -> Result<()> {
        tracing::info!(network = %name, driver = driver.unwrap_or("bridge"), "Creating network");
        self.docker
            .create_network(CreateNetworkOptions {
                name: name.to_string(),
                driver: driver.unwrap_or("bridge").to_string(),
                ..Default::default()
            })
            .await?;
        Ok(())
    }

    /// List networks.
    pub async fn list_networks(&self) -> Result<Vec<NetworkInfo>> {
        tracing::debug!("Listing networks");
        let networks = self
            .docker
            .list_networks(None::<ListNetworksOptions<String>>)
            .await?;

        Ok(networks
            .into_iter()
            .map(|n| NetworkInfo {
                id: n.id.unwrap_or_default(),
                name: n.name.unwrap_or_default(),
                driver: n.driver.unwrap_or_default(),
            })
            .collect())
    }

    /// Remove a network.
    pub async fn remove_network(&self, name: &str) -> Result<()> {
        tracing::info!(network = %name, "Removing network");
        self.docker.remove_network(name).await?;
        Ok(())
    }

    // ========================================================================
    // Volumes
    // ========================================================================

    /// Create a named volume.
    pub async fn create_volume(&self, name: &str) -> Result<()> {
        tracing::info!(volume = %name, "Creating volume");
        self.docker
            .create_volume(CreateVolumeOptions {
                name: name.to_string(),
                driver: "local".to_string(),
                ..Default::default()
            })
            .await?;
        Ok(())
    }

    /// List volumes.
    pub async fn list_volumes(&self) -> Result<Vec<VolumeInfo>> {
        tracing::debug!("Listing volumes");
        let response = self
            .docker
            .list_volumes(None::<ListVolumesOptions<String>>)
            .await?;

        Ok(response
            .volumes
            .unwrap_or_default()
            .into_iter()
            .map(|v| VolumeInfo {
                name: v.name,
                driver: v.driver,
                mountpoint: v.mountpoint,
            })
            .collect())
    }

    /// Remove a volume.
    pub async fn remove_volume(&self, name: &str, force: bool) -> Result<()> {
        tracing::info!(volume = %name, force, "Removing volume");
        self.docker
            .remove_volume(name, Some(RemoveVolumeOptions { force }))
            .await?;
        Ok(())
    }

    // ========================================================================
    // System
    // ========================================================================

    /// Daemon version information.
    pub async fn version(&self) -> Result<VersionInfo> {
        let v = self.docker.version().await?;
        Ok(VersionInfo {
            version: v.version.unwrap_or_default(),
            api_version: v.api_version.unwrap_or_default(),
            os: v.os.unwrap_or_default(),
            arch: v.arch.unwrap_or_default(),
        })
    }

    /// Full daemon info report.
    pub async fn info(&self) -> Result<serde_json::Value> {
        let info = self.docker.info().await?;
        Ok(serde_json::to_value(info)?)
    }

    // ========================================================================
    // Spec translation
    // ========================================================================

    /// Translate a compiled spec into bollard's create-container config.
    ///
    /// Pure: every field of the spec is already validated, so this is a
    /// mechanical re-encoding into the Docker API's shapes.
    fn build_create_config(spec: &ContainerSpec) -> Config<String> {
        let mut port_bindings: HashMap<String, Option<Vec<PortBinding>>> = HashMap::new();
        let mut exposed_ports: HashMap<String, HashMap<(), ()>> = HashMap::new();
        for port in &spec.ports {
            let key = format!("{}/{}", port.container_port, port.protocol);
            exposed_ports.entry(key.clone()).or_default();
            port_bindings
                .entry(key)
                .or_insert_with(|| Some(Vec::new()))
                .get_or_insert_with(Vec::new)
                .push(PortBinding {
                    host_ip: None,
                    host_port: Some(port.host_port.to_string()),
                });
        }

        let binds: Vec<String> = spec
            .volumes
            .iter()
            .map(|v| format!("{}:{}:{}", v.host_path, v.container_path, v.mode))
            .collect();

        let devices: Vec<models::DeviceMapping> = spec
            .devices
            .iter()
            .map(|d| models::DeviceMapping {
                path_on_host: Some(d.host_path.clone()),
                path_in_container: Some(d.container_path.clone()),
                cgroup_permissions: Some(d.permissions.as_cgroup_string()),
            })
            .collect();

        let ulimits: Vec<models::ResourcesUlimits> = spec
            .ulimits
            .iter()
            .map(|u| models::ResourcesUlimits {
                name: Some(u.name.clone()),
                soft: Some(u.soft as i64),
                hard: Some(u.hard as i64),
            })
            .collect();

        let tmpfs: HashMap<String, String> = spec
            .tmpfs
            .iter()
            .map(|t| (t.container_path.clone(), t.options.clone()))
            .collect();

        let extra_hosts: Vec<String> = spec
            .extra_hosts
            .iter()
            .map(|h| format!("{}:{}", h.hostname, h.ip))
            .collect();

        let restart_policy = spec.restart_policy.map(|p| models::RestartPolicy {
            name: Some(match p {
                RestartPolicy::No => RestartPolicyNameEnum::NO,
                RestartPolicy::Always => RestartPolicyNameEnum::ALWAYS,
                RestartPolicy::UnlessStopped => RestartPolicyNameEnum::UNLESS_STOPPED,
                RestartPolicy::OnFailure => RestartPolicyNameEnum::ON_FAILURE,
            }),
            maximum_retry_count: None,
        });

        let host_config = HostConfig {
            binds: (!binds.is_empty()).then_some(binds),
            port_bindings: (!port_bindings.is_empty()).then_some(port_bindings),
            devices: (!devices.is_empty()).then_some(devices),
            ulimits: (!ulimits.is_empty()).then_some(ulimits),
            tmpfs: (!tmpfs.is_empty()).then_some(tmpfs),
            dns: (!spec.dns.is_empty()).then(|| spec.dns.clone()),
            extra_hosts: (!extra_hosts.is_empty()).then_some(extra_hosts),
            memory: spec.resources.memory_bytes,
            nano_cpus: spec.resources.nano_cpus,
            cap_add: (!spec.security.cap_add.is_empty()).then(|| spec.security.cap_add.clone()),
            cap_drop: (!spec.security.cap_drop.is_empty()).then(|| spec.security.cap_drop.clone()),
            security_opt: (!spec.security.security_opts.is_empty())
                .then(|| spec.security.security_opts.clone()),
            readonly_rootfs: Some(spec.security.read_only_rootfs),
            privileged: Some(spec.security.privileged),
            network_mode: spec.network_mode.clone(),
            restart_policy,
            auto_remove: Some(spec.auto_remove),
            ..Default::default()
        };

        Config {
            image: Some(spec.image.clone()),
            cmd: (!spec.command.is_empty()).then(|| spec.command.clone()),
            env: (!spec.env.is_empty()).then(|| spec.env.clone()),
            user: Some(spec.security.user.clone()),
            labels: (!spec.labels.is_empty())
                .then(|| spec.labels.iter().map(|(k, v)| (k.clone(), v.clone())).collect()),
            exposed_ports: (!exposed_ports.is_empty()).then_some(exposed_ports),
            tty: Some(spec.tty),
            open_stdin: Some(spec.interactive),
            host_config: Some(host_config),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dockhand_spec::{compile, ContainerRequest};

    fn compiled(request: ContainerRequest) -> ContainerSpec {
        compile(&request).expect("request should compile")
    }

    fn basic_request(image: &str) -> ContainerRequest {
        ContainerRequest {
            image: image.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_config_carries_image_and_default_user() {
        let config = DockerClient::build_create_config(&compiled(basic_request("alpine:3.20")));
        assert_eq!(config.image.as_deref(), Some("alpine:3.20"));
        assert_eq!(config.user.as_deref(), Some("1000:1000"));
        assert!(config.cmd.is_none());
        assert!(config.env.is_none());
    }

    #[test]
    fn test_port_bindings_and_exposed_ports() {
        let mut req = basic_request("nginx");
        req.ports = vec!["8080:80".into(), "5353:53/udp".into()];
        let config = DockerClient::build_create_config(&compiled(req));

        let exposed = config.exposed_ports.unwrap();
        assert!(exposed.contains_key("80/tcp"));
        assert!(exposed.contains_key("53/udp"));

        let bindings = config.host_config.unwrap().port_bindings.unwrap();
        let tcp = bindings["80/tcp"].as_ref().unwrap();
        assert_eq!(tcp[0].host_port.as_deref(), Some("8080"));
    }

    #[test]
    fn test_multiple_host_ports_for_one_container_port() {
        let mut req = basic_request("nginx");
        req.ports = vec!["8080:80".into(), "8081:80".into()];
        let config = DockerClient::build_create_config(&compiled(req));

        let bindings = config.host_config.unwrap().port_bindings.unwrap();
        let tcp = bindings["80/tcp"].as_ref().unwrap();
        assert_eq!(tcp.len(), 2);
    }

    #[test]
    fn test_binds_include_mode() {
        let mut req = basic_request("nginx");
        req.volumes = vec!["/srv:/usr/share/nginx/html:ro".into(), "/data:/data".into()];
        let config = DockerClient::build_create_config(&compiled(req));

        let binds = config.host_config.unwrap().binds.unwrap();
        assert_eq!(binds[0], "/srv:/usr/share/nginx/html:ro");
        assert_eq!(binds[1], "/data:/data:rw");
    }

    #[test]
    fn test_device_and_ulimit_translation() {
        let mut req = basic_request("alpine");
        req.devices = vec!["/dev/snd:/dev/snd:rw".into()];
        req.ulimits = vec!["nofile=1024:4096".into()];
        let config = DockerClient::build_create_config(&compiled(req));

        let host = config.host_config.unwrap();
        let devices = host.devices.unwrap();
        assert_eq!(devices[0].path_on_host.as_deref(), Some("/dev/snd"));
        assert_eq!(devices[0].cgroup_permissions.as_deref(), Some("rw"));

        let ulimits = host.ulimits.unwrap();
        assert_eq!(ulimits[0].name.as_deref(), Some("nofile"));
        assert_eq!(ulimits[0].soft, Some(1024));
        assert_eq!(ulimits[0].hard, Some(4096));
    }

    #[test]
    fn test_resource_limits_translation() {
        let mut req = basic_request("alpine");
        req.memory = Some("512m".into());
        req.cpus = Some(1.5);
        let config = DockerClient::build_create_config(&compiled(req));

        let host = config.host_config.unwrap();
        assert_eq!(host.memory, Some(536_870_912));
        assert_eq!(host.nano_cpus, Some(1_500_000_000));
    }

    #[test]
    fn test_security_translation() {
        let mut req = basic_request("alpine");
        req.cap_add = vec!["net_admin".into()];
        req.cap_drop = vec!["all".into()];
        req.security_opts = vec!["no-new-privileges".into()];
        req.read_only = true;
        let config = DockerClient::build_create_config(&compiled(req));

        let host = config.host_config.unwrap();
        assert_eq!(host.cap_add, Some(vec!["CAP_NET_ADMIN".to_string()]));
        assert_eq!(host.cap_drop, Some(vec!["ALL".to_string()]));
        assert_eq!(host.security_opt, Some(vec!["no-new-privileges".to_string()]));
        assert_eq!(host.readonly_rootfs, Some(true));
        assert_eq!(host.privileged, Some(false));
    }

    #[test]
    fn test_restart_policy_translation() {
        let mut req = basic_request("alpine");
        req.restart_policy = Some("on-failure".into());
        let config = DockerClient::build_create_config(&compiled(req));

        let policy = config.host_config.unwrap().restart_policy.unwrap();
        assert_eq!(policy.name, Some(RestartPolicyNameEnum::ON_FAILURE));
    }

    #[test]
    fn test_tmpfs_and_extra_hosts_translation() {
        let mut req = basic_request("alpine");
        req.tmpfs = vec!["/run:rw,size=64m".into(), "/scratch".into()];
        req.extra_hosts = vec!["db.local:10.0.0.5".into()];
        let config = DockerClient::build_create_config(&compiled(req));

        let host = config.host_config.unwrap();
        let tmpfs = host.tmpfs.unwrap();
        assert_eq!(tmpfs["/run"], "rw,size=64m");
        assert_eq!(tmpfs["/scratch"], "");
        assert_eq!(host.extra_hosts, Some(vec!["db.local:10.0.0.5".to_string()]));
    }
}
