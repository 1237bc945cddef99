//! DockhandServer - MCP server that exposes Docker operations as tools.
//!
//! This module implements the core MCP server manually implementing
//! ServerHandler to expose container, image, network, volume, Compose, and
//! system tools.

use crate::config::{DockhandConfig, MAX_LOG_TAIL_LINES};
use crate::types::*;

use dockhand_engine::{ComposeRunner, DockerClient, EngineError};
use dockhand_spec::ContainerRequest;
use rmcp::{
    handler::server::ServerHandler,
    model::*,
    service::{RequestContext, RoleServer},
    ErrorData,
};
use schemars::schema_for;
use std::sync::Arc;

/// MCP server for Dockhand Docker operations.
///
/// Exposes container lifecycle, image, network, volume, Compose-stack, and
/// system operations as MCP tools that AI agents can invoke. Container run
/// requests pass through the spec compiler first; nothing malformed reaches
/// the daemon.
#[derive(Clone)]
pub struct DockhandServer {
    /// Docker client from dockhand-engine
    client: DockerClient,

    /// Compose CLI runner
    compose: ComposeRunner,

    /// Configuration
    config: DockhandConfig,
}

impl DockhandServer {
    /// Create a new DockhandServer with the given configuration.
    ///
    /// Fails if the Docker connection cannot be constructed (the daemon
    /// itself is only contacted when a tool runs).
    pub fn new(config: DockhandConfig) -> Result<Self, EngineError> {
        let client = DockerClient::connect(config.docker_host.as_deref())?;
        let compose = ComposeRunner::from_command(&config.compose_command);
        Ok(Self {
            client,
            compose,
            config,
        })
    }

    /// Get a reference to the configuration.
    pub fn config(&self) -> &DockhandConfig {
        &self.config
    }

    /// Get a reference to the Docker client.
    pub fn client(&self) -> &DockerClient {
        &self.client
    }

    /// Helper to create success result with JSON content
    fn json_result<T: serde::Serialize>(data: &T) -> CallToolResult {
        match serde_json::to_string_pretty(data) {
            Ok(json) => CallToolResult::success(vec![Content::text(json)]),
            Err(e) => CallToolResult::error(vec![Content::text(format!(
                "JSON serialization error: {e}"
            ))]),
        }
    }

    /// Helper to create error result
    fn error_result(message: impl Into<String>) -> CallToolResult {
        CallToolResult::error(vec![Content::text(message.into())])
    }

    /// Map an engine failure to a tool error.
    ///
    /// Validation failures carry the full structured error list so a caller
    /// can fix every problem in one pass.
    fn engine_error_result(error: EngineError) -> CallToolResult {
        match error {
            EngineError::Validation(errors) => {
                let payload = serde_json::json!({
                    "error": "container request failed validation",
                    "problems": errors.errors(),
                });
                CallToolResult::error(vec![Content::text(
                    serde_json::to_string_pretty(&payload)
                        .unwrap_or_else(|_| errors.to_string()),
                )])
            }
            other => Self::error_result(other.to_string()),
        }
    }

    /// Convert schemars RootSchema to rmcp JsonObject
    fn schema_to_json_object<T: schemars::JsonSchema>(
    ) -> Arc<serde_json::Map<String, serde_json::Value>> {
        let schema = schema_for!(T);
        let json = serde_json::to_value(&schema.schema).unwrap_or_else(|_| serde_json::json!({}));
        match json {
            serde_json::Value::Object(map) => Arc::new(map),
            _ => Arc::new(serde_json::Map::new()),
        }
    }

    /// Create an empty schema for tools with no parameters
    fn empty_schema() -> Arc<serde_json::Map<String, serde_json::Value>> {
        let mut map = serde_json::Map::new();
        map.insert("type".into(), serde_json::json!("object"));
        map.insert("properties".into(), serde_json::json!({}));
        Arc::new(map)
    }

    /// Deserialize required tool parameters.
    fn parse_params<T: serde::de::DeserializeOwned>(
        args: Option<serde_json::Map<String, serde_json::Value>>,
        usage: &str,
    ) -> Result<T, CallToolResult> {
        match args
            .map(|a| serde_json::from_value(serde_json::Value::Object(a)))
            .transpose()
        {
            Ok(Some(p)) => Ok(p),
            Ok(None) => Err(Self::error_result(format!("Missing parameters: {usage}"))),
            Err(e) => Err(Self::error_result(format!(
                "Invalid parameters ({usage}): {e}"
            ))),
        }
    }

    // ========================================================================
    // Container tools
    // ========================================================================

    async fn handle_run_container(
        &self,
        args: Option<serde_json::Map<String, serde_json::Value>>,
    ) -> CallToolResult {
        let request: ContainerRequest = match Self::parse_params(args, "image, ...") {
            Ok(r) => r,
            Err(e) => return e,
        };

        tracing::info!(image = %request.image, "run_container invoked");

        match self.client.run_container(&request).await {
            Ok(outcome) => Self::json_result(&RunContainerResult {
                container_id: outcome.id,
                warnings: outcome.warnings,
            }),
            Err(e) => {
                tracing::warn!(error = %e, "run_container failed");
                Self::engine_error_result(e)
            }
        }
    }

    async fn handle_list_containers(
        &self,
        args: Option<serde_json::Map<String, serde_json::Value>>,
    ) -> CallToolResult {
        let params: ListContainersParams = args
            .and_then(|a| serde_json::from_value(serde_json::Value::Object(a)).ok())
            .unwrap_or_default();

        match self.client.list_containers(params.all).await {
            Ok(containers) => Self::json_result(&ListContainersResult {
                containers: containers
                    .into_iter()
                    .map(|c| ContainerSummary {
                        id: c.id,
                        names: c.names,
                        image: c.image,
                        state: c.state,
                        status: c.status,
                    })
                    .collect(),
            }),
            Err(e) => Self::engine_error_result(e),
        }
    }

    async fn handle_stop_container(
        &self,
        args: Option<serde_json::Map<String, serde_json::Value>>,
    ) -> CallToolResult {
        let params: StopContainerParams = match Self::parse_params(args, "id") {
            Ok(p) => p,
            Err(e) => return e,
        };

        match self.client.stop_container(&params.id, params.timeout_secs).await {
            Ok(()) => Self::json_result(&OpResult { success: true }),
            Err(e) => Self::engine_error_result(e),
        }
    }

    async fn handle_remove_container(
        &self,
        args: Option<serde_json::Map<String, serde_json::Value>>,
    ) -> CallToolResult {
        let params: RemoveContainerParams = match Self::parse_params(args, "id") {
            Ok(p) => p,
            Err(e) => return e,
        };

        match self.client.remove_container(&params.id, params.force).await {
            Ok(()) => Self::json_result(&OpResult { success: true }),
            Err(e) => Self::engine_error_result(e),
        }
    }

    async fn handle_inspect_container(
        &self,
        args: Option<serde_json::Map<String, serde_json::Value>>,
    ) -> CallToolResult {
        let params: InspectContainerParams = match Self::parse_params(args, "id") {
            Ok(p) => p,
            Err(e) => return e,
        };

        match self.client.inspect_container(&params.id).await {
            Ok(details) => Self::json_result(&InspectContainerResult { details }),
            Err(e) => Self::engine_error_result(e),
        }
    }

    async fn handle_container_logs(
        &self,
        args: Option<serde_json::Map<String, serde_json::Value>>,
    ) -> CallToolResult {
        let params: ContainerLogsParams = match Self::parse_params(args, "id") {
            Ok(p) => p,
            Err(e) => return e,
        };

        let tail = params.tail.map(|t| t.min(MAX_LOG_TAIL_LINES));
        match self.client.container_logs(&params.id, tail).await {
            Ok(logs) => Self::json_result(&ContainerLogsResult { logs }),
            Err(e) => Self::engine_error_result(e),
        }
    }

    // ========================================================================
    // Image tools
    // ========================================================================

    async fn handle_pull_image(
        &self,
        args: Option<serde_json::Map<String, serde_json::Value>>,
    ) -> CallToolResult {
        let params: PullImageParams = match Self::parse_params(args, "image") {
            Ok(p) => p,
            Err(e) => return e,
        };

        match self.client.pull_image(&params.image).await {
            Ok(()) => Self::json_result(&OpResult { success: true }),
            Err(e) => Self::engine_error_result(e),
        }
    }

    async fn handle_list_images(&self) -> CallToolResult {
        match self.client.list_images().await {
            Ok(images) => Self::json_result(&ListImagesResult {
                images: images
                    .into_iter()
                    .map(|i| ImageSummary {
                        id: i.id,
                        tags: i.tags,
                        size: i.size,
                    })
                    .collect(),
            }),
            Err(e) => Self::engine_error_result(e),
        }
    }

    async fn handle_remove_image(
        &self,
        args: Option<serde_json::Map<String, serde_json::Value>>,
    ) -> CallToolResult {
        let params: RemoveImageParams = match Self::parse_params(args, "image") {
            Ok(p) => p,
            Err(e) => return e,
        };

        match self.client.remove_image(&params.image, params.force).await {
            Ok(()) => Self::json_result(&OpResult { success: true }),
            Err(e) => Self::engine_error_result(e),
        }
    }

    // ========================================================================
    // Network tools
    // ========================================================================

    async fn handle_create_network(
        &self,
        args: Option<serde_json::Map<String, serde_json::Value>>,
    ) -> CallToolResult {
        let params: CreateNetworkParams = match Self::parse_params(args, "name") {
            Ok(p) => p,
            Err(e) => return e,
        };

        match self
            .client
            .create_network(&params.name, params.driver.as_deref())
            .await
        {
            Ok(()) => Self::json_result(&OpResult { success: true }),
            Err(e) => Self::engine_error_result(e),
        }
    }

    async fn handle_list_networks(&self) -> CallToolResult {
        match self.client.list_networks().await {
            Ok(networks) => Self::json_result(&ListNetworksResult {
                networks: networks
                    .into_iter()
                    .map(|n| NetworkSummary {
                        id: n.id,
                        name: n.name,
                        driver: n.driver,
                    })
                    .collect(),
            }),
            Err(e) => Self::engine_error_result(e),
        }
    }

    async fn handle_remove_network(
        &self,
        args: Option<serde_json::Map<String, serde_json::Value>>,
    ) -> CallToolResult {
        let params: RemoveNetworkParams = match Self::parse_params(args, "name") {
            Ok(p) => p,
            Err(e) => return e,
        };

        match self.client.remove_network(&params.name).await {
            Ok(()) => Self::json_result(&OpResult { success: true }),
            Err(e) => Self::engine_error_result(e),
        }
    }

    // ========================================================================
    // Volume tools
    // ========================================================================

    async fn handle_create_volume(
        &self,
        args: Option<serde_json::Map<String, serde_json::Value>>,
    ) -> CallToolResult {
        let params: CreateVolumeParams = match Self::parse_params(args, "name") {
            Ok(p) => p,
            Err(e) => return e,
        };

        match self.client.create_volume(&params.name).await {
            Ok(()) => Self::json_result(&OpResult { success: true }),
            Err(e) => Self::engine_error_result(e),
        }
    }

    async fn handle_list_volumes(&self) -> CallToolResult {
        match self.client.list_volumes().await {
            Ok(volumes) => Self::json_result(&ListVolumesResult {
                volumes: volumes
                    .into_iter()
                    .map(|v| VolumeSummary {
                        name: v.name,
                        driver: v.driver,
                        mountpoint: v.mountpoint,
                    })
                    .collect(),
            }),
            Err(e) => Self::engine_error_result(e),
        }
    }

    async fn handle_remove_volume(
        &self,
        args: Option<serde_json::Map<String, serde_json::Value>>,
    ) -> CallToolResult {
        let params: RemoveVolumeParams = match Self::parse_params(args, "name") {
            Ok(p) => p,
            Err(e) => return e,
        };

        match self.client.remove_volume(&params.name, params.force).await {
            Ok(()) => Self::json_result(&OpResult { success: true }),
            Err(e) => Self::engine_error_result(e),
        }
    }

    // ========================================================================
    // Compose and system tools
    // ========================================================================

    async fn handle_compose_up(
        &self,
        args: Option<serde_json::Map<String, serde_json::Value>>,
    ) -> CallToolResult {
        let params: ComposeParams = match Self::parse_params(args, "file") {
            Ok(p) => p,
            Err(e) => return e,
        };

        match self.compose.up(&params.file).await {
            Ok(output) => Self::json_result(&ComposeResult {
                stdout: output.stdout,
                stderr: output.stderr,
            }),
            Err(e) => Self::engine_error_result(e),
        }
    }

    async fn handle_compose_down(
        &self,
        args: Option<serde_json::Map<String, serde_json::Value>>,
    ) -> CallToolResult {
        let params: ComposeParams = match Self::parse_params(args, "file") {
            Ok(p) => p,
            Err(e) => return e,
        };

        match self.compose.down(&params.file).await {
            Ok(output) => Self::json_result(&ComposeResult {
                stdout: output.stdout,
                stderr: output.stderr,
            }),
            Err(e) => Self::engine_error_result(e),
        }
    }

    async fn handle_compose_ps(
        &self,
        args: Option<serde_json::Map<String, serde_json::Value>>,
    ) -> CallToolResult {
        let params: ComposeParams = match Self::parse_params(args, "file") {
            Ok(p) => p,
            Err(e) => return e,
        };

        match self.compose.ps(&params.file).await {
            Ok(output) => Self::json_result(&ComposeResult {
                stdout: output.stdout,
                stderr: output.stderr,
            }),
            Err(e) => Self::engine_error_result(e),
        }
    }

    async fn handle_docker_version(&self) -> CallToolResult {
        match self.client.version().await {
            Ok(v) => Self::json_result(&VersionResult {
                version: v.version,
                api_version: v.api_version,
                os: v.os,
                arch: v.arch,
            }),
            Err(e) => Self::engine_error_result(e),
        }
    }

    async fn handle_docker_info(&self) -> CallToolResult {
        match self.client.info().await {
            Ok(info) => Self::json_result(&InfoResult { info }),
            Err(e) => Self::engine_error_result(e),
        }
    }

    /// Build the list of available tools
    fn build_tools_list() -> Vec<Tool> {
        vec![
            Tool::new(
                "run_container",
                "Validate a container request and run it. Malformed or dangerous \
                 requests are rejected with a full list of problems before anything \
                 reaches the daemon. Returns container_id.",
                Self::schema_to_json_object::<ContainerRequest>(),
            ),
            Tool::new(
                "list_containers",
                "List containers (set all=true to include stopped ones).",
                Self::schema_to_json_object::<ListContainersParams>(),
            ),
            Tool::new(
                "stop_container",
                "Stop a running container.",
                Self::schema_to_json_object::<StopContainerParams>(),
            ),
            Tool::new(
                "remove_container",
                "Remove a container (force=true to remove while running).",
                Self::schema_to_json_object::<RemoveContainerParams>(),
            ),
            Tool::new(
                "inspect_container",
                "Return the daemon's full inspect report for a container.",
                Self::schema_to_json_object::<InspectContainerParams>(),
            ),
            Tool::new(
                "container_logs",
                "Fetch container logs (stdout + stderr), optionally bounded by tail.",
                Self::schema_to_json_object::<ContainerLogsParams>(),
            ),
            Tool::new(
                "pull_image",
                "Pull an image from its registry.",
                Self::schema_to_json_object::<PullImageParams>(),
            ),
            Tool::new("list_images", "List local images.", Self::empty_schema()),
            Tool::new(
                "remove_image",
                "Remove a local image.",
                Self::schema_to_json_object::<RemoveImageParams>(),
            ),
            Tool::new(
                "create_network",
                "Create a network (default driver: bridge).",
                Self::schema_to_json_object::<CreateNetworkParams>(),
            ),
            Tool::new("list_networks", "List networks.", Self::empty_schema()),
            Tool::new(
                "remove_network",
                "Remove a network.",
                Self::schema_to_json_object::<RemoveNetworkParams>(),
            ),
            Tool::new(
                "create_volume",
                "Create a named volume.",
                Self::schema_to_json_object::<CreateVolumeParams>(),
            ),
            Tool::new("list_volumes", "List volumes.", Self::empty_schema()),
            Tool::new(
                "remove_volume",
                "Remove a volume.",
                Self::schema_to_json_object::<RemoveVolumeParams>(),
            ),
            Tool::new(
                "compose_up",
                "Bring a Compose stack up detached (docker compose up -d).",
                Self::schema_to_json_object::<ComposeParams>(),
            ),
            Tool::new(
                "compose_down",
                "Tear a Compose stack down.",
                Self::schema_to_json_object::<ComposeParams>(),
            ),
            Tool::new(
                "compose_ps",
                "List services of a Compose stack.",
                Self::schema_to_json_object::<ComposeParams>(),
            ),
            Tool::new(
                "docker_version",
                "Docker daemon version information.",
                Self::empty_schema(),
            ),
            Tool::new(
                "docker_info",
                "Full Docker daemon info report.",
                Self::empty_schema(),
            ),
        ]
    }
}

// ============================================================================
// ServerHandler Implementation
// ============================================================================

impl ServerHandler for DockhandServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation::from_build_env(),
            instructions: Some(
                "Dockhand MCP Server - Manage Docker containers, images, networks, \
                 volumes, and Compose stacks. Use run_container to start containers; \
                 requests are validated (ports, mounts, devices, capabilities, \
                 resource limits, non-root user policy) before reaching the daemon, \
                 and a rejected request reports every problem at once."
                    .into(),
            ),
        }
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, ErrorData> {
        Ok(ListToolsResult {
            tools: Self::build_tools_list(),
            next_cursor: None,
            meta: None,
        })
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, ErrorData> {
        let result = match request.name.as_ref() {
            "run_container" => self.handle_run_container(request.arguments).await,
            "list_containers" => self.handle_list_containers(request.arguments).await,
            "stop_container" => self.handle_stop_container(request.arguments).await,
            "remove_container" => self.handle_remove_container(request.arguments).await,
            "inspect_container" => self.handle_inspect_container(request.arguments).await,
            "container_logs" => self.handle_container_logs(request.arguments).await,
            "pull_image" => self.handle_pull_image(request.arguments).await,
            "list_images" => self.handle_list_images().await,
            "remove_image" => self.handle_remove_image(request.arguments).await,
            "create_network" => self.handle_create_network(request.arguments).await,
            "list_networks" => self.handle_list_networks().await,
            "remove_network" => self.handle_remove_network(request.arguments).await,
            "create_volume" => self.handle_create_volume(request.arguments).await,
            "list_volumes" => self.handle_list_volumes().await,
            "remove_volume" => self.handle_remove_volume(request.arguments).await,
            "compose_up" => self.handle_compose_up(request.arguments).await,
            "compose_down" => self.handle_compose_down(request.arguments).await,
            "compose_ps" => self.handle_compose_ps(request.arguments).await,
            "docker_version" => self.handle_docker_version().await,
            "docker_info" => self.handle_docker_info().await,
            _ => Self::error_result(format!("Unknown tool: {}", request.name)),
        };

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_tools_list() {
        let tools = DockhandServer::build_tools_list();
        assert_eq!(tools.len(), 20);
        assert!(tools.iter().any(|t| t.name.as_ref() == "run_container"));
        assert!(tools.iter().any(|t| t.name.as_ref() == "compose_up"));
        assert!(tools.iter().any(|t| t.name.as_ref() == "docker_info"));
    }

    #[test]
    fn test_run_container_schema_names_core_fields() {
        let schema = DockhandServer::schema_to_json_object::<ContainerRequest>();
        let properties = schema
            .get("properties")
            .and_then(|p| p.as_object())
            .expect("schema has properties");
        for field in ["image", "ports", "volumes", "cap_add", "memory", "user"] {
            assert!(properties.contains_key(field), "missing field: {field}");
        }
    }

    #[test]
    fn test_validation_failure_reports_all_problems() {
        let request = ContainerRequest {
            image: "nginx".to_string(),
            ports: vec!["bad".to_string()],
            cap_add: vec!["made_up".to_string()],
            ..Default::default()
        };
        let errors = dockhand_spec::compile(&request).unwrap_err();
        let result = DockhandServer::engine_error_result(EngineError::Validation(errors));

        let json = serde_json::to_value(&result).expect("result serializes");
        assert_eq!(json["isError"], serde_json::json!(true));
        let text = json["content"][0]["text"].as_str().unwrap_or_default();
        assert!(text.contains("ports[0]"));
        assert!(text.contains("cap_add[0]"));
    }
}
