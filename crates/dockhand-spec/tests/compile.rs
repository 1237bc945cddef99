//! End-to-end tests for the container-spec compiler.
//!
//! These exercise the public API the way the MCP layer uses it: build a
//! request from JSON, compile it, and inspect either the spec or the full
//! error list.

use dockhand_spec::{compile, ContainerRequest, ErrorKind, Protocol};

fn from_json(json: &str) -> ContainerRequest {
    serde_json::from_str(json).expect("valid request JSON")
}

#[test]
fn compiles_a_typical_web_service_request() {
    let request = from_json(
        r#"{
            "image": "nginx:1.27",
            "name": "web",
            "ports": ["8080:80", "8443:443/tcp"],
            "volumes": ["/srv/site:/usr/share/nginx/html:ro"],
            "env": ["nginx_host=example.com"],
            "memory": "512m",
            "cpus": 0.5,
            "cap_drop": ["ALL"],
            "cap_add": ["net_bind_service"],
            "security_opts": ["no-new-privileges"],
            "restart_policy": "unless-stopped",
            "read_only": true,
            "detach": true
        }"#,
    );

    let spec = compile(&request).expect("request should compile");
    assert_eq!(spec.ports.len(), 2);
    assert_eq!(spec.ports[0].host_port, 8080);
    assert_eq!(spec.ports[0].container_port, 80);
    assert_eq!(spec.ports[0].protocol, Protocol::Tcp);
    assert_eq!(spec.volumes[0].mode.to_string(), "ro");
    assert_eq!(spec.env, vec!["NGINX_HOST=example.com".to_string()]);
    assert_eq!(spec.resources.memory_bytes, Some(536_870_912));
    assert_eq!(spec.resources.nano_cpus, Some(500_000_000));
    assert_eq!(spec.security.cap_add, vec!["CAP_NET_BIND_SERVICE".to_string()]);
    assert_eq!(spec.security.cap_drop, vec!["ALL".to_string()]);
    assert!(spec.security.read_only_rootfs);
}

#[test]
fn collects_every_problem_in_one_pass() {
    let request = from_json(
        r#"{
            "image": "redis:7",
            "ports": ["70000:6379"],
            "devices": ["/dev/sda:/dev/sda:rrw"],
            "cap_add": ["made_up"],
            "user": "0:0",
            "memory": "lots",
            "restart_policy": "sometimes"
        }"#,
    );

    let errs = compile(&request).expect_err("request should fail");
    let kinds: Vec<ErrorKind> = errs.errors().iter().map(|e| e.kind).collect();
    assert!(kinds.contains(&ErrorKind::MalformedFormat)); // port, device perms, restart
    assert!(kinds.contains(&ErrorKind::UnknownCapability));
    assert!(kinds.contains(&ErrorKind::ProhibitedRootUser));
    assert!(kinds.contains(&ErrorKind::InvalidResourceLimit));
    assert!(errs.len() >= 6, "expected >=6 errors, got: {errs}");

    // Every error names a field.
    assert!(errs.errors().iter().all(|e| !e.field.is_empty()));
}

#[test]
fn recompiling_normalized_fields_is_idempotent() {
    let request = from_json(
        r#"{
            "image": "alpine:3.20",
            "ports": ["8080:80/udp"],
            "volumes": ["/data:/data:rw"],
            "devices": ["/dev/snd:/dev/snd:rw"],
            "ulimits": ["nofile=1024:4096"]
        }"#,
    );
    let first = compile(&request).unwrap();

    // Re-encode the normalized mappings into their string forms and compile
    // again; pure parsers must yield identical output.
    let second_request = ContainerRequest {
        image: first.image.clone(),
        ports: first
            .ports
            .iter()
            .map(|p| format!("{}:{}/{}", p.host_port, p.container_port, p.protocol))
            .collect(),
        volumes: first
            .volumes
            .iter()
            .map(|v| format!("{}:{}:{}", v.host_path, v.container_path, v.mode))
            .collect(),
        devices: first
            .devices
            .iter()
            .map(|d| {
                format!(
                    "{}:{}:{}",
                    d.host_path,
                    d.container_path,
                    d.permissions.as_cgroup_string()
                )
            })
            .collect(),
        ulimits: first
            .ulimits
            .iter()
            .map(|u| format!("{}={}:{}", u.name, u.soft, u.hard))
            .collect(),
        ..Default::default()
    };
    let second = compile(&second_request).unwrap();

    assert_eq!(first.ports, second.ports);
    assert_eq!(first.volumes, second.volumes);
    assert_eq!(first.devices, second.devices);
    assert_eq!(first.ulimits, second.ulimits);
}

#[test]
fn dangerous_device_is_rejected_even_with_valid_syntax() {
    let request = from_json(
        r#"{"image": "alpine", "devices": ["/dev/mem:/dev/mem:r"]}"#,
    );
    let errs = compile(&request).unwrap_err();
    assert_eq!(errs.len(), 1);
    assert_eq!(errs.errors()[0].kind, ErrorKind::DangerousDevice);
}

#[test]
fn unknown_request_fields_are_rejected_at_deserialization() {
    let result: Result<ContainerRequest, _> =
        serde_json::from_str(r#"{"image": "alpine", "portz": ["80:80"]}"#);
    assert!(result.is_err());
}
