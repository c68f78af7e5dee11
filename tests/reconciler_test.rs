// Copyright 2026 Heliport Team.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

mod common;

use common::*;
use heliport::domain::container::ContainerChanges;
use heliport::reconciler::Action;
use serde_json::Value;

#[tokio::test]
async fn create_produces_workload_service_and_ingress() {
    let engine = test_engine();
    let container = registry_container("web");
    let env = test_environment();

    engine
        .reconciler
        .manage(&container, &env, None, &no_changes(), Action::Create)
        .await
        .unwrap();

    assert!(engine.gateway.contains("Namespace", "", "env-7"));
    assert!(engine.gateway.contains("Deployment", "env-7", "web"));
    assert!(engine.gateway.contains("Service", "env-7", "web"));
    assert!(engine.gateway.contains("Ingress", "env-7", "web-cluster"));
    // no metrics configured, so no HPA
    assert!(!engine
        .gateway
        .contains("HorizontalPodAutoscaler", "env-7", "web-hpa"));
}

/// A deployment requesting 250 millicores / 1 core, 2Gi storage, port 8080
/// must come out as "250m"/"1" CPU, a 2Gi-backed claim, and a Service
/// forwarding 8080.
#[tokio::test]
async fn create_translates_quantities_end_to_end() {
    let engine = test_engine();
    let container = full_deployment_container("shop");
    let env = test_environment();

    engine
        .reconciler
        .manage(&container, &env, None, &no_changes(), Action::Create)
        .await
        .unwrap();

    let deployment = engine.gateway.raw("Deployment", "env-7", "shop").unwrap();
    let resources = &deployment["spec"]["template"]["spec"]["containers"][0]["resources"];
    assert_eq!(resources["requests"]["cpu"], "250m");
    assert_eq!(resources["limits"]["cpu"], "1");

    let claim = engine
        .gateway
        .raw("PersistentVolumeClaim", "env-7", "shop-storage")
        .unwrap();
    assert_eq!(claim["spec"]["resources"]["requests"]["storage"], "2Gi");

    let service = engine.gateway.raw("Service", "env-7", "shop").unwrap();
    assert_eq!(service["spec"]["ports"][0]["port"], 8080);
    assert_eq!(service["spec"]["ports"][0]["targetPort"], 8080);
}

/// Update against an empty cluster ends up in the same state as create.
#[tokio::test]
async fn update_on_missing_targets_equals_create() {
    let created = test_engine();
    let updated = test_engine();
    let container = full_deployment_container("app");
    let env = test_environment();

    created
        .reconciler
        .manage(&container, &env, None, &no_changes(), Action::Create)
        .await
        .unwrap();
    // namespace exists out-of-band on the update path
    updated.gateway.seed(
        "Namespace",
        "",
        env.namespace(),
        &serde_json::json!({"metadata": {"name": env.namespace()}}),
    );
    updated
        .reconciler
        .manage(&container, &env, None, &no_changes(), Action::Update)
        .await
        .unwrap();

    for (kind, name) in [
        ("Deployment", "app"),
        ("Service", "app"),
        ("Ingress", "app-cluster"),
        ("Ingress", "app-domain"),
        ("PersistentVolumeClaim", "app-storage"),
    ] {
        assert!(
            created.gateway.contains(kind, "env-7", name),
            "create missing {} {}",
            kind,
            name
        );
        assert!(
            updated.gateway.contains(kind, "env-7", name),
            "update missing {} {}",
            kind,
            name
        );
    }
}

#[tokio::test]
async fn tcp_exposure_patches_all_three_controller_objects() {
    let engine = test_engine();
    let container = full_deployment_container("mqtt");
    let env = test_environment();

    engine
        .reconciler
        .manage(&container, &env, None, &no_changes(), Action::Create)
        .await
        .unwrap();

    let port = engine.hooks.tcp_ports.lock().unwrap()[0];
    assert_eq!(port, engine.config.tcp_port_start);

    let ns = &engine.config.ingress.namespace;
    let configmap = engine
        .gateway
        .raw("ConfigMap", ns, &engine.config.ingress.configmap)
        .unwrap();
    assert_eq!(
        configmap["data"][port.to_string()],
        format!("env-7/mqtt:{}", container.networking.container_port)
    );

    let service = engine
        .gateway
        .raw("Service", ns, &engine.config.ingress.service)
        .unwrap();
    let ports: Vec<i64> = service["spec"]["ports"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["port"].as_i64().unwrap())
        .collect();
    assert!(ports.contains(&(port as i64)));

    let deployment = engine
        .gateway
        .raw("Deployment", ns, &engine.config.ingress.deployment)
        .unwrap();
    let main = &deployment["spec"]["template"]["spec"]["containers"][0];
    assert!(main["ports"]
        .as_array()
        .unwrap()
        .iter()
        .any(|p| p["containerPort"].as_i64() == Some(port as i64)));
    assert!(main["args"]
        .as_array()
        .unwrap()
        .iter()
        .any(|a| a.as_str().unwrap().starts_with("--tcp-services-configmap")));
}

/// Concurrent TCP exposures for different containers must not lose each
/// other's ConfigMap entries or controller ports.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_tcp_exposures_lose_no_updates() {
    let engine = std::sync::Arc::new(test_engine());
    let env = test_environment();

    let mut tasks = Vec::new();
    for i in 0..16 {
        let engine = engine.clone();
        let env = env.clone();
        tasks.push(tokio::spawn(async move {
            let container = full_deployment_container(&format!("svc{}", i));
            engine
                .networking
                .ensure_tcp_exposure(&container, env.namespace())
                .await
                .unwrap()
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }

    let configmap = engine
        .gateway
        .raw("ConfigMap", &engine.config.ingress.namespace, &engine.config.ingress.configmap)
        .unwrap();
    let entries = configmap["data"].as_object().unwrap();
    assert_eq!(entries.len(), 16);

    let service = engine
        .gateway
        .raw("Service", &engine.config.ingress.namespace, &engine.config.ingress.service)
        .unwrap();
    // the seeded http port plus one per container
    assert_eq!(service["spec"]["ports"].as_array().unwrap().len(), 17);
}

/// Deleting a fully-provisioned deployment removes every sub-resource, and
/// a forced failure in any single sub-step never aborts the remaining
/// steps. A repeat delete after the fault clears mops up the rest.
#[tokio::test]
async fn delete_is_total_and_order_independent() {
    let failing_steps = [
        ("delete", "Deployment"),
        ("delete", "Service"),
        ("delete", "Ingress"),
        ("delete", "PersistentVolumeClaim"),
        ("apply", "ConfigMap"),
    ];

    for (op, kind) in failing_steps {
        let engine = test_engine();
        let container = full_deployment_container("victim");
        let env = test_environment();

        engine
            .reconciler
            .manage(&container, &env, None, &no_changes(), Action::Create)
            .await
            .unwrap();
        let port = engine.hooks.tcp_ports.lock().unwrap()[0];
        let mut provisioned = container.clone();
        provisioned.networking.tcp_public_port = Some(port);

        engine.gateway.fail_on(op, kind);
        engine
            .reconciler
            .manage(&provisioned, &env, None, &no_changes(), Action::Delete)
            .await
            .unwrap();
        engine.gateway.clear_failures();
        engine
            .reconciler
            .manage(&provisioned, &env, None, &no_changes(), Action::Delete)
            .await
            .unwrap();

        for (sub_kind, name) in [
            ("Deployment", "victim"),
            ("Service", "victim"),
            ("Ingress", "victim-cluster"),
            ("Ingress", "victim-domain"),
            ("PersistentVolumeClaim", "victim-storage"),
            ("Certificate", "victim-example-net"),
        ] {
            assert!(
                !engine.gateway.contains(sub_kind, "env-7", name),
                "{} {} survived delete with injected {} {} failure",
                sub_kind,
                name,
                op,
                kind
            );
        }
        let configmap = engine
            .gateway
            .raw("ConfigMap", &engine.config.ingress.namespace, &engine.config.ingress.configmap)
            .unwrap();
        assert!(
            configmap["data"]
                .as_object()
                .map(|d| !d.contains_key(&port.to_string()))
                .unwrap_or(true),
            "TCP entry survived delete with injected {} {} failure",
            op,
            kind
        );
    }
}

/// Scheduled jobs serve no traffic, so even a fully flagged networking
/// block must produce nothing.
#[tokio::test]
async fn cronjob_receives_no_networking() {
    let engine = test_engine();
    let env = test_environment();
    let mut container = cronjob_container("tick");
    container.networking.custom_domain_enabled = true;
    container.networking.custom_domain = Some("tick.example.net".to_string());
    container.networking.tcp_proxy = true;

    engine
        .reconciler
        .manage(&container, &env, None, &no_changes(), Action::Create)
        .await
        .unwrap();

    assert!(engine.gateway.contains("CronJob", "env-7", "tick"));
    assert!(!engine.gateway.contains("Service", "env-7", "tick"));
    assert!(engine.gateway.names_of_kind("Ingress", "env-7").is_empty());
    let configmap = engine
        .gateway
        .raw(
            "ConfigMap",
            &engine.config.ingress.namespace,
            &engine.config.ingress.configmap,
        )
        .unwrap();
    assert_eq!(configmap["data"], serde_json::json!({}));
    assert!(engine.hooks.tcp_ports.lock().unwrap().is_empty());

    // the update path takes the same exclusion
    engine
        .reconciler
        .manage(&container, &env, None, &no_changes(), Action::Update)
        .await
        .unwrap();
    assert!(!engine.gateway.contains("Service", "env-7", "tick"));
}

/// Knative revisions never mount a claim, so the storage flag must not
/// leave an orphan PVC behind.
#[tokio::test]
async fn knative_storage_flag_creates_no_claim() {
    let engine = test_engine();
    let env = test_environment();
    let mut container = knative_container("burst");
    container.storage.enabled = true;
    container.storage.mount_path = "/data".to_string();

    engine
        .reconciler
        .manage(&container, &env, None, &no_changes(), Action::Create)
        .await
        .unwrap();
    assert!(engine
        .gateway
        .names_of_kind("PersistentVolumeClaim", "env-7")
        .is_empty());

    engine
        .reconciler
        .manage(&container, &env, None, &no_changes(), Action::Update)
        .await
        .unwrap();
    assert!(engine
        .gateway
        .names_of_kind("PersistentVolumeClaim", "env-7")
        .is_empty());
}

/// A port the controller already carries must not be re-allocated or have
/// the shared triple rewritten on the next reconcile.
#[tokio::test]
async fn persisted_tcp_port_is_not_rewired_on_reconcile() {
    let engine = test_engine();
    let env = test_environment();
    let mut container = full_deployment_container("mq");

    engine
        .reconciler
        .manage(&container, &env, None, &no_changes(), Action::Create)
        .await
        .unwrap();
    assert_eq!(engine.hooks.tcp_ports.lock().unwrap().as_slice(), &[30000]);

    // the stored revision now carries the allocated port
    container.networking.tcp_public_port = Some(30000);
    let configmap_writes = |ops: &[String]| {
        ops.iter().filter(|o| o.starts_with("apply ConfigMap")).count()
    };
    let before = configmap_writes(&engine.gateway.ops());
    engine
        .reconciler
        .manage(&container, &env, None, &no_changes(), Action::Update)
        .await
        .unwrap();
    let after = configmap_writes(&engine.gateway.ops());
    assert_eq!(before, after, "controller ConfigMap rewritten for an exposed port");

    let service = engine
        .gateway
        .raw(
            "Service",
            &engine.config.ingress.namespace,
            &engine.config.ingress.service,
        )
        .unwrap();
    let ports = service["spec"]["ports"].as_array().unwrap();
    assert_eq!(ports.iter().filter(|p| p["port"] == 30000).count(), 1);
    assert_eq!(engine.hooks.tcp_ports.lock().unwrap().as_slice(), &[30000]);
}

#[tokio::test]
async fn status_gathers_primary_service_and_hpa() {
    use heliport::domain::container::{AutoscaleConfig, CpuTarget, WorkloadConfig};

    let engine = test_engine();
    let env = test_environment();
    let mut container = registry_container("web");
    if let WorkloadConfig::Deployment(config) = &mut container.workload {
        config.autoscaling = AutoscaleConfig {
            min_replicas: Some(1),
            max_replicas: Some(4),
            cpu: Some(CpuTarget::Utilization(60)),
            memory: None,
        };
    }

    engine
        .reconciler
        .manage(&container, &env, None, &no_changes(), Action::Create)
        .await
        .unwrap();

    let status = engine.reconciler.status(&container, &env).await.unwrap();
    assert_eq!(status.name, "web");
    assert_eq!(status.desired_replicas, Some(2));
    assert!(status.service_present);
    assert!(status.hpa_present);
}

#[tokio::test]
async fn hpa_follows_autoscaling_config() {
    use heliport::domain::container::{AutoscaleConfig, CpuTarget, WorkloadConfig};

    let engine = test_engine();
    let mut container = registry_container("scaled");
    if let WorkloadConfig::Deployment(config) = &mut container.workload {
        config.autoscaling = AutoscaleConfig {
            min_replicas: Some(2),
            max_replicas: Some(6),
            cpu: Some(CpuTarget::Utilization(70)),
            memory: None,
        };
    }
    let env = test_environment();

    engine
        .reconciler
        .manage(&container, &env, None, &no_changes(), Action::Create)
        .await
        .unwrap();
    assert!(engine
        .gateway
        .contains("HorizontalPodAutoscaler", "env-7", "scaled-hpa"));

    // dropping the metrics removes the HPA on the next update
    if let WorkloadConfig::Deployment(config) = &mut container.workload {
        config.autoscaling = AutoscaleConfig::default();
    }
    engine
        .reconciler
        .manage(&container, &env, None, &no_changes(), Action::Update)
        .await
        .unwrap();
    assert!(!engine
        .gateway
        .contains("HorizontalPodAutoscaler", "env-7", "scaled-hpa"));
}

#[tokio::test(start_paused = true)]
async fn statefulset_update_resizes_and_retires_replica_claims() {
    let engine = test_engine();
    let env = test_environment();
    let container = statefulset_container("db", 2);

    // claims left by an earlier 3-replica revision
    for ordinal in 0..3 {
        engine.gateway.seed(
            "PersistentVolumeClaim",
            "env-7",
            &format!("data-db-{}", ordinal),
            &serde_json::json!({
                "metadata": {
                    "name": format!("data-db-{}", ordinal),
                    "labels": {"app": "db", "app.kubernetes.io/managed-by": "heliport"}
                },
                "spec": {"resources": {"requests": {"storage": "1Gi"}}}
            }),
        );
    }
    engine.gateway.seed(
        "Namespace",
        "",
        env.namespace(),
        &serde_json::json!({"metadata": {"name": env.namespace()}}),
    );

    engine
        .reconciler
        .manage(&container, &env, None, &no_changes(), Action::Update)
        .await
        .unwrap();

    // ordinal 2 is past the new replica count and the policy says Delete
    assert!(!engine
        .gateway
        .contains("PersistentVolumeClaim", "env-7", "data-db-2"));
    for ordinal in 0..2 {
        let claim = engine
            .gateway
            .raw("PersistentVolumeClaim", "env-7", &format!("data-db-{}", ordinal))
            .unwrap();
        assert_eq!(
            claim["spec"]["resources"]["requests"]["storage"],
            Value::from("4Gi")
        );
    }
}

#[tokio::test]
async fn update_with_changed_port_rewrites_ingress_backend_only() {
    let engine = test_engine();
    let env = test_environment();
    let mut container = registry_container("api");

    engine
        .reconciler
        .manage(&container, &env, None, &no_changes(), Action::Create)
        .await
        .unwrap();
    let before = engine.gateway.raw("Ingress", "env-7", "api-cluster").unwrap();

    container.networking.container_port = 9090;
    let changes = ContainerChanges {
        container_port: true,
        ..Default::default()
    };
    engine
        .reconciler
        .manage(&container, &env, None, &changes, Action::Update)
        .await
        .unwrap();

    let after = engine.gateway.raw("Ingress", "env-7", "api-cluster").unwrap();
    let rule_count = |v: &Value| v["spec"]["rules"].as_array().unwrap().len();
    assert_eq!(rule_count(&before), rule_count(&after));
    for rule in after["spec"]["rules"].as_array().unwrap() {
        for path in rule["http"]["paths"].as_array().unwrap() {
            assert_eq!(path["backend"]["service"]["port"]["number"], 9090);
        }
    }
}
