use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::{
    Container, EmptyDirVolumeSource, EnvVar, PersistentVolumeClaimVolumeSource, Pod, PodSpec,
    Volume, VolumeMount,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

use crate::config::JobConfig;

/// Prefix of every transcoder pod name. The API server appends a unique suffix.
pub const GENERATE_NAME: &str = "pms-elastic-transcoder-";
pub const APP_LABEL: &str = "app.kubernetes.io/name";
pub const APP_NAME: &str = "pms-elastic-transcoder";
pub const CONTAINER_NAME: &str = "plex";

pub const ARCH_LABEL: &str = "kubernetes.io/arch";
pub const ARCH: &str = "amd64";

pub const DATA_VOLUME: &str = "data";
pub const CONFIG_VOLUME: &str = "config";
pub const TRANSCODE_VOLUME: &str = "transcode";

/// Describe the transcoder pod for `config`.
///
/// The result is fully determined by `config`; the final pod name is left to
/// the API server via `generateName`. The pod:
/// - Never restarts, a failed transcode is final
/// - Only schedules on amd64 nodes
/// - Mounts the media claim read-only at `/data`
/// - Gets scratch `emptyDir` volumes at `/config` and `/transcode`
pub fn build_pod(config: &JobConfig) -> Pod {
    let env = config
        .env_vars
        .iter()
        .map(|(name, value)| EnvVar {
            name: name.clone(),
            value: Some(value.clone()),
            ..EnvVar::default()
        })
        .collect();

    let container = Container {
        name: CONTAINER_NAME.to_string(),
        image: Some(config.image.clone()),
        command: Some(config.command.clone()),
        env: Some(env),
        working_dir: Some(config.working_dir.to_string_lossy().into_owned()),
        volume_mounts: Some(vec![
            mount(DATA_VOLUME, "/data", true),
            mount(CONFIG_VOLUME, "/config", false),
            mount(TRANSCODE_VOLUME, "/transcode", false),
        ]),
        ..Container::default()
    };

    let volumes = vec![
        Volume {
            name: DATA_VOLUME.to_string(),
            persistent_volume_claim: Some(PersistentVolumeClaimVolumeSource {
                claim_name: config.data_pvc.clone(),
                read_only: Some(true),
            }),
            ..Volume::default()
        },
        scratch_volume(CONFIG_VOLUME),
        scratch_volume(TRANSCODE_VOLUME),
    ];

    Pod {
        metadata: ObjectMeta {
            generate_name: Some(GENERATE_NAME.to_string()),
            namespace: Some(config.namespace.clone()),
            labels: Some(BTreeMap::from([(
                APP_LABEL.to_string(),
                APP_NAME.to_string(),
            )])),
            ..ObjectMeta::default()
        },
        spec: Some(PodSpec {
            node_selector: Some(BTreeMap::from([(ARCH_LABEL.to_string(), ARCH.to_string())])),
            restart_policy: Some("Never".to_string()),
            containers: vec![container],
            volumes: Some(volumes),
            ..PodSpec::default()
        }),
        ..Pod::default()
    }
}

fn mount(volume: &str, path: &str, read_only: bool) -> VolumeMount {
    VolumeMount {
        name: volume.to_string(),
        mount_path: path.to_string(),
        read_only: Some(read_only),
        ..VolumeMount::default()
    }
}

fn scratch_volume(name: &str) -> Volume {
    Volume {
        name: name.to_string(),
        empty_dir: Some(EmptyDirVolumeSource::default()),
        ..Volume::default()
    }
}
