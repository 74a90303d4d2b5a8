use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

use provis_fetch::MemoryClient;
use provis_install::loader::{BUNDLED_LOADER_VERSION, DEFAULT_MAIN_CLASS, loader_id, profile_url};
use provis_install::{
    InstallError, InstallerConfig, NoProgress, Phase, Pipeline, ProgressSink, StageOutcome, addons,
};
use provis_verify::Sha1Hasher;
use zip::write::SimpleFileOptions;

const INDEX: &str = "https://meta.invalid/index.json";
const DESCRIPTOR: &str = "https://meta.invalid/1.20.1.json";
const CLIENT: &str = "https://cdn.invalid/client.jar";
const ASSET_INDEX: &str = "https://meta.invalid/indexes/5.json";
const LIBS: &str = "https://libs.invalid";
const LOADER_META: &str = "https://loader-meta.invalid";
const LOADER_MAVEN: &str = "https://loader-maven.invalid";
const OBJECTS: &str = "https://objects.invalid";
const REGISTRY: &str = "https://registry.invalid";

#[derive(Default)]
struct Recording {
    progress: Mutex<Vec<f64>>,
    status: Mutex<Vec<String>>,
}

impl ProgressSink for Recording {
    fn progress(&self, fraction: f64) {
        self.progress.lock().unwrap().push(fraction);
    }

    fn status(&self, message: &str) {
        self.status.lock().unwrap().push(message.to_string());
    }
}

fn sha1(bytes: &[u8]) -> String {
    hex::encode(Sha1Hasher::digest(bytes))
}

fn natives_jar() -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
    writer.start_file("liblwjgl.so", SimpleFileOptions::default()).unwrap();
    writer.write_all(b"elf").unwrap();
    writer.finish().unwrap().into_inner()
}

/// A complete remote world for version 1.20.1 on linux.
fn world() -> MemoryClient {
    let client = MemoryClient::new();
    let jar = b"client bytes";
    client.route(
        INDEX,
        format!(r#"{{"versions": [{{"id": "1.20.1", "type": "release", "url": "{DESCRIPTOR}"}}]}}"#),
    );
    client.route(
        DESCRIPTOR,
        format!(
            r#"{{
                "id": "1.20.1",
                "mainClass": "net.minecraft.client.main.Main",
                "downloads": {{"client": {{"url": "{CLIENT}", "size": {size}, "sha1": "{hash}"}}}},
                "libraries": [
                    {{"name": "com.mojang:brigadier:1.0.18"}},
                    {{"name": "ca.weblite:java-objc-bridge:1.1", "rules": [{{"action": "allow", "os": {{"name": "osx"}}}}]}},
                    {{"name": "org.lwjgl:lwjgl:3.3.1", "natives": {{"linux": "natives-linux"}}}}
                ],
                "assetIndex": {{"id": "5", "url": "{ASSET_INDEX}"}},
                "assets": "5"
            }}"#,
            size = jar.len(),
            hash = sha1(jar),
        ),
    );
    client.route(CLIENT, &jar[..]);
    client.route(format!("{LIBS}/com/mojang/brigadier/1.0.18/brigadier-1.0.18.jar"), "brigadier");
    client.route(format!("{LIBS}/org/lwjgl/lwjgl/3.3.1/lwjgl-3.3.1.jar"), "lwjgl");
    client.route(format!("{LIBS}/org/lwjgl/lwjgl/3.3.1/lwjgl-3.3.1-natives-linux.jar"), natives_jar());

    let (icon, sound) = (b"icon".as_slice(), b"sound".as_slice());
    client.route(
        ASSET_INDEX,
        format!(
            r#"{{"objects": {{
                "icons/a.png": {{"hash": "{icon}", "size": 4}},
                "minecraft/icons/a.png": {{"hash": "{icon}", "size": 4}},
                "sounds/b.ogg": {{"hash": "{sound}", "size": 5}}
            }}}}"#,
            icon = sha1(icon),
            sound = sha1(sound),
        ),
    );
    for payload in [icon, sound] {
        let hash = sha1(payload);
        client.route(format!("{OBJECTS}/{}/{hash}", &hash[..2]), payload);
    }

    client.route(
        profile_url(LOADER_META, "1.20.1", BUNDLED_LOADER_VERSION),
        format!(
            r#"{{
                "id": "{id}",
                "inheritsFrom": "1.20.1",
                "mainClass": "{DEFAULT_MAIN_CLASS}",
                "libraries": [
                    {{"name": "net.fabricmc:fabric-loader:{BUNDLED_LOADER_VERSION}"}},
                    {{"name": "net.fabricmc:intermediary:1.20.1"}}
                ]
            }}"#,
            id = loader_id(BUNDLED_LOADER_VERSION, "1.20.1"),
        ),
    );
    client.route(
        format!("{LOADER_MAVEN}/net/fabricmc/fabric-loader/{v}/fabric-loader-{v}.jar", v = BUNDLED_LOADER_VERSION),
        "loader",
    );
    client.route(
        format!("{LOADER_MAVEN}/net/fabricmc/intermediary/1.20.1/intermediary-1.20.1.jar"),
        "mappings",
    );

    client.route(
        addons::registry_query_url(REGISTRY, "fabric-api", "1.20.1"),
        r#"[{"files": [{"url": "https://cdn.invalid/fabric-api.jar", "filename": "fabric-api-0.90.0.jar", "primary": true}]}]"#,
    );
    client.route("https://cdn.invalid/fabric-api.jar", "api");

    client
}

fn config() -> InstallerConfig {
    InstallerConfig {
        version_manifest_url: INDEX.into(),
        resources_url: OBJECTS.into(),
        libraries_url: LIBS.into(),
        loader_maven_url: LOADER_MAVEN.into(),
        loader_meta_url: LOADER_META.into(),
        addon_registry_url: REGISTRY.into(),
        max_retries: 0,
        addon_slugs: vec!["fabric-api".into()],
        essential_addons: 1,
        platform: Some("linux".into()),
        ..Default::default()
    }
}

fn assert_installed(root: &Path) {
    let loader = loader_id(BUNDLED_LOADER_VERSION, "1.20.1");
    for path in [
        "versions/1.20.1/1.20.1.json".to_string(),
        "versions/1.20.1/1.20.1.jar".to_string(),
        "libraries/com/mojang/brigadier/1.0.18/brigadier-1.0.18.jar".to_string(),
        "natives/liblwjgl.so".to_string(),
        "assets/indexes/5.json".to_string(),
        format!("versions/{loader}/{loader}.json"),
        format!("versions/{loader}/{loader}.jar"),
        "libraries/net/fabricmc/intermediary/1.20.1/intermediary-1.20.1.jar".to_string(),
        "mods/fabric-api-0.90.0.jar".to_string(),
    ] {
        assert!(root.join(&path).is_file(), "{path} missing");
    }
    assert!(!root.join("libraries/ca/weblite").exists());
}

#[tokio::test]
async fn full_install_then_idempotent_rerun() {
    let dir = tempfile::tempdir().unwrap();
    let client = world();
    let pipeline = Pipeline::new(client.clone(), config(), dir.path());
    let sink = Recording::default();

    let report = pipeline.install("1.20.1", &sink).await.unwrap();

    assert_installed(dir.path());
    assert!(report.client_downloaded);
    assert_eq!(report.libraries.failed, 0);
    assert!(matches!(report.natives, StageOutcome::Done(ref n) if n.extracted == 1));
    assert_eq!(report.assets.objects, 2);
    assert_eq!(report.assets.downloaded, 2);
    assert_eq!(report.addons.installed, vec!["fabric-api".to_string()]);
    assert_eq!(pipeline.state().phase, Phase::Complete);

    let icon_url = format!("{OBJECTS}/{}/{}", &sha1(b"icon")[..2], sha1(b"icon"));
    assert_eq!(client.requests_for(&icon_url), 1);

    client.clear_requests();
    let again = pipeline.install("1.20.1", &NoProgress).await.unwrap();

    assert_eq!(client.requests(), Vec::<String>::new());
    assert!(!again.client_downloaded);
    assert_eq!(again.natives, StageOutcome::AlreadySatisfied);
    assert_eq!(again.addons.already_present, vec!["fabric-api".to_string()]);
}

#[tokio::test]
async fn progress_is_monotonic_and_ends_at_one() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = Pipeline::new(world(), config(), dir.path());
    let sink = Recording::default();

    pipeline.install("1.20.1", &sink).await.unwrap();

    let progress = sink.progress.lock().unwrap();
    assert!(progress.windows(2).all(|w| w[0] <= w[1]), "{progress:?}");
    assert_eq!(progress.last(), Some(&1.0));
    assert!(progress.iter().all(|p| (0.0..=1.0).contains(p)));
    let status = sink.status.lock().unwrap();
    assert_eq!(status.last().map(String::as_str), Some("Installation complete"));
    assert!(status.iter().any(|s| s.ends_with(" files")));
}

#[tokio::test]
async fn unreachable_index_fails_the_install() {
    let dir = tempfile::tempdir().unwrap();
    let client = world();
    client.unreachable(INDEX);
    let pipeline = Pipeline::new(client, config(), dir.path());
    let sink = Recording::default();

    let err = pipeline.install("1.20.1", &sink).await.unwrap_err();

    assert!(matches!(err, InstallError::Unreachable(_)));
    let state = pipeline.state();
    assert_eq!(state.phase, Phase::Failed);
    assert!(state.last_status.starts_with("Installation failed"));
    assert_ne!(sink.progress.lock().unwrap().last(), Some(&1.0));
}

#[tokio::test]
async fn unknown_version_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = Pipeline::new(world(), config(), dir.path());

    let err = pipeline.install("0.0.1", &NoProgress).await.unwrap_err();

    assert!(matches!(err, InstallError::NotFound { .. }));
}

#[tokio::test]
async fn missing_client_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let client = world();
    client.status(CLIENT, 404);
    let pipeline = Pipeline::new(client, config(), dir.path());

    let err = pipeline.install("1.20.1", &NoProgress).await.unwrap_err();

    assert!(matches!(err, InstallError::Unreachable(_)));
    assert_eq!(pipeline.state().phase, Phase::Failed);
}

#[tokio::test]
async fn loader_meta_outage_uses_bundled_profile() {
    let dir = tempfile::tempdir().unwrap();
    let client = world();
    client.unreachable(profile_url(LOADER_META, "1.20.1", BUNDLED_LOADER_VERSION));
    let pipeline = Pipeline::new(client, config(), dir.path());

    let report = pipeline.install("1.20.1", &NoProgress).await.unwrap();

    assert_eq!(report.loader_source, Some(provis_install::loader::ProfileSource::Bundled));
    let classpath = pipeline.classpath("1.20.1").unwrap();
    assert!(classpath.last().unwrap().ends_with(format!(
        "{id}.jar",
        id = loader_id(BUNDLED_LOADER_VERSION, "1.20.1")
    )));
}

#[tokio::test]
async fn failed_optional_pieces_do_not_fail_the_install() {
    let dir = tempfile::tempdir().unwrap();
    let client = world();
    client.status(format!("{LIBS}/com/mojang/brigadier/1.0.18/brigadier-1.0.18.jar"), 500);
    let sound = sha1(b"sound");
    client.status(format!("{OBJECTS}/{}/{sound}", &sound[..2]), 404);
    client.unreachable(addons::registry_query_url(REGISTRY, "fabric-api", "1.20.1"));
    let pipeline = Pipeline::new(client, config(), dir.path());

    let report = pipeline.install("1.20.1", &NoProgress).await.unwrap();

    assert_eq!(report.libraries.failed, 1);
    assert_eq!(report.assets.failed, 1);
    assert_eq!(report.addons.failed, vec!["fabric-api".to_string()]);
    assert!(dir.path().join("libraries/org/lwjgl/lwjgl/3.3.1/lwjgl-3.3.1.jar").is_file());
}

#[tokio::test]
async fn cancelled_install_stops_between_stages() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = Pipeline::new(world(), config(), dir.path());
    let cancel = provis_fetch::CancellationToken::new();
    cancel.cancel();

    let err = pipeline.install_with("1.20.1", &NoProgress, &cancel).await.unwrap_err();

    assert!(matches!(err, InstallError::Cancelled));
    assert!(!dir.path().join("versions/1.20.1/1.20.1.jar").exists());
}

#[tokio::test]
async fn concurrent_install_on_one_pipeline_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let client = world();
    client.delay(INDEX, std::time::Duration::from_millis(50));
    let pipeline = Pipeline::new(client.clone(), config(), dir.path());

    let (first, second) = tokio::join!(
        pipeline.install("1.20.1", &NoProgress),
        pipeline.install("1.20.1", &NoProgress),
    );

    assert!(first.is_ok());
    assert!(matches!(second, Err(InstallError::AlreadyInProgress)));
    assert_eq!(client.requests_for(INDEX), 1);
    assert_eq!(pipeline.state().phase, Phase::Complete);
}
