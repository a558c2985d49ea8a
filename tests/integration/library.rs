use lpass_resolve::core::ResolveError;
use lpass_resolve::resolver::{Resolver, UnresolvedPolicy};
use lpass_resolve::test_utils::{MockStore, init_test_logging};
use std::sync::Arc;

const DOCUMENT: &str = r"database:
  user: ((db/Username))
  password: ((db/Password))
  port: ((db/Notes/port))
  replicas: ((db/Notes/replicas))
  tls: ((db/Notes/tls))
backup:
  password: ((db/Password))
";

fn store() -> MockStore {
    MockStore::new()
        .with_value("db", "Username", "admin")
        .with_value("db", "Password", "pa\"ss")
        .with_value("db", "Notes", "port: 5432\ntls: false\nreplicas:\n  - r1\n  - r2\n")
}

#[tokio::test]
async fn test_resolves_yaml_document() {
    init_test_logging(None);
    let resolver = Resolver::new(store());

    let output = resolver.process(DOCUMENT).await.unwrap();

    assert_eq!(
        output,
        r#"database:
  user: "admin"
  password: "pa\"ss"
  port: 5432
  replicas: ["r1","r2"]
  tls: false
backup:
  password: "pa\"ss"
"#
    );

    // Output stays parseable and carries the secrets as typed values
    let parsed: serde_yaml::Value = serde_yaml::from_str(&output).unwrap();
    assert_eq!(parsed["database"]["password"].as_str(), Some("pa\"ss"));
    assert_eq!(parsed["database"]["port"].as_u64(), Some(5432));

    let store = resolver.store();
    assert_eq!(store.calls("db", "Password"), 1);
    assert_eq!(store.calls("db", "Notes"), 1);
    assert_eq!(store.total_calls(), 3);
}

#[tokio::test]
async fn test_resolver_reused_across_documents() {
    let resolver = Resolver::new(store());

    resolver.process("a: ((db/Password))").await.unwrap();
    resolver.process("b: ((db/Password))").await.unwrap();

    assert_eq!(resolver.store().calls("db", "Password"), 1);
    assert!(resolver.cache().contains("db", "Password"));
}

#[tokio::test]
async fn test_shared_resolver_across_tasks() {
    let store = store().with_delay(std::time::Duration::from_millis(25));
    let resolver = Arc::new(Resolver::new(store));

    let mut handles = Vec::new();
    for i in 0..8 {
        let resolver = Arc::clone(&resolver);
        handles.push(tokio::spawn(async move {
            resolver.process(&format!("{i}: ((db/Username))")).await
        }));
    }

    for (i, handle) in handles.into_iter().enumerate() {
        assert_eq!(handle.await.unwrap().unwrap(), format!("{i}: \"admin\""));
    }
    assert_eq!(resolver.store().calls("db", "Username"), 1);
}

#[tokio::test]
async fn test_abort_policy_returns_typed_error() {
    let resolver = Resolver::new(store());

    let err = resolver.process("x: ((db/Notes/missing))").await.unwrap_err();
    assert!(matches!(err, ResolveError::MissingFragmentKey { ref key, .. } if key == "missing"));

    let err = resolver.process("x: ((nope/Password))").await.unwrap_err();
    assert!(err.is_store_error());
}

#[tokio::test]
async fn test_marker_policy_keeps_going() {
    let resolver = Resolver::new(store()).with_policy(UnresolvedPolicy::Marker);

    let report = resolver
        .process_with_report("a: ((db/Username))\nb: ((nope/Password))\nc: ((db/Notes/missing))\n")
        .await
        .unwrap();

    assert_eq!(
        report.output,
        "a: \"admin\"\nb: ((!unresolved nope/Password))\nc: ((!unresolved db/Notes/missing))\n"
    );
    let handles: Vec<&str> = report.failures.iter().map(|f| f.handle.as_str()).collect();
    assert_eq!(handles, ["nope/Password", "db/Notes/missing"]);
}

#[cfg(unix)]
mod lpass_store {
    use super::super::common::FakeLpass;
    use lpass_resolve::core::ResolveError;
    use lpass_resolve::resolver::Resolver;
    use lpass_resolve::store::{CredentialStore, LpassStore};
    use std::time::Duration;

    #[tokio::test]
    async fn test_fetch_uses_field_flags() {
        let lpass = FakeLpass::new();
        let store = LpassStore::new(lpass.command());

        assert_eq!(store.fetch("db", "Password").await.unwrap(), "s3cr3t");
        assert_eq!(store.fetch("api", "token").await.unwrap(), "tok-123");
        assert_eq!(lpass.calls(), ["show --password db", "show --field=token api"]);
    }

    #[tokio::test]
    async fn test_unknown_entry_is_fetch_error() {
        let lpass = FakeLpass::new();
        let store = LpassStore::new(lpass.command());

        let err = store.fetch("nope", "Password").await.unwrap_err();
        assert!(matches!(err, ResolveError::StoreFetch { ref entry, .. } if entry == "nope"));
    }

    #[tokio::test]
    async fn test_timeout_kills_fetch() {
        let lpass = FakeLpass::new();
        let store = LpassStore::new(lpass.command()).with_timeout(Some(Duration::from_millis(200)));

        let err = store.fetch("slow", "Password").await.unwrap_err();
        assert!(matches!(err, ResolveError::StoreTimeout { .. }));
    }

    #[tokio::test]
    async fn test_resolver_over_lpass() {
        let lpass = FakeLpass::new();
        let resolver = Resolver::new(LpassStore::new(lpass.command()));

        let output = resolver
            .process("key: ((api/Notes/api_key))\nport: ((api/Notes/port))\nhosts: ((api/Notes/hosts))\n")
            .await
            .unwrap();

        assert_eq!(output, "key: \"abc123\"\nport: 8080\nhosts: [\"a.example.com\",\"b.example.com\"]\n");
        assert_eq!(lpass.calls(), ["show --notes api"]);
    }
}
