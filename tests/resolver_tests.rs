mod common;

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use kodegen_ghr::{
        RELEASE_SETTLE_INTERVAL, ReleaseError, ReleaseResolver, ReleaseSpec, RemoteError,
        ResolveAction, RetryPolicy, RetryingStore,
    };

    use crate::common::{Call, MockStore};

    fn resolver(store: &Arc<MockStore>) -> ReleaseResolver {
        ReleaseResolver::new(store.clone()).with_settle_interval(Duration::ZERO)
    }

    #[tokio::test]
    async fn test_draft_skips_lookup() {
        let store = Arc::new(MockStore::new());
        store.seed_release("v1.0.0", false);

        let spec = ReleaseSpec {
            draft: true,
            ..ReleaseSpec::new("v1.0.0")
        };
        let resolution = resolver(&store).resolve(&spec, true).await.unwrap();

        assert_eq!(resolution.action, ResolveAction::CreatedDraft);
        assert!(resolution.release.draft);
        assert_eq!(
            store.calls(),
            vec![Call::CreateRelease {
                tag: "v1.0.0".to_string(),
                draft: true
            }]
        );
    }

    #[tokio::test]
    async fn test_missing_release_is_created_as_draft_regardless_of_recreate() {
        for recreate in [false, true] {
            let store = Arc::new(MockStore::new());
            let resolution = resolver(&store)
                .resolve(&ReleaseSpec::new("v2.0.0"), recreate)
                .await
                .unwrap();

            assert_eq!(resolution.action, ResolveAction::Created);
            assert_eq!(
                store.calls(),
                vec![
                    Call::GetReleaseByTag("v2.0.0".to_string()),
                    Call::CreateRelease {
                        tag: "v2.0.0".to_string(),
                        draft: true
                    },
                ],
                "recreate = {}",
                recreate
            );
        }
    }

    #[tokio::test]
    async fn test_existing_release_is_reused() {
        let store = Arc::new(MockStore::new());
        let existing = store.seed_release("v1.0.0", false);

        let resolution = resolver(&store)
            .resolve(&ReleaseSpec::new("v1.0.0"), false)
            .await
            .unwrap();

        assert_eq!(resolution.action, ResolveAction::ReusedExisting);
        assert_eq!(resolution.release.id, existing.id);
        assert_eq!(
            store.count(|call| matches!(
                call,
                Call::CreateRelease { .. } | Call::DeleteRelease(_) | Call::DeleteTag(_)
            )),
            0
        );
    }

    #[tokio::test]
    async fn test_recreate_deletes_release_then_tag_then_creates() {
        let store = Arc::new(MockStore::new());
        let existing = store.seed_release("v1.0.0", false);

        let resolution = resolver(&store)
            .resolve(&ReleaseSpec::new("v1.0.0"), true)
            .await
            .unwrap();

        assert_eq!(resolution.action, ResolveAction::RecreatedThenCreated);
        assert_ne!(resolution.release.id, existing.id);
        assert_eq!(
            store.calls(),
            vec![
                Call::GetReleaseByTag("v1.0.0".to_string()),
                Call::DeleteRelease(existing.id),
                Call::DeleteTag("v1.0.0".to_string()),
                Call::CreateRelease {
                    tag: "v1.0.0".to_string(),
                    draft: true
                },
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_recreate_waits_settling_interval() {
        let store = Arc::new(MockStore::new());
        store.seed_release("v1.0.0", false);

        let start = tokio::time::Instant::now();
        ReleaseResolver::new(store.clone())
            .resolve(&ReleaseSpec::new("v1.0.0"), true)
            .await
            .unwrap();

        assert!(start.elapsed() >= RELEASE_SETTLE_INTERVAL);
    }

    #[tokio::test]
    async fn test_lookup_failure_aborts_without_create() {
        let store = Arc::new(MockStore::new());
        store.fail_lookup();

        let result = resolver(&store)
            .resolve(&ReleaseSpec::new("v1.0.0"), false)
            .await;

        assert!(result.unwrap_err().is_recoverable());
        assert_eq!(
            store.count(|call| matches!(call, Call::CreateRelease { .. })),
            0
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_hung_lookup_hits_the_deadline() {
        let store = Arc::new(
            RetryingStore::new(MockStore::new(), RetryPolicy::default())
                .with_deadline(Some(Duration::from_secs(2))),
        );
        store.inner().hang_lookup();

        let result = ReleaseResolver::new(store.clone())
            .resolve(&ReleaseSpec::new("v1.0.0"), false)
            .await;

        assert!(matches!(
            result,
            Err(ReleaseError::Remote(RemoteError::Timeout { .. }))
        ));
        assert_eq!(
            store
                .inner()
                .count(|call| matches!(call, Call::CreateRelease { .. })),
            0
        );
    }
}
