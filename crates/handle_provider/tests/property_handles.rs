use handle_provider::{
    ContentObject, Handle, MemoryHandleResolver, MemoryMetadata, MemoryVersionHistory, ObjectKind,
    ProviderConfig, VersionHistoryTracker, VersionedHandleProvider,
};
use proptest::prelude::*;
use std::sync::Arc;

#[derive(Debug, Clone)]
enum Op {
    /// Forward creation of the next version followed by registration.
    NewVersion,
    /// Archive import of version N under its versioned handle.
    Restore(u32),
    /// Archive import of the latest version under the canonical handle.
    Resurrect,
    /// Removal of the latest version.
    Delete,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => Just(Op::NewVersion),
        2 => (1u32..30).prop_map(Op::Restore),
        1 => Just(Op::Resurrect),
        1 => Just(Op::Delete),
    ]
}

fn canonical_handle() -> impl Strategy<Value = String> {
    "[0-9]{1,6}(\\.[0-9]{1,4})?/[a-zA-Z0-9_-]{1,12}"
}

proptest! {
    #[test]
    fn versioned_handles_parse_back_to_their_parts(
        canonical in canonical_handle(),
        number in 1u32..=u32::MAX,
    ) {
        let canonical = Handle::new(canonical);
        prop_assert_eq!(canonical.version(), None);

        let versioned = canonical.with_version(number);
        let parsed = versioned.parse();
        prop_assert_eq!(&parsed.canonical, &canonical);
        prop_assert_eq!(parsed.version, Some(number));
        prop_assert_eq!(parsed.compose(), versioned);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn canonical_always_resolves_to_highest_version(
        ops in prop::collection::vec(op(), 1..25)
    ) {
        let resolver = MemoryHandleResolver::new("123456789");
        let history = MemoryVersionHistory::new();
        let provider = VersionedHandleProvider::new(
            ProviderConfig::default(),
            Arc::new(resolver.clone()),
            Arc::new(history.clone()),
            Arc::new(MemoryMetadata::new()),
        );

        let first = ContentObject::item();
        let canonical = provider.register(&first).unwrap();

        for op in ops {
            let object = ContentObject::item();
            match op {
                Op::NewVersion => {
                    let current = provider.resolve(&canonical).unwrap();
                    history.add_version(current, object.id, "new version").unwrap();
                    provider.register(&object).unwrap();
                }
                Op::Restore(number) => {
                    provider
                        .register_identifier(&object, &canonical.with_version(number))
                        .unwrap();
                }
                Op::Resurrect => {
                    let current = provider.resolve(&canonical).unwrap();
                    if history.find_by_object(current).unwrap().is_none() {
                        // Without a history the canonical handle is simply taken.
                        continue;
                    }
                    provider.register_identifier(&object, &canonical).unwrap();
                }
                Op::Delete => {
                    let current = provider.resolve(&canonical).unwrap();
                    let Some(id) = history.find_by_object(current).unwrap() else {
                        continue;
                    };
                    if history.versions(id).unwrap().len() < 2 {
                        continue;
                    }
                    provider.delete(&ContentObject::new(current, ObjectKind::Item)).unwrap();
                    history.remove_version(current).unwrap();
                }
            }

            let current = provider.resolve(&canonical).unwrap();
            if let Some(id) = history.find_by_object(current).unwrap() {
                let latest = history.latest(id).unwrap().unwrap();
                prop_assert_eq!(current, latest.object);
                let own = canonical.with_version(latest.number);
                prop_assert_eq!(provider.resolve(&own), Some(latest.object));
            }
        }
    }
}
