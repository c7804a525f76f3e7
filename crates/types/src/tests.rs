use crate::{Capability, ContentObject, Handle, HistoryId, ObjectId, ObjectKind, Version};

#[cfg(test)]
mod type_tests {
    use super::*;

    #[test]
    fn test_only_items_are_versionable() {
        assert_eq!(ObjectKind::Item.capability(), Capability::Versionable);
        for kind in [
            ObjectKind::Site,
            ObjectKind::Community,
            ObjectKind::Collection,
            ObjectKind::Bitstream,
        ] {
            assert_eq!(kind.capability(), Capability::Identifiable);
        }
        assert!(ContentObject::item().is_versionable());
    }

    #[test]
    fn test_object_id_round_trips_through_string() {
        let id = ObjectId::new_v4();
        let parsed: ObjectId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
        assert!("not-a-uuid".parse::<ObjectId>().is_err());
    }

    #[test]
    fn test_handle_serializes_as_plain_string() {
        let handle = Handle::new("123456789/42.2");
        let json = serde_json::to_string(&handle).unwrap();
        assert_eq!(json, "\"123456789/42.2\"");
        let back: Handle = serde_json::from_str(&json).unwrap();
        assert_eq!(back, handle);
    }

    #[test]
    fn test_version_record_keeps_object_reference() {
        let object = ObjectId::new_v4();
        let version = Version::new(HistoryId(3), 2, object, "new draft", chrono::Utc::now());
        assert_eq!(version.object, object);
        assert_eq!(version.history.to_string(), "history-3");
    }

    #[test]
    fn test_handle_from_parts() {
        assert_eq!(
            Handle::from_parts("123456789", 42).as_str(),
            "123456789/42"
        );
    }
}
