#![allow(clippy::unwrap_used)]

use std::collections::BTreeMap;

use defaults_edit::{
    Backend, CollisionPolicy, Domain, DomainSession, EditError, PlistItem, PlistPath, PlistType,
    PlistValue, PreferenceStore, StoreConfig,
    store::{self, PlistFileStore},
};
use tempfile::TempDir;

fn file_config() -> StoreConfig {
    StoreConfig {
        backend: Backend::File,
        ..StoreConfig::default()
    }
}

fn path(s: &str) -> PlistPath {
    s.parse().unwrap()
}

#[test]
fn edits_through_an_opened_store_reach_the_file() {
    let dir = TempDir::new().unwrap();
    let domain = Domain::Path(dir.path().join("com.example.finder.plist"));
    let mut session = DomainSession::new(store::open(domain.clone(), &file_config()).unwrap());

    let mut prefs = PlistItem::default();
    prefs.set_key("FXPreferences");
    prefs.set_type(PlistType::Dictionary);
    session
        .add(&PlistPath::root(), prefs, CollisionPolicy::Reject)
        .unwrap();
    session
        .add(
            &path("FXPreferences"),
            PlistItem::from_entry("ShowPathbar", PlistValue::Integer(1)),
            CollisionPolicy::Reject,
        )
        .unwrap();

    // staged as an integer, then switched to a real
    let mut item = session.item_at(&path("FXPreferences.ShowPathbar")).unwrap();
    item.set_type(PlistType::Real);
    session
        .commit(&path("FXPreferences.ShowPathbar"), item, CollisionPolicy::Reject)
        .unwrap();

    let on_disk = PlistFileStore::new(domain).unwrap().read_all().unwrap();
    assert_eq!(
        on_disk,
        BTreeMap::from([(
            "FXPreferences".to_string(),
            PlistValue::Dictionary(BTreeMap::from([(
                "ShowPathbar".to_string(),
                PlistValue::Real(1.0)
            )]))
        )])
    );
}

#[test]
fn nested_rename_collision_is_reported() {
    let dir = TempDir::new().unwrap();
    let domain = Domain::Path(dir.path().join("com.example.dock.plist"));
    let mut session = DomainSession::new(store::open(domain, &file_config()).unwrap());
    session
        .add(
            &PlistPath::root(),
            PlistItem::from_entry(
                "tile",
                PlistValue::Dictionary(BTreeMap::from([
                    ("label".to_string(), PlistValue::String("Mail".into())),
                    ("bundle".to_string(), PlistValue::String("com.apple.mail".into())),
                ])),
            ),
            CollisionPolicy::Reject,
        )
        .unwrap();

    let mut item = session.item_at(&path("tile.label")).unwrap();
    item.set_key("bundle");
    let err = session
        .commit(&path("tile.label"), item.clone(), CollisionPolicy::Reject)
        .unwrap_err();
    assert!(matches!(err, EditError::KeyCollision { ref key } if key == "bundle"));

    session
        .commit(&path("tile.label"), item, CollisionPolicy::Overwrite)
        .unwrap();
    assert_eq!(
        session.tree().unwrap(),
        PlistValue::Dictionary(BTreeMap::from([(
            "tile".to_string(),
            PlistValue::Dictionary(BTreeMap::from([(
                "bundle".to_string(),
                PlistValue::String("Mail".into())
            )]))
        )]))
    );
}

#[test]
fn listing_filters_top_level_keys() {
    let dir = TempDir::new().unwrap();
    let domain = Domain::Path(dir.path().join("com.example.app.plist"));
    let mut session = DomainSession::new(store::open(domain, &file_config()).unwrap());
    for key in ["AutoHide", "autohide-delay", "tilesize"] {
        session
            .add(
                &PlistPath::root(),
                PlistItem::from_entry(key, PlistValue::Boolean(true)),
                CollisionPolicy::Reject,
            )
            .unwrap();
    }

    let listed = session.listing(Some("AUTOHIDE")).unwrap();
    let keys: Vec<&String> = listed.as_dictionary().unwrap().keys().collect();
    assert_eq!(keys, ["AutoHide", "autohide-delay"]);
}

#[test]
fn empty_key_is_refused_before_anything_is_written() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("com.example.app.plist");
    let mut session =
        DomainSession::new(store::open(Domain::Path(file.clone()), &file_config()).unwrap());

    let mut item = PlistItem::default();
    item.set_key("");
    let err = session
        .add(&PlistPath::root(), item, CollisionPolicy::Reject)
        .unwrap_err();
    assert!(matches!(err, EditError::EmptyKey));
    assert!(!file.exists());
}
