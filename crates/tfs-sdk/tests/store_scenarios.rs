//! End-to-end behaviour of the multi-tenant store.

use std::fs::File;
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::{Duration, SystemTime};

use tfs_sdk::{
    ConflictPolicy, ContentId, ContentStore, DirectoryNode, ErrorKind, FileKind, Locator,
    PageRequest, Store, StoreConfig,
};
use tfs_types::unix_now;

fn open_with(configure: impl FnOnce(&mut StoreConfig)) -> (tempfile::TempDir, Store) {
    let dir = tempfile::tempdir().unwrap();
    let mut config = StoreConfig::new(dir.path().join("data"), "integration secret");
    configure(&mut config);
    let store = Store::open(config).unwrap();
    (dir, store)
}

fn open() -> (tempfile::TempDir, Store) {
    open_with(|_| {})
}

fn child_names(node: &DirectoryNode) -> Vec<&str> {
    node.children().iter().map(DirectoryNode::name).collect()
}

fn set_mtime(path: &std::path::Path, secs_ago: u64) {
    File::options()
        .write(true)
        .open(path)
        .unwrap()
        .set_modified(SystemTime::now() - Duration::from_secs(secs_ago))
        .unwrap();
}

// ---------------------------------------------------------------------------
// Directory scenario
// ---------------------------------------------------------------------------

#[test]
fn mkdir_twice_then_rename_then_list() {
    let (_dir, store) = open();
    let u1 = store.tenant("u1").unwrap();

    assert_eq!(u1.mkdir("a").unwrap(), "a");
    let err = u1.mkdir("a").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AlreadyExists);
    assert_eq!(u1.rename("a", "b").unwrap(), "b");

    let listing = u1.list("").unwrap();
    assert_eq!(child_names(&listing), ["b"]);
    assert!(listing.children()[0].is_dir());
}

#[test]
fn mkdir_sanitizes_and_requires_parent() {
    let (_dir, store) = open();
    let u1 = store.tenant("u1").unwrap();
    assert_eq!(u1.mkdir("holiday <2024>").unwrap(), "holiday 2024");
    assert_eq!(u1.mkdir("missing/child").unwrap_err().kind(), ErrorKind::NotFound);
}

// ---------------------------------------------------------------------------
// Sandbox confinement
// ---------------------------------------------------------------------------

#[test]
fn escapes_are_rejected_by_every_operation() {
    let (dir, store) = open();
    let victim = store.tenant("victim").unwrap();
    victim.upload(b"private", "diary.txt").unwrap();
    let u1 = store.tenant("u1").unwrap();
    u1.upload(b"x", "mine.txt").unwrap();

    let escape = "../victim/diary.txt";
    let kinds = [
        u1.upload(b"evil", escape).unwrap_err().kind(),
        u1.download(&Locator::Path(escape.into())).unwrap_err().kind(),
        u1.list("../victim").unwrap_err().kind(),
        u1.mkdir("../victim/new").unwrap_err().kind(),
        u1.delete(escape).unwrap_err().kind(),
        u1.rename(escape, "stolen.txt").unwrap_err().kind(),
        u1.move_to(escape, "stolen.txt").unwrap_err().kind(),
        u1.move_to("mine.txt", "../../outside.txt").unwrap_err().kind(),
        u1.copy(escape, "stolen.txt").unwrap_err().kind(),
        u1.issue_share_token(escape, None).unwrap_err().kind(),
        u1.read_text(escape).unwrap_err().kind(),
        u1.write_text(escape, "overwritten").unwrap_err().kind(),
    ];
    assert!(kinds.iter().all(|k| *k == ErrorKind::PathEscape), "{kinds:?}");

    assert_eq!(victim.read_text("diary.txt").unwrap(), "private");
    assert!(!dir.path().join("data/tenants/outside.txt").exists());
    assert_eq!(child_names(&u1.list("").unwrap()), ["mine.txt"]);
}

#[test]
fn deleting_the_root_is_always_forbidden() {
    let (_dir, store) = open();
    for tenant in ["u1", "another_tenant", "9"] {
        let t = store.tenant(tenant).unwrap();
        t.upload(b"keep", "keep.txt").unwrap();
        for root in ["", "/", ".", "./", "x/..", "\\"] {
            let err = t.delete(root).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::RootDeletionForbidden, "{tenant}: {root:?}");
        }
        assert!(t.read_text("keep.txt").is_ok());
    }
}

// ---------------------------------------------------------------------------
// Content-addressed storage
// ---------------------------------------------------------------------------

#[test]
fn concurrent_content_uploads_store_one_object() {
    let (_dir, store) = open();
    let store = Arc::new(store);
    let barrier = Arc::new(Barrier::new(2));
    let handles: Vec<_> = (0..2)
        .map(|_| {
            let store = Arc::clone(&store);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                store.upload_content_addressed(b"hello").unwrap()
            })
        })
        .collect();
    let ids: Vec<ContentId> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(ids[0], ids[1]);

    let objects = store.content().list().unwrap();
    assert_eq!(objects.len(), 1);
    assert_eq!(
        objects[0].id.to_hex(),
        "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
    );
    assert_eq!(objects[0].size, 5);
}

#[test]
fn content_roundtrip_through_locator() {
    let (_dir, store) = open();
    let u1 = store.tenant("u1").unwrap();
    let payload: Vec<u8> = (0..=255u8).cycle().take(10_000).collect();
    let cid = u1.upload_content_addressed(&payload).unwrap();
    assert_eq!(u1.upload_content_addressed(&payload).unwrap(), cid);

    let locator = Locator::parse(&format!("cid:{cid}")).unwrap();
    let download = u1.download(&locator).unwrap();
    assert_eq!(download.size, 10_000);
    assert_eq!(download.read_all().unwrap(), payload);

    let missing = Locator::Content(ContentId::of(b"never stored"));
    assert_eq!(u1.download(&missing).unwrap_err().kind(), ErrorKind::NotFound);
}

// ---------------------------------------------------------------------------
// Uploads into tenant trees
// ---------------------------------------------------------------------------

#[test]
fn upload_and_download_by_path() {
    let (_dir, store) = open();
    let u1 = store.tenant("u1").unwrap();
    u1.mkdir("docs").unwrap();
    let record = u1.upload(b"quarterly numbers", "docs/report (v2).txt").unwrap();
    assert_eq!(record.path, "docs/report v2.txt");
    assert_eq!(record.size, 17);
    assert_eq!(record.kind, FileKind::Text);
    assert_eq!(record.mime, "text/plain");
    assert_eq!(record.digest, Some(ContentId::of(b"quarterly numbers")));

    let download = u1.download(&Locator::parse("/docs/report v2.txt").unwrap()).unwrap();
    assert_eq!(download.name, "report v2.txt");
    assert_eq!(download.read_all().unwrap(), b"quarterly numbers");

    assert_eq!(
        u1.download(&Locator::Path("docs".into())).unwrap_err().kind(),
        ErrorKind::NotFound
    );
}

#[test]
fn upload_requires_existing_directory() {
    let (_dir, store) = open();
    let u1 = store.tenant("u1").unwrap();
    let err = u1.upload(b"x", "nowhere/file.txt").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert!(u1.list("nowhere").is_err());
}

#[test]
fn upload_conflict_policies() {
    let (_dir, store) = open();
    let u1 = store.tenant("u1").unwrap();
    u1.upload(b"first", "photo.jpg").unwrap();
    let err = u1.upload(b"second", "photo.jpg").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AlreadyExists);

    let (_dir2, renaming) = open_with(|c| c.on_conflict = ConflictPolicy::Rename);
    let u2 = renaming.tenant("u2").unwrap();
    assert_eq!(u2.upload(b"1", "photo.jpg").unwrap().path, "photo.jpg");
    assert_eq!(u2.upload(b"2", "photo.jpg").unwrap().path, "photo(1).jpg");
    assert_eq!(u2.upload(b"3", "photo.jpg").unwrap().path, "photo(2).jpg");
}

#[test]
fn upload_allow_list_and_size_limit() {
    let (_dir, store) = open();
    let u1 = store.tenant("u1").unwrap();
    let err = u1.upload(b"MZ", "setup.exe").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unsupported);

    let (_dir2, media_only) = open_with(|c| {
        c.allowed_kinds = Some(vec![FileKind::Image, FileKind::Video]);
        c.max_upload_bytes = 8;
    });
    let m = media_only.tenant("m").unwrap();
    assert!(m.upload(b"png", "a.png").is_ok());
    assert_eq!(m.upload(b"txt", "a.txt").unwrap_err().kind(), ErrorKind::Unsupported);
    assert_eq!(m.upload(b"123456789", "b.mp4").unwrap_err().kind(), ErrorKind::TooLarge);
}

// ---------------------------------------------------------------------------
// Share tokens
// ---------------------------------------------------------------------------

#[test]
fn share_token_lifecycle() {
    let (_dir, store) = open();
    let u1 = store.tenant("u1").unwrap();
    u1.upload(b"shared bytes", "share.bin").unwrap();

    let token = u1
        .issue_share_token("share.bin", Some(Duration::from_secs(60)))
        .unwrap();
    let download = store.redeem_share_token(token.as_str()).unwrap();
    assert_eq!(download.read_all().unwrap(), b"shared bytes");

    let later = unix_now() + 3_600;
    let err = store.redeem_share_token_at(token.as_str(), later).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Expired);

    let mut forged = token.into_string().into_bytes();
    forged[3] = if forged[3] == b'A' { b'B' } else { b'A' };
    let forged = String::from_utf8(forged).unwrap();
    let err = store.redeem_share_token(&forged).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Tampered);
}

#[test]
fn share_targets_are_revalidated_on_redeem() {
    let (_dir, store) = open();
    let u1 = store.tenant("u1").unwrap();
    u1.mkdir("folder").unwrap();
    assert_eq!(
        u1.issue_share_token("folder", None).unwrap_err().kind(),
        ErrorKind::NotFound
    );
    assert_eq!(
        u1.issue_share_token("ghost.txt", None).unwrap_err().kind(),
        ErrorKind::NotFound
    );

    u1.upload(b"soon gone", "gone.txt").unwrap();
    let token = u1.issue_share_token("gone.txt", None).unwrap();
    u1.delete("gone.txt").unwrap();
    assert_eq!(
        store.redeem_share_token(token.as_str()).unwrap_err().kind(),
        ErrorKind::NotFound
    );

    // Replaced by a directory: still not downloadable.
    u1.mkdir("gone.txt").unwrap();
    assert_eq!(
        store.redeem_share_token(token.as_str()).unwrap_err().kind(),
        ErrorKind::NotFound
    );
}

// ---------------------------------------------------------------------------
// Move / copy / delete
// ---------------------------------------------------------------------------

#[test]
fn move_copy_delete_through_sdk() {
    let (_dir, store) = open();
    let u1 = store.tenant("u1").unwrap();
    u1.mkdir("src").unwrap();
    u1.upload(b"one", "src/one.txt").unwrap();

    assert_eq!(u1.copy("src", "backup/src").unwrap(), 2);
    u1.move_to("src/one.txt", "archive/2024/one.txt").unwrap();
    assert_eq!(u1.read_text("archive/2024/one.txt").unwrap(), "one");
    assert_eq!(u1.read_text("backup/src/one.txt").unwrap(), "one");
    assert_eq!(
        u1.move_to("backup", "archive").unwrap_err().kind(),
        ErrorKind::AlreadyExists
    );

    assert_eq!(u1.delete("archive").unwrap(), 3);
    assert_eq!(child_names(&u1.list("").unwrap()), ["backup", "src"]);
    assert_eq!(u1.delete("archive").unwrap_err().kind(), ErrorKind::NotFound);
}

// ---------------------------------------------------------------------------
// Text editing and browsing
// ---------------------------------------------------------------------------

#[test]
fn text_files_can_be_edited_in_place() {
    let (_dir, store) = open();
    let u1 = store.tenant("u1").unwrap();
    u1.upload(b"draft", "notes.md").unwrap();
    let record = u1.write_text("notes.md", "# final\n").unwrap();
    assert_eq!(record.size, 8);
    assert_eq!(u1.read_text("notes.md").unwrap(), "# final\n");

    u1.upload(b"\x89PNG", "pic.png").unwrap();
    assert_eq!(u1.read_text("pic.png").unwrap_err().kind(), ErrorKind::Unsupported);
    assert_eq!(
        u1.write_text("pic.png", "nope").unwrap_err().kind(),
        ErrorKind::Unsupported
    );
    assert_eq!(
        u1.write_text("new.txt", "no implicit create").unwrap_err().kind(),
        ErrorKind::NotFound
    );
}

#[test]
fn recent_files_are_newest_first_and_paginated() {
    let (_dir, store) = open();
    let u1 = store.tenant("u1").unwrap();
    u1.mkdir("album").unwrap();
    for (i, name) in ["a.jpg", "b.mp4", "c.txt", "d.png", "album/e.jpg"].iter().enumerate() {
        u1.upload(name.as_bytes(), name).unwrap();
        let abs = u1.root().as_path().join(name);
        set_mtime(&abs, 1_000 * (5 - i as u64));
    }

    let all = u1.recent_files(None, PageRequest::new(1, 10)).unwrap();
    let paths: Vec<_> = all.items.iter().map(|r| r.path.as_str()).collect();
    assert_eq!(paths, ["album/e.jpg", "d.png", "c.txt", "b.mp4", "a.jpg"]);

    let images = u1.recent_files(Some(FileKind::Image), PageRequest::new(1, 2)).unwrap();
    assert_eq!(images.total_items, 3);
    assert_eq!(images.total_pages, 2);
    let names: Vec<_> = images.items.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, ["e.jpg", "d.png"]);

    let clamped = u1.recent_files(Some(FileKind::Image), PageRequest::new(7, 2)).unwrap();
    assert_eq!(clamped.page, 2);
    assert_eq!(clamped.items.len(), 1);
    assert_eq!(clamped.items[0].name, "a.jpg");
}

#[test]
fn listings_and_records_serialize_for_clients() {
    let (_dir, store) = open();
    let u1 = store.tenant("u1").unwrap();
    u1.mkdir("docs").unwrap();
    let record = u1.upload(b"hi", "docs/a.txt").unwrap();

    let json = serde_json::to_value(u1.list("").unwrap()).unwrap();
    assert_eq!(json["type"], "directory");
    assert_eq!(json["children"][0]["name"], "docs");
    assert_eq!(json["children"][0]["children"][0]["type"], "file");
    assert_eq!(json["children"][0]["children"][0]["path"], "docs/a.txt");

    let json = serde_json::to_value(&record).unwrap();
    assert_eq!(json["mime"], "text/plain");
    assert_eq!(json["digest"], ContentId::of(b"hi").to_hex());
}
