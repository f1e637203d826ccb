mod common;
use common::*;

use core_actions::{ApiError, call};
use pretty_assertions::assert_eq;
use std::time::Duration;

#[test]
fn open_missing_file_fails_unless_created() {
    let fx = Fixture::start();
    let dir = fx.dir.path().display().to_string();
    let err = call(fx.actions(), "ed_open", &["nope.txt", "-1", &dir, "false"]).unwrap_err();
    let ApiError::Failed { action, msg } = err else {
        panic!("expected a failure, got {err:?}");
    };
    assert_eq!(action, "ed_open");
    assert!(msg.contains("nope.txt"), "{msg}");
    assert!(fx.actions().ed_status().is_err);
    assert!(fx.actions().ed_views().is_empty());

    let out = fx.call("ed_open", &["new.txt", "-1", &dir, "true"]);
    assert_eq!(out.len(), 1);
    assert!(fx.dir.path().join("new.txt").exists());
    let v = &out[0];
    assert_eq!(fx.call("view_title", &[v]), ["new.txt"]);
    assert_eq!(fx.call("view_work_dir", &[v]), [dir.clone()]);
    assert_eq!(fx.call("view_line_count", &[v]), ["0"]);
    assert!(!fx.actions().ed_status().is_err);
    fx.finish();
}

#[test]
fn open_rejects_binary_content() {
    let fx = Fixture::start();
    let bin = fx.dir.path().join("blob.bin");
    std::fs::write(&bin, [0x7f, b'E', b'L', b'F', 0, 1, 2]).unwrap();
    let err = fx
        .actions()
        .ed_open(bin.to_str().unwrap(), None, fx.dir.path(), false)
        .unwrap_err();
    assert!(format!("{err:#}").contains("binary file"));
    let status = fx.actions().ed_status();
    assert!(status.is_err);
    assert!(status.msg.contains("binary file"));
    fx.finish();
}

#[test]
fn open_into_existing_view_replaces_its_content() {
    let fx = Fixture::start();
    std::fs::write(fx.dir.path().join("other.txt"), "other\n").unwrap();
    let id = fx.open_file1();
    fx.actions().view_set_cursor_pos(id, 4, 4);
    fx.actions().view_set_dirty(id, true);
    let reopened = fx
        .actions()
        .ed_open("other.txt", Some(id), fx.dir.path(), false)
        .unwrap();
    assert_eq!(reopened, id);
    assert_eq!(fx.actions().ed_views(), vec![id]);
    assert_eq!(fx.actions().view_title(id), "other.txt");
    assert_eq!(fx.line(id, 1), "other");
    assert_eq!(fx.call("view_cursor_pos", &[&vid(id)]), ["1", "1"]);
    assert!(!fx.actions().view_dirty(id));
    fx.finish();
}

#[test]
fn open_into_unknown_view_fails() {
    let fx = Fixture::start();
    let dir = fx.dir.path().display().to_string();
    let err = call(fx.actions(), "ed_open", &["file1.txt", "42", &dir]).unwrap_err();
    assert!(matches!(err, ApiError::Failed { .. }));
    assert!(fx.actions().ed_views().is_empty());
    fx.finish();
}

#[test]
fn views_activate_and_current() {
    let fx = Fixture::start();
    assert_eq!(fx.call("ed_cur_view", &[]), ["0"]);
    let a = fx.open_file1();
    let b = fx.call("ed_new_view", &[]);
    let b = &b[0];
    assert_eq!(fx.call("ed_views", &[]), [vid(a), b.clone()]);
    assert_eq!(fx.call("ed_cur_view", &[]), [vid(a)]);
    fx.call("ed_activate_view", &[b]);
    assert_eq!(fx.call("ed_cur_view", &[]), [b.clone()]);
    // unknown ids leave the current view alone
    fx.call("ed_activate_view", &["77"]);
    assert_eq!(fx.call("ed_cur_view", &[]), [b.clone()]);
    assert_eq!(fx.call("view_title", &[b]), [""]);
    fx.finish();
}

#[test]
fn closing_dirty_view_needs_confirmation() {
    let fx = Fixture::start();
    let a = fx.open_file1();
    let b = fx.call("ed_new_view", &[])[0].clone();
    fx.call("ed_activate_view", &[&b]);
    fx.call("view_insert_cur", &[&b, "draft"]);
    assert_eq!(fx.call("view_dirty", &[&b]), ["true"]);
    assert_eq!(fx.call("ed_quit_check", &[]), ["false"]);

    fx.call("ed_del_view", &[&b]);
    assert_eq!(fx.call("ed_views", &[]).len(), 2);
    let status = fx.actions().ed_status();
    assert!(status.is_err);
    assert!(status.msg.starts_with("unsaved changes"), "{}", status.msg);

    fx.call("ed_del_view", &[&b, "false"]);
    assert_eq!(fx.call("ed_views", &[]), [vid(a)]);
    assert_eq!(fx.call("ed_cur_view", &[]), [vid(a)]);
    assert_eq!(fx.call("ed_quit_check", &[]), ["true"]);
    fx.finish();
}

#[test]
fn status_line_messages() {
    let fx = Fixture::start();
    fx.call("ed_set_status", &["hello", "world"]);
    assert_eq!(fx.call("ed_status", &[]), ["hello world", "false"]);
    fx.call("ed_set_status_err", &["bad"]);
    assert_eq!(fx.call("ed_status", &[]), ["bad", "true"]);
    fx.finish();
}

#[test]
fn failed_actions_surface_on_the_status_line() {
    let fx = Fixture::start();
    let v = fx.call("ed_new_view", &[])[0].clone();
    fx.call("view_save", &[&v]);
    let status = fx.actions().ed_status();
    assert!(status.is_err);
    assert!(status.msg.starts_with("saving failed"), "{}", status.msg);
    assert!(fx.actions().ed_flush());
    fx.finish();
}

#[test]
fn shutdown_hands_back_the_editor() {
    let fx = Fixture::start();
    let id = fx.open_file1();
    fx.actions().view_insert(id, 1, 1, "X", true);
    let Fixture { ws, dir, .. } = fx;
    let editor = ws.shutdown().unwrap();
    assert_eq!(editor.view_ids(), vec![id]);
    assert!(editor.view(id).unwrap().dirty());
    drop(dir);
}

#[cfg(unix)]
#[test]
fn directories_open_as_listings() {
    let fx = Fixture::start();
    let sub = fx.dir.path().join("sub");
    std::fs::create_dir(&sub).unwrap();
    std::fs::write(sub.join("a.txt"), "a").unwrap();
    std::fs::write(sub.join("b.txt"), "b").unwrap();
    let id = fx
        .actions()
        .ed_open("sub", None, fx.dir.path(), false)
        .unwrap();
    assert!(wait_for(Duration::from_secs(10), || {
        fx.actions().view_title(id) == "sub/"
    }));
    assert_eq!(fx.actions().view_work_dir(id), sub);
    let listing = fx.actions().view_text(id, 1, 1, None, None);
    for name in [".", "..", "a.txt", "b.txt"] {
        assert!(listing.iter().any(|l| l.trim() == name), "{listing:?}");
    }
    assert!(wait_for(Duration::from_secs(5), || {
        let pos = fx.actions().view_cursor_pos(id);
        (pos.line, pos.col) == (1, 1)
    }));
    fx.finish();
}
