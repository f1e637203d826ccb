mod common;
use common::*;

use pretty_assertions::assert_eq;
use std::thread;

#[test]
fn actions_from_one_producer_apply_in_order() {
    let fx = Fixture::start();
    let id = fx.actions().ed_new_view().unwrap();
    for word in ["a", "b", "c", "d"] {
        fx.actions().view_insert_cur(id, word);
    }
    fx.actions().view_backspace(id);
    assert_eq!(fx.line(id, 1), "abc");
    fx.finish();
}

#[test]
fn concurrent_producers_never_lose_edits() {
    let fx = Fixture::start();
    let id = fx.actions().ed_new_view().unwrap();
    thread::scope(|s| {
        for c in ["w", "x", "y", "z"] {
            let actions = fx.actions();
            s.spawn(move || {
                for _ in 0..50 {
                    actions.view_insert(id, 1, 1, c, true);
                }
            });
        }
    });
    assert!(fx.actions().ed_flush());
    let line = fx.line(id, 1);
    assert_eq!(line.chars().count(), 200);
    for c in ['w', 'x', 'y', 'z'] {
        assert_eq!(line.chars().filter(|&r| r == c).count(), 50);
    }
    assert_eq!(fx.actions().view_undo_depth(id), (200, 0));
    fx.finish();
}

#[test]
fn undo_redo_through_the_bus() {
    let fx = Fixture::start();
    let id = fx.open_file1();
    let v = vid(id);
    fx.actions().view_set_cursor_pos(id, 1, 3);
    fx.call("view_insert_cur", &[&v, "FOO\nBAR"]);
    assert_eq!(fx.line(id, 1), "12FOO");
    assert_eq!(fx.line(id, 2), "BAR34567890");
    assert_eq!(fx.call("view_cursor_pos", &[&v]), ["2", "4"]);

    fx.call("view_undo", &[&v]);
    assert_eq!(fx.line(id, 1), "1234567890");
    assert_eq!(fx.call("view_cursor_pos", &[&v]), ["1", "3"]);
    assert_eq!(fx.actions().view_undo_depth(id), (0, 1));

    fx.call("view_redo", &[&v]);
    assert_eq!(fx.line(id, 2), "BAR34567890");
    assert_eq!(fx.call("view_cursor_pos", &[&v]), ["2", "4"]);

    // a fresh edit drops the redo branch
    fx.call("view_undo", &[&v]);
    fx.call("view_insert_cur", &[&v, "Q"]);
    assert_eq!(fx.actions().view_undo_depth(id), (1, 0));
    fx.call("view_redo", &[&v]);
    assert_eq!(fx.line(id, 1), "12Q34567890");
    fx.finish();
}

#[test]
fn select_all_then_cut_empties_the_view() {
    let fx = Fixture::start();
    let id = fx.open_file1();
    let v = vid(id);
    fx.call("view_select_all", &[&v]);
    assert_eq!(fx.call("view_selections", &[&v]), ["1 1 12 3"]);
    fx.call("view_cut", &[&v]);
    assert_eq!(fx.call("view_text", &[&v, "1", "1", "-1", "-1"]), [""]);
    fx.call("view_undo", &[&v]);
    let all: Vec<&str> = FILE1.split('\n').collect();
    assert_eq!(fx.call("view_text", &[&v, "1", "1", "-1", "-1"]), all);
    fx.finish();
}
