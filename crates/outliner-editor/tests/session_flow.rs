//! End-to-end tests for the session call pattern.
//!
//! Each test drives a [`Session`] over a [`MemorySurface`] with key gestures
//! only, then checks the committed tree through the reducer's state.

use outliner_editor::{Cursor, EditingSurface, KeyGesture, MemorySurface, Session};
use outliner_tree::{Reducer, Transition};
use outliner_types::{BlockData, BlockKind, NodeId};

// ============================================================================
// Shared test setup
// ============================================================================

fn seq_ids(prefix: &'static str) -> impl FnMut() -> NodeId {
    let mut n = 0;
    move || {
        n += 1;
        NodeId::from_string(format!("{prefix}{n}"))
    }
}

/// Root `t1` with child `t2` holding "hello", cursor at the end of it.
fn hello_session() -> Session<MemorySurface> {
    let reducer = Reducer::with_ids(seq_ids("t"));
    let mut session = Session::from_reducer(reducer, MemorySurface::new(), seq_ids("s")).unwrap();
    session.surface_mut().set_selection(Cursor::new(0, 0)).unwrap();
    session.key(KeyGesture::Text("hello".into())).unwrap();
    session
}

fn data_of(session: &Session<MemorySurface>, id: &str) -> Option<BlockData> {
    session
        .state()
        .tree
        .get(&NodeId::from(id))
        .unwrap()
        .data
        .clone()
}

// ============================================================================
// Push / pop
// ============================================================================

#[test]
fn test_push_into_new_block() {
    let mut session = hello_session();

    // Shift+Enter splits "hello|" into "hello" and a fresh empty block
    session.key(KeyGesture::ShiftEnter).unwrap();
    session.key(KeyGesture::Text("world".into())).unwrap();
    let batch = session.surface().value().to_vec();
    assert_eq!(batch.len(), 2);
    let new_id = batch[1].id.clone();
    assert_eq!(new_id, NodeId::from("s1"));

    let transition = session.key(KeyGesture::Push).unwrap().unwrap();
    let Transition::Merged { created, materialized, .. } = transition else {
        panic!("push should merge");
    };
    assert_eq!(created, vec![new_id.clone()]);

    let state = session.state();
    let root = state.root().clone();
    assert_eq!(state.current_node, new_id);
    assert_eq!(data_of(&session, "t2"), Some(BlockData::paragraph("hello")));
    assert_eq!(data_of(&session, "s1"), Some(BlockData::paragraph("world")));

    let node = state.tree.get(&new_id).unwrap();
    assert_eq!(node.parent.as_ref(), Some(&root));
    let z = materialized.unwrap();
    assert_eq!(node.children, vec![z.clone()]);
    assert_eq!(data_of(&session, z.as_str()), Some(BlockData::empty_paragraph()));
    state.tree.check_connectivity(&root).unwrap();

    // the surface now edits the new node's children
    let view = session.view().unwrap();
    assert_eq!(view.title.as_deref(), Some("world"));
    assert_eq!(session.surface().value().len(), 1);
    assert_eq!(session.surface().selection(), None);
}

#[test]
fn test_pop_commits_nested_edits() {
    let mut session = hello_session();
    session.key(KeyGesture::Push).unwrap();
    let hello = NodeId::from("t2");
    assert_eq!(session.state().current_node, hello);

    session.surface_mut().set_selection(Cursor::new(0, 0)).unwrap();
    session.key(KeyGesture::Text("nested".into())).unwrap();
    session.key(KeyGesture::Pop).unwrap();

    let state = session.state();
    assert_eq!(&state.current_node, state.root());
    let child = &state.tree.get(&hello).unwrap().children[0];
    assert_eq!(
        state.tree.get(child).unwrap().data,
        Some(BlockData::paragraph("nested"))
    );

    // pushing back in shows the committed edit
    session.surface_mut().set_selection(Cursor::new(0, 0)).unwrap();
    session.key(KeyGesture::Push).unwrap();
    assert_eq!(session.surface().value()[0].plain_text(), "nested");
}

#[test]
fn test_deleted_block_becomes_unreachable() {
    let mut session = hello_session();
    session.key(KeyGesture::ShiftEnter).unwrap();
    session.key(KeyGesture::Text("doomed".into())).unwrap();
    session.append_child().unwrap();
    assert_eq!(session.state().tree.get(session.state().root()).unwrap().children.len(), 3);

    // back up into "hello" and delete everything after it
    session.surface_mut().set_selection(Cursor::new(2, 0)).unwrap();
    session.key(KeyGesture::Backspace).unwrap();
    for _ in 0.."doomed".len() {
        session.key(KeyGesture::Backspace).unwrap();
    }
    session.key(KeyGesture::Backspace).unwrap();
    assert_eq!(session.surface().value().len(), 1);
    session.append_child().unwrap();

    let state = session.state();
    let root = state.root().clone();
    assert!(!state.tree.is_reachable(&root, &NodeId::from("s1")));
    state.tree.check_connectivity(&root).unwrap();
    assert!(session.sweep() >= 1);
}

// ============================================================================
// Code fences
// ============================================================================

#[test]
fn test_fence_enter_makes_code_block() {
    let mut session = hello_session();
    session.key(KeyGesture::ShiftEnter).unwrap();
    session.key(KeyGesture::Text("```js".into())).unwrap();
    session.key(KeyGesture::Enter).unwrap();

    let batch = session.surface().value();
    assert_eq!(batch.len(), 2);
    assert_eq!(batch[1].kind, BlockKind::Code);
    assert_eq!(batch[1].language.as_deref(), Some("js"));
    assert_eq!(batch[1].plain_text(), "");

    session.key(KeyGesture::Text("let x = 1;".into())).unwrap();
    session.surface_mut().set_selection(Cursor::new(0, 0)).unwrap();
    session.key(KeyGesture::Push).unwrap();

    let code = data_of(&session, "s1").unwrap();
    assert_eq!(code.kind, BlockKind::Code);
    assert_eq!(code.plain_text(), "let x = 1;");
}

// ============================================================================
// Dump / load
// ============================================================================

#[test]
fn test_dump_load_restores_focus() {
    let mut session = hello_session();
    session.key(KeyGesture::Push).unwrap();
    let dump = session.dump(true).unwrap();

    let mut other = Session::new(MemorySurface::new()).unwrap();
    other.load(&dump).unwrap();
    assert_eq!(other.state(), session.state());
    assert_eq!(other.view().unwrap().title.as_deref(), Some("hello"));
}
