//! Session: one reducer, one surface, and the call pattern between them.
//!
//! ```text
//!   key ──▶ SurfaceAdapter ──(edit)──▶ normalize, stay local
//!                 │
//!                 └─(push/pop)──▶ Reducer::dispatch(Merge) ──▶ refresh
//!                                                               │
//!   observers ◀── View { node, title, parent, batch } ◀─────────┘
//! ```
//!
//! The session never touches the tree directly; every state change goes
//! through [`Reducer::dispatch`]. After each successful transition it derives
//! a fresh [`View`], loads the view's batch into the surface and hands the
//! view to every observer.

use outliner_tree::{Action, Reducer, State, TreeError, Transition, normalize_block};
use outliner_types::{Block, BlockData, IdGenerator, NodeId, RandomIds};

use crate::adapter::{KeyGesture, NavigationRequest, SurfaceAdapter};
use crate::surface::EditingSurface;
use crate::Result;

/// What the surface should show for the focus node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct View {
    pub node: NodeId,
    /// Plain text of the focus node. `None` at the root.
    pub title: Option<String>,
    /// Target of the pop gesture. `None` at the root.
    pub parent: Option<NodeId>,
    /// The focus node's children, depth-tagged.
    pub batch: Vec<Block>,
}

type Observer = Box<dyn FnMut(&View)>;

pub struct Session<S> {
    reducer: Reducer,
    adapter: SurfaceAdapter<S>,
    observers: Vec<Observer>,
}

impl<S: EditingSurface> Session<S> {
    /// Fresh state and random ids.
    pub fn new(surface: S) -> Result<Self> {
        Self::from_reducer(Reducer::new(), surface, RandomIds)
    }

    /// Wrap an existing reducer. `ids` feeds split-id disambiguation.
    pub fn from_reducer(
        reducer: Reducer,
        surface: S,
        ids: impl IdGenerator + 'static,
    ) -> Result<Self> {
        let mut session = Self {
            reducer,
            adapter: SurfaceAdapter::new(surface, ids),
            observers: Vec::new(),
        };
        session.refresh()?;
        Ok(session)
    }

    pub fn reducer(&self) -> &Reducer {
        &self.reducer
    }

    pub fn state(&self) -> &State {
        self.reducer.state()
    }

    pub fn surface(&self) -> &S {
        self.adapter.surface()
    }

    pub fn surface_mut(&mut self) -> &mut S {
        self.adapter.surface_mut()
    }

    /// Register a callback invoked with every new view.
    pub fn subscribe(&mut self, observer: impl FnMut(&View) + 'static) {
        self.observers.push(Box::new(observer));
    }

    /// Derive the view of the focus node from the tree.
    pub fn view(&self) -> Result<View> {
        let state = self.reducer.state();
        let node = state.current()?;

        let batch = node
            .children
            .iter()
            .map(|id| -> Result<Block> {
                let data = state.tree.get(id)?.data.clone().ok_or_else(|| {
                    TreeError::Inconsistent(format!("child {id} carries no data"))
                })?;
                let mut block = Block::from_data(id.clone(), data);
                normalize_block(&mut block);
                Ok(block)
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(View {
            node: state.current_node.clone(),
            title: node.data.as_ref().map(BlockData::plain_text),
            parent: node.parent.clone(),
            batch,
        })
    }

    /// Give a childless focus node its placeholder child.
    pub fn ensure_focus_children(&mut self) -> Result<Option<NodeId>> {
        let current = self.reducer.current_node().clone();
        match self.reducer.dispatch(Action::EnsureChildren(current))? {
            Transition::ChildrenEnsured { created, .. } => Ok(created),
            _ => Ok(None),
        }
    }

    /// Re-derive the view, load it into the surface and notify observers.
    pub fn refresh(&mut self) -> Result<View> {
        self.ensure_focus_children()?;
        let view = self.view()?;

        let tree = &self.reducer.state().tree;
        self.adapter.load(view.batch.clone(), &|id| tree.contains(id));

        for observer in &mut self.observers {
            observer(&view);
        }
        Ok(view)
    }

    /// Route a key gesture. Returns the transition if it navigated.
    pub fn key(&mut self, gesture: KeyGesture) -> Result<Option<Transition>> {
        let has_parent = self.reducer.state().current()?.parent.is_some();
        let tree = &self.reducer.state().tree;
        let request = self
            .adapter
            .handle_key(gesture, has_parent, &|id| tree.contains(id))?;

        match request {
            None => Ok(None),
            Some(NavigationRequest::Push(target)) => self.push(target).map(Some),
            Some(NavigationRequest::Pop) => self.pop(),
        }
    }

    /// Commit the local batch and focus `target`.
    pub fn push(&mut self, target: NodeId) -> Result<Transition> {
        let batch = self.adapter.batch();
        let transition = self.reducer.dispatch(Action::Merge { target, batch })?;
        self.refresh()?;
        Ok(transition)
    }

    /// Commit the local batch and focus the parent. `None` at the root.
    pub fn pop(&mut self) -> Result<Option<Transition>> {
        match self.reducer.state().current()?.parent.clone() {
            Some(parent) => self.push(parent).map(Some),
            None => Ok(None),
        }
    }

    /// Commit the local batch, then append an empty child to the focus node.
    pub fn append_child(&mut self) -> Result<Transition> {
        let current = self.reducer.current_node().clone();
        let batch = self.adapter.batch();
        self.reducer.dispatch(Action::Merge {
            target: current.clone(),
            batch,
        })?;
        let transition = self.reducer.dispatch(Action::AppendChild(current))?;
        self.refresh()?;
        Ok(transition)
    }

    /// Text dump of the committed state. Uncommitted surface edits are not
    /// included.
    pub fn dump(&self, pretty: bool) -> Result<String> {
        Ok(self.reducer.state().to_json(pretty)?)
    }

    /// Replace the state from a dump. On error nothing changes.
    pub fn load(&mut self, text: &str) -> Result<Transition> {
        let transition = self.reducer.load_json(text)?;
        self.refresh()?;
        Ok(transition)
    }

    /// Drop nodes no longer reachable from the root.
    pub fn sweep(&mut self) -> usize {
        let removed = self.reducer.sweep();
        tracing::debug!(removed, "swept unreachable nodes");
        removed
    }
}

impl<S: std::fmt::Debug> std::fmt::Debug for Session<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("reducer", &self.reducer)
            .field("adapter", &self.adapter)
            .field("observers", &self.observers.len())
            .finish()
    }
}
