//! In-memory mock implementations of the remote collaborator traits,
//! shared by the service test modules. Failure injection is one-shot:
//! `fail_next` trips exactly one call, so tests can assert that an aborted
//! operation left local state untouched.

use crate::models::{
    ApplyOutcome, CreateNodeInput, GenerationTask, LinkGraph, LinkPlan, NodeUpdate, PlannedLink,
    SitemapNode,
};
use crate::services::remote::{LinkStore, NodeStore, TaskStore};
use anyhow::bail;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

pub(crate) fn make_node(id: i64, parent_id: Option<i64>, order: i64) -> SitemapNode {
    SitemapNode {
        id,
        sitemap_id: 1,
        title: format!("Node {id}"),
        slug: format!("node-{id}"),
        description: None,
        content_type: "page".to_string(),
        keywords: Vec::new(),
        position_x: id as f64 * 10.0,
        position_y: id as f64 * 20.0,
        order,
        is_root: parent_id.is_none() && id == 1,
        status: Default::default(),
        parent_id,
    }
}

#[derive(Default)]
pub(crate) struct MockNodeState {
    pub nodes: HashMap<i64, SitemapNode>,
    pub next_id: i64,
    pub fail_next: bool,
    pub delete_calls: Vec<i64>,
}

/// Mock remote node service. Mirrors the server-side contracts the core
/// relies on: ids are minted monotonically, and deleting a node re-parents
/// its children up one level.
#[derive(Default)]
pub(crate) struct MockNodeStore {
    pub state: Mutex<MockNodeState>,
}

impl MockNodeStore {
    pub fn seeded(nodes: Vec<SitemapNode>) -> Self {
        let next_id = nodes.iter().map(|n| n.id).max().unwrap_or(0) + 1;
        let store = Self::default();
        {
            let mut state = store.state.lock().unwrap();
            state.next_id = next_id;
            state.nodes = nodes.into_iter().map(|n| (n.id, n)).collect();
        }
        store
    }

    pub fn fail_next(&self) {
        self.state.lock().unwrap().fail_next = true;
    }

    pub fn node(&self, id: i64) -> Option<SitemapNode> {
        self.state.lock().unwrap().nodes.get(&id).cloned()
    }

    pub fn node_count(&self) -> usize {
        self.state.lock().unwrap().nodes.len()
    }

    fn check_failure(&self) -> anyhow::Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.fail_next {
            state.fail_next = false;
            bail!("injected remote failure");
        }
        Ok(())
    }
}

#[async_trait]
impl NodeStore for MockNodeStore {
    async fn create_node(&self, input: CreateNodeInput) -> anyhow::Result<SitemapNode> {
        self.create_node_at(input, 0.0, 0.0).await
    }

    async fn create_node_at(
        &self,
        input: CreateNodeInput,
        x: f64,
        y: f64,
    ) -> anyhow::Result<SitemapNode> {
        self.check_failure()?;
        let mut state = self.state.lock().unwrap();
        let id = state.next_id;
        state.next_id += 1;
        let order = input.order.unwrap_or_else(|| {
            state
                .nodes
                .values()
                .filter(|n| n.parent_id == input.parent_id)
                .map(|n| n.order + 1)
                .max()
                .unwrap_or(0)
        });
        let node = SitemapNode {
            id,
            sitemap_id: input.sitemap_id,
            title: input.title,
            slug: input.slug,
            description: input.description,
            content_type: input.content_type,
            keywords: input.keywords,
            position_x: x,
            position_y: y,
            order,
            is_root: false,
            status: Default::default(),
            parent_id: input.parent_id,
        };
        state.nodes.insert(id, node.clone());
        Ok(node)
    }

    async fn delete_node(&self, id: i64) -> anyhow::Result<()> {
        self.check_failure()?;
        let mut state = self.state.lock().unwrap();
        state.delete_calls.push(id);
        let Some(removed) = state.nodes.remove(&id) else {
            bail!("delete of unknown node {id}");
        };
        // Server-side semantics: children climb one level.
        for node in state.nodes.values_mut() {
            if node.parent_id == Some(id) {
                node.parent_id = removed.parent_id;
            }
        }
        Ok(())
    }

    async fn update_node(&self, id: i64, update: NodeUpdate) -> anyhow::Result<()> {
        self.check_failure()?;
        let mut state = self.state.lock().unwrap();
        let Some(node) = state.nodes.get_mut(&id) else {
            bail!("update of unknown node {id}");
        };
        update.apply_to(node);
        Ok(())
    }

    async fn move_node(&self, id: i64, new_parent_id: Option<i64>) -> anyhow::Result<()> {
        self.check_failure()?;
        let mut state = self.state.lock().unwrap();
        let Some(node) = state.nodes.get_mut(&id) else {
            bail!("move of unknown node {id}");
        };
        node.parent_id = new_parent_id;
        Ok(())
    }

    async fn update_position(&self, id: i64, x: f64, y: f64) -> anyhow::Result<()> {
        self.check_failure()?;
        let mut state = self.state.lock().unwrap();
        let Some(node) = state.nodes.get_mut(&id) else {
            bail!("position update of unknown node {id}");
        };
        node.position_x = x;
        node.position_y = y;
        Ok(())
    }

    async fn list_nodes(&self, sitemap_id: i64) -> anyhow::Result<Vec<SitemapNode>> {
        self.check_failure()?;
        let state = self.state.lock().unwrap();
        let mut nodes: Vec<SitemapNode> = state
            .nodes
            .values()
            .filter(|n| n.sitemap_id == sitemap_id)
            .cloned()
            .collect();
        nodes.sort_by_key(|n| n.id);
        Ok(nodes)
    }
}

#[derive(Default)]
pub(crate) struct MockLinkState {
    pub links: HashMap<i64, PlannedLink>,
    pub next_id: i64,
    pub fail_next: bool,
    /// Link ids the next `apply_links` call reports as failed.
    pub apply_failures: HashSet<i64>,
}

#[derive(Default)]
pub(crate) struct MockLinkStore {
    pub state: Mutex<MockLinkState>,
}

impl MockLinkStore {
    pub fn fail_next(&self) {
        self.state.lock().unwrap().fail_next = true;
    }

    pub fn fail_apply_for(&self, link_ids: impl IntoIterator<Item = i64>) {
        self.state.lock().unwrap().apply_failures = link_ids.into_iter().collect();
    }

    fn check_failure(&self) -> anyhow::Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.fail_next {
            state.fail_next = false;
            bail!("injected remote failure");
        }
        Ok(())
    }
}

#[async_trait]
impl LinkStore for MockLinkStore {
    async fn get_or_create_active_plan(
        &self,
        sitemap_id: i64,
        site_id: i64,
    ) -> anyhow::Result<LinkPlan> {
        self.check_failure()?;
        Ok(LinkPlan {
            id: 1,
            sitemap_id,
            site_id,
        })
    }

    async fn list_links(&self, _plan_id: i64) -> anyhow::Result<Vec<PlannedLink>> {
        self.check_failure()?;
        let state = self.state.lock().unwrap();
        let mut links: Vec<PlannedLink> = state.links.values().cloned().collect();
        links.sort_by_key(|l| l.id);
        Ok(links)
    }

    async fn add_link(&self, mut link: PlannedLink) -> anyhow::Result<PlannedLink> {
        self.check_failure()?;
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        link.id = state.next_id;
        state.links.insert(link.id, link.clone());
        Ok(link)
    }

    async fn remove_link(&self, id: i64) -> anyhow::Result<()> {
        self.check_failure()?;
        self.state.lock().unwrap().links.remove(&id);
        Ok(())
    }

    async fn approve_link(&self, _id: i64) -> anyhow::Result<()> {
        self.check_failure()?;
        Ok(())
    }

    async fn reject_link(&self, _id: i64) -> anyhow::Result<()> {
        self.check_failure()?;
        Ok(())
    }

    async fn apply_links(
        &self,
        _plan_id: i64,
        link_ids: Vec<i64>,
        _provider_id: i64,
    ) -> anyhow::Result<ApplyOutcome> {
        self.check_failure()?;
        let state = self.state.lock().unwrap();
        let mut outcome = ApplyOutcome {
            total: link_ids.len(),
            ..Default::default()
        };
        for id in link_ids {
            if state.apply_failures.contains(&id) {
                outcome.failed.push(id);
            } else {
                outcome.applied.push(id);
            }
        }
        Ok(outcome)
    }

    async fn get_link_graph(&self, _plan_id: i64) -> anyhow::Result<LinkGraph> {
        self.check_failure()?;
        let state = self.state.lock().unwrap();
        let links: Vec<PlannedLink> = state.links.values().cloned().collect();
        Ok(LinkGraph::derive(&links))
    }
}

#[derive(Default)]
pub(crate) struct MockTaskState {
    pub active: Vec<GenerationTask>,
    pub pause_calls: Vec<String>,
    pub resume_calls: Vec<String>,
    pub cancel_calls: Vec<String>,
    pub fail_next: bool,
}

#[derive(Default)]
pub(crate) struct MockTaskStore {
    pub state: Mutex<MockTaskState>,
}

impl MockTaskStore {
    pub fn with_active(tasks: Vec<GenerationTask>) -> Self {
        let store = Self::default();
        store.state.lock().unwrap().active = tasks;
        store
    }

    pub fn fail_next(&self) {
        self.state.lock().unwrap().fail_next = true;
    }

    fn check_failure(&self) -> anyhow::Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.fail_next {
            state.fail_next = false;
            bail!("injected remote failure");
        }
        Ok(())
    }
}

#[async_trait]
impl TaskStore for MockTaskStore {
    async fn list_active_tasks(&self, sitemap_id: i64) -> anyhow::Result<Vec<GenerationTask>> {
        self.check_failure()?;
        let state = self.state.lock().unwrap();
        Ok(state
            .active
            .iter()
            .filter(|t| t.sitemap_id == sitemap_id)
            .cloned()
            .collect())
    }

    async fn get_task(&self, id: &str) -> anyhow::Result<GenerationTask> {
        self.check_failure()?;
        let state = self.state.lock().unwrap();
        state
            .active
            .iter()
            .find(|t| t.id == id)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("unknown task {id}"))
    }

    async fn pause(&self, id: &str) -> anyhow::Result<()> {
        self.check_failure()?;
        self.state.lock().unwrap().pause_calls.push(id.to_string());
        Ok(())
    }

    async fn resume(&self, id: &str) -> anyhow::Result<()> {
        self.check_failure()?;
        self.state.lock().unwrap().resume_calls.push(id.to_string());
        Ok(())
    }

    async fn cancel(&self, id: &str) -> anyhow::Result<()> {
        self.check_failure()?;
        self.state.lock().unwrap().cancel_calls.push(id.to_string());
        Ok(())
    }
}
