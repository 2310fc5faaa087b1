//! # Category Tree
//!
//! In-memory index over the flat `categories` rows.
//!
//! ```text
//!   nodes:    id ──► Category { parent_id, sort_order, .. }
//!   children: parent_id (None = root) ──► [child ids]
//!
//!   Clothing (depth 1)
//!   ├── Men (2)
//!   │   └── Shirts (3)
//!   └── Women (2)
//! ```
//!
//! The database stores only parent pointers. Repository code loads every row,
//! builds a [`CategoryTree`], runs the structural check here, and writes the
//! resulting changes back inside one transaction.

use std::collections::HashMap;

use serde::Serialize;

use crate::error::{CoreError, CoreResult};
use crate::types::Category;
use crate::MAX_CATEGORY_DEPTH;

/// A category with its children, for the nested listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryNode {
    #[serde(flatten)]
    pub category: Category,
    pub children: Vec<CategoryNode>,
}

#[derive(Debug, Clone, Default)]
pub struct CategoryTree {
    nodes: HashMap<String, Category>,
    children: HashMap<Option<String>, Vec<String>>,
}

impl CategoryTree {
    /// Builds the index. Rows pointing at a missing parent are rejected.
    pub fn from_categories(categories: Vec<Category>) -> CoreResult<Self> {
        let mut tree = CategoryTree::default();

        for category in categories {
            tree.children
                .entry(category.parent_id.clone())
                .or_default()
                .push(category.id.clone());
            tree.nodes.insert(category.id.clone(), category);
        }

        for category in tree.nodes.values() {
            if let Some(parent) = &category.parent_id {
                if !tree.nodes.contains_key(parent) {
                    return Err(CoreError::CategoryNotFound(parent.clone()));
                }
            }
        }

        Ok(tree)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Category> {
        self.nodes.get(id)
    }

    /// Children of `parent` (or the roots for `None`), by sort order then name.
    pub fn children(&self, parent: Option<&str>) -> Vec<&Category> {
        let key = parent.map(str::to_string);
        let mut out: Vec<&Category> = self
            .children
            .get(&key)
            .map(|ids| ids.iter().filter_map(|id| self.nodes.get(id)).collect())
            .unwrap_or_default();
        out.sort_by(|a, b| a.sort_order.cmp(&b.sort_order).then_with(|| a.name.cmp(&b.name)));
        out
    }

    pub fn roots(&self) -> Vec<&Category> {
        self.children(None)
    }

    /// Parents of `id`, nearest first.
    pub fn ancestors(&self, id: &str) -> Vec<&Category> {
        let mut out = Vec::new();
        let mut current = self.nodes.get(id).and_then(|c| c.parent_id.as_deref());

        while let Some(parent_id) = current {
            match self.nodes.get(parent_id) {
                Some(parent) => {
                    out.push(parent);
                    current = parent.parent_id.as_deref();
                }
                None => break,
            }
            // A corrupt parent chain must not spin forever.
            if out.len() > self.nodes.len() {
                break;
            }
        }

        out
    }

    /// 1 for a root category.
    pub fn depth(&self, id: &str) -> Option<usize> {
        self.nodes.get(id).map(|_| self.ancestors(id).len() + 1)
    }

    /// Every id below `id`, excluding `id` itself, parents before children.
    pub fn descendants(&self, id: &str) -> Vec<String> {
        let mut out = Vec::new();
        let mut stack = vec![id.to_string()];

        while let Some(current) = stack.pop() {
            if let Some(kids) = self.children.get(&Some(current)) {
                for kid in kids {
                    out.push(kid.clone());
                    stack.push(kid.clone());
                }
            }
        }

        out
    }

    /// Levels in the subtree rooted at `id` (1 for a leaf).
    fn height(&self, id: &str) -> usize {
        let key = Some(id.to_string());
        self.children
            .get(&key)
            .map(|kids| kids.iter().map(|k| self.height(k)).max().unwrap_or(0))
            .unwrap_or(0)
            + 1
    }

    fn parent_depth(&self, parent: Option<&str>) -> CoreResult<usize> {
        match parent {
            None => Ok(0),
            Some(p) => self
                .depth(p)
                .ok_or_else(|| CoreError::CategoryNotFound(p.to_string())),
        }
    }

    /// Adds a new category under its `parent_id`.
    pub fn insert(&mut self, category: Category) -> CoreResult<()> {
        let parent_depth = self.parent_depth(category.parent_id.as_deref())?;
        if parent_depth + 1 > MAX_CATEGORY_DEPTH {
            return Err(CoreError::CategoryTooDeep {
                max: MAX_CATEGORY_DEPTH,
            });
        }

        self.children
            .entry(category.parent_id.clone())
            .or_default()
            .push(category.id.clone());
        self.nodes.insert(category.id.clone(), category);
        Ok(())
    }

    /// Re-parents `id` under `new_parent` (`None` = make it a root).
    ///
    /// ## Errors
    /// - `CategoryNotFound` if either id is unknown
    /// - `CategoryCycle` if `new_parent` is `id` or one of its descendants
    /// - `CategoryTooDeep` if the moved subtree would exceed the depth limit
    pub fn move_to(&mut self, id: &str, new_parent: Option<&str>) -> CoreResult<()> {
        let old_parent = self
            .nodes
            .get(id)
            .ok_or_else(|| CoreError::CategoryNotFound(id.to_string()))?
            .parent_id
            .clone();

        if let Some(target) = new_parent {
            if target == id || self.descendants(id).iter().any(|d| d == target) {
                return Err(CoreError::CategoryCycle {
                    id: id.to_string(),
                    target: target.to_string(),
                });
            }
        }

        let parent_depth = self.parent_depth(new_parent)?;
        if parent_depth + self.height(id) > MAX_CATEGORY_DEPTH {
            return Err(CoreError::CategoryTooDeep {
                max: MAX_CATEGORY_DEPTH,
            });
        }

        if let Some(siblings) = self.children.get_mut(&old_parent) {
            siblings.retain(|s| s != id);
        }
        let new_parent = new_parent.map(str::to_string);
        self.children
            .entry(new_parent.clone())
            .or_default()
            .push(id.to_string());
        if let Some(node) = self.nodes.get_mut(id) {
            node.parent_id = new_parent;
        }

        Ok(())
    }

    /// Removes `id` and its whole subtree.
    ///
    /// ## Returns
    /// Removed ids, deepest first, so callers can delete rows child-before-parent.
    pub fn remove(&mut self, id: &str) -> CoreResult<Vec<String>> {
        let parent = self
            .nodes
            .get(id)
            .ok_or_else(|| CoreError::CategoryNotFound(id.to_string()))?
            .parent_id
            .clone();

        let mut removed = vec![id.to_string()];
        removed.extend(self.descendants(id));
        removed.reverse();

        for gone in &removed {
            self.nodes.remove(gone);
            self.children.remove(&Some(gone.clone()));
        }
        if let Some(siblings) = self.children.get_mut(&parent) {
            siblings.retain(|s| s != id);
        }

        Ok(removed)
    }

    /// The whole forest, roots first, each level ordered like [`children`](Self::children).
    pub fn nested(&self) -> Vec<CategoryNode> {
        self.nested_under(None)
    }

    fn nested_under(&self, parent: Option<&str>) -> Vec<CategoryNode> {
        self.children(parent)
            .into_iter()
            .map(|c| CategoryNode {
                category: c.clone(),
                children: self.nested_under(Some(&c.id)),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn cat(id: &str, parent: Option<&str>, sort_order: i64) -> Category {
        let now = Utc::now();
        Category {
            id: id.to_string(),
            name: id.to_string(),
            parent_id: parent.map(str::to_string),
            sort_order,
            created_at: now,
            updated_at: now,
        }
    }

    /// clothing ─┬─ men ── shirts
    ///           └─ women
    /// home
    fn sample() -> CategoryTree {
        CategoryTree::from_categories(vec![
            cat("clothing", None, 0),
            cat("home", None, 1),
            cat("men", Some("clothing"), 0),
            cat("women", Some("clothing"), 1),
            cat("shirts", Some("men"), 0),
        ])
        .unwrap()
    }

    fn ids(cats: Vec<&Category>) -> Vec<&str> {
        cats.into_iter().map(|c| c.id.as_str()).collect()
    }

    #[test]
    fn test_structure_queries() {
        let tree = sample();
        assert_eq!(ids(tree.roots()), vec!["clothing", "home"]);
        assert_eq!(ids(tree.children(Some("clothing"))), vec!["men", "women"]);
        assert_eq!(ids(tree.ancestors("shirts")), vec!["men", "clothing"]);
        assert_eq!(tree.depth("shirts"), Some(3));
        assert_eq!(tree.depth("home"), Some(1));
        assert_eq!(tree.depth("nope"), None);
    }

    #[test]
    fn test_dangling_parent_rejected() {
        let result = CategoryTree::from_categories(vec![cat("a", Some("ghost"), 0)]);
        assert!(matches!(result, Err(CoreError::CategoryNotFound(ref id)) if id == "ghost"));
    }

    #[test]
    fn test_move_under_descendant_rejected() {
        let mut tree = sample();
        let err = tree.move_to("clothing", Some("shirts")).unwrap_err();
        assert!(matches!(err, CoreError::CategoryCycle { .. }));

        let err = tree.move_to("men", Some("men")).unwrap_err();
        assert!(matches!(err, CoreError::CategoryCycle { .. }));

        // Unchanged after a rejected move.
        assert_eq!(tree.depth("shirts"), Some(3));
    }

    #[test]
    fn test_move_reparents_subtree() {
        let mut tree = sample();
        tree.move_to("men", Some("home")).unwrap();

        assert_eq!(ids(tree.children(Some("clothing"))), vec!["women"]);
        assert_eq!(ids(tree.children(Some("home"))), vec!["men"]);
        assert_eq!(ids(tree.ancestors("shirts")), vec!["men", "home"]);

        tree.move_to("men", None).unwrap();
        assert_eq!(tree.depth("men"), Some(1));
    }

    #[test]
    fn test_depth_limit() {
        let mut tree = CategoryTree::default();
        tree.insert(cat("l1", None, 0)).unwrap();
        tree.insert(cat("l2", Some("l1"), 0)).unwrap();
        tree.insert(cat("l3", Some("l2"), 0)).unwrap();
        tree.insert(cat("l4", Some("l3"), 0)).unwrap();
        tree.insert(cat("l5", Some("l4"), 0)).unwrap();

        let err = tree.insert(cat("l6", Some("l5"), 0)).unwrap_err();
        assert!(matches!(err, CoreError::CategoryTooDeep { max: 5 }));

        // Moving a two-level subtree under depth 4 would make depth 6.
        tree.insert(cat("x", None, 1)).unwrap();
        tree.insert(cat("y", Some("x"), 0)).unwrap();
        assert!(tree.move_to("x", Some("l4")).is_err());
        assert!(tree.move_to("x", Some("l3")).is_ok());
    }

    #[test]
    fn test_remove_subtree_deepest_first() {
        let mut tree = sample();
        let removed = tree.remove("clothing").unwrap();

        assert_eq!(removed.len(), 4);
        assert_eq!(removed.last().map(String::as_str), Some("clothing"));
        let shirts = removed.iter().position(|id| id == "shirts").unwrap();
        let men = removed.iter().position(|id| id == "men").unwrap();
        assert!(shirts < men);

        assert_eq!(ids(tree.roots()), vec!["home"]);
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn test_nested_listing() {
        let tree = sample();
        let nested = tree.nested();
        assert_eq!(nested.len(), 2);
        assert_eq!(nested[0].category.id, "clothing");
        assert_eq!(nested[0].children[0].children[0].category.id, "shirts");

        let json = serde_json::to_value(&nested[0]).unwrap();
        assert_eq!(json["name"], "clothing");
        assert!(json["children"].is_array());
    }
}
