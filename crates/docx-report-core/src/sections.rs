//! Section records and the content tree built from them.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::outline::OutlineNode;

/// A persisted, parent-linked section of a template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionRecord {
    pub id: i64,
    #[serde(default)]
    pub parent_id: Option<i64>,
    pub title: String,
    pub section_key: String,
    #[serde(default)]
    pub sort_order: i32,
}

/// A titled section with its content, as rendered into a report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentNode {
    pub title: String,
    /// Raw HTML content, empty when the section has none.
    pub content: String,
    /// 1 for roots, parent level + 1 otherwise.
    pub level: usize,
    pub children: Vec<ContentNode>,
}

impl Drop for ContentNode {
    // Unlinks descendants iteratively so deep trees cannot exhaust the stack.
    fn drop(&mut self) {
        let mut pending = std::mem::take(&mut self.children);
        while let Some(mut node) = pending.pop() {
            pending.append(&mut node.children);
        }
    }
}

impl ContentNode {
    /// This node and all its descendants, depth-first in document order.
    pub fn iter(&self) -> impl Iterator<Item = &ContentNode> {
        let mut stack = vec![self];
        std::iter::from_fn(move || {
            let node = stack.pop()?;
            stack.extend(node.children.iter().rev());
            Some(node)
        })
    }
}

/// Every node of a forest, depth-first in document order.
pub fn flatten(forest: &[ContentNode]) -> impl Iterator<Item = &ContentNode> {
    forest.iter().flat_map(ContentNode::iter)
}

/// Build the content forest from flat section records.
///
/// Parent links are resolved by id. A record whose parent is unknown, or
/// which sits on a parent cycle, becomes a root. Siblings are ordered by
/// `sort_order`, ties keeping input order. When ids repeat, parent links
/// resolve to the first record with that id.
///
/// Runs in linear time apart from the sibling sort and never recurses, so
/// arbitrarily deep parent chains are fine.
pub fn build_content_tree(
    sections: &[SectionRecord],
    contents: &HashMap<String, String>,
) -> Vec<ContentNode> {
    let mut index: HashMap<i64, usize> = HashMap::with_capacity(sections.len());
    for (i, section) in sections.iter().enumerate() {
        index.entry(section.id).or_insert(i);
    }

    let raw_parent: Vec<Option<usize>> = sections
        .iter()
        .map(|s| s.parent_id.and_then(|pid| index.get(&pid).copied()))
        .collect();
    let cyclic = cycle_members(&raw_parent);

    let mut roots = Vec::new();
    let mut children: Vec<Vec<usize>> = vec![Vec::new(); sections.len()];

    for (i, section) in sections.iter().enumerate() {
        let parent = match raw_parent[i] {
            None => {
                if let Some(pid) = section.parent_id {
                    debug!(
                        "Section {} references missing parent {}, treating as root",
                        section.id, pid
                    );
                }
                None
            }
            Some(_) if cyclic[i] => {
                warn!(
                    "Section {} is part of a parent cycle, treating as root",
                    section.id
                );
                None
            }
            parent => parent,
        };

        match parent {
            Some(p) => children[p].push(i),
            None => roots.push(i),
        }
    }

    let by_order = |list: &mut Vec<usize>| list.sort_by_key(|&i| sections[i].sort_order);
    by_order(&mut roots);
    children.iter_mut().for_each(by_order);

    // Pre-order walk assigns levels; every child comes after its parent.
    let mut levels = vec![0usize; sections.len()];
    let mut order = Vec::with_capacity(sections.len());
    let mut stack: Vec<usize> = roots.iter().rev().copied().collect();
    for &root in &roots {
        levels[root] = 1;
    }
    while let Some(i) = stack.pop() {
        order.push(i);
        for &c in children[i].iter().rev() {
            levels[c] = levels[i] + 1;
            stack.push(c);
        }
    }

    // Reverse pre-order builds children before their parents.
    let mut built: Vec<Option<ContentNode>> = vec![None; sections.len()];
    for &i in order.iter().rev() {
        let section = &sections[i];
        let node = ContentNode {
            title: section.title.clone(),
            content: contents.get(&section.section_key).cloned().unwrap_or_default(),
            level: levels[i],
            children: children[i].iter().filter_map(|&c| built[c].take()).collect(),
        };
        built[i] = Some(node);
    }

    roots.iter().filter_map(|&i| built[i].take()).collect()
}

/// Which records lie on a cycle of parent links.
///
/// Each record is walked at most once: a walk stops at the first record
/// already finished or already on the current path, and in the latter case
/// the path from that record onward is the cycle.
fn cycle_members(raw_parent: &[Option<usize>]) -> Vec<bool> {
    #[derive(Clone, Copy, PartialEq)]
    enum Visit {
        New,
        OnPath,
        Done,
    }

    let mut state = vec![Visit::New; raw_parent.len()];
    let mut cyclic = vec![false; raw_parent.len()];
    let mut path = Vec::new();

    for start in 0..raw_parent.len() {
        let mut current = Some(start);
        while let Some(i) = current {
            if state[i] != Visit::New {
                break;
            }
            state[i] = Visit::OnPath;
            path.push(i);
            current = raw_parent[i];
        }

        if let Some(hit) = current.filter(|&i| state[i] == Visit::OnPath) {
            if let Some(pos) = path.iter().position(|&i| i == hit) {
                for &i in &path[pos..] {
                    cyclic[i] = true;
                }
            }
        }
        for i in path.drain(..) {
            state[i] = Visit::Done;
        }
    }

    cyclic
}

/// Section records for a freshly parsed outline.
///
/// Ids are assigned depth-first from 1, `sort_order` is the 1-based
/// position among siblings and section keys are unique semantic keys
/// derived from the titles.
pub fn sections_from_outline(outline: &[OutlineNode]) -> Vec<SectionRecord> {
    let mut records = Vec::new();
    let mut used_keys = HashSet::new();
    push_records(outline, None, &mut records, &mut used_keys);
    records
}

fn push_records(
    nodes: &[OutlineNode],
    parent_id: Option<i64>,
    records: &mut Vec<SectionRecord>,
    used_keys: &mut HashSet<String>,
) {
    for (position, node) in nodes.iter().enumerate() {
        let base = semantic_key(&node.title);
        let mut key = base.clone();
        let mut counter = 1;
        while used_keys.contains(&key) {
            key = format!("{}_{}", base, counter);
            counter += 1;
        }
        used_keys.insert(key.clone());

        let id = records.len() as i64 + 1;
        records.push(SectionRecord {
            id,
            parent_id,
            title: node.title.clone(),
            section_key: key,
            sort_order: position as i32 + 1,
        });

        push_records(&node.children, Some(id), records, used_keys);
    }
}

/// Stable key for a section title: whitespace runs become `_`, and only
/// ASCII alphanumerics, `_` and CJK unified ideographs are kept.
pub fn semantic_key(title: &str) -> String {
    let key: String = title
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || ('\u{4e00}'..='\u{9fa5}').contains(c))
        .collect();

    if key.is_empty() {
        "section".to_string()
    } else {
        key
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: i64, parent_id: Option<i64>, title: &str, sort_order: i32) -> SectionRecord {
        SectionRecord {
            id,
            parent_id,
            title: title.to_string(),
            section_key: format!("key_{}", id),
            sort_order,
        }
    }

    fn titles(nodes: &[ContentNode]) -> Vec<&str> {
        nodes.iter().map(|n| n.title.as_str()).collect()
    }

    #[test]
    fn test_tree_shape_and_levels() {
        let sections = vec![
            record(1, None, "A", 1),
            record(2, Some(1), "A.1", 1),
            record(3, Some(2), "A.1.a", 1),
            record(4, None, "B", 2),
        ];
        let forest = build_content_tree(&sections, &HashMap::new());

        assert_eq!(titles(&forest), vec!["A", "B"]);
        assert_eq!(forest[0].children[0].level, 2);
        assert_eq!(forest[0].children[0].children[0].level, 3);
        assert_eq!(forest[1].level, 1);
        assert_eq!(flatten(&forest).count(), 4);
    }

    #[test]
    fn test_siblings_sorted_stably() {
        let sections = vec![
            record(1, None, "third", 3),
            record(2, None, "first", 1),
            record(3, None, "tie-a", 2),
            record(4, None, "tie-b", 2),
        ];
        let forest = build_content_tree(&sections, &HashMap::new());
        assert_eq!(titles(&forest), vec!["first", "tie-a", "tie-b", "third"]);
    }

    #[test]
    fn test_missing_parent_becomes_root() {
        let sections = vec![record(1, None, "root", 1), record(2, Some(99), "orphan", 2)];
        let forest = build_content_tree(&sections, &HashMap::new());
        assert_eq!(titles(&forest), vec!["root", "orphan"]);
        assert_eq!(forest[1].level, 1);
    }

    #[test]
    fn test_cycles_terminate_and_keep_every_node() {
        let sections = vec![
            record(1, Some(2), "a", 1),
            record(2, Some(1), "b", 2),
            record(3, Some(3), "self", 3),
            record(4, Some(1), "hangs off cycle", 1),
        ];
        let forest = build_content_tree(&sections, &HashMap::new());

        assert_eq!(titles(&forest), vec!["a", "b", "self"]);
        assert_eq!(titles(&forest[0].children), vec!["hangs off cycle"]);
        assert_eq!(forest[0].children[0].level, 2);
        assert_eq!(flatten(&forest).count(), 4);
    }

    #[test]
    fn test_long_parent_chain() {
        let depth = 10_000;
        let sections: Vec<SectionRecord> = (1..=depth)
            .map(|id| record(id, (id > 1).then_some(id - 1), &id.to_string(), 1))
            .collect();
        let forest = build_content_tree(&sections, &HashMap::new());

        assert_eq!(forest.len(), 1);
        let levels: Vec<usize> = flatten(&forest).map(|n| n.level).collect();
        assert_eq!(levels.len(), depth as usize);
        assert!(levels.iter().enumerate().all(|(i, level)| *level == i + 1));
    }

    #[test]
    fn test_long_cycle_with_tail() {
        // 1 -> 2 -> ... -> 5000 -> 1, and 5001 hangs off record 5000.
        let mut sections: Vec<SectionRecord> = (1..=5000)
            .map(|id| record(id, Some(if id == 1 { 5000 } else { id - 1 }), "c", 1))
            .collect();
        sections.push(record(5001, Some(5000), "tail", 2));
        let forest = build_content_tree(&sections, &HashMap::new());

        assert_eq!(forest.len(), 5000);
        assert_eq!(flatten(&forest).count(), 5001);
        assert_eq!(titles(&forest[4999].children), vec!["tail"]);
        assert_eq!(forest[4999].children[0].level, 2);
    }

    #[test]
    fn test_content_attached_by_key() {
        let sections = vec![record(1, None, "A", 1), record(2, None, "B", 2)];
        let contents = HashMap::from([("key_1".to_string(), "<p>x</p>".to_string())]);
        let forest = build_content_tree(&sections, &contents);
        assert_eq!(forest[0].content, "<p>x</p>");
        assert_eq!(forest[1].content, "");
    }

    #[test]
    fn test_flatten_is_depth_first() {
        let sections = vec![
            record(1, None, "1", 1),
            record(2, Some(1), "1.1", 1),
            record(3, Some(1), "1.2", 2),
            record(4, Some(2), "1.1.1", 1),
            record(5, None, "2", 2),
        ];
        let forest = build_content_tree(&sections, &HashMap::new());
        let order: Vec<&str> = flatten(&forest).map(|n| n.title.as_str()).collect();
        assert_eq!(order, vec!["1", "1.1", "1.1.1", "1.2", "2"]);
    }

    #[test]
    fn test_semantic_key() {
        assert_eq!(semantic_key("  Project  Summary "), "Project_Summary");
        assert_eq!(semantic_key("一、总结（上周）"), "一总结上周");
        assert_eq!(semantic_key("Q3 / Q4 plan!"), "Q3__Q4_plan");
        assert_eq!(semantic_key("???"), "section");
        assert_eq!(semantic_key(""), "section");
    }

    #[test]
    fn test_sections_from_outline() {
        let outline = vec![
            OutlineNode {
                title: "总结".to_string(),
                level: 1,
                children: vec![
                    OutlineNode::leaf("Detail", 2),
                    OutlineNode::leaf("Detail", 2),
                ],
            },
            OutlineNode::leaf("总结", 1),
        ];

        let records = sections_from_outline(&outline);
        let summary: Vec<(i64, Option<i64>, &str, i32)> = records
            .iter()
            .map(|r| (r.id, r.parent_id, r.section_key.as_str(), r.sort_order))
            .collect();
        assert_eq!(
            summary,
            vec![
                (1, None, "总结", 1),
                (2, Some(1), "Detail", 1),
                (3, Some(1), "Detail_1", 2),
                (4, None, "总结_1", 2),
            ]
        );

        let rebuilt = build_content_tree(&records, &HashMap::new());
        assert_eq!(rebuilt.len(), 2);
        assert_eq!(rebuilt[0].children.len(), 2);
    }
}
