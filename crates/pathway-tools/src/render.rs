//! Markdown rendering of graph content for tool output.

use pathway_core::NodeNaming;
use pathway_graph::{Direction, GraphManager, Node, Relationship};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write;

/// One related node under a relationship, already looked up.
struct Related<'a> {
    relationship: &'a str,
    direction: Direction,
    node: &'a Node,
}

fn bullet(out: &mut String, node: &Node) {
    let _ = write!(out, "- **{}** (`{}`)", display_name(node), node.id);
    if !node.summary.is_empty() {
        let _ = write!(out, ": {}", node.summary);
    }
    out.push('\n');
}

fn display_name(node: &Node) -> &str {
    if node.name.is_empty() {
        &node.id
    } else {
        &node.name
    }
}

fn related<'a>(graph: &'a GraphManager, node: &'a Node) -> Vec<Related<'a>> {
    let mut out = Vec::new();
    for (rel, edges) in node.resolved_edges() {
        for edge in edges {
            let Some(target) = graph.node(edge.to) else {
                continue;
            };
            // Unregistered relationships have no direction hint and render inline.
            let direction = edge
                .relationship
                .as_ref()
                .map(|r| r.direction)
                .unwrap_or(Direction::Inline);
            out.push(Related {
                relationship: rel,
                direction,
                node: target,
            });
        }
    }
    out
}

fn related_section(out: &mut String, items: &[Related<'_>], direction: Direction) {
    let mut by_rel: BTreeMap<&str, Vec<&Node>> = BTreeMap::new();
    for item in items.iter().filter(|i| i.direction == direction) {
        by_rel.entry(item.relationship).or_default().push(item.node);
    }
    for (rel, nodes) in by_rel {
        let _ = writeln!(out, "### {}\n", rel);
        for node in nodes {
            bullet(out, node);
        }
        out.push('\n');
    }
}

/// Render one node with its neighbours. Backward relationships come before the
/// subject, inline ones inside it, forward ones after it, and inbound edges last.
pub fn render_node(graph: &GraphManager, node: &Node, naming: &NodeNaming) -> String {
    let mut out = String::new();
    let related = related(graph, node);

    if related.iter().any(|r| r.direction == Direction::Backward) {
        out.push_str("## Before\n\n");
        related_section(&mut out, &related, Direction::Backward);
    }

    let _ = writeln!(out, "# {} (`{}`)\n", display_name(node), node.id);
    if !node.summary.is_empty() {
        let _ = writeln!(out, "> {}\n", node.summary);
    }
    if !node.tags.is_empty() {
        let tags: Vec<String> = node.tags.iter().map(|t| format!("`{}`", t)).collect();
        let _ = writeln!(out, "Tags: {}\n", tags.join(", "));
    }
    if !node.description.is_empty() {
        let _ = writeln!(out, "{}\n", node.description.trim_end());
    }

    if related.iter().any(|r| r.direction == Direction::Inline) {
        out.push_str("## Related\n\n");
        related_section(&mut out, &related, Direction::Inline);
    }

    if related.iter().any(|r| r.direction == Direction::Forward) {
        out.push_str("## After\n\n");
        related_section(&mut out, &related, Direction::Forward);
    }

    let inbound = graph.inbound(&node.id);
    if !inbound.is_empty() {
        out.push_str("## Referenced by\n\n");
        for (rel, source) in inbound {
            let _ = writeln!(
                out,
                "- **{}** (`{}`) via `{}`",
                display_name(source),
                source.id,
                rel
            );
        }
        out.push('\n');
    }

    let _ = writeln!(
        out,
        "_{} created {}, updated {}_",
        naming.display_singular,
        pathway_graph::timestamp::format(&node.created_at),
        pathway_graph::timestamp::format(&node.updated_at)
    );
    out
}

/// Bulleted list of nodes under a heading with the count.
pub fn render_node_list(nodes: &[&Node], naming: &NodeNaming, heading: &str) -> String {
    let mut out = format!("# {} ({})\n\n", heading, nodes.len());
    if nodes.is_empty() {
        let _ = writeln!(out, "No {} found.", naming.plural);
        return out;
    }
    for node in nodes {
        let _ = write!(out, "- **{}** (`{}`)", display_name(node), node.id);
        if !node.summary.is_empty() {
            let _ = write!(out, ": {}", node.summary);
        }
        if !node.tags.is_empty() {
            let _ = write!(out, " [{}]", node.tags.join(", "));
        }
        out.push('\n');
    }
    out
}

pub fn render_tags(counts: &BTreeMap<String, usize>) -> String {
    let mut out = format!("# Tags ({})\n\n", counts.len());
    if counts.is_empty() {
        out.push_str("No tags in use.\n");
        return out;
    }
    out.push_str("| Tag | Count |\n|---|---|\n");
    for (tag, count) in counts {
        let _ = writeln!(out, "| `{}` | {} |", tag, count);
    }
    out
}

pub fn render_relationships(relationships: &[Relationship]) -> String {
    let mut out = format!("# Relationships ({})\n\n", relationships.len());
    if relationships.is_empty() {
        out.push_str("No relationships registered.\n");
        return out;
    }
    out.push_str("| Name | Direction | Description |\n|---|---|---|\n");
    for rel in relationships {
        let _ = writeln!(
            out,
            "| `{}` | {} | {} |",
            rel.name, rel.direction, rel.description
        );
    }
    out
}

pub fn render_unregistered(unregistered: &BTreeSet<String>) -> String {
    if unregistered.is_empty() {
        return "All relationship names in use are registered.\n".to_string();
    }
    let mut out = format!(
        "# Unregistered relationships ({})\n\n\
         These names appear on edges but have no definition in relationships.yaml:\n\n",
        unregistered.len()
    );
    for name in unregistered {
        let _ = writeln!(out, "- `{}`", name);
    }
    out
}
