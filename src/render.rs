//! ASCII tree rendering for organization hierarchies.

use crate::models::Node;

const ENRICHED: char = '●';
const PENDING: char = '○';
const FAILED: char = '✗';

/// Status symbol for a node: failed if any environment could not be listed,
/// pending while some environment has not been enriched yet.
fn node_symbol(node: &Node) -> char {
    let environments = &node.organization.environments;
    if environments.iter().any(|e| e.enrichment_error.is_some()) {
        FAILED
    } else if environments.iter().all(|e| e.is_enriched()) {
        ENRICHED
    } else {
        PENDING
    }
}

fn node_label(node: &Node) -> String {
    let environments = &node.organization.environments;
    let applications: usize = environments.iter().map(|e| e.applications().len()).sum();
    format!(
        "{} ({} environments, {} applications)",
        node.name(),
        environments.len(),
        applications
    )
}

/// Render an organization tree as ASCII art with status symbols.
///
/// Example output:
/// ```text
/// Acme (1 environments, 0 applications)
/// ├── ● Payments (2 environments, 5 applications)
/// │   └── ○ Payments EU (1 environments, 0 applications)
/// └── ✗ org-7: Request to … failed
/// ```
pub fn render_tree(root: &Node) -> String {
    let mut output = String::new();
    output.push_str(&node_label(root));
    output.push('\n');
    render_children(&mut output, root, "");
    output
}

fn render_children(output: &mut String, node: &Node, prefix: &str) {
    let total = node.children.len() + node.failed_branches.len();
    let mut index = 0;

    for child in &node.children {
        index += 1;
        let is_last = index == total;
        push_line(output, prefix, is_last, node_symbol(child), &node_label(child));

        let continuation = if is_last { "    " } else { "│   " };
        render_children(output, child, &format!("{}{}", prefix, continuation));
    }

    for failed in &node.failed_branches {
        index += 1;
        let label = format!("{}: {}", failed.id, failed.error);
        push_line(output, prefix, index == total, FAILED, &label);
    }
}

fn push_line(output: &mut String, prefix: &str, is_last: bool, symbol: char, label: &str) {
    let branch = if is_last { "└── " } else { "├── " };
    output.push_str(prefix);
    output.push_str(branch);
    output.push(symbol);
    output.push(' ');
    output.push_str(label);
    output.push('\n');
}
