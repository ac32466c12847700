//! Relevance-ranked semantic search over the unpruned tree: role synonym
//! expansion, fuzzy name matching, and ancestor-context bonuses.

mod synonyms;

use std::collections::BTreeSet;

use serde::Serialize;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::model::{Node, Role, State};
use crate::requests::FindRequest;

pub use synonyms::{lookup as synonym_lookup, resolve as resolve_roles};

/// Words stripped from the name query.
const NOISE_WORDS: [&str; 18] = [
    "the", "a", "an", "this", "that", "for", "in", "on", "of", "with", "to", "and", "or", "is",
    "it", "its", "my", "your",
];

/// One ranked match; the node is returned without its children.
#[derive(Debug, Clone, Serialize)]
pub struct SearchHit {
    #[serde(flatten)]
    pub node: Node,
    pub score: f32,
}

/// Lowercase, NFKD-decompose, strip combining marks, split on
/// non-alphanumeric boundaries.
pub fn tokenize(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    for ch in text.nfkd().filter(|c| !is_combining_mark(*c)) {
        if ch.is_alphanumeric() {
            current.extend(ch.to_lowercase());
        } else if !current.is_empty() {
            tokens.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

fn is_noise(token: &str) -> bool {
    NOISE_WORDS.contains(&token)
}

/// The parsed form of a find request: resolved target roles, name tokens,
/// and the raw query tokens used for ancestor-context bonuses.
struct ParsedQuery {
    target_roles: BTreeSet<Role>,
    name_tokens: Vec<String>,
    query_tokens: Vec<String>,
    state: Option<State>,
    state_supplied: bool,
}

fn parse_request(request: &FindRequest) -> ParsedQuery {
    let mut target_roles = BTreeSet::new();
    let mut name_tokens = Vec::new();
    let mut query_tokens = Vec::new();

    if let Some(query) = &request.query {
        query_tokens = tokenize(query);
        let (roles, remainder) = extract_role_span(&query_tokens);
        target_roles.extend(roles);
        name_tokens.extend(remainder.into_iter().filter(|t| !is_noise(t)));
    }
    if let Some(role) = &request.role {
        target_roles.extend(resolve_roles(role));
    }
    if let Some(name) = &request.name {
        let extra = tokenize(name);
        query_tokens.extend(extra.iter().cloned());
        name_tokens.extend(extra.into_iter().filter(|t| !is_noise(t)));
    }

    let state = request.state.as_deref().and_then(State::parse);

    ParsedQuery {
        target_roles,
        name_tokens,
        query_tokens,
        state,
        state_supplied: request.state.is_some(),
    }
}

/// Scan tokens left to right for the longest contiguous 1..=3 token span
/// present in the synonym table; that span names the roles, the rest is the
/// name query.
fn extract_role_span(tokens: &[String]) -> (BTreeSet<Role>, Vec<String>) {
    for len in (1..=3.min(tokens.len())).rev() {
        for start in 0..=(tokens.len() - len) {
            let phrase = tokens[start..start + len].join(" ");
            if let Some(roles) = synonym_lookup(&phrase) {
                let mut remainder = Vec::new();
                remainder.extend_from_slice(&tokens[..start]);
                remainder.extend_from_slice(&tokens[start + len..]);
                return (roles, remainder);
            }
        }
    }
    (BTreeSet::new(), tokens.to_vec())
}

/// Search the unpruned tree. Nodes scoring below the threshold are dropped;
/// survivors are stable-sorted by descending score and the top `limit`
/// returned without their children.
pub fn search_tree(roots: &[Node], request: &FindRequest) -> Vec<SearchHit> {
    let parsed = parse_request(request);

    // A supplied state string that is not a canonical tag can match nothing.
    if parsed.state_supplied && parsed.state.is_none() {
        return Vec::new();
    }

    let mut hits = Vec::new();
    let mut ancestors: Vec<AncestorInfo> = Vec::new();
    for root in roots {
        collect(root, &parsed, &mut ancestors, &mut hits);
    }

    hits.retain(|(score, _)| *score >= request.threshold);
    hits.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
    hits.truncate(request.limit);
    hits.into_iter()
        .map(|(score, node)| SearchHit { node, score })
        .collect()
}

struct AncestorInfo {
    role: Role,
    name_tokens: Vec<String>,
}

fn collect(
    node: &Node,
    parsed: &ParsedQuery,
    ancestors: &mut Vec<AncestorInfo>,
    hits: &mut Vec<(f32, Node)>,
) {
    if let Some(score) = score_node(node, parsed, ancestors) {
        hits.push((score, node.without_children()));
    }
    ancestors.push(AncestorInfo {
        role: node.role,
        name_tokens: tokenize(&node.name),
    });
    for child in &node.children {
        collect(child, parsed, ancestors, hits);
    }
    ancestors.pop();
}

fn score_node(node: &Node, parsed: &ParsedQuery, ancestors: &[AncestorInfo]) -> Option<f32> {
    // Hard filters first.
    if let Some(state) = parsed.state {
        if !node.states.contains(&state) {
            return None;
        }
    }
    let roles_supplied = !parsed.target_roles.is_empty();
    if roles_supplied && !parsed.target_roles.contains(&node.role) {
        return None;
    }

    let mut score = 0.0f32;
    if roles_supplied {
        score += 0.35;
    }

    let name_score = name_score(node, &parsed.name_tokens);
    if !parsed.name_tokens.is_empty() {
        if name_score == 0.0 {
            return None;
        }
        score += name_score * 0.5;
    } else if roles_supplied {
        score += 0.15;
    }

    if parsed.state_supplied {
        score += 0.1;
    }

    if ancestors.iter().any(|a| {
        a.name_tokens
            .iter()
            .any(|t| parsed.query_tokens.contains(t))
    }) {
        score += 0.1;
    }
    if roles_supplied && ancestors.iter().any(|a| parsed.target_roles.contains(&a.role)) {
        score += 0.1;
    }
    if node.has_meaningful_action() {
        score += 0.05;
    }
    if !node.states.contains(&State::Offscreen) {
        score += 0.05;
    }
    if node.states.contains(&State::Focused) {
        score += 0.02;
    }

    Some(score)
}

/// Name relevance in [0, 1].
fn name_score(node: &Node, query_tokens: &[String]) -> f32 {
    if query_tokens.is_empty() {
        return 0.0;
    }
    let name_tokens = tokenize(&node.name);
    let joined = query_tokens.join(" ");
    let haystack = name_tokens.join(" ");

    // Whole-query substring match.
    let substring: f32 = if haystack.is_empty() {
        0.0
    } else if haystack == joined {
        1.0
    } else if haystack.contains(&joined) {
        0.85
    } else {
        0.0
    };

    // Per-token fuzzy match.
    let mut token_sum = 0.0f32;
    for q in query_tokens {
        let mut best = 0.0f32;
        for t in &name_tokens {
            let s = if t == q {
                1.0
            } else if t.starts_with(q.as_str()) {
                0.7
            } else if q.starts_with(t.as_str()) {
                0.5
            } else if t.contains(q.as_str()) {
                0.6
            } else {
                0.0
            };
            best = best.max(s);
        }
        token_sum += best;
    }
    let token_score = token_sum / query_tokens.len() as f32;

    let mut score = substring.max(token_score);
    if score > 0.0 && !name_tokens.is_empty() {
        let overlap = query_tokens
            .iter()
            .filter(|q| name_tokens.contains(q))
            .count() as f32
            / name_tokens.len() as f32;
        score *= 0.85 + 0.15 * overlap;
    }

    // Secondary-field boost: description, value, placeholder.
    let mut secondary: Vec<String> = Vec::new();
    if let Some(d) = &node.description {
        secondary.extend(tokenize(d));
    }
    if let Some(v) = &node.value {
        secondary.extend(tokenize(v));
    }
    if let Some(p) = &node.attributes.placeholder {
        secondary.extend(tokenize(p));
    }
    if !secondary.is_empty() {
        let hit = query_tokens
            .iter()
            .filter(|q| secondary.contains(q))
            .count() as f32
            / query_tokens.len() as f32;
        score += 0.15 * hit;
    }

    score.min(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Action;

    fn button(id: &str, name: &str) -> Node {
        let mut node = Node::new(id, Role::Button, name);
        node.actions.push(Action::Click);
        node
    }

    fn tree() -> Vec<Node> {
        let mut root = Node::new("e0", Role::Window, "Demo App");
        let mut form = Node::new("e1", Role::Form, "Login");
        let mut email = Node::new("e2", Role::Textbox, "Email address");
        email.actions.push(Action::Type);
        let mut check = Node::new("e3", Role::Checkbox, "Remember me");
        check.actions.push(Action::Toggle);
        form.children.push(email);
        form.children.push(check);
        form.children.push(button("e4", "Submit"));
        form.children.push(button("e5", "Submit Form"));
        root.children.push(form);
        vec![root]
    }

    #[test]
    fn test_tokenize_unicode_and_boundaries() {
        assert_eq!(tokenize("Save File"), vec!["save", "file"]);
        assert_eq!(tokenize("héllo-wörld"), vec!["hello", "world"]);
        assert_eq!(tokenize("e2e_test v2"), vec!["e2e", "test", "v2"]);
        assert!(tokenize("  ++  ").is_empty());
    }

    #[test]
    fn test_role_filter_is_hard() {
        let hits = search_tree(
            &tree(),
            &FindRequest {
                role: Some("button".to_string()),
                ..FindRequest::default()
            },
        );
        assert!(!hits.is_empty());
        assert!(hits.iter().all(|h| h.node.role == Role::Button));
    }

    #[test]
    fn test_exact_name_ranks_above_substring() {
        let hits = search_tree(&tree(), &FindRequest::query("Submit"));
        assert!(hits.len() >= 2);
        assert_eq!(hits[0].node.id, "e4");
        assert_eq!(hits[1].node.id, "e5");
        assert!(hits[0].score > hits[1].score);
    }

    #[test]
    fn test_synonym_expansion() {
        let hits = search_tree(&tree(), &FindRequest::query("search bar"));
        assert!(!hits.is_empty());
        let allowed = [Role::Search, Role::SearchBox, Role::Textbox, Role::Combobox];
        assert!(allowed.contains(&hits[0].node.role));
    }

    #[test]
    fn test_noise_words_dropped() {
        let a = search_tree(&tree(), &FindRequest::query("the Submit button"));
        let b = search_tree(&tree(), &FindRequest::query("Submit button"));
        assert_eq!(a[0].node.id, b[0].node.id);
        assert_eq!(a[0].node.id, "e4");
    }

    #[test]
    fn test_state_filter() {
        let mut roots = tree();
        roots[0].children[0].children[1]
            .states
            .insert(State::Checked);
        let hits = search_tree(
            &roots,
            &FindRequest {
                state: Some("checked".to_string()),
                ..FindRequest::default()
            },
        );
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].node.id, "e3");
    }

    #[test]
    fn test_results_have_no_children() {
        let hits = search_tree(&tree(), &FindRequest::query("login"));
        assert!(!hits.is_empty());
        assert!(hits.iter().all(|h| h.node.children.is_empty()));
    }

    #[test]
    fn test_limit_and_threshold() {
        let hits = search_tree(
            &tree(),
            &FindRequest {
                role: Some("button".to_string()),
                limit: 1,
                ..FindRequest::default()
            },
        );
        assert_eq!(hits.len(), 1);

        let none = search_tree(
            &tree(),
            &FindRequest {
                query: Some("submit".to_string()),
                threshold: 2.0,
                ..FindRequest::default()
            },
        );
        assert!(none.is_empty());
    }

    #[test]
    fn test_ancestor_name_bonus() {
        // "login email" matches the email field; the Login form ancestor
        // shares the "login" token.
        let hits = search_tree(&tree(), &FindRequest::query("login email"));
        assert!(!hits.is_empty());
        assert_eq!(hits[0].node.id, "e2");
    }

    #[test]
    fn test_name_without_query() {
        let hits = search_tree(
            &tree(),
            &FindRequest {
                name: Some("Remember".to_string()),
                ..FindRequest::default()
            },
        );
        assert_eq!(hits[0].node.id, "e3");
    }
}
